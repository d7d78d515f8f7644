//! PCI device discovery via sysfs
//!
//! Locates the one supported GPU by its hard-coded (vendor, device, class)
//! signature under `/sys/bus/pci/devices`, loads its resource-region table,
//! and exposes the register BAR as an [`MmioRegion`].
//!
//! Discovery is deliberately not general: this tool knows exactly one chip
//! revision and one register layout, so anything other than a Tonga match is
//! treated as "no device".

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::mmio::MmioRegion;

/// Base path for PCI device enumeration
const PCI_DEVICES_PATH: &str = "/sys/bus/pci/devices";

/// AMD PCI vendor ID
pub const AMD_VENDOR_ID: u16 = 0x1002;

/// Tonga (Radeon R9 285/380) PCI device ID
pub const TONGA_DEVICE_ID: u16 = 0x6939;

/// PCI base class for display controllers
pub const DISPLAY_CLASS: u32 = 0x03;

/// BAR index of the register aperture on this hardware layout
pub const MMIO_BAR: usize = 5;

/// Size of the register window to map, in bytes
pub const MMIO_WINDOW_BYTES: usize = 0x40000;

/// One entry from a device's sysfs `resource` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRegion {
    /// Physical start address
    pub start: u64,
    /// Physical end address (inclusive)
    pub end: u64,
    /// Resource flags as reported by the kernel
    pub flags: u64,
}

impl ResourceRegion {
    /// Returns true if this BAR is actually backed by a region
    pub fn is_present(&self) -> bool {
        self.start != 0 || self.end != 0 || self.flags != 0
    }

    /// Region length in bytes, zero for absent regions
    pub fn len(&self) -> u64 {
        if self.is_present() {
            self.end - self.start + 1
        } else {
            0
        }
    }

    /// Returns true if the region is absent
    pub fn is_empty(&self) -> bool {
        !self.is_present()
    }
}

/// A probed PCI GPU with its resource regions loaded
#[derive(Debug)]
pub struct PciDevice {
    /// PCI address (e.g. "0000:01:00.0")
    pub address: String,
    /// Sysfs directory for this device
    pub path: PathBuf,
    /// PCI vendor ID
    pub vendor_id: u16,
    /// PCI device ID
    pub device_id: u16,
    /// Full 24-bit PCI class code
    pub class_code: u32,
    /// Resource regions, indexed by BAR number
    pub resources: Vec<ResourceRegion>,
}

impl PciDevice {
    /// Map this device's register window read-only
    ///
    /// Maps [`MMIO_WINDOW_BYTES`] of BAR [`MMIO_BAR`]. The mapping (and the
    /// device it came from) is expected to live for the rest of the process;
    /// nothing in the monitor ever releases it.
    pub fn map_registers(&self) -> Result<MmioRegion> {
        let region = self
            .resources
            .get(MMIO_BAR)
            .copied()
            .filter(ResourceRegion::is_present)
            .ok_or_else(|| Error::BarNotPresent {
                address: self.address.clone(),
                bar: MMIO_BAR,
            })?;

        if region.len() < MMIO_WINDOW_BYTES as u64 {
            return Err(Error::ProbeFailed {
                address: self.address.clone(),
                message: format!(
                    "resource region {} is only 0x{:x} bytes, need 0x{:x}",
                    MMIO_BAR,
                    region.len(),
                    MMIO_WINDOW_BYTES
                ),
            });
        }

        let resource_path = self.path.join(format!("resource{}", MMIO_BAR));
        let file = File::open(&resource_path).map_err(|e| Error::MmioMap { source: e })?;
        MmioRegion::map(&file, MMIO_WINDOW_BYTES)
    }
}

/// Locate, probe, and validate the supported GPU
///
/// Searches the PCI bus for a display-class device with the Tonga
/// vendor/device signature, loads its resource table, and re-checks the
/// vendor ID afterwards as a guard against a misreporting probe.
pub fn find_tonga() -> Result<PciDevice> {
    find_device(Path::new(PCI_DEVICES_PATH), AMD_VENDOR_ID, TONGA_DEVICE_ID)
}

fn find_device(bus_path: &Path, vendor_id: u16, device_id: u16) -> Result<PciDevice> {
    let entries = fs::read_dir(bus_path).map_err(|e| Error::PciEnumeration { source: e })?;

    for entry in entries.flatten() {
        let device_path = entry.path();

        let Some(ids) = read_device_ids(&device_path) else {
            continue;
        };
        let (vendor, device, class_code) = ids;

        if vendor != vendor_id || device != device_id || class_code >> 16 != DISPLAY_CLASS {
            continue;
        }

        let address = entry.file_name().to_string_lossy().to_string();
        let mut gpu = PciDevice {
            address,
            path: device_path,
            vendor_id: vendor,
            device_id: device,
            class_code,
            resources: Vec::new(),
        };
        probe(&mut gpu)?;
        revalidate_vendor(&gpu)?;
        return Ok(gpu);
    }

    Err(Error::DeviceNotFound {
        vendor_id,
        device_id,
    })
}

/// Read the (vendor, device, class) triple for one device directory
///
/// Returns None for entries that cannot be read or parsed; enumeration skips
/// those rather than failing, since unrelated devices are none of our concern.
fn read_device_ids(device_path: &Path) -> Option<(u16, u16, u32)> {
    let vendor = read_sysfs_hex(&device_path.join("vendor"))? as u16;
    let device = read_sysfs_hex(&device_path.join("device"))? as u16;
    let class_code = read_sysfs_hex(&device_path.join("class"))? as u32;
    Some((vendor, device, class_code))
}

/// Load the device's resource-region table from its sysfs `resource` file
fn probe(gpu: &mut PciDevice) -> Result<()> {
    let resource_path = gpu.path.join("resource");
    let content = fs::read_to_string(&resource_path).map_err(|e| Error::ProbeFailed {
        address: gpu.address.clone(),
        message: format!("cannot read resource table: {}", e),
    })?;

    gpu.resources = parse_resource_table(&content)
        .map_err(|message| Error::sysfs_parse(&resource_path, message))?;
    Ok(())
}

/// Re-read the vendor ID after probing and check it still matches
fn revalidate_vendor(gpu: &PciDevice) -> Result<()> {
    let vendor_path = gpu.path.join("vendor");
    let found = read_sysfs_hex(&vendor_path)
        .ok_or_else(|| Error::sysfs_parse(&vendor_path, "invalid vendor id"))?
        as u16;

    if found != gpu.vendor_id {
        return Err(Error::VendorMismatch {
            address: gpu.address.clone(),
            expected: gpu.vendor_id,
            found,
        });
    }
    Ok(())
}

/// Parse a sysfs PCI `resource` file body
///
/// One line per BAR: start, end, and flags as hex, whitespace separated.
/// Absent BARs appear as all-zero lines and are kept so the vector stays
/// indexed by BAR number.
fn parse_resource_table(content: &str) -> std::result::Result<Vec<ResourceRegion>, String> {
    let mut regions = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let mut next_field = |what: &str| {
            fields
                .next()
                .and_then(parse_hex_u64)
                .ok_or_else(|| format!("line {}: bad {} field", lineno + 1, what))
        };

        regions.push(ResourceRegion {
            start: next_field("start")?,
            end: next_field("end")?,
            flags: next_field("flags")?,
        });
    }

    if regions.is_empty() {
        return Err("resource table is empty".to_string());
    }
    Ok(regions)
}

/// Read a single hex value (e.g. "0x1002") from a sysfs file
fn read_sysfs_hex(path: &Path) -> Option<u64> {
    let content = fs::read_to_string(path).ok()?;
    parse_hex_u64(content.trim())
}

/// Parse a hex (0x...) or decimal number
fn parse_hex_u64(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x1002"), Some(0x1002));
        assert_eq!(parse_hex_u64("0X6939"), Some(0x6939));
        assert_eq!(parse_hex_u64("16"), Some(16));
        assert_eq!(parse_hex_u64("invalid"), None);
    }

    #[test]
    fn test_parse_resource_table() {
        let content = "\
0x00000000e0000000 0x00000000efffffff 0x000000000014220c
0x0000000000000000 0x0000000000000000 0x0000000000000000
0x00000000f0000000 0x00000000f003ffff 0x0000000000040200
";
        let regions = parse_resource_table(content).unwrap();
        assert_eq!(regions.len(), 3);

        assert!(regions[0].is_present());
        assert_eq!(regions[0].len(), 0x10000000);

        assert!(regions[1].is_empty());
        assert_eq!(regions[1].len(), 0);

        assert_eq!(regions[2].start, 0xf000_0000);
        assert_eq!(regions[2].len(), 0x40000);
    }

    #[test]
    fn test_parse_resource_table_rejects_garbage() {
        assert!(parse_resource_table("").is_err());
        assert!(parse_resource_table("0xe0000000 nonsense 0x0\n").is_err());
    }

    #[test]
    fn test_missing_bar_is_reported() {
        let gpu = PciDevice {
            address: "0000:01:00.0".to_string(),
            path: PathBuf::from("/nonexistent"),
            vendor_id: AMD_VENDOR_ID,
            device_id: TONGA_DEVICE_ID,
            class_code: 0x030000,
            resources: vec![ResourceRegion {
                start: 0xe000_0000,
                end: 0xefff_ffff,
                flags: 0x14220c,
            }],
        };

        match gpu.map_registers() {
            Err(Error::BarNotPresent { bar, .. }) => assert_eq!(bar, MMIO_BAR),
            other => panic!("expected BarNotPresent, got {:?}", other),
        }
    }

    #[test]
    fn test_short_bar_is_reported() {
        let mut resources = vec![
            ResourceRegion {
                start: 0,
                end: 0,
                flags: 0,
            };
            5
        ];
        resources.push(ResourceRegion {
            start: 0xf000_0000,
            end: 0xf000_0fff,
            flags: 0x40200,
        });

        let gpu = PciDevice {
            address: "0000:01:00.0".to_string(),
            path: PathBuf::from("/nonexistent"),
            vendor_id: AMD_VENDOR_ID,
            device_id: TONGA_DEVICE_ID,
            class_code: 0x030000,
            resources,
        };

        match gpu.map_registers() {
            Err(Error::ProbeFailed { message, .. }) => {
                assert!(message.contains("only 0x1000 bytes"))
            }
            other => panic!("expected ProbeFailed, got {:?}", other),
        }
    }
}
