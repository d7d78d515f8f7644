//! Error types for tonga-gpu-stats
//!
//! Every error here is fatal in practice: without the GPU and its register
//! mapping the tool has no purpose. The locator never terminates the process
//! itself; it hands one of these back to `main`, which prints the message and
//! exits with status 1.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tonga-gpu-stats operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while locating the GPU and mapping its registers
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// PCI device enumeration via sysfs could not be started
    #[error("Could not enumerate PCI devices: {source}")]
    PciEnumeration {
        /// The underlying IO error
        source: io::Error,
    },

    /// No GPU matching the hard-coded vendor/device signature was found
    #[error("No AMD Tonga GPU (PCI {vendor_id:04x}:{device_id:04x}) found on this system")]
    DeviceNotFound {
        /// Expected PCI vendor ID
        vendor_id: u16,
        /// Expected PCI device ID
        device_id: u16,
    },

    /// Probing the matched device for its resource regions failed
    #[error("Could not probe GPU at {address}: {message}")]
    ProbeFailed {
        /// PCI address of the device (e.g. "0000:01:00.0")
        address: String,
        /// Description of the probe failure
        message: String,
    },

    /// The vendor ID read back after probing no longer matches
    #[error("GPU at {address} is not identified: vendor {found:04x}, expected {expected:04x}")]
    VendorMismatch {
        /// PCI address of the device
        address: String,
        /// Vendor ID expected for this GPU
        expected: u16,
        /// Vendor ID actually read back
        found: u16,
    },

    /// The requested BAR has no resource region behind it
    #[error("GPU at {address} has no resource region {bar}")]
    BarNotPresent {
        /// PCI address of the device
        address: String,
        /// The missing BAR index
        bar: usize,
    },

    /// Mapping the MMIO register window failed
    #[error("MMIO register mapping failed: {source}. Try running as root")]
    MmioMap {
        /// The underlying IO error
        source: io::Error,
    },

    /// Malformed content in a sysfs file discovered during probing
    #[error("Failed to parse sysfs data at {path}: {message}")]
    SysfsParse {
        /// The sysfs path that failed to parse
        path: PathBuf,
        /// Description of the parse error
        message: String,
    },

    /// Writing a rendered frame to the output sink failed
    #[error("Failed to write to output: {0}")]
    Output(#[from] io::Error),
}

impl Error {
    /// Returns true if this error is likely due to insufficient permissions
    pub fn is_permission_error(&self) -> bool {
        match self {
            Error::MmioMap { source } => {
                matches!(
                    source.raw_os_error(),
                    Some(libc::EACCES) | Some(libc::EPERM)
                )
            }
            Error::PciEnumeration { source } => source.kind() == io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Returns true if the error indicates a missing or unrecognized GPU
    pub fn is_gpu_missing(&self) -> bool {
        matches!(
            self,
            Error::DeviceNotFound { .. } | Error::VendorMismatch { .. }
        )
    }

    /// Create a sysfs parse error
    pub(crate) fn sysfs_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::SysfsParse {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_detection() {
        let err = Error::MmioMap {
            source: io::Error::from_raw_os_error(libc::EACCES),
        };
        assert!(err.is_permission_error());

        let err = Error::DeviceNotFound {
            vendor_id: 0x1002,
            device_id: 0x6939,
        };
        assert!(!err.is_permission_error());
        assert!(err.is_gpu_missing());
    }

    #[test]
    fn test_messages_are_one_line() {
        let err = Error::MmioMap {
            source: io::Error::from_raw_os_error(libc::EPERM),
        };
        assert!(!err.to_string().contains('\n'));

        let err = Error::VendorMismatch {
            address: "0000:01:00.0".into(),
            expected: 0x1002,
            found: 0xffff,
        };
        assert!(err.to_string().contains("1002"));
    }
}
