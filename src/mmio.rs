//! Memory-mapped register window access
//!
//! Wraps an `mmap` of a PCI resource file in a bounds-checked, word-addressed
//! read-only view. Reads go through `read_volatile` so the compiler can never
//! cache or elide them — every call hits the hardware register again.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::ptr;

use crate::error::{Error, Result};

/// Word-addressed access to a GPU register space
///
/// The sampler is generic over this trait so it can run against a fake
/// register file in tests instead of mapped hardware.
pub trait RegisterRead {
    /// Read the 32-bit register at `offset` (in word units)
    fn read_register(&self, offset: u32) -> u32;
}

/// A read-only mapping of one PCI BAR's register window
///
/// The mapping is held for the life of the value. Production keeps it until
/// the process is killed; `Drop` unmaps so short-lived uses (tests) release
/// the region cleanly.
#[derive(Debug)]
pub struct MmioRegion {
    base: *const u32,
    len_bytes: usize,
}

// The region is read-only and volatile reads take &self, so moving it across
// threads is sound. The monitor never does, but tests may.
unsafe impl Send for MmioRegion {}

impl MmioRegion {
    /// Map `len_bytes` of the given resource file read-only
    pub fn map(file: &File, len_bytes: usize) -> Result<Self> {
        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len_bytes,
                libc::PROT_READ,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };

        if base == libc::MAP_FAILED {
            return Err(Error::MmioMap {
                source: io::Error::last_os_error(),
            });
        }

        Ok(Self {
            base: base as *const u32,
            len_bytes,
        })
    }

    /// Number of 32-bit words addressable in this window
    pub fn len_words(&self) -> usize {
        self.len_bytes / 4
    }

    /// Read the 32-bit register at `offset` words from the window base
    ///
    /// # Panics
    ///
    /// Panics if `offset` lies outside the mapped window. Register offsets
    /// come from the fixed counter table, so an out-of-range index is a
    /// programming error, not a runtime condition.
    pub fn read(&self, offset: u32) -> u32 {
        let offset = offset as usize;
        assert!(
            offset < self.len_words(),
            "register offset 0x{:x} outside mapped window of 0x{:x} words",
            offset,
            self.len_words()
        );
        unsafe { ptr::read_volatile(self.base.add(offset)) }
    }

    /// Map anonymous zeroed memory in place of a device window
    #[cfg(test)]
    pub(crate) fn anonymous(len_bytes: usize) -> Result<Self> {
        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len_bytes,
                libc::PROT_READ,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if base == libc::MAP_FAILED {
            return Err(Error::MmioMap {
                source: io::Error::last_os_error(),
            });
        }

        Ok(Self {
            base: base as *const u32,
            len_bytes,
        })
    }
}

impl RegisterRead for MmioRegion {
    fn read_register(&self, offset: u32) -> u32 {
        self.read(offset)
    }
}

impl Drop for MmioRegion {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.base as *mut libc::c_void, self.len_bytes);
        }
    }
}
