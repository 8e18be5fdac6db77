//! The block device contract this driver is built against.
//!
//! This is deliberately narrower than a general-purpose storage trait: the
//! driver only ever asks for whole sectors or whole clusters, blocking until
//! the transfer completes. No caching happens here or anywhere above it in
//! this crate (see `spec.md` §1, non-goals).

use core::fmt::Debug;

/// A byte-addressable, sector-numbered block I/O port.
///
/// Implementors describe their own geometry through `block_size` and
/// `num_blocks`; this driver never assumes a fixed sector size at the type
/// level, since the BIOS Parameter Block carries the real value at runtime.
pub trait BlockDevice {
    type Err: Debug;

    /// Size, in bytes, of one block (sector) on this device.
    fn block_size(&self) -> usize;

    /// Total number of blocks (sectors) on this device.
    fn num_blocks(&self) -> usize;

    /// Reads `buf.len() / block_size()` whole blocks starting at
    /// `start_block` into `buf`. `buf.len()` must be a multiple of
    /// `block_size()`.
    fn read(&mut self, start_block: u64, buf: &mut [u8]) -> Result<(), Self::Err>;

    /// Writes `buf.len() / block_size()` whole blocks starting at
    /// `start_block` from `buf`. `buf.len()` must be a multiple of
    /// `block_size()`.
    fn write(&mut self, start_block: u64, buf: &[u8]) -> Result<(), Self::Err>;
}

/// An in-memory `BlockDevice`, used by the integration tests in place of a
/// real disk. Mirrors the spirit of the teacher crate's file-backed test
/// storage, minus the dependency on an external disk-image fixture.
#[cfg(any(test, not(feature = "no_std")))]
#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    block_size: usize,
    data: std::vec::Vec<u8>,
}

#[cfg(any(test, not(feature = "no_std")))]
impl MemoryBlockDevice {
    pub fn new(block_size: usize, num_blocks: usize) -> Self {
        Self {
            block_size,
            data: std::vec![0u8; block_size * num_blocks],
        }
    }
}

#[cfg(any(test, not(feature = "no_std")))]
impl BlockDevice for MemoryBlockDevice {
    type Err = core::convert::Infallible;

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn num_blocks(&self) -> usize {
        self.data.len() / self.block_size
    }

    fn read(&mut self, start_block: u64, buf: &mut [u8]) -> Result<(), Self::Err> {
        let start = start_block as usize * self.block_size;
        buf.copy_from_slice(&self.data[start..start + buf.len()]);
        Ok(())
    }

    fn write(&mut self, start_block: u64, buf: &[u8]) -> Result<(), Self::Err> {
        let start = start_block as usize * self.block_size;
        self.data[start..start + buf.len()].copy_from_slice(buf);
        Ok(())
    }
}
