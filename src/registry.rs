//! The name → `FilesystemState` table `attach`/`detach` operate on
//! (`spec.md` §6, `SPEC_FULL.md` §2's "In-memory registry" row).
//!
//! Every other operation in the VFS ops table (`read_file`, `write_file`,
//! `stat`, …) carries its own `FilesystemState` pointer directly, so this
//! registry is only ever consulted twice per mounted volume: once by
//! `attach` to allocate and name one, once by `detach` to reclaim it. It is
//! guarded by the teacher's `Mutex` abstraction (`spec.md` §5: looking a
//! volume up by name must be safe from a multi-threaded VFS even though
//! operations on one `FilesystemState` are not internally serialized).

use crate::error::Error;
use crate::fat::FilesystemState;
use crate::mutex::{Mutex, MutexInterface};
use crate::scratch::{self, BufString, BoxOf, List};
use crate::storage::BlockDevice;

/// A raw pointer to a boxed, attached volume. Plain pointers aren't `Send`;
/// access is always mediated by the registry's own mutex, so this is safe.
struct Attached<D: BlockDevice>(*mut FilesystemState<D>);

unsafe impl<D: BlockDevice> Send for Attached<D> {}

pub struct Registry<D: BlockDevice> {
    entries: Mutex<List<(BufString, Attached<D>)>>,
}

impl<D: BlockDevice> Registry<D> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(List::new()),
        }
    }

    /// Loads the bootrecord and FAT off `device`, registers the result under
    /// `name`, and returns the pointer the caller hands back into every
    /// later operation as `state`. Fails with `Error::AlreadyExists` if
    /// `name` is already attached.
    pub fn attach(
        &self,
        name: &str,
        device: D,
        readonly: bool,
    ) -> Result<*mut FilesystemState<D>, Error<D::Err>> {
        let state = FilesystemState::attach(device, readonly)?;
        let ptr = BoxOf::into_raw(BoxOf::new(state));

        let outcome = self.entries.cs(|entries| {
            if entries.iter().any(|(n, _)| n == name) {
                return Err(());
            }
            entries.push((scratch::string_from(name), Attached(ptr)));
            Ok(())
        });

        if outcome.is_err() {
            // Reclaim the state we just allocated; `name` was already taken.
            drop(unsafe { BoxOf::from_raw(ptr) });
            return Err(Error::AlreadyExists);
        }

        Ok(ptr)
    }

    /// Unregisters `name` and drops its `FilesystemState`. Does not flush —
    /// per `spec.md` §6, the caller must sync before detaching.
    pub fn detach(&self, name: &str) -> Result<(), Error<D::Err>> {
        let found = self.entries.cs(|entries| {
            let index = entries.iter().position(|(n, _)| n == name)?;
            Some(entries.remove(index).1 .0)
        });

        match found {
            Some(ptr) => {
                drop(unsafe { BoxOf::from_raw(ptr) });
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlockDevice;

    fn make_device() -> MemoryBlockDevice {
        let mut device = MemoryBlockDevice::new(512, 8);
        let mut sector = crate::scratch::zeroed(512);
        sector[0x00B..0x00D].copy_from_slice(&512u16.to_le_bytes());
        sector[0x00D] = 1;
        sector[0x00E..0x010].copy_from_slice(&1u16.to_le_bytes());
        sector[0x010] = 1;
        sector[0x024..0x028].copy_from_slice(&1u32.to_le_bytes());
        sector[0x02C..0x030].copy_from_slice(&2u32.to_le_bytes());
        sector[0x020..0x024].copy_from_slice(&8u32.to_le_bytes());
        device.write(0, &sector).unwrap();

        let mut fat = crate::scratch::zeroed(512);
        fat[8..12].copy_from_slice(&0x0FFF_FFFFu32.to_le_bytes());
        device.write(1, &fat).unwrap();

        device
    }

    #[test]
    fn attach_then_detach_round_trips() {
        let registry = Registry::new();
        let ptr = registry.attach("vol0", make_device(), false).unwrap();
        assert!(!ptr.is_null());
        registry.detach("vol0").unwrap();
    }

    #[test]
    fn attach_same_name_twice_fails() {
        let registry = Registry::new();
        registry.attach("vol0", make_device(), false).unwrap();
        assert_eq!(
            registry.attach("vol0", make_device(), false).unwrap_err(),
            Error::AlreadyExists
        );
        registry.detach("vol0").unwrap();
    }

    #[test]
    fn detach_unknown_name_fails() {
        let registry: Registry<MemoryBlockDevice> = Registry::new();
        assert_eq!(registry.detach("nope").unwrap_err(), Error::NotFound);
    }
}
