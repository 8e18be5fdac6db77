//! The high-level filesystem operations `spec.md` §4.8 specifies:
//! `create`/`open`/`close`/`remove`/`truncate`/`rename`/`stat`/`exists`.
//! These are the methods `crate::bindings` and any native Rust caller
//! drive directly.

use super::dir::{Attributes, DirEntry};
use super::table::ClusterStatus;
use super::types::Handle;
use super::FilesystemState;
use crate::error::Error;
use crate::storage::BlockDevice;

/// `spec.md` §4.8 `stat`: what a path or handle resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub size: u32,
    pub is_dir: bool,
    pub readonly: bool,
}

impl<D: BlockDevice> FilesystemState<D> {
    /// `spec.md` §4.8 `exists`.
    pub fn exists(&mut self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    /// `spec.md` §4.8 `stat(path)`.
    pub fn stat(&mut self, path: &str) -> Result<Stat, Error<D::Err>> {
        let resolved = self.resolve(path)?;
        Ok(Stat {
            size: resolved.entry.size,
            is_dir: resolved.entry.attributes.is_dir(),
            readonly: resolved.entry.attributes.is_readonly(),
        })
    }

    /// `spec.md` §4.8 `stat(handle)`.
    pub fn stat_handle(&mut self, handle: &Handle) -> Result<Stat, Error<D::Err>> {
        self.stat(handle.path())
    }

    fn create(&mut self, path: &str, is_dir: bool) -> Result<Handle, Error<D::Err>> {
        if self.exists(path) {
            return Err(Error::AlreadyExists);
        }

        let parent = self.resolve_parent(path)?;
        let slot = self.find_free_slot(parent.parent_cluster)?;

        let attributes = if is_dir { Attributes::dir() } else { Attributes::file(false) };
        let new_cluster = self.fat_mut().allocate_chain::<D::Err>(1)?;
        self.flush_fat()?;
        self.zero_new_cluster(new_cluster)?;

        let entry = DirEntry::new(parent.short_name, new_cluster, attributes);
        self.write_dir_entry(slot, &entry)?;

        log::debug!("created {} (dir={}) at cluster {}", path, is_dir, new_cluster);
        Ok(Handle::new(crate::scratch::string_from(path)))
    }

    fn zero_new_cluster(&mut self, c: super::table::Cluster) -> Result<(), Error<D::Err>> {
        let buf = crate::scratch::zeroed(self.cluster_size());
        self.write_cluster(c, &buf)
    }

    /// `spec.md` §4.8 `create(path, is_dir)`.
    pub fn create_file(&mut self, path: &str) -> Result<Handle, Error<D::Err>> {
        self.create(path, false)
    }

    pub fn create_dir(&mut self, path: &str) -> Result<Handle, Error<D::Err>> {
        self.create(path, true)
    }

    /// `spec.md` §4.8 `open(path)`. No open-file table: a handle is just a
    /// resolved, existent path re-checked on every call.
    pub fn open(&mut self, path: &str) -> Result<Handle, Error<D::Err>> {
        if !self.exists(path) {
            return Err(Error::NotFound);
        }
        Ok(Handle::new(crate::scratch::string_from(path)))
    }

    /// `spec.md` §4.8 `close`: a true no-op, matching the Design Notes'
    /// resolution of the source's dead `return (void*)path` (§9, item 4).
    pub fn close(&mut self, _handle: Handle) {}

    pub fn read(&mut self, handle: &Handle, offset: u64, buf: &mut [u8]) -> Result<usize, Error<D::Err>> {
        let resolved = self.resolve(handle.path())?;
        log::debug!("read {} offset={} len={}", handle.path(), offset, buf.len());
        self.read_file_data(resolved.entry.cluster(), resolved.entry.size, offset, buf)
    }

    pub fn write(&mut self, handle: &Handle, offset: u64, data: &[u8]) -> Result<usize, Error<D::Err>> {
        let resolved = self.resolve(handle.path())?;
        if resolved.entry.attributes.is_readonly() {
            return Err(Error::Permission);
        }

        log::debug!("write {} offset={} len={}", handle.path(), offset, data.len());
        self.write_file_data(
            resolved.entry.cluster(),
            resolved.location,
            resolved.entry.size,
            offset,
            data,
        )?;
        Ok(data.len())
    }

    /// `spec.md` §4.8 `remove(path)`.
    pub fn remove(&mut self, path: &str) -> Result<(), Error<D::Err>> {
        let resolved = self.resolve(path)?;

        self.fat_mut().free_chain::<D::Err>(resolved.entry.cluster())?;
        self.flush_fat()?;

        self.zero_dir_entry(resolved.location)?;
        log::debug!("removed {}", path);
        Ok(())
    }

    /// `spec.md` §4.8 `truncate(path, new_len)`.
    pub fn truncate(&mut self, path: &str, new_len: u32) -> Result<(), Error<D::Err>> {
        let resolved = self.resolve(path)?;
        let cluster_size = self.cluster_size() as u64;
        let old_size = resolved.entry.size as u64;
        let new_len_u64 = new_len as u64;

        let old_clusters = crate::util::ceil_div(old_size, cluster_size).max(1);
        let new_clusters = crate::util::ceil_div(new_len_u64, cluster_size).max(1);

        let first_cluster = resolved.entry.cluster();

        if new_clusters < old_clusters {
            self.fat_mut().shrink::<D::Err>(first_cluster, new_clusters as u32)?;
            self.flush_fat()?;

            // Zero bytes beyond `new_len` within the new tail cluster so a
            // later read of a hole created by shrink-then-grow never
            // returns stale data from before (`SPEC_FULL.md` §9, decision 1).
            self.zero_tail_past(first_cluster, new_clusters, new_len_u64, cluster_size)?;
        } else if new_clusters > old_clusters {
            let mut tail = first_cluster;
            for _ in 0..old_clusters - 1 {
                tail = match self.next(tail)? {
                    ClusterStatus::Next(n) => n,
                    ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
                };
            }
            self.fat_mut().grow::<D::Err>(tail, (new_clusters - old_clusters) as u32)?;
            self.flush_fat()?;
            self.zero_grown_region(tail, new_clusters - old_clusters)?;
        }

        let mut entry = resolved.entry;
        entry.size = new_len;
        self.write_dir_entry(resolved.location, &entry)?;
        Ok(())
    }

    fn zero_tail_past(
        &mut self,
        first_cluster: super::table::Cluster,
        kept_clusters: u64,
        new_len: u64,
        cluster_size: u64,
    ) -> Result<(), Error<D::Err>> {
        let mut tail = first_cluster;
        for _ in 0..kept_clusters - 1 {
            tail = match self.next(tail)? {
                ClusterStatus::Next(n) => n,
                ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
            };
        }

        let within = (new_len % cluster_size) as usize;
        if within == 0 && new_len > 0 {
            return Ok(());
        }
        let mut buf = crate::scratch::zeroed(self.cluster_size());
        self.read_cluster(tail, &mut buf)?;
        for b in &mut buf[within..] {
            *b = 0;
        }
        self.write_cluster(tail, &buf)
    }

    fn zero_grown_region(&mut self, tail: super::table::Cluster, added: u64) -> Result<(), Error<D::Err>> {
        let zero = crate::scratch::zeroed(self.cluster_size());
        let mut cluster = match self.next(tail)? {
            ClusterStatus::Next(n) => n,
            ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
        };
        for i in 0..added {
            self.write_cluster(cluster, &zero)?;
            if i + 1 < added {
                cluster = match self.next(cluster)? {
                    ClusterStatus::Next(n) => n,
                    ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
                };
            }
        }
        Ok(())
    }

    /// `spec.md` §4.8 `rename(old, new, is_dir)`. Cross-directory rename
    /// is out of scope (`SPEC_FULL.md` §9, decision 3): `old` and `new`
    /// must share a parent directory.
    pub fn rename(&mut self, old: &str, new: &str, _is_dir: bool) -> Result<(), Error<D::Err>> {
        if self.exists(new) {
            return Err(Error::AlreadyExists);
        }

        let old_parent = self.resolve_parent(old)?;
        let new_parent = self.resolve_parent(new)?;
        if old_parent.parent_cluster != new_parent.parent_cluster {
            return Err(Error::InvalidArgument);
        }

        let (location, mut entry) = self
            .find_in_dir(old_parent.parent_cluster, &old_parent.short_name)?
            .ok_or(Error::NotFound)?;

        entry.name = new_parent.short_name.name;
        entry.ext = new_parent.short_name.ext;
        self.write_dir_entry(location, &entry)?;

        log::debug!("renamed {} to {}", old, new);
        Ok(())
    }
}
