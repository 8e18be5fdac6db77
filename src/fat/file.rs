//! The file I/O engine: mapping `(offset, length)` requests onto
//! cluster-chain walks, with read-modify-write at cluster granularity and
//! chain extension on a write that crosses the current end of file
//! (`spec.md` §4.7).

use super::dir::EntryLocation;
use super::table::{Cluster, ClusterStatus};
use super::FilesystemState;
use crate::error::Error;
use crate::storage::BlockDevice;

/// `(current_cluster, within_cluster_offset)` reached by walking `offset /
/// cluster_size` hops from `first_cluster` (`spec.md` §4.7 "Common
/// prologue"). A corrupt intermediate entry, or a seek that runs past
/// `EOC` before using up all the hops, is `Error::CorruptChain`.
fn seek<D: BlockDevice>(
    fs: &FilesystemState<D>,
    first_cluster: Cluster,
    offset: u64,
) -> Result<(Cluster, usize), Error<D::Err>> {
    let cluster_size = fs.cluster_size() as u64;
    let mut hops = offset / cluster_size;
    let mut current = first_cluster;

    while hops > 0 {
        match fs.next(current)? {
            ClusterStatus::Next(n) => current = n,
            ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
        }
        hops -= 1;
    }

    Ok((current, (offset % cluster_size) as usize))
}

impl<D: BlockDevice> FilesystemState<D> {
    /// `spec.md` §4.7 "Read". Returns the number of bytes actually copied
    /// into `buf`, which is `min(buf.len(), file_size - offset)`.
    pub(crate) fn read_file_data(
        &mut self,
        first_cluster: Cluster,
        file_size: u32,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<usize, Error<D::Err>> {
        let file_size = file_size as u64;
        if offset > file_size {
            return Err(Error::InvalidOffset);
        }
        if offset == file_size {
            return Ok(0);
        }

        let want = (buf.len() as u64).min(file_size - offset) as usize;
        let (mut current, mut within) = seek(self, first_cluster, offset)?;

        let cluster_size = self.cluster_size();
        let mut done = 0;
        let mut scratch = crate::scratch::zeroed(cluster_size);

        while done < want {
            self.read_cluster(current, &mut scratch)?;

            let n = (cluster_size - within).min(want - done);
            buf[done..done + n].copy_from_slice(&scratch[within..within + n]);
            done += n;
            within = 0;

            if done < want {
                current = match self.next(current)? {
                    ClusterStatus::Next(n) => n,
                    ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
                };
            }
        }

        Ok(done)
    }

    /// `spec.md` §4.7 "Write". `loc`/`entry_size` identify the directory
    /// entry backing this file so a growing write can update `size`
    /// (data clusters are written before that update, per the durability
    /// ordering in §4.7). Returns the file's size after the write.
    pub(crate) fn write_file_data(
        &mut self,
        first_cluster: Cluster,
        loc: EntryLocation,
        file_size: u32,
        offset: u64,
        data: &[u8],
    ) -> Result<u32, Error<D::Err>> {
        let file_size_u64 = file_size as u64;
        if offset > file_size_u64 {
            return Err(Error::InvalidOffset);
        }

        let cluster_size = self.cluster_size();
        let fits_in_place = offset + data.len() as u64 <= file_size_u64;

        if fits_in_place {
            self.write_in_place(first_cluster, offset, data)?;
            return Ok(file_size);
        }

        // Extending write: first top off whatever *allocated* capacity the
        // current chain still has past `offset` (which may already reach
        // past the old `file_size` into a partially-used tail cluster —
        // a freshly created file owns one cluster from `create` onward,
        // `spec.md` §4.8, so there is always at least one to fill before
        // anything new needs allocating), then grow the chain for however
        // many bytes are left over.
        let existing_clusters = crate::util::ceil_div(file_size_u64, cluster_size as u64).max(1);
        let existing_capacity = existing_clusters * cluster_size as u64;
        let mut tail = first_cluster;
        for _ in 0..existing_clusters - 1 {
            tail = match self.next(tail)? {
                ClusterStatus::Next(n) => n,
                ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
            };
        }

        let fill_len = (data.len() as u64).min(existing_capacity - offset) as usize;

        let mut written = 0usize;
        if fill_len > 0 {
            let (mut current, mut within) = seek(self, first_cluster, offset)?;
            let mut scratch = crate::scratch::zeroed(cluster_size);
            loop {
                self.read_cluster(current, &mut scratch)?;
                let n = (cluster_size - within).min(fill_len - written);
                scratch[within..within + n].copy_from_slice(&data[written..written + n]);
                self.write_cluster(current, &scratch)?;
                written += n;
                within = 0;

                if written >= fill_len {
                    break;
                }
                current = match self.next(current)? {
                    ClusterStatus::Next(n) => n,
                    ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
                };
            }
            tail = current;
        }

        let remaining = data.len() - written;
        if remaining > 0 {
            let num_allocate = crate::util::ceil_div(remaining as u64, cluster_size as u64) as u32;
            self.fat_mut().grow::<D::Err>(tail, num_allocate)?;
            self.flush_fat()?;

            let mut cluster = match self.next(tail)? {
                ClusterStatus::Next(n) => n,
                ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
            };

            let mut scratch = crate::scratch::zeroed(cluster_size);
            while written < data.len() {
                let n = cluster_size.min(data.len() - written);
                scratch[..n].copy_from_slice(&data[written..written + n]);
                if n < cluster_size {
                    for b in &mut scratch[n..] {
                        *b = 0;
                    }
                }
                self.write_cluster(cluster, &scratch)?;
                written += n;

                if written < data.len() {
                    cluster = match self.next(cluster)? {
                        ClusterStatus::Next(n) => n,
                        ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
                    };
                }
            }
        }

        let new_size = (offset + data.len() as u64) as u32;
        let mut entry = self.read_dir_entries(loc.cluster)?[loc.index].clone();
        entry.size = new_size;
        self.write_dir_entry(loc, &entry)?;

        Ok(new_size)
    }

    fn write_in_place(
        &mut self,
        first_cluster: Cluster,
        offset: u64,
        data: &[u8],
    ) -> Result<(), Error<D::Err>> {
        if data.is_empty() {
            return Ok(());
        }

        let cluster_size = self.cluster_size();
        let (mut current, mut within) = seek(self, first_cluster, offset)?;

        let mut scratch = crate::scratch::zeroed(cluster_size);
        let mut written = 0;
        loop {
            self.read_cluster(current, &mut scratch)?;
            let n = (cluster_size - within).min(data.len() - written);
            scratch[within..within + n].copy_from_slice(&data[written..written + n]);
            self.write_cluster(current, &scratch)?;
            written += n;
            within = 0;

            if written >= data.len() {
                break;
            }
            current = match self.next(current)? {
                ClusterStatus::Next(n) => n,
                ClusterStatus::EndOfChain => return Err(Error::CorruptChain),
            };
        }

        Ok(())
    }
}
