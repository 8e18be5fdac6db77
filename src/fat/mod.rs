//! The FAT32 filesystem core: geometry, allocation table, directories, and
//! file I/O, wired together behind a single `FilesystemState`.

pub mod boot_sector;
pub mod dir;
pub mod file;
pub mod ops;
pub mod path;
pub mod short_name;
pub mod table;
pub mod types;

use crate::error::Error;
use crate::storage::BlockDevice;

use boot_sector::BiosParameterBlock;
use table::{Cluster, ClusterStatus, FatTable};

pub use ops::Stat;
pub use types::Handle;

/// Everything attached to one mounted volume: the device handle, the parsed
/// bootrecord, and the in-memory FAT (`spec.md` §3, "In-memory state").
///
/// Operations on a single `FilesystemState` are not internally serialized;
/// a caller driving it from more than one thread must hold its own lock
/// (`spec.md` §5) — this mirrors the registry in `crate::registry`, which
/// only protects the name → state lookup, not the state itself.
pub struct FilesystemState<D: BlockDevice> {
    device: D,
    bpb: BiosParameterBlock,
    fat: FatTable,
    readonly: bool,
}

impl<D: BlockDevice> FilesystemState<D> {
    /// Loads the bootrecord and FAT off `device` and reports the result.
    /// Corresponds to the `attach` step of `spec.md` §6 short of registering
    /// with a name, which `crate::registry` handles.
    pub fn attach(mut device: D, readonly: bool) -> Result<Self, Error<D::Err>> {
        let bpb = boot_sector::read(&mut device)?;
        let fat = FatTable::load(&mut device, &bpb)?;

        log::info!(
            "fat32 volume attached: block_size={} cluster_size={} fat_count={} total_sectors={}",
            bpb.bytes_per_sector,
            bpb.cluster_size_bytes(),
            bpb.fat_count,
            bpb.total_sectors,
        );

        Ok(Self { device, bpb, fat, readonly })
    }

    pub fn bpb(&self) -> &BiosParameterBlock {
        &self.bpb
    }

    pub fn readonly(&self) -> bool {
        self.readonly
    }

    pub fn root_dir_cluster(&self) -> Cluster {
        self.bpb.root_dir_cluster
    }

    pub fn cluster_size(&self) -> usize {
        self.bpb.cluster_size_bytes() as usize
    }

    pub fn read_sector(&mut self, sector: u64, buf: &mut [u8]) -> Result<(), Error<D::Err>> {
        self.device.read(sector, buf).map_err(|e| {
            log::error!("block read failed at sector {}", sector);
            Error::Io(e)
        })
    }

    pub fn write_sector(&mut self, sector: u64, buf: &[u8]) -> Result<(), Error<D::Err>> {
        self.device.write(sector, buf).map_err(|e| {
            log::error!("block write failed at sector {}", sector);
            Error::Io(e)
        })
    }

    /// `spec.md` §4.1 `read_cluster`.
    pub fn read_cluster(&mut self, c: Cluster, buf: &mut [u8]) -> Result<(), Error<D::Err>> {
        let sector = self.sector_of(c);
        self.read_sector(sector, buf)
    }

    /// `spec.md` §4.1 `write_cluster`.
    pub fn write_cluster(&mut self, c: Cluster, buf: &[u8]) -> Result<(), Error<D::Err>> {
        let sector = self.sector_of(c);
        self.write_sector(sector, buf)
    }

    fn sector_of(&self, c: Cluster) -> u64 {
        table::sector_of(
            self.bpb.data_start_sector(),
            self.bpb.sectors_per_cluster as u32,
            self.bpb.root_dir_cluster,
            c,
        )
    }

    /// `spec.md` §4.3 `next`, fixed to this filesystem's device error type.
    pub fn next(&self, c: Cluster) -> Result<ClusterStatus, Error<D::Err>> {
        self.fat.next(c)
    }

    pub fn fat_mut(&mut self) -> &mut FatTable {
        &mut self.fat
    }

    /// Writes the in-memory FAT out to every on-disk copy (`spec.md`
    /// §4.3 `flush`).
    pub fn flush_fat(&mut self) -> Result<(), Error<D::Err>> {
        self.fat.flush(&mut self.device)
    }
}
