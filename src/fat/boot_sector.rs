//! The FAT32 BIOS Parameter Block (BPB) and the geometry it encodes.
//!
//! Only the fields this driver actually consults are kept; the DOS
//! 2.0/3.31 CHS-geometry fields (`phys_sectors_per_track`, `num_heads`,
//! `media_descriptor`, …) are never read by any operation this crate
//! implements and are not modeled.

use crate::error::Error;
use crate::storage::BlockDevice;

use core::convert::TryInto;

/// A parsed BIOS Parameter Block, sector 0 of the volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiosParameterBlock {
    /// Bytes per logical sector. Must be a nonzero power of two.
    pub bytes_per_sector: u16,
    /// Logical sectors per cluster. Must be a nonzero power of two.
    pub sectors_per_cluster: u8,
    /// Sectors reserved before the first FAT copy (the boot sector itself
    /// counts as one of these).
    pub reserved_sectors: u16,
    /// Number of FAT copies kept on disk (typically 2).
    pub fat_count: u8,
    /// Sectors occupied by a single FAT copy.
    pub sectors_per_fat: u32,
    /// First cluster of the root directory (typically 2).
    pub root_dir_cluster: u32,
    /// Total sectors on the volume.
    pub total_sectors: u32,
    /// Volume serial number, for diagnostics only.
    pub volume_id: u32,
    /// Volume label, space-padded, for diagnostics only.
    pub volume_label: [u8; 11],
}

// Offsets are relative to the start of the 512-byte boot sector, matching
// the standard FAT32 BPB layout.
pub(crate) const OFF_BYTES_PER_SECTOR: usize = 0x00B;
pub(crate) const OFF_SECTORS_PER_CLUSTER: usize = 0x00D;
pub(crate) const OFF_RESERVED_SECTORS: usize = 0x00E;
pub(crate) const OFF_FAT_COUNT: usize = 0x010;
pub(crate) const OFF_SECTORS_PER_FAT_32: usize = 0x024;
pub(crate) const OFF_ROOT_DIR_CLUSTER: usize = 0x02C;
pub(crate) const OFF_TOTAL_SECTORS_32: usize = 0x020;
const OFF_VOLUME_ID: usize = 0x043;
const OFF_VOLUME_LABEL: usize = 0x047;

macro_rules! read_le {
    ($ty:tt, $buf:expr, $offset:expr) => {
        $ty::from_le_bytes($buf[$offset..$offset + core::mem::size_of::<$ty>()].try_into().unwrap())
    };
}

impl BiosParameterBlock {
    /// Parses a BPB out of the raw 512-byte boot sector and checks the
    /// sanity invariants `spec.md` §4.2 requires.
    pub fn parse<D>(sector: &[u8]) -> Result<Self, Error<D>> {
        let bpb = Self {
            bytes_per_sector: read_le!(u16, sector, OFF_BYTES_PER_SECTOR),
            sectors_per_cluster: sector[OFF_SECTORS_PER_CLUSTER],
            reserved_sectors: read_le!(u16, sector, OFF_RESERVED_SECTORS),
            fat_count: sector[OFF_FAT_COUNT],
            sectors_per_fat: read_le!(u32, sector, OFF_SECTORS_PER_FAT_32),
            root_dir_cluster: read_le!(u32, sector, OFF_ROOT_DIR_CLUSTER),
            total_sectors: read_le!(u32, sector, OFF_TOTAL_SECTORS_32),
            volume_id: read_le!(u32, sector, OFF_VOLUME_ID),
            volume_label: sector[OFF_VOLUME_LABEL..OFF_VOLUME_LABEL + 11].try_into().unwrap(),
        };

        bpb.validate()?;
        Ok(bpb)
    }

    /// Sanity-checks the BPB itself (`spec.md` §4.2). A malformed bootrecord
    /// is not a `CorruptChain` (§7 reserves that row for a FAT entry outside
    /// its defined ranges, or a chain that fails to terminate) — it's a
    /// malformed argument to `attach`.
    fn validate<D>(&self) -> Result<(), Error<D>> {
        let pow2 = |n: u32| n != 0 && (n & (n - 1)) == 0;

        if !pow2(self.bytes_per_sector as u32) {
            return Err(Error::InvalidArgument);
        }
        if !pow2(self.sectors_per_cluster as u32) {
            return Err(Error::InvalidArgument);
        }
        if self.fat_count < 1 {
            return Err(Error::InvalidArgument);
        }
        if self.root_dir_cluster < 2 {
            return Err(Error::InvalidArgument);
        }

        Ok(())
    }

    /// Absolute starting sector of the first FAT copy: immediately after
    /// the reserved region.
    pub fn fat_start_sector(&self) -> u32 {
        self.reserved_sectors as u32
    }

    /// Absolute starting sector of the `n`th (0-based) FAT copy.
    pub fn fat_copy_start_sector(&self, n: u8) -> u32 {
        self.fat_start_sector() + (n as u32) * self.sectors_per_fat
    }

    /// Absolute starting sector of the data region (cluster `root_dir_cluster`).
    pub fn data_start_sector(&self) -> u32 {
        self.reserved_sectors as u32 + (self.fat_count as u32) * self.sectors_per_fat
    }

    pub fn cluster_size_bytes(&self) -> u32 {
        self.bytes_per_sector as u32 * self.sectors_per_cluster as u32
    }

    /// The highest valid data cluster number: `data_end - data_start` in
    /// `spec.md`'s terms, expressed as an absolute cluster index.
    pub fn max_data_cluster(&self) -> u32 {
        let data_sectors = self.total_sectors - self.data_start_sector();
        let data_clusters = data_sectors / self.sectors_per_cluster as u32;
        self.root_dir_cluster + data_clusters - 1
    }
}

/// Reads and parses the boot sector (sector 0) off of `device`.
pub fn read<D: BlockDevice>(device: &mut D) -> Result<BiosParameterBlock, Error<D::Err>> {
    let mut sector = crate::scratch::zeroed(device.block_size());
    device.read(0, &mut sector).map_err(Error::Io)?;
    BiosParameterBlock::parse(&sector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sector(
        bytes_per_sector: u16,
        sectors_per_cluster: u8,
        reserved_sectors: u16,
        fat_count: u8,
        sectors_per_fat: u32,
        root_dir_cluster: u32,
        total_sectors: u32,
    ) -> [u8; 512] {
        let mut s = [0u8; 512];
        s[OFF_BYTES_PER_SECTOR..OFF_BYTES_PER_SECTOR + 2].copy_from_slice(&bytes_per_sector.to_le_bytes());
        s[OFF_SECTORS_PER_CLUSTER] = sectors_per_cluster;
        s[OFF_RESERVED_SECTORS..OFF_RESERVED_SECTORS + 2].copy_from_slice(&reserved_sectors.to_le_bytes());
        s[OFF_FAT_COUNT] = fat_count;
        s[OFF_SECTORS_PER_FAT_32..OFF_SECTORS_PER_FAT_32 + 4].copy_from_slice(&sectors_per_fat.to_le_bytes());
        s[OFF_ROOT_DIR_CLUSTER..OFF_ROOT_DIR_CLUSTER + 4].copy_from_slice(&root_dir_cluster.to_le_bytes());
        s[OFF_TOTAL_SECTORS_32..OFF_TOTAL_SECTORS_32 + 4].copy_from_slice(&total_sectors.to_le_bytes());
        s
    }

    #[test]
    fn parses_well_formed_bpb() {
        let sector = make_sector(512, 1, 32, 2, 16, 2, 4096);
        let bpb = BiosParameterBlock::parse::<core::convert::Infallible>(&sector).unwrap();

        assert_eq!(bpb.bytes_per_sector, 512);
        assert_eq!(bpb.sectors_per_cluster, 1);
        assert_eq!(bpb.fat_count, 2);
        assert_eq!(bpb.fat_start_sector(), 32);
        assert_eq!(bpb.fat_copy_start_sector(1), 32 + 16);
        assert_eq!(bpb.data_start_sector(), 32 + 2 * 16);
    }

    #[test]
    fn rejects_non_power_of_two_sector_size() {
        let sector = make_sector(500, 1, 32, 2, 16, 2, 4096);
        assert!(BiosParameterBlock::parse::<core::convert::Infallible>(&sector).is_err());
    }

    #[test]
    fn rejects_root_cluster_below_two() {
        let sector = make_sector(512, 1, 32, 2, 16, 1, 4096);
        assert!(BiosParameterBlock::parse::<core::convert::Infallible>(&sector).is_err());
    }
}
