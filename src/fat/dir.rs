//! Directory entries: the 32-byte on-disk record, its attribute byte, and
//! the cluster-scan helpers `spec.md` §4.5/§4.6 build on (first-free-slot
//! scan, short-name matching, entry array read/write).

use super::table::{self, Cluster, ClusterStatus};
use super::FilesystemState;
use crate::error::Error;
use crate::scratch::Buf;
use crate::storage::BlockDevice;
use crate::util::Bits;

use core::convert::TryInto;

/// The attribute byte (`spec.md` §3: "attri"). Only `READ_ONLY` and
/// `DIRECTORY` are interpreted by driver logic; the rest round-trip
/// unexamined (`SPEC_FULL.md` §3 expansion), following the teacher's own
/// `Attribute`/`AttributeSet` split.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes(pub u8);

impl Attributes {
    pub const READ_ONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const VOLUME_ID: u8 = 0x08;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;

    pub fn is_readonly(&self) -> bool {
        self.0.b(Self::READ_ONLY.trailing_zeros())
    }

    pub fn is_dir(&self) -> bool {
        self.0.b(Self::DIRECTORY.trailing_zeros())
    }

    pub fn file(readonly: bool) -> Self {
        let mut byte = 0u8;
        byte.set_bit(Self::READ_ONLY.trailing_zeros(), readonly);
        Attributes(byte)
    }

    pub fn dir() -> Self {
        let mut byte = 0u8;
        byte.set_bit(Self::DIRECTORY.trailing_zeros(), true);
        Attributes(byte)
    }
}

/// Size, in bytes, of one packed directory entry.
pub const ENTRY_SIZE: usize = 32;

const OFF_NAME: usize = 0;
const OFF_EXT: usize = 8;
const OFF_ATTR: usize = 11;
const OFF_CLUSTER_HI: usize = 20;
const OFF_CLUSTER_LO: usize = 26;
const OFF_SIZE: usize = 28;

/// A single 32-byte directory record, decoded.
///
/// Bytes this driver does not interpret (NT-reserved byte, creation/access/
/// write timestamps) are kept as two opaque blobs so an entry read off disk
/// and rewritten (e.g. by `rename`) does not lose foreign metadata; a
/// freshly created entry zeroes them, matching the teacher's `DirEntry`
/// layout without carrying named fields this driver never reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; 8],
    pub ext: [u8; 3],
    pub attributes: Attributes,
    /// Bytes 12..20: NT-reserved byte, creation tenths/time/date, last access date.
    reserved_pre: [u8; 8],
    cluster_hi: u16,
    /// Bytes 22..26: last-modified time and date.
    reserved_mid: [u8; 4],
    cluster_lo: u16,
    pub size: u32,
}

impl DirEntry {
    pub fn empty() -> Self {
        Self {
            name: [0; 8],
            ext: [0; 3],
            attributes: Attributes(0),
            reserved_pre: [0; 8],
            cluster_hi: 0,
            reserved_mid: [0; 4],
            cluster_lo: 0,
            size: 0,
        }
    }

    pub fn new(short: super::short_name::ShortName, cluster: Cluster, attributes: Attributes) -> Self {
        let (hi, lo) = table::encode(cluster);
        Self {
            name: short.name,
            ext: short.ext,
            attributes,
            reserved_pre: [0; 8],
            cluster_hi: hi,
            reserved_mid: [0; 4],
            cluster_lo: lo,
            size: 0,
        }
    }

    /// `spec.md` §3: "An entry whose `name[0]` is `0x00` is 'never used'".
    pub fn is_terminator(&self) -> bool {
        self.name[0] == 0x00
    }

    pub fn cluster(&self) -> Cluster {
        table::decode(self.cluster_hi, self.cluster_lo)
    }

    /// Exact 8.3 comparison against an already-split short name
    /// (`SPEC_FULL.md` §3: compare the parsed, normalized pair, not raw
    /// on-disk padding).
    pub fn matches(&self, short: &super::short_name::ShortName) -> bool {
        self.name == short.name && self.ext == short.ext
    }

    fn from_bytes(buf: &[u8; ENTRY_SIZE]) -> Self {
        Self {
            name: buf[OFF_NAME..OFF_NAME + 8].try_into().unwrap(),
            ext: buf[OFF_EXT..OFF_EXT + 3].try_into().unwrap(),
            attributes: Attributes(buf[OFF_ATTR]),
            reserved_pre: buf[12..20].try_into().unwrap(),
            cluster_hi: u16::from_le_bytes(buf[OFF_CLUSTER_HI..OFF_CLUSTER_HI + 2].try_into().unwrap()),
            reserved_mid: buf[22..26].try_into().unwrap(),
            cluster_lo: u16::from_le_bytes(buf[OFF_CLUSTER_LO..OFF_CLUSTER_LO + 2].try_into().unwrap()),
            size: u32::from_le_bytes(buf[OFF_SIZE..OFF_SIZE + 4].try_into().unwrap()),
        }
    }

    fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut buf = [0u8; ENTRY_SIZE];
        buf[OFF_NAME..OFF_NAME + 8].copy_from_slice(&self.name);
        buf[OFF_EXT..OFF_EXT + 3].copy_from_slice(&self.ext);
        buf[OFF_ATTR] = self.attributes.0;
        buf[12..20].copy_from_slice(&self.reserved_pre);
        buf[OFF_CLUSTER_HI..OFF_CLUSTER_HI + 2].copy_from_slice(&self.cluster_hi.to_le_bytes());
        buf[22..26].copy_from_slice(&self.reserved_mid);
        buf[OFF_CLUSTER_LO..OFF_CLUSTER_LO + 2].copy_from_slice(&self.cluster_lo.to_le_bytes());
        buf[OFF_SIZE..OFF_SIZE + 4].copy_from_slice(&self.size.to_le_bytes());
        buf
    }
}

/// Where, within a directory's cluster chain, one entry record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryLocation {
    pub cluster: Cluster,
    pub index: usize,
}

impl<D: BlockDevice> FilesystemState<D> {
    fn entries_per_cluster(&self) -> usize {
        self.cluster_size() / ENTRY_SIZE
    }

    fn read_cluster_buf(&mut self, c: Cluster) -> Result<Buf, Error<D::Err>> {
        let mut buf = crate::scratch::zeroed(self.cluster_size());
        self.read_cluster(c, &mut buf)?;
        Ok(buf)
    }

    /// Reads every entry packed into cluster `c`.
    pub(crate) fn read_dir_entries(&mut self, c: Cluster) -> Result<crate::scratch::List<DirEntry>, Error<D::Err>> {
        let buf = self.read_cluster_buf(c)?;
        let n = self.entries_per_cluster();
        let mut out = crate::scratch::List::with_capacity(n);
        for i in 0..n {
            let raw: [u8; ENTRY_SIZE] = buf[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE].try_into().unwrap();
            out.push(DirEntry::from_bytes(&raw));
        }
        Ok(out)
    }

    /// Writes one entry back into cluster `c` at `index`, leaving the rest
    /// of the cluster untouched. Public alongside `read_cluster`/
    /// `write_cluster`: a low-level primitive a caller can use to author a
    /// directory entry directly (e.g. one with attributes `create` has no
    /// parameter for, such as `READ_ONLY`).
    pub fn write_dir_entry(&mut self, loc: EntryLocation, entry: &DirEntry) -> Result<(), Error<D::Err>> {
        let mut buf = self.read_cluster_buf(loc.cluster)?;
        let start = loc.index * ENTRY_SIZE;
        buf[start..start + ENTRY_SIZE].copy_from_slice(&entry.to_bytes());
        self.write_cluster(loc.cluster, &buf)
    }

    /// Zeroes one 32-byte entry in place (`spec.md` §4.8 `remove`: "Zero
    /// the parent's directory entry (all 32 bytes)").
    pub(crate) fn zero_dir_entry(&mut self, loc: EntryLocation) -> Result<(), Error<D::Err>> {
        self.write_dir_entry(loc, &DirEntry::empty())
    }

    /// Walks `first_cluster`'s chain looking for an entry whose short name
    /// matches. Stops at a `name[0] == 0` terminator or end of chain
    /// (`spec.md` §4.6, steps 1-2).
    pub(crate) fn find_in_dir(
        &mut self,
        first_cluster: Cluster,
        short: &super::short_name::ShortName,
    ) -> Result<Option<(EntryLocation, DirEntry)>, Error<D::Err>> {
        let mut current = first_cluster;
        loop {
            let entries = self.read_dir_entries(current)?;
            for (index, entry) in entries.iter().enumerate() {
                if entry.is_terminator() {
                    return Ok(None);
                }
                if entry.matches(short) {
                    return Ok(Some((EntryLocation { cluster: current, index }, entry.clone())));
                }
            }

            match self.next(current)? {
                ClusterStatus::Next(n) => current = n,
                ClusterStatus::EndOfChain => return Ok(None),
            }
        }
    }

    /// Finds the first free slot (`name[0] == 0x00`) in `first_cluster`'s
    /// chain, growing the chain by one cluster if every visited cluster is
    /// full (`spec.md` §4.8 `create`, step 3). Public for the same reason as
    /// `write_dir_entry`: it's the other half of authoring a directory
    /// entry a caller builds by hand.
    pub fn find_free_slot(&mut self, first_cluster: Cluster) -> Result<EntryLocation, Error<D::Err>> {
        let mut current = first_cluster;
        loop {
            let entries = self.read_dir_entries(current)?;
            if let Some(index) = entries.iter().position(|e| e.is_terminator()) {
                return Ok(EntryLocation { cluster: current, index });
            }

            match self.next(current)? {
                ClusterStatus::Next(n) => current = n,
                ClusterStatus::EndOfChain => {
                    self.fat_mut().grow::<D::Err>(current, 1)?;
                    self.flush_fat()?;
                    let new_cluster = match self.next(current)? {
                        ClusterStatus::Next(n) => n,
                        ClusterStatus::EndOfChain => unreachable!("just grew this chain"),
                    };
                    self.zero_cluster(new_cluster)?;
                    return Ok(EntryLocation { cluster: new_cluster, index: 0 });
                }
            }
        }
    }

    fn zero_cluster(&mut self, c: Cluster) -> Result<(), Error<D::Err>> {
        let buf = crate::scratch::zeroed(self.cluster_size());
        self.write_cluster(c, &buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_roundtrips_through_bytes() {
        let short = super::super::short_name::split("hello.txt");
        let entry = DirEntry::new(short, 42, Attributes::file(false));
        let bytes = entry.to_bytes();
        let back = DirEntry::from_bytes(&bytes);
        assert_eq!(back.cluster(), 42);
        assert_eq!(&back.name, b"HELLO   ");
        assert_eq!(&back.ext, b"TXT");
        assert!(!back.attributes.is_dir());
    }

    #[test]
    fn terminator_entry_has_zero_name_byte() {
        assert!(DirEntry::empty().is_terminator());
    }

    #[test]
    fn dir_attribute_flag_round_trips() {
        let short = super::super::short_name::split("sub");
        let entry = DirEntry::new(short, 7, Attributes::dir());
        assert!(entry.attributes.is_dir());
        assert!(!entry.attributes.is_readonly());
    }
}
