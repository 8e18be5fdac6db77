//! End-to-end scenarios against an in-memory block device, covering the six
//! concrete walkthroughs `spec.md` §8 names. Replaces the teacher's
//! `tests/file_backed.rs`, which depended on a real disk image and the
//! `storage-traits` crate (see `DESIGN.md`).

use fat32_driver::fat::dir::{Attributes, DirEntry};
use fat32_driver::storage::{BlockDevice, MemoryBlockDevice};
use fat32_driver::FilesystemState;

const BYTES_PER_SECTOR: u16 = 512;
const RESERVED_SECTORS: u16 = 1;
const FAT_COUNT: u8 = 2;
const SECTORS_PER_FAT: u32 = 1;
const ROOT_DIR_CLUSTER: u32 = 2;
const DATA_CLUSTERS: u32 = 100;
const TOTAL_SECTORS: u32 = RESERVED_SECTORS as u32 + FAT_COUNT as u32 * SECTORS_PER_FAT + DATA_CLUSTERS;

fn make_volume() -> FilesystemState<MemoryBlockDevice> {
    let _ = env_logger::try_init();

    let mut device = MemoryBlockDevice::new(BYTES_PER_SECTOR as usize, TOTAL_SECTORS as usize);

    let mut boot = vec![0u8; BYTES_PER_SECTOR as usize];
    boot[0x00B..0x00D].copy_from_slice(&BYTES_PER_SECTOR.to_le_bytes());
    boot[0x00D] = 1;
    boot[0x00E..0x010].copy_from_slice(&RESERVED_SECTORS.to_le_bytes());
    boot[0x010] = FAT_COUNT;
    boot[0x024..0x028].copy_from_slice(&SECTORS_PER_FAT.to_le_bytes());
    boot[0x02C..0x030].copy_from_slice(&ROOT_DIR_CLUSTER.to_le_bytes());
    boot[0x020..0x024].copy_from_slice(&TOTAL_SECTORS.to_le_bytes());
    device.write(0, &boot).unwrap();

    let mut fat = vec![0u8; BYTES_PER_SECTOR as usize];
    fat[ROOT_DIR_CLUSTER as usize * 4..ROOT_DIR_CLUSTER as usize * 4 + 4]
        .copy_from_slice(&0x0FFF_FFFFu32.to_le_bytes());
    device.write(RESERVED_SECTORS as u64, &fat).unwrap();
    device.write(RESERVED_SECTORS as u64 + SECTORS_PER_FAT as u64, &fat).unwrap();

    FilesystemState::attach(device, false).unwrap()
}

#[test]
fn scenario_1_create_write_read_back() {
    let mut fs = make_volume();
    let handle = fs.create_file("/a.txt").unwrap();
    fs.write(&handle, 0, b"Hello world!\n").unwrap();

    assert_eq!(fs.stat("/a.txt").unwrap().size, 13);

    let mut buf = [0u8; 13];
    let n = fs.read(&handle, 0, &mut buf).unwrap();
    assert_eq!(n, 13);
    assert_eq!(&buf, b"Hello world!\n");
}

#[test]
fn scenario_2_sequential_appends_span_one_cluster_boundary() {
    let mut fs = make_volume();
    let handle = fs.create_file("/b.bin").unwrap();
    let chunk = [b'x'; 200];

    for offset in [0u64, 200, 400, 600] {
        fs.write(&handle, offset, &chunk).unwrap();
    }

    assert_eq!(fs.stat("/b.bin").unwrap().size, 800);

    let mut buf = [0u8; 800];
    assert_eq!(fs.read(&handle, 0, &mut buf).unwrap(), 800);
    assert!(buf.iter().all(|&b| b == b'x'));
}

#[test]
fn scenario_3_overwrite_in_place() {
    let mut fs = make_volume();
    let handle = fs.create_file("/c.bin").unwrap();
    fs.write(&handle, 0, &[b'B'; 1000]).unwrap();

    fs.write(&handle, 0, &[b'A'; 50]).unwrap();

    assert_eq!(fs.stat("/c.bin").unwrap().size, 1000);

    let mut buf = [0u8; 1000];
    fs.read(&handle, 0, &mut buf).unwrap();
    assert!(buf[..50].iter().all(|&b| b == b'A'));
    assert!(buf[50..].iter().all(|&b| b == b'B'));
}

#[test]
fn scenario_4_truncate_shrink_then_grow() {
    let mut fs = make_volume();
    let handle = fs.create_file("/d.bin").unwrap();
    fs.write(&handle, 0, &[b'z'; 2000]).unwrap();

    fs.truncate("/d.bin", 500).unwrap();
    assert_eq!(fs.stat("/d.bin").unwrap().size, 500);

    fs.truncate("/d.bin", 1500).unwrap();
    assert_eq!(fs.stat("/d.bin").unwrap().size, 1500);

    let mut buf = [0u8; 1500];
    fs.read(&handle, 0, &mut buf).unwrap();
    assert!(buf[..500].iter().all(|&b| b == b'z'));
    assert!(buf[500..].iter().all(|&b| b == 0));
}

#[test]
fn scenario_5_create_in_full_directory_grows_chain() {
    let mut fs = make_volume();
    let entries_per_cluster = fs.cluster_size() / 32;

    for i in 0..entries_per_cluster {
        fs.create_file(&format!("/f{}.bin", i)).unwrap();
    }

    fs.create_file("/overflow.bin").unwrap();
    assert!(fs.exists("/overflow.bin"));
    assert!(fs.stat("/overflow.bin").unwrap().size == 0);
}

#[test]
fn scenario_6_remove_frees_clusters() {
    let mut fs = make_volume();
    let cluster_size = fs.cluster_size();
    // Large enough relative to `DATA_CLUSTERS` that a second allocation of
    // the same size only succeeds if `remove` actually returned the first
    // file's chain to the free list.
    let almost_all = (DATA_CLUSTERS as usize - 4) * cluster_size;

    let handle = fs.create_file("/big").unwrap();
    fs.write(&handle, 0, &vec![b'q'; almost_all]).unwrap();
    fs.remove("/big").unwrap();
    assert!(!fs.exists("/big"));

    let handle2 = fs.create_file("/big2").unwrap();
    fs.write(&handle2, 0, &vec![b'q'; almost_all]).unwrap();
    assert_eq!(fs.stat("/big2").unwrap().size as usize, almost_all);
}

#[test]
fn rename_within_same_directory() {
    let mut fs = make_volume();
    fs.create_file("/old.txt").unwrap();
    fs.rename("/old.txt", "/new.txt", false).unwrap();
    assert!(!fs.exists("/old.txt"));
    assert!(fs.exists("/new.txt"));
}

#[test]
fn rename_across_directories_is_rejected() {
    let mut fs = make_volume();
    fs.create_dir("/sub").unwrap();
    fs.create_file("/a.txt").unwrap();
    assert_eq!(
        fs.rename("/a.txt", "/sub/a.txt", false).unwrap_err(),
        fat32_driver::Error::InvalidArgument
    );
}

#[test]
fn write_to_readonly_file_is_permission_denied() {
    // No public op sets the `READ_ONLY` attribute (`create`'s `spec.md`
    // §4.8 signature doesn't take one), so this authors the directory
    // entry by hand through the crate's low-level primitives
    // (`resolve_parent`, `find_free_slot`, `write_dir_entry`) the same way
    // `fat::ops::tests::write_to_readonly_file_is_permission_denied` does,
    // then drives the rejection itself through the public `write` op.
    let mut fs = make_volume();
    let parent = fs.resolve_parent("/ro.bin").unwrap();
    let slot = fs.find_free_slot(parent.parent_cluster).unwrap();
    let cluster = fs
        .fat_mut()
        .allocate_chain::<<MemoryBlockDevice as BlockDevice>::Err>(1)
        .unwrap();
    fs.flush_fat().unwrap();
    let entry = DirEntry::new(parent.short_name, cluster, Attributes::file(true));
    fs.write_dir_entry(slot, &entry).unwrap();

    let handle = fs.open("/ro.bin").unwrap();
    assert_eq!(
        fs.write(&handle, 0, b"x").unwrap_err(),
        fat32_driver::Error::Permission
    );
}
