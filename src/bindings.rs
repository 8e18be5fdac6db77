//! C bindings for this crate: the VFS operation table and `attach`/`detach`
//! lifecycle `spec.md` §6 specifies, realized as `#[no_mangle] extern "C"`
//! entry points over an opaque `state`/`handle` pair of raw pointers.
//!
//! The underlying block device is consumed, not reimplemented (`spec.md`
//! §1): `ExternBlockDevice` is a thin `BlockDevice` impl over three
//! externally linked functions matching §6's block device interface
//! (`get_characteristics`, `read`, `write`), grounded on the teacher's own
//! `edisk::EDiskStorage` shim.

use crate::error::Error;
use crate::fat::{FilesystemState, Handle, Stat};
use crate::registry::Registry;
use crate::scratch::BoxOf;
use crate::storage::BlockDevice;

use core::slice;
use core::str;
use core::sync::atomic::{AtomicPtr, Ordering};

/// A block device identified by a small integer the kernel assigns; name
/// resolution (`spec.md` §6 `device_name`) happens on the other side of
/// this FFI boundary, which is why `attach` below takes a `dev_id` rather
/// than a string.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ExternBlockDevice {
    dev_id: u32,
    block_size: u32,
    num_blocks: u64,
}

/// Mirrors `get_characteristics(dev) -> {block_size, num_blocks}`.
#[repr(C)]
pub struct DeviceCharacteristics {
    pub block_size: u32,
    pub num_blocks: u64,
}

extern "C" {
    fn get_characteristics(dev_id: u32, out: *mut DeviceCharacteristics) -> i32;
    fn block_read(dev_id: u32, start_block: u64, num_blocks: u32, buf: *mut u8, blocking: u8) -> i32;
    fn block_write(dev_id: u32, start_block: u64, num_blocks: u32, buf: *const u8, blocking: u8) -> i32;
}

impl ExternBlockDevice {
    /// Queries `get_characteristics` for `dev_id` and wraps the result.
    fn open(dev_id: u32) -> Result<Self, ()> {
        let mut characteristics = DeviceCharacteristics { block_size: 0, num_blocks: 0 };
        let rc = unsafe { get_characteristics(dev_id, &mut characteristics) };
        if rc != 0 || characteristics.block_size == 0 {
            return Err(());
        }
        Ok(Self {
            dev_id,
            block_size: characteristics.block_size,
            num_blocks: characteristics.num_blocks,
        })
    }
}

impl BlockDevice for ExternBlockDevice {
    type Err = i32;

    fn block_size(&self) -> usize {
        self.block_size as usize
    }

    fn num_blocks(&self) -> usize {
        self.num_blocks as usize
    }

    fn read(&mut self, start_block: u64, buf: &mut [u8]) -> Result<(), Self::Err> {
        let count = (buf.len() / self.block_size as usize) as u32;
        match unsafe { block_read(self.dev_id, start_block, count, buf.as_mut_ptr(), 1) } {
            0 => Ok(()),
            e => Err(e),
        }
    }

    fn write(&mut self, start_block: u64, buf: &[u8]) -> Result<(), Self::Err> {
        let count = (buf.len() / self.block_size as usize) as u32;
        match unsafe { block_write(self.dev_id, start_block, count, buf.as_ptr(), 1) } {
            0 => Ok(()),
            e => Err(e),
        }
    }
}

/// A lazily-initialized, process-wide registry. `AtomicPtr` (rather than a
/// `Mutex<Option<_>>`) sidesteps every backend's `Mutex::new` needing to be
/// `const`, which `bare_metal`/`external_mutex`'s `Cell`-based constructors
/// aren't once routed through the `MutexInterface` trait.
static REGISTRY: AtomicPtr<Registry<ExternBlockDevice>> = AtomicPtr::new(core::ptr::null_mut());

fn registry() -> &'static Registry<ExternBlockDevice> {
    let mut ptr = REGISTRY.load(Ordering::Acquire);
    if ptr.is_null() {
        let fresh = BoxOf::into_raw(BoxOf::new(Registry::new()));
        match REGISTRY.compare_exchange(core::ptr::null_mut(), fresh, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => ptr = fresh,
            Err(existing) => {
                drop(unsafe { BoxOf::from_raw(fresh) });
                ptr = existing;
            }
        }
    }
    unsafe { &*ptr }
}

/// Reads a `(ptr, len)` pair sent across the FFI boundary as a UTF-8 `str`.
/// Returns `None` on a null pointer or invalid UTF-8, both `InvalidArgument`
/// at the call sites below.
unsafe fn str_from_raw<'a>(ptr: *const u8, len: u32) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    str::from_utf8(slice::from_raw_parts(ptr, len as usize)).ok()
}

#[repr(C)]
pub struct CStat {
    pub size: u32,
    pub is_dir: u8,
    pub readonly: u8,
}

impl From<Stat> for CStat {
    fn from(s: Stat) -> Self {
        CStat { size: s.size, is_dir: s.is_dir as u8, readonly: s.readonly as u8 }
    }
}

fn result_code<T, E>(r: Result<T, Error<E>>) -> i32 {
    if r.is_ok() { 0 } else { -1 }
}

/// `spec.md` §6 `attach(device_name, fs_name, readonly)`. `dev_id` stands
/// in for `device_name` (see `ExternBlockDevice`'s doc comment); `fs_name`
/// is a `(ptr, len)` pair since this crate makes no libc/`CStr` assumption.
#[no_mangle]
pub unsafe extern "C" fn attach(
    dev_id: u32,
    fs_name: *const u8,
    fs_name_len: u32,
    readonly: u8,
) -> *mut FilesystemState<ExternBlockDevice> {
    let name = match str_from_raw(fs_name, fs_name_len) {
        Some(n) => n,
        None => return core::ptr::null_mut(),
    };
    let device = match ExternBlockDevice::open(dev_id) {
        Ok(d) => d,
        Err(()) => return core::ptr::null_mut(),
    };

    match registry().attach(name, device, readonly != 0) {
        Ok(ptr) => {
            log::info!("fat32 volume '{}' attached on device {}", name, dev_id);
            ptr
        }
        Err(_) => core::ptr::null_mut(),
    }
}

/// `spec.md` §6 `detach(fs_name)`. Does not flush; callers must sync first.
#[no_mangle]
pub unsafe extern "C" fn detach(fs_name: *const u8, fs_name_len: u32) -> i32 {
    let name = match str_from_raw(fs_name, fs_name_len) {
        Some(n) => n,
        None => return -1,
    };
    result_code(registry().detach(name))
}

#[no_mangle]
pub unsafe extern "C" fn stat(
    state: *mut FilesystemState<ExternBlockDevice>,
    handle: *const Handle,
    out: *mut CStat,
) -> i32 {
    if state.is_null() || handle.is_null() || out.is_null() {
        return -1;
    }
    match (*state).stat_handle(&*handle) {
        Ok(s) => {
            *out = s.into();
            0
        }
        Err(_) => -1,
    }
}

#[no_mangle]
pub unsafe extern "C" fn stat_path(
    state: *mut FilesystemState<ExternBlockDevice>,
    path: *const u8,
    path_len: u32,
    out: *mut CStat,
) -> i32 {
    if state.is_null() || out.is_null() {
        return -1;
    }
    let path = match str_from_raw(path, path_len) {
        Some(p) => p,
        None => return -1,
    };
    match (*state).stat(path) {
        Ok(s) => {
            *out = s.into();
            0
        }
        Err(_) => -1,
    }
}

#[no_mangle]
pub unsafe extern "C" fn create_file(
    state: *mut FilesystemState<ExternBlockDevice>,
    path: *const u8,
    path_len: u32,
) -> *mut Handle {
    if state.is_null() {
        return core::ptr::null_mut();
    }
    let path = match str_from_raw(path, path_len) {
        Some(p) => p,
        None => return core::ptr::null_mut(),
    };
    match (*state).create_file(path) {
        Ok(h) => BoxOf::into_raw(BoxOf::new(h)),
        Err(_) => core::ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn create_dir(
    state: *mut FilesystemState<ExternBlockDevice>,
    path: *const u8,
    path_len: u32,
) -> i32 {
    if state.is_null() {
        return -1;
    }
    let path = match str_from_raw(path, path_len) {
        Some(p) => p,
        None => return -1,
    };
    result_code((*state).create_dir(path))
}

#[no_mangle]
pub unsafe extern "C" fn exists(
    state: *mut FilesystemState<ExternBlockDevice>,
    path: *const u8,
    path_len: u32,
) -> u8 {
    if state.is_null() {
        return 0;
    }
    match str_from_raw(path, path_len) {
        Some(p) => (*state).exists(p) as u8,
        None => 0,
    }
}

#[no_mangle]
pub unsafe extern "C" fn remove(
    state: *mut FilesystemState<ExternBlockDevice>,
    path: *const u8,
    path_len: u32,
) -> i32 {
    if state.is_null() {
        return -1;
    }
    let path = match str_from_raw(path, path_len) {
        Some(p) => p,
        None => return -1,
    };
    result_code((*state).remove(path))
}

#[no_mangle]
pub unsafe extern "C" fn read_file(
    state: *mut FilesystemState<ExternBlockDevice>,
    handle: *const Handle,
    buf: *mut u8,
    offset: u64,
    n: u32,
) -> i64 {
    if state.is_null() || handle.is_null() || buf.is_null() {
        return -1;
    }
    let slice = slice::from_raw_parts_mut(buf, n as usize);
    match (*state).read(&*handle, offset, slice) {
        Ok(bytes) => bytes as i64,
        Err(_) => -1,
    }
}

#[no_mangle]
pub unsafe extern "C" fn write_file(
    state: *mut FilesystemState<ExternBlockDevice>,
    handle: *const Handle,
    buf: *const u8,
    offset: u64,
    n: u32,
) -> i64 {
    if state.is_null() || handle.is_null() || buf.is_null() {
        return -1;
    }
    let slice = slice::from_raw_parts(buf, n as usize);
    match (*state).write(&*handle, offset, slice) {
        Ok(bytes) => bytes as i64,
        Err(_) => -1,
    }
}

#[no_mangle]
pub unsafe extern "C" fn open_file(
    state: *mut FilesystemState<ExternBlockDevice>,
    path: *const u8,
    path_len: u32,
) -> *mut Handle {
    if state.is_null() {
        return core::ptr::null_mut();
    }
    let path = match str_from_raw(path, path_len) {
        Some(p) => p,
        None => return core::ptr::null_mut(),
    };
    match (*state).open(path) {
        Ok(h) => BoxOf::into_raw(BoxOf::new(h)),
        Err(_) => core::ptr::null_mut(),
    }
}

/// `spec.md` §4.8/§9: a true no-op beyond reclaiming the boxed `Handle`.
#[no_mangle]
pub unsafe extern "C" fn close_file(
    state: *mut FilesystemState<ExternBlockDevice>,
    handle: *mut Handle,
) {
    if handle.is_null() {
        return;
    }
    let owned = BoxOf::from_raw(handle);
    if let Some(state) = state.as_mut() {
        state.close(*owned);
    }
}

#[no_mangle]
pub unsafe extern "C" fn trunc_file(
    state: *mut FilesystemState<ExternBlockDevice>,
    handle: *const Handle,
    len: u32,
) -> i32 {
    if state.is_null() || handle.is_null() {
        return -1;
    }
    let path = crate::scratch::string_from((*handle).path());
    result_code((*state).truncate(&path, len))
}

#[no_mangle]
pub unsafe extern "C" fn rename(
    state: *mut FilesystemState<ExternBlockDevice>,
    old: *const u8,
    old_len: u32,
    new: *const u8,
    new_len: u32,
    is_dir: u8,
) -> i32 {
    if state.is_null() {
        return -1;
    }
    let old = match str_from_raw(old, old_len) {
        Some(p) => p,
        None => return -1,
    };
    let new = match str_from_raw(new, new_len) {
        Some(p) => p,
        None => return -1,
    };
    result_code((*state).rename(old, new, is_dir != 0))
}
