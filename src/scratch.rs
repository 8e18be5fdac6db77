//! The heap-allocated scratch buffers this driver reads/writes sectors and
//! clusters through.
//!
//! `spec.md` §9 calls out the teacher crate's stack-allocated,
//! compile-time-sized (`GenericArray`) buffers as a pattern that needs
//! re-architecting, since cluster size is only known once the BPB has been
//! parsed at runtime. A single per-operation scratch buffer is all that's
//! needed because the driver is single-threaded and synchronous (`spec.md`
//! §5): there is never more than one read or write in flight.

#[cfg(feature = "no_std")]
extern crate alloc;

#[cfg(feature = "no_std")]
pub type Buf = alloc::vec::Vec<u8>;
#[cfg(feature = "no_std")]
pub type Buf32 = alloc::vec::Vec<u32>;
#[cfg(feature = "no_std")]
pub type BufString = alloc::string::String;

#[cfg(not(feature = "no_std"))]
pub type Buf = std::vec::Vec<u8>;
#[cfg(not(feature = "no_std"))]
pub type Buf32 = std::vec::Vec<u32>;
#[cfg(not(feature = "no_std"))]
pub type BufString = std::string::String;

#[cfg(feature = "no_std")]
pub type List<T> = alloc::vec::Vec<T>;
#[cfg(not(feature = "no_std"))]
pub type List<T> = std::vec::Vec<T>;

/// A heap box, used to hand out a stable pointer for an opaque C-ABI handle
/// (`crate::bindings`' `Handle`/`FilesystemState` pointers, `crate::registry`'s
/// attached volumes).
#[cfg(feature = "no_std")]
pub type BoxOf<T> = alloc::boxed::Box<T>;
#[cfg(not(feature = "no_std"))]
pub type BoxOf<T> = std::boxed::Box<T>;

/// A zero-filled scratch buffer of exactly `len` bytes.
pub fn zeroed(len: usize) -> Buf {
    #[cfg(feature = "no_std")]
    {
        alloc::vec![0u8; len]
    }
    #[cfg(not(feature = "no_std"))]
    {
        std::vec![0u8; len]
    }
}

/// An empty, growable list of cluster numbers.
pub fn cluster_list() -> Buf32 {
    #[cfg(feature = "no_std")]
    {
        alloc::vec::Vec::new()
    }
    #[cfg(not(feature = "no_std"))]
    {
        std::vec::Vec::new()
    }
}

/// An owned copy of `s`, used for path components that outlive the borrow
/// they were split from (e.g. a `Handle`'s path, or a rename's parent path).
pub fn string_from(s: &str) -> BufString {
    #[cfg(feature = "no_std")]
    {
        alloc::string::String::from(s)
    }
    #[cfg(not(feature = "no_std"))]
    {
        std::string::String::from(s)
    }
}
