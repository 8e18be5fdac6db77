//! The error taxonomy shared by every fallible operation in this crate.

use core::fmt::{self, Debug, Display};

/// Everything that can go wrong while resolving a path, walking a cluster
/// chain, or talking to the block device.
#[derive(Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error<D> {
    /// The path did not resolve to an existing entry.
    NotFound,
    /// `create`/`rename` target already exists.
    AlreadyExists,
    /// Write attempted against an entry with the `readonly` attribute set.
    Permission,
    /// A read or write was attempted at `offset > file_size`.
    InvalidOffset,
    /// The FAT has no `FREE` entries left to satisfy a chain growth.
    OutOfSpace,
    /// A FAT entry fell outside the `FREE` / successor / `EOC` ranges, or a
    /// chain failed to terminate within `data_end - data_start` hops.
    CorruptChain,
    /// The underlying block device reported a failure.
    Io(D),
    /// A null buffer, empty path component, or otherwise malformed argument.
    InvalidArgument,
}

impl<D: Debug> Debug for Error<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => write!(fmt, "NotFound"),
            Error::AlreadyExists => write!(fmt, "AlreadyExists"),
            Error::Permission => write!(fmt, "Permission"),
            Error::InvalidOffset => write!(fmt, "InvalidOffset"),
            Error::OutOfSpace => write!(fmt, "OutOfSpace"),
            Error::CorruptChain => write!(fmt, "CorruptChain"),
            Error::Io(d) => write!(fmt, "Io({:?})", d),
            Error::InvalidArgument => write!(fmt, "InvalidArgument"),
        }
    }
}

impl<D: Debug> Display for Error<D> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => write!(fmt, "path does not resolve to an entry"),
            Error::AlreadyExists => write!(fmt, "target already exists"),
            Error::Permission => write!(fmt, "permission denied (readonly entry)"),
            Error::InvalidOffset => write!(fmt, "offset past end of file"),
            Error::OutOfSpace => write!(fmt, "no free clusters available"),
            Error::CorruptChain => write!(fmt, "FAT chain entry out of range"),
            Error::Io(d) => write!(fmt, "block device error: {:?}", d),
            Error::InvalidArgument => write!(fmt, "invalid argument"),
        }
    }
}

#[cfg(not(feature = "no_std"))]
impl<D: Debug> std::error::Error for Error<D> {}

pub type Result<T, D> = core::result::Result<T, Error<D>>;
