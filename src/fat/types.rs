//! The opaque handle the VFS layer carries between `open`/`create` and a
//! later `read`/`write`/`close`/`truncate` call.
//!
//! `spec.md` §3/§8: "A `handle` is an opaque reference to the path; the
//! caller must not inspect it." No open-file table is kept on this side
//! (§4.8 `open`): a `Handle` just remembers the path it was minted for and
//! every operation re-resolves it. Modeled as a `#[repr(transparent)]`
//! newtype, following the teacher's own newtype idiom in this module
//! (previously a generic `SectorIdx`/`ClusterIdx` macro, dropped here since
//! `fat::table::Cluster` and plain `u64` sector numbers serve those spots
//! just as well without an extra wrapper — see DESIGN.md).

use crate::scratch::BufString;
use core::fmt;

/// An opaque reference to an open file or directory.
///
/// Exposes no public accessor for the path it wraps: the contract in
/// `spec.md` is that callers treat this as inspectable only by the driver
/// itself. `Debug` is derived for diagnostics but never prints the path.
#[repr(transparent)]
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Handle(BufString);

impl Handle {
    pub(crate) fn new(path: BufString) -> Self {
        Self(path)
    }

    pub(crate) fn path(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "Handle(..)")
    }
}
