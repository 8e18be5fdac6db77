//! Path resolution: component-wise descent from the root directory.
//!
//! `spec.md` §4.6. Trailing `/` and empty components between two `/` are
//! rejected as `Error::InvalidArgument`; `/name` has an empty parent, which
//! resolves to the root directory's cluster.

use super::dir::{DirEntry, EntryLocation};
use super::short_name::{self, ShortName};
use super::table::Cluster;
use super::FilesystemState;
use crate::error::Error;
use crate::storage::BlockDevice;

/// A successfully descended parent directory plus the short name of the
/// final path component, not yet looked up within it.
pub struct ParentLookup {
    pub parent_cluster: Cluster,
    pub short_name: ShortName,
}

/// A fully resolved path: its parent directory, the location of the
/// matched entry within that directory's chain, and a copy of the entry.
pub struct Resolved {
    pub parent_cluster: Cluster,
    pub location: EntryLocation,
    pub entry: DirEntry,
}

/// Splits `path` into its `/`-separated components, rejecting the shapes
/// `spec.md` §4.6 calls out: anything not starting with `/`, a trailing
/// `/`, and empty components from a doubled `/`.
pub fn split_components<D>(path: &str) -> Result<crate::scratch::List<&str>, Error<D>> {
    if !path.starts_with('/') {
        return Err(Error::InvalidArgument);
    }
    if path.len() > 1 && path.ends_with('/') {
        return Err(Error::InvalidArgument);
    }

    let mut components = crate::scratch::List::new();
    for part in path.split('/').skip(1) {
        if part.is_empty() {
            return Err(Error::InvalidArgument);
        }
        components.push(part);
    }
    Ok(components)
}

impl<D: BlockDevice> FilesystemState<D> {
    /// Descends every component of `path` except the last, returning the
    /// containing directory's first cluster and the last component's short
    /// name. `spec.md` §4.6: "For `want_parent = true`, the resolver stops
    /// one level before the final component".
    pub fn resolve_parent(&mut self, path: &str) -> Result<ParentLookup, Error<D::Err>> {
        let components = split_components(path)?;
        let (last, ancestors) = components.split_last().ok_or(Error::InvalidArgument)?;

        let mut cluster = self.root_dir_cluster();
        for component in ancestors {
            let short = short_name::split(component);
            let (_, entry) = self
                .find_in_dir(cluster, &short)?
                .ok_or(Error::NotFound)?;
            if !entry.attributes.is_dir() {
                return Err(Error::NotFound);
            }
            cluster = entry.cluster();
        }

        Ok(ParentLookup {
            parent_cluster: cluster,
            short_name: short_name::split(last),
        })
    }

    /// Fully resolves `path`, returning `Error::NotFound` if any component
    /// (including the last) fails to match.
    pub fn resolve(&mut self, path: &str) -> Result<Resolved, Error<D::Err>> {
        let parent = self.resolve_parent(path)?;
        let (location, entry) = self
            .find_in_dir(parent.parent_cluster, &parent.short_name)?
            .ok_or(Error::NotFound)?;

        Ok(Resolved {
            parent_cluster: parent.parent_cluster,
            location,
            entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_paths() {
        assert!(split_components::<()>("a/b").is_err());
    }

    #[test]
    fn rejects_trailing_slash() {
        assert!(split_components::<()>("/a/b/").is_err());
    }

    #[test]
    fn rejects_empty_components() {
        assert!(split_components::<()>("/a//b").is_err());
    }

    #[test]
    fn root_is_empty_components() {
        assert_eq!(split_components::<()>("/").unwrap().len(), 0);
    }

    #[test]
    fn splits_ordinary_path() {
        assert_eq!(split_components::<()>("/a/b").unwrap(), vec!["a", "b"]);
    }
}
