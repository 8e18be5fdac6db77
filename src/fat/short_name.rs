//! 8.3 short-name encoding.
//!
//! `spec.md` §4.5: split on the last `.`, uppercase, space-pad the name to
//! 8 bytes and the extension to 3, truncating either half if it runs long.
//! No long-filename extension (`spec.md` §1 non-goals).

/// A name/extension pair exactly as a directory entry stores it:
/// space-padded, uppercase, 8 and 3 bytes respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortName {
    pub name: [u8; 8],
    pub ext: [u8; 3],
}

const PAD: u8 = b' ';

fn pad_truncate<const N: usize>(src: &str) -> [u8; N] {
    let mut out = [PAD; N];
    for (i, b) in src.bytes().take(N).enumerate() {
        out[i] = b.to_ascii_uppercase();
    }
    out
}

/// Splits `component` (a single path component, not a full path) into its
/// 8.3 short name. The split point is the *last* `.` in the component, so
/// `archive.tar.gz` becomes name `ARCHIVE.` ext `GZ ` (the `.tar` is folded
/// into an over-long name and truncated) — the teacher crate's own
/// `FileName`/`FileExt::new` simply discarded names over 8/3 bytes; this is
/// the split/truncate behavior `spec.md` actually calls for.
pub fn split(component: &str) -> ShortName {
    let (name, ext) = match component.rfind('.') {
        Some(0) => (component, ""), // a leading dot is part of the name, not a separator
        Some(idx) => (&component[..idx], &component[idx + 1..]),
        None => (component, ""),
    };

    ShortName {
        name: pad_truncate::<8>(name),
        ext: pad_truncate::<3>(ext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_last_dot() {
        let s = split("hello.txt");
        assert_eq!(&s.name, b"HELLO   ");
        assert_eq!(&s.ext, b"TXT");
    }

    #[test]
    fn pads_short_components() {
        let s = split("a.b");
        assert_eq!(&s.name, b"A       ");
        assert_eq!(&s.ext, b"B  ");
    }

    #[test]
    fn truncates_long_components() {
        let s = split("verylongname.extra");
        assert_eq!(&s.name, b"VERYLONG");
        assert_eq!(&s.ext, b"EXT");
    }

    #[test]
    fn no_extension() {
        let s = split("README");
        assert_eq!(&s.name, b"README  ");
        assert_eq!(&s.ext, b"   ");
    }

    #[test]
    fn leading_dot_is_not_a_separator() {
        let s = split(".bashrc");
        assert_eq!(&s.name, b".BASHRC ");
        assert_eq!(&s.ext, b"   ");
    }
}
