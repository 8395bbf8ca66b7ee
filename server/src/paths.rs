use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Strips an optional `http://host` prefix and the query string, then
/// percent-decodes the remainder as UTF-8. Encoded slashes are treated
/// identically to literal slashes: decoding is unconditional (§4.8).
pub fn request_path_to_relative(raw_url: &str) -> String {
    let without_scheme = if let Some(rest) = raw_url.strip_prefix("http://") {
        match rest.find('/') {
            Some(idx) => &rest[idx..],
            None => "/",
        }
    } else {
        raw_url
    };

    let without_query = match without_scheme.find('?') {
        Some(idx) => &without_scheme[..idx],
        None => without_scheme,
    };

    percent_decode_str(without_query)
        .decode_utf8_lossy()
        .into_owned()
}

/// Resolves a request path to a file beneath `music_dir` by sanitizing the
/// relative path itself, never by canonicalizing the real filesystem path.
///
/// A `..` component pops one level of the *conceptual* path built up so
/// far; a `..` with nothing left to pop is simply dropped rather than
/// escaping the root. This means `GET /../etc/passwd` resolves to
/// `music_dir/etc/passwd` and then 404s because the file isn't there — it
/// never sees `/etc/passwd` on disk. `Forbidden` (403) is reserved for
/// callers that bypass this sanitizer entirely (§8 scenario 5).
pub fn resolve_local_path(music_dir: &Path, relative: &str) -> PathBuf {
    let mut stack: Vec<&str> = Vec::new();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            seg => stack.push(seg),
        }
    }

    let mut resolved = music_dir.to_path_buf();
    for segment in stack {
        resolved.push(segment);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_query() {
        let p = request_path_to_relative("http://host.example/alice/track.m4a?x=1");
        assert_eq!(p, "/alice/track.m4a");
    }

    #[test]
    fn decodes_percent_escapes() {
        let p = request_path_to_relative("/alice%2Ftrack.m4a");
        assert_eq!(p, "/alice/track.m4a");
    }

    #[test]
    fn traversal_clamps_to_music_root_instead_of_escaping() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_local_path(dir.path(), "/../etc/passwd");
        assert_eq!(resolved, dir.path().join("etc").join("passwd"));
        assert!(resolved.starts_with(dir.path()));
        assert!(!resolved.exists());
    }

    #[test]
    fn excess_dotdot_segments_are_simply_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_local_path(dir.path(), "/../../../x");
        assert_eq!(resolved, dir.path().join("x"));
    }

    #[test]
    fn normal_path_resolves_under_music_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("alice")).unwrap();
        let resolved = resolve_local_path(dir.path(), "/alice/track.m4a");
        assert_eq!(resolved, dir.path().join("alice").join("track.m4a"));
    }
}
