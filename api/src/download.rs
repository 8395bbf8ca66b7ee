use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// One enclosure fetch. Identity for deduplication deliberately excludes
/// `remote_url`: the remote serves identical bytes from many shard
/// hostnames, so two `Download`s that differ only in `remote_url` are the
/// same logical download.
#[derive(Clone, Debug)]
pub struct Download {
    pub remote_url: String,
    pub length_bytes: u64,
    pub last_modified: DateTime<Utc>,
    pub local_file_path: PathBuf,
}

impl PartialEq for Download {
    fn eq(&self, other: &Self) -> bool {
        self.length_bytes == other.length_bytes
            && self.last_modified == other.last_modified
            && self.local_file_path == other.local_file_path
    }
}

impl Eq for Download {}

/// The suffix given to a download's staging file before it is atomically
/// renamed into place.
pub const PART_SUFFIX: &str = ".part";

impl Download {
    pub fn part_path(&self) -> PathBuf {
        let mut name = self.local_file_path.clone().into_os_string();
        name.push(PART_SUFFIX);
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dl(remote: &str, path: &str) -> Download {
        Download {
            remote_url: remote.to_string(),
            length_bytes: 100,
            last_modified: DateTime::from_timestamp(0, 0).unwrap(),
            local_file_path: PathBuf::from(path),
        }
    }

    #[test]
    fn identity_ignores_remote_url() {
        let a = dl("https://shard1.example/track.m4a", "/music/alice/track.m4a");
        let b = dl("https://shard9.example/track.m4a", "/music/alice/track.m4a");
        assert_eq!(a, b);
    }

    #[test]
    fn part_path_appends_suffix() {
        let d = dl("https://x/track.m4a", "/music/alice/track.m4a");
        assert_eq!(d.part_path(), PathBuf::from("/music/alice/track.m4a.part"));
    }
}
