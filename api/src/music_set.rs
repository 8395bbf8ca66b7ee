use std::fmt;

/// One of the remote's music listings for a user, or a specific playlist.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MusicType {
    Stream,
    Shows,
    Favorites,
    History,
    Playlist,
}

impl MusicType {
    /// Parses the path segment that follows a username, applying the
    /// `uploads -> shows`, `listens -> history`, `playlists -> playlist`
    /// normalizations. Returns `None` if the segment names none of the
    /// recognized music types.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment.to_ascii_lowercase().as_str() {
            "stream" => Some(Self::Stream),
            "shows" | "uploads" => Some(Self::Shows),
            "favorites" => Some(Self::Favorites),
            "history" | "listens" => Some(Self::History),
            "playlist" | "playlists" => Some(Self::Playlist),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::Shows => "shows",
            Self::Favorites => "favorites",
            Self::History => "history",
            Self::Playlist => "playlist",
        }
    }
}

impl fmt::Display for MusicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one feed: a remote username plus an optional explicit music
/// type (absent means "use the user's default view") plus, for playlists
/// only, the playlist slug.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MusicSet {
    pub username: String,
    pub music_type: Option<MusicType>,
    pub playlist_slug: Option<String>,
}

/// Errors constructing a `MusicSet` from request path segments.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum MusicSetError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("playlist slug is required for a playlist music set")]
    MissingPlaylistSlug,
    #[error("playlist slug is only meaningful for a playlist music set")]
    UnexpectedPlaylistSlug,
}

impl MusicSet {
    /// Strips a trailing possessive (`'s`, `’s`, or `‘s`) from a raw
    /// username as it appears in a URL path segment.
    pub fn normalize_username(raw: &str) -> String {
        for suffix in ["'s", "\u{2019}s", "\u{2018}s"] {
            if let Some(stripped) = raw.strip_suffix(suffix) {
                return stripped.to_string();
            }
        }
        raw.to_string()
    }

    pub fn new(
        username: impl Into<String>,
        music_type: Option<MusicType>,
        playlist_slug: Option<String>,
    ) -> Result<Self, MusicSetError> {
        let username = Self::normalize_username(&username.into());
        if username.is_empty() {
            return Err(MusicSetError::EmptyUsername);
        }

        match music_type {
            Some(MusicType::Playlist) => {
                if playlist_slug.is_none() {
                    return Err(MusicSetError::MissingPlaylistSlug);
                }
            }
            _ => {
                if playlist_slug.is_some() {
                    return Err(MusicSetError::UnexpectedPlaylistSlug);
                }
            }
        }

        Ok(Self {
            username,
            music_type,
            playlist_slug,
        })
    }

    /// Returns the `PodcastCache`/default-view-cache key for this set. Only
    /// meaningful once `music_type` has been resolved (the default-view
    /// cache is consulted separately when it is still `None`).
    pub fn fingerprint(&self) -> Option<String> {
        match self.music_type {
            Some(MusicType::Playlist) => Some(format!(
                "{}'s {}",
                self.username,
                self.playlist_slug.as_deref().unwrap_or_default()
            )),
            Some(t) => Some(format!("{}'s {}", self.username, t.as_str())),
            None => None,
        }
    }

    /// Copies this set with a resolved music type, as happens after a
    /// default-view lookup.
    pub fn with_type(&self, music_type: MusicType) -> Self {
        Self {
            username: self.username.clone(),
            music_type: Some(music_type),
            playlist_slug: self.playlist_slug.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_possessive_suffixes() {
        assert_eq!(MusicSet::normalize_username("dj_shadow's"), "dj_shadow");
        assert_eq!(MusicSet::normalize_username("dj_shadow\u{2019}s"), "dj_shadow");
        assert_eq!(MusicSet::normalize_username("plainname"), "plainname");
    }

    #[test]
    fn normalizes_music_type_aliases() {
        assert_eq!(MusicType::parse("uploads"), Some(MusicType::Shows));
        assert_eq!(MusicType::parse("listens"), Some(MusicType::History));
        assert_eq!(MusicType::parse("playlists"), Some(MusicType::Playlist));
        assert_eq!(MusicType::parse("bogus"), None);
    }

    #[test]
    fn playlist_requires_slug() {
        assert!(matches!(
            MusicSet::new("alice", Some(MusicType::Playlist), None),
            Err(MusicSetError::MissingPlaylistSlug)
        ));
        assert!(MusicSet::new("alice", Some(MusicType::Playlist), Some("faves".into())).is_ok());
    }

    #[test]
    fn non_playlist_rejects_slug() {
        assert!(matches!(
            MusicSet::new("alice", Some(MusicType::Shows), Some("faves".into())),
            Err(MusicSetError::UnexpectedPlaylistSlug)
        ));
    }

    #[test]
    fn fingerprint_uses_slug_for_playlists() {
        let set = MusicSet::new("alice", Some(MusicType::Playlist), Some("faves".into())).unwrap();
        assert_eq!(set.fingerprint().as_deref(), Some("alice's faves"));

        let set = MusicSet::new("alice", Some(MusicType::Shows), None).unwrap();
        assert_eq!(set.fingerprint().as_deref(), Some("alice's shows"));

        let set = MusicSet::new("alice", None, None).unwrap();
        assert_eq!(set.fingerprint(), None);
    }
}
