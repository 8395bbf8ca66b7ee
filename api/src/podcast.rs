use chrono::{DateTime, Utc};

/// The enclosure (audio file) advertised for one episode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enclosure {
    /// URL this server advertises to podcast clients; served locally.
    pub local_url: String,
    /// The decoded, real URL on the remote's media hosts.
    pub remote_url: String,
    pub length_bytes: u64,
    /// Set once HEAD metadata (or local filesystem metadata) has resolved;
    /// an episode with this still unset at the end of the pipeline is
    /// dropped.
    pub last_modified: Option<DateTime<Utc>>,
    pub mime_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Episode {
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: DateTime<Utc>,
    pub author: String,
    pub duration_seconds: Option<u64>,
    pub image_url: Option<String>,
    pub enclosure: Enclosure,
}

impl Episode {
    /// An episode is only servable once its enclosure metadata has
    /// resolved (see §4.4: episodes with no `last_modified` are dropped).
    pub fn is_complete(&self) -> bool {
        self.enclosure.last_modified.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Podcast {
    pub user_id: String,
    pub title: String,
    pub link: String,
    pub language: String,
    pub description: String,
    pub author_and_owner_name: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub episodes: Vec<Episode>,
}

impl Podcast {
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}
