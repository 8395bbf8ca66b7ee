use std::sync::Arc;
use std::time::Duration;

use podbridge_common::Config;

use crate::cache::{DefaultViewCache, PodcastCache};
use crate::queue::DownloadQueue;
use crate::remote::RemoteClient;

/// Process-wide shared state, constructed once at startup and handed to
/// every request worker and the watcher via `Arc` clones (§9 "singletons").
pub struct AppState {
    pub config: Arc<Config>,
    pub queue: Arc<DownloadQueue>,
    pub podcast_cache: PodcastCache,
    pub default_view_cache: DefaultViewCache,
    pub remote: Arc<RemoteClient>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Arc<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .expect("reqwest client configuration is always valid");

        let queue = DownloadQueue::new(&config, http_client.clone());
        let remote = Arc::new(RemoteClient::new(http_client, config.remote_graphql_url.clone()));
        let ttl = Duration::from_secs(config.http_cache_time_seconds);

        Arc::new(Self {
            config,
            queue,
            podcast_cache: PodcastCache::new(ttl),
            default_view_cache: DefaultViewCache::new(ttl),
            remote,
        })
    }
}
