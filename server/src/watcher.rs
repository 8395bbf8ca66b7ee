use std::sync::Arc;

use podbridge_api::{Download, MusicSet, MusicType};

use crate::remote::{build_podcast, BuildContext};
use crate::state::AppState;

/// Parses one `watch_music_sets` entry: `user`, `user/type`, or
/// `user/playlist/slug` (§6 `watch_music_sets`).
fn parse_watch_entry(entry: &str) -> Option<MusicSet> {
    let segments: Vec<&str> = entry.trim().split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [username] => MusicSet::new(*username, None, None).ok(),
        [username, type_segment] => {
            let music_type = MusicType::parse(type_segment)?;
            MusicSet::new(*username, Some(music_type), None).ok()
        }
        [username, playlist_word, slug] if MusicType::parse(playlist_word) == Some(MusicType::Playlist) => {
            MusicSet::new(*username, Some(MusicType::Playlist), Some(slug.to_string())).ok()
        }
        _ => None,
    }
}

/// Runs the watcher loop: every `watch_interval_minutes`, re-builds the
/// feed for each configured music set and primes the shared download
/// queue, without ever writing an HTTP response (component Q). Errors for
/// one music set are logged and never stop the loop or affect others.
pub async fn run(state: Arc<AppState>) {
    let Some(interval_minutes) = state.config.watch_interval_minutes else {
        tracing::info!("watch_interval_minutes not configured, watcher disabled");
        return;
    };
    let host_port = format!("{}:{}", state.config.http_hostname, state.config.http_port);
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_minutes * 60));

    loop {
        ticker.tick().await;
        for entry in &state.config.watch_music_sets {
            let Some(set) = parse_watch_entry(entry) else {
                tracing::warn!(entry = %entry, "unparsable watch_music_sets entry, skipping");
                continue;
            };
            if let Err(e) = tick_one(&state, &set, &host_port).await {
                tracing::error!(username = %set.username, error = %e, "watcher tick failed for music set");
            }
        }
    }
}

async fn tick_one(
    state: &Arc<AppState>,
    set: &MusicSet,
    host_port: &str,
) -> Result<(), crate::error::RemoteError> {
    let resolved_set = if set.music_type.is_some() {
        set.clone()
    } else {
        let profile = state.remote.fetch_profile(&set.username).await?;
        let view = profile
            .default_view
            .as_deref()
            .and_then(MusicType::parse)
            .unwrap_or(MusicType::Stream);
        set.with_type(view)
    };

    let ctx = BuildContext {
        client: &state.remote,
        music_dir: &state.config.music_dir,
        remote_web_base: &state.config.remote_web_base,
        episode_max_count: state.config.episode_max_count,
        subscribed_to: &state.config.subscribed_to,
        host_port,
    };
    let podcast = build_podcast(&ctx, &resolved_set).await?;

    if let Some(fingerprint) = resolved_set.fingerprint() {
        state.podcast_cache.insert(fingerprint, podcast.clone());
    }

    for episode in &podcast.episodes {
        let tail = episode.enclosure.local_url.rsplit('/').next().unwrap_or_default();
        let download = Download {
            remote_url: episode.enclosure.remote_url.clone(),
            length_bytes: episode.enclosure.length_bytes,
            last_modified: episode
                .enclosure
                .last_modified
                .unwrap_or(episode.pub_date),
            local_file_path: state.config.music_dir.join(&resolved_set.username).join(tail),
        };
        state.queue.enqueue(download);
    }
    state.queue.process_queue(None);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_typed_and_playlist_entries() {
        let a = parse_watch_entry("alice").unwrap();
        assert_eq!(a.username, "alice");
        assert_eq!(a.music_type, None);

        let b = parse_watch_entry("alice/shows").unwrap();
        assert_eq!(b.music_type, Some(MusicType::Shows));

        let c = parse_watch_entry("alice/playlist/faves").unwrap();
        assert_eq!(c.music_type, Some(MusicType::Playlist));
        assert_eq!(c.playlist_slug.as_deref(), Some("faves"));
    }

    #[test]
    fn rejects_garbage_entries() {
        assert!(parse_watch_entry("a/b/c/d").is_none());
    }
}
