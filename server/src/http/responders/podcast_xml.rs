use std::sync::Arc;

use podbridge_api::{Download, MusicSet, MusicType};
use tokio::io::AsyncWrite;

use crate::error::CoreError;
use crate::feed_xml;
use crate::freshen;
use crate::http::request::Request;
use crate::http::response::{is_not_modified, ResponseWriter};
use crate::remote::{build_podcast, BuildContext};
use crate::state::AppState;

/// Parses a podcast-XML request path into its `MusicSet` components. The
/// path has already had any `.xml` suffix stripped by the caller.
///
/// Shapes: `/user`, `/user/type`, `/user/playlist(s)/slug`.
fn parse_music_set(path: &str) -> Result<MusicSet, CoreError> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [username] => MusicSet::new(*username, None, None)
            .map_err(|e| CoreError::ClientRequest(e.to_string())),
        [username, type_segment] => {
            let music_type = MusicType::parse(type_segment)
                .ok_or_else(|| CoreError::NotFound(format!("unknown music type {type_segment}")))?;
            if music_type == MusicType::Playlist {
                return Err(CoreError::ClientRequest("playlist requires a slug".into()));
            }
            MusicSet::new(*username, Some(music_type), None)
                .map_err(|e| CoreError::ClientRequest(e.to_string()))
        }
        [username, maybe_playlist, slug] => {
            if MusicType::parse(maybe_playlist) != Some(MusicType::Playlist) {
                return Err(CoreError::NotFound(format!("unknown route {path}")));
            }
            MusicSet::new(*username, Some(MusicType::Playlist), Some(slug.to_string()))
                .map_err(|e| CoreError::ClientRequest(e.to_string()))
        }
        _ => Err(CoreError::NotFound(format!("unrecognized podcast path {path}"))),
    }
}

/// Strips a trailing `.xml` (case-insensitive), if present.
pub fn strip_xml_suffix(path: &str) -> &str {
    if path.len() >= 4 && path[path.len() - 4..].eq_ignore_ascii_case(".xml") {
        &path[..path.len() - 4]
    } else {
        path
    }
}

/// True when `path` looks like `<user>`, `<user>/<musicType>`, or
/// `<user>/playlist(s)/<slug>` — used by the file/folder responders to
/// decide whether to delegate here (§4.3 routing).
pub fn looks_like_music_set_path(path: &str) -> bool {
    let stripped = strip_xml_suffix(path);
    let segments: Vec<&str> = stripped
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() || segments[0].contains('.') {
        return false;
    }
    match segments.len() {
        1 => true,
        2 => MusicType::parse(segments[1]).is_some(),
        3 => MusicType::parse(segments[1]) == Some(MusicType::Playlist),
        _ => false,
    }
}

pub async fn respond<W: AsyncWrite + Unpin>(
    state: &Arc<AppState>,
    request: &Request,
    host_port: &str,
    writer: &mut W,
) -> Result<(), CoreError> {
    let path = strip_xml_suffix(&request.path);
    let mut set = parse_music_set(path)?;

    if set.music_type.is_none() {
        let resolved = resolve_default_view(state, &set.username).await?;
        set = set.with_type(resolved);
    }

    let fingerprint = set
        .fingerprint()
        .expect("music type is resolved by this point");

    let podcast = match state.podcast_cache.get(&fingerprint) {
        Some(p) => p,
        None => {
            let ctx = BuildContext {
                client: &state.remote,
                music_dir: &state.config.music_dir,
                remote_web_base: &state.config.remote_web_base,
                episode_max_count: state.config.episode_max_count,
                subscribed_to: &state.config.subscribed_to,
                host_port,
            };
            let podcast = build_podcast(&ctx, &set).await.map_err(CoreError::from)?;
            state.podcast_cache.insert(fingerprint.clone(), podcast.clone());
            podcast
        }
    };

    if podcast.is_empty() {
        return Err(CoreError::NotFound(format!(
            "{} has no episodes to publish",
            set.username
        )));
    }

    if is_not_modified(request.if_modified_since(), podcast.created_at) {
        ResponseWriter::write_not_modified(writer).await?;
        return Ok(());
    }

    let mut newly_enqueued = false;
    for episode in &podcast.episodes {
        let local_file_path = local_path_for(state, &set.username, &episode.enclosure.local_url);
        freshen::add_watch(&local_file_path, &fingerprint);
        let download = Download {
            remote_url: episode.enclosure.remote_url.clone(),
            length_bytes: episode.enclosure.length_bytes,
            last_modified: episode
                .enclosure
                .last_modified
                .unwrap_or(episode.pub_date),
            local_file_path,
        };
        if state.queue.enqueue(download) {
            newly_enqueued = true;
        }
    }
    if newly_enqueued {
        state.queue.process_queue(None);
    }

    let body = feed_xml::serialize(&podcast);
    let body_arg = if request.is_head() { None } else { Some(body.as_slice()) };
    ResponseWriter::write_success(
        writer,
        "text/xml; charset=UTF-8",
        body.len() as u64,
        Some(podcast.created_at),
        &[],
        body_arg,
    )
    .await?;
    Ok(())
}

async fn resolve_default_view(state: &Arc<AppState>, username: &str) -> Result<MusicType, CoreError> {
    if let Some(cached) = state.default_view_cache.get(username) {
        if let Some(mt) = MusicType::parse(&cached) {
            return Ok(mt);
        }
    }
    let profile = state.remote.fetch_profile(username).await.map_err(CoreError::from)?;
    let view_name = profile.default_view.unwrap_or_else(|| "stream".to_string());
    let music_type = MusicType::parse(&view_name).unwrap_or(MusicType::Stream);
    state
        .default_view_cache
        .insert(username.to_string(), music_type.as_str().to_string());
    Ok(music_type)
}

/// Recovers the on-disk path for an episode's enclosure from its
/// synthesized local URL (`http://host/<user>/<slug><ext>`), since the
/// `Download` the queue expects needs a filesystem path, not a URL.
fn local_path_for(state: &Arc<AppState>, username: &str, local_url: &str) -> std::path::PathBuf {
    let tail = local_url.rsplit('/').next().unwrap_or_default();
    state.config.music_dir.join(username).join(tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_xml_suffix_case_insensitively() {
        assert_eq!(strip_xml_suffix("/alice.XML"), "/alice");
        assert_eq!(strip_xml_suffix("/alice"), "/alice");
    }

    #[test]
    fn recognizes_music_set_shapes() {
        assert!(looks_like_music_set_path("/alice"));
        assert!(looks_like_music_set_path("/alice/shows"));
        assert!(looks_like_music_set_path("/alice/playlist/faves"));
        assert!(looks_like_music_set_path("/alice/playlists/faves.xml"));
        assert!(!looks_like_music_set_path("/alice/track.m4a"));
        assert!(!looks_like_music_set_path("/favicon.ico"));
    }

    #[test]
    fn parses_plain_username() {
        let set = parse_music_set("/alice").unwrap();
        assert_eq!(set.username, "alice");
        assert_eq!(set.music_type, None);
    }

    #[test]
    fn parses_playlist_path() {
        let set = parse_music_set("/alice/playlist/faves").unwrap();
        assert_eq!(set.music_type, Some(MusicType::Playlist));
        assert_eq!(set.playlist_slug.as_deref(), Some("faves"));
    }
}
