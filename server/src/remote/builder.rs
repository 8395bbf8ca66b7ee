use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use podbridge_api::{Enclosure, Episode, MusicSet, MusicType, Podcast};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::RemoteError;

use super::client::RemoteClient;
use super::decode::decode_enclosure_url;
use super::graphql::ItemNode;

/// Bounds the per-query HEAD-probe fan-out (§4.4, §9 "per-query HEAD
/// concurrency").
const HEAD_CONCURRENCY: usize = 8;
/// `2 * HTTP_TIMEOUT`: the executor-termination deadline (§5).
const EXECUTOR_SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

pub struct BuildContext<'a> {
    pub client: &'a Arc<RemoteClient>,
    pub music_dir: &'a Path,
    pub remote_web_base: &'a str,
    pub episode_max_count: u32,
    pub subscribed_to: &'a HashSet<String>,
    /// `host:port` the local URLs should point at — from the triggering
    /// request's Host header, or from config for CLI/watcher calls.
    pub host_port: &'a str,
}

/// Assembles a full `Podcast` value for one `MusicSet` (component E):
/// feed-level metadata, paginated episode candidates, per-episode
/// filtering, URL decode, and concurrent HEAD resolution.
pub async fn build_podcast(ctx: &BuildContext<'_>, set: &MusicSet) -> Result<Podcast, RemoteError> {
    let (title, link, image_url, author_and_owner_name, description) =
        feed_metadata(ctx, set).await?;

    let music_type = set.music_type.unwrap_or(MusicType::Stream);
    let raw_items = ctx
        .client
        .fetch_items(music_type, &set.username, ctx.episode_max_count)
        .await?;

    let mut candidates = Vec::new();
    let mut seen_remote_urls: HashSet<String> = HashSet::new();

    for item in raw_items {
        if item.subscriber_exclusive || !item.playable {
            tracing::info!(slug = %item.slug, "skipping subscriber-exclusive or unplayable item");
            continue;
        }
        let encoded_url = match &item.stream_info.as_ref().and_then(|s| s.url.clone()) {
            Some(u) => u.clone(),
            None => return Err(RemoteError::Transport("missing streamInfo.url".into())),
        };
        let remote_url = match decode_enclosure_url(&encoded_url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(slug = %item.slug, error = %e, "dropping episode: decode failed");
                continue;
            }
        };

        if music_type == MusicType::History && !seen_remote_urls.insert(remote_url.clone()) {
            continue;
        }

        candidates.push((item, remote_url));
    }

    let episodes = resolve_enclosures(ctx, set, candidates).await?;

    Ok(Podcast {
        user_id: set.username.clone(),
        title,
        link,
        language: "en-us".to_string(),
        description,
        author_and_owner_name,
        image_url,
        created_at: Utc::now(),
        episodes,
    })
}

async fn feed_metadata(
    ctx: &BuildContext<'_>,
    set: &MusicSet,
) -> Result<(String, String, Option<String>, String, String), RemoteError> {
    if let Some(slug) = &set.playlist_slug {
        let playlist = ctx.client.fetch_playlist(&set.username, slug).await?;
        let image = playlist.image_url.or(playlist.owner.image_url.clone());
        let link = format!("{}/{}/playlist/{}/", ctx.remote_web_base, set.username, slug);
        let description = build_description(ctx, &set.username, None, None, None);
        return Ok((
            playlist.title,
            link,
            image,
            playlist.owner.display_name,
            description,
        ));
    }

    let profile = ctx.client.fetch_profile(&set.username).await?;
    let music_type = set.music_type.unwrap_or(MusicType::Stream);
    let title = format!("{}'s {}", profile.display_name, music_type.as_str());
    let link = format!(
        "{}/{}/{}/",
        ctx.remote_web_base,
        set.username,
        music_type.as_str()
    );
    let description = build_description(
        ctx,
        &set.username,
        profile.subscription_price_cents,
        profile.location.as_deref(),
        profile.bio.as_deref(),
    );
    Ok((
        title,
        link,
        profile.image_url,
        profile.display_name,
        description,
    ))
}

/// Builds the playlist-aware description variant named in §9: price,
/// location and bio joined by newlines, with a "Support X!" line appended
/// unless the username is already in `subscribed_to`.
fn build_description(
    ctx: &BuildContext<'_>,
    username: &str,
    price_cents: Option<u32>,
    location: Option<&str>,
    bio: Option<&str>,
) -> String {
    let mut lines = Vec::new();
    if let Some(loc) = location {
        lines.push(loc.to_string());
    }
    if let Some(b) = bio {
        lines.push(b.to_string());
    }
    if let Some(cents) = price_cents {
        if !ctx.subscribed_to.contains(username) {
            let dollars = cents as f64 / 100.0;
            lines.push(format!("Support {username}! Subscribe for ${dollars:.2}/month"));
        }
    }
    lines.join("\n")
}

async fn resolve_enclosures(
    ctx: &BuildContext<'_>,
    set: &MusicSet,
    candidates: Vec<(ItemNode, String)>,
) -> Result<Vec<Episode>, RemoteError> {
    let semaphore = Arc::new(Semaphore::new(HEAD_CONCURRENCY));
    let mut joinset: JoinSet<Option<Episode>> = JoinSet::new();

    for (item, remote_url) in candidates {
        let local_path = local_file_path(ctx.music_dir, &set.username, &item.slug, &remote_url);
        let local_url = local_url(ctx, &set.username, &item.slug, &remote_url);
        let pub_date = item
            .created_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now());

        if local_path.exists() {
            let (length_bytes, last_modified, mime_type) = local_metadata(&local_path);
            joinset.spawn(std::future::ready(Some(episode_from(
                item,
                pub_date,
                local_url,
                remote_url,
                Some(length_bytes),
                last_modified,
                mime_type,
            ))));
            continue;
        }

        let client_url = remote_url.clone();
        let semaphore = Arc::clone(&semaphore);
        let client = Arc::clone(ctx.client);
        joinset.spawn(async move {
            let _permit = semaphore.acquire().await.ok()?;
            match client.head(&client_url).await {
                Ok(meta) => Some(episode_from(
                    item,
                    pub_date,
                    local_url,
                    remote_url,
                    Some(meta.length_bytes),
                    Some(meta.last_modified),
                    Some(meta.mime_type),
                )),
                Err(e) => {
                    tracing::warn!(url = %client_url, error = %e, "HEAD probe failed, dropping episode");
                    None
                }
            }
        });
    }

    let mut episodes = Vec::new();
    let deadline = tokio::time::Instant::now() + EXECUTOR_SHUTDOWN_TIMEOUT;
    loop {
        match tokio::time::timeout_at(deadline, joinset.join_next()).await {
            Ok(Some(Ok(Some(episode)))) => {
                if episode.is_complete() {
                    episodes.push(episode);
                }
            }
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(_elapsed) => {
                joinset.abort_all();
                return Err(RemoteError::Timeout);
            }
        }
    }

    Ok(episodes)
}

fn episode_from(
    item: ItemNode,
    pub_date: DateTime<Utc>,
    local_url: String,
    remote_url: String,
    length_bytes: Option<u64>,
    last_modified: Option<DateTime<Utc>>,
    mime_type: Option<String>,
) -> Episode {
    Episode {
        title: item.title,
        description: item.description.unwrap_or_default(),
        link: local_url.clone(),
        pub_date,
        author: String::new(),
        duration_seconds: item.duration_seconds,
        image_url: item.image_url,
        enclosure: Enclosure {
            local_url,
            remote_url,
            length_bytes: length_bytes.unwrap_or(0),
            last_modified,
            mime_type,
        },
    }
}

fn local_metadata(path: &Path) -> (u64, Option<DateTime<Utc>>, Option<String>) {
    let meta = std::fs::metadata(path).ok();
    let length = meta.as_ref().map(|m| m.len()).unwrap_or(0);
    let modified = meta
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from);
    let mime = mime_guess::from_path(path).first().map(|m| m.to_string());
    (length, modified, mime)
}

fn extension_of(remote_url: &str) -> String {
    let without_query = remote_url.split('?').next().unwrap_or(remote_url);
    Path::new(without_query)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

fn local_file_path(music_dir: &Path, username: &str, slug: &str, remote_url: &str) -> PathBuf {
    music_dir
        .join(username)
        .join(format!("{slug}{}", extension_of(remote_url)))
}

fn local_url(ctx: &BuildContext<'_>, username: &str, slug: &str, remote_url: &str) -> String {
    format!(
        "http://{}/{}/{}{}",
        ctx.host_port,
        username,
        slug,
        extension_of(remote_url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_taken_before_query_string() {
        assert_eq!(extension_of("https://x/track.m4a?sig=abc"), ".m4a");
        assert_eq!(extension_of("https://x/track"), "");
    }
}
