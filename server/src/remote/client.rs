use std::time::Duration;

use podbridge_api::MusicType;
use serde_json::Value;
use tokio::time::timeout;

use crate::error::RemoteError;

use super::graphql::{
    items_page_query, playlist_query, profile_query, GraphQlResponse, ItemsConnection, PageInfo,
    PlaylistData, ProfileData, ProfileNode,
};

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);
pub const HEAD_TIMEOUT: Duration = Duration::from_secs(10);

/// One reused client instance per process, sharing its connection pool
/// (§4.4). The "synchronous façade that blocks on a single-slot handoff
/// with a 30-second timeout" from the distilled spec is realized here as
/// a plain `reqwest` call wrapped in `tokio::time::timeout`.
pub struct RemoteClient {
    http: reqwest::Client,
    graphql_url: String,
}

pub struct HeadMetadata {
    pub length_bytes: u64,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    pub mime_type: String,
}

impl RemoteClient {
    pub fn new(http: reqwest::Client, graphql_url: String) -> Self {
        Self { http, graphql_url }
    }

    async fn query(&self, query: String, variables: Value) -> Result<Value, RemoteError> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let send = self.http.post(&self.graphql_url).json(&body).send();

        let response = timeout(QUERY_TIMEOUT, send)
            .await
            .map_err(|_| RemoteError::Timeout)?
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let parsed: GraphQlResponse<Value> = timeout(QUERY_TIMEOUT, response.json())
            .await
            .map_err(|_| RemoteError::Timeout)?
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !parsed.errors.is_empty() {
            let joined = parsed
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RemoteError::GraphQl(joined));
        }
        parsed.data.ok_or(RemoteError::NoData)
    }

    pub async fn fetch_profile(&self, username: &str) -> Result<ProfileNode, RemoteError> {
        let (query, vars) = profile_query(username);
        let data = self.query(query, vars).await?;
        let parsed: ProfileData =
            serde_json::from_value(data).map_err(|e| RemoteError::GraphQl(e.to_string()))?;
        parsed
            .user_by_username
            .ok_or_else(|| RemoteError::UserNotFound(username.to_string()))
    }

    pub async fn fetch_playlist(
        &self,
        username: &str,
        slug: &str,
    ) -> Result<super::graphql::PlaylistNode, RemoteError> {
        let (query, vars) = playlist_query(username, slug);
        let data = self.query(query, vars).await?;
        let parsed: PlaylistData =
            serde_json::from_value(data).map_err(|e| RemoteError::GraphQl(e.to_string()))?;
        parsed
            .playlist_by_slug
            .ok_or_else(|| RemoteError::PlaylistNotFound(slug.to_string(), username.to_string()))
    }

    /// Walks cursor-paginated pages (20 items each) until either
    /// `hasNextPage` is false or `max` items have been collected (§4.4).
    pub async fn fetch_items(
        &self,
        music_type: MusicType,
        username: &str,
        max: u32,
    ) -> Result<Vec<super::graphql::ItemNode>, RemoteError> {
        let field = items_field_name(music_type);
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let (query, vars) = items_page_query(music_type, username, after.as_deref());
            let data = self.query(query, vars).await?;

            let connection_value = data
                .get("user")
                .and_then(|u| u.get(field))
                .cloned()
                .unwrap_or(Value::Null);
            if connection_value.is_null() {
                return Err(RemoteError::UserNotFound(username.to_string()));
            }

            let connection: ItemsConnection = serde_json::from_value(connection_value)
                .map_err(|e| RemoteError::GraphQl(e.to_string()))?;

            for edge in connection.edges {
                items.push(edge.node);
                if items.len() as u32 >= max {
                    return Ok(items);
                }
            }

            let PageInfo { has_next_page, end_cursor } = connection.page_info;
            if !has_next_page {
                break;
            }
            after = end_cursor;
        }

        Ok(items)
    }

    /// Issues a HEAD request with a 10-second connect/read timeout,
    /// populating length, last-modified and MIME type (§4.4). The
    /// Content-Type must start with `audio/` or `video/`.
    pub async fn head(&self, url: &str) -> Result<HeadMetadata, RemoteError> {
        let send = self.http.head(url).send();
        let response = timeout(HEAD_TIMEOUT, send)
            .await
            .map_err(|_| RemoteError::Timeout)?
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let headers = response.headers();
        let mime_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| RemoteError::Transport("missing Content-Type".into()))?;
        if !(mime_type.starts_with("audio/") || mime_type.starts_with("video/")) {
            return Err(RemoteError::Transport(format!(
                "unexpected content type {mime_type}"
            )));
        }

        let length_bytes = headers
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| RemoteError::Transport("missing Content-Length".into()))?;

        let last_modified = headers
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| httpdate::parse_http_date(v).ok())
            .map(chrono::DateTime::<chrono::Utc>::from)
            .ok_or_else(|| RemoteError::Transport("missing Last-Modified".into()))?;

        Ok(HeadMetadata {
            length_bytes,
            last_modified,
            mime_type,
        })
    }
}

fn items_field_name(music_type: MusicType) -> &'static str {
    match music_type {
        MusicType::Stream => "streamItems",
        MusicType::Shows => "showItems",
        MusicType::Favorites => "favoriteItems",
        MusicType::History => "historyItems",
        MusicType::Playlist => "playlistItems",
    }
}
