use serde::Deserialize;
use serde_json::{json, Value};

use podbridge_api::MusicType;

/// One page worth of items, 20 per page (§4.4 pagination).
pub const PAGE_SIZE: u32 = 20;

pub fn profile_query(username: &str) -> (String, Value) {
    let query = r#"
        query Profile($username: String!) {
            userByUsername(username: $username) {
                displayName
                bio
                location
                subscriptionPriceCents
                imageUrl
                defaultView
            }
        }
    "#
    .to_string();
    (query, json!({ "username": username }))
}

pub fn playlist_query(username: &str, slug: &str) -> (String, Value) {
    let query = r#"
        query Playlist($username: String!, $slug: String!) {
            playlistBySlug(username: $username, slug: $slug) {
                title
                imageUrl
                owner { displayName imageUrl }
            }
        }
    "#
    .to_string();
    (query, json!({ "username": username, "slug": slug }))
}

pub fn items_page_query(music_type: MusicType, username: &str, after: Option<&str>) -> (String, Value) {
    let field = match music_type {
        MusicType::Stream => "streamItems",
        MusicType::Shows => "showItems",
        MusicType::Favorites => "favoriteItems",
        MusicType::History => "historyItems",
        MusicType::Playlist => "playlistItems",
    };
    let query = format!(
        r#"
        query Items($username: String!, $first: Int!, $after: String) {{
            user(username: $username) {{
                {field}(first: $first, after: $after) {{
                    pageInfo {{ hasNextPage endCursor }}
                    edges {{
                        node {{
                            title
                            description
                            slug
                            createdAt
                            durationSeconds
                            imageUrl
                            playable
                            subscriberExclusive
                            streamInfo {{ url }}
                        }}
                    }}
                }}
            }}
        }}
        "#
    );
    (
        query,
        json!({ "username": username, "first": PAGE_SIZE, "after": after }),
    )
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlErrorEntry {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileData {
    #[serde(rename = "userByUsername")]
    pub user_by_username: Option<ProfileNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileNode {
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "subscriptionPriceCents")]
    pub subscription_price_cents: Option<u32>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    /// The user's preferred landing list among {stream, shows, favorites,
    /// history} (the "default view", §GLOSSARY); absent means `stream`.
    #[serde(rename = "defaultView")]
    pub default_view: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistData {
    #[serde(rename = "playlistBySlug")]
    pub playlist_by_slug: Option<PlaylistNode>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistNode {
    pub title: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub owner: PlaylistOwner,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistOwner {
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

/// The items field is named differently per music type (`streamItems`,
/// `showItems`, ...). Rather than one struct per field name, the caller
/// pulls `data["user"][field_name]` out as a raw `Value` (see
/// `RemoteClient::fetch_items_page`) and deserializes it directly into
/// this connection shape.
#[derive(Debug, Deserialize)]
pub struct ItemsConnection {
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    pub edges: Vec<ItemEdge>,
}

#[derive(Debug, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemEdge {
    pub node: ItemNode,
}

#[derive(Debug, Deserialize)]
pub struct ItemNode {
    pub title: String,
    pub description: Option<String>,
    pub slug: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: Option<u64>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub playable: bool,
    #[serde(rename = "subscriberExclusive")]
    pub subscriber_exclusive: bool,
    #[serde(rename = "streamInfo")]
    pub stream_info: Option<StreamInfo>,
}

#[derive(Debug, Deserialize)]
pub struct StreamInfo {
    pub url: Option<String>,
}
