use std::collections::BTreeMap;

use podbridge_api::{Episode, Podcast};
use rss::extension::itunes::{ITunesChannelExtensionBuilder, ITunesItemExtensionBuilder};
use rss::{ChannelBuilder, EnclosureBuilder, ItemBuilder};

/// Converts a `Podcast` value into RSS 2.0 + iTunes-namespace XML bytes
/// (component O). Uses the `rss` crate's builder API the same way other
/// proxy-style feed generators in the ecosystem do.
pub fn serialize(podcast: &Podcast) -> Vec<u8> {
    let items: Vec<rss::Item> = podcast.episodes.iter().map(item_for).collect();

    let mut namespaces = BTreeMap::new();
    namespaces.insert(
        "itunes".to_string(),
        "http://www.itunes.com/dtds/podcast-1.0.dtd".to_string(),
    );

    let itunes_channel = ITunesChannelExtensionBuilder::default()
        .author(Some(podcast.author_and_owner_name.clone()))
        .image(podcast.image_url.clone())
        .build();

    let channel = ChannelBuilder::default()
        .namespaces(namespaces)
        .title(podcast.title.clone())
        .link(podcast.link.clone())
        .description(podcast.description.clone())
        .language(Some(podcast.language.clone()))
        .last_build_date(Some(chrono::Utc::now().to_rfc2822()))
        .pub_date(Some(podcast.created_at.to_rfc2822()))
        .itunes_ext(Some(itunes_channel))
        .items(items)
        .build();

    let mut out = Vec::new();
    out.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.extend_from_slice(channel.to_string().as_bytes());
    out
}

fn item_for(episode: &Episode) -> rss::Item {
    let enclosure = EnclosureBuilder::default()
        .url(episode.enclosure.local_url.clone())
        .length(episode.enclosure.length_bytes.to_string())
        .mime_type(
            episode
                .enclosure
                .mime_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        )
        .build();

    let itunes_ext = ITunesItemExtensionBuilder::default()
        .duration(episode.duration_seconds.map(format_duration))
        .image(episode.image_url.clone())
        .build();

    ItemBuilder::default()
        .title(Some(episode.title.clone()))
        .description(Some(episode.description.clone()))
        .link(Some(episode.link.clone()))
        .guid(Some(rss::GuidBuilder::default()
            .value(episode.enclosure.local_url.clone())
            .permalink(false)
            .build()))
        .pub_date(Some(episode.pub_date.to_rfc2822()))
        .enclosure(Some(enclosure))
        .itunes_ext(Some(itunes_ext))
        .build()
}

/// Formats a duration in seconds as `H:MM:SS` (§4.14).
fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use podbridge_api::Enclosure;

    fn sample_podcast() -> Podcast {
        Podcast {
            user_id: "alice".into(),
            title: "alice's shows".into(),
            link: "https://remote.example/alice/shows/".into(),
            language: "en-us".into(),
            description: "a great DJ".into(),
            author_and_owner_name: "Alice".into(),
            image_url: Some("https://remote.example/alice.jpg".into()),
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            episodes: vec![Episode {
                title: "Track One".into(),
                description: "first track".into(),
                link: "http://localhost:6499/alice/track-one.m4a".into(),
                pub_date: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
                author: String::new(),
                duration_seconds: Some(3725),
                image_url: None,
                enclosure: Enclosure {
                    local_url: "http://localhost:6499/alice/track-one.m4a".into(),
                    remote_url: "https://shard1.example/track-one.m4a".into(),
                    length_bytes: 123_456,
                    last_modified: Some(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()),
                    mime_type: Some("audio/mp4".into()),
                },
            }],
        }
    }

    #[test]
    fn round_trips_through_the_rss_crate_reader() {
        let xml = serialize(&sample_podcast());
        let channel = rss::Channel::read_from(&xml[..]).expect("valid rss");
        assert_eq!(channel.title(), "alice's shows");
        assert_eq!(channel.link(), "https://remote.example/alice/shows/");
        assert_eq!(channel.items().len(), 1);

        let item = &channel.items()[0];
        assert_eq!(item.title(), Some("Track One"));
        let enclosure = item.enclosure().expect("enclosure present");
        assert_eq!(enclosure.url(), "http://localhost:6499/alice/track-one.m4a");
        assert_eq!(enclosure.length(), "123456");
    }

    #[test]
    fn duration_formats_as_h_mm_ss() {
        assert_eq!(format_duration(3725), "1:02:05");
        assert_eq!(format_duration(59), "0:00:59");
    }
}
