//! The remote client (component D) and podcast builder (component E):
//! GraphQL pagination, enclosure URL decoding, HEAD-based metadata
//! resolution, and feed-level metadata assembly.

pub mod builder;
pub mod client;
pub mod decode;
pub mod graphql;

pub use builder::{build_podcast, BuildContext};
pub use client::RemoteClient;
