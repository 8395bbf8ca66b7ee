//! Shared value types for the podcast-bridging core: the things that cross
//! module boundaries (HTTP responders, the remote client, the download
//! queue) without caring how any single module is implemented.

pub mod byte_range;
pub mod download;
pub mod music_set;
pub mod podcast;

pub use byte_range::{ByteRange, LogicalRange, RangeError};
pub use download::{Download, PART_SUFFIX};
pub use music_set::{MusicSet, MusicSetError, MusicType};
pub use podcast::{Enclosure, Episode, Podcast};
