//! Container track metadata.

pub mod mkvinfo;
pub mod reader;
pub mod track;

pub use reader::MetadataReader;
pub use track::{ContainerHandle, Track, TrackType};
