//! Track reordering and remuxing.

pub mod decision;
pub mod mkvmerge;
pub mod processor;

pub use decision::{LanguageMatch, LanguageRequest, Swap};
pub use processor::{SwapReport, SwapSettings, TrackProcessor};
