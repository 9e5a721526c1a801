// Search pipeline: song resolution strategies and the processing stages they feed

pub mod processing;
pub mod sources;

pub use sources::{DirectSoundSearch, KeywordVideoSearch, SongSearchStrategy, SourceFallbackController};
