// Pipeline processing: query parsing, scoring, artist resolution, identity extraction, ranking

pub mod artists;
pub mod identity;
pub mod matcher;
pub mod query;
pub mod ranking;
pub mod streaming;
