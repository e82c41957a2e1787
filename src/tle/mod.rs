mod cache;
mod error;
mod parsing;
mod source;
mod types;

pub use cache::TleCache;
pub use error::TleError;
pub use parsing::parse_tle_lines;
pub use source::{ElementSource, HttpFetcher, SourceSettings, TleFetcher};
pub use types::{ElementSet, Provenance};
