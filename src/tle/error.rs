use thiserror::Error;

#[derive(Debug, Error)]
pub enum TleError {
    #[error("invalid tle format: expected name and two data lines, got {0} lines")]
    InvalidFormat(usize),
    #[error("invalid tle: {0}")]
    InvalidTle(#[from] sgp4::TleError),
    #[error("cache file error: {0}")]
    Cache(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("all {attempts} download attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: String },
}
