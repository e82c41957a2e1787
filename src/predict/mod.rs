mod error;
mod pass_finder;
mod types;

pub use error::PredictError;
pub use pass_finder::{next_passes, PassSearch};
pub use types::PassWindow;
