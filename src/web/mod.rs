pub mod api;
pub mod api_doc;
pub mod auth;
pub mod config;
pub mod server;

pub use config::Config;
pub use server::{router, run_server, ServeError};
