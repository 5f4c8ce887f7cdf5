pub mod cors;
pub mod handlers;
pub mod models;

pub use handlers::{build_rocket, default_fetcher, launch, SharedFetcher};
