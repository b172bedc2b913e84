pub mod client;
pub mod error;
pub mod views;

pub use client::{ApiClient, Cached, LogQuery, DEFAULT_FETCH_LIMIT, WIDE_FETCH_LIMIT};
pub use error::ApiError;
pub use views::ViewStore;
