/*
[INPUT]:  HTTP client configuration and engine API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod catalog;
pub mod client;
pub mod error;
pub mod reports;
pub mod tasks;

pub use error::{EngineError, Result};

pub use client::{ClientConfig, DEFAULT_BASE_URL, EngineClient};
