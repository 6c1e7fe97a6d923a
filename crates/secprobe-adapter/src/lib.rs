/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public execution engine adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod engine;
pub mod http;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{TokenData, TokenStore};

pub use engine::ExecutionEngine;

// Re-export commonly used types from http
pub use http::{ClientConfig, DEFAULT_BASE_URL, EngineClient, EngineError, Result};

// Re-export all types
pub use types::*;
