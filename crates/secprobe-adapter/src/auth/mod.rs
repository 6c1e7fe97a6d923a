/*
[INPUT]:  Operator credentials and engine token responses
[OUTPUT]: Session tokens attached to engine requests
[POS]:    Auth layer - injected session state for the engine client
[UPDATE]: When auth flow or token handling changes
*/

pub mod login;
pub mod session;

pub use session::{TokenData, TokenStore};
