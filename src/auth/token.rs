//! Token pairs exchanged during the OAuth 1.0a flow and the secret wrapper that guards them.

pub mod credentials;
pub mod secret;
