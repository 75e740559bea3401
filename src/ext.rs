//! Extension contracts for attaching OAuth 1.0a signatures to foreign request types.
//!
//! The broker ships implementations for its own [`HttpRequest`](crate::http::HttpRequest) and,
//! with the `reqwest` feature, for `reqwest::Request`. Downstream crates implement
//! [`RequestSignerExt`] for whatever client they use.

pub mod request_signer;

pub use request_signer::*;
