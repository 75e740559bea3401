//! Provider-facing descriptors.
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering the three OAuth 1.0a
//! endpoints, the callback identifier handed to the user-authorization step, the HTTP method used
//! for token exchanges, and the retry budget applied to them.

pub mod descriptor;

pub use descriptor::*;
