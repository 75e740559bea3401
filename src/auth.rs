//! Auth-domain identifiers, consumer credentials, and token pairs.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{credentials::*, secret::*};
