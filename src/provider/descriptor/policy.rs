// self
use crate::_prelude::*;

/// Default number of attempts for a token exchange.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// HTTP method used for the request-token and access-token calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenRequestMethod {
	/// Parameters travel in the `Authorization` header of a bodiless GET.
	#[default]
	Get,
	/// Same header, sent on a POST with an empty form body.
	Post,
}
impl TokenRequestMethod {
	/// Converts into an [`http::Method`](Method).
	pub fn as_method(self) -> Method {
		match self {
			TokenRequestMethod::Get => Method::GET,
			TokenRequestMethod::Post => Method::POST,
		}
	}
}

/// Retry budget applied to each token exchange.
///
/// The counter is local to a single exchange, so every call starts with the full budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Total attempts, including the first one. Must be at least 1.
	pub max_attempts: u32,
	/// Also retry 4xx answers other than 408 and 429.
	pub retry_client_errors: bool,
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { max_attempts: DEFAULT_MAX_ATTEMPTS, retry_client_errors: false }
	}
}
