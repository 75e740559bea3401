//! Consumer credentials plus the temporary and permanent token pairs of the three-legged flow.

// self
use crate::{
	_prelude::*,
	auth::{ConsumerKey, IdentifierError, TokenSecret},
};

/// Application credentials issued by the service provider out of band.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerCredentials {
	/// Consumer key sent as `oauth_consumer_key`.
	pub key: ConsumerKey,
	/// Consumer secret; first half of every signing key.
	pub secret: TokenSecret,
}
impl ConsumerCredentials {
	/// Validates the consumer key and wraps the secret.
	pub fn new(key: impl AsRef<str>, secret: impl Into<String>) -> Result<Self, IdentifierError> {
		Ok(Self { key: ConsumerKey::new(key)?, secret: TokenSecret::new(secret) })
	}
}

/// Temporary credentials valid only while an authorization flow is in progress.
///
/// The type is deliberately not `Clone`: exchanging it for an [`AccessToken`] consumes it so the
/// request token cannot sign anything afterwards.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestToken {
	/// Value of `oauth_token`.
	pub token: String,
	/// Value of `oauth_token_secret`.
	pub secret: TokenSecret,
}
impl RequestToken {
	/// Creates a request token pair.
	pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { token: token.into(), secret: TokenSecret::new(secret) }
	}
}

/// Permanent credentials used to sign every authenticated API call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Value of `oauth_token`.
	pub token: String,
	/// Value of `oauth_token_secret`.
	pub secret: TokenSecret,
	/// Instant the pair was obtained or injected.
	#[serde(with = "time::serde::rfc3339")]
	pub obtained_at: OffsetDateTime,
}
impl AccessToken {
	/// Creates an access token pair stamped with the current time.
	pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
		Self {
			token: token.into(),
			secret: TokenSecret::new(secret),
			obtained_at: OffsetDateTime::now_utc(),
		}
	}

	/// Overrides the instant the pair was obtained.
	pub fn with_obtained_at(mut self, instant: OffsetDateTime) -> Self {
		self.obtained_at = instant;

		self
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn consumer_credentials_validate_the_key() {
		assert!(ConsumerCredentials::new("", "secret").is_err());

		let credentials =
			ConsumerCredentials::new("CK", "CS").expect("Consumer credentials should be valid.");

		assert_eq!(credentials.key.as_ref(), "CK");
		assert!(!format!("{credentials:?}").contains("CS"));
	}

	#[test]
	fn access_token_round_trips_through_json() {
		let token = AccessToken::new("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00")
			.with_obtained_at(datetime!(2026-01-02 03:04:05 UTC));
		let payload = serde_json::to_string(&token).expect("Access token should serialize.");

		assert!(payload.contains("\"obtained_at\":\"2026-01-02T03:04:05Z\""));

		let decoded: AccessToken =
			serde_json::from_str(&payload).expect("Access token should deserialize.");

		assert_eq!(decoded, token);
	}
}
