//! Broker-level error types shared across signing, token exchanges, flows, and stores.

// self
use crate::{_prelude::*, obs::FlowStage};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const BODY_PREVIEW_LEN: usize = 256;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The request-token exchange failed.
	#[error("Failed to obtain a request token: {0}")]
	RequestToken(#[source] ExchangeError),
	/// The user-authorization step failed, was cancelled, or returned a foreign token.
	#[error("User authorization failed: {0}")]
	Authorization(#[from] AuthorizationError),
	/// The access-token exchange failed.
	#[error("Failed to obtain an access token: {0}")]
	AccessToken(#[source] ExchangeError),
	/// A signed call was attempted before an access token was available.
	#[error("No authenticated user; run the authorization flow first.")]
	NoAuthenticatedUser,
	/// A second authorization flow was started on a coordinator that is already running one.
	#[error("An authorization flow is already in progress on this coordinator.")]
	FlowInProgress,
	/// The flow state machine received an event it cannot handle in its current state.
	#[error("Flow event `{event}` is not valid in state `{state}`.")]
	UnexpectedFlowEvent {
		/// State label at the time of the event.
		state: &'static str,
		/// Event label.
		event: &'static str,
	},
	/// Transport failure while executing an ordinary signed request.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl Error {
	/// Returns the flow stage that produced the error, when the error is stage-specific.
	pub fn stage(&self) -> Option<FlowStage> {
		match self {
			Self::RequestToken(_) => Some(FlowStage::RequestToken),
			Self::Authorization(_) => Some(FlowStage::UserAuthorization),
			Self::AccessToken(_) => Some(FlowStage::AccessToken),
			Self::NoAuthenticatedUser | Self::Transport(_) => Some(FlowStage::SignedRequest),
			_ => None,
		}
	}
}

/// Failure of a single token exchange (request token or access token).
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// The transport kept failing until the retry budget ran out, or failed permanently.
	#[error("Transport failed after {attempts} attempt(s).")]
	Transport {
		/// Number of attempts that were made.
		attempts: u32,
		/// Failure reported by the final attempt.
		#[source]
		source: TransportError,
	},
	/// The provider answered but the body is not a usable token response.
	#[error(transparent)]
	MalformedResponse(#[from] ResponseError),
}

/// Token endpoint response that cannot be decoded into a token pair. Never retried.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ResponseError {
	/// The response body is not valid UTF-8.
	#[error("Token response body is not valid UTF-8.")]
	NotUtf8,
	/// A required field is absent or empty.
	#[error("Token response is missing `{field}`.")]
	MissingField {
		/// Name of the missing form field.
		field: &'static str,
	},
	/// The request-token response did not confirm the callback.
	#[error("Token response did not confirm the callback (`oauth_callback_confirmed`).")]
	CallbackNotConfirmed,
}

/// Failures raised by the user-authorization step. Never retried.
#[derive(Debug, ThisError)]
pub enum AuthorizationError {
	/// The token returned by the provider differs from the request token that was issued.
	#[error("Authorized token `{returned}` does not match the issued request token `{expected}`.")]
	TokenMismatch {
		/// Request token issued by the provider.
		expected: String,
		/// Token reported back by the user-authorization step.
		returned: String,
	},
	/// The user or the caller cancelled the authorization step.
	#[error("User authorization was cancelled.")]
	Cancelled,
	/// The provider reported that the user denied access.
	#[error("User denied authorization: {reason}.")]
	Denied {
		/// Provider-supplied reason or the denied token.
		reason: String,
	},
	/// The callback did not carry a required parameter.
	#[error("Authorization callback is missing `{name}`.")]
	MissingParameter {
		/// Name of the missing query parameter.
		name: &'static str,
	},
	/// The user-authorization capability failed for another reason.
	#[error("User authorization handler failed.")]
	Handler {
		/// Underlying handler failure.
		#[source]
		source: BoxError,
	},
}
impl AuthorizationError {
	/// Wraps an arbitrary handler failure.
	pub fn handler(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Handler { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO, non-2xx status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure before any status was received.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// The provider answered with a non-2xx status.
	#[error("Provider responded with HTTP {status}: {}", body_preview(.body))]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: Vec<u8>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// HTTP status attached to the failure, if one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Whether another attempt may succeed.
	///
	/// Connection failures, 5xx, 408 and 429 are transient. Other 4xx answers are permanent
	/// unless `retry_client_errors` is set.
	pub fn is_retryable(&self, retry_client_errors: bool) -> bool {
		match self.status() {
			None => true,
			Some(408 | 429) => true,
			Some(status) if (400..500).contains(&status) => retry_client_errors,
			Some(_) => true,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// A URL could not be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
	/// A caller-supplied parameter reuses a name owned by the OAuth protocol.
	#[error("Parameter `{name}` is reserved for the OAuth protocol.")]
	ReservedParameter {
		/// Offending parameter name.
		name: String,
	},
	/// A rendered header value contains bytes HTTP does not allow.
	#[error(transparent)]
	InvalidHeaderValue(#[from] ::http::header::InvalidHeaderValue),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	match text.char_indices().nth(BODY_PREVIEW_LEN) {
		Some((cut, _)) => format!("{}…", &text[..cut]),
		None => text.into_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn retry_classification_skips_permanent_client_errors() {
		let unauthorized = TransportError::Status { status: 401, body: b"bad key".to_vec() };
		let throttled = TransportError::Status { status: 429, body: Vec::new() };
		let unavailable = TransportError::Status { status: 503, body: Vec::new() };
		let reset = TransportError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset));

		assert!(!unauthorized.is_retryable(false));
		assert!(unauthorized.is_retryable(true));
		assert!(throttled.is_retryable(false));
		assert!(unavailable.is_retryable(false));
		assert!(reset.is_retryable(false));
	}

	#[test]
	fn status_errors_render_a_bounded_body_preview() {
		let err = TransportError::Status { status: 500, body: "x".repeat(1_000).into_bytes() };
		let rendered = err.to_string();

		assert!(rendered.starts_with("Provider responded with HTTP 500: xxx"));
		assert!(rendered.ends_with('…'));
		assert!(rendered.len() < 300);
	}

	#[test]
	fn stage_errors_keep_their_source_chain() {
		let err = Error::RequestToken(ExchangeError::Transport {
			attempts: 5,
			source: TransportError::Status { status: 502, body: b"gateway".to_vec() },
		});

		assert_eq!(err.stage(), Some(FlowStage::RequestToken));

		let exchange = StdError::source(&err).expect("Stage error should expose the exchange error.");

		assert_eq!(exchange.to_string(), "Transport failed after 5 attempt(s).");

		let transport =
			exchange.source().expect("Exchange error should expose the transport error.");

		assert!(transport.to_string().contains("HTTP 502: gateway"));
	}

	#[test]
	fn mismatch_is_an_authorization_stage_error() {
		let err: Error = AuthorizationError::TokenMismatch {
			expected: "T".into(),
			returned: "X".into(),
		}
		.into();

		assert_eq!(err.stage(), Some(FlowStage::UserAuthorization));
		assert!(err.to_string().contains("does not match"));
	}
}
