//! Provider descriptor data structures shared by the exchange client and the coordinator.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Token-exchange method and retry policy.
pub mod policy;

pub use builder::*;
pub use policy::*;

// self
use crate::{_prelude::*, auth::ProviderId, error::ConfigError};

/// Callback value sent when no callback identifier is configured.
pub const OUT_OF_BAND_CALLBACK: &str = "oob";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Endpoint issuing temporary request tokens.
	pub request_token: Url,
	/// Page the user visits to grant access.
	pub authorization: Url,
	/// Endpoint exchanging an authorized request token for an access token.
	pub access_token: Url,
}

/// Immutable provider descriptor consumed by the exchange client and the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Base URL that relative API paths are appended to.
	pub base_url: Url,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Callback URL or scheme handed to the user-authorization step.
	pub callback: Option<String>,
	/// Method used for the request-token and access-token calls.
	pub token_request_method: TokenRequestMethod,
	/// Retry budget for token exchanges.
	pub retry: RetryPolicy,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier and base URL.
	pub fn builder(id: ProviderId, base_url: Url) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id, base_url)
	}

	/// Callback identifier, falling back to `oob`.
	pub fn callback_or_oob(&self) -> &str {
		self.callback.as_deref().unwrap_or(OUT_OF_BAND_CALLBACK)
	}

	/// Resolves an API path against [`base_url`](Self::base_url).
	///
	/// Absolute `http(s)://` inputs are parsed as-is.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		let raw = concat_url(&self.base_url, path);

		Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source })
	}
}

/// Appends `path` to `base` by string concatenation with exactly one `/` between them.
pub(crate) fn concat_url(base: &Url, path: &str) -> String {
	if path.starts_with("https://") || path.starts_with("http://") {
		return path.to_owned();
	}

	let base = base.as_str().trim_end_matches('/');

	if path.starts_with('/') { format!("{base}{path}") } else { format!("{base}/{path}") }
}
