// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{
		ProviderDescriptor, ProviderEndpoints, RetryPolicy, TokenRequestMethod, concat_url,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// One of the three token endpoints was never configured.
	#[error("Missing {endpoint} endpoint.")]
	MissingEndpoint {
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A path joined to the base URL does not form a valid URL.
	#[error("The {endpoint} endpoint `{url}` is not a valid URL: {reason}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Joined URL text.
		url: String,
		/// Parser message.
		reason: String,
	},
	/// The callback identifier is empty.
	#[error("Callback identifier cannot be empty.")]
	EmptyCallback,
	/// Retry policies need at least one attempt.
	#[error("Retry policy must allow at least one attempt.")]
	ZeroRetryBudget,
}

#[derive(Debug)]
enum EndpointSource {
	Path(String),
	Url(Url),
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	id: ProviderId,
	base_url: Url,
	request_token: Option<EndpointSource>,
	authorization: Option<EndpointSource>,
	access_token: Option<EndpointSource>,
	callback: Option<String>,
	token_request_method: TokenRequestMethod,
	retry: RetryPolicy,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier and base URL.
	pub fn new(id: ProviderId, base_url: Url) -> Self {
		Self {
			id,
			base_url,
			request_token: None,
			authorization: None,
			access_token: None,
			callback: None,
			token_request_method: TokenRequestMethod::default(),
			retry: RetryPolicy::default(),
		}
	}

	/// Sets the request-token path, appended to the base URL including its path. Token endpoints
	/// that live outside a versioned API base need
	/// [`request_token_endpoint`](Self::request_token_endpoint) instead.
	pub fn request_token_path(mut self, path: impl Into<String>) -> Self {
		self.request_token = Some(EndpointSource::Path(path.into()));

		self
	}

	/// Sets the authorize path, appended to the base URL.
	pub fn authorize_path(mut self, path: impl Into<String>) -> Self {
		self.authorization = Some(EndpointSource::Path(path.into()));

		self
	}

	/// Sets the access-token path, appended to the base URL.
	pub fn access_token_path(mut self, path: impl Into<String>) -> Self {
		self.access_token = Some(EndpointSource::Path(path.into()));

		self
	}

	/// Sets an absolute request-token endpoint.
	pub fn request_token_endpoint(mut self, url: Url) -> Self {
		self.request_token = Some(EndpointSource::Url(url));

		self
	}

	/// Sets an absolute authorize endpoint.
	pub fn authorize_endpoint(mut self, url: Url) -> Self {
		self.authorization = Some(EndpointSource::Url(url));

		self
	}

	/// Sets an absolute access-token endpoint.
	pub fn access_token_endpoint(mut self, url: Url) -> Self {
		self.access_token = Some(EndpointSource::Url(url));

		self
	}

	/// Sets the callback identifier handed to the user-authorization step.
	pub fn callback(mut self, callback: impl Into<String>) -> Self {
		self.callback = Some(callback.into());

		self
	}

	/// Overrides the token-exchange method.
	pub fn token_request_method(mut self, method: TokenRequestMethod) -> Self {
		self.token_request_method = method;

		self
	}

	/// Overrides the retry policy.
	pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
		self.retry = policy;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let request_token = resolve_endpoint("request_token", &self.base_url, self.request_token)?;
		let authorization = resolve_endpoint("authorization", &self.base_url, self.authorization)?;
		let access_token = resolve_endpoint("access_token", &self.base_url, self.access_token)?;
		let descriptor = ProviderDescriptor {
			id: self.id,
			base_url: self.base_url,
			endpoints: ProviderEndpoints { request_token, authorization, access_token },
			callback: self.callback,
			token_request_method: self.token_request_method,
			retry: self.retry,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if self.retry.max_attempts == 0 {
			return Err(ProviderDescriptorError::ZeroRetryBudget);
		}
		if self.callback.as_deref().is_some_and(str::is_empty) {
			return Err(ProviderDescriptorError::EmptyCallback);
		}

		validate_endpoint("base", &self.base_url)?;
		validate_endpoint("request_token", &self.endpoints.request_token)?;
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("access_token", &self.endpoints.access_token)?;

		Ok(())
	}
}

fn resolve_endpoint(
	name: &'static str,
	base: &Url,
	source: Option<EndpointSource>,
) -> Result<Url, ProviderDescriptorError> {
	match source.ok_or(ProviderDescriptorError::MissingEndpoint { endpoint: name })? {
		EndpointSource::Url(url) => Ok(url),
		EndpointSource::Path(path) => {
			let raw = concat_url(base, &path);

			Url::parse(&raw).map_err(|e| ProviderDescriptorError::InvalidEndpoint {
				endpoint: name,
				url: raw,
				reason: e.to_string(),
			})
		},
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
