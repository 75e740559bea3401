// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

/// Value of `oauth_version` on every signed call.
pub const OAUTH_VERSION: &str = "1.0";

const NONCE_LEN: usize = 32;

/// Ephemeral inputs for one signed call.
///
/// A context is built fresh for every request: [`SigningContext::new`] draws a random nonce and
/// stamps the current UTC time, and the `with_*` methods pin them when reproducible output is
/// needed.
#[derive(Clone, Debug)]
pub struct SigningContext<'a> {
	/// Uppercase HTTP method.
	pub method: Method,
	/// Target URL; only scheme, authority and path enter the base string.
	pub url: &'a Url,
	/// `oauth_token`, when a request or access token is in use.
	pub token: Option<&'a str>,
	/// Secret paired with [`token`](Self::token); second half of the signing key.
	pub token_secret: Option<&'a str>,
	/// `oauth_verifier`, only present on the access-token exchange.
	pub verifier: Option<&'a str>,
	/// `oauth_nonce`.
	pub nonce: String,
	/// `oauth_timestamp`, in whole seconds since the Unix epoch.
	pub timestamp: i64,
	/// `oauth_version`.
	pub version: &'static str,
	/// Extra parameters covered by the signature, typically the query string of a GET.
	pub parameters: Vec<(Cow<'a, str>, Cow<'a, str>)>,
}
impl<'a> SigningContext<'a> {
	/// Creates an unauthenticated context with a fresh nonce and the current timestamp.
	pub fn new(method: Method, url: &'a Url) -> Self {
		Self {
			method,
			url,
			token: None,
			token_secret: None,
			verifier: None,
			nonce: generate_nonce(),
			timestamp: OffsetDateTime::now_utc().unix_timestamp(),
			version: OAUTH_VERSION,
			parameters: Vec::new(),
		}
	}

	/// Signs with a token pair (request token or access token).
	pub fn with_token(mut self, token: &'a str, secret: &'a str) -> Self {
		self.token = Some(token);
		self.token_secret = Some(secret);

		self
	}

	/// Adds `oauth_verifier`.
	pub fn with_verifier(mut self, verifier: &'a str) -> Self {
		self.verifier = Some(verifier);

		self
	}

	/// Pins the nonce.
	pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
		self.nonce = nonce.into();

		self
	}

	/// Pins the timestamp.
	pub fn with_timestamp(mut self, timestamp: i64) -> Self {
		self.timestamp = timestamp;

		self
	}

	/// Adds one extra parameter.
	pub fn with_parameter(
		mut self,
		name: impl Into<Cow<'a, str>>,
		value: impl Into<Cow<'a, str>>,
	) -> Self {
		self.parameters.push((name.into(), value.into()));

		self
	}

	/// Adds several extra parameters.
	pub fn with_parameters<I, K, V>(mut self, parameters: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<Cow<'a, str>>,
		V: Into<Cow<'a, str>>,
	{
		self.parameters.extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}
}

/// Draws a 32 character alphanumeric nonce.
pub fn generate_nonce() -> String {
	rand::rng().sample_iter(&Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}
