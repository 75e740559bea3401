//! Signature base string construction and the two renderings of a signed parameter set.
//!
//! [`SignatureBuilder::sign`] follows the OAuth 1.0a recipe:
//!
//! 1. collect the `oauth_*` base parameters plus the context's extra parameters;
//! 2. sort them by name, then by value, and encode each side with [`OAUTH_ENCODE_SET`];
//! 3. join `METHOD&url&parameters` (each component encoded again) into the base string;
//! 4. hash it with `enc(consumer_secret)&enc(token_secret)` as the key.
//!
//! The extra parameters are covered by the signature but are not part of [`SignedParameters`];
//! callers keep sending them in the query string or body.

mod context;
mod encode;

pub use context::*;
pub use encode::*;

// crates.io
use ::http::HeaderValue;
use url::Position;
// self
use crate::{
	_prelude::*,
	auth::ConsumerCredentials,
	crypto::HashAlgorithm,
	error::ConfigError,
};

/// Parameter names owned by the protocol; extra parameters may not reuse them.
pub const RESERVED_PARAMETERS: [&str; 8] = [
	"oauth_consumer_key",
	"oauth_nonce",
	"oauth_signature",
	"oauth_signature_method",
	"oauth_timestamp",
	"oauth_token",
	"oauth_verifier",
	"oauth_version",
];

/// Signs [`SigningContext`] values for one consumer.
#[derive(Clone, Copy)]
pub struct SignatureBuilder<'a> {
	credentials: &'a ConsumerCredentials,
	algorithm: &'a dyn HashAlgorithm,
}
impl<'a> SignatureBuilder<'a> {
	/// Creates a builder for `credentials` hashing with `algorithm`.
	pub fn new(credentials: &'a ConsumerCredentials, algorithm: &'a dyn HashAlgorithm) -> Self {
		Self { credentials, algorithm }
	}

	/// Returns `enc(consumer_secret)&enc(token_secret)`, with an empty token secret when absent.
	pub fn signing_key(&self, token_secret: Option<&str>) -> String {
		format!(
			"{}&{}",
			percent_encode(self.credentials.secret.expose()),
			percent_encode(token_secret.unwrap_or_default())
		)
	}

	/// Builds the signature base string for `context`.
	pub fn base_string(&self, context: &SigningContext) -> Result<String, ConfigError> {
		let base = self.base_parameters(context);

		self.base_string_with(context, &base)
	}

	/// Computes `oauth_signature` and returns the final authorization parameter set.
	pub fn sign(&self, context: &SigningContext) -> Result<SignedParameters, ConfigError> {
		let mut parameters = self.base_parameters(context);
		let base_string = self.base_string_with(context, &parameters)?;
		let signature =
			self.algorithm.hash(&base_string, &self.signing_key(context.token_secret));

		parameters.push(("oauth_signature", signature));
		parameters.sort();

		Ok(SignedParameters { parameters, base_string })
	}

	fn base_parameters(&self, context: &SigningContext) -> Vec<(&'static str, String)> {
		let mut parameters = vec![
			("oauth_consumer_key", self.credentials.key.to_string()),
			("oauth_signature_method", self.algorithm.method().as_str().to_owned()),
			("oauth_timestamp", context.timestamp.to_string()),
			("oauth_nonce", context.nonce.clone()),
			("oauth_version", context.version.to_owned()),
		];

		if let Some(token) = context.token {
			parameters.push(("oauth_token", token.to_owned()));
		}
		if let Some(verifier) = context.verifier {
			parameters.push(("oauth_verifier", verifier.to_owned()));
		}

		parameters
	}

	fn base_string_with(
		&self,
		context: &SigningContext,
		base: &[(&'static str, String)],
	) -> Result<String, ConfigError> {
		if let Some((name, _)) =
			context.parameters.iter().find(|(name, _)| RESERVED_PARAMETERS.contains(&name.as_ref()))
		{
			return Err(ConfigError::ReservedParameter { name: name.to_string() });
		}

		let mut all = base
			.iter()
			.map(|(name, value)| (*name, value.as_str()))
			.chain(context.parameters.iter().map(|(name, value)| (name.as_ref(), value.as_ref())))
			.collect::<Vec<_>>();

		all.sort();

		Ok(format!(
			"{}&{}&{}",
			percent_encode(context.method.as_str()),
			percent_encode(normalized_url(context.url)),
			percent_encode(&encode_pairs(&all))
		))
	}
}
impl Debug for SignatureBuilder<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignatureBuilder")
			.field("consumer_key", &self.credentials.key)
			.field("method", &self.algorithm.method())
			.finish()
	}
}

/// Sorted `oauth_*` parameters including `oauth_signature`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedParameters {
	parameters: Vec<(&'static str, String)>,
	base_string: String,
}
impl SignedParameters {
	/// Header form: `OAuth name="value", name2="value2"`.
	pub fn header(&self) -> String {
		let pairs = self
			.parameters
			.iter()
			.map(|(name, value)| format!("{}=\"{}\"", percent_encode(name), percent_encode(value)))
			.collect::<Vec<_>>();

		format!("OAuth {}", pairs.join(", "))
	}

	/// [`header`](Self::header) as an `Authorization` header value, marked sensitive.
	pub fn header_value(&self) -> Result<HeaderValue, ConfigError> {
		let mut value = HeaderValue::from_str(&self.header())?;

		value.set_sensitive(true);

		Ok(value)
	}

	/// Query form: `name=value&name2=value2`.
	pub fn query(&self) -> String {
		encode_pairs(&self.parameters)
	}

	/// Value of `oauth_signature`.
	pub fn signature(&self) -> &str {
		self.get("oauth_signature").unwrap_or_default()
	}

	/// Looks up one parameter by name.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.parameters.iter().find(|(n, _)| *n == name).map(|(_, value)| value.as_str())
	}

	/// Iterates over the sorted parameters.
	pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
		self.parameters.iter().map(|(name, value)| (*name, value.as_str()))
	}

	/// Base string that was hashed.
	pub fn base_string(&self) -> &str {
		&self.base_string
	}
}

/// Scheme, authority and path of `url`, without query or fragment.
pub fn normalized_url(url: &Url) -> &str {
	&url[..Position::AfterPath]
}
