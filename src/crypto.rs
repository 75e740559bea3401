//! Keyed-hash algorithms that turn a signature base string into `oauth_signature`.
//!
//! [`HashAlgorithm`] is the only seam the signer depends on. Two implementations ship with
//! the crate: [`HmacSha1Algorithm`] for production signing and [`PlaintextAlgorithm`], an
//! identity transform for tests and degenerate provider configurations.

mod hmac_sha1;
mod plaintext;

pub use hmac_sha1::*;
pub use plaintext::*;

// self
use crate::_prelude::*;

/// Values accepted for the `oauth_signature_method` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureMethod {
	/// Signature equals the base string.
	#[serde(rename = "PLAINTEXT")]
	Plaintext,
	/// HMAC-SHA1 over the base string, base64 encoded.
	#[serde(rename = "HMAC-SHA1")]
	HmacSha1,
}
impl SignatureMethod {
	/// Returns the wire identifier.
	pub const fn as_str(self) -> &'static str {
		match self {
			SignatureMethod::Plaintext => "PLAINTEXT",
			SignatureMethod::HmacSha1 => "HMAC-SHA1",
		}
	}
}
impl Display for SignatureMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Pure keyed-hash capability used to compute `oauth_signature`.
pub trait HashAlgorithm
where
	Self: Send + Sync,
{
	/// Hashes `message` with `key` and returns the textual signature.
	fn hash(&self, message: &str, key: &str) -> String;

	/// Method advertised through `oauth_signature_method`.
	fn method(&self) -> SignatureMethod;
}
impl<T> HashAlgorithm for Arc<T>
where
	T: ?Sized + HashAlgorithm,
{
	fn hash(&self, message: &str, key: &str) -> String {
		(**self).hash(message, key)
	}

	fn method(&self) -> SignatureMethod {
		(**self).method()
	}
}
