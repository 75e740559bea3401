// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
// self
use crate::crypto::{HashAlgorithm, SignatureMethod};

type HmacSha1 = Hmac<Sha1>;

/// HMAC-SHA1 keyed with the UTF-8 signing key, digest rendered as standard padded base64.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HmacSha1Algorithm;
impl HashAlgorithm for HmacSha1Algorithm {
	fn hash(&self, message: &str, key: &str) -> String {
		let mut mac =
			HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length.");

		mac.update(message.as_bytes());

		STANDARD.encode(mac.finalize().into_bytes())
	}

	fn method(&self) -> SignatureMethod {
		SignatureMethod::HmacSha1
	}
}
