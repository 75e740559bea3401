// self
use crate::crypto::{HashAlgorithm, SignatureMethod};

/// Identity transform: the signature is the message itself, whatever the key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaintextAlgorithm;
impl HashAlgorithm for PlaintextAlgorithm {
	fn hash(&self, message: &str, _key: &str) -> String {
		message.to_owned()
	}

	fn method(&self) -> SignatureMethod {
		SignatureMethod::Plaintext
	}
}
