//! Validated names for providers and consumer keys.
//!
//! A consumer key travels verbatim in every signed request: it is a member of the signature base
//! string, the `oauth_consumer_key` header field, and half of the [`StoreKey`] a token is filed
//! under. A key with padding or a control character would still percent-encode, yet the provider
//! compares it byte for byte against what it issued and answers with an opaque `401`. Rejecting
//! such keys at construction turns that into an [`IdentifierError`] naming the offending
//! character.
//!
//! Provider identifiers are local slugs chosen by the application (`twitter`, `x-com`). They key
//! the token store, so they are kept to a file-name-safe alphabet.
//!
//! [`StoreKey`]: crate::store::StoreKey

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Longest accepted consumer key, in bytes.
pub const CONSUMER_KEY_MAX_LEN: usize = 256;
/// Longest accepted provider identifier, in bytes.
pub const PROVIDER_ID_MAX_LEN: usize = 64;

/// Why a provider identifier or consumer key was refused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Nothing to sign with.
	#[error("{kind} must not be empty.")]
	Empty {
		/// `"Provider"` or `"ConsumerKey"`.
		kind: &'static str,
	},
	/// Whitespace, a control character, or (for provider slugs) punctuation outside `-_.`.
	#[error("{kind} contains {character:?} at byte {index}, which is not allowed.")]
	InvalidCharacter {
		/// `"Provider"` or `"ConsumerKey"`.
		kind: &'static str,
		/// First rejected character.
		character: char,
		/// Byte offset of `character`.
		index: usize,
	},
	/// Over the per-kind byte limit.
	#[error("{kind} is longer than {max} bytes.")]
	TooLong {
		/// `"Provider"` or `"ConsumerKey"`.
		kind: &'static str,
		/// Limit for this kind.
		max: usize,
	},
}

/// Per-kind validation: accepted alphabet and length limit.
struct Rule {
	kind: &'static str,
	max: usize,
	allows: fn(char) -> bool,
}
impl Rule {
	fn check(&self, value: &str) -> Result<(), IdentifierError> {
		let kind = self.kind;

		if value.is_empty() {
			return Err(IdentifierError::Empty { kind });
		}
		if let Some((index, character)) = value.char_indices().find(|(_, c)| !(self.allows)(*c)) {
			return Err(IdentifierError::InvalidCharacter { kind, character, index });
		}
		if value.len() > self.max {
			return Err(IdentifierError::TooLong { kind, max: self.max });
		}

		Ok(())
	}
}

const PROVIDER_RULE: Rule =
	Rule { kind: "Provider", max: PROVIDER_ID_MAX_LEN, allows: is_slug_char };
const CONSUMER_KEY_RULE: Rule =
	Rule { kind: "ConsumerKey", max: CONSUMER_KEY_MAX_LEN, allows: is_key_char };

fn is_slug_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

// Printable ASCII minus the space; providers issue keys from this range.
fn is_key_char(c: char) -> bool {
	c.is_ascii_graphic()
}

macro_rules! validated_name {
	($(#[$meta:meta])* $name:ident => $rule:expr) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates and wraps `value`.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				Self::try_from(value.as_ref().to_owned())
			}

			/// The value exactly as it goes on the wire.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$rule.check(&value).map(|()| Self(value))
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				self.as_str()
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.as_str()
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				self.as_str()
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", $rule.kind, self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

validated_name! {
	/// Application-chosen slug naming an OAuth 1.0a service provider descriptor.
	ProviderId => PROVIDER_RULE
}
validated_name! {
	/// Consumer key issued to the application, sent as `oauth_consumer_key`.
	ConsumerKey => CONSUMER_KEY_RULE
}
