// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except the OAuth unreserved characters (`A-Z a-z 0-9 - . _ ~`) is escaped.
pub const OAUTH_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes `input` with [`OAUTH_ENCODE_SET`], using uppercase hex digits.
pub fn percent_encode(input: &str) -> String {
	utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Renders `name=value` pairs joined by `&`, each side encoded with [`OAUTH_ENCODE_SET`].
pub fn encode_pairs<'a, I, K, V>(pairs: I) -> String
where
	I: IntoIterator<Item = &'a (K, V)>,
	K: 'a + AsRef<str>,
	V: 'a + AsRef<str>,
{
	pairs
		.into_iter()
		.map(|(name, value)| {
			format!("{}={}", percent_encode(name.as_ref()), percent_encode(value.as_ref()))
		})
		.collect::<Vec<_>>()
		.join("&")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unreserved_characters_pass_through() {
		assert_eq!(percent_encode("AZaz09-._~"), "AZaz09-._~");
	}

	#[test]
	fn reserved_and_multibyte_characters_are_escaped() {
		assert_eq!(percent_encode("Ladies + Gentlemen ~ä"), "Ladies%20%2B%20Gentlemen%20~%C3%A4");
		assert_eq!(percent_encode("a=b&c"), "a%3Db%26c");
		assert_eq!(percent_encode("https://x/y"), "https%3A%2F%2Fx%2Fy");
		assert_eq!(percent_encode("*"), "%2A");
	}

	#[test]
	fn pairs_keep_their_order() {
		let pairs = [("q", "rust lang"), ("count", "10")];

		assert_eq!(encode_pairs(&pairs), "q=rust%20lang&count=10");
		assert_eq!(encode_pairs(&Vec::<(String, String)>::new()), "");
	}
}
