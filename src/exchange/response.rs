// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, RequestToken},
	error::ResponseError,
};

/// Decoded `application/x-www-form-urlencoded` token endpoint body.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenResponse {
	/// `oauth_token`.
	pub token: String,
	/// `oauth_token_secret`.
	pub secret: String,
	/// `oauth_callback_confirmed`, when present.
	pub callback_confirmed: Option<String>,
}
impl TokenResponse {
	/// Parses a token endpoint body. Empty values count as missing.
	pub fn parse(body: &[u8]) -> Result<Self, ResponseError> {
		if std::str::from_utf8(body).is_err() {
			return Err(ResponseError::NotUtf8);
		}

		let mut token = None;
		let mut secret = None;
		let mut callback_confirmed = None;

		for (name, value) in form_urlencoded::parse(body) {
			let slot = match name.as_ref() {
				"oauth_token" => &mut token,
				"oauth_token_secret" => &mut secret,
				"oauth_callback_confirmed" => &mut callback_confirmed,
				_ => continue,
			};

			if slot.is_none() && !value.is_empty() {
				*slot = Some(value.into_owned());
			}
		}

		Ok(Self {
			token: token.ok_or(ResponseError::MissingField { field: "oauth_token" })?,
			secret: secret.ok_or(ResponseError::MissingField { field: "oauth_token_secret" })?,
			callback_confirmed,
		})
	}

	/// Accepts the body as a request-token response, which must carry
	/// `oauth_callback_confirmed=1`.
	pub fn into_request_token(self) -> Result<RequestToken, ResponseError> {
		match self.callback_confirmed.as_deref() {
			Some("1") => Ok(RequestToken::new(self.token, self.secret)),
			_ => Err(ResponseError::CallbackNotConfirmed),
		}
	}

	/// Accepts the body as an access-token response.
	pub fn into_access_token(self) -> AccessToken {
		AccessToken::new(self.token, self.secret)
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("token", &self.token)
			.field("secret", &"<redacted>")
			.field("callback_confirmed", &self.callback_confirmed)
			.finish()
	}
}
