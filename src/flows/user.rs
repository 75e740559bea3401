//! The user-authorization capability the coordinator delegates consent to.

// self
use crate::{_prelude::*, error::AuthorizationError};

/// Boxed future returned by [`UserAuthorizer::authorize`].
pub type AuthorizeFuture<'a> =
	Pin<Box<dyn Future<Output = Result<UserAuthorization, AuthorizationError>> + 'a + Send>>;

/// Obtains user consent for a request token, typically through a browser.
///
/// Implementations show `url` to the user and wait for the provider to redirect to `callback`.
/// A dismissed consent screen should resolve to [`AuthorizationError::Cancelled`]; dropping the
/// future returned by the coordinator has the same effect on the flow.
pub trait UserAuthorizer
where
	Self: Send + Sync,
{
	/// Presents `url` and resolves to the token and verifier carried by the callback.
	fn authorize<'a>(&'a self, url: Url, callback: &'a str) -> AuthorizeFuture<'a>;
}

/// Token and verifier reported back by the user-authorization step.
#[derive(Clone, PartialEq, Eq)]
pub struct UserAuthorization {
	/// `oauth_token` echoed by the provider.
	pub token: String,
	/// `oauth_verifier`.
	pub verifier: String,
}
impl UserAuthorization {
	/// Creates a token + verifier pair.
	pub fn new(token: impl Into<String>, verifier: impl Into<String>) -> Self {
		Self { token: token.into(), verifier: verifier.into() }
	}

	/// Extracts `oauth_token` and `oauth_verifier` from the URL the provider redirected to.
	///
	/// A `denied` parameter means the user refused access.
	pub fn from_callback_url(url: &Url) -> Result<Self, AuthorizationError> {
		let mut token = None;
		let mut verifier = None;

		for (name, value) in url.query_pairs() {
			match name.as_ref() {
				"denied" => return Err(AuthorizationError::Denied { reason: value.into_owned() }),
				"oauth_token" if token.is_none() => token = Some(value.into_owned()),
				"oauth_verifier" if verifier.is_none() => verifier = Some(value.into_owned()),
				_ => {},
			}
		}

		Ok(Self {
			token: token
				.filter(|t| !t.is_empty())
				.ok_or(AuthorizationError::MissingParameter { name: "oauth_token" })?,
			verifier: verifier
				.filter(|v| !v.is_empty())
				.ok_or(AuthorizationError::MissingParameter { name: "oauth_verifier" })?,
		})
	}
}
impl Debug for UserAuthorization {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserAuthorization")
			.field("token", &self.token)
			.field("verifier", &"<redacted>")
			.finish()
	}
}
