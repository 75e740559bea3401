// self
use crate::{
	_prelude::*,
	obs::FlowStage,
	provider::RetryPolicy,
	signature::SigningContext,
};

/// The three provider calls of the flow, each carrying only what its stage needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeRequest<'a> {
	/// Unauthenticated call to the request-token endpoint.
	RequestToken {
		/// Request-token endpoint.
		endpoint: &'a Url,
	},
	/// Authorize URL shown to the user, signed with the request token.
	Authorize {
		/// Authorize endpoint.
		endpoint: &'a Url,
		/// Request token.
		token: &'a str,
		/// Request-token secret.
		secret: &'a str,
	},
	/// Exchange of the authorized request token for an access token.
	AccessToken {
		/// Access-token endpoint.
		endpoint: &'a Url,
		/// Request token.
		token: &'a str,
		/// Request-token secret.
		secret: &'a str,
		/// Verifier returned by the user-authorization step.
		verifier: &'a str,
	},
}
impl<'a> ExchangeRequest<'a> {
	/// Target endpoint.
	pub fn endpoint(&self) -> &'a Url {
		match *self {
			Self::RequestToken { endpoint }
			| Self::Authorize { endpoint, .. }
			| Self::AccessToken { endpoint, .. } => endpoint,
		}
	}

	/// `oauth_token` to sign with.
	pub fn token(&self) -> Option<&'a str> {
		match *self {
			Self::RequestToken { .. } => None,
			Self::Authorize { token, .. } | Self::AccessToken { token, .. } => Some(token),
		}
	}

	/// Secret paired with [`token`](Self::token).
	pub fn token_secret(&self) -> Option<&'a str> {
		match *self {
			Self::RequestToken { .. } => None,
			Self::Authorize { secret, .. } | Self::AccessToken { secret, .. } => Some(secret),
		}
	}

	/// `oauth_verifier`, only set on the access-token exchange.
	pub fn verifier(&self) -> Option<&'a str> {
		match *self {
			Self::AccessToken { verifier, .. } => Some(verifier),
			_ => None,
		}
	}

	/// Attempts allowed for this call. The authorize URL is built once and never retried.
	pub fn retry_budget(&self, policy: &RetryPolicy) -> u32 {
		match self {
			Self::Authorize { .. } => 1,
			_ => policy.max_attempts.max(1),
		}
	}

	/// Flow stage the call belongs to.
	pub fn stage(&self) -> FlowStage {
		match self {
			Self::RequestToken { .. } => FlowStage::RequestToken,
			Self::Authorize { .. } => FlowStage::UserAuthorization,
			Self::AccessToken { .. } => FlowStage::AccessToken,
		}
	}

	/// Fresh signing context (new nonce and timestamp) for one attempt.
	pub fn signing_context(&self, method: Method) -> SigningContext<'a> {
		let mut context = SigningContext::new(method, self.endpoint());

		if let (Some(token), Some(secret)) = (self.token(), self.token_secret()) {
			context = context.with_token(token, secret);
		}
		if let Some(verifier) = self.verifier() {
			context = context.with_verifier(verifier);
		}

		context
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn variants_expose_only_their_fields() {
		let url = Url::parse("https://api.example.com/oauth/access_token").expect("URL should parse.");
		let policy = RetryPolicy::default();
		let request_token = ExchangeRequest::RequestToken { endpoint: &url };
		let authorize = ExchangeRequest::Authorize { endpoint: &url, token: "T", secret: "S" };
		let access_token =
			ExchangeRequest::AccessToken { endpoint: &url, token: "T", secret: "S", verifier: "V" };

		assert_eq!(request_token.token(), None);
		assert_eq!(request_token.verifier(), None);
		assert_eq!(request_token.retry_budget(&policy), 5);
		assert_eq!(authorize.token_secret(), Some("S"));
		assert_eq!(authorize.verifier(), None);
		assert_eq!(authorize.retry_budget(&policy), 1);
		assert_eq!(access_token.verifier(), Some("V"));
		assert_eq!(access_token.endpoint(), &url);
		assert_eq!(access_token.stage(), FlowStage::AccessToken);
	}

	#[test]
	fn signing_contexts_carry_token_and_verifier() {
		let url = Url::parse("https://api.example.com/oauth/access_token").expect("URL should parse.");
		let context =
			ExchangeRequest::AccessToken { endpoint: &url, token: "T", secret: "S", verifier: "V" }
				.signing_context(Method::POST);

		assert_eq!(context.method, Method::POST);
		assert_eq!(context.token, Some("T"));
		assert_eq!(context.token_secret, Some("S"));
		assert_eq!(context.verifier, Some("V"));
		assert!(context.parameters.is_empty());
	}
}
