//! Request-token and access-token exchanges with a bounded, per-call retry budget.
//!
//! [`TokenExchangeClient`] borrows everything it needs (transport, descriptor, credentials, hash
//! algorithm) so the coordinator can build one per stage. Every attempt is signed with a fresh
//! nonce and timestamp. The attempt counter lives in the loop frame of a single exchange, so a
//! later exchange always starts with the full budget.

mod request;
mod response;

pub use request::*;
pub use response::*;

// crates.io
use ::http::header::{AUTHORIZATION, CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ConsumerCredentials, RequestToken},
	crypto::HashAlgorithm,
	error::{ConfigError, ExchangeError},
	http::{self, HttpRequest, HttpTransport},
	obs::{self, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
	signature::{SignatureBuilder, percent_encode},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Issues the signed token-exchange calls of the three-legged flow.
pub struct TokenExchangeClient<'a, C>
where
	C: ?Sized + HttpTransport,
{
	http_client: &'a C,
	descriptor: &'a ProviderDescriptor,
	signer: SignatureBuilder<'a>,
}
impl<'a, C> TokenExchangeClient<'a, C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client for one provider and consumer.
	pub fn new(
		http_client: &'a C,
		descriptor: &'a ProviderDescriptor,
		credentials: &'a ConsumerCredentials,
		algorithm: &'a dyn HashAlgorithm,
	) -> Self {
		Self { http_client, descriptor, signer: SignatureBuilder::new(credentials, algorithm) }
	}

	/// Obtains a temporary request token.
	///
	/// The response must carry `oauth_token`, `oauth_token_secret` and a confirmed callback.
	pub async fn request_token(&self) -> Result<RequestToken> {
		let request = ExchangeRequest::RequestToken { endpoint: &self.descriptor.endpoints.request_token };

		self.instrumented(request, "request_token", async {
			let body = self.exchange(&request, Error::RequestToken).await?;

			TokenResponse::parse(&body)
				.and_then(TokenResponse::into_request_token)
				.map_err(|e| Error::RequestToken(e.into()))
		})
		.await
	}

	/// Builds the authorize URL the user visits: the signed query form over the request token
	/// plus `oauth_callback`.
	pub fn authorize_url(&self, request_token: &RequestToken) -> Result<Url, ConfigError> {
		let endpoint = &self.descriptor.endpoints.authorization;
		let request = ExchangeRequest::Authorize {
			endpoint,
			token: &request_token.token,
			secret: request_token.secret.expose(),
		};
		let signed = self.signer.sign(&request.signing_context(Method::GET))?;
		let query = format!(
			"{}&oauth_callback={}",
			signed.query(),
			percent_encode(self.descriptor.callback_or_oob())
		);
		let query = match endpoint.query() {
			Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
			_ => query,
		};
		let mut url = endpoint.clone();

		url.set_query(Some(&query));

		Ok(url)
	}

	/// Exchanges an authorized request token and its verifier for an access token.
	///
	/// The request token is consumed whatever the outcome.
	pub async fn access_token(
		&self,
		request_token: RequestToken,
		verifier: &str,
	) -> Result<AccessToken> {
		let request = ExchangeRequest::AccessToken {
			endpoint: &self.descriptor.endpoints.access_token,
			token: &request_token.token,
			secret: request_token.secret.expose(),
			verifier,
		};

		self.instrumented(request, "access_token", async {
			let body = self.exchange(&request, Error::AccessToken).await?;

			TokenResponse::parse(&body)
				.map(TokenResponse::into_access_token)
				.map_err(|e| Error::AccessToken(e.into()))
		})
		.await
	}

	async fn instrumented<T, Fut>(
		&self,
		request: ExchangeRequest<'_>,
		call_site: &'static str,
		fut: Fut,
	) -> Result<T>
	where
		Fut: Future<Output = Result<T>>,
	{
		let stage = request.stage();
		let span = FlowSpan::new(stage, call_site);

		obs::record_flow_outcome(stage, FlowOutcome::Attempt);

		let result = span.instrument(fut).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(stage, FlowOutcome::Success),
			Err(e) => {
				obs::trace_failure(stage, e);
				obs::record_flow_outcome(stage, FlowOutcome::Failure);
			},
		}

		result
	}

	/// Sends `request` until it succeeds, fails permanently, or the budget runs out.
	///
	/// Transport failures are wrapped with `stage_error`; local configuration failures are not.
	async fn exchange(
		&self,
		request: &ExchangeRequest<'_>,
		stage_error: fn(ExchangeError) -> Error,
	) -> Result<Vec<u8>> {
		let policy = &self.descriptor.retry;
		let budget = request.retry_budget(policy);
		let stage = request.stage();
		let mut attempt = 0;

		loop {
			attempt += 1;

			let http_request = self.build_request(request)?;
			let outcome = self.http_client.execute(http_request).await.and_then(http::classify);

			match outcome {
				Ok(body) => return Ok(body),
				Err(e) if attempt < budget && e.is_retryable(policy.retry_client_errors) => {
					obs::trace_retry(stage, attempt, budget, &e);
					obs::record_flow_outcome(stage, FlowOutcome::Retry);
				},
				Err(e) =>
					return Err(stage_error(ExchangeError::Transport { attempts: attempt, source: e })),
			}
		}
	}

	fn build_request(&self, request: &ExchangeRequest<'_>) -> Result<HttpRequest, ConfigError> {
		let method = self.descriptor.token_request_method.as_method();
		let signed = self.signer.sign(&request.signing_context(method.clone()))?;
		let mut builder = ::http::Request::builder()
			.method(method.clone())
			.uri(request.endpoint().as_str())
			.header(AUTHORIZATION, signed.header_value()?);

		if method == Method::POST {
			builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE);
		}

		Ok(builder.body(Vec::new())?)
	}
}
impl<C> Debug for TokenExchangeClient<'_, C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchangeClient")
			.field("provider", &self.descriptor.id)
			.field("signer", &self.signer)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::iter;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		crypto::HmacSha1Algorithm,
		error::{ResponseError, TransportError},
		provider::{RetryPolicy, TokenRequestMethod},
	};

	const REQUEST_TOKEN_BODY: &str =
		"oauth_token=T&oauth_token_secret=S&oauth_callback_confirmed=1";

	fn authorization_header(request: &HttpRequest) -> String {
		request
			.headers()
			.get(AUTHORIZATION)
			.expect("Exchange requests must carry an Authorization header.")
			.to_str()
			.expect("Authorization header should be ASCII.")
			.to_owned()
	}

	fn nonce_of(header: &str) -> String {
		header
			.split(", ")
			.find_map(|pair| pair.strip_prefix("oauth_nonce=\""))
			.and_then(|rest| rest.strip_suffix('"'))
			.expect("Header should carry a nonce.")
			.to_owned()
	}

	#[tokio::test]
	async fn request_token_parses_the_form_body() {
		let transport = ScriptedTransport::new([ScriptedReply::Respond(200, REQUEST_TOKEN_BODY)]);
		let descriptor = test_descriptor();
		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);
		let token = client.request_token().await.expect("Request token exchange should succeed.");

		assert_eq!(token.token, "T");
		assert_eq!(token.secret.expose(), "S");

		let requests = transport.requests();

		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].method(), Method::GET);
		assert_eq!(requests[0].uri(), "https://api.example.com/oauth/request_token");
		assert!(requests[0].body().is_empty());

		let header = authorization_header(&requests[0]);

		assert!(header.starts_with("OAuth oauth_consumer_key=\"CK\", oauth_nonce=\""));
		assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
		assert!(header.contains("oauth_version=\"1.0\""));
		assert!(!header.contains("oauth_token="));
	}

	#[tokio::test]
	async fn unconfirmed_callback_is_malformed_and_not_retried() {
		let transport =
			ScriptedTransport::new([ScriptedReply::Respond(200, "oauth_token=T&oauth_token_secret=S")]);
		let descriptor = test_descriptor();
		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);
		let err = client.request_token().await.expect_err("Unconfirmed callback must fail.");

		assert!(matches!(
			err,
			Error::RequestToken(ExchangeError::MalformedResponse(ResponseError::CallbackNotConfirmed))
		));
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn retries_stop_at_the_budget() {
		let transport =
			ScriptedTransport::new(iter::repeat_n(ScriptedReply::ConnectionReset, 6));
		let descriptor = test_descriptor();
		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);
		let err = client.request_token().await.expect_err("Exhausted retries must fail.");

		assert_eq!(transport.calls(), 5);
		assert!(matches!(
			err,
			Error::RequestToken(ExchangeError::Transport { attempts: 5, source: TransportError::Io(_) })
		));
	}

	#[tokio::test]
	async fn permanent_client_errors_skip_the_budget() {
		let transport = ScriptedTransport::new([ScriptedReply::Respond(401, "invalid consumer")]);
		let descriptor = test_descriptor();
		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);
		let err = client.request_token().await.expect_err("401 must fail.");

		assert_eq!(transport.calls(), 1);
		assert!(matches!(
			err,
			Error::RequestToken(ExchangeError::Transport {
				attempts: 1,
				source: TransportError::Status { status: 401, .. }
			})
		));
	}

	#[tokio::test]
	async fn client_errors_are_retried_when_configured() {
		let transport = ScriptedTransport::new([
			ScriptedReply::Respond(401, "clock skew"),
			ScriptedReply::Respond(200, REQUEST_TOKEN_BODY),
		]);
		let mut descriptor = test_descriptor();

		descriptor.retry = RetryPolicy { max_attempts: 3, retry_client_errors: true };

		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);

		client.request_token().await.expect("Second attempt should succeed.");

		assert_eq!(transport.calls(), 2);
	}

	#[tokio::test]
	async fn each_attempt_is_signed_with_a_fresh_nonce() {
		let transport = ScriptedTransport::new([
			ScriptedReply::Respond(503, "busy"),
			ScriptedReply::Respond(200, REQUEST_TOKEN_BODY),
		]);
		let descriptor = test_descriptor();
		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);

		client.request_token().await.expect("Retry should succeed.");

		let requests = transport.requests();

		assert_eq!(requests.len(), 2);
		assert_ne!(
			nonce_of(&authorization_header(&requests[0])),
			nonce_of(&authorization_header(&requests[1]))
		);
	}

	#[tokio::test]
	async fn budgets_do_not_leak_between_exchanges() {
		let transport = ScriptedTransport::new(
			iter::repeat_n(ScriptedReply::ConnectionReset, 4)
				.chain([ScriptedReply::Respond(200, REQUEST_TOKEN_BODY)])
				.chain(iter::repeat_n(ScriptedReply::ConnectionReset, 4))
				.chain([ScriptedReply::Respond(200, REQUEST_TOKEN_BODY)]),
		);
		let descriptor = test_descriptor();
		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);

		client.request_token().await.expect("Fifth attempt should succeed.");
		client.request_token().await.expect("A later exchange starts with a full budget.");

		assert_eq!(transport.calls(), 10);
	}

	#[tokio::test]
	async fn access_token_signs_with_the_request_token_and_verifier() {
		let transport = ScriptedTransport::new([ScriptedReply::Respond(
			200,
			"oauth_token=AT&oauth_token_secret=ATS&screen_name=someone",
		)]);
		let mut descriptor = test_descriptor();

		descriptor.token_request_method = TokenRequestMethod::Post;

		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);
		let access = client
			.access_token(RequestToken::new("T", "S"), "V")
			.await
			.expect("Access token exchange should succeed.");

		assert_eq!(access.token, "AT");
		assert_eq!(access.secret.expose(), "ATS");

		let requests = transport.requests();
		let header = authorization_header(&requests[0]);

		assert_eq!(requests[0].method(), Method::POST);
		assert_eq!(requests[0].uri(), "https://api.example.com/oauth/access_token");
		assert_eq!(
			requests[0].headers().get(CONTENT_TYPE).map(|v| v.as_bytes()),
			Some(FORM_CONTENT_TYPE.as_bytes())
		);
		assert!(header.contains("oauth_token=\"T\""));
		assert!(header.contains("oauth_verifier=\"V\""));
	}

	#[tokio::test]
	async fn access_token_failures_are_stage_specific() {
		let transport = ScriptedTransport::new([ScriptedReply::Respond(200, "oauth_token=AT")]);
		let descriptor = test_descriptor();
		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);
		let err = client
			.access_token(RequestToken::new("T", "S"), "V")
			.await
			.expect_err("Missing secret must fail.");

		assert!(matches!(
			err,
			Error::AccessToken(ExchangeError::MalformedResponse(ResponseError::MissingField {
				field: "oauth_token_secret"
			}))
		));
	}

	#[test]
	fn authorize_url_carries_signed_query_and_callback() {
		let transport = ScriptedTransport::default();
		let descriptor = test_descriptor();
		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);
		let url = client
			.authorize_url(&RequestToken::new("T", "S"))
			.expect("Authorize URL should build.");
		let pairs = url.query_pairs().into_owned().collect::<HashMap<_, _>>();

		assert!(url.as_str().starts_with("https://api.example.com/oauth/authorize?oauth_consumer_key=CK&"));
		assert!(url.as_str().ends_with("&oauth_callback=app%3A%2F%2Foauth-callback"));
		assert_eq!(pairs["oauth_token"], "T");
		assert_eq!(pairs["oauth_callback"], "app://oauth-callback");
		assert!(pairs.contains_key("oauth_signature"));
		assert_eq!(transport.calls(), 0);
	}

	#[test]
	fn authorize_url_falls_back_to_out_of_band() {
		let transport = ScriptedTransport::default();
		let mut descriptor = test_descriptor();

		descriptor.callback = None;

		let credentials = test_credentials();
		let client =
			TokenExchangeClient::new(&transport, &descriptor, &credentials, &HmacSha1Algorithm);
		let url = client
			.authorize_url(&RequestToken::new("T", "S"))
			.expect("Authorize URL should build.");

		assert!(url.as_str().ends_with("&oauth_callback=oob"));
	}
}
