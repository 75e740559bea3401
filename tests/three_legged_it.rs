#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use tempfile::TempDir;
// self
use oauth1_broker::{
	auth::{AccessToken, ConsumerCredentials, ProviderId},
	error::{AuthorizationError, Error, ExchangeError, ResponseError, TransportError},
	flows::{
		AuthorizeFuture, FlowStatus, ReqwestCoordinator, UserAuthorization, UserAuthorizer,
	},
	obs::FlowStage,
	provider::{ProviderDescriptor, RetryPolicy, TokenRequestMethod},
	store::{AccessTokenStore, FileStore},
	url::Url,
};

const REQUEST_TOKEN_BODY: &str =
	"oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=1";
const ACCESS_TOKEN_BODY: &str =
	"oauth_token=acc-token&oauth_token_secret=acc-secret&user_id=42&screen_name=someone";

fn build_descriptor(server: &MockServer) -> ProviderDescriptor {
	let base = Url::parse(&server.base_url()).expect("Mock base URL should parse.");

	ProviderDescriptor::builder(
		ProviderId::new("mock-http").expect("Provider identifier should be valid."),
		base,
	)
	.request_token_path("/oauth/request_token")
	.authorize_path("/oauth/authorize")
	.access_token_path("/oauth/access_token")
	.callback("app://oauth-callback")
	.token_request_method(TokenRequestMethod::Post)
	.build()
	.expect("Descriptor should build for a loopback server.")
}

fn build_coordinator(descriptor: ProviderDescriptor) -> ReqwestCoordinator {
	let credentials =
		ConsumerCredentials::new("consumer-it", "consumer-secret").expect("Credentials should be valid.");

	ReqwestCoordinator::new(descriptor, credentials)
}

/// Plays the browser: reads the request token off the authorize URL and "redirects" to the
/// callback with a verifier.
struct CallbackAuthorizer;
impl UserAuthorizer for CallbackAuthorizer {
	fn authorize<'a>(&'a self, url: Url, callback: &'a str) -> AuthorizeFuture<'a> {
		Box::pin(async move {
			let token = url
				.query_pairs()
				.find(|(name, _)| name == "oauth_token")
				.map(|(_, value)| value.into_owned())
				.ok_or(AuthorizationError::MissingParameter { name: "oauth_token" })?;
			let redirect = Url::parse(&format!("{callback}?oauth_token={token}&oauth_verifier=verifier-it"))
				.map_err(AuthorizationError::handler)?;

			UserAuthorization::from_callback_url(&redirect)
		})
	}
}

struct DenyingAuthorizer;
impl UserAuthorizer for DenyingAuthorizer {
	fn authorize<'a>(&'a self, _: Url, callback: &'a str) -> AuthorizeFuture<'a> {
		Box::pin(async move {
			let redirect = Url::parse(&format!("{callback}?denied=req-token"))
				.map_err(AuthorizationError::handler)?;

			UserAuthorization::from_callback_url(&redirect)
		})
	}
}

#[tokio::test]
async fn three_legged_flow_obtains_and_persists_an_access_token() {
	let server = MockServer::start_async().await;
	let request_token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/x-www-form-urlencoded")
				.body(REQUEST_TOKEN_BODY);
		})
		.await;
	let access_token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/x-www-form-urlencoded")
				.body(ACCESS_TOKEN_BODY);
		})
		.await;
	let dir = TempDir::new().expect("Temporary directory should be created.");
	let store = Arc::new(FileStore::open(dir.path().join("tokens.json")).expect("Store should open."));
	let coordinator = build_coordinator(build_descriptor(&server)).with_store(store.clone());
	let token = coordinator.authorize(&CallbackAuthorizer).await.expect("Flow should complete.");

	request_token.assert_async().await;
	access_token.assert_async().await;

	assert_eq!(token.token, "acc-token");
	assert_eq!(token.secret.expose(), "acc-secret");
	assert_eq!(coordinator.state(), FlowStatus::Authorized);

	let stored = store
		.fetch(&coordinator.store_key())
		.await
		.expect("Fetch should succeed.")
		.expect("Flow should persist the token.");

	assert_eq!(stored, token);

	let reopened =
		Arc::new(FileStore::open(store.path()).expect("Store should reopen from disk."));
	let restarted = build_coordinator(build_descriptor(&server)).with_store(reopened);
	let restored = restarted
		.restore_access_token()
		.await
		.expect("Restore should succeed.")
		.expect("Reopened store should hold the token.");

	assert_eq!(restored.token, "acc-token");
	assert!(restarted.is_authorized());
	request_token.assert_calls_async(1).await;
}

#[tokio::test]
async fn unconfirmed_callbacks_fail_without_retrying() {
	let server = MockServer::start_async().await;
	let request_token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token");
			then.status(200).body("oauth_token=req-token&oauth_token_secret=req-secret");
		})
		.await;
	let coordinator = build_coordinator(build_descriptor(&server));
	let err = coordinator
		.authorize(&CallbackAuthorizer)
		.await
		.expect_err("Unconfirmed callback must fail.");

	assert!(matches!(
		err,
		Error::RequestToken(ExchangeError::MalformedResponse(ResponseError::CallbackNotConfirmed))
	));
	assert_eq!(coordinator.state(), FlowStatus::Failed(FlowStage::RequestToken));
	request_token.assert_calls_async(1).await;
}

#[tokio::test]
async fn server_errors_consume_the_retry_budget() {
	let server = MockServer::start_async().await;
	let request_token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token");
			then.status(503).body("over capacity");
		})
		.await;
	let descriptor = ProviderDescriptor {
		retry: RetryPolicy { max_attempts: 3, ..Default::default() },
		..build_descriptor(&server)
	};
	let coordinator = build_coordinator(descriptor);
	let err = coordinator.authorize(&CallbackAuthorizer).await.expect_err("503s must fail.");

	assert!(matches!(
		err,
		Error::RequestToken(ExchangeError::Transport {
			attempts: 3,
			source: TransportError::Status { status: 503, .. }
		})
	));
	request_token.assert_calls_async(3).await;
}

#[tokio::test]
async fn denied_authorization_never_reaches_the_access_endpoint() {
	let server = MockServer::start_async().await;
	let request_token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token");
			then.status(200).body(REQUEST_TOKEN_BODY);
		})
		.await;
	let access_token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).body(ACCESS_TOKEN_BODY);
		})
		.await;
	let coordinator = build_coordinator(build_descriptor(&server));
	let err = coordinator.authorize(&DenyingAuthorizer).await.expect_err("Denial must fail.");

	assert!(matches!(err, Error::Authorization(AuthorizationError::Denied { .. })));
	assert_eq!(coordinator.state(), FlowStatus::Failed(FlowStage::UserAuthorization));
	request_token.assert_calls_async(1).await;
	access_token.assert_calls_async(0).await;

	let recovered = build_coordinator(build_descriptor(&server))
		.with_access_token(AccessToken::new("acc-token", "acc-secret"));

	assert!(recovered.is_authorized());
}
