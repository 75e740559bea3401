//! Interactive three-legged OAuth 1.0a walkthrough against the X (Twitter) v1.1 endpoints.
//!
//! The demo obtains a request token, prints the authorize URL, waits for the user to paste the
//! URL the browser was redirected to, exchanges the verifier for an access token, stores it in a
//! JSON file, and finally calls `account/verify_credentials.json` with the new token.

// std
use std::{
	io::{self, Write},
	sync::Arc,
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth1_broker::{
	auth::{ConsumerCredentials, ProviderId},
	error::AuthorizationError,
	flows::{AuthorizeFuture, ReqwestCoordinator, UserAuthorization, UserAuthorizer},
	provider::{ProviderDescriptor, TokenRequestMethod},
	signer::ApiRequest,
	store::FileStore,
};

/// Asks the user to visit the authorize URL and paste the callback URL back.
struct TerminalAuthorizer;
impl UserAuthorizer for TerminalAuthorizer {
	fn authorize<'a>(&'a self, url: Url, callback: &'a str) -> AuthorizeFuture<'a> {
		Box::pin(async move {
			println!("Open this URL and approve the application:\n\n    {url}\n");

			let pasted = prompt(&format!("Paste the URL you were redirected to ({callback}...)"))
				.map_err(AuthorizationError::handler)?;

			if pasted.is_empty() {
				return Err(AuthorizationError::Cancelled);
			}

			let redirect = Url::parse(&pasted).map_err(AuthorizationError::handler)?;

			UserAuthorization::from_callback_url(&redirect)
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let consumer_key = prompt("Consumer key")?;
	let consumer_secret = prompt("Consumer secret")?;
	let callback = prompt("Callback URL registered for the app (blank for out-of-band)")?;
	let mut builder = ProviderDescriptor::builder(
		ProviderId::new("x-com")?,
		Url::parse("https://api.x.com/1.1/")?,
	)
	.request_token_endpoint(Url::parse("https://api.x.com/oauth/request_token")?)
	.authorize_endpoint(Url::parse("https://api.x.com/oauth/authorize")?)
	.access_token_endpoint(Url::parse("https://api.x.com/oauth/access_token")?)
	.token_request_method(TokenRequestMethod::Post);

	if !callback.is_empty() {
		builder = builder.callback(callback);
	}

	let store = Arc::new(FileStore::open("target/oauth1-demo/tokens.json")?);
	let coordinator =
		ReqwestCoordinator::new(builder.build()?, ConsumerCredentials::new(consumer_key, consumer_secret)?)
			.with_store(store.clone());

	match coordinator.restore_access_token().await? {
		Some(token) => println!("Reusing access token {} from {}.", token.token, store.path().display()),
		None => {
			let token = coordinator.authorize(&TerminalAuthorizer).await?;

			println!("Obtained access token {} ({}).", token.token, coordinator.state());
		},
	}

	let response = coordinator
		.execute(ApiRequest::get("account/verify_credentials.json").with_query("skip_status", "true"))
		.await?;
	let profile: serde_json::Value = serde_json::from_slice(response.body())?;

	if let Some(name) = profile.get("screen_name").and_then(|value| value.as_str()) {
		coordinator.set_authenticated_user(name);
	}

	println!("Signed in as {}.", coordinator.authenticated_user()?);

	Ok(())
}

fn prompt(message: &str) -> io::Result<String> {
	print!("{message}: ");

	io::stdout().flush()?;

	let mut input = String::new();

	io::stdin().read_line(&mut input)?;

	Ok(input.trim().to_owned())
}
