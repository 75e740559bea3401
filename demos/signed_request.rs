//! Signs a single API call with an access token obtained earlier.
//!
//! Reads `OAUTH1_CONSUMER_KEY`, `OAUTH1_CONSUMER_SECRET`, `OAUTH1_ACCESS_TOKEN`, and
//! `OAUTH1_ACCESS_SECRET` from the environment, then fetches the home timeline and also shows the
//! raw `Authorization` header for a hand-built `reqwest` request.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::WrapErr};
use url::Url;
// self
use oauth1_broker::{
	auth::{AccessToken, ConsumerCredentials, ProviderId},
	ext::RequestSignerExt,
	flows::ReqwestCoordinator,
	provider::ProviderDescriptor,
	reqwest::Client,
	signer::ApiRequest,
};

fn var(name: &str) -> Result<String> {
	env::var(name).wrap_err_with(|| format!("{name} must be set"))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let descriptor = ProviderDescriptor::builder(
		ProviderId::new("x-com")?,
		Url::parse("https://api.x.com/1.1/")?,
	)
	.request_token_endpoint(Url::parse("https://api.x.com/oauth/request_token")?)
	.authorize_endpoint(Url::parse("https://api.x.com/oauth/authorize")?)
	.access_token_endpoint(Url::parse("https://api.x.com/oauth/access_token")?)
	.build()?;
	let credentials =
		ConsumerCredentials::new(var("OAUTH1_CONSUMER_KEY")?, var("OAUTH1_CONSUMER_SECRET")?)?;
	let coordinator = ReqwestCoordinator::new(descriptor, credentials).with_access_token(
		AccessToken::new(var("OAUTH1_ACCESS_TOKEN")?, var("OAUTH1_ACCESS_SECRET")?),
	);
	let response = coordinator
		.execute(
			ApiRequest::get("statuses/home_timeline.json")
				.with_query("count", "5")
				.with_retry_budget(3),
		)
		.await?;

	println!("{}", String::from_utf8_lossy(response.body()));

	let request = Client::new()
		.get("https://api.x.com/1.1/account/settings.json")
		.build()?;
	let signed = coordinator.signer().sign_request(request)?;

	if let Some(header) = signed.headers().get("authorization") {
		println!("Authorization: {}", header.to_str()?);
	}

	Ok(())
}
