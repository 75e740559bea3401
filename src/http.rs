//! Transport primitives the broker calls through.
//!
//! [`HttpTransport`] is the only dependency the broker has on an HTTP stack: it accepts a fully
//! built [`HttpRequest`] (method, URL, headers, body) and resolves to whatever [`HttpResponse`]
//! the server produced. Status classification is done by the broker through [`classify`], so
//! implementations must return non-2xx responses as `Ok` rather than mapping them to errors.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Request type handed to transports.
pub type HttpRequest = ::http::Request<Vec<u8>>;
/// Response type returned by transports.
pub type HttpResponse = ::http::Response<Vec<u8>>;
/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing signed provider calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared behind an
/// [`Arc`] by several coordinators, and the returned future must be `Send` so broker futures can
/// hop executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `request` and resolves to the raw response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		(**self).execute(request)
	}
}

/// Splits a response into its body (2xx) or a [`TransportError::Status`] carrying the body.
pub fn classify(response: HttpResponse) -> Result<Vec<u8>, TransportError> {
	let status = response.status();
	let body = response.into_body();

	if status.is_success() {
		Ok(body)
	} else {
		Err(TransportError::Status { status: status.as_u16(), body })
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token endpoints answer directly, so a custom client should disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(reqwest::Request::try_from(request)?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
