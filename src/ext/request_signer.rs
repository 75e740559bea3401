//! Request signing contracts that let downstream crates sign arbitrary HTTP requests with the
//! broker's access token.

// crates.io
#[cfg(feature = "reqwest")] use ::http::header::AUTHORIZATION;
// self
use crate::{_prelude::*, http::HttpRequest, signer::AuthenticatedRequestSigner};
#[cfg(feature = "reqwest")] use crate::signer;

/// Signs a request in place of the caller without constraining its HTTP client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the request and returns it with an `Authorization: OAuth ...` header attached.
	fn sign_request(&self, request: Request) -> Result<Request, Error>;
}
impl RequestSignerExt<HttpRequest, Error> for AuthenticatedRequestSigner {
	fn sign_request(&self, mut request: HttpRequest) -> Result<HttpRequest> {
		self.sign(&mut request)?;

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::Request, Error> for AuthenticatedRequestSigner {
	fn sign_request(&self, mut request: reqwest::Request) -> Result<reqwest::Request> {
		let form = signer::form_parameters(
			request.headers(),
			request.body().and_then(reqwest::Body::as_bytes),
		);
		let value = self.header_for(request.method(), request.url(), &form)?;

		request.headers_mut().insert(AUTHORIZATION, value);

		Ok(request)
	}
}
