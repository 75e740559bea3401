//! Signing of ordinary API calls made on behalf of the authorized user.
//!
//! [`AuthenticatedRequestSigner`] is a detached snapshot of the coordinator's credentials and
//! access token. [`ApiRequest`] describes a call relative to the provider base URL and
//! [`AuthorizationCoordinator::execute`] signs and dispatches it.

// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ConsumerCredentials},
	crypto::HashAlgorithm,
	error::{ConfigError, TransportError},
	flows::AuthorizationCoordinator,
	http::{HttpRequest, HttpResponse, HttpTransport},
	obs::{self, FlowOutcome, FlowSpan, FlowStage},
	provider::ProviderDescriptor,
	signature::{SignatureBuilder, SigningContext, encode_pairs},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Produces `Authorization: OAuth ...` values signed with the held access token.
///
/// Query parameters of the target URL, and form fields of an
/// `application/x-www-form-urlencoded` body, are covered by the signature.
#[derive(Clone)]
pub struct AuthenticatedRequestSigner {
	credentials: ConsumerCredentials,
	access_token: Option<AccessToken>,
	algorithm: Arc<dyn HashAlgorithm>,
}
impl AuthenticatedRequestSigner {
	/// Creates a signer; without an access token every signing call fails with
	/// [`Error::NoAuthenticatedUser`].
	pub fn new(
		credentials: ConsumerCredentials,
		access_token: Option<AccessToken>,
		algorithm: Arc<dyn HashAlgorithm>,
	) -> Self {
		Self { credentials, access_token, algorithm }
	}

	/// Access token used for signing.
	pub fn access_token(&self) -> Option<&AccessToken> {
		self.access_token.as_ref()
	}

	/// Whether an access token is held.
	pub fn is_authenticated(&self) -> bool {
		self.access_token.is_some()
	}

	/// Signed `Authorization` value for a bodiless call to `url`.
	pub fn authorization_header(&self, method: &Method, url: &Url) -> Result<HeaderValue> {
		self.header_for(method, url, &[])
	}

	/// Inserts the `Authorization` header into `request`, replacing any existing one.
	pub fn sign(&self, request: &mut HttpRequest) -> Result<()> {
		let raw = request.uri().to_string();
		let url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source })?;
		let form = form_parameters(request.headers(), Some(request.body()));
		let value = self.header_for(request.method(), &url, &form)?;

		request.headers_mut().insert(AUTHORIZATION, value);

		Ok(())
	}

	pub(crate) fn header_for(
		&self,
		method: &Method,
		url: &Url,
		form: &[(String, String)],
	) -> Result<HeaderValue> {
		let access_token = self.access_token.as_ref().ok_or(Error::NoAuthenticatedUser)?;
		let context = SigningContext::new(method.clone(), url)
			.with_token(&access_token.token, access_token.secret.expose())
			.with_parameters(url.query_pairs())
			.with_parameters(form.iter().map(|(name, value)| (name.as_str(), value.as_str())));
		let signed = SignatureBuilder::new(&self.credentials, self.algorithm.as_ref()).sign(&context)?;

		Ok(signed.header_value()?)
	}
}
impl Debug for AuthenticatedRequestSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticatedRequestSigner")
			.field("consumer_key", &self.credentials.key)
			.field("access_token", &self.access_token.as_ref().map(|token| token.token.as_str()))
			.field("method", &self.algorithm.method())
			.finish()
	}
}

/// Form fields of `body` when `headers` declare a form-encoded payload.
pub(crate) fn form_parameters(headers: &HeaderMap, body: Option<&[u8]>) -> Vec<(String, String)> {
	let is_form = headers
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE));

	match body {
		Some(body) if is_form => form_urlencoded::parse(body).into_owned().collect(),
		_ => Vec::new(),
	}
}

/// One authenticated API call, relative to the provider base URL.
///
/// Defaults: `GET`, no query, no extra headers, no body, a single attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path appended to the base URL, or an absolute `http(s)` URL.
	pub path: String,
	/// Query parameters; signed along with the OAuth parameters.
	pub query: Vec<(String, String)>,
	/// Extra headers sent as-is.
	pub headers: HeaderMap,
	/// Request body.
	pub body: Option<Vec<u8>>,
	/// Maximum attempts for transient failures.
	pub retry_budget: u32,
}
impl ApiRequest {
	/// Creates a `GET` request for `path`.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			method: Method::GET,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: None,
			retry_budget: 1,
		}
	}

	/// Shorthand for [`ApiRequest::new`].
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(path)
	}

	/// Creates a `POST` request for `path`.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(path).with_method(Method::POST)
	}

	/// Overrides the method.
	pub fn with_method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// Appends one query parameter.
	pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Appends one header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.append(name, value);

		self
	}

	/// Sets a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Sets a form-encoded body; its fields are covered by the signature.
	pub fn with_form<I, K, V>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let fields =
			fields.into_iter().map(|(name, value)| (name.into(), value.into())).collect::<Vec<_>>();

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
		self.body = Some(encode_pairs(&fields).into_bytes());

		self
	}

	/// Sets the attempt budget; zero is treated as one.
	pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
		self.retry_budget = retry_budget.max(1);

		self
	}

	/// Absolute URL of the call, query included.
	pub fn url(&self, descriptor: &ProviderDescriptor) -> Result<Url, ConfigError> {
		let mut url = descriptor.resolve(&self.path)?;

		if !self.query.is_empty() {
			let encoded = encode_pairs(&self.query);
			let query = match url.query() {
				Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
				_ => encoded,
			};

			url.set_query(Some(&query));
		}

		Ok(url)
	}

	/// Unsigned transport request.
	pub fn to_http_request(&self, descriptor: &ProviderDescriptor) -> Result<HttpRequest, ConfigError> {
		let url = self.url(descriptor)?;
		let mut builder = ::http::Request::builder().method(self.method.clone()).uri(url.as_str());

		if let Some(headers) = builder.headers_mut() {
			headers.extend(self.headers.clone());
		}

		Ok(builder.body(self.body.clone().unwrap_or_default())?)
	}
}

impl<C> AuthorizationCoordinator<C>
where
	C: ?Sized + HttpTransport,
{
	/// Signs and sends `request`, returning the 2xx response.
	///
	/// Fails with [`Error::NoAuthenticatedUser`] before touching the network when no access token
	/// is held. Each attempt carries a fresh nonce and timestamp; non-2xx answers surface as
	/// [`TransportError::Status`].
	pub async fn execute(&self, request: ApiRequest) -> Result<HttpResponse> {
		const STAGE: FlowStage = FlowStage::SignedRequest;

		let signer = self.signer();

		if !signer.is_authenticated() {
			return Err(Error::NoAuthenticatedUser);
		}

		let span = FlowSpan::new(STAGE, "execute");

		obs::record_flow_outcome(STAGE, FlowOutcome::Attempt);

		let result = span.instrument(self.dispatch(&signer, &request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(STAGE, FlowOutcome::Success),
			Err(e) => {
				obs::trace_failure(STAGE, e);
				obs::record_flow_outcome(STAGE, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn dispatch(
		&self,
		signer: &AuthenticatedRequestSigner,
		request: &ApiRequest,
	) -> Result<HttpResponse> {
		let budget = request.retry_budget.max(1);
		let retry_client_errors = self.descriptor.retry.retry_client_errors;
		let mut attempt = 0;

		loop {
			attempt += 1;

			let mut http_request = request.to_http_request(&self.descriptor)?;

			signer.sign(&mut http_request)?;

			let outcome = self.http_client.execute(http_request).await.and_then(ensure_success);

			match outcome {
				Ok(response) => return Ok(response),
				Err(e) if attempt < budget && e.is_retryable(retry_client_errors) => {
					obs::trace_retry(FlowStage::SignedRequest, attempt, budget, &e);
					obs::record_flow_outcome(FlowStage::SignedRequest, FlowOutcome::Retry);
				},
				Err(e) => return Err(e.into()),
			}
		}
	}
}

fn ensure_success(response: HttpResponse) -> Result<HttpResponse, TransportError> {
	let status = response.status();

	if status.is_success() {
		Ok(response)
	} else {
		Err(TransportError::Status { status: status.as_u16(), body: response.into_body() })
	}
}
