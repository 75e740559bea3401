//! Three-legged flow orchestration.
//!
//! [`AuthorizationCoordinator`] owns the consumer credentials, the provider descriptor, the HTTP
//! transport, and the session token pair. [`AuthorizationCoordinator::authorize`] drives the pure
//! machine in [`transition`] (request token, user consent, access token) one effect at a time. Steps
//! run strictly in sequence and a coordinator runs at most one flow at a time.

mod state;
mod user;

pub use state::*;
pub use user::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ConsumerCredentials, RequestToken},
	crypto::{HashAlgorithm, HmacSha1Algorithm},
	exchange::TokenExchangeClient,
	http::HttpTransport,
	obs::{self, FlowOutcome, FlowSpan, FlowStage},
	provider::ProviderDescriptor,
	signer::AuthenticatedRequestSigner,
	store::{AccessTokenStore, StoreKey},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Coordinator specialized for the crate's default reqwest transport.
pub type ReqwestCoordinator = AuthorizationCoordinator<ReqwestHttpClient>;

#[derive(Debug, Default)]
struct Session {
	access_token: Option<AccessToken>,
	user: Option<String>,
}

/// Runs the OAuth 1.0a three-legged flow against one provider and signs calls afterwards.
///
/// The flow state and the session live behind `parking_lot` locks that are never held across an
/// `.await`. An `async_lock` guard rejects a second concurrent flow with
/// [`Error::FlowInProgress`].
pub struct AuthorizationCoordinator<C>
where
	C: ?Sized + HttpTransport,
{
	/// Transport used for every provider call.
	pub http_client: Arc<C>,
	/// Provider endpoints, callback, and retry policy.
	pub descriptor: ProviderDescriptor,
	pub(crate) credentials: ConsumerCredentials,
	pub(crate) hash_algorithm: Arc<dyn HashAlgorithm>,
	store: Option<Arc<dyn AccessTokenStore>>,
	status: Mutex<FlowStatus>,
	session: RwLock<Session>,
	flow_guard: AsyncMutex<()>,
}
impl<C> AuthorizationCoordinator<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a coordinator that reuses the caller-provided transport.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		credentials: ConsumerCredentials,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			descriptor,
			credentials,
			hash_algorithm: Arc::new(HmacSha1Algorithm),
			store: None,
			status: Mutex::new(FlowStatus::Idle),
			session: RwLock::new(Session::default()),
			flow_guard: AsyncMutex::new(()),
		}
	}

	/// Replaces the signature algorithm (HMAC-SHA1 by default).
	pub fn with_hash_algorithm(mut self, algorithm: impl 'static + HashAlgorithm) -> Self {
		self.hash_algorithm = Arc::new(algorithm);

		self
	}

	/// Starts in the authorized state with a previously obtained access token.
	pub fn with_access_token(self, access_token: AccessToken) -> Self {
		self.set_access_token(access_token);

		self
	}

	/// Attaches a store that successful flows persist into.
	pub fn with_store(mut self, store: Arc<dyn AccessTokenStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Consumer credentials.
	pub fn credentials(&self) -> &ConsumerCredentials {
		&self.credentials
	}

	/// Current flow status.
	pub fn state(&self) -> FlowStatus {
		*self.status.lock()
	}

	/// Held access token, if any.
	pub fn access_token(&self) -> Option<AccessToken> {
		self.session.read().access_token.clone()
	}

	/// Whether an access token is held.
	pub fn is_authorized(&self) -> bool {
		self.session.read().access_token.is_some()
	}

	/// Installs an access token obtained elsewhere, skipping the flow.
	pub fn set_access_token(&self, access_token: AccessToken) {
		self.session.write().access_token = Some(access_token);
		*self.status.lock() = FlowStatus::Authorized;
	}

	/// Records the identity of the signed-in user (for example a screen name).
	pub fn set_authenticated_user(&self, user: impl Into<String>) {
		self.session.write().user = Some(user.into());
	}

	/// Identity recorded with [`set_authenticated_user`](Self::set_authenticated_user).
	pub fn authenticated_user(&self) -> Result<String> {
		self.session.read().user.clone().ok_or(Error::NoAuthenticatedUser)
	}

	/// Key under which this coordinator's token is stored.
	pub fn store_key(&self) -> StoreKey {
		StoreKey::new(&self.descriptor.id, &self.credentials.key)
	}

	/// Loads a stored access token into the session, if the store has one.
	pub async fn restore_access_token(&self) -> Result<Option<AccessToken>> {
		let Some(store) = self.store.as_ref() else {
			return Ok(None);
		};
		let key = self.store_key();
		let restored = store.fetch(&key).await?;

		if let Some(access_token) = restored.as_ref() {
			self.set_access_token(access_token.clone());
		}

		Ok(restored)
	}

	/// Forgets the session (and the stored token) and returns to `Idle`.
	pub async fn sign_out(&self) -> Result<()> {
		self.clear_session();

		*self.status.lock() = FlowStatus::Idle;

		if let Some(store) = self.store.as_ref() {
			let key = self.store_key();

			store.remove(&key).await?;
		}

		Ok(())
	}

	/// Signer over the current session. Signing fails with [`Error::NoAuthenticatedUser`] when no
	/// access token is held.
	pub fn signer(&self) -> AuthenticatedRequestSigner {
		AuthenticatedRequestSigner::new(
			self.credentials.clone(),
			self.access_token(),
			self.hash_algorithm.clone(),
		)
	}

	/// Exchange client borrowing this coordinator's configuration.
	pub fn exchange_client(&self) -> TokenExchangeClient<'_, C> {
		TokenExchangeClient::new(
			self.http_client.as_ref(),
			&self.descriptor,
			&self.credentials,
			self.hash_algorithm.as_ref(),
		)
	}

	/// Runs the full flow and installs the resulting access token.
	///
	/// Starting a flow discards the current session, so a failed re-authorization leaves the
	/// coordinator unauthorized rather than signing with the previous token. Dropping the returned future cancels the flow: the state becomes `Failed` at the stage that
	/// was running and the request token is discarded. When a store is attached the token is
	/// persisted; a store failure is reported even though the session is already authorized.
	pub async fn authorize(&self, authorizer: &dyn UserAuthorizer) -> Result<AccessToken> {
		let _flow = self.flow_guard.try_lock().ok_or(Error::FlowInProgress)?;

		self.clear_session();

		let status = StatusGuard(&self.status);
		let client = self.exchange_client();
		let mut state = FlowState::resting(self.state());
		let mut event = FlowEvent::Start;

		loop {
			let (next, effect) = transition(state, event)?;

			state = next;
			status.set(state.status());
			event = match effect {
				FlowEffect::RequestToken => match client.request_token().await {
					Ok(request_token) => FlowEvent::RequestTokenIssued(request_token),
					Err(e) => FlowEvent::Failed(e),
				},
				FlowEffect::AuthorizeUser => {
					let outcome = match state.request_token() {
						Some(request_token) =>
							self.authorize_user(&client, request_token, authorizer).await,
						None => Err(Error::UnexpectedFlowEvent {
							state: state.status().as_str(),
							event: "authorize_user",
						}),
					};

					match outcome {
						Ok(authorization) => FlowEvent::UserAuthorized(authorization),
						Err(e) => FlowEvent::Failed(e),
					}
				},
				FlowEffect::ExchangeAccessToken { request_token, verifier } =>
					match client.access_token(request_token, &verifier).await {
						Ok(access_token) => FlowEvent::AccessTokenIssued(access_token),
						Err(e) => FlowEvent::Failed(e),
					},
				FlowEffect::Complete(access_token) => {
					self.set_access_token(access_token.clone());

					if let Some(store) = self.store.as_ref() {
						let key = self.store_key();

						store.save(&key, access_token.clone()).await?;
					}

					return Ok(access_token);
				},
				FlowEffect::Fail(e) => return Err(e),
			};
		}
	}

	fn clear_session(&self) {
		let mut session = self.session.write();

		session.access_token = None;
		session.user = None;
	}

	async fn authorize_user(
		&self,
		client: &TokenExchangeClient<'_, C>,
		request_token: &RequestToken,
		authorizer: &dyn UserAuthorizer,
	) -> Result<UserAuthorization> {
		const STAGE: FlowStage = FlowStage::UserAuthorization;

		let span = FlowSpan::new(STAGE, "authorize_user");

		obs::record_flow_outcome(STAGE, FlowOutcome::Attempt);

		let result: Result<UserAuthorization> = span
			.instrument(async move {
				let url = client.authorize_url(request_token)?;

				Ok(authorizer.authorize(url, self.descriptor.callback_or_oob()).await?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(STAGE, FlowOutcome::Success),
			Err(e) => {
				obs::trace_failure(STAGE, e);
				obs::record_flow_outcome(STAGE, FlowOutcome::Failure);
			},
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl AuthorizationCoordinator<ReqwestHttpClient> {
	/// Creates a coordinator with its own reqwest-backed transport.
	pub fn new(descriptor: ProviderDescriptor, credentials: ConsumerCredentials) -> Self {
		Self::with_http_client(descriptor, credentials, ReqwestHttpClient::default())
	}
}
impl<C> Debug for AuthorizationCoordinator<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCoordinator")
			.field("descriptor", &self.descriptor)
			.field("consumer_key", &self.credentials.key)
			.field("signature_method", &self.hash_algorithm.method())
			.field("state", &self.state())
			.field("authorized", &self.is_authorized())
			.field("store_set", &self.store.is_some())
			.finish()
	}
}

/// Mirrors flow states into the coordinator and marks an abandoned flow as failed.
struct StatusGuard<'a>(&'a Mutex<FlowStatus>);
impl StatusGuard<'_> {
	fn set(&self, status: FlowStatus) {
		*self.0.lock() = status;
	}
}
impl Drop for StatusGuard<'_> {
	fn drop(&mut self) {
		let mut status = self.0.lock();

		if let Some(stage) = status.in_flight_stage() {
			*status = FlowStatus::Failed(stage);
		}
	}
}
