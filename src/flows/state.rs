//! Pure state machine of the three-legged flow.
//!
//! [`transition`] maps `(state, event)` to `(next state, effect)` without touching the network.
//! The coordinator performs the effect, feeds the outcome back as the next event, and mirrors
//! each state into a [`FlowStatus`] snapshot that callers can observe.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, RequestToken},
	error::AuthorizationError,
	flows::UserAuthorization,
	obs::FlowStage,
};

/// Owning flow state. Intermediate credentials live here and nowhere else.
#[derive(Debug, PartialEq, Eq)]
pub enum FlowState {
	/// No flow has run yet, or the session was signed out.
	Idle,
	/// Waiting for the request-token exchange.
	RequestingToken,
	/// Waiting for the user-authorization capability.
	AwaitingUserAuthorization {
		/// Request token issued by the provider.
		request_token: RequestToken,
	},
	/// Waiting for the access-token exchange, which owns the request token now.
	ExchangingAccessToken,
	/// An access token was obtained.
	Authorized,
	/// A stage failed; the flow may be restarted.
	Failed {
		/// Stage that failed.
		stage: FlowStage,
	},
}
impl FlowState {
	/// Observable snapshot.
	pub fn status(&self) -> FlowStatus {
		match self {
			Self::Idle => FlowStatus::Idle,
			Self::RequestingToken => FlowStatus::RequestingToken,
			Self::AwaitingUserAuthorization { .. } => FlowStatus::AwaitingUserAuthorization,
			Self::ExchangingAccessToken => FlowStatus::ExchangingAccessToken,
			Self::Authorized => FlowStatus::Authorized,
			Self::Failed { stage } => FlowStatus::Failed(*stage),
		}
	}

	/// Request token held while the user authorizes.
	pub fn request_token(&self) -> Option<&RequestToken> {
		match self {
			Self::AwaitingUserAuthorization { request_token } => Some(request_token),
			_ => None,
		}
	}

	/// State a new flow starts from, given the last observed status.
	pub fn resting(status: FlowStatus) -> Self {
		match status {
			FlowStatus::Authorized => Self::Authorized,
			FlowStatus::Failed(stage) => Self::Failed { stage },
			_ => Self::Idle,
		}
	}
}

/// Copyable label of a [`FlowState`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
	/// See [`FlowState::Idle`].
	#[default]
	Idle,
	/// See [`FlowState::RequestingToken`].
	RequestingToken,
	/// See [`FlowState::AwaitingUserAuthorization`].
	AwaitingUserAuthorization,
	/// See [`FlowState::ExchangingAccessToken`].
	ExchangingAccessToken,
	/// See [`FlowState::Authorized`].
	Authorized,
	/// See [`FlowState::Failed`].
	Failed(FlowStage),
}
impl FlowStatus {
	/// Stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::RequestingToken => "requesting_token",
			Self::AwaitingUserAuthorization => "awaiting_user_authorization",
			Self::ExchangingAccessToken => "exchanging_access_token",
			Self::Authorized => "authorized",
			Self::Failed(_) => "failed",
		}
	}

	/// Stage currently running, when a flow is in flight.
	pub const fn in_flight_stage(self) -> Option<FlowStage> {
		match self {
			Self::RequestingToken => Some(FlowStage::RequestToken),
			Self::AwaitingUserAuthorization => Some(FlowStage::UserAuthorization),
			Self::ExchangingAccessToken => Some(FlowStage::AccessToken),
			_ => None,
		}
	}
}
impl Display for FlowStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Failed(stage) => write!(f, "failed({stage})"),
			status => f.write_str(status.as_str()),
		}
	}
}

/// Outcome fed back into the machine.
#[derive(Debug)]
pub enum FlowEvent {
	/// The caller asked for a new flow.
	Start,
	/// The request-token exchange succeeded.
	RequestTokenIssued(RequestToken),
	/// The user-authorization capability reported a token and verifier.
	UserAuthorized(UserAuthorization),
	/// The access-token exchange succeeded.
	AccessTokenIssued(AccessToken),
	/// The running stage failed.
	Failed(Error),
}
impl FlowEvent {
	/// Stable label.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::Start => "start",
			Self::RequestTokenIssued(_) => "request_token_issued",
			Self::UserAuthorized(_) => "user_authorized",
			Self::AccessTokenIssued(_) => "access_token_issued",
			Self::Failed(_) => "failed",
		}
	}
}

/// Work the coordinator performs after a transition.
#[derive(Debug)]
pub enum FlowEffect {
	/// Run the request-token exchange.
	RequestToken,
	/// Build the authorize URL from the held request token and hand it to the user.
	AuthorizeUser,
	/// Run the access-token exchange, consuming the request token.
	ExchangeAccessToken {
		/// Authorized request token.
		request_token: RequestToken,
		/// Verifier returned with it.
		verifier: String,
	},
	/// Install the access token and report success.
	Complete(AccessToken),
	/// Report the failure.
	Fail(Error),
}

/// Advances the flow. Unexpected events yield [`Error::UnexpectedFlowEvent`].
///
/// A returned token that differs from the issued request token moves straight to
/// `Failed(UserAuthorization)` without exchanging anything.
pub fn transition(state: FlowState, event: FlowEvent) -> Result<(FlowState, FlowEffect)> {
	use FlowState as S;

	match (state, event) {
		(S::Idle | S::Authorized | S::Failed { .. }, FlowEvent::Start) =>
			Ok((S::RequestingToken, FlowEffect::RequestToken)),
		(S::RequestingToken, FlowEvent::RequestTokenIssued(request_token)) =>
			Ok((S::AwaitingUserAuthorization { request_token }, FlowEffect::AuthorizeUser)),
		(S::AwaitingUserAuthorization { request_token }, FlowEvent::UserAuthorized(authorization)) => {
			if authorization.token == request_token.token {
				Ok((
					S::ExchangingAccessToken,
					FlowEffect::ExchangeAccessToken {
						request_token,
						verifier: authorization.verifier,
					},
				))
			} else {
				let error = AuthorizationError::TokenMismatch {
					expected: request_token.token,
					returned: authorization.token,
				};

				Ok((S::Failed { stage: FlowStage::UserAuthorization }, FlowEffect::Fail(error.into())))
			}
		},
		(S::ExchangingAccessToken, FlowEvent::AccessTokenIssued(access_token)) =>
			Ok((S::Authorized, FlowEffect::Complete(access_token))),
		(S::RequestingToken, FlowEvent::Failed(error)) =>
			Ok((S::Failed { stage: FlowStage::RequestToken }, FlowEffect::Fail(error))),
		(S::AwaitingUserAuthorization { .. }, FlowEvent::Failed(error)) =>
			Ok((S::Failed { stage: FlowStage::UserAuthorization }, FlowEffect::Fail(error))),
		(S::ExchangingAccessToken, FlowEvent::Failed(error)) =>
			Ok((S::Failed { stage: FlowStage::AccessToken }, FlowEffect::Fail(error))),
		(state, event) =>
			Err(Error::UnexpectedFlowEvent { state: state.status().as_str(), event: event.as_str() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{ExchangeError, ResponseError};

	fn step(state: FlowState, event: FlowEvent) -> (FlowState, FlowEffect) {
		transition(state, event).expect("Transition should be valid.")
	}

	#[test]
	fn happy_path_walks_every_state() {
		let (state, effect) = step(FlowState::Idle, FlowEvent::Start);

		assert_eq!(state, FlowState::RequestingToken);
		assert!(matches!(effect, FlowEffect::RequestToken));

		let (state, effect) =
			step(state, FlowEvent::RequestTokenIssued(RequestToken::new("T", "S")));

		assert_eq!(state.status(), FlowStatus::AwaitingUserAuthorization);
		assert_eq!(state.request_token().map(|t| t.token.as_str()), Some("T"));
		assert!(matches!(effect, FlowEffect::AuthorizeUser));

		let (state, effect) =
			step(state, FlowEvent::UserAuthorized(UserAuthorization::new("T", "V")));

		assert_eq!(state, FlowState::ExchangingAccessToken);
		assert!(state.request_token().is_none());

		let FlowEffect::ExchangeAccessToken { request_token, verifier } = effect else {
			panic!("Expected an access-token exchange, got {effect:?}.");
		};

		assert_eq!(request_token.token, "T");
		assert_eq!(request_token.secret.expose(), "S");
		assert_eq!(verifier, "V");

		let (state, effect) =
			step(state, FlowEvent::AccessTokenIssued(AccessToken::new("AT", "ATS")));

		assert_eq!(state, FlowState::Authorized);
		assert!(matches!(effect, FlowEffect::Complete(token) if token.token == "AT"));
	}

	#[test]
	fn token_mismatch_fails_without_exchanging() {
		let state = FlowState::AwaitingUserAuthorization { request_token: RequestToken::new("T", "S") };
		let (state, effect) = step(state, FlowEvent::UserAuthorized(UserAuthorization::new("X", "V")));

		assert_eq!(state, FlowState::Failed { stage: FlowStage::UserAuthorization });
		assert!(matches!(
			effect,
			FlowEffect::Fail(Error::Authorization(AuthorizationError::TokenMismatch { ref expected, ref returned }))
				if expected == "T" && returned == "X"
		));
	}

	#[test]
	fn failures_are_attributed_to_the_running_stage() {
		let malformed = || {
			FlowEvent::Failed(Error::RequestToken(ExchangeError::MalformedResponse(
				ResponseError::CallbackNotConfirmed,
			)))
		};
		let cases = [
			(FlowState::RequestingToken, FlowStage::RequestToken),
			(
				FlowState::AwaitingUserAuthorization { request_token: RequestToken::new("T", "S") },
				FlowStage::UserAuthorization,
			),
			(FlowState::ExchangingAccessToken, FlowStage::AccessToken),
		];

		for (state, stage) in cases {
			let (next, effect) = step(state, malformed());

			assert_eq!(next.status(), FlowStatus::Failed(stage));
			assert!(matches!(effect, FlowEffect::Fail(Error::RequestToken(_))));
		}
	}

	#[test]
	fn flows_restart_from_resting_states() {
		for state in [
			FlowState::Idle,
			FlowState::Authorized,
			FlowState::Failed { stage: FlowStage::AccessToken },
		] {
			let (next, _) = step(state, FlowEvent::Start);

			assert_eq!(next, FlowState::RequestingToken);
		}
	}

	#[test]
	fn unexpected_events_are_rejected() {
		let err = transition(FlowState::RequestingToken, FlowEvent::Start)
			.expect_err("Start while running must be rejected.");

		assert!(matches!(
			err,
			Error::UnexpectedFlowEvent { state: "requesting_token", event: "start" }
		));
		assert!(
			transition(FlowState::Idle, FlowEvent::AccessTokenIssued(AccessToken::new("AT", "ATS")))
				.is_err()
		);
	}

	#[test]
	fn statuses_report_in_flight_stages() {
		assert_eq!(FlowStatus::AwaitingUserAuthorization.in_flight_stage(), Some(FlowStage::UserAuthorization));
		assert_eq!(FlowStatus::Authorized.in_flight_stage(), None);
		assert_eq!(FlowStatus::Failed(FlowStage::RequestToken).to_string(), "failed(request_token)");
		assert_eq!(FlowState::resting(FlowStatus::RequestingToken), FlowState::Idle);
	}
}
