//! OAuth 1.0a client toolkit: HMAC-SHA1 request signing, retrying token exchanges, and a
//! three-legged flow coordinator over a pluggable HTTP transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod crypto;
pub mod error;
pub mod exchange;
pub mod ext;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod signature;
pub mod signer;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and transport doubles for tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{collections::VecDeque, io};
	// self
	use crate::{
		auth::{ConsumerCredentials, ProviderId},
		error::TransportError,
		flows::AuthorizationCoordinator,
		http::{HttpRequest, HttpResponse, HttpTransport, TransportFuture},
		provider::ProviderDescriptor,
	};

	/// Coordinator type alias used by transport-double tests.
	pub type ScriptedCoordinator = AuthorizationCoordinator<ScriptedTransport>;

	/// Outcome replayed by [`ScriptedTransport`] for a single call.
	#[derive(Clone, Debug)]
	pub enum ScriptedReply {
		/// Respond with the status code and body.
		Respond(u16, &'static str),
		/// Fail before any status is received.
		ConnectionReset,
	}

	/// [`HttpTransport`] double that replays scripted replies and records every request.
	///
	/// Once the script is exhausted the final reply repeats.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		script: Mutex<VecDeque<ScriptedReply>>,
		last: Mutex<Option<ScriptedReply>>,
		requests: Mutex<Vec<HttpRequest>>,
	}
	impl ScriptedTransport {
		/// Creates a transport that replays `replies` in order.
		pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
			Self { script: Mutex::new(replies.into_iter().collect()), ..Default::default() }
		}

		/// Number of requests dispatched so far.
		pub fn calls(&self) -> usize {
			self.requests.lock().len()
		}

		/// Snapshot of the recorded requests.
		pub fn requests(&self) -> Vec<HttpRequest> {
			self.requests.lock().clone()
		}

		fn next_reply(&self) -> Option<ScriptedReply> {
			let next = self.script.lock().pop_front();

			match next {
				Some(reply) => {
					*self.last.lock() = Some(reply.clone());

					Some(reply)
				},
				None => self.last.lock().clone(),
			}
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			self.requests.lock().push(request);

			let reply = self.next_reply();

			Box::pin(async move {
				match reply {
					Some(ScriptedReply::Respond(status, body)) => {
						let mut response = HttpResponse::new(body.as_bytes().to_vec());

						*response.status_mut() = StatusCode::from_u16(status)
							.expect("Scripted status codes must be valid.");

						Ok(response)
					},
					Some(ScriptedReply::ConnectionReset) | None => Err(TransportError::Io(
						io::Error::new(io::ErrorKind::ConnectionReset, "scripted connection reset"),
					)),
				}
			})
		}
	}

	/// Descriptor pointing at `https://api.example.com` with the conventional OAuth 1.0a paths.
	pub fn test_descriptor() -> ProviderDescriptor {
		let base = Url::parse("https://api.example.com").expect("Test base URL should parse.");

		ProviderDescriptor::builder(
			ProviderId::new("example").expect("Test provider identifier should be valid."),
			base,
		)
		.request_token_path("/oauth/request_token")
		.authorize_path("/oauth/authorize")
		.access_token_path("/oauth/access_token")
		.callback("app://oauth-callback")
		.build()
		.expect("Test descriptor should build.")
	}

	/// Consumer credentials used across tests.
	pub fn test_credentials() -> ConsumerCredentials {
		ConsumerCredentials::new("CK", "CS").expect("Test consumer key should be valid.")
	}

	/// Builds a coordinator over a [`ScriptedTransport`] that replays `replies`.
	pub fn build_scripted_coordinator(
		replies: impl IntoIterator<Item = ScriptedReply>,
	) -> (ScriptedCoordinator, Arc<ScriptedTransport>) {
		let transport = Arc::new(ScriptedTransport::new(replies));
		let coordinator = AuthorizationCoordinator::with_http_client(
			test_descriptor(),
			test_credentials(),
			transport.clone(),
		);

		(coordinator, transport)
	}
}

mod _prelude {
	pub use std::{
		borrow::Cow,
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use ::http::{Method, StatusCode};
	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
