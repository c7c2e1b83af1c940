use std::thread;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use reqwest::blocking::Client;
use reqwest::Url;

use crate::error::CheckError;
use crate::form::availability::{AvailabilityChecker, AvailabilityResponse};

/// Checks availability with `GET <endpoint>?userName=<name>`.
///
/// Each request runs on its own worker thread with the blocking client; the
/// answer travels back over a oneshot channel and is picked up by the
/// scheduler that polls the returned future. Dropping the future abandons
/// the answer, though the worker still finishes its request.
#[derive(Debug, Clone)]
pub struct HttpAvailabilityChecker {
	endpoint: Url,
	client: Client,
}

impl HttpAvailabilityChecker {
	pub fn new(endpoint: &str) -> Result<Self, CheckError> {
		let endpoint = Url::parse(endpoint).map_err(|error| CheckError::InvalidRequest(error.to_string()))?;
		if endpoint.cannot_be_a_base() {
			return Err(CheckError::InvalidRequest(format!("{endpoint} cannot carry a query")));
		}
		let client = Client::builder()
			.build()
			.map_err(|error| CheckError::Transport(error.to_string()))?;
		Ok(HttpAvailabilityChecker { endpoint, client })
	}

	pub fn request_url(&self, username: &str) -> Url {
		let mut url = self.endpoint.clone();
		url.query_pairs_mut().append_pair("userName", username);
		url
	}

	fn fetch(client: &Client, url: Url) -> Result<bool, CheckError> {
		let response = client
			.get(url)
			.send()
			.map_err(|error| CheckError::Transport(error.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(CheckError::Server {
				status: status.as_u16(),
			});
		}

		let body = response
			.bytes()
			.map_err(|error| CheckError::Transport(error.to_string()))?;
		Ok(AvailabilityResponse::decode(&body)?.is_available())
	}
}

impl AvailabilityChecker for HttpAvailabilityChecker {
	fn check_availability(&self, username: &str) -> LocalBoxFuture<'static, Result<bool, CheckError>> {
		let url = self.request_url(username);
		let client = self.client.clone();
		let (sender, receiver) = oneshot::channel();

		tracing::debug!(%url, "requesting availability");
		thread::spawn(move || {
			// The receiver is gone when the request was superseded.
			let _ = sender.send(Self::fetch(&client, url));
		});

		receiver
			.map(|answer| {
				answer.unwrap_or_else(|_| Err(CheckError::Transport("worker thread vanished".to_owned())))
			})
			.boxed_local()
	}
}
