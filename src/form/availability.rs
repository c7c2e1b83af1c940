use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

/// The remote "is this username free?" capability.
///
/// The returned future is polled on the form's scheduler and may be dropped
/// before completion when a newer username supersedes it.
pub trait AvailabilityChecker {
	fn check_availability(&self, username: &str) -> LocalBoxFuture<'static, Result<bool, CheckError>>;
}

impl<C: AvailabilityChecker + ?Sized> AvailabilityChecker for Rc<C> {
	fn check_availability(&self, username: &str) -> LocalBoxFuture<'static, Result<bool, CheckError>> {
		(**self).check_availability(username)
	}
}

impl<C: AvailabilityChecker + ?Sized> AvailabilityChecker for Box<C> {
	fn check_availability(&self, username: &str) -> LocalBoxFuture<'static, Result<bool, CheckError>> {
		(**self).check_availability(username)
	}
}

/// Body of the availability endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
	#[serde(default)]
	pub is_available: Option<bool>,
	#[serde(default)]
	pub user_name: Option<String>,
}

impl AvailabilityResponse {
	pub fn decode(body: &[u8]) -> Result<Self, CheckError> {
		if body.iter().all(u8::is_ascii_whitespace) {
			return Err(CheckError::NoData);
		}
		Ok(serde_json::from_slice(body)?)
	}

	/// A missing or null flag counts as taken.
	pub fn is_available(&self) -> bool {
		self.is_available.unwrap_or(false)
	}
}

/// Collapse a lookup result into the boolean the form works with. Errors
/// mean "unavailable"; they are logged here and go no further.
pub fn fail_closed(username: &str, result: Result<bool, CheckError>) -> bool {
	match result {
		Ok(available) => available,
		Err(error) => {
			tracing::warn!(username, %error, "availability check failed, treating username as unavailable");
			false
		}
	}
}
