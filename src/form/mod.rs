//! Sign-up form wiring: password rules, the availability collaborator and
//! the model that ties them to the observable graph.

mod availability;
#[cfg(feature = "http")]
mod http;
mod model;
mod rules;

pub use availability::{fail_closed, AvailabilityChecker, AvailabilityResponse};
#[cfg(feature = "http")]
pub use http::HttpAvailabilityChecker;
pub use model::{FormState, FormValidationModel, InvalidReason, UsernameValidity};
pub use rules::{is_decimal_digit, text_len, PasswordRequirement, PasswordRule, RuleResults};
