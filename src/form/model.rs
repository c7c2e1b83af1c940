use std::borrow::Cow;
use std::fmt::Debug;
use std::rc::Rc;

use enclose::enclose;
use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::config::FormConfig;
use crate::form::availability::{fail_closed, AvailabilityChecker};
use crate::form::rules::{text_len, PasswordRequirement, PasswordRule, RuleResults};
use crate::{batch, CombineLatest, Scheduler, Signal, Subscriptions, Var};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
	TooShort,
	Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernameValidity {
	Valid,
	Invalid(InvalidReason),
}

impl UsernameValidity {
	fn from_flags(long_enough: bool, available: bool) -> Self {
		if !long_enough {
			UsernameValidity::Invalid(InvalidReason::TooShort)
		} else if !available {
			UsernameValidity::Invalid(InvalidReason::Unavailable)
		} else {
			UsernameValidity::Valid
		}
	}

	pub fn is_valid(&self) -> bool {
		matches!(self, UsernameValidity::Valid)
	}

	pub fn message<'a>(&self, config: &'a FormConfig) -> Cow<'a, str> {
		match self {
			UsernameValidity::Invalid(InvalidReason::TooShort) => config.username_too_short(),
			UsernameValidity::Invalid(InvalidReason::Unavailable) => {
				Cow::Borrowed(&config.messages.username_unavailable)
			}
			UsernameValidity::Valid => Cow::Borrowed(&config.messages.username_available),
		}
	}
}

/// Everything the form shows, read at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
	pub username_message: String,
	pub password_message: String,
	pub requirements: Vec<PasswordRequirement>,
	pub is_valid: bool,
}

/// Sign-up form validation.
///
/// Inputs are plain [`Var`]s; outputs are signals derived from them:
///
/// ```text
/// username ─┬─ map(len >= min) ───────────────────────────┐
///           └─ debounce ─ remove_duplicates ─ flat_map_latest(check) ─ share ─┴─ validity ─ message
/// password ─┬─ map(is_empty) ──────────────┬─ password message
///           ├─ combine(confirmation) ─ eq ─┤
///           └─ five rules ─ combine ───────┴─ password valid ─┐
/// validity ───────────────────────────────────────────────────┴─ is_valid
/// ```
///
/// Outputs before the first availability answer are empty: the username
/// message and `is_valid` start producing once the debounced check for the
/// initial username resolves.
pub struct FormValidationModel {
	config: Rc<FormConfig>,
	username: Var<String>,
	password: Var<String>,
	password_confirmation: Var<String>,
	username_available: Signal<bool>,
	username_validity: Signal<UsernameValidity>,
	username_message: Signal<String>,
	password_valid: Signal<bool>,
	password_message: Signal<String>,
	requirements: Var<Vec<PasswordRequirement>>,
	is_valid: Signal<bool>,
	_reactions: Subscriptions<1>,
}

impl FormValidationModel {
	pub fn new(checker: impl AvailabilityChecker + 'static, scheduler: &Scheduler) -> Self {
		Self::with_config(checker, scheduler, FormConfig::default())
	}

	pub fn with_config(
		checker: impl AvailabilityChecker + 'static,
		scheduler: &Scheduler,
		config: FormConfig,
	) -> Self {
		let config = Rc::new(config);
		let checker: Rc<dyn AvailabilityChecker> = Rc::new(checker);

		let username = Var::named("username", String::new());
		let password = Var::named("password", String::new());
		let password_confirmation = Var::named("password_confirmation", String::new());

		let username_long_enough = username
			.signal()
			.map(enclose!((config) move |name: &String| text_len(name) >= config.min_username_len));

		let username_available = username
			.signal()
			.debounce(scheduler, config.debounce())
			.remove_duplicates()
			.flat_map_latest(
				scheduler,
				enclose!((config, checker) move |name: &String| lookup(&*checker, &config, name)),
			)
			.share();

		let username_validity = (&username_long_enough, &username_available)
			.combine_latest()
			.map(|&(long_enough, available)| UsernameValidity::from_flags(long_enough, available))
			.share();

		let username_message = username_validity.map(enclose!((config) move |validity: &UsernameValidity| {
			validity.message(&config).into_owned()
		}));

		let password_empty = password.signal().map(|text: &String| text.is_empty());
		let passwords_match = (&password.signal(), &password_confirmation.signal())
			.combine_latest()
			.map(|(password, confirmation)| password == confirmation);
		let rules = rule_results(&password.signal(), &config);

		let password_valid = (&password_empty, &passwords_match, &rules)
			.combine_latest()
			.map(|&(empty, matching, rules)| !empty && matching && rules.all());

		let password_message = (&password_empty, &passwords_match).combine_latest().map(
			enclose!((config) move |&(empty, matching): &(bool, bool)| {
				let messages = &config.messages;
				if empty {
					messages.password_empty.clone()
				} else if !matching {
					messages.password_mismatch.clone()
				} else {
					String::new()
				}
			}),
		);

		let is_valid = (&username_validity, &password_valid)
			.combine_latest()
			.map(|&(username, password)| username.is_valid() && password);

		let requirements = Var::named("requirements", PasswordRequirement::initial(&config));
		let mut reactions = Subscriptions::new();
		reactions.add(rules.subscribe(enclose!((requirements) move |results: &RuleResults| {
			requirements.update(|list| {
				for requirement in list.iter_mut() {
					requirement.passed = results.passed(requirement.rule);
				}
			});
		})));

		FormValidationModel {
			config,
			username,
			password,
			password_confirmation,
			username_available,
			username_validity,
			username_message,
			password_valid,
			password_message,
			requirements,
			is_valid,
			_reactions: reactions,
		}
	}

	pub fn config(&self) -> &FormConfig {
		&self.config
	}

	pub fn username(&self) -> &Var<String> {
		&self.username
	}

	pub fn password(&self) -> &Var<String> {
		&self.password
	}

	pub fn password_confirmation(&self) -> &Var<String> {
		&self.password_confirmation
	}

	pub fn set_username(&self, value: impl Into<String>) {
		self.username.set(value.into());
	}

	pub fn set_password(&self, value: impl Into<String>) {
		self.password.set(value.into());
	}

	pub fn set_password_confirmation(&self, value: impl Into<String>) {
		self.password_confirmation.set(value.into());
	}

	/// Write all three inputs in a single propagation pass.
	pub fn set_inputs(&self, username: &str, password: &str, confirmation: &str) {
		batch(|| {
			self.set_username(username);
			self.set_password(password);
			self.set_password_confirmation(confirmation);
		});
	}

	pub fn username_available(&self) -> &Signal<bool> {
		&self.username_available
	}

	pub fn username_validity(&self) -> &Signal<UsernameValidity> {
		&self.username_validity
	}

	pub fn username_message(&self) -> &Signal<String> {
		&self.username_message
	}

	pub fn is_password_valid(&self) -> &Signal<bool> {
		&self.password_valid
	}

	pub fn password_message(&self) -> &Signal<String> {
		&self.password_message
	}

	pub fn requirements(&self) -> Signal<Vec<PasswordRequirement>> {
		self.requirements.signal()
	}

	pub fn is_valid(&self) -> &Signal<bool> {
		&self.is_valid
	}

	pub fn state(&self) -> FormState {
		FormState {
			username_message: self.username_message.latest().unwrap_or_default(),
			password_message: self.password_message.latest().unwrap_or_default(),
			requirements: self.requirements.signal().latest().unwrap_or_default(),
			is_valid: self.is_valid.latest().unwrap_or(false),
		}
	}
}

impl Debug for FormValidationModel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FormValidationModel")
			.field("username", &self.username)
			.field("state", &self.state())
			.finish()
	}
}

/// The five rules, each its own signal over the password text, merged back
/// into one result in declaration order.
fn rule_results(password: &Signal<String>, config: &Rc<FormConfig>) -> Signal<RuleResults> {
	let [length, upper, lower, digit, special] = PasswordRule::ALL.map(|rule| {
		let config = config.clone();
		password.map(move |text: &String| rule.check(text, &config))
	});

	(&length, &upper, &lower, &digit, &special)
		.combine_latest()
		.map(|&(length, upper, lower, digit, special)| {
			RuleResults::from_flags([length, upper, lower, digit, special])
		})
}

fn lookup(checker: &dyn AvailabilityChecker, config: &FormConfig, username: &str) -> LocalBoxFuture<'static, bool> {
	if text_len(username) < config.min_username_len {
		tracing::debug!(username, "username too short, skipping availability check");
		return future::ready(false).boxed_local();
	}

	tracing::debug!(username, "checking availability");
	let username = username.to_owned();
	checker
		.check_availability(&username)
		.map(move |result| fail_closed(&username, result))
		.boxed_local()
}
