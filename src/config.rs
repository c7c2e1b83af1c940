use std::borrow::Cow;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Tunables of the form. Every field has a default, so a JSON document only
/// needs the keys it wants to override.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormConfig {
	/// Quiet period before a username is sent for an availability check.
	pub debounce_ms: u64,
	pub min_username_len: usize,
	pub min_password_len: usize,
	pub special_chars: String,
	pub messages: Messages,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Messages {
	/// Derived from `min_username_len` when not set.
	pub username_too_short: Option<String>,
	pub username_unavailable: String,
	pub username_available: String,
	pub password_empty: String,
	pub password_mismatch: String,
}

impl Default for FormConfig {
	fn default() -> Self {
		FormConfig {
			debounce_ms: 400,
			min_username_len: 3,
			min_password_len: 8,
			special_chars: "!#$%&*".to_owned(),
			messages: Messages::default(),
		}
	}
}

impl Default for Messages {
	fn default() -> Self {
		Messages {
			username_too_short: None,
			username_unavailable: "Username not available, try different one".to_owned(),
			username_available: String::new(),
			password_empty: "Password must not be empty".to_owned(),
			password_mismatch: "Passwords do not match".to_owned(),
		}
	}
}

impl FormConfig {
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: FormConfig = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.min_username_len == 0 {
			return Err(ConfigError::NotPositive {
				field: "min_username_len",
			});
		}
		if self.min_password_len == 0 {
			return Err(ConfigError::NotPositive {
				field: "min_password_len",
			});
		}
		if self.special_chars.is_empty() {
			return Err(ConfigError::NoSpecialChars);
		}
		Ok(())
	}

	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}

	pub fn username_too_short(&self) -> Cow<'_, str> {
		match &self.messages.username_too_short {
			Some(message) => Cow::Borrowed(message),
			None => Cow::Owned(format!(
				"Username must be at least {} characters!",
				in_words(self.min_username_len)
			)),
		}
	}
}

fn in_words(count: usize) -> Cow<'static, str> {
	const WORDS: [&str; 10] = [
		"one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
	];
	match count.checked_sub(1).and_then(|index| WORDS.get(index)) {
		Some(word) => Cow::Borrowed(*word),
		None => Cow::Owned(count.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_document_gives_defaults() {
		let config = FormConfig::from_json("{}").unwrap();
		assert_eq!(config, FormConfig::default());
		assert_eq!(config.debounce(), Duration::from_millis(400));
	}

	#[test]
	fn partial_override() {
		let config = FormConfig::from_json(
			r#"{ "debounce_ms": 250, "messages": { "username_available": "Great!" } }"#,
		)
		.unwrap();

		assert_eq!(config.debounce_ms, 250);
		assert_eq!(config.min_password_len, 8);
		assert_eq!(config.messages.username_available, "Great!");
		assert_eq!(config.messages.password_empty, "Password must not be empty");
	}

	#[test]
	fn too_short_message_follows_the_minimum() {
		let config = FormConfig::default();
		assert_eq!(config.username_too_short(), "Username must be at least three characters!");

		let config = FormConfig::from_json(r#"{ "min_username_len": 5 }"#).unwrap();
		assert_eq!(config.username_too_short(), "Username must be at least five characters!");

		let config = FormConfig::from_json(r#"{ "min_username_len": 12 }"#).unwrap();
		assert_eq!(config.username_too_short(), "Username must be at least 12 characters!");

		let config = FormConfig::from_json(
			r#"{ "min_username_len": 5, "messages": { "username_too_short": "Too short" } }"#,
		)
		.unwrap();
		assert_eq!(config.username_too_short(), "Too short");
	}

	#[test]
	fn rejects_invalid_values() {
		assert!(matches!(
			FormConfig::from_json(r#"{ "min_username_len": 0 }"#),
			Err(ConfigError::NotPositive {
				field: "min_username_len"
			})
		));
		assert!(matches!(
			FormConfig::from_json(r#"{ "special_chars": "" }"#),
			Err(ConfigError::NoSpecialChars)
		));
		assert!(matches!(
			FormConfig::from_json(r#"{ "debounce": 1 }"#),
			Err(ConfigError::Json(_))
		));
	}
}
