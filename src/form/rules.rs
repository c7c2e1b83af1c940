use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::FormConfig;

/// Length of `text` in user-perceived characters.
pub fn text_len(text: &str) -> usize {
	text.graphemes(true).count()
}

/// Decimal digits of any script. Other numerics such as `½` or `Ⅷ` do not
/// count.
pub fn is_decimal_digit(c: char) -> bool {
	c.general_category() == GeneralCategory::DecimalNumber
}

/// One password property, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PasswordRule {
	MinLength,
	Uppercase,
	Lowercase,
	Digit,
	SpecialChar,
}

impl PasswordRule {
	pub const ALL: [PasswordRule; 5] = [
		PasswordRule::MinLength,
		PasswordRule::Uppercase,
		PasswordRule::Lowercase,
		PasswordRule::Digit,
		PasswordRule::SpecialChar,
	];

	pub fn index(self) -> usize {
		self as usize
	}

	pub fn check(self, text: &str, config: &FormConfig) -> bool {
		match self {
			PasswordRule::MinLength => text_len(text) >= config.min_password_len,
			PasswordRule::Uppercase => text.chars().any(char::is_uppercase),
			PasswordRule::Lowercase => text.chars().any(char::is_lowercase),
			PasswordRule::Digit => text.chars().any(is_decimal_digit),
			PasswordRule::SpecialChar => text.chars().any(|c| config.special_chars.contains(c)),
		}
	}

	pub fn message(self, config: &FormConfig) -> String {
		match self {
			PasswordRule::MinLength => format!(
				"MUST contain at least {} characters (12+ recommended)",
				config.min_password_len
			),
			PasswordRule::Uppercase => "MUST contain at least one uppercase letter".to_owned(),
			PasswordRule::Lowercase => "MUST contain at least one lowercase letter".to_owned(),
			PasswordRule::Digit => "MUST contain at least one number".to_owned(),
			PasswordRule::SpecialChar => format!(
				"MUST contain at least one special character [{}]",
				config.special_chars
			),
		}
	}
}

/// Pass/fail of every rule for one password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleResults([bool; 5]);

impl RuleResults {
	pub fn evaluate(text: &str, config: &FormConfig) -> Self {
		RuleResults(PasswordRule::ALL.map(|rule| rule.check(text, config)))
	}

	pub fn from_flags(flags: [bool; 5]) -> Self {
		RuleResults(flags)
	}

	pub fn passed(&self, rule: PasswordRule) -> bool {
		self.0[rule.index()]
	}

	pub fn all(&self) -> bool {
		self.0.iter().all(|passed| *passed)
	}

	pub fn iter(&self) -> impl Iterator<Item = (PasswordRule, bool)> + '_ {
		PasswordRule::ALL.into_iter().zip(self.0.iter().copied())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRequirement {
	pub rule: PasswordRule,
	pub passed: bool,
	pub message: String,
}

impl PasswordRequirement {
	/// The five requirements, all failing, in display order.
	pub fn initial(config: &FormConfig) -> Vec<PasswordRequirement> {
		PasswordRule::ALL
			.into_iter()
			.map(|rule| PasswordRequirement {
				rule,
				passed: false,
				message: rule.message(config),
			})
			.collect()
	}
}
