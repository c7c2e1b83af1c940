use thiserror::Error;

/// Why an availability lookup produced no answer. The form never sees
/// these: they are logged and turned into "unavailable".
#[derive(Debug, Error)]
pub enum CheckError {
	#[error("invalid request: {0}")]
	InvalidRequest(String),

	#[error("transport failure: {0}")]
	Transport(String),

	#[error("server responded with status {status}")]
	Server { status: u16 },

	#[error("response carried no data")]
	NoData,

	#[error("failed to decode response: {0}")]
	Decoding(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid configuration: {0}")]
	Json(#[from] serde_json::Error),

	#[error("`{field}` must be greater than zero")]
	NotPositive { field: &'static str },

	#[error("`special_chars` must contain at least one character")]
	NoSpecialChars,
}
