//! Error types for the hosted backend client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("backend returned {status}: {message}")]
	Api { status: u16, message: String },

	#[error("invalid URL: {0}")]
	Url(#[from] url::ParseError),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("configuration error: {0}")]
	Config(String),

	#[error("not found: {0}")]
	NotFound(String),

	#[error(transparent)]
	Session(#[from] estate_runtime::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// Connect failures, timeouts, 429 and 5xx responses.
	pub fn is_transient(&self) -> bool {
		match self {
			Error::Http(err) => err.is_connect() || err.is_timeout(),
			Error::Api { status, .. } => *status == 429 || *status >= 500,
			Error::Session(err) => err.is_transient(),
			_ => false,
		}
	}
}

impl From<Error> for estate_runtime::Error {
	fn from(err: Error) -> Self {
		match err {
			Error::Http(err) if err.is_decode() => estate_runtime::Error::Decode(err.to_string()),
			Error::Http(err) if err.is_builder() => estate_runtime::Error::Client(err.to_string()),
			Error::Http(err) => match err.status() {
				Some(status) => estate_runtime::Error::Backend {
					status: status.as_u16(),
					message: err.to_string(),
				},
				None => estate_runtime::Error::Transport(err.to_string()),
			},
			Error::Api { status, message } => estate_runtime::Error::Backend { status, message },
			Error::Json(err) => estate_runtime::Error::Decode(err.to_string()),
			Error::Io(err) => estate_runtime::Error::Io(err),
			Error::Session(err) => err,
			other @ (Error::Url(_) | Error::Config(_) | Error::NotFound(_)) => estate_runtime::Error::Client(other.to_string()),
		}
	}
}
