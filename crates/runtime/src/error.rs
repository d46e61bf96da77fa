//! Error types for the session runtime.

use thiserror::Error;

/// Errors raised while talking to the auth service or touching session storage.
#[derive(Debug, Error)]
pub enum Error {
	/// The request never produced an HTTP response (connect failure, timeout, reset).
	#[error("backend unreachable: {0}")]
	Transport(String),

	#[error("backend returned {status}: {message}")]
	Backend { status: u16, message: String },

	#[error("unexpected response from backend: {0}")]
	Decode(String),

	/// The request could not be built (bad URL, missing configuration).
	#[error("client error: {0}")]
	Client(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("no active session")]
	NoSession,

	#[error("operation cancelled")]
	Cancelled,

	#[error("session refresh failed after {attempts} attempts: {last}")]
	RetriesExhausted { attempts: u32, last: Box<Error> },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// Failures worth retrying: no response at all, rate limiting, or a server-side error.
	pub fn is_transient(&self) -> bool {
		match self {
			Error::Transport(_) => true,
			Error::Backend { status, .. } => *status == 429 || *status >= 500,
			_ => false,
		}
	}

	/// The backend understood the request and refused it (bad credentials, revoked token).
	pub fn is_rejection(&self) -> bool {
		matches!(self, Error::Backend { status, .. } if (400..500).contains(status) && *status != 429)
	}
}
