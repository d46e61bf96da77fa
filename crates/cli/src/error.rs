use thiserror::Error;

use crate::output::ErrorCode;

#[derive(Debug, Error)]
pub enum EstateError {
	#[error(transparent)]
	Backend(#[from] estate::Error),

	#[error(transparent)]
	Session(#[from] estate_runtime::Error),

	#[error("not signed in (run `estate auth login`)")]
	NotSignedIn,

	#[error("access denied: {0}")]
	AccessDenied(String),

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EstateError>;

impl EstateError {
	pub fn code(&self) -> ErrorCode {
		match self {
			EstateError::Backend(err) => backend_code(err),
			EstateError::Session(err) => session_code(err),
			EstateError::NotSignedIn | EstateError::AccessDenied(_) => ErrorCode::AuthError,
			EstateError::InvalidInput(_) => ErrorCode::InvalidInput,
			EstateError::Io(_) => ErrorCode::IoError,
			EstateError::Anyhow(err) if err.root_cause().is::<std::io::Error>() => ErrorCode::IoError,
			EstateError::Anyhow(_) => ErrorCode::InternalError,
		}
	}
}

fn backend_code(err: &estate::Error) -> ErrorCode {
	match err {
		estate::Error::Config(_) | estate::Error::Url(_) => ErrorCode::InvalidInput,
		estate::Error::Io(_) => ErrorCode::IoError,
		estate::Error::Api { status: 401 | 403, .. } => ErrorCode::AuthError,
		estate::Error::Session(err) => session_code(err),
		_ => ErrorCode::BackendError,
	}
}

fn session_code(err: &estate_runtime::Error) -> ErrorCode {
	use estate_runtime::Error;
	match err {
		Error::NoSession => ErrorCode::AuthError,
		err if err.is_rejection() => ErrorCode::AuthError,
		Error::Cancelled | Error::RetriesExhausted { .. } => ErrorCode::SessionError,
		Error::Client(_) => ErrorCode::InvalidInput,
		Error::Io(_) => ErrorCode::IoError,
		Error::Json(_) | Error::Decode(_) => ErrorCode::SessionError,
		Error::Transport(_) | Error::Backend { .. } => ErrorCode::BackendError,
	}
}
