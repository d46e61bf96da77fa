//! Error bodies returned by the hosted backend.
//!
//! The auth, REST and function endpoints each use a different error shape;
//! [`ApiErrorBody`] accepts all of them and [`ApiErrorBody::message`] picks
//! the most descriptive field present.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
	#[serde(default)]
	pub error: Option<String>,
	#[serde(default)]
	pub error_description: Option<String>,
	#[serde(default)]
	pub msg: Option<String>,
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub code: Option<serde_json::Value>,
}

impl ApiErrorBody {
	/// Parses a raw response body, keeping non-JSON text as the message.
	pub fn from_text(body: &str) -> Self {
		serde_json::from_str(body).unwrap_or_else(|_| Self {
			message: (!body.trim().is_empty()).then(|| body.trim().to_string()),
			..Default::default()
		})
	}

	pub fn message(&self) -> Option<&str> {
		self.error_description
			.as_deref()
			.or(self.msg.as_deref())
			.or(self.message.as_deref())
			.or(self.error.as_deref())
	}
}
