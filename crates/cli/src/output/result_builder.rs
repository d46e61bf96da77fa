use std::io::{self, Write};
use std::time::Instant;

use colored::Colorize;
use serde::Serialize;

use crate::output::format::OutputFormat;
use crate::output::model::{CommandError, CommandResult, ErrorCode, SCHEMA_VERSION};

/// Builder for constructing command results.
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
	duration_ms: Option<u64>,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
			duration_ms: None,
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
		});
		self
	}

	pub fn duration_ms(mut self, duration_ms: u64) -> Self {
		self.duration_ms = Some(duration_ms);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();
		let duration_ms = self.duration_ms.unwrap_or_else(|| self.start_time.elapsed().as_millis() as u64);

		CommandResult {
			schema_version: SCHEMA_VERSION,
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			duration_ms: Some(duration_ms),
		}
	}
}

/// Print a command result to stdout in the specified format.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {
			let mut stdout = io::stdout().lock();
			let _ = stdout.write_all(render_text(result).as_bytes());
		}
	}
}

/// Text rendering: top-level data fields as `key: value` lines.
pub fn render_text<T: Serialize>(result: &CommandResult<T>) -> String {
	let mut out = String::new();

	if let Some(ref error) = result.error {
		out.push_str(&format!("{} [{}]: {}\n", "Error".red().bold(), error.code, error.message));
		return out;
	}

	match result.data.as_ref().map(serde_json::to_value) {
		Some(Ok(serde_json::Value::Object(map))) => {
			for (key, value) in map {
				let value = match value {
					serde_json::Value::String(s) => s,
					serde_json::Value::Null => "-".to_string(),
					other => other.to_string(),
				};
				out.push_str(&format!("{}: {value}\n", key.bold()));
			}
		}
		Some(Ok(other)) => out.push_str(&format!("{other}\n")),
		_ => {}
	}
	out
}
