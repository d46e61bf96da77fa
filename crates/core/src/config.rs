//! Backend connection settings persisted as JSON in the user config dir.

use std::fs;
use std::path::{Path, PathBuf};

use estate_runtime::SessionConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const ENV_BACKEND_URL: &str = "ESTATE_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "ESTATE_ANON_KEY";
pub const ENV_SERVICE_KEY: &str = "ESTATE_SERVICE_KEY";
pub const ENV_PUBLIC_URL: &str = "ESTATE_PUBLIC_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstateConfig {
	pub schema: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub backend_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub anon_key: Option<String>,
	/// Privileged key for batch jobs; never written back to disk.
	#[serde(default, skip_serializing)]
	pub service_key: Option<String>,
	/// Base of share URLs, e.g. `https://homes.example.com`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub public_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_file: Option<PathBuf>,
	#[serde(default)]
	pub session: SessionConfig,
}

impl Default for EstateConfig {
	fn default() -> Self {
		Self {
			schema: CONFIG_SCHEMA_VERSION,
			backend_url: None,
			anon_key: None,
			service_key: None,
			public_url: None,
			session_file: None,
			session: SessionConfig::default(),
		}
	}
}

impl EstateConfig {
	/// `<config dir>/estate/config.json`.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("estate").join("config.json"))
	}

	/// Reads `path`; a missing file yields the defaults.
	pub fn load(path: &Path) -> Result<Self> {
		match fs::read_to_string(path) {
			Ok(content) => Ok(serde_json::from_str(&content)?),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
			Err(err) => Err(err.into()),
		}
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}

	/// Overlays `ESTATE_*` environment variables that are set and non-empty.
	pub fn with_env(self) -> Self {
		self.with_env_from(|key| std::env::var(key).ok())
	}

	pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
		let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		if let Some(value) = get(ENV_BACKEND_URL) {
			self.backend_url = Some(value);
		}
		if let Some(value) = get(ENV_ANON_KEY) {
			self.anon_key = Some(value);
		}
		if let Some(value) = get(ENV_SERVICE_KEY) {
			self.service_key = Some(value);
		}
		if let Some(value) = get(ENV_PUBLIC_URL) {
			self.public_url = Some(value);
		}
		self
	}

	pub fn backend_url(&self) -> Result<Url> {
		let raw = self
			.backend_url
			.as_deref()
			.ok_or_else(|| Error::Config(format!("backend URL not set (use --backend-url or {ENV_BACKEND_URL})")))?;
		Ok(Url::parse(raw)?)
	}

	pub fn anon_key(&self) -> Result<&str> {
		self.anon_key
			.as_deref()
			.ok_or_else(|| Error::Config(format!("anon key not set (use --anon-key or {ENV_ANON_KEY})")))
	}

	pub fn service_key(&self) -> Result<&str> {
		self.service_key
			.as_deref()
			.ok_or_else(|| Error::Config(format!("service key not set ({ENV_SERVICE_KEY})")))
	}

	/// First DNS label of the backend host, which names the hosted project.
	pub fn project_ref(&self) -> Result<String> {
		let url = self.backend_url()?;
		let host = url
			.host_str()
			.ok_or_else(|| Error::Config(format!("backend URL has no host: {url}")))?;
		Ok(host.split('.').next().unwrap_or(host).to_string())
	}

	/// Storage key for the persisted session, matching the browser client's.
	pub fn storage_key(&self) -> Result<String> {
		Ok(format!("estate-{}-auth-token", self.project_ref()?))
	}

	pub fn session_file(&self) -> Option<PathBuf> {
		self.session_file
			.clone()
			.or_else(|| dirs::config_dir().map(|dir| dir.join("estate").join("session.json")))
	}

	/// Base for share URLs; falls back to the backend URL.
	pub fn public_url(&self) -> Result<Url> {
		match self.public_url.as_deref() {
			Some(raw) => Ok(Url::parse(raw)?),
			None => self.backend_url(),
		}
	}
}
