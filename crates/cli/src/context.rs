//! Per-invocation configuration and the clients built from it.

use std::path::PathBuf;
use std::sync::Arc;

use estate::{EstateConfig, HostedClient, ShareLinks};
use estate_runtime::{CancellationToken, FileSessionStorage, SessionContext};
use estate_protocol::Session;
use tracing::debug;

use crate::cli::Cli;
use crate::error::{EstateError, Result};
use crate::output::OutputFormat;

#[derive(Debug, Clone)]
pub struct CommandContext {
	pub config: EstateConfig,
	pub config_path: Option<PathBuf>,
	pub format: OutputFormat,
	cancel: CancellationToken,
}

impl CommandContext {
	/// Config file, then `ESTATE_*` env, then flags.
	pub fn from_cli(cli: &Cli) -> Result<Self> {
		let config_path = cli.config.clone().or_else(EstateConfig::default_path);
		let mut config = match &config_path {
			Some(path) => EstateConfig::load(path)?,
			None => EstateConfig::default(),
		}
		.with_env();

		if let Some(url) = &cli.backend_url {
			config.backend_url = Some(url.clone());
		}
		if let Some(key) = &cli.anon_key {
			config.anon_key = Some(key.clone());
		}
		debug!(target = "estate", path = ?config_path, backend = ?config.backend_url, "configuration loaded");

		Ok(Self {
			config,
			config_path,
			format: cli.format,
			cancel: cancel_on_ctrl_c(),
		})
	}

	/// Cancelled once the user hits Ctrl-C; shared by everything this invocation runs.
	pub fn cancel(&self) -> &CancellationToken {
		&self.cancel
	}

	pub fn client(&self) -> Result<HostedClient> {
		Ok(HostedClient::from_config(&self.config)?)
	}

	/// Client authenticated with the service key, for batch jobs.
	pub fn service_client(&self) -> Result<HostedClient> {
		Ok(self.client()?.with_bearer(self.config.service_key()?))
	}

	pub fn storage(&self) -> Result<FileSessionStorage> {
		let path = self
			.config
			.session_file()
			.ok_or_else(|| EstateError::InvalidInput("no config directory for the session file; set sessionFile in config".into()))?;
		Ok(FileSessionStorage::new(path, self.config.storage_key()?))
	}

	pub fn session_context(&self) -> Result<SessionContext> {
		Ok(SessionContext::new(
			Arc::new(self.client()?),
			Arc::new(self.storage()?),
			self.config.session.clone(),
		))
	}

	/// Usable session or [`EstateError::NotSignedIn`].
	pub async fn require_session(&self, sessions: &SessionContext) -> Result<Session> {
		sessions.session(&self.cancel).await?.ok_or(EstateError::NotSignedIn)
	}

	/// Client acting as the signed-in user.
	pub async fn user_client(&self) -> Result<HostedClient> {
		let sessions = self.session_context()?;
		let session = self.require_session(&sessions).await?;
		Ok(self.client()?.with_bearer(session.access_token))
	}

	pub fn share_links(&self, client: HostedClient) -> Result<ShareLinks> {
		Ok(ShareLinks::new(client, self.config.public_url()?))
	}
}

/// Token cancelled when the user hits Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
	let token = CancellationToken::new();
	let child = token.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			child.cancel();
		}
	});
	token
}
