//! HTTP client for the hosted backend.

use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use estate_protocol::ApiErrorBody;

use crate::config::EstateConfig;
use crate::error::{Error, Result};

/// Shared connection to one hosted project.
///
/// Cloning is cheap: the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct HostedClient {
	http: reqwest::Client,
	base: Url,
	anon_key: String,
	bearer: Option<String>,
}

impl HostedClient {
	pub fn new(base: Url, anon_key: impl Into<String>) -> Self {
		Self::with_http(reqwest::Client::new(), base, anon_key)
	}

	pub fn with_http(http: reqwest::Client, mut base: Url, anon_key: impl Into<String>) -> Self {
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());
			base.set_path(&path);
		}
		Self {
			http,
			base,
			anon_key: anon_key.into(),
			bearer: None,
		}
	}

	pub fn from_config(config: &EstateConfig) -> Result<Self> {
		Ok(Self::new(config.backend_url()?, config.anon_key()?))
	}

	/// Copy that authenticates as `token` (a user access token or the service key).
	pub fn with_bearer(&self, token: impl Into<String>) -> Self {
		Self {
			bearer: Some(token.into()),
			..self.clone()
		}
	}

	pub fn base_url(&self) -> &Url {
		&self.base
	}

	pub fn endpoint(&self, path: &str) -> Result<Url> {
		Ok(self.base.join(path.trim_start_matches('/'))?)
	}

	/// Request carrying the `apikey` header and a bearer token.
	pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
		let url = self.endpoint(path)?;
		debug!(target = "estate.http", %method, %url, "request");
		let token = self.bearer.as_deref().unwrap_or(&self.anon_key);
		Ok(self
			.http
			.request(method, url)
			.header("apikey", &self.anon_key)
			.bearer_auth(token))
	}

	/// Sends and turns non-2xx responses into [`Error::Api`].
	pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
		let response = request.send().await?;
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		let body = response.text().await.unwrap_or_default();
		let message = ApiErrorBody::from_text(&body)
			.message()
			.map(str::to_string)
			.unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
		debug!(target = "estate.http", status = status.as_u16(), %message, "backend error");
		Err(Error::Api {
			status: status.as_u16(),
			message,
		})
	}

	pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
		let response = self.send(request).await?;
		let bytes = response.bytes().await?;
		Ok(serde_json::from_slice(&bytes)?)
	}

	pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
		let request = self.request(Method::POST, path)?.json(body);
		self.send_json(request).await
	}
}
