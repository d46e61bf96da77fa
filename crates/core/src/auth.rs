//! Auth endpoints of the hosted backend.

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use estate_protocol::{Session, SignUpRequest, SignUpResponse, TokenGrant, User};
use estate_runtime::AuthApi;

use crate::client::HostedClient;
use crate::error::Result;

const TOKEN_PASSWORD: &str = "auth/v1/token?grant_type=password";
const TOKEN_REFRESH: &str = "auth/v1/token?grant_type=refresh_token";
const SIGNUP: &str = "auth/v1/signup";
const USER: &str = "auth/v1/user";
const LOGOUT: &str = "auth/v1/logout";

impl HostedClient {
	pub async fn password_grant(&self, email: &str, password: &str) -> Result<Session> {
		let grant = TokenGrant::Password {
			email: email.to_string(),
			password: password.to_string(),
		};
		self.post_json(TOKEN_PASSWORD, &grant).await
	}

	pub async fn refresh_grant(&self, refresh_token: &str) -> Result<Session> {
		let grant = TokenGrant::RefreshToken {
			refresh_token: refresh_token.to_string(),
		};
		self.post_json(TOKEN_REFRESH, &grant).await
	}

	pub async fn signup(&self, request: &SignUpRequest) -> Result<SignUpResponse> {
		self.post_json(SIGNUP, request).await
	}

	pub async fn user(&self, access_token: &str) -> Result<User> {
		let request = self.with_bearer(access_token).request(Method::GET, USER)?;
		self.send_json(request).await
	}

	pub async fn logout(&self, access_token: &str) -> Result<()> {
		let request = self.with_bearer(access_token).request(Method::POST, LOGOUT)?;
		self.send(request).await?;
		Ok(())
	}
}

#[async_trait]
impl AuthApi for HostedClient {
	async fn sign_in_with_password(&self, email: &str, password: &str) -> estate_runtime::Result<Session> {
		debug!(target = "estate.auth", email, "password grant");
		Ok(self.password_grant(email, password).await?)
	}

	async fn sign_up(&self, request: SignUpRequest) -> estate_runtime::Result<SignUpResponse> {
		Ok(self.signup(&request).await?)
	}

	async fn refresh(&self, refresh_token: &str) -> estate_runtime::Result<Session> {
		debug!(target = "estate.auth", "refresh-token grant");
		Ok(self.refresh_grant(refresh_token).await?)
	}

	async fn get_user(&self, access_token: &str) -> estate_runtime::Result<User> {
		Ok(self.user(access_token).await?)
	}

	async fn sign_out(&self, access_token: &str) -> estate_runtime::Result<()> {
		Ok(self.logout(access_token).await?)
	}
}
