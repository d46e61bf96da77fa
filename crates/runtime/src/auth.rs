//! Seam between the session runtime and the hosted auth service.

use async_trait::async_trait;
use estate_protocol::{Session, SignUpRequest, SignUpResponse, User};

use crate::error::Result;

/// Auth operations the session runtime relies on.
///
/// Implemented over HTTP by `estate::HostedClient` and in memory by
/// [`crate::fake::FakeAuth`].
#[async_trait]
pub trait AuthApi: Send + Sync {
	async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

	async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpResponse>;

	/// Exchanges a refresh token for a new session. Refresh tokens are single use.
	async fn refresh(&self, refresh_token: &str) -> Result<Session>;

	/// Verifies an access token and returns its user.
	async fn get_user(&self, access_token: &str) -> Result<User>;

	async fn sign_out(&self, access_token: &str) -> Result<()>;
}
