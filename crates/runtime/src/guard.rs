//! Route-level session verification with role checks.

use estate_protocol::{Role, Session};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CancellationToken;
use crate::context::SessionContext;
use crate::error::Result;
use crate::events::RemovalReason;

/// Roles allowed per route prefix. Routes matching no rule only need a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicy {
	rules: Vec<RouteRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
	pub prefix: String,
	pub roles: Vec<Role>,
}

impl Default for RoutePolicy {
	fn default() -> Self {
		Self::empty()
			.allow("/admin", &[Role::Admin])
			.allow("/broker", &[Role::Broker, Role::Admin])
	}
}

impl RoutePolicy {
	pub fn empty() -> Self {
		Self { rules: Vec::new() }
	}

	pub fn allow(mut self, prefix: &str, roles: &[Role]) -> Self {
		let prefix = prefix.trim_end_matches('/').to_string();
		self.rules.retain(|rule| rule.prefix != prefix);
		self.rules.push(RouteRule {
			prefix,
			roles: roles.to_vec(),
		});
		self
	}

	/// Roles required by the longest matching prefix, on path-segment boundaries.
	pub fn required_roles(&self, route: &str) -> Option<&[Role]> {
		self.rules
			.iter()
			.filter(|rule| route == rule.prefix || route.strip_prefix(rule.prefix.as_str()).is_some_and(|rest| rest.starts_with('/')))
			.max_by_key(|rule| rule.prefix.len())
			.map(|rule| rule.roles.as_slice())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum Access {
	Granted { session: Session, cached: bool },
	Unauthenticated,
	Forbidden { required: Vec<Role>, actual: Role },
}

impl Access {
	pub fn is_granted(&self) -> bool {
		matches!(self, Access::Granted { .. })
	}
}

/// Decides whether the current session may open a route.
pub struct RouteGuard<'a> {
	ctx: &'a SessionContext,
}

impl<'a> RouteGuard<'a> {
	pub fn new(ctx: &'a SessionContext) -> Self {
		Self { ctx }
	}

	pub async fn authorize(&self, route: &str, cancel: &CancellationToken) -> Result<Access> {
		if let Some(session) = self.ctx.cache().cached(route) {
			debug!(target = "estate.session", route, "route verified from cache");
			return Ok(Access::Granted { session, cached: true });
		}

		let Some(session) = self.ctx.session(cancel).await? else {
			self.ctx.cache().update(None, route);
			return Ok(Access::Unauthenticated);
		};

		let user = match self.ctx.auth().get_user(&session.access_token).await {
			Ok(user) => user,
			Err(err) if err.is_rejection() => {
				debug!(target = "estate.session", route, error = %err, "access token rejected");
				self.ctx.discard(RemovalReason::Expired)?;
				return Ok(Access::Unauthenticated);
			}
			Err(err) => return Err(err),
		};

		let actual = user.role();
		if let Some(required) = self.ctx.route_policy().required_roles(route) {
			if !required.contains(&actual) {
				debug!(target = "estate.session", route, role = %actual, "route forbidden for role");
				return Ok(Access::Forbidden {
					required: required.to_vec(),
					actual,
				});
			}
		}

		let session = Session { user, ..session };
		self.ctx.cache().update(Some(&session), route);
		debug!(target = "estate.session", route, role = %actual, "route verified");
		Ok(Access::Granted { session, cached: false })
	}
}
