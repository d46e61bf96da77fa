//! Session runtime for estate clients.
//!
//! Owns everything between "a token grant came back from the auth service"
//! and "a route handler may run": persisted session storage, restoration on
//! startup, single-flight token refresh, the route-keyed verification cache
//! and the session event bus. All state hangs off an explicitly constructed
//! [`SessionContext`]; nothing here is global.

pub mod auth;
pub mod backoff;
pub mod cache;
pub mod clock;
pub mod context;
pub mod error;
pub mod events;
pub mod fake;
pub mod gate;
pub mod guard;
pub mod restore;
pub mod storage;

pub use auth::AuthApi;
pub use backoff::RetryPolicy;
pub use cache::{DEFAULT_SESSION_TTL, SessionCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{SessionConfig, SessionContext};
pub use error::{Error, Result};
pub use events::{RemovalReason, SessionEvent, SessionEvents, UpdateSource};
pub use gate::RefreshGate;
pub use guard::{Access, RouteGuard, RoutePolicy};
pub use restore::{RestoreOutcome, SessionRestorer};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};

pub use tokio_util::sync::CancellationToken;
