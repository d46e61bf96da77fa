//! Client for the estate hosted backend.
//!
//! [`HostedClient`] speaks to the backend-as-a-service that stores the
//! brokerage data: the auth endpoints (and implements
//! [`estate_runtime::AuthApi`] on top of them), the REST table endpoint and
//! serverless function invocation. The batch jobs built on it live here too:
//! the appointment [`reminders`] run and property [`share`] links.
//!
//! Session state itself (cache, restore, refresh) is in `estate-runtime`.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod functions;
pub mod reminders;
pub mod share;
pub mod tables;

pub use client::HostedClient;
pub use config::EstateConfig;
pub use error::{Error, Result};
pub use reminders::{LogNotifier, ReminderJob, ReminderNotifier};
pub use share::{CreatedLink, ShareLinks};
pub use tables::TableQuery;

pub use estate_protocol as protocol;
pub use estate_runtime as runtime;
