//! Wire types for the estate hosted backend.
//!
//! This crate contains the serde-serializable types exchanged with the
//! hosted backend: auth sessions and users, table rows, and serverless
//! function payloads. These types represent the shapes of data as they
//! appear on the wire.
//!
//! Types in this crate are:
//! * Pure data: no behavior beyond serialization and small accessors
//! * 1:1 with the backend: field names match the table and auth schemas
//!
//! Session handling and HTTP plumbing live in `estate-runtime` and `estate-rs`.

pub mod api_error;
pub mod functions;
pub mod records;
pub mod session;

pub use api_error::*;
pub use functions::*;
pub use records::*;
pub use session::*;
