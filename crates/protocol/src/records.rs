//! Table rows mirrored from the hosted database.
//!
//! Rows are flat and keyed by string ids; foreign keys are plain id fields.
//! Integrity is enforced by the backend, not here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Table names as exposed by the REST endpoint.
pub mod tables {
	pub const PROPERTIES: &str = "properties";
	pub const PROPERTY_IMAGES: &str = "property_images";
	pub const LEADS: &str = "leads";
	pub const BROKERS: &str = "brokers";
	pub const PERFORMANCE: &str = "broker_performance";
	pub const TARGETS: &str = "broker_targets";
	pub const PLANS: &str = "plans";
	pub const SHARED_LINKS: &str = "shared_links";
	pub const APPOINTMENTS: &str = "appointments";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub price: Option<f64>,
	#[serde(default)]
	pub location: Option<String>,
	#[serde(default)]
	pub property_type: Option<String>,
	#[serde(default)]
	pub bedrooms: Option<u32>,
	#[serde(default)]
	pub bathrooms: Option<u32>,
	#[serde(default)]
	pub area_sqft: Option<f64>,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub broker_id: Option<String>,
	#[serde(default)]
	pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyImage {
	pub id: String,
	pub property_id: String,
	pub url: String,
	#[serde(default)]
	pub is_primary: bool,
}

/// Pipeline position of a lead. Transitions are application policy and not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
	#[default]
	New,
	Contacted,
	Qualified,
	Negotiation,
	Converted,
	Lost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub status: LeadStatus,
	#[serde(default)]
	pub source: Option<String>,
	#[serde(default)]
	pub broker_id: Option<String>,
	#[serde(default)]
	pub property_id: Option<String>,
	#[serde(default)]
	pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broker {
	pub id: String,
	#[serde(default)]
	pub user_id: Option<String>,
	pub full_name: String,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub plan_id: Option<String>,
	#[serde(default)]
	pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
	pub id: String,
	pub broker_id: String,
	pub period: String,
	#[serde(default)]
	pub leads_handled: u32,
	#[serde(default)]
	pub deals_closed: u32,
	#[serde(default)]
	pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
	pub id: String,
	pub broker_id: String,
	pub period: String,
	#[serde(default)]
	pub target_deals: u32,
	#[serde(default)]
	pub target_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub price_cents: Option<i64>,
	#[serde(default)]
	pub interval: Option<String>,
	#[serde(default)]
	pub features: Vec<String>,
}

/// Short link to a property listing with click tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedLink {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub code: String,
	pub property_id: String,
	pub broker_id: String,
	#[serde(default)]
	pub click_count: u64,
	#[serde(default)]
	pub last_clicked_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
	pub id: String,
	#[serde(default)]
	pub lead_id: Option<String>,
	#[serde(default)]
	pub broker_id: Option<String>,
	#[serde(default)]
	pub property_id: Option<String>,
	pub appointment_date: NaiveDate,
	#[serde(default)]
	pub appointment_time: Option<String>,
	#[serde(default)]
	pub client_name: Option<String>,
	#[serde(default)]
	pub client_email: Option<String>,
	#[serde(default)]
	pub reminder_sent: bool,
}
