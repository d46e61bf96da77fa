//! Filtered access to the REST table endpoint.
//!
//! Filters use the `column=op.value` query syntax of the REST layer:
//!
//! ```ignore
//! let due: Vec<Appointment> = client
//!     .from(tables::APPOINTMENTS)
//!     .eq("appointment_date", "2026-10-17")
//!     .not_true("reminder_sent")
//!     .fetch()
//!     .await?;
//! ```

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::HostedClient;
use crate::error::{Error, Result};

const RETURN_REPRESENTATION: &str = "return=representation";

impl HostedClient {
	pub fn from(&self, table: &str) -> TableQuery<'_> {
		TableQuery {
			client: self,
			table: table.to_string(),
			params: Vec::new(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct TableQuery<'a> {
	client: &'a HostedClient,
	table: String,
	params: Vec<(String, String)>,
}

impl TableQuery<'_> {
	fn param(mut self, key: &str, value: String) -> Self {
		self.params.push((key.to_string(), value));
		self
	}

	pub fn select(self, columns: &str) -> Self {
		self.param("select", columns.to_string())
	}

	pub fn eq(self, column: &str, value: impl std::fmt::Display) -> Self {
		self.param(column, format!("eq.{value}"))
	}

	pub fn neq(self, column: &str, value: impl std::fmt::Display) -> Self {
		self.param(column, format!("neq.{value}"))
	}

	pub fn gte(self, column: &str, value: impl std::fmt::Display) -> Self {
		self.param(column, format!("gte.{value}"))
	}

	pub fn lt(self, column: &str, value: impl std::fmt::Display) -> Self {
		self.param(column, format!("lt.{value}"))
	}

	pub fn is_null(self, column: &str) -> Self {
		self.param(column, "is.null".to_string())
	}

	pub fn is_false(self, column: &str) -> Self {
		self.param(column, "is.false".to_string())
	}

	/// Matches `false` and `null`.
	pub fn not_true(self, column: &str) -> Self {
		self.param(column, "not.is.true".to_string())
	}

	pub fn order(self, column: &str, ascending: bool) -> Self {
		let dir = if ascending { "asc" } else { "desc" };
		self.param("order", format!("{column}.{dir}"))
	}

	pub fn limit(self, n: usize) -> Self {
		self.param("limit", n.to_string())
	}

	pub fn query_string(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new())
			.extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
			.finish()
	}

	fn path(&self) -> String {
		let query = self.query_string();
		if query.is_empty() {
			format!("rest/v1/{}", self.table)
		} else {
			format!("rest/v1/{}?{query}", self.table)
		}
	}

	pub async fn fetch<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
		let request = self.client.request(Method::GET, &self.path())?;
		self.client.send_json(request).await
	}

	/// First matching row, or [`Error::NotFound`].
	pub async fn single<T: DeserializeOwned>(self) -> Result<T> {
		let table = self.table.clone();
		let mut rows: Vec<T> = self.limit(1).fetch().await?;
		if rows.is_empty() {
			return Err(Error::NotFound(format!("no matching row in {table}")));
		}
		Ok(rows.swap_remove(0))
	}

	pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(&self, rows: &B) -> Result<Vec<T>> {
		let request = self
			.client
			.request(Method::POST, &self.path())?
			.header("Prefer", RETURN_REPRESENTATION)
			.json(rows);
		self.client.send_json(request).await
	}

	/// Patches every row matching the filters.
	pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(&self, patch: &B) -> Result<Vec<T>> {
		let request = self
			.client
			.request(Method::PATCH, &self.path())?
			.header("Prefer", RETURN_REPRESENTATION)
			.json(patch);
		self.client.send_json(request).await
	}

	pub async fn delete(&self) -> Result<()> {
		let request = self.client.request(Method::DELETE, &self.path())?;
		self.client.send(request).await?;
		Ok(())
	}
}
