//! Next-day appointment reminders.
//!
//! The job scans `appointments` for rows dated tomorrow (UTC, from the
//! injected clock) whose `reminder_sent` flag is not set, notifies each
//! client and then flags the row. A row is only flagged after its
//! notification went out, so a failed run is safe to repeat.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta};
use serde_json::json;
use tracing::{info, warn};

use estate_protocol::{Appointment, ReminderReport, tables};
use estate_runtime::{Clock, SystemClock};

use crate::client::HostedClient;
use crate::error::{Error, Result};

/// Delivers one reminder.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
	async fn notify(&self, appointment: &Appointment) -> Result<()>;
}

/// Writes reminders to the log instead of sending mail.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl ReminderNotifier for LogNotifier {
	async fn notify(&self, appointment: &Appointment) -> Result<()> {
		let email = appointment
			.client_email
			.as_deref()
			.ok_or_else(|| Error::NotFound(format!("client email for appointment {}", appointment.id)))?;
		info!(
			target = "estate.reminders",
			appointment = %appointment.id,
			to = email,
			client = appointment.client_name.as_deref().unwrap_or(""),
			date = %appointment.appointment_date,
			time = appointment.appointment_time.as_deref().unwrap_or(""),
			"appointment reminder"
		);
		Ok(())
	}
}

pub struct ReminderJob {
	client: HostedClient,
	notifier: Arc<dyn ReminderNotifier>,
	clock: Arc<dyn Clock>,
}

impl ReminderJob {
	/// `client` should carry the service key, the job reads every broker's rows.
	pub fn new(client: HostedClient, notifier: Arc<dyn ReminderNotifier>) -> Self {
		Self::with_clock(client, notifier, Arc::new(SystemClock))
	}

	pub fn with_clock(client: HostedClient, notifier: Arc<dyn ReminderNotifier>, clock: Arc<dyn Clock>) -> Self {
		Self { client, notifier, clock }
	}

	pub fn target_date(&self) -> NaiveDate {
		(self.clock.now() + TimeDelta::days(1)).date_naive()
	}

	pub async fn due(&self) -> Result<Vec<Appointment>> {
		self.client
			.from(tables::APPOINTMENTS)
			.eq("appointment_date", self.target_date())
			.not_true("reminder_sent")
			.order("appointment_time", true)
			.fetch()
			.await
	}

	pub async fn run(&self, dry_run: bool) -> Result<ReminderReport> {
		let due = self.due().await?;
		let mut report = ReminderReport {
			scanned: due.len(),
			dry_run,
			..Default::default()
		};
		info!(target = "estate.reminders", date = %self.target_date(), due = due.len(), dry_run, "reminder run started");

		for appointment in &due {
			if dry_run {
				info!(target = "estate.reminders", appointment = %appointment.id, "would send reminder");
				continue;
			}
			if let Err(err) = self.notifier.notify(appointment).await {
				warn!(target = "estate.reminders", appointment = %appointment.id, error = %err, "reminder not sent");
				report.failed += 1;
				continue;
			}
			match self.mark_sent(&appointment.id).await {
				Ok(()) => report.sent += 1,
				Err(err) => {
					warn!(target = "estate.reminders", appointment = %appointment.id, error = %err, "reminder sent but not flagged");
					report.failed += 1;
				}
			}
		}

		info!(target = "estate.reminders", sent = report.sent, failed = report.failed, "reminder run finished");
		Ok(report)
	}

	async fn mark_sent(&self, id: &str) -> Result<()> {
		let _: Vec<serde_json::Value> = self
			.client
			.from(tables::APPOINTMENTS)
			.eq("id", id)
			.update(&json!({ "reminder_sent": true }))
			.await?;
		Ok(())
	}
}
