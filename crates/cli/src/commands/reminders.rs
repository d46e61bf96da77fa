use std::sync::Arc;

use estate::{LogNotifier, ReminderJob};
use estate_protocol::ReminderReport;

use crate::context::CommandContext;
use crate::error::Result;

pub async fn run(ctx: &CommandContext, dry_run: bool) -> Result<ReminderReport> {
	let job = ReminderJob::new(ctx.service_client()?, Arc::new(LogNotifier));
	Ok(job.run(dry_run).await?)
}
