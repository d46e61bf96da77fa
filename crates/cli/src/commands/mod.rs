mod auth;
mod billing;
mod guard;
mod reminders;
pub mod serve;
mod share;

use serde::Serialize;

use crate::cli::{AuthAction, Commands, RemindersAction, ShareAction};
use crate::context::CommandContext;
use crate::error::{EstateError, Result};
use crate::output::{ResultBuilder, print_result};

pub async fn dispatch(command: Commands, ctx: &CommandContext) -> Result<()> {
	let name = command.name();
	match command {
		Commands::Auth { action } => match action {
			AuthAction::Login { email, password } => emit(ctx, name, auth::login(ctx, &email, &password).await?),
			AuthAction::Signup {
				email,
				password,
				name: full_name,
				role,
			} => emit(ctx, name, auth::signup(ctx, email, password, full_name, role.into()).await?),
			AuthAction::Logout => emit(ctx, name, auth::logout(ctx).await?),
			AuthAction::Status => emit(ctx, name, auth::status(ctx)?),
			AuthAction::Restore { attempts } => emit(ctx, name, auth::restore(ctx, attempts).await?),
		},
		Commands::Guard { route } => emit(ctx, name, guard::execute(ctx, &route).await?),
		Commands::Checkout { plan_id } => emit(ctx, name, billing::checkout(ctx, &plan_id).await?),
		Commands::Portal => emit(ctx, name, billing::portal(ctx).await?),
		Commands::Subscription => emit(ctx, name, billing::subscription(ctx).await?),
		Commands::Reminders {
			action: RemindersAction::Run { dry_run },
		} => emit(ctx, name, reminders::run(ctx, dry_run).await?),
		Commands::Share { action } => match action {
			ShareAction::Create { property_id, broker_id } => emit(ctx, name, share::create(ctx, &property_id, &broker_id).await?),
			ShareAction::Open { code } => emit(ctx, name, share::open(ctx, &code).await?),
		},
		Commands::Serve { bind } => serve::execute(ctx, bind).await,
	}
}

fn emit<T: Serialize>(ctx: &CommandContext, command: &str, data: T) -> Result<()> {
	let result = ResultBuilder::new(command).data(data).build();
	print_result(&result, ctx.format);
	Ok(())
}

/// Prints the failure envelope for `command`.
pub fn emit_error(format: crate::output::OutputFormat, command: &str, err: &EstateError) {
	let result: crate::output::EmptyResult = ResultBuilder::new(command).error(err.code(), err.to_string()).build();
	print_result(&result, format);
}
