use clap::Parser;
use estate_cli::{cli::Cli, commands, context::CommandContext, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let name = cli.command.name();
	let format = cli.format;
	let result = match CommandContext::from_cli(&cli) {
		Ok(ctx) => commands::dispatch(cli.command, &ctx).await,
		Err(err) => Err(err),
	};

	if let Err(err) = result {
		error!(target = "estate", command = name, error = %err, "command failed");
		commands::emit_error(format, name, &err);
		std::process::exit(1);
	}
}
