use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use estate_protocol::Role;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "estate")]
#[command(about = "Estate brokerage backend from the command line")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Config file (defaults to <config dir>/estate/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Backend project URL
	#[arg(long, global = true, env = "ESTATE_BACKEND_URL", value_name = "URL")]
	pub backend_url: Option<String>,

	/// Public anon key of the backend project
	#[arg(long, global = true, env = "ESTATE_ANON_KEY", hide_env_values = true, value_name = "KEY")]
	pub anon_key: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Sign in, sign out and inspect the stored session
	Auth {
		#[command(subcommand)]
		action: AuthAction,
	},

	/// Check whether the current session may open a route
	Guard { route: String },

	/// Start a subscription checkout and print the payment URL
	Checkout { plan_id: String },

	/// Print the billing portal URL
	Portal,

	/// Show the current subscription
	#[command(alias = "sub")]
	Subscription,

	/// Appointment reminders
	Reminders {
		#[command(subcommand)]
		action: RemindersAction,
	},

	/// Property share links
	Share {
		#[command(subcommand)]
		action: ShareAction,
	},

	/// Host the reminder function and share-link redirects over HTTP
	Serve {
		#[arg(long, default_value = "127.0.0.1:8787")]
		bind: SocketAddr,
	},
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
	/// Sign in with email and password
	Login {
		#[arg(long)]
		email: String,
		#[arg(long, env = "ESTATE_PASSWORD", hide_env_values = true)]
		password: String,
	},

	/// Create an account
	Signup {
		#[arg(long)]
		email: String,
		#[arg(long, env = "ESTATE_PASSWORD", hide_env_values = true)]
		password: String,
		/// Full name stored in the user's metadata
		#[arg(long)]
		name: Option<String>,
		#[arg(long, value_enum, default_value = "client")]
		role: RoleArg,
	},

	/// Sign out and forget the stored session
	Logout,

	/// Show the stored session without contacting the backend
	Status,

	/// Restore the stored session, refreshing it when close to expiry
	Restore {
		/// Refresh attempts before giving up (overrides config)
		#[arg(long)]
		attempts: Option<u32>,
	},
}

#[derive(Subcommand, Debug)]
pub enum RemindersAction {
	/// Send reminders for tomorrow's appointments
	Run {
		/// List due appointments without notifying or flagging them
		#[arg(long)]
		dry_run: bool,
	},
}

#[derive(Subcommand, Debug)]
pub enum ShareAction {
	/// Create a share link for a property
	Create {
		#[arg(long = "property")]
		property_id: String,
		#[arg(long = "broker")]
		broker_id: String,
	},

	/// Resolve a share code and count the visit
	Open { code: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
	Admin,
	Broker,
	Client,
}

impl From<RoleArg> for Role {
	fn from(role: RoleArg) -> Self {
		match role {
			RoleArg::Admin => Role::Admin,
			RoleArg::Broker => Role::Broker,
			RoleArg::Client => Role::Client,
		}
	}
}

impl Commands {
	/// Dotted name used in output envelopes.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Auth { action } => match action {
				AuthAction::Login { .. } => "auth.login",
				AuthAction::Signup { .. } => "auth.signup",
				AuthAction::Logout => "auth.logout",
				AuthAction::Status => "auth.status",
				AuthAction::Restore { .. } => "auth.restore",
			},
			Commands::Guard { .. } => "guard",
			Commands::Checkout { .. } => "checkout",
			Commands::Portal => "portal",
			Commands::Subscription => "subscription",
			Commands::Reminders { .. } => "reminders.run",
			Commands::Share { action } => match action {
				ShareAction::Create { .. } => "share.create",
				ShareAction::Open { .. } => "share.open",
			},
			Commands::Serve { .. } => "serve",
		}
	}
}
