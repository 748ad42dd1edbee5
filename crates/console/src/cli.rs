use clap::{Args, Parser, Subcommand, ValueEnum};
use models::settings::SettingsForm;
use models::user::{NewUser, UserAction};

#[derive(Parser, Debug)]
#[command(name = "imove-admin")]
#[command(about = "Administration console for the iMove ride-hailing platform", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to config.toml
    #[arg(long, env = "CONFIG_PATH", global = true)]
    pub config: Option<String>,

    /// One JSON object per log line on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print the Prometheus exposition after the command
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and persist the session
    Login {
        #[arg(long, env = "IMOVE_ADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "IMOVE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear the persisted session
    Logout,
    /// Show the signed-in administrator
    Whoami,
    /// Platform totals
    Dashboard,
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },
    Rides {
        #[command(subcommand)]
        action: RidesCommand,
    },
    Payments {
        #[command(subcommand)]
        action: PaymentsCommand,
    },
    Logs {
        #[command(subcommand)]
        action: LogsCommand,
    },
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    Map {
        #[command(subcommand)]
        action: MapCommand,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, value_parser = ["passenger", "rider", "admin"])]
        role: Option<String>,
    },
    Show {
        id: String,
    },
    Create(CreateUserArgs),
    Delete {
        id: String,
    },
    /// Suspend, unsuspend, approve or reject an account
    Status {
        id: String,
        #[arg(long, value_enum)]
        action: ActionArg,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub password: String,
    #[arg(long, default_value = "passenger", value_parser = ["passenger", "rider", "admin"])]
    pub role: String,
}

impl From<CreateUserArgs> for NewUser {
    fn from(a: CreateUserArgs) -> Self {
        NewUser { full_name: a.full_name, email: a.email, phone: a.phone, password: a.password, role: a.role }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionArg {
    Suspend,
    Unsuspend,
    Approve,
    Reject,
}

impl From<ActionArg> for UserAction {
    fn from(a: ActionArg) -> Self {
        match a {
            ActionArg::Suspend => UserAction::Suspend,
            ActionArg::Unsuspend => UserAction::Unsuspend,
            ActionArg::Approve => UserAction::Approve,
            ActionArg::Reject => UserAction::Reject,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum RidesCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, value_parser = ["pending", "accepted", "in_progress", "completed", "cancelled"])]
        status: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PaymentsCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long, value_parser = ["successful", "pending", "failed"])]
        status: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LogsCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "type", value_parser = ["system", "alert"])]
        kind: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    /// Change some fare settings; unspecified fields keep their current value
    Update(SettingsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    #[arg(long)]
    pub base_fare: Option<f64>,
    #[arg(long)]
    pub per_km_rate: Option<f64>,
    #[arg(long)]
    pub service_fee_percent: Option<f64>,
    #[arg(long)]
    pub cancellation_fee: Option<f64>,
    #[arg(long)]
    pub currency: Option<String>,
}

impl From<SettingsArgs> for SettingsForm {
    fn from(a: SettingsArgs) -> Self {
        SettingsForm {
            base_fare: a.base_fare,
            per_km_rate: a.per_km_rate,
            service_fee_percent: a.service_fee_percent,
            cancellation_fee: a.cancellation_fee,
            currency: a.currency,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum MapCommand {
    /// Poll the live map and print each refresh
    Watch {
        /// Seconds between refreshes (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many refreshes
        #[arg(long)]
        ticks: Option<u32>,
    },
}
