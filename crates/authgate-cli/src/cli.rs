use authgate_client_core::MatchMode;
use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::SecretString;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(
        short = 's',
        long = "stdout",
        action,
        global = true,
        help = "Controls if it logs to stdout/stderr instead of to a file"
    )]
    pub is_to_std_out: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows whether a user is logged in and what they may do
    Status,
    /// Logs in and caches the session for later commands
    Login(LoginArgs),
    /// Clears the cached session and notifies the backend
    Logout,
    /// Prints the profile of the logged in user as JSON
    Whoami,
    /// Checks the cached session against required permissions and roles.
    /// Exits with a failure code unless access is granted.
    Check(CheckArgs),
    /// Checks that the auth backend is reachable
    Health,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,
    #[arg(short, long, env = "AUTHGATE_PASSWORD", hide_env_values = true)]
    pub password: SecretString,
    #[arg(short, long)]
    pub tenant: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Required permission, may be repeated
    #[arg(short, long = "permission")]
    pub permissions: Vec<String>,
    /// Required role, may be repeated
    #[arg(short, long = "role")]
    pub roles: Vec<String>,
    #[arg(short, long, value_enum, default_value_t = ModeArg::Any)]
    pub mode: ModeArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Any,
    All,
}

impl From<ModeArg> for MatchMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Any => MatchMode::Any,
            ModeArg::All => MatchMode::All,
        }
    }
}
