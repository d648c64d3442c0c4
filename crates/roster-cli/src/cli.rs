use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "roster",
    about = "Roster: shared friend lists for game communities",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Act on the local guest account instead of the logged-in one
    #[arg(long, global = true)]
    pub guest: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an account
    Register(RegisterArgs),
    /// Log in with a passcode
    Login(LoginArgs),
    /// Forget the current login
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Show the local guest account
    Guest,
    /// Manage sections
    Section(SectionArgs),
    /// Manage friends
    Friend(FriendArgs),
    /// Follow remote changes to the logged-in account
    Watch,
    /// Delete every account, locally and remotely
    Erase(EraseArgs),
    /// Host the fallback JSON endpoint
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct RegisterArgs {
    pub username: String,
    pub passcode: String,
}

#[derive(Args)]
pub struct LoginArgs {
    pub passcode: String,
}

#[derive(Args)]
pub struct SectionArgs {
    #[command(subcommand)]
    pub action: SectionAction,
}

#[derive(Subcommand)]
pub enum SectionAction {
    Add { name: String },
    Delete { name: String },
    List,
}

#[derive(Args)]
pub struct FriendArgs {
    #[command(subcommand)]
    pub action: FriendAction,
}

#[derive(Subcommand)]
pub enum FriendAction {
    Add {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        id: String,
        #[arg(short, long, default_value = "")]
        section: String,
    },
    Delete { id: String },
    /// Move a friend to another friend's position
    Move { dragged: String, target: String },
    List {
        #[arg(short, long, conflicts_with = "unsectioned")]
        section: Option<String>,
        #[arg(long)]
        unsectioned: bool,
    },
}

#[derive(Args)]
pub struct EraseArgs {
    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Server TOML configuration file
    #[arg(long)]
    pub server_config: Option<PathBuf>,
}
