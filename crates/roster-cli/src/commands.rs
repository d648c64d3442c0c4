use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _};
use colored::Colorize;
use roster_sdk::{
    erase_all, register, Account, Friend, KeyValueSlots, RosterConfig, SdkError, SdkResult,
    Session, TieredStore, View,
};
use roster_server::{RosterServer, ServerConfig};

use crate::cli::*;

/// Local slots live here unless the configuration says otherwise.
const DEFAULT_CACHE_DIR: &str = ".roster";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let open = || Context::open(cli.config.as_deref());
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Register(args) => cmd_register(&open()?, args).await,
        Command::Login(args) => cmd_login(&open()?, args).await,
        Command::Logout => cmd_logout(&open()?).await,
        Command::Whoami => cmd_whoami(&open()?).await,
        Command::Guest => {
            let session = open()?.session(true).await?;
            print_account(&session.account().await?);
            Ok(())
        }
        Command::Section(args) => cmd_section(&open()?, cli.guest, args).await,
        Command::Friend(args) => cmd_friend(&open()?, cli.guest, args).await,
        Command::Watch => cmd_watch(&open()?).await,
        Command::Erase(args) => cmd_erase(&open()?, args).await,
    }
}

struct Context {
    store: Arc<TieredStore>,
    slots: Arc<dyn KeyValueSlots>,
}

impl Context {
    fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => RosterConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => RosterConfig::default(),
        }
        .with_env_overrides();
        if config.cache_dir.is_none() {
            config.cache_dir = Some(PathBuf::from(DEFAULT_CACHE_DIR));
        }
        let slots = config.open_slots()?;
        let store = Arc::new(config.build_store(slots.clone())?);
        Ok(Self { store, slots })
    }

    async fn session(&self, guest: bool) -> anyhow::Result<Session> {
        if guest {
            return Ok(Session::guest(self.store.clone(), self.slots.clone()));
        }
        Session::resume(self.store.clone(), self.slots.clone())
            .await?
            .context("not logged in (run `roster login <passcode>` or pass --guest)")
    }
}

/// Turn "saved locally only" into a warning; everything else stays an error.
fn saved<T>(result: SdkResult<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(SdkError::NotPersisted(e)) => {
            println!("{} kept locally, remote save failed: {}", "!".yellow().bold(), e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_register(ctx: &Context, args: RegisterArgs) -> anyhow::Result<()> {
    if saved(register(&ctx.store, &args.username, &args.passcode).await)?.is_some() {
        println!("{} Registered {}", "✓".green().bold(), args.username.trim().bold());
    }
    Ok(())
}

async fn cmd_login(ctx: &Context, args: LoginArgs) -> anyhow::Result<()> {
    let session = Session::login(ctx.store.clone(), ctx.slots.clone(), &args.passcode).await?;
    let account = session.account().await?;
    println!("{} Logged in as {}", "✓".green().bold(), account.username.bold());
    Ok(())
}

async fn cmd_logout(ctx: &Context) -> anyhow::Result<()> {
    match Session::resume(ctx.store.clone(), ctx.slots.clone()).await? {
        Some(session) => {
            session.logout().await?;
            println!("{} Logged out", "✓".green());
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

async fn cmd_whoami(ctx: &Context) -> anyhow::Result<()> {
    match Session::resume(ctx.store.clone(), ctx.slots.clone()).await? {
        Some(session) => print_account(&session.account().await?),
        None => println!("Not logged in."),
    }
    Ok(())
}

async fn cmd_section(ctx: &Context, guest: bool, args: SectionArgs) -> anyhow::Result<()> {
    let session = ctx.session(guest).await?;
    match args.action {
        SectionAction::Add { name } => {
            if saved(session.add_section(&name).await)?.is_some() {
                println!("{} Added section {}", "✓".green(), name.trim().yellow());
            }
        }
        SectionAction::Delete { name } => {
            if let Some(dropped) = saved(session.delete_section(&name).await)? {
                println!(
                    "{} Deleted section {} ({} friends removed)",
                    "✓".green(),
                    name.trim().yellow(),
                    dropped
                );
            }
        }
        SectionAction::List => {
            let summaries = session.section_summaries().await?;
            if summaries.is_empty() {
                println!("No sections.");
            }
            for s in summaries {
                println!("  {} ({})", s.name.yellow().bold(), s.friends);
            }
        }
    }
    Ok(())
}

async fn cmd_friend(ctx: &Context, guest: bool, args: FriendArgs) -> anyhow::Result<()> {
    let session = ctx.session(guest).await?;
    match args.action {
        FriendAction::Add { name, id, section } => {
            if let Some(friend) = saved(session.add_friend(&name, &id, &section).await)? {
                println!("{} Added {}", "✓".green(), describe(&friend));
            }
        }
        FriendAction::Delete { id } => {
            if let Some(removed) = saved(session.delete_friend(&id).await)? {
                if removed == 0 {
                    println!("No friend with ID {}.", id.cyan());
                } else {
                    println!("{} Removed {}", "✓".green(), id.cyan());
                }
            }
        }
        FriendAction::Move { dragged, target } => {
            if saved(session.move_friend(&dragged, &target).await)?.is_some() {
                println!("{} Moved {} to {}'s position", "✓".green(), dragged.cyan(), target.cyan());
            }
        }
        FriendAction::List { section, unsectioned } => {
            let view = match (section, unsectioned) {
                (Some(name), _) => View::Section(name),
                (None, true) => View::Unsectioned,
                (None, false) => View::All,
            };
            let friends = session.friends(view).await?;
            if friends.is_empty() {
                println!("No friends.");
            }
            for friend in &friends {
                println!("  {}", describe(friend));
            }
        }
    }
    Ok(())
}

async fn cmd_watch(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.session(false).await?;
    session.watch(|account: &Account| {
        println!(
            "{} {}: {} sections, {} friends",
            "↻".blue(),
            account.username.bold(),
            account.sections.len(),
            account.friends.len()
        );
    });
    println!("Watching for changes. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await?;
    Ok(())
}

async fn cmd_erase(ctx: &Context, args: EraseArgs) -> anyhow::Result<()> {
    if !args.yes {
        bail!("refusing to erase every account without --yes");
    }
    if saved(erase_all(&ctx.store, ctx.slots.as_ref()).await)?.is_some() {
        println!("{} All accounts erased", "✓".green().bold());
    }
    Ok(())
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.server_config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind.parse().with_context(|| format!("invalid bind address {bind}"))?;
    }
    if args.data_dir.is_some() {
        config.data_dir = args.data_dir;
    }
    println!("Roster server on {}", config.bind_addr.to_string().bold());
    RosterServer::new(config)?.serve().await?;
    Ok(())
}

fn describe(friend: &Friend) -> String {
    match friend.section() {
        Some(section) => format!("{} [{}] in {}", friend.name.bold(), friend.id.cyan(), section.yellow()),
        None => format!("{} [{}]", friend.name.bold(), friend.id.cyan()),
    }
}

fn print_account(account: &Account) {
    println!("{}", account.username.bold());
    println!("  Sections: {}", account.sections.len());
    println!("  Friends: {}", account.friends.len());
}
