//! Subcommands

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Subcommand;
use ez_directory_backend::Credential;
use ez_directory_core::types::{BitlockerRecoveryRecord, DirectoryAccount};
use ez_directory_core::utils::parse_locked_listing;
use ez_directory_core::{
    AccountService, BitlockerService, GroupService, IdentityQuery, ServiceContext, UnlockService,
};
use futures::StreamExt;
use serde::Serialize;

#[derive(Subcommand)]
pub enum Command {
    /// Search accounts by identity fragments (prefix match)
    Search {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        employee_id: Option<String>,
        #[arg(long)]
        username: Option<String>,
    },
    /// Show one account by exact username
    User { username: String },
    /// List locked accounts
    Locked {
        /// Parse a saved `Search-ADAccount -LockedOut` listing instead of querying
        #[arg(long)]
        listing: Option<PathBuf>,
    },
    /// Check an account on every domain controller and clear any lockout
    Unlock { username: String },
    /// List the groups an account is a member of
    Groups { username: String },
    /// Find groups by name fragment
    FindGroup { fragment: String },
    /// List domain controllers
    Controllers,
    /// Look up BitLocker recovery keys
    Bitlocker {
        /// Key id fragment
        #[arg(long, conflicts_with = "computer", required_unless_present = "computer")]
        key_id: Option<String>,
        /// Computer name
        #[arg(long)]
        computer: Option<String>,
    },
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn account_line(account: &DirectoryAccount) -> String {
    let mut flags = Vec::new();
    if account.is_locked_out {
        flags.push("locked");
    }
    if !account.is_active() {
        flags.push("disabled");
    }
    if account.is_expired() {
        flags.push("expired");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    format!(
        "{:<20} {:<30} {}{flags}",
        account.username,
        account.display_name,
        account.location()
    )
}

fn recovery_line(record: &BitlockerRecoveryRecord) -> String {
    let created = record
        .created
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "{:<16} {:<36} {} {created}",
        record.computer_name, record.key_id, record.recovery_password
    )
}

pub async fn run(
    ctx: Arc<ServiceContext>,
    command: Command,
    credential: Option<&Credential>,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Command::Search {
            first_name,
            last_name,
            employee_id,
            username,
        } => {
            let query = IdentityQuery {
                first_name,
                last_name,
                employee_id,
                username,
                ..IdentityQuery::default()
            };
            if query.is_empty() {
                bail!("give at least one of --first-name, --last-name, --employee-id, --username");
            }
            let accounts = AccountService::new(ctx)
                .search_users(&query, credential)
                .await?;
            if json {
                return print_json(&accounts);
            }
            for account in &accounts {
                println!("{}", account_line(account));
            }
            tracing::info!("{} accounts found", accounts.len());
        }

        Command::User { username } => {
            let account = AccountService::new(ctx)
                .find_user(&username, credential)
                .await?;
            if json {
                return print_json(&account);
            }
            println!("{}", account_line(&account));
            println!("  path:          {}", account.path);
            println!("  manager:       {}", account.manager);
            println!("  bad passwords: {}", account.bad_password_count);
            println!("  flags:         {:?}", account.account_control);
        }

        Command::Locked { listing: Some(path) } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let names = parse_locked_listing(&text);
            if json {
                return print_json(&names);
            }
            for name in names {
                println!("{name}");
            }
        }

        Command::Locked { listing: None } => {
            let accounts = AccountService::new(ctx)
                .get_all_locked_users(credential)
                .await?;
            if json {
                return print_json(&accounts);
            }
            for account in &accounts {
                println!("{}", account_line(account));
            }
        }

        Command::Unlock { username } => {
            let mut results = UnlockService::new(ctx)
                .unlock_everywhere(&username, credential)
                .await?;
            let (mut total, mut unlocked, mut failed) = (0, 0, 0);
            while let Some(result) = results.next().await {
                total += 1;
                if result.was_unlocked {
                    unlocked += 1;
                }
                if result.is_failure() {
                    failed += 1;
                }
                if json {
                    // one object per line as results arrive
                    println!("{}", serde_json::to_string(&result)?);
                } else if let Some(error) = result.error.as_deref() {
                    println!("{} ({error})", result.message);
                } else {
                    println!("{}", result.message);
                }
            }
            tracing::info!("{total} controllers checked, {unlocked} unlocked, {failed} failed");
        }

        Command::Groups { username } => {
            let accounts = AccountService::new(ctx);
            let account = accounts.find_user(&username, credential).await?;
            let groups = accounts.get_groups(&account.path, credential).await?;
            if json {
                return print_json(&groups);
            }
            for group in groups {
                println!("{}", group.name);
            }
        }

        Command::FindGroup { fragment } => {
            let groups = GroupService::new(ctx).find(&fragment, credential).await?;
            if json {
                return print_json(&groups);
            }
            for group in groups {
                match group.description {
                    Some(description) => println!("{:<30} {description}", group.name),
                    None => println!("{}", group.name),
                }
            }
        }

        Command::Controllers => {
            let controllers = UnlockService::new(ctx)
                .discover_controllers(credential)
                .await?;
            if json {
                return print_json(&controllers);
            }
            for controller in controllers {
                println!("{controller}");
            }
        }

        Command::Bitlocker { key_id, computer } => {
            let service = BitlockerService::new(ctx);
            let records = match (key_id, computer) {
                (Some(key_id), _) => service.find_by_key_id(&key_id, credential).await?,
                (None, Some(computer)) => {
                    service.find_by_computer_name(&computer, credential).await?
                }
                (None, None) => bail!("give --key-id or --computer"),
            };
            if json {
                return print_json(&records);
            }
            for record in &records {
                println!("{}", recovery_line(record));
            }
        }
    }
    Ok(())
}
