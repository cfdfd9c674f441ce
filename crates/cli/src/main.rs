use std::process::ExitCode;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{Amount, Engine, Filter, MembershipRole, NewBankTransaction, Target};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use crate::{config::Settings, error::Result};

mod config;
mod error;
mod render;

#[derive(Parser, Debug)]
#[command(name = "householdbook")]
#[command(about = "Household double-entry bookkeeping: match bank transactions, report by category")]
struct Cli {
    #[command(flatten)]
    globals: Globals,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
pub(crate) struct Globals {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub(crate) config: Option<String>,
    /// Override the database connection string.
    #[arg(long, global = true)]
    pub(crate) database_url: Option<String>,
    /// Override the log level (e.g. debug).
    #[arg(long, global = true)]
    pub(crate) log_level: Option<String>,
    /// Acting username.
    #[arg(long, global = true)]
    pub(crate) user: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations.
    Migrate,
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Ledger(LedgerCommand),
    #[command(subcommand)]
    BankAccount(BankAccountCommand),
    #[command(subcommand)]
    Category(CategoryCommand),
    #[command(subcommand)]
    Matcher(MatcherCommand),
    #[command(subcommand)]
    Transaction(TransactionCommand),
    /// Book a bank transaction with a matcher.
    Match(MatchArgs),
    /// Print the category rapport of a period.
    Rapport(RapportArgs),
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create {
        #[arg(long)]
        username: String,
    },
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// Create a ledger owned by the acting user.
    Create {
        #[arg(long)]
        name: String,
    },
    /// Add or update a member (owner only).
    Member {
        #[arg(long)]
        ledger: Uuid,
        #[arg(long)]
        member: String,
        /// owner, editor or viewer.
        #[arg(long)]
        role: MembershipRole,
    },
}

#[derive(Subcommand, Debug)]
enum BankAccountCommand {
    Create {
        #[arg(long)]
        ledger: Uuid,
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create {
        #[arg(long)]
        ledger: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        parent: Option<Uuid>,
    },
}

#[derive(Subcommand, Debug)]
enum MatcherCommand {
    Create {
        #[arg(long)]
        ledger: Uuid,
        #[arg(long)]
        name: String,
        /// JSON array, e.g. `[{"kind":"description_contains","text":"rent"}]`.
        #[arg(long, default_value = "[]")]
        filters: String,
        #[arg(long, default_value = engine::MULTIPLE_CATEGORIES_BOOKING)]
        target_kind: String,
        /// JSON payload, e.g. `{"debit_rules":[...],"credit_rules":[...]}`.
        #[arg(long)]
        target: String,
    },
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    /// Record a bank transaction (positive amounts are incoming).
    Record {
        #[arg(long)]
        ledger: Uuid,
        #[arg(long)]
        bank_account: Uuid,
        /// Decimal amount, e.g. `-42.10`.
        #[arg(long, allow_hyphen_values = true)]
        amount: Amount,
        #[arg(long)]
        description: String,
        #[arg(long)]
        counterparty: Option<String>,
        /// `YYYY-MM-DD` or RFC 3339; defaults to now.
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
    },
    /// List matchers applicable to a transaction.
    Suggest {
        #[arg(long)]
        ledger: Uuid,
        #[arg(long)]
        bank_account: Uuid,
        #[arg(long)]
        transaction: Uuid,
    },
}

#[derive(Args, Debug)]
struct MatchArgs {
    #[arg(long)]
    ledger: Uuid,
    #[arg(long)]
    bank_account: Uuid,
    #[arg(long)]
    transaction: Uuid,
    #[arg(long)]
    matcher: Uuid,
}

#[derive(Args, Debug)]
struct RapportArgs {
    #[arg(long)]
    ledger: Uuid,
    /// Inclusive start, `YYYY-MM-DD` or RFC 3339.
    #[arg(long, value_parser = parse_instant)]
    from: DateTime<Utc>,
    /// Exclusive end, `YYYY-MM-DD` or RFC 3339.
    #[arg(long, value_parser = parse_instant)]
    to: DateTime<Utc>,
    /// Restrict to these categories and their descendants (repeatable).
    #[arg(long = "top")]
    top: Vec<Uuid>,
    /// List contributing records under each category.
    #[arg(long)]
    entries: bool,
}

fn parse_instant(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
        .ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD or RFC 3339"))
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn run(settings: Settings, command: Command) -> Result<()> {
    let db = connect_db(&settings.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match command {
        Command::Migrate => println!("database is up to date"),
        Command::User(UserCommand::Create { username }) => {
            let username = engine.new_user(&username).await?;
            println!("created user: {username}");
        }
        Command::Ledger(LedgerCommand::Create { name }) => {
            let id = engine.new_ledger(&name, settings.acting_user()?).await?;
            println!("created ledger: {name} ({id})");
        }
        Command::Ledger(LedgerCommand::Member {
            ledger,
            member,
            role,
        }) => {
            engine
                .upsert_ledger_member(ledger, &member, role, settings.acting_user()?)
                .await?;
            println!("{member} is now {role} of {ledger}");
        }
        Command::BankAccount(BankAccountCommand::Create { ledger, name }) => {
            let id = engine
                .new_bank_account(ledger, &name, settings.acting_user()?)
                .await?;
            println!("created bank account: {name} ({id})");
        }
        Command::Category(CategoryCommand::Create {
            ledger,
            name,
            description,
            parent,
        }) => {
            let id = engine
                .new_category(
                    ledger,
                    &name,
                    description.as_deref(),
                    parent,
                    settings.acting_user()?,
                )
                .await?;
            println!("created category: {name} ({id})");
        }
        Command::Matcher(MatcherCommand::Create {
            ledger,
            name,
            filters,
            target_kind,
            target,
        }) => {
            let filters: Vec<Filter> = serde_json::from_str(&filters)?;
            let target = Target::from_storage(&target_kind, &target)?;
            let id = engine
                .new_matcher(ledger, &name, filters, target, settings.acting_user()?)
                .await?;
            println!("created matcher: {name} ({id})");
        }
        Command::Transaction(TransactionCommand::Record {
            ledger,
            bank_account,
            amount,
            description,
            counterparty,
            at,
        }) => {
            let input = NewBankTransaction {
                occurred_at: at.unwrap_or_else(Utc::now),
                amount_minor: amount.minor(),
                description,
                counterparty,
            };
            let id = engine
                .record_bank_transaction(ledger, bank_account, input, settings.acting_user()?)
                .await?;
            println!("recorded transaction {amount} ({id})");
        }
        Command::Transaction(TransactionCommand::Suggest {
            ledger,
            bank_account,
            transaction,
        }) => {
            let matchers = engine
                .suggest_matchers(settings.acting_user()?, ledger, bank_account, transaction)
                .await?;
            if matchers.is_empty() {
                println!("no applicable matcher");
            }
            for matcher in matchers {
                println!("{}  {}  [{}]", matcher.id, matcher.name, matcher.target.kind());
            }
        }
        Command::Match(args) => {
            let booking_id = engine
                .execute_match(
                    settings.acting_user()?,
                    args.ledger,
                    args.bank_account,
                    args.transaction,
                    args.matcher,
                )
                .await?;
            let booking = engine
                .booking(settings.acting_user()?, args.ledger, booking_id)
                .await?;
            println!("created booking {booking_id}");
            for record in &booking.records {
                let marker = if record.matched.is_some() { " *" } else { "" };
                println!(
                    "  {}  {:>12}{marker}",
                    record.category_id,
                    Amount::from_minor(record.amount_minor).to_string()
                );
            }
        }
        Command::Rapport(args) => {
            let leaves = engine
                .build_rapport(
                    settings.acting_user()?,
                    args.ledger,
                    args.from,
                    args.to,
                    &args.top,
                )
                .await?;
            print!("{}", render::rapport(&leaves, args.entries));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match config::load(&cli.globals) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "householdbook={level},engine={level},migration={level}",
            level = settings.log_level
        ))
        .with_writer(std::io::stderr)
        .init();

    match run(settings, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(?err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
