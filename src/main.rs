use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use networth::AppCommand;
use networth::cli::manage::NewHolding;
use networth::core::holding::{Category, EntryUpdate, TrackingUpdate};
use networth::core::log::init_logging;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Owner (device or user key) to act for, overriding the configuration
    #[arg(short, long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct AddArgs {
    /// Display name
    name: String,
    /// e.g. cash, stock, crypto, real_estate, gold, credit_card, mortgage
    #[arg(long)]
    category: Category,
    /// Value in the entry currency
    #[arg(long)]
    amount: Decimal,
    /// ISO 4217 code of the amount
    #[arg(long)]
    currency: String,
    /// Ticker or coin symbol for market-tracked holdings
    #[arg(long, requires = "quantity")]
    symbol: Option<String>,
    /// Units held of the tracked symbol
    #[arg(long, requires = "symbol")]
    quantity: Option<Decimal>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Args)]
struct EditArgs {
    id: Uuid,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    category: Option<Category>,
    #[arg(long)]
    amount: Option<Decimal>,
    #[arg(long)]
    currency: Option<String>,
    /// Start (or change) market tracking
    #[arg(long, requires = "quantity")]
    symbol: Option<String>,
    #[arg(long, requires = "symbol")]
    quantity: Option<Decimal>,
    /// Stop market tracking
    #[arg(long, conflicts_with = "symbol")]
    untrack: bool,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display net worth and totals per category
    Summary {
        /// Base currency, defaults to the configured one
        #[arg(long)]
        currency: Option<String>,
    },
    /// List holdings grouped by category with converted values
    Holdings {
        /// Base currency, defaults to the configured one
        #[arg(long)]
        currency: Option<String>,
    },
    /// Fetch fresh market prices for tracked holdings
    Refresh {
        /// Only these holdings
        ids: Vec<Uuid>,
    },
    /// Add a holding
    Add(AddArgs),
    /// Edit the entry fields of a holding
    Edit(EditArgs),
    /// Delete a holding
    Remove { id: Uuid },
    /// List supported currencies and categories
    Metadata,
}

impl From<AddArgs> for NewHolding {
    fn from(args: AddArgs) -> Self {
        NewHolding {
            name: args.name,
            category: args.category,
            amount: args.amount,
            currency: args.currency,
            symbol: args.symbol,
            quantity: args.quantity,
            notes: args.notes,
        }
    }
}

impl From<EditArgs> for AppCommand {
    fn from(args: EditArgs) -> Self {
        let tracking = match (args.symbol, args.quantity, args.untrack) {
            (Some(symbol), Some(quantity), _) => Some(TrackingUpdate::Track { symbol, quantity }),
            (_, _, true) => Some(TrackingUpdate::Untrack),
            _ => None,
        };
        AppCommand::Edit {
            id: args.id,
            update: EntryUpdate {
                name: args.name,
                category: args.category,
                entry_amount: args.amount,
                entry_currency: args.currency,
                tracking,
                notes: args.notes,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => networth::cli::setup::setup(),
        Some(Commands::Metadata) => {
            networth::cli::metadata::run();
            Ok(())
        }
        Some(cmd) => {
            let command = match cmd {
                Commands::Summary { currency } => AppCommand::Summary { currency },
                Commands::Holdings { currency } => AppCommand::Holdings { currency },
                Commands::Refresh { ids } => AppCommand::Refresh { ids },
                Commands::Add(args) => AppCommand::Add(args.into()),
                Commands::Edit(args) => args.into(),
                Commands::Remove { id } => AppCommand::Remove { id },
                Commands::Setup | Commands::Metadata => return Ok(()),
            };
            networth::run_command(command, cli.config_path.as_deref(), cli.owner.as_deref()).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
