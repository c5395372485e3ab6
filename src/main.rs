use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use billetera::cli::{
    handle_account_command, handle_audit_command, handle_budget_command,
    handle_calendar_command, handle_category_command, handle_expense_command,
    handle_export_command, handle_goal_command, handle_income_command, handle_movement_command,
    handle_recurring_command, handle_rule_command, handle_scheduled_command,
    handle_statement_command, handle_transfer_command,
};
use billetera::config::{BilleteraPaths, Settings};
use billetera::events::ChangedTopics;
use billetera::storage::{initialize_storage, Storage};

/// Environment variable holding the log filter
const LOG_ENV: &str = "BILLETERA_LOG";

#[derive(Parser)]
#[command(
    name = "billetera",
    version,
    about = "Personal finance tracking for pesos and dollars",
    long_about = "Billetera records income, expenses and transfers across cash, bank \
                  and credit-card accounts in ARS and USD. It follows card statements \
                  and installment purchases, tracks budgets and saving goals, and \
                  handles recurring and scheduled movements."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory with default categories
    Init,

    /// Show current configuration and paths
    Config,

    /// Account management commands
    #[command(subcommand)]
    Account(billetera::cli::AccountCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(billetera::cli::CategoryCommands),

    /// Record an income
    Income(billetera::cli::IncomeArgs),

    /// Record an expense
    #[command(alias = "gasto")]
    Expense(billetera::cli::ExpenseArgs),

    /// Move money between accounts
    Transfer(billetera::cli::TransferArgs),

    /// List, edit and delete movements
    #[command(subcommand, alias = "mov")]
    Movement(billetera::cli::MovementCommands),

    /// Credit-card statements and payments
    #[command(subcommand)]
    Statement(billetera::cli::StatementCommands),

    /// Monthly budgets
    #[command(subcommand)]
    Budget(billetera::cli::BudgetCommands),

    /// Saving goals
    #[command(subcommand)]
    Goal(billetera::cli::GoalCommands),

    /// Recurring incomes and expenses
    #[command(subcommand)]
    Recurring(billetera::cli::RecurringCommands),

    /// One-off movements planned for a future date
    #[command(subcommand)]
    Scheduled(billetera::cli::ScheduledCommands),

    /// Auto-categorization rules
    #[command(subcommand)]
    Rule(billetera::cli::RuleCommands),

    /// Month view of movements and upcoming events
    Calendar(billetera::cli::CalendarArgs),

    /// Export data
    #[command(subcommand)]
    Export(billetera::cli::ExportCommands),

    /// Show recent changes from the audit log
    Audit(billetera::cli::AuditArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let paths = BilleteraPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    let command = match cli.command {
        Some(Commands::Init) => {
            println!("Initializing Billetera at: {}", paths.base_dir().display());
            initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Default income and expense categories have been created.");
            println!("Run 'billetera category list' to see them.");
            return Ok(());
        }
        Some(Commands::Config) => {
            println!("Billetera Configuration");
            println!("=======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Display currency: {}", settings.display_currency);
            println!("  ARS per USD:      {}", settings.exchange_rates.ars_per_usd);
            println!("  Date format:      {}", settings.date_format);
            println!("  Max installments: {}", settings.max_installments);
            return Ok(());
        }
        Some(command) => command,
        None => {
            println!("Billetera - personal finance tracking");
            println!();
            println!("Run 'billetera --help' for usage information.");
            println!("Run 'billetera init' to get started.");
            return Ok(());
        }
    };

    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;
    let changes = ChangedTopics::attach(storage.events())?;

    match command {
        Commands::Account(cmd) => handle_account_command(&storage, &settings, cmd)?,
        Commands::Category(cmd) => handle_category_command(&storage, &settings, cmd)?,
        Commands::Income(args) => {
            handle_income_command(&storage, &mut settings, args)?;
            settings.save(&paths)?;
        }
        Commands::Expense(args) => {
            handle_expense_command(&storage, &mut settings, args)?;
            settings.save(&paths)?;
        }
        Commands::Transfer(args) => {
            handle_transfer_command(&storage, &mut settings, args)?;
            settings.save(&paths)?;
        }
        Commands::Movement(cmd) => {
            handle_movement_command(&storage, &mut settings, cmd)?;
            settings.save(&paths)?;
        }
        Commands::Statement(cmd) => handle_statement_command(&storage, &settings, cmd)?,
        Commands::Budget(cmd) => handle_budget_command(&storage, cmd)?,
        Commands::Goal(cmd) => handle_goal_command(&storage, &settings, cmd)?,
        Commands::Recurring(cmd) => handle_recurring_command(&storage, &settings, cmd)?,
        Commands::Scheduled(cmd) => handle_scheduled_command(&storage, &settings, cmd)?,
        Commands::Rule(cmd) => handle_rule_command(&storage, &settings, cmd)?,
        Commands::Calendar(args) => handle_calendar_command(&storage, args)?,
        Commands::Export(cmd) => handle_export_command(&storage, &settings, cmd)?,
        Commands::Audit(args) => handle_audit_command(&storage, args)?,
        Commands::Init | Commands::Config => {}
    }

    if !changes.is_empty() {
        info!(topics = ?changes.topics(), "data changed");
    }
    Ok(())
}
