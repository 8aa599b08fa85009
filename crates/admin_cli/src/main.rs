use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{CategoryReport, Engine, Group, MoneyCents, NewExpense, parse_id};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "settleup_admin")]
#[command(about = "Admin utilities for SettleUp (groups, expenses, settlements)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./settleup.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Group(GroupArgs),
    Expense(ExpenseArgs),
    /// Reset every balance of a group to zero.
    Settle(SettleArgs),
    /// Print balances and settlements per expense category.
    Categories(GroupRef),
}

#[derive(Args, Debug)]
struct GroupArgs {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    Create(GroupCreateArgs),
    List,
    Show(GroupShowArgs),
    Delete(GroupDeleteArgs),
}

#[derive(Args, Debug)]
struct GroupCreateArgs {
    #[arg(long)]
    name: String,
    /// Repeat for every member, at least two.
    #[arg(long = "member", required = true)]
    members: Vec<String>,
}

#[derive(Args, Debug)]
struct GroupShowArgs {
    #[arg(long)]
    id: String,
}

#[derive(Args, Debug)]
struct GroupDeleteArgs {
    #[arg(long)]
    id: String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct GroupRef {
    #[arg(long)]
    group: String,
}

#[derive(Args, Debug)]
struct SettleArgs {
    #[arg(long)]
    group: String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct ExpenseArgs {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add(ExpenseAddArgs),
    Delete(ExpenseDeleteArgs),
    List(GroupRef),
}

#[derive(Args, Debug)]
struct ExpenseAddArgs {
    #[arg(long)]
    group: String,
    #[arg(long)]
    title: String,
    /// Amount in units, e.g. `12.50` or `12,50`.
    #[arg(long)]
    amount: MoneyCents,
    #[arg(long)]
    paid_by: String,
    /// Repeat for every member sharing the expense.
    #[arg(long = "split", required = true)]
    split_between: Vec<String>,
    #[arg(long)]
    category: Option<String>,
}

#[derive(Args, Debug)]
struct ExpenseDeleteArgs {
    #[arg(long)]
    group: String,
    #[arg(long)]
    id: String,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Asks a yes/no question on stderr; anything but `y` means no.
fn confirm(prompt: &str) -> Result<bool, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(format!("{prompt} [y/N] "))
    )?;
    out.flush()?;

    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        let answer = match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => true,
            KeyCode::Char(_) | KeyCode::Enter | KeyCode::Esc => false,
            _ => continue,
        };

        execute!(out, Print(if answer { "y\r\n" } else { "n\r\n" }))?;
        out.flush()?;
        return Ok(answer);
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_group(group: &Group) {
    println!("{} ({})", group.name, group.id);
    println!("  total: {}", group.total);
    for (member, balance) in group.balances.iter() {
        println!("  {member}: {balance}");
    }
}

fn print_report(label: &str, report: &CategoryReport) {
    println!("{label} (total {})", report.total);
    for (member, balance) in report.balances.iter() {
        println!("  {member}: {balance}");
    }
    for settlement in &report.settlements {
        println!(
            "  {} -> {}: {}",
            settlement.from, settlement.to, settlement.amount
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Group(GroupArgs { command }) => match command {
            GroupCommand::Create(args) => {
                let group = engine.create_group(&args.name, &args.members).await?;
                println!("created group: {} ({})", group.name, group.id);
            }
            GroupCommand::List => {
                for group in engine.list_groups().await? {
                    println!(
                        "{}  {}  {} members  total {}",
                        group.id,
                        group.name,
                        group.members.len(),
                        group.total
                    );
                }
            }
            GroupCommand::Show(args) => {
                let group_id = parse_id(&args.id, "group")?;
                let group = engine.group(group_id).await?;
                print_group(&group);

                let settlements = engine.settlements(group_id).await?;
                if !settlements.is_empty() {
                    println!("settlements:");
                }
                for settlement in settlements {
                    println!(
                        "  {} -> {}: {}",
                        settlement.from, settlement.to, settlement.amount
                    );
                }
            }
            GroupCommand::Delete(args) => {
                let group_id = parse_id(&args.id, "group")?;
                let group = engine.group(group_id).await?;
                if !args.yes && !confirm(&format!("delete group {}?", group.name))? {
                    eprintln!("aborted");
                    std::process::exit(1);
                }
                engine.delete_group(group_id).await?;
                println!("deleted group: {}", group.name);
            }
        },
        Command::Expense(ExpenseArgs { command }) => match command {
            ExpenseCommand::Add(args) => {
                let group_id = parse_id(&args.group, "group")?;
                let expense = engine
                    .add_expense(
                        group_id,
                        NewExpense {
                            title: args.title,
                            amount: args.amount,
                            paid_by: args.paid_by,
                            split_between: args.split_between,
                            category: args.category,
                        },
                    )
                    .await?;
                println!(
                    "added expense: {} {} [{}] ({})",
                    expense.title, expense.amount, expense.category, expense.id
                );
            }
            ExpenseCommand::Delete(args) => {
                let group_id = parse_id(&args.group, "group")?;
                let expense_id = parse_id(&args.id, "expense")?;
                engine.delete_expense(group_id, expense_id).await?;
                println!("deleted expense: {expense_id}");
            }
            ExpenseCommand::List(args) => {
                let group_id = parse_id(&args.group, "group")?;
                for expense in engine.list_expenses(group_id).await? {
                    let split: Vec<&str> =
                        expense.split_between.iter().map(|m| m.as_str()).collect();
                    println!(
                        "{}  {}  {}  paid by {}  split {}  [{}]",
                        expense.id,
                        expense.title,
                        expense.amount,
                        expense.paid_by,
                        split.join(", "),
                        expense.category
                    );
                }
            }
        },
        Command::Settle(args) => {
            let group_id = parse_id(&args.group, "group")?;
            let group = engine.group(group_id).await?;
            if !args.yes && !confirm(&format!("reset every balance of {}?", group.name))? {
                eprintln!("aborted");
                std::process::exit(1);
            }
            let group = engine.settle_group(group_id).await?;
            print_group(&group);
        }
        Command::Categories(args) => {
            let group_id = parse_id(&args.group, "group")?;
            let breakdown = engine.settlements_by_category(group_id).await?;
            for (category, report) in &breakdown.categories {
                print_report(category.as_str(), report);
            }
            print_report("Overall", &breakdown.overall);
        }
    }

    Ok(())
}
