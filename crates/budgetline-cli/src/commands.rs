//! CLI commands

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use tracing::warn;

use budgetline_core::models::{BudgetType, Expense, Forecast, MonthlyBudget, RegisterRequest};
use budgetline_core::{ApiClient, Config};

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email (defaults to the last one used)
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Show whether a session is stored
    Status,

    /// Forecast operations
    Forecasts {
        #[command(subcommand)]
        command: ForecastCommands,
    },

    /// Monthly budget operations
    Budgets {
        #[command(subcommand)]
        command: BudgetCommands,
    },

    /// Category operations
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// List the subcategories of a category
    Subcategories {
        #[arg(long)]
        category: String,
    },

    /// Expense operations
    Expenses {
        #[command(subcommand)]
        command: ExpenseCommands,
    },

    /// List users
    Users,
}

#[derive(Subcommand)]
pub enum ForecastCommands {
    List,
    Create { name: String },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    List {
        #[arg(long)]
        forecast: String,
    },
    Create {
        #[arg(long)]
        forecast: String,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        amount: f64,
    },
    Duplicate { id: String },
    Delete { id: String },
    /// Categories linked to a budget
    Categories { id: String },
    /// Link a category to a budget
    Link {
        id: String,
        #[arg(long)]
        category: String,
    },
    /// Unlink a category from its budget
    Unlink { category: String },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    List {
        #[arg(long)]
        forecast: String,
        /// Only active (true) or inactive (false) categories
        #[arg(long)]
        active: Option<bool>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Current month's expenses against the budget
    Current,
    Add {
        #[arg(long)]
        budget: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        subcategory: Option<String>,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "")]
        description: String,
        /// Personal ledger instead of the default one
        #[arg(long)]
        personal: bool,
    },
    Delete { id: String },
}

impl Commands {
    pub async fn execute(self, client: &ApiClient, config: &mut Config) -> Result<()> {
        match self {
            Commands::Login { email } => login(client, config, email).await,
            Commands::Logout => {
                client.logout()?;
                println!("Signed out.");
                Ok(())
            }
            Commands::Register {
                username,
                name,
                email,
            } => {
                let password = rpassword::prompt_password("Password: ")
                    .context("Failed to read password")?;
                let request = RegisterRequest {
                    username,
                    person_name: name,
                    password,
                    email,
                };
                client.register(&request).await?;
                println!("Account created. Run `budgetline login` to sign in.");
                Ok(())
            }
            Commands::Status => {
                if client.is_authenticated() {
                    println!("Signed in ({})", config.api_base_url);
                } else {
                    println!("Not signed in");
                }
                Ok(())
            }
            Commands::Forecasts { command } => forecasts(client, command).await,
            Commands::Budgets { command } => budgets(client, command).await,
            Commands::Categories { command } => categories(client, command).await,
            Commands::Subcategories { category } => {
                for sub in client.list_subcategories(&category).await? {
                    println!(
                        "{:<26} {:<30} {:>10.2}{}",
                        sub.id.as_deref().unwrap_or("-"),
                        sub.name,
                        sub.subcategory_budget,
                        if sub.is_active { "" } else { "  (inactive)" }
                    );
                }
                Ok(())
            }
            Commands::Expenses { command } => expenses(client, command).await,
            Commands::Users => {
                for user in client.list_users().await? {
                    println!(
                        "{:<26} {:<30} {}",
                        user.id.as_deref().unwrap_or("-"),
                        user.display_name(),
                        user.email
                    );
                }
                Ok(())
            }
        }
    }
}

async fn login(client: &ApiClient, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => anyhow::bail!("No email given. Use `budgetline login --email <EMAIL>`"),
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    client.login(&email, &password).await?;

    config.last_email = Some(email.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    println!("Signed in as {}", email);
    Ok(())
}

async fn forecasts(client: &ApiClient, command: ForecastCommands) -> Result<()> {
    match command {
        ForecastCommands::List => {
            for forecast in client.list_forecasts().await? {
                println!(
                    "{:<26} {}",
                    forecast.id.as_deref().unwrap_or("-"),
                    forecast.name
                );
            }
        }
        ForecastCommands::Create { name } => {
            let created = client.create_forecast(&Forecast::new(name)).await?;
            println!("Created forecast {}", created.id.as_deref().unwrap_or("-"));
        }
        ForecastCommands::Delete { id } => {
            client.delete_forecast(&id).await?;
            println!("Deleted forecast {}", id);
        }
    }
    Ok(())
}

async fn budgets(client: &ApiClient, command: BudgetCommands) -> Result<()> {
    match command {
        BudgetCommands::List { forecast } => {
            for budget in client.list_budgets(&forecast).await? {
                println!(
                    "{:<26} {:>7} {:>12.2}",
                    budget.id.as_deref().unwrap_or("-"),
                    budget.period_label(),
                    budget.budget
                );
            }
        }
        BudgetCommands::Create {
            forecast,
            month,
            year,
            amount,
        } => {
            if !(1..=12).contains(&month) {
                anyhow::bail!("Month must be between 1 and 12");
            }
            let budget = MonthlyBudget {
                id: None,
                forecast: Some(forecast),
                month,
                year,
                budget: amount,
                budget_type: None,
            };
            let created = client.create_budget(&budget).await?;
            println!(
                "Created budget {} for {}",
                created.id.as_deref().unwrap_or("-"),
                created.period_label()
            );
        }
        BudgetCommands::Duplicate { id } => {
            let copy = client.duplicate_budget(&id).await?;
            println!(
                "Duplicated into {} ({})",
                copy.id.as_deref().unwrap_or("-"),
                copy.period_label()
            );
        }
        BudgetCommands::Delete { id } => {
            client.delete_budget(&id).await?;
            println!("Deleted budget {}", id);
        }
        BudgetCommands::Categories { id } => {
            for link in client.list_budget_categories(&id).await? {
                println!(
                    "{:<26} {}",
                    link.category.id().unwrap_or("-"),
                    link.category.name().unwrap_or("")
                );
            }
        }
        BudgetCommands::Link { id, category } => {
            client.add_budget_category(&id, &category).await?;
            println!("Linked category {} to budget {}", category, id);
        }
        BudgetCommands::Unlink { category } => {
            client.remove_budget_category(&category).await?;
            println!("Unlinked category {}", category);
        }
    }
    Ok(())
}

async fn categories(client: &ApiClient, command: CategoryCommands) -> Result<()> {
    match command {
        CategoryCommands::List { forecast, active } => {
            for category in client.list_categories(&forecast, active).await? {
                println!(
                    "{:<26} {:<30} {:>10.2}  {} subcategories",
                    category.id.as_deref().unwrap_or("-"),
                    category.name,
                    category.category_budget,
                    category.subcategories.len()
                );
            }
        }
        CategoryCommands::Delete { id } => {
            client.delete_category(&id).await?;
            println!("Deleted category {}", id);
        }
    }
    Ok(())
}

async fn expenses(client: &ApiClient, command: ExpenseCommands) -> Result<()> {
    match command {
        ExpenseCommands::Current => {
            let monthly = client.current_expenses().await?;
            for expense in &monthly.expenses {
                println!(
                    "{}  {:<30} {:>10.2}  {}",
                    expense.date.format("%Y-%m-%d"),
                    expense.description,
                    expense.amount,
                    expense.expense_type
                );
            }
            println!(
                "Budget {:.2}  spent {:.2}  remaining {:.2}",
                monthly.monthly_budget_amount,
                monthly.monthly_budget_expenses_amount,
                monthly.remaining()
            );
        }
        ExpenseCommands::Add {
            budget,
            category,
            subcategory,
            amount,
            description,
            personal,
        } => {
            let expense = Expense {
                id: None,
                monthly_budget: budget,
                category,
                subcategory,
                expense_type: if personal {
                    BudgetType::Pessoal
                } else {
                    BudgetType::Betel
                },
                amount,
                description,
                date: Utc::now(),
                created_by: None,
                updated_by: None,
            };
            let created = client.create_expense(&expense).await?;
            println!("Recorded expense {}", created.id.as_deref().unwrap_or("-"));
        }
        ExpenseCommands::Delete { id } => {
            client.delete_expense(&id).await?;
            println!("Deleted expense {}", id);
        }
    }
    Ok(())
}
