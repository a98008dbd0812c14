//! Data models for the budgeting backend.
//!
//! Resources nest forecast → monthly budget → category → subcategory, with
//! expenses recorded against a budget/category/subcategory triple:
//!
//! - `Forecast`, `ForecastUser`: planning horizon and who shares it
//! - `MonthlyBudget`, `BudgetType`: one month of a forecast
//! - `MonthlyBudgetCategory`: which categories a month's budget uses
//! - `Category`, `Subcategory`: allocations inside a budget
//! - `Expense`, `MonthlyExpenses`: spending and the monthly roll-up
//! - `User` and the auth payloads

pub mod auth;
pub mod budget;
pub mod category;
pub mod expense;
pub mod forecast;
pub mod user;

pub use auth::{LoginRequest, LoginResponse, RefreshData, RefreshRequest, RegisterRequest};
pub use budget::{BudgetType, CategoryRef, MonthlyBudget, MonthlyBudgetCategory};
pub use category::{Category, Subcategory};
pub use expense::{CategoryExpenses, Expense, MonthlyExpenses, SubcategoryExpenses};
pub use forecast::{Forecast, ForecastUser};
pub use user::User;
