use std::fmt;

use serde::{Deserialize, Serialize};

use super::Category;

/// Which ledger a budget or expense belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BudgetType {
    #[default]
    Betel,
    Pessoal,
}

impl fmt::Display for BudgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetType::Betel => write!(f, "Betel"),
            BudgetType::Pessoal => write!(f, "Pessoal"),
        }
    }
}

/// One month of a forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBudget {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<String>,
    pub month: u32,
    pub year: i32,
    #[serde(default)]
    pub budget: f64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub budget_type: Option<BudgetType>,
}

impl MonthlyBudget {
    /// "03/2025"
    pub fn period_label(&self) -> String {
        format!("{:02}/{}", self.month, self.year)
    }
}

/// A category as a budget link carries it: a bare id or the populated document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Populated(Box<Category>),
}

impl CategoryRef {
    pub fn id(&self) -> Option<&str> {
        match self {
            CategoryRef::Id(id) => Some(id),
            CategoryRef::Populated(category) => category.id.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            CategoryRef::Id(_) => None,
            CategoryRef::Populated(category) => Some(&category.name),
        }
    }
}

/// Link between a monthly budget and one of the forecast's categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBudgetCategory {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_budget: Option<String>,
    pub category: CategoryRef,
}
