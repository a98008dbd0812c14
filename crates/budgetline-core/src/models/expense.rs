use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BudgetType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub monthly_budget: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(rename = "type", default)]
    pub expense_type: BudgetType,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryExpenses {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub category_budget: f64,
    #[serde(default)]
    pub category_expenses_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryExpenses {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub subcategory_budget: f64,
    #[serde(default)]
    pub subcategory_expenses_amount: f64,
}

/// Current month's spending against the budget, with per-category and
/// per-subcategory totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyExpenses {
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub monthly_budget_amount: f64,
    #[serde(default)]
    pub monthly_budget_expenses_amount: f64,
    #[serde(default)]
    pub expenses_by_category: Vec<CategoryExpenses>,
    #[serde(default)]
    pub expenses_by_subcategory: Vec<SubcategoryExpenses>,
}

impl MonthlyExpenses {
    pub fn remaining(&self) -> f64 {
        self.monthly_budget_amount - self.monthly_budget_expenses_amount
    }

    pub fn for_category(&self, category_id: &str) -> Option<&CategoryExpenses> {
        self.expenses_by_category.iter().find(|c| c.id == category_id)
    }

    pub fn for_subcategory(&self, subcategory_id: &str) -> Option<&SubcategoryExpenses> {
        self.expenses_by_subcategory
            .iter()
            .find(|s| s.id == subcategory_id)
    }
}
