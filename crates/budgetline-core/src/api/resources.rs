//! Resource services: forecasts, budgets, categories, subcategories,
//! expenses, users. Thin wrappers over `ApiClient`'s typed helpers.

use serde_json::json;

use super::{ApiClient, ApiError, RequestEnvelope};
use crate::models::{
    Category, Expense, Forecast, ForecastUser, MonthlyBudget, MonthlyBudgetCategory,
    MonthlyExpenses, Subcategory, User,
};

const FORECASTS: &str = "/forecasts";
const BUDGETS: &str = "/budgets";
const BUDGET_CATEGORY_LINKS: &str = "/monthly-budget-categories";
const CATEGORIES: &str = "/categories";
const SUBCATEGORIES: &str = "/subcategories";
const EXPENSES: &str = "/expenses";
const USERS: &str = "/users";

impl ApiClient {
    // ===== Forecasts =====

    pub async fn list_forecasts(&self) -> Result<Vec<Forecast>, ApiError> {
        self.get(FORECASTS).await
    }

    pub async fn get_forecast(&self, id: &str) -> Result<Forecast, ApiError> {
        self.get(&format!("{}/{}", FORECASTS, id)).await
    }

    pub async fn create_forecast(&self, forecast: &Forecast) -> Result<Forecast, ApiError> {
        self.post(FORECASTS, forecast).await
    }

    pub async fn update_forecast(
        &self,
        id: &str,
        forecast: &Forecast,
    ) -> Result<Forecast, ApiError> {
        self.put(&format!("{}/{}", FORECASTS, id), forecast).await
    }

    pub async fn delete_forecast(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("{}/{}", FORECASTS, id)).await
    }

    pub async fn list_forecast_users(
        &self,
        forecast_id: &str,
    ) -> Result<Vec<ForecastUser>, ApiError> {
        self.get(&format!("{}/{}/users", FORECASTS, forecast_id))
            .await
    }

    pub async fn add_forecast_user(
        &self,
        forecast_id: &str,
        user_id: &str,
    ) -> Result<ForecastUser, ApiError> {
        let body = json!({ "forecast": forecast_id, "user": user_id });
        self.post(&format!("{}/{}/user", FORECASTS, forecast_id), &body)
            .await
    }

    pub async fn remove_forecast_user(&self, forecast_user_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("{}/forecastuser/{}", FORECASTS, forecast_user_id))
            .await
    }

    // ===== Budgets =====

    pub async fn list_budgets(&self, forecast_id: &str) -> Result<Vec<MonthlyBudget>, ApiError> {
        self.get_with_query(BUDGETS, "forecastId", forecast_id).await
    }

    pub async fn get_budget(&self, id: &str) -> Result<MonthlyBudget, ApiError> {
        self.get(&format!("{}/{}", BUDGETS, id)).await
    }

    pub async fn create_budget(&self, budget: &MonthlyBudget) -> Result<MonthlyBudget, ApiError> {
        self.post(BUDGETS, budget).await
    }

    pub async fn update_budget(
        &self,
        id: &str,
        budget: &MonthlyBudget,
    ) -> Result<MonthlyBudget, ApiError> {
        self.put(&format!("{}/{}", BUDGETS, id), budget).await
    }

    pub async fn delete_budget(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("{}/{}", BUDGETS, id)).await
    }

    /// Copy a month's budget, with its categories, into a new budget
    pub async fn duplicate_budget(&self, id: &str) -> Result<MonthlyBudget, ApiError> {
        self.post(&format!("{}/{}/duplicate", BUDGETS, id), &json!({}))
            .await
    }

    pub async fn list_budget_categories(
        &self,
        budget_id: &str,
    ) -> Result<Vec<MonthlyBudgetCategory>, ApiError> {
        self.get(&format!("{}/{}/categories", BUDGETS, budget_id))
            .await
    }

    pub async fn add_budget_category(
        &self,
        budget_id: &str,
        category_id: &str,
    ) -> Result<MonthlyBudgetCategory, ApiError> {
        let body = json!({ "monthlyBudget": budget_id, "category": category_id });
        self.post(&format!("{}/categories", BUDGETS), &body).await
    }

    /// Unlink a category from a budget. The backend keys the link on the
    /// category id.
    pub async fn remove_budget_category(&self, category_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("{}/{}", BUDGET_CATEGORY_LINKS, category_id))
            .await
    }

    // ===== Categories =====

    /// Categories of a forecast, optionally only active or only inactive ones
    pub async fn list_categories(
        &self,
        forecast_id: &str,
        active: Option<bool>,
    ) -> Result<Vec<Category>, ApiError> {
        let mut request = RequestEnvelope::get(CATEGORIES).with_query("forecastId", forecast_id);
        if let Some(active) = active {
            request = request.with_query("isActive", active.to_string());
        }
        self.request(request).await
    }

    pub async fn get_category(&self, id: &str) -> Result<Category, ApiError> {
        self.get(&format!("{}/{}", CATEGORIES, id)).await
    }

    pub async fn create_category(&self, category: &Category) -> Result<Category, ApiError> {
        self.post(CATEGORIES, category).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        category: &Category,
    ) -> Result<Category, ApiError> {
        self.put(&format!("{}/{}", CATEGORIES, id), category).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("{}/{}", CATEGORIES, id)).await
    }

    // ===== Subcategories =====

    pub async fn list_subcategories(
        &self,
        category_id: &str,
    ) -> Result<Vec<Subcategory>, ApiError> {
        self.get_with_query(SUBCATEGORIES, "categoryId", category_id)
            .await
    }

    /// Subcategories are created under their parent category
    pub async fn create_subcategory(
        &self,
        category_id: &str,
        subcategory: &Subcategory,
    ) -> Result<Subcategory, ApiError> {
        self.post(&format!("{}/{}", SUBCATEGORIES, category_id), subcategory)
            .await
    }

    pub async fn update_subcategory(
        &self,
        id: &str,
        subcategory: &Subcategory,
    ) -> Result<Subcategory, ApiError> {
        self.put(&format!("{}/{}", SUBCATEGORIES, id), subcategory)
            .await
    }

    pub async fn delete_subcategory(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("{}/{}", SUBCATEGORIES, id)).await
    }

    // ===== Expenses =====

    pub async fn current_expenses(&self) -> Result<MonthlyExpenses, ApiError> {
        self.get(EXPENSES).await
    }

    pub async fn create_expense(&self, expense: &Expense) -> Result<Expense, ApiError> {
        self.post(EXPENSES, expense).await
    }

    pub async fn update_expense(&self, id: &str, expense: &Expense) -> Result<Expense, ApiError> {
        self.put(&format!("{}/{}", EXPENSES, id), expense).await
    }

    pub async fn delete_expense(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("{}/{}", EXPENSES, id)).await
    }

    // ===== Users =====

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get(USERS).await
    }
}
