//! Admin-configurable settings: categories, suggested prompts, and pricing plans.
//!
//! Defaults are embedded from `config/default-settings.json` (validated by build.rs);
//! an imported copy in the store replaces them.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Plan id every new account starts on.
pub const FREE_PLAN_ID: &str = "free";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Suggested prompt shown for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub category: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPlan {
    pub id: String,
    pub name: String,
    /// Display price, as configured (currency is not interpreted).
    #[serde(default)]
    pub price: String,
    pub message_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub prompts: Vec<PromptTemplate>,
    pub plans: Vec<PricingPlan>,
}

/// Error loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

static DEFAULT_SETTINGS: OnceLock<Settings> = OnceLock::new();

fn load_default_settings() -> Settings {
    let json = include_str!("../../config/default-settings.json");
    serde_json::from_str(json).expect("default-settings.json must be valid")
}

impl Default for Settings {
    fn default() -> Self {
        DEFAULT_SETTINGS.get_or_init(load_default_settings).clone()
    }
}

impl Settings {
    /// Read and validate a settings file (admin import).
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.categories.is_empty() {
            return Err(SettingsError::Validation(
                "at least one category is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for c in &self.categories {
            if c.id.trim().is_empty() || c.name.trim().is_empty() {
                return Err(SettingsError::Validation(
                    "category id and name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(c.id.to_lowercase()) {
                return Err(SettingsError::Validation(format!(
                    "duplicate category id: {}",
                    c.id
                )));
            }
        }
        if let Some(p) = self.prompts.iter().find(|p| self.category(&p.category).is_none()) {
            return Err(SettingsError::Validation(format!(
                "prompt refers to unknown category: {}",
                p.category
            )));
        }
        let mut plan_ids = HashSet::new();
        for plan in &self.plans {
            if plan.message_limit == 0 {
                return Err(SettingsError::Validation(format!(
                    "plan {} must allow at least one message",
                    plan.id
                )));
            }
            if !plan_ids.insert(plan.id.as_str()) {
                return Err(SettingsError::Validation(format!(
                    "duplicate plan id: {}",
                    plan.id
                )));
            }
        }
        if !plan_ids.contains(FREE_PLAN_ID) {
            return Err(SettingsError::Validation(format!(
                "a \"{}\" plan is required",
                FREE_PLAN_ID
            )));
        }
        Ok(())
    }

    /// Look up a category by id (case-insensitive).
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.id.eq_ignore_ascii_case(id))
    }

    pub fn plan(&self, id: &str) -> Option<&PricingPlan> {
        self.plans.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    /// Message limit for a plan id, falling back to the free plan.
    pub fn limit_for(&self, plan_id: &str) -> u32 {
        self.plan(plan_id)
            .or_else(|| self.plan(FREE_PLAN_ID))
            .map(|p| p.message_limit)
            .unwrap_or(0)
    }

    /// Plans with a higher limit than `current_limit`, cheapest first.
    pub fn upgrades_from(&self, current_limit: u32) -> Vec<&PricingPlan> {
        let mut plans: Vec<&PricingPlan> = self
            .plans
            .iter()
            .filter(|p| p.message_limit > current_limit)
            .collect();
        plans.sort_by_key(|p| p.message_limit);
        plans
    }

    pub fn prompts_for<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a PromptTemplate> {
        self.prompts
            .iter()
            .filter(move |p| p.category.eq_ignore_ascii_case(category))
    }
}
