use std::collections::BTreeMap;

use serde::Serialize;

use super::state::{FormField, PizzaSize};

/// Where the form is in its submission lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    /// Valid and waiting for the user.
    Idle,
    /// Errors present, submit is disabled.
    Blocked,
    Submitting,
    Succeeded,
    Failed,
}

/// Transient outcome message shown after a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Banner {
    Success(String),
    Failure(String),
}

impl Banner {
    pub fn message(&self) -> &str {
        match self {
            Banner::Success(msg) | Banner::Failure(msg) => msg,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Banner::Success(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SizeOption {
    /// Empty for the placeholder entry.
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToppingOption {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

/// Everything a renderer needs, detached from the form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub full_name: String,
    pub size_options: Vec<SizeOption>,
    pub toppings: Vec<ToppingOption>,
    /// Only errors the user should currently see.
    pub errors: BTreeMap<FormField, String>,
    pub submit_enabled: bool,
    pub phase: SubmissionPhase,
    pub banner: Option<Banner>,
}

impl FormView {
    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn selected_size(&self) -> Option<&str> {
        self.size_options
            .iter()
            .find(|o| o.selected && !o.value.is_empty())
            .map(|o| o.value.as_str())
    }

    pub fn checked_toppings(&self) -> Vec<&str> {
        self.toppings
            .iter()
            .filter(|t| t.checked)
            .map(|t| t.id.as_str())
            .collect()
    }
}

pub(crate) fn size_options(current: &str) -> Vec<SizeOption> {
    let placeholder = SizeOption {
        value: String::new(),
        label: "Select a size".to_string(),
        selected: current.is_empty(),
    };
    std::iter::once(placeholder)
        .chain(PizzaSize::ALL.iter().map(|size| SizeOption {
            value: size.code().to_string(),
            label: capitalize(size.describe()),
            selected: current == size.code(),
        }))
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
