//! Field-level validation rules for the order form.
//!
//! [`Schema::validate`] is a pure function of the form state. The form calls
//! it after every mutation and replaces the previous result wholesale.

use std::{borrow::Cow, collections::BTreeMap};

use log::debug;
use serde::{Deserialize, Serialize};
use validator::ValidationError;

use super::state::{FormField, FormState, PizzaSize};

pub const FULL_NAME_MIN_CHARS: usize = 3;
pub const FULL_NAME_MAX_CHARS: usize = 20;

/// Whether an order may go out without any topping selected.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToppingsPolicy {
    #[default]
    Optional,
    AtLeastOne,
}

/// Latest validation result, at most one error per field.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidationErrors(BTreeMap<FormField, ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: FormField) -> Option<&ValidationError> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    /// Code of the error on `field`, e.g. `too_short`.
    pub fn code(&self, field: FormField) -> Option<&str> {
        self.get(field).map(|e| e.code.as_ref())
    }

    /// Human-readable message of the error on `field`.
    pub fn message(&self, field: FormField) -> Option<&str> {
        self.get(field).and_then(|e| e.message.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &ValidationError)> {
        self.0.iter().map(|(f, e)| (*f, e))
    }

    /// Field to message, the shape the UI renders.
    pub fn messages(&self) -> BTreeMap<FormField, String> {
        self.iter()
            .map(|(field, err)| (field, message_of(err)))
            .collect()
    }

    fn insert(&mut self, field: FormField, err: ValidationError) {
        self.0.insert(field, err);
    }

    pub(crate) fn retain<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(FormField) -> bool,
    {
        Self(
            self.0
                .iter()
                .filter(|(f, _)| keep(**f))
                .map(|(f, e)| (*f, e.clone()))
                .collect(),
        )
    }
}

fn message_of(err: &ValidationError) -> String {
    err.message
        .as_deref()
        .map(str::to_string)
        .unwrap_or_else(|| err.code.to_string())
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Immutable validation configuration owned by a form instance.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    toppings_policy: ToppingsPolicy,
}

impl Schema {
    pub fn new(toppings_policy: ToppingsPolicy) -> Self {
        Self { toppings_policy }
    }

    pub fn toppings_policy(&self) -> ToppingsPolicy {
        self.toppings_policy
    }

    pub fn validate(&self, state: &FormState) -> ValidationErrors {
        let mut errors = ValidationErrors::default();

        if let Err(err) = validate_full_name(&state.full_name) {
            errors.insert(FormField::FullName, err);
        }
        if let Err(err) = validate_size(&state.size) {
            errors.insert(FormField::Size, err);
        }
        if self.toppings_policy == ToppingsPolicy::AtLeastOne && state.toppings.is_empty() {
            errors.insert(
                FormField::Toppings,
                field_error("required", "Please select at least one topping"),
            );
        }

        debug!("validated form state: {} error(s)", errors.len());
        errors
    }
}

pub fn validate_full_name(value: &str) -> Result<(), ValidationError> {
    let chars = value.trim().chars().count();
    if chars == 0 {
        return Err(field_error("required", "Full name is required"));
    }
    if chars < FULL_NAME_MIN_CHARS {
        let mut err = field_error("too_short", "Full name must be at least 3 characters");
        err.add_param("min".into(), &FULL_NAME_MIN_CHARS);
        return Err(err);
    }
    if chars > FULL_NAME_MAX_CHARS {
        let mut err = field_error("too_long", "Full name must be at most 20 characters");
        err.add_param("max".into(), &FULL_NAME_MAX_CHARS);
        return Err(err);
    }
    Ok(())
}

pub fn validate_size(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(field_error("required", "Size is required"));
    }
    value.parse::<PizzaSize>().map(|_| ()).map_err(|_| {
        let mut err = field_error("invalid", "Please select a valid size");
        err.add_param("value".into(), &value);
        err
    })
}
