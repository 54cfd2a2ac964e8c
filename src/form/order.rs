use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::state::PizzaSize;

/// A validated snapshot of the form, as handed to the submission service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Order {
    pub id: Uuid,
    #[validate(length(min = 3, max = 20))]
    pub full_name: String,
    pub size: PizzaSize,
    #[validate(custom(function = "Order::validate_toppings"))]
    pub toppings: Vec<String>,
}

impl Order {
    pub fn new(full_name: &str, size: PizzaSize, toppings: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.trim().to_string(),
            size,
            toppings,
        }
    }

    fn validate_toppings(toppings: &Vec<String>) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for id in toppings {
            if id.trim().is_empty() {
                return Err(ValidationError::new("blank_topping_id"));
            }
            if !seen.insert(id.as_str()) {
                let mut err = ValidationError::new("duplicate_topping_id");
                err.add_param("id".into(), id);
                return Err(err);
            }
        }
        Ok(())
    }

    /// `Thank you for your order, Alice! Your small pizza with 2 toppings is on its way!`
    pub fn confirmation_message(&self) -> String {
        format!(
            "Thank you for your order, {}! Your {} pizza with {} is on its way!",
            self.full_name,
            self.size.describe(),
            describe_topping_count(self.toppings.len())
        )
    }
}

pub fn describe_topping_count(count: usize) -> String {
    match count {
        0 => "no toppings".to_string(),
        1 => "1 topping".to_string(),
        n => format!("{n} toppings"),
    }
}

/// What a service hands back when it accepts an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub order_id: Uuid,
    #[serde(default)]
    pub reference: Option<String>,
}

impl Receipt {
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}
