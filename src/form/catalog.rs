use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Topping {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub label: String,
}

impl Topping {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// The fixed, ordered list of selectable toppings.
///
/// Built once at startup and owned by the form; never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "ToppingCatalog::validate_unique_ids"))]
pub struct ToppingCatalog {
    #[validate(length(min = 1), nested)]
    toppings: Vec<Topping>,
}

impl Default for ToppingCatalog {
    fn default() -> Self {
        Self {
            toppings: vec![
                Topping::new("1", "Pepperoni"),
                Topping::new("2", "Green Peppers"),
                Topping::new("3", "Pineapple"),
                Topping::new("4", "Mushrooms"),
                Topping::new("5", "Ham"),
            ],
        }
    }
}

impl ToppingCatalog {
    pub fn new(toppings: Vec<Topping>) -> Self {
        Self { toppings }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topping> {
        self.toppings.iter()
    }

    pub fn len(&self) -> usize {
        self.toppings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toppings.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Topping> {
        self.toppings.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Selected ids in catalog order, skipping anything the catalog does not know.
    pub fn ordered<'a, I>(&self, selected: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let selected: HashSet<&String> = selected.into_iter().collect();
        self.toppings
            .iter()
            .filter(|t| selected.contains(&t.id))
            .map(|t| t.id.clone())
            .collect()
    }

    fn validate_unique_ids(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for topping in &self.toppings {
            if !seen.insert(topping.id.as_str()) {
                let mut err = ValidationError::new("duplicate_topping_id");
                err.add_param("id".into(), &topping.id);
                return Err(err);
            }
        }
        Ok(())
    }
}
