use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Fields of the order form, in display order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    FullName,
    Size,
    Toppings,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::FullName => "full_name",
            FormField::Size => "size",
            FormField::Toppings => "toppings",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_name" | "name" => Ok(FormField::FullName),
            "size" => Ok(FormField::Size),
            "toppings" | "topping" => Ok(FormField::Toppings),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PizzaSize {
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
}

impl PizzaSize {
    pub const ALL: [PizzaSize; 3] = [PizzaSize::Small, PizzaSize::Medium, PizzaSize::Large];

    /// Value of the select option.
    pub fn code(&self) -> &'static str {
        match self {
            PizzaSize::Small => "S",
            PizzaSize::Medium => "M",
            PizzaSize::Large => "L",
        }
    }

    /// Word used in confirmation messages.
    pub fn describe(&self) -> &'static str {
        match self {
            PizzaSize::Small => "small",
            PizzaSize::Medium => "medium",
            PizzaSize::Large => "large",
        }
    }
}

impl fmt::Display for PizzaSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PizzaSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(PizzaSize::Small),
            "M" => Ok(PizzaSize::Medium),
            "L" => Ok(PizzaSize::Large),
            other => Err(format!("invalid pizza size '{other}'")),
        }
    }
}

/// Raw values of the editable fields.
///
/// `size` holds whatever the select control sent, so an out-of-range value
/// survives until validation reports it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub full_name: String,
    pub size: String,
    pub toppings: BTreeSet<String>,
}

impl FormState {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_empty() && self.size.is_empty() && self.toppings.is_empty()
    }
}

/// Which fields the user has interacted with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Touched(BTreeSet<FormField>);

impl Touched {
    pub fn mark(&mut self, field: FormField) -> bool {
        self.0.insert(field)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains(&field)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
