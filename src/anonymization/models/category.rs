//! Entity categories

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of categories a sensitive span can carry
///
/// Declaration order is the final tie-break between otherwise equal
/// candidates during resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Personal names
    Person,
    /// Companies and other organizations
    Org,
    /// Addresses, places, facilities
    Location,
    /// Email addresses
    Email,
    /// Telephone numbers
    Phone,
    /// Dates and times, including era dates (令和, 平成)
    Date,
    /// Monetary amounts
    Money,
    /// Employee numbers, document numbers and other identifiers
    Id,
    /// Project and code names
    Project,
    /// Technologies, products, systems
    Tech,
    /// Departments and teams
    Department,
    /// Anything registered by the caller that fits no other category
    Custom,
}

impl Category {
    /// Every category, in declaration order
    pub const ALL: [Category; 12] = [
        Category::Person,
        Category::Org,
        Category::Location,
        Category::Email,
        Category::Phone,
        Category::Date,
        Category::Money,
        Category::Id,
        Category::Project,
        Category::Tech,
        Category::Department,
        Category::Custom,
    ];

    /// Canonical upper-case label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Org => "ORG",
            Self::Location => "LOCATION",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Date => "DATE",
            Self::Money => "MONEY",
            Self::Id => "ID",
            Self::Project => "PROJECT",
            Self::Tech => "TECH",
            Self::Department => "DEPARTMENT",
            Self::Custom => "CUSTOM",
        }
    }

    /// Maps a recognizer label onto a category
    ///
    /// Accepts the canonical labels and the aliases emitted by common
    /// Japanese NER models. Returns `None` for anything else; such spans
    /// are dropped by the engine and counted as unmapped.
    pub fn from_label(label: &str) -> Option<Self> {
        let category = match label.trim().to_ascii_uppercase().as_str() {
            "PERSON" | "PER" | "NAME" => Self::Person,
            "ORG" | "ORGANIZATION" | "COMPANY" => Self::Org,
            "LOCATION" | "LOC" | "GPE" | "FACILITY" | "FAC" | "ADDRESS" => Self::Location,
            "EMAIL" => Self::Email,
            "PHONE" | "TEL" => Self::Phone,
            "DATE" | "TIME" => Self::Date,
            "MONEY" => Self::Money,
            "ID" | "LICENSE" => Self::Id,
            "PROJECT" => Self::Project,
            "TECH" | "SYSTEM" | "PRODUCT" => Self::Tech,
            "DEPARTMENT" | "DEPT" => Self::Department,
            "CUSTOM" => Self::Custom,
            _ => return None,
        };
        Some(category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("Unknown category: {s}"))
    }
}
