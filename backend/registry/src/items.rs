//! # Found Items
//!
//! Items reported at the desk and the checks around them.
//!
//! ## Reporting
//!
//! - Every field is required, photo is optional
//! - Reporter must be a known student
//! - Reporter picks a password, used later to edit the listing
//!
//! ## Editing
//!
//! Two steps, both plain value matching:
//! 1. Student number and password must equal the reporter's
//! 2. Name, category and location are replaced, credentials are sent again
//!
//! ## Listing
//!
//! Search is a case-insensitive substring match on the name. Category and
//! location filters are exact, an empty filter matches everything.
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::students::StudentDirectory;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub location: String,
    pub student_number: String,
    pub date_submitted: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemFilter {
    #[serde(rename = "q")]
    pub query: String,
    pub category: String,
    pub location: String,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        let query = normalize_name(&self.query).to_lowercase();

        item.name.to_lowercase().contains(&query)
            && (self.category.is_empty() || item.category == self.category)
            && (self.location.is_empty() || item.location == self.location)
    }

    pub fn apply<'a, I>(&self, items: I) -> Vec<Item>
    where
        I: IntoIterator<Item = &'a Item>,
    {
        items
            .into_iter()
            .filter(|item| self.matches(item))
            .cloned()
            .collect()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("Please complete all fields")]
    Incomplete,

    #[error("Invalid student number")]
    UnknownStudent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundItemForm {
    pub student_number: String,
    pub password: String,
    pub item_name: String,
    pub category: String,
    pub location: String,
}

impl FoundItemForm {
    pub fn validate(&self, directory: &StudentDirectory) -> Result<(), FormError> {
        if self.student_number.trim().is_empty()
            || self.password.is_empty()
            || normalize_name(&self.item_name).is_empty()
            || self.category.is_empty()
            || self.location.is_empty()
        {
            return Err(FormError::Incomplete);
        }

        if !directory.contains(&self.student_number) {
            return Err(FormError::UnknownStudent);
        }

        Ok(())
    }

    pub fn into_item(self, id: u64, date_submitted: DateTime<Utc>, photo: Option<String>) -> Item {
        Item {
            id,
            name: normalize_name(&self.item_name),
            category: self.category,
            location: self.location,
            student_number: self.student_number.trim().to_string(),
            date_submitted,
            photo,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("Incorrect credentials")]
    InvalidCredentials,

    #[error("Item name cannot be empty")]
    EmptyName,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCredentials {
    pub student_number: String,
    pub password: String,
}

impl EditCredentials {
    /// Step one of an edit. `stored_password` is whatever the reporter chose.
    pub fn verify(&self, item: &Item, stored_password: &str) -> Result<(), EditError> {
        if self.student_number.trim() == item.student_number
            && self.password.trim() == stored_password.trim()
        {
            Ok(())
        } else {
            Err(EditError::InvalidCredentials)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEdit {
    pub name: String,
    pub category: String,
    pub location: String,
    #[serde(flatten)]
    pub credentials: EditCredentials,
}

impl ItemEdit {
    pub fn apply(&self, item: &mut Item, stored_password: &str) -> Result<(), EditError> {
        self.credentials.verify(item, stored_password)?;

        let name = normalize_name(&self.name);
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }

        item.name = name;
        item.category = self.category.clone();
        item.location = self.location.clone();

        Ok(())
    }
}

/// Trims and collapses runs of whitespace into a single space.
pub fn normalize_name(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}
