//! # Student Directory
//!
//! Lookup table from student number to display name.
//!
//! ## Format
//!
//! - First line is a header and is skipped
//! - Each row is `number,last,first`
//! - Rows with fewer than three columns are ignored
//! - Display name is `first last`
use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Error};
use reqwest::Client;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct StudentDirectory {
    students: HashMap<String, String>,
}

impl StudentDirectory {
    pub fn from_csv(text: &str) -> Self {
        let students = text
            .lines()
            .skip(1)
            .filter_map(|row| {
                let cols: Vec<&str> = row.split(',').collect();
                if cols.len() < 3 {
                    return None;
                }

                let number = cols[0].trim();
                if number.is_empty() {
                    return None;
                }

                let name = format!("{} {}", cols[2].trim(), cols[1].trim());
                Some((number.to_string(), name))
            })
            .collect();

        Self { students }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading student directory {}", path.display()))?;

        let directory = Self::from_csv(&text);
        info!(students = directory.len(), path = %path.display(), "Loaded student directory");

        Ok(directory)
    }

    pub async fn fetch(client: &Client, base_url: &str) -> Result<Self, Error> {
        let url = format!("{}/students.csv", base_url.trim_end_matches('/'));
        let text = client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let directory = Self::from_csv(&text);
        info!(students = directory.len(), %url, "Fetched student directory");

        Ok(directory)
    }

    /// Display name for a student number, ignoring surrounding whitespace.
    pub fn resolve(&self, student_number: &str) -> Option<&str> {
        self.students.get(student_number.trim()).map(String::as_str)
    }

    pub fn contains(&self, student_number: &str) -> bool {
        self.resolve(student_number).is_some()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::StudentDirectory;

    const CSV: &str = "number,last,first\r\n2021001,Reyes,Ana\r\n2021002 , Cruz , Ben \n\n2021003,Short\n";

    #[test]
    fn test_header_skipped() {
        let directory = StudentDirectory::from_csv(CSV);
        assert!(!directory.contains("number"));
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_first_then_last() {
        let directory = StudentDirectory::from_csv(CSV);
        assert_eq!(directory.resolve("2021001"), Some("Ana Reyes"));
        assert_eq!(directory.resolve("2021002"), Some("Ben Cruz"));
    }

    #[test]
    fn test_short_rows_ignored() {
        let directory = StudentDirectory::from_csv(CSV);
        assert_eq!(directory.resolve("2021003"), None);
    }

    #[test]
    fn test_resolve_trims_input() {
        let directory = StudentDirectory::from_csv(CSV);
        assert_eq!(directory.resolve("  2021001 "), Some("Ana Reyes"));
        assert_eq!(directory.resolve(""), None);
    }

    #[test]
    fn test_empty_file() {
        assert!(StudentDirectory::from_csv("").is_empty());
        assert!(StudentDirectory::from_csv("number,last,first").is_empty());
    }
}
