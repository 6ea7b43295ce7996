use std::collections::HashMap;

use axum::extract::Multipart;
use registry::FoundItemForm;

use crate::{error::AppError, store::Photo};

const PHOTO_FIELD: &str = "photo";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A multipart body split into its text fields and the optional photo part.
#[derive(Debug, Default)]
pub struct Submission {
    fields: HashMap<String, String>,
    pub photo: Option<Photo>,
}

impl Submission {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == PHOTO_FIELD {
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let data = field.bytes().await?;

                // browsers send an empty part when no file was picked
                if !data.is_empty() {
                    submission.photo = Some(Photo { content_type, data });
                }
                continue;
            }

            let value = field.text().await?;
            submission.fields.insert(name, value);
        }

        Ok(submission)
    }

    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn found_item_form(&self) -> FoundItemForm {
        FoundItemForm {
            student_number: self.text("studentNumber"),
            password: self.text("password"),
            item_name: self.text("itemName"),
            category: self.text("category"),
            location: self.text("location"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_blank() {
        let mut submission = Submission::default();
        submission
            .fields
            .insert("itemName".to_string(), "Umbrella".to_string());

        let form = submission.found_item_form();
        assert_eq!(form.item_name, "Umbrella");
        assert_eq!(form.student_number, "");
        assert!(submission.photo.is_none());
    }
}
