use anyhow::{Error, anyhow};
use reqwest::{
    Client,
    multipart::{Form, Part},
};

use crate::{
    claims::ClaimedItem,
    items::{FoundItemForm, Item, ItemFilter},
};

pub struct Photo {
    pub data: Vec<u8>,
    pub content_type: String,
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

pub async fn fetch_items(client: &Client, base_url: &str, filter: &ItemFilter) -> Result<Vec<Item>, Error> {
    let items = client
        .get(endpoint(base_url, "/api/items"))
        .query(filter)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(items)
}

pub async fn fetch_item(client: &Client, base_url: &str, id: u64) -> Result<Item, Error> {
    fetch_items(client, base_url, &ItemFilter::default())
        .await?
        .into_iter()
        .find(|item| item.id == id)
        .ok_or_else(|| anyhow!("item {id} is not listed or has already been claimed"))
}

pub async fn fetch_claimed_items(client: &Client, base_url: &str) -> Result<Vec<ClaimedItem>, Error> {
    let items = client
        .get(endpoint(base_url, "/api/claimed-items"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(items)
}

pub async fn report_found_item(
    client: &Client,
    base_url: &str,
    form: &FoundItemForm,
    photo: Option<Photo>,
) -> Result<Item, Error> {
    let mut multipart = Form::new()
        .text("studentNumber", form.student_number.trim().to_string())
        .text("password", form.password.clone())
        .text("itemName", form.item_name.trim().to_string())
        .text("category", form.category.clone())
        .text("location", form.location.clone());

    if let Some(photo) = photo {
        let part = Part::bytes(photo.data)
            .file_name("item.jpg")
            .mime_str(&photo.content_type)?;
        multipart = multipart.part("photo", part);
    }

    let response = client
        .post(endpoint(base_url, "/api/submit"))
        .multipart(multipart)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let message = response.text().await.unwrap_or_default();
        return Err(anyhow!("report rejected ({status}): {message}"));
    }

    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::endpoint;

    #[test]
    fn test_endpoint_trailing_slash() {
        assert_eq!(endpoint("http://desk:1111/", "/api/items"), "http://desk:1111/api/items");
        assert_eq!(endpoint("http://desk:1111", "/api/items"), "http://desk:1111/api/items");
    }
}
