//! Request bodies for listing creation and listing actions

use common::validation::required_text;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{Category, Money, NewListing, PLACEHOLDER_IMAGE_URL};

const TITLE_MAX_CHARS: usize = 64;
const DESCRIPTION_MAX_CHARS: usize = 5000;
const COMMENT_MAX_CHARS: usize = 1000;
const IMAGE_URL_MAX_CHARS: usize = 200;

/// Create listing form
#[derive(Debug, Deserialize)]
pub struct ListingForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starting_bid: Value,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ListingForm {
    /// Validate the form; the error is the first failing field's message
    pub fn validate(self) -> Result<NewListing, String> {
        let title = required_text("Title", &self.title, TITLE_MAX_CHARS)?;
        let description = required_text("Description", &self.description, DESCRIPTION_MAX_CHARS)?;
        let starting_bid = parse_amount(&self.starting_bid)?;

        let image_url = match self.image_url.as_deref().map(str::trim) {
            None | Some("") => PLACEHOLDER_IMAGE_URL.to_string(),
            Some(url) => validate_image_url(url)?,
        };

        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(name.parse::<Category>()?),
        };

        Ok(NewListing {
            title,
            description,
            starting_bid,
            image_url,
            category,
        })
    }
}

/// Action posted to a listing page
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ListingAction {
    Bid {
        #[serde(default)]
        amount: Value,
    },
    Comment {
        #[serde(default)]
        text: String,
    },
}

/// Parse a money amount sent either as a JSON string or a JSON number
pub fn parse_amount(raw: &Value) -> Result<Money, String> {
    let text = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        _ => return Err("Enter a number.".to_string()),
    };

    text.parse::<Money>().map_err(|e| e.to_string())
}

pub fn comment_text(raw: &str) -> Result<String, String> {
    required_text("Comment", raw, COMMENT_MAX_CHARS)
}

fn validate_image_url(url: &str) -> Result<String, String> {
    if url.chars().count() > IMAGE_URL_MAX_CHARS {
        return Err(format!(
            "Image URL must be at most {} characters long.",
            IMAGE_URL_MAX_CHARS
        ));
    }

    let has_host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty() && !rest.contains(char::is_whitespace));
    if !has_host {
        return Err("Enter a valid URL.".to_string());
    }

    Ok(url.to_string())
}
