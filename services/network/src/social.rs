//! Authorization and input rules for posts and follows

use common::validation::required_text;
use serde_json::Value;
use uuid::Uuid;

use crate::models::POST_MAX_CHARS;

/// Why an action on another user or their post is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    SelfFollow,
    NotAuthor,
}

impl Denied {
    pub fn message(self) -> &'static str {
        match self {
            Denied::SelfFollow => "Cannot follow yourself.",
            Denied::NotAuthor => "Cannot edit others' posts.",
        }
    }
}

pub fn check_follow(follower_id: Uuid, followed_id: Uuid) -> Result<(), Denied> {
    if follower_id == followed_id {
        return Err(Denied::SelfFollow);
    }
    Ok(())
}

pub fn check_edit(author_id: Uuid, actor_id: Uuid) -> Result<(), Denied> {
    if author_id != actor_id {
        return Err(Denied::NotAuthor);
    }
    Ok(())
}

/// Trimmed post content, or the validation message
pub fn post_content(raw: &str) -> Result<String, String> {
    required_text("Content", raw, POST_MAX_CHARS)
}

/// Content of an edit request body
///
/// A body that is not JSON is an error; a missing or non-string `content`
/// reads as empty.
pub fn edit_content(body: &[u8]) -> Result<String, String> {
    let value: Value = serde_json::from_slice(body).map_err(|_| "Invalid JSON.".to_string())?;
    let content = value.get("content").and_then(Value::as_str).unwrap_or("");

    post_content(content)
}
