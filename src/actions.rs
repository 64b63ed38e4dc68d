//! Mutation flows shared by every view: validate locally, call the API,
//! compute the canonical tweet through the reducers, broadcast, return
//! the updated value.

use crate::api::{Api, ApiError};
use crate::events::{EventBus, TweetEvent};
use crate::models::{Comment, Tweet, MAX_POST_LEN};

/// Local validation applied before any network call.
pub fn validate_content(text: &str) -> Result<&str, ApiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("content cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_POST_LEN {
        return Err(ApiError::Validation(format!(
            "content exceeds {} characters",
            MAX_POST_LEN
        )));
    }
    Ok(trimmed)
}

pub async fn post_tweet(
    api: &dyn Api,
    bus: &EventBus,
    text: &str,
) -> Result<Tweet, ApiError> {
    let text = validate_content(text)?;
    let tweet = api.create_tweet(text).await?;
    bus.publish(&TweetEvent::Created(tweet.clone()));
    Ok(tweet)
}

pub async fn edit_tweet(
    api: &dyn Api,
    bus: &EventBus,
    prior: &Tweet,
    text: &str,
) -> Result<Tweet, ApiError> {
    let text = validate_content(text)?;
    let server = api.edit_tweet(prior.id, text).await?;
    let mut updated = prior.clone();
    updated.merge_edited(&server);
    bus.publish(&TweetEvent::Updated(updated.clone()));
    Ok(updated)
}

pub async fn toggle_like(
    api: &dyn Api,
    bus: &EventBus,
    prior: &Tweet,
) -> Result<Tweet, ApiError> {
    let outcome = api.toggle_like(prior.id).await?;
    if !outcome.success {
        return Err(ApiError::Rejected("the server rejected the like".to_string()));
    }
    let mut updated = prior.clone();
    updated.apply_like(&outcome);
    bus.publish(&TweetEvent::Liked(updated.clone()));
    Ok(updated)
}

/// Returns the updated tweet together with the comment the server created.
pub async fn add_comment(
    api: &dyn Api,
    bus: &EventBus,
    prior: &Tweet,
    text: &str,
) -> Result<(Tweet, Comment), ApiError> {
    let text = validate_content(text)?;
    let comment = api.add_comment(prior.id, text).await?;
    let mut updated = prior.clone();
    updated.push_comment(comment.clone());
    bus.publish(&TweetEvent::CommentAdded(updated.clone()));
    Ok((updated, comment))
}
