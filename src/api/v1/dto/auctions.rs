/*
 * Responsibility
 * - auctions request/response DTOs
 * - `CurrentUserId` is never sent by clients that are signed in: the auth
 *   middleware injects it (query for reads, JSON body for writes)
 */
use serde::{Deserialize, Serialize};

const MAX_TITLE_LEN: usize = 200;

fn check_title(title: &str) -> Result<(), &'static str> {
    if title.trim().is_empty() {
        return Err("title is required");
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err("title must be <= 200 chars");
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct AuctionQuery {
    #[serde(rename = "CurrentUserId")]
    pub current_user_id: Option<i64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAuctionRequest {
    pub title: String,
    pub starting_price_cents: i64,
    #[serde(rename = "CurrentUserId")]
    pub current_user_id: i64,
}

impl CreateAuctionRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        check_title(&self.title)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAuctionRequest {
    pub title: Option<String>,
    pub starting_price_cents: Option<i64>,
    #[serde(rename = "CurrentUserId")]
    pub current_user_id: i64,
}

impl UpdateAuctionRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuctionResponse {
    pub id: String,
    pub seller_id: i64,
    pub title: String,
    pub starting_price_cents: i64,
    pub is_active: bool,
    /// Whether the caller is the seller. Always false for anonymous callers.
    pub is_seller: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_rules() {
        let req = CreateAuctionRequest {
            title: "  ".into(),
            starting_price_cents: 1,
            current_user_id: 1,
        };
        assert_eq!(req.validate(), Err("title is required"));

        let req = UpdateAuctionRequest {
            title: Some("x".repeat(201)),
            starting_price_cents: None,
            current_user_id: 1,
        };
        assert!(req.validate().is_err());

        let req = UpdateAuctionRequest {
            title: None,
            starting_price_cents: Some(5),
            current_user_id: 1,
        };
        assert!(req.validate().is_ok());
    }
}
