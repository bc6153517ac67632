/*
 * Responsibility
 * - auctions data access behind a narrow interface (add/get/get_list/update/activate)
 * - in-memory implementation used by the server and tests
 * - invariants owned here are reported as RepoError (data-access failure)
 */
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::repos::error::RepoError;

const ENTITY: &str = "auction";

#[derive(Debug, Clone)]
pub struct AuctionRow {
    pub auction_id: i64,
    pub seller_id: i64,
    pub title: String,
    pub starting_price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuction {
    pub seller_id: i64,
    pub title: String,
    pub starting_price_cents: i64,
}

/// Partial update; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct AuctionChanges {
    pub title: Option<String>,
    pub starting_price_cents: Option<i64>,
}

#[async_trait]
pub trait AuctionRepository: Send + Sync {
    async fn add(&self, new: NewAuction) -> Result<AuctionRow, RepoError>;
    async fn get(&self, auction_id: i64) -> Result<Option<AuctionRow>, RepoError>;
    async fn get_list(&self, limit: usize, offset: usize) -> Result<Vec<AuctionRow>, RepoError>;
    async fn update(
        &self,
        auction_id: i64,
        changes: AuctionChanges,
    ) -> Result<Option<AuctionRow>, RepoError>;
    async fn activate(&self, auction_id: i64) -> Result<AuctionRow, RepoError>;
}

fn check_price(cents: i64) -> Result<(), RepoError> {
    if cents < 0 {
        return Err(RepoError::Invalid {
            field: "starting_price_cents",
            reason: "must be non-negative",
        });
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: HashMap<i64, AuctionRow>,
}

#[derive(Debug, Default)]
pub struct InMemoryAuctionRepository {
    table: RwLock<Table>,
}

impl InMemoryAuctionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuctionRepository for InMemoryAuctionRepository {
    async fn add(&self, new: NewAuction) -> Result<AuctionRow, RepoError> {
        check_price(new.starting_price_cents)?;

        let mut table = self.table.write().await;
        table.next_id += 1;
        let now = Utc::now();
        let row = AuctionRow {
            auction_id: table.next_id,
            seller_id: new.seller_id,
            title: new.title,
            starting_price_cents: new.starting_price_cents,
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(row.auction_id, row.clone());
        Ok(row)
    }

    async fn get(&self, auction_id: i64) -> Result<Option<AuctionRow>, RepoError> {
        Ok(self.table.read().await.rows.get(&auction_id).cloned())
    }

    async fn get_list(&self, limit: usize, offset: usize) -> Result<Vec<AuctionRow>, RepoError> {
        let table = self.table.read().await;
        let mut rows: Vec<AuctionRow> = table.rows.values().cloned().collect();
        // newest first
        rows.sort_by(|a, b| b.auction_id.cmp(&a.auction_id));
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn update(
        &self,
        auction_id: i64,
        changes: AuctionChanges,
    ) -> Result<Option<AuctionRow>, RepoError> {
        if let Some(cents) = changes.starting_price_cents {
            check_price(cents)?;
        }

        let mut table = self.table.write().await;
        let Some(row) = table.rows.get_mut(&auction_id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            row.title = title;
        }
        if let Some(cents) = changes.starting_price_cents {
            row.starting_price_cents = cents;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn activate(&self, auction_id: i64) -> Result<AuctionRow, RepoError> {
        let mut table = self.table.write().await;
        let row = table.rows.get_mut(&auction_id).ok_or(RepoError::NotFound {
            entity: ENTITY,
            id: auction_id,
        })?;
        if row.is_active {
            return Err(RepoError::AlreadyActive {
                entity: ENTITY,
                id: auction_id,
            });
        }
        row.is_active = true;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}
