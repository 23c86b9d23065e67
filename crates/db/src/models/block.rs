//! Block entity model and DTOs.
//!
//! Content is stored as JSONB and decoded into the typed
//! [`BlockContent`] sum type on read.

use cohort_core::block_content::BlockContent;
use cohort_core::error::CoreError;
use cohort_core::status::{BlockKind, StatusId};
use cohort_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::decode;

/// A block row from the `blocks` table.
#[derive(Debug, Clone, FromRow)]
pub struct Block {
    pub id: DbId,
    pub name: String,
    pub kind_id: StatusId,
    pub content: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Block {
    pub fn kind(&self) -> Result<BlockKind, CoreError> {
        decode(self.kind_id, BlockKind::from_id, "block kind")
    }

    /// Decode the stored content. A stored payload that no longer matches its
    /// kind is an internal error, not a client mistake.
    pub fn typed_content(&self) -> Result<BlockContent, CoreError> {
        BlockContent::from_json(self.content.clone())
            .map_err(|e| CoreError::Internal(format!("Block {} content: {e}", self.id)))
    }
}

/// Block as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct BlockResponse {
    pub id: DbId,
    pub name: String,
    pub kind: BlockKind,
    pub content: BlockContent,
    pub updated_at: Timestamp,
}

impl BlockResponse {
    pub fn new(block: &Block) -> Result<Self, CoreError> {
        Ok(Self {
            id: block.id,
            name: block.name.clone(),
            kind: block.kind()?,
            content: block.typed_content()?,
            updated_at: block.updated_at,
        })
    }
}

/// DTO for creating a block. The kind is taken from the content's tag.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlock {
    pub name: String,
    pub content: BlockContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBlock {
    pub name: Option<String>,
    pub content: Option<BlockContent>,
}
