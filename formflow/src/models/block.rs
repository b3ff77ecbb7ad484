pub mod tree;

use crate::errors::FormflowError;
use charybdis::macros::charybdis_model;
use charybdis::types::{BigInt, Boolean, Int, Text, Timestamp, Uuid};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BlockType {
    Question,
    /// One selectable answer of a parent question.
    Option,
    Input,
}

impl BlockType {
    pub fn parse(client_id: &str, value: &str) -> Result<Self, FormflowError> {
        BlockType::from_str(value.trim()).map_err(|_| {
            FormflowError::StructuralConflict(format!(
                "block '{}' has an invalid type '{}' (expected question, option or input)",
                client_id, value
            ))
        })
    }
}

/// One node of a persisted flow revision.
///
/// Rows are immutable once written: every reconciliation writes a complete new revision under a
/// fresh `flow_id` and the owning form is pointed at it afterwards. Older revisions are kept so
/// that responses referencing their connection ids stay readable.
#[charybdis_model(
    table_name = blocks,
    partition_keys = [form_id],
    clustering_keys = [flow_id, connection_id],
)]
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub form_id: Uuid,
    pub flow_id: Uuid,
    pub connection_id: Uuid,
    pub version: BigInt,
    pub client_id: Text,
    pub parent_connection_id: Option<Uuid>,

    #[serde(rename = "type")]
    pub block_type: Text,

    pub label: Text,
    pub order_index: Int,
    pub depth_level: Int,
    pub is_terminal: Boolean,

    #[serde(default = "chrono::Utc::now")]
    pub created_at: Timestamp,
}

impl Block {
    pub fn is_root(&self) -> bool {
        self.parent_connection_id.is_none()
    }
}
