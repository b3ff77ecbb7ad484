use crate::models::udts::Answer;
use charybdis::macros::charybdis_model;
use charybdis::types::{BigInt, Frozen, Int, List, Timestamp, Uuid};
use serde::{Deserialize, Serialize};

/// A stored public submission. Immutable once written.
#[charybdis_model(
    table_name = response_batches,
    partition_keys = [form_id],
    clustering_keys = [submitted_at, id],
    local_secondary_indexes = [id],
    table_options = r#"
        CLUSTERING ORDER BY (submitted_at DESC)
    "#
)]
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBatch {
    pub form_id: Uuid,
    pub submitted_at: Timestamp,
    pub id: Uuid,

    // revision that was public when the batch was accepted
    pub flow_id: Uuid,
    pub flow_version: BigInt,

    pub answers: Frozen<List<Frozen<Answer>>>,
    pub total_time_spent: Int,
    pub flow_path: Frozen<List<Uuid>>,
}

/// Listing projection; answers are only returned by the detail view.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub id: Uuid,
    pub submitted_at: Timestamp,
    pub total_time_spent: Int,
    pub flow_path: Vec<Uuid>,
}

impl From<&ResponseBatch> for ResponseSummary {
    fn from(batch: &ResponseBatch) -> Self {
        Self {
            id: batch.id,
            submitted_at: batch.submitted_at,
            total_time_spent: batch.total_time_spent,
            flow_path: batch.flow_path.clone(),
        }
    }
}
