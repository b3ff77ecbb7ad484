pub mod validator;

use crate::errors::FormflowError;
use crate::models::block::Block;
use crate::models::response_batch::{ResponseBatch, ResponseSummary};
use crate::services::engine::FormEngine;
use crate::services::responses::validator::{ResponseValidator, Submission};
use crate::store::Store;
use charybdis::types::{BigInt, Timestamp, Uuid};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub response_id: Uuid,
    pub flow_version: BigInt,
    pub submitted_at: Timestamp,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePage {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub items: Vec<ResponseSummary>,
}

/// An answer together with the block it was given for, as that block looked in the revision the
/// response was collected against.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAnswer {
    pub connection_id: Uuid,
    pub client_id: Option<String>,
    pub block_type: Option<String>,
    pub label: Option<String>,
    pub answer_text: String,
    pub answer_value: Option<serde_json::Value>,
    pub time_spent: Option<i32>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetail {
    pub id: Uuid,
    pub form_id: Uuid,
    pub flow_version: BigInt,
    pub submitted_at: Timestamp,
    pub total_time_spent: i32,
    pub flow_path: Vec<Uuid>,
    pub answers: Vec<ResolvedAnswer>,
}

impl<S: Store> FormEngine<S> {
    /// Validates a public submission against the current snapshot and stores it as a new batch.
    /// Identical submissions are stored as distinct batches.
    pub async fn submit_responses(&self, slug: &str, submission: &Submission) -> Result<SubmitReceipt, FormflowError> {
        let form = self.find_form_by_slug(slug).await?;
        let snapshot = self.current_snapshot(&form).await?;

        let batch = ResponseValidator::new(&form, &snapshot, submission)
            .validate(self.ids.generate())
            .map_err(|e| {
                debug!("rejected submission for form {}: {}", form.id, e);
                e
            })?;

        self.store.insert_response(&batch).await?;

        info!(
            "stored response {} for form {} at flow version {}",
            batch.id, form.id, batch.flow_version
        );

        Ok(SubmitReceipt {
            response_id: batch.id,
            flow_version: batch.flow_version,
            submitted_at: batch.submitted_at,
        })
    }

    /// Newest first. Out-of-range limits fall back to the default page size.
    pub async fn list_responses(
        &self,
        form_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<ResponsePage, FormflowError> {
        self.find_form(form_id).await?;

        let limit = limit
            .and_then(|limit| usize::try_from(limit).ok())
            .filter(|limit| (1..=self.config.max_page_size).contains(limit))
            .unwrap_or(self.config.default_page_size);
        let offset = offset.and_then(|offset| usize::try_from(offset).ok()).unwrap_or(0);

        let (responses, total) = self.store.find_response_page(form_id, offset, limit).await?;
        let items = responses.iter().map(ResponseSummary::from).collect();

        Ok(ResponsePage {
            total,
            limit,
            offset,
            items,
        })
    }

    /// Full response with answers resolved across every retained revision, orphaned blocks
    /// included.
    pub async fn get_response(&self, form_id: Uuid, response_id: Uuid) -> Result<ResponseDetail, FormflowError> {
        self.find_form(form_id).await?;

        let batch = self
            .store
            .find_response(form_id, response_id)
            .await?
            .ok_or_else(|| FormflowError::NotFound(format!("response {} not found", response_id)))?;

        let blocks = self.store.find_all_blocks(form_id).await?;

        resolve_answers(batch, &blocks)
    }
}

fn resolve_answers(batch: ResponseBatch, blocks: &[Block]) -> Result<ResponseDetail, FormflowError> {
    // a connection id lives on through revisions; prefer the row of the revision answered
    let mut by_connection: HashMap<Uuid, &Block> = HashMap::with_capacity(blocks.len());
    for block in blocks {
        let entry = by_connection.entry(block.connection_id).or_insert(block);

        if block.flow_id == batch.flow_id || (entry.flow_id != batch.flow_id && block.version > entry.version) {
            *entry = block;
        }
    }

    let mut answers = Vec::with_capacity(batch.answers.len());

    for answer in &batch.answers {
        let block = by_connection.get(&answer.connection_id);
        let answer_value = answer
            .answer_value
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()?;

        answers.push(ResolvedAnswer {
            connection_id: answer.connection_id,
            client_id: block.map(|b| b.client_id.clone()),
            block_type: block.map(|b| b.block_type.clone()),
            label: block.map(|b| b.label.clone()),
            answer_text: answer.answer_text.clone(),
            answer_value,
            time_spent: answer.time_spent,
        });
    }

    Ok(ResponseDetail {
        id: batch.id,
        form_id: batch.form_id,
        flow_version: batch.flow_version,
        submitted_at: batch.submitted_at,
        total_time_spent: batch.total_time_spent,
        flow_path: batch.flow_path,
        answers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::udts::Answer;

    fn block(flow_id: Uuid, version: BigInt, connection_id: Uuid, label: &str) -> Block {
        Block {
            flow_id,
            version,
            connection_id,
            label: label.to_string(),
            block_type: "question".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_labels_from_the_answered_revision() {
        let (v1, v2) = (Uuid::new_v4(), Uuid::new_v4());
        let (kept, dropped) = (Uuid::new_v4(), Uuid::new_v4());
        let blocks = vec![
            block(v1, 1, kept, "Old wording"),
            block(v1, 1, dropped, "Removed later"),
            block(v2, 2, kept, "New wording"),
        ];

        let batch = ResponseBatch {
            flow_id: v1,
            flow_version: 1,
            answers: vec![
                Answer {
                    connection_id: kept,
                    answer_text: "a".to_string(),
                    answer_value: Some("[1,2]".to_string()),
                    time_spent: Some(3),
                },
                Answer {
                    connection_id: dropped,
                    answer_text: "b".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let detail = resolve_answers(batch, &blocks).unwrap();

        assert_eq!(detail.answers[0].label.as_deref(), Some("Old wording"));
        assert_eq!(detail.answers[0].answer_value, Some(serde_json::json!([1, 2])));
        assert_eq!(detail.answers[1].label.as_deref(), Some("Removed later"));
    }

    #[test]
    fn unknown_blocks_leave_labels_empty() {
        let batch = ResponseBatch {
            answers: vec![Answer {
                connection_id: Uuid::new_v4(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let detail = resolve_answers(batch, &[]).unwrap();

        assert!(detail.answers[0].label.is_none());
    }
}
