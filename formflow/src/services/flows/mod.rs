pub mod reconciler;
pub mod snapshot;
pub mod validator;

use crate::errors::FormflowError;
use crate::models::block::tree::TreeNode;
use crate::services::engine::FormEngine;
use crate::services::flows::reconciler::{Reconciler, Reconciliation};
use crate::services::flows::snapshot::FlowSnapshot;
use crate::store::Store;
use charybdis::types::{BigInt, Uuid};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FlowUpdate {
    pub blocks_version: BigInt,
    pub flow_id: Uuid,
    pub mapping: BTreeMap<String, Uuid>,
    pub orphaned: Vec<Uuid>,
}

impl From<Reconciliation> for FlowUpdate {
    fn from(reconciliation: Reconciliation) -> Self {
        Self {
            blocks_version: reconciliation.version,
            flow_id: reconciliation.flow_id,
            mapping: reconciliation.mapping,
            orphaned: reconciliation.orphaned,
        }
    }
}

impl<S: Store> FormEngine<S> {
    /// Replaces the whole flow of a form with `tree`.
    ///
    /// Either the next revision becomes current in one step or nothing changes: a rejected tree
    /// never reaches the store, and losing a concurrent write yields `Conflict`.
    pub async fn reconcile_flow(&self, form_id: Uuid, tree: &[TreeNode]) -> Result<FlowUpdate, FormflowError> {
        let _guard = self.locker.lock(form_id).await;
        let form = self.find_form(form_id).await?;

        let current = match form.current_flow_id {
            Some(flow_id) => self.store.find_flow_blocks(form_id, flow_id).await?,
            None => vec![],
        };

        let reconciliation = Reconciler::new(form_id, &current, form.current_flow_version, self.ids.as_ref())
            .with_max_depth(self.config.max_flow_depth)
            .reconcile(tree)
            .map_err(|e| {
                warn!("rejected flow for form {}: {}", form_id, e);
                e
            })?;

        self.store
            .replace_flow(
                form_id,
                form.current_flow_version,
                reconciliation.flow_id,
                reconciliation.version,
                &reconciliation.blocks,
            )
            .await?;

        info!(
            "form {} flow at version {} ({} blocks, {} orphaned)",
            form_id,
            reconciliation.version,
            reconciliation.blocks.len(),
            reconciliation.orphaned.len()
        );

        Ok(reconciliation.into())
    }

    /// Owner view of the current flow. Empty until the first reconciliation.
    pub async fn get_flow(&self, form_id: Uuid) -> Result<FlowSnapshot, FormflowError> {
        let form = self.find_form(form_id).await?;

        self.current_snapshot(&form).await
    }
}
