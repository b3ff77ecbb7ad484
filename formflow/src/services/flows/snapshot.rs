use crate::models::block::Block;
use crate::models::form::Form;
use charybdis::types::{BigInt, Uuid};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Block of an assembled revision. `id` is the stable connection id; `client_id` is only kept in
/// the owner view and is left empty in public projections.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowBlock {
    pub id: Uuid,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,

    #[serde(rename = "type")]
    pub block_type: String,

    pub label: String,
    pub order_index: i32,
    pub children: Vec<FlowBlock>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub flow_id: Option<Uuid>,
    pub version: BigInt,
    pub blocks: Vec<FlowBlock>,
}

impl FlowSnapshot {
    /// Assembles the nested tree of one revision from its flat rows.
    ///
    /// Rows of other revisions are ignored. Siblings are ordered by `order_index` with the
    /// connection id as tie-breaker. Rows whose parent is missing, or that sit on a parent cycle,
    /// are unreachable from any root and get dropped.
    pub fn build(flow_id: Uuid, version: BigInt, blocks: &[Block]) -> Self {
        let revision: Vec<&Block> = blocks.iter().filter(|b| b.flow_id == flow_id).collect();

        let mut children_by_parent: HashMap<Option<Uuid>, Vec<&Block>> = HashMap::new();
        for block in &revision {
            children_by_parent
                .entry(block.parent_connection_id)
                .or_default()
                .push(block);
        }

        children_by_parent
            .values_mut()
            .for_each(|siblings| siblings.sort_by_key(|b| (b.order_index, b.connection_id)));

        let mut visited = HashSet::with_capacity(revision.len());
        let roots = assemble(&children_by_parent, &mut visited);

        if visited.len() < revision.len() {
            warn!(
                "dropped {} unreachable blocks from flow {}",
                revision.len() - visited.len(),
                flow_id
            );
        }

        Self {
            flow_id: Some(flow_id),
            version,
            blocks: roots,
        }
    }

    /// Connection ids reachable in this snapshot.
    pub fn connection_ids(&self) -> HashSet<Uuid> {
        let mut ids = HashSet::new();
        let mut stack: Vec<&FlowBlock> = self.blocks.iter().collect();

        while let Some(block) = stack.pop() {
            ids.insert(block.id);
            stack.extend(block.children.iter());
        }

        ids
    }

    /// Same tree without the owner's client ids.
    pub fn into_public(mut self) -> Self {
        let mut stack: Vec<&mut FlowBlock> = self.blocks.iter_mut().collect();

        while let Some(block) = stack.pop() {
            block.client_id.clear();
            stack.extend(block.children.iter_mut());
        }

        self
    }
}

/// Builds the nested blocks reachable from the roots with an explicit stack: blocks are collected
/// in pre-order, then attached to their parents in reverse so children exist before their parent.
fn assemble(children_by_parent: &HashMap<Option<Uuid>, Vec<&Block>>, visited: &mut HashSet<Uuid>) -> Vec<FlowBlock> {
    let children_of = |parent: Option<Uuid>| children_by_parent.get(&parent).map(Vec::as_slice).unwrap_or_default();

    let mut pre_order: Vec<&Block> = vec![];
    let mut stack: Vec<&Block> = children_of(None).iter().rev().copied().collect();

    while let Some(block) = stack.pop() {
        if !visited.insert(block.connection_id) {
            continue;
        }

        pre_order.push(block);
        stack.extend(children_of(Some(block.connection_id)).iter().rev().copied());
    }

    let mut built: HashMap<Uuid, FlowBlock> = HashMap::with_capacity(pre_order.len());

    for block in pre_order.iter().rev() {
        let children = children_of(Some(block.connection_id))
            .iter()
            .filter_map(|child| built.remove(&child.connection_id))
            .collect();

        built.insert(
            block.connection_id,
            FlowBlock {
                id: block.connection_id,
                client_id: block.client_id.clone(),
                block_type: block.block_type.clone(),
                label: block.label.clone(),
                order_index: block.order_index,
                children,
            },
        );
    }

    children_of(None)
        .iter()
        .filter_map(|root| built.remove(&root.connection_id))
        .collect()
}

/// What a respondent receives when resolving a slug.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicForm {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub accepting_responses: bool,
    pub flow: FlowSnapshot,
}

impl PublicForm {
    pub fn new(form: &Form, flow: FlowSnapshot) -> Self {
        Self {
            id: form.id,
            title: form.title.clone(),
            description: form.description.clone(),
            accepting_responses: form.accepting_responses,
            flow: flow.into_public(),
        }
    }
}
