use crate::constants::DEFAULT_MAX_FLOW_DEPTH;
use crate::errors::FormflowError;
use crate::models::block::tree::TreeNode;
use crate::models::block::Block;
use crate::services::flows::validator::FlowValidator;
use crate::services::ids::IdGenerator;
use charybdis::types::{BigInt, Uuid};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Outcome of reconciling a submitted tree against the current revision. Nothing is persisted yet.
#[derive(Debug)]
pub struct Reconciliation {
    pub flow_id: Uuid,
    pub version: BigInt,
    pub blocks: Vec<Block>,

    /// client id -> connection id, for every node of the submitted tree
    pub mapping: BTreeMap<String, Uuid>,

    /// connection ids of the current revision that are absent from the submitted tree
    pub orphaned: Vec<Uuid>,
}

/// Turns a full tree replacement into the next flow revision.
///
/// A node keeps its connection id whenever its client id already existed in the current revision,
/// wherever it now sits in the tree. Every other node gets a fresh id.
pub struct Reconciler<'a> {
    form_id: Uuid,
    current: &'a [Block],
    current_version: BigInt,
    ids: &'a dyn IdGenerator,
    max_depth: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(form_id: Uuid, current: &'a [Block], current_version: BigInt, ids: &'a dyn IdGenerator) -> Self {
        Self {
            form_id,
            current,
            current_version,
            ids,
            max_depth: DEFAULT_MAX_FLOW_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn reconcile(&self, tree: &[TreeNode]) -> Result<Reconciliation, FormflowError> {
        let nodes = FlowValidator::new(tree).with_max_depth(self.max_depth).validate()?;

        let existing: HashMap<&str, Uuid> = self
            .current
            .iter()
            .map(|block| (block.client_id.as_str(), block.connection_id))
            .collect();

        let flow_id = self.ids.generate();
        let version = self.current_version + 1;
        let created_at = chrono::Utc::now();

        let mut blocks: Vec<Block> = Vec::with_capacity(nodes.len());
        let mut mapping = BTreeMap::new();

        for node in &nodes {
            let connection_id = existing
                .get(node.client_id)
                .copied()
                .unwrap_or_else(|| self.ids.generate());

            // parents precede their children in pre-order
            let parent_connection_id = node.parent.map(|parent| blocks[parent].connection_id);

            mapping.insert(node.client_id.to_string(), connection_id);

            blocks.push(Block {
                form_id: self.form_id,
                flow_id,
                connection_id,
                version,
                client_id: node.client_id.to_string(),
                parent_connection_id,
                block_type: node.block_type.to_string(),
                label: node.node.label.trim().to_string(),
                order_index: node.order_index,
                depth_level: node.depth_level,
                is_terminal: node.is_terminal(),
                created_at,
            });
        }

        let kept: HashSet<Uuid> = blocks.iter().map(|block| block.connection_id).collect();
        let mut seen = HashSet::new();
        let orphaned = self
            .current
            .iter()
            .map(|block| block.connection_id)
            .filter(|id| !kept.contains(id) && seen.insert(*id))
            .collect();

        Ok(Reconciliation {
            flow_id,
            version,
            blocks,
            mapping,
            orphaned,
        })
    }
}
