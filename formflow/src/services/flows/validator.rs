use crate::constants::DEFAULT_MAX_FLOW_DEPTH;
use crate::errors::FormflowError;
use crate::models::block::tree::TreeNode;
use crate::models::block::BlockType;
use std::collections::HashSet;

/// A tree node that passed validation, in depth-first pre-order.
#[derive(Debug)]
pub struct ValidatedNode<'t> {
    pub node: &'t TreeNode,
    pub client_id: &'t str,
    pub block_type: BlockType,

    /// Position of the parent within the validated list.
    pub parent: Option<usize>,
    pub order_index: i32,
    pub depth_level: i32,
}

impl ValidatedNode<'_> {
    pub fn is_terminal(&self) -> bool {
        self.node.children.is_empty()
    }
}

pub struct FlowValidator<'t> {
    tree: &'t [TreeNode],
    visited: HashSet<&'t str>,
    max_depth: usize,
}

impl<'t> FlowValidator<'t> {
    pub fn new(tree: &'t [TreeNode]) -> Self {
        Self {
            tree,
            visited: HashSet::new(),
            max_depth: DEFAULT_MAX_FLOW_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walks the whole tree once, iteratively, so deep trees cannot exhaust the stack.
    pub fn validate(mut self) -> Result<Vec<ValidatedNode<'t>>, FormflowError> {
        self.validate_not_empty()?;

        let mut validated: Vec<ValidatedNode<'t>> = vec![];
        let mut stack: Vec<(&'t TreeNode, Option<usize>, usize, i32)> = self
            .tree
            .iter()
            .enumerate()
            .rev()
            .map(|(position, node)| (node, None, position, 0))
            .collect();

        while let Some((node, parent, position, depth_level)) = stack.pop() {
            let client_id = self.validate_client_id(node)?;
            let block_type = BlockType::parse(client_id, &node.block_type)?;
            self.validate_depth(client_id, depth_level)?;

            let order_index = i32::try_from(position).map_err(|_| {
                FormflowError::StructuralConflict(format!("block '{}' has too many siblings", client_id))
            })?;

            let index = validated.len();

            validated.push(ValidatedNode {
                node,
                client_id,
                block_type,
                parent,
                order_index,
                depth_level,
            });

            stack.extend(
                node.children
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(position, child)| (child, Some(index), position, depth_level + 1)),
            );
        }

        Ok(validated)
    }

    fn validate_not_empty(&self) -> Result<(), FormflowError> {
        if self.tree.is_empty() {
            return Err(FormflowError::StructuralConflict(
                "flow must contain at least one block".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_depth(&self, client_id: &str, depth_level: i32) -> Result<(), FormflowError> {
        if depth_level as usize > self.max_depth {
            return Err(FormflowError::StructuralConflict(format!(
                "block '{}' is nested deeper than {} levels",
                client_id, self.max_depth
            )));
        }

        Ok(())
    }

    fn validate_client_id(&mut self, node: &'t TreeNode) -> Result<&'t str, FormflowError> {
        let client_id = node.client_id.trim();

        if client_id.is_empty() {
            return Err(FormflowError::StructuralConflict(
                "every block needs a non-empty id".to_string(),
            ));
        }

        if !self.visited.insert(client_id) {
            return Err(FormflowError::StructuralConflict(format!(
                "duplicate block id '{}' in submitted flow",
                client_id
            )));
        }

        Ok(client_id)
    }
}
