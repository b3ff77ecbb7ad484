use crate::errors::FormflowError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Owner-submitted node of a nested flow tree. `id` is the owner's own label for the node and
/// is only unique within one submission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(rename = "id")]
    pub client_id: String,

    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default, alias = "question")]
    pub label: String,

    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(client_id: &str, block_type: &str, label: &str, children: Vec<TreeNode>) -> Self {
        Self {
            client_id: client_id.to_string(),
            block_type: block_type.to_string(),
            label: label.to_string(),
            children,
        }
    }

    pub fn leaf(client_id: &str, block_type: &str, label: &str) -> Self {
        Self::new(client_id, block_type, label, vec![])
    }
}

/// Adjacency-list form of a flow: every node names its parent instead of nesting children.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatNode {
    pub id: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default, alias = "question")]
    pub label: String,

    #[serde(default)]
    pub order_index: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum FlowPayload {
    Nested { blocks: Vec<TreeNode> },
    Flat { nodes: Vec<FlatNode> },
}

impl FlowPayload {
    pub fn into_tree(self, max_depth: usize) -> Result<Vec<TreeNode>, FormflowError> {
        match self {
            FlowPayload::Nested { blocks } => Ok(blocks),
            FlowPayload::Flat { nodes } => nest_flat_nodes(nodes, max_depth),
        }
    }
}

/// Converts parent pointers into a nested tree.
///
/// Parent pointers can describe loops, so every node reached from a root is recorded in a
/// visited set; anything left unvisited once all roots are walked sits on a cycle. Nodes nested
/// deeper than `max_depth` are rejected before any `TreeNode` is built.
pub fn nest_flat_nodes(nodes: Vec<FlatNode>, max_depth: usize) -> Result<Vec<TreeNode>, FormflowError> {
    let mut index_by_id: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());

    for (index, node) in nodes.iter().enumerate() {
        if index_by_id.insert(node.id.as_str(), index).is_some() {
            return Err(FormflowError::StructuralConflict(format!(
                "duplicate block id '{}' in submitted flow",
                node.id
            )));
        }
    }

    let mut roots: Vec<usize> = vec![];
    let mut children_by_parent: HashMap<usize, Vec<usize>> = HashMap::new();

    for (index, node) in nodes.iter().enumerate() {
        match node.parent_id.as_deref() {
            None => roots.push(index),
            Some(parent_id) => {
                let parent_index = *index_by_id.get(parent_id).ok_or_else(|| {
                    FormflowError::StructuralConflict(format!(
                        "block '{}' references unknown parent '{}'",
                        node.id, parent_id
                    ))
                })?;

                if parent_index == index {
                    return Err(FormflowError::StructuralConflict(format!(
                        "block '{}' is its own parent",
                        node.id
                    )));
                }

                children_by_parent.entry(parent_index).or_default().push(index);
            }
        }
    }

    let sibling_key = |index: &usize| (nodes[*index].order_index.unwrap_or(i32::MAX), *index);
    roots.sort_by_key(sibling_key);
    children_by_parent
        .values_mut()
        .for_each(|siblings| siblings.sort_by_key(sibling_key));

    let pre_order = walk_from_roots(&nodes, &roots, &children_by_parent, max_depth)?;

    if pre_order.len() != nodes.len() {
        let reached: HashSet<usize> = pre_order.iter().copied().collect();
        let cyclic = nodes
            .iter()
            .enumerate()
            .find(|(index, _)| !reached.contains(index))
            .map(|(_, node)| node.id.as_str())
            .unwrap_or_default();

        return Err(FormflowError::StructuralConflict(format!(
            "block '{}' is part of a parent cycle",
            cyclic
        )));
    }

    // reverse pre-order builds every child before its parent
    let mut built: Vec<Option<TreeNode>> = vec![None; nodes.len()];

    for &index in pre_order.iter().rev() {
        let children = children_by_parent
            .get(&index)
            .map(|child_indexes| child_indexes.iter().filter_map(|child| built[*child].take()).collect())
            .unwrap_or_default();

        let node = &nodes[index];

        built[index] = Some(TreeNode {
            client_id: node.id.clone(),
            block_type: node.block_type.clone(),
            label: node.label.clone(),
            children,
        });
    }

    Ok(roots.iter().filter_map(|root| built[*root].take()).collect())
}

/// Depth-first pre-order of every node reachable from `roots`, with an explicit stack.
fn walk_from_roots(
    nodes: &[FlatNode],
    roots: &[usize],
    children_by_parent: &HashMap<usize, Vec<usize>>,
    max_depth: usize,
) -> Result<Vec<usize>, FormflowError> {
    let mut visited: HashSet<usize> = HashSet::with_capacity(nodes.len());
    let mut pre_order = Vec::with_capacity(nodes.len());
    let mut stack: Vec<(usize, usize)> = roots.iter().rev().map(|root| (*root, 0)).collect();

    while let Some((index, depth)) = stack.pop() {
        if !visited.insert(index) {
            return Err(FormflowError::StructuralConflict(format!(
                "block '{}' is reachable twice",
                nodes[index].id
            )));
        }

        if depth > max_depth {
            return Err(FormflowError::StructuralConflict(format!(
                "block '{}' is nested deeper than {} levels",
                nodes[index].id, max_depth
            )));
        }

        pre_order.push(index);

        if let Some(children) = children_by_parent.get(&index) {
            stack.extend(children.iter().rev().map(|child| (*child, depth + 1)));
        }
    }

    Ok(pre_order)
}
