#![allow(dead_code)]

use formflow::models::block::tree::TreeNode;
use formflow::models::form::Form;
use formflow::services::flows::snapshot::FlowBlock;
use formflow::services::responses::validator::{AnswerInput, Submission};
use formflow::services::{EngineConfig, FormEngine};
use formflow::store::MemoryStore;
use uuid::Uuid;

pub type TestEngine = FormEngine<MemoryStore>;

pub fn engine() -> TestEngine {
    FormEngine::new(MemoryStore::new(), EngineConfig::default())
}

/// Root question with two options, the second one followed by an input.
pub fn feedback_tree() -> Vec<TreeNode> {
    vec![TreeNode::new(
        "q1",
        "question",
        "How was it?",
        vec![
            TreeNode::leaf("great", "option", "Great"),
            TreeNode::new(
                "meh",
                "option",
                "Could be better",
                vec![TreeNode::leaf("why", "input", "What should we improve?")],
            ),
        ],
    )]
}

pub async fn create_form(engine: &TestEngine, title: &str) -> Form {
    engine.create_form(title, "").await.unwrap()
}

pub async fn published_form(engine: &TestEngine, custom_slug: &str) -> Form {
    let form = create_form(engine, "Feedback").await;
    engine.reconcile_flow(form.id, &feedback_tree()).await.unwrap();
    engine.publish(form.id, Some(custom_slug)).await.unwrap();

    engine.get_form(form.id).await.unwrap()
}

pub fn answer(connection_id: Uuid, text: &str) -> AnswerInput {
    AnswerInput {
        connection_id: connection_id.to_string(),
        answer_text: text.to_string(),
        answer_value: None,
        time_spent: Some(2),
    }
}

pub fn submission(answers: Vec<AnswerInput>, path: &[Uuid]) -> Submission {
    Submission {
        responses: answers,
        total_time_spent: 10,
        flow_path: path.iter().map(Uuid::to_string).collect(),
    }
}

/// (client id, type, label, children) projection used to compare trees structurally.
#[derive(Debug, PartialEq)]
pub struct Shape(pub String, pub String, pub String, pub Vec<Shape>);

pub fn tree_shape(nodes: &[TreeNode]) -> Vec<Shape> {
    nodes
        .iter()
        .map(|n| Shape(n.client_id.clone(), n.block_type.clone(), n.label.clone(), tree_shape(&n.children)))
        .collect()
}

pub fn flow_shape(blocks: &[FlowBlock]) -> Vec<Shape> {
    blocks
        .iter()
        .map(|b| Shape(b.client_id.clone(), b.block_type.clone(), b.label.clone(), flow_shape(&b.children)))
        .collect()
}
