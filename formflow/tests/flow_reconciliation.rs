mod common;

use common::*;
use formflow::constants::DEFAULT_MAX_FLOW_DEPTH;
use formflow::errors::FormflowError;
use formflow::models::block::tree::{FlatNode, FlowPayload, TreeNode};
use formflow::services::{EngineConfig, FormEngine};
use formflow::store::MemoryStore;
use uuid::Uuid;

#[tokio::test]
async fn reconciled_flow_reads_back_with_same_structure() {
    let engine = engine();
    let form = create_form(&engine, "Onboarding").await;
    let tree = feedback_tree();

    let update = engine.reconcile_flow(form.id, &tree).await.unwrap();
    let flow = engine.get_flow(form.id).await.unwrap();

    assert_eq!(update.blocks_version, 1);
    assert_eq!(flow.version, 1);
    assert_eq!(flow_shape(&flow.blocks), tree_shape(&tree));
    assert_eq!(flow.blocks[0].id, update.mapping["q1"]);
    assert_eq!(flow.blocks[0].children[1].children[0].id, update.mapping["why"]);
}

#[tokio::test]
async fn multiple_roots_keep_their_order() {
    let engine = engine();
    let form = create_form(&engine, "Two roots").await;
    let tree = vec![
        TreeNode::leaf("b", "input", "Second?"),
        TreeNode::leaf("a", "question", "First?"),
    ];

    engine.reconcile_flow(form.id, &tree).await.unwrap();
    let flow = engine.get_flow(form.id).await.unwrap();

    assert_eq!(flow_shape(&flow.blocks), tree_shape(&tree));
}

#[tokio::test]
async fn reused_client_ids_keep_connection_ids_and_old_responses() {
    let engine = engine();
    let form = published_form(&engine, "feedback").await;
    let first = engine.get_flow(form.id).await.unwrap();
    let great = first.blocks[0].children[0].id;

    let receipt = engine
        .submit_responses("feedback", &submission(vec![answer(great, "Great")], &[first.blocks[0].id, great]))
        .await
        .unwrap();

    // "great" moves to the root and "meh" disappears
    let edited = vec![
        TreeNode::leaf("great", "option", "Great!"),
        TreeNode::leaf("q1", "question", "How was it?"),
    ];
    let update = engine.reconcile_flow(form.id, &edited).await.unwrap();

    assert_eq!(update.mapping["great"], great);
    assert_eq!(update.blocks_version, 2);
    assert_eq!(update.orphaned.len(), 2);

    let detail = engine.get_response(form.id, receipt.response_id).await.unwrap();
    assert_eq!(detail.answers[0].connection_id, great);
    assert_eq!(detail.answers[0].label.as_deref(), Some("Great"));
    assert_eq!(detail.flow_version, 1);
}

#[tokio::test]
async fn duplicate_client_id_leaves_previous_version_untouched() {
    let engine = engine();
    let form = create_form(&engine, "Survey").await;
    engine.reconcile_flow(form.id, &feedback_tree()).await.unwrap();
    let before = engine.get_flow(form.id).await.unwrap();

    let duplicate = vec![TreeNode::new(
        "q1",
        "question",
        "How was it?",
        vec![TreeNode::leaf("q1", "option", "Again")],
    )];
    let err = engine.reconcile_flow(form.id, &duplicate).await.unwrap_err();

    assert!(matches!(err, FormflowError::StructuralConflict(_)));
    assert_eq!(engine.get_flow(form.id).await.unwrap(), before);
    assert_eq!(engine.get_form(form.id).await.unwrap().current_flow_version, 1);
}

#[tokio::test]
async fn flat_payload_cycles_are_rejected_before_reconciliation() {
    let payload: FlowPayload = serde_json::from_str(
        r#"{"nodes":[
            {"id":"q1","type":"question","label":"Root"},
            {"id":"a","parentId":"b","type":"option","label":"A"},
            {"id":"b","parentId":"a","type":"option","label":"B"}
        ]}"#,
    )
    .unwrap();

    let err = payload.into_tree(DEFAULT_MAX_FLOW_DEPTH).unwrap_err();

    assert!(matches!(err, FormflowError::StructuralConflict(_)));
}

#[tokio::test]
async fn deep_flat_chain_is_rejected_as_structural_conflict() {
    let nodes = (0..50_000)
        .map(|i| FlatNode {
            id: format!("n{}", i),
            parent_id: (i > 0).then(|| format!("n{}", i - 1)),
            block_type: "question".to_string(),
            label: String::new(),
            order_index: None,
        })
        .collect();

    let err = FlowPayload::Flat { nodes }.into_tree(DEFAULT_MAX_FLOW_DEPTH).unwrap_err();

    assert!(matches!(err, FormflowError::StructuralConflict(_)));
}

#[tokio::test]
async fn flow_past_configured_depth_leaves_form_untouched() {
    let config = EngineConfig {
        max_flow_depth: 2,
        ..EngineConfig::default()
    };
    let engine = FormEngine::new(MemoryStore::new(), config);
    let form = create_form(&engine, "Shallow").await;
    let too_deep = vec![TreeNode::new(
        "q1",
        "question",
        "Role?",
        vec![TreeNode::new(
            "o1",
            "option",
            "Dev",
            vec![TreeNode::new("q2", "question", "Stack?", vec![TreeNode::leaf("o2", "option", "Rust")])],
        )],
    )];

    let err = engine.reconcile_flow(form.id, &too_deep).await.unwrap_err();

    assert!(matches!(err, FormflowError::StructuralConflict(_)));
    assert_eq!(engine.get_form(form.id).await.unwrap().current_flow_version, 0);

    engine.reconcile_flow(form.id, &feedback_tree()).await.unwrap();
    assert_eq!(engine.get_flow(form.id).await.unwrap().version, 1);
}

#[tokio::test]
async fn flat_payload_reconciles_like_nested_one() {
    let engine = engine();
    let form = create_form(&engine, "Flat").await;
    let payload: FlowPayload = serde_json::from_str(
        r#"{"nodes":[
            {"id":"great","parentId":"q1","type":"option","label":"Great","orderIndex":0},
            {"id":"q1","type":"question","label":"How was it?"},
            {"id":"why","parentId":"meh","type":"input","label":"What should we improve?"},
            {"id":"meh","parentId":"q1","type":"option","label":"Could be better","orderIndex":1}
        ]}"#,
    )
    .unwrap();

    engine.reconcile_flow(form.id, &payload.into_tree(engine.config().max_flow_depth).unwrap()).await.unwrap();
    let flow = engine.get_flow(form.id).await.unwrap();

    assert_eq!(flow_shape(&flow.blocks), tree_shape(&feedback_tree()));
}

#[tokio::test]
async fn flow_of_unknown_form_is_not_found() {
    let engine = engine();

    let err = engine.get_flow(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, FormflowError::NotFound(_)));

    let err = engine.reconcile_flow(Uuid::new_v4(), &feedback_tree()).await.unwrap_err();
    assert!(matches!(err, FormflowError::NotFound(_)));
}

#[tokio::test]
async fn new_form_has_empty_flow() {
    let engine = engine();
    let form = create_form(&engine, "Empty").await;

    let flow = engine.get_flow(form.id).await.unwrap();

    assert!(flow.blocks.is_empty());
    assert_eq!(flow.version, 0);
    assert!(flow.flow_id.is_none());
}

#[tokio::test]
async fn concurrent_edits_of_one_form_are_serialized() {
    let engine = engine();
    let form = create_form(&engine, "Busy").await;
    let tree = feedback_tree();

    let results = futures::future::join_all((0..8).map(|_| engine.reconcile_flow(form.id, &tree))).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(engine.get_form(form.id).await.unwrap().current_flow_version, 8);

    // every edit reused the ids minted by the first one
    let first = results[0].as_ref().unwrap();
    assert!(results.iter().all(|r| r.as_ref().unwrap().mapping == first.mapping));
}
