mod common;

use common::*;
use formflow::errors::FormflowError;
use formflow::models::block::tree::TreeNode;
use uuid::Uuid;

#[tokio::test]
async fn feedback_scenario_end_to_end() {
    let engine = engine();
    let form = create_form(&engine, "Feedback").await;
    let tree = vec![TreeNode::new(
        "q1",
        "question",
        "Would you recommend us?",
        vec![TreeNode::leaf("yes", "option", "Yes"), TreeNode::leaf("no", "option", "No")],
    )];
    let update = engine.reconcile_flow(form.id, &tree).await.unwrap();
    engine.publish(form.id, Some("feedback")).await.unwrap();

    let public = engine.resolve_public_form("feedback").await.unwrap();
    assert_eq!(public.title, "Feedback");
    assert!(public.accepting_responses);
    let options: Vec<Uuid> = public.flow.blocks[0].children.iter().map(|b| b.id).collect();
    assert_eq!(options, vec![update.mapping["yes"], update.mapping["no"]]);

    let batch = submission(
        vec![answer(options[0], "Yes"), answer(options[1], "No")],
        &[options[0], options[1]],
    );
    let receipt = engine.submit_responses("feedback", &batch).await.unwrap();

    let page = engine.list_responses(form.id, None, None).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, receipt.response_id);
    assert_eq!(page.items[0].flow_path.len(), 2);
    assert_eq!(page.items[0].flow_path, options);
}

#[tokio::test]
async fn closed_forms_reject_until_reopened() {
    let engine = engine();
    let form = published_form(&engine, "gated").await;
    let flow = engine.get_flow(form.id).await.unwrap();
    let root = flow.blocks[0].id;

    engine.set_accepting(form.id, false).await.unwrap();

    let valid = submission(vec![answer(root, "Great")], &[root]);
    let garbage = submission(vec![answer(Uuid::new_v4(), "?")], &[]);
    for batch in [&valid, &garbage] {
        let err = engine.submit_responses("gated", batch).await.unwrap_err();
        assert!(matches!(err, FormflowError::NotAccepting(_)));
    }
    assert!(!engine.resolve_public_form("gated").await.unwrap().accepting_responses);

    engine.set_accepting(form.id, true).await.unwrap();
    assert!(engine.submit_responses("gated", &valid).await.is_ok());
}

#[tokio::test]
async fn orphaned_connection_ids_are_rejected() {
    let engine = engine();
    let form = published_form(&engine, "edits").await;
    let first = engine.reconcile_flow(form.id, &feedback_tree()).await.unwrap();
    let why = first.mapping["why"];

    engine
        .reconcile_flow(form.id, &[TreeNode::leaf("q1", "question", "How was it?")])
        .await
        .unwrap();

    let err = engine
        .submit_responses("edits", &submission(vec![answer(why, "Faster")], &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, FormflowError::UnknownConnection(_)));

    let err = engine
        .submit_responses("edits", &submission(vec![answer(first.mapping["q1"], "ok")], &[why]))
        .await
        .unwrap_err();
    assert!(matches!(err, FormflowError::UnknownConnection(_)));

    assert_eq!(engine.list_responses(form.id, None, None).await.unwrap().total, 0);
}

#[tokio::test]
async fn empty_batches_are_rejected_after_identifier_checks() {
    let engine = engine();
    published_form(&engine, "empty").await;

    let err = engine.submit_responses("empty", &submission(vec![], &[])).await.unwrap_err();
    assert!(matches!(err, FormflowError::ValidationError(_)));

    let err = engine
        .submit_responses("empty", &submission(vec![], &[Uuid::new_v4()]))
        .await
        .unwrap_err();
    assert!(matches!(err, FormflowError::UnknownConnection(_)));
}

#[tokio::test]
async fn submissions_through_unknown_or_unpublished_slugs_are_not_found() {
    let engine = engine();
    let draft = create_form(&engine, "Draft").await;
    engine.reconcile_flow(draft.id, &feedback_tree()).await.unwrap();
    let root = engine.get_flow(draft.id).await.unwrap().blocks[0].id;
    let batch = submission(vec![answer(root, "Great")], &[root]);

    let err = engine.submit_responses(&draft.auto_slug, &batch).await.unwrap_err();
    assert!(matches!(err, FormflowError::NotFound(_)));

    let err = engine.submit_responses("missing", &batch).await.unwrap_err();
    assert!(matches!(err, FormflowError::NotFound(_)));
}

#[tokio::test]
async fn identical_submissions_are_stored_separately() {
    let engine = engine();
    let form = published_form(&engine, "twice").await;
    let root = engine.get_flow(form.id).await.unwrap().blocks[0].id;
    let batch = submission(vec![answer(root, "Great")], &[root]);

    let first = engine.submit_responses("twice", &batch).await.unwrap();
    let second = engine.submit_responses(&form.auto_slug, &batch).await.unwrap();

    assert_ne!(first.response_id, second.response_id);
    assert_eq!(engine.list_responses(form.id, None, None).await.unwrap().total, 2);
}

#[tokio::test]
async fn listing_pages_newest_first_with_clamped_parameters() {
    let engine = engine();
    let form = published_form(&engine, "pages").await;
    let root = engine.get_flow(form.id).await.unwrap().blocks[0].id;

    let mut ids = vec![];
    for _ in 0..12 {
        let receipt = engine
            .submit_responses("pages", &submission(vec![answer(root, "Great")], &[root]))
            .await
            .unwrap();
        ids.push(receipt.response_id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let page = engine.list_responses(form.id, None, None).await.unwrap();
    assert_eq!((page.total, page.limit, page.offset, page.items.len()), (12, 10, 0, 10));
    assert_eq!(page.items[0].id, ids[11]);

    let page = engine.list_responses(form.id, Some(5), Some(10)).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].id, ids[0]);

    let page = engine.list_responses(form.id, Some(500), Some(-3)).await.unwrap();
    assert_eq!((page.limit, page.offset), (10, 0));

    let page = engine.list_responses(form.id, Some(0), None).await.unwrap();
    assert_eq!(page.limit, 10);
}

#[tokio::test]
async fn response_detail_resolves_answers_and_values() {
    let engine = engine();
    let form = published_form(&engine, "detail").await;
    let flow = engine.get_flow(form.id).await.unwrap();
    let why = flow.blocks[0].children[1].children[0].id;

    let mut input = answer(why, "More coffee");
    input.answer_value = Some(serde_json::json!({"tags": ["coffee"]}));
    let receipt = engine
        .submit_responses("detail", &submission(vec![input], &[why]))
        .await
        .unwrap();

    let detail = engine.get_response(form.id, receipt.response_id).await.unwrap();

    assert_eq!(detail.answers[0].client_id.as_deref(), Some("why"));
    assert_eq!(detail.answers[0].block_type.as_deref(), Some("input"));
    assert_eq!(detail.answers[0].answer_value, Some(serde_json::json!({"tags": ["coffee"]})));
    assert_eq!(detail.total_time_spent, 10);

    let err = engine.get_response(form.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, FormflowError::NotFound(_)));
}

#[tokio::test]
async fn negative_times_are_rejected() {
    let engine = engine();
    let form = published_form(&engine, "timing").await;
    let root = engine.get_flow(form.id).await.unwrap().blocks[0].id;

    let mut batch = submission(vec![answer(root, "Great")], &[root]);
    batch.total_time_spent = -5;

    let err = engine.submit_responses("timing", &batch).await.unwrap_err();

    assert!(matches!(err, FormflowError::ValidationError(_)));
}
