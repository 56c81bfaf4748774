use super::{ActionKind, Plan, Step, StepArgs, FALLBACK_REPLY_TEXT};
use serde_json::{json, Map};

#[test]
fn action_kind_parses_only_known_tags() {
    for kind in ActionKind::ALL {
        assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(ActionKind::parse("delete_everything"), None);
    assert_eq!(ActionKind::parse("Reply"), None);
}

#[test]
fn ordering_rules_point_at_previous_stage() {
    assert_eq!(
        ActionKind::BuildSpecs.required_predecessor(),
        Some(ActionKind::IngestDocs)
    );
    assert_eq!(
        ActionKind::GenAll.required_predecessor(),
        Some(ActionKind::BuildSpecs)
    );
    assert_eq!(ActionKind::Reply.required_predecessor(), None);
    assert_eq!(ActionKind::McpTool.required_predecessor(), None);
}

#[test]
fn mcp_args_accept_legacy_server_cmd_and_drop_wrong_types() {
    let raw = json!({
        "server_cmd": "uvx diagram-server",
        "tool": 42,
        "params": {"code": "x"},
        "unrelated": true
    });
    let args = StepArgs::from_raw(
        ActionKind::McpTool,
        raw.as_object().expect("object"),
    );
    match &args {
        StepArgs::McpTool {
            server_command,
            tool,
            params,
        } => {
            assert_eq!(server_command.as_deref(), Some("uvx diagram-server"));
            assert_eq!(tool, &None);
            assert_eq!(params.get("code"), Some(&json!("x")));
        }
        other => panic!("unexpected args: {other:?}"),
    }
    let encoded = args.to_raw();
    assert_eq!(encoded.get("server_command"), Some(&json!("uvx diagram-server")));
    assert!(encoded.get("unrelated").is_none());
}

#[test]
fn blank_reply_text_is_absent() {
    let raw = json!({"text": "   "});
    let args = StepArgs::from_raw(ActionKind::Reply, raw.as_object().expect("object"));
    assert_eq!(args, StepArgs::Reply { text: None });
    assert!(StepArgs::default_for(ActionKind::GenAll).to_raw().is_empty());
    assert_eq!(
        StepArgs::from_raw(ActionKind::IngestDocs, &Map::new()),
        StepArgs::IngestDocs { force: false }
    );
}

#[test]
fn dependencies_stay_unique_in_insertion_order() {
    let mut step = Step::of_kind(3, ActionKind::GenAll).with_deps([2, 1, 2]);
    assert_eq!(step.depends_on, vec![2, 1]);
    assert!(!step.add_dependency(1));
    assert!(step.add_dependency(7));
    assert_eq!(step.depends_on, vec![2, 1, 7]);
}

#[test]
fn canonical_fallback_is_linear_chain() {
    let plan = Plan::canonical_fallback();
    assert_eq!(plan.ids(), vec![1, 2, 3, 4]);
    let actions = plan.steps.iter().map(Step::action).collect::<Vec<_>>();
    assert_eq!(
        actions,
        vec![
            ActionKind::IngestDocs,
            ActionKind::BuildSpecs,
            ActionKind::GenAll,
            ActionKind::Reply
        ]
    );
    assert!(plan.steps[0].depends_on.is_empty());
    assert_eq!(plan.steps[1].depends_on, vec![1]);
    assert_eq!(plan.steps[2].depends_on, vec![2]);
    assert_eq!(plan.steps[3].depends_on, vec![3]);
    assert_eq!(
        plan.get(4).map(|step| step.args.clone()),
        Some(StepArgs::Reply {
            text: Some(FALLBACK_REPLY_TEXT.to_string())
        })
    );
}

#[test]
fn plan_serializes_to_wire_shape_and_back() {
    let plan = Plan::new(vec![
        Step::of_kind(1, ActionKind::IngestDocs),
        Step::new(
            2,
            StepArgs::Reply {
                text: Some("done".to_string()),
            },
        )
        .with_deps([1]),
    ]);
    let value = serde_json::to_value(&plan).expect("must encode");
    assert_eq!(
        value,
        json!({"steps": [
            {"id": 1, "action": "ingest_docs", "args": {}, "depends_on": []},
            {"id": 2, "action": "reply", "args": {"text": "done"}, "depends_on": [1]}
        ]})
    );
    assert_eq!(plan.to_value(), value);
    let decoded: Plan = serde_json::from_value(value).expect("must decode");
    assert_eq!(decoded, plan);
}

#[test]
fn typed_decode_rejects_unknown_action() {
    let value = json!({"steps": [{"id": 1, "action": "delete_everything"}]});
    let error = serde_json::from_value::<Plan>(value).expect_err("must reject");
    assert!(error.to_string().contains("delete_everything"));
}
