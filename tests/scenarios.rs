// End-to-end editing sessions driven through the builder facade.
use std::cell::RefCell;
use std::rc::Rc;

use mockall::mock;
use rulebuilder::{
    Area, BlockTemplate, Condition, FieldCatalog, GroupOperator, OperatorKind, Rule,
    RuleBuilder, RuleChangeListener, RuleNode, SyncReport,
};
use serde_json::json;

mock! {
    Listener {}

    impl RuleChangeListener for Listener {
        fn on_rule_change(&mut self, rule: &Rule);
        fn on_normalized(&mut self, report: &SyncReport);
    }
}

fn recording_builder() -> (Rc<RefCell<Vec<Rule>>>, RuleBuilder) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let builder = RuleBuilder::new("#rule-builder", FieldCatalog::builtin(), move |rule: &Rule| {
        sink.borrow_mut().push(rule.clone())
    });
    (seen, builder)
}

#[test]
fn and_group_with_two_conditions_and_an_alert() {
    let (seen, mut builder) = recording_builder();

    builder.add_block(BlockTemplate::GroupAnd);
    let group = builder
        .visual()
        .block_at(Area::Conditions, &[0])
        .expect("group block rendered");
    assert!(builder.add_condition_to_group_with(group, Condition::new("cpu", OperatorKind::Gt, "80")));
    assert!(builder.add_condition_to_group_with(group, Condition::new("mem", OperatorKind::Lt, "50")));
    builder.add_block(BlockTemplate::Action);

    let rule = builder.get_rule();
    assert_eq!(
        rule.to_value(),
        json!({
            "conditions": {
                "type": "group",
                "operator": "AND",
                "children": [
                    {"type": "condition", "field": "cpu", "operator": "gt", "value": "80"},
                    {"type": "condition", "field": "mem", "operator": "lt", "value": "50"}
                ]
            },
            "actions": [{
                "type": "send_alert",
                "severity": "warning",
                "channel": "default",
                "message_template": "🔔 {{rule_name}}: {{triggered_conditions}}"
            }]
        })
    );
    assert!(builder.validate().is_empty());

    assert_eq!(seen.borrow().len(), 4);
    assert_eq!(seen.borrow().last(), Some(&rule));
    assert!(builder.preview().contains("\"message_template\""));
}

#[test]
fn rapid_adds_to_not_group_keep_first_child() {
    let mut listener = MockListener::new();
    listener.expect_on_rule_change().times(3).return_const(());
    listener
        .expect_on_normalized()
        .times(1)
        .withf(|report| report.discarded_children() == 1 && report.skipped_blocks == 0)
        .return_const(());

    let mut builder = RuleBuilder::new("#rule-builder", FieldCatalog::builtin(), listener);
    builder.add_block(BlockTemplate::GroupNot);
    let not = builder
        .visual()
        .block_at(Area::Conditions, &[0])
        .expect("not block rendered");

    let first = Condition::new("cpu", OperatorKind::Gt, "90");
    let second = Condition::new("mem", OperatorKind::Gt, "95");
    assert!(builder.add_condition_to_group_with(not, first.clone()));
    assert!(builder.add_condition_to_group_with(not, second));

    let rule = builder.get_rule();
    let group = rule.conditions.as_group().expect("group root");
    assert_eq!(group.operator, GroupOperator::Not);
    assert_eq!(group.children, vec![RuleNode::Condition(first)]);
    assert_eq!(builder.visual().children(rulebuilder::Container::Area(Area::Conditions)).len(), 1);
}

#[test]
fn empty_or_group_reports_exactly_one_error() {
    let rule = Rule::from_json(
        r#"{
            "conditions": {"type": "group", "operator": "OR", "children": []},
            "actions": [{"type": "send_alert", "severity": "critical"}]
        }"#,
    )
    .expect("document parses");

    let mut builder = RuleBuilder::new("#rule-builder", FieldCatalog::builtin(), |_: &Rule| {});
    builder.set_rule(&rule);
    assert_eq!(builder.validate(), vec!["at least one condition required in the group"]);
}

#[test]
fn host_edits_round_trip_through_set_rule() {
    let (seen, mut builder) = recording_builder();
    builder.add_block(BlockTemplate::Condition);
    let condition = builder
        .visual()
        .block_at(Area::Conditions, &[0])
        .expect("condition rendered");
    assert!(builder.edit(condition, rulebuilder::Control::Field, "latency_ms"));
    assert!(builder.edit(condition, rulebuilder::Control::Operator, "gte"));
    assert!(builder.edit(condition, rulebuilder::Control::Value, "250"));
    builder.add_block(BlockTemplate::Action);

    let saved = builder.get_rule().to_json_pretty().expect("serializes");
    let mut reopened = RuleBuilder::new("#other", FieldCatalog::builtin(), |_: &Rule| {});
    reopened.set_rule(&Rule::from_json(&saved).expect("parses"));

    assert_eq!(reopened.get_rule(), builder.get_rule());
    assert!(reopened.validate().is_empty());
    assert_eq!(seen.borrow().len(), 5);
    assert!(reopened
        .visual()
        .to_string()
        .contains("[condition] Latency (ms) gte 250"));
}
