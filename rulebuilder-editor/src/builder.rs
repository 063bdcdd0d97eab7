use std::fmt;
use std::str::FromStr;

use rulebuilder_core::BuilderConfig;
use rulebuilder_rules::{
    load_fields, validate, Action, Condition, FieldCatalog, Group, GroupOperator, Rule, RuleError,
    RuleNode,
};
use tracing::{debug, info, warn};

use crate::error::EditorError;
use crate::extract::{extract, SyncReport};
use crate::listener::RuleChangeListener;
use crate::render::Renderer;
use crate::visual::{Area, BlockId, BlockKind, Container, Control, VisualTree};

/// Toolbar entries that append a new node or action to the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTemplate {
    Condition,
    GroupAnd,
    GroupOr,
    GroupNot,
    Action,
}

impl BlockTemplate {
    fn node(self) -> Option<RuleNode> {
        match self {
            BlockTemplate::Condition => Some(RuleNode::Condition(Condition::empty())),
            BlockTemplate::GroupAnd => Some(RuleNode::group(GroupOperator::And)),
            BlockTemplate::GroupOr => Some(RuleNode::group(GroupOperator::Or)),
            BlockTemplate::GroupNot => Some(RuleNode::group(GroupOperator::Not)),
            BlockTemplate::Action => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockTemplate::Condition => "condition",
            BlockTemplate::GroupAnd => "group-and",
            BlockTemplate::GroupOr => "group-or",
            BlockTemplate::GroupNot => "group-not",
            BlockTemplate::Action => "action",
        }
    }
}

impl fmt::Display for BlockTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockTemplate {
    type Err = EditorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "condition" => Ok(BlockTemplate::Condition),
            "group-and" => Ok(BlockTemplate::GroupAnd),
            "group-or" => Ok(BlockTemplate::GroupOr),
            "group-not" => Ok(BlockTemplate::GroupNot),
            "action" => Ok(BlockTemplate::Action),
            other => Err(EditorError::UnknownBlockKind(other.to_string())),
        }
    }
}

/// Interactive editor state for one mounted rule.
///
/// The visual tree is what the user manipulates; after every gesture the
/// canonical [`Rule`] is re-derived from it and the host listener is notified.
/// Block handles survive lossless resynchronizations. Toolbar additions,
/// [`RuleBuilder::set_rule`] and any resync that had to drop blocks render the
/// tree from scratch, which expires every handle; use
/// [`VisualTree::block_at`] to find blocks again.
pub struct RuleBuilder {
    catalog: FieldCatalog,
    rule: Rule,
    tree: VisualTree,
    preview: String,
    last_report: SyncReport,
    listener: Box<dyn RuleChangeListener>,
}

impl fmt::Debug for RuleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBuilder")
            .field("mount", &self.tree.mount())
            .field("rule", &self.rule)
            .field("last_report", &self.last_report)
            .finish_non_exhaustive()
    }
}

impl RuleBuilder {
    /// Mounts a builder holding a fresh, empty rule.
    pub fn new<L>(mount: impl Into<String>, catalog: FieldCatalog, listener: L) -> Self
    where
        L: RuleChangeListener + 'static,
    {
        let mut builder = Self {
            catalog,
            rule: Rule::new(),
            tree: VisualTree::new(mount),
            preview: String::new(),
            last_report: SyncReport::default(),
            listener: Box::new(listener),
        };
        builder.render();
        builder
    }

    /// Mounts a builder from host configuration, loading the field catalog if one is configured.
    pub fn from_config<L>(config: &BuilderConfig, listener: L) -> Result<Self, RuleError>
    where
        L: RuleChangeListener + 'static,
    {
        let catalog = match &config.fields_path {
            Some(path) => load_fields(path)?,
            None => FieldCatalog::builtin(),
        };
        info!(mount = %config.mount, fields = catalog.len(), "mounting rule builder");
        Ok(Self::new(config.mount.clone(), catalog, listener))
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn visual(&self) -> &VisualTree {
        &self.tree
    }

    /// Canonical serialized form of the current rule.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// What the most recent synchronization discarded, if anything.
    pub fn last_report(&self) -> &SyncReport {
        &self.last_report
    }

    /// Copy of the current rule; changes to it do not affect the builder.
    pub fn get_rule(&self) -> Rule {
        self.rule.clone()
    }

    /// Replaces the current rule with a copy of `rule` and renders it.
    pub fn set_rule(&mut self, rule: &Rule) {
        self.rule = rule.clone();
        self.last_report = SyncReport::default();
        self.render();
    }

    pub fn validate(&self) -> Vec<String> {
        validate(&self.rule)
    }

    /// Appends a new node to the root group (or a new action) and re-renders.
    ///
    /// A root that cannot take another child (a bare condition or a full
    /// `NOT` group) is wrapped in an `AND` group together with the new node.
    pub fn add_block(&mut self, template: BlockTemplate) {
        match template.node() {
            Some(node) => self.append_to_root(node),
            None => self.rule.actions.push(Action::default()),
        }
        debug!(kind = %template, "added block");
        self.render();
        self.notify(SyncReport::default());
    }

    fn append_to_root(&mut self, node: RuleNode) {
        let root = std::mem::take(&mut self.rule.conditions);
        self.rule.conditions = match root {
            RuleNode::Group(mut group) if group.accepts_child() => {
                group.children.push(node);
                RuleNode::Group(group)
            }
            full => RuleNode::Group(Group::with_children(GroupOperator::And, vec![full, node])),
        };
    }

    /// Removes a block from the visual tree, then resynchronizes.
    pub fn delete_block(&mut self, block: BlockId) -> bool {
        if !self.tree.remove(block) {
            debug!(?block, "delete ignored: block not in current render");
            return false;
        }
        self.resync();
        true
    }

    /// Appends a blank condition to a group block, then resynchronizes.
    pub fn add_condition_to_group(&mut self, group: BlockId) -> bool {
        self.add_condition_to_group_with(group, Condition::empty())
    }

    /// Appends a condition seeded with `condition` to a group block, then resynchronizes.
    ///
    /// The affordance is not re-checked: a full `NOT` group still takes the
    /// block and the next extraction keeps only its first child.
    pub fn add_condition_to_group_with(&mut self, group: BlockId, condition: Condition) -> bool {
        match self.tree.get(group) {
            Some(block) if *block.kind() == BlockKind::Group => {}
            _ => {
                debug!(?group, "add condition ignored: not a group in current render");
                return false;
            }
        }

        self.tree.clear_placeholders(group);
        let renderer = Renderer::new(&self.catalog);
        if renderer
            .render_condition(&mut self.tree, Container::Group(group), &condition)
            .is_none()
        {
            return false;
        }
        self.resync();
        true
    }

    /// Field-edit event: sets a control on a block, then resynchronizes.
    pub fn edit(&mut self, block: BlockId, control: Control, value: impl Into<String>) -> bool {
        if !self.tree.set_control(block, control, value) {
            debug!(?block, control = control.as_str(), "edit ignored");
            return false;
        }
        self.resync();
        true
    }

    /// Performs a drag gesture: moves the block, then raises the area's reorder notification.
    pub fn drag(&mut self, block: BlockId, destination: Container, index: usize) -> bool {
        if !self.tree.move_block(block, destination, index) {
            debug!(?block, "drag refused");
            return false;
        }
        let area = self.tree.area_of(block).unwrap_or(Area::Conditions);
        self.reorder_completed(area);
        true
    }

    /// Reorder-completed notification from the drag-and-drop collaborator.
    pub fn reorder_completed(&mut self, area: Area) {
        debug!(?area, "reorder completed");
        self.resync();
    }

    /// Re-derives the rule from the visual tree and notifies the host.
    ///
    /// A lossless pass refreshes the existing blocks in place; a lossy one
    /// renders the tree again so it shows what the rule actually kept.
    pub fn resync(&mut self) {
        let extraction = extract(&self.tree, &self.rule.conditions);
        self.rule.conditions = extraction.conditions;
        self.rule.actions = extraction.actions;

        if extraction.report.is_lossless() {
            Renderer::new(&self.catalog).refresh(&mut self.tree);
            self.update_preview();
        } else {
            self.render();
        }
        self.notify(extraction.report);
    }

    fn notify(&mut self, report: SyncReport) {
        if !report.is_lossless() {
            self.listener.on_normalized(&report);
        }
        self.last_report = report;
        self.listener.on_rule_change(&self.rule);
    }

    fn render(&mut self) {
        Renderer::new(&self.catalog).render(&mut self.tree, &self.rule);
        self.update_preview();
    }

    fn update_preview(&mut self) {
        self.preview = self.rule.to_json_pretty().unwrap_or_else(|err| {
            warn!(error = %err, "failed to serialize rule preview");
            String::new()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::MockRuleChangeListener;
    use rulebuilder_rules::{ActionKind, OperatorKind, Severity};
    use std::cell::RefCell;
    use std::rc::Rc;
    use test_case::test_case;

    fn silent() -> impl RuleChangeListener {
        |_: &Rule| {}
    }

    fn recording() -> (Rc<RefCell<Vec<Rule>>>, impl RuleChangeListener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |rule: &Rule| sink.borrow_mut().push(rule.clone()))
    }

    fn builder_with(rule: &Rule) -> RuleBuilder {
        let mut builder = RuleBuilder::new("#builder", FieldCatalog::builtin(), silent());
        builder.set_rule(rule);
        builder
    }

    #[test_case("condition", BlockTemplate::Condition)]
    #[test_case("group-and", BlockTemplate::GroupAnd)]
    #[test_case("group-or", BlockTemplate::GroupOr)]
    #[test_case("group-not", BlockTemplate::GroupNot)]
    #[test_case("action", BlockTemplate::Action)]
    fn parses_block_templates(raw: &str, expected: BlockTemplate) {
        assert_eq!(raw.parse::<BlockTemplate>(), Ok(expected));
        assert_eq!(expected.to_string(), raw);
    }

    #[test]
    fn rejects_unknown_template() {
        assert_eq!(
            "group-xor".parse::<BlockTemplate>(),
            Err(EditorError::UnknownBlockKind("group-xor".into()))
        );
    }

    #[test]
    fn add_block_notifies_with_new_rule() {
        let mut listener = MockRuleChangeListener::new();
        listener
            .expect_on_rule_change()
            .times(1)
            .withf(|rule| rule.actions == vec![Action::default()])
            .return_const(());

        let mut builder = RuleBuilder::new("#builder", FieldCatalog::builtin(), listener);
        builder.add_block(BlockTemplate::Action);
        assert_eq!(builder.visual().children(Container::Area(Area::Actions)).len(), 1);
        assert!(builder.preview().contains("\"send_alert\""));
    }

    #[test]
    fn set_rule_renders_without_notifying() {
        let listener = MockRuleChangeListener::new();
        let mut builder = RuleBuilder::new("#builder", FieldCatalog::builtin(), listener);
        let rule = Rule {
            conditions: Condition::new("cpu", OperatorKind::Gt, "80").into(),
            actions: vec![],
        };
        builder.set_rule(&rule);
        assert_eq!(builder.get_rule(), rule);
        assert_eq!(builder.visual().len(), 1);
    }

    #[test]
    fn get_rule_is_a_defensive_copy() {
        let mut builder = RuleBuilder::new("#builder", FieldCatalog::builtin(), silent());
        let mut copy = builder.get_rule();
        copy.actions.push(Action::default());
        assert!(builder.get_rule().actions.is_empty());

        let mut source = Rule::new();
        builder.set_rule(&source);
        source.actions.push(Action::default());
        assert!(builder.get_rule().actions.is_empty());
        builder.add_block(BlockTemplate::Condition);
        assert_eq!(builder.get_rule().conditions.condition_count(), 1);
    }

    #[test]
    fn delete_block_resynchronizes() {
        let (seen, listener) = recording();
        let mut builder = RuleBuilder::new("#builder", FieldCatalog::builtin(), listener);
        builder.set_rule(&Rule {
            conditions: RuleNode::Group(Group::with_children(
                GroupOperator::Or,
                vec![
                    Condition::new("cpu", OperatorKind::Gt, "80").into(),
                    Condition::new("mem", OperatorKind::Gt, "90").into(),
                ],
            )),
            actions: vec![Action::default()],
        });

        let cpu = builder.visual().block_at(Area::Conditions, &[0]).expect("cpu block");
        assert!(builder.delete_block(cpu));
        assert!(!builder.delete_block(cpu), "block already removed");

        let rule = builder.get_rule();
        assert_eq!(
            rule.conditions,
            RuleNode::Group(Group::with_children(
                GroupOperator::Or,
                vec![Condition::new("mem", OperatorKind::Gt, "90").into()],
            ))
        );
        assert_eq!(seen.borrow().as_slice(), &[rule]);
    }

    #[test]
    fn edits_flow_into_the_model() {
        let mut builder = builder_with(&Rule::new());
        builder.add_block(BlockTemplate::Condition);
        builder.add_block(BlockTemplate::Condition);

        let first = builder.visual().block_at(Area::Conditions, &[0]).expect("first");
        assert!(builder.edit(first, Control::Field, "disk"));
        assert!(builder.edit(first, Control::Operator, "gte"));
        assert!(builder.edit(first, Control::Value, "0"));
        assert_eq!(
            builder.visual().get(first).map(|block| block.label()),
            Some("Disk usage (%) gte 0")
        );

        let second = builder.visual().block_at(Area::Conditions, &[1]).expect("second");
        assert!(!builder.edit(second, Control::Field, "not_in_catalog"));

        let root = builder.get_rule().conditions;
        let group = root.as_group().expect("root group");
        assert_eq!(group.children[0], Condition::new("disk", OperatorKind::Gte, "0").into());
        assert_eq!(group.children[1], Condition::empty().into());
        assert_eq!(
            builder.validate(),
            vec![
                "condition missing field",
                "condition missing value",
                "at least one action required"
            ]
        );

        builder.add_block(BlockTemplate::Action);
        assert!(!builder.edit(first, Control::Value, "1"), "full render expires handles");
        assert_eq!(builder.validate(), vec!["condition missing field", "condition missing value"]);
    }

    #[test]
    fn action_type_edit_drops_alert_fields() {
        let mut builder = builder_with(&Rule::new());
        builder.add_block(BlockTemplate::Action);

        let action = builder.visual().block_at(Area::Actions, &[0]).expect("action");
        assert!(builder.edit(action, Control::Channel, "slack"));
        assert!(builder.edit(action, Control::Type, "webhook"));
        assert_eq!(builder.get_rule().actions, vec![Action::new(ActionKind::Webhook, Severity::Warning)]);
        let block = builder.visual().get(action).expect("still rendered");
        assert_eq!(block.control(Control::Channel), None);

        assert!(builder.edit(action, Control::Type, "send_alert"));
        let block = builder.visual().get(action).expect("still rendered");
        assert_eq!(block.control(Control::Channel), Some("default"));
        assert_eq!(builder.get_rule().actions, vec![Action::default()]);
    }

    #[test]
    fn drag_reorders_actions() {
        let mut builder = builder_with(&Rule {
            conditions: RuleNode::root(),
            actions: vec![
                Action::new(ActionKind::Suppress, Severity::Info),
                Action::new(ActionKind::CreateTicket, Severity::Critical),
            ],
        });
        let first = builder.visual().block_at(Area::Actions, &[0]).expect("first action");
        assert!(builder.drag(first, Container::Area(Area::Actions), 1));
        let kinds: Vec<_> = builder.get_rule().actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActionKind::CreateTicket, ActionKind::Suppress]);
    }

    #[test]
    fn drag_between_groups() {
        let mut builder = builder_with(&Rule {
            conditions: RuleNode::Group(Group::with_children(
                GroupOperator::And,
                vec![
                    Condition::new("cpu", OperatorKind::Gt, "80").into(),
                    RuleNode::group(GroupOperator::Or),
                ],
            )),
            actions: vec![],
        });
        let cpu = builder.visual().block_at(Area::Conditions, &[0]).expect("cpu");
        let or = builder.visual().block_at(Area::Conditions, &[1]).expect("or");
        assert!(builder.drag(cpu, Container::Group(or), 0));

        // The OR group is now the only top-level block and becomes the root.
        assert_eq!(
            builder.get_rule().conditions,
            RuleNode::Group(Group::with_children(
                GroupOperator::Or,
                vec![Condition::new("cpu", OperatorKind::Gt, "80").into()],
            ))
        );
    }

    #[test]
    fn truncation_is_reported_to_the_host() {
        let mut listener = MockRuleChangeListener::new();
        listener
            .expect_on_normalized()
            .times(1)
            .withf(|report| report.discarded_children() == 1)
            .return_const(());
        listener.expect_on_rule_change().times(2).return_const(());

        let mut builder = RuleBuilder::new("#builder", FieldCatalog::builtin(), listener);
        builder.set_rule(&Rule {
            conditions: RuleNode::Group(Group::with_children(
                GroupOperator::And,
                vec![
                    Condition::new("load", OperatorKind::Gt, "4").into(),
                    RuleNode::group(GroupOperator::Not),
                ],
            )),
            actions: vec![],
        });

        let not = builder.visual().block_at(Area::Conditions, &[1]).expect("not group");
        assert!(builder.add_condition_to_group_with(not, Condition::new("cpu", OperatorKind::Gt, "1")));
        let not = builder.visual().block_at(Area::Conditions, &[1]).expect("not group");
        assert!(!builder.visual().get(not).expect("rendered").accepts_children());
        assert!(builder.add_condition_to_group_with(not, Condition::new("mem", OperatorKind::Gt, "2")));

        let root = builder.get_rule().conditions;
        let not = root.as_group().expect("root").children[1].as_group().expect("not");
        assert_eq!(not.children, vec![Condition::new("cpu", OperatorKind::Gt, "1").into()]);
        assert_eq!(builder.last_report().truncated_groups[0].path, vec![1]);
    }

    #[test]
    fn adding_to_bare_condition_promotes_root() {
        let bare = Condition::new("cpu", OperatorKind::Gt, "80");
        let mut builder = builder_with(&Rule {
            conditions: bare.clone().into(),
            actions: vec![],
        });
        builder.add_block(BlockTemplate::GroupOr);
        assert_eq!(
            builder.get_rule().conditions,
            RuleNode::Group(Group::with_children(
                GroupOperator::And,
                vec![bare.into(), RuleNode::group(GroupOperator::Or)],
            ))
        );
    }

    #[test]
    fn full_not_root_is_wrapped_on_add() {
        let mut builder = builder_with(&Rule::new());
        builder.add_block(BlockTemplate::GroupNot);
        let not = builder.visual().block_at(Area::Conditions, &[0]).expect("not block");
        let negated = Condition::new("cpu", OperatorKind::Gt, "90");
        assert!(builder.add_condition_to_group_with(not, negated.clone()));
        assert_eq!(
            builder.get_rule().conditions,
            RuleNode::Group(Group::with_children(GroupOperator::Not, vec![negated.clone().into()]))
        );

        builder.add_block(BlockTemplate::Condition);
        let root = builder.get_rule().conditions;
        assert_eq!(root.condition_count(), 2);
        assert_eq!(
            root,
            RuleNode::Group(Group::with_children(
                GroupOperator::And,
                vec![
                    RuleNode::Group(Group::with_children(GroupOperator::Not, vec![negated.into()])),
                    Condition::empty().into(),
                ],
            ))
        );
        assert!(builder.last_report().is_lossless());
    }

    #[test]
    fn empty_not_root_takes_its_first_child() {
        let mut builder = builder_with(&Rule {
            conditions: RuleNode::group(GroupOperator::Not),
            actions: vec![],
        });
        builder.add_block(BlockTemplate::Condition);
        assert_eq!(
            builder.get_rule().conditions,
            RuleNode::Group(Group::with_children(GroupOperator::Not, vec![Condition::empty().into()]))
        );
    }

    #[test]
    fn editing_inside_a_negated_root_keeps_the_negation() {
        let (seen, listener) = recording();
        let mut builder = RuleBuilder::new("#builder", FieldCatalog::builtin(), listener);
        builder.set_rule(&Rule {
            conditions: RuleNode::Group(Group::with_children(
                GroupOperator::Not,
                vec![RuleNode::Group(Group::with_children(
                    GroupOperator::And,
                    vec![
                        Condition::new("cpu", OperatorKind::Gt, "80").into(),
                        Condition::new("mem", OperatorKind::Lt, "50").into(),
                    ],
                ))],
            )),
            actions: vec![Action::default()],
        });

        let cpu = builder.visual().block_at(Area::Conditions, &[0, 0, 0]).expect("cpu block");
        assert!(builder.edit(cpu, Control::Value, "85"));
        builder.resync();

        let root = builder.get_rule().conditions;
        assert_eq!(root.to_string(), "NOT ((cpu gt 85 AND mem lt 50))");
        assert!(builder.last_report().is_lossless());
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn non_group_targets_are_ignored() {
        let mut builder = builder_with(&Rule {
            conditions: Condition::new("cpu", OperatorKind::Gt, "80").into(),
            actions: vec![],
        });
        let cpu = builder.visual().block_at(Area::Conditions, &[0]).expect("cpu");
        assert!(!builder.add_condition_to_group(cpu));
        assert_eq!(builder.visual().len(), 1);
    }
}
