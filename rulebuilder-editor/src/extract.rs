//! Rebuilds the canonical rule from the current visual tree.
//!
//! Extraction is authoritative and best-effort: order comes from visual
//! position only, blocks that cannot be parsed are skipped, and `NOT` groups
//! are cut down to their first child on every pass.

use rulebuilder_rules::{
    Action, ActionKind, Channel, Condition, Group, GroupOperator, OperatorKind, RuleNode,
    Severity, DEFAULT_MESSAGE_TEMPLATE,
};
use tracing::{debug, warn};

use crate::visual::{Area, Block, BlockId, BlockKind, Container, Control, VisualTree};

/// A `NOT` group that held more than one child when it was extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncatedGroup {
    /// Position of the group in the rebuilt tree; empty for the root.
    pub path: Vec<usize>,
    pub discarded: usize,
}

/// What an extraction pass dropped on the way to the canonical model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Blocks whose kind or controls could not be parsed.
    pub skipped_blocks: usize,
    pub truncated_groups: Vec<TruncatedGroup>,
}

impl SyncReport {
    /// True when the rebuilt model reflects every block in the tree.
    pub fn is_lossless(&self) -> bool {
        self.skipped_blocks == 0 && self.truncated_groups.is_empty()
    }

    pub fn discarded_children(&self) -> usize {
        self.truncated_groups.iter().map(|group| group.discarded).sum()
    }
}

/// Output of one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub conditions: RuleNode,
    pub actions: Vec<Action>,
    pub report: SyncReport,
}

/// Walks `tree` and rebuilds the rule parts.
///
/// A lone group block in the conditions area becomes the root. Otherwise the
/// area's blocks are combined with the previous `AND`/`OR` root operator, or
/// with `AND` when the previous root was `NOT` or a bare condition. Both
/// readings agree, because `AND`/`OR` over a single child is that child. A
/// bare root condition stays bare while it is the area's only block.
pub fn extract(tree: &VisualTree, previous_root: &RuleNode) -> Extraction {
    let mut report = SyncReport::default();
    let conditions = extract_conditions(tree, previous_root, &mut report);
    let actions = extract_actions(tree, &mut report);

    if !report.truncated_groups.is_empty() {
        warn!(
            groups = report.truncated_groups.len(),
            discarded = report.discarded_children(),
            "NOT group held more than one child; extra children discarded"
        );
    }
    debug!(
        conditions = conditions.condition_count(),
        actions = actions.len(),
        skipped = report.skipped_blocks,
        "extracted rule from visual tree"
    );

    Extraction {
        conditions,
        actions,
        report,
    }
}

fn extract_conditions(tree: &VisualTree, previous_root: &RuleNode, report: &mut SyncReport) -> RuleNode {
    let top = tree.children(Container::Area(Area::Conditions));

    // The area cannot express a negation; a `NOT` root is rendered as its own block.
    let area_operator = match previous_root {
        RuleNode::Group(group) if group.operator != GroupOperator::Not => group.operator,
        _ => GroupOperator::And,
    };

    let unwrapped = match top {
        [only] => tree
            .get(*only)
            .filter(|block| *block.kind() == BlockKind::Group)
            .map(|block| (*only, block)),
        _ => None,
    };

    if let Some((id, block)) = unwrapped {
        let operator = parse_control::<GroupOperator>(block, Control::Operator).unwrap_or(area_operator);
        let children = extract_list(tree, tree.children(Container::Group(id)), &[], report);
        let mut root = Group::with_children(operator, children);
        record_truncation(&mut root, Vec::new(), report);
        return RuleNode::Group(root);
    }

    let mut children = extract_list(tree, top, &[], report);

    if matches!(previous_root, RuleNode::Condition(_))
        && children.len() == 1
        && matches!(children[0], RuleNode::Condition(_))
    {
        return children.remove(0);
    }

    let mut root = Group::with_children(area_operator, children);
    record_truncation(&mut root, Vec::new(), report);
    RuleNode::Group(root)
}

fn extract_list(tree: &VisualTree, ids: &[BlockId], parent_path: &[usize], report: &mut SyncReport) -> Vec<RuleNode> {
    let mut nodes = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(block) = tree.get(*id) else {
            continue;
        };
        let mut path = parent_path.to_vec();
        path.push(nodes.len());

        match block.kind() {
            BlockKind::Condition => match read_condition(block) {
                Some(condition) => nodes.push(RuleNode::Condition(condition)),
                None => skip(block, report),
            },
            BlockKind::Group => {
                let Some(operator) = parse_control::<GroupOperator>(block, Control::Operator) else {
                    skip(block, report);
                    continue;
                };
                let children = extract_list(tree, tree.children(Container::Group(*id)), &path, report);
                let mut group = Group::with_children(operator, children);
                record_truncation(&mut group, path, report);
                nodes.push(RuleNode::Group(group));
            }
            BlockKind::Placeholder => {}
            BlockKind::Action | BlockKind::Unrecognized(_) => skip(block, report),
        }
    }
    nodes
}

fn read_condition(block: &Block) -> Option<Condition> {
    let operator = parse_control::<OperatorKind>(block, Control::Operator)?;
    Some(Condition {
        field: block.control(Control::Field).unwrap_or_default().to_string(),
        operator,
        value: block.control(Control::Value).unwrap_or_default().to_string(),
    })
}

fn extract_actions(tree: &VisualTree, report: &mut SyncReport) -> Vec<Action> {
    let mut actions = Vec::new();
    for id in tree.children(Container::Area(Area::Actions)) {
        let Some(block) = tree.get(*id) else {
            continue;
        };
        if *block.kind() != BlockKind::Action {
            skip(block, report);
            continue;
        }
        match read_action(block) {
            Some(action) => actions.push(action),
            None => skip(block, report),
        }
    }
    actions
}

fn read_action(block: &Block) -> Option<Action> {
    let kind = parse_control::<ActionKind>(block, Control::Type)?;
    let severity = parse_control::<Severity>(block, Control::Severity)?;

    // Alert fields left behind by an earlier type are ignored.
    let (channel, message_template) = if kind.carries_alert_fields() {
        let channel = parse_control::<Channel>(block, Control::Channel).unwrap_or(Channel::Default);
        let template = block
            .control(Control::MessageTemplate)
            .unwrap_or(DEFAULT_MESSAGE_TEMPLATE)
            .to_string();
        (Some(channel), Some(template))
    } else {
        (None, None)
    };

    Some(Action {
        kind,
        severity,
        channel,
        message_template,
    })
}

fn parse_control<T: std::str::FromStr>(block: &Block, control: Control) -> Option<T> {
    block.control(control)?.parse().ok()
}

fn record_truncation(group: &mut Group, path: Vec<usize>, report: &mut SyncReport) {
    let discarded = group.enforce_arity();
    if discarded > 0 {
        report.truncated_groups.push(TruncatedGroup { path, discarded });
    }
}

fn skip(block: &Block, report: &mut SyncReport) {
    debug!(kind = block.kind().tag(), "skipping unparsable block");
    report.skipped_blocks += 1;
}
