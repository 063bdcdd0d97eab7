//! Projects the canonical rule into the visual tree.
//!
//! A full render rebuilds every block. A refresh keeps block identity and only
//! brings derived presentation (labels, affordances, placeholders, alert-only
//! controls) in line with the values the user has entered.

use rulebuilder_core::escape_markup;
use rulebuilder_rules::{
    Action, ActionKind, Channel, Condition, FieldCatalog, Group, GroupOperator, OperatorKind,
    Rule, RuleNode, Severity, DEFAULT_MESSAGE_TEMPLATE,
};
use tracing::trace;

use crate::visual::{Area, Block, BlockId, BlockKind, Container, Control, ControlState, VisualTree};

/// Renders rules using the host's field catalog for selector options and labels.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    catalog: &'a FieldCatalog,
}

impl<'a> Renderer<'a> {
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self { catalog }
    }

    /// Replaces the whole content of `tree` with blocks for `rule`.
    ///
    /// An `AND`/`OR` root's children go straight into the conditions area. A
    /// `NOT` root is shown as its own group block, since the area cannot carry
    /// a negation. A bare root condition becomes the area's only block.
    pub fn render(&self, tree: &mut VisualTree, rule: &Rule) {
        tree.reset();

        let conditions = Container::Area(Area::Conditions);
        match &rule.conditions {
            RuleNode::Group(root) if root.operator == GroupOperator::Not => {
                self.render_group(tree, conditions, root);
            }
            RuleNode::Group(root) => {
                for child in &root.children {
                    self.render_node(tree, conditions, child);
                }
            }
            RuleNode::Condition(condition) => {
                self.render_condition(tree, conditions, condition);
            }
        }

        for action in &rule.actions {
            self.render_action(tree, action);
        }

        trace!(generation = tree.generation(), blocks = tree.len(), "rendered rule");
    }

    pub fn render_node(&self, tree: &mut VisualTree, container: Container, node: &RuleNode) -> Option<BlockId> {
        match node {
            RuleNode::Condition(condition) => self.render_condition(tree, container, condition),
            RuleNode::Group(group) => self.render_group(tree, container, group),
        }
    }

    pub fn render_condition(
        &self,
        tree: &mut VisualTree,
        container: Container,
        condition: &Condition,
    ) -> Option<BlockId> {
        tree.append(container, self.condition_block(condition))
    }

    fn condition_block(&self, condition: &Condition) -> Block {
        let mut field_options = vec![String::new()];
        field_options.extend(self.catalog.names());
        if !field_options.contains(&condition.field) {
            field_options.push(condition.field.clone());
        }

        Block::new(BlockKind::Condition, self.condition_label(condition))
            .with_select(Control::Field, condition.field.clone(), field_options)
            .with_select(
                Control::Operator,
                condition.operator.as_str(),
                OperatorKind::ALL.iter().map(OperatorKind::as_str),
            )
            .with_input(Control::Value, condition.value.clone())
    }

    fn render_group(&self, tree: &mut VisualTree, container: Container, group: &Group) -> Option<BlockId> {
        let block = Block::new(BlockKind::Group, escape_markup(group.operator.as_str()))
            .with_select(
                Control::Operator,
                group.operator.as_str(),
                GroupOperator::ALL.iter().map(GroupOperator::as_str),
            )
            .accepting_children(group.accepts_child());
        let id = tree.append(container, block)?;

        let nested = Container::Group(id);
        if group.children.is_empty() {
            tree.append(nested, placeholder());
        }
        for child in &group.children {
            self.render_node(tree, nested, child);
        }
        Some(id)
    }

    pub fn render_action(&self, tree: &mut VisualTree, action: &Action) -> Option<BlockId> {
        let mut block = Block::new(BlockKind::Action, action_label(action.kind.as_str(), action.severity.as_str()))
            .with_select(
                Control::Type,
                action.kind.as_str(),
                ActionKind::ALL.iter().map(ActionKind::as_str),
            )
            .with_select(
                Control::Severity,
                action.severity.as_str(),
                Severity::ALL.iter().map(Severity::as_str),
            );

        if action.kind.carries_alert_fields() {
            block.set_control_state(Control::Channel, channel_state(action.channel.unwrap_or(Channel::Default)));
            block.set_control_state(
                Control::MessageTemplate,
                template_state(action.message_template.as_deref().unwrap_or(DEFAULT_MESSAGE_TEMPLATE)),
            );
        }

        tree.append(Container::Area(Area::Actions), block)
    }

    /// Updates every block in place from its own control values.
    pub fn refresh(&self, tree: &mut VisualTree) {
        for area in [Area::Conditions, Area::Actions] {
            for id in tree.descendants(Container::Area(area)) {
                let Some(kind) = tree.get(id).map(|block| block.kind().clone()) else {
                    continue;
                };
                match kind {
                    BlockKind::Condition => self.refresh_condition(tree, id),
                    BlockKind::Group => refresh_group(tree, id),
                    BlockKind::Action => refresh_action(tree, id),
                    BlockKind::Placeholder | BlockKind::Unrecognized(_) => {}
                }
            }
        }
        trace!(generation = tree.generation(), blocks = tree.len(), "refreshed blocks");
    }

    fn refresh_condition(&self, tree: &mut VisualTree, id: BlockId) {
        let Some(block) = tree.get(id) else {
            return;
        };
        let Some(operator) = block
            .control(Control::Operator)
            .and_then(|raw| raw.parse::<OperatorKind>().ok())
        else {
            return;
        };
        let condition = Condition::new(
            block.control(Control::Field).unwrap_or_default(),
            operator,
            block.control(Control::Value).unwrap_or_default(),
        );
        let label = self.condition_label(&condition);
        if let Some(block) = tree.get_mut(id) {
            block.set_label(label);
        }
    }

    /// Escaped one-line label, e.g. `CPU usage (%) gt 80`.
    pub fn condition_label(&self, condition: &Condition) -> String {
        let field = if condition.field.is_empty() {
            "(field)"
        } else {
            self.catalog.label_for(&condition.field)
        };
        let value = if condition.value.is_empty() {
            "(value)"
        } else {
            condition.value.as_str()
        };
        escape_markup(&format!("{} {} {}", field, condition.operator, value))
    }
}

fn action_label(kind: &str, severity: &str) -> String {
    escape_markup(&format!("{} · {}", kind, severity))
}

fn channel_state(channel: Channel) -> ControlState {
    ControlState {
        value: channel.as_str().to_string(),
        options: Channel::ALL.iter().map(|c| c.as_str().to_string()).collect(),
    }
}

fn template_state(template: &str) -> ControlState {
    ControlState {
        value: template.to_string(),
        options: Vec::new(),
    }
}

fn placeholder() -> Block {
    Block::new(BlockKind::Placeholder, "empty group")
}

/// Keeps the placeholder only while a group is empty and recomputes its affordance.
fn refresh_group(tree: &mut VisualTree, id: BlockId) {
    let Some(block) = tree.get(id) else {
        return;
    };
    let operator = block
        .control(Control::Operator)
        .and_then(|raw| raw.parse::<GroupOperator>().ok());
    let members = block
        .children()
        .iter()
        .filter(|child| {
            tree.get(**child)
                .is_some_and(|child| *child.kind() != BlockKind::Placeholder)
        })
        .count();
    let has_placeholder = block.children().len() > members;

    if members == 0 && !has_placeholder {
        tree.append(Container::Group(id), placeholder());
    } else if members > 0 && has_placeholder {
        tree.clear_placeholders(id);
    }

    if let (Some(operator), Some(block)) = (operator, tree.get_mut(id)) {
        block.set_label(escape_markup(operator.as_str()));
        block.set_accepts_children(operator.max_children().map_or(true, |max| members < max));
    }
}

/// Alert-only controls appear with defaults for `send_alert` and are dropped otherwise.
fn refresh_action(tree: &mut VisualTree, id: BlockId) {
    let Some(block) = tree.get_mut(id) else {
        return;
    };
    let Some(kind) = block
        .control(Control::Type)
        .and_then(|raw| raw.parse::<ActionKind>().ok())
    else {
        return;
    };

    if kind.carries_alert_fields() {
        if block.control(Control::Channel).is_none() {
            block.set_control_state(Control::Channel, channel_state(Channel::Default));
        }
        if block.control(Control::MessageTemplate).is_none() {
            block.set_control_state(Control::MessageTemplate, template_state(DEFAULT_MESSAGE_TEMPLATE));
        }
    } else {
        block.remove_control(Control::Channel);
        block.remove_control(Control::MessageTemplate);
    }

    let severity = block.control(Control::Severity).unwrap_or_default().to_string();
    block.set_label(action_label(kind.as_str(), &severity));
}
