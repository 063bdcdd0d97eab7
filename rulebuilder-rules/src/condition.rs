use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::tokens::{GroupOperator, OperatorKind};

/// Leaf predicate comparing a catalog field against a value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Condition {
    /// Name of a catalog field. Empty while the user is still choosing.
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub operator: OperatorKind,
    /// Raw comparison value. Empty means "no value".
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
}

impl Condition {
    /// A blank condition: no field, `eq`, no value.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(field: impl Into<String>, operator: OperatorKind, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Boolean combinator over an ordered list of child nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub operator: GroupOperator,
    #[serde(default)]
    pub children: Vec<RuleNode>,
}

impl Group {
    pub fn new(operator: GroupOperator) -> Self {
        Self {
            operator,
            children: Vec::new(),
        }
    }

    pub fn with_children(operator: GroupOperator, children: Vec<RuleNode>) -> Self {
        Self { operator, children }
    }

    /// Drops children beyond the operator's arity. Returns how many were discarded.
    pub fn enforce_arity(&mut self) -> usize {
        match self.operator.max_children() {
            Some(max) if self.children.len() > max => {
                let discarded = self.children.len() - max;
                self.children.truncate(max);
                discarded
            }
            _ => 0,
        }
    }

    /// Whether another child may be appended without breaking the arity bound.
    pub fn accepts_child(&self) -> bool {
        self.operator
            .max_children()
            .map_or(true, |max| self.children.len() < max)
    }
}

/// Node of the condition tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleNode {
    Condition(Condition),
    Group(Group),
}

impl RuleNode {
    /// The tree every new rule starts from: an `AND` group with no children.
    pub fn root() -> Self {
        RuleNode::Group(Group::new(GroupOperator::And))
    }

    pub fn condition(condition: Condition) -> Self {
        RuleNode::Condition(condition)
    }

    pub fn group(operator: GroupOperator) -> Self {
        RuleNode::Group(Group::new(operator))
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            RuleNode::Group(group) => Some(group),
            RuleNode::Condition(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            RuleNode::Group(group) => Some(group),
            RuleNode::Condition(_) => None,
        }
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            RuleNode::Condition(condition) => Some(condition),
            RuleNode::Group(_) => None,
        }
    }

    /// Kind tag as it appears in the serialized document.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleNode::Condition(_) => "condition",
            RuleNode::Group(_) => "group",
        }
    }

    /// Number of leaf conditions anywhere below this node.
    pub fn condition_count(&self) -> usize {
        match self {
            RuleNode::Condition(_) => 1,
            RuleNode::Group(group) => group.children.iter().map(RuleNode::condition_count).sum(),
        }
    }
}

impl Default for RuleNode {
    fn default() -> Self {
        RuleNode::root()
    }
}

impl From<Condition> for RuleNode {
    fn from(value: Condition) -> Self {
        RuleNode::Condition(value)
    }
}

impl From<Group> for RuleNode {
    fn from(value: Group) -> Self {
        RuleNode::Group(value)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = if self.field.is_empty() { "?" } else { &self.field };
        let value = if self.value.is_empty() { "?" } else { &self.value };
        write!(f, "{} {} {}", field, self.operator, value)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator == GroupOperator::Not {
            return match self.children.first() {
                Some(child) => write!(f, "NOT ({})", child),
                None => f.write_str("NOT ()"),
            };
        }

        if self.children.is_empty() {
            return write!(f, "{} ()", self.operator);
        }

        f.write_str("(")?;
        for (index, child) in self.children.iter().enumerate() {
            if index > 0 {
                write!(f, " {} ", self.operator)?;
            }
            write!(f, "{}", child)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleNode::Condition(condition) => fmt::Display::fmt(condition, f),
            RuleNode::Group(group) => fmt::Display::fmt(group, f),
        }
    }
}

/// Accepts strings, numbers and booleans; `null` becomes the empty string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}
