use rulebuilder_core::serde_utils::{from_json_str, to_pretty_json};
use rulebuilder_core::CoreResult;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::condition::RuleNode;

/// Canonical rule document: a condition tree plus the actions it triggers.
///
/// This is the artifact handed to the evaluation engine and to persistence.
/// `conditions` is usually a group but a single bare condition is accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub conditions: RuleNode,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Rule {
    /// A fresh rule: an empty `AND` group and no actions.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> CoreResult<Self> {
        from_json_str(raw)
    }

    /// Canonical serialized form, as shown in previews.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        to_pretty_json(self)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
