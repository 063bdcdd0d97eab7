use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tokens::{ActionKind, Channel, Severity};

/// Template new alerts start with. Placeholders are filled in by the evaluation engine.
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "🔔 {{rule_name}}: {{triggered_conditions}}";

/// Behaviour executed when a rule's conditions hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub severity: Severity,
    /// Only meaningful for `send_alert`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// Only meaningful for `send_alert`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,
}

impl Default for Action {
    fn default() -> Self {
        Self::new(ActionKind::SendAlert, Severity::Warning)
    }
}

impl Action {
    /// Builds an action, filling alert-only fields with defaults when `kind` is `send_alert`.
    pub fn new(kind: ActionKind, severity: Severity) -> Self {
        let (channel, message_template) = if kind.carries_alert_fields() {
            (Some(Channel::Default), Some(DEFAULT_MESSAGE_TEMPLATE.to_string()))
        } else {
            (None, None)
        };
        Self {
            kind,
            severity,
            channel,
            message_template,
        }
    }

    /// Names of the `{{placeholder}}` tokens used by the template, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("placeholder pattern is valid")
        });

        self.message_template
            .as_deref()
            .map(|template| {
                pattern
                    .captures_iter(template)
                    .filter_map(|captures| captures.get(1).map(|name| name.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
