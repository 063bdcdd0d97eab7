//! Rulebuilder: visual editing of monitoring alert rules.
//!
//! A rule pairs a tree of conditions (metric comparisons combined with
//! `AND`, `OR` and `NOT` groups) with an ordered list of actions. Hosts mount
//! a [`RuleBuilder`], let users edit the rule as blocks, and read the
//! canonical JSON back out.
//!
//! # Architecture
//!
//! * `rulebuilder-core`: configuration, errors, logging and markup escaping
//! * `rulebuilder-rules`: the rule model, its vocabularies, validation and document loading
//! * `rulebuilder-editor`: the visual tree, synchronization and the builder facade
//! * `rulebuilder-cli`: command-line host

pub use rulebuilder_core::{escape_markup, BuilderConfig, CoreError, CoreResult, Environment};
pub use rulebuilder_editor::{
    Area, Block, BlockId, BlockKind, BlockTemplate, Container, Control, RuleBuilder,
    RuleChangeListener, SyncReport, VisualTree,
};
pub use rulebuilder_rules::{
    load_fields, load_rule, validate, validate_document, Action, ActionKind, Channel, Condition,
    FieldCatalog, FieldSpec, Group, GroupOperator, OperatorKind, Rule, RuleError, RuleNode,
    Severity,
};

use rulebuilder_core::config::load_builder_config;
use tracing::debug;

/// Mounts a builder configured from `RULEBUILDER_*` environment variables.
pub fn mount_from_env<L>(listener: L) -> CoreResult<RuleBuilder>
where
    L: RuleChangeListener + 'static,
{
    let config = load_builder_config()?;
    debug!(mount = %config.mount, environment = ?config.environment, "mounting from environment");
    Ok(RuleBuilder::from_config(&config, listener)?)
}
