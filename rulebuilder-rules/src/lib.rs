//! Rule tree model for the visual rule builder.
//!
//! A rule is a boolean condition tree (groups of `AND`/`OR`/`NOT` over leaf
//! conditions) plus an ordered list of actions. This crate owns the
//! canonical, serializable form of that document, the factories the editor
//! uses to create new nodes, and the validation that reports what is still
//! missing before a rule can be handed to the evaluation engine.

mod action;
mod condition;
mod error;
mod fields;
mod loader;
mod rule;
mod tokens;
pub mod validate;

pub use action::{Action, DEFAULT_MESSAGE_TEMPLATE};
pub use condition::{Condition, Group, RuleNode};
pub use error::RuleError;
pub use fields::{FieldCatalog, FieldSpec};
pub use loader::{load_document, load_fields, load_rule};
pub use rule::Rule;
pub use tokens::{ActionKind, Channel, GroupOperator, OperatorKind, Severity, UnknownToken};
pub use validate::{validate, validate_document};
