//! Visual rule editing.
//!
//! The editor keeps a live [`VisualTree`] in step with the canonical
//! [`rulebuilder_rules::Rule`]. Rendering projects the rule into blocks;
//! extraction walks the blocks after every user gesture and rebuilds the rule
//! from scratch. [`RuleBuilder`] ties the two together for a host.

mod builder;
mod error;
mod extract;
mod listener;
mod render;
mod visual;

pub use builder::{BlockTemplate, RuleBuilder};
pub use error::EditorError;
pub use extract::{extract, Extraction, SyncReport, TruncatedGroup};
pub use listener::RuleChangeListener;
pub use render::Renderer;
pub use visual::{Area, Block, BlockId, BlockKind, Container, Control, ControlState, VisualTree};
