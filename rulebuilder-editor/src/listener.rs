use rulebuilder_rules::Rule;

use crate::extract::SyncReport;

/// Host-side receiver of builder notifications.
#[cfg_attr(test, mockall::automock)]
pub trait RuleChangeListener {
    /// Called with the freshly synchronized rule after every mutation.
    fn on_rule_change(&mut self, rule: &Rule);

    /// Called before `on_rule_change` when a pass discarded visual state.
    fn on_normalized(&mut self, _report: &SyncReport) {}
}

impl<F> RuleChangeListener for F
where
    F: FnMut(&Rule),
{
    fn on_rule_change(&mut self, rule: &Rule) {
        self(rule)
    }
}
