//! Closed vocabularies shared by the model and the selectors that edit it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a token is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary} token: {token}")]
pub struct UnknownToken {
    pub vocabulary: &'static str,
    pub token: String,
}

macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($vocabulary:literal) {
            $($variant:ident => $token:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in selector order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Wire token used in serialized documents and selector values.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownToken;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw {
                    $($token => Ok($name::$variant),)+
                    other => Err(UnknownToken {
                        vocabulary: $vocabulary,
                        token: other.to_string(),
                    }),
                }
            }
        }
    };
}

token_enum! {
    /// Comparison operator of a leaf condition. Opaque to the builder; the
    /// evaluation engine owns its semantics.
    OperatorKind("operator") {
        Eq => "eq",
        Ne => "ne",
        Gt => "gt",
        Gte => "gte",
        Lt => "lt",
        Lte => "lte",
        Contains => "contains",
        NotContains => "not_contains",
        StartsWith => "starts_with",
        EndsWith => "ends_with",
        Regex => "regex",
        In => "in",
        NotIn => "not_in",
    }
}

token_enum! {
    /// Boolean combinator of a group node.
    GroupOperator("group operator") {
        And => "AND",
        Or => "OR",
        Not => "NOT",
    }
}

token_enum! {
    /// What happens when a rule fires.
    ActionKind("action type") {
        SendAlert => "send_alert",
        CreateGithubIssue => "create_github_issue",
        CreateTicket => "create_ticket",
        Webhook => "webhook",
        Suppress => "suppress",
    }
}

token_enum! {
    Severity("severity") {
        Info => "info",
        Warning => "warning",
        Critical => "critical",
    }
}

token_enum! {
    /// Delivery channel of a `send_alert` action.
    Channel("channel") {
        Default => "default",
        Telegram => "telegram",
        Slack => "slack",
        Email => "email",
    }
}

impl Default for OperatorKind {
    fn default() -> Self {
        OperatorKind::Eq
    }
}

impl GroupOperator {
    /// Upper bound on children, if the operator has one.
    pub fn max_children(&self) -> Option<usize> {
        match self {
            GroupOperator::Not => Some(1),
            GroupOperator::And | GroupOperator::Or => None,
        }
    }
}

impl ActionKind {
    /// Only alerts carry a channel and a message template.
    pub fn carries_alert_fields(&self) -> bool {
        matches!(self, ActionKind::SendAlert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn operator_vocabulary_is_closed() {
        assert_eq!(OperatorKind::ALL.len(), 13);
        for op in OperatorKind::ALL {
            assert_eq!(op.as_str().parse::<OperatorKind>(), Ok(*op));
        }
    }

    #[test_case("not_contains", OperatorKind::NotContains)]
    #[test_case("starts_with", OperatorKind::StartsWith)]
    #[test_case("in", OperatorKind::In)]
    #[test_case("not_in", OperatorKind::NotIn)]
    fn operator_tokens(raw: &str, expected: OperatorKind) {
        assert_eq!(raw.parse::<OperatorKind>(), Ok(expected));
        assert_eq!(
            serde_json::to_value(expected).expect("serialize"),
            serde_json::json!(raw)
        );
    }

    #[test]
    fn group_operators_are_uppercase() {
        assert_eq!(GroupOperator::Not.to_string(), "NOT");
        let parsed: GroupOperator = serde_json::from_str("\"OR\"").expect("deserialize");
        assert_eq!(parsed, GroupOperator::Or);
        assert!("and".parse::<GroupOperator>().is_err());
    }

    #[test]
    fn unknown_token_names_vocabulary() {
        let err = "fax".parse::<Channel>().unwrap_err();
        assert_eq!(err.to_string(), "unknown channel token: fax");
    }

    #[test]
    fn only_not_is_bounded() {
        assert_eq!(GroupOperator::Not.max_children(), Some(1));
        assert_eq!(GroupOperator::And.max_children(), None);
        assert_eq!(GroupOperator::Or.max_children(), None);
    }
}
