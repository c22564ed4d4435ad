use std::fmt;

/// The single principal whose commands are executed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operator(String);

impl Operator {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn identity(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive match against a sender
    pub fn is(&self, sender: &str) -> bool {
        self.0 == sender
    }

    /// Nickname the bot uses when none is configured: `alice_` becomes `alice_sec`
    pub fn default_nickname(&self, suffix: &str) -> String {
        format!("{}{}", self.0.trim_end_matches('_'), suffix)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
