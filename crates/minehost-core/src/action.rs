use crate::CoreError;
use std::fmt;
use std::str::FromStr;

/// Operator intent for a server's container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Start,
    Stop,
    Restart,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Start, Action::Stop, Action::Restart];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CoreError::Validation("Invalid action".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_action() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn rejects_unknown_and_differently_cased() {
        assert!("delete".parse::<Action>().is_err());
        assert!("Start".parse::<Action>().is_err());
        assert!("".parse::<Action>().is_err());
    }
}
