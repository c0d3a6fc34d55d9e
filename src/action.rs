//! Closed set of admin actions

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Admin action selected by the `/api/{action}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Follow a bangumi
    Add,
    /// Unfollow a bangumi
    Delete,
    /// Search the catalogue
    Search,
    /// Weekly calendar
    Cal,
    /// Read or write configuration
    Config,
    /// Queue downloads
    Download,
    /// Check an admin token
    Auth,
}

impl Action {
    /// Every action, in declaration order
    pub const ALL: [Self; 7] = [
        Self::Add,
        Self::Delete,
        Self::Search,
        Self::Cal,
        Self::Config,
        Self::Download,
        Self::Auth,
    ];

    /// Wire name of the action
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Search => "search",
            Self::Cal => "cal",
            Self::Config => "config",
            Self::Download => "download",
            Self::Auth => "auth",
        }
    }

    /// Whether the action is callable without a `bgmi-token`
    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Self::Search | Self::Cal | Self::Auth)
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn test_parse_is_exact() {
        assert!("Add".parse::<Action>().is_err());
        assert!(" add".parse::<Action>().is_err());
        assert!("bogus".parse::<Action>().is_err());
        assert!("".parse::<Action>().is_err());
    }

    #[test]
    fn test_public_actions() {
        let public: Vec<_> = Action::ALL.into_iter().filter(|a| a.is_public()).collect();
        assert_eq!(public, vec![Action::Search, Action::Cal, Action::Auth]);
    }
}
