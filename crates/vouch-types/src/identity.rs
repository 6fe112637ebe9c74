use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The acting reviewer: a display name and an email.
///
/// The canonical text form `Name <email>` is used verbatim as the last
/// segment of a vote key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    name: String,
    email: String,
}

impl Identity {
    /// Create an identity. Both parts are trimmed and must be non-empty.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();
        if name.is_empty()
            || email.is_empty()
            || name.contains(['<', '>', '/'])
            || email.contains(['<', '>', '/'])
        {
            return Err(TypeError::InvalidIdentity(format!("{name} <{email}>")));
        }
        Ok(Self { name, email })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Email address.
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

impl FromStr for Identity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidIdentity(s.to_string());
        let (name, rest) = s.split_once('<').ok_or_else(invalid)?;
        let email = rest.strip_suffix('>').ok_or_else(invalid)?;
        Self::new(name, email).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_form() {
        let id = Identity::new("Jane Doe", "jane@example.com").unwrap();
        assert_eq!(id.to_string(), "Jane Doe <jane@example.com>");
    }

    #[test]
    fn parse_display_form() {
        let id: Identity = "Jane Doe <jane@example.com>".parse().unwrap();
        assert_eq!(id.name(), "Jane Doe");
        assert_eq!(id.email(), "jane@example.com");
    }

    #[test]
    fn reject_missing_parts() {
        assert!(Identity::new("", "a@b").is_err());
        assert!(Identity::new("A", "  ").is_err());
        assert!("no email".parse::<Identity>().is_err());
        assert!("A <a@b".parse::<Identity>().is_err());
    }

    #[test]
    fn reject_path_separator() {
        assert!(Identity::new("A/B", "a@b").is_err());
    }
}
