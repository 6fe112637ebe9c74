use std::fmt;

use vouch_types::ObjectId;

/// The state of HEAD: either symbolic (naming a ref) or detached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Head {
    /// HEAD names a ref, e.g. `refs/heads/main`.
    Symbolic(String),
    /// HEAD points directly at a commit.
    Detached(ObjectId),
}

impl Head {
    /// Parse the on-disk form: `ref: <name>` or a hex id.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.strip_prefix("ref:") {
            Some(name) => Some(Self::Symbolic(name.trim().to_string())),
            None => text.parse().ok().map(Self::Detached),
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbolic(name) => write!(f, "ref: {name}"),
            Self::Detached(id) => write!(f, "{id}"),
        }
    }
}
