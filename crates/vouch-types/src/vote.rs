//! Review votes and their canonical key encoding.
//!
//! A vote lives at `<hash>/<operation>/<identity>` and holds `"1"` or `"-1"`.
//! [`VoteKey`] is the single place that encodes and decodes that layout.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::Identity;
use crate::key::{validate_segment, KeyPath};

/// A vote category.
///
/// The well-known operations mirror the trailers used in commit messages.
/// Anything else is kept verbatim as [`Operation::Custom`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    SignedOff,
    Reviewed,
    Acked,
    Tested,
    Reported,
    Suggested,
    Custom(String),
}

impl Operation {
    /// All well-known operations, in display order.
    pub const WELL_KNOWN: [Operation; 6] = [
        Operation::SignedOff,
        Operation::Reviewed,
        Operation::Acked,
        Operation::Tested,
        Operation::Reported,
        Operation::Suggested,
    ];

    /// The canonical path segment for this operation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SignedOff => "Signed-off-by",
            Self::Reviewed => "Reviewed-by",
            Self::Acked => "Acked-by",
            Self::Tested => "Tested-by",
            Self::Reported => "Reported-by",
            Self::Suggested => "Suggested-by",
            Self::Custom(name) => name,
        }
    }

    /// Resolve a user-supplied name. Aliases of the well-known operations are
    /// matched case-insensitively; any other string becomes `Custom`.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "signoff" | "sign-off" | "signed-off" | "signed-off-by" | "sob" => Self::SignedOff,
            "review" | "reviewed" | "reviewed-by" => Self::Reviewed,
            "ack" | "acked" | "acked-by" => Self::Acked,
            "test" | "tested" | "tested-by" => Self::Tested,
            "report" | "reported" | "reported-by" => Self::Reported,
            "suggest" | "suggested" | "suggested-by" => Self::Suggested,
            _ => Self::Custom(name.to_string()),
        }
    }

    /// Decode a stored path segment.
    ///
    /// Only the exact canonical names map to the well-known operations; no
    /// aliasing or case folding, so decoding then encoding a segment gives
    /// it back unchanged.
    pub fn from_segment(segment: &str) -> Self {
        Self::WELL_KNOWN
            .into_iter()
            .find(|op| op.as_str() == segment)
            .unwrap_or_else(|| Self::Custom(segment.to_string()))
    }

    /// Returns `true` if the operation name is usable as a path segment.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// The value of a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    /// Stored as `"1"`.
    Affirmative,
    /// Stored as `"-1"`; a retraction.
    Negative,
}

impl Vote {
    /// The stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Affirmative => "1",
            Self::Negative => "-1",
        }
    }

    /// Returns `true` for [`Vote::Affirmative`].
    pub fn is_affirmative(&self) -> bool {
        matches!(self, Self::Affirmative)
    }

    /// Decode a stored value.
    pub fn from_value(value: &str) -> Result<Self, TypeError> {
        match value.trim() {
            "1" => Ok(Self::Affirmative),
            "-1" => Ok(Self::Negative),
            other => Err(TypeError::InvalidVote(other.to_string())),
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed `(hash, operation, identity)` key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoteKey {
    pub hash: String,
    pub operation: Operation,
    pub identity: Identity,
}

impl VoteKey {
    /// Create a key; the hash and operation are validated as path segments.
    pub fn new(
        hash: impl Into<String>,
        operation: Operation,
        identity: Identity,
    ) -> Result<Self, TypeError> {
        let key = Self {
            hash: hash.into(),
            operation,
            identity,
        };
        key.to_path()?;
        Ok(key)
    }

    /// The `<hash>/<operation>` prefix under which all identities voting on
    /// this operation live.
    pub fn operation_path(hash: &str, operation: &Operation) -> Result<KeyPath, TypeError> {
        KeyPath::from_segments([hash, operation.as_str()])
    }

    /// Encode as `<hash>/<operation>/<identity>`.
    pub fn to_path(&self) -> Result<KeyPath, TypeError> {
        validate_segment(&self.hash)?;
        KeyPath::from_segments([
            self.hash.clone(),
            self.operation.as_str().to_string(),
            self.identity.to_string(),
        ])
    }

    /// Decode a three-segment path.
    pub fn from_path(path: &KeyPath) -> Result<Self, TypeError> {
        match path.segments() {
            [hash, operation, identity] => Ok(Self {
                hash: hash.clone(),
                operation: Operation::from_segment(operation),
                identity: identity.parse()?,
            }),
            _ => Err(TypeError::InvalidKey {
                key: path.to_string(),
                reason: "expected <hash>/<operation>/<identity>".into(),
            }),
        }
    }
}
