//! Foundation types for vouch.
//!
//! Every other vouch crate depends on `vouch-types`. The types here carry no
//! storage behaviour; they define how things are named and encoded.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 hash)
//! - [`KeyPath`]: Canonical slash-separated path into a store snapshot
//! - [`Identity`]: `Name <email>` of the acting reviewer
//! - [`Operation`]: Vote category (`Signed-off-by`, `Reviewed-by`, ...)
//! - [`Vote`]: Affirmative or negative value attached to a key
//! - [`VoteKey`]: Typed `(hash, operation, identity)` key with one encoding

pub mod error;
pub mod identity;
pub mod key;
pub mod object;
pub mod vote;

pub use error::TypeError;
pub use identity::Identity;
pub use key::KeyPath;
pub use object::ObjectId;
pub use vote::{Operation, Vote, VoteKey};
