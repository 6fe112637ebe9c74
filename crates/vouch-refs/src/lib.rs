//! Reference management for vouch.
//!
//! References are named pointers to commits. Every annotation store is a
//! reference (`refs/vouch`, `refs/vouch-peers/<peer>`, `refs/notes/commits`)
//! and the code history is reached through `HEAD`.
//!
//! # Update discipline
//!
//! A store commit must build on the snapshot it was opened from. Writers
//! therefore use [`RefStore::compare_and_swap`], which fails with
//! [`RefError::Conflict`] when the reference moved underneath them.
//!
//! # Modules
//!
//! - [`error`]: Error types for ref operations
//! - [`types`]: [`Head`]
//! - [`traits`]: The [`RefStore`] trait defining the storage interface
//! - [`names`]: Ref name validation and well-known names
//! - [`memory`]: In-memory [`InMemoryRefStore`] for tests
//! - [`fs`]: [`FsRefStore`], one file per ref with lock-file updates

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, RefResult};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::{peer_ref, validate_peer_name, validate_ref_name};
pub use traits::RefStore;
pub use types::Head;
