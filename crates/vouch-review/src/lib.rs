//! Review annotations on top of vouch stores.
//!
//! A vote by one identity on one operation for one code object is a leaf at
//! `<scope>/<hash>/<operation>/<identity>` holding `"1"` or `"-1"` in the
//! local store (`refs/vouch`). Peers' stores live under
//! `refs/vouch-peers/<peer>` and are merged on read. After every command a
//! per-hash summary is rebuilt into `refs/notes/commits`.
//!
//! # Modules
//!
//! - [`config`] -- `.vouch/config.toml` and environment overrides
//! - [`protocol`] -- recording and reading votes
//! - [`notes`] -- rebuilding the notes store
//! - [`peers`] -- peer discovery and allow-lists
//! - [`session`] -- one command's lifecycle
//! - [`commands`] -- the operations behind each CLI command

pub mod commands;
pub mod config;
pub mod error;
pub mod notes;
pub mod peers;
pub mod protocol;
pub mod session;

pub use config::Config;
pub use error::{ConfigError, ReviewError, ReviewResult};
pub use notes::sync_notes;
pub use peers::{discover_peers, load_auth_rules, AuthRules};
pub use protocol::{is_set, parse_vote, read_votes, record_vote};
pub use session::Session;
