//! Ref name validation following git-style conventions.
//!
//! Valid ref names:
//! - Must start with `refs/`
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not end with `/`, `.`, or `.lock`
//! - Components between slashes must be non-empty and not start with `.`

use crate::error::{RefError, RefResult};

/// The local annotation store.
pub const LOCAL_STORE_REF: &str = "refs/vouch";

/// Namespace holding one ref per peer store.
pub const PEER_REF_PREFIX: &str = "refs/vouch-peers/";

/// The notes store.
pub const NOTES_REF: &str = "refs/notes/commits";

/// Branch HEAD points to in a new repository.
pub const DEFAULT_BRANCH: &str = "refs/heads/main";

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidRefName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a full ref name, returning `Ok(())` if valid.
///
/// ```
/// use vouch_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("refs/vouch").is_ok());
/// assert!(validate_ref_name("refs/vouch-peers/alice").is_ok());
/// assert!(validate_ref_name("vouch").is_err());
/// assert!(validate_ref_name("refs/bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    if !name.starts_with("refs/") {
        return Err(invalid(name, "must start with 'refs/'"));
    }
    if let Some(ch) = FORBIDDEN_CHARS.iter().find(|ch| name.contains(**ch)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.ends_with('/') || name.ends_with('.') {
        return Err(invalid(name, "must not end with '/' or '.'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }
    Ok(())
}

/// Validate a peer name. Must be a single component.
pub fn validate_peer_name(name: &str) -> RefResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "peer name must not be empty"));
    }
    if name.contains('/') {
        return Err(invalid(name, "peer name must not contain '/'"));
    }
    validate_ref_name(&format!("{PEER_REF_PREFIX}{name}"))
}

/// The ref holding the store of peer `name`.
pub fn peer_ref(name: &str) -> RefResult<String> {
    validate_peer_name(name)?;
    Ok(format!("{PEER_REF_PREFIX}{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_ref_name(LOCAL_STORE_REF).is_ok());
        assert!(validate_ref_name(NOTES_REF).is_ok());
        assert!(validate_ref_name(DEFAULT_BRANCH).is_ok());
        assert!(validate_ref_name("refs/vouch-peers/bob.smith").is_ok());
    }

    #[test]
    fn reject_outside_refs() {
        assert!(validate_ref_name("HEAD").is_err());
        assert!(validate_ref_name("heads/main").is_err());
        assert!(validate_ref_name("").is_err());
    }

    #[test]
    fn reject_double_dot() {
        assert!(validate_ref_name("refs/a..b").is_err());
    }

    #[test]
    fn reject_forbidden_chars() {
        assert!(validate_ref_name("refs/a b").is_err());
        assert!(validate_ref_name("refs/a~1").is_err());
        assert!(validate_ref_name("refs/a^").is_err());
        assert!(validate_ref_name("refs/a:b").is_err());
    }

    #[test]
    fn reject_bad_components() {
        assert!(validate_ref_name("refs//vouch").is_err());
        assert!(validate_ref_name("refs/vouch/").is_err());
        assert!(validate_ref_name("refs/.hidden").is_err());
        assert!(validate_ref_name("refs/vouch.lock").is_err());
    }

    #[test]
    fn peer_refs() {
        assert_eq!(peer_ref("alice").unwrap(), "refs/vouch-peers/alice");
        assert!(peer_ref("").is_err());
        assert!(peer_ref("a/b").is_err());
        assert!(peer_ref("..").is_err());
    }
}
