//! One command's lifecycle.
//!
//! [`Session::open`] resolves the identity and scope from an explicit
//! [`Config`] and opens the local store. [`Session::run`] executes a command
//! body and then rebuilds the notes store whether or not the body
//! succeeded.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use vouch_db::{Db, Scoped};
use vouch_refs::names::{LOCAL_STORE_REF, NOTES_REF};
use vouch_repo::Repository;
use vouch_types::{Identity, KeyPath, Operation};

use crate::config::Config;
use crate::error::ReviewResult;
use crate::notes;
use crate::peers::{self, AuthRules};

pub struct Session {
    repo: Arc<Repository>,
    config: Config,
    identity: Identity,
    local: Scoped<Db>,
    auth: AuthRules,
}

impl Session {
    /// Open the local store of `repo` for the identity in `config`.
    ///
    /// Fails when the identity is missing or the scope does not parse.
    pub fn open(repo: Arc<Repository>, config: Config) -> ReviewResult<Self> {
        let identity = config.identity()?;
        let scope = config.scope()?;
        let db = Db::open(Arc::clone(&repo), LOCAL_STORE_REF)?.with_author(identity.to_string());
        debug!(%repo, %identity, %scope, "opened session");
        let local = Scoped::new(db, scope);
        let auth = peers::load_auth_rules(&config);
        Ok(Self {
            repo,
            config,
            identity,
            local,
            auth,
        })
    }

    /// Run `body`, then rebuild the notes.
    ///
    /// An error from `body` takes precedence over an error from the rebuild.
    pub fn run<T>(mut self, body: impl FnOnce(&mut Session) -> ReviewResult<T>) -> ReviewResult<T> {
        let result = body(&mut self);
        let synced = self.sync_notes();
        match (result, synced) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(sync_err)) => {
                warn!(error = %sync_err, "notes sync failed after command error");
                Err(e)
            }
        }
    }

    /// Rebuild `refs/notes/commits` from the committed local store.
    pub fn sync_notes(&self) -> ReviewResult<usize> {
        let committed = Scoped::new(
            Db::open(Arc::clone(&self.repo), LOCAL_STORE_REF)?,
            self.scope().clone(),
        );
        let mut notes =
            Db::open(Arc::clone(&self.repo), NOTES_REF)?.with_author(self.identity.to_string());
        notes::sync_notes(&committed, &mut notes)
    }

    /// Peer stores, scoped like the local one, in name order.
    pub fn peers(&self) -> ReviewResult<BTreeMap<String, Scoped<Db>>> {
        peers::discover_peers(&self.repo, self.scope())
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.repo
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn scope(&self) -> &KeyPath {
        self.local.prefix()
    }

    /// The operation `log` reports on.
    pub fn primary(&self) -> Operation {
        self.config.primary()
    }

    pub fn local(&self) -> &Scoped<Db> {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut Scoped<Db> {
        &mut self.local
    }

    pub fn auth(&self) -> &AuthRules {
        &self.auth
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("repo", &self.repo.to_string())
            .field("identity", &self.identity.to_string())
            .field("scope", &self.scope().to_string())
            .finish_non_exhaustive()
    }
}
