use std::sync::{Arc, RwLock};

use tracing::{info, warn};
use uuid::Uuid;

use gallery_db::Database;
use gallery_types::models::UserIdentity;

use crate::error::IdentityError;

/// Name of the persisted blob holding the identity.
pub const IDENTITY_KEY: &str = "gallery-user-storage";

/// The local user's identity, restored from and written through to the
/// local state database. Constructed once at startup and passed around.
pub struct IdentityStore {
    db: Arc<Database>,
    current: RwLock<UserIdentity>,
}

impl IdentityStore {
    /// Restore the stored identity, or mint a new user id on first run.
    pub fn open(db: Arc<Database>) -> Result<Self, IdentityError> {
        let restored = match db.get_state(IDENTITY_KEY)? {
            Some(raw) => match serde_json::from_str::<UserIdentity>(&raw) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!("Stored identity is unreadable, starting fresh: {}", e);
                    None
                }
            },
            None => None,
        };

        let store = match restored {
            Some(identity) => {
                info!("Restored identity {} ({:?})", identity.user_id, identity.user_name);
                Self { db, current: RwLock::new(identity) }
            }
            None => {
                let identity = UserIdentity {
                    user_id: Uuid::new_v4(),
                    user_name: String::new(),
                };
                info!("Created new identity {}", identity.user_id);
                let store = Self { db, current: RwLock::new(identity) };
                store.persist(&store.current())?;
                store
            }
        };

        Ok(store)
    }

    pub fn current(&self) -> UserIdentity {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current().is_logged_in()
    }

    /// Set the display name. Used both for first login and for renames.
    pub fn set_user_name(&self, name: &str) -> Result<UserIdentity, IdentityError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IdentityError::EmptyName);
        }

        let mut updated = self.current();
        updated.user_name = name.to_string();
        self.persist(&updated)?;

        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = updated.clone();

        info!("User {} is now {:?}", updated.user_id, updated.user_name);
        Ok(updated)
    }

    fn persist(&self, identity: &UserIdentity) -> Result<(), IdentityError> {
        let blob = serde_json::to_string(identity)?;
        self.db.put_state(IDENTITY_KEY, &blob)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn open_at(path: &Path) -> IdentityStore {
        IdentityStore::open(Arc::new(Database::open(path).unwrap())).unwrap()
    }

    #[test]
    fn first_run_has_id_but_no_name() {
        let store = IdentityStore::open(Arc::new(Database::open_in_memory().unwrap())).unwrap();
        let identity = store.current();

        assert!(!identity.user_id.is_nil());
        assert!(identity.user_name.is_empty());
        assert!(!store.is_logged_in());
    }

    #[test]
    fn reload_restores_name_without_login() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");

        let first = open_at(&path);
        let before = first.set_user_name("  Ada  ").unwrap();
        assert_eq!(before.user_name, "Ada");
        drop(first);

        let reloaded = open_at(&path);
        assert!(reloaded.is_logged_in());
        assert_eq!(reloaded.current(), before);
    }

    #[test]
    fn user_id_is_stable_before_login() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");

        let id = open_at(&path).current().user_id;
        assert_eq!(open_at(&path).current().user_id, id);
    }

    #[test]
    fn rename_keeps_user_id() {
        let store = IdentityStore::open(Arc::new(Database::open_in_memory().unwrap())).unwrap();
        let id = store.set_user_name("Ada").unwrap().user_id;
        let renamed = store.set_user_name("Grace").unwrap();

        assert_eq!(renamed.user_id, id);
        assert_eq!(store.current().user_name, "Grace");
    }

    #[test]
    fn blank_name_is_rejected() {
        let store = IdentityStore::open(Arc::new(Database::open_in_memory().unwrap())).unwrap();
        assert!(matches!(store.set_user_name("   "), Err(IdentityError::EmptyName)));
        assert!(!store.is_logged_in());
    }

    #[test]
    fn corrupt_blob_is_replaced() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.put_state(IDENTITY_KEY, "{not json").unwrap();

        let store = IdentityStore::open(db.clone()).unwrap();
        let stored = db.get_state(IDENTITY_KEY).unwrap().unwrap();
        let parsed: UserIdentity = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, store.current());
    }
}
