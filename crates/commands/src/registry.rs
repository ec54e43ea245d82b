use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::debug;

use crate::command::Command;

/// Case-insensitive alias → command map.
///
/// Every mutation happens under a single write lock, so a concurrent
/// [`resolve`](Self::resolve) sees the map either before or after a whole
/// `register`/`unregister`, never halfway through one. The lock is never held
/// across an `.await`.
#[derive(Default)]
pub struct AliasRegistry {
    entries: RwLock<HashMap<String, Arc<Command>>>,
}

fn normalize(alias: &str) -> String {
    alias.to_lowercase()
}

impl AliasRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Command>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Command>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Map every alias of `command` to it. An alias that is already taken is
    /// overwritten (last write wins).
    pub fn register(&self, command: Arc<Command>) {
        let mut entries = self.write();
        for alias in command.aliases() {
            if let Some(previous) = entries.insert(normalize(alias), Arc::clone(&command))
                && !Arc::ptr_eq(&previous, &command)
            {
                debug!(
                    alias = %alias,
                    previous = %previous.name(),
                    command = %command.name(),
                    "alias overwritten"
                );
            }
        }
    }

    /// Remove the aliases of `command` that still point at `command`.
    ///
    /// An alias that has since been taken over by another registration is
    /// left alone. Returns the number of entries removed.
    pub fn unregister(&self, command: &Arc<Command>) -> usize {
        let mut entries = self.write();
        let mut removed = 0;
        for alias in command.aliases() {
            let key = normalize(alias);
            if entries
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, command))
            {
                entries.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    /// Remove a single alias entry. Returns the command it pointed at.
    pub fn unregister_alias(&self, alias: &str) -> Option<Arc<Command>> {
        self.write().remove(&normalize(alias))
    }

    /// Look up an alias, ignoring case.
    #[must_use]
    pub fn resolve(&self, alias: &str) -> Option<Arc<Command>> {
        self.read().get(&normalize(alias)).cloned()
    }

    /// Number of alias entries (not distinct commands).
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Each registered command once, however many aliases reach it,
    /// sorted by display name.
    #[must_use]
    pub fn commands(&self) -> Vec<Arc<Command>> {
        let entries = self.read();
        let mut commands: Vec<Arc<Command>> = Vec::with_capacity(entries.len());
        for command in entries.values() {
            if !commands.iter().any(|c| Arc::ptr_eq(c, command)) {
                commands.push(Arc::clone(command));
            }
        }
        drop(entries);
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }

    /// All registered aliases, sorted.
    #[must_use]
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.read().keys().cloned().collect();
        aliases.sort();
        aliases
    }
}

impl std::fmt::Debug for AliasRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasRegistry")
            .field("aliases", &self.aliases())
            .finish()
    }
}
