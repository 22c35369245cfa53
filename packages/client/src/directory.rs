//! Known users and their derived online state.

use pairline_server::domain::{PresenceSnapshot, User, UserId};

/// A user as rendered by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub user: User,
    pub is_online: bool,
}

/// Every known user except the session's own, sorted by id
#[derive(Debug, Clone)]
pub struct UserDirectory {
    self_id: UserId,
    entries: Vec<DirectoryEntry>,
    /// Online state is derived from this once a snapshot has arrived
    last_snapshot: Option<PresenceSnapshot>,
}

impl UserDirectory {
    pub fn new(self_id: UserId) -> Self {
        Self {
            self_id,
            entries: Vec::new(),
            last_snapshot: None,
        }
    }

    /// Replace the known users with a fresh list from the API
    ///
    /// The API's `is_online` is only used until the first snapshot; after
    /// that the last snapshot stays authoritative.
    pub fn replace_users(&mut self, users: Vec<DirectoryEntry>) {
        self.entries = users
            .into_iter()
            .filter(|entry| entry.user.id != self.self_id)
            .collect();
        self.entries.sort_by_key(|entry| entry.user.id);
        self.entries.dedup_by_key(|entry| entry.user.id);

        if let Some(snapshot) = self.last_snapshot.take() {
            self.apply_snapshot(&snapshot);
            self.last_snapshot = Some(snapshot);
        }
    }

    /// Recompute every `is_online` from the snapshot (full replace).
    ///
    /// Users in the snapshot that are not known yet are added.
    pub fn apply_snapshot(&mut self, snapshot: &PresenceSnapshot) {
        for entry in &mut self.entries {
            entry.is_online = snapshot.contains(entry.user.id);
        }

        let unknown: Vec<DirectoryEntry> = snapshot
            .users
            .iter()
            .filter(|user| user.id != self.self_id && self.get(user.id).is_none())
            .map(|user| DirectoryEntry {
                user: user.clone(),
                is_online: true,
            })
            .collect();
        if !unknown.is_empty() {
            self.entries.extend(unknown);
            self.entries.sort_by_key(|entry| entry.user.id);
        }
        self.last_snapshot = Some(snapshot.clone());
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn get(&self, user_id: UserId) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|entry| entry.user.id == user_id)
    }

    /// Look up by numeric id or exact username
    pub fn find(&self, query: &str) -> Option<&DirectoryEntry> {
        if let Ok(id) = query.parse::<i64>() {
            return self.entries.iter().find(|entry| entry.user.id.value() == id);
        }
        self.entries
            .iter()
            .find(|entry| entry.user.username.as_str() == query)
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.get(user_id).is_some_and(|entry| entry.is_online)
    }

    /// Display name for a user id, falling back to `#id`
    pub fn display_name(&self, user_id: UserId) -> String {
        match self.get(user_id) {
            Some(entry) => entry.user.username.to_string(),
            None => format!("#{}", user_id),
        }
    }

    pub fn online_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_online).count()
    }
}
