//! Wait-list: entry-point resolutions blocked on methods that have not been
//! registered yet.
//!
//! An entry is keyed by report name. Its `waiting_for` set only shrinks as
//! the missing methods arrive; when it becomes empty the entry is removed and
//! handed back to the caller for a full re-resolution.

use common::MethodIdentity;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A deferred report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitListEntry {
    pub name: String,
    pub entry_points: Vec<MethodIdentity>,
    pub waiting_for: BTreeSet<MethodIdentity>,
}

#[derive(Debug, Default)]
pub struct WaitList {
    entries: BTreeMap<String, WaitListEntry>,
    /// missing identity -> names of entries waiting for it
    blocked_on: HashMap<MethodIdentity, BTreeSet<String>>,
}

impl WaitList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the report `name` is blocked on `pending`.
    ///
    /// When an entry for `name` already exists the pending sets are merged
    /// (union), and identities for which `still_missing` returns `false` are
    /// dropped from the merged set: they were registered in the meantime and
    /// will never be announced again. Entry points are merged the same way.
    pub fn record_pending(
        &mut self,
        name: &str,
        entry_points: Vec<MethodIdentity>,
        pending: BTreeSet<MethodIdentity>,
        still_missing: impl Fn(&MethodIdentity) -> bool,
    ) {
        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| WaitListEntry {
                name: name.to_string(),
                entry_points: Vec::new(),
                waiting_for: BTreeSet::new(),
            });

        for ep in entry_points {
            if !entry.entry_points.contains(&ep) {
                entry.entry_points.push(ep);
            }
        }

        let stale: Vec<MethodIdentity> = entry
            .waiting_for
            .iter()
            .filter(|id| !still_missing(*id))
            .cloned()
            .collect();
        for id in &stale {
            entry.waiting_for.remove(id);
            if let Some(names) = self.blocked_on.get_mut(id) {
                names.remove(name);
                if names.is_empty() {
                    self.blocked_on.remove(id);
                }
            }
        }

        for id in pending {
            self.blocked_on
                .entry(id.clone())
                .or_default()
                .insert(name.to_string());
            entry.waiting_for.insert(id);
        }

        tracing::debug!(
            report = %name,
            waiting_for = entry.waiting_for.len(),
            "report deferred"
        );

        if entry.waiting_for.is_empty() {
            // Only reachable when every merged identity went stale and
            // `pending` was empty; nothing is left to wait for.
            self.entries.remove(name);
        }
    }

    /// Removes `identity` from every entry waiting for it. Returns the entries
    /// whose waiting set became empty; they are no longer on the wait-list.
    pub fn on_new_registration(&mut self, identity: &MethodIdentity) -> Vec<WaitListEntry> {
        let Some(names) = self.blocked_on.remove(identity) else {
            return Vec::new();
        };

        let mut ready = Vec::new();
        for name in names {
            let emptied = match self.entries.get_mut(&name) {
                Some(entry) => {
                    entry.waiting_for.remove(identity);
                    entry.waiting_for.is_empty()
                }
                None => false,
            };
            if emptied {
                if let Some(entry) = self.entries.remove(&name) {
                    tracing::debug!(report = %name, unblocked_by = %identity, "report unblocked");
                    ready.push(entry);
                }
            }
        }
        ready
    }

    /// Applies [`on_new_registration`](Self::on_new_registration) for a batch
    /// of identities and returns all entries that became ready, ordered by name.
    pub fn on_new_registrations<'a>(
        &mut self,
        identities: impl IntoIterator<Item = &'a MethodIdentity>,
    ) -> Vec<WaitListEntry> {
        let mut ready: Vec<WaitListEntry> = identities
            .into_iter()
            .flat_map(|id| self.on_new_registration(id))
            .collect();
        ready.sort_by(|a, b| a.name.cmp(&b.name));
        ready
    }

    pub fn get(&self, name: &str) -> Option<&WaitListEntry> {
        self.entries.get(name)
    }

    /// Live entries, ordered by name.
    pub fn entries(&self) -> impl Iterator<Item = &WaitListEntry> {
        self.entries.values()
    }

    /// Takes `name` off the wait-list without releasing it.
    pub fn remove(&mut self, name: &str) -> Option<WaitListEntry> {
        let entry = self.entries.remove(name)?;
        for id in &entry.waiting_for {
            if let Some(names) = self.blocked_on.get_mut(id) {
                names.remove(name);
                if names.is_empty() {
                    self.blocked_on.remove(id);
                }
            }
        }
        Some(entry)
    }

    /// Empties the wait-list, returning every entry still blocked.
    pub fn drain(&mut self) -> Vec<WaitListEntry> {
        self.blocked_on.clear();
        std::mem::take(&mut self.entries).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
