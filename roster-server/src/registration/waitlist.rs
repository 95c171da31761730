//! Ordered waitlist for one resource
//!
//! Loaded from the store at the start of an exclusive section, mutated in
//! memory, and committed together with the ledger. Positions are dense
//! 1-based ranks; every entry whose position changes is tracked so the
//! commit writes exactly the touched rows.

use shared::registration::{EntryStatus, RegistrationEntry};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct OrderedWaitlist {
    /// Waitlisted entries, ascending by position
    entries: Vec<RegistrationEntry>,
    touched: BTreeSet<String>,
}

impl OrderedWaitlist {
    /// Build from stored waitlisted entries (any order)
    pub fn load(mut entries: Vec<RegistrationEntry>) -> Self {
        entries.retain(|e| e.status == EntryStatus::Waitlisted);
        entries.sort_by(|a, b| {
            a.position
                .unwrap_or(u32::MAX)
                .cmp(&b.position.unwrap_or(u32::MAX))
                .then(a.registered_at.cmp(&b.registered_at))
                .then(a.id.cmp(&b.id))
        });
        Self {
            entries,
            touched: BTreeSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistrationEntry> {
        self.entries.iter()
    }

    pub fn get(&self, entry_id: &str) -> Option<&RegistrationEntry> {
        self.entries.iter().find(|e| e.id == entry_id)
    }

    pub fn find_party(&self, party_id: &str) -> Option<&RegistrationEntry> {
        self.entries.iter().find(|e| e.party_id == party_id)
    }

    pub fn peek_head(&self) -> Option<&RegistrationEntry> {
        self.entries.first()
    }

    /// Queue an entry at the tail; returns its position (`len + 1`)
    pub fn append(&mut self, mut entry: RegistrationEntry) -> u32 {
        let position = self.entries.len() as u32 + 1;
        entry.status = EntryStatus::Waitlisted;
        entry.position = Some(position);
        self.touched.insert(entry.id.clone());
        self.entries.push(entry);
        position
    }

    /// Remove the entry at `position` and close the gap behind it.
    ///
    /// The returned entry has its position cleared; the caller decides its
    /// new status. Returns `None` when no entry holds that position.
    pub fn remove_and_compact(&mut self, position: u32) -> Option<RegistrationEntry> {
        let id = self
            .entries
            .iter()
            .find(|e| e.position == Some(position))?
            .id
            .clone();
        self.remove_entry(&id)
    }

    /// Remove a specific entry and close the gap behind its position
    pub fn remove_entry(&mut self, entry_id: &str) -> Option<RegistrationEntry> {
        let idx = self.entries.iter().position(|e| e.id == entry_id)?;
        let mut removed = self.entries.remove(idx);
        self.touched.remove(&removed.id);
        if let Some(position) = removed.position.take() {
            self.reorder(position);
        }
        Some(removed)
    }

    /// Number of entries queued behind `position`
    pub fn count_behind(&self, position: u32) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.position.is_some_and(|p| p > position))
            .count() as u32
    }

    /// Take every entry out of the queue (resource retired)
    pub fn drain(&mut self) -> Vec<RegistrationEntry> {
        self.touched.clear();
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|mut e| {
                e.position = None;
                e
            })
            .collect()
    }

    /// Shift every position greater than `from_position` down by one.
    ///
    /// Must run exactly once per removal; returns how many entries moved.
    pub fn reorder(&mut self, from_position: u32) -> u32 {
        let mut shifted = 0;
        for entry in &mut self.entries {
            if let Some(p) = entry.position
                && p > from_position
            {
                entry.position = Some(p - 1);
                self.touched.insert(entry.id.clone());
                shifted += 1;
            }
        }
        shifted
    }

    /// Whether some entry currently holds `position`
    pub fn holds(&self, position: u32) -> bool {
        self.entries.iter().any(|e| e.position == Some(position))
    }

    /// Reassign dense positions in first-come-first-served order.
    ///
    /// Returns how many entries had a wrong position.
    pub fn renumber(&mut self) -> u32 {
        self.entries.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then(a.position.cmp(&b.position))
                .then(a.id.cmp(&b.id))
        });
        let mut fixed = 0;
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            let expected = idx as u32 + 1;
            if entry.position != Some(expected) {
                entry.position = Some(expected);
                self.touched.insert(entry.id.clone());
                fixed += 1;
            }
        }
        fixed
    }

    /// Whether positions are exactly `1..=N`
    pub fn is_dense(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(idx, e)| e.position == Some(idx as u32 + 1))
    }

    /// Entries whose rows changed since load
    pub fn take_touched(&mut self) -> Vec<RegistrationEntry> {
        let touched = std::mem::take(&mut self.touched);
        self.entries
            .iter()
            .filter(|e| touched.contains(&e.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting(id: &str, position: u32, registered_at: i64) -> RegistrationEntry {
        let mut e = RegistrationEntry::new("c1", format!("party-{id}"), id, registered_at);
        e.id = id.to_string();
        e.status = EntryStatus::Waitlisted;
        e.position = Some(position);
        e
    }

    #[test]
    fn append_assigns_len_plus_one() {
        let mut w = OrderedWaitlist::load(vec![waiting("a", 1, 1)]);
        let e = RegistrationEntry::new("c1", "p-b", "B", 2);
        assert_eq!(w.append(e), 2);
        assert_eq!(w.len(), 2);
        assert!(w.is_dense());
    }

    #[test]
    fn remove_middle_compacts_tail() {
        let mut w =
            OrderedWaitlist::load(vec![waiting("c", 3, 3), waiting("a", 1, 1), waiting("b", 2, 2)]);
        let removed = w.remove_and_compact(2).unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(removed.position, None);
        assert_eq!(w.get("a").unwrap().position, Some(1));
        assert_eq!(w.get("c").unwrap().position, Some(2));
        assert!(w.is_dense());

        let touched: Vec<String> = w.take_touched().into_iter().map(|e| e.id).collect();
        assert_eq!(touched, vec!["c".to_string()]);
    }

    #[test]
    fn remove_missing_position_is_none() {
        let mut w = OrderedWaitlist::load(vec![waiting("a", 1, 1)]);
        assert!(w.remove_and_compact(5).is_none());
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn remove_entry_by_id_compacts() {
        let mut w = OrderedWaitlist::load(vec![waiting("a", 1, 1), waiting("b", 2, 2)]);
        assert_eq!(w.count_behind(1), 1);
        let removed = w.remove_entry("a").unwrap();
        assert_eq!(removed.id, "a");
        assert_eq!(w.peek_head().unwrap().position, Some(1));
        assert!(w.remove_entry("a").is_none());
    }

    #[test]
    fn peek_head_is_lowest_position() {
        let w = OrderedWaitlist::load(vec![waiting("b", 2, 1), waiting("a", 1, 5)]);
        assert_eq!(w.peek_head().unwrap().id, "a");
    }

    #[test]
    fn renumber_restores_fcfs_order() {
        // duplicate and gapped positions
        let mut w = OrderedWaitlist::load(vec![
            waiting("late", 1, 30),
            waiting("early", 1, 10),
            waiting("mid", 7, 20),
        ]);
        assert!(!w.is_dense());
        // "early" already holds 1; only the other two move
        let fixed = w.renumber();
        assert_eq!(fixed, 2);
        assert_eq!(w.get("early").unwrap().position, Some(1));
        assert_eq!(w.get("mid").unwrap().position, Some(2));
        assert_eq!(w.get("late").unwrap().position, Some(3));

        let mut touched: Vec<String> = w.take_touched().into_iter().map(|e| e.id).collect();
        touched.sort();
        assert_eq!(touched, ["late", "mid"]);
        assert_eq!(w.renumber(), 0);
    }
}
