//! Buffer reconciliation for bouncer-sync.
//!
//! Merges the relay's buffer list for one network into the local buffer
//! set:
//! - Every remote buffer is found (case-insensitively) or created, then
//!   its `enabled`, `joined`, `last_read` and `topic` fields are synced
//! - Local channel and query buffers the relay no longer reports are dropped
//! - Other buffers (status, server) are never touched
//!
//! Fields are only written when they differ, so re-running with an
//! unchanged remote list leaves the buffer set untouched and reports no
//! change. That makes reconciliation safe to apply twice for the same
//! network, which happens when the relay reports a network both as the
//! upstream of a login and in its full network list.

use bnc_types::{Buffer, RemoteBuffer};

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Buffers created.
    pub added: Vec<String>,
    /// Existing buffers with at least one field changed.
    pub updated: Vec<String>,
    /// Channel and query buffers removed.
    pub removed: Vec<String>,
    /// Channels joined after the pass (membership refresh candidates).
    pub joined_channels: Vec<String>,
}

impl ReconcileOutcome {
    /// Whether the pass mutated nothing.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Reconcile a network's buffers against the relay's buffer list.
pub fn reconcile_buffers(buffers: &mut Vec<Buffer>, remote: &[RemoteBuffer]) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();

    for entry in remote {
        let (index, created) = match buffers.iter().position(|b| b.is_named(&entry.name)) {
            Some(index) => (index, false),
            None => {
                buffers.push(Buffer::new(&entry.name));
                outcome.added.push(entry.name.clone());
                (buffers.len() - 1, true)
            }
        };

        let buffer = &mut buffers[index];
        let mut changed = false;
        changed |= assign(&mut buffer.enabled, entry.joined);
        changed |= assign(&mut buffer.joined, entry.joined);
        if let Some(seen) = entry.seen {
            changed |= assign(&mut buffer.last_read, Some(seen));
        }
        changed |= assign(&mut buffer.topic, entry.topic.clone().unwrap_or_default());

        if changed && !created {
            push_unique(&mut outcome.updated, &buffer.name);
        }
        if buffer.is_channel() && buffer.joined {
            push_unique(&mut outcome.joined_channels, &buffer.name);
        }
    }

    let mut removed = Vec::new();
    buffers.retain(|buffer| {
        let keep = !buffer.is_relayed() || remote.iter().any(|r| buffer.is_named(&r.name));
        if !keep {
            removed.push(buffer.name.clone());
        }
        keep
    });
    outcome.removed = removed;

    outcome
}

fn assign<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bnc_types::BufferKind;

    fn local(names: &[&str]) -> Vec<Buffer> {
        names.iter().map(|n| Buffer::new(n)).collect()
    }

    // ===========================================
    // Add / Update / Remove
    // ===========================================

    #[test]
    fn creates_missing_buffers() {
        let mut buffers = Vec::new();
        let remote = vec![
            RemoteBuffer::new("#chan", true).with_seen(1000),
            RemoteBuffer::new("#old", false),
        ];

        let outcome = reconcile_buffers(&mut buffers, &remote);

        assert_eq!(outcome.added, vec!["#chan", "#old"]);
        assert_eq!(buffers.len(), 2);

        let chan = &buffers[0];
        assert!(chan.joined);
        assert!(chan.enabled);
        assert_eq!(chan.last_read, Some(1000));

        let old = &buffers[1];
        assert!(!old.joined);
        assert!(!old.enabled);
        assert_eq!(old.last_read, None);
    }

    #[test]
    fn updates_existing_buffer_case_insensitively() {
        let mut buffers = local(&["#Rust"]);
        let remote = vec![RemoteBuffer::new("#rust", false).with_topic("Rust talk")];

        let outcome = reconcile_buffers(&mut buffers, &remote);

        assert!(outcome.added.is_empty());
        assert_eq!(outcome.updated, vec!["#Rust"]);
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].name, "#Rust");
        assert!(!buffers[0].enabled);
        assert_eq!(buffers[0].topic, "Rust talk");
    }

    #[test]
    fn missing_topic_resets_to_empty() {
        let mut buffers = local(&["#chan"]);
        buffers[0].topic = "stale".into();

        reconcile_buffers(&mut buffers, &[RemoteBuffer::new("#chan", true)]);
        assert_eq!(buffers[0].topic, "");
    }

    #[test]
    fn absent_seen_keeps_last_read() {
        let mut buffers = local(&["#chan"]);
        buffers[0].last_read = Some(500);

        reconcile_buffers(&mut buffers, &[RemoteBuffer::new("#chan", true)]);
        assert_eq!(buffers[0].last_read, Some(500));
    }

    #[test]
    fn removes_channels_and_queries_not_reported() {
        let mut buffers = local(&["#gone", "carol", "*status", "#kept"]);
        let remote = vec![RemoteBuffer::new("#KEPT", true)];

        let outcome = reconcile_buffers(&mut buffers, &remote);

        assert_eq!(outcome.removed, vec!["#gone", "carol"]);
        let names: Vec<_> = buffers.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["*status", "#kept"]);
        assert_eq!(buffers[0].kind, BufferKind::Other);
    }

    #[test]
    fn reports_joined_channels_only() {
        let mut buffers = Vec::new();
        let remote = vec![
            RemoteBuffer::new("#a", true),
            RemoteBuffer::new("#b", false),
            RemoteBuffer::new("dave", true),
        ];

        let outcome = reconcile_buffers(&mut buffers, &remote);
        assert_eq!(outcome.joined_channels, vec!["#a"]);
    }

    // ===========================================
    // Idempotence and Convergence
    // ===========================================

    #[test]
    fn rerun_with_same_list_is_unchanged() {
        let mut buffers = local(&["*status", "#x"]);
        let remote = vec![
            RemoteBuffer::new("#chan", true).with_seen(1000).with_topic("t"),
            RemoteBuffer::new("bob", false),
        ];

        let first = reconcile_buffers(&mut buffers, &remote);
        assert!(!first.is_unchanged());
        let after_first = buffers.clone();

        let second = reconcile_buffers(&mut buffers, &remote);
        assert!(second.is_unchanged());
        assert_eq!(buffers, after_first);
    }

    #[test]
    fn converges_from_different_starting_points() {
        let remote = vec![
            RemoteBuffer::new("#chan", true).with_seen(1000),
            RemoteBuffer::new("#old", false),
        ];

        let mut stale = local(&["#chan", "#removed", "erin", "*status"]);
        stale[0].joined = false;
        stale[0].topic = "old topic".into();
        let mut fresh = local(&["*status"]);

        reconcile_buffers(&mut stale, &remote);
        reconcile_buffers(&mut fresh, &remote);

        let sorted = |bufs: &[Buffer]| {
            let mut v: Vec<_> = bufs.to_vec();
            v.sort_by(|a, b| a.name.cmp(&b.name));
            v
        };
        assert_eq!(sorted(&stale), sorted(&fresh));
    }

    #[test]
    fn empty_remote_list_drops_all_relayed_buffers() {
        let mut buffers = local(&["#a", "bob", "*status"]);
        let outcome = reconcile_buffers(&mut buffers, &[]);

        assert_eq!(outcome.removed.len(), 2);
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].name, "*status");
    }
}
