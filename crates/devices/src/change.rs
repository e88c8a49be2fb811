use bitflags::bitflags;

bitflags! {
    /// Host-visible side effects recorded by device mutations.
    ///
    /// Devices accumulate flags while they mutate; the host tick loop drains
    /// them once per tick and maps each flag to its engine hook (mark dirty
    /// for persistence, neighbor-notify for comparators, network broadcast).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChangeSet: u8 {
        /// Persisted state changed; schedule a save.
        const DIRTY = 1;
        /// Comparator-visible level changed; notify adjacent blocks.
        const NEIGHBOR = 1 << 1;
        /// Client-visible state changed; broadcast a snapshot.
        const SYNC = 1 << 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accumulate_and_drain() {
        let mut changes = ChangeSet::empty();
        changes |= ChangeSet::DIRTY;
        changes |= ChangeSet::SYNC | ChangeSet::DIRTY;
        assert!(changes.contains(ChangeSet::DIRTY));
        assert!(changes.contains(ChangeSet::SYNC));
        assert!(!changes.contains(ChangeSet::NEIGHBOR));

        let drained = std::mem::take(&mut changes);
        assert_eq!(drained, ChangeSet::DIRTY | ChangeSet::SYNC);
        assert!(changes.is_empty());
    }
}
