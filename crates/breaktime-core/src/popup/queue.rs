use std::collections::VecDeque;

use crate::timer::EventKind;

/// Pending popups, highest priority first, FIFO within a priority.
/// Holds each kind at most once.
#[derive(Debug, Clone, Default)]
pub(crate) struct PopupQueue {
    entries: VecDeque<(u8, EventKind)>,
}

impl PopupQueue {
    pub fn contains(&self, kind: EventKind) -> bool {
        self.entries.iter().any(|(_, k)| *k == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queue behind everything of equal or higher priority.
    pub fn insert(&mut self, kind: EventKind) -> bool {
        if self.contains(kind) {
            return false;
        }
        let priority = kind.priority();
        let at = self
            .entries
            .iter()
            .position(|(p, _)| *p > priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, (priority, kind));
        true
    }

    /// Queue ahead of its own priority class, for popups that were already
    /// on screen and got bumped.
    pub fn push_front(&mut self, kind: EventKind) -> bool {
        if self.contains(kind) {
            return false;
        }
        let priority = kind.priority();
        let at = self
            .entries
            .iter()
            .position(|(p, _)| *p >= priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, (priority, kind));
        true
    }

    pub fn pop_front(&mut self) -> Option<EventKind> {
        self.entries.pop_front().map(|(_, kind)| kind)
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.entries.iter().map(|(_, kind)| *kind).collect()
    }
}
