//! Tap selection for manual fusion (at most two bubbles)

use super::state::BubbleId;

pub const MAX_SELECTED: usize = 2;

/// Result of toggling a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected,
    /// Tapped an already-selected bubble
    Deselected,
    /// Two bubbles are already held
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<BubbleId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: BubbleId) -> SelectOutcome {
        if let Some(pos) = self.ids.iter().position(|&s| s == id) {
            self.ids.remove(pos);
            SelectOutcome::Deselected
        } else if self.ids.len() >= MAX_SELECTED {
            SelectOutcome::Rejected
        } else {
            self.ids.push(id);
            SelectOutcome::Selected
        }
    }

    /// The held pair, once two bubbles are selected
    pub fn pair(&self) -> Option<(BubbleId, BubbleId)> {
        match self.ids.as_slice() {
            [a, b] => Some((*a, *b)),
            _ => None,
        }
    }

    pub fn contains(&self, id: BubbleId) -> bool {
        self.ids.contains(&id)
    }

    /// Drop a bubble that left play
    pub fn forget(&mut self, id: BubbleId) {
        self.ids.retain(|&s| s != id);
    }

    pub fn ids(&self) -> &[BubbleId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_third_selection_is_rejected() {
        let mut selection = Selection::new();
        assert_eq!(selection.toggle(1), SelectOutcome::Selected);
        assert_eq!(selection.toggle(2), SelectOutcome::Selected);
        assert_eq!(selection.toggle(3), SelectOutcome::Rejected);
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.pair(), Some((1, 2)));
    }

    #[test]
    fn test_reselect_deselects() {
        let mut selection = Selection::new();
        selection.toggle(4);
        assert_eq!(selection.toggle(4), SelectOutcome::Deselected);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_slot_frees_after_deselect() {
        let mut selection = Selection::new();
        selection.toggle(1);
        selection.toggle(2);
        selection.toggle(1);
        assert_eq!(selection.toggle(3), SelectOutcome::Selected);
        assert_eq!(selection.ids(), &[2, 3]);
    }

    #[test]
    fn test_forget_removes_consumed_bubble() {
        let mut selection = Selection::new();
        selection.toggle(7);
        selection.forget(7);
        selection.forget(99);
        assert!(!selection.contains(7));
        assert_eq!(selection.pair(), None);
    }
}
