/// Linear undo/redo over full snapshots.
///
/// `index` always points at the snapshot matching the live state. Committing
/// after an undo discards everything past `index`, there is no branching.
#[derive(Debug, Clone, PartialEq)]
pub struct History<S> {
    snapshots: Vec<S>,
    index: usize,
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            index: 0,
        }
    }
}

impl<S> History<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(snapshot: S) -> Self {
        Self {
            snapshots: vec![snapshot],
            index: 0,
        }
    }

    pub fn commit(&mut self, snapshot: S) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.index + 1);
        }
        self.snapshots.push(snapshot);
        self.index = self.snapshots.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&S> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.snapshots.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.index < self.snapshots.len() - 1
    }

    pub fn current(&self) -> Option<&S> {
        self.snapshots.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Forgets every snapshot and starts over from `snapshot`.
    pub fn reset(&mut self, snapshot: S) {
        self.snapshots.clear();
        self.snapshots.push(snapshot);
        self.index = 0;
    }
}
