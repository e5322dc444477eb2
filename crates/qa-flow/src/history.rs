use std::collections::BTreeMap;

use qa_spec::FormValues;

/// Per-step snapshots of the form values, taken whenever a step is edited or
/// left, and read back when the step is entered again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepHistory {
    snapshots: BTreeMap<usize, FormValues>,
}

impl StepHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, index: usize, values: &FormValues) {
        self.snapshots.insert(index, values.clone());
    }

    pub fn get(&self, index: usize) -> Option<&FormValues> {
        self.snapshots.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.snapshots.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Values to show when entering `index`: its snapshot if one exists,
    /// otherwise `live`, which then becomes the step's first snapshot.
    pub fn restore_or_seed(&mut self, index: usize, live: &FormValues) -> FormValues {
        self.snapshots
            .entry(index)
            .or_insert_with(|| live.clone())
            .clone()
    }
}
