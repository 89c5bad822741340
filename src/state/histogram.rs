use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One histogram row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCount {
    pub class: String,
    pub count: u64,
}

/// Frequency of entity class tags over a run. Counts only ever grow.
#[derive(Debug, Default)]
pub struct ClassHistogram {
    counts: HashMap<String, u64>,
}

impl ClassHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, class: &str) {
        match self.counts.get_mut(class) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(class.to_string(), 1);
            }
        }
    }

    pub fn count(&self, class: &str) -> u64 {
        self.counts.get(class).copied().unwrap_or(0)
    }

    /// Rows ordered by count descending, then class name ascending
    pub fn snapshot(&self) -> Vec<ClassCount> {
        let mut rows: Vec<ClassCount> = self
            .counts
            .iter()
            .map(|(class, count)| ClassCount {
                class: class.clone(),
                count: *count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.class.cmp(&b.class)));
        rows
    }

    /// Number of distinct classes seen
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
