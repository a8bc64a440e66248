//! Node identity allocation.

use std::collections::HashMap;

/// Assigns small integer IDs to import paths in first-seen order.
///
/// IDs start at 0, are never reused, and mean nothing across runs.
///
/// # Example
///
/// ```
/// use godepgraph::graph::IdAllocator;
///
/// let mut ids = IdAllocator::new();
/// assert_eq!(ids.id_for("app"), 0);
/// assert_eq!(ids.id_for("lib/a"), 1);
/// assert_eq!(ids.id_for("app"), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    ids: HashMap<String, usize>,
    next_id: usize,
}

impl IdAllocator {
    /// Creates an allocator starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ID for `import_path`, assigning the next one if needed.
    pub fn id_for(&mut self, import_path: &str) -> usize {
        if let Some(&id) = self.ids.get(import_path) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(import_path.to_string(), id);
        id
    }
}
