use std::sync::{Arc, Mutex};

/// Default capacity for a fresh cell buffer; wide exports run to ~80 columns.
pub const DEFAULT_CELL_CAPACITY: usize = 80;

const MAX_RETAINED: usize = 256;

/// Recycles cell buffers between the extractor and the workers for the
/// duration of one run. Buffers come back cleared.
#[derive(Debug, Clone)]
pub struct RowPool {
    buffers: Arc<Mutex<Vec<Vec<String>>>>,
    cell_capacity: usize,
}

impl RowPool {
    pub fn new(cell_capacity: usize) -> Self {
        Self {
            buffers: Arc::new(Mutex::new(Vec::with_capacity(MAX_RETAINED))),
            cell_capacity: cell_capacity.max(1),
        }
    }

    /// Sizes fresh buffers to the header count once it is known.
    pub fn with_headers(&self, header_count: usize) -> Self {
        Self {
            buffers: Arc::clone(&self.buffers),
            cell_capacity: header_count.max(self.cell_capacity),
        }
    }

    pub fn take(&self) -> Vec<String> {
        let recycled = self
            .buffers
            .lock()
            .expect("row pool lock poisoned")
            .pop();
        recycled.unwrap_or_else(|| Vec::with_capacity(self.cell_capacity))
    }

    pub fn give(&self, mut cells: Vec<String>) {
        cells.clear();
        let mut buffers = self.buffers.lock().expect("row pool lock poisoned");
        if buffers.len() < MAX_RETAINED {
            buffers.push(cells);
        }
    }

    pub fn retained(&self) -> usize {
        self.buffers.lock().expect("row pool lock poisoned").len()
    }
}

impl Default for RowPool {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recycled_buffers_come_back_empty() {
        let pool = RowPool::new(4);
        let mut cells = pool.take();
        cells.push("Alice".to_string());
        pool.give(cells);
        assert_eq!(pool.retained(), 1);

        let reused = pool.take();
        assert!(reused.is_empty());
        assert!(reused.capacity() >= 1);
        assert_eq!(pool.retained(), 0);
    }

    #[test]
    fn header_sized_view_shares_storage() {
        let pool = RowPool::new(8);
        let sized = pool.with_headers(40);
        sized.give(Vec::new());
        assert_eq!(pool.retained(), 1);
        assert!(sized.take().is_empty());
    }
}
