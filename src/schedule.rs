//! Rotation decisions for the display scheduler.
//!
//! The functions here are pure over the queue, the cursor state, and an
//! injected [`ValidatedRead`] capability, so the eviction/retry behavior is
//! testable without touching a real filesystem. Callers apply the returned
//! evictions to their backing indices.

use std::collections::HashMap;

use crate::naming;

/// Validated read capability. The production implementation lives on
/// `FileIndex`; tests substitute an in-memory fake to simulate corruption.
pub trait ValidatedRead {
    /// Read the entry's bytes, verifying the recorded content hash.
    /// `None` means missing or corrupt; the caller must evict the entry.
    fn read_validated(&mut self, rel: &str) -> Option<Vec<u8>>;
}

/// Cursor state for both rotation modes: the single global index plus the
/// per-date-prefix last-served indices used while a date filter is active.
#[derive(Debug)]
pub struct Rotation {
    cursor: isize,
    date_cursors: HashMap<String, isize>,
}

impl Default for Rotation {
    fn default() -> Self {
        Self {
            cursor: -1,
            date_cursors: HashMap::new(),
        }
    }
}

impl Rotation {
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn date_cursor(&self, prefix: &str) -> isize {
        self.date_cursors.get(prefix).copied().unwrap_or(-1)
    }

    fn set_date_cursor(&mut self, prefix: &str, idx: isize) {
        self.date_cursors.insert(prefix.to_string(), idx);
    }

    /// Rewind so that the next forward step lands on the item before the
    /// one currently pointed at.
    pub fn rewind_two(&mut self, queue_len: usize) {
        if queue_len == 0 {
            return;
        }
        let len = queue_len as isize;
        self.cursor = (self.cursor - 2 + len) % len;
    }

    /// Compensate every cursor for the removal of the entry at `idx`.
    /// The global cursor moves back when it pointed at or past the removed
    /// slot; date cursors move back when they pointed at or past it.
    pub fn compensate_removal(&mut self, idx: usize, remaining: usize) {
        let idx = idx as isize;
        if remaining == 0 {
            self.cursor = -1;
        } else if idx <= self.cursor {
            self.cursor = (self.cursor - 1).max(-1);
        }
        for v in self.date_cursors.values_mut() {
            if *v >= idx {
                *v = (*v - 1).max(-1);
            }
        }
    }
}

/// Outcome of one rotation attempt: the entry to serve (if any) and the
/// entries that failed validation along the way. The caller removes the
/// evicted paths from its owner/hash tables and clears dangling references;
/// the queue and cursors are already adjusted.
#[derive(Debug, Default)]
pub struct Advance {
    pub served: Option<(String, Vec<u8>)>,
    pub evicted: Vec<String>,
}

/// Plain rotation: advance circularly from the cursor, skipping entries the
/// display cannot render and evicting entries that fail validation, until a
/// candidate is served or the queue is exhausted.
pub fn advance(
    queue: &mut Vec<String>,
    rotation: &mut Rotation,
    reader: &mut dyn ValidatedRead,
) -> Advance {
    let mut out = Advance::default();
    let mut tries = 0;
    while !queue.is_empty() && tries < queue.len() {
        let len = queue.len() as isize;
        let idx = ((rotation.cursor + 1) % len) as usize;
        rotation.cursor = idx as isize;
        let rel = queue[idx].clone();

        if !naming::is_displayable(&rel) {
            tries += 1;
            continue;
        }

        if let Some(bytes) = reader.read_validated(&rel) {
            out.served = Some((rel, bytes));
            return out;
        }

        // Corrupt entry: drop it and retry at the same logical position.
        // Each eviction shrinks the queue, so the scan still terminates.
        queue.remove(idx);
        rotation.compensate_removal(idx, queue.len());
        out.evicted.push(rel);
    }
    out
}

/// Date-scoped rotation: scan from the prefix's own cursor, considering only
/// entries under `prefix`, with the same skip/evict discipline as the plain
/// rotation. The scan continues within this call until a valid candidate is
/// found or the filtered subset is exhausted.
pub fn advance_by_date(
    queue: &mut Vec<String>,
    rotation: &mut Rotation,
    prefix: &str,
    reader: &mut dyn ValidatedRead,
) -> Advance {
    let mut out = Advance::default();
    if queue.is_empty() {
        return out;
    }

    let mut start = rotation.date_cursor(prefix) + 1;
    if start >= queue.len() as isize {
        start = 0;
    }
    let start = start as usize;

    let mut tries = 0;
    while !queue.is_empty() && tries < queue.len() {
        let idx = (start + tries) % queue.len();
        let rel = queue[idx].clone();

        if rel.starts_with(prefix) && naming::is_displayable(&rel) {
            if let Some(bytes) = reader.read_validated(&rel) {
                rotation.set_date_cursor(prefix, idx as isize);
                out.served = Some((rel, bytes));
                return out;
            }
            queue.remove(idx);
            rotation.compensate_removal(idx, queue.len());
            out.evicted.push(rel);
            continue;
        }
        tries += 1;
    }
    out
}
