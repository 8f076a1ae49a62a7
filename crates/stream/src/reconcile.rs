//! One frame-spread reconciliation run.
//!
//! A run scans the window in order, asking for a load for every cell not
//! yet resident, then asks for an unload for every resident cell that fell
//! outside the window, then hands back the new resident set. Each request
//! is one step; the host advances the run by one step per tick.

use std::collections::{HashSet, VecDeque};

use gridstream_common::CellCoord;

/// What a single step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Content for this cell should be loaded.
    Load(CellCoord),
    /// Content for this cell should be unloaded.
    Unload(CellCoord),
    /// The run finished; this is the new resident set.
    Complete(HashSet<CellCoord>),
}

/// In-flight reconciliation toward one window center.
#[derive(Debug)]
pub struct Reconciliation {
    center: CellCoord,
    window: Vec<CellCoord>,
    cursor: usize,
    candidates: HashSet<CellCoord>,
    /// Set once the load pass is done.
    unloads: Option<VecDeque<CellCoord>>,
    issued_loads: Vec<CellCoord>,
    issued_unloads: Vec<CellCoord>,
}

impl Reconciliation {
    /// Start a run over `window`, which must already be in scan order.
    pub fn new(center: CellCoord, window: Vec<CellCoord>) -> Self {
        Self {
            center,
            candidates: HashSet::with_capacity(window.len()),
            window,
            cursor: 0,
            unloads: None,
            issued_loads: Vec::new(),
            issued_unloads: Vec::new(),
        }
    }

    pub fn center(&self) -> CellCoord {
        self.center
    }

    /// Whether the load pass has finished.
    pub fn is_unloading(&self) -> bool {
        self.unloads.is_some()
    }

    /// Advance until one request is produced or the run completes.
    ///
    /// `loaded` is the resident set as of the start of the run; it must not
    /// change while the run is in flight.
    pub fn step(&mut self, loaded: &HashSet<CellCoord>) -> Step {
        if self.unloads.is_none() {
            while let Some(&cell) = self.window.get(self.cursor) {
                self.cursor += 1;
                self.candidates.insert(cell);
                if !loaded.contains(&cell) {
                    self.issued_loads.push(cell);
                    return Step::Load(cell);
                }
            }
        }
        let queue = self.unloads.get_or_insert_with(|| {
            let mut to_unload: Vec<CellCoord> =
                loaded.difference(&self.candidates).copied().collect();
            to_unload.sort();
            to_unload.into()
        });
        match queue.pop_front() {
            Some(cell) => {
                self.issued_unloads.push(cell);
                Step::Unload(cell)
            }
            None => Step::Complete(std::mem::take(&mut self.candidates)),
        }
    }

    /// Abandon the run. Requests already handed out are not retracted, so
    /// `loaded` is corrected to what the collaborator was actually asked
    /// to keep resident.
    pub fn cancel(self, loaded: &mut HashSet<CellCoord>) {
        loaded.extend(self.issued_loads);
        for cell in self.issued_unloads {
            loaded.remove(&cell);
        }
    }
}
