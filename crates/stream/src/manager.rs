use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use glam::Vec3;
use gridstream_common::{CellCoord, ContentLoader, ContentLocator, ContentRef, PositionSource};
use gridstream_topology::GridTopology;

use crate::StreamError;
use crate::config::StreamConfig;
use crate::reconcile::{Reconciliation, Step};
use crate::window::ActiveWindow;

/// Emitted once per confirmed change of the observer's cell, before any
/// reconciliation work for the new cell starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellChange {
    pub previous: CellCoord,
    pub current: CellCoord,
}

/// Per-tick streaming statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    /// Loads sent to the content loader. Cells without content, or
    /// already resident, are not counted.
    pub loads_requested: usize,
    /// Unloads sent to the content loader.
    pub unloads_requested: usize,
    pub total_loaded_cells: usize,
    pub reconciling: bool,
    pub tick_time: Duration,
}

/// Collects the collaborators a [`CellStreamingManager`] needs.
///
/// The content loader and position source are required; building without
/// either fails immediately rather than on the first tick.
#[derive(Default)]
pub struct StreamingManagerBuilder {
    topology: Option<GridTopology>,
    config: StreamConfig,
    loader: Option<Box<dyn ContentLoader>>,
    position: Option<Box<dyn PositionSource>>,
    locator: Option<Box<dyn ContentLocator>>,
}

impl StreamingManagerBuilder {
    pub fn topology(mut self, topology: GridTopology) -> Self {
        self.topology = Some(topology);
        self
    }

    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn loader(mut self, loader: impl ContentLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn position_source(mut self, source: impl PositionSource + 'static) -> Self {
        self.position = Some(Box::new(source));
        self
    }

    pub fn locator(mut self, locator: impl ContentLocator + 'static) -> Self {
        self.locator = Some(Box::new(locator));
        self
    }

    /// Resolve content refs for every cell, place the observer, and start
    /// the initial reconciliation.
    pub fn build(self) -> Result<CellStreamingManager, StreamError> {
        let loader = self
            .loader
            .ok_or(StreamError::MissingCollaborator("content loader"))?;
        let position = self
            .position
            .ok_or(StreamError::MissingCollaborator("position source"))?;
        let topology = self.topology.unwrap_or_else(|| {
            tracing::warn!("no topology supplied, using the built-in placeholder grid");
            GridTopology::default()
        });
        let config = self.config.clamped();

        let mut content = HashMap::new();
        match &self.locator {
            Some(locator) => {
                for key in topology.cells() {
                    if let Some(found) = locator.locate(key.coord, key.index) {
                        content.insert(key.coord, found);
                    }
                }
            }
            None => tracing::warn!("no content locator supplied, cells will stream without content"),
        }
        tracing::info!(
            cells = topology.cell_count(),
            with_content = content.len(),
            "streaming manager initialised"
        );

        let center = topology.cell_coordinate_of(position.position());
        let window = ActiveWindow {
            center,
            last_center: topology.clamp(center.offset(1, 0, 0)),
            horizontal_radius: config.horizontal_radius,
            vertical_radius: config.vertical_radius,
        };

        let mut manager = CellStreamingManager {
            topology,
            config,
            loader,
            position,
            content,
            window,
            loaded: HashSet::new(),
            reconciliation: None,
            ticks_since_change: 0,
            listeners: Vec::new(),
            stats: StreamStats::default(),
        };
        manager.reconcile();
        Ok(manager)
    }
}

/// Keeps the cells around the observer resident.
///
/// Every tick the manager (after a cooldown following the last change)
/// samples the observer, and if its cell changed, notifies subscribers and
/// restarts reconciliation toward the new window. At most one
/// reconciliation is in flight; a new one cancels the old outright.
/// Reconciliation issues at most one load or unload request per tick.
pub struct CellStreamingManager {
    topology: GridTopology,
    config: StreamConfig,
    loader: Box<dyn ContentLoader>,
    position: Box<dyn PositionSource>,
    content: HashMap<CellCoord, ContentRef>,
    window: ActiveWindow,
    loaded: HashSet<CellCoord>,
    reconciliation: Option<Reconciliation>,
    ticks_since_change: u32,
    listeners: Vec<Sender<CellChange>>,
    stats: StreamStats,
}

impl CellStreamingManager {
    pub fn builder() -> StreamingManagerBuilder {
        StreamingManagerBuilder::default()
    }

    /// Advance one host tick.
    pub fn tick(&mut self) -> &StreamStats {
        let _span = tracing::info_span!("stream_tick").entered();
        let tick_start = Instant::now();
        let mut stats = StreamStats::default();

        self.ticks_since_change = self.ticks_since_change.saturating_add(1);
        if self.ticks_since_change >= self.config.cell_change_cooldown_ticks {
            self.check_observer();
        }
        self.step_reconciliation(&mut stats);

        stats.total_loaded_cells = self.loaded.len();
        stats.reconciling = self.reconciliation.is_some();
        stats.tick_time = tick_start.elapsed();
        self.stats = stats;
        &self.stats
    }

    /// Restart reconciliation around the current center cell, cancelling
    /// any run in flight.
    pub fn reconcile(&mut self) {
        let center = self.window.center;
        if let Some(previous) = self.reconciliation.take() {
            tracing::debug!(
                from = %previous.center(),
                to = %center,
                "cancelling in-flight reconciliation"
            );
            previous.cancel(&mut self.loaded);
        }
        let cells = self.window.cells(&self.topology);
        tracing::debug!(%center, candidates = cells.len(), "starting reconciliation");
        self.reconciliation = Some(Reconciliation::new(center, cells));
    }

    /// Step the in-flight reconciliation until it completes, without
    /// sampling the observer. Returns the number of steps taken.
    pub fn finish_reconciliation(&mut self) -> usize {
        let mut stats = StreamStats::default();
        let mut steps = 0;
        while self.reconciliation.is_some() {
            self.step_reconciliation(&mut stats);
            steps += 1;
        }
        steps
    }

    /// Register for cell change notifications.
    pub fn subscribe(&mut self) -> Receiver<CellChange> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    pub fn topology(&self) -> &GridTopology {
        &self.topology
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn window(&self) -> &ActiveWindow {
        &self.window
    }

    pub fn current_cell(&self) -> CellCoord {
        self.window.center
    }

    pub fn last_cell(&self) -> CellCoord {
        self.window.last_center
    }

    /// Center cell and the size of one cell.
    pub fn active_cell(&self) -> (CellCoord, Vec3) {
        (self.window.center, self.topology.cell_size())
    }

    /// Resident cells on the ground layer, sorted.
    pub fn surround_cells(&self) -> Vec<CellCoord> {
        let mut cells: Vec<CellCoord> = self.loaded.iter().filter(|c| c.y == 0).copied().collect();
        cells.sort();
        cells
    }

    /// Cells resident as of the last completed reconciliation.
    pub fn loaded_cells(&self) -> &HashSet<CellCoord> {
        &self.loaded
    }

    pub fn is_loaded(&self, coord: CellCoord) -> bool {
        self.loaded.contains(&coord)
    }

    pub fn is_reconciling(&self) -> bool {
        self.reconciliation.is_some()
    }

    pub fn content_ref(&self, coord: CellCoord) -> Option<&ContentRef> {
        self.content.get(&coord)
    }

    pub fn loader(&self) -> &dyn ContentLoader {
        self.loader.as_ref()
    }

    /// Statistics from the last tick.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    fn check_observer(&mut self) {
        let cell = self.topology.cell_coordinate_of(self.position.position());
        if cell == self.window.center {
            return;
        }
        let change = CellChange {
            previous: self.window.center,
            current: cell,
        };
        self.window.last_center = change.previous;
        self.window.center = change.current;
        self.ticks_since_change = 0;
        tracing::debug!(previous = %change.previous, current = %change.current, "observer changed cell");
        self.listeners.retain(|tx| tx.send(change).is_ok());
        self.reconcile();
    }

    fn step_reconciliation(&mut self, stats: &mut StreamStats) {
        let Some(run) = self.reconciliation.as_mut() else {
            return;
        };
        match run.step(&self.loaded) {
            Step::Load(cell) => {
                if self.request_load(cell) {
                    stats.loads_requested += 1;
                }
            }
            Step::Unload(cell) => {
                if self.request_unload(cell) {
                    stats.unloads_requested += 1;
                }
            }
            Step::Complete(resident) => {
                tracing::trace!(
                    center = %run.center(),
                    resident = resident.len(),
                    "reconciliation complete"
                );
                self.loaded = resident;
                self.reconciliation = None;
            }
        }
    }

    /// Returns whether a load was sent to the loader.
    fn request_load(&mut self, cell: CellCoord) -> bool {
        let Some(content) = self.content.get(&cell) else {
            tracing::trace!(%cell, "no content for cell");
            return false;
        };
        if self.loader.is_loaded(cell) {
            return false;
        }
        tracing::debug!(%cell, name = %content.name, "loading cell");
        self.loader.load_content(cell, content);
        true
    }

    /// Returns whether an unload was sent to the loader.
    fn request_unload(&mut self, cell: CellCoord) -> bool {
        if !self.loader.is_loaded(cell) {
            return false;
        }
        tracing::debug!(%cell, "unloading cell");
        self.loader.unload_content(cell);
        true
    }
}
