use glam::Vec3;
use gridstream_author::{GridAuthoringStore, GridSettings};
use gridstream_common::{CellCoord, ContentLoader, InMemoryContentLoader};
use gridstream_persist::{GridFileStore, GridLayout};
use gridstream_stream::{CellChange, CellStreamingManager, DirectoryContentLocator, StreamConfig, load_topology_or_default};
use gridstream_topology::{CellSize, ExpansionLevel, ExpansionMode};
use std::cell::Cell;
use std::rc::Rc;

fn files(tmp: &tempfile::TempDir) -> GridFileStore {
    GridFileStore::new(GridLayout::new(tmp.path(), "Island"))
}

fn author_island(tmp: &tempfile::TempDir) -> GridAuthoringStore {
    let mut store = GridAuthoringStore::open(files(tmp)).unwrap();
    store
        .set_settings(GridSettings {
            world_size_x: 4,
            world_size_z: 4,
            world_size_y: 2,
            origin: Vec3::ZERO,
            cell_size_xz: CellSize::Size256,
            cell_size_y: CellSize::Size128,
            expansion_mode: ExpansionMode::PositiveXZCorner,
            expansion_level: ExpansionLevel::Bottom,
        })
        .unwrap();
    // (2,0,0) is left without content.
    let hole = store.topology().flat_index(CellCoord::new(2, 0, 0)).unwrap();
    store.set_cell_valid(hole, false).unwrap();
    store.save().unwrap();
    store
}

#[test]
fn runtime_reads_authored_topology() {
    let tmp = tempfile::tempdir().unwrap();
    let authored = author_island(&tmp);
    assert_eq!(load_topology_or_default(&files(&tmp)), *authored.topology());
}

#[test]
fn authored_world_streams_around_observer() {
    let tmp = tempfile::tempdir().unwrap();
    author_island(&tmp);
    let files = files(&tmp);

    let observer = Rc::new(Cell::new(Vec3::new(300.0, 10.0, 10.0)));
    let position = Rc::clone(&observer);
    let mut manager = CellStreamingManager::builder()
        .topology(load_topology_or_default(&files))
        .config(StreamConfig {
            horizontal_radius: 1,
            vertical_radius: 0,
            cell_change_cooldown_ticks: 1,
        })
        .loader(InMemoryContentLoader::new())
        .locator(DirectoryContentLocator::new(files.clone()))
        .position_source(move || position.get())
        .build()
        .unwrap();
    let changes = manager.subscribe();

    assert_eq!(manager.current_cell(), CellCoord::new(1, 0, 0));
    manager.finish_reconciliation();
    assert_eq!(manager.loaded_cells().len(), 6);

    let with_content = CellCoord::new(0, 0, 1);
    assert!(manager.loader().is_loaded(with_content));
    let key = manager.topology().key_of(with_content).unwrap();
    assert_eq!(manager.content_ref(with_content), Some(&files.layout().content_ref(&key)));

    // Tracked as resident, but it has no content to load.
    let hole = CellCoord::new(2, 0, 0);
    assert!(manager.is_loaded(hole));
    assert!(!manager.loader().is_loaded(hole));
    assert!(manager.content_ref(hole).is_none());

    observer.set(Vec3::new(550.0, 10.0, 10.0));
    for _ in 0..20 {
        manager.tick();
    }
    assert_eq!(
        changes.try_iter().collect::<Vec<_>>(),
        vec![CellChange {
            previous: CellCoord::new(1, 0, 0),
            current: CellCoord::new(2, 0, 0),
        }]
    );
    assert!(!manager.is_reconciling());
    assert_eq!(manager.loaded_cells().len(), 6);
    assert!(!manager.loader().is_loaded(CellCoord::new(0, 0, 0)));
    assert!(manager.loader().is_loaded(CellCoord::new(3, 0, 1)));
}

#[test]
fn unsaved_world_streams_placeholder_grid() {
    let tmp = tempfile::tempdir().unwrap();
    let files = files(&tmp);
    let mut manager = CellStreamingManager::builder()
        .topology(load_topology_or_default(&files))
        .config(StreamConfig {
            horizontal_radius: 1,
            vertical_radius: 0,
            cell_change_cooldown_ticks: 1,
        })
        .loader(InMemoryContentLoader::new())
        .locator(DirectoryContentLocator::new(files))
        .position_source(|| Vec3::new(300.0, 10.0, 300.0))
        .build()
        .unwrap();
    manager.finish_reconciliation();
    assert_eq!(manager.current_cell(), CellCoord::new(1, 0, 1));
    assert_eq!(manager.loaded_cells().len(), 9);
    assert_eq!(manager.active_cell().0, CellCoord::new(1, 0, 1));
    assert!(!manager.loader().is_loaded(CellCoord::new(1, 0, 1)));
}
