use gape_core::config::DEFAULT_COLUMN_COUNT;
use gape_core::db::open_db_in_memory;
use gape_core::model::layout::BlockPlacement;
use gape_core::service::canvas_service::DEFAULT_CANVAS_NAME;
use gape_core::{
    BlockData, BlockId, BlockRepository, BlockType, CanvasService, CanvasServiceError,
    SqliteBlockRepository, SqliteCanvasRepository, SyncEngine, MIN_PRESENTED_COLUMNS,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> CanvasService<SqliteCanvasRepository<'_>, SqliteBlockRepository<'_>> {
    CanvasService::new(
        SqliteCanvasRepository::try_new(conn).unwrap(),
        SqliteBlockRepository::try_new(conn).unwrap(),
    )
}

fn insert(conn: &Connection, canvas_id: &str, id: &str, column_index: usize, order_index: usize) {
    SqliteBlockRepository::try_new(conn)
        .unwrap()
        .insert_block(
            canvas_id,
            &BlockPlacement {
                block_id: BlockId::from(id),
                block_type: BlockType::ExperienceL,
                data: BlockData::new(),
                column_index,
                order_index,
            },
        )
        .unwrap();
}

fn ids(columns: &[Vec<gape_core::Block>]) -> Vec<Vec<String>> {
    columns
        .iter()
        .map(|column| column.iter().map(|block| block.id().to_string()).collect())
        .collect()
}

#[test]
fn create_and_list_canvases_per_user() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let first = service.create_canvas("u1", "Resume").unwrap();
    let second = service.create_canvas("u1", "   ").unwrap();
    service.create_canvas("u2", "Other").unwrap();

    assert_eq!(second.name, DEFAULT_CANVAS_NAME);
    let listed: Vec<String> = service
        .list_canvases("u1")
        .unwrap()
        .into_iter()
        .map(|canvas| canvas.id)
        .collect();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&first.id));
    assert!(listed.contains(&second.id));

    assert!(matches!(
        service.create_canvas(" ", "Nameless owner"),
        Err(CanvasServiceError::InvalidUser)
    ));
}

#[test]
fn snapshot_groups_by_column_and_pads_to_two() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let canvas = service.create_canvas("u1", "Resume").unwrap();

    insert(&conn, &canvas.id, "late", 0, 5);
    insert(&conn, &canvas.id, "early", 0, 1);
    let snapshot = service.load_snapshot(&canvas.id).unwrap();
    assert_eq!(ids(&snapshot.columns), vec![vec!["early", "late"], vec![]]);
}

#[test]
fn snapshot_drops_gaps_between_stored_columns() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let canvas = service.create_canvas("u1", "Resume").unwrap();

    insert(&conn, &canvas.id, "a", 0, 0);
    insert(&conn, &canvas.id, "c", 4, 0);
    insert(&conn, &canvas.id, "b", 2, 0);
    let snapshot = service.load_snapshot(&canvas.id).unwrap();
    assert_eq!(ids(&snapshot.columns), vec![vec!["a"], vec!["b"], vec!["c"]]);
}

#[test]
fn open_session_pads_to_requested_columns() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let canvas = service.create_canvas("u1", "Resume").unwrap();
    insert(&conn, &canvas.id, "a", 0, 0);

    let store = service.open_session(&canvas.id, 3).unwrap();
    assert_eq!(store.layout().column_count(), 3);
    assert!(!store.is_dirty());

    let store = service.open_session(&canvas.id, 1).unwrap();
    assert_eq!(store.layout().column_count(), 2);
}

#[test]
fn two_column_canvas_redistributes_to_the_default_count() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let canvas = service.create_canvas("u1", "Resume").unwrap();
    for (id, column_index, order_index) in
        [("a", 0, 0), ("b", 0, 1), ("c", 0, 2), ("d", 1, 0), ("e", 1, 1)]
    {
        insert(&conn, &canvas.id, id, column_index, order_index);
    }

    let mut store = service.open_session(&canvas.id, MIN_PRESENTED_COLUMNS).unwrap();
    assert_eq!(store.layout().column_count(), 2);
    assert!(store.set_column_count(DEFAULT_COLUMN_COUNT));
    SyncEngine::new(SqliteBlockRepository::try_new(&conn).unwrap(), canvas.id.as_str())
        .save(&mut store)
        .unwrap();

    let snapshot = service.load_snapshot(&canvas.id).unwrap();
    assert_eq!(
        ids(&snapshot.columns),
        vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]
    );
}

#[test]
fn padded_session_already_at_the_requested_count_keeps_blocks_in_place() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let canvas = service.create_canvas("u1", "Resume").unwrap();
    insert(&conn, &canvas.id, "a", 0, 0);
    insert(&conn, &canvas.id, "b", 0, 1);

    let mut store = service.open_session(&canvas.id, DEFAULT_COLUMN_COUNT).unwrap();
    assert!(!store.set_column_count(DEFAULT_COLUMN_COUNT));
    assert_eq!(store.layout().column(0).unwrap().len(), 2);
}

#[test]
fn shared_view_is_read_only_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let canvas = service.create_canvas("u1", "Resume").unwrap();
    insert(&conn, &canvas.id, "a", 1, 0);

    let view = service.shared_view(&canvas.id).unwrap();
    assert_eq!(view.canvas(), &canvas);
    assert_eq!(view.block_count(), 1);
    assert_eq!(ids(view.columns()), vec![vec!["a"], vec![]]);

    assert!(matches!(
        service.shared_view("missing"),
        Err(CanvasServiceError::CanvasNotFound(_))
    ));
}

#[test]
fn delete_canvas_removes_it_and_its_blocks() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let canvas = service.create_canvas("u1", "Resume").unwrap();
    insert(&conn, &canvas.id, "a", 0, 0);

    service.delete_canvas(&canvas.id).unwrap();
    assert!(service.list_canvases("u1").unwrap().is_empty());
    assert!(matches!(
        service.load_snapshot(&canvas.id),
        Err(CanvasServiceError::CanvasNotFound(_))
    ));
    assert!(matches!(
        service.delete_canvas(&canvas.id),
        Err(CanvasServiceError::CanvasNotFound(_))
    ));
}
