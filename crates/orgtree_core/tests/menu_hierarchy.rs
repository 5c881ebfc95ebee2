use orgtree_core::db::open_db_in_memory;
use orgtree_core::{
    Direction, MenuKind, MenuService, MenuServiceError, SqliteMemberRepository,
    SqliteMenuRepository, ValidationError, MAX_ORDER,
};
use rusqlite::Connection;
use std::sync::Arc;
use uuid::Uuid;

type Service<'conn> = MenuService<SqliteMenuRepository<'conn>, SqliteMemberRepository<'conn>>;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> Service<'_> {
    MenuService::new(
        SqliteMenuRepository::try_new(conn).unwrap(),
        SqliteMemberRepository::try_new(conn).unwrap(),
    )
}

fn orders(service: &Service<'_>, parent: Option<Uuid>) -> Vec<(String, i64)> {
    service
        .list_children(parent)
        .unwrap()
        .into_iter()
        .map(|node| (node.title, node.order))
        .collect()
}

#[test]
fn submenus_get_sequential_order_and_parent_level_plus_one() {
    let conn = setup();
    let service = service(&conn);

    let volunteers = service.add_node("Volunteers", MenuKind::Main, None).unwrap();
    let north = service
        .add_node("North Region", MenuKind::Sub, Some(volunteers.id))
        .unwrap();
    let south = service
        .add_node("South Region", MenuKind::Sub, Some(volunteers.id))
        .unwrap();

    assert_eq!(volunteers.level, 0);
    assert_eq!(volunteers.order, 1);
    assert_eq!(volunteers.parent_id, None);
    assert_eq!(north.order, 1);
    assert_eq!(south.order, 2);
    assert_eq!(north.level, 1);
    assert_eq!(south.level, 1);

    let east = service
        .add_node("East District", MenuKind::Sub, Some(north.id))
        .unwrap();
    assert_eq!(east.level, 2);
    assert_eq!(east.order, 1);
}

#[test]
fn add_node_read_back_returns_supplied_and_computed_fields() {
    let conn = setup();
    let service = service(&conn);

    let board = service.add_node("  Board   of Trustees ", MenuKind::Main, None).unwrap();
    let loaded = service.get_node(board.id).unwrap();

    assert_eq!(loaded, board);
    assert_eq!(loaded.title, "Board of Trustees");
    assert_eq!(loaded.kind, MenuKind::Main);
    assert!(loaded.created_at > 0);
}

#[test]
fn duplicate_main_title_is_rejected_case_insensitively() {
    let conn = setup();
    let service = service(&conn);

    service.add_node("Staff", MenuKind::Main, None).unwrap();
    let err = service.add_node("Staff", MenuKind::Main, None).unwrap_err();
    assert!(matches!(
        err,
        MenuServiceError::Validation(ValidationError::DuplicateSiblingTitle { parent_id: None, .. })
    ));
    let err = service.add_node("  sTaFf ", MenuKind::Main, None).unwrap_err();
    assert!(matches!(err, MenuServiceError::Validation(_)));

    let roots = service.list_children(None).unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].title, "Staff");
}

#[test]
fn same_title_is_allowed_under_different_parents() {
    let conn = setup();
    let service = service(&conn);

    let staff = service.add_node("Staff", MenuKind::Main, None).unwrap();
    let volunteers = service.add_node("Volunteers", MenuKind::Main, None).unwrap();
    service
        .add_node("Coordinators", MenuKind::Sub, Some(staff.id))
        .unwrap();
    service
        .add_node("Coordinators", MenuKind::Sub, Some(volunteers.id))
        .unwrap();
}

#[test]
fn kind_and_parent_must_agree() {
    let conn = setup();
    let service = service(&conn);
    let staff = service.add_node("Staff", MenuKind::Main, None).unwrap();

    let err = service.add_node("Orphan", MenuKind::Sub, None).unwrap_err();
    assert!(matches!(
        err,
        MenuServiceError::Validation(ValidationError::MissingParent)
    ));

    let err = service
        .add_node("Nested main", MenuKind::Main, Some(staff.id))
        .unwrap_err();
    assert!(matches!(
        err,
        MenuServiceError::Validation(ValidationError::UnexpectedParent(id)) if id == staff.id
    ));

    let missing = Uuid::new_v4();
    let err = service
        .add_node("Lost", MenuKind::Sub, Some(missing))
        .unwrap_err();
    assert!(matches!(err, MenuServiceError::ParentNotFound(id) if id == missing));

    let err = service.add_node("   ", MenuKind::Main, None).unwrap_err();
    assert!(matches!(
        err,
        MenuServiceError::Validation(ValidationError::BlankTitle)
    ));
    assert_eq!(service.list_children(None).unwrap().len(), 1);
}

#[test]
fn rename_checks_siblings_but_allows_own_title() {
    let conn = setup();
    let service = service(&conn);
    let root = service.add_node("Volunteers", MenuKind::Main, None).unwrap();
    let north = service
        .add_node("North Region", MenuKind::Sub, Some(root.id))
        .unwrap();
    service
        .add_node("South Region", MenuKind::Sub, Some(root.id))
        .unwrap();
    let east = service
        .add_node("East", MenuKind::Sub, Some(north.id))
        .unwrap();

    let err = service.rename_node(north.id, "south region").unwrap_err();
    assert!(matches!(err, MenuServiceError::Validation(_)));

    let renamed = service.rename_node(north.id, "NORTH REGION").unwrap();
    assert_eq!(renamed.title, "NORTH REGION");
    assert_eq!(renamed.order, north.order);
    assert_eq!(service.get_node(east.id).unwrap().level, 2);

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.rename_node(missing, "x").unwrap_err(),
        MenuServiceError::NodeNotFound(id) if id == missing
    ));
}

#[test]
fn move_sibling_at_boundaries_is_noop() {
    let conn = setup();
    let service = service(&conn);
    let root = service.add_node("Volunteers", MenuKind::Main, None).unwrap();
    let first = service.add_node("A", MenuKind::Sub, Some(root.id)).unwrap();
    let last = service.add_node("B", MenuKind::Sub, Some(root.id)).unwrap();
    let before = orders(&service, Some(root.id));

    assert!(!service.move_sibling(first.id, Direction::Up).unwrap());
    assert!(!service.move_sibling(last.id, Direction::Down).unwrap());
    assert!(!service.move_sibling(root.id, Direction::Up).unwrap());

    assert_eq!(orders(&service, Some(root.id)), before);
}

#[test]
fn move_sibling_swaps_with_neighbour() {
    let conn = setup();
    let service = service(&conn);
    let a = service.add_node("A", MenuKind::Main, None).unwrap();
    service.add_node("B", MenuKind::Main, None).unwrap();
    let c = service.add_node("C", MenuKind::Main, None).unwrap();

    assert!(service.move_sibling(c.id, Direction::Up).unwrap());
    assert_eq!(
        orders(&service, None),
        vec![
            ("A".to_string(), 1),
            ("C".to_string(), 2),
            ("B".to_string(), 3)
        ]
    );

    assert!(service.move_sibling(a.id, Direction::Down).unwrap());
    assert_eq!(
        orders(&service, None),
        vec![
            ("C".to_string(), 1),
            ("A".to_string(), 2),
            ("B".to_string(), 3)
        ]
    );
}

#[test]
fn reorder_node_swaps_with_rank_holder_and_keeps_ranks_unique() {
    let conn = setup();
    let service = service(&conn);
    let root = service.add_node("Root", MenuKind::Main, None).unwrap();
    let a = service.add_node("A", MenuKind::Sub, Some(root.id)).unwrap();
    service.add_node("B", MenuKind::Sub, Some(root.id)).unwrap();
    let c = service.add_node("C", MenuKind::Sub, Some(root.id)).unwrap();
    let grandchild = service.add_node("C1", MenuKind::Sub, Some(c.id)).unwrap();

    let moved = service.reorder_node(c.id, 1).unwrap();
    assert_eq!(moved.order, 1);
    assert_eq!(service.get_node(a.id).unwrap().order, 3);
    assert_eq!(service.get_node(grandchild.id).unwrap().level, 2);

    let moved = service.reorder_node(a.id, 10).unwrap();
    assert_eq!(moved.order, 10);

    let ranks: Vec<i64> = orders(&service, Some(root.id)).into_iter().map(|(_, o)| o).collect();
    assert_eq!(ranks, vec![1, 2, 10]);

    let err = service.reorder_node(a.id, 0).unwrap_err();
    assert!(matches!(
        err,
        MenuServiceError::Validation(ValidationError::InvalidOrder(0))
    ));
}

#[test]
fn added_nodes_append_after_highest_rank() {
    let conn = setup();
    let service = service(&conn);
    let a = service.add_node("A", MenuKind::Main, None).unwrap();
    service.reorder_node(a.id, 7).unwrap();

    let b = service.add_node("B", MenuKind::Main, None).unwrap();
    assert_eq!(b.order, 8);
}

#[test]
fn forest_is_cached_until_next_write() {
    let conn = setup();
    let service = service(&conn);
    let root = service.add_node("Root", MenuKind::Main, None).unwrap();

    let first = service.forest().unwrap();
    let second = service.forest().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    service.add_node("Child", MenuKind::Sub, Some(root.id)).unwrap();
    let third = service.forest().unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.len(), 2);
    assert_eq!(third.children(Some(root.id))[0].title, "Child");
}

#[test]
fn list_children_of_missing_parent_is_reported() {
    let conn = setup();
    let service = service(&conn);
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.list_children(Some(missing)).unwrap_err(),
        MenuServiceError::ParentNotFound(id) if id == missing
    ));
}

#[test]
fn ranks_are_capped_and_append_fails_cleanly_at_the_ceiling() {
    let conn = setup();
    let service = service(&conn);
    let a = service.add_node("A", MenuKind::Main, None).unwrap();

    let err = service.reorder_node(a.id, i64::MAX).unwrap_err();
    assert!(matches!(
        err,
        MenuServiceError::Validation(ValidationError::InvalidOrder(i64::MAX))
    ));

    service.reorder_node(a.id, MAX_ORDER).unwrap();
    let err = service.add_node("B", MenuKind::Main, None).unwrap_err();
    assert!(matches!(
        err,
        MenuServiceError::Validation(ValidationError::InvalidOrder(_))
    ));
    assert_eq!(orders(&service, None), vec![("A".to_string(), MAX_ORDER)]);
}
