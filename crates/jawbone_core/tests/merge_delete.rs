use jawbone_core::db::open_db_in_memory;
use jawbone_core::{
    EntityService, EntityType, ErrorKind, GraphService, LifecycleService, LinkService, NewEntity,
    NewNote, NodeType, NoteService, PageService, RecordRef, RepoError, ValidationError,
};
use rusqlite::Connection;

#[test]
fn merging_people_into_new_person_supersedes_both_nodes() {
    let mut conn = open_db_in_memory().unwrap();
    let mut entities = EntityService::new(&mut conn);
    let john = entities.create_entity(&NewEntity::person("John", "")).unwrap();
    let jane = entities.create_entity(&NewEntity::person("Jane", "")).unwrap();

    let merged = LifecycleService::new(&mut conn)
        .merge_entities_into_new(&[john.clone(), jane.clone()], &NewEntity::person("Merged", ""))
        .unwrap();

    assert_eq!(merged.entity_type(), EntityType::Person);
    assert_eq!(merged.name(), "Merged");
    assert_ne!(merged.node_id(), john.node_id());
    assert_ne!(merged.node_id(), jane.node_id());

    let graph = GraphService::new(&mut conn);
    assert_eq!(graph.get_node(john.node_id()).unwrap().merged, Some(merged.node_id()));
    assert_eq!(graph.get_node(jane.node_id()).unwrap().merged, Some(merged.node_id()));
    let active = graph
        .list_active_nodes()
        .unwrap()
        .into_iter()
        .map(|node| node.id)
        .collect::<Vec<_>>();
    assert_eq!(active, vec![merged.node_id()]);
}

#[test]
fn merge_target_type_may_differ_from_sources() {
    let mut conn = open_db_in_memory().unwrap();
    let mut entities = EntityService::new(&mut conn);
    let a = entities.create_entity(&NewEntity::tag("war")).unwrap();
    let b = entities.create_entity(&NewEntity::tag("battle")).unwrap();

    let event = LifecycleService::new(&mut conn)
        .merge_entities_into_new(&[a, b], &NewEntity::event("Siege", ""))
        .unwrap();

    assert_eq!(event.entity_type(), EntityType::Event);
    let node = GraphService::new(&mut conn).get_node(event.node_id()).unwrap();
    assert_eq!(node.node_type, NodeType::Event);
}

#[test]
fn merging_mixed_entity_types_creates_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut entities = EntityService::new(&mut conn);
    let person = entities.create_entity(&NewEntity::person("Bloom", "")).unwrap();
    let place = entities.create_entity(&NewEntity::location("Ormond", "")).unwrap();

    let err = LifecycleService::new(&mut conn)
        .merge_entities_into_new(&[person, place], &NewEntity::person("Both", ""))
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MixedNodeTypes { .. })
    ));
    assert_eq!(count(&conn, "nodes"), 2);
    assert_eq!(count(&conn, "people"), 1);

    let err = LifecycleService::new(&mut conn)
        .merge_entities_into_new(&[], &NewEntity::person("Nobody", ""))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::EmptyMerge)));
    assert_eq!(count(&conn, "nodes"), 2);
}

#[test]
fn soft_delete_entity_flags_row_and_node_together() {
    let mut conn = open_db_in_memory().unwrap();
    let place = EntityService::new(&mut conn)
        .create_entity(&NewEntity::location("Sandymount", "strand"))
        .unwrap();

    let mut lifecycle = LifecycleService::new(&mut conn);
    let deleted = lifecycle.soft_delete_entity(&place).unwrap();
    let again = lifecycle.soft_delete_entity(&place).unwrap();
    assert!(deleted.is_deleted());
    assert!(again.is_deleted());

    assert!(GraphService::new(&mut conn).get_node(place.node_id()).unwrap().deleted);

    let restored = LifecycleService::new(&mut conn)
        .restore_entity(&place)
        .unwrap();
    assert!(!restored.is_deleted());
    assert!(!GraphService::new(&mut conn).get_node(place.node_id()).unwrap().deleted);
}

#[test]
fn hard_delete_entity_removes_row_node_and_relationships() {
    let mut conn = open_db_in_memory().unwrap();
    let mut entities = EntityService::new(&mut conn);
    let location = entities.create_entity(&NewEntity::location("Martello", "tower")).unwrap();
    let visitor = entities.create_entity(&NewEntity::person("Buck", "")).unwrap();
    LinkService::new(&mut conn)
        .link_entities(&visitor, &location, "lives in", "home of")
        .unwrap();

    PageService::new(&mut conn).upsert_page(1, "Stately, plump").unwrap();
    let mut note = NewNote::new(1, "Stately");
    note.annotates = Some(location.node_id());
    let note = NoteService::new(&mut conn).create_note(&note).unwrap();

    LifecycleService::new(&mut conn)
        .hard_delete_entity(&location)
        .unwrap();

    let err = GraphService::new(&mut conn)
        .get_node(location.node_id())
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(RecordRef::Node(id)) if id == location.node_id()));

    let err = EntityService::new(&mut conn)
        .get_entities(EntityType::Location, &[location.id()])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(count(&conn, "relationships"), 0);
    let detached = NoteService::new(&mut conn).get_note(note.id).unwrap();
    assert_eq!(detached.annotates, None);
    assert!(GraphService::new(&mut conn)
        .get_node(visitor.node_id())
        .unwrap()
        .is_active());
}

#[test]
fn hard_delete_of_already_deleted_entity_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let tag = EntityService::new(&mut conn)
        .create_entity(&NewEntity::tag("once"))
        .unwrap();
    let mut lifecycle = LifecycleService::new(&mut conn);
    lifecycle.hard_delete_entity(&tag).unwrap();

    let err = lifecycle.hard_delete_entity(&tag).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn hard_delete_of_merge_target_is_refused() {
    let mut conn = open_db_in_memory().unwrap();
    let mut entities = EntityService::new(&mut conn);
    let a = entities.create_entity(&NewEntity::person("Simon", "")).unwrap();
    let merged = LifecycleService::new(&mut conn)
        .merge_entities_into_new(&[a], &NewEntity::person("Si", ""))
        .unwrap();

    let err = LifecycleService::new(&mut conn)
        .hard_delete_entity(&merged)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(count(&conn, "people"), 2);
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}
