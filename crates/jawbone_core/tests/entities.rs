use jawbone_core::db::open_db_in_memory;
use jawbone_core::{
    ConflictError, Entity, EntityService, EntityType, ErrorKind, GraphService, LifecycleService,
    NewEntity, NewEvent, NewLocation, NodeType, RecordRef, RepoError, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn every_entity_gets_an_active_shadow_node_of_its_type() {
    let mut conn = open_db_in_memory().unwrap();
    let inputs = [
        NewEntity::person("Molly", "singer"),
        NewEntity::Location(NewLocation {
            name: "Eccles Street".to_string(),
            content: "No. 7".to_string(),
            country: Some("Ireland".to_string()),
            district: None,
            town: Some("Dublin".to_string()),
        }),
        NewEntity::Event(NewEvent {
            name: "Funeral".to_string(),
            content: String::new(),
            date: Some(-2_064_787_200_000),
        }),
        NewEntity::tag("home"),
    ];

    for input in &inputs {
        let entity = EntityService::new(&mut conn).create_entity(input).unwrap();
        assert_eq!(entity.entity_type(), input.entity_type());

        let node = GraphService::new(&mut conn).get_node(entity.node_id()).unwrap();
        assert_eq!(node.node_type, input.entity_type().node_type());
        assert!(node.is_active());
    }

    assert_eq!(count(&conn, "nodes"), 4);
}

#[test]
fn names_are_stored_trimmed_with_attributes() {
    let mut conn = open_db_in_memory().unwrap();
    let created = EntityService::new(&mut conn)
        .create_entity(&NewEntity::Location(NewLocation {
            name: "  Howth Head ".to_string(),
            content: "rhododendrons".to_string(),
            country: Some("Ireland".to_string()),
            ..NewLocation::default()
        }))
        .unwrap();

    match created {
        Entity::Location(location) => {
            assert_eq!(location.name, "Howth Head");
            assert_eq!(location.country.as_deref(), Some("Ireland"));
            assert_eq!(location.town, None);
            assert!(!location.deleted);
        }
        other => panic!("unexpected entity: {other:?}"),
    }
}

#[test]
fn blank_names_are_rejected_without_creating_a_node() {
    let mut conn = open_db_in_memory().unwrap();

    let err = EntityService::new(&mut conn)
        .create_entity(&NewEntity::person("   ", "nobody"))
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::BlankField {
            record: "person",
            field: "name"
        })
    ));
    assert_eq!(count(&conn, "nodes"), 0);
}

#[test]
fn tag_names_are_unique_ignoring_case() {
    let mut conn = open_db_in_memory().unwrap();
    EntityService::new(&mut conn)
        .create_entity(&NewEntity::tag("foo"))
        .unwrap();

    let err = EntityService::new(&mut conn)
        .create_entity(&NewEntity::tag("Foo"))
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Conflict(ConflictError::DuplicateTagName(ref name)) if name == "Foo"
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(count(&conn, "tags"), 1);
    assert_eq!(count(&conn, "nodes"), 1);
}

#[test]
fn deleted_tags_free_their_name_until_restored() {
    let mut conn = open_db_in_memory().unwrap();
    let old = EntityService::new(&mut conn)
        .create_entity(&NewEntity::tag("sea"))
        .unwrap();
    LifecycleService::new(&mut conn)
        .soft_delete_entity(&old)
        .unwrap();

    EntityService::new(&mut conn)
        .create_entity(&NewEntity::tag("SEA"))
        .unwrap();

    let err = LifecycleService::new(&mut conn)
        .restore_entity(&old)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let node = GraphService::new(&mut conn).get_node(old.node_id()).unwrap();
    assert!(node.deleted);
}

#[test]
fn get_entities_fails_fast_and_node_lookup_skips_unknown_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = EntityService::new(&mut conn);
    let stephen = service
        .create_entity(&NewEntity::person("Stephen", "teacher"))
        .unwrap();
    let missing = Uuid::new_v4();

    let err = service
        .get_entities(EntityType::Person, &[stephen.id(), missing])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound(RecordRef::Entity {
            entity_type: EntityType::Person,
            id,
        }) if id == missing
    ));

    let err = service
        .get_entities(EntityType::Location, &[stephen.id()])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let found = service
        .get_entities_by_node_ids(EntityType::Person, &[stephen.node_id(), missing])
        .unwrap();
    assert_eq!(found, vec![stephen.clone()]);
    assert!(service
        .get_entities_by_node_ids(EntityType::Person, &[])
        .unwrap()
        .is_empty());
    assert_eq!(service.get_entity(EntityType::Person, stephen.id()).unwrap(), stephen);
}

#[test]
fn resolve_entity_for_node_dispatches_on_node_type() {
    let mut conn = open_db_in_memory().unwrap();
    let event = EntityService::new(&mut conn)
        .create_entity(&NewEntity::event("Races", "Gold Cup"))
        .unwrap();
    let note_node = GraphService::new(&mut conn)
        .create_node(NodeType::Note)
        .unwrap();
    let bare_person = GraphService::new(&mut conn)
        .create_node(NodeType::Person)
        .unwrap();

    let service = EntityService::new(&mut conn);
    assert_eq!(service.resolve_entity_for_node(event.node_id()).unwrap(), event);

    let err = service.resolve_entity_for_node(note_node.id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::NoEntityVariant(NodeType::Note))
    ));

    let err = service.resolve_entity_for_node(bare_person.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(RecordRef::EntityForNode(_))));

    let missing = Uuid::new_v4();
    let err = service.resolve_entity_for_node(missing).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(RecordRef::Node(id)) if id == missing));
}

#[test]
fn entities_serialize_with_type_discriminator() {
    let mut conn = open_db_in_memory().unwrap();
    let tag = EntityService::new(&mut conn)
        .create_entity(&NewEntity::tag("river"))
        .unwrap();

    let json = serde_json::to_value(&tag).unwrap();
    assert_eq!(json["type"], "tag");
    assert_eq!(json["name"], "river");
    assert_eq!(json["node_id"], tag.node_id().to_string());
    assert_eq!(json["deleted"], false);

    let decoded: Entity = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, tag);
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}
