use jawbone_core::db::open_db_in_memory;
use jawbone_core::{
    ConflictError, EntityService, ErrorKind, GraphService, NewEntity, NodeType, RecordRef,
    RepoError, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn created_nodes_start_active() {
    let mut conn = open_db_in_memory().unwrap();
    let mut graph = GraphService::new(&mut conn);

    let node = graph.create_node(NodeType::Event).unwrap();
    let loaded = graph.get_node(node.id).unwrap();

    assert_eq!(loaded, node);
    assert_eq!(loaded.node_type, NodeType::Event);
    assert!(!loaded.deleted);
    assert_eq!(loaded.merged, None);
    assert!(loaded.is_active());
}

#[test]
fn unknown_type_tags_are_validation_errors() {
    let err = "planet".parse::<NodeType>().unwrap_err();
    assert_eq!(err, ValidationError::UnknownNodeType("planet".to_string()));
    assert_eq!(RepoError::from(err).kind(), ErrorKind::Validation);
    assert_eq!(" Person ".parse::<NodeType>(), Ok(NodeType::Person));
}

#[test]
fn get_nodes_fails_fast_on_first_missing_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut graph = GraphService::new(&mut conn);
    let first = graph.create_node(NodeType::Tag).unwrap();
    let missing = Uuid::new_v4();

    let err = graph.get_nodes(&[first.id, missing]).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(RecordRef::Node(id)) if id == missing));

    let found = graph.get_nodes(&[first.id]).unwrap();
    assert_eq!(found, vec![first]);
}

#[test]
fn soft_delete_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let mut graph = GraphService::new(&mut conn);
    let node = graph.create_node(NodeType::Location).unwrap();

    let first = graph.soft_delete_node(node.id).unwrap();
    let second = graph.soft_delete_node(node.id).unwrap();

    assert!(first.deleted);
    assert!(second.deleted);
    assert!(graph.list_active_nodes().unwrap().is_empty());
    assert!(graph.get_node(node.id).unwrap().deleted);
}

#[test]
fn soft_delete_and_restore_move_entity_row_with_node() {
    let mut conn = open_db_in_memory().unwrap();
    let person = EntityService::new(&mut conn)
        .create_entity(&NewEntity::person("Leopold", "canvasser"))
        .unwrap();

    GraphService::new(&mut conn)
        .soft_delete_node(person.node_id())
        .unwrap();
    let deleted = EntityService::new(&mut conn)
        .resolve_entity_for_node(person.node_id())
        .unwrap();
    assert!(deleted.is_deleted());

    let restored = GraphService::new(&mut conn)
        .restore_node(person.node_id())
        .unwrap();
    assert!(!restored.deleted);
    let entity = EntityService::new(&mut conn)
        .resolve_entity_for_node(person.node_id())
        .unwrap();
    assert!(!entity.is_deleted());
}

#[test]
fn soft_delete_of_missing_node_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let missing = Uuid::new_v4();

    let err = GraphService::new(&mut conn)
        .soft_delete_node(missing)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn hard_delete_refuses_referenced_nodes() {
    let mut conn = open_db_in_memory().unwrap();
    let tag = EntityService::new(&mut conn)
        .create_entity(&NewEntity::tag("sea"))
        .unwrap();

    let err = GraphService::new(&mut conn)
        .hard_delete_node(tag.node_id())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Conflict(ConflictError::NodeInUse {
            referenced_by: "tags",
            ..
        })
    ));

    let mut graph = GraphService::new(&mut conn);
    let a = graph.create_node(NodeType::Note).unwrap();
    let b = graph.create_node(NodeType::Note).unwrap();
    graph.create_relationship(a.id, b.id, "cites", "cited by").unwrap();
    let err = graph.hard_delete_node(a.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn hard_delete_removes_unreferenced_node() {
    let mut conn = open_db_in_memory().unwrap();
    let mut graph = GraphService::new(&mut conn);
    let node = graph.create_node(NodeType::Note).unwrap();

    graph.hard_delete_node(node.id).unwrap();

    let err = graph.get_node(node.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(RecordRef::Node(id)) if id == node.id));
}

#[test]
fn merge_nodes_points_sources_at_target() {
    let mut conn = open_db_in_memory().unwrap();
    let mut graph = GraphService::new(&mut conn);
    let target = graph.create_node(NodeType::Event).unwrap();
    let a = graph.create_node(NodeType::Person).unwrap();
    let b = graph.create_node(NodeType::Person).unwrap();

    let merged = graph.merge_nodes(target.id, &[a.id, b.id]).unwrap();

    assert_eq!(merged.len(), 2);
    assert!(merged.iter().all(|node| node.merged == Some(target.id)));
    let active = graph.list_active_nodes().unwrap();
    assert_eq!(active, vec![target]);
}

#[test]
fn merge_nodes_rejects_invalid_source_sets() {
    let mut conn = open_db_in_memory().unwrap();
    let mut graph = GraphService::new(&mut conn);
    let target = graph.create_node(NodeType::Tag).unwrap();
    let person = graph.create_node(NodeType::Person).unwrap();
    let event = graph.create_node(NodeType::Event).unwrap();

    let err = graph.merge_nodes(target.id, &[]).unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::EmptyMerge)));

    let err = graph.merge_nodes(target.id, &[target.id]).unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::MergeIntoSelf(_))));

    let err = graph
        .merge_nodes(target.id, &[person.id, person.id])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::DuplicateMergeSource(_))
    ));

    let err = graph
        .merge_nodes(target.id, &[person.id, event.id])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MixedNodeTypes {
            expected: NodeType::Person,
            found: NodeType::Event,
        })
    ));

    graph.merge_nodes(target.id, &[person.id]).unwrap();
    let other = graph.create_node(NodeType::Tag).unwrap();
    let err = graph.merge_nodes(other.id, &[person.id]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::AlreadyMerged { merged_into, .. })
            if merged_into == target.id
    ));

    assert!(graph.get_node(event.id).unwrap().merged.is_none());
}

#[test]
fn merge_nodes_requires_an_active_target() {
    let mut conn = open_db_in_memory().unwrap();
    let mut graph = GraphService::new(&mut conn);
    let a = graph.create_node(NodeType::Person).unwrap();
    let b = graph.create_node(NodeType::Person).unwrap();

    graph.merge_nodes(b.id, &[a.id]).unwrap();
    let err = graph.merge_nodes(a.id, &[b.id]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::AlreadyMerged { node_id, merged_into })
            if node_id == a.id && merged_into == b.id
    ));
    assert!(graph.get_node(b.id).unwrap().is_active());

    let deleted = graph.create_node(NodeType::Event).unwrap();
    let source = graph.create_node(NodeType::Event).unwrap();
    graph.soft_delete_node(deleted.id).unwrap();
    let err = graph.merge_nodes(deleted.id, &[source.id]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MergeIntoInactive(id)) if id == deleted.id
    ));
    assert_eq!(graph.get_node(source.id).unwrap().merged, None);

    graph.restore_node(deleted.id).unwrap();
    graph.merge_nodes(deleted.id, &[source.id]).unwrap();
    assert_eq!(graph.get_node(source.id).unwrap().merged, Some(deleted.id));
}

#[test]
fn merge_into_new_node_returns_new_node_first() {
    let mut conn = open_db_in_memory().unwrap();
    let mut graph = GraphService::new(&mut conn);
    let a = graph.create_node(NodeType::Location).unwrap();
    let b = graph.create_node(NodeType::Location).unwrap();

    let nodes = graph.merge_into_new_node(&[a.id, b.id]).unwrap();

    assert_eq!(nodes.len(), 3);
    let created = &nodes[0];
    assert_eq!(created.node_type, NodeType::Location);
    assert!(created.is_active());
    assert_eq!(nodes[1].id, a.id);
    assert_eq!(nodes[2].id, b.id);
    assert!(nodes[1..].iter().all(|node| node.merged == Some(created.id)));
}

#[test]
fn mixed_type_merge_creates_no_node() {
    let mut conn = open_db_in_memory().unwrap();
    let (a, b) = {
        let mut graph = GraphService::new(&mut conn);
        (
            graph.create_node(NodeType::Person).unwrap(),
            graph.create_node(NodeType::Tag).unwrap(),
        )
    };
    let before = node_count(&conn);

    let err = GraphService::new(&mut conn)
        .merge_into_new_node(&[a.id, b.id])
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(node_count(&conn), before);
    let graph = GraphService::new(&mut conn);
    assert!(graph.get_node(a.id).unwrap().merged.is_none());
    assert!(graph.get_node(b.id).unwrap().merged.is_none());
}

fn node_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM nodes;", [], |row| row.get(0))
        .unwrap()
}
