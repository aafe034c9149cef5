//! End-to-end editing scenarios against a full session

use facet_editor::{
    AttributeConfig, AttributeDecl, AttributePath, ContentDefinition, ContentService, DragReorder,
    DragRole, EditorSession, Entity, Mutation, RecordingBinding, Schema, SerializedEntity,
    ServiceError, SlotEvent, TypeDef, ValidationReport, Value,
};

fn schema() -> Schema {
    Schema::new()
        .with_type(
            TypeDef::new("article")
                .with_attribute("a", AttributeDecl::simple(1, Some(3)))
                .with_attribute("a:b", AttributeDecl::simple(0, Some(3)))
                .with_attribute("caption", AttributeDecl::simple(0, Some(1)))
                .with_attribute("tags", AttributeDecl::simple(0, None))
                .with_attribute("items", AttributeDecl::complex("item", 0, None))
                .with_attribute("lead", AttributeDecl::complex("item", 0, Some(1))),
        )
        .with_type(TypeDef::new("item").with_attribute("label", AttributeDecl::simple(0, Some(1))))
}

fn definition(entity: Entity) -> ContentDefinition {
    ContentDefinition {
        entity,
        schema: schema(),
        config: AttributeConfig::default(),
        locale: "en".to_string(),
    }
}

fn open(entity: Entity) -> (EditorSession, RecordingBinding) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let binding = RecordingBinding::new();
    let session = EditorSession::open(definition(entity), Box::new(binding.clone())).unwrap();
    binding.take(); // discard the initial render
    (session, binding)
}

fn texts(entity: &Entity, name: &str) -> Vec<String> {
    entity
        .values(name)
        .unwrap_or_default()
        .iter()
        .map(|v| v.as_text().unwrap_or("<entity>").to_string())
        .collect()
}

struct MockService {
    report: ValidationReport,
    fail: bool,
    validate_calls: usize,
}

impl MockService {
    fn returning(report: ValidationReport) -> Self {
        Self {
            report,
            fail: false,
            validate_calls: 0,
        }
    }
}

impl ContentService for MockService {
    fn load(&mut self, entity_id: &str) -> Result<ContentDefinition, ServiceError> {
        Err(ServiceError::NotFound(entity_id.to_string()))
    }

    fn validate(&mut self, _entities: &[SerializedEntity]) -> Result<ValidationReport, ServiceError> {
        self.validate_calls += 1;
        if self.fail {
            Err(ServiceError::Transport("offline".to_string()))
        } else {
            Ok(self.report.clone())
        }
    }

    fn save(&mut self, _entities: &[SerializedEntity]) -> Result<ValidationReport, ServiceError> {
        if self.fail {
            Err(ServiceError::Transport("offline".to_string()))
        } else {
            Ok(self.report.clone())
        }
    }
}

#[test]
fn test_add_value_appends_after_last_reference() {
    let entity = Entity::new("e1", "article").with_value("a", Value::Text("x".into()));
    let (mut session, binding) = open(entity);

    let path = AttributePath::decode("a");
    let before = session.controls(&path).unwrap();
    assert!(before.may_add); // 1 < max 3
    assert!(!before.may_remove); // 1 == min 1

    session.apply(Mutation::AddValue { path: path.clone() }, 0).unwrap();

    assert_eq!(texts(session.entity(), "a"), vec!["x", ""]);
    let after = session.controls(&path).unwrap();
    assert!(after.may_add); // 2 < max 3
    assert!(after.may_remove); // 2 > min 1

    assert_eq!(
        binding.events(),
        vec![SlotEvent::Inserted {
            attribute: path,
            index: 1,
            reuse: false,
        }]
    );
}

#[test]
fn test_add_value_inserts_after_middle_reference() {
    let entity = Entity::new("e1", "article")
        .with_value("tags", Value::Text("a".into()))
        .with_value("tags", Value::Text("b".into()))
        .with_value("tags", Value::Text("c".into()));
    let (mut session, _binding) = open(entity);

    session
        .apply(
            Mutation::AddValue {
                path: AttributePath::decode("tags[1]"),
            },
            0,
        )
        .unwrap();
    assert_eq!(texts(session.entity(), "tags"), vec!["a", "b", "", "c"]);
}

#[test]
fn test_add_on_absent_attribute_reuses_placeholder_slot() {
    let (mut session, binding) = open(Entity::new("e1", "article"));

    let path = AttributePath::decode("a:b");
    session.apply(Mutation::AddValue { path: path.clone() }, 0).unwrap();

    assert_eq!(texts(session.entity(), "a:b"), vec![""]);
    assert_eq!(
        binding.events(),
        vec![SlotEvent::Inserted {
            attribute: path,
            index: 0,
            reuse: true,
        }]
    );
}

#[test]
fn test_drag_reorder_scenario() {
    // [A, B, C]: drag index 0, drop at placeholder 2, decremented to 1
    let entity = Entity::new("e1", "article")
        .with_value("tags", Value::Text("A".into()))
        .with_value("tags", Value::Text("B".into()))
        .with_value("tags", Value::Text("C".into()));
    let (mut session, binding) = open(entity);

    let tags = AttributePath::decode("tags");
    let mut drag = DragReorder::new();
    drag.start(&DragRole::ValueRow {
        attribute: tags.clone(),
        index: 0,
    });
    let mv = drag
        .drop_on(&DragRole::DropTarget {
            attribute: tags.clone(),
            position: 2,
        })
        .unwrap();
    session.apply_reorder(mv, 0).unwrap();

    assert_eq!(texts(session.entity(), "tags"), vec!["B", "A", "C"]);
    assert_eq!(
        binding.events(),
        vec![SlotEvent::Moved {
            attribute: tags,
            from: 0,
            to: 1,
        }]
    );
}

#[test]
fn test_cancelled_drag_changes_nothing() {
    let entity = Entity::new("e1", "article")
        .with_value("tags", Value::Text("A".into()))
        .with_value("tags", Value::Text("B".into()));
    let (session, binding) = open(entity);

    let mut drag = DragReorder::new();
    drag.start(&DragRole::ValueRow {
        attribute: AttributePath::decode("tags"),
        index: 0,
    });
    drag.cancel();

    assert_eq!(texts(session.entity(), "tags"), vec!["A", "B"]);
    assert!(binding.events().is_empty());
}

#[test]
fn test_remove_sole_value_of_single_valued_attribute() {
    let entity = Entity::new("e1", "article").with_value("caption", Value::Text("cap".into()));
    let (mut session, binding) = open(entity);

    let path = AttributePath::decode("caption");
    session
        .apply(Mutation::RemoveValue { path: path.clone() }, 0)
        .unwrap();

    // absent entirely, not present with zero values
    assert!(!session.entity().has_attribute("caption"));
    assert_eq!(binding.events(), vec![SlotEvent::Cleared { attribute: path }]);
}

#[test]
fn test_remove_one_of_many_removes_slot() {
    let entity = Entity::new("e1", "article")
        .with_value("tags", Value::Text("A".into()))
        .with_value("tags", Value::Text("B".into()));
    let (mut session, binding) = open(entity);

    session
        .apply(
            Mutation::RemoveValue {
                path: AttributePath::decode("tags[0]"),
            },
            0,
        )
        .unwrap();

    assert_eq!(texts(session.entity(), "tags"), vec!["B"]);
    assert_eq!(
        binding.events(),
        vec![SlotEvent::Removed {
            attribute: AttributePath::decode("tags"),
            index: 0,
        }]
    );
}

#[test]
fn test_undo_redo_restore_exact_snapshots() -> anyhow::Result<()> {
    let entity = Entity::new("e1", "article").with_value("a", Value::Text("x".into()));
    let before = entity.to_snapshot()?;
    let (mut session, _binding) = open(entity);

    session.apply(
        Mutation::ChangeValue {
            path: AttributePath::decode("a"),
            text: "y".to_string(),
        },
        0,
    )?;
    let after = session.entity().to_snapshot()?;
    assert_ne!(before, after);

    assert!(session.undo(0)?);
    assert_eq!(session.entity().to_snapshot()?, before);

    assert!(session.redo(0)?);
    assert_eq!(session.entity().to_snapshot()?, after);
    Ok(())
}

#[test]
fn test_undo_of_value_change_is_targeted() {
    let entity = Entity::new("e1", "article").with_value("a", Value::Text("x".into()));
    let (mut session, binding) = open(entity);

    session
        .apply(
            Mutation::ChangeValue {
                path: AttributePath::decode("a"),
                text: "y".to_string(),
            },
            0,
        )
        .unwrap();
    binding.take();

    session.undo(0).unwrap();
    assert_eq!(
        binding.events(),
        vec![SlotEvent::Changed {
            attribute: AttributePath::decode("a"),
            index: 0,
            text: "x".to_string(),
        }]
    );
}

#[test]
fn test_undo_of_structural_change_rerenders() {
    let entity = Entity::new("e1", "article").with_value("a", Value::Text("x".into()));
    let (mut session, binding) = open(entity);

    session
        .apply(
            Mutation::AddValue {
                path: AttributePath::decode("a"),
            },
            0,
        )
        .unwrap();
    binding.take();

    session.undo(0).unwrap();
    assert_eq!(binding.events(), vec![SlotEvent::RenderAll]);
    assert_eq!(texts(session.entity(), "a"), vec!["x"]);
}

#[test]
fn test_noop_change_does_not_pollute_history() {
    let entity = Entity::new("e1", "article").with_value("a", Value::Text("x".into()));
    let (mut session, _binding) = open(entity);

    session
        .apply(
            Mutation::ChangeValue {
                path: AttributePath::decode("a"),
                text: "x".to_string(),
            },
            0,
        )
        .unwrap();
    assert!(!session.can_undo());
}

#[test]
fn test_validation_debounce_and_routing() {
    let entity = Entity::new("e1", "article")
        .with_value("a:b", Value::Text("x".into()))
        .with_value("a:b", Value::Text(String::new()));
    let (mut session, binding) = open(entity);

    session
        .apply(
            Mutation::ChangeValue {
                path: AttributePath::decode("a:b[1]"),
                text: String::new(),
            },
            0,
        )
        .unwrap();
    binding.take();

    // not due before the debounce delay elapses
    assert!(session.tick(100).unwrap().is_none());

    let request = session.tick(300).unwrap().expect("validation due");
    assert_eq!(request.entities[0].id, "e1");

    // single flight: nothing further until the response lands
    assert!(session.tick(400).unwrap().is_none());

    let mut report = ValidationReport::new();
    report.add_issue("e1", "a:b[1]", "required");
    session.apply_validation(&report);

    assert_eq!(
        binding.events(),
        vec![
            SlotEvent::ErrorsCleared,
            SlotEvent::Error {
                attribute: AttributePath::decode("a:b"),
                index: 1,
                message: "required".to_string(),
            }
        ]
    );
}

#[test]
fn test_run_validation_convenience_and_failure() {
    let entity = Entity::new("e1", "article").with_value("a", Value::Text("x".into()));
    let (mut session, _binding) = open(entity);

    let mut service = MockService::returning(ValidationReport::new());
    session
        .apply(
            Mutation::ChangeValue {
                path: AttributePath::decode("a"),
                text: "y".to_string(),
            },
            0,
        )
        .unwrap();

    assert!(!session.run_validation(&mut service, 100).unwrap());
    assert!(session.run_validation(&mut service, 300).unwrap());
    assert_eq!(service.validate_calls, 1);

    // transport failure is surfaced, and the session recovers
    session
        .apply(
            Mutation::ChangeValue {
                path: AttributePath::decode("a"),
                text: "z".to_string(),
            },
            1000,
        )
        .unwrap();
    service.fail = true;
    assert!(session.run_validation(&mut service, 1300).is_err());
    service.fail = false;
    session
        .apply(
            Mutation::ChangeValue {
                path: AttributePath::decode("a"),
                text: "w".to_string(),
            },
            2000,
        )
        .unwrap();
    assert!(session.run_validation(&mut service, 2300).unwrap());
}

#[test]
fn test_save_routes_returned_report() {
    let entity = Entity::new("e1", "article").with_value("a", Value::Text(String::new()));
    let (mut session, binding) = open(entity);

    let mut report = ValidationReport::new();
    report.add_issue("e1", "a", "must not be empty");
    let mut service = MockService::returning(report.clone());

    let returned = session.save(&mut service).unwrap();
    assert_eq!(returned, report);
    assert_eq!(
        binding.events(),
        vec![
            SlotEvent::ErrorsCleared,
            SlotEvent::Error {
                attribute: AttributePath::decode("a"),
                index: 0,
                message: "must not be empty".to_string(),
            }
        ]
    );
}

#[test]
fn test_slot_count_mirrors_value_count_through_mutations() {
    let item = |id: &str, label: &str| {
        Entity::new(id, "item").with_value("label", Value::Text(label.into()))
    };
    let entity = Entity::new("e1", "article")
        .with_value("items", Value::Entity(item("i1", "one")))
        .with_value("items", Value::Entity(item("i2", "two")));
    let (mut session, _binding) = open(entity);

    let items = AttributePath::decode("items");
    let slot_count = |session: &EditorSession| {
        session
            .handler(&items)
            .unwrap()
            .children()
            .unwrap()
            .len()
    };
    assert_eq!(slot_count(&session), 2);

    session
        .apply(Mutation::AddValue { path: AttributePath::decode("items[1]") }, 0)
        .unwrap();
    assert_eq!(session.entity().value_count("items"), 3);
    assert_eq!(slot_count(&session), 3);

    session
        .apply(
            Mutation::Move {
                path: items.clone(),
                from: 0,
                to: 2,
            },
            0,
        )
        .unwrap();
    assert_eq!(slot_count(&session), 3);

    session
        .apply(
            Mutation::RemoveValue {
                path: AttributePath::decode("items[1]"),
            },
            0,
        )
        .unwrap();
    assert_eq!(session.entity().value_count("items"), 2);
    assert_eq!(slot_count(&session), 2);
}
