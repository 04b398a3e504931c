use super::*;

#[test]
fn test_parse_routine_kind() {
    assert_eq!(RoutineKind::parse("PROCEDURE"), Some(RoutineKind::Procedure));
    assert_eq!(RoutineKind::parse("function"), Some(RoutineKind::Function));
    assert_eq!(RoutineKind::parse(" Function "), Some(RoutineKind::Function));
    assert_eq!(RoutineKind::parse("trigger"), None);
}

#[test]
fn test_parse_return_type_single() {
    let return_type = ReturnType::parse("int").unwrap();
    assert!(return_type.is_exactly(ScalarType::Int));
    assert_eq!(return_type.to_string(), "int");
}

#[test]
fn test_parse_return_type_union() {
    let return_type = ReturnType::parse("int|string|null").unwrap();
    assert_eq!(
        return_type.members(),
        &[ScalarType::Int, ScalarType::String, ScalarType::Null]
    );
    assert!(return_type.contains(ScalarType::Null));
    assert!(!return_type.is_exactly(ScalarType::Int));
}

#[test]
fn test_parse_return_type_deduplicates_members() {
    let return_type = ReturnType::parse("int|int|null").unwrap();
    assert_eq!(return_type.to_string(), "int|null");
}

#[test]
fn test_parse_return_type_unknown_member() {
    let err = ReturnType::parse("int|double").unwrap_err();
    assert!(err.contains("double"));
}

#[test]
fn test_parse_return_type_empty_member() {
    assert!(ReturnType::parse("int||null").is_err());
}

#[test]
fn test_designation_keyword_and_display() {
    let designation = Designation::BulkInsert {
        table_name: "tmp_users".to_string(),
        columns: vec!["id".to_string(), "name".to_string()],
    };
    assert_eq!(designation.keyword(), "bulk_insert");
    assert_eq!(designation.to_string(), "bulk_insert tmp_users id,name");

    let designation = Designation::RowsWithKey {
        columns: vec!["id".to_string()],
    };
    assert_eq!(designation.to_string(), "rows_with_key id");
    assert_eq!(Designation::Singleton0.to_string(), "singleton0");
}

#[test]
fn test_designation_function_like() {
    assert!(Designation::Function.is_function_like());
    assert!(Designation::Singleton0.is_function_like());
    assert!(Designation::Singleton1.is_function_like());
    assert!(!Designation::Procedure.is_function_like());
    assert!(!Designation::Table.is_function_like());
    assert!(!Designation::None.is_function_like());
}

#[test]
fn test_designation_serialization_is_tagged() {
    let json = serde_json::to_value(Designation::RowsWithIndex {
        columns: vec!["a".to_string(), "b".to_string()],
    })
    .unwrap();
    assert_eq!(json["type"], "rows_with_index");
    assert_eq!(json["columns"][1], "b");

    let json = serde_json::to_value(Designation::Singleton1).unwrap();
    assert_eq!(json, serde_json::json!({ "type": "singleton1" }));
}

#[test]
fn test_record_serializes_return_type_as_string() {
    let record = RoutineMetadataRecord {
        routine_name: "get_count".to_string(),
        designation: Designation::Singleton1,
        return_type: Some(ReturnType::parse("int").unwrap()),
        parameters: vec![],
        replace: BTreeMap::new(),
        timestamp: 1_700_000_000,
        bulk_insert: None,
        doc_block: DocBlock::default(),
    };

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["return"], "int");
    assert!(json.get("bulk_insert").is_none());

    let restored: RoutineMetadataRecord = serde_json::from_value(json).unwrap();
    assert_eq!(restored, record);
}

#[test]
fn test_record_rejects_invalid_return_type() {
    let json = serde_json::json!({
        "routine_name": "f",
        "designation": { "type": "function" },
        "return": "integer",
        "parameters": [],
        "replace": {},
        "timestamp": 0,
        "doc_block": { "short_description": "", "long_description": "", "parameters": [] }
    });
    assert!(serde_json::from_value::<RoutineMetadataRecord>(json).is_err());
}

#[test]
fn test_span_on_line() {
    let span = Span::on_line(3, 4, 7);
    assert_eq!(span.start, Position { line: 3, column: 4 });
    assert_eq!(span.end, Position { line: 3, column: 11 });
}
