use super::*;

fn catalog_parameter(
    name: &str,
    data_type: &str,
    dtd: &str,
    charset: Option<&str>,
) -> RoutineParameter {
    RoutineParameter {
        name: name.to_string(),
        data_type: data_type.to_string(),
        dtd_identifier: dtd.to_string(),
        character_set: charset.map(str::to_string),
        collation: charset.map(|cs| format!("{}_general_ci", cs)),
    }
}

fn spec(name: &str) -> ExtendedParameterSpec {
    ExtendedParameterSpec {
        name: name.to_string(),
        list_type: "int".to_string(),
        delimiter: ',',
        enclosure: '"',
        escape: '\\',
    }
}

fn doc(parameters: &[(&str, &str)]) -> DocComment {
    DocComment {
        short_description: "Short.".to_string(),
        long_description: "Long.".to_string(),
        parameters: parameters
            .iter()
            .map(|(name, description)| (name.to_string(), description.to_string()))
            .collect(),
    }
}

#[test]
fn test_descriptor_includes_character_set_and_collation() {
    let parameters = merge_parameters(
        vec![
            catalog_parameter("p_name", "varchar", "varchar(50)", Some("utf8mb4")),
            catalog_parameter("p_id", "int", "int(11)", None),
        ],
        &[],
    )
    .unwrap();

    assert_eq!(
        parameters[0].data_type_descriptor,
        "varchar(50) character set utf8mb4 collation utf8mb4_general_ci"
    );
    assert_eq!(parameters[1].data_type_descriptor, "int(11)");
    assert_eq!(parameters[1].character_set, None);
}

#[test]
fn test_extended_spec_is_attached_by_name() {
    let parameters = merge_parameters(
        vec![
            catalog_parameter("p_name", "varchar", "varchar(50)", None),
            catalog_parameter("p_ids", "text", "text", None),
        ],
        &[spec("p_ids")],
    )
    .unwrap();

    assert_eq!(parameters[0].extended, None);
    assert_eq!(parameters[1].extended.as_ref().unwrap().list_type, "int");
    assert_eq!(parameters[1].data_type, "text");
}

#[test]
fn test_extended_spec_for_unknown_parameter() {
    let err = merge_parameters(
        vec![catalog_parameter("p_name", "varchar", "varchar(50)", None)],
        &[spec("p_missing")],
    )
    .unwrap_err();

    match err {
        CompileErrorKind::UnknownExtendedParameter(name) => assert_eq!(name, "p_missing"),
        other => panic!("Expected UnknownExtendedParameter, got {:?}", other),
    }
}

#[test]
fn test_doc_block_follows_catalog_order() {
    let parameters = merge_parameters(
        vec![
            catalog_parameter("p_a", "int", "int(11)", None),
            catalog_parameter("p_b", "int", "int(11)", None),
        ],
        &[],
    )
    .unwrap();
    let block = build_doc_block(&doc(&[("p_b", "Second."), ("p_a", "First.")]), &parameters);

    assert_eq!(block.short_description, "Short.");
    assert_eq!(block.parameters[0].name, "p_a");
    assert_eq!(block.parameters[0].description, "First.");
    assert_eq!(block.parameters[1].description, "Second.");
    assert_eq!(block.parameters[1].data_type, "int(11)");
}

#[test]
fn test_doc_block_undocumented_parameter_has_empty_description() {
    let parameters =
        merge_parameters(vec![catalog_parameter("p_a", "int", "int(11)", None)], &[]).unwrap();
    let block = build_doc_block(&DocComment::default(), &parameters);

    assert_eq!(block.parameters[0].description, "");
}

#[test]
fn test_parameter_list_mismatches_are_warnings() {
    let parameters = merge_parameters(
        vec![
            catalog_parameter("p_a", "int", "int(11)", None),
            catalog_parameter("p_b", "int", "int(11)", None),
        ],
        &[],
    )
    .unwrap();
    let mut diagnostics = Vec::new();

    validate_parameter_lists(
        "r",
        &parameters,
        &doc(&[("p_a", "A."), ("p_c", "C.")]),
        &mut diagnostics,
    );

    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().all(|d| d.severity == crate::Severity::Warning));
    assert!(diagnostics[0].message.contains("p_b"));
    assert!(diagnostics[1].message.contains("p_c"));
}

#[test]
fn test_matching_parameter_lists_have_no_warnings() {
    let parameters =
        merge_parameters(vec![catalog_parameter("p_a", "int", "int(11)", None)], &[]).unwrap();
    let mut diagnostics = Vec::new();

    validate_parameter_lists("r", &parameters, &doc(&[("p_a", "A.")]), &mut diagnostics);

    assert!(diagnostics.is_empty());
}
