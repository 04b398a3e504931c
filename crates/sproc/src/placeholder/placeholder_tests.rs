use super::*;

fn source(text: &str) -> SourceFile {
    SourceFile::from_text("/tmp/routine.psql", text, 0)
}

#[test]
fn test_lookup_is_case_insensitive() {
    let pairs: ReplacePairs = [("@FOO@", "1")].into_iter().collect();
    let expanded = expand_placeholders(&source("select @foo@;"), &pairs).unwrap();

    assert_eq!(expanded.get("@foo@"), Some(&"1".to_string()));
}

#[test]
fn test_table_keys_are_uppercased() {
    let pairs: ReplacePairs = [("@max_len@", "80")].into_iter().collect();
    assert_eq!(pairs.get("@MAX_LEN@"), Some("80"));
    assert_eq!(pairs.get("@Max_Len@"), Some("80"));
}

#[test]
fn test_unknown_placeholders_are_aggregated() {
    let pairs: ReplacePairs = [("@A@", "1")].into_iter().collect();
    let err = expand_placeholders(&source("select @A@;\nselect @B@;\nselect @C@, @B@;"), &pairs)
        .unwrap_err();

    match err {
        CompileErrorKind::UnknownPlaceholder {
            placeholders,
            occurrences,
        } => {
            assert_eq!(placeholders, vec!["@B@".to_string(), "@C@".to_string()]);
            assert_eq!(occurrences.len(), 3);
            assert_eq!(occurrences[0].span.start.line, 1);
            assert_eq!(occurrences[0].span.start.column, 7);
        }
        other => panic!("Expected UnknownPlaceholder, got {:?}", other),
    }
}

#[test]
fn test_only_used_placeholders_are_kept() {
    let pairs: ReplacePairs = [("@A@", "1"), ("@UNUSED@", "2")].into_iter().collect();
    let expanded = expand_placeholders(&source("select @A@;"), &pairs).unwrap();

    assert_eq!(expanded.len(), 1);
    assert!(!expanded.contains_key("@UNUSED@"));
}

#[test]
fn test_expanded_map_is_sorted_by_token() {
    let pairs: ReplacePairs = [("@B@", "2"), ("@A@", "1"), ("@C@", "3")].into_iter().collect();
    let expanded = expand_placeholders(&source("@C@ @A@ @B@"), &pairs).unwrap();

    let tokens: Vec<&String> = expanded.keys().collect();
    assert_eq!(tokens, vec!["@A@", "@B@", "@C@"]);
}

#[test]
fn test_type_placeholders() {
    let pairs: ReplacePairs = [("@USERS.NAME%TYPE@", "varchar(50) character set utf8mb4")]
        .into_iter()
        .collect();
    let expanded =
        expand_placeholders(&source("in p_name @users.name%type@"), &pairs).unwrap();

    assert_eq!(
        expanded.get("@users.name%type@").map(String::as_str),
        Some("varchar(50) character set utf8mb4")
    );
}

#[test]
fn test_email_like_text_is_not_a_placeholder() {
    let expanded =
        expand_placeholders(&source("-- contact: someone@example"), &ReplacePairs::new());
    assert!(expanded.unwrap().is_empty());
}

#[test]
fn test_substitute_placeholders() {
    let mut placeholders = BTreeMap::new();
    placeholders.insert("@MAX@".to_string(), "100".to_string());
    let substitution = Substitution::new(&placeholders);

    assert_eq!(substitution.apply_line("limit @MAX@;", 1), "limit 100;");
}

#[test]
fn test_substitute_line_numbers() {
    let substitution = Substitution::new(&BTreeMap::new()).with_magic_constants(
        "'/srv/psql/f.psql'".to_string(),
        "'/srv/psql'".to_string(),
        "'f'".to_string(),
    );
    let lines = vec![
        "select __LINE__;".to_string(),
        "select __ROUTINE__, __FILE__;".to_string(),
        "select __DIR__, __LINE__;".to_string(),
    ];

    assert_eq!(
        substitution.apply(&lines),
        "select 1;\nselect 'f', '/srv/psql/f.psql';\nselect '/srv/psql', 3;"
    );
}

#[test]
fn test_substitution_does_not_rescan_replacements() {
    let mut placeholders = BTreeMap::new();
    placeholders.insert("@A@".to_string(), "@B@".to_string());
    placeholders.insert("@B@".to_string(), "x".to_string());
    let substitution = Substitution::new(&placeholders);

    assert_eq!(substitution.apply_line("@A@ @B@", 1), "@B@ x");
}

#[test]
fn test_substitution_prefers_longest_key() {
    let mut placeholders = BTreeMap::new();
    placeholders.insert("@T.C@".to_string(), "int".to_string());
    placeholders.insert("@T.C%type@".to_string(), "varchar(10)".to_string());
    let substitution = Substitution::new(&placeholders);

    assert_eq!(substitution.apply_line("@T.C%type@ @T.C@", 1), "varchar(10) int");
}

#[test]
fn test_substitution_keeps_multibyte_text() {
    let substitution = Substitution::new(&BTreeMap::new());
    assert_eq!(
        substitution.apply_line("select 'héllo' -- ünïcode", 1),
        "select 'héllo' -- ünïcode"
    );
}
