use super::*;
use sproc_utils::{DocBlock, Designation};
use tempfile::TempDir;

fn record(name: &str, timestamp: i64) -> RoutineMetadataRecord {
    RoutineMetadataRecord {
        routine_name: name.to_string(),
        designation: Designation::Procedure,
        return_type: None,
        parameters: vec![],
        replace: BTreeMap::from([("@TBL_USER@".to_string(), "`users`".to_string())]),
        timestamp,
        bulk_insert: None,
        doc_block: DocBlock::default(),
    }
}

#[test]
fn test_missing_file_is_empty_store() {
    let temp = TempDir::new().unwrap();
    let store = MetadataStore::load(temp.path().join("routines.json")).unwrap();

    assert!(store.is_empty());
}

#[test]
fn test_save_and_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("etc/routines.json");

    let mut store = MetadataStore::load(&path).unwrap();
    store.insert(record("get_user", 10));
    store.insert(record("add_user", 20));
    store.save().unwrap();

    let loaded = MetadataStore::load(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get("add_user"), Some(&record("add_user", 20)));
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn test_saved_document_is_sorted_by_routine_name() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("routines.json");

    let mut store = MetadataStore::load(&path).unwrap();
    store.insert(record("zap", 1));
    store.insert(record("add", 1));
    store.save().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let add = content.find("\"add\"").unwrap();
    let zap = content.find("\"zap\"").unwrap();
    assert!(add < zap);
}

#[test]
fn test_insert_replaces_and_retain_purges() {
    let temp = TempDir::new().unwrap();
    let mut store = MetadataStore::load(temp.path().join("routines.json")).unwrap();

    store.insert(record("a", 1));
    store.insert(record("a", 2));
    store.insert(record("b", 1));
    assert_eq!(store.get("a").unwrap().timestamp, 2);

    store.retain(|name| name != "b");
    assert_eq!(store.len(), 1);
    assert!(store.get("a").is_some());
    assert!(store.get("b").is_none());
}

#[test]
fn test_invalid_document_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("routines.json");
    fs::write(&path, "{ not json").unwrap();

    let err = MetadataStore::load(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid metadata file"));
}
