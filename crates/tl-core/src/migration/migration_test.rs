use super::*;
use tempfile::TempDir;

const SIMPLE: &str = "-- +goose Up\nSELECT 1;\n-- +goose Down\nSELECT 2;\n";

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_parse_version() {
    assert_eq!(parse_version("00001_init.sql").unwrap(), 1);
    assert_eq!(parse_version("20240131120000_add_users.sql").unwrap(), 20240131120000);
}

#[test]
fn test_parse_version_rejects_malformed_names() {
    for name in ["init.sql", "abc_init.sql", "_init.sql", "0_init.sql", "1a_init.sql"] {
        assert!(
            matches!(parse_version(name), Err(CoreError::MalformedMigration { .. })),
            "expected '{name}' to be rejected"
        );
    }
}

#[test]
fn test_load_sorts_by_version() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "00010_c.sql", SIMPLE);
    write(temp.path(), "00002_b.sql", SIMPLE);
    write(temp.path(), "00001_a.sql", SIMPLE);

    let set = MigrationSet::load(temp.path()).unwrap();
    let versions: Vec<i64> = set.iter().map(|s| s.version).collect();
    assert_eq!(versions, vec![1, 2, 10]);
    assert_eq!(set.max_version(), Some(10));
    assert_eq!(set.get(2).unwrap().identifier, "00002_b.sql");
    assert!(set.get(3).is_none());
}

#[test]
fn test_load_ignores_other_files_and_directories() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "00001_a.sql", SIMPLE);
    write(temp.path(), "README.md", "# migrations");
    write(temp.path(), "notes.txt", "ignored");
    std::fs::create_dir(temp.path().join("00002_dir.sql")).unwrap();

    let set = MigrationSet::load(temp.path()).unwrap();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_load_rejects_duplicate_versions() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "001_a.sql", SIMPLE);
    write(temp.path(), "1_b.sql", SIMPLE);

    let err = MigrationSet::load(temp.path()).unwrap_err();
    match err {
        CoreError::DuplicateMigrationVersion {
            version,
            first,
            second,
        } => {
            assert_eq!(version, 1);
            assert_eq!(first, "001_a.sql");
            assert_eq!(second, "1_b.sql");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_rejects_malformed_sql_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "init.sql", SIMPLE);
    assert!(matches!(
        MigrationSet::load(temp.path()),
        Err(CoreError::MalformedMigration { .. })
    ));
}

#[test]
fn test_load_missing_dir() {
    let temp = TempDir::new().unwrap();
    let err = MigrationSet::load(&temp.path().join("nope")).unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    write(temp.path(), "file", "");
    let err = MigrationSet::load(&temp.path().join("file")).unwrap_err();
    assert!(err.to_string().contains("is not a directory"));
}

#[test]
fn test_load_empty_dir() {
    let temp = TempDir::new().unwrap();
    let set = MigrationSet::load(temp.path()).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.max_version(), None);
}

#[test]
fn test_pending_range() {
    let scripts = [1, 2, 3, 5]
        .iter()
        .map(|v| MigrationScript::from_source(&format!("{v}_m.sql"), SIMPLE).unwrap())
        .collect();
    let set = MigrationSet::from_scripts(scripts).unwrap();
    let pending: Vec<i64> = set.pending(1, 3).map(|s| s.version).collect();
    assert_eq!(pending, vec![2, 3]);
    assert_eq!(set.pending(5, 10).count(), 0);
}

#[test]
fn test_statements_by_direction() {
    let script = MigrationScript::from_source("00001_a.sql", SIMPLE).unwrap();
    assert_eq!(script.statements(Direction::Up), ["SELECT 1;".to_string()]);
    assert_eq!(script.statements(Direction::Down), ["SELECT 2;".to_string()]);
}
