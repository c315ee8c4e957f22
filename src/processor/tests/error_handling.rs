//! Error handling tests: skipped files and degenerate directories

use crate::models::{CanonicalColumn, FileStatus, SkipReason};
use crate::processor::DatasetLoader;
use crate::test_support::{CANONICAL_HEADER_LINE, write_file};
use std::fs;
use tempfile::TempDir;

fn valid_file(temp_dir: &TempDir) {
    let content = format!(
        "{}\n11;Nación;202401;R1;Liquidez;1\n",
        CANONICAL_HEADER_LINE
    );
    write_file(temp_dir.path(), "a_valid.csv", content);
}

#[test]
fn test_nonexistent_data_dir_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nonexistent");

    let (dataset, report) = DatasetLoader::for_dir(&missing).load().unwrap();

    assert!(dataset.is_empty());
    assert!(report.files.is_empty());
}

#[test]
fn test_empty_data_dir() {
    let temp_dir = TempDir::new().unwrap();

    let (dataset, report) = DatasetLoader::for_dir(temp_dir.path()).load().unwrap();

    assert!(dataset.is_empty());
    assert!(dataset.period_keys().is_empty());
    assert!(dataset.catalog().is_empty());
    assert_eq!(report.files_loaded(), 0);
}

#[test]
fn test_file_missing_value_column_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    valid_file(&temp_dir);
    write_file(
        temp_dir.path(),
        "b_no_value.csv",
        "Código de entidad;Descripción entidad;Fecha del dato;Código del dato;Descripción del dato\n\
         11;Nación;202401;R2;Solvencia\n",
    );

    let (dataset, report) = DatasetLoader::for_dir(temp_dir.path()).load().unwrap();

    assert_eq!(dataset.len(), 1);
    assert_eq!(report.files_loaded(), 1);
    assert_eq!(report.files_skipped(), 1);

    let (outcome, reason) = report.skipped().next().unwrap();
    assert_eq!(outcome.file_name, "b_no_value.csv");
    assert_eq!(
        reason,
        &SkipReason::MissingColumns(vec![CanonicalColumn::Value])
    );
    assert_eq!(reason.to_string(), "missing columns: Valor");
}

#[test]
fn test_file_missing_indicator_description_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "partial.csv",
        "Código de entidad;Descripción entidad;Fecha del dato;Código del dato;Valor\n\
         11;Nación;202401;R1;1\n",
    );

    let (dataset, report) = DatasetLoader::for_dir(temp_dir.path()).load().unwrap();

    assert!(dataset.is_empty());
    match &report.files[0].status {
        FileStatus::Skipped(SkipReason::MissingColumns(missing)) => {
            assert_eq!(missing, &vec![CanonicalColumn::IndicatorDescription]);
        }
        other => panic!("Expected missing columns, got {:?}", other),
    }
}

#[test]
fn test_unreadable_file_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    valid_file(&temp_dir);
    // One column whatever the delimiter
    write_file(temp_dir.path(), "b_garbage.txt", "just some notes\nnothing tabular\n");
    // Zero-length
    write_file(temp_dir.path(), "c_empty.csv", "");

    let (dataset, report) = DatasetLoader::for_dir(temp_dir.path()).load().unwrap();

    assert_eq!(dataset.len(), 1);
    assert_eq!(report.files.len(), 3);
    assert_eq!(report.files_skipped(), 2);
    for (_, reason) in report.skipped() {
        assert!(
            matches!(reason, SkipReason::Unreadable(_)),
            "unexpected reason {:?}",
            reason
        );
    }
}

#[test]
fn test_all_files_skipped_gives_empty_dataset() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "a.csv", "foo;bar\n1;2\n");
    write_file(temp_dir.path(), "b.csv", "");

    let (dataset, report) = DatasetLoader::for_dir(temp_dir.path()).load().unwrap();

    assert!(dataset.is_empty());
    assert_eq!(report.files_skipped(), 2);
}

#[test]
fn test_header_only_file_loads_zero_rows() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "header_only.csv",
        format!("{}\n", CANONICAL_HEADER_LINE),
    );

    let (dataset, report) = DatasetLoader::for_dir(temp_dir.path()).load().unwrap();

    assert!(dataset.is_empty());
    assert_eq!(report.files_loaded(), 1);
}

#[test]
fn test_ignored_files_are_not_reported() {
    let temp_dir = TempDir::new().unwrap();
    valid_file(&temp_dir);
    write_file(temp_dir.path(), "~$a_valid.csv", "locked");
    write_file(temp_dir.path(), "notes.md", "# notes");
    fs::create_dir(temp_dir.path().join("archive")).unwrap();

    let (_, report) = DatasetLoader::for_dir(temp_dir.path()).load().unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].file_name, "a_valid.csv");
}

#[cfg(unix)]
#[test]
fn test_unlistable_directory_is_an_error() {
    use crate::error::IngestError;
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let locked = temp_dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can list anything; nothing to check then
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = DatasetLoader::for_dir(&locked).load();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(IngestError::Discovery { .. })));
}
