//! Integration tests for the loading pipeline
//!
//! These tests drive the public API end to end: a data directory with files
//! in several dialects is loaded, queried, cached and exported.

use indicator_ingest::analytics::{self, Operation, PeriodRange};
use indicator_ingest::export::{ExportFormat, write_dataset};
use indicator_ingest::{
    CanonicalColumn, DatasetCache, DatasetLoader, IngestConfig, Preferences, SkipReason,
};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const NACION: &str = "00011 - Banco de la Nación Argentina";

/// Monthly extract with synonym headers, semicolons and a BOM
fn write_synonym_file(dir: &Path) {
    let content = "\u{feff}Cod Entidad;Nombre Entidad;Periodo;Variable;Descripcion;Valor\n\
                   11;Banco de la Nación Argentina;202301;R1;Liquidez;50\n\
                   11;Banco de la Nación Argentina;202312;R1;Liquidez;80\n\
                   11;Banco de la Nación Argentina;202401;R1;Liquidez;100\n\
                   11;Banco de la Nación Argentina;202312;R2;Liquidez;10\n\
                   11;Banco de la Nación Argentina;202401;R2;Liquidez;20\n\
                   7;Banco de Galicia;202401;R1;Liquidez;90\n";
    fs::write(dir.join("2024_indicadores.csv"), content).unwrap();
}

/// Full history with canonical headers, commas and Latin-1
fn write_canonical_latin1_file(dir: &Path) {
    let mut content: Vec<u8> = Vec::new();
    content.extend_from_slice(
        b"C\xF3digo de entidad,Descripci\xF3n entidad,Fecha del dato,C\xF3digo del dato,Descripci\xF3n del dato,Valor\n",
    );
    // Duplicate of a row in the synonym file
    content.extend_from_slice(b"00011,Banco de la Naci\xF3n Argentina,202401,R1,Liquidez,100\n");
    content.extend_from_slice(b"00011,Banco de la Naci\xF3n Argentina,202401,R3,Solvencia,\"15,5\"\n");
    fs::write(dir.join("INDICAD_FULL.csv"), content).unwrap();
}

fn write_broken_file(dir: &Path) {
    fs::write(
        dir.join("z_sin_valor.csv"),
        "Código de entidad;Descripción entidad;Fecha del dato;Código del dato;Descripción del dato\n\
         11;Nación;202401;R9;Otro\n",
    )
    .unwrap();
}

fn build_data_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_synonym_file(temp_dir.path());
    write_canonical_latin1_file(temp_dir.path());
    write_broken_file(temp_dir.path());
    temp_dir
}

#[test]
fn test_end_to_end_load() {
    let temp_dir = build_data_dir();
    let config = IngestConfig::default().with_data_dir(temp_dir.path());

    let (dataset, report) = DatasetLoader::new(config).load().unwrap();

    assert_eq!(report.files.len(), 3);
    assert_eq!(report.files_loaded(), 2);
    let (skipped, reason) = report.skipped().next().unwrap();
    assert_eq!(skipped.file_name, "z_sin_valor.csv");
    assert_eq!(
        reason,
        &SkipReason::MissingColumns(vec![CanonicalColumn::Value])
    );

    assert_eq!(report.rows.rows_read, 8);
    assert_eq!(report.rows.duplicates_removed, 1);
    assert_eq!(dataset.len(), 7);

    assert_eq!(
        dataset.entities(),
        vec!["00007 - Banco de Galicia", NACION]
    );
    assert_eq!(dataset.period_keys(), vec!["2023-01", "2023-12", "2024-01"]);

    let labels: Vec<(String, String)> = dataset
        .catalog()
        .into_iter()
        .map(|e| (e.label, e.code))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("Liquidez (1)".to_string(), "R1".to_string()),
            ("Liquidez (2)".to_string(), "R2".to_string()),
            ("Solvencia".to_string(), "R3".to_string()),
        ]
    );
}

#[test]
fn test_repeated_loads_are_identical() {
    let temp_dir = build_data_dir();
    let loader = DatasetLoader::for_dir(temp_dir.path());

    let (first, _) = loader.load().unwrap();
    let (second, _) = loader.load().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.catalog(), second.catalog());
}

#[test]
fn test_defaults_follow_preferences() {
    let temp_dir = build_data_dir();
    let (dataset, _) = DatasetLoader::for_dir(temp_dir.path()).load().unwrap();

    let defaults = dataset.defaults(&Preferences::default());
    assert_eq!(defaults.entity.as_deref(), Some(NACION));
    assert_eq!(defaults.indicator.unwrap().code, "R1");

    let custom = Preferences {
        entity_substrings: vec!["GALICIA".to_string()],
        indicator_codes: vec!["R3".to_string()],
    };
    let defaults = dataset.defaults(&custom);
    assert_eq!(defaults.entity.as_deref(), Some("00007 - Banco de Galicia"));
    assert_eq!(defaults.indicator.unwrap().label, "Solvencia");
}

#[test]
fn test_projections_over_loaded_data() {
    let temp_dir = build_data_dir();
    let (dataset, _) = DatasetLoader::for_dir(temp_dir.path()).load().unwrap();

    let code = dataset.resolve_label("Liquidez (1)");
    let points = analytics::series(&dataset, NACION, &code, &PeriodRange::all());
    let values: Vec<Option<f64>> = points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![Some(50.0), Some(80.0), Some(100.0)]);

    let rows = analytics::panel(
        &dataset,
        NACION,
        "2024-01",
        &["R1".to_string(), "R2".to_string(), "R3".to_string()],
    );
    let order: Vec<&str> = rows.iter().map(|r| r.indicator_code.as_str()).collect();
    assert_eq!(order, vec!["R1", "R2", "R3"]);
    assert_eq!(rows[0].mom_pct, Some(25.0));
    assert_eq!(rows[0].yoy_pct, Some(100.0));
    assert_eq!(rows[1].mom_pct, Some(100.0));

    let r2 = analytics::series(&dataset, NACION, "R2", &PeriodRange::all());
    let ratio = analytics::calculate(&points, &r2, Operation::Div);
    let ratio_values: Vec<Option<f64>> = ratio.iter().map(|p| p.value).collect();
    assert_eq!(ratio_values, vec![None, Some(8.0), Some(5.0)]);
}

#[test]
fn test_cache_and_export() {
    let temp_dir = build_data_dir();
    let loader = DatasetLoader::for_dir(temp_dir.path());
    let mut cache = DatasetCache::new(Duration::from_secs(60));

    let (dataset, _) = cache.get_or_load_with(&loader).unwrap();
    let (again, _) = cache.get_or_load_with(&loader).unwrap();
    assert!(std::sync::Arc::ptr_eq(&dataset, &again));

    let output = temp_dir.path().join("export").join("indicators.parquet");
    let rows = write_dataset(&dataset, &output, ExportFormat::Parquet).unwrap();
    assert_eq!(rows, dataset.len());
    assert!(fs::metadata(&output).unwrap().len() > 0);

    // Exported files live outside the data directory's top level
    let (reloaded, report) = loader.load().unwrap();
    assert_eq!(reloaded.len(), dataset.len());
    assert_eq!(report.files.len(), 3);
}

#[test]
fn test_missing_directory_gives_empty_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let (dataset, report) = DatasetLoader::for_dir(temp_dir.path().join("absent"))
        .load()
        .unwrap();

    assert!(dataset.is_empty());
    assert!(report.files.is_empty());
    let defaults = dataset.defaults(&Preferences::default());
    assert!(defaults.entity.is_none());
    assert!(defaults.indicator.is_none());
}
