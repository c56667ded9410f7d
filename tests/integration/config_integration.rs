//! Integration tests for the configuration loader

use crate::integration::test_utils::with_config_env;
use baycut::config::ValidationError;
use baycut::ConfigLoader;
use tempfile::TempDir;

#[test]
fn defaults_apply_without_any_file() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let config = with_config_env(&temp_dir, || ConfigLoader::load(workspace.path()).unwrap());

    assert_eq!(config.generation.tolerance, 0.5);
    assert_eq!(config.generation.passage_match_tolerance, 5.0);
    assert_eq!(config.generation.passage_span_tolerance, 1.0);
    assert_eq!(config.store.write_chunk_size, 20);
    assert_eq!(config.store.page_size, 5000);
    assert!(config.validate().is_ok());
}

#[test]
fn workspace_file_overrides_global_file() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let global_dir = temp_dir.path().join("baycut");
    std::fs::create_dir_all(&global_dir).unwrap();
    std::fs::write(
        global_dir.join("config.toml"),
        "[store]\nwrite_chunk_size = 8\npage_size = 100\n",
    )
    .unwrap();

    let workspace_config = workspace.path().join("config");
    std::fs::create_dir_all(&workspace_config).unwrap();
    std::fs::write(
        workspace_config.join("config.toml"),
        "[store]\npage_size = 250\n\n[generation]\ntolerance = 0.25\n",
    )
    .unwrap();

    let config = with_config_env(&temp_dir, || ConfigLoader::load(workspace.path()).unwrap());
    assert_eq!(config.store.write_chunk_size, 8);
    assert_eq!(config.store.page_size, 250);
    assert_eq!(config.generation.tolerance, 0.25);
}

#[test]
fn environment_overrides_files() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let workspace_config = workspace.path().join("config");
    std::fs::create_dir_all(&workspace_config).unwrap();
    std::fs::write(workspace_config.join("config.toml"), "[store]\npage_size = 250\n").unwrap();

    let config = with_config_env(&temp_dir, || {
        std::env::set_var("BAYCUT__STORE__PAGE_SIZE", "42");
        ConfigLoader::load(workspace.path()).unwrap()
    });
    assert_eq!(config.store.page_size, 42);
}

#[test]
fn negative_tolerance_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("baycut.toml");
    std::fs::write(&config_file, "[generation]\ntolerance = -1.0\n").unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let errors = config.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::Generation(_))));
}
