//! Integration tests for the bootstrap loader driving the source factory.

use laminate::{LoaderOptions, SourceFactory, load};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_full_bootstrap() -> anyhow::Result<()> {
    let temp = TempDir::new()?;

    let overrides = temp.path().join("overrides.json");
    fs::write(&overrides, r#"{"db": {"host": "jsonhost"}, "extra": true}"#)?;

    unsafe { std::env::set_var("BOOTSTRAP_TEST_DB_HOST", "envhost") };

    let root = temp.path().join("config.yaml");
    fs::write(
        &root,
        format!(
            concat!(
                "env: staging\n",
                "db:\n",
                "  host: roothost\n",
                "sources:\n",
                "  - id: overrides\n",
                "    priority: 5\n",
                "    type: file\n",
                "    path: {}\n",
                "  - id: environment\n",
                "    priority: 10\n",
                "    type: env\n",
                "    mappings:\n",
                "      BOOTSTRAP_TEST_DB_HOST: db.host\n",
            ),
            overrides.display()
        ),
    )?;

    let options = LoaderOptions {
        root_path: root,
        ..LoaderOptions::default()
    };
    let manager = load(options, &SourceFactory::with_defaults())?;

    // env (10) over file override (5) over root (0)
    assert_eq!(manager.get_str("db.host")?, "envhost");
    assert_eq!(manager.get_str("env")?, "staging");
    assert_eq!(manager.get_bool("extra")?, true);
    assert_eq!(
        manager.source_ids(),
        vec!["root", "overrides", "environment"]
    );
    Ok(())
}

#[test]
fn test_loader_with_custom_separator_and_sources_path() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let root = temp.path().join("config.yaml");
    fs::write(
        &root,
        concat!(
            "bootstrap:\n",
            "  sources:\n",
            "    - id: inline\n",
            "      type: memory\n",
            "      partial:\n",
            "        feature: enabled\n",
            "db:\n",
            "  host: roothost\n",
        ),
    )?;

    let options = LoaderOptions {
        root_path: root,
        sources_path: "bootstrap/sources".to_string(),
        separator: '/',
        ..LoaderOptions::default()
    };
    let manager = load(options, &SourceFactory::with_defaults())?;
    assert_eq!(manager.get_str("db/host")?, "roothost");
    assert_eq!(manager.get_str("feature")?, "enabled");
    Ok(())
}

#[test]
fn test_discover_honors_environment() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("primary.yaml");
    fs::write(&root, "a: 1\n").unwrap();

    unsafe {
        std::env::set_var("LAMINATE_ROOT_PATH", root.display().to_string());
        std::env::set_var("LAMINATE_ROOT_ID", "primary");
        std::env::set_var("LAMINATE_SOURCES_PATH", "bootstrap.sources");
        std::env::set_var("LAMINATE_SEPARATOR", "/");
        std::env::set_var("LAMINATE_POLL_INTERVAL_SECS", "30");
    }

    let options = LoaderOptions::discover();
    assert_eq!(options.root_path, root);
    assert_eq!(options.root_id, "primary");
    assert_eq!(options.sources_path, "bootstrap.sources");
    assert_eq!(options.separator, '/');
    assert_eq!(options.poll_interval, Duration::from_secs(30));

    unsafe {
        std::env::remove_var("LAMINATE_ROOT_PATH");
        std::env::remove_var("LAMINATE_ROOT_ID");
        std::env::remove_var("LAMINATE_SOURCES_PATH");
        std::env::remove_var("LAMINATE_SEPARATOR");
        std::env::remove_var("LAMINATE_POLL_INTERVAL_SECS");
    }
}

#[test]
fn test_duplicate_declared_id_aborts() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("config.yaml");
    fs::write(
        &root,
        concat!(
            "sources:\n",
            "  - id: twin\n",
            "    type: memory\n",
            "    partial: {a: 1}\n",
            "  - id: twin\n",
            "    type: memory\n",
            "    partial: {a: 2}\n",
        ),
    )
    .unwrap();

    let options = LoaderOptions {
        root_path: root,
        ..LoaderOptions::default()
    };
    let result = load(options, &SourceFactory::with_defaults());
    assert!(matches!(
        result,
        Err(laminate::Error::DuplicateSource { .. })
    ));
}
