use herald_config::{
    CommandScope, ConfigRecord, ConfigStore, JsonFileStore, MemoryStore, RuntimeConfig,
    ensure_config,
};

fn fallback() -> RuntimeConfig {
    RuntimeConfig::builder()
        .token("boot-token")
        .application_id("1111")
        .build()
        .expect("Valid runtime config")
}

#[tokio::test]
async fn test_memory_store_seeds_from_fallback() {
    let store = MemoryStore::new();
    assert!(store.find_one().await.expect("find").is_none());

    let record = ensure_config(&store, &fallback()).await.expect("ensure");
    assert_eq!(record.token.as_deref(), Some("boot-token"));
    assert_eq!(record.presence_text.as_deref(), Some("Ready to serve"));

    let stored = store.find_one().await.expect("find").expect("seeded");
    assert_eq!(stored, record);
}

#[tokio::test]
async fn test_ensure_config_keeps_existing_document() {
    let existing = ConfigRecord {
        presence_text: Some("Stored".to_string()),
        ..Default::default()
    };
    let store = MemoryStore::with_record(existing.clone());
    let record = ensure_config(&store, &fallback()).await.expect("ensure");
    assert_eq!(record, existing);
}

#[tokio::test]
async fn test_json_store_missing_file_is_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path().join("nested/settings.json"));
    assert!(store.find_one().await.expect("find").is_none());
}

#[tokio::test]
async fn test_json_store_round_trip_creates_parent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFileStore::new(dir.path().join(".config/settings.json"));
    let record = ConfigRecord {
        guild_id: Some("2222".to_string()),
        command_scope: Some(CommandScope::Global),
        presence_type: Some(2),
        ..Default::default()
    };

    store.create(record.clone()).await.expect("create");
    let loaded = store.find_one().await.expect("find").expect("document");
    assert_eq!(loaded, record);
}

#[tokio::test]
async fn test_json_store_preserves_unknown_keys_and_legacy_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"botToken":"legacy","clientId":"1111","port":8080,"sessionSecret":"s3cret"}"#,
    )
    .expect("write");

    let store = JsonFileStore::new(&path);
    let loaded = store.find_one().await.expect("find").expect("document");
    assert_eq!(loaded.token.as_deref(), Some("legacy"));
    assert_eq!(loaded.application_id.as_deref(), Some("1111"));

    let updated = ConfigRecord {
        token: Some("rotated".to_string()),
        ..loaded
    };
    store.save(&updated).await.expect("save");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(raw["port"], 8080);
    assert_eq!(raw["sessionSecret"], "s3cret");
    assert_eq!(raw["token"], "rotated");
    assert!(raw.get("botToken").is_none());

    let reloaded = store.find_one().await.expect("find").expect("document");
    assert_eq!(reloaded.token.as_deref(), Some("rotated"));
}

#[tokio::test]
async fn test_json_store_rejects_garbage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "not json").expect("write");
    let store = JsonFileStore::new(&path);
    assert!(store.find_one().await.is_err());
}

#[test]
fn test_record_merge_overlays_set_fields() {
    let mut base = ConfigRecord {
        token: Some("a".to_string()),
        presence_text: Some("old".to_string()),
        ..Default::default()
    };
    base.merge(&ConfigRecord {
        presence_text: Some("new".to_string()),
        ..Default::default()
    });
    assert_eq!(base.token.as_deref(), Some("a"));
    assert_eq!(base.presence_text.as_deref(), Some("new"));
}
