use moov_core::session::{Session, SessionRepository, SessionStore, VideoInfo};
use moov_infrastructure::JsonSessionRepository;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

fn cats() -> VideoInfo {
    VideoInfo::new("http://v/cats", "Cats")
        .with_uploader("U")
        .with_uploader_url("http://u")
        .with_duration(120.0)
}

#[tokio::test]
async fn test_missing_file_loads_empty() {
    let temp_dir = TempDir::new().unwrap();
    let repo = JsonSessionRepository::new(temp_dir.path().join("sessions.json"));

    assert!(repo.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persisted_layout() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("deep/dir/sessions.json");
    let repo = JsonSessionRepository::new(path.clone());

    repo.save_all(&[Session::new(cats(), 65.0)]).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("[\n    {"));
    let value: Value = serde_json::from_str(&raw).unwrap();
    let entry = &value[0];
    assert_eq!(entry["time"], 65.0);
    assert_eq!(entry["video_info"]["url"], "http://v/cats");
    assert_eq!(entry["video_info"]["title"], "Cats");
    assert_eq!(entry["video_info"]["uploader"], "U");
    assert_eq!(entry["video_info"]["uploader_url"], "http://u");
    assert_eq!(entry["video_info"]["duration"], 120.0);
    assert!(!temp_dir.path().join("deep/dir/.sessions.json.tmp").exists());
}

#[tokio::test]
async fn test_reads_file_without_optional_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sessions.json");
    std::fs::write(
        &path,
        r#"[{"video_info": {"url": "http://a", "title": "A", "uploader_url": null, "duration": null}, "time": 3.5}]"#,
    )
    .unwrap();
    let repo = JsonSessionRepository::new(path);

    let sessions = repo.load_all().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].video_info.uploader, "Unknown");
    assert_eq!(sessions[0].time, 3.5);
}

#[tokio::test]
async fn test_store_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sessions.json");

    {
        let repo = Arc::new(JsonSessionRepository::new(path.clone()));
        let mut store = SessionStore::load(repo).await.unwrap();
        store.add(cats(), 10.0).await.unwrap();
        store
            .add(VideoInfo::new("http://v/dogs", "Dogs"), 0.0)
            .await
            .unwrap();
        store.set_top(0).await.unwrap();
        store.update_time("http://v/cats", 42.0).await.unwrap();
    }

    let repo = Arc::new(JsonSessionRepository::new(path));
    let store = SessionStore::load(repo).await.unwrap();
    let urls: Vec<&str> = store.list().iter().map(|s| s.url()).collect();
    assert_eq!(urls, vec!["http://v/dogs", "http://v/cats"]);
    assert_eq!(store.top().unwrap().time, 42.0);
}
