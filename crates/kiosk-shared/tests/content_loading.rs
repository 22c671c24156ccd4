use kiosk_shared::content::{Content, ContentError, DeckId, TabDataset};
use std::io::Write;

const SAMPLE: &str = r#"{
  "cards": [
    {"id": 1, "title": "Dashboards", "subtitle": "Statistics", "icon": "/icons/dash.png", "route": "/dashboards"},
    {"id": 2, "title": "PT NGFW", "icon": "/icons/ngfw.png", "route": "/ngfw"}
  ],
  "dashboards": {
    "tabs": [
      {"id": "incidents", "label": "Incidents", "subtitle": "Per year",
       "data": [{"year": 2018, "value": 1000, "growth": 0}, {"year": 2019, "value": 1800, "growth": 80}]},
      {"id": "kanban", "label": "Coverage", "data": null}
    ]
  },
  "ngfwPresentation": {"slides": [{"id": 1, "image": "/ngfw/1.png"}]},
  "videoSyncOffset": -2.5,
  "screensaver": {"playlist": [
    {"mediaFile": "/video/a.mp4", "durationSeconds": 95},
    {"mediaFile": "/video/b.mp4", "durationSeconds": 30}
  ]}
}"#;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write");
    file
}

#[test]
fn loads_bundled_content() {
    let file = write_temp(SAMPLE);
    let content = Content::load(file.path()).expect("content should load");

    assert_eq!(content.cards.len(), 2);
    assert_eq!(content.video_sync_offset, -2.5);
    assert_eq!(content.deck(DeckId::Ngfw).slides.len(), 1);
    assert!(content.deck(DeckId::Maturity).slides.is_empty());

    let playlist = content.playlist().expect("valid playlist");
    assert_eq!(playlist.total_duration_secs(), 125.0);

    let incidents = content.tab("incidents").expect("tab present");
    assert!(matches!(
        TabDataset::parse(&incidents.id, &incidents.data),
        TabDataset::Incidents(ref pts) if pts.len() == 2
    ));
    let kanban = content.tab("kanban").expect("tab present");
    assert!(!TabDataset::parse(&kanban.id, &kanban.data).is_available());
}

#[test]
fn rejects_content_without_playlist() {
    let file = write_temp(r#"{"cards": []}"#);
    match Content::load(file.path()) {
        Err(ContentError::Playlist(_)) => {}
        other => panic!("expected playlist error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn reports_malformed_json_with_path() {
    let file = write_temp("{ not json");
    let err = Content::load(file.path()).expect_err("must fail");
    assert!(matches!(err, ContentError::Json { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn reports_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = Content::load(&dir.path().join("content.json")).expect_err("must fail");
    assert!(matches!(err, ContentError::Io { .. }));
}
