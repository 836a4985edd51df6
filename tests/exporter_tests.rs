//! Metadata export against an in-memory provider
use anyhow::{Result, anyhow};
use appdata_explorer_lib::application::{ExportError, MetadataExporter};
use appdata_explorer_lib::domain::{AppDetails, AppId, MetadataProvider};
use async_trait::async_trait;
use proptest::prelude::*;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

/// Details as the store returns them for a few well-known listings
struct FixtureProvider;

#[async_trait]
impl MetadataProvider for FixtureProvider {
    async fn app_details(&self, id: &AppId, language: &str, _country: &str) -> Result<AppDetails> {
        let details = match (id.as_str(), language) {
            ("com.netflix.mediaclient", "de") => json!({
                "title": "Netflix", "genre": "Unterhaltung", "free": true, "price": 0,
                "score": 4.4, "contentRating": "USK ab 12 Jahren", "size": "Variiert je nach Gerät",
                "developer": "Netflix, Inc."
            }),
            ("com.netflix.mediaclient", _) => json!({
                "title": "Netflix", "genre": "Entertainment", "free": true, "price": 0,
                "score": 4.4, "contentRating": "Teen", "size": "Varies with device",
                "developer": "Netflix, Inc."
            }),
            ("no.mobitroll.kahoot.android", _) => json!({
                "title": "Kahoot! Play & Create Quizzes", "genre": "Education", "free": true,
                "price": 0, "score": 4.6, "contentRating": "Everyone", "size": "29M"
            }),
            (other, _) => return Err(anyhow!("unknown application {}", other)),
        };

        match details {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(anyhow!("fixture is not an object")),
        }
    }
}

#[fixture]
fn exporter() -> MetadataExporter<FixtureProvider> {
    MetadataExporter::new(FixtureProvider)
}

#[rstest]
#[case("com.netflix.mediaclient", "en", "us", "Netflix", "Entertainment")]
#[case("com.netflix.mediaclient", "de", "de", "Netflix", "Unterhaltung")]
#[case("no.mobitroll.kahoot.android", "en", "us", "Kahoot! Play & Create Quizzes", "Education")]
#[tokio::test]
async fn title_and_genre_per_locale(
    exporter: MetadataExporter<FixtureProvider>,
    #[case] id: &str,
    #[case] language: &str,
    #[case] country: &str,
    #[case] title: &str,
    #[case] genre: &str,
) {
    let record = exporter
        .fetch_attributes(&AppId::new(id), language, country, &["title", "genre"])
        .await
        .unwrap();

    assert_eq!(record.len(), 2);
    assert_eq!(record.get("title"), Some(&json!(title)));
    assert_eq!(record.get("genre"), Some(&json!(genre)));
}

#[rstest]
#[tokio::test]
async fn empty_attribute_set_yields_empty_record(exporter: MetadataExporter<FixtureProvider>) {
    let none: [&str; 0] = [];
    let record = exporter
        .fetch_attributes(&AppId::new("com.netflix.mediaclient"), "en", "us", &none)
        .await
        .unwrap();
    assert!(record.is_empty());
}

#[rstest]
#[tokio::test]
async fn export_writes_ordered_header_and_rows(exporter: MetadataExporter<FixtureProvider>) {
    let dir = tempfile::tempdir().unwrap();
    let file_name = dir.path().join("apps");
    let ids = [AppId::new("com.netflix.mediaclient"), AppId::new("no.mobitroll.kahoot.android")];

    let summary = exporter
        .export(&ids, file_name.to_str().unwrap(), "en", "us")
        .await
        .unwrap();

    assert_eq!(summary.rows, 2);
    assert_eq!(summary.path, dir.path().join("apps.csv"));

    let content = std::fs::read_to_string(&summary.path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "title,free,score,price,contentRating,genre,size");
    assert_eq!(lines[1], "Netflix,true,4.4,0,Teen,Entertainment,Varies with device");
    assert_eq!(lines[2], "Kahoot! Play & Create Quizzes,true,4.6,0,Everyone,Education,29M");
}

#[rstest]
#[tokio::test]
async fn export_replaces_existing_file(exporter: MetadataExporter<FixtureProvider>) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("apps.csv"), "stale\n").unwrap();
    let file_name = dir.path().join("apps");

    exporter
        .export(&[], file_name.to_str().unwrap(), "en", "us")
        .await
        .unwrap();

    let content = std::fs::read_to_string(dir.path().join("apps.csv")).unwrap();
    assert_eq!(content, "title,free,score,price,contentRating,genre,size\n");
}

#[rstest]
#[tokio::test]
async fn unwritable_target_returns_records_and_creates_nothing(exporter: MetadataExporter<FixtureProvider>) {
    let dir = tempfile::tempdir().unwrap();
    let file_name = dir.path().join("no_such_dir").join("apps");
    let ids = [AppId::new("no.mobitroll.kahoot.android")];

    let err = exporter
        .export(&ids, file_name.to_str().unwrap(), "en", "us")
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Write { .. }));
    assert!(!dir.path().join("no_such_dir").exists());

    let records = err.into_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("size"), Some(&json!("29M")));

    // the fetched records can be written elsewhere without refetching
    let retry = MetadataExporter::<FixtureProvider>::write_records(dir.path().join("retry.csv"), records).unwrap();
    assert_eq!(retry.rows, 1);
}

#[rstest]
#[tokio::test]
async fn provider_failure_aborts_before_writing(exporter: MetadataExporter<FixtureProvider>) {
    let dir = tempfile::tempdir().unwrap();
    let file_name = dir.path().join("apps");
    let ids = [AppId::new("com.netflix.mediaclient"), AppId::new("com.example.unknown")];

    let err = exporter
        .export(&ids, file_name.to_str().unwrap(), "en", "us")
        .await
        .unwrap_err();

    match err {
        ExportError::Provider { id, .. } => assert_eq!(id.as_str(), "com.example.unknown"),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!dir.path().join("apps.csv").exists());
}

const KNOWN_ATTRIBUTES: [&str; 9] = [
    "title",
    "free",
    "score",
    "price",
    "contentRating",
    "genre",
    "size",
    "developer",
    "installs",
];

proptest! {
    #[test]
    fn projected_keys_are_requested_keys_with_values(
        picks in proptest::collection::vec(0..KNOWN_ATTRIBUTES.len(), 0..12)
    ) {
        let names: Vec<&str> = picks.iter().map(|&i| KNOWN_ATTRIBUTES[i]).collect();
        let record = tokio_test::block_on(
            MetadataExporter::new(FixtureProvider).fetch_attributes(
                &AppId::new("com.netflix.mediaclient"),
                "en",
                "us",
                &names,
            ),
        )
        .unwrap();

        for key in record.keys() {
            prop_assert!(names.contains(&key));
        }
        for name in &names {
            // "installs" is the only known attribute the fixture has no value for
            prop_assert_eq!(record.get(name).is_some(), *name != "installs");
        }
    }
}
