use auditor::{AuditError, IndexAuditor, missing_names};
use configuration::AuditSettings;
use core_types::{IndexStatus, required_index_specs};
use database::SchemaStore;
use database::testing::TestSchema;

const EVENTS_DDL: &str = "
    CREATE TABLE events (
        id bigserial PRIMARY KEY,
        session_id text NOT NULL,
        \"timestamp\" timestamptz NOT NULL DEFAULT now(),
        payload jsonb
    );
    INSERT INTO events (session_id) SELECT 'session-' || (g % 7) FROM generate_series(1, 200) AS g;
";

#[tokio::test]
async fn audit_is_complete_and_idempotent() {
    let Some(db) = TestSchema::create().await else { return };
    db.sql(EVENTS_DDL).await;
    let settings = AuditSettings::default();
    let auditor = IndexAuditor::new(&db.repo, &settings, 3);

    let first = auditor.audit("events").await.unwrap();
    assert_eq!(first.created(), 3);
    assert!(first.analyzed);
    assert!(first.still_missing.is_empty());

    let observed = db.repo.list_indexes("events").await.unwrap();
    assert!(missing_names(&required_index_specs(), &observed).is_empty());

    let second = auditor.audit("events").await.unwrap();
    assert_eq!(second.created(), 0);
    assert_eq!(second.skipped(), 3);
    assert_eq!(first.stats.row_count, second.stats.row_count);
    assert_eq!(second.stats.row_count, 200);

    db.teardown().await;
}

#[tokio::test]
async fn existing_index_is_left_alone() {
    let Some(db) = TestSchema::create().await else { return };
    db.sql(EVENTS_DDL).await;
    db.sql("CREATE INDEX idx_events_session_id ON events (session_id)").await;
    let settings = AuditSettings { exact_row_count: true, ..Default::default() };

    let report = IndexAuditor::new(&db.repo, &settings, 2).audit("events").await.unwrap();
    let existing = report
        .outcomes
        .iter()
        .find(|o| o.name == "idx_events_session_id")
        .unwrap();
    assert_eq!(existing.status, IndexStatus::Present);
    assert_eq!(report.created(), 2);
    assert!(report.stats.row_count_exact);

    db.teardown().await;
}

#[tokio::test]
async fn build_failures_are_recorded_per_index() {
    let Some(db) = TestSchema::create().await else { return };
    // No "timestamp" column: two of the three builds cannot succeed.
    db.sql("CREATE TABLE events (id bigserial PRIMARY KEY, session_id text NOT NULL)").await;
    let settings = AuditSettings::default();

    let report = IndexAuditor::new(&db.repo, &settings, 3).audit("events").await.unwrap();
    assert_eq!(report.created(), 1);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.still_missing.len(), 2);
    assert!(report.analyzed);

    db.teardown().await;
}

#[tokio::test]
async fn missing_table_surfaces_as_an_error() {
    let Some(db) = TestSchema::create().await else { return };
    let settings = AuditSettings::default();

    let err = IndexAuditor::new(&db.repo, &settings, 3).audit("events").await.unwrap_err();
    assert!(matches!(err, AuditError::Database(_)));

    db.teardown().await;
}
