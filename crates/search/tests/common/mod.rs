//! Test infrastructure for the search engine.
//!
//! Provides the reporting schema, a small seeded data set and an executor
//! wrapper that records every statement it runs.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use report_search::core::SqlExecutor;
use report_search::dialect::DialectKind;
use report_search::types::{BoundStatement, Row, SqlValue};
use report_search::StorageResult;

/// The reporting schema. `{ts}` and `{bool}` are replaced per dialect.
const SCHEMA_TEMPLATE: &str = r#"
CREATE TABLE organizations (
    uuid TEXT PRIMARY KEY,
    short_name TEXT NOT NULL,
    long_name TEXT,
    identification_code TEXT,
    type TEXT,
    status TEXT NOT NULL,
    parent_org_uuid TEXT REFERENCES organizations(uuid),
    created_at {ts} NOT NULL,
    updated_at {ts}
);
CREATE TABLE locations (
    uuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT,
    status TEXT NOT NULL,
    created_at {ts} NOT NULL
);
CREATE TABLE location_relationships (
    child_location_uuid TEXT NOT NULL REFERENCES locations(uuid),
    parent_location_uuid TEXT NOT NULL REFERENCES locations(uuid),
    PRIMARY KEY (child_location_uuid, parent_location_uuid)
);
CREATE TABLE tasks (
    uuid TEXT PRIMARY KEY,
    short_name TEXT NOT NULL,
    long_name TEXT,
    category TEXT,
    status TEXT NOT NULL,
    parent_task_uuid TEXT REFERENCES tasks(uuid),
    planned_completion {ts},
    created_at {ts} NOT NULL
);
CREATE TABLE task_tasked_organizations (
    task_uuid TEXT NOT NULL REFERENCES tasks(uuid),
    organization_uuid TEXT NOT NULL REFERENCES organizations(uuid)
);
CREATE TABLE people (
    uuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    role TEXT,
    status TEXT NOT NULL,
    rank TEXT,
    biography TEXT,
    created_at {ts} NOT NULL
);
CREATE TABLE positions (
    uuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    code TEXT,
    type TEXT,
    status TEXT NOT NULL,
    organization_uuid TEXT REFERENCES organizations(uuid),
    location_uuid TEXT REFERENCES locations(uuid),
    current_person_uuid TEXT REFERENCES people(uuid),
    created_at {ts} NOT NULL
);
CREATE TABLE task_responsible_positions (
    task_uuid TEXT NOT NULL REFERENCES tasks(uuid),
    position_uuid TEXT NOT NULL REFERENCES positions(uuid)
);
CREATE TABLE events (
    uuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    type TEXT,
    status TEXT NOT NULL,
    event_series_uuid TEXT,
    owner_org_uuid TEXT,
    host_org_uuid TEXT,
    admin_org_uuid TEXT,
    location_uuid TEXT,
    start_date {ts},
    end_date {ts},
    created_at {ts} NOT NULL
);
CREATE TABLE event_tasks (
    event_uuid TEXT NOT NULL REFERENCES events(uuid),
    task_uuid TEXT NOT NULL REFERENCES tasks(uuid)
);
CREATE TABLE reports (
    uuid TEXT PRIMARY KEY,
    intent TEXT,
    key_outcomes TEXT,
    state TEXT NOT NULL,
    engagement_date {ts},
    created_at {ts} NOT NULL,
    updated_at {ts},
    released_at {ts},
    advisor_org_uuid TEXT REFERENCES organizations(uuid),
    principal_org_uuid TEXT REFERENCES organizations(uuid),
    location_uuid TEXT REFERENCES locations(uuid),
    event_uuid TEXT REFERENCES events(uuid)
);
CREATE TABLE report_people (
    report_uuid TEXT NOT NULL REFERENCES reports(uuid),
    person_uuid TEXT NOT NULL REFERENCES people(uuid),
    is_author {bool} NOT NULL,
    is_attendee {bool} NOT NULL
);
CREATE TABLE report_tasks (
    report_uuid TEXT NOT NULL REFERENCES reports(uuid),
    task_uuid TEXT NOT NULL REFERENCES tasks(uuid)
);
CREATE TABLE report_authorization_groups (
    report_uuid TEXT NOT NULL REFERENCES reports(uuid),
    authorization_group_uuid TEXT NOT NULL
);
CREATE TABLE tags (
    uuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    created_at {ts} NOT NULL
);
"#;

/// Routes engine logs to the test output; `RUST_LOG=report_search=debug`
/// shows every rendered statement.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Returns the schema script for a dialect.
pub fn schema(dialect: DialectKind) -> String {
    let (ts, boolean) = match dialect {
        DialectKind::Postgres => ("TIMESTAMPTZ", "BOOLEAN"),
        DialectKind::Mssql => ("DATETIME2", "BIT"),
        DialectKind::Sqlite => ("TEXT", "INTEGER"),
    };
    SCHEMA_TEMPLATE
        .replace("{ts}", ts)
        .replace("{bool}", boolean)
}

/// A day in January 2024.
pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, n, 12, 0, 0).unwrap()
}

/// Inserts one row, binding every value.
pub async fn insert(
    executor: &dyn SqlExecutor,
    dialect: DialectKind,
    table: &str,
    values: &[(&str, SqlValue)],
) {
    let columns = values.iter().map(|(c, _)| *c).collect::<Vec<_>>();
    let placeholders = (1..=values.len())
        .map(|i| dialect.dialect().placeholder(i))
        .collect::<Vec<_>>();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );
    let params = values.iter().map(|(_, v)| v.clone()).collect();
    executor
        .execute(&BoundStatement::with_params(sql, params))
        .await
        .unwrap_or_else(|e| panic!("insert into {} failed: {}", table, e));
}

/// Inserts an active organization.
pub async fn insert_org(
    executor: &dyn SqlExecutor,
    dialect: DialectKind,
    uuid: &str,
    short_name: &str,
    parent: Option<&str>,
    created_day: u32,
) {
    insert(
        executor,
        dialect,
        "organizations",
        &[
            ("uuid", uuid.into()),
            ("short_name", short_name.into()),
            ("type", "ADVISOR_ORG".into()),
            ("status", "ACTIVE".into()),
            ("parent_org_uuid", parent.into()),
            ("created_at", day(created_day).into()),
        ],
    )
    .await;
}

/// Inserts an active location.
pub async fn insert_location(
    executor: &dyn SqlExecutor,
    dialect: DialectKind,
    uuid: &str,
    name: &str,
) {
    insert(
        executor,
        dialect,
        "locations",
        &[
            ("uuid", uuid.into()),
            ("name", name.into()),
            ("status", "ACTIVE".into()),
            ("created_at", day(1).into()),
        ],
    )
    .await;
}

/// Links a child location to a parent location.
pub async fn link_location(
    executor: &dyn SqlExecutor,
    dialect: DialectKind,
    child: &str,
    parent: &str,
) {
    insert(
        executor,
        dialect,
        "location_relationships",
        &[
            ("child_location_uuid", child.into()),
            ("parent_location_uuid", parent.into()),
        ],
    )
    .await;
}

/// Inserts a report with optional advisor and principal organizations.
pub async fn insert_report(
    executor: &dyn SqlExecutor,
    dialect: DialectKind,
    uuid: &str,
    advisor_org: Option<&str>,
    principal_org: Option<&str>,
    created_day: u32,
) {
    insert(
        executor,
        dialect,
        "reports",
        &[
            ("uuid", uuid.into()),
            ("intent", format!("Engagement {}", uuid).into()),
            ("state", "PUBLISHED".into()),
            ("engagement_date", day(created_day).into()),
            ("created_at", day(created_day).into()),
            ("advisor_org_uuid", advisor_org.into()),
            ("principal_org_uuid", principal_org.into()),
        ],
    )
    .await;
}

/// Creates the schema and seeds the shared data set:
///
/// ```text
/// organizations   A -> B -> C, D (top level)
/// locations       P1 <- {L1, L2}, P2 <- {L3}, P3 (no children), L2 <- L4
/// reports         R1 advisor B, R2 principal C, R3 advisor D, R4 no orgs
/// ```
pub async fn seed(executor: &dyn SqlExecutor, dialect: DialectKind) {
    insert_org(executor, dialect, "A", "Alpha Command", None, 1).await;
    insert_org(executor, dialect, "B", "Bravo Group", Some("A"), 2).await;
    insert_org(executor, dialect, "C", "Charlie Team", Some("B"), 3).await;
    insert_org(executor, dialect, "D", "Delta Office", None, 4).await;

    for (uuid, name) in [
        ("P1", "Kabul Province"),
        ("P2", "Herat Province"),
        ("P3", "Empty Province"),
        ("L1", "Kabul Airport"),
        ("L2", "Kabul City"),
        ("L3", "Herat Base"),
        ("L4", "City Hospital"),
    ] {
        insert_location(executor, dialect, uuid, name).await;
    }
    link_location(executor, dialect, "L1", "P1").await;
    link_location(executor, dialect, "L2", "P1").await;
    link_location(executor, dialect, "L3", "P2").await;
    link_location(executor, dialect, "L4", "L2").await;

    insert_report(executor, dialect, "R1", Some("B"), None, 1).await;
    insert_report(executor, dialect, "R2", None, Some("C"), 2).await;
    insert_report(executor, dialect, "R3", Some("D"), None, 3).await;
    insert_report(executor, dialect, "R4", None, None, 4).await;
}

/// Reads the `uuid` column of every item.
pub fn uuids(items: &[serde_json::Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| item["uuid"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Sorted copy of the `uuid` column of every item.
pub fn sorted_uuids(items: &[serde_json::Value]) -> Vec<String> {
    let mut uuids = uuids(items);
    uuids.sort();
    uuids
}

/// Wraps an executor and records the SQL of every statement.
pub struct RecordingExecutor {
    inner: Arc<dyn SqlExecutor>,
    statements: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    /// Wraps an executor.
    pub fn new(inner: Arc<dyn SqlExecutor>) -> Self {
        Self {
            inner,
            statements: Mutex::new(Vec::new()),
        }
    }

    /// SQL of the statements run so far.
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    /// Forgets the recorded statements.
    pub fn clear(&self) {
        self.statements.lock().clear();
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn product_name(&self) -> &str {
        self.inner.product_name()
    }

    async fn query(&self, statement: &BoundStatement) -> StorageResult<Vec<Row>> {
        self.statements.lock().push(statement.sql.clone());
        self.inner.query(statement).await
    }

    async fn execute(&self, statement: &BoundStatement) -> StorageResult<u64> {
        self.statements.lock().push(statement.sql.clone());
        self.inner.execute(statement).await
    }
}
