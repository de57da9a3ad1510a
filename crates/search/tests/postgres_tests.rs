//! PostgreSQL integration tests.
//!
//! Configuration tests run without a database. Tests that need a running
//! PostgreSQL instance use testcontainers to start one in Docker.
//!
//! Run with: `cargo test -p report-search --features postgres -- postgres`

#![cfg(feature = "postgres")]

mod common;

use report_search::backends::postgres::{PostgresConfig, PostgresSslMode};

// ============================================================================
// Configuration Tests (no PostgreSQL instance required)
// ============================================================================

#[test]
fn test_postgres_config_defaults() {
    let config = PostgresConfig::default();
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 5432);
    assert_eq!(config.max_connections, 10);
    assert_eq!(config.connect_timeout_secs, 5);
    assert_eq!(config.ssl_mode, PostgresSslMode::Prefer);
}

#[test]
fn test_postgres_config_deserialization() {
    let config: PostgresConfig = serde_json::from_str(
        r#"{"host": "db.internal", "dbname": "anet", "ssl_mode": "require"}"#,
    )
    .unwrap();
    assert_eq!(config.host, "db.internal");
    assert_eq!(config.dbname, "anet");
    assert_eq!(config.port, 5432);
    assert_eq!(config.ssl_mode, PostgresSslMode::Require);
    assert!(config.validate().is_ok());
}

// ============================================================================
// Integration Tests (requires Docker for testcontainers)
// ============================================================================

/// Integration tests against a real PostgreSQL instance.
///
/// Skip if no Docker:
///   cargo test -p report-search --features postgres -- --skip postgres_integration
mod postgres_integration {
    use std::sync::Arc;

    use report_search::backends::postgres::{PostgresConfig, PostgresExecutor};
    use report_search::dialect::DialectKind;
    use report_search::search::entities::{
        LocationFilters, Locations, OrganizationFilters, Organizations, ReportFilters, Reports,
    };
    use report_search::types::relations;
    use report_search::{
        Hierarchy, HierarchyFilter, JsonRowMapper, RecurseStrategy, SearchConfig, SearchEngine,
    };

    use testcontainers::ImageExt;
    use testcontainers::runners::AsyncRunner;
    use testcontainers_modules::postgres::Postgres;
    use tokio::sync::OnceCell;

    use crate::common::{init_tracing, schema, seed, sorted_uuids};

    /// Shared PostgreSQL container reused across all tests in this module.
    struct SharedPg {
        host: String,
        port: u16,
        /// Kept alive for the duration of the test binary.
        _container: testcontainers::ContainerAsync<Postgres>,
    }

    static SHARED_PG: OnceCell<SharedPg> = OnceCell::const_new();

    fn config(host: &str, port: u16) -> PostgresConfig {
        PostgresConfig {
            host: host.to_string(),
            port,
            dbname: "postgres".to_string(),
            user: "postgres".to_string(),
            password: Some("postgres".to_string()),
            max_connections: 5,
            ..Default::default()
        }
    }

    async fn shared_pg() -> &'static SharedPg {
        SHARED_PG
            .get_or_init(|| async {
                init_tracing();
                let run_id = std::env::var("GITHUB_RUN_ID").unwrap_or_default();
                let container = Postgres::default()
                    .with_label("github.run_id", &run_id)
                    .start()
                    .await
                    .expect("Failed to start PostgreSQL container");

                let port = container
                    .get_host_port_ipv4(5432)
                    .await
                    .expect("Failed to get host port");
                let host = container
                    .get_host()
                    .await
                    .expect("Failed to get host")
                    .to_string();

                // Schema and data are created once; the tests only read.
                let executor = PostgresExecutor::new(config(&host, port))
                    .await
                    .expect("Failed to create PostgresExecutor");
                executor
                    .execute_batch(&schema(DialectKind::Postgres))
                    .await
                    .expect("Failed to create schema");
                seed(&executor, DialectKind::Postgres).await;

                SharedPg {
                    host,
                    port,
                    _container: container,
                }
            })
            .await
    }

    async fn create_engine() -> SearchEngine {
        let pg = shared_pg().await;
        let executor = PostgresExecutor::new(config(&pg.host, pg.port))
            .await
            .expect("Failed to create PostgresExecutor");
        SearchEngine::new(Arc::new(executor), SearchConfig::default())
            .expect("Failed to create engine")
    }

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    // ========================================================================
    // Search Tests
    // ========================================================================

    #[tokio::test]
    async fn postgres_integration_detects_dialect() {
        let engine = create_engine().await;
        assert_eq!(engine.dialect(), DialectKind::Postgres);
    }

    #[tokio::test]
    async fn postgres_integration_total_count_spans_pages() {
        let engine = create_engine().await;
        let page = engine
            .search(
                &engine.query::<Organizations>().with_page(1, 3),
                &JsonRowMapper,
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, Some(4));
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn postgres_integration_text_search() {
        let engine = create_engine().await;
        let page = engine
            .search(
                &engine.query::<Locations>().with_text("kabul"),
                &JsonRowMapper,
            )
            .await
            .unwrap();
        assert_eq!(
            sorted_uuids(&page.items),
            vec!["L1".to_string(), "L2".to_string(), "P1".to_string()]
        );
    }

    #[tokio::test]
    async fn postgres_integration_hierarchy_filters() {
        let engine = create_engine().await;

        let page = engine
            .search(
                &engine
                    .query::<Organizations>()
                    .with_filters(OrganizationFilters {
                        org: Some(HierarchyFilter::children(["A"])),
                        ..Default::default()
                    }),
                &JsonRowMapper,
            )
            .await
            .unwrap();
        assert_eq!(
            sorted_uuids(&page.items),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );

        let page = engine
            .search(
                &engine.query::<Locations>().with_filters(LocationFilters {
                    location: Some(HierarchyFilter::parents(["L4"])),
                    ..Default::default()
                }),
                &JsonRowMapper,
            )
            .await
            .unwrap();
        assert_eq!(
            sorted_uuids(&page.items),
            vec!["L2".to_string(), "L4".to_string(), "P1".to_string()]
        );
    }

    #[tokio::test]
    async fn postgres_integration_report_date_range() {
        let engine = create_engine().await;
        let page = engine
            .search(
                &engine.query::<Reports>().with_filters(ReportFilters {
                    engagement_date_start: Some(crate::common::day(2)),
                    engagement_date_end: Some(crate::common::day(3)),
                    ..Default::default()
                }),
                &JsonRowMapper,
            )
            .await
            .unwrap();
        assert_eq!(sorted_uuids(&page.items), vec!["R2".to_string(), "R3".to_string()]);
    }

    // ========================================================================
    // Batch Load Tests
    // ========================================================================

    #[tokio::test]
    async fn postgres_integration_batch_loads() {
        let engine = create_engine().await;

        let groups = engine
            .batch_search(
                &engine.query::<Locations>(),
                &relations::child_locations(),
                &keys(&["P1", "P2", "P3"]),
                &JsonRowMapper,
            )
            .await
            .unwrap();
        let groups = groups.iter().map(|g| sorted_uuids(g)).collect::<Vec<_>>();
        assert_eq!(
            groups,
            vec![
                vec!["L1".to_string(), "L2".to_string()],
                vec!["L3".to_string()],
                Vec::<String>::new(),
            ]
        );

        let groups = engine
            .batch_search(
                &engine.query::<Organizations>(),
                &relations::descendant_organizations(),
                &keys(&["A", "D"]),
                &JsonRowMapper,
            )
            .await
            .unwrap();
        let groups = groups.iter().map(|g| sorted_uuids(g)).collect::<Vec<_>>();
        assert_eq!(
            groups,
            vec![vec!["B".to_string(), "C".to_string()], Vec::<String>::new()]
        );
    }

    // ========================================================================
    // Hierarchy Validation Tests
    // ========================================================================

    #[tokio::test]
    async fn postgres_integration_validator() {
        let engine = create_engine().await;
        let validator = engine.hierarchy_validator();

        let closure = validator
            .closure(&Hierarchy::ORGANIZATIONS, &keys(&["A"]), RecurseStrategy::Children)
            .await
            .unwrap();
        assert_eq!(closure, keys(&["A", "B", "C"]));

        assert!(
            validator
                .ensure_acyclic(&Hierarchy::ORGANIZATIONS, "A", Some("C"))
                .await
                .is_err()
        );
        assert!(
            validator
                .ensure_acyclic(&Hierarchy::ORGANIZATIONS, "C", Some("D"))
                .await
                .is_ok()
        );
    }
}
