//! Tests for connection.rs - session factory, transactions and cleanup

#![allow(clippy::unwrap_used)]

use super::test_utils::{
    column, driver, driver_with, init_tracing, rows, target_url, MockConnector, UNRESOLVABLE_HOST,
};
use crate::connection::IsolationLevel;
use crate::cursor::RowCursor;
use crate::error::Error;
use crate::models::{
    AuthMode, ConnectProperties, Credentials, DriverConfig, EvictionPolicy, ProtocolVersion,
};
use crate::types::CatalogType;
use crate::url::TargetDescriptor;
use crate::value::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn props(user: &str, password: &str) -> ConnectProperties {
    [("user", user), ("password", password)].into_iter().collect()
}

mod connect {
    use super::*;

    #[test]
    fn test_unrecognized_url_returns_none() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let driver = driver(&connector);

        let result = driver
            .connect("jdbc:mysql://localhost:3306/db", &ConnectProperties::new())
            .unwrap();

        assert!(result.is_none());
        assert!(!driver.accepts_url("jdbc:mysql://localhost:3306/db"));
        assert_eq!(connector.opens(), 0);
    }

    #[test]
    fn test_each_connection_gets_its_own_id() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let driver = driver(&connector);
        let url = target_url("localhost", 54321, "db");

        let a = driver.connect(&url, &ConnectProperties::new()).unwrap().unwrap();
        let b = driver.connect(&url, &ConnectProperties::new()).unwrap().unwrap();

        assert_ne!(a.id(), b.id());
        assert!(!a.id().is_nil());
    }

    #[test]
    fn test_password_mode_passes_credentials() {
        init_tracing();
        let connector = Arc::new(MockConnector::new(AuthMode::Password));
        let driver = driver(&connector);

        let conn = driver
            .connect(&target_url("localhost", 54321, "db"), &props("root", "doqadmin"))
            .unwrap()
            .unwrap();

        assert_eq!(conn.user(), "root");
        assert_eq!(conn.database_name(), "db");
        assert_eq!(conn.url(), "jdbc:ricoh:doquedb://localhost:54321/db");
        assert_eq!(
            connector.state.session_requests(),
            vec![(
                "db".to_string(),
                Some(Credentials::new("root", "doqadmin"))
            )]
        );
    }

    #[test]
    fn test_password_mode_defaults_missing_properties_to_empty() {
        let connector = Arc::new(MockConnector::new(AuthMode::Password));
        let driver = driver(&connector);

        driver
            .connect(&target_url("localhost", 1, "db"), &ConnectProperties::new())
            .unwrap()
            .unwrap();

        assert_eq!(
            connector.state.session_requests(),
            vec![("db".to_string(), Some(Credentials::default()))]
        );
    }

    #[test]
    fn test_no_auth_mode_ignores_credentials() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let driver = driver(&connector);

        driver
            .connect(&target_url("localhost", 1, "db"), &props("root", "secret"))
            .unwrap()
            .unwrap();

        assert_eq!(
            connector.state.session_requests(),
            vec![("db".to_string(), None)]
        );
    }

    #[test]
    fn test_connections_share_the_endpoint_data_source() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let driver = driver(&connector);

        let a = driver
            .connect(&target_url("localhost", 1, "one"), &ConnectProperties::new())
            .unwrap()
            .unwrap();
        let b = driver
            .connect(&target_url("127.0.0.1", 1, "two"), &ConnectProperties::new())
            .unwrap()
            .unwrap();

        assert!(Arc::ptr_eq(
            a.data_source().unwrap(),
            b.data_source().unwrap()
        ));
        assert_ne!(a.id(), b.id());
        assert_eq!(connector.opens(), 1);
        assert_eq!(connector.state.sessions_created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unresolvable_host_is_cannot_connect() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let driver = driver(&connector);

        let err = driver
            .connect(&target_url(UNRESOLVABLE_HOST, 1, "db"), &ConnectProperties::new())
            .unwrap_err();

        assert!(matches!(err, Error::CannotConnect { .. }));
    }

    #[test]
    fn test_open_failure_is_connection_ran_out() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        connector.fail_next_opens(1);
        let driver = driver(&connector);

        let err = driver
            .connect_target(&TargetDescriptor::new("localhost", 1, "db"), None)
            .unwrap_err();

        assert!(matches!(err, Error::ConnectionRanOut(_)));
        assert_eq!(connector.state.sessions_created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_protocol_capability_follows_master_id() {
        let connector =
            Arc::new(MockConnector::new(AuthMode::None).with_master_id(ProtocolVersion::V3.code()));
        let driver = driver(&connector);

        let conn = driver
            .connect_target(&TargetDescriptor::new("localhost", 1, "db"), None)
            .unwrap();

        assert_eq!(conn.master_id(), 2);
        assert!(conn.supports(ProtocolVersion::V2));
        assert!(conn.supports(ProtocolVersion::V3));
        assert!(!conn.supports(ProtocolVersion::V4));
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn test_close_is_idempotent() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let driver = driver(&connector);
        let mut conn = driver
            .connect_target(&TargetDescriptor::new("localhost", 1, "db"), None)
            .unwrap();

        conn.close().unwrap();
        conn.close().unwrap();
        drop(conn);

        assert_eq!(connector.state.sessions_closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_closes_session() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let driver = driver(&connector);
        let conn = driver
            .connect_target(&TargetDescriptor::new("localhost", 1, "db"), None)
            .unwrap();

        drop(conn);

        assert_eq!(connector.state.sessions_closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closed_connection_reports_session_not_available() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let driver = driver(&connector);
        let mut conn = driver
            .connect_target(&TargetDescriptor::new("localhost", 1, "db"), None)
            .unwrap();
        conn.close().unwrap();

        assert!(conn.is_closed());
        assert!(conn.data_source().is_none());
        assert!(matches!(
            conn.execute("select 1", &[]),
            Err(Error::SessionNotAvailable)
        ));
        assert!(matches!(
            conn.set_auto_commit(false),
            Err(Error::SessionNotAvailable)
        ));
    }

    #[test]
    fn test_failed_init_statement_closes_session_once() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        connector.state.fail_on("set bogus");
        let config = DriverConfig {
            init_statements: vec!["set transaction read write".into(), "set bogus".into()],
            ..DriverConfig::default()
        };
        let driver = driver_with(&connector, config);

        let err = driver
            .connect_target(&TargetDescriptor::new("localhost", 1, "db"), None)
            .unwrap_err();

        assert!(matches!(err, Error::Server { code: 1, .. }));
        assert_eq!(connector.state.sessions_created.load(Ordering::SeqCst), 1);
        assert_eq!(connector.state.sessions_closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_init_statements_run_in_order() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let config = DriverConfig {
            init_statements: vec!["set a".into(), "set b".into()],
            ..DriverConfig::default()
        };
        let driver = driver_with(&connector, config);

        driver
            .connect_target(&TargetDescriptor::new("localhost", 1, "db"), None)
            .unwrap();

        assert_eq!(connector.state.executed(), vec!["set a", "set b"]);
    }

    #[test]
    fn test_when_unused_eviction_closes_link_after_last_connection() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let config = DriverConfig {
            eviction: EvictionPolicy::WhenUnused,
            ..DriverConfig::default()
        };
        let driver = driver_with(&connector, config);
        let target = TargetDescriptor::new("localhost", 1, "db");

        let mut a = driver.connect_target(&target, None).unwrap();
        let b = driver.connect_target(&target, None).unwrap();
        a.close().unwrap();
        assert_eq!(connector.state.links_closed.load(Ordering::SeqCst), 0);
        drop(b);
        assert_eq!(connector.state.links_closed.load(Ordering::SeqCst), 1);

        driver.connect_target(&target, None).unwrap();
        assert_eq!(connector.opens(), 2);
    }
}

mod transactions {
    use super::*;

    fn open(connector: &Arc<MockConnector>) -> crate::connection::Connection {
        driver(connector)
            .connect_target(&TargetDescriptor::new("localhost", 1, "db"), None)
            .unwrap()
    }

    #[test]
    fn test_auto_commit_off_starts_transaction_implicitly() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let mut conn = open(&connector);

        conn.set_auto_commit(false).unwrap();
        conn.execute_update("insert into t values (1)", &[]).unwrap();
        conn.execute_update("insert into t values (2)", &[]).unwrap();
        assert!(conn.in_transaction());
        conn.commit().unwrap();
        assert!(!conn.in_transaction());

        assert_eq!(
            connector.state.executed(),
            vec![
                "start transaction read write",
                "insert into t values (1)",
                "insert into t values (2)",
                "commit",
            ]
        );
    }

    #[test]
    fn test_enabling_auto_commit_commits_open_transaction() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let mut conn = open(&connector);

        conn.set_auto_commit(false).unwrap();
        conn.execute_update("delete from t", &[]).unwrap();
        conn.set_auto_commit(true).unwrap();

        assert_eq!(connector.state.executed().last().unwrap(), "commit");
        assert!(conn.auto_commit());
    }

    #[test]
    fn test_commit_with_auto_commit_on_is_bad_argument() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let mut conn = open(&connector);

        assert!(matches!(conn.commit(), Err(Error::BadArgument(_))));
        assert!(matches!(conn.rollback(), Err(Error::BadArgument(_))));
    }

    #[test]
    fn test_rollback_without_transaction_sends_nothing() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let mut conn = open(&connector);

        conn.set_auto_commit(false).unwrap();
        conn.rollback().unwrap();

        assert!(connector.state.executed().is_empty());
    }

    #[test]
    fn test_read_only_transaction() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let mut conn = open(&connector);

        conn.set_read_only(true).unwrap();
        conn.set_read_only(true).unwrap();
        conn.set_auto_commit(false).unwrap();
        conn.execute_update("select * from t", &[]).unwrap();

        assert_eq!(
            connector.state.executed(),
            vec![
                "set transaction read only",
                "start transaction read only",
                "select * from t",
            ]
        );
        assert!(matches!(
            conn.set_read_only(false),
            Err(Error::BadArgument(_))
        ));
    }

    #[test]
    fn test_isolation_levels() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        let mut conn = open(&connector);

        conn.set_transaction_isolation(IsolationLevel::Serializable)
            .unwrap();
        assert_eq!(conn.transaction_isolation(), IsolationLevel::Serializable);
        conn.set_transaction_isolation(IsolationLevel::UsingSnapshot)
            .unwrap();
        assert!(conn.is_read_only());
        assert!(matches!(
            conn.set_read_only(false),
            Err(Error::BadArgument(_))
        ));
        conn.set_read_only(true).unwrap();
        conn.set_auto_commit(false).unwrap();
        conn.execute_update("select 1", &[]).unwrap();

        assert_eq!(
            connector.state.executed(),
            vec![
                "set transaction isolation level serializable",
                "set transaction read only, using snapshot",
                "start transaction read only, using snapshot",
                "select 1",
            ]
        );
    }

    #[test]
    fn test_execute_returns_scripted_rows() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        connector.state.script(
            "select id from t",
            rows(
                vec![column("id", CatalogType::Integer)],
                vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
            ),
        );
        let mut conn = open(&connector);

        let mut cursor = conn.execute("select id from t", &[Value::Null]).unwrap();
        let mut seen = Vec::new();
        while cursor.next().unwrap() {
            seen.push(cursor.get_i32(1).unwrap().unwrap());
        }
        cursor.close().unwrap();

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(cursor.parameter_metadata().parameter_count(), 1);
        assert_eq!(
            connector.state.result_sets_closed.load(Ordering::SeqCst),
            1
        );
    }

    #[test]
    fn test_server_error_is_reported() {
        let connector = Arc::new(MockConnector::new(AuthMode::None));
        connector.state.fail_on("drop");
        let mut conn = open(&connector);

        let err = conn.execute("drop table t", &[]).unwrap_err();

        assert!(matches!(err, Error::Server { code: 1, ref message } if message.contains("drop")));
        assert!(!conn.is_closed());
    }
}
