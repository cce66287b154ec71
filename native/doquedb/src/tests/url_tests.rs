//! Tests for url.rs - connection-string recognition and parsing

#![allow(clippy::unwrap_used)]

use crate::error::Error;
use crate::models::ProtocolVersion;
use crate::url::{accepts_url, parse, TargetDescriptor};

mod recognized {
    use super::*;

    #[test]
    fn test_parse_basic_target() {
        let target = parse("jdbc:ricoh:doquedb://localhost:54321/db").unwrap();
        assert_eq!(target.host, "localhost");
        assert_eq!(target.port, 54321);
        assert_eq!(target.database_name, "db");
        assert_eq!(target.protocol_version, ProtocolVersion::CURRENT);
    }

    #[test]
    fn test_parse_ip_host() {
        let target = parse("jdbc:ricoh:doquedb://10.0.0.7:1/sales").unwrap();
        assert_eq!(target.host, "10.0.0.7");
        assert_eq!(target.port, 1);
        assert_eq!(target.database_name, "sales");
    }

    #[test]
    fn test_database_name_follows_final_slash() {
        let target = parse("jdbc:ricoh:doquedb://h:5432/a/b").unwrap();
        assert_eq!(target.port, 5432);
        assert_eq!(target.database_name, "b");

        let target = parse("jdbc:ricoh:doquedb://h:2/a/b:c").unwrap();
        assert_eq!(target.database_name, "b:c");

        let target = parse("jdbc:ricoh:doquedb://h:2/a/").unwrap();
        assert_eq!(target.database_name, "");
    }

    #[test]
    fn test_empty_database_name_is_accepted() {
        let target = parse("jdbc:ricoh:doquedb://h:2/").unwrap();
        assert_eq!(target.database_name, "");
    }

    #[test]
    fn test_port_bounds() {
        assert_eq!(parse("jdbc:ricoh:doquedb://h:0/d").unwrap().port, 0);
        assert_eq!(parse("jdbc:ricoh:doquedb://h:65535/d").unwrap().port, 65535);
        assert!(parse("jdbc:ricoh:doquedb://h:65536/d").is_none());
    }

    #[test]
    fn test_canonical_url_round_trips() {
        let url = "jdbc:ricoh:doquedb://db.example.com:54321/main";
        let target = parse(url).unwrap();
        assert_eq!(target.url(), url);
        assert_eq!(target.to_string(), url);
        assert_eq!(parse(&target.url()).unwrap(), target);
    }

    #[test]
    fn test_from_str() {
        let target: TargetDescriptor = "jdbc:ricoh:doquedb://h:9/x".parse().unwrap();
        assert_eq!(target, TargetDescriptor::new("h", 9, "x"));
    }
}

mod rejected {
    use super::*;

    #[test]
    fn test_wrong_scheme_tokens() {
        assert!(parse("jdbc:mysql://localhost:3306/db").is_none());
        assert!(parse("odbc:ricoh:doquedb://localhost:1/db").is_none());
        assert!(parse("jdbc:acme:doquedb://localhost:1/db").is_none());
        assert!(parse("jdbc:ricoh:sqlite://localhost:1/db").is_none());
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        assert!(parse("JDBC:ricoh:doquedb://h:1/db").is_none());
        assert!(parse("jdbc:Ricoh:doquedb://h:1/db").is_none());
        assert!(parse("jdbc:ricoh:DoqueDB://h:1/db").is_none());
    }

    #[test]
    fn test_missing_separators() {
        assert!(parse("jdbc:ricoh:doquedb:/h:1/db").is_none());
        assert!(parse("jdbc:ricoh:doquedb//h:1/db").is_none());
        assert!(parse("jdbc:ricoh:doquedb://h/db").is_none());
        assert!(parse("jdbc:ricoh:doquedb://h:1").is_none());
    }

    #[test]
    fn test_non_numeric_port() {
        assert!(parse("jdbc:ricoh:doquedb://h:abc/db").is_none());
        assert!(parse("jdbc:ricoh:doquedb://h:/db").is_none());
        assert!(parse("jdbc:ricoh:doquedb://h:+1/db").is_none());
        assert!(parse("jdbc:ricoh:doquedb://h:-1/db").is_none());
        assert!(parse("jdbc:ricoh:doquedb://h: 1/db").is_none());
    }

    #[test]
    fn test_empty_and_prefix_only() {
        assert!(parse("").is_none());
        assert!(parse("jdbc:").is_none());
        assert!(parse("jdbc:ricoh:doquedb://").is_none());
    }

    #[test]
    fn test_accepts_url_matches_parse() {
        assert!(accepts_url("jdbc:ricoh:doquedb://localhost:54321/db"));
        assert!(!accepts_url("jdbc:ricoh:doquedb://localhost:port/db"));
    }

    #[test]
    fn test_from_str_reports_not_recognized() {
        let err = "jdbc:other://x".parse::<TargetDescriptor>().unwrap_err();
        assert!(matches!(err, Error::NotRecognizedTarget(ref s) if s == "jdbc:other://x"));
    }
}
