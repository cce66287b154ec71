//! Property-based tests using proptest
//!
//! These tests verify invariants that should hold for all inputs,
//! helping catch edge cases that unit tests might miss.

#![allow(clippy::unwrap_used)]

use crate::array_cursor::ArrayCursor;
use crate::cursor::RowCursor;
use crate::types::{host_repr, standard_type, CatalogType, HostRepr, StandardType};
use crate::url::{parse, TargetDescriptor};
use crate::value::{Array, Value};
use proptest::prelude::*;

/// An array length with a start and count that fit inside it
fn window() -> impl Strategy<Value = (usize, usize, usize)> {
    (0usize..40)
        .prop_flat_map(|len| (Just(len), 0..=len))
        .prop_flat_map(|(len, start)| (Just(len), Just(start), 0..=len - start))
}

proptest! {
    /// Property: parse should never panic for any valid UTF-8 string
    #[test]
    fn parse_never_panics(url in ".*") {
        let _ = parse(&url);
    }

    /// Property: strings with the right prefix but arbitrary tails never panic
    #[test]
    fn prefixed_garbage_never_panics(rest in ".{0,200}") {
        let _ = parse(&format!("jdbc:ricoh:doquedb://{rest}"));
    }

    /// Property: every well-formed target parses back to its parts
    #[test]
    fn well_formed_targets_parse(
        host in "[a-z0-9.-]{1,30}",
        port in any::<u16>(),
        database in "[A-Za-z0-9_:]{0,30}"
    ) {
        let url = format!("jdbc:ricoh:doquedb://{host}:{port}/{database}");
        let target = parse(&url).unwrap();
        prop_assert_eq!(&target.host, &host);
        prop_assert_eq!(target.port, port);
        prop_assert_eq!(&target.database_name, &database);
        prop_assert_eq!(target.url(), url);
    }

    /// Property: the canonical string of any descriptor parses to the same descriptor
    #[test]
    fn canonical_url_round_trips(
        host in "[a-z0-9.-]{1,30}",
        port in any::<u16>(),
        database in "[^/\\x00]{0,30}"
    ) {
        let target = TargetDescriptor::new(host, port, database);
        prop_assert_eq!(parse(&target.url()), Some(target));
    }

    /// Property: ports that do not fit in 16 bits are never accepted
    #[test]
    fn oversized_ports_rejected(port in 65536u64..u64::MAX) {
        let url = format!("jdbc:ricoh:doquedb://h:{port}/d");
        prop_assert!(parse(&url).is_none());
    }

    /// Property: the type mapper is total over every code, known or not
    #[test]
    fn type_mapping_is_total(code in any::<i32>(), is_array in any::<bool>()) {
        let catalog = CatalogType::from_code(code);
        let repr = host_repr(catalog, is_array);
        if is_array {
            prop_assert_eq!(repr, HostRepr::Array);
        }
        if !(0..24).contains(&code) {
            prop_assert_eq!(catalog, CatalogType::Unknown);
            prop_assert_eq!(standard_type(catalog), StandardType::Unknown);
        }
    }

    /// Property: only the text after the final slash names the database
    #[test]
    fn database_name_is_last_segment(
        segments in prop::collection::vec("[A-Za-z0-9_]{0,10}", 1..5)
    ) {
        let url = format!("jdbc:ricoh:doquedb://h:1/{}", segments.join("/"));
        let target = parse(&url).unwrap();
        prop_assert_eq!(Some(&target.database_name), segments.last());
    }

    /// Property: an array cursor yields exactly its window, numbered from one
    #[test]
    fn array_cursor_yields_window((len, start, count) in window()) {
        let array = Array::new((0..len as i64).map(Value::BigInt).collect::<Vec<_>>());
        let mut cursor = ArrayCursor::new(array, start, count).unwrap();

        let mut seen = 0;
        while cursor.next().unwrap() {
            seen += 1;
            prop_assert_eq!(cursor.get_i32(1).unwrap(), Some(seen as i32));
            prop_assert_eq!(cursor.get_i64(2).unwrap(), Some((start + seen - 1) as i64));
            prop_assert_eq!(cursor.is_last().unwrap(), seen == count);
        }
        prop_assert_eq!(seen, count);
        prop_assert!(!cursor.next().unwrap());
    }
}
