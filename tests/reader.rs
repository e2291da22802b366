#![allow(clippy::pedantic)]
mod common;

use common::ScriptedSource;
use csvcolumn::{ColumnReader, Error, Position, ReaderState, Scan, Section};

const PEOPLE: &str = "Index,Age,Name\n1,52,Alice\n5,42,Bob\n";

#[test]
fn reads_bound_columns_row_by_row() {
    let mut reader = ColumnReader::from_reader(PEOPLE.as_bytes());
    let name = reader.text("Name");
    let age = reader.int("Age");

    assert!(reader.advance());
    assert_eq!((name.value(), age.value()), ("Alice".to_owned(), 52));
    assert!(reader.advance());
    assert_eq!((name.value(), age.value()), ("Bob".to_owned(), 42));
    assert!(!reader.advance());

    assert!(reader.error().is_none());
    assert_eq!(reader.state(), ReaderState::Exhausted);
    assert_eq!(reader.rows_read(), 2);
    assert_eq!(reader.finish().expect("no latched error"), 2);
}

#[test]
fn header_is_exposed_after_first_advance() {
    let mut reader = ColumnReader::from_reader(PEOPLE.as_bytes());
    let _name = reader.text("Name");
    assert_eq!(reader.state(), ReaderState::Fresh);
    assert!(reader.header().is_none());
    assert_eq!(reader.position("Name"), Some(Position::Unresolved));

    assert!(reader.advance());
    assert_eq!(reader.state(), ReaderState::Iterating);
    assert_eq!(
        reader.header().expect("header read"),
        ["Index", "Age", "Name"]
    );
    assert_eq!(reader.position("Name"), Some(Position::Resolved(2)));
    assert_eq!(reader.position("Unknown"), None);
}

#[test]
fn float_and_parsed_columns_follow_the_same_contract() {
    let input = "Index,Age,Height,Name,Active\n1,52,1.7,Alice,true\n5,42,1.88,Bob,false\n";
    let mut reader = ColumnReader::from_reader(input.as_bytes());
    let height = reader.float("Height");
    let active = reader.parsed::<bool>("Active");

    let mut seen = Vec::new();
    while reader.advance() && reader.error().is_none() {
        seen.push((height.value(), active.value()));
    }
    assert_eq!(seen, [(1.7, Some(true)), (1.88, Some(false))]);
    assert!(reader.error().is_none());
}

#[test]
fn absent_column_is_silent_and_never_written() {
    let mut reader = ColumnReader::from_reader(PEOPLE.as_bytes());
    let name = reader.text("Name");
    let email = reader.bind(
        "Email",
        csvcolumn::Text {
            value: "untouched".to_owned(),
        },
    );

    let mut names = Vec::new();
    while reader.advance() {
        names.push(name.value());
        assert_eq!(email.value(), "untouched");
    }
    assert_eq!(names, ["Alice", "Bob"]);
    assert_eq!(reader.position("Email"), Some(Position::Absent));
    assert!(reader.error().is_none());
}

#[test]
fn header_names_match_ignoring_case_by_default() {
    let input = "ID,NAME\n1,Alice\n";
    let mut reader = ColumnReader::from_reader(input.as_bytes());
    let name = reader.text("name");
    assert!(reader.advance());
    assert_eq!(name.value(), "Alice");
}

#[test]
fn case_sensitive_header_leaves_mismatched_column_absent() {
    let input = "ID,NAME\n1,Alice\n";
    let mut reader = ColumnReader::from_reader(input.as_bytes()).with_case_sensitive_header(true);
    let name = reader.text("name");
    assert!(reader.advance());
    assert_eq!(name.value(), "");
    assert_eq!(reader.position("name"), Some(Position::Absent));
    assert!(reader.error().is_none());
}

#[test]
fn conversion_error_latches_but_row_is_still_read() {
    let input = "Index,Age,Name\n5,notanumber,Bob\n";
    let mut reader = ColumnReader::from_reader(input.as_bytes());
    let age = reader.int_or("Age", -1);
    let name = reader.text("Name");

    assert!(reader.advance());
    // Name is declared after the failing Age column and is still scanned.
    assert_eq!(name.value(), "Bob");
    assert_eq!(age.value_or_default(), -1);

    match reader.error() {
        Some(Error::Conversion {
            column,
            section,
            source,
        }) => {
            assert_eq!(column, "Age");
            assert_eq!(*section, Section::Row { index: 0 });
            assert_eq!(source.text, "notanumber");
        }
        other => panic!("expected conversion error, got {other:?}"),
    }
    assert!(!reader.advance());
    assert_eq!(reader.state(), ReaderState::Exhausted);
}

#[test]
fn latched_conversion_error_does_not_stop_consuming_rows() {
    let input = "Index,Age,Name\n5,notanumber,Bob\n7,31,Charlie\n";
    let mut reader = ColumnReader::from_reader(input.as_bytes());
    let name = reader.text("Name");
    let age = reader.int("Age");

    assert!(reader.advance());
    assert!(reader.error().is_some());

    assert!(reader.advance());
    assert_eq!((name.value(), age.value()), ("Charlie".to_owned(), 31));
    assert!(age.last_error().is_none());
    let latched = reader.error().expect("error stays latched");
    assert_eq!(
        latched.conversion().map(|e| e.text.as_str()),
        Some("notanumber")
    );

    assert!(!reader.advance());
    assert_eq!(reader.rows_read(), 2);
}

#[test]
fn first_error_in_declaration_order_wins() {
    let input = "A,B\nx,y\n1,z\n";
    let mut reader = ColumnReader::from_reader(input.as_bytes());
    let b = reader.int("B");
    let a = reader.int("A");

    assert!(reader.advance());
    assert!(a.last_error().is_some());
    assert!(b.last_error().is_some());
    assert!(reader.advance());
    assert!(!reader.advance());

    match reader.error() {
        Some(Error::Conversion { column, section, .. }) => {
            assert_eq!(column, "B");
            assert_eq!(*section, Section::Row { index: 0 });
        }
        other => panic!("expected conversion error, got {other:?}"),
    }
}

#[test]
fn latched_error_is_idempotent() {
    let input = "Age\nabc\n";
    let mut reader = ColumnReader::from_reader(input.as_bytes());
    let _age = reader.int("Age");
    while reader.advance() {}

    let first = reader.error().map(ToString::to_string);
    let second = reader.error().map(ToString::to_string);
    assert!(first.is_some());
    assert_eq!(first, second);

    let err = reader.finish().expect_err("latched error surfaces");
    assert!(matches!(err, Error::Conversion { .. }));
}

#[test]
#[should_panic(expected = "bound after iteration started")]
fn binding_after_first_advance_panics() {
    let mut reader = ColumnReader::from_reader(PEOPLE.as_bytes());
    let _name = reader.text("Name");
    reader.advance();
    let _age = reader.int("Age");
}

#[test]
#[should_panic(expected = "bound after iteration started")]
fn binding_after_exhausted_header_still_panics() {
    let mut reader = ColumnReader::from_reader("".as_bytes());
    assert!(!reader.advance());
    let _age = reader.int("Age");
}

#[test]
fn empty_input_is_exhausted_without_error() {
    let mut reader = ColumnReader::from_reader("".as_bytes());
    let name = reader.text("Name");
    assert!(!reader.advance());
    assert_eq!(reader.state(), ReaderState::Exhausted);
    assert!(reader.error().is_none());
    assert_eq!(reader.position("Name"), Some(Position::Unresolved));
    assert_eq!(name.value(), "");
}

#[test]
fn header_only_input_yields_no_rows() {
    let mut reader = ColumnReader::from_reader("Index,Age,Name\n".as_bytes());
    let _name = reader.text("Name");
    assert!(!reader.advance());
    assert_eq!(reader.state(), ReaderState::Exhausted);
    assert_eq!(reader.position("Name"), Some(Position::Resolved(2)));
    assert_eq!(reader.rows_read(), 0);
}

#[test]
fn header_read_failure_is_latched_and_terminal() {
    let source = ScriptedSource::new()
        .failure("disk gone")
        .record(&["Name"])
        .record(&["Alice"]);
    let mut reader = ColumnReader::new(source);
    let _name = reader.text("Name");

    assert!(!reader.advance());
    assert_eq!(reader.state(), ReaderState::Failed);
    assert!(matches!(reader.error(), Some(Error::Source(_))));
    assert!(reader.header().is_none());

    assert!(!reader.advance());
    let source = reader.into_source();
    assert_eq!(source.reads, 1, "terminal state must not consult the source");
}

#[test]
fn source_error_mid_stream_ends_iteration() {
    let source = ScriptedSource::new()
        .record(&["Name"])
        .record(&["Alice"])
        .failure("truncated")
        .record(&["Bob"]);
    let mut reader = ColumnReader::new(source);
    let name = reader.text("Name");

    assert!(reader.advance());
    assert_eq!(name.value(), "Alice");
    assert!(!reader.advance());
    assert_eq!(reader.state(), ReaderState::Failed);
    assert!(!reader.advance());
    assert_eq!(name.value(), "Alice");
    assert!(reader.error().expect("latched").to_string().contains("truncated"));
}

#[test]
fn later_source_error_does_not_replace_conversion_error() {
    let source = ScriptedSource::new()
        .record(&["Age"])
        .record(&["old"])
        .failure("truncated");
    let mut reader = ColumnReader::new(source);
    let _age = reader.int("Age");

    assert!(reader.advance());
    assert!(!reader.advance());
    assert_eq!(reader.state(), ReaderState::Failed);
    assert!(matches!(reader.error(), Some(Error::Conversion { .. })));
}

#[test]
fn duplicate_declarations_share_a_position() {
    let mut reader = ColumnReader::from_reader(PEOPLE.as_bytes());
    let as_text = reader.text("Age");
    let as_int = reader.int("age");
    assert!(reader.advance());
    assert_eq!(as_text.value(), "52");
    assert_eq!(as_int.value(), 52);

    let bindings: Vec<_> = reader.bindings().collect();
    assert_eq!(
        bindings,
        [
            ("Age", Position::Resolved(1)),
            ("age", Position::Resolved(1))
        ]
    );
}

#[test]
fn no_declared_columns_still_counts_rows() {
    let mut reader = ColumnReader::from_reader(PEOPLE.as_bytes());
    let mut rows = 0;
    while reader.advance() {
        rows += 1;
    }
    assert_eq!(rows, 2);
    assert_eq!(reader.finish().expect("clean read"), 2);
}

#[test]
fn slots_report_scan_errors_through_the_trait() {
    let mut reader = ColumnReader::from_reader("Age\nold\n".as_bytes());
    let age = reader.int("Age");
    assert!(reader.advance());

    let erased: &dyn Scan = &age;
    assert_eq!(erased.last_error().map(|e| e.text), Some("old".to_owned()));

    let mut handle = age.clone();
    handle.scan("9").expect("valid integer");
    assert!(age.last_error().is_none());
    assert_eq!(age.value(), 9);
}
