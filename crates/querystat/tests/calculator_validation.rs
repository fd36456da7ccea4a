use querystat::dataset::{QueryTable, read_tsv};
use querystat::models::RawQueryEvent;
use querystat::stats::{QueryStatisticCalculator, RangeError, SchemaError};

const HEADER: &str = "query_id\tstatus\ttime\trows\tthreads";

fn table(input: &str) -> QueryTable {
    read_tsv(input.as_bytes()).expect("tsv should parse")
}

fn two_query_calculator() -> QueryStatisticCalculator {
    QueryStatisticCalculator::from_events(vec![
        RawQueryEvent::start(1, 1_000),
        RawQueryEvent::finish(1, 4_000, 10, "1,2"),
        RawQueryEvent::start(2, 2_000),
        RawQueryEvent::finish(2, 9_000, 6, "2,3"),
    ])
    .expect("calculator should build")
}

#[test]
fn empty_input_is_rejected() {
    let err = QueryStatisticCalculator::new(&table("")).expect_err("no columns at all");
    assert!(matches!(err, SchemaError::ColumnNames { .. }), "got {err}");
}

#[test]
fn wrong_column_name_is_rejected() {
    let input = "query_id_WRONG\tstatus\ttime\trows\tthreads\n1\t2\t3\t4\t5,6,7\n";
    let err = QueryStatisticCalculator::new(&table(input)).expect_err("name mismatch");

    assert!(matches!(err, SchemaError::ColumnNames { .. }));
    assert!(err.to_string().contains("'query_id_WRONG'"), "got {err}");
}

#[test]
fn missing_column_is_rejected() {
    let input = "query_id\tstatus\ttime\trows\n1\t0\t3\t4\n";
    let err = QueryStatisticCalculator::new(&table(input)).expect_err("column missing");
    assert!(matches!(err, SchemaError::ColumnNames { .. }));
}

#[test]
fn header_without_rows_is_rejected_on_types() {
    let err = QueryStatisticCalculator::new(&table(&format!("{HEADER}\n")))
        .expect_err("untyped columns");

    match err {
        SchemaError::ColumnTypes { expected, actual } => {
            assert_eq!(expected.len(), 5);
            assert_eq!(actual.len(), 5);
        }
        other => panic!("expected column type error, got {other:?}"),
    }
}

#[test]
fn non_integer_time_is_rejected_on_types() {
    let input = format!("{HEADER}\n1\t0\tyesterday\t0\t\n1\t1\t20\t4\t1\n");
    let err = QueryStatisticCalculator::new(&table(&input)).expect_err("time must be integer");
    assert!(matches!(err, SchemaError::ColumnTypes { .. }));
}

#[test]
fn well_typed_table_without_pairs_is_rejected() {
    let input = format!("{HEADER}\n1\t2\t3\t4\t5,6,7\n");
    let err = QueryStatisticCalculator::new(&table(&input)).expect_err("nothing to merge");
    assert_eq!(err, SchemaError::EmptyDataset);
}

#[test]
fn unmatched_rows_are_dropped_not_rejected() {
    let input = format!(
        "{HEADER}\n1\t0\t100\t0\t\n1\t1\t200\t3\t1\n2\t0\t50\t0\t\n3\t1\t900\t8\t2\n"
    );
    let calc = QueryStatisticCalculator::new(&table(&input)).expect("unmatched ids are dropped");

    assert_eq!(calc.records().len(), 1);
    assert_eq!(calc.records()[0].query_id, 1);
    assert_eq!(calc.bounds().min_start, 100);
    assert_eq!(calc.bounds().max_finish, 200);
}

#[test]
fn timestamp_outside_bounds_is_rejected() {
    let calc = two_query_calculator();

    let err = calc.check_timestamp(1).expect_err("below min start");
    assert_eq!(
        err,
        RangeError::OutOfBounds {
            timestamp: 1,
            min_start: 1_000,
            max_finish: 9_000
        }
    );

    let err = calc.check_timestamp(i64::MAX).expect_err("above max finish");
    assert!(matches!(err, RangeError::OutOfBounds { .. }));
}

#[test]
fn bounds_themselves_are_accepted() {
    let calc = two_query_calculator();

    calc.check_timestamp(1_000).expect("min start is valid");
    calc.check_timestamp(9_000).expect("max finish is valid");
    calc.check_range(1_000, 9_000).expect("full window is valid");
}

#[test]
fn equal_endpoints_are_rejected() {
    let calc = two_query_calculator();

    let err = calc.check_range(5_000, 5_000).expect_err("empty window");
    assert_eq!(err, RangeError::EmptyWindow { timestamp: 5_000 });
    assert!(
        err.to_string()
            .contains("should be not equal. The current value is \"5000\"")
    );
}

#[test]
fn inverted_endpoints_are_rejected() {
    let calc = two_query_calculator();

    let err = calc.check_range(6_000, 5_000).expect_err("inverted window");
    assert_eq!(
        err,
        RangeError::InvertedWindow {
            start: 6_000,
            finish: 5_000
        }
    );
}

#[test]
fn every_query_validates_before_computing() {
    let calc = two_query_calculator();

    assert!(calc.average_elapsed_seconds_on_date(0).is_err());
    assert!(calc.average_rows_per_second(2_000, 2_000).is_err());
    assert!(calc.average_rows_per_thread(3_000, 2_000).is_err());
    assert!(calc.average_threads_per_second(0, 2_000).is_err());
}

#[test]
fn empty_day_yields_nan_elapsed_time() {
    // One query spanning three UTC days leaves the middle day empty.
    let day = 86_400_000;
    let calc = QueryStatisticCalculator::from_events(vec![
        RawQueryEvent::start(1, day - 3_600_000),
        RawQueryEvent::finish(1, 3 * day + 3_600_000, 5, "1"),
    ])
    .expect("calculator should build");

    let average = calc
        .average_elapsed_seconds_on_date(2 * day)
        .expect("middle day is in range");
    assert!(average.is_nan());
}

#[test]
fn thread_union_counts_shared_threads_once() {
    let calc = two_query_calculator();

    // threads {1,2} and {2,3}: 16 rows over 3 distinct threads
    let per_thread = calc
        .average_rows_per_thread(1_000, 9_000)
        .expect("window is valid");
    assert!((per_thread - 16.0 / 3.0).abs() < 1e-12);

    // (3000 ms * 2 + 7000 ms * 2) / 8000 ms / 1000
    let threads_per_second = calc
        .average_threads_per_second(1_000, 9_000)
        .expect("window is valid");
    assert!((threads_per_second - 20_000.0 / 8_000.0 / 1_000.0).abs() < 1e-15);
}

#[test]
fn extreme_timestamps_do_not_overflow() {
    let calc = QueryStatisticCalculator::from_events(vec![
        RawQueryEvent::start(1, -6_000_000_000_000_000_000),
        RawQueryEvent::finish(1, 6_000_000_000_000_000_000, 1, "1"),
    ])
    .expect("calculator should build");

    // one thread busy for the whole window
    let threads_per_second = calc
        .average_threads_per_second(-6_000_000_000_000_000_000, 6_000_000_000_000_000_000)
        .expect("window is valid");
    assert!((threads_per_second - 0.001).abs() < 1e-15);

    let rows_per_second = calc
        .average_rows_per_second(-6_000_000_000_000_000_000, 6_000_000_000_000_000_000)
        .expect("window is valid");
    assert!(rows_per_second.is_finite() && rows_per_second > 0.0);
}

#[test]
fn lowest_timestamp_day_is_selectable() {
    let calc = QueryStatisticCalculator::from_events(vec![
        RawQueryEvent::start(1, i64::MIN),
        RawQueryEvent::finish(1, i64::MIN + 1_500, 2, "1"),
    ])
    .expect("calculator should build");

    let average = calc
        .average_elapsed_seconds_on_date(i64::MIN)
        .expect("lowest timestamp is in range");
    assert!((average - 1.5).abs() < 1e-12);
}
