use std::path::PathBuf;

use querystat::dataset::load_tsv;
use querystat::routes::handle;
use querystat::stats::QueryStatisticCalculator;

fn sample_calculator() -> QueryStatisticCalculator {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("queries_sample.tsv");
    let table = load_tsv(&path).expect("fixture should load");
    QueryStatisticCalculator::new(&table).expect("fixture should validate")
}

#[test]
fn elapsed_time_renders_date_and_three_decimals() {
    let calc = sample_calculator();
    let response = handle(&calc, "/elapsed_time?timestamp=1571356830600");

    assert_eq!(response.status, 200);
    insta::assert_snapshot!(response.body, @"The average elapsed time for all queries on 1571356830600 (18.10.2019) is 3.045 seconds");
}

#[test]
fn rows_per_second_renders_window() {
    let calc = sample_calculator();
    let response = handle(
        &calc,
        "/rows_per_second?start_timestamp=1571356830600&finish_timestamp=1571356838845",
    );

    assert_eq!(response.status, 200);
    insta::assert_snapshot!(response.body, @"The average per second number of rows returned from all queries during 1571356830600 (2019-10-18 00:00:30.600000+00:00) and 1571356838845 (2019-10-18 00:00:38.845000+00:00) is 8.490");
}

#[test]
fn rows_per_thread_renders_window() {
    let calc = sample_calculator();
    let response = handle(
        &calc,
        "/rows_per_thread?start_timestamp=1571356830600&finish_timestamp=1571356838845",
    );

    assert_eq!(response.status, 200);
    insta::assert_snapshot!(response.body, @"The average per thread number of rows returned from all queries during 1571356830600 (2019-10-18 00:00:30.600000+00:00) and 1571356838845 (2019-10-18 00:00:38.845000+00:00) is 5.000");
}

#[test]
fn thread_per_second_renders_window() {
    let calc = sample_calculator();
    let response = handle(
        &calc,
        "/thread_per_second?start_timestamp=1571356830600&finish_timestamp=1571356838845",
    );

    assert_eq!(response.status, 200);
    insta::assert_snapshot!(response.body, @"The average per second number of threads executing at the same during 1571356830600 (2019-10-18 00:00:30.600000+00:00) and 1571356838845 (2019-10-18 00:00:38.845000+00:00) is 0.009");
}

#[test]
fn missing_parameter_is_a_bad_request() {
    let calc = sample_calculator();
    let response = handle(&calc, "/rows_per_thread?start_timestamp=1571356830600");

    assert_eq!(response.status, 400);
    insta::assert_snapshot!(response.body, @r#"Error! "finish_timestamp" GET argument is required"#);
}

#[test]
fn non_integer_parameter_is_a_bad_request() {
    let calc = sample_calculator();
    let response = handle(&calc, "/elapsed_time?timestamp=tomorrow");

    assert_eq!(response.status, 400);
    insta::assert_snapshot!(response.body, @"Error! Wrong input. Exception message: [timestamp: invalid literal for integer timestamp: 'tomorrow': invalid digit found in string]");
}

#[test]
fn out_of_range_timestamp_is_a_bad_request() {
    let calc = sample_calculator();
    let response = handle(&calc, "/elapsed_time?timestamp=1");

    assert_eq!(response.status, 400);
    insta::assert_snapshot!(response.body, @r#"Error! Wrong input. Exception message: [Timestamp "1" should be in the range ["1571356830600","1571443261000"]]"#);
}

#[test]
fn inverted_window_is_a_bad_request() {
    let calc = sample_calculator();
    let response = handle(
        &calc,
        "/rows_per_second?start_timestamp=1571356838845&finish_timestamp=1571356830600",
    );

    assert_eq!(response.status, 400);
    insta::assert_snapshot!(response.body, @r#"Error! Wrong input. Exception message: [Start timestamp "1571356838845" should be less than finish timestamp "1571356830600"]"#);
}

#[test]
fn unknown_path_is_not_found() {
    let calc = sample_calculator();
    let response = handle(&calc, "/median_rows?timestamp=1571356830600");

    assert_eq!(response.status, 404);
    assert_eq!(response.body, "Error! Unknown endpoint \"/median_rows\"");
}

#[test]
fn index_lists_endpoints() {
    let calc = sample_calculator();
    let response = handle(&calc, "/");

    assert_eq!(response.status, 200);
    insta::assert_snapshot!(response.body, @"Endpoints: /elapsed_time?timestamp=<ms> /rows_per_second?start_timestamp=<ms>&finish_timestamp=<ms> /rows_per_thread?start_timestamp=<ms>&finish_timestamp=<ms> /thread_per_second?start_timestamp=<ms>&finish_timestamp=<ms>");
}

#[test]
fn empty_day_renders_nan() {
    let calc = QueryStatisticCalculator::from_events(vec![
        querystat::models::RawQueryEvent::start(1, 82_800_000),
        querystat::models::RawQueryEvent::finish(1, 262_800_000, 5, "1"),
    ])
    .expect("calculator should build");
    let response = handle(&calc, "/elapsed_time?timestamp=172800000");

    assert_eq!(response.status, 200);
    insta::assert_snapshot!(response.body, @"The average elapsed time for all queries on 172800000 (03.01.1970) is nan seconds");
}
