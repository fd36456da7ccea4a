use std::path::PathBuf;

use querystat::cli::commands::batch::{BatchReport, answer_requests};
use querystat::dataset::load_tsv;
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
fn answers_every_request_against_one_dataset() {
    let calc = sample_calculator();
    let input = "\
# reference window
/rows_per_thread?start_timestamp=1571356830600&finish_timestamp=1571356838845

/elapsed_time?timestamp=1
/elapsed_time
/elapsed_time?timestamp=1571356830600
";
    let mut output = Vec::new();

    let report = answer_requests(&calc, input.as_bytes(), &mut output).expect("batch should run");
    assert_eq!(
        report,
        BatchReport {
            requests: 4,
            answered: 2,
            rejected: 2,
        }
    );

    let rendered = String::from_utf8(output).expect("output should be utf-8");
    let lines = rendered.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("200\tThe average per thread number of rows"));
    assert!(lines[0].ends_with("is 5.000"));
    assert!(lines[1].starts_with("400\tError! Wrong input."));
    assert_eq!(lines[2], "400\tError! \"timestamp\" GET argument is required");
    assert!(lines[3].ends_with("is 3.045 seconds"));
}

#[test]
fn rejected_requests_do_not_stop_the_batch() {
    let calc = sample_calculator();
    let input = "/nope\n/thread_per_second?start_timestamp=x&finish_timestamp=y\n/\n";
    let mut output = Vec::new();

    let report = answer_requests(&calc, input.as_bytes(), &mut output).expect("batch should run");
    assert_eq!(report.requests, 3);
    assert_eq!(report.rejected, 2);
    assert_eq!(report.answered, 1);

    let rendered = String::from_utf8(output).expect("output should be utf-8");
    assert!(rendered.starts_with("404\t"));
    assert!(rendered.contains("400\tError! Wrong input. Exception message: [start_timestamp: "));
}
