use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Start,
    Finish,
}

impl QueryStatus {
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Start),
            1 => Some(Self::Finish),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Start => 0,
            Self::Finish => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Finish => "finish",
        }
    }
}

/// One row of the query log as it appears in the dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQueryEvent {
    pub query_id: i64,
    pub status: i64,
    pub time: i64,
    pub rows: i64,
    pub threads: String,
}

impl RawQueryEvent {
    #[must_use]
    pub fn start(query_id: i64, time: i64) -> Self {
        Self {
            query_id,
            status: QueryStatus::Start.code(),
            time,
            rows: 0,
            threads: String::new(),
        }
    }

    #[must_use]
    pub fn finish(query_id: i64, time: i64, rows: i64, threads: impl Into<String>) -> Self {
        Self {
            query_id,
            status: QueryStatus::Finish.code(),
            time,
            rows,
            threads: threads.into(),
        }
    }

    #[must_use]
    pub const fn query_status(&self) -> Option<QueryStatus> {
        QueryStatus::from_code(self.status)
    }
}

/// A query whose start and finish events were paired on `query_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MergedQueryRecord {
    pub query_id: i64,
    pub start: i64,
    pub finish: i64,
    pub rows: i64,
    pub threads: String,
}

impl MergedQueryRecord {
    /// Widened so that spans across the whole `i64` range do not overflow.
    #[must_use]
    pub const fn duration_ms(&self) -> i128 {
        self.finish as i128 - self.start as i128
    }

    /// Thread ids listed on the finish event. Blank pieces are skipped.
    pub fn thread_ids(&self) -> impl Iterator<Item = &str> {
        self.threads
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.thread_ids().count()
    }

    #[must_use]
    pub const fn within_window(&self, start: i64, finish: i64) -> bool {
        self.start >= start && self.finish <= finish
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DatasetBounds {
    pub min_start: i64,
    pub max_finish: i64,
}

impl DatasetBounds {
    #[must_use]
    pub const fn contains(self, timestamp: i64) -> bool {
        self.min_start <= timestamp && timestamp <= self.max_finish
    }
}

#[cfg(test)]
mod tests {
    use super::{DatasetBounds, MergedQueryRecord, QueryStatus, RawQueryEvent};

    fn record(threads: &str) -> MergedQueryRecord {
        MergedQueryRecord {
            query_id: 1,
            start: 1_000,
            finish: 2_500,
            rows: 4,
            threads: threads.to_string(),
        }
    }

    #[test]
    fn status_codes_map_to_event_kinds() {
        assert_eq!(QueryStatus::from_code(0), Some(QueryStatus::Start));
        assert_eq!(QueryStatus::from_code(1), Some(QueryStatus::Finish));
        assert_eq!(QueryStatus::from_code(2), None);
        assert_eq!(RawQueryEvent::finish(1, 5, 1, "7").query_status(), Some(QueryStatus::Finish));
    }

    #[test]
    fn thread_tokens_are_trimmed_and_blank_pieces_skipped() {
        let query = record(" 3, 4,,5 ");
        let ids = query.thread_ids().collect::<Vec<_>>();
        assert_eq!(ids, vec!["3", "4", "5"]);
        assert_eq!(record("").thread_count(), 0);
        assert_eq!(record("9").thread_count(), 1);
    }

    #[test]
    fn window_check_is_inclusive_on_both_ends() {
        let query = record("1");
        assert_eq!(query.duration_ms(), 1_500);
        assert!(query.within_window(1_000, 2_500));
        assert!(!query.within_window(1_001, 2_500));
        assert!(!query.within_window(1_000, 2_499));
    }

    #[test]
    fn bounds_accept_their_endpoints() {
        let bounds = DatasetBounds {
            min_start: 10,
            max_finish: 20,
        };
        assert!(bounds.contains(10));
        assert!(bounds.contains(20));
        assert!(!bounds.contains(9));
        assert!(!bounds.contains(21));
    }

    #[test]
    fn duration_spans_the_full_timestamp_range() {
        let query = MergedQueryRecord {
            query_id: 1,
            start: i64::MIN,
            finish: i64::MAX,
            rows: 0,
            threads: String::new(),
        };
        assert_eq!(query.duration_ms(), i128::from(u64::MAX));
    }
}
