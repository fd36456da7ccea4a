pub mod query_event;
pub mod response_envelope;

pub use query_event::{DatasetBounds, MergedQueryRecord, QueryStatus, RawQueryEvent};
pub use response_envelope::{
    EnvelopeCommandFailure, RESPONSE_ENVELOPE_SCHEMA_VERSION, ResponseEnvelope,
    ResponseEnvelopeError, StatisticPayload, statistic_payload_schema,
};
