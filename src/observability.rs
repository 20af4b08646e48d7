use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("seu_blusa.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("seu_blusa.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("seu_blusa.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("seu_blusa.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("seu_blusa.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("seu_blusa.stream.bytes");
pub(crate) static STREAM_INTERRUPTS: Counter = Counter::new("seu_blusa.stream.interrupts");

pub(crate) static INGEST_LOADS: Counter = Counter::new("seu_blusa.ingest.loads");
pub(crate) static INGEST_FAILURES: Counter = Counter::new("seu_blusa.ingest.failures");
pub(crate) static INGEST_BYTES: Counter = Counter::new("seu_blusa.ingest.bytes");
pub(crate) static INGEST_DURATION: Moments = Moments::new("seu_blusa.ingest.duration_seconds");

pub(crate) static SESSION_TURNS: Counter = Counter::new("seu_blusa.session.turns");
pub(crate) static SESSION_RESTARTS: Counter = Counter::new("seu_blusa.session.restarts");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_INTERRUPTS);

    collector.register_counter(&INGEST_LOADS);
    collector.register_counter(&INGEST_FAILURES);
    collector.register_counter(&INGEST_BYTES);
    collector.register_moments(&INGEST_DURATION);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_RESTARTS);
}
