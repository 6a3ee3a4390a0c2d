// Prometheus metrics definitions for the land backend.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Rooms currently registered in the directory.
    pub static ref ACTIVE_ROOMS: IntGauge =
        IntGauge::new("land_active_rooms", "Rooms currently registered").unwrap();

    /// Live WebSocket connections.
    pub static ref CONNECTED_WEBSOCKETS: IntGauge =
        IntGauge::new("land_connected_websockets", "Live WebSocket connections").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total rooms created.
    pub static ref ROOMS_CREATED_TOTAL: IntCounter =
        IntCounter::new("land_rooms_created_total", "Total rooms created").unwrap();

    /// Total rooms whose timer ran out.
    pub static ref ROOMS_COMPLETED_TOTAL: IntCounter = IntCounter::new(
        "land_rooms_completed_total",
        "Total rooms that played to the end of their timer",
    )
    .unwrap();

    /// Total messages queued for WebSocket clients.
    pub static ref WEBSOCKET_MESSAGES_SENT_TOTAL: IntCounter = IntCounter::new(
        "land_websocket_messages_sent_total",
        "Total WebSocket messages queued for clients",
    )
    .unwrap();

    /// Total messages dropped because a client's outbound queue was full.
    pub static ref WEBSOCKET_MESSAGES_DROPPED_TOTAL: IntCounter = IntCounter::new(
        "land_websocket_messages_dropped_total",
        "Total WebSocket messages dropped for slow clients",
    )
    .unwrap();

    /// Total inbound messages that failed to decode.
    pub static ref PROTOCOL_ERRORS_TOTAL: IntCounter = IntCounter::new(
        "land_protocol_errors_total",
        "Inbound client messages that failed to decode",
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Per-tick processing time in milliseconds.
    pub static ref ROOM_TICK_DURATION_MS: Histogram = Histogram::with_opts(
        HistogramOpts::new("land_room_tick_duration_ms", "Per-tick processing time in ms")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 25.0]),
    )
    .unwrap();

    /// Time from room creation until it ended or emptied.
    pub static ref ROOM_LIFETIME_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("land_room_lifetime_seconds", "Room lifetime in seconds")
            .buckets(vec![1.0, 10.0, 30.0, 60.0, 120.0, 180.0, 240.0, 600.0]),
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Safe to call more than once;
/// collectors that are already registered are skipped.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ACTIVE_ROOMS.clone()),
        Box::new(CONNECTED_WEBSOCKETS.clone()),
        Box::new(ROOMS_CREATED_TOTAL.clone()),
        Box::new(ROOMS_COMPLETED_TOTAL.clone()),
        Box::new(WEBSOCKET_MESSAGES_SENT_TOTAL.clone()),
        Box::new(WEBSOCKET_MESSAGES_DROPPED_TOTAL.clone()),
        Box::new(PROTOCOL_ERRORS_TOTAL.clone()),
        Box::new(ROOM_TICK_DURATION_MS.clone()),
        Box::new(ROOM_LIFETIME_SECONDS.clone()),
    ];

    for c in collectors {
        match REGISTRY.register(c) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => tracing::warn!("Failed to register metric: {e}"),
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
