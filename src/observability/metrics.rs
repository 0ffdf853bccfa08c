use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub drivers_registered_total: IntCounter,
    pub rides_total: IntCounterVec,
    pub matches_total: IntCounterVec,
    pub match_latency_seconds: HistogramVec,
    pub escrow_held: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let drivers_registered_total = IntCounter::new(
            "drivers_registered_total",
            "Total drivers ever registered",
        )
        .expect("valid drivers_registered_total metric");

        let rides_total = IntCounterVec::new(
            Opts::new("rides_total", "Ride lifecycle transitions by status"),
            &["status"],
        )
        .expect("valid rides_total metric");

        let matches_total = IntCounterVec::new(
            Opts::new("matches_total", "Total match attempts by outcome"),
            &["outcome"],
        )
        .expect("valid matches_total metric");

        let match_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "match_latency_seconds",
                "Latency of match processing in seconds",
            ),
            &["outcome"],
        )
        .expect("valid match_latency_seconds metric");

        let escrow_held = IntGauge::new("escrow_held", "Total funds currently held in escrow")
            .expect("valid escrow_held metric");

        registry
            .register(Box::new(drivers_registered_total.clone()))
            .expect("register drivers_registered_total");
        registry
            .register(Box::new(rides_total.clone()))
            .expect("register rides_total");
        registry
            .register(Box::new(matches_total.clone()))
            .expect("register matches_total");
        registry
            .register(Box::new(match_latency_seconds.clone()))
            .expect("register match_latency_seconds");
        registry
            .register(Box::new(escrow_held.clone()))
            .expect("register escrow_held");

        Self {
            registry,
            drivers_registered_total,
            rides_total,
            matches_total,
            match_latency_seconds,
            escrow_held,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
