use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub ranking_requests_total: IntCounterVec,
    pub ranking_latency_seconds: HistogramVec,
    pub claims_total: IntCounterVec,
    pub pickups_verified_total: IntCounter,
    pub pending_donations: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let ranking_requests_total = IntCounterVec::new(
            Opts::new("ranking_requests_total", "Total ranking requests by view"),
            &["view"],
        )
        .expect("valid ranking_requests_total metric");

        let ranking_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "ranking_latency_seconds",
                "Latency of scoring and ordering donations in seconds",
            ),
            &["view"],
        )
        .expect("valid ranking_latency_seconds metric");

        let claims_total = IntCounterVec::new(
            Opts::new("claims_total", "Total donation claims by outcome"),
            &["outcome"],
        )
        .expect("valid claims_total metric");

        let pickups_verified_total =
            IntCounter::new("pickups_verified_total", "Claimed donations confirmed as collected")
                .expect("valid pickups_verified_total metric");

        let pending_donations =
            IntGauge::new("pending_donations", "Donations currently awaiting a claim")
                .expect("valid pending_donations metric");

        registry
            .register(Box::new(ranking_requests_total.clone()))
            .expect("register ranking_requests_total");
        registry
            .register(Box::new(ranking_latency_seconds.clone()))
            .expect("register ranking_latency_seconds");
        registry
            .register(Box::new(claims_total.clone()))
            .expect("register claims_total");
        registry
            .register(Box::new(pickups_verified_total.clone()))
            .expect("register pickups_verified_total");
        registry
            .register(Box::new(pending_donations.clone()))
            .expect("register pending_donations");

        Self {
            registry,
            ranking_requests_total,
            ranking_latency_seconds,
            claims_total,
            pickups_verified_total,
            pending_donations,
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
