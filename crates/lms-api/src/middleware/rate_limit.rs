use axum::Router;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

/// Limits for payment-affecting endpoints (enrollment verification)
pub const ENROLLMENT_PER_SECOND: u64 = 2;
pub const ENROLLMENT_BURST: u32 = 5;

/// Limits for inbound provider webhooks; providers burst on retries
pub const WEBHOOK_PER_SECOND: u64 = 20;
pub const WEBHOOK_BURST: u32 = 50;

/// Limits for authenticated writes (progress, quiz, engagement)
pub const WRITE_PER_SECOND: u64 = 10;
pub const WRITE_BURST: u32 = 20;

/// Apply a per-client-IP rate limit to every route of `router`.
///
/// Clients are keyed by `X-Forwarded-For` / `X-Real-IP` when present and by
/// the peer address otherwise.
pub fn with_rate_limit<S>(router: Router<S>, per_second: u64, burst: u32) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let governor_conf = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(per_second)
        .burst_size(burst)
        .use_headers()
        .finish();

    match governor_conf {
        Some(conf) => router.layer(GovernorLayer::new(conf)),
        None => {
            tracing::error!(per_second, burst, "invalid rate limit configuration, limit disabled");
            router
        }
    }
}
