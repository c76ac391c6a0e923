use chrono::Utc;
use redis::RedisResult;
use tracing::info;

/// Redis handle used for per-client request throttling.
///
/// Seat status is never cached here: liveness must be recomputed from the
/// ledger on every read.
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        info!("Redis client configured");
        Ok(Self { client })
    }

    /// Fixed-window counter. `Ok(false)` once `limit` requests were seen in the window.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let bucket = window_key(key, window_seconds, Utc::now().timestamp());

        // The bucket name changes every window, so re-arming its TTL never extends the window
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(&bucket, 1)
            .expire(&bucket, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

/// Counter key for the window containing `now` (unix seconds).
fn window_key(key: &str, window_seconds: i64, now: i64) -> String {
    let window = window_seconds.max(1);
    format!("{}:{}", key, now.div_euclid(window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_in_one_window_share_a_counter() {
        let start = 1_700_000_040; // aligned to a 60s window
        assert_eq!(window_key("rate_limit:10.0.0.1", 60, start), window_key("rate_limit:10.0.0.1", 60, start + 59));
    }

    #[test]
    fn test_counter_resets_when_window_ends() {
        let start = 1_700_000_040;
        let blocked_at = window_key("rate_limit:10.0.0.1", 60, start + 10);

        // Steady traffic after going over the limit still lands in a fresh window
        for offset in [65, 110, 170] {
            assert_ne!(window_key("rate_limit:10.0.0.1", 60, start + offset), blocked_at);
        }
        assert_ne!(
            window_key("rate_limit:10.0.0.1", 60, start + 65),
            window_key("rate_limit:10.0.0.1", 60, start + 125)
        );
    }

    #[test]
    fn test_clients_never_share_a_window() {
        let now = 1_700_000_040;
        assert_ne!(window_key("rate_limit:10.0.0.1", 60, now), window_key("rate_limit:10.0.0.2", 60, now));
    }
}
