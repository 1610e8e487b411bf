//! Earnings arithmetic
//!
//! For every block the pool found in the window, the miner's share is their
//! graph rate over the pool's, both normalised to C29 graphs:
//!
//! ```text
//! scale  = 2^(1+31-24) * 31 / max(29, secondary_scaling)
//! miner  = c29 + c31 * scale
//! pool   = sum(C29 gps) + sum(other gps) * scale
//! reward = miner / pool * 60 + fee * 1e-9
//! ```

use std::ops::RangeInclusive;

use pool_client::{BlockStats, PoolBlock, PoolClient, PoolClientError, PoolGraphRates};
use tracing::{debug, warn};

/// Blocks mined per day at one-minute block time
pub const BLOCKS_PER_DAY: u64 = 1440;
/// Longest window the pool API is asked about
pub const MAX_DAYS: u32 = 31;

const BLOCK_REWARD: f64 = 60.0;
const NANO: f64 = 1e-9;
const SECONDARY_EDGE_BITS: u32 = 29;

#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("Please limit your query to 31 days to prevent excess load on our pool API")]
    TooManyDays(u32),

    #[error("Number of days must be at least 1")]
    NoDays,

    #[error("Graph rates must be non-negative numbers, got {0}")]
    InvalidRate(f64),

    #[error(transparent)]
    Pool(#[from] PoolClientError),
}

/// The miner's own graph rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinerRates {
    pub c29: f64,
    pub c31: f64,
}

impl MinerRates {
    pub fn new(c29: f64, c31: f64) -> Result<Self, EstimateError> {
        for rate in [c29, c31] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(EstimateError::InvalidRate(rate));
            }
        }
        Ok(Self { c29, c31 })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockReward {
    pub height: u64,
    pub reward: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub days: u32,
    pub blocks: Vec<BlockReward>,
}

impl Estimate {
    pub fn total(&self) -> f64 {
        self.blocks.iter().map(|b| b.reward).sum()
    }

    pub fn daily_average(&self) -> f64 {
        self.total() / f64::from(self.days)
    }
}

pub fn validate_days(days: u32) -> Result<u32, EstimateError> {
    match days {
        0 => Err(EstimateError::NoDays),
        d if d > MAX_DAYS => Err(EstimateError::TooManyDays(d)),
        d => Ok(d),
    }
}

/// Heights covered by the last `days` days up to `tip`
pub fn block_window(tip: u64, days: u32) -> RangeInclusive<u64> {
    tip.saturating_sub(BLOCKS_PER_DAY * u64::from(days))..=tip
}

/// Pool blocks inside `window`, oldest first
pub fn blocks_in_window(blocks: &[PoolBlock], window: &RangeInclusive<u64>) -> Vec<u64> {
    let mut heights: Vec<u64> = blocks
        .iter()
        .map(|b| b.height)
        .filter(|h| window.contains(h))
        .collect();
    heights.sort_unstable();
    heights
}

/// C31 graph value in C29 graphs at this secondary scaling
pub fn secondary_scale(secondary_scaling: u64) -> f64 {
    let numerator = (1u64 << (1 + 31 - 24)) * 31;
    numerator as f64 / secondary_scaling.max(29) as f64
}

/// The miner's theoretical reward for one pool block, in coins
pub fn block_reward(miner: MinerRates, stats: &BlockStats, pool: &PoolGraphRates) -> f64 {
    let scale = secondary_scale(stats.secondary_scaling);
    let miner_value = miner.c29 + miner.c31 * scale;
    let pool_value: f64 = pool
        .gps
        .iter()
        .map(|rate| {
            if rate.edge_bits == SECONDARY_EDGE_BITS {
                rate.gps
            } else {
                rate.gps * scale
            }
        })
        .sum();

    if pool_value <= 0.0 {
        warn!("Pool graph rate at block {} is zero, skipping it", stats.height);
        return 0.0;
    }
    miner_value / pool_value * BLOCK_REWARD + stats.fee as f64 * NANO
}

/// Estimate earnings over the last `days` days. `on_block` sees each block
/// as soon as it is valued.
pub async fn estimate<F>(
    client: &PoolClient,
    days: u32,
    miner: MinerRates,
    mut on_block: F,
) -> Result<Estimate, EstimateError>
where
    F: FnMut(&BlockReward),
{
    let days = validate_days(days)?;
    let tip = client.get_chain_height().await?;
    let window = block_window(tip, days);
    let heights = blocks_in_window(&client.get_pool_blocks().await?, &window);
    debug!(
        "{} pool blocks between {} and {}",
        heights.len(),
        window.start(),
        window.end()
    );

    let mut blocks = Vec::with_capacity(heights.len());
    for height in heights {
        let stats = client.get_block_stats(height).await?;
        let rates = client.get_pool_graph_rates(height).await?;
        let reward = BlockReward {
            height,
            reward: block_reward(miner, &stats, &rates),
        };
        on_block(&reward);
        blocks.push(reward);
    }

    Ok(Estimate { days, blocks })
}

#[cfg(test)]
mod tests {
    use axum::{extract::Path, routing::get, Json, Router};
    use pool_client::GraphRate;
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn rates(pairs: &[(u32, f64)]) -> PoolGraphRates {
        PoolGraphRates {
            gps: pairs
                .iter()
                .map(|&(edge_bits, gps)| GraphRate { edge_bits, gps })
                .collect(),
        }
    }

    #[test]
    fn test_secondary_scale() {
        assert!(close(secondary_scale(7936), 1.0));
        assert!(close(secondary_scale(0), 7936.0 / 29.0));
        assert!(close(secondary_scale(29), secondary_scale(3)));
    }

    #[test]
    fn test_block_reward() {
        let stats = BlockStats {
            height: 100,
            secondary_scaling: 7936,
            fee: 2_000_000_000,
        };
        let miner = MinerRates::new(10.0, 5.0).unwrap();
        let reward = block_reward(miner, &stats, &rates(&[(29, 100.0), (31, 50.0)]));
        assert!(close(reward, 15.0 / 150.0 * 60.0 + 2.0));
    }

    #[test]
    fn test_zero_pool_rate_earns_nothing() {
        let stats = BlockStats {
            height: 100,
            secondary_scaling: 1856,
            fee: 5_000_000,
        };
        let miner = MinerRates::new(1.0, 0.0).unwrap();
        assert_eq!(block_reward(miner, &stats, &rates(&[])), 0.0);
    }

    #[test]
    fn test_days_limits() {
        assert!(matches!(validate_days(0), Err(EstimateError::NoDays)));
        assert_eq!(validate_days(31).unwrap(), 31);
        assert!(matches!(validate_days(32), Err(EstimateError::TooManyDays(32))));
    }

    #[test]
    fn test_invalid_rates() {
        assert!(MinerRates::new(-1.0, 0.0).is_err());
        assert!(MinerRates::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_window_filters_and_sorts() {
        let window = block_window(10_000, 2);
        assert_eq!(window, 7_120..=10_000);
        assert_eq!(block_window(100, 1), 0..=100);

        let blocks: Vec<PoolBlock> = [9_990, 7_000, 7_120, 10_001, 8_000]
            .into_iter()
            .map(|height| PoolBlock { height })
            .collect();
        assert_eq!(blocks_in_window(&blocks, &window), vec![7_120, 8_000, 9_990]);
    }

    #[test]
    fn test_totals() {
        let estimate = Estimate {
            days: 2,
            blocks: vec![
                BlockReward { height: 1, reward: 1.5 },
                BlockReward { height: 2, reward: 2.5 },
            ],
        };
        assert!(close(estimate.total(), 4.0));
        assert!(close(estimate.daily_average(), 2.0));
    }

    async fn spawn_stats_stub() -> String {
        let app = Router::new()
            .route("/grin/block/height", get(|| async { Json(json!({ "height": 3000 })) }))
            .route(
                "/pool/blocks/0,1440/height",
                get(|| async { Json(json!([{ "height": 2990 }, { "height": 1000 }, { "height": 2000 }])) }),
            )
            .route(
                "/grin/block/{height}/height,secondary_scaling,fee",
                get(|Path(height): Path<u64>| async move {
                    Json(json!({ "height": height, "secondary_scaling": 7936, "fee": 0 }))
                }),
            )
            .route(
                "/pool/stat/{height}/gps",
                get(|| async { Json(json!({ "gps": [{ "edge_bits": 29, "gps": 90.0 }, { "edge_bits": 31, "gps": 30.0 }] })) }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_estimate_against_pool() {
        let url = spawn_stats_stub().await;
        let client = PoolClient::new(&url);
        let miner = MinerRates::new(12.0, 0.0).unwrap();

        let mut seen = Vec::new();
        let estimate = estimate(&client, 1, miner, |b| seen.push(b.height)).await.unwrap();

        assert_eq!(seen, vec![2000, 2990]);
        assert_eq!(estimate.blocks.len(), 2);
        assert!(close(estimate.blocks[0].reward, 12.0 / 120.0 * 60.0));
        assert!(close(estimate.daily_average(), 12.0));
    }

    #[tokio::test]
    async fn test_estimate_rejects_long_windows_before_calling_the_pool() {
        let client = PoolClient::new("http://127.0.0.1:1");
        let miner = MinerRates::new(1.0, 1.0).unwrap();
        let err = estimate(&client, 40, miner, |_| {}).await.unwrap_err();
        assert!(matches!(err, EstimateError::TooManyDays(40)));
    }
}
