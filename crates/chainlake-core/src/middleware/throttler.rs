//! Per-client weighted token-bucket admission control.
//!
//! Each method carries a weight in RCUs (read capacity units); admission
//! charges the caller's bucket by that weight without blocking or queuing.
//! Buckets refill continuously at the configured per-second rate up to the
//! burst capacity.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Instant;

use dashmap::DashMap;

use crate::auth::{AuthClients, ResolvedClient};

/// Refill rate and capacity of one client bucket, in RCUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub rcu_per_second: u32,
    pub burst: u32,
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Maps caller identities to independent token buckets.
///
/// A configured `(rate, burst)` applies only to callers that proved the
/// identity with a bearer token; a self-declared client id is a label, not
/// a budget, and is charged against the default limit. Bearer-backed
/// buckets live in their own key namespace so a self-declared id can
/// neither spend from nor drain the authenticated client's bucket.
/// Tracked callers are capped to bound memory under id spoofing.
pub struct Throttler {
    buckets: DashMap<String, TokenBucket>,
    limits: HashMap<String, RateLimit>,
    default_limit: RateLimit,
    max_buckets: usize,
}

impl Throttler {
    const DEFAULT_MAX_BUCKETS: usize = 100_000;

    pub fn new(default_limit: RateLimit, clients: &AuthClients) -> Self {
        let limits = clients
            .iter()
            .map(|client| {
                (
                    client.client_id.clone(),
                    RateLimit {
                        rcu_per_second: client.rcu_per_second,
                        burst: client.burst,
                    },
                )
            })
            .collect();

        Self {
            buckets: DashMap::new(),
            limits,
            default_limit,
            max_buckets: Self::DEFAULT_MAX_BUCKETS,
        }
    }

    /// Charges `n` RCUs against the caller's bucket. Non-blocking; returns
    /// whether the request is admitted. An admitted request has paid its
    /// cost regardless of what happens downstream.
    #[must_use]
    pub fn allow_n(&self, client: &ResolvedClient, n: u32) -> bool {
        let (limit, key) = if client.authenticated {
            (
                self.limits.get(&client.client_id).copied().unwrap_or(self.default_limit),
                // Header sanitization strips ':', so a self-declared id can
                // never collide with this namespace.
                Cow::Owned(format!("bearer:{}", client.client_id)),
            )
        } else {
            (self.default_limit, Cow::Borrowed(client.client_id.as_str()))
        };

        let now = Instant::now();

        if let Some(mut bucket) = self.buckets.get_mut(key.as_ref()) {
            return Self::charge(&mut bucket, now, limit, n);
        }

        // Reject new callers at capacity rather than evicting live buckets.
        if self.buckets.len() >= self.max_buckets {
            return false;
        }

        let mut bucket = self
            .buckets
            .entry(key.into_owned())
            .or_insert_with(|| TokenBucket { tokens: f64::from(limit.burst), last_refill: now });
        Self::charge(&mut bucket, now, limit, n)
    }

    fn charge(bucket: &mut TokenBucket, now: Instant, limit: RateLimit, n: u32) -> bool {
        let elapsed = now.duration_since(bucket.last_refill);
        let refill = elapsed.as_secs_f64() * f64::from(limit.rcu_per_second);
        if refill > 0.0 {
            bucket.tokens = (bucket.tokens + refill).min(f64::from(limit.burst));
            bucket.last_refill = now;
        }

        let cost = f64::from(n);
        if bucket.tokens >= cost {
            bucket.tokens -= cost;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
