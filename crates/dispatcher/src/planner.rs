//! Batch planner - splits resolved targets into invocation-sized batches
//!
//! Pure and synchronous. Batches borrow from the resolved target list, so the
//! plan always partitions it exactly and keeps directory order.

use contracts::{DeliveryTarget, InvocationConfig};

/// Per-call limit and single-batch grace of the invocation backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchPolicy {
    /// Maximum targets per call (values below 1 are treated as 1)
    pub limit: usize,
    /// Grace, as a fraction of `limit`
    pub grace_fraction: f64,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            limit: 100,
            grace_fraction: 0.2,
        }
    }
}

impl From<&InvocationConfig> for BatchPolicy {
    fn from(config: &InvocationConfig) -> Self {
        Self {
            limit: config.batch_limit,
            grace_fraction: config.grace_fraction,
        }
    }
}

impl BatchPolicy {
    fn effective_limit(&self) -> usize {
        self.limit.max(1)
    }

    /// Remainder size tolerated in a single batch
    pub fn grace_threshold(&self) -> f64 {
        self.effective_limit() as f64 * self.grace_fraction
    }

    /// Whether `n` targets go out in one call.
    ///
    /// `q <= 1` already covers every `n < 2 * limit`; the grace clause can only
    /// hold for `n == 1`, which the first clause accepts anyway.
    pub fn is_single_batch(&self, n: usize) -> bool {
        let limit = self.effective_limit();
        let q = n / limit;
        let r = n % limit;
        q <= 1 || (n == 1 && r as f64 <= self.grace_threshold())
    }
}

/// Planned batches over a borrowed target list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan<'a> {
    batches: Vec<&'a [DeliveryTarget]>,
    single: bool,
}

impl<'a> BatchPlan<'a> {
    pub fn batches(&self) -> &[&'a [DeliveryTarget]] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// True when the whole list goes out in one awaited call
    pub fn is_single(&self) -> bool {
        self.single
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.batches.iter().map(|b| b.len()).collect()
    }

    pub fn into_batches(self) -> Vec<&'a [DeliveryTarget]> {
        self.batches
    }
}

/// Plan the batches for `targets` under `policy`
///
/// A single-batch plan always holds exactly one batch, even when `targets` is empty.
pub fn plan<'a>(targets: &'a [DeliveryTarget], policy: &BatchPolicy) -> BatchPlan<'a> {
    if policy.is_single_batch(targets.len()) {
        return BatchPlan {
            batches: vec![targets],
            single: true,
        };
    }

    BatchPlan {
        batches: targets.chunks(policy.effective_limit()).collect(),
        single: false,
    }
}
