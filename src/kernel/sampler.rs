use rand::Rng;

/// Accept/reject decision at a percentage rate.
///
/// Each call is an independent trial. Implementations are shared read-only across the
/// scope tree and the producer handles, hence `Send + Sync`.
pub trait Sampler: Send + Sync {
    /// Returns true with probability `rate / 100`. `0` never samples, `100` always does.
    fn sample(&self, rate: f32) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn sample(&self, rate: f32) -> bool {
        if rate <= 0.0 {
            return false;
        }
        if rate >= 100.0 {
            return true;
        }
        rand::thread_rng().gen_range(0.0f32..100.0) < rate
    }
}

/// Ignores the rate and always returns the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler(pub bool);

impl FixedSampler {
    pub fn always() -> Self {
        FixedSampler(true)
    }

    pub fn never() -> Self {
        FixedSampler(false)
    }
}

impl Sampler for FixedSampler {
    fn sample(&self, _rate: f32) -> bool {
        self.0
    }
}
