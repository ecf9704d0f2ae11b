// Random sampling service for the transport core.
//
// The engine is a PCG-LCG generator: LCG base with an RXS-M-XS output
// permutation. 8 bytes of state, fully inlineable, and cheap to reseed,
// which is what the per-particle sub-stream discipline in the finders
// relies on.

use log::debug;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::Normal;

/// LCG multiplier
const PRN_MULT: u64 = 6364136223846793005;
/// LCG additive constant
const PRN_ADD: u64 = 1442695040888963407;

/// The shared random engine. One instance is owned by the experiment and
/// passed down explicitly; finder workers derive reproducible sub-streams
/// with [`Engine::from_stream`].
#[derive(Clone, Copy, Debug)]
pub struct Engine {
    state: u64,
}

impl Engine {
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Derive a statistically independent engine for a numbered sub-stream
    /// (e.g. one per particle id). Deterministic in (seed, stream), so
    /// parallel candidate generation stays reproducible regardless of
    /// thread scheduling.
    #[inline]
    pub fn from_stream(master_seed: u64, stream: u64) -> Self {
        // splitmix64-style finalizer over the combined words
        let mut z = master_seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        Self::new(z ^ (z >> 31))
    }

    /// Reseed in place (for reuse across particles).
    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.state = seed;
    }

    /// Random f64 in [0, 1).
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        // equivalent to ldexp(next_u64(), -64)
        (self.next_u64() as f64) * 5.421010862427522e-20
    }
}

impl SeedableRng for Engine {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            state: u64::from_le_bytes(seed),
        }
    }
}

impl RngCore for Engine {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        // Advance the LCG
        self.state = PRN_MULT.wrapping_mul(self.state).wrapping_add(PRN_ADD);

        // PCG output permutation (RXS-M-XS variant)
        let word = ((self.state >> ((self.state >> 59) + 5)) ^ self.state)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut left = dest;
        while left.len() >= 8 {
            let bytes = self.next_u64().to_le_bytes();
            left[..8].copy_from_slice(&bytes);
            left = &mut left[8..];
        }
        if !left.is_empty() {
            let bytes = self.next_u64().to_le_bytes();
            left.copy_from_slice(&bytes[..left.len()]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Uniformly distributed value in [min, max).
#[inline]
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    rng.gen_range(min..max)
}

/// Uniformly distributed value in [0, 1).
#[inline]
pub fn canonical<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Exponentially distributed value with rate `lambda` (mean 1/lambda).
#[inline]
pub fn exponential<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> f64 {
    // 1 - u is in (0, 1], so the log is finite
    -(1.0 - rng.gen::<f64>()).ln() / lambda
}

/// Normally distributed value with the given mean and standard deviation.
#[inline]
pub fn normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, sigma: f64) -> f64 {
    Normal::new(mean, sigma).unwrap().sample(rng)
}

/// Value x distributed according to exp(a*x), restricted to lie between x1
/// and x2 (either order). Sampled by inversion with underflow guards.
pub fn expo<R: Rng + ?Sized>(rng: &mut R, a: f64, x1: f64, x2: f64) -> f64 {
    let a1 = a * x1;
    let a2 = a * x2;
    let a_min = f64::MIN_POSITIVE.ln();
    let r1 = if a1 > a_min { a1.exp() } else { 0.0 };
    let r2 = if a2 > a_min { a2.exp() } else { 0.0 };
    let lo = r1.min(r2);
    let hi = r1.max(r2);
    loop {
        let x = uniform(rng, lo, hi).ln() / a;
        // exactly one of the bounds must lie below x
        if ((x < x1) as u8) + ((x < x2) as u8) == 1 {
            return x;
        }
    }
}

/// Above this value of the smaller mean the Gaussian approximation of the
/// Bessel distribution is accurate enough.
const M_SWITCH_METHOD: f64 = 6.0;
/// Probabilities of the direct method are truncated below this value.
const NEGLIGIBLE_PROBABILITY: f64 = 1.0e-12;

/// Samples correlated integer pairs (N1, N2) whose difference N1 - N2 is
/// fixed while N1 and N2 follow the product of two Poissonians. This is the
/// Bessel process used for particle-antiparticle pair production under a
/// fixed net quantum number (e.g. a conserved baryon number).
///
/// The smaller of the two numbers follows a Bessel distribution; it is
/// sampled either directly from precomputed probabilities or, for large
/// means, from a moment-matched Gaussian.
#[derive(Debug, Clone)]
pub struct BesselSampler {
    /// Difference between the sampled numbers, N1 - N2.
    difference: u64,
    /// Whether the fixed difference was non-negative.
    difference_is_positive: bool,
    /// Gaussian branch: mean and width of the smaller number.
    gaussian: Option<(f64, f64)>,
    /// Direct branch: normalized probabilities of the smaller number.
    direct: Option<WeightedIndex<f64>>,
}

impl BesselSampler {
    pub fn new(poisson_mean1: f64, poisson_mean2: f64, fixed_difference: i64) -> Self {
        assert!(poisson_mean1 >= 0.0);
        assert!(poisson_mean2 >= 0.0);
        let a = 2.0 * (poisson_mean1 * poisson_mean2).sqrt();
        let n = fixed_difference.unsigned_abs();
        let nf = n as f64;
        debug!(
            "Bessel sampler: Poisson mean N1 = {}, Poisson mean N2 = {}, N1 - N2 fixed to {}",
            poisson_mean1, poisson_mean2, fixed_difference
        );
        let m = 0.5 * ((a * a + nf * nf).sqrt() - nf);
        if m >= M_SWITCH_METHOD {
            let mu = 0.5 * a * Self::r(n, a);
            let mean_sqr = mu * (1.0 + 0.5 * a * Self::r(n + 1, a));
            let sigma = (mean_sqr - mu * mu).sqrt();
            debug!("m = {} -> using gaussian sampling with mean = {}, sigma = {}", m, mu, sigma);
            Self {
                difference: n,
                difference_is_positive: fixed_difference >= 0,
                gaussian: Some((mu, sigma)),
                direct: None,
            }
        } else {
            debug!("m = {} -> using direct sampling method", m);
            let mut probabilities = Vec::new();
            let mut w = 1.0;
            let mut i = 0u64;
            loop {
                probabilities.push(w);
                w *= 0.25 * a * a / ((i + 1) as f64) / ((n + i + 1) as f64);
                i += 1;
                if w <= NEGLIGIBLE_PROBABILITY {
                    break;
                }
            }
            let dist = WeightedIndex::new(&probabilities).unwrap();
            Self {
                difference: n,
                difference_is_positive: fixed_difference >= 0,
                gaussian: None,
                direct: Some(dist),
            }
        }
    }

    /// Sample one correlated pair.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (u64, u64) {
        let n_smaller = match (&self.gaussian, &self.direct) {
            (Some((mu, sigma)), _) => {
                // the gaussian tail can undershoot zero for moderate means
                normal(rng, *mu, *sigma).round().max(0.0) as u64
            }
            (None, Some(dist)) => dist.sample(rng) as u64,
            (None, None) => unreachable!("sampler constructed without a branch"),
        };
        if self.difference_is_positive {
            (n_smaller + self.difference, n_smaller)
        } else {
            (n_smaller, n_smaller + self.difference)
        }
    }

    /// Ratio r(n, a) = I_{n+1}(a) / I_n(a) of modified Bessel functions,
    /// evaluated as a continued fraction.
    fn r(n: u64, a: f64) -> f64 {
        let a_inv = 1.0 / a;
        let nf = n as f64;
        let mut res = 0.0;
        // |x - continued fraction of order i| < 2^(-i+1); 200 terms keeps
        // the result stable well below the Gaussian-branch accuracy.
        for i in (1..=200u64).rev() {
            res = 1.0 / (a_inv * 2.0 * (nf + i as f64) + res);
        }
        debug_assert!(a / ((a * a + (nf + 1.0) * (nf + 1.0)).sqrt() + nf + 1.0) <= res);
        debug_assert!(res <= a / ((a * a + nf * nf).sqrt() + nf));
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_deterministic() {
        let mut rng1 = Engine::new(12345);
        let mut rng2 = Engine::new(12345);
        for _ in 0..100 {
            assert_eq!(rng1.random(), rng2.random());
        }
    }

    #[test]
    fn test_engine_range() {
        let mut rng = Engine::new(42);
        for _ in 0..10000 {
            let val = rng.random();
            assert!((0.0..1.0).contains(&val), "Value {} out of range [0, 1)", val);
        }
    }

    #[test]
    fn test_engine_reseed() {
        let mut rng = Engine::new(12345);
        let first_val = rng.random();
        for _ in 0..100 {
            rng.random();
        }
        rng.reseed(12345);
        assert_eq!(rng.random(), first_val);
    }

    #[test]
    fn test_substreams_differ() {
        let mut a = Engine::from_stream(7, 1);
        let mut b = Engine::from_stream(7, 2);
        let va: Vec<u64> = (0..8).map(|_| a.next_u64()).collect();
        let vb: Vec<u64> = (0..8).map(|_| b.next_u64()).collect();
        assert_ne!(va, vb);
        // same stream id reproduces
        let mut a2 = Engine::from_stream(7, 1);
        let va2: Vec<u64> = (0..8).map(|_| a2.next_u64()).collect();
        assert_eq!(va, va2);
    }

    #[test]
    fn test_uniform_bounds() {
        let mut rng = Engine::new(9);
        for _ in 0..1000 {
            let v = uniform(&mut rng, -2.0, 3.0);
            assert!((-2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn test_exponential_mean() {
        let mut rng = Engine::new(11);
        let n = 100_000;
        let sum: f64 = (0..n).map(|_| exponential(&mut rng, 2.0)).sum();
        let mean = sum / n as f64;
        assert!((mean - 0.5).abs() < 0.01, "mean = {}", mean);
    }

    #[test]
    fn test_expo_bounds() {
        let mut rng = Engine::new(13);
        for _ in 0..1000 {
            let x = expo(&mut rng, -2.0, 0.0, 5.0);
            assert!((0.0..=5.0).contains(&x), "x = {}", x);
        }
    }

    #[test]
    fn test_bessel_sampler_difference() {
        let mut rng = Engine::new(21);
        let sampler = BesselSampler::new(3.0, 2.0, 2);
        for _ in 0..1000 {
            let (n1, n2) = sampler.sample(&mut rng);
            assert_eq!(n1 - n2, 2);
        }
        let sampler_neg = BesselSampler::new(3.0, 2.0, -1);
        for _ in 0..1000 {
            let (n1, n2) = sampler_neg.sample(&mut rng);
            assert_eq!(n2 - n1, 1);
        }
    }

    #[test]
    fn test_bessel_sampler_gaussian_branch() {
        // large means force the gaussian approximation
        let sampler = BesselSampler::new(100.0, 100.0, 0);
        assert!(sampler.gaussian.is_some());
        let mut rng = Engine::new(31);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| sampler.sample(&mut rng).0 as f64).sum::<f64>() / n as f64;
        // smaller number should be close to the r-function prediction,
        // which for equal means approaches the Poisson mean
        assert!((mean - 100.0).abs() < 2.0, "mean = {}", mean);
    }
}
