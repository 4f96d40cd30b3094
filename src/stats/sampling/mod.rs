// Random number generation for Monte Carlo draws

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};

/// Build the generator for one run
///
/// A fixed seed makes the run reproducible; without one the generator is
/// freshly seeded from the thread-local entropy source.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed_val) => StdRng::seed_from_u64(seed_val),
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rng().fill_bytes(&mut seed_bytes);
            StdRng::from_seed(seed_bytes)
        }
    }
}

/// Draw `n` independent samples from `Normal(mean, std_dev)`
pub fn normal_draws<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    std_dev: f64,
    n: usize,
) -> Result<Vec<f64>> {
    if !mean.is_finite() {
        return Err(Error::InvalidInput(format!(
            "normal draws need a finite mean, got {}",
            mean
        )));
    }
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(Error::InvalidInput(format!(
            "normal draws need a finite, non-negative spread, got {}",
            std_dev
        )));
    }
    let normal = Normal::new(mean, std_dev).map_err(|e| {
        Error::InvalidInput(format!("invalid spread {} for normal draws: {}", std_dev, e))
    })?;

    Ok((0..n).map(|_| normal.sample(&mut *rng)).collect())
}
