use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal, NormalError, Uniform, uniform::Error as UniformError};

use super::VInit;

/// An initializer that samples a zero mean distribution and scales the result.
///
/// Every key gets its own generator, seeded from the model seed and the key, so the
/// initial vector of a key doesn't depend on the order in which keys show up.
#[derive(Debug, Clone)]
pub struct RandVInit<D: Distribution<f32>> {
    distribution: D,
    scale: f32,
    seed: u64,
}

impl<D: Distribution<f32>> RandVInit<D> {
    /// Creates a new `RandVInit` initializer.
    ///
    /// # Arguments
    /// * `distribution` - The distribution to sample the latent values from.
    /// * `scale` - Multiplies every sampled value.
    /// * `seed` - The model seed.
    pub fn new(distribution: D, scale: f32, seed: u64) -> Self {
        Self {
            distribution,
            scale,
            seed,
        }
    }
}

impl RandVInit<Normal<f32>> {
    /// Creates a new `RandVInit` initializer with a zero mean normal distribution.
    ///
    /// # Arguments
    /// * `std_dev` - The standard deviation of the distribution.
    /// * `scale` - Multiplies every sampled value.
    /// * `seed` - The model seed.
    ///
    /// # Returns
    /// An error if `std_dev` is not finite (Nan or infinite).
    pub fn normal(std_dev: f32, scale: f32, seed: u64) -> Result<Self, NormalError> {
        Ok(Self::new(Normal::new(0., std_dev)?, scale, seed))
    }
}

impl RandVInit<Uniform<f32>> {
    /// Creates a new `RandVInit` initializer with a uniform distribution in `[-range, range]`.
    ///
    /// # Arguments
    /// * `range` - The half width of the interval.
    /// * `scale` - Multiplies every sampled value.
    /// * `seed` - The model seed.
    ///
    /// # Returns
    /// An error if the range is invalid (negative or not finite).
    pub fn uniform(range: f32, scale: f32, seed: u64) -> Result<Self, UniformError> {
        Ok(Self::new(Uniform::new_inclusive(-range, range)?, scale, seed))
    }
}

impl<D: Distribution<f32>> VInit for RandVInit<D> {
    fn init(&self, key: i32, out: &mut [f32]) {
        let mut rng = StdRng::seed_from_u64(key_seed(self.seed, key));

        for v in out.iter_mut() {
            *v = self.distribution.sample(&mut rng) * self.scale;
        }
    }
}

/// Derives the seed of a key's generator by mixing it with the model seed (splitmix64).
fn key_seed(seed: u64, key: i32) -> u64 {
    let mut z = seed ^ (key as u32 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
