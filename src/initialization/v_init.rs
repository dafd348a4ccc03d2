/// A `VInit` generates the initial latent vector of a key seen for the first time.
pub trait VInit {
    /// Should fill `out` with the initial latent values for `key`.
    ///
    /// Must be deterministic in `key`: the same key always yields the same vector regardless
    /// of how many other keys were initialized before it.
    ///
    /// # Arguments
    /// * `key` - The key of the new entry.
    /// * `out` - The latent vector to fill, its length is the factor dimension.
    fn init(&self, key: i32, out: &mut [f32]);
}
