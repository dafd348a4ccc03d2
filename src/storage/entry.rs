/// The learned parameters bound to a single key of a `ParamTable`.
///
/// Linear keys use `w`, interaction keys use the latent vector, both kinds share this layout.
/// When the model trains with adaptive rates the entry also owns the running sum of squared
/// gradients of each latent dimension, so it lives exactly as long as the values it adapts.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub w: f32,
    v: Box<[f32]>,
    sum_sq: Option<Box<[f32]>>,
}

impl Entry {
    /// Creates a new `Entry`.
    ///
    /// # Arguments
    /// * `w` - The scalar weight.
    /// * `v` - The latent vector, its length is the factor dimension of the model.
    ///
    /// # Returns
    /// A new `Entry` instance without gradient accumulators.
    pub fn new(w: f32, v: impl Into<Box<[f32]>>) -> Self {
        Self {
            w,
            v: v.into(),
            sum_sq: None,
        }
    }

    /// Attaches zeroed squared gradient accumulators, one per latent dimension.
    pub fn with_accumulators(mut self) -> Self {
        self.sum_sq = Some(vec![0.; self.v.len()].into_boxed_slice());
        self
    }

    /// Returns the latent vector.
    pub fn v(&self) -> &[f32] {
        &self.v
    }

    /// Returns the latent vector mutably.
    pub fn v_mut(&mut self) -> &mut [f32] {
        &mut self.v
    }

    /// The length of the latent vector.
    pub fn factors(&self) -> usize {
        self.v.len()
    }

    /// The accumulated squared gradient of dimension `f`, zero when not tracked.
    pub fn sum_sq(&self, f: usize) -> f32 {
        self.sum_sq
            .as_ref()
            .and_then(|acc| acc.get(f).copied())
            .unwrap_or(0.)
    }

    /// Stores `f`'s accumulated squared gradient, a no-op when the entry doesn't track them.
    pub(crate) fn set_sum_sq(&mut self, f: usize, value: f32) {
        if let Some(acc) = self.sum_sq.as_mut().and_then(|acc| acc.get_mut(f)) {
            *acc = value;
        }
    }

    /// Whether this entry carries gradient accumulators.
    pub fn tracks_gradients(&self) -> bool {
        self.sum_sq.is_some()
    }
}
