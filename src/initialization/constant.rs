use super::VInit;

/// An initializer that always generates the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstVInit {
    value: f32,
}

impl ConstVInit {
    /// Creates a new `ConstVInit` initializer.
    ///
    /// # Arguments
    /// * `value` - The value every latent dimension starts at.
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl VInit for ConstVInit {
    fn init(&self, _key: i32, out: &mut [f32]) {
        out.fill(self.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_dimension() {
        let mut out = [0.; 4];
        ConstVInit::new(0.5).init(3, &mut out);
        assert_eq!(out, [0.5; 4]);
    }
}
