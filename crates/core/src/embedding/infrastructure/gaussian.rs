use std::f64::consts::PI;

use rand::Rng;

/// Normal sampler using the Box–Muller transform.
///
/// Each pair of uniforms yields two samples; the second is kept for the
/// next call.
pub struct GaussianSampler {
    mean: f64,
    std_dev: f64,
    spare: Option<f64>,
}

impl GaussianSampler {
    pub fn new(mean: f64, std_dev: f64) -> Self {
        Self {
            mean,
            std_dev,
            spare: None,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        if let Some(z) = self.spare.take() {
            return self.mean + z * self.std_dev;
        }

        // (0, 1] keeps ln finite
        let u1 = 1.0 - rng.gen::<f64>();
        let u2 = rng.gen::<f64>();

        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;

        self.spare = Some(radius * theta.sin());
        self.mean + radius * theta.cos() * self.std_dev
    }
}
