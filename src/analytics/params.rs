//! Parameter space for EPS / cheater sweeps

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parameter drawn uniformly from `[low, high)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformParam {
    pub name: String,
    pub low: f64,
    pub high: f64,
}

impl UniformParam {
    pub fn new(name: &str, low: f64, high: f64) -> Self {
        Self {
            name: name.to_string(),
            low,
            high,
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        self.low + (self.high - self.low) * rng.gen::<f64>()
    }
}

/// EPS yields of cooperators and cheaters
pub fn default_parameter_space() -> Vec<UniformParam> {
    vec![
        UniformParam::new("eps_yield_cooperator", 0.0, 0.4),
        UniformParam::new("eps_yield_cheater", 0.0, 0.2),
    ]
}

/// `n` independent uniform draws over the whole space
pub fn sample_uniform<R: Rng>(space: &[UniformParam], n: usize, rng: &mut R) -> Vec<BTreeMap<String, f64>> {
    (0..n)
        .map(|_| {
            space
                .iter()
                .map(|p| (p.name.clone(), p.sample(rng)))
                .collect()
        })
        .collect()
}
