//! Mean-field models of cross-feeding occupancy
//!
//! `N` is the fraction of lattice sites held by cross-feeders and `C` the
//! fraction held by cheaters:
//!
//! ```text
//! dN/dt = N (b Q N (1 - 2N - C) - d)
//! dC/dt = C (b0 Q N (1 - 2N - C) - d)
//! ```
//!
//! Without cheaters (`C = 0`) the non-zero fixed points solve
//! `2bQ N^2 - bQ N + d = 0`: the lower root is unstable, the upper stable.

use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanFieldParams {
    /// Cross-feeder birth rate
    pub b: f64,
    /// Neighbour count
    pub q: f64,
    /// Cheater birth rate
    pub b0: f64,
    /// Death rate
    pub d: f64,
}

impl Default for MeanFieldParams {
    fn default() -> Self {
        Self {
            b: 0.6,
            q: 4.0,
            b0: 0.7,
            d: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Model {
    CrossFeeder,
    WithCheater,
}

impl MeanFieldParams {
    /// Non-zero fixed points of the cheater-free model, ascending
    pub fn fixed_points(&self) -> Vec<f64> {
        let bq = self.b * self.q;
        let a = 2.0 * bq;
        let disc = bq * bq - 4.0 * a * self.d;
        if a == 0.0 || disc < 0.0 {
            return Vec::new();
        }

        let root = disc.sqrt();
        let mut points = vec![(bq - root) / (2.0 * a), (bq + root) / (2.0 * a)];
        points.dedup();
        points
    }

    fn rhs(&self, model: Model, [n, c]: [f64; 2]) -> [f64; 2] {
        match model {
            Model::CrossFeeder => [n * (self.b * self.q * n * (1.0 - 2.0 * n) - self.d), 0.0],
            Model::WithCheater => {
                let free = 1.0 - 2.0 * n - c;
                [
                    n * (self.b * self.q * n * free - self.d),
                    c * (self.b0 * self.q * n * free - self.d),
                ]
            }
        }
    }

    fn rk4_step(&self, model: Model, y: [f64; 2], h: f64) -> [f64; 2] {
        let add = |y: [f64; 2], k: [f64; 2], s: f64| [y[0] + s * k[0], y[1] + s * k[1]];

        let k1 = self.rhs(model, y);
        let k2 = self.rhs(model, add(y, k1, h / 2.0));
        let k3 = self.rhs(model, add(y, k2, h / 2.0));
        let k4 = self.rhs(model, add(y, k3, h));

        [
            y[0] + h / 6.0 * (k1[0] + 2.0 * k2[0] + 2.0 * k3[0] + k4[0]),
            y[1] + h / 6.0 * (k1[1] + 2.0 * k2[1] + 2.0 * k3[1] + k4[1]),
        ]
    }

    /// Integrate from `y0 = [N, C]` over `[0, t_end]`, reporting `samples`
    /// evenly spaced points. Each output interval is split into `substeps`
    /// RK4 steps.
    pub fn integrate(
        &self,
        model: Model,
        y0: [f64; 2],
        t_end: f64,
        samples: usize,
        substeps: usize,
    ) -> Trajectory {
        let mut trajectory = Trajectory::default();
        trajectory.push(0.0, y0);
        if samples < 2 {
            return trajectory;
        }

        let substeps = substeps.max(1);
        let dt = t_end / (samples - 1) as f64;
        let h = dt / substeps as f64;

        let mut y = y0;
        for i in 1..samples {
            for _ in 0..substeps {
                y = self.rk4_step(model, y, h);
            }
            trajectory.push(i as f64 * dt, y);
        }

        trajectory
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub n: Vec<f64>,
    pub c: Vec<f64>,
}

impl Trajectory {
    fn push(&mut self, t: f64, [n, c]: [f64; 2]) {
        self.t.push(t);
        self.n.push(n);
        self.c.push(c);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Final state `[N, C]`
    pub fn last(&self) -> Option<[f64; 2]> {
        Some([*self.n.last()?, *self.c.last()?])
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["t", "cross_feeders", "cheaters"])?;
        for i in 0..self.len() {
            csv.write_record([self.t[i].to_string(), self.n[i].to_string(), self.c[i].to_string()])?;
        }
        csv.flush()?;
        Ok(())
    }
}
