use crate::error::{Error, Result};
use itertools::{Itertools, MinMaxResult};
use log::debug;
use std::f64::consts::PI;

// Above this many samples the data are linearly binned before evaluation
const EXACT_LIMIT: usize = 4096;
const N_BINS: usize = 8192;
// Kernel contributions beyond this many bandwidths are dropped
const KERNEL_CUTOFF: f64 = 8.0;

/// Gaussian kernel density estimate with Scott's rule bandwidth.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    /// Support points and their weights; the raw samples with unit weights
    /// for small inputs, bin centres with counts for large ones
    points: Vec<f64>,
    weights: Vec<f64>,
    n: f64,
    bandwidth: f64,
}

impl GaussianKde {
    pub fn new(samples: &[f64]) -> Result<Self> {
        let n = samples.len();
        if n < 2 {
            return Err(Error::InsufficientSamples(format!(
                "density estimation needs at least two samples, got {}",
                n
            )));
        }
        let (min, max) = match samples.iter().copied().minmax() {
            MinMaxResult::MinMax(min, max) => (min, max),
            MinMaxResult::OneElement(x) => (x, x),
            MinMaxResult::NoElements => unreachable!("length checked above"),
        };
        if !(min.is_finite() && max.is_finite()) {
            return Err(Error::DegenerateDensity(
                "samples contain non-finite values".to_string(),
            ));
        }

        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let bandwidth = variance.sqrt() * (n as f64).powf(-0.2);
        if !bandwidth.is_finite() {
            return Err(Error::DegenerateDensity(format!(
                "sample spread over [{:e}, {:e}] overflows the bandwidth",
                min, max
            )));
        }
        if !(bandwidth > 0.0) {
            return Err(Error::DegenerateDensity(
                "samples have zero variance".to_string(),
            ));
        }

        let (points, weights) = if n <= EXACT_LIMIT {
            (samples.to_vec(), vec![1.0; n])
        } else {
            linear_binning(samples, min, max, N_BINS)
        };
        debug!(
            "KDE over {} samples: bandwidth {:.6}, {} support points",
            n,
            bandwidth,
            points.len()
        );
        Ok(Self {
            points,
            weights,
            n: n as f64,
            bandwidth,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let norm = 1.0 / (self.n * h * (2.0 * PI).sqrt());
        let density: f64 = self
            .points
            .iter()
            .zip(self.weights.iter())
            .filter_map(|(&p, &w)| {
                let z = (x - p) / h;
                (z.abs() < KERNEL_CUTOFF).then(|| w * (-0.5 * z * z).exp())
            })
            .sum();
        density * norm
    }

    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// `points` evenly spaced (x, density) pairs over [lo, hi]
    pub fn density_curve(&self, lo: f64, hi: f64, points: usize) -> Vec<(f64, f64)> {
        if points < 2 || !(hi > lo) {
            return vec![(lo, self.evaluate(lo))];
        }
        let step = (hi - lo) / (points - 1) as f64;
        let xs: Vec<f64> = (0..points).map(|i| lo + step * i as f64).collect();
        let ys = self.evaluate_many(&xs);
        xs.into_iter().zip(ys).collect()
    }
}

/// Spread each sample's unit mass over the two nearest grid points.
fn linear_binning(samples: &[f64], min: f64, max: f64, n_bins: usize) -> (Vec<f64>, Vec<f64>) {
    let width = (max - min) / (n_bins - 1) as f64;
    let centers: Vec<f64> = (0..n_bins).map(|i| min + width * i as f64).collect();
    let mut weights = vec![0.0; n_bins];
    if width == 0.0 {
        weights[0] = samples.len() as f64;
        return (centers, weights);
    }
    for &x in samples {
        let pos = (x - min) / width;
        let lower = (pos.floor() as usize).min(n_bins - 2);
        let frac = (pos - lower as f64).clamp(0.0, 1.0);
        weights[lower] += 1.0 - frac;
        weights[lower + 1] += frac;
    }
    (centers, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    fn normal_samples(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Normal::new(0.0, 1.0)
            .unwrap()
            .sample_iter(&mut rng)
            .take(n)
            .collect()
    }

    fn integrate(curve: &[(f64, f64)]) -> f64 {
        curve
            .windows(2)
            .map(|w| 0.5 * (w[1].0 - w[0].0) * (w[0].1 + w[1].1))
            .sum()
    }

    #[test]
    fn test_scott_bandwidth() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let kde = GaussianKde::new(&x).unwrap();
        let expected = 2.5_f64.sqrt() * 5.0_f64.powf(-0.2);
        assert!((kde.bandwidth() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_exact_density_matches_kernel_sum() {
        let x = vec![0.0, 1.0];
        let kde = GaussianKde::new(&x).unwrap();
        let h = kde.bandwidth();
        let phi = |z: f64| (-0.5 * z * z).exp() / (2.0 * PI).sqrt();
        let expected = (phi(0.5 / h) + phi(-0.5 / h)) / (2.0 * h);
        assert!((kde.evaluate(0.5) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_density_integrates_to_one() {
        for n in [500, 50_000] {
            let x = normal_samples(n, 1);
            let kde = GaussianKde::new(&x).unwrap();
            let curve = kde.density_curve(-8.0, 8.0, 801);
            assert!(curve.iter().all(|&(_, y)| y >= 0.0));
            assert!((integrate(&curve) - 1.0).abs() < 0.01, "n = {}", n);
        }
    }

    #[test]
    fn test_binned_close_to_standard_normal() {
        let x = normal_samples(200_000, 2);
        let kde = GaussianKde::new(&x).unwrap();
        let peak = 1.0 / (2.0 * PI).sqrt();
        assert!((kde.evaluate(0.0) - peak).abs() < 0.01);
        assert!(kde.evaluate(10.0) < 1e-6);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(matches!(
            GaussianKde::new(&[1.0]),
            Err(Error::InsufficientSamples(_))
        ));
        assert!(matches!(
            GaussianKde::new(&[2.0, 2.0, 2.0]),
            Err(Error::DegenerateDensity(_))
        ));
        assert!(matches!(
            GaussianKde::new(&[1.0, f64::INFINITY]),
            Err(Error::DegenerateDensity(_))
        ));
    }

    #[test]
    fn test_overflowing_spread_is_degenerate() {
        // Finite samples whose squared deviations overflow
        let mut x = normal_samples(5_000, 4);
        x[17] = -1e200;
        assert!(matches!(GaussianKde::new(&x), Err(Error::DegenerateDensity(_))));
        let x = vec![-8e302, 50.0, 90.0, 95.0];
        assert!(matches!(GaussianKde::new(&x), Err(Error::DegenerateDensity(_))));
    }

    #[test]
    fn test_density_curve_spacing() {
        let kde = GaussianKde::new(&[0.0, 1.0, 2.0]).unwrap();
        let curve = kde.density_curve(0.0, 2.0, 5);
        let xs: Vec<f64> = curve.iter().map(|&(x, _)| x).collect();
        assert_eq!(xs, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(kde.evaluate_many(&[1.0]), vec![curve[2].1]);
    }
}
