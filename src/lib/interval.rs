use crate::error::{Error, Result};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use std::fmt;

/// Plotting-position convention used to interpolate between order statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantileMethod {
    /// alphap = betap = 0.4, approximately unbiased for normal data
    #[default]
    Cunnane,
    /// alphap = betap = 1, linear interpolation between order statistics
    Linear,
}

impl QuantileMethod {
    fn plotting_positions(&self) -> (f64, f64) {
        match self {
            QuantileMethod::Cunnane => (0.4, 0.4),
            QuantileMethod::Linear => (1.0, 1.0),
        }
    }
}

impl fmt::Display for QuantileMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QuantileMethod::Cunnane => write!(f, "cunnane"),
            QuantileMethod::Linear => write!(f, "linear"),
        }
    }
}

pub fn sorted(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by_key(|&x| OrderedFloat(x));
    sorted
}

fn check_probability(name: &'static str, p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidParameter {
            name,
            value: p,
            reason: "must lie in [0, 1]",
        });
    }
    Ok(())
}

/// Quantile of already sorted samples.
pub fn quantile_sorted(sorted: &[f64], p: f64, method: QuantileMethod) -> Result<f64> {
    check_probability("p", p)?;
    let n = sorted.len();
    match n {
        0 => Err(Error::InsufficientSamples(
            "quantile of an empty sequence".to_string(),
        )),
        1 => Ok(sorted[0]),
        _ => {
            let (alphap, betap) = method.plotting_positions();
            let n_f = n as f64;
            let m = alphap + p * (1.0 - alphap - betap);
            let aleph = n_f * p + m;
            // 1-based order statistic index
            let k = aleph.clamp(1.0, n_f - 1.0).floor();
            let gamma = (aleph - k).clamp(0.0, 1.0);
            let k = k as usize;
            Ok((1.0 - gamma) * sorted[k - 1] + gamma * sorted[k])
        }
    }
}

/// Quantiles of `samples` at each of `probs`.
pub fn quantiles(samples: &[f64], probs: &[f64], method: QuantileMethod) -> Result<Vec<f64>> {
    let sorted = sorted(samples);
    probs
        .iter()
        .map(|&p| quantile_sorted(&sorted, p, method))
        .collect()
}

/// Bounds of the narrowest window of sorted samples holding `hdi_prob` of the mass.
pub fn hdi_sorted(sorted: &[f64], hdi_prob: f64) -> Result<(f64, f64)> {
    if !(hdi_prob > 0.0 && hdi_prob <= 1.0) {
        return Err(Error::InvalidParameter {
            name: "hdi_prob",
            value: hdi_prob,
            reason: "must lie in (0, 1]",
        });
    }
    let n = sorted.len();
    if n == 0 {
        return Err(Error::InsufficientSamples(
            "HDI of an empty sequence".to_string(),
        ));
    }
    if n == 1 {
        return Ok((sorted[0], sorted[0]));
    }
    let window = ((hdi_prob * n as f64).floor() as usize).min(n - 1);
    let n_windows = n - window;
    // First minimum wins on ties
    let start = (0..n_windows)
        .position_min_by_key(|&i| OrderedFloat(sorted[i + window] - sorted[i]))
        .unwrap_or(0);
    Ok((sorted[start], sorted[start + window]))
}

pub fn hdi(samples: &[f64], hdi_prob: f64) -> Result<(f64, f64)> {
    hdi_sorted(&sorted(samples), hdi_prob)
}
