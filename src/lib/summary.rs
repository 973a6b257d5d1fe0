use crate::error::{Error, Result};
use crate::interval::{self, QuantileMethod};

pub const DEFAULT_HDI_PROB: f64 = 0.95;
pub const DEFAULT_CI_TAIL: f64 = 0.05;

/// Point estimate and interval diagnostics of a sample set.
///
/// Both intervals have non-negative width. The mean need not fall inside
/// the HDI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohortSummary {
    pub mean: f64,
    pub hdi_low: f64,
    pub hdi_high: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

pub fn summarize(samples: &[f64], hdi_prob: f64, ci_tail: f64) -> Result<CohortSummary> {
    summarize_with(samples, hdi_prob, ci_tail, QuantileMethod::default())
}

pub fn summarize_with(
    samples: &[f64],
    hdi_prob: f64,
    ci_tail: f64,
    method: QuantileMethod,
) -> Result<CohortSummary> {
    if samples.is_empty() {
        return Err(Error::InsufficientSamples(
            "cannot summarize an empty sample".to_string(),
        ));
    }
    if !(ci_tail > 0.0 && ci_tail < 1.0) {
        return Err(Error::InvalidParameter {
            name: "ci_tail",
            value: ci_tail,
            reason: "must lie in (0, 1)",
        });
    }
    // Everything below works on the sorted copy so the result does not
    // depend on the order of `samples`.
    let sorted = interval::sorted(samples);
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
    let (hdi_low, hdi_high) = interval::hdi_sorted(&sorted, hdi_prob)?;
    let ci_low = interval::quantile_sorted(&sorted, ci_tail / 2.0, method)?;
    let ci_high = interval::quantile_sorted(&sorted, 1.0 - ci_tail / 2.0, method)?;
    Ok(CohortSummary {
        mean,
        hdi_low,
        hdi_high,
        ci_low,
        ci_high,
    })
}
