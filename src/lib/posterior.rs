use crate::cohort::{Arm, CohortSpec};
use crate::error::{Error, Result};
use log::debug;
use rand::Rng;
use rand_distr::Distribution;
use statrs::distribution::ContinuousCDF;

// Bounds of the open unit interval representable as f64
const OPEN_UNIT_LOW: f64 = f64::MIN_POSITIVE;
const OPEN_UNIT_HIGH: f64 = 1.0 - f64::EPSILON / 2.0;

/// A Beta posterior over an event rate, built by adding observed
/// successes and failures to prior pseudo-counts.
#[derive(Clone, Debug, PartialEq)]
pub struct BetaPosterior {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPosterior {
    pub fn prior(alpha: f64, beta: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha.is_finite() && beta > 0.0 && beta.is_finite()) {
            return Err(Error::invalid_cohort(
                "unnamed",
                format!("prior shape parameters must be positive, got ({}, {})", alpha, beta),
            ));
        }
        Ok(Self { alpha, beta })
    }

    /// Update parameters with `events` successes and `non_events` failures
    pub fn update(&mut self, events: u64, non_events: u64) {
        self.alpha += events as f64;
        self.beta += non_events as f64;
    }

    pub fn from_counts(events: u64, total: u64, prior_alpha: f64, prior_beta: f64) -> Result<Self> {
        if total < events {
            return Err(Error::invalid_cohort(
                "unnamed",
                format!("{} events out of {} participants", events, total),
            ));
        }
        let mut posterior = Self::prior(prior_alpha, prior_beta)?;
        posterior.update(events, total - events);
        Ok(posterior)
    }

    /// Posterior of one arm of a cohort, using the cohort's own priors
    pub fn for_arm(cohort: &CohortSpec, arm: Arm) -> Result<Self> {
        cohort.validate()?;
        let (events, total) = cohort.counts(arm);
        let posterior = Self::from_counts(events, total, cohort.prior_alpha, cohort.prior_beta)?;
        debug!(
            "{} {} posterior: α = {:.6}, β = {:.6}",
            cohort.name, arm, posterior.alpha, posterior.beta
        );
        Ok(posterior)
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn variance(&self) -> f64 {
        let numerator = self.alpha * self.beta;
        let denominator = (self.alpha + self.beta).powf(2.0) * (self.alpha + self.beta + 1.0);
        numerator / denominator
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// E[1/X], which only exists for alpha > 1
    pub fn mean_reciprocal(&self) -> Option<f64> {
        if self.alpha <= 1.0 {
            return None;
        }
        Some((self.alpha + self.beta - 1.0) / (self.alpha - 1.0))
    }

    /// Analytic equal-tailed interval with `tail` probability mass outside it
    pub fn credible_interval(&self, tail: f64) -> Result<(f64, f64)> {
        if !(tail > 0.0 && tail < 1.0) {
            return Err(Error::InvalidParameter {
                name: "tail",
                value: tail,
                reason: "must lie in (0, 1)",
            });
        }
        let dist = statrs::distribution::Beta::new(self.alpha, self.beta)
            .map_err(|e| Error::invalid_cohort("unnamed", e.to_string()))?;
        Ok((dist.inverse_cdf(tail / 2.0), dist.inverse_cdf(1.0 - tail / 2.0)))
    }

    /// Draw `n_draws` iid samples. Every draw lies strictly inside (0, 1);
    /// draws that underflow to 0 or round to 1 are moved to the nearest
    /// representable value inside the interval.
    pub fn sample<R: Rng + ?Sized>(&self, n_draws: usize, rng: &mut R) -> Result<Vec<f64>> {
        if n_draws < 1 {
            return Err(Error::InsufficientSamples(
                "at least one posterior draw is required".to_string(),
            ));
        }
        let sampler = rand_distr::Beta::new(self.alpha, self.beta)
            .map_err(|e| Error::invalid_cohort("unnamed", e.to_string()))?;
        Ok(sampler
            .sample_iter(rng)
            .take(n_draws)
            .map(|x: f64| x.clamp(OPEN_UNIT_LOW, OPEN_UNIT_HIGH))
            .collect())
    }
}

/// Sample the conjugate posterior Beta(prior_alpha + events, prior_beta + total - events).
pub fn sample_posterior<R: Rng + ?Sized>(
    events: u64,
    total: u64,
    prior_alpha: f64,
    prior_beta: f64,
    n_draws: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    BetaPosterior::from_counts(events, total, prior_alpha, prior_beta)?.sample(n_draws, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::{REFERENCE_PRIOR_ALPHA, REFERENCE_PRIOR_BETA};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_mean(samples: &[f64]) -> f64 {
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn test_conjugate_update() {
        let posterior = BetaPosterior::from_counts(3, 1367, 0.010101, 1.0).unwrap();
        assert!((posterior.alpha - 3.010101).abs() < 1e-12);
        assert!((posterior.beta - 1365.0).abs() < 1e-12);

        let mut model = BetaPosterior::prior(1.0, 1.0).unwrap();
        model.update(4, 6);
        assert_eq!(model, BetaPosterior { alpha: 5.0, beta: 7.0 });
        assert!((model.mean() - 5.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_for_arm_uses_cohort_counts() {
        let cohort = CohortSpec::new("group1", (3, 1367), (30, 1374));
        let treatment = BetaPosterior::for_arm(&cohort, Arm::Treatment).unwrap();
        let control = BetaPosterior::for_arm(&cohort, Arm::Control).unwrap();
        assert!((treatment.mean() - 0.0022).abs() < 1e-4);
        assert!((control.mean() - 0.0217).abs() < 5e-4);
    }

    #[test]
    fn test_invalid_counts_and_priors() {
        assert!(matches!(
            BetaPosterior::from_counts(11, 10, 1.0, 1.0),
            Err(Error::InvalidCohort { .. })
        ));
        assert!(matches!(
            BetaPosterior::from_counts(1, 10, 0.0, 1.0),
            Err(Error::InvalidCohort { .. })
        ));
        assert!(matches!(
            BetaPosterior::from_counts(1, 10, 1.0, -2.0),
            Err(Error::InvalidCohort { .. })
        ));
        let bad = CohortSpec::new("bad", (5, 4), (1, 10));
        match BetaPosterior::for_arm(&bad, Arm::Control) {
            Err(Error::InvalidCohort { cohort, .. }) => assert_eq!(cohort, "bad"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_zero_draws() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            sample_posterior(1, 10, 1.0, 1.0, 0, &mut rng),
            Err(Error::InsufficientSamples(_))
        ));
    }

    #[test]
    fn test_samples_in_open_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        for (events, total, alpha, beta) in [
            (30, 5807, REFERENCE_PRIOR_ALPHA, REFERENCE_PRIOR_BETA),
            (0, 5, REFERENCE_PRIOR_ALPHA, REFERENCE_PRIOR_BETA),
            (10, 10, 1.0, 0.001),
            (0, 0, 0.5, 0.5),
        ] {
            let samples = sample_posterior(events, total, alpha, beta, 20_000, &mut rng).unwrap();
            assert_eq!(samples.len(), 20_000);
            assert!(samples.iter().all(|&x| x > 0.0 && x < 1.0));
        }
    }

    #[test]
    fn test_seeded_sampling_is_deterministic() {
        let mut rng_a = StdRng::seed_from_u64(2021);
        let mut rng_b = StdRng::seed_from_u64(2021);
        let a = sample_posterior(30, 5807, 0.010101, 1.0, 1000, &mut rng_a).unwrap();
        let b = sample_posterior(30, 5807, 0.010101, 1.0, 1000, &mut rng_b).unwrap();
        assert_eq!(a, b);

        let mut rng_c = StdRng::seed_from_u64(2022);
        let c = sample_posterior(30, 5807, 0.010101, 1.0, 1000, &mut rng_c).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_sample_mean_matches_analytic_mean() {
        let mut rng = StdRng::seed_from_u64(11);
        let posterior = BetaPosterior::from_counts(101, 5829, 0.010101, 1.0).unwrap();
        let samples = posterior.sample(200_000, &mut rng).unwrap();
        let se = posterior.standard_deviation() / (samples.len() as f64).sqrt();
        assert!((sample_mean(&samples) - posterior.mean()).abs() < 6.0 * se);
    }

    #[test]
    fn test_zero_events_mean() {
        let mut rng = StdRng::seed_from_u64(3);
        let (alpha, beta, total) = (REFERENCE_PRIOR_ALPHA, REFERENCE_PRIOR_BETA, 100);
        let samples = sample_posterior(0, total, alpha, beta, 400_000, &mut rng).unwrap();
        let expected = alpha / (alpha + beta + total as f64);
        assert!(samples.iter().all(|&x| x > 0.0));
        assert!((sample_mean(&samples) - expected).abs() < 0.15 * expected);
    }

    #[test]
    fn test_mean_reciprocal() {
        let posterior = BetaPosterior { alpha: 30.010101, beta: 1345.0 };
        let expected = (30.010101 + 1345.0 - 1.0) / 29.010101;
        assert!((posterior.mean_reciprocal().unwrap() - expected).abs() < 1e-9);
        assert!(BetaPosterior { alpha: 0.5, beta: 3.0 }.mean_reciprocal().is_none());
    }

    #[test]
    fn test_credible_interval() {
        let posterior = BetaPosterior { alpha: 3.010101, beta: 1365.0 };
        let (low, high) = posterior.credible_interval(0.05).unwrap();
        assert!(low < posterior.mean() && posterior.mean() < high);
        assert!(low > 0.0 && high < 1.0);
        assert!(posterior.credible_interval(0.0).is_err());
        assert!(posterior.credible_interval(1.0).is_err());
    }
}
