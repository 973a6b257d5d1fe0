use crate::cohort::{Arm, CohortSpec};
use crate::efficacy::{self, EfficacyMode};
use crate::error::{Error, RenderError, Result};
use crate::interval::QuantileMethod;
use crate::posterior::BetaPosterior;
use crate::render::{Artifact, PlotStyle, RenderSink};
use crate::summary::{self, CohortSummary, DEFAULT_CI_TAIL, DEFAULT_HDI_PROB};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::sync::Mutex;
use std::time::Instant;

pub const DEFAULT_N_DRAWS: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub n_draws: usize,
    pub hdi_prob: f64,
    pub ci_tail: f64,
    /// Base seed; cohort `i` samples from `seed + i`
    pub seed: u64,
    pub quantile_method: QuantileMethod,
    pub efficacy_mode: EfficacyMode,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            n_draws: DEFAULT_N_DRAWS,
            hdi_prob: DEFAULT_HDI_PROB,
            ci_tail: DEFAULT_CI_TAIL,
            seed: 0,
            quantile_method: QuantileMethod::default(),
            efficacy_mode: EfficacyMode::default(),
        }
    }
}

impl RunSettings {
    pub fn validate(&self) -> Result<()> {
        if self.n_draws < 1 {
            return Err(Error::InsufficientSamples(
                "n_draws must be at least 1".to_string(),
            ));
        }
        if !(self.hdi_prob > 0.0 && self.hdi_prob <= 1.0) {
            return Err(Error::InvalidParameter {
                name: "hdi_prob",
                value: self.hdi_prob,
                reason: "must lie in (0, 1]",
            });
        }
        if !(self.ci_tail > 0.0 && self.ci_tail < 1.0) {
            return Err(Error::InvalidParameter {
                name: "ci_tail",
                value: self.ci_tail,
                reason: "must lie in (0, 1)",
            });
        }
        if let EfficacyMode::ControlFloor(floor) = self.efficacy_mode {
            if !(floor > 0.0 && floor < 1.0) {
                return Err(Error::InvalidParameter {
                    name: "control_floor",
                    value: floor,
                    reason: "must lie in (0, 1)",
                });
            }
        }
        Ok(())
    }

    pub fn cohort_seed(&self, index: usize) -> u64 {
        self.seed.wrapping_add(index as u64)
    }
}

/// Raw draws and their summary for one cohort
#[derive(Debug, Clone)]
pub struct CohortEstimate {
    pub treatment: Vec<f64>,
    pub control: Vec<f64>,
    pub efficacy: Vec<f64>,
    pub summary: CohortSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArmReport {
    pub posterior: BetaPosterior,
    pub sample_mean: f64,
    /// Equal-tailed interval of the exact Beta posterior
    pub analytic_interval: (f64, f64),
}

#[derive(Debug)]
pub struct CohortReport {
    pub cohort: String,
    pub seed: u64,
    pub n_draws: usize,
    pub summary: CohortSummary,
    /// 100 * (1 - E[t] E[1/c]) when it exists
    pub analytic_mean: Option<f64>,
    pub treatment: ArmReport,
    pub control: ArmReport,
    pub artifacts: Vec<Artifact>,
    pub render_errors: Vec<RenderError>,
}

/// Where and how to draw each cohort's plots
pub struct RenderPlan<'a, S> {
    pub sink: &'a Mutex<S>,
    pub arm_style: PlotStyle,
    pub efficacy_style: PlotStyle,
    /// Treat a failed plot as a failed cohort
    pub strict: bool,
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample both arms, transform to efficacy and summarize.
pub fn estimate_cohort<R: rand::Rng + ?Sized>(
    cohort: &CohortSpec,
    settings: &RunSettings,
    rng: &mut R,
) -> Result<CohortEstimate> {
    settings.validate()?;
    let treatment = BetaPosterior::for_arm(cohort, Arm::Treatment)?.sample(settings.n_draws, rng)?;
    let control = BetaPosterior::for_arm(cohort, Arm::Control)?.sample(settings.n_draws, rng)?;
    let efficacy =
        efficacy::compute_efficacy_with_mode(&treatment, &control, settings.efficacy_mode)?;
    let summary = summary::summarize_with(
        &efficacy,
        settings.hdi_prob,
        settings.ci_tail,
        settings.quantile_method,
    )?;
    Ok(CohortEstimate {
        treatment,
        control,
        efficacy,
        summary,
    })
}

fn arm_report(cohort: &CohortSpec, arm: Arm, samples: &[f64], tail: f64) -> Result<ArmReport> {
    let posterior = BetaPosterior::for_arm(cohort, arm)?;
    let analytic_interval = posterior.credible_interval(tail)?;
    Ok(ArmReport {
        posterior,
        sample_mean: mean(samples),
        analytic_interval,
    })
}

fn render_plots<S: RenderSink>(
    plan: &RenderPlan<S>,
    cohort: &str,
    estimate: &CohortEstimate,
) -> Vec<std::result::Result<Artifact, RenderError>> {
    // One acquisition covers both plots of the cohort
    let mut sink = match plan.sink.lock() {
        Ok(sink) => sink,
        Err(_) => {
            return vec![Err(RenderError::Backend(
                "render sink lock poisoned".to_string(),
            ))];
        }
    };
    vec![
        sink.render_arm_comparison(cohort, &estimate.treatment, &estimate.control, &plan.arm_style),
        sink.render_efficacy(
            cohort,
            &estimate.efficacy,
            estimate.summary.ci_low,
            estimate.summary.ci_high,
            &plan.efficacy_style,
        ),
    ]
}

/// Full pipeline for one cohort. The cohort's draws are dropped on return.
pub fn run_cohort<S: RenderSink>(
    cohort: &CohortSpec,
    index: usize,
    settings: &RunSettings,
    plan: Option<&RenderPlan<S>>,
) -> Result<CohortReport> {
    let timer = Instant::now();
    let seed = settings.cohort_seed(index);
    debug!("Cohort {} sampling with seed {}", cohort.name, seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let estimate = estimate_cohort(cohort, settings, &mut rng)?;

    let treatment = arm_report(cohort, Arm::Treatment, &estimate.treatment, settings.ci_tail)?;
    let control = arm_report(cohort, Arm::Control, &estimate.control, settings.ci_tail)?;
    let analytic_mean = control
        .posterior
        .mean_reciprocal()
        .map(|recip| 100.0 * (1.0 - treatment.posterior.mean() * recip));

    let s = &estimate.summary;
    info!("{}: mean VE {:.3}%", cohort.name, s.mean);
    info!(
        "{}: {:.0}% HDI [{:.3}, {:.3}]",
        cohort.name,
        100.0 * settings.hdi_prob,
        s.hdi_low,
        s.hdi_high
    );
    info!(
        "{}: {:.0}% CI [{:.3}, {:.3}]",
        cohort.name,
        100.0 * (1.0 - settings.ci_tail),
        s.ci_low,
        s.ci_high
    );
    match analytic_mean {
        Some(m) => debug!("{}: analytic mean VE {:.3}%", cohort.name, m),
        None => debug!("{}: analytic mean VE undefined", cohort.name),
    }

    let mut artifacts = Vec::new();
    let mut render_errors = Vec::new();
    if let Some(plan) = plan {
        for outcome in render_plots(plan, &cohort.name, &estimate) {
            match outcome {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) if plan.strict => return Err(e.into()),
                Err(e) => {
                    warn!("{}: plot failed: {}", cohort.name, e);
                    render_errors.push(e);
                }
            }
        }
    }
    info!("{}: finished in {:?}", cohort.name, timer.elapsed());

    Ok(CohortReport {
        cohort: cohort.name.clone(),
        seed,
        n_draws: settings.n_draws,
        summary: estimate.summary,
        analytic_mean,
        treatment,
        control,
        artifacts,
        render_errors,
    })
}

/// Run every cohort in parallel. Results come back in input order; a
/// failed cohort does not stop the others.
pub fn run_cohorts<S: RenderSink + Send>(
    cohorts: &[CohortSpec],
    settings: &RunSettings,
    plan: Option<&RenderPlan<S>>,
) -> Vec<(String, Result<CohortReport>)> {
    cohorts
        .par_iter()
        .enumerate()
        .map(|(index, cohort)| {
            let outcome = run_cohort(cohort, index, settings, plan);
            if let Err(e) = &outcome {
                warn!("Skipping cohort {}: {}", cohort.name, e);
            }
            (cohort.name.clone(), outcome)
        })
        .collect()
}
