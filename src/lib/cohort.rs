use crate::error::{Error, Result};
use log::{debug, info};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

pub const REFERENCE_PRIOR_ALPHA: f64 = 0.010101;
pub const REFERENCE_PRIOR_BETA: f64 = 1.0;

fn default_prior_alpha() -> f64 {
    REFERENCE_PRIOR_ALPHA
}

fn default_prior_beta() -> f64 {
    REFERENCE_PRIOR_BETA
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Arm {
    Treatment,
    Control,
}

impl Arm {
    /// Legend label used on the arm comparison plot
    pub fn label(&self) -> &'static str {
        match self {
            Arm::Treatment => "Vaccine IRR",
            Arm::Control => "Control IRR",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arm::Treatment => write!(f, "treatment"),
            Arm::Control => write!(f, "control"),
        }
    }
}

/// Observed incidence counts for one cohort of a two-arm trial.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CohortSpec {
    pub name: String,
    pub treatment_events: u64,
    pub treatment_total: u64,
    pub control_events: u64,
    pub control_total: u64,
    #[serde(default = "default_prior_alpha")]
    pub prior_alpha: f64,
    #[serde(default = "default_prior_beta")]
    pub prior_beta: f64,
}

impl CohortSpec {
    pub fn new(
        name: &str,
        treatment: (u64, u64),
        control: (u64, u64),
    ) -> Self {
        Self {
            name: name.to_string(),
            treatment_events: treatment.0,
            treatment_total: treatment.1,
            control_events: control.0,
            control_total: control.1,
            prior_alpha: REFERENCE_PRIOR_ALPHA,
            prior_beta: REFERENCE_PRIOR_BETA,
        }
    }

    pub fn with_priors(mut self, prior_alpha: f64, prior_beta: f64) -> Self {
        self.prior_alpha = prior_alpha;
        self.prior_beta = prior_beta;
        self
    }

    /// (events, total) for the requested arm
    pub fn counts(&self, arm: Arm) -> (u64, u64) {
        match arm {
            Arm::Treatment => (self.treatment_events, self.treatment_total),
            Arm::Control => (self.control_events, self.control_total),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.prior_alpha > 0.0 && self.prior_alpha.is_finite()) {
            return Err(Error::invalid_cohort(
                &self.name,
                format!("prior_alpha must be positive, got {}", self.prior_alpha),
            ));
        }
        if !(self.prior_beta > 0.0 && self.prior_beta.is_finite()) {
            return Err(Error::invalid_cohort(
                &self.name,
                format!("prior_beta must be positive, got {}", self.prior_beta),
            ));
        }
        for arm in Arm::iter() {
            let (events, total) = self.counts(arm);
            if total < events {
                return Err(Error::invalid_cohort(
                    &self.name,
                    format!("{} arm has {} events out of {} participants", arm, events, total),
                ));
            }
        }
        Ok(())
    }
}

/// The four cohorts of the reference trial data.
pub fn default_cohorts() -> Vec<CohortSpec> {
    vec![
        CohortSpec::new("overall", (30, 5807), (101, 5829)),
        CohortSpec::new("group1", (3, 1367), (30, 1374)),
        CohortSpec::new("group2", (15, 2377), (38, 2430)),
        CohortSpec::new("group3", (12, 2063), (33, 2025)),
    ]
}

/// Load a JSON list of cohorts. Cohorts are not validated here; invalid
/// entries fail individually when the pipeline reaches them.
pub fn load_cohorts(path: &Path) -> Result<Vec<CohortSpec>> {
    info!("Loading cohorts from {}", path.display());
    let file = File::open(path)?;
    let cohorts: Vec<CohortSpec> = serde_json::from_reader(BufReader::new(file))?;
    debug!("Loaded {} cohorts", cohorts.len());
    if cohorts.is_empty() {
        return Err(Error::invalid_cohort(
            &path.display().to_string(),
            "file contains no cohorts",
        ));
    }
    Ok(cohorts)
}
