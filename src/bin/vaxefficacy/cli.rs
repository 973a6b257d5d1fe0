// src/cli.rs
use clap::{Parser, ValueEnum};
use vaxefficacy_utils::interval::QuantileMethod;
use vaxefficacy_utils::render::ImageFormat;

/// Posterior vaccine efficacy from two-arm incidence counts.
#[derive(Parser, Debug)]
#[command(name = "vaxefficacy", version, about = "Beta-Binomial posterior estimates of vaccine efficacy")]
pub struct Cli {
    #[arg(
        long,
        short,
        value_name = "COHORTS",
        help = "JSON file with a list of cohorts. The reference trial cohorts are used when absent"
    )]
    pub cohorts: Option<String>,

    #[arg(
        long,
        short,
        default_value = "vaxefficacy",
        value_name = "OUT",
        help = "Output directory"
    )]
    pub out: String,

    #[arg(long, default_value = "1000000", help = "Posterior draws per arm")]
    pub draws: usize,

    #[arg(long, help = "Base random seed. Drawn at random and logged when absent")]
    pub seed: Option<u64>,

    #[arg(long, default_value = "0.95", help = "Probability mass of the highest density interval")]
    pub hdi_prob: f64,

    #[arg(
        long,
        default_value = "0.05",
        help = "Total tail probability outside the equal-tailed interval"
    )]
    pub ci_tail: f64,

    #[arg(
        value_enum,
        long,
        default_value = "cunnane",
        help = "Interpolation rule for the equal-tailed interval"
    )]
    pub quantile_method: QuantileRule,

    #[arg(
        long,
        value_name = "FLOOR",
        help = "Raise control draws below FLOOR to FLOOR before computing efficacy"
    )]
    pub control_floor: Option<f64>,

    #[arg(value_enum, long, default_value = "svg", help = "Image format of the plots")]
    pub format: OutputFormat,

    #[arg(long, help = "Use the fixed axis limits and ticks of the published figures")]
    pub reference_axes: bool,

    #[arg(long, help = "Only write the summary table")]
    pub no_plots: bool,

    #[arg(long, help = "Fail a cohort when one of its plots cannot be drawn")]
    pub strict_plots: bool,

    #[arg(long, short, default_value = "4", help = "Number of threads to use")]
    pub threads: usize,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum QuantileRule {
    Cunnane,
    Linear,
}

impl From<QuantileRule> for QuantileMethod {
    fn from(rule: QuantileRule) -> Self {
        match rule {
            QuantileRule::Cunnane => QuantileMethod::Cunnane,
            QuantileRule::Linear => QuantileMethod::Linear,
        }
    }
}

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl From<OutputFormat> for ImageFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Svg => ImageFormat::Svg,
            OutputFormat::Png => ImageFormat::Png,
        }
    }
}

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Normal,
    Silent,
}

impl LogLevel {
    pub fn default_filter(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "debug",
            LogLevel::Normal => "info",
            LogLevel::Silent => "off",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Verbose => write!(f, "verbose"),
            LogLevel::Normal => write!(f, "normal"),
            LogLevel::Silent => write!(f, "silent"),
        }
    }
}
