use crate::cli::Cli;
use crate::io;
use anyhow::{Result, anyhow, bail};
use log::{error, info, warn};
use std::path::Path;
use std::sync::Mutex;
use vaxefficacy_utils::cohort::{self, CohortSpec};
use vaxefficacy_utils::efficacy::EfficacyMode;
use vaxefficacy_utils::pipeline::{self, CohortReport, RenderPlan, RunSettings};
use vaxefficacy_utils::render::{ImageFormat, PlotSink, PlotStyle};

fn load_cohorts(args: &Cli) -> Result<Vec<CohortSpec>> {
    match &args.cohorts {
        Some(path) => {
            let cohorts = cohort::load_cohorts(Path::new(path))
                .map_err(|e| anyhow!("Could not load cohorts from {}: {}", path, e))?;
            info!("Loaded {} cohort(s) from {}", cohorts.len(), path);
            Ok(cohorts)
        }
        None => {
            info!("No cohort file given, using the reference trial cohorts");
            Ok(cohort::default_cohorts())
        }
    }
}

fn run_settings(args: &Cli) -> Result<RunSettings> {
    let seed = match args.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            info!("No seed given, drew base seed {}", seed);
            seed
        }
    };
    let settings = RunSettings {
        n_draws: args.draws,
        hdi_prob: args.hdi_prob,
        ci_tail: args.ci_tail,
        seed,
        quantile_method: args.quantile_method.into(),
        efficacy_mode: args
            .control_floor
            .map(EfficacyMode::ControlFloor)
            .unwrap_or_default(),
    };
    settings.validate()?;
    Ok(settings)
}

fn plot_styles(reference_axes: bool, ci_tail: f64) -> (PlotStyle, PlotStyle) {
    let (arm_style, efficacy_style) = if reference_axes {
        (
            PlotStyle::reference_arm_comparison(),
            PlotStyle::reference_efficacy(),
        )
    } else {
        (PlotStyle::arm_comparison(), PlotStyle::efficacy())
    };
    (arm_style, efficacy_style.with_ci_tail(ci_tail))
}

pub fn vaxefficacy(args: &Cli) -> Result<()> {
    let out_dir = Path::new(&args.out);
    if out_dir.exists() {
        bail!("Output directory already exists: {}", args.out);
    }
    let cohorts = load_cohorts(args)?;
    let settings = run_settings(args)?;
    std::fs::create_dir(out_dir)
        .map_err(|e| anyhow!("Could not create output directory {}: {}", args.out, e))?;
    info!("Created output directory {}", args.out);
    info!(
        "Estimating {} cohort(s) with {} draws per arm, base seed {}, {} quantiles",
        cohorts.len(),
        settings.n_draws,
        settings.seed,
        settings.quantile_method
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build()?;

    let format: ImageFormat = args.format.into();
    if format == ImageFormat::Png {
        warn!("PNG output is drawn without a font backend; axis labels only appear in SVG plots");
    }
    let sink = Mutex::new(PlotSink::new(out_dir, format));
    let (arm_style, efficacy_style) = plot_styles(args.reference_axes, settings.ci_tail);
    let plan = (!args.no_plots).then(|| RenderPlan {
        sink: &sink,
        arm_style,
        efficacy_style,
        strict: args.strict_plots,
    });

    let results = pool.install(|| pipeline::run_cohorts(&cohorts, &settings, plan.as_ref()));

    let mut reports: Vec<CohortReport> = Vec::with_capacity(results.len());
    let mut n_failed = 0;
    for (name, outcome) in results {
        match outcome {
            Ok(report) => {
                for artifact in &report.artifacts {
                    if let Some(path) = &artifact.path {
                        info!("{}: wrote {}", name, path.display());
                    }
                }
                reports.push(report);
            }
            Err(e) => {
                error!("Cohort {} failed: {}", name, e);
                n_failed += 1;
            }
        }
    }

    io::write_summary(out_dir, &reports)?;
    if reports.is_empty() {
        bail!("All {} cohort(s) failed", n_failed);
    }
    if n_failed > 0 {
        warn!("{} of {} cohort(s) failed", n_failed, cohorts.len());
    }
    Ok(())
}
