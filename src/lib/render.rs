use crate::cohort::Arm;
use crate::error::RenderError;
use crate::interval::{self, QuantileMethod};
use crate::kde::GaussianKde;
use log::{debug, info};
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    ArmComparison,
    Efficacy,
}

impl PlotKind {
    pub fn file_stem(&self) -> &'static str {
        match self {
            PlotKind::ArmComparison => "arm_comparison",
            PlotKind::Efficacy => "efficacy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendPosition {
    UpperLeft,
    #[default]
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl LegendPosition {
    fn series_label_position(&self) -> SeriesLabelPosition {
        match self {
            LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
            LegendPosition::LowerLeft => SeriesLabelPosition::LowerLeft,
            LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisStyle {
    pub label: String,
    /// Fixed (min, max); derived from the data when absent
    pub limits: Option<(f64, f64)>,
    pub tick_step: Option<f64>,
}

impl AxisStyle {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            limits: None,
            tick_step: None,
        }
    }

    fn fixed(label: &str, limits: (f64, f64), tick_step: f64) -> Self {
        Self {
            label: label.to_string(),
            limits: Some(limits),
            tick_step: Some(tick_step),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridStyle {
    pub show: bool,
    pub major_alpha: f64,
    pub minor_alpha: f64,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            show: true,
            major_alpha: 1.0,
            minor_alpha: 0.2,
        }
    }
}

/// Everything a render call needs to know about presentation. Passed
/// explicitly to every call; there is no shared plotting state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    pub size: (u32, u32),
    /// Vaccine arm on the comparison plot, the curve on the efficacy plot
    pub primary_color: String,
    /// Control arm on the comparison plot
    pub secondary_color: String,
    pub line_width: u32,
    pub x_axis: AxisStyle,
    pub y_axis: AxisStyle,
    pub grid: GridStyle,
    pub legend: LegendPosition,
    pub font_size: u32,
    pub shade_color: String,
    pub shade_opacity: f64,
    pub interval_color: String,
    pub interval_label: String,
    pub curve_points: usize,
}

impl PlotStyle {
    fn base(x_label: &str, y_label: &str) -> Self {
        Self {
            size: (1200, 600),
            primary_color: "#FF5733".to_string(),
            secondary_color: "#2E86C1".to_string(),
            line_width: 2,
            x_axis: AxisStyle::new(x_label),
            y_axis: AxisStyle::new(y_label),
            grid: GridStyle::default(),
            legend: LegendPosition::default(),
            font_size: 18,
            shade_color: "#FF9D88".to_string(),
            shade_opacity: 0.2,
            interval_color: "#AE1F00".to_string(),
            interval_label: "95% CI".to_string(),
            curve_points: 512,
        }
    }

    pub fn arm_comparison() -> Self {
        Self::base(
            "Incidence Rate Ratio (IRR) values",
            "Posterior density of the sampled values",
        )
    }

    pub fn efficacy() -> Self {
        Self::base(
            "Vaccine Efficacy percentage",
            "Posterior density of the sampled values",
        )
    }

    /// Fixed axes of the published overall-cohort figure
    pub fn reference_arm_comparison() -> Self {
        let mut style = Self::arm_comparison();
        style.x_axis = AxisStyle::fixed(&style.x_axis.label, (0.0, 0.025), 0.0025);
        style.y_axis = AxisStyle::fixed(&style.y_axis.label, (0.0, 500.0), 100.0);
        style
    }

    pub fn reference_efficacy() -> Self {
        let mut style = Self::efficacy();
        style.x_axis = AxisStyle::fixed(&style.x_axis.label, (20.0, 100.0), 10.0);
        style.y_axis = AxisStyle::fixed(&style.y_axis.label, (0.0, 0.07), 0.01);
        style
    }

    /// Label the shaded interval with its central mass, e.g. "90% CI" for a 0.1 tail
    pub fn with_ci_tail(mut self, ci_tail: f64) -> Self {
        let level = format!("{:.2}", 100.0 * (1.0 - ci_tail));
        let level = level.trim_end_matches('0').trim_end_matches('.');
        self.interval_label = format!("{}% CI", level);
        self
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(RenderError::Style(format!(
                "figure size must be positive, got {:?}",
                self.size
            )));
        }
        if self.line_width == 0 {
            return Err(RenderError::Style("line width must be positive".to_string()));
        }
        if self.curve_points < 2 {
            return Err(RenderError::Style(
                "a density curve needs at least two points".to_string(),
            ));
        }
        for color in [
            &self.primary_color,
            &self.secondary_color,
            &self.shade_color,
            &self.interval_color,
        ] {
            parse_hex_color(color)?;
        }
        for (name, alpha) in [
            ("shade opacity", self.shade_opacity),
            ("major grid alpha", self.grid.major_alpha),
            ("minor grid alpha", self.grid.minor_alpha),
        ] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(RenderError::Style(format!(
                    "{} must lie in [0, 1], got {}",
                    name, alpha
                )));
            }
        }
        for (name, axis) in [("x", &self.x_axis), ("y", &self.y_axis)] {
            if let Some((lo, hi)) = axis.limits {
                if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                    return Err(RenderError::Style(format!(
                        "{} axis limits ({}, {}) are not increasing",
                        name, lo, hi
                    )));
                }
            }
            if let Some(step) = axis.tick_step {
                if !(step > 0.0 && step.is_finite()) {
                    return Err(RenderError::Style(format!(
                        "{} tick step must be positive, got {}",
                        name, step
                    )));
                }
            }
        }
        Ok(())
    }
}

pub fn parse_hex_color(hex: &str) -> Result<RGBColor, RenderError> {
    let digits = hex
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.is_ascii())
        .ok_or_else(|| RenderError::Style(format!("expected a #RRGGBB color, got '{}'", hex)))?;
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| RenderError::Style(format!("invalid hex color '{}'", hex)))
    };
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// A rendered plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub cohort: String,
    pub kind: PlotKind,
    pub path: Option<PathBuf>,
}

/// Consumer of the estimator's samples. Implementations only read the
/// sample slices.
pub trait RenderSink {
    fn render_arm_comparison(
        &mut self,
        cohort: &str,
        treatment: &[f64],
        control: &[f64],
        style: &PlotStyle,
    ) -> Result<Artifact, RenderError>;

    fn render_efficacy(
        &mut self,
        cohort: &str,
        efficacy: &[f64],
        ci_low: f64,
        ci_high: f64,
        style: &PlotStyle,
    ) -> Result<Artifact, RenderError>;
}

pub fn check_interval(ci_low: f64, ci_high: f64) -> Result<(), RenderError> {
    if !(ci_low <= ci_high) {
        return Err(RenderError::InvalidInterval {
            low: ci_low,
            high: ci_high,
        });
    }
    Ok(())
}

/// Writes plots as image files into a directory.
pub struct PlotSink {
    out_dir: PathBuf,
    format: ImageFormat,
}

struct Curve {
    label: &'static str,
    color: RGBColor,
    points: Vec<(f64, f64)>,
}

struct Frame {
    x: (f64, f64),
    y: (f64, f64),
}

fn backend_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Backend(err.to_string())
}

fn density(samples: &[f64]) -> Result<GaussianKde, RenderError> {
    GaussianKde::new(samples).map_err(|e| RenderError::Density(e.to_string()))
}

/// Central range of the samples padded by three bandwidths
fn auto_x_range(samples: &[f64], kde: &GaussianKde) -> Result<(f64, f64), RenderError> {
    let q = interval::quantiles(samples, &[0.001, 0.999], QuantileMethod::Linear)
        .map_err(|e| RenderError::Density(e.to_string()))?;
    let pad = 3.0 * kde.bandwidth();
    check_range(q[0] - pad, q[1] + pad)
}

/// Plot ranges must be finite and increasing before they reach plotters
fn check_range(lo: f64, hi: f64) -> Result<(f64, f64), RenderError> {
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(RenderError::Density(format!(
            "cannot plot over the range [{:e}, {:e}]",
            lo, hi
        )));
    }
    Ok((lo, hi))
}

fn auto_y_range(curves: &[&[(f64, f64)]]) -> (f64, f64) {
    let peak = curves
        .iter()
        .flat_map(|c| c.iter().map(|&(_, y)| y))
        .fold(0.0_f64, f64::max);
    (0.0, if peak > 0.0 { 1.1 * peak } else { 1.0 })
}

fn decimals_for(step: f64) -> usize {
    (0..8)
        .find(|&d| {
            let scaled = step * 10f64.powi(d as i32);
            (scaled - scaled.round()).abs() < 1e-9
        })
        .unwrap_or(8)
}

fn label_count(axis: &AxisStyle, range: (f64, f64)) -> Option<usize> {
    axis.tick_step
        .map(|step| ((range.1 - range.0) / step).round() as usize + 1)
}

fn configure_mesh<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    frame: &Frame,
    style: &PlotStyle,
) -> Result<(), RenderError> {
    let x_decimals = style.x_axis.tick_step.map(decimals_for);
    let y_decimals = style.y_axis.tick_step.map(decimals_for);
    let x_fmt = |v: &f64| match x_decimals {
        Some(d) => format!("{:.*}", d, v),
        None => format!("{:.4}", v),
    };
    let y_fmt = |v: &f64| match y_decimals {
        Some(d) => format!("{:.*}", d, v),
        None => format!("{:.3}", v),
    };
    let major = BLACK.mix(style.grid.major_alpha);
    let minor = BLACK.mix(style.grid.minor_alpha);

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(style.x_axis.label.as_str())
        .y_desc(style.y_axis.label.as_str())
        .axis_desc_style(("sans-serif", style.font_size + 2))
        .label_style(("sans-serif", style.font_size))
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt);
    if let Some(n) = label_count(&style.x_axis, frame.x) {
        mesh.x_labels(n);
    }
    if let Some(n) = label_count(&style.y_axis, frame.y) {
        mesh.y_labels(n);
    }
    if style.grid.show {
        mesh.bold_line_style(major).light_line_style(minor);
    } else {
        mesh.disable_mesh();
    }
    mesh.draw().map_err(backend_error)
}

fn draw_arm_comparison<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    curves: &[Curve],
    frame: &Frame,
    style: &PlotStyle,
) -> Result<(), RenderError> {
    root.fill(&WHITE).map_err(backend_error)?;
    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(frame.x.0..frame.x.1, frame.y.0..frame.y.1)
        .map_err(backend_error)?;
    configure_mesh(&mut chart, frame, style)?;

    for curve in curves {
        let color = curve.color;
        let width = style.line_width;
        chart
            .draw_series(LineSeries::new(
                curve.points.iter().copied(),
                color.stroke_width(width),
            ))
            .map_err(backend_error)?
            .label(curve.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));
    }
    chart
        .configure_series_labels()
        .position(style.legend.series_label_position())
        .label_font(("sans-serif", style.font_size))
        .background_style(WHITE.mix(0.6))
        .border_style(RGBColor(0x28, 0x37, 0x47))
        .draw()
        .map_err(backend_error)?;
    root.present().map_err(backend_error)
}

fn draw_efficacy<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    curve: &Curve,
    shaded: &[(f64, f64)],
    bounds: [(f64, f64); 2],
    frame: &Frame,
    style: &PlotStyle,
) -> Result<(), RenderError> {
    let shade = parse_hex_color(&style.shade_color)?;
    let interval_color = parse_hex_color(&style.interval_color)?;

    root.fill(&WHITE).map_err(backend_error)?;
    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(frame.x.0..frame.x.1, frame.y.0..frame.y.1)
        .map_err(backend_error)?;
    configure_mesh(&mut chart, frame, style)?;

    chart
        .draw_series(AreaSeries::new(
            shaded.iter().copied(),
            0.0,
            shade.mix(style.shade_opacity).filled(),
        ))
        .map_err(backend_error)?;
    chart
        .draw_series(bounds.iter().map(|&(x, y)| {
            PathElement::new(vec![(x, 0.0), (x, y)], interval_color.stroke_width(style.line_width))
        }))
        .map_err(backend_error)?;

    let color = curve.color;
    let width = style.line_width;
    chart
        .draw_series(LineSeries::new(
            curve.points.iter().copied(),
            color.stroke_width(width),
        ))
        .map_err(backend_error)?
        .label(curve.label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));

    let label_x = bounds[0].0 + 0.3 * (bounds[1].0 - bounds[0].0);
    let label_y = 0.3 * bounds[0].1.max(bounds[1].1);
    chart
        .draw_series(std::iter::once(Text::new(
            style.interval_label.clone(),
            (label_x, label_y),
            ("sans-serif", style.font_size).into_font(),
        )))
        .map_err(backend_error)?;

    chart
        .configure_series_labels()
        .position(style.legend.series_label_position())
        .label_font(("sans-serif", style.font_size))
        .background_style(WHITE.mix(0.6))
        .border_style(RGBColor(0x28, 0x37, 0x47))
        .draw()
        .map_err(backend_error)?;
    root.present().map_err(backend_error)
}

impl PlotSink {
    pub fn new(out_dir: &Path, format: ImageFormat) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            format,
        }
    }

    fn output_path(&self, cohort: &str, kind: PlotKind) -> PathBuf {
        let safe: String = cohort
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.out_dir.join(format!(
            "{}_{}.{}",
            safe,
            kind.file_stem(),
            self.format.extension()
        ))
    }
}

impl RenderSink for PlotSink {
    fn render_arm_comparison(
        &mut self,
        cohort: &str,
        treatment: &[f64],
        control: &[f64],
        style: &PlotStyle,
    ) -> Result<Artifact, RenderError> {
        style.validate()?;
        let treatment_kde = density(treatment)?;
        let control_kde = density(control)?;
        let x = match style.x_axis.limits {
            Some(limits) => limits,
            None => {
                let (t_lo, t_hi) = auto_x_range(treatment, &treatment_kde)?;
                let (c_lo, c_hi) = auto_x_range(control, &control_kde)?;
                (t_lo.min(c_lo).max(0.0), t_hi.max(c_hi))
            }
        };
        let curves = [
            Curve {
                label: Arm::Treatment.label(),
                color: parse_hex_color(&style.primary_color)?,
                points: treatment_kde.density_curve(x.0, x.1, style.curve_points),
            },
            Curve {
                label: Arm::Control.label(),
                color: parse_hex_color(&style.secondary_color)?,
                points: control_kde.density_curve(x.0, x.1, style.curve_points),
            },
        ];
        let y = style
            .y_axis
            .limits
            .unwrap_or_else(|| auto_y_range(&[curves[0].points.as_slice(), curves[1].points.as_slice()]));
        let frame = Frame { x, y };

        let path = self.output_path(cohort, PlotKind::ArmComparison);
        debug!("Drawing arm comparison for {} into {}", cohort, path.display());
        match self.format {
            ImageFormat::Svg => {
                let root = SVGBackend::new(&path, style.size).into_drawing_area();
                draw_arm_comparison(&root, &curves, &frame, style)?;
            }
            ImageFormat::Png => {
                let root = BitMapBackend::new(&path, style.size).into_drawing_area();
                draw_arm_comparison(&root, &curves, &frame, style)?;
            }
        }
        info!("Wrote {}", path.display());
        Ok(Artifact {
            cohort: cohort.to_string(),
            kind: PlotKind::ArmComparison,
            path: Some(path),
        })
    }

    fn render_efficacy(
        &mut self,
        cohort: &str,
        efficacy: &[f64],
        ci_low: f64,
        ci_high: f64,
        style: &PlotStyle,
    ) -> Result<Artifact, RenderError> {
        check_interval(ci_low, ci_high)?;
        style.validate()?;
        let kde = density(efficacy)?;
        let x = match style.x_axis.limits {
            Some(limits) => limits,
            None => auto_x_range(efficacy, &kde)?,
        };
        let curve = Curve {
            label: "Vaccine Efficacy",
            color: parse_hex_color(&style.primary_color)?,
            points: kde.density_curve(x.0, x.1, style.curve_points),
        };
        let shaded = kde.density_curve(ci_low, ci_high, style.curve_points);
        let bounds = [(ci_low, kde.evaluate(ci_low)), (ci_high, kde.evaluate(ci_high))];
        let y = style
            .y_axis
            .limits
            .unwrap_or_else(|| auto_y_range(&[curve.points.as_slice()]));
        let frame = Frame { x, y };

        let path = self.output_path(cohort, PlotKind::Efficacy);
        debug!("Drawing efficacy density for {} into {}", cohort, path.display());
        match self.format {
            ImageFormat::Svg => {
                let root = SVGBackend::new(&path, style.size).into_drawing_area();
                draw_efficacy(&root, &curve, &shaded, bounds, &frame, style)?;
            }
            ImageFormat::Png => {
                let root = BitMapBackend::new(&path, style.size).into_drawing_area();
                draw_efficacy(&root, &curve, &shaded, bounds, &frame, style)?;
            }
        }
        info!("Wrote {}", path.display());
        Ok(Artifact {
            cohort: cohort.to_string(),
            kind: PlotKind::Efficacy,
            path: Some(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Beta, Distribution};
    use tempfile::tempdir;

    fn beta_samples(a: f64, b: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Beta::new(a, b).unwrap().sample_iter(&mut rng).take(n).collect()
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF5733").unwrap(), RGBColor(0xFF, 0x57, 0x33));
        assert_eq!(parse_hex_color("#2e86c1").unwrap(), RGBColor(0x2E, 0x86, 0xC1));
        for bad in ["FF5733", "#FF573", "#GG5733", "#ÿÿÿ"] {
            assert!(matches!(parse_hex_color(bad), Err(RenderError::Style(_))), "{}", bad);
        }
    }

    #[test]
    fn test_default_styles_are_valid() {
        for style in [
            PlotStyle::arm_comparison(),
            PlotStyle::efficacy(),
            PlotStyle::reference_arm_comparison(),
            PlotStyle::reference_efficacy(),
        ] {
            assert!(style.validate().is_ok());
        }
        assert_eq!(PlotStyle::reference_efficacy().x_axis.limits, Some((20.0, 100.0)));
    }

    #[test]
    fn test_malformed_styles() {
        let mut style = PlotStyle::efficacy();
        style.line_width = 0;
        assert!(matches!(style.validate(), Err(RenderError::Style(_))));

        let mut style = PlotStyle::efficacy();
        style.x_axis.limits = Some((100.0, 20.0));
        assert!(matches!(style.validate(), Err(RenderError::Style(_))));

        let mut style = PlotStyle::efficacy();
        style.y_axis.tick_step = Some(-0.01);
        assert!(matches!(style.validate(), Err(RenderError::Style(_))));

        let mut style = PlotStyle::efficacy();
        style.shade_opacity = 1.5;
        assert!(matches!(style.validate(), Err(RenderError::Style(_))));

        let mut style = PlotStyle::arm_comparison();
        style.secondary_color = "blue".to_string();
        assert!(matches!(style.validate(), Err(RenderError::Style(_))));
    }

    #[test]
    fn test_tick_helpers() {
        assert_eq!(decimals_for(0.0025), 4);
        assert_eq!(decimals_for(0.01), 2);
        assert_eq!(decimals_for(10.0), 0);
        let axis = AxisStyle::fixed("x", (20.0, 100.0), 10.0);
        assert_eq!(label_count(&axis, (20.0, 100.0)), Some(9));
        assert_eq!(label_count(&AxisStyle::new("x"), (0.0, 1.0)), None);
    }

    #[test]
    fn test_interval_label_follows_tail() {
        assert_eq!(PlotStyle::efficacy().with_ci_tail(0.05).interval_label, "95% CI");
        assert_eq!(PlotStyle::efficacy().with_ci_tail(0.1).interval_label, "90% CI");
        assert_eq!(
            PlotStyle::reference_efficacy().with_ci_tail(0.025).interval_label,
            "97.5% CI"
        );
    }

    #[test]
    fn test_check_range() {
        assert_eq!(check_range(-1.0, 2.0).unwrap(), (-1.0, 2.0));
        for (lo, hi) in [(f64::NEG_INFINITY, 1.0), (0.0, f64::INFINITY), (f64::NAN, 1.0), (2.0, 2.0)] {
            assert!(matches!(check_range(lo, hi), Err(RenderError::Density(_))));
        }
    }

    #[test]
    fn test_overflowing_efficacy_is_rejected_without_drawing() {
        let dir = tempdir().unwrap();
        let mut sink = PlotSink::new(dir.path(), ImageFormat::Svg);
        let mut efficacy = beta_samples(8.0, 2.0, 5_000, 5)
            .iter()
            .map(|x| 100.0 * x)
            .collect::<Vec<f64>>();
        efficacy[0] = -8e302;
        assert!(matches!(
            sink.render_efficacy("zero_control", &efficacy, -1e300, 99.0, &PlotStyle::efficacy()),
            Err(RenderError::Density(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_check_interval() {
        assert!(check_interval(1.0, 1.0).is_ok());
        assert!(matches!(
            check_interval(2.0, 1.0),
            Err(RenderError::InvalidInterval { .. })
        ));
        assert!(check_interval(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_render_svg_files() {
        let dir = tempdir().unwrap();
        let mut sink = PlotSink::new(dir.path(), ImageFormat::Svg);
        let treatment = beta_samples(3.0, 1365.0, 5_000, 1);
        let control = beta_samples(30.0, 1345.0, 5_000, 2);
        let snapshot = treatment.clone();

        let artifact = sink
            .render_arm_comparison("group 1", &treatment, &control, &PlotStyle::arm_comparison())
            .unwrap();
        let path = artifact.path.unwrap();
        assert_eq!(path, dir.path().join("group_1_arm_comparison.svg"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));
        assert_eq!(treatment, snapshot);

        let efficacy: Vec<f64> = treatment
            .iter()
            .zip(control.iter())
            .map(|(t, c)| 100.0 * (1.0 - t / c))
            .collect();
        let artifact = sink
            .render_efficacy("group 1", &efficacy, 70.0, 98.0, &PlotStyle::reference_efficacy())
            .unwrap();
        assert_eq!(artifact.kind, PlotKind::Efficacy);
        assert!(artifact.path.unwrap().exists());
    }

    #[test]
    fn test_render_rejects_bad_input() {
        let dir = tempdir().unwrap();
        let mut sink = PlotSink::new(dir.path(), ImageFormat::Svg);
        let samples = beta_samples(2.0, 5.0, 500, 3);
        assert!(matches!(
            sink.render_efficacy("x", &samples, 0.5, 0.1, &PlotStyle::efficacy()),
            Err(RenderError::InvalidInterval { .. })
        ));
        let mut style = PlotStyle::arm_comparison();
        style.size = (0, 600);
        assert!(matches!(
            sink.render_arm_comparison("x", &samples, &samples, &style),
            Err(RenderError::Style(_))
        ));
        assert!(matches!(
            sink.render_arm_comparison("x", &[0.1], &samples, &PlotStyle::arm_comparison()),
            Err(RenderError::Density(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
