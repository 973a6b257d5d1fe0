use anyhow::Result;
use csv::{Writer, WriterBuilder};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use vaxefficacy_utils::pipeline::CohortReport;

pub const SUMMARY_FILE: &str = "summary.tsv";

/// One line of the summary table. Field order is column order.
#[derive(Debug, Serialize)]
pub struct SummaryRow<'a> {
    pub cohort: &'a str,
    pub n_draws: usize,
    pub seed: u64,
    pub mean: f64,
    /// Empty when the control posterior has alpha <= 1
    pub analytic_mean: Option<f64>,
    pub hdi_low: f64,
    pub hdi_high: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub treatment_mean: f64,
    pub control_mean: f64,
}

impl<'a> From<&'a CohortReport> for SummaryRow<'a> {
    fn from(report: &'a CohortReport) -> Self {
        let s = &report.summary;
        Self {
            cohort: &report.cohort,
            n_draws: report.n_draws,
            seed: report.seed,
            mean: s.mean,
            analytic_mean: report.analytic_mean,
            hdi_low: s.hdi_low,
            hdi_high: s.hdi_high,
            ci_low: s.ci_low,
            ci_high: s.ci_high,
            treatment_mean: report.treatment.sample_mean,
            control_mean: report.control.sample_mean,
        }
    }
}

/// Tab-separated table with one row per estimated cohort. The header is
/// written with the first row.
pub struct SummaryWriter {
    file: File,
    writer: Writer<File>,
}

impl SummaryWriter {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_writer(file.try_clone()?);
        Ok(Self { file, writer })
    }

    pub fn write_report(&mut self, report: &CohortReport) -> Result<()> {
        self.writer.serialize(SummaryRow::from(report))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn write_reports_iter<'a, I>(&mut self, reports: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a CohortReport>,
    {
        let mut n_rows = 0;
        for report in reports {
            self.write_report(report)?;
            n_rows += 1;
        }
        self.flush()?;
        Ok(n_rows)
    }
}

/// Write the summary table into `out_dir`
pub fn write_summary<'a, I>(out_dir: &Path, reports: I) -> Result<()>
where
    I: IntoIterator<Item = &'a CohortReport>,
{
    let path = out_dir.join(SUMMARY_FILE);
    let mut writer = SummaryWriter::new(&path)?;
    let n_rows = writer.write_reports_iter(reports)?;
    info!("Wrote {} cohort(s) to {}", n_rows, path.display());
    Ok(())
}
