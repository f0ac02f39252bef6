//! CSV export for forecast series.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::forecast::ForecastSeries;

/// Column header for CSV forecast export.
const HEADER: &str = "time,powerwall_pct,model3_pct,modelx_pct";

/// Exports a forecast series to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(series: &ForecastSeries, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(series, buf)
}

/// Writes a forecast series as CSV to any writer.
///
/// One row per step; a vehicle column is left empty when the vehicle was
/// absent from the seeding sample.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(series: &ForecastSeries, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for i in 0..series.len() {
        wtr.write_record(&[
            series.labels[i].clone(),
            format!("{:.2}", series.powerwall[i]),
            fmt_opt(series.model3[i]),
            fmt_opt(series.modelx[i]),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn fmt_opt(v: Option<f32>) -> String {
    match v {
        Some(pct) => format!("{pct:.2}"),
        None => String::new(),
    }
}
