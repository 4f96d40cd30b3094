use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::write_bytes_atomic;
use crate::optimize::{Prescription, PrescriptionRecord};
use crate::series::{ObservationRecord, ObservedSeries};
use crate::temporal::{format_period_date, parse_period_date};
use crate::time_series::{DrawSummary, ForecastPoint, PointForecast, SimulationMatrix};

/// Header and rows of a CSV file with named-column access
struct Table {
    source: String,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(Error::Io)?;

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = rdr.headers().map_err(Error::Csv)?.clone();
        let rows = rdr
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Csv)?;

        Ok(Table {
            source: path.display().to_string(),
            headers,
            rows,
        })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::MissingData(format!("column '{}' not found in {}", name, self.source))
        })
    }

    fn field<'a>(&self, row: &'a StringRecord, line: usize, col: usize) -> Result<&'a str> {
        match row.get(col) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::MissingData(format!(
                "{}: empty '{}' on data row {}",
                self.source,
                self.headers.get(col).unwrap_or("?"),
                line + 1
            ))),
        }
    }

    fn float(&self, row: &StringRecord, line: usize, col: usize) -> Result<f64> {
        let raw = self.field(row, line, col)?;
        let value: f64 = raw.parse().map_err(|_| {
            Error::MissingData(format!(
                "{}: cannot parse '{}' as a number in '{}' on data row {}",
                self.source,
                raw,
                self.headers.get(col).unwrap_or("?"),
                line + 1
            ))
        })?;
        if !value.is_finite() {
            return Err(Error::MissingData(format!(
                "{}: non-finite '{}' on data row {}",
                self.source,
                self.headers.get(col).unwrap_or("?"),
                line + 1
            )));
        }
        Ok(value)
    }

    fn date(&self, row: &StringRecord, line: usize, col: usize) -> Result<chrono::NaiveDate> {
        let raw = self.field(row, line, col)?;
        parse_period_date(raw)
            .map_err(|e| Error::MissingData(format!("{}: data row {}: {}", self.source, line + 1, e)))
    }
}

fn csv_bytes<F>(fill: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> Result<()>,
{
    let mut wtr = Writer::from_writer(Vec::new());
    fill(&mut wtr)?;
    wtr.flush().map_err(Error::Io)?;
    wtr.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Read the monthly history
///
/// Requires `period_date`, `net_new` and `marketing_spend` columns; any other
/// columns are ignored.
pub fn read_observed_series<P: AsRef<Path>>(path: P) -> Result<ObservedSeries> {
    let table = Table::open(path.as_ref())?;
    let date_col = table.column("period_date")?;
    let net_new_col = table.column("net_new")?;
    let spend_col = table.column("marketing_spend")?;

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(line, row)| -> Result<ObservationRecord> {
            Ok(ObservationRecord::new(
                table.date(row, line, date_col)?,
                table.float(row, line, net_new_col)?,
                table.float(row, line, spend_col)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    ObservedSeries::new(records)
}

pub fn write_observed_series<P: AsRef<Path>>(path: P, series: &ObservedSeries) -> Result<()> {
    let bytes = csv_bytes(|wtr| {
        wtr.write_record(["period_date", "net_new", "marketing_spend"])?;
        for r in series.records() {
            wtr.write_record([
                format_period_date(r.period_date),
                r.net_new.to_string(),
                r.marketing_spend.to_string(),
            ])?;
        }
        Ok(())
    })?;
    write_bytes_atomic(path, &bytes)
}

pub fn read_point_forecast<P: AsRef<Path>>(path: P) -> Result<PointForecast> {
    let table = Table::open(path.as_ref())?;
    let date_col = table.column("period_date")?;
    let value_col = table.column("forecast_net_new")?;

    let points = table
        .rows
        .iter()
        .enumerate()
        .map(|(line, row)| -> Result<ForecastPoint> {
            Ok(ForecastPoint {
                period_date: table.date(row, line, date_col)?,
                forecast_net_new: table.float(row, line, value_col)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    PointForecast::new(points)
}

pub fn write_point_forecast<P: AsRef<Path>>(path: P, forecast: &PointForecast) -> Result<()> {
    let bytes = csv_bytes(|wtr| {
        wtr.write_record(["period_date", "forecast_net_new"])?;
        for p in forecast.points() {
            wtr.write_record([
                format_period_date(p.period_date),
                p.forecast_net_new.to_string(),
            ])?;
        }
        Ok(())
    })?;
    write_bytes_atomic(path, &bytes)
}

/// Draw matrix with one row per period: `period_date,0,1,...`
pub fn write_simulation_matrix<P: AsRef<Path>>(path: P, matrix: &SimulationMatrix) -> Result<()> {
    let bytes = csv_bytes(|wtr| {
        let mut header = vec!["period_date".to_string()];
        header.extend((0..matrix.n_draws()).map(|i| i.to_string()));
        wtr.write_record(&header)?;

        for (date, draws) in matrix.iter() {
            let mut record = Vec::with_capacity(draws.len() + 1);
            record.push(format_period_date(date));
            record.extend(draws.iter().map(|d| d.to_string()));
            wtr.write_record(&record)?;
        }
        Ok(())
    })?;
    write_bytes_atomic(path, &bytes)
}

pub fn read_simulation_matrix<P: AsRef<Path>>(path: P) -> Result<SimulationMatrix> {
    let table = Table::open(path.as_ref())?;
    let date_col = table.column("period_date")?;
    let draw_cols: Vec<usize> = (0..table.headers.len()).filter(|&c| c != date_col).collect();

    let mut dates = Vec::with_capacity(table.rows.len());
    let mut draws = Vec::with_capacity(table.rows.len());
    for (line, row) in table.rows.iter().enumerate() {
        dates.push(table.date(row, line, date_col)?);
        draws.push(
            draw_cols
                .iter()
                .map(|&c| table.float(row, line, c))
                .collect::<Result<Vec<f64>>>()?,
        );
    }

    SimulationMatrix::new(dates, draws)
}

pub fn write_simulation_summary<P: AsRef<Path>>(path: P, summary: &[DrawSummary]) -> Result<()> {
    let bytes = csv_bytes(|wtr| {
        wtr.write_record(["period_date", "mean", "std", "p05", "p50", "p95"])?;
        for s in summary {
            wtr.write_record([
                format_period_date(s.period_date),
                s.mean.to_string(),
                s.std.to_string(),
                s.p05.to_string(),
                s.p50.to_string(),
                s.p95.to_string(),
            ])?;
        }
        Ok(())
    })?;
    write_bytes_atomic(path, &bytes)
}

pub fn write_prescription<P: AsRef<Path>>(path: P, prescription: &Prescription) -> Result<()> {
    if !prescription.status.is_optimal() {
        return Err(Error::InfeasibleAllocation {
            status: prescription.status,
            reason: "refusing to write a non-optimal prescription".to_string(),
        });
    }

    let bytes = csv_bytes(|wtr| {
        wtr.write_record(["period_date", "optimal_spend", "estimated_net_new"])?;
        for r in &prescription.records {
            wtr.write_record([
                format_period_date(r.period_date),
                r.optimal_spend.to_string(),
                r.estimated_net_new.to_string(),
            ])?;
        }
        Ok(())
    })?;
    write_bytes_atomic(path, &bytes)
}

pub fn read_prescriptions<P: AsRef<Path>>(path: P) -> Result<Vec<PrescriptionRecord>> {
    let table = Table::open(path.as_ref())?;
    let date_col = table.column("period_date")?;
    let spend_col = table.column("optimal_spend")?;
    let estimate_col = table.column("estimated_net_new")?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(line, row)| -> Result<PrescriptionRecord> {
            Ok(PrescriptionRecord {
                period_date: table.date(row, line, date_col)?,
                optimal_spend: table.float(row, line, spend_col)?,
                estimated_net_new: table.float(row, line, estimate_col)?,
            })
        })
        .collect()
}
