//! CSV sweep table: one timestamp column plus one column per frequency (Hz).
//!
//! The header row is taken from the first sweep. Every later sweep must cover exactly the
//! same frequencies; a configuration change mid-run makes the table inconsistent and is
//! reported as [`SweepLogError::FrequencyChange`].
use chrono::{DateTime, Local};
use std::io::Write;
use thiserror::Error;

use crate::rfexplorer::Sweep;

#[derive(Debug, Error)]
pub enum SweepLogError {
    #[error("frequency set changed from {from} to {to} points ({from_range} -> {to_range})")]
    FrequencyChange {
        from: usize,
        to: usize,
        from_range: String,
        to_range: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_range(freqs: &[u64]) -> String {
    match (freqs.first(), freqs.last()) {
        (Some(a), Some(b)) => format!("{}-{} Hz", a, b),
        _ => "empty".to_string(),
    }
}

pub struct SweepLog<W: Write> {
    out: W,
    header: Option<Vec<u64>>,
    first_timestamp: Option<DateTime<Local>>,
    rows: u64,
}

impl<W: Write> SweepLog<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header: None,
            first_timestamp: None,
            rows: 0,
        }
    }

    /// Timestamp of the first sweep written, used to time bounded runs.
    pub fn first_timestamp(&self) -> Option<DateTime<Local>> {
        self.first_timestamp
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn write_sweep(&mut self, sweep: &Sweep) -> Result<(), SweepLogError> {
        let freqs: Vec<u64> = sweep.frequencies().collect();
        match &self.header {
            None => {
                let mut line = String::from("Timestamp");
                for f in &freqs {
                    line.push(',');
                    line.push_str(&f.to_string());
                }
                writeln!(self.out, "{}", line)?;
                self.header = Some(freqs);
                self.first_timestamp = Some(sweep.timestamp);
            }
            Some(header) if *header != freqs => {
                return Err(SweepLogError::FrequencyChange {
                    from: header.len(),
                    to: freqs.len(),
                    from_range: describe_range(header),
                    to_range: describe_range(&freqs),
                });
            }
            Some(_) => {}
        }
        let mut line = sweep.timestamp.to_rfc3339();
        for dbm in sweep.amplitudes.values() {
            line.push(',');
            line.push_str(&dbm.to_string());
        }
        writeln!(self.out, "{}", line)?;
        self.rows += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SweepLogError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfexplorer::Configuration;

    fn sweep(start_khz: u64, data: &[u8]) -> Sweep {
        let cfg = Configuration::parse(&format!(
            "{start_khz},1,0,-100,{},0,0,1,2,3,0,0,0",
            data.len()
        ))
        .unwrap();
        Sweep::build(Some(&cfg), data, Local::now()).unwrap()
    }

    #[test]
    fn header_written_once() {
        let mut log = SweepLog::new(Vec::new());
        log.write_sweep(&sweep(100, &[2, 4])).unwrap();
        log.write_sweep(&sweep(100, &[6, 8])).unwrap();
        assert_eq!(log.rows(), 2);
        let text = String::from_utf8(log.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Timestamp,100000,101000");
        assert!(lines[1].ends_with(",-1,-2"));
        assert!(lines[2].ends_with(",-3,-4"));
    }

    #[test]
    fn frequency_change_is_an_error() {
        let mut log = SweepLog::new(Vec::new());
        log.write_sweep(&sweep(100, &[2, 4])).unwrap();
        let err = log.write_sweep(&sweep(200, &[2, 4])).unwrap_err();
        assert!(matches!(err, SweepLogError::FrequencyChange { from: 2, to: 2, .. }));
        assert_eq!(log.rows(), 1);
    }

    #[test]
    fn first_timestamp_is_the_first_row() {
        let mut log = SweepLog::new(Vec::new());
        assert_eq!(log.first_timestamp(), None);
        let first = sweep(100, &[2, 4]);
        let mut later = sweep(100, &[6, 8]);
        later.timestamp = first.timestamp + chrono::Duration::seconds(5);
        log.write_sweep(&first).unwrap();
        log.write_sweep(&later).unwrap();
        assert_eq!(log.first_timestamp(), Some(first.timestamp));
    }
}
