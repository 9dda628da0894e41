//! Amplitude sweeps and their construction from raw `$S`/`$s`/`$z` bodies.
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use thiserror::Error;

use super::records::Configuration;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SweepError {
    #[error("sweep of {0} points received before any configuration")]
    NoConfiguration(usize),

    #[error("sweep size {received} != configured {configured} points")]
    SizeMismatch { received: usize, configured: usize },
}

/// One captured sweep: frequency (Hz, ascending) to amplitude (dBm).
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub timestamp: DateTime<Local>,
    pub amplitudes: BTreeMap<u64, f64>,
}

impl Sweep {
    /// Build a sweep from raw amplitude bytes under the configuration in force.
    /// The payload must carry exactly one byte per configured point.
    pub fn build(
        config: Option<&Configuration>,
        data: &[u8],
        timestamp: DateTime<Local>,
    ) -> Result<Self, SweepError> {
        let config = config.ok_or(SweepError::NoConfiguration(data.len()))?;
        if data.len() != config.sweep_points {
            return Err(SweepError::SizeMismatch {
                received: data.len(),
                configured: config.sweep_points,
            });
        }
        let amplitudes = data
            .iter()
            .enumerate()
            .map(|(i, &raw)| {
                (
                    config
                        .start_freq
                        .saturating_add(config.freq_step.saturating_mul(i as u64)),
                    config.amp_offset as f64 - 0.5 * raw as f64,
                )
            })
            .collect();
        Ok(Sweep {
            timestamp,
            amplitudes,
        })
    }

    pub fn frequencies(&self) -> impl Iterator<Item = u64> + '_ {
        self.amplitudes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(points: usize) -> Configuration {
        Configuration::parse(&format!("100000,10,-10,-120,{points},0,0,1,2,3,0,-3,0")).unwrap()
    }

    #[test]
    fn builds_frequency_plan_and_amplitudes() {
        let cfg = config(3);
        let sweep = Sweep::build(Some(&cfg), &[10, 20, 30], Local::now()).unwrap();
        let entries: Vec<(u64, f64)> = sweep.amplitudes.into_iter().collect();
        assert_eq!(
            entries,
            vec![
                (100_000_000, -8.0),
                (100_010_000, -13.0),
                (100_020_000, -18.0)
            ]
        );
    }

    #[test]
    fn requires_configuration() {
        assert_eq!(
            Sweep::build(None, &[1, 2], Local::now()),
            Err(SweepError::NoConfiguration(2))
        );
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let cfg = config(4);
        assert_eq!(
            Sweep::build(Some(&cfg), &[1, 2, 3], Local::now()),
            Err(SweepError::SizeMismatch {
                received: 3,
                configured: 4
            })
        );
    }
}
