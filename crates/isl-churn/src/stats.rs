//! Per-minute churn series and summary statistics
//!
//! When several shells are analyzed, the first shell fixes the minute
//! index and later shells are summed onto it element-wise.

use crate::{ChangeRecord, ChurnError, Result};
use serde::{Deserialize, Serialize};

/// Per-minute churn, index 0 = minute 1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChurnSeries {
    pub minutes: Vec<usize>,
    pub broken_links: Vec<u64>,
    pub path_changes: Vec<u64>,
}

impl ChurnSeries {
    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub max: u64,
    pub min: u64,
    pub mean: f64,
}

impl SeriesStats {
    pub fn from_values(values: &[u64]) -> Result<Self> {
        let max = values.iter().copied().max().ok_or(ChurnError::EmptySeries)?;
        let min = values.iter().copied().min().ok_or(ChurnError::EmptySeries)?;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
        Ok(Self { max, min, mean })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChurnSummary {
    pub broken_links: SeriesStats,
    pub path_changes: SeriesStats,
}

#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    series: Option<ChurnSeries>,
    shells: Vec<u8>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one shell's records. The first shell defines the minute index;
    /// every later shell must cover exactly the same minutes.
    pub fn add_shell(&mut self, shell: u8, records: &[ChangeRecord]) -> Result<()> {
        match &mut self.series {
            None => {
                self.series = Some(ChurnSeries {
                    minutes: records.iter().map(|r| r.minute).collect(),
                    broken_links: records.iter().map(|r| r.broken_links).collect(),
                    path_changes: records.iter().map(|r| r.path_changes).collect(),
                });
            }
            Some(series) => {
                let aligned = series.len() == records.len()
                    && series.minutes.iter().zip(records).all(|(m, r)| *m == r.minute);
                if !aligned {
                    return Err(ChurnError::ShellMisaligned {
                        shell,
                        expected: series.len(),
                        found: records.len(),
                    });
                }

                for (i, record) in records.iter().enumerate() {
                    series.broken_links[i] += record.broken_links;
                    series.path_changes[i] += record.path_changes;
                }
            }
        }

        self.shells.push(shell);
        Ok(())
    }

    /// Shells added so far, in order
    pub fn shells(&self) -> &[u8] {
        &self.shells
    }

    pub fn series(&self) -> Option<&ChurnSeries> {
        self.series.as_ref()
    }

    pub fn into_series(self) -> ChurnSeries {
        self.series.unwrap_or_default()
    }

    pub fn summary(&self) -> Result<ChurnSummary> {
        let series = self.series.as_ref().ok_or(ChurnError::EmptySeries)?;
        Ok(ChurnSummary {
            broken_links: SeriesStats::from_values(&series.broken_links)?,
            path_changes: SeriesStats::from_values(&series.path_changes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(values: &[(u64, u64)]) -> Vec<ChangeRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, &(broken_links, path_changes))| ChangeRecord {
                minute: i + 1,
                broken_links,
                path_changes,
            })
            .collect()
    }

    #[test]
    fn test_single_shell_summary() {
        let mut agg = StatisticsAggregator::new();
        agg.add_shell(1, &records(&[(4, 0), (2, 3), (6, 1), (0, 0)])).unwrap();

        let summary = agg.summary().unwrap();
        assert_eq!(summary.broken_links.max, 6);
        assert_eq!(summary.broken_links.min, 0);
        assert!((summary.broken_links.mean - 3.0).abs() < 1e-12);
        assert_eq!(summary.path_changes.max, 3);
        assert!((summary.path_changes.mean - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shells_sum_element_wise() {
        let mut agg = StatisticsAggregator::new();
        agg.add_shell(2, &records(&[(1, 2), (3, 4)])).unwrap();
        agg.add_shell(3, &records(&[(10, 0), (20, 0)])).unwrap();

        let series = agg.series().unwrap();
        assert_eq!(series.minutes, vec![1, 2]);
        assert_eq!(series.broken_links, vec![11, 23]);
        assert_eq!(series.path_changes, vec![2, 4]);
        assert_eq!(agg.shells(), &[2, 3]);
    }

    #[test]
    fn test_misaligned_shell_rejected() {
        let mut agg = StatisticsAggregator::new();
        agg.add_shell(2, &records(&[(1, 2), (3, 4)])).unwrap();

        let err = agg.add_shell(3, &records(&[(1, 1)])).unwrap_err();
        assert!(matches!(
            err,
            ChurnError::ShellMisaligned { shell: 3, expected: 2, found: 1 }
        ));
        // The rejected shell left the series untouched
        assert_eq!(agg.series().unwrap().broken_links, vec![1, 3]);
    }

    #[test]
    fn test_empty_series_has_no_summary() {
        let agg = StatisticsAggregator::new();
        assert!(matches!(agg.summary(), Err(ChurnError::EmptySeries)));

        let mut agg = StatisticsAggregator::new();
        agg.add_shell(1, &[]).unwrap();
        assert!(matches!(agg.summary(), Err(ChurnError::EmptySeries)));
        assert!(agg.into_series().is_empty());
    }
}
