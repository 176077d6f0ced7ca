//! Minute-by-minute churn analysis over one or more shells
//!
//! Timesteps run strictly in sequence: snapshot(t) is fully merged and
//! diffed against snapshot(t-1) before work on t+1 starts.

use crate::config::{InputSource, RunConfig};
use crate::pool::SnapshotWorkerPool;
use crate::stats::StatisticsAggregator;
use crate::targets::{no_targets, select_targets};
use crate::tracker::ChangeTracker;
use crate::visibility::MaxVisibilityDistance;
use crate::{ChangeRecord, Result};
use orbital_mechanics::{loader, PositionProvider, ShellEphemeris};
use rand::Rng;
use tracing::info;

/// How one shell is analyzed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellPlan {
    pub shell: u8,
    pub max_distance: MaxVisibilityDistance,
    /// 0 disables route tracking
    pub targets_per_satellite: usize,
}

impl ShellPlan {
    pub fn new(shell: u8, altitude_km: f64, targets_per_satellite: usize) -> Result<Self> {
        Ok(Self {
            shell,
            max_distance: MaxVisibilityDistance::for_altitude(altitude_km)?,
            targets_per_satellite,
        })
    }
}

/// A loaded shell and its analysis plan
#[derive(Debug, Clone)]
pub struct PreparedShell {
    pub ephemeris: ShellEphemeris,
    pub plan: ShellPlan,
}

/// Load and propagate every shell named by `config`
pub fn prepare_shells(config: &RunConfig) -> Result<Vec<PreparedShell>> {
    match &config.source {
        InputSource::Tle { shells } => {
            let date = config.start.date_naive();
            let mut prepared = Vec::with_capacity(shells.len());
            for shell in shells {
                let plan = ShellPlan::new(
                    shell.shell,
                    shell.altitude_km,
                    shell.targets_per_satellite,
                )?;
                let satellites = loader::load_tle_directory(&shell.directory, date)?;
                let ephemeris = loader::propagate_shell(
                    shell.shell,
                    shell.altitude_km,
                    &satellites,
                    config.start,
                    config.duration_minutes,
                )?;
                prepared.push(PreparedShell { ephemeris, plan });
            }
            Ok(prepared)
        }
        InputSource::LonLat { path, targets_per_satellite } => {
            let ephemeris = loader::load_lon_lat_constellation(path, config.duration_minutes)?;
            let plan =
                ShellPlan::new(ephemeris.shell, ephemeris.altitude_km, *targets_per_satellite)?;
            info!(
                "Satellite height: {} km, max visibility distance: {:.2} km",
                ephemeris.altitude_km,
                plan.max_distance.km()
            );
            Ok(vec![PreparedShell { ephemeris, plan }])
        }
    }
}

/// Analyze one shell: one record per minute after the first.
pub fn analyze_shell<P, R>(
    provider: &P,
    plan: &ShellPlan,
    pool: &SnapshotWorkerPool,
    rng: &mut R,
    progress_interval: usize,
) -> Result<Vec<ChangeRecord>>
where
    P: PositionProvider + ?Sized,
    R: Rng + ?Sized,
{
    let duration = provider.duration_minutes();
    let satellites = provider.satellite_count();
    info!(
        "Analyzing shell {}: {} satellites over {} minutes (max visibility {:.2} km)",
        plan.shell,
        satellites,
        duration,
        plan.max_distance.km()
    );

    if duration == 0 {
        return Ok(Vec::new());
    }

    let initial = provider.positions_at(0)?;
    let targets = if plan.targets_per_satellite > 0 {
        info!("Selecting path targets...");
        select_targets(initial, plan.max_distance, plan.targets_per_satellite, rng)
    } else {
        no_targets(satellites)
    };

    info!("Processing initial state...");
    let mut tracker = ChangeTracker::new(pool.snapshot(initial, plan.max_distance, &targets)?);
    info!(
        "Initial state: {} links, {} tracked routes",
        tracker.previous().links.len(),
        tracker.previous().routes.len()
    );

    let mut records = Vec::with_capacity(duration - 1);
    for minute in 1..duration {
        let positions = provider.positions_at(minute)?;
        let snapshot = pool.snapshot(positions, plan.max_distance, &targets)?;
        let record = tracker.advance(minute, snapshot);

        if progress_interval > 0 && minute % progress_interval == 0 {
            info!(
                shell = plan.shell,
                minute,
                broken_links = record.broken_links,
                path_changes = record.path_changes,
                "Processing network changes {}/{}",
                minute,
                duration - 1
            );
        }
        records.push(record);
    }

    Ok(records)
}

/// Analyze every shell in order and sum their series.
pub fn analyze_network<R: Rng + ?Sized>(
    shells: &[PreparedShell],
    pool: &SnapshotWorkerPool,
    rng: &mut R,
    progress_interval: usize,
) -> Result<StatisticsAggregator> {
    let mut aggregator = StatisticsAggregator::new();
    for shell in shells {
        let records = analyze_shell(&shell.ephemeris, &shell.plan, pool, rng, progress_interval)?;
        aggregator.add_shell(shell.plan.shell, &records)?;
    }
    Ok(aggregator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_mechanics::{Position, PositionTable};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn shell(table: PositionTable, shell: u8, max_km: f64, targets: usize) -> PreparedShell {
        let names = (0..table.satellite_count()).map(|i| i.to_string()).collect();
        PreparedShell {
            ephemeris: ShellEphemeris {
                shell,
                altitude_km: 550.0,
                names,
                positions: table,
            },
            plan: ShellPlan {
                shell,
                max_distance: MaxVisibilityDistance::from_km(max_km).unwrap(),
                targets_per_satellite: targets,
            },
        }
    }

    /// Three satellites on a line; the middle one drifts away at minute 2
    fn drifting_line() -> PositionTable {
        let minute = |middle_y: f64| {
            vec![
                Position::new(0.0, 0.0, 0.0),
                Position::new(10.0, middle_y, 0.0),
                Position::new(20.0, 0.0, 0.0),
            ]
        };
        PositionTable::from_snapshots(vec![minute(0.0), minute(0.0), minute(50.0), minute(50.0)])
            .unwrap()
    }

    #[test]
    fn test_shell_records_start_at_minute_one() {
        let pool = SnapshotWorkerPool::new(Some(2)).unwrap();
        let prepared = shell(drifting_line(), 1, 12.0, 0);
        let mut rng = StdRng::seed_from_u64(0);

        let records =
            analyze_shell(&prepared.ephemeris, &prepared.plan, &pool, &mut rng, 1).unwrap();

        assert_eq!(records.iter().map(|r| r.minute).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(
            records.iter().map(|r| r.broken_links).collect::<Vec<_>>(),
            vec![0, 2, 0]
        );
        assert!(records.iter().all(|r| r.path_changes == 0));
    }

    #[test]
    fn test_network_sums_shells() {
        let pool = SnapshotWorkerPool::new(Some(2)).unwrap();
        let shells = vec![
            shell(drifting_line(), 2, 12.0, 1),
            shell(drifting_line(), 3, 12.0, 0),
        ];
        let mut rng = StdRng::seed_from_u64(9);

        let aggregator = analyze_network(&shells, &pool, &mut rng, 0).unwrap();
        let series = aggregator.series().unwrap();

        assert_eq!(series.broken_links, vec![0, 4, 0]);
        // The only route (0 -> 2 via 1) vanishes rather than reroutes
        assert_eq!(series.path_changes, vec![0, 0, 0]);
        assert_eq!(aggregator.summary().unwrap().broken_links.max, 4);
    }

    #[test]
    fn test_mismatched_durations_rejected() {
        let pool = SnapshotWorkerPool::new(Some(1)).unwrap();
        let short = PositionTable::from_snapshots(vec![
            vec![Position::new(0.0, 0.0, 0.0)],
            vec![Position::new(0.0, 0.0, 0.0)],
        ])
        .unwrap();
        let shells = vec![shell(drifting_line(), 2, 12.0, 0), shell(short, 3, 12.0, 0)];
        let mut rng = StdRng::seed_from_u64(0);

        assert!(analyze_network(&shells, &pool, &mut rng, 0).is_err());
    }
}
