use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::simulation::cyclone::TIME_STEP_HOURS;
use crate::simulation::pressure::MAX_CELLS_PER_LAYER;
use crate::simulation::SimulationContext;

/// A run snapshot found on disk, identified by its file name.
#[derive(Debug, Clone)]
pub struct SnapshotMetadata {
    pub path: PathBuf,
    pub tick_count: u64,
    pub timestamp: u64,
    pub file_size: u64,
}

#[derive(Debug)]
pub enum SnapshotError {
    Io(io::Error),
    Serialize(String),
    Deserialize(String),
    /// Decoded cleanly but describes an impossible run.
    Corrupt { path: PathBuf, reason: String },
    NoValidSnapshots,
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "snapshot I/O failed: {}", e),
            SnapshotError::Serialize(e) => write!(f, "cannot encode run: {}", e),
            SnapshotError::Deserialize(e) => write!(f, "cannot decode run: {}", e),
            SnapshotError::Corrupt { path, reason } => {
                write!(f, "inconsistent snapshot {}: {}", path.display(), reason)
            }
            SnapshotError::NoValidSnapshots => {
                write!(f, "No valid snapshots found. Start a new run with: stormfield run")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<io::Error> for SnapshotError {
    fn from(e: io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

fn snapshot_filename(tick_count: u64, timestamp: u64) -> String {
    format!("run-tick{}-{}.bin", tick_count, timestamp)
}

/// Parse tick count and timestamp from `run-tick{N}-{timestamp}.bin`.
fn parse_snapshot_filename(filename: &str) -> Option<(u64, u64)> {
    let stem = filename.strip_suffix(".bin")?;
    let rest = stem.strip_prefix("run-tick")?;
    let (tick_str, ts_str) = rest.split_once('-')?;
    let tick = tick_str.parse::<u64>().ok()?;
    let ts = ts_str.parse::<u64>().ok()?;
    Some((tick, ts))
}

fn unix_timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Check that a decoded context describes a run this crate could have produced.
///
/// A storm's track holds the genesis point plus one point per step, so its length
/// is pinned by the storm's age.
fn check_consistency(ctx: &SimulationContext) -> Result<(), String> {
    if !(1..=12).contains(&ctx.settings.month) {
        return Err(format!("month {} outside 1-12", ctx.settings.month));
    }
    for (layer, cells) in [("upper", &ctx.pressure.upper), ("lower", &ctx.pressure.lower)] {
        if cells.len() > MAX_CELLS_PER_LAYER {
            return Err(format!("{} layer holds {} cells", layer, cells.len()));
        }
    }
    if let Some(storm) = &ctx.cyclone {
        if !storm.intensity.is_finite() {
            return Err("storm intensity is not finite".to_string());
        }
        let expected = (storm.age_hours / TIME_STEP_HOURS).round() as usize + 1;
        if storm.track.len() != expected {
            return Err(format!(
                "track has {} points, age {}h implies {}",
                storm.track.len(),
                storm.age_hours,
                expected
            ));
        }
    }
    Ok(())
}

/// Write `bytes` beside `target` and rename into place; the temp file is removed on failure.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let name = target.file_name().and_then(|n| n.to_str()).unwrap_or("snapshot");
    let tmp = target.with_file_name(format!(".{}.tmp", name));
    fs::write(&tmp, bytes)
        .and_then(|()| fs::rename(&tmp, target))
        .map_err(|e| {
            let _ = fs::remove_file(&tmp);
            SnapshotError::Io(e)
        })
}

/// Save a run snapshot named after its tick. A partial write never clobbers an
/// existing snapshot.
pub fn save_snapshot(ctx: &SimulationContext, snapshot_dir: &Path) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(snapshot_dir)?;

    let encoded = bincode::serialize(ctx).map_err(|e| SnapshotError::Serialize(e.to_string()))?;
    let target = snapshot_dir.join(snapshot_filename(ctx.tick_count, unix_timestamp_now()));
    write_atomic(&target, &encoded)?;

    debug!(
        path = %target.display(),
        tick = ctx.tick_count,
        storm = ?ctx.cyclone.as_ref().map(|c| c.display_name()),
        bytes = encoded.len(),
        "Snapshot written"
    );
    Ok(target)
}

/// Load a context from a snapshot file and check its consistency.
pub fn load_snapshot(path: &Path) -> Result<SimulationContext, SnapshotError> {
    let data = fs::read(path)?;
    let ctx: SimulationContext =
        bincode::deserialize(&data).map_err(|e| SnapshotError::Deserialize(e.to_string()))?;

    check_consistency(&ctx).map_err(|reason| SnapshotError::Corrupt {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(ctx)
}

/// List snapshots in a directory, newest first.
pub fn list_snapshots(snapshot_dir: &Path) -> Result<Vec<SnapshotMetadata>, SnapshotError> {
    if !snapshot_dir.exists() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();

    for entry in fs::read_dir(snapshot_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if filename.starts_with('.') {
            continue;
        }

        if let Some((tick_count, timestamp)) = parse_snapshot_filename(&filename) {
            let file_size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            snapshots.push(SnapshotMetadata {
                path,
                tick_count,
                timestamp,
                file_size,
            });
        }
    }

    snapshots.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then(b.tick_count.cmp(&a.tick_count))
    });

    Ok(snapshots)
}

/// Keep only the `max_snapshots` most recent snapshots. Returns the deleted paths.
pub fn prune_snapshots(snapshot_dir: &Path, max_snapshots: usize) -> Result<Vec<PathBuf>, SnapshotError> {
    let snapshots = list_snapshots(snapshot_dir)?;

    let mut deleted = Vec::new();
    for snapshot in snapshots.iter().skip(max_snapshots) {
        fs::remove_file(&snapshot.path)?;
        deleted.push(snapshot.path.clone());
    }

    Ok(deleted)
}

/// Load the newest snapshot that decodes cleanly, skipping corrupt ones.
pub fn load_latest_valid_snapshot(snapshot_dir: &Path) -> Result<SimulationContext, SnapshotError> {
    for snapshot in &list_snapshots(snapshot_dir)? {
        match load_snapshot(&snapshot.path) {
            Ok(ctx) => return Ok(ctx),
            Err(e) => {
                warn!(
                    path = %snapshot.path.display(),
                    error = %e,
                    "Skipping unusable snapshot"
                );
            }
        }
    }

    Err(SnapshotError::NoValidSnapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::genesis::{GenesisKind, GenesisParams};
    use crate::config::simulation::SimulationConfig;
    use crate::simulation::execute_tick;
    use crate::world::environment::UniformEnvironment;
    use tempfile::TempDir;

    fn make_context(ticks: usize) -> SimulationContext {
        let mut ctx = SimulationContext::new(&SimulationConfig {
            seed: 42,
            ..SimulationConfig::default()
        });
        ctx.spawn(&GenesisParams {
            kind: GenesisKind::Tropical,
            ..GenesisParams::new(-40.0, 13.0)
        });
        let env = UniformEnvironment::open_ocean(28.5, 70.0).into_environment();
        for _ in 0..ticks {
            execute_tick(&mut ctx, &env);
        }
        ctx
    }

    #[test]
    fn save_and_load_round_trip_identical() {
        let dir = TempDir::new().unwrap();
        let ctx = make_context(6);

        let path = save_snapshot(&ctx, dir.path()).unwrap();
        let restored = load_snapshot(&path).unwrap();

        assert_eq!(ctx, restored);
        assert_eq!(restored.forecasts.len(), 3);
    }

    #[test]
    fn restored_run_continues_identically() {
        let dir = TempDir::new().unwrap();
        let env = UniformEnvironment::open_ocean(28.5, 70.0).into_environment();
        let mut live = make_context(4);
        let path = save_snapshot(&live, dir.path()).unwrap();
        let mut restored = load_snapshot(&path).unwrap();

        for _ in 0..6 {
            execute_tick(&mut live, &env);
            execute_tick(&mut restored, &env);
        }
        assert_eq!(live.cyclone, restored.cyclone);
        assert_eq!(live.rng, restored.rng);
    }

    #[test]
    fn snapshot_filename_parse_round_trip() {
        let filename = snapshot_filename(480, 1_790_000_000);
        assert_eq!(filename, "run-tick480-1790000000.bin");
        assert_eq!(parse_snapshot_filename(&filename), Some((480, 1_790_000_000)));
    }

    #[test]
    fn parse_invalid_filename_returns_none() {
        assert!(parse_snapshot_filename("random.bin").is_none());
        assert!(parse_snapshot_filename("run-tick.bin").is_none());
        assert!(parse_snapshot_filename("run-tickabc-123.bin").is_none());
        assert!(parse_snapshot_filename("run-tick100-abc.bin").is_none());
        assert!(parse_snapshot_filename("world-tick100-123.bin").is_none());
    }

    #[test]
    fn list_sorted_newest_first_and_skips_others() {
        let dir = TempDir::new().unwrap();
        let data = bincode::serialize(&make_context(0)).unwrap();

        fs::write(dir.path().join("run-tick10-1000.bin"), &data).unwrap();
        fs::write(dir.path().join("run-tick30-3000.bin"), &data).unwrap();
        fs::write(dir.path().join("run-tick20-2000.bin"), &data).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a snapshot").unwrap();
        fs::write(dir.path().join(".run-tick99-9999.bin.tmp"), "temp file").unwrap();

        let snapshots = list_snapshots(dir.path()).unwrap();
        let ticks: Vec<u64> = snapshots.iter().map(|s| s.tick_count).collect();
        assert_eq!(ticks, vec![30, 20, 10]);
    }

    #[test]
    fn list_snapshots_nonexistent_dir() {
        let snapshots = list_snapshots(Path::new("/tmp/nonexistent_stormfield_dir_4711")).unwrap();
        assert!(snapshots.is_empty());
    }

    #[test]
    fn prune_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let data = bincode::serialize(&make_context(0)).unwrap();
        for i in 0..6u64 {
            fs::write(dir.path().join(format!("run-tick{}-{}.bin", i * 40, 1000 + i)), &data).unwrap();
        }

        let deleted = prune_snapshots(dir.path(), 3).unwrap();
        assert_eq!(deleted.len(), 3);

        let remaining: Vec<u64> = list_snapshots(dir.path())
            .unwrap()
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(remaining, vec![1005, 1004, 1003]);

        assert!(prune_snapshots(dir.path(), 5).unwrap().is_empty());
    }

    #[test]
    fn garbage_and_truncated_files_rejected() {
        let dir = TempDir::new().unwrap();
        let garbage = dir.path().join("run-tick0-1000.bin");
        fs::write(&garbage, b"this is not valid bincode data").unwrap();
        assert!(load_snapshot(&garbage).is_err());

        let data = bincode::serialize(&make_context(2)).unwrap();
        let truncated = dir.path().join("run-tick2-1001.bin");
        fs::write(&truncated, &data[..data.len() / 2]).unwrap();
        assert!(load_snapshot(&truncated).is_err());
    }

    #[test]
    fn inconsistent_track_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let mut ctx = make_context(3);
        if let Some(storm) = ctx.cyclone.as_mut() {
            storm.track.pop();
        }
        let path = dir.path().join("run-tick3-1000.bin");
        fs::write(&path, bincode::serialize(&ctx).unwrap()).unwrap();

        assert!(matches!(load_snapshot(&path), Err(SnapshotError::Corrupt { .. })));
    }

    #[test]
    fn load_latest_valid_falls_back_on_corrupt() {
        let dir = TempDir::new().unwrap();
        let ctx = make_context(2);

        fs::write(dir.path().join("run-tick2-1000.bin"), bincode::serialize(&ctx).unwrap()).unwrap();
        fs::write(dir.path().join("run-tick4-2000.bin"), b"corrupt data here").unwrap();

        let restored = load_latest_valid_snapshot(dir.path()).unwrap();
        assert_eq!(restored.tick_count, 2);
        assert_eq!(restored.id, ctx.id);
    }

    #[test]
    fn load_latest_valid_without_snapshots() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_latest_valid_snapshot(dir.path()).unwrap_err(),
            SnapshotError::NoValidSnapshots
        ));

        fs::write(dir.path().join("run-tick10-1000.bin"), b"corrupt1").unwrap();
        fs::write(dir.path().join("run-tick20-2000.bin"), b"corrupt2").unwrap();
        assert!(matches!(
            load_latest_valid_snapshot(dir.path()).unwrap_err(),
            SnapshotError::NoValidSnapshots
        ));
    }

    #[test]
    fn atomic_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("snapshots");
        let ctx = make_context(0);

        let path = save_snapshot(&ctx, &nested).unwrap();
        assert!(path.exists());

        let temp_files = fs::read_dir(&nested)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().is_some_and(|n| n.starts_with('.')))
            .count();
        assert_eq!(temp_files, 0);
    }
}
