/// Per-variant run records and the sweep summary CSV
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config;
use crate::sweep::Variant;
use crate::units::AngleUnit;
use crate::utils::fmt_g;

/// Outcome of one processed variant, written into its directory as JSON so
/// post-processing scripts don't have to scrape console output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub variant: String,
    pub dp: f64,
    pub time_max: f64,
    pub freq_hz: f64,
    pub ampl: f64,
    pub angle_unit: AngleUnit,
    /// Entries the dp patch logged
    pub dp_changes: usize,
    /// Motion elements rewritten
    pub motion_blocks: usize,
    /// Exit codes; None when the step never ran (missing exe, skipped)
    pub gencase_exit: Option<i32>,
    pub solver_exit: Option<i32>,
    pub partvtk_exit: Option<i32>,
    pub elapsed_secs: f64,
    /// False when GenCase failed and downstream steps were skipped
    pub completed: bool,
}

impl RunRecord {
    pub fn for_variant(variant: &Variant) -> RunRecord {
        RunRecord {
            variant: variant.tag.clone(),
            dp: variant.dp,
            time_max: variant.time_max,
            freq_hz: variant.freq_hz,
            ampl: variant.ampl,
            angle_unit: variant.angle_unit,
            dp_changes: 0,
            motion_blocks: 0,
            gencase_exit: None,
            solver_exit: None,
            partvtk_exit: None,
            elapsed_secs: 0.0,
            completed: false,
        }
    }
}

/// Writes the record as `run_record.json` inside the variant directory.
/// Goes through a temporary file so an interrupted run never leaves a
/// truncated record behind.
pub fn write_run_record(dir: &Path, record: &RunRecord) -> std::io::Result<PathBuf> {
    let path = dir.join(config::RUN_RECORD_NAME);
    let tmp_path = path.with_extension({
        let mut os = path.extension().map(|e| e.to_os_string()).unwrap_or_default();
        os.push(".tmp");
        os
    });
    {
        let file = File::create(&tmp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    }
    std::fs::rename(&tmp_path, &path)?;
    Ok(path)
}

/// Writes one CSV row per processed variant.
pub fn export_sweep_summary(
    records: &[RunRecord],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(path)?;
    writeln!(
        file,
        "variant,dp,time_max,freq_hz,ampl,angle_unit,gencase_exit,solver_exit,partvtk_exit,elapsed_secs,completed"
    )?;
    for record in records {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{:.2},{}",
            record.variant,
            fmt_g(record.dp),
            fmt_g(record.time_max),
            fmt_g(record.freq_hz),
            fmt_g(record.ampl),
            record.angle_unit,
            exit_str(record.gencase_exit),
            exit_str(record.solver_exit),
            exit_str(record.partvtk_exit),
            record.elapsed_secs,
            record.completed
        )?;
    }
    println!("✓ Sweep summary exported to: {}", path.display());
    Ok(())
}

fn exit_str(code: Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RunRecord {
        let variant = Variant::new(0.01, -1.0, 0.5, 8.0, AngleUnit::Degrees);
        let mut record = RunRecord::for_variant(&variant);
        record.dp_changes = 5;
        record.motion_blocks = 1;
        record.gencase_exit = Some(0);
        record.elapsed_secs = 12.25;
        record.completed = true;
        record
    }

    #[test]
    fn run_record_lands_as_parseable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_run_record(dir.path(), &record()).unwrap();
        assert_eq!(path, dir.path().join(config::RUN_RECORD_NAME));

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: RunRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.variant, "dp-0p01__t-neg1__f-0p5__a-8deg");
        assert_eq!(loaded.gencase_exit, Some(0));
        assert_eq!(loaded.solver_exit, None);
        assert!(loaded.completed);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp file must be renamed away");
    }

    #[test]
    fn summary_rows_use_na_for_skipped_steps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep_summary.csv");
        export_sweep_summary(&[record()], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("variant,dp,time_max,freq_hz,ampl,angle_unit,gencase_exit,solver_exit,partvtk_exit,elapsed_secs,completed")
        );
        assert_eq!(
            lines.next(),
            Some("dp-0p01__t-neg1__f-0p5__a-8deg,0.01,-1,0.5,8,degrees,0,N/A,N/A,12.25,true")
        );
    }
}
