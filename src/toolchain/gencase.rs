//! GenCase driver. Generates the particle geometry for one case and checks
//! that the requested particle spacing actually took effect, since GenCase
//! silently falls back to the XML value when it dislikes the -dp argument.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config;
use crate::io::files_with_extension;
use crate::toolchain::{exe_missing, render_cmd, stream_run_console};
use crate::utils::fmt_g;

/// Forms in which GenCase echoes the spacing it used, most specific first.
static DP_ECHO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Dp:\s*([0-9.eE+-]+)",
        r"(?i)dp=([0-9.eE+-]+)",
        r"(?i)Distance between particles:\s*([0-9.eE+-]+)",
        r"(?i)Particle spacing:\s*([0-9.eE+-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid dp echo regex"))
    .collect()
});

/// Runs GenCase on `{base}.xml` inside `case_dir`. Passing `dp` adds the
/// explicit -dp flag and triggers post-run verification against the log.
///
/// Returns `Ok(None)` when the executable is missing, `Ok(Some(rc))`
/// otherwise.
pub fn run_gencase(
    exe: &Path,
    case_dir: &Path,
    base: &str,
    dp: Option<f64>,
) -> io::Result<Option<i32>> {
    if exe_missing(exe) {
        println!("ERROR: GenCase not found at: {}", exe.display());
        return Ok(None);
    }

    let mut args = vec![base.to_string(), "-save:all".to_string()];
    if let Some(dp) = dp {
        args.push("-dp".to_string());
        args.push(fmt_g(dp));
        println!("  >> Forcing dp={} via command line argument", fmt_g(dp));
    }

    println!(
        "\n> Running GenCase (streaming):\n {}",
        render_cmd(exe, &args)
    );
    let mut cmd = Command::new(exe);
    cmd.args(&args).current_dir(case_dir);
    let rc = match stream_run_console(&mut cmd) {
        Ok(rc) => rc,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            println!("ERROR: GenCase not found at: {}", exe.display());
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    println!("\nGenCase return code: {}", rc);

    if rc == 0 {
        if let Some(dp) = dp {
            verify_gencase_output(case_dir, base, dp);
        }
    }
    Ok(Some(rc))
}

/// Scans the GenCase log for the spacing it reports and compares it with
/// what the sweep asked for.
pub fn verify_gencase_output(case_dir: &Path, base: &str, expected_dp: f64) {
    println!("\n  === POST-GENCASE VERIFICATION ===");

    match first_existing_log(case_dir, base) {
        Some(log_file) => {
            let text = match fs::read(&log_file) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => String::new(),
            };
            match scan_dp_echo(&text) {
                Some(found) => {
                    println!("  GenCase log shows dp = {}", fmt_g(found));
                    if (found - expected_dp).abs() < config::DP_VERIFY_TOLERANCE {
                        println!(
                            "  ✓ VERIFIED: dp matches expected value ({})",
                            fmt_g(expected_dp)
                        );
                    } else {
                        println!(
                            "  ✗ WARNING: dp MISMATCH! Expected {}, got {}",
                            fmt_g(expected_dp),
                            fmt_g(found)
                        );
                        println!("  This means GenCase ignored your dp setting!");
                    }
                }
                None => {
                    let name = log_file.file_name().and_then(|n| n.to_str()).unwrap_or("log");
                    println!("  Could not find dp value in {}", name);
                }
            }
        }
        None => println!("  No GenCase log found in {}", case_dir.display()),
    }

    let bi4_files = files_with_extension(case_dir, "bi4").unwrap_or_default();
    println!("  Generated BI4 files: {}", bi4_files.len());
    if case_dir.join(format!("{}_Actual.xml", base)).exists() {
        println!("  Found {}_Actual.xml (GenCase output)", base);
    }
    println!("  =================================\n");
}

/// First plausible GenCase log, in the order the tool tends to write them.
fn first_existing_log(case_dir: &Path, base: &str) -> Option<PathBuf> {
    [
        case_dir.join("Run.out"),
        case_dir.join(format!("{}_Run.out", base)),
        case_dir.join("log.out"),
    ]
    .into_iter()
    .find(|p| p.exists())
}

/// First dp value any known echo form reports. A capture that fails to parse
/// as a float falls through to the next pattern.
pub fn scan_dp_echo(text: &str) -> Option<f64> {
    for re in DP_ECHO_PATTERNS.iter() {
        if let Some(value) = re
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
        {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_reads_colon_form() {
        let log = "Loading case...\nDp: 0.005\nParticles: 12000\n";
        assert_eq!(scan_dp_echo(log), Some(0.005));
    }

    #[test]
    fn scan_reads_assignment_form_case_insensitively() {
        assert_eq!(scan_dp_echo("config DP=0.02 loaded"), Some(0.02));
    }

    #[test]
    fn scan_reads_prose_forms() {
        assert_eq!(
            scan_dp_echo("Distance between particles: 1.5e-3"),
            Some(0.0015)
        );
        assert_eq!(scan_dp_echo("Particle spacing: 0.01"), Some(0.01));
    }

    #[test]
    fn scan_prefers_the_most_specific_form() {
        let log = "Particle spacing: 0.9\nDp: 0.005\n";
        assert_eq!(scan_dp_echo(log), Some(0.005));
    }

    #[test]
    fn scan_falls_through_unparseable_captures() {
        let log = "marker dp=+-+ garbage\nParticle spacing: 0.02\n";
        assert_eq!(scan_dp_echo(log), Some(0.02));
    }

    #[test]
    fn scan_reports_nothing_on_silent_logs() {
        assert_eq!(scan_dp_echo("no spacing mentioned here"), None);
    }

    #[test]
    fn log_candidates_prefer_run_out() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(first_existing_log(dir.path(), "Case"), None);

        std::fs::write(dir.path().join("log.out"), "x").unwrap();
        assert_eq!(
            first_existing_log(dir.path(), "Case"),
            Some(dir.path().join("log.out"))
        );

        std::fs::write(dir.path().join("Case_Run.out"), "x").unwrap();
        assert_eq!(
            first_existing_log(dir.path(), "Case"),
            Some(dir.path().join("Case_Run.out"))
        );

        std::fs::write(dir.path().join("Run.out"), "x").unwrap();
        assert_eq!(
            first_existing_log(dir.path(), "Case"),
            Some(dir.path().join("Run.out"))
        );
    }

    #[test]
    fn missing_exe_with_directory_component_skips_run() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("bin/GenCase");
        let rc = run_gencase(&exe, dir.path(), "Case", Some(0.01)).unwrap();
        assert_eq!(rc, None);
    }
}
