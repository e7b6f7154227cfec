//! DualSPHysics driver. Feeds the solver the XML GenCase wrote (not the
//! case definition) and tees its output into a per-variant log file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::config;
use crate::toolchain::{exe_missing, render_cmd, stream_run, OutputTee};

/// Where the solver put its results and how it exited. A `None` exit code
/// means the solver was never run because the executable is missing.
#[derive(Debug)]
pub struct SolverOutcome {
    pub out_dir: PathBuf,
    pub exit_code: Option<i32>,
}

/// Runs the solver for one case directory. Output lands in `out/`, the tool
/// log in `logs/dualsphysics.log`.
pub fn run_solver(exe: &Path, case_dir: &Path, base: &str) -> io::Result<SolverOutcome> {
    let out_dir = case_dir.join(config::OUT_DIR_NAME);
    fs::create_dir_all(&out_dir)?;
    let logs_dir = case_dir.join(config::LOGS_DIR_NAME);
    fs::create_dir_all(&logs_dir)?;
    let solver_log = logs_dir.join(config::SOLVER_LOG_NAME);

    if exe_missing(exe) {
        println!(
            "WARNING: DualSPHysics exe not found at {}. Skipping solver.",
            exe.display()
        );
        return Ok(SolverOutcome {
            out_dir,
            exit_code: None,
        });
    }

    let xmls = xml_files_by_mtime(case_dir)?;
    let run_xml = match pick_run_xml(&xmls, base) {
        Some(xml) => {
            let name = xml.file_name().and_then(|n| n.to_str()).unwrap_or("");
            println!("  >> Using GenCase output XML: {}", name);
            xml
        }
        None => {
            println!("  !! WARNING: Could not find GenCase output XML (e.g., '0.01.xml')");
            let names: Vec<&str> = xmls
                .iter()
                .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
                .collect();
            println!("     Available XML files: {:?}", names);
            println!("     Trying to use {}.xml anyway...", base);
            case_dir.join(format!("{}.xml", base))
        }
    };
    let run_name = run_xml
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(base)
        .to_string();

    let args = vec![
        run_name,
        case_dir.display().to_string(),
        "-sv:binx,vtk".to_string(),
        "-svdomainvtk:1".to_string(),
        "-svnormals:1".to_string(),
        "-svres".to_string(),
        "-dirout".to_string(),
        out_dir.display().to_string(),
    ];
    println!(
        "\n> Running DualSPHysics (VTK on):\n {}",
        render_cmd(exe, &args)
    );

    let tee = Arc::new(Mutex::new(OutputTee::with_log(&solver_log)?));
    let mut cmd = Command::new(exe);
    cmd.args(&args).current_dir(case_dir);
    let rc = match stream_run(&mut cmd, &tee) {
        Ok(rc) => rc,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            println!(
                "WARNING: DualSPHysics exe not found at {}. Skipping solver.",
                exe.display()
            );
            return Ok(SolverOutcome {
                out_dir,
                exit_code: None,
            });
        }
        Err(e) => return Err(e),
    };
    tee.lock().log_note(&format!("\n[Return code: {}]", rc));

    println!("\nDualSPHysics return code: {}", rc);
    if rc != 0 {
        let dir_name = case_dir.file_name().and_then(|n| n.to_str()).unwrap_or(".");
        println!(
            "!! Solver failed for {}. Check {} for details.",
            dir_name,
            solver_log.display()
        );
    }
    Ok(SolverOutcome {
        out_dir,
        exit_code: Some(rc),
    })
}

/// All XML files in the directory, newest modification first.
fn xml_files_by_mtime(case_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<(PathBuf, SystemTime)> = Vec::new();
    for entry in fs::read_dir(case_dir)? {
        let path = entry?.path();
        let is_xml = path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("xml"));
        if !is_xml {
            continue;
        }
        let mtime = fs::metadata(&path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((path, mtime));
    }
    files.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(files.into_iter().map(|(p, _)| p).collect())
}

/// Newest XML that is neither the case definition, the patched case, nor the
/// `_Actual` echo GenCase writes. What remains is GenCase's run XML, which
/// carries whatever name the dp tag produced.
fn pick_run_xml(sorted_xmls: &[PathBuf], base: &str) -> Option<PathBuf> {
    let excluded = [
        format!("{}{}", base, config::DEF_SUFFIX),
        base.to_string(),
        format!("{}_Actual", base),
    ];
    sorted_xmls
        .iter()
        .find(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map_or(false, |stem| !excluded.iter().any(|e| e == stem))
        })
        .cloned()
}
