/// External DualSPHysics toolchain drivers
///
/// This module provides functionality to:
/// - Resolve the GenCase, solver and PartVTK executables from the environment
/// - Stream tool output to the console (and optionally a log file) live
/// - Run GenCase and verify the particle spacing it actually used
/// - Run the solver and convert its BINX output to VTK when needed

pub mod gencase;
pub mod partvtk;
pub mod process;
pub mod solver;

pub use gencase::run_gencase;
pub use partvtk::ensure_vtk;
pub use process::{render_cmd, stream_run, stream_run_console, OutputTee};
pub use solver::{run_solver, SolverOutcome};

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config;

/// Which solver binary a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverMode {
    Cpu,
    Gpu,
}

impl SolverMode {
    /// Anything starting with 'g' selects the GPU build, everything else CPU.
    pub fn parse(raw: &str) -> SolverMode {
        if raw.trim().to_lowercase().starts_with('g') {
            SolverMode::Gpu
        } else {
            SolverMode::Cpu
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SolverMode::Cpu => "cpu",
            SolverMode::Gpu => "gpu",
        }
    }
}

impl std::fmt::Display for SolverMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Paths of the external executables. Defaults assume the tools are on PATH;
/// the SPH_SWEEP_* environment variables override them.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub gencase: PathBuf,
    pub solver_cpu: PathBuf,
    pub solver_gpu: PathBuf,
    pub partvtk: PathBuf,
}

impl ToolPaths {
    pub fn from_env() -> ToolPaths {
        ToolPaths {
            gencase: env_path(config::GENCASE_ENV, config::GENCASE_EXE),
            solver_cpu: env_path(config::SOLVER_CPU_ENV, config::SOLVER_CPU_EXE),
            solver_gpu: env_path(config::SOLVER_GPU_ENV, config::SOLVER_GPU_EXE),
            partvtk: env_path(config::PARTVTK_ENV, config::PARTVTK_EXE),
        }
    }

    pub fn solver(&self, mode: SolverMode) -> &Path {
        match mode {
            SolverMode::Cpu => &self.solver_cpu,
            SolverMode::Gpu => &self.solver_gpu,
        }
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    match env::var_os(var) {
        Some(v) if !v.is_empty() => PathBuf::from(v),
        _ => PathBuf::from(default),
    }
}

/// A bare name is resolved through PATH at spawn time and cannot be checked
/// up front; only paths with a directory component are pre-checked.
pub(crate) fn exe_missing(path: &Path) -> bool {
    path.components().count() > 1 && !path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_matches_first_letter() {
        assert_eq!(SolverMode::parse("gpu"), SolverMode::Gpu);
        assert_eq!(SolverMode::parse("  GPU  "), SolverMode::Gpu);
        assert_eq!(SolverMode::parse("g"), SolverMode::Gpu);
        assert_eq!(SolverMode::parse("cpu"), SolverMode::Cpu);
        assert_eq!(SolverMode::parse(""), SolverMode::Cpu);
        assert_eq!(SolverMode::parse("anything"), SolverMode::Cpu);
    }

    #[test]
    fn solver_picks_binary_by_mode() {
        let tools = ToolPaths {
            gencase: PathBuf::from("GenCase"),
            solver_cpu: PathBuf::from("cpu-solver"),
            solver_gpu: PathBuf::from("gpu-solver"),
            partvtk: PathBuf::from("PartVTK"),
        };
        assert_eq!(tools.solver(SolverMode::Cpu), Path::new("cpu-solver"));
        assert_eq!(tools.solver(SolverMode::Gpu), Path::new("gpu-solver"));
    }

    #[test]
    fn bare_names_are_never_reported_missing() {
        assert!(!exe_missing(Path::new("GenCase")));
        assert!(exe_missing(Path::new("/definitely/not/here/GenCase")));
    }
}
