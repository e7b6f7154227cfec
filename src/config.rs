// Centralized configuration for the sweep runner

// ====================
// Sweep Value Defaults
// ====================
// Substituted when a prompt is left blank or a config list is empty.
pub const DEFAULT_DP: f64 = 0.01; // Particle spacing (m)
pub const DEFAULT_TIME_MAX: f64 = -1.0; // Negative keeps the case's own TimeMax
pub const DEFAULT_FREQ_HZ: f64 = 0.5; // Rotation frequency when neither f nor ω given
pub const DEFAULT_AMPL: f64 = 8.0; // Rotation amplitude

// ====================
// Toolchain Executables
// ====================
// Bare names resolve through PATH; the env vars override them with full paths.
pub const GENCASE_EXE: &str = "GenCase";
pub const SOLVER_CPU_EXE: &str = "DualSPHysicsCPU";
pub const SOLVER_GPU_EXE: &str = "DualSPHysicsGPU";
pub const PARTVTK_EXE: &str = "PartVTK";

pub const GENCASE_ENV: &str = "SPH_SWEEP_GENCASE";
pub const SOLVER_CPU_ENV: &str = "SPH_SWEEP_SOLVER_CPU";
pub const SOLVER_GPU_ENV: &str = "SPH_SWEEP_SOLVER_GPU";
pub const PARTVTK_ENV: &str = "SPH_SWEEP_PARTVTK";

// ====================
// Case Layout
// ====================
pub const DEF_SUFFIX: &str = "_Def"; // Case definition XML stem suffix
pub const DATA_DIR_NAME: &str = "data"; // Asset directory copied into each variant
pub const OUT_DIR_NAME: &str = "out"; // Solver output directory inside a variant
pub const LOGS_DIR_NAME: &str = "logs";
pub const SOLVER_LOG_NAME: &str = "dualsphysics.log";

// ====================
// Result Artifacts
// ====================
pub const RUN_RECORD_NAME: &str = "run_record.json"; // Per-variant outcome, written into the variant dir
pub const SUMMARY_CSV_NAME: &str = "sweep_summary.csv"; // One row per variant, written next to the case XML

// Tolerance when comparing the dp echoed by the case generator against the
// requested value.
pub const DP_VERIFY_TOLERANCE: f64 = 1e-10;
