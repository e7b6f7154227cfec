/// Sweep configuration and variant expansion
///
/// This module provides functionality to:
/// - Describe a parameter sweep (dp, duration, motion) as a TOML-friendly struct
/// - Expand the value lists into the ordered Cartesian product of variants
/// - Encode parameter values as directory-safe tags

pub mod export;

pub use export::{export_sweep_summary, write_run_record, RunRecord};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config;
use crate::toolchain::{SolverMode, ToolPaths};
use crate::units::{omega_to_freq, AngleUnit};
use crate::utils::fmt_g;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Path of the case definition XML (`<base>_Def.xml`)
    pub case_xml: String,

    /// Particle spacing values (m)
    #[serde(default)]
    pub dp_values: Vec<f64>,

    /// Simulation durations (s); negative keeps the case's own TimeMax
    #[serde(default)]
    pub time_max_values: Vec<f64>,

    /// Rotation frequencies (Hz); takes precedence over omega_values
    #[serde(default)]
    pub freq_values: Vec<f64>,

    /// Angular velocities (rad/s), used only when freq_values is empty
    #[serde(default)]
    pub omega_values: Vec<f64>,

    /// Rotation amplitudes, in angle_unit
    #[serde(default)]
    pub ampl_values: Vec<f64>,

    /// Unit of the amplitude values
    #[serde(default = "default_angle_unit")]
    pub angle_unit: AngleUnit,

    /// Run the solver after case generation
    #[serde(default = "default_run_solver")]
    pub run_solver: bool,

    /// Which solver binary to use
    #[serde(default = "default_solver_mode")]
    pub solver_mode: SolverMode,

    /// Explicit GenCase location; unset falls back to the SPH_SWEEP_GENCASE
    /// env var, then the compiled default
    #[serde(default)]
    pub gencase_path: Option<String>,

    /// Explicit CPU solver location
    #[serde(default)]
    pub solver_cpu_path: Option<String>,

    /// Explicit GPU solver location
    #[serde(default)]
    pub solver_gpu_path: Option<String>,

    /// Explicit PartVTK location
    #[serde(default)]
    pub partvtk_path: Option<String>,
}

fn default_angle_unit() -> AngleUnit {
    AngleUnit::Degrees
}

fn default_run_solver() -> bool {
    true
}

fn default_solver_mode() -> SolverMode {
    SolverMode::Cpu
}

impl SweepConfig {
    /// Template with one default value per list, ready to edit.
    pub fn template(case_xml: &str) -> SweepConfig {
        SweepConfig {
            case_xml: case_xml.to_string(),
            dp_values: vec![config::DEFAULT_DP],
            time_max_values: vec![config::DEFAULT_TIME_MAX],
            freq_values: vec![config::DEFAULT_FREQ_HZ],
            omega_values: Vec::new(),
            ampl_values: vec![config::DEFAULT_AMPL],
            angle_unit: AngleUnit::Degrees,
            run_solver: true,
            solver_mode: SolverMode::Cpu,
            gencase_path: None,
            solver_cpu_path: None,
            solver_gpu_path: None,
            partvtk_path: None,
        }
    }

    /// Load sweep configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save sweep configuration to TOML file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Tool locations with explicit config paths layered over env vars and
    /// compiled defaults.
    pub fn tool_paths(&self) -> ToolPaths {
        let mut tools = ToolPaths::from_env();
        if let Some(p) = &self.gencase_path {
            tools.gencase = PathBuf::from(p);
        }
        if let Some(p) = &self.solver_cpu_path {
            tools.solver_cpu = PathBuf::from(p);
        }
        if let Some(p) = &self.solver_gpu_path {
            tools.solver_gpu = PathBuf::from(p);
        }
        if let Some(p) = &self.partvtk_path {
            tools.partvtk = PathBuf::from(p);
        }
        tools
    }

    /// Case name without the definition suffix: `Autoslosh_Def.xml` -> `Autoslosh`.
    pub fn base_name(&self) -> String {
        let stem = Path::new(&self.case_xml)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("case");
        stem.strip_suffix(config::DEF_SUFFIX).unwrap_or(stem).to_string()
    }

    /// Directory the case XML lives in; variant directories are created here.
    pub fn case_dir(&self) -> PathBuf {
        match Path::new(&self.case_xml).parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Frequencies actually swept: explicit frequencies win, then converted
    /// angular velocities, then the compiled default.
    pub fn effective_freqs(&self) -> Vec<f64> {
        if !self.freq_values.is_empty() {
            self.freq_values.clone()
        } else if !self.omega_values.is_empty() {
            self.omega_values.iter().copied().map(omega_to_freq).collect()
        } else {
            vec![config::DEFAULT_FREQ_HZ]
        }
    }

    /// Cartesian product of the value lists, amplitude varying fastest.
    /// Empty lists sweep their single default value.
    pub fn variants(&self) -> Vec<Variant> {
        let dps = defaulted(&self.dp_values, config::DEFAULT_DP);
        let times = defaulted(&self.time_max_values, config::DEFAULT_TIME_MAX);
        let freqs = self.effective_freqs();
        let ampls = defaulted(&self.ampl_values, config::DEFAULT_AMPL);

        let mut out = Vec::with_capacity(dps.len() * times.len() * freqs.len() * ampls.len());
        for &dp in &dps {
            for &t in &times {
                for &f in &freqs {
                    for &a in &ampls {
                        out.push(Variant::new(dp, t, f, a, self.angle_unit));
                    }
                }
            }
        }
        out
    }
}

fn defaulted(values: &[f64], default: f64) -> Vec<f64> {
    if values.is_empty() {
        vec![default]
    } else {
        values.to_vec()
    }
}

/// One parameter combination of the sweep.
#[derive(Debug, Clone)]
pub struct Variant {
    pub dp: f64,
    pub time_max: f64,
    pub freq_hz: f64,
    pub ampl: f64,
    pub angle_unit: AngleUnit,
    /// Directory-safe name, e.g. `dp-0p01__t-neg1__f-0p5__a-8deg`.
    pub tag: String,
}

impl Variant {
    pub fn new(dp: f64, time_max: f64, freq_hz: f64, ampl: f64, angle_unit: AngleUnit) -> Variant {
        let tag = [
            value_tag("dp", dp, ""),
            value_tag("t", time_max, ""),
            value_tag("f", freq_hz, ""),
            value_tag("a", ampl, angle_unit.tag_suffix()),
        ]
        .join("__");
        Variant {
            dp,
            time_max,
            freq_hz,
            ampl,
            angle_unit,
            tag,
        }
    }

    pub fn dir_name(&self, base: &str) -> String {
        format!("{}__{}", base, self.tag)
    }
}

/// Formats one value as a directory-safe tag: shortest float form with `.`
/// replaced by `p`, negatives prefixed `neg`.
pub fn value_tag(prefix: &str, value: f64, unit_suffix: &str) -> String {
    let core = if value < 0.0 {
        format!("neg{}", fmt_g(value.abs())).replace('.', "p")
    } else {
        fmt_g(value).replace('.', "p")
    };
    format!("{}-{}{}", prefix, core, unit_suffix)
}

/// Parses a comma-separated list of floats. Empty pieces are skipped, so
/// `"0.01,"` and `""` are fine; a non-numeric piece is an error.
pub fn parse_value_list(raw: &str) -> Result<Vec<f64>, String> {
    let mut out = Vec::new();
    for piece in raw.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let value: f64 = piece
            .parse()
            .map_err(|_| format!("not a number: '{}'", piece))?;
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(case_xml: &str) -> SweepConfig {
        SweepConfig {
            case_xml: case_xml.to_string(),
            dp_values: Vec::new(),
            time_max_values: Vec::new(),
            freq_values: Vec::new(),
            omega_values: Vec::new(),
            ampl_values: Vec::new(),
            angle_unit: AngleUnit::Degrees,
            run_solver: false,
            solver_mode: SolverMode::Cpu,
            gencase_path: None,
            solver_cpu_path: None,
            solver_gpu_path: None,
            partvtk_path: None,
        }
    }

    #[test]
    fn value_list_parses_and_trims() {
        assert_eq!(parse_value_list("0.01, 0.02 ,0.03"), Ok(vec![0.01, 0.02, 0.03]));
        assert_eq!(parse_value_list("5,"), Ok(vec![5.0]));
        assert_eq!(parse_value_list(""), Ok(vec![]));
        assert_eq!(parse_value_list("  "), Ok(vec![]));
        assert!(parse_value_list("0.01, abc").is_err());
    }

    #[test]
    fn tags_are_directory_safe() {
        assert_eq!(value_tag("dp", 0.01, ""), "dp-0p01");
        assert_eq!(value_tag("t", -1.0, ""), "t-neg1");
        assert_eq!(value_tag("f", 0.5, ""), "f-0p5");
        assert_eq!(value_tag("a", 8.0, "deg"), "a-8deg");
        assert_eq!(value_tag("a", 22.5, "rad"), "a-22p5rad");
    }

    #[test]
    fn variant_tag_joins_all_four_values() {
        let v = Variant::new(0.01, -1.0, 0.5, 8.0, AngleUnit::Degrees);
        assert_eq!(v.tag, "dp-0p01__t-neg1__f-0p5__a-8deg");
        assert_eq!(v.dir_name("Autoslosh"), "Autoslosh__dp-0p01__t-neg1__f-0p5__a-8deg");
    }

    #[test]
    fn base_name_strips_definition_suffix() {
        let config = config_with("/cases/Autoslosh_Def.xml");
        assert_eq!(config.base_name(), "Autoslosh");
        assert_eq!(config.case_dir(), PathBuf::from("/cases"));

        let bare = config_with("Tank.xml");
        assert_eq!(bare.base_name(), "Tank");
        assert_eq!(bare.case_dir(), PathBuf::from("."));
    }

    #[test]
    fn explicit_frequencies_beat_omega() {
        let mut config = config_with("Case_Def.xml");
        config.freq_values = vec![1.0];
        config.omega_values = vec![std::f64::consts::PI];
        assert_eq!(config.effective_freqs(), vec![1.0]);
    }

    #[test]
    fn omega_converts_when_no_frequency_given() {
        let mut config = config_with("Case_Def.xml");
        config.omega_values = vec![std::f64::consts::PI];
        assert_eq!(config.effective_freqs(), vec![0.5]);
    }

    #[test]
    fn empty_lists_sweep_the_defaults() {
        let config = config_with("Case_Def.xml");
        assert_eq!(config.effective_freqs(), vec![crate::config::DEFAULT_FREQ_HZ]);

        let variants = config.variants();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].dp, crate::config::DEFAULT_DP);
        assert_eq!(variants[0].time_max, crate::config::DEFAULT_TIME_MAX);
        assert_eq!(variants[0].ampl, crate::config::DEFAULT_AMPL);
    }

    #[test]
    fn expansion_varies_amplitude_fastest() {
        let mut config = config_with("Case_Def.xml");
        config.dp_values = vec![0.01, 0.02];
        config.time_max_values = vec![2.0];
        config.freq_values = vec![0.5];
        config.ampl_values = vec![4.0, 8.0];

        let tags: Vec<String> = config.variants().into_iter().map(|v| v.tag).collect();
        assert_eq!(
            tags,
            vec![
                "dp-0p01__t-2__f-0p5__a-4deg",
                "dp-0p01__t-2__f-0p5__a-8deg",
                "dp-0p02__t-2__f-0p5__a-4deg",
                "dp-0p02__t-2__f-0p5__a-8deg",
            ]
        );
    }

    #[test]
    fn config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        let path_str = path.to_str().unwrap();

        let mut config = SweepConfig::template("/cases/Autoslosh_Def.xml");
        config.dp_values = vec![0.01, 0.005];
        config.angle_unit = AngleUnit::Radians;
        config.solver_mode = SolverMode::Gpu;
        config.to_file(path_str).unwrap();

        let loaded = SweepConfig::from_file(path_str).unwrap();
        assert_eq!(loaded.case_xml, "/cases/Autoslosh_Def.xml");
        assert_eq!(loaded.dp_values, vec![0.01, 0.005]);
        assert_eq!(loaded.angle_unit, AngleUnit::Radians);
        assert_eq!(loaded.solver_mode, SolverMode::Gpu);
        assert!(loaded.run_solver);
    }

    #[test]
    fn missing_toml_fields_fall_back_to_defaults() {
        let parsed: SweepConfig = toml::from_str(r#"case_xml = "Case_Def.xml""#).unwrap();
        assert!(parsed.dp_values.is_empty());
        assert_eq!(parsed.angle_unit, AngleUnit::Degrees);
        assert!(parsed.run_solver);
        assert_eq!(parsed.solver_mode, SolverMode::Cpu);
        assert!(parsed.gencase_path.is_none());
        assert!(parsed.partvtk_path.is_none());
    }

    #[test]
    fn explicit_tool_paths_override_resolution() {
        let mut config = config_with("Case_Def.xml");
        config.gencase_path = Some("/opt/dsph/bin/GenCase".to_string());
        config.solver_gpu_path = Some("/opt/dsph/bin/DualSPHysics5.2_linux64".to_string());

        let tools = config.tool_paths();
        assert_eq!(tools.gencase, PathBuf::from("/opt/dsph/bin/GenCase"));
        assert_eq!(
            tools.solver(SolverMode::Gpu),
            Path::new("/opt/dsph/bin/DualSPHysics5.2_linux64")
        );
        // Fields left as None keep whatever from_env resolved.
        assert_eq!(tools.partvtk, ToolPaths::from_env().partvtk);
    }
}
