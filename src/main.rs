/// CLI for sweeping DualSPHysics case parameters and batch-running variants
use sph_sweep::casedef;
use sph_sweep::config;
use sph_sweep::runner::SweepRunner;
use sph_sweep::sweep::{parse_value_list, SweepConfig};
use sph_sweep::toolchain::SolverMode;
use sph_sweep::units::AngleUnit;
use sph_sweep::utils::fmt_g;
use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        interactive();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "generate" => generate_sweep_config(&args[2..]),
        "list" => list_variants(&args[2..]),
        "run" => run_variant(&args[2..]),
        "run-all" => run_all_variants(&args[2..]),
        "interactive" => interactive(),
        _ => {
            println!("Unknown command: {}", command);
            print_usage();
        }
    }
}

fn print_usage() {
    println!("\n╔══════════════════════════════════════════════════════════╗");
    println!("║  SPH Sweep Runner - DualSPHysics batch parameter tool  ║");
    println!("╚══════════════════════════════════════════════════════════╝\n");
    println!("Usage: sph_sweep <command> [options]\n");
    println!("Commands:");
    println!("  interactive Prompt for sweep parameters (default with no arguments)");
    println!("  generate    Write a sweep configuration template");
    println!("  list        List the variants a sweep configuration expands to");
    println!("  run         Run a single variant by its directory tag");
    println!("  run-all     Run every variant sequentially\n");
    println!("Examples:");
    println!("  # Write a template pointing at your case");
    println!("  sph_sweep generate sweep.toml Autoslosh_Def.xml\n");
    println!("  # List planned variants");
    println!("  sph_sweep list sweep.toml\n");
    println!("  # Run one variant");
    println!("  sph_sweep run sweep.toml dp-0p02__t-neg1__f-0p5__a-8deg\n");
    println!("  # Run the whole sweep");
    println!("  sph_sweep run-all sweep.toml\n");
}

fn generate_sweep_config(args: &[String]) {
    if args.is_empty() {
        println!("❌ Error: Please specify output file name");
        println!("Usage: sph_sweep generate <output_file.toml> [case_def.xml]");
        return;
    }

    let output_file = &args[0];
    let case_xml = args.get(1).map(String::as_str).unwrap_or("Case_Def.xml");

    let config = SweepConfig::template(case_xml);

    match config.to_file(output_file) {
        Ok(_) => {
            println!("✓ Sweep configuration written: {}", output_file);
            println!("  Edit the value lists, then: sph_sweep run-all {}", output_file);
        }
        Err(e) => {
            println!("❌ Error generating config: {}", e);
        }
    }
}

fn list_variants(args: &[String]) {
    if args.is_empty() {
        println!("❌ Error: Please specify sweep configuration file");
        println!("Usage: sph_sweep list <sweep.toml>");
        return;
    }

    match SweepConfig::from_file(&args[0]) {
        Ok(config) => {
            let tools = config.tool_paths();
            let runner = SweepRunner::new(config, tools);
            runner.list_variants();
        }
        Err(e) => {
            println!("❌ Error loading config: {}", e);
        }
    }
}

fn run_variant(args: &[String]) {
    if args.len() < 2 {
        println!("❌ Error: Please specify config file and variant tag");
        println!("Usage: sph_sweep run <sweep.toml> <variant_tag>");
        return;
    }

    match SweepConfig::from_file(&args[0]) {
        Ok(config) => {
            let tag = &args[1];
            let tools = config.tool_paths();
            let runner = SweepRunner::new(config, tools);
            match runner.run_variant_by_tag(tag) {
                Ok(_) => println!("\n✓ Variant '{}' completed.\n", tag),
                Err(e) => println!("❌ Error running variant: {}\n", e),
            }
        }
        Err(e) => {
            println!("❌ Error loading config: {}", e);
        }
    }
}

fn run_all_variants(args: &[String]) {
    if args.is_empty() {
        println!("❌ Error: Please specify sweep configuration file");
        println!("Usage: sph_sweep run-all <sweep.toml>");
        return;
    }

    match SweepConfig::from_file(&args[0]) {
        Ok(config) => {
            let tools = config.tool_paths();
            let runner = SweepRunner::new(config, tools);
            match runner.run_all() {
                Ok(_) => {}
                Err(e) => println!("❌ Error running sweep: {}\n", e),
            }
        }
        Err(e) => {
            println!("❌ Error loading config: {}", e);
        }
    }
}

/// Prompt-driven sweep setup, mirroring what most users actually do:
/// point at a `_Def.xml`, type a few comma-separated lists, go.
fn interactive() {
    println!("=== SPH batch runner ===");
    println!("{}", "=".repeat(60));

    let raw = prompt("\nPath to *_Def.xml (e.g., C:\\Users\\you\\Autoslosh_Def.xml): ");
    let xml_path = raw.trim().trim_matches('"').trim();
    if xml_path.is_empty() {
        println!("No XML path provided.");
        process::exit(1);
    }
    if !Path::new(xml_path).exists() {
        println!("XML not found: {}", xml_path);
        process::exit(1);
    }

    let loaded = match casedef::load_with_sanitize(xml_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            println!("ERROR: Cannot parse XML even after sanitize attempt: {}", e);
            process::exit(2);
        }
    };
    if let Some(backup) = &loaded.preclean_backup {
        println!(
            "Note: XML had leading junk; cleaned and saved. Backup at: {}",
            backup.display()
        );
    }
    let source = loaded.doc;

    if source.find_nested("execution", "constants").is_none() {
        println!("\n⚠ WARNING: Your original XML is missing <execution><constants> section!");
        println!("  This will cause DualSPHysics to fail.");
        println!("  The runner will attempt to create a minimal constants section.");
        println!("  You may need to add proper constants manually to your original XML.");
        let answer = prompt("\n  Continue anyway? (yes/no) [no]: ");
        if !answer.trim().to_lowercase().starts_with('y') {
            println!("Aborting.");
            process::exit(0);
        }
    }

    println!("\n--- Parameter Sweep Configuration ---");

    let dp_values = prompt_value_list(
        &format!("Dp (m) list (comma-separated) [{}]: ", fmt_g(config::DEFAULT_DP)),
        vec![config::DEFAULT_DP],
    );
    let time_max_values = prompt_value_list(
        &format!(
            "Simulation duration TimeMax (s) list (-1 keeps case default) [{}]: ",
            fmt_g(config::DEFAULT_TIME_MAX)
        ),
        vec![config::DEFAULT_TIME_MAX],
    );

    let unit_raw = prompt("Amplitude units (degrees/radians) [degrees]: ");
    let angle_unit = AngleUnit::parse(&unit_raw).unwrap_or(AngleUnit::Degrees);

    let mut freq_values =
        prompt_value_list("Frequency (Hz) list (leave blank to use ω) []: ", Vec::new());
    let mut omega_values = prompt_value_list(
        "Angular velocity ω (rad/s) list (leave blank to use f) []: ",
        Vec::new(),
    );
    // A lone zero means "not specified" for either rate list.
    if freq_values == [0.0] {
        freq_values.clear();
    }
    if omega_values == [0.0] {
        omega_values.clear();
    }

    let ampl_values = prompt_value_list(
        &format!(
            "Amplitude values list ({}) [{}]: ",
            angle_unit.label(),
            fmt_g(config::DEFAULT_AMPL)
        ),
        vec![config::DEFAULT_AMPL],
    );

    let mut sweep = SweepConfig {
        case_xml: xml_path.to_string(),
        dp_values,
        time_max_values,
        freq_values,
        omega_values,
        ampl_values,
        angle_unit,
        run_solver: true,
        solver_mode: SolverMode::Cpu,
        gencase_path: None,
        solver_cpu_path: None,
        solver_gpu_path: None,
        partvtk_path: None,
    };

    let total = sweep.variants().len();
    println!("\nPlanned runs: {} combination(s).", total);
    println!("Total variants to generate: {}", total);
    println!("Base case name: {}", sweep.base_name());
    println!("Case directory: {}", sweep.case_dir().display());

    let auto_run = prompt("\nRun DualSPHysics automatically for each variant? (yes/no) [yes]: ");
    let auto_run = auto_run.trim().to_lowercase();
    sweep.run_solver = auto_run.is_empty() || auto_run.starts_with('y');

    if sweep.run_solver {
        let mode_raw = prompt("Run mode: cpu/gpu [cpu]: ");
        sweep.solver_mode = SolverMode::parse(&mode_raw);
    }

    let tools = sweep.tool_paths();
    let runner = SweepRunner::new(sweep, tools);
    if let Err(e) = runner.run_with_source(&source) {
        println!("❌ Error running sweep: {}", e);
        process::exit(1);
    }
}

fn prompt(message: &str) -> String {
    print!("{}", message);
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim_end_matches(['\r', '\n']).to_string()
}

/// Reads a comma-separated value list; blank keeps the default, a bad
/// token re-prompts instead of aborting a half-typed session.
fn prompt_value_list(message: &str, default: Vec<f64>) -> Vec<f64> {
    loop {
        let raw = prompt(message);
        let raw = raw.trim();
        if raw.is_empty() {
            return default;
        }
        match parse_value_list(raw) {
            Ok(values) => return values,
            Err(e) => println!("  Invalid list ({}), try again.", e),
        }
    }
}
