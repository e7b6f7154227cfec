//! Sweep execution: prepares one directory per parameter variant, patches
//! the case XML inside it, and drives GenCase, the solver, and PartVTK.

use std::fs;
use std::path::Path;
use std::time::Instant;

use xmltree::XMLNode;

use crate::casedef::{
    self, echo_report, preserve_critical_sections, update_dp, update_rotation, update_time_max,
    CaseDoc,
};
use crate::config;
use crate::io::copy_dir_all;
use crate::progress::SweepProgress;
use crate::sweep::{export_sweep_summary, write_run_record, RunRecord, SweepConfig, Variant};
use crate::toolchain::{ensure_vtk, run_gencase, run_solver, ToolPaths};
use crate::utils::fmt_g;

/// Runs a configured parameter sweep against a source `*_Def.xml` case.
///
/// Each variant gets its own sibling directory named `<base>__<tag>`,
/// holding a patched copy of the case plus everything the toolchain
/// produces. The source file itself is never modified.
pub struct SweepRunner {
    config: SweepConfig,
    tools: ToolPaths,
}

impl SweepRunner {
    pub fn new(config: SweepConfig, tools: ToolPaths) -> Self {
        SweepRunner { config, tools }
    }

    /// Prints the planned variants without touching the filesystem.
    pub fn list_variants(&self) {
        let variants = self.config.variants();
        println!(
            "\nPlanned variants for {} ({} total):\n",
            self.config.case_xml,
            variants.len()
        );
        for variant in &variants {
            println!("  [{}]", variant.tag);
            println!("      dp: {} m", fmt_g(variant.dp));
            if variant.time_max >= 0.0 {
                println!("      TimeMax: {} s", fmt_g(variant.time_max));
            } else {
                println!("      TimeMax: case default");
            }
            println!(
                "      motion: freq={} Hz, ampl={} {}",
                fmt_g(variant.freq_hz),
                fmt_g(variant.ampl),
                variant.angle_unit.label()
            );
            println!();
        }
    }

    /// Loads the source case and runs every planned variant.
    pub fn run_all(&self) -> Result<(), Box<dyn std::error::Error>> {
        let source = self.load_source()?;
        self.run_with_source(&source)
    }

    /// Runs a single variant picked by its tag, e.g. `dp-0p01__t-neg1__f-0p5__a-8deg`.
    pub fn run_variant_by_tag(&self, tag: &str) -> Result<(), Box<dyn std::error::Error>> {
        let selected: Vec<Variant> = self
            .config
            .variants()
            .into_iter()
            .filter(|v| v.tag == tag)
            .collect();
        if selected.is_empty() {
            return Err(format!("Variant '{}' not found", tag).into());
        }
        let source = self.load_source()?;
        self.process_variants(&source, &selected)?;
        Ok(())
    }

    /// Runs every variant against an already-loaded source document, then
    /// writes the sweep summary CSV next to the source XML.
    pub fn run_with_source(&self, source: &CaseDoc) -> Result<(), Box<dyn std::error::Error>> {
        let variants = self.config.variants();
        let records = self.process_variants(source, &variants)?;
        let summary = self.config.case_dir().join(config::SUMMARY_CSV_NAME);
        export_sweep_summary(&records, &summary)?;
        Ok(())
    }

    fn load_source(&self) -> Result<CaseDoc, Box<dyn std::error::Error>> {
        let path = Path::new(&self.config.case_xml);
        if !path.exists() {
            return Err(format!("XML not found: {}", path.display()).into());
        }
        let loaded = casedef::load_with_sanitize(path)?;
        if let Some(backup) = &loaded.preclean_backup {
            println!(
                "Note: XML had leading junk; cleaned and saved. Backup at: {}",
                backup.display()
            );
        }
        if loaded.doc.find_nested("execution", "constants").is_none() {
            println!("\n⚠ WARNING: Your original XML is missing <execution><constants> section!");
            println!("  This will cause DualSPHysics to fail.");
            println!("  A minimal constants section will be created in each variant.");
        }
        Ok(loaded.doc)
    }

    fn process_variants(
        &self,
        source: &CaseDoc,
        variants: &[Variant],
    ) -> Result<Vec<RunRecord>, Box<dyn std::error::Error>> {
        let base = self.config.base_name();
        let case_dir = self.config.case_dir();
        let sep = "=".repeat(60);
        let mut progress = SweepProgress::new(variants.len());
        let mut records = Vec::with_capacity(variants.len());

        println!("\n{}", sep);
        println!("Starting batch generation...");
        println!("{}\n", sep);

        for variant in variants {
            let start = Instant::now();
            let mut record = RunRecord::for_variant(variant);

            let case_name = variant.dir_name(&base);
            let variant_dir = case_dir.join(&case_name);
            fs::create_dir_all(&variant_dir)?;

            println!("\n{}", sep);
            println!("Processing: {}", case_name);
            println!("{}", sep);

            // Fresh unpatched copy first so a reload sees exactly what
            // GenCase would read from this directory.
            let def_xml = variant_dir.join(format!("{}{}.xml", base, config::DEF_SUFFIX));
            source.write_to(&def_xml)?;
            self.copy_case_assets(&case_dir, &variant_dir)?;

            let mut doc = casedef::load_with_sanitize(&def_xml)?.doc;

            for note in preserve_critical_sections(&mut doc, source) {
                println!("  {}", note);
            }

            println!("\nApplying parameter updates for {}:", variant.tag);
            let dp_log = update_dp(&mut doc, variant.dp);
            if dp_log.is_empty() {
                println!(
                    "\n  WARNING: No Dp changes were needed - XML might already have dp={}",
                    fmt_g(variant.dp)
                );
                println!("           or the XML structure doesn't match expected patterns!");
            } else {
                println!("\n  Dp update changes made:");
                for entry in dp_log.entries() {
                    println!("  {}", entry);
                }
            }
            record.dp_changes = dp_log.len();

            if variant.time_max >= 0.0 {
                for entry in update_time_max(&mut doc, variant.time_max).entries() {
                    println!("  {}", entry);
                }
            } else {
                println!(
                    "  * Keeping default TimeMax (user specified {})",
                    fmt_g(variant.time_max)
                );
            }

            let motion_blocks = update_rotation(
                &mut doc,
                variant.freq_hz,
                variant.ampl,
                variant.angle_unit,
                variant.time_max,
            );
            println!(
                "  * Updated {} mvrotsinu block(s): freq={} Hz, ampl={} {}",
                motion_blocks,
                fmt_g(variant.freq_hz),
                fmt_g(variant.ampl),
                variant.angle_unit.label()
            );
            record.motion_blocks = motion_blocks;

            match doc.write_with_backup(&def_xml)? {
                Some(backup) => println!(
                    "  Saved {} (backup: {})",
                    file_name(&def_xml),
                    file_name(&backup)
                ),
                None => println!("  Saved {}", file_name(&def_xml)),
            }

            // GenCase wants the XML named after the case, without _Def.
            let gencase_xml = variant_dir.join(format!("{}.xml", base));
            doc.write_to(&gencase_xml)?;
            println!("  Saved {} (for GenCase)", file_name(&gencase_xml));

            match doc.find_nested("execution", "constants") {
                None => {
                    println!("  ⚠ WARNING: <execution><constants> section is MISSING!");
                    println!("             DualSPHysics will fail. Check your original XML.");
                }
                Some(constants) => {
                    let elems = constants
                        .children
                        .iter()
                        .filter(|c| matches!(c, XMLNode::Element(_)))
                        .count();
                    println!("  ✓ Constants section exists with {} child elements", elems);
                }
            }

            let echo = echo_report(&doc);
            println!("\n  XML Verification:");
            println!("    Dp: {}", shown(&echo.dp));
            println!("    TimeMax: {}", shown(&echo.time_max));
            println!("    VResId: {}", shown(&echo.vres_id));
            println!("    Motion unit: {}", shown(&echo.motion_units));
            println!("    Frequency: {} Hz", shown(&echo.motion_freq));
            println!(
                "    Amplitude: {} {}",
                shown(&echo.motion_ampl),
                shown(&echo.motion_units)
            );

            record.gencase_exit =
                run_gencase(&self.tools.gencase, &variant_dir, &base, Some(variant.dp))?;
            if record.gencase_exit != Some(0) {
                println!(
                    "\n[{}] GenCase FAILED, skipping solver for this combo.",
                    variant.tag
                );
                let elapsed = start.elapsed();
                progress.record(elapsed);
                record.elapsed_secs = elapsed.as_secs_f64();
                println!("{}", progress.status_line(&variant.tag, elapsed));
                write_run_record(&variant_dir, &record)?;
                records.push(record);
                continue;
            }

            if self.config.run_solver {
                let outcome = run_solver(
                    self.tools.solver(self.config.solver_mode),
                    &variant_dir,
                    &base,
                )?;
                record.solver_exit = outcome.exit_code;
                record.partvtk_exit = ensure_vtk(&self.tools.partvtk, &outcome.out_dir, &base)?;
            }

            let elapsed = start.elapsed();
            progress.record(elapsed);
            record.elapsed_secs = elapsed.as_secs_f64();
            record.completed = true;

            println!("\n[{}] ✓ COMPLETE", variant.tag);
            println!("  Elapsed: {:.1}s", elapsed.as_secs_f64());
            println!("  Progress: {}/{}", progress.completed(), progress.total());
            println!("  Average time per variant: {:.1}s", progress.average_secs());
            println!(
                "  Estimated remaining: {:.1}s",
                progress.remaining_estimate_secs()
            );

            write_run_record(&variant_dir, &record)?;
            records.push(record);
        }

        println!("\n{}", sep);
        println!("ALL VARIANTS COMPLETE!");
        println!("{}", sep);
        println!("Total variants processed: {}", progress.completed());
        println!(
            "Total time: {:.1}s ({:.1} minutes)",
            progress.total_secs(),
            progress.total_secs() / 60.0
        );
        println!("Average per variant: {:.1}s", progress.average_secs());
        println!("\nNext steps:");
        println!("  1. Check the logs/ folder in each variant for solver output");
        println!("  2. Open ParaView and load the .vtk files from out/ folders");
        println!("  3. Compare particle spacing visually between different dp values");
        println!("  4. If dp still doesn't change, check Run.out files for warnings");

        Ok(records)
    }

    /// Mirrors auxiliary case inputs (geometry meshes, measurement points)
    /// into the variant directory so relative references keep resolving.
    fn copy_case_assets(&self, case_dir: &Path, variant_dir: &Path) -> std::io::Result<()> {
        let data_src = case_dir.join(config::DATA_DIR_NAME);
        if data_src.is_dir() {
            copy_dir_all(&data_src, &variant_dir.join(config::DATA_DIR_NAME))?;
        }
        Ok(())
    }
}

fn shown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("None")
}

fn file_name(path: &Path) -> std::borrow::Cow<'_, str> {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default()
}
