//! PartVTK fallback. Some solver builds only emit BINX; this converts those
//! to VTK so the results open in ParaView either way.

use std::io;
use std::path::Path;
use std::process::Command;

use crate::io::files_with_extension;
use crate::toolchain::{exe_missing, render_cmd, stream_run_console};

/// Converts BINX output to VTK unless VTK files already exist. Returns the
/// PartVTK exit code, or `Ok(None)` when there was nothing to do or the
/// executable is missing.
pub fn ensure_vtk(exe: &Path, out_dir: &Path, base: &str) -> io::Result<Option<i32>> {
    let vtks = files_with_extension(out_dir, "vtk")?;
    if !vtks.is_empty() {
        println!("VTK check: found {} file(s).", vtks.len());
        return Ok(None);
    }

    let binx = files_with_extension(out_dir, "binx")?;
    if binx.is_empty() {
        println!("No VTKs and no BINX found to convert. Skipping PartVTK.");
        return Ok(None);
    }

    if exe_missing(exe) {
        println!(
            "PartVTK not found at {}. Cannot convert BINX->VTK.",
            exe.display()
        );
        return Ok(None);
    }

    let args = vec![
        out_dir.display().to_string(),
        base.to_string(),
        out_dir.display().to_string(),
        "-savevtk".to_string(),
    ];
    println!(
        "\n> Converting BINX->VTK with PartVTK (streaming):\n {}",
        render_cmd(exe, &args)
    );
    let mut cmd = Command::new(exe);
    cmd.args(&args).current_dir(out_dir);
    let rc = match stream_run_console(&mut cmd) {
        Ok(rc) => rc,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            println!(
                "PartVTK not found at {}. Cannot convert BINX->VTK.",
                exe.display()
            );
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    println!("\nPartVTK return code: {}", rc);

    let after = files_with_extension(out_dir, "vtk")?;
    println!("PartVTK VTK files: {}", after.len());
    Ok(Some(rc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn existing_vtk_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Part_0000.vtk"), "x").unwrap();
        let rc = ensure_vtk(Path::new("/nope/PartVTK"), dir.path(), "Case").unwrap();
        assert_eq!(rc, None);
    }

    #[test]
    fn nothing_to_convert_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let rc = ensure_vtk(Path::new("/nope/PartVTK"), dir.path(), "Case").unwrap();
        assert_eq!(rc, None);
    }

    #[test]
    fn binx_without_tool_is_reported_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Part_0000.binx"), "x").unwrap();
        let exe = dir.path().join("bin/PartVTK");
        let rc = ensure_vtk(&exe, dir.path(), "Case").unwrap();
        assert_eq!(rc, None);
    }
}
