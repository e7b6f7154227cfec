use std::path::{Path, PathBuf};

/// Returns `path` with `suffix` appended after the existing extension,
/// e.g. `Case_Def.xml` + `.bak` -> `Case_Def.xml.bak`.
pub fn appended_extension(path: &Path, suffix: &str) -> PathBuf {
    path.with_extension({
        let mut os = path.extension().map(|e| e.to_os_string()).unwrap_or_default();
        os.push(suffix);
        os
    })
}

/// Copies `path` to a sibling backup file and returns the backup path.
pub fn backup_file<P: AsRef<Path>>(path: P, suffix: &str) -> std::io::Result<PathBuf> {
    let path = path.as_ref();
    let backup = appended_extension(path, suffix);
    std::fs::copy(path, &backup)?;
    Ok(backup)
}

/// Recursively copies a directory tree. Existing files are overwritten.
pub fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Files in `dir` (non-recursive) whose extension matches `ext`, sorted by
/// name. Extension comparison ignores case since the toolchain's own outputs
/// mix `.bi4` and `.Bi4` depending on platform.
pub fn files_with_extension(dir: &Path, ext: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match path.extension() {
            Some(e) if e.to_string_lossy().eq_ignore_ascii_case(ext) => found.push(path),
            _ => {}
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn appended_extension_stacks_suffixes() {
        let p = Path::new("/tmp/Case_Def.xml");
        assert_eq!(
            appended_extension(p, ".bak"),
            PathBuf::from("/tmp/Case_Def.xml.bak")
        );
        assert_eq!(
            appended_extension(p, ".preclean.bak"),
            PathBuf::from("/tmp/Case_Def.xml.preclean.bak")
        );
    }

    #[test]
    fn backup_copies_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("case.xml");
        fs::write(&file, "<case/>").unwrap();

        let bak = backup_file(&file, ".bak").unwrap();
        assert_eq!(bak, dir.path().join("case.xml.bak"));
        assert_eq!(fs::read_to_string(&bak).unwrap(), "<case/>");
        assert!(file.exists(), "original must survive the backup");
    }

    #[test]
    fn copy_dir_all_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("data");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("sub/b.txt"), "b").unwrap();

        let dst = dir.path().join("variant/data");
        copy_dir_all(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("sub/b.txt")).unwrap(), "b");
    }

    #[test]
    fn extension_filter_ignores_case_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Part_0002.bi4"), "").unwrap();
        fs::write(dir.path().join("Part_0001.Bi4"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let found = files_with_extension(dir.path(), "bi4").unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Part_0001.Bi4", "Part_0002.bi4"]);
    }
}
