//! Packaged data source (`.tdsx`) handling
//!
//! A `.tdsx` is a zip archive; the extract itself sits at
//! `Data/Extracts/<name>.hyper` inside it.

use super::error::ExtractError;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Directory (relative to the unpacked archive) holding `.hyper` extracts
pub const EXTRACTS_SUBDIR: &str = "Data/Extracts";

/// Unpack every entry of `archive` into `dest`. Returns the entry count.
pub fn unpack_archive(archive: &Path, dest: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    let entries = zip.len();

    std::fs::create_dir_all(dest)?;
    zip.extract(dest)?;

    log::info!(
        "📦 Unpacked {} entries from {} into {}",
        entries,
        archive.display(),
        dest.display()
    );
    Ok(entries)
}

/// Find the single `.hyper` file under `<unpacked>/Data/Extracts/`.
pub fn locate_hyper_file(unpacked: &Path) -> Result<PathBuf, ExtractError> {
    let extracts_dir = unpacked.join(EXTRACTS_SUBDIR);
    let pattern = format!(
        "{}/*.hyper",
        glob::Pattern::escape(&extracts_dir.to_string_lossy())
    );

    let mut found = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            found.push(path);
        }
    }

    match found.len() {
        0 => Err(ExtractError::HyperFileNotFound(extracts_dir)),
        1 => Ok(found.remove(0)),
        _ => {
            found.sort();
            Err(ExtractError::AmbiguousHyperFile(found))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_tdsx(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, bytes) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_unpack_and_locate() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("TS_Events.hyper.tdsx");
        write_tdsx(
            &archive,
            &[
                ("TS Events.tds", b"<datasource/>"),
                ("Data/Extracts/TS Events.hyper", b"HyPe"),
            ],
        );

        let dest = dir.path().join("extracted_tdsx");
        assert_eq!(unpack_archive(&archive, &dest).unwrap(), 2);

        let hyper = locate_hyper_file(&dest).unwrap();
        assert_eq!(hyper, dest.join("Data/Extracts/TS Events.hyper"));
        assert_eq!(std::fs::read(hyper).unwrap(), b"HyPe");
    }

    #[test]
    fn test_locate_without_extract() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("live.tdsx");
        write_tdsx(&archive, &[("live.tds", b"<datasource/>")]);

        let dest = dir.path().join("extracted_tdsx");
        unpack_archive(&archive, &dest).unwrap();
        assert!(matches!(
            locate_hyper_file(&dest),
            Err(ExtractError::HyperFileNotFound(_))
        ));
    }

    #[test]
    fn test_locate_rejects_multiple_extracts() {
        let dir = tempfile::tempdir().unwrap();
        let extracts = dir.path().join(EXTRACTS_SUBDIR);
        std::fs::create_dir_all(&extracts).unwrap();
        std::fs::write(extracts.join("a.hyper"), b"").unwrap();
        std::fs::write(extracts.join("b.hyper"), b"").unwrap();

        match locate_hyper_file(dir.path()) {
            Err(ExtractError::AmbiguousHyperFile(paths)) => assert_eq!(paths.len(), 2),
            other => panic!("expected ambiguity error, got {:?}", other),
        }
    }

    #[test]
    fn test_unpack_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.tdsx");
        std::fs::write(&archive, b"definitely not a zip").unwrap();
        assert!(matches!(
            unpack_archive(&archive, &dir.path().join("out")),
            Err(ExtractError::Zip(_))
        ));
    }
}
