use std::{fs, path::{Path, PathBuf}};

use located_error::LocatedError;

use anyhow::Result;

mod error;
pub use error::FsError;

/// Attempt to create the parent directories of a path (if needed) and return an error if it failed.
pub fn create_parent_directory(path: &Path) -> Result<()> {
    use FsError::CreateParentDirectory;
    let Some(parent_dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(())
    };
    let loc_msg = || format!("While attempting to create output directory '{}'", parent_dir.display());
    fs::create_dir_all(parent_dir).map_err(CreateParentDirectory).with_loc(loc_msg)?;
    Ok(())
}

/// Attempt to convert a path to string, and return an error if it failed.
pub fn maybe_to_str(path: &Path) -> Result<&str> {
    use FsError::InvalidFilename;
    path.to_str().ok_or(InvalidFilename).loc("While converting path to string")
}

/// Check if a given file already exists ; raise an error if such is the case, and the user did not explicitly
/// allow file overwriting.
/// # Errors
/// - If the provided `path` already exists and the user did not specifically allow for file
///   overwrite using the `--overwrite` argument
pub fn can_write_file(overwrite: bool, path: &Path) -> Result<bool> {
    let loc_msg = "While ensuring that file permissions were appropriate";
    if !overwrite && path.exists() {
        return Err(FsError::OverwriteDisallowed{path: path.to_path_buf()}).loc(loc_msg)
    }
    Ok(true)
}

/// File name of `path`, stripped from its known genotype-file extensions (`.vcf`, `.vcf.gz`, `.vcf.bgz`).
/// e.g. `data/1kg.chr22.vcf.gz` -> `1kg.chr22`
pub fn file_stem(path: &Path) -> Result<String> {
    let name = path.file_name()
        .ok_or_else(|| FsError::MissingFileStem{path: path.to_path_buf()})
        .loc("While extracting file stem")?;
    let name = maybe_to_str(Path::new(name))?;
    let stem = [".vcf.gz", ".vcf.bgz", ".vcf", ".gz", ".bgz"].iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name);
    Ok(stem.to_string())
}

/// Build `<dir>/<prefix>.<suffix>`.
#[must_use]
pub fn output_path(dir: &Path, prefix: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{prefix}.{suffix}"))
}
