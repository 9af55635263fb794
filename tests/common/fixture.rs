use std::{io, env, fs, path::{Path, PathBuf}, ops::Deref, fmt::{self, Formatter, Display}};
use tempfile::TempDir;

pub const TEST_DATA_DIR: &str = "tests/test-data";

/// A test-data file or directory, copied into its own temporary directory.
/// Tests are free to modify it: the original under `tests/test-data` is never touched.
pub struct Fixture {
    path    : PathBuf,
    source  : PathBuf,
    _tempdir: TempDir,
}

impl Fixture {
    /// Reserve a path within a fresh temporary directory, without creating anything.
    pub fn blank(fixture_filename: &str) -> Self {
        let root_dir = env::var("CARGO_MANIFEST_DIR").expect("$CARGO_MANIFEST_DIR");
        let source = Path::new(&root_dir).join(TEST_DATA_DIR).join(fixture_filename);

        let tempdir = tempfile::tempdir().expect("Failed to generate temp directory");
        let name = Path::new(fixture_filename).file_name().expect("Invalid fixture filename");
        let path = tempdir.path().join(name);
        Fixture { _tempdir: tempdir, source, path }
    }

    /// Copy a file (or a directory, recursively) from `tests/test-data`.
    pub fn copy(fixture_filename: &str) -> Self {
        let fixture = Fixture::blank(fixture_filename);
        if fixture.source.is_dir() {
            copy_dir_all(&fixture.source, &fixture.path).expect("Failed to copy directory");
        } else {
            fs::copy(&fixture.source, &fixture.path).expect("Failed to copy Fixture files.");
        }
        fixture
    }

    /// Write a fixture from an in-memory string, e.g. an edited copy of an existing test file.
    pub fn with_contents(fixture_filename: &str, contents: &str) -> Self {
        let fixture = Fixture::blank(fixture_filename);
        fs::write(&fixture.path, contents).expect("Failed to write Fixture contents");
        fixture
    }

    /// Original location of this fixture under `tests/test-data`.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(&dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let destination = dst.as_ref().join(entry.file_name());
        match entry.file_type()?.is_dir() {
            true  => copy_dir_all(entry.path(), destination)?,
            false => { fs::copy(entry.path(), destination)?; },
        }
    }
    Ok(())
}

impl Deref for Fixture {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

impl Display for Fixture {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.to_str().expect("Invalid path (non UTF8 characters ?)"))
    }
}
