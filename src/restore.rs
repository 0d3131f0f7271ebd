//! Restoring the EPD from its SQL dump.
//!
//! The EPD is distributed as a (gzip-compressed) plain SQL dump which is
//! loaded with `psql`. Compressed dumps are expanded into a temporary
//! directory that is removed on every exit path.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use flate2::read::GzDecoder;
use log::{error, info};
use thiserror::Error;

use crate::db::DatabaseCreds;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Failed to read SQL dump '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decompress SQL dump '{path}': {source}")]
    Decompress {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
}

/// Captured output of a successful restore.
#[derive(Debug, Clone)]
pub struct RestoreOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs SQL files against a database with `psql`.
#[derive(Debug, Clone)]
pub struct Restorer {
    program: String,
    creds: DatabaseCreds,
    temp_root: Option<PathBuf>,
}

impl Restorer {
    pub fn new(creds: DatabaseCreds) -> Self {
        Self {
            program: "psql".to_string(),
            creds,
            temp_root: None,
        }
    }

    /// Use a different restore program (path or name on `PATH`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Create decompression directories under `root` instead of the system
    /// temporary directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Command line for restoring `file`.
    pub fn command(&self, file: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-h")
            .arg(&self.creds.host)
            .arg("-p")
            .arg(self.creds.port.to_string())
            .arg("-d")
            .arg(&self.creds.database)
            .arg("-U")
            .arg(&self.creds.user)
            .arg("-f")
            .arg(file);
        cmd
    }

    /// Restore a plain SQL file, blocking until the program exits.
    pub fn restore_sql_dump(&self, file: &Path) -> Result<RestoreOutput, RestoreError> {
        if !file.is_file() {
            return Err(RestoreError::Read {
                path: file.display().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            });
        }
        info!(
            "Loading {} into database at {}:{}...",
            file.display(),
            self.creds.host,
            self.creds.port
        );
        let output = self
            .command(file)
            .output()
            .map_err(|source| RestoreError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            error!("Restore of {} failed ({})", file.display(), output.status);
            if !stdout.is_empty() {
                error!("Restore stdout:\n{}", stdout);
            }
            error!("Restore stderr:\n{}", stderr);
            return Err(RestoreError::Failed {
                program: self.program.clone(),
                status: output.status,
                stdout,
                stderr,
            });
        }

        info!("Restore stdout:\n{}", stdout);
        if !stderr.is_empty() {
            info!("Restore stderr:\n{}", stderr);
        }
        Ok(RestoreOutput { stdout, stderr })
    }

    /// Restore the EPD from its dump, decompressing first if it is gzipped.
    pub fn restore_epd(&self, file: &Path) -> Result<RestoreOutput, RestoreError> {
        if !is_gzip(file)? {
            let output = self.restore_sql_dump(file)?;
            info!("Finished restoring database.");
            return Ok(output);
        }

        let tmpdir = match &self.temp_root {
            Some(root) => tempfile::Builder::new().prefix("epd-restore").tempdir_in(root),
            None => tempfile::Builder::new().prefix("epd-restore").tempdir(),
        }
        .map_err(|source| RestoreError::Decompress {
            path: file.display().to_string(),
            source,
        })?;
        let sql_file = tmpdir.path().join("tmp.sql");

        info!("Uncompressing EPD SQL dump...");
        decompress(file, &sql_file)?;

        // tmpdir is dropped (and removed) on return, whatever the outcome
        let output = self.restore_sql_dump(&sql_file)?;
        info!("Finished restoring database.");
        Ok(output)
    }
}

/// Whether `file` starts with the gzip magic bytes.
pub fn is_gzip(file: &Path) -> Result<bool, RestoreError> {
    let read_err = |source| RestoreError::Read {
        path: file.display().to_string(),
        source,
    };
    let mut magic = [0u8; 2];
    let mut f = File::open(file).map_err(read_err)?;
    match f.read_exact(&mut magic) {
        Ok(()) => Ok(magic == GZIP_MAGIC),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(read_err(e)),
    }
}

fn decompress(src: &Path, dst: &Path) -> Result<u64, RestoreError> {
    let err = |source| RestoreError::Decompress {
        path: src.display().to_string(),
        source,
    };
    let input = File::open(src).map_err(err)?;
    let mut decoder = GzDecoder::new(BufReader::new(input));
    let mut output = BufWriter::new(File::create(dst).map_err(err)?);
    let bytes = io::copy(&mut decoder, &mut output).map_err(err)?;
    output.into_inner().map_err(|e| err(e.into_error()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use rstest::{fixture, rstest};
    use std::io::Write;
    use tempfile::{tempdir, TempDir};

    #[fixture]
    fn creds() -> DatabaseCreds {
        DatabaseCreds::new("localhost", 5442, "postgres", "postgres")
    }

    fn write_gz(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(content.as_bytes()).unwrap();
        enc.finish().unwrap();
        path
    }

    #[rstest]
    fn test_command_line(creds: DatabaseCreds) {
        let cmd = Restorer::new(creds).command(Path::new("db_setup.sql"));
        assert_eq!(cmd.get_program(), "psql");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["-h", "localhost", "-p", "5442", "-d", "postgres", "-U", "postgres", "-f", "db_setup.sql"]
        );
    }

    #[rstest]
    fn test_gzip_detection() {
        let dir = tempdir().unwrap();
        let gz = write_gz(&dir, "dump.sql.gz", "SELECT 1;");
        let plain = dir.path().join("dump.sql");
        std::fs::write(&plain, "SELECT 1;").unwrap();
        let empty = dir.path().join("empty.sql");
        std::fs::write(&empty, "").unwrap();

        assert!(is_gzip(&gz).unwrap());
        assert!(!is_gzip(&plain).unwrap());
        assert!(!is_gzip(&empty).unwrap());
        assert!(matches!(
            is_gzip(&dir.path().join("absent.sql.gz")),
            Err(RestoreError::Read { .. })
        ));
    }

    #[rstest]
    fn test_decompress() {
        let dir = tempdir().unwrap();
        let gz = write_gz(&dir, "dump.sql.gz", "CREATE TABLE entity (e_ int);\n");
        let out = dir.path().join("dump.sql");

        let bytes = decompress(&gz, &out).unwrap();
        assert_eq!(bytes, 30);
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "CREATE TABLE entity (e_ int);\n"
        );
    }

    #[rstest]
    fn test_missing_program_leaves_no_temp_files(creds: DatabaseCreds) {
        let dir = tempdir().unwrap();
        let temp_root = tempdir().unwrap();
        let gz = write_gz(&dir, "dumpall_epd_db.sql.gz", "SELECT 1;");

        let restorer = Restorer::new(creds)
            .with_program("epd-extract-no-such-psql")
            .with_temp_root(temp_root.path());
        let err = restorer.restore_epd(&gz).unwrap_err();

        assert!(matches!(err, RestoreError::Spawn { .. }));
        assert_eq!(std::fs::read_dir(temp_root.path()).unwrap().count(), 0);
    }

    #[rstest]
    fn test_unreachable_host_fails_and_cleans_up() {
        let dir = tempdir().unwrap();
        let temp_root = tempdir().unwrap();
        let gz = write_gz(&dir, "dumpall_epd_db.sql.gz", "SELECT 1;");

        // Nothing listens on port 1; without psql installed this is a spawn failure
        let restorer = Restorer::new(DatabaseCreds::new("127.0.0.1", 1, "postgres", "postgres"))
            .with_temp_root(temp_root.path());
        let err = restorer.restore_epd(&gz).unwrap_err();

        assert!(matches!(
            err,
            RestoreError::Spawn { .. } | RestoreError::Failed { .. }
        ));
        assert_eq!(std::fs::read_dir(temp_root.path()).unwrap().count(), 0);
    }

    #[rstest]
    fn test_missing_sql_file_is_not_handed_to_program(creds: DatabaseCreds) {
        let dir = tempdir().unwrap();
        let err = Restorer::new(creds)
            .with_program("epd-extract-no-such-psql")
            .restore_sql_dump(&dir.path().join("db_setup.sql"))
            .unwrap_err();
        assert!(matches!(err, RestoreError::Read { .. }));
    }

    #[cfg(unix)]
    #[rstest]
    fn test_failing_program_surfaces_status_and_cleans_up(creds: DatabaseCreds) {
        let dir = tempdir().unwrap();
        let temp_root = tempdir().unwrap();
        let gz = write_gz(&dir, "dumpall_epd_db.sql.gz", "SELECT 1;");

        let restorer = Restorer::new(creds)
            .with_program("false")
            .with_temp_root(temp_root.path());
        match restorer.restore_epd(&gz) {
            Err(RestoreError::Failed { program, status, .. }) => {
                assert_eq!(program, "false");
                assert!(!status.success());
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert_eq!(std::fs::read_dir(temp_root.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[rstest]
    fn test_successful_program_output_captured(creds: DatabaseCreds) {
        let dir = tempdir().unwrap();
        let sql = dir.path().join("db_setup.sql");
        std::fs::write(&sql, "CREATE ROLE epd;").unwrap();

        // `echo` prints its arguments, standing in for psql's chatter
        let output = Restorer::new(creds)
            .with_program("echo")
            .restore_sql_dump(&sql)
            .unwrap();
        assert!(output.stdout.contains("-f"));
        assert!(output.stdout.contains("db_setup.sql"));
        assert!(output.stderr.is_empty());
    }
}
