//! Typesetting compiler abstraction.
//!
//! A `Compiler` turns filled LaTeX source into document bytes. The real
//! implementation shells out to `pdflatex`; each invocation gets its own
//! temporary working directory, removed on success, failure and timeout.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{ReportError, ReportResult};

/// Source file name inside the working directory.
pub const SOURCE_FILE: &str = "report.tex";
/// Document produced by the compiler inside the working directory.
pub const OUTPUT_FILE: &str = "report.pdf";
/// Combined stdout/stderr of the compiler run.
const CONSOLE_LOG: &str = "compiler-console.log";
/// Lines of compiler output kept as diagnostics.
const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// Trait for document compilers.
pub trait Compiler: Send + Sync {
    /// Returns the compiler name (e.g., "pdflatex").
    fn name(&self) -> &str;

    /// Resolve the executable.
    ///
    /// # Errors
    /// `CompilerUnavailable` if it cannot be found.
    fn locate(&self) -> ReportResult<PathBuf>;

    /// Compile `source` and return the document bytes.
    ///
    /// A `timeout` of zero means no limit.
    fn compile(&self, source: &str, timeout: Duration) -> ReportResult<Vec<u8>>;
}

/// How to find the compiler executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerLocator {
    /// Use exactly this file.
    Path(PathBuf),
    /// Search `PATH` for this program name.
    Program(String),
}

impl CompilerLocator {
    pub fn resolve(&self) -> ReportResult<PathBuf> {
        match self {
            CompilerLocator::Path(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(ReportError::CompilerUnavailable(format!(
                        "{} does not exist",
                        path.display()
                    )))
                }
            }
            CompilerLocator::Program(program) => search_path(program).ok_or_else(|| {
                ReportError::CompilerUnavailable(format!("'{program}' not found on PATH"))
            }),
        }
    }
}

fn search_path(program: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&paths) {
        let candidate = dir.join(program);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = dir.join(format!("{program}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Configuration for the pdflatex compiler.
#[derive(Debug, Clone)]
pub struct PdfLatexConfig {
    pub locator: CompilerLocator,
    /// Extra arguments passed before the source file
    pub extra_args: Vec<String>,
    /// Directory in which per-run working directories are created
    /// (system temp dir when None)
    pub workdir_root: Option<PathBuf>,
}

impl Default for PdfLatexConfig {
    fn default() -> Self {
        PdfLatexConfig {
            locator: CompilerLocator::Program("pdflatex".to_string()),
            extra_args: Vec::new(),
            workdir_root: None,
        }
    }
}

impl PdfLatexConfig {
    pub fn new(locator: CompilerLocator) -> Self {
        PdfLatexConfig {
            locator,
            ..Default::default()
        }
    }

    /// Add extra arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn with_workdir_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workdir_root = Some(root.into());
        self
    }
}

/// pdflatex compiler.
pub struct PdfLatexCompiler {
    config: PdfLatexConfig,
}

impl PdfLatexCompiler {
    pub fn new(config: PdfLatexConfig) -> Self {
        PdfLatexCompiler { config }
    }

    fn workdir(&self) -> ReportResult<tempfile::TempDir> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("equipment-report-");
            b
        };
        let dir = match &self.config.workdir_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        };
        dir.map_err(|e| ReportError::Message(format!("failed to create working directory: {e}")))
    }
}

/// Put the compiler in its own process group so a timeout can kill
/// everything it spawned.
#[cfg(unix)]
fn isolate(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate(_cmd: &mut Command) {}

/// Kill the child and, on unix, the rest of its process group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let killed = Command::new("kill")
            .args(["-s", "KILL", "--", &group])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if !matches!(killed, Ok(status) if status.success()) {
            warn!(pid = child.id(), "failed to signal compiler process group");
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Run a command, killing it (and its process group) once `timeout` elapses.
fn run_with_timeout(mut cmd: Command, timeout: Duration) -> ReportResult<(ExitStatus, u64)> {
    let start = Instant::now();
    isolate(&mut cmd);
    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            ReportError::CompilerUnavailable(format!("failed to spawn compiler: {e}"))
        }
        _ => ReportError::Io(e),
    })?;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, start.elapsed().as_millis() as u64));
        }

        if !timeout.is_zero() && start.elapsed() >= timeout {
            kill_tree(&mut child);
            return Err(ReportError::CompilationTimeout(timeout));
        }

        std::thread::sleep(Duration::from_millis(20));
    }
}

/// Last `n` lines of `text`.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

impl Compiler for PdfLatexCompiler {
    fn name(&self) -> &str {
        "pdflatex"
    }

    fn locate(&self) -> ReportResult<PathBuf> {
        self.config.locator.resolve()
    }

    fn compile(&self, source: &str, timeout: Duration) -> ReportResult<Vec<u8>> {
        let exe = self.locate()?;
        // Dropped (and deleted) on every return path below.
        let workdir = self.workdir()?;
        let dir = workdir.path();

        std::fs::write(dir.join(SOURCE_FILE), source)?;
        let console = File::create(dir.join(CONSOLE_LOG))?;
        let console_err = console.try_clone()?;

        let mut cmd = Command::new(&exe);
        cmd.arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(format!("-output-directory={}", dir.display()));
        for arg in &self.config.extra_args {
            cmd.arg(arg);
        }
        cmd.arg(SOURCE_FILE)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(console))
            .stderr(Stdio::from(console_err));

        debug!(compiler = %exe.display(), workdir = %dir.display(), "invoking compiler");
        let (status, elapsed_ms) = run_with_timeout(cmd, timeout)?;
        let output = std::fs::read_to_string(dir.join(CONSOLE_LOG)).unwrap_or_default();

        if !status.success() {
            warn!(%status, elapsed_ms, "compiler exited with error");
            return Err(ReportError::CompilationFailed {
                status: status.to_string(),
                diagnostics: tail_lines(&output, DIAGNOSTIC_TAIL_LINES),
            });
        }

        let pdf_path = dir.join(OUTPUT_FILE);
        let bytes = std::fs::read(&pdf_path).map_err(|_| ReportError::CompilationFailed {
            status: status.to_string(),
            diagnostics: format!(
                "compiler produced no {OUTPUT_FILE}\n{}",
                tail_lines(&output, DIAGNOSTIC_TAIL_LINES)
            ),
        })?;

        debug!(elapsed_ms, bytes = bytes.len(), "compiler finished");
        Ok(bytes)
    }
}
