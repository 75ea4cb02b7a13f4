//! Report rendering: template fill, then compile with bounded retries.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::model::{Dataset, Summary};
use crate::{ReportError, ReportResult};

use super::compiler::{Compiler, PdfLatexCompiler, PdfLatexConfig};
use super::template::{fill_template, load_template, new_report_id};

/// Rendering knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Per-invocation compiler timeout (zero = unbounded)
    pub timeout: Duration,
    /// Extra attempts after a retryable failure
    pub retries: u32,
    /// Maximum simultaneous compiler invocations
    pub max_concurrent: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            timeout: Duration::from_secs(120),
            retries: 1,
            max_concurrent: 2,
        }
    }
}

impl RenderOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        RenderOptions {
            timeout: config.compile_timeout(),
            retries: config.compile_retries,
            max_concurrent: config.max_concurrent_renders,
        }
    }
}

/// A rendered document. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub report_id: String,
    pub bytes: Vec<u8>,
}

/// Counting slot pool bounding concurrent compiler runs.
#[derive(Debug)]
struct RenderSlots {
    available: Mutex<usize>,
    freed: Condvar,
}

struct SlotGuard<'a> {
    slots: &'a RenderSlots,
}

impl RenderSlots {
    fn new(count: usize) -> Self {
        RenderSlots {
            available: Mutex::new(count),
            freed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.available.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) -> SlotGuard<'_> {
        let mut available = self.lock();
        while *available == 0 {
            available = self
                .freed
                .wait(available)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *available -= 1;
        SlotGuard { slots: self }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        *self.slots.lock() += 1;
        self.slots.freed.notify_one();
    }
}

/// Turns summaries into typeset documents.
pub struct ReportRenderer {
    template_path: PathBuf,
    compiler: Arc<dyn Compiler>,
    options: RenderOptions,
    slots: RenderSlots,
}

impl ReportRenderer {
    /// # Errors
    /// `Config` if `options.max_concurrent` is zero.
    pub fn new(
        template_path: impl Into<PathBuf>,
        compiler: Arc<dyn Compiler>,
        options: RenderOptions,
    ) -> ReportResult<Self> {
        if options.max_concurrent == 0 {
            return Err(ReportError::Config(
                "max_concurrent_renders must be at least 1".to_string(),
            ));
        }
        Ok(ReportRenderer {
            template_path: template_path.into(),
            compiler,
            slots: RenderSlots::new(options.max_concurrent),
            options,
        })
    }

    /// Build a pdflatex-backed renderer from configuration.
    pub fn from_config(config: &AppConfig) -> ReportResult<Self> {
        let compiler = PdfLatexCompiler::new(
            PdfLatexConfig::new(config.compiler_locator()).with_args(config.compiler_arg_list()?),
        );
        Self::new(
            &config.template_path,
            Arc::new(compiler),
            RenderOptions::from_config(config),
        )
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Load the template and fill it for `summary`.
    ///
    /// The template is read on every call, so edits take effect without a
    /// restart.
    pub fn prepare(&self, summary: &Summary, report_id: &str) -> ReportResult<String> {
        let template = load_template(&self.template_path)?;
        fill_template(&template, summary, report_id)
    }

    /// Render `summary` with a fresh report id.
    pub fn render(&self, summary: &Summary) -> ReportResult<RenderedReport> {
        let report_id = new_report_id(OffsetDateTime::now_utc());
        self.render_with_id(summary, &report_id)
    }

    /// Render `summary` under a caller-chosen report id.
    ///
    /// Output is byte-reproducible for a fixed id and a deterministic compiler.
    pub fn render_with_id(&self, summary: &Summary, report_id: &str) -> ReportResult<RenderedReport> {
        let source = self.prepare(summary, report_id)?;

        let _slot = self.slots.acquire();
        let mut attempt = 0u32;
        loop {
            debug!(report_id, attempt, compiler = self.compiler.name(), "compiling report");
            match self.compiler.compile(&source, self.options.timeout) {
                Ok(bytes) => {
                    info!(report_id, bytes = bytes.len(), attempts = attempt + 1, "report rendered");
                    return Ok(RenderedReport {
                        report_id: report_id.to_string(),
                        bytes,
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.options.retries => {
                    attempt += 1;
                    warn!(report_id, attempt, error = %e, "compilation failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Render a retained dataset's summary.
    pub fn render_dataset(&self, dataset: &Dataset) -> ReportResult<RenderedReport> {
        debug!(dataset_id = dataset.id(), name = dataset.name(), "rendering dataset");
        self.render(dataset.summary())
    }
}
