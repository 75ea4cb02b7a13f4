//! CLI command handler for `report`: render a retained dataset to a document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{ReportResult, write_output};
use crate::config::AppConfig;
use crate::render::{Compiler, RenderOptions, RenderedReport, ReportRenderer};
use crate::storage::RetentionManager;

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "equipment_report.pdf";

/// Run the `report` command.
///
/// # Arguments
/// * `id` - retained dataset to render
/// * `out` - output path (default `equipment_report.pdf`)
pub fn run(config: &AppConfig, id: u64, out: Option<PathBuf>) -> ReportResult<()> {
    let renderer = ReportRenderer::from_config(config)?;
    let out = out.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    let report = render_to_file(config, &renderer, id, &out)?;
    eprintln!(
        "Wrote report {} ({} bytes) to: {}",
        report.report_id,
        report.bytes.len(),
        out.display()
    );
    Ok(())
}

/// Like [`run`] with an injected compiler.
pub fn run_with_compiler(
    config: &AppConfig,
    compiler: Arc<dyn Compiler>,
    id: u64,
    out: &Path,
) -> ReportResult<RenderedReport> {
    let renderer = ReportRenderer::new(
        &config.template_path,
        compiler,
        RenderOptions::from_config(config),
    )?;
    render_to_file(config, &renderer, id, out)
}

fn render_to_file(
    config: &AppConfig,
    renderer: &ReportRenderer,
    id: u64,
    out: &Path,
) -> ReportResult<RenderedReport> {
    let manager = RetentionManager::open(&config.store_path, config.retention_limit)?;
    let dataset = manager.get(id)?;
    let report = renderer.render_dataset(&dataset)?;
    write_output(out, &report.bytes)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportError;
    use crate::ingest::aggregate;
    use crate::render::MockCompiler;
    use tempfile::TempDir;

    fn setup(temp: &TempDir) -> AppConfig {
        let template = temp.path().join("template.tex");
        std::fs::write(&template, "Report {{REPORT_ID}}: {{TOTAL}} items\n{{TYPE_ROWS}}").unwrap();
        AppConfig {
            store_path: temp.path().join("datasets.jsonl"),
            template_path: template,
            ..Default::default()
        }
    }

    #[test]
    fn test_report_written_for_retained_dataset() {
        let temp = TempDir::new().unwrap();
        let cfg = setup(&temp);
        let manager = RetentionManager::open(&cfg.store_path, cfg.retention_limit).unwrap();
        manager.ingest("empty.csv", aggregate(&[])).unwrap();

        let out = temp.path().join("reports/one.pdf");
        let report = run_with_compiler(&cfg, Arc::new(MockCompiler::new()), 1, &out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(bytes, report.bytes);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("%PDF-MOCK\n"));
        assert!(text.contains(&format!("Report {}: 0 items", report.report_id)));
    }

    #[test]
    fn test_report_for_unknown_id_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let cfg = setup(&temp);
        let out = temp.path().join("none.pdf");

        let err = run_with_compiler(&cfg, Arc::new(MockCompiler::new()), 9, &out).unwrap_err();
        assert!(matches!(err, ReportError::NotFound(9)));
        assert!(!out.exists());
    }
}
