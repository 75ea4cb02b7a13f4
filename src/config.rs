use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::render::CompilerLocator;
use crate::storage::DEFAULT_RETENTION_LIMIT;
use crate::{ReportError, ReportResult};

/// Application configuration.
///
/// Every key is optional; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Number of datasets kept (K)
    pub retention_limit: usize,
    pub store_path: PathBuf,
    pub template_path: PathBuf,
    /// Explicit compiler executable; overrides `compiler_program`
    pub compiler_path: Option<PathBuf>,
    /// Program searched on PATH when no explicit path is given
    pub compiler_program: String,
    /// Extra compiler arguments, shell-quoted
    pub compiler_args: String,
    /// 0 disables the timeout
    pub compile_timeout_secs: u64,
    pub compile_retries: u32,
    pub max_concurrent_renders: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            retention_limit: DEFAULT_RETENTION_LIMIT,
            store_path: PathBuf::from("data/datasets.jsonl"),
            template_path: PathBuf::from("templates/report_template.tex"),
            compiler_path: None,
            compiler_program: "pdflatex".to_string(),
            compiler_args: String::new(),
            compile_timeout_secs: 120,
            compile_retries: 1,
            max_concurrent_renders: 2,
        }
    }
}

impl AppConfig {
    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }

    pub fn compiler_locator(&self) -> CompilerLocator {
        match &self.compiler_path {
            Some(path) => CompilerLocator::Path(path.clone()),
            None => CompilerLocator::Program(self.compiler_program.clone()),
        }
    }

    /// Split `compiler_args` the way a POSIX shell would.
    pub fn compiler_arg_list(&self) -> ReportResult<Vec<String>> {
        shlex::split(&self.compiler_args).ok_or_else(|| {
            ReportError::Config(format!(
                "compiler_args is not valid shell syntax: {:?}",
                self.compiler_args
            ))
        })
    }

    pub fn validate(&self) -> ReportResult<()> {
        if self.retention_limit == 0 {
            return Err(ReportError::Config(
                "retention_limit must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_renders == 0 {
            return Err(ReportError::Config(
                "max_concurrent_renders must be at least 1".to_string(),
            ));
        }
        if self.compiler_path.is_none() && self.compiler_program.trim().is_empty() {
            return Err(ReportError::Config(
                "compiler_program must not be empty".to_string(),
            ));
        }
        self.compiler_arg_list()?;
        Ok(())
    }
}

/// Load configuration from a TOML or YAML (`.yaml`/`.yml`) file.
pub fn load_config(path: &Path) -> ReportResult<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| ReportError::Config(format!("{}: {e}", path.display())))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let cfg: AppConfig = if is_yaml {
        serde_yaml::from_str(&s).map_err(|e| ReportError::Config(format!("{}: {e}", path.display())))?
    } else {
        toml::from_str(&s).map_err(|e| ReportError::Config(format!("{}: {e}", path.display())))?
    };
    cfg.validate()?;
    Ok(cfg)
}
