//! Mock compiler for testing.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crate::{ReportError, ReportResult};

use super::compiler::Compiler;

/// What a single mock compile call does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Return `%PDF-MOCK` followed by the source
    Succeed,
    /// Fail with the given diagnostics
    Fail(String),
    Timeout,
    Unavailable,
}

/// Mock compiler for unit testing.
///
/// Outcomes are consumed in order; once the queue is empty every call
/// succeeds. No process is spawned.
#[derive(Debug, Default)]
pub struct MockCompiler {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl MockCompiler {
    /// Create a mock that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that plays `outcomes` before succeeding.
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        MockCompiler {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that fails every call.
    pub fn always_failing() -> Self {
        Self::with_outcomes(std::iter::repeat_n(
            MockOutcome::Fail("! mock failure".to_string()),
            64,
        ))
    }

    /// Number of compile calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Source passed to the most recent compile call.
    pub fn last_source(&self) -> Option<String> {
        self.calls.lock().ok().and_then(|c| c.last().cloned())
    }

    /// Bytes a successful compile of `source` returns.
    pub fn document_for(source: &str) -> Vec<u8> {
        let mut bytes = b"%PDF-MOCK\n".to_vec();
        bytes.extend_from_slice(source.as_bytes());
        bytes
    }
}

impl Compiler for MockCompiler {
    fn name(&self) -> &str {
        "mock"
    }

    fn locate(&self) -> ReportResult<PathBuf> {
        Ok(PathBuf::from("mock-compiler"))
    }

    fn compile(&self, source: &str, timeout: Duration) -> ReportResult<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(source.to_string());
        }
        let outcome = self
            .outcomes
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or(MockOutcome::Succeed);

        match outcome {
            MockOutcome::Succeed => Ok(Self::document_for(source)),
            MockOutcome::Fail(diagnostics) => Err(ReportError::CompilationFailed {
                status: "exit status: 1".to_string(),
                diagnostics,
            }),
            MockOutcome::Timeout => Err(ReportError::CompilationTimeout(timeout)),
            MockOutcome::Unavailable => Err(ReportError::CompilerUnavailable(
                "mock compiler unavailable".to_string(),
            )),
        }
    }
}
