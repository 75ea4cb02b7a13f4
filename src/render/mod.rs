//! Report rendering.
//!
//! `template` fills placeholders, `compiler` runs the external typesetter,
//! and `renderer` ties them together with retry and a concurrency cap.

pub mod compiler;
pub mod mock;
pub mod renderer;
pub mod template;

pub use compiler::{Compiler, CompilerLocator, PdfLatexCompiler, PdfLatexConfig};
pub use mock::{MockCompiler, MockOutcome};
pub use renderer::{RenderOptions, RenderedReport, ReportRenderer};
pub use template::{fill_template, find_unresolved, latex_escape, load_template, new_report_id};
