//! essaymark-report: HTML rendering of essay histories and assessments.

pub mod html;

pub use html::{generate_assessment_html, generate_history_html, write_html};
