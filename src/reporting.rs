//! # Reporting Module / 报告模块
//!
//! This module renders coverage reports in multiple formats: the colored
//! console summary, a styled HTML report and an LCOV tracefile.
//!
//! 此模块以多种格式渲染覆盖率报告：彩色控制台摘要、样式化 HTML 报告和 LCOV 跟踪文件。

pub mod console;
pub mod html;
pub mod lcov;

// Re-export common reporting functions
pub use console::text_summary;
pub use html::render_report;
