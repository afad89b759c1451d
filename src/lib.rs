//! doc-checker-rust: проверка документов на соответствие эталонному
//! шаблону и автоматическое исправление найденных несоответствий.

pub mod cli;
pub mod detector;
pub mod document;
pub mod error;
pub mod matcher;
pub mod normalizer;
pub mod patcher;
pub mod template;
