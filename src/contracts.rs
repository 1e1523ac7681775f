//! External collaborator contracts (spec §6): PRD parsing, task persistence,
//! logging, and config lookup are all out of scope for this crate, but the
//! orchestration engine is written against these traits so a host
//! application can plug in its own PRD parser, task store, logger, and
//! config source without this crate knowing the concrete types.
//!
//! No file-backed `TaskStore` or `PrdParser` ships here — persistence and
//! document parsing are the host's job. [`NoopLogger`] and [`NullConfigSource`]
//! are provided as default/test fixtures only.

use serde_json::{Map, Value};

use crate::error::TaskflowError;
use crate::model::Task;

/// Input document format a [`PrdParser`] is asked to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Markdown,
    PlainText,
    Json,
}

/// Tuning knobs for [`PrdParser::parse_prd`]; left deliberately sparse since
/// no parser ships in this crate.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Cap on how many tasks a single document may be parsed into.
    pub max_tasks: Option<usize>,
}

/// Result of parsing a requirements document into orchestrator input.
#[derive(Debug, Clone, Default)]
pub struct ParsedPrd {
    pub tasks: Vec<Task>,
    pub warnings: Vec<String>,
}

/// Parses a project requirements document into [`Task`]s this crate can
/// schedule. Implemented by the host application; never implemented here.
pub trait PrdParser: Send + Sync {
    fn parse_prd(&self, content: &str, file_type: FileType, options: &ParseOptions) -> Result<ParsedPrd, TaskflowError>;
}

/// Loads and persists the task list. Implemented by the host application
/// (a database, a JSON file, an in-memory fixture); never implemented here.
pub trait TaskStore: Send + Sync {
    fn load(&self) -> Result<Vec<Task>, TaskflowError>;
    fn save(&self, tasks: &[Task]) -> Result<(), TaskflowError>;
}

/// Structured log sink. `fields` carries request/task correlating ids the
/// way `tracing`'s own span fields do, for hosts that want to route this
/// crate's log lines into their own structured logger instead of `tracing`.
pub trait Logger: Send + Sync {
    fn debug(&self, msg: &str, fields: Option<&Map<String, Value>>);
    fn info(&self, msg: &str, fields: Option<&Map<String, Value>>);
    fn warn(&self, msg: &str, fields: Option<&Map<String, Value>>);
    fn error(&self, msg: &str, fields: Option<&Map<String, Value>>);
}

/// Host-provided config lookup (env vars, a config file, a remote config
/// service) keyed by string, so this crate never parses a config format
/// itself.
pub trait ConfigSource: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_i64(&self, key: &str) -> Option<i64>;
}

/// A [`Logger`] that discards everything. Useful for callers who don't want
/// to wire a real sink, and as a default in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _msg: &str, _fields: Option<&Map<String, Value>>) {}
    fn info(&self, _msg: &str, _fields: Option<&Map<String, Value>>) {}
    fn warn(&self, _msg: &str, _fields: Option<&Map<String, Value>>) {}
    fn error(&self, _msg: &str, _fields: Option<&Map<String, Value>>) {}
}

/// A [`ConfigSource`] that never has a value. Useful as a default in tests
/// that don't exercise config-driven behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConfigSource;

impl ConfigSource for NullConfigSource {
    fn get_string(&self, _key: &str) -> Option<String> {
        None
    }

    fn get_bool(&self, _key: &str) -> Option<bool> {
        None
    }

    fn get_i64(&self, _key: &str) -> Option<i64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_logger_accepts_all_levels_without_panic() {
        let logger = NoopLogger;
        logger.debug("x", None);
        logger.info("x", None);
        logger.warn("x", None);
        logger.error("x", None);
    }

    #[test]
    fn null_config_source_always_none() {
        let cfg = NullConfigSource;
        assert_eq!(cfg.get_string("anything"), None);
        assert_eq!(cfg.get_bool("anything"), None);
        assert_eq!(cfg.get_i64("anything"), None);
    }
}
