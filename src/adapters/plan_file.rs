//! Plan storage adapters.
//!
//! [`JsonPlanFile`] reads a plan document from disk; an in-memory
//! [`PlanFile`] is itself a [`PlanPort`] for built-in plans and tests.
//! Both validate before handing the plan to the runner.

use std::io::ErrorKind;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, PlanPort};
use crate::plan::PlanFile;

/// JSON plan document on the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonPlanFile {
    path: PathBuf,
}

impl JsonPlanFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PlanPort for JsonPlanFile {
    fn load(&self) -> Result<PlanFile, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            warn!("plan: cannot read {}: {e}", self.path.display());
            match e.kind() {
                ErrorKind::NotFound => ConfigError::NotFound,
                _ => ConfigError::IoError,
            }
        })?;
        let file = PlanFile::from_json(&text)?;
        info!(
            "plan: loaded {} ({} phases, {} checks)",
            self.path.display(),
            file.plan.phases.len(),
            file.plan.checks.len()
        );
        Ok(file)
    }
}

impl PlanPort for PlanFile {
    fn load(&self) -> Result<PlanFile, ConfigError> {
        self.validate()?;
        Ok(self.clone())
    }
}
