use archplan_engine::{CollaboratorError, PlanRequest, PlanSource};
use std::path::{Path, PathBuf};

/// Stands in for a planning model: every proposal is the content of one file.
#[derive(Debug, Clone)]
pub struct FilePlanSource {
    path: PathBuf,
}

impl FilePlanSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlanSource for FilePlanSource {
    fn propose(&self, _request: &PlanRequest) -> Result<String, CollaboratorError> {
        std::fs::read_to_string(&self.path).map_err(|error| {
            CollaboratorError::Unavailable(format!(
                "read plan `{}` failed: {error}",
                self.path.display()
            ))
        })
    }
}

#[cfg(test)]
#[path = "plan_source_test.rs"]
mod tests;
