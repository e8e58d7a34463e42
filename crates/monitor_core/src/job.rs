use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobRequestError {
    #[error("no input files selected")]
    NoInputs,
}

/// Validated request to start processing: at least one input, no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    inputs: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
}

impl JobRequest {
    pub fn new(
        inputs: impl IntoIterator<Item = PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Result<Self, JobRequestError> {
        let inputs = dedupe_paths(inputs);
        if inputs.is_empty() {
            return Err(JobRequestError::NoInputs);
        }
        Ok(Self { inputs, output_dir })
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn output_dir(&self) -> Option<&PathBuf> {
        self.output_dir.as_ref()
    }

    pub fn into_parts(self) -> (Vec<PathBuf>, Option<PathBuf>) {
        (self.inputs, self.output_dir)
    }
}

/// Drop repeated paths, keeping the first occurrence of each.
pub fn dedupe_paths(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// Which worker operation a dispatch result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    StartJobs { file_count: usize },
    TriggerMock,
}
