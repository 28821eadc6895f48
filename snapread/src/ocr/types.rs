use serde::Deserialize;

/// Status of an asynchronous read operation. Transitions only forward;
/// `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Succeeded | OperationStatus::Failed)
    }
}

/// One poll response from the Read API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOperation {
    pub status: OperationStatus,
    #[serde(default)]
    pub analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub read_results: Vec<ReadResult>,
}

/// One page of recognized content.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResult {
    #[serde(default)]
    pub lines: Vec<ReadLine>,
}

/// A recognized line: the service may return the pre-joined `text`, the
/// individual `words`, or both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadLine {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub words: Vec<ReadWord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadWord {
    pub text: String,
}
