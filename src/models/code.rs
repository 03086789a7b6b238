use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known editor contents for a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnapshot {
    pub code: String,
    pub language: String,
    pub timestamp: DateTime<Utc>,
    pub problem_id: String,
}

impl CodeSnapshot {
    pub fn new(code: String, language: String, problem_id: String) -> Self {
        Self {
            code,
            language,
            timestamp: Utc::now(),
            problem_id,
        }
    }

    /// Render as a fenced block suitable for appending to a question.
    pub fn as_fenced_block(&self) -> String {
        format!("```{}\n{}\n```", self.language, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_carries_language_tag() {
        let snapshot = CodeSnapshot::new("print(1)".into(), "python".into(), "p".into());
        assert_eq!(snapshot.as_fenced_block(), "```python\nprint(1)\n```");
    }

    #[test]
    fn snapshot_uses_camel_case_problem_id() {
        let snapshot = CodeSnapshot::new("x".into(), "unknown".into(), "two-sum".into());
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"problemId\":\"two-sum\""));
    }
}
