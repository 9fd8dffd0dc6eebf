//! Request and response records.
//!
//! Field names are PascalCase on the wire to match the editor front-end.
//! Offsets are UTF-16 code units.

use serde::{Deserialize, Serialize};

use crate::engine::OutputKind;

/// Fields every request carries.
pub trait RequestWithCode {
    fn code(&self) -> &str;
    fn assemblies(&self) -> &[String];
    fn output_kind(&self) -> Option<OutputKind>;
}

/// Requests that point at a cursor.
pub trait RequestWithPosition: RequestWithCode {
    fn position(&self) -> i64;
}

macro_rules! request_with_code {
    ($($ty:ty),* $(,)?) => {$(
        impl RequestWithCode for $ty {
            fn code(&self) -> &str {
                &self.code
            }

            fn assemblies(&self) -> &[String] {
                self.assemblies.as_deref().unwrap_or(&[])
            }

            fn output_kind(&self) -> Option<OutputKind> {
                self.output_kind
            }
        }
    )*};
}

macro_rules! request_with_position {
    ($($ty:ty),* $(,)?) => {$(
        impl RequestWithPosition for $ty {
            fn position(&self) -> i64 {
                self.position
            }
        }
    )*};
}

/// Completion, signature help, hover and go-to-definition requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionRequest {
    pub code: String,
    #[serde(default)]
    pub assemblies: Option<Vec<String>>,
    pub position: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_kind: Option<OutputKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompletionResolveRequest {
    pub code: String,
    #[serde(default)]
    pub assemblies: Option<Vec<String>>,
    pub position: i64,
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_kind: Option<OutputKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeCheckRequest {
    pub code: String,
    #[serde(default)]
    pub assemblies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_kind: Option<OutputKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenameRequest {
    pub code: String,
    #[serde(default)]
    pub assemblies: Option<Vec<String>>,
    pub position: i64,
    pub new_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_kind: Option<OutputKind>,
}

/// `Start`/`End` of zero on both ends formats the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeFormatRequest {
    pub code: String,
    #[serde(default)]
    pub assemblies: Option<Vec<String>>,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_kind: Option<OutputKind>,
}

request_with_code!(
    PositionRequest,
    CompletionResolveRequest,
    CodeCheckRequest,
    RenameRequest,
    CodeFormatRequest,
);
request_with_position!(PositionRequest, CompletionResolveRequest, RenameRequest);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TabCompletionResult {
    pub suggestion: String,
    pub description: Option<String>,
    /// Coarse category, e.g. `Method` or `Keyword`.
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HoverInfoResult {
    pub information: String,
    pub offset_from: usize,
    pub offset_to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterHelp {
    pub label: String,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Signature {
    pub label: String,
    pub documentation: Option<String>,
    pub parameters: Vec<ParameterHelp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignatureHelpResult {
    pub signatures: Vec<Signature>,
    pub active_parameter: usize,
    pub active_signature: usize,
}

/// Marker severities, numbered as the editor numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeCheckSeverity {
    Hint = 1,
    Info = 2,
    Warning = 4,
    Error = 8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeCheckResult {
    pub id: String,
    /// Source text under the diagnostic.
    pub keyword: String,
    pub message: String,
    pub offset_from: usize,
    pub offset_to: usize,
    pub severity: CodeCheckSeverity,
    pub severity_numeric: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DefinitionLocation {
    pub uri: String,
    pub offset_from: usize,
    pub offset_to: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GoToDefinitionResult {
    pub uri: Option<String>,
    pub definitions: Vec<DefinitionLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeActionChange {
    pub offset_from: usize,
    pub offset_to: usize,
    pub new_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeActionResult {
    pub title: String,
    pub id: Option<String>,
    pub changes_in_document: Vec<CodeActionChange>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn requests_read_pascal_case() {
        let req: PositionRequest = serde_json::from_value(json!({
            "Code": "fn main() {}",
            "Assemblies": ["a.rs"],
            "Position": 3,
            "OutputKind": "Executable"
        }))
        .unwrap();
        assert_eq!(req.position(), 3);
        assert_eq!(req.assemblies(), ["a.rs".to_string()]);
        assert_eq!(req.output_kind(), Some(OutputKind::Executable));
    }

    #[test]
    fn assemblies_may_be_missing_or_null() {
        let missing: CodeCheckRequest = serde_json::from_value(json!({"Code": ""})).unwrap();
        let null: CodeCheckRequest =
            serde_json::from_value(json!({"Code": "", "Assemblies": null})).unwrap();
        assert!(missing.assemblies().is_empty());
        assert!(null.assemblies().is_empty());
    }

    #[test]
    fn code_is_required() {
        let result = serde_json::from_value::<PositionRequest>(json!({"Position": 0}));
        assert!(result.is_err());
    }

    #[test]
    fn severity_serializes_by_name() {
        let result = CodeCheckResult {
            id: "RS1001".into(),
            keyword: "x".into(),
            message: "Unused variable `x`".into(),
            offset_from: 4,
            offset_to: 5,
            severity: CodeCheckSeverity::Warning,
            severity_numeric: CodeCheckSeverity::Warning as u8,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["Severity"], "Warning");
        assert_eq!(value["SeverityNumeric"], 4);
        assert_eq!(value["OffsetFrom"], 4);
    }
}
