//! Jupyter nbformat v4 input structures.
//!
//! Only the fields the importer reads are modeled; anything else in a real
//! notebook document is ignored rather than rejected.

use serde::Deserialize;
use serde_json::Value;

/// A notebook document: `{cells, metadata, nbformat, nbformat_minor}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
    pub cells: Vec<NotebookCell>,
    #[serde(default)]
    pub metadata: NotebookMetadataIn,
    pub nbformat: u32,
    #[serde(default)]
    pub nbformat_minor: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookMetadataIn {
    pub kernelspec: Option<KernelSpec>,
    pub language_info: Option<LanguageInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KernelSpec {
    pub display_name: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageInfo {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotebookCell {
    pub cell_type: String,
    pub source: SourceField,
    #[serde(default)]
    pub execution_count: Option<u64>,
    #[serde(default)]
    pub outputs: Vec<NotebookOutput>,
}

/// `source` is either a single string or an array of lines to be joined.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceField {
    Joined(String),
    Lines(Vec<String>),
}

impl SourceField {
    pub fn joined(&self) -> String {
        match self {
            SourceField::Joined(s) => s.clone(),
            SourceField::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "output_type")]
pub enum NotebookOutput {
    #[serde(rename = "stream")]
    Stream { name: String, text: SourceField },

    #[serde(rename = "execute_result")]
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<u64>,
        data: serde_json::Map<String, Value>,
    },

    #[serde(rename = "display_data")]
    DisplayData {
        data: serde_json::Map<String, Value>,
    },

    #[serde(rename = "error")]
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
}
