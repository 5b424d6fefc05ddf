//! Serialisable model definitions (TOML or JSON)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DpiError, DpiResult};

/// A model as written in a definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub inputs: Vec<VariableDefinition>,
    pub outputs: Vec<VariableDefinition>,
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    /// Human label; defaults to the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    pub universe: [f64; 2],
    pub sets: Vec<SetDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDefinition {
    pub term: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: u32,
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Definition file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Toml,
    Json,
}

impl ModelFormat {
    /// `.json` is JSON, anything else TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ModelFormat::Json,
            _ => ModelFormat::Toml,
        }
    }
}

impl ModelDefinition {
    pub fn from_toml_str(content: &str) -> DpiResult<Self> {
        toml::from_str(content)
            .map_err(|e| DpiError::model(format!("Invalid model definition: {}", e)).with_context("format", "TOML"))
    }

    pub fn from_json_str(content: &str) -> DpiResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| DpiError::model(format!("Invalid model definition: {}", e)).with_context("format", "JSON"))
    }

    pub fn parse(content: &str, format: ModelFormat) -> DpiResult<Self> {
        match format {
            ModelFormat::Toml => Self::from_toml_str(content),
            ModelFormat::Json => Self::from_json_str(content),
        }
    }

    /// Read a definition file, picking the format by extension
    pub fn from_file(path: impl AsRef<Path>) -> DpiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DpiError::from(e)
                .with_context("path", path.display().to_string())
                .with_hint("Check the [model] path setting or the --model flag")
        })?;
        Self::parse(&content, ModelFormat::from_path(path))
            .map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn to_toml(&self) -> DpiResult<String> {
        toml::to_string_pretty(self).map_err(|e| DpiError::internal(e.to_string()))
    }
}
