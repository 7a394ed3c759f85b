//! Field models: named sample values to locate in a document at once.

use crate::config::LocatorConfig;
use crate::document::HtmlDocument;
use crate::error::LocatorError;
use crate::locator::locate_values;
use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Locators found for each field of a [`FieldModel`].
pub type FieldLocators = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Json,
    Yaml,
    Toml,
}

impl ModelFormat {
    /// Picks a format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, LocatorError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(ModelFormat::Json),
            "yaml" | "yml" => Ok(ModelFormat::Yaml),
            "toml" => Ok(ModelFormat::Toml),
            _ => Err(LocatorError::UnsupportedModelFormat(
                path.display().to_string(),
            )),
        }
    }
}

/// Sample values keyed by field name, e.g. `price: "€199.99"`.
///
/// Scalars (numbers, booleans) are accepted and compared through their textual
/// form; a null value marks a field with no sample.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldModel {
    pub fields: BTreeMap<String, Option<String>>,
}

impl FieldModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a field.
    pub fn with_field(mut self, name: impl Into<String>, sample: Option<&str>) -> Self {
        self.fields.insert(name.into(), sample.map(str::to_string));
        self
    }

    pub fn parse(content: &str, format: ModelFormat) -> Result<Self, LocatorError> {
        parse_model(content, format).map_err(|err| LocatorError::ModelParse(format!("{err:#}")))
    }

    /// Reads a model file, choosing the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LocatorError> {
        let path = path.as_ref();
        let format = ModelFormat::from_path(path)?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))
            .map_err(|err| LocatorError::Io(format!("{err:#}")))?;
        log::debug!("loaded {format:?} model from {}", path.display());
        Self::parse(&content, format)
    }
}

fn parse_model(content: &str, format: ModelFormat) -> anyhow::Result<FieldModel> {
    let value: YamlValue = match format {
        ModelFormat::Yaml => {
            serde_yaml::from_str(content).context("Failed to parse YAML model")?
        }
        ModelFormat::Json => {
            let json: serde_json::Value =
                serde_json::from_str(content).context("Failed to parse JSON model")?;
            serde_yaml::to_value(json)
                .map_err(|e| anyhow!("Failed to convert JSON model to YAML value: {e}"))?
        }
        ModelFormat::Toml => {
            let toml_value: toml::Value =
                toml::from_str(content).context("Failed to parse TOML model")?;
            serde_yaml::to_value(toml_value)
                .map_err(|e| anyhow!("Failed to convert TOML model to YAML value: {e}"))?
        }
    };

    let mapping = match value {
        YamlValue::Mapping(mapping) => mapping,
        YamlValue::Null => return Ok(FieldModel::default()),
        other => bail!("model must be a mapping of field names to values, got {other:?}"),
    };

    let mut fields = BTreeMap::new();
    for (key, value) in mapping {
        let Some(name) = key.as_str() else {
            bail!("field names must be strings, got {key:?}");
        };
        let sample = match value {
            YamlValue::Null => None,
            YamlValue::String(s) => Some(s),
            YamlValue::Number(n) => Some(n.to_string()),
            YamlValue::Bool(b) => Some(b.to_string()),
            other => bail!("field '{name}' must hold a scalar value, got {other:?}"),
        };
        fields.insert(name.to_string(), sample);
    }

    Ok(FieldModel { fields })
}

/// Finds every locator for every field of `model`.
///
/// Fields without a sample, or with a blank one, map to an empty list.
pub fn find_locators(
    document: &HtmlDocument,
    model: &FieldModel,
    config: &LocatorConfig,
) -> Result<FieldLocators, LocatorError> {
    let mut result = FieldLocators::new();

    for (field, sample) in &model.fields {
        let locators = match sample.as_deref() {
            Some(sample) if !sample.trim().is_empty() => locate_values(document, sample, config)?
                .into_iter()
                .map(|located| located.locator)
                .collect(),
            _ => Vec::new(),
        };
        log::debug!("field '{field}': {} locator(s)", locators.len());
        result.insert(field.clone(), locators);
    }

    Ok(result)
}
