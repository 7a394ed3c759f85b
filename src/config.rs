//! Tunables for locator generation.

use crate::error::LocatorError;
use crate::expression::is_valid_name;
use serde::Deserialize;

/// Attributes tried as anchors, most stable first.
pub const DEFAULT_ANCHOR_ATTRIBUTES: [&str; 6] =
    ["id", "data-testid", "data-id", "name", "class", "itemprop"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Settings shared by [`minimize`](crate::minimizer::minimize) and everything
/// built on top of it.
pub struct LocatorConfig {
    /// Attribute names tried, in order, when anchoring a locator on an
    /// element. The first attribute whose `//*[@name='value']` predicate
    /// matches exactly one element wins.
    pub anchor_attributes: Vec<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            anchor_attributes: DEFAULT_ANCHOR_ATTRIBUTES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl LocatorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, LocatorError> {
        toml::from_str::<Self>(content)
            .map_err(|err| LocatorError::ConfigParse(err.to_string()))?
            .validated()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, LocatorError> {
        serde_yaml::from_str::<Self>(content)
            .map_err(|err| LocatorError::ConfigParse(err.to_string()))?
            .validated()
    }

    pub fn from_json_str(content: &str) -> Result<Self, LocatorError> {
        serde_json::from_str::<Self>(content)
            .map_err(|err| LocatorError::ConfigParse(err.to_string()))?
            .validated()
    }

    /// Rejects anchor names that cannot appear in a locator.
    fn validated(self) -> Result<Self, LocatorError> {
        if let Some(name) = self
            .anchor_attributes
            .iter()
            .find(|name| !is_valid_name(name))
        {
            return Err(LocatorError::ConfigParse(format!(
                "anchor attribute {name:?} is not a valid attribute name"
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefers_id_and_tries_class_late() {
        let config = LocatorConfig::default();
        assert_eq!(config.anchor_attributes.first().map(String::as_str), Some("id"));
        assert_eq!(
            config.anchor_attributes,
            vec!["id", "data-testid", "data-id", "name", "class", "itemprop"]
        );
    }

    #[test]
    fn deserialize_from_every_supported_format() {
        let expected = LocatorConfig {
            anchor_attributes: vec!["data-qa".to_string(), "id".to_string()],
        };

        let from_toml = LocatorConfig::from_toml_str("anchor_attributes = [\"data-qa\", \"id\"]\n");
        let from_yaml = LocatorConfig::from_yaml_str("anchor_attributes:\n  - data-qa\n  - id\n");
        let from_json = LocatorConfig::from_json_str(r#"{"anchor_attributes": ["data-qa", "id"]}"#);

        assert_eq!(from_toml.unwrap(), expected);
        assert_eq!(from_yaml.unwrap(), expected);
        assert_eq!(from_json.unwrap(), expected);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = LocatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, LocatorConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = LocatorConfig::from_json_str(r#"{"anchors": ["id"]}"#).unwrap_err();
        assert!(matches!(err, LocatorError::ConfigParse(_)));
    }

    #[test]
    fn anchor_names_outside_the_locator_grammar_are_rejected() {
        let err = LocatorConfig::from_yaml_str("anchor_attributes:\n  - id\n  - \":href\"\n")
            .unwrap_err();
        let LocatorError::ConfigParse(message) = err else {
            panic!("expected a config error, got {err:?}");
        };
        assert!(message.contains(":href"));

        assert!(LocatorConfig::from_json_str(r#"{"anchor_attributes": ["@click"]}"#).is_err());
        assert!(LocatorConfig::from_toml_str("anchor_attributes = [\"\"]\n").is_err());
    }
}
