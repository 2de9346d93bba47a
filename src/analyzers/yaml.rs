use serde_yaml::Value;
use std::path::Path;
use tracing::debug;

use super::pyrepr;
use super::traits::ConceptAnalyzer;
use crate::config::YamlSettings;
use crate::types::{ConceptKind, ConceptRecord, DescriptionBuilder, OntoscanError, Result};

/// Upper bound on the rendered item preview of a scalar list.
const LIST_PREVIEW_CHARS: usize = 100;

/// Walks a YAML document and emits one record per significant key path.
pub struct YamlAnalyzer {
    settings: YamlSettings,
    config_root: String,
}

struct Location<'a> {
    concept: &'a str,
    source: &'a str,
}

impl YamlAnalyzer {
    /// `config_root` is the forward-slash configuration root; config names
    /// are derived relative to it.
    pub fn new(settings: YamlSettings, config_root: impl Into<String>) -> Self {
        Self {
            settings,
            config_root: config_root.into().trim_end_matches('/').to_string(),
        }
    }

    /// Name of a configuration file relative to the configuration root, without
    /// its extension (`conf/experiment/base.yaml` -> `experiment/base`).
    pub fn config_name(&self, relative_path: &str) -> String {
        let root_parts: Vec<&str> = self.config_root.split('/').filter(|p| !p.is_empty()).collect();
        let parts: Vec<&str> = relative_path.split('/').filter(|p| !p.is_empty()).collect();

        let start = parts
            .windows(root_parts.len().max(1))
            .position(|window| window == root_parts.as_slice())
            .map(|idx| idx + root_parts.len());

        match start {
            Some(start) if start < parts.len() && !root_parts.is_empty() => {
                let mut name_parts: Vec<String> = parts[start..].iter().map(|p| p.to_string()).collect();
                if let Some(last) = name_parts.last_mut() {
                    let current = last.as_str();
                    let stripped = current
                        .strip_suffix(".yaml")
                        .or_else(|| current.strip_suffix(".yml"))
                        .unwrap_or(current)
                        .to_string();
                    *last = stripped;
                }
                name_parts.join("/")
            }
            _ => Path::new(relative_path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(relative_path)
                .to_string(),
        }
    }

    fn walk(&self, value: &Value, at: Location, depth: usize, out: &mut Vec<ConceptRecord>) {
        if depth > self.settings.max_depth {
            return;
        }

        match value {
            Value::Mapping(map) => {
                for (key, child) in map {
                    let key = pyrepr::key_str(key);
                    let concept = if at.concept.is_empty() {
                        key.clone()
                    } else {
                        format!("{}/{}", at.concept, key)
                    };
                    let source = format!("{}/{}", at.source, key);

                    if self.is_significant(&key, child, depth) {
                        let description = DescriptionBuilder::new(ConceptKind::Config)
                            .body(&self.describe(child))
                            .build();
                        out.push(ConceptRecord::new(concept.as_str(), description, source.as_str()));
                    }

                    let nested = matches!(child, Value::Mapping(_) | Value::Sequence(_));
                    if nested && depth < self.settings.recurse_depth {
                        let next = Location {
                            concept: &concept,
                            source: &source,
                        };
                        self.walk(child, next, depth + 1, out);
                    }
                }
            }
            Value::Sequence(items) if items.first().is_some_and(is_mapping) => {
                for (idx, item) in items.iter().take(self.settings.list_sample).enumerate() {
                    let concept = format!("{}[{}]", at.concept, idx);
                    let source = format!("{}[{}]", at.source, idx);
                    let next = Location {
                        concept: &concept,
                        source: &source,
                    };
                    self.walk(item, next, depth + 1, out);
                }
            }
            _ => {}
        }
    }

    fn describe(&self, value: &Value) -> String {
        match value {
            Value::Mapping(map) => {
                let keys: Vec<String> = map.keys().take(self.settings.key_preview).map(pyrepr::key_str).collect();
                format!("Configuration group with keys: {}", keys.join(", "))
            }
            Value::Sequence(items) if items.is_empty() => "Empty list".to_string(),
            Value::Sequence(items) if is_mapping(&items[0]) => {
                format!("List of {} configuration objects", items.len())
            }
            Value::Sequence(items) => {
                let preview: Vec<String> = items.iter().take(self.settings.value_preview).map(pyrepr::value_repr).collect();
                let preview = preview.join(", ");
                format!(
                    "List of {} values: [{}]",
                    items.len(),
                    pyrepr::truncate_chars(&preview, LIST_PREVIEW_CHARS)
                )
            }
            Value::String(s) if s.starts_with("_target_") => "Target class/function specification".to_string(),
            Value::String(s) if s.contains('.') && s.chars().count() < 100 => format!("String value: {}", s),
            Value::String(_) => "String parameter".to_string(),
            Value::Bool(b) => format!("Boolean flag = {}", pyrepr::bool_repr(*b)),
            Value::Number(n) => format!("Numeric parameter = {}", pyrepr::number_repr(n)),
            Value::Null => "NoneType value".to_string(),
            Value::Tagged(_) => "tagged value".to_string(),
        }
    }

    fn is_significant(&self, key: &str, value: &Value, depth: usize) -> bool {
        if depth > self.settings.generic_depth {
            let lowered = key.to_lowercase();
            if self.settings.generic_keys.iter().any(|g| *g == lowered) {
                return false;
            }
        }

        match value {
            Value::Mapping(_) => true,
            Value::Sequence(items) if items.first().is_some_and(is_mapping) => true,
            _ if depth <= self.settings.shallow_depth => true,
            _ => key == "_target_",
        }
    }
}

impl ConceptAnalyzer for YamlAnalyzer {
    fn language(&self) -> &'static str {
        "yaml"
    }

    fn extract(&self, relative_path: &str, content: &str) -> Result<Vec<ConceptRecord>> {
        if !has_content(content) {
            return Ok(Vec::new());
        }

        let mut document: Value = serde_yaml::from_str(content)
            .map_err(|e| OntoscanError::parse(relative_path, e.to_string()))?;
        document
            .apply_merge()
            .map_err(|e| OntoscanError::parse(relative_path, e.to_string()))?;

        if is_falsy(&document) {
            return Ok(Vec::new());
        }

        let config_name = self.config_name(relative_path);
        let mut records = Vec::new();
        let root = Location {
            concept: &config_name,
            source: relative_path,
        };
        self.walk(&document, root, 0, &mut records);

        debug!("Extracted {} config keys from {}", records.len(), relative_path);
        Ok(records)
    }
}

/// Anything besides blank lines, comments and document markers.
fn has_content(content: &str) -> bool {
    content.lines().map(str::trim).any(|line| {
        !line.is_empty() && !line.starts_with('#') && line != "---" && line != "..."
    })
}

fn is_mapping(value: &Value) -> bool {
    matches!(value, Value::Mapping(_))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Tagged(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# @package _global_
defaults:
  - base
  - override /env: habitat
experiment:
  name: pretrain
  logging:
    level: INFO
    handlers:
      file:
        path: logs/run.log
        type: rotating
  _target_: tbp.monty.Experiment
  sensors:
    - name: patch
      resolution: [64, 64]
      _target_: tbp.monty.Sensor
    - name: view
learning_rate: 0.001
enabled: true
"#;

    const PATH: &str = "conf/experiment/pretrain.yaml";

    fn analyzer() -> YamlAnalyzer {
        YamlAnalyzer::new(YamlSettings::default(), "conf")
    }

    fn find<'a>(records: &'a [ConceptRecord], concept: &str) -> &'a ConceptRecord {
        records
            .iter()
            .find(|r| r.concept == concept)
            .unwrap_or_else(|| panic!("missing concept {}", concept))
    }

    #[test]
    fn test_config_name() {
        let analyzer = analyzer();
        assert_eq!(analyzer.config_name(PATH), "experiment/pretrain");
        assert_eq!(analyzer.config_name("conf/base.yml"), "base");
        assert_eq!(analyzer.config_name("other/settings.yaml"), "settings");

        let nested = YamlAnalyzer::new(YamlSettings::default(), "config/hydra/");
        assert_eq!(nested.config_name("config/hydra/env/sim.yaml"), "env/sim");
    }

    #[test]
    fn test_walk_emits_significant_keys_in_order() {
        let records = analyzer().extract(PATH, SAMPLE).unwrap();
        let concepts: Vec<&str> = records.iter().map(|r| r.concept.as_str()).collect();
        assert_eq!(
            concepts,
            vec![
                "experiment/pretrain/defaults",
                "experiment/pretrain/experiment",
                "experiment/pretrain/experiment/name",
                "experiment/pretrain/experiment/logging",
                "experiment/pretrain/experiment/logging/level",
                "experiment/pretrain/experiment/logging/handlers",
                "experiment/pretrain/experiment/logging/handlers/file",
                "experiment/pretrain/experiment/_target_",
                "experiment/pretrain/experiment/sensors",
                "experiment/pretrain/experiment/sensors[0]/_target_",
                "experiment/pretrain/learning_rate",
                "experiment/pretrain/enabled",
            ]
        );
    }

    #[test]
    fn test_source_encodes_key_path() {
        let records = analyzer().extract(PATH, SAMPLE).unwrap();
        assert_eq!(
            find(&records, "experiment/pretrain/experiment/logging/level").source,
            "conf/experiment/pretrain.yaml/experiment/logging/level"
        );
        assert_eq!(
            find(&records, "experiment/pretrain/experiment/sensors[0]/_target_").source,
            "conf/experiment/pretrain.yaml/experiment/sensors[0]/_target_"
        );
        assert!(records.iter().all(|r| r.source.starts_with("conf/")));
    }

    #[test]
    fn test_descriptions() {
        let records = analyzer().extract(PATH, SAMPLE).unwrap();
        assert_eq!(
            find(&records, "experiment/pretrain/defaults").description,
            "Config: List of 2 values: ['base', {'override /env': 'habitat'}]"
        );
        assert_eq!(
            find(&records, "experiment/pretrain/experiment").description,
            "Config: Configuration group with keys: name, logging, _target_, sensors"
        );
        assert_eq!(
            find(&records, "experiment/pretrain/experiment/name").description,
            "Config: String parameter"
        );
        assert_eq!(
            find(&records, "experiment/pretrain/experiment/_target_").description,
            "Config: String value: tbp.monty.Experiment"
        );
        assert_eq!(
            find(&records, "experiment/pretrain/experiment/sensors").description,
            "Config: List of 2 configuration objects"
        );
        assert_eq!(
            find(&records, "experiment/pretrain/learning_rate").description,
            "Config: Numeric parameter = 0.001"
        );
        assert_eq!(
            find(&records, "experiment/pretrain/enabled").description,
            "Config: Boolean flag = True"
        );
    }

    #[test]
    fn test_generic_keys_skipped_when_deep() {
        let records = analyzer().extract(PATH, SAMPLE).unwrap();
        assert!(!records.iter().any(|r| r.concept.ends_with("sensors[0]/name")));
        assert!(!records.iter().any(|r| r.concept.ends_with("sensors[1]/name")));
        assert!(!records.iter().any(|r| r.concept.ends_with("resolution")));
    }

    #[test]
    fn test_empty_and_falsy_documents() {
        let analyzer = analyzer();
        assert!(analyzer.extract(PATH, "").unwrap().is_empty());
        assert!(analyzer.extract(PATH, "# only a comment\n").unwrap().is_empty());
        assert!(analyzer.extract(PATH, "{}\n").unwrap().is_empty());
        assert!(analyzer.extract(PATH, "just a scalar\n").unwrap().is_empty());
    }

    #[test]
    fn test_non_string_keys() {
        let records = analyzer().extract("conf/flags.yaml", "1: one\ntrue: yes\n").unwrap();
        let concepts: Vec<&str> = records.iter().map(|r| r.concept.as_str()).collect();
        assert_eq!(concepts, vec!["flags/1", "flags/True"]);
    }

    #[test]
    fn test_merge_keys_applied() {
        let content = "base: &base\n  lr: 0.1\nrun:\n  <<: *base\n  epochs: 3\n";
        let records = analyzer().extract("conf/train.yaml", content).unwrap();
        assert!(records.iter().any(|r| r.concept == "train/run/lr"));
        assert!(!records.iter().any(|r| r.concept.contains("<<")));
    }

    #[test]
    fn test_depth_limits_are_tunable() {
        let settings = YamlSettings {
            recurse_depth: 0,
            ..YamlSettings::default()
        };
        let analyzer = YamlAnalyzer::new(settings, "conf");
        let records = analyzer.extract(PATH, SAMPLE).unwrap();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_list_preview_is_bounded() {
        let item = "x".repeat(400);
        let content = format!("paths:\n  - {}\n  - {}\n", item, item);
        let records = analyzer().extract("conf/data.yaml", &content).unwrap();
        let paths = find(&records, "data/paths");
        assert!(paths.description.starts_with("Config: List of 2 values: ['xxx"));
        assert!(paths.description.ends_with("]"));
        assert!(paths.description.chars().count() < 150);
    }

    #[test]
    fn test_yaml_1_2_scalars() {
        let records = analyzer().extract("conf/flags.yaml", "verbose: yes
fast: on
debug: false
").unwrap();
        assert_eq!(find(&records, "flags/verbose").description, "Config: String parameter");
        assert_eq!(find(&records, "flags/fast").description, "Config: String parameter");
        assert_eq!(find(&records, "flags/debug").description, "Config: Boolean flag = False");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let result = analyzer().extract(PATH, "key: [unclosed\n");
        assert!(matches!(result, Err(OntoscanError::Parse { .. })));
    }
}
