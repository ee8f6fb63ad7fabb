//! Analyzer factory registry.
//!
//! Factories are keyed by `(name, format)` and parse an argument string
//! into a prepared analyzer. Construction failures are logged and reported
//! as `None`; factories never panic.

use std::sync::OnceLock;

use ahash::AHashMap;
use log::error;
use serde::Deserialize;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::delimiter::DelimiterAnalyzer;
use crate::analysis::ngram::NgramAnalyzer;
use crate::analysis::norm::NormAnalyzer;
use crate::analysis::pipeline::PipelineAnalyzer;
use crate::analysis::text::TextAnalyzer;

/// Format of an analyzer argument string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextFormat {
    /// Arguments are a JSON object.
    Json,
    /// Arguments are a single plain-text value.
    Text,
}

type FactoryFn = fn(&str) -> Option<Box<dyn Analyzer>>;

/// A registry of analyzer factories.
///
/// The registry is an explicit handle so tests can build isolated ones;
/// [`analyzer`] wraps a process-wide instance holding the built-ins.
pub struct AnalyzerRegistry {
    factories: AHashMap<(String, TextFormat), FactoryFn>,
}

impl AnalyzerRegistry {
    /// Create a registry with all built-in analyzers registered.
    pub fn new() -> Self {
        let mut registry = AnalyzerRegistry {
            factories: AHashMap::new(),
        };
        registry.register("delimiter", TextFormat::Json, |args| {
            DelimiterAnalyzer::from_json(args).map(boxed)
        });
        registry.register("delimiter", TextFormat::Text, |args| {
            DelimiterAnalyzer::from_text(args).map(boxed)
        });
        registry.register("ngram", TextFormat::Json, |args| {
            NgramAnalyzer::from_json(args).map(boxed)
        });
        registry.register("norm", TextFormat::Json, |args| {
            NormAnalyzer::from_json(args).map(boxed)
        });
        registry.register("text", TextFormat::Json, |args| {
            TextAnalyzer::from_json(args).map(boxed)
        });
        registry.register("text", TextFormat::Text, |args| {
            TextAnalyzer::from_text(args).map(boxed)
        });
        registry.register("pipeline", TextFormat::Json, pipeline_from_json);
        registry
    }

    /// Register a factory under `(name, format)`, replacing any previous one.
    pub fn register(&mut self, name: &str, format: TextFormat, factory: FactoryFn) {
        self.factories.insert((name.to_string(), format), factory);
    }

    /// Construct an analyzer. Unknown names and malformed arguments yield
    /// `None`.
    pub fn get(&self, name: &str, format: TextFormat, args: &str) -> Option<Box<dyn Analyzer>> {
        match self.factories.get(&(name.to_string(), format)) {
            Some(factory) => factory(args),
            None => {
                error!("unknown analyzer {name:?} for format {format:?}");
                None
            }
        }
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn boxed<A: Analyzer + 'static>(analyzer: A) -> Box<dyn Analyzer> {
    Box::new(analyzer)
}

fn global() -> &'static AnalyzerRegistry {
    static REGISTRY: OnceLock<AnalyzerRegistry> = OnceLock::new();
    REGISTRY.get_or_init(AnalyzerRegistry::new)
}

/// Construct an analyzer from the process-wide registry.
///
/// # Examples
///
/// ```
/// use sagitta::analysis::registry::{analyzer, TextFormat};
///
/// let delimiter = analyzer("delimiter", TextFormat::Json, r#"{"delimiter":","}"#);
/// assert!(delimiter.is_some());
///
/// assert!(analyzer("no_such_analyzer", TextFormat::Json, "{}").is_none());
/// ```
pub fn analyzer(name: &str, format: TextFormat, args: &str) -> Option<Box<dyn Analyzer>> {
    global().get(name, format, args)
}

#[derive(Debug, Deserialize)]
struct PipelineMemberConfig {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    properties: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PipelineConfig {
    pipeline: Vec<PipelineMemberConfig>,
}

fn pipeline_from_json(args: &str) -> Option<Box<dyn Analyzer>> {
    let config = match serde_json::from_str::<PipelineConfig>(args) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid pipeline analyzer arguments {args:?}: {e}");
            return None;
        }
    };

    let mut members = Vec::with_capacity(config.pipeline.len());
    for member in &config.pipeline {
        let args = member.properties.to_string();
        match analyzer(&member.kind, TextFormat::Json, &args) {
            Some(analyzer) => members.push(analyzer),
            None => {
                error!("failed to construct pipeline member {:?}", member.kind);
                return None;
            }
        }
    }

    match PipelineAnalyzer::new(members) {
        Ok(pipeline) => Some(Box::new(pipeline)),
        Err(e) => {
            error!("failed to construct pipeline: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(analyzer: &mut dyn Analyzer, input: &str) -> Vec<String> {
        assert!(analyzer.reset(input));
        let mut out = Vec::new();
        while analyzer.next() {
            out.push(analyzer.token().term.clone());
        }
        out
    }

    #[test]
    fn test_builtin_factories() {
        assert!(analyzer("delimiter", TextFormat::Json, r#"{"delimiter":","}"#).is_some());
        assert!(analyzer("delimiter", TextFormat::Text, ",").is_some());
        assert!(analyzer("ngram", TextFormat::Json, r#"{"min":2,"max":3}"#).is_some());
        assert!(analyzer("norm", TextFormat::Json, r#"{"locale":"en","case":"lower"}"#).is_some());
        assert!(
            analyzer("text", TextFormat::Json, r#"{"locale":"en","stopwords":[]}"#).is_some()
        );
    }

    #[test]
    fn test_unknown_name_and_format() {
        assert!(analyzer("nope", TextFormat::Json, "{}").is_none());
        // ngram has no text-format factory.
        assert!(analyzer("ngram", TextFormat::Text, "2").is_none());
    }

    #[test]
    fn test_malformed_arguments() {
        assert!(analyzer("delimiter", TextFormat::Json, "{").is_none());
        assert!(analyzer("ngram", TextFormat::Json, r#"{"min":3,"max":1}"#).is_none());
    }

    #[test]
    fn test_pipeline_factory() {
        let args = r#"{
            "pipeline": [
                { "type": "delimiter", "properties": { "delimiter": " " } },
                { "type": "ngram", "properties": { "min": 2, "max": 2 } }
            ]
        }"#;
        let mut pipeline = analyzer("pipeline", TextFormat::Json, args).unwrap();

        assert_eq!(drain(pipeline.as_mut(), "ab cd"), vec!["ab", "cd"]);
    }

    #[test]
    fn test_pipeline_factory_rejects_bad_members() {
        let args = r#"{"pipeline":[{"type":"nope","properties":{}}]}"#;
        assert!(analyzer("pipeline", TextFormat::Json, args).is_none());

        let args = r#"{"pipeline":[]}"#;
        assert!(analyzer("pipeline", TextFormat::Json, args).is_none());
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = AnalyzerRegistry::new();
        registry.register("splitter", TextFormat::Text, |args| {
            DelimiterAnalyzer::from_text(args).map(|a| Box::new(a) as Box<dyn Analyzer>)
        });

        assert!(registry.get("splitter", TextFormat::Text, "|").is_some());
        assert!(registry.get("splitter", TextFormat::Json, "|").is_none());
    }
}
