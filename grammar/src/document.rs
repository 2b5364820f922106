//! Grammar document types.
//!
//! A [`GrammarDocument`] declares a command graph as nested
//! [`NodeSpec`]s. Nodes without an `argument` are literals. Redirects name
//! their target by path from the root; an empty path is the root itself.
//!
//! ```yaml
//! name: teleport
//! commands:
//!   - name: tp
//!     children:
//!       - name: here
//!         executes: true
//!         result: 1
//!       - name: target
//!         argument: { type: word }
//!         executes: true
//!   - name: teleport
//!     redirect: [tp]
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use command_tree_core::{ArgumentType, StringKind};
use serde::{Deserialize, Serialize};

use crate::error::{GrammarError, Result};

/// Version of the document format.
pub const GRAMMAR_FORMAT_VERSION: &str = "1.0.0";

/// A serializable command graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarDocument {
    /// Format version (populated from [`GRAMMAR_FORMAT_VERSION`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO-8601 timestamp for exported documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    /// Top-level commands, the root's children.
    #[serde(default)]
    pub commands: Vec<NodeSpec>,
}

impl Default for GrammarDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarDocument {
    pub fn new() -> Self {
        Self {
            format_version: Some(GRAMMAR_FORMAT_VERSION.to_string()),
            name: None,
            description: None,
            generated_at: None,
            commands: Vec::new(),
        }
    }

    pub fn with_command(mut self, command: NodeSpec) -> Self {
        self.commands.push(command);
        self
    }

    /// Counts every node in the document, excluding the root.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[NodeSpec]) -> usize {
            nodes.iter().map(|node| 1 + count(&node.children)).sum()
        }
        count(&self.commands)
    }

    /// Follows `path` by name from the root.
    pub fn find(&self, path: &[String]) -> Option<&NodeSpec> {
        let (first, rest) = path.split_first()?;
        let mut node = self.commands.iter().find(|node| &node.name == first)?;
        for name in rest {
            node = node.children.iter().find(|child| &child.name == name)?;
        }
        Some(node)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Loads a document, choosing the format from the file extension
    /// (`.json`, `.yaml` or `.yml`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has an unknown
    /// extension, or does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let reader = BufReader::new(std::fs::File::open(path)?);
        let document = match format {
            DocumentFormat::Json => serde_json::from_reader(reader)?,
            DocumentFormat::Yaml => serde_yaml::from_reader(reader)?,
        };
        Ok(document)
    }

    /// Saves the document in the format named by the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let writer = BufWriter::new(std::fs::File::create(path)?);
        match format {
            DocumentFormat::Json => serde_json::to_writer_pretty(writer, self)?,
            DocumentFormat::Yaml => serde_yaml::to_writer(writer, self)?,
        }
        Ok(())
    }
}

/// On-disk encodings of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(GrammarError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// One literal or argument node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Literal text, or the argument's name.
    pub name: String,
    /// Argument type; absent for literals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<ArgumentSpec>,
    /// Whether input may end at this node.
    #[serde(default, skip_serializing_if = "is_false")]
    pub executes: bool,
    /// Value the executor reports.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub result: i32,
    /// Minimum permission level needed to use this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<u32>,
    /// Path of the node parsing continues at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Vec<String>>,
    /// Run the redirected remainder once per source and keep going on
    /// failures.
    #[serde(default, skip_serializing_if = "is_false")]
    pub fork: bool,
    /// Name of a registered suggestion provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

impl NodeSpec {
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument: None,
            executes: false,
            result: 0,
            permission: None,
            redirect: None,
            fork: false,
            suggestions: None,
            children: Vec::new(),
        }
    }

    pub fn argument(name: impl Into<String>, argument: ArgumentSpec) -> Self {
        Self {
            argument: Some(argument),
            ..Self::literal(name)
        }
    }

    pub fn is_literal(&self) -> bool {
        self.argument.is_none()
    }

    /// Marks the node executable, reporting `result`.
    pub fn executes(mut self, result: i32) -> Self {
        self.executes = true;
        self.result = result;
        self
    }

    pub fn permission(mut self, level: u32) -> Self {
        self.permission = Some(level);
        self
    }

    pub fn redirect<I, T>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.redirect = Some(path.into_iter().map(Into::into).collect());
        self
    }

    pub fn fork<I, T>(self, path: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut node = self.redirect(path);
        node.fork = true;
        node
    }

    pub fn suggestions(mut self, provider: impl Into<String>) -> Self {
        self.suggestions = Some(provider.into());
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    /// How the node appears in usage text.
    pub fn usage_text(&self) -> String {
        if self.is_literal() {
            self.name.clone()
        } else {
            format!("<{}>", self.name)
        }
    }
}

/// Argument type as written in documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArgumentSpec {
    Bool,
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i32>,
    },
    Long {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Float {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f32>,
    },
    Double {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// One unquoted word.
    Word,
    /// A word or a quoted phrase.
    String,
    /// The rest of the input.
    GreedyString,
    /// A parser the proxy relays without interpreting.
    Passthrough {
        identifier: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        properties: Vec<u8>,
    },
}

impl ArgumentSpec {
    /// Whether `min <= max` for bounded numeric types.
    pub fn has_valid_bounds(&self) -> bool {
        let ty = self.to_argument_type();
        match ty {
            ArgumentType::Integer { min, max } => min <= max,
            ArgumentType::Long { min, max } => min <= max,
            ArgumentType::Float { min, max } => min <= max,
            ArgumentType::Double { min, max } => min <= max,
            _ => true,
        }
    }

    pub fn to_argument_type(&self) -> ArgumentType {
        match self {
            Self::Bool => ArgumentType::bool(),
            Self::Integer { min, max } => {
                ArgumentType::integer_between(min.unwrap_or(i32::MIN), max.unwrap_or(i32::MAX))
            }
            Self::Long { min, max } => {
                ArgumentType::long_between(min.unwrap_or(i64::MIN), max.unwrap_or(i64::MAX))
            }
            Self::Float { min, max } => {
                ArgumentType::float_between(min.unwrap_or(f32::MIN), max.unwrap_or(f32::MAX))
            }
            Self::Double { min, max } => {
                ArgumentType::double_between(min.unwrap_or(f64::MIN), max.unwrap_or(f64::MAX))
            }
            Self::Word => ArgumentType::word(),
            Self::String => ArgumentType::string(),
            Self::GreedyString => ArgumentType::greedy_string(),
            Self::Passthrough {
                identifier,
                properties,
            } => ArgumentType::passthrough(identifier.clone(), properties.clone()),
        }
    }

    pub fn from_argument_type(ty: &ArgumentType) -> Self {
        fn bound<T: PartialEq>(value: T, extreme: T) -> Option<T> {
            (value != extreme).then_some(value)
        }
        match ty {
            ArgumentType::Bool => Self::Bool,
            ArgumentType::Integer { min, max } => Self::Integer {
                min: bound(*min, i32::MIN),
                max: bound(*max, i32::MAX),
            },
            ArgumentType::Long { min, max } => Self::Long {
                min: bound(*min, i64::MIN),
                max: bound(*max, i64::MAX),
            },
            ArgumentType::Float { min, max } => Self::Float {
                min: bound(*min, f32::MIN),
                max: bound(*max, f32::MAX),
            },
            ArgumentType::Double { min, max } => Self::Double {
                min: bound(*min, f64::MIN),
                max: bound(*max, f64::MAX),
            },
            ArgumentType::String(StringKind::SingleWord) => Self::Word,
            ArgumentType::String(StringKind::QuotablePhrase) => Self::String,
            ArgumentType::String(StringKind::GreedyPhrase) => Self::GreedyString,
            ArgumentType::Passthrough(passthrough) => Self::Passthrough {
                identifier: passthrough.identifier.clone(),
                properties: passthrough.properties.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
name: teleport
commands:
  - name: tp
    children:
      - name: here
        executes: true
        result: 1
      - name: target
        argument: { type: word }
        executes: true
        result: 2
  - name: give
    children:
      - name: amount
        argument: { type: integer, min: 1, max: 64 }
        executes: true
  - name: teleport
    redirect: [tp]
"#
    }

    #[test]
    fn test_parse_yaml() {
        let doc = GrammarDocument::from_yaml_str(sample_yaml()).unwrap();
        assert_eq!(doc.name.as_deref(), Some("teleport"));
        assert_eq!(doc.commands.len(), 3);
        assert_eq!(doc.node_count(), 6);

        let target = doc.find(&["tp".into(), "target".into()]).unwrap();
        assert_eq!(target.argument, Some(ArgumentSpec::Word));
        assert_eq!(target.result, 2);

        let amount = doc.find(&["give".into(), "amount".into()]).unwrap();
        assert_eq!(
            amount.argument.as_ref().map(ArgumentSpec::to_argument_type),
            Some(ArgumentType::integer_between(1, 64))
        );
    }

    #[test]
    fn test_find_empty_path_is_none() {
        let doc = GrammarDocument::from_yaml_str(sample_yaml()).unwrap();
        assert!(doc.find(&[]).is_none());
        assert!(doc.find(&["tp".into(), "missing".into()]).is_none());
    }

    #[test]
    fn test_json_omits_defaults() {
        let doc = GrammarDocument::new().with_command(NodeSpec::literal("stop").executes(0));
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"executes\": true"));
        assert!(!json.contains("result"));
        assert!(!json.contains("children"));
        assert_eq!(GrammarDocument::from_json_str(&json).unwrap(), doc);
    }

    #[test]
    fn test_argument_spec_conversion_keeps_bounds() {
        let ty = ArgumentType::long_between(0, i64::MAX);
        let spec = ArgumentSpec::from_argument_type(&ty);
        assert_eq!(spec, ArgumentSpec::Long { min: Some(0), max: None });
        assert_eq!(spec.to_argument_type(), ty);
    }

    #[test]
    fn test_bounds_validity() {
        assert!(ArgumentSpec::Integer { min: Some(1), max: Some(1) }.has_valid_bounds());
        assert!(!ArgumentSpec::Double { min: Some(2.0), max: Some(1.0) }.has_valid_bounds());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")).unwrap(), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")).unwrap(), DocumentFormat::Yaml);
        assert!(matches!(
            DocumentFormat::from_path(Path::new("a.toml")),
            Err(GrammarError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_save_and_load_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let doc = GrammarDocument::from_yaml_str(sample_yaml()).unwrap();
        for file in ["grammar.json", "grammar.yaml"] {
            let path = dir.path().join(file);
            doc.save(&path).unwrap();
            assert_eq!(GrammarDocument::load(&path).unwrap(), doc);
        }
    }
}
