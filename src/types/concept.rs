use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification label carried as the prefix of a record's description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConceptKind {
    Class,
    Dataclass,
    Protocol,
    Enum,
    TypedDict,
    AbstractBase,
    /// Abstract base written through a module attribute, e.g. `abc.ABC`.
    QualifiedAbc,
    Function,
    Method,
    Constant,
    Module,
    Config,
}

impl ConceptKind {
    pub const ALL: [ConceptKind; 12] = [
        ConceptKind::Class,
        ConceptKind::Dataclass,
        ConceptKind::Protocol,
        ConceptKind::Enum,
        ConceptKind::TypedDict,
        ConceptKind::AbstractBase,
        ConceptKind::QualifiedAbc,
        ConceptKind::Function,
        ConceptKind::Method,
        ConceptKind::Constant,
        ConceptKind::Module,
        ConceptKind::Config,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ConceptKind::Class => "Class",
            ConceptKind::Dataclass => "Dataclass",
            ConceptKind::Protocol => "Protocol",
            ConceptKind::Enum => "Enum",
            ConceptKind::TypedDict => "TypedDict",
            ConceptKind::AbstractBase => "Abstract Base Class",
            ConceptKind::QualifiedAbc => "ABC",
            ConceptKind::Function => "Function",
            ConceptKind::Method => "Method",
            ConceptKind::Constant => "Constant",
            ConceptKind::Module => "Python module",
            ConceptKind::Config => "Config",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.label() == label)
    }

    /// Parse the kind out of a description's prefix (text before the first colon).
    pub fn from_description(description: &str) -> Option<Self> {
        let (prefix, _) = description.split_once(':')?;
        Self::from_label(prefix)
    }

    pub fn is_code(&self) -> bool {
        !matches!(self, ConceptKind::Config)
    }

}

impl fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConceptRecord {
    pub concept: String,
    pub description: String,
    pub source: String,
}

impl ConceptRecord {
    pub fn new(concept: impl Into<String>, description: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            description: description.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> Option<ConceptKind> {
        ConceptKind::from_description(&self.description)
    }

    pub fn is_complete(&self) -> bool {
        !self.concept.is_empty() && !self.description.is_empty() && !self.source.is_empty()
    }
}

/// Builds a `"<Label>: <body> <details>"` description.
///
/// The label is always followed by a colon so the prefix stays parseable even
/// when there is no docstring.
#[derive(Debug, Clone)]
pub struct DescriptionBuilder {
    text: String,
}

impl DescriptionBuilder {
    pub fn new(kind: ConceptKind) -> Self {
        Self {
            text: format!("{}:", kind.label()),
        }
    }

    pub fn body(mut self, body: &str) -> Self {
        let body = body.trim();
        if !body.is_empty() {
            self.text.push(' ');
            self.text.push_str(body);
        }
        self
    }

    pub fn detail(mut self, label: &str, items: &[String]) -> Self {
        if !items.is_empty() {
            self.text.push_str(&format!(" ({}: {})", label, items.join(", ")));
        }
        self
    }

    pub fn build(self) -> String {
        self.text
    }
}
