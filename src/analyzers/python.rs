use std::path::Path;
use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, Tree};

use super::pyrepr;
use super::traits::ConceptAnalyzer;
use crate::config::ExtractionSettings;
use crate::types::{ConceptKind, ConceptRecord, DescriptionBuilder, OntoscanError, Result};

// Every definition in the file, nested ones included. Annotated
// assignments (`X: int = 1`) are declarations, not constants.
const DEFINITIONS_QUERY: &str = r#"
(class_definition
  name: (identifier) @class.name) @class

(function_definition
  name: (identifier) @function.name) @function

(assignment
  left: (identifier) @constant.name
  !type) @constant
"#;

const ENUM_BASES: [&str; 4] = ["Enum", "IntEnum", "Flag", "IntFlag"];
const RECEIVER_PARAMS: [&str; 2] = ["self", "cls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DefinitionKind {
    Class,
    Function,
    Constant,
}

#[derive(Debug, Clone, Copy)]
struct Definition<'tree> {
    kind: DefinitionKind,
    node: Node<'tree>,
    name: Node<'tree>,
}

pub struct PythonAnalyzer {
    language: Language,
    query: Query,
    settings: ExtractionSettings,
}

impl PythonAnalyzer {
    pub fn new(settings: ExtractionSettings) -> Result<Self> {
        let language: Language = tree_sitter_python::LANGUAGE.into();
        let query = Query::new(&language, DEFINITIONS_QUERY)
            .map_err(|e| OntoscanError::TreeSitter(format!("Query error: {:?}", e)))?;

        Ok(Self {
            language,
            query,
            settings,
        })
    }

    fn parse(&self, relative_path: &str, content: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| OntoscanError::TreeSitter(e.to_string()))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| OntoscanError::parse(relative_path, "parser produced no tree"))?;

        if tree.root_node().has_error() {
            let line = first_error(tree.root_node())
                .map(|node| node.start_position().row + 1)
                .unwrap_or(1);
            return Err(OntoscanError::parse(
                relative_path,
                format!("syntax error near line {}", line),
            ));
        }

        Ok(tree)
    }

    fn collect_definitions<'tree>(&self, root: Node<'tree>, source: &[u8]) -> Vec<Definition<'tree>> {
        let capture_names = self.query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, root, source);

        let mut definitions = Vec::new();
        while let Some(query_match) = matches.next() {
            let mut kind = None;
            let mut node = None;
            let mut name = None;

            for capture in query_match.captures {
                match capture_names[capture.index as usize] {
                    "class" => {
                        kind = Some(DefinitionKind::Class);
                        node = Some(capture.node);
                    }
                    "function" => {
                        kind = Some(DefinitionKind::Function);
                        node = Some(capture.node);
                    }
                    "constant" => {
                        kind = Some(DefinitionKind::Constant);
                        node = Some(capture.node);
                    }
                    "class.name" | "function.name" | "constant.name" => name = Some(capture.node),
                    _ => {}
                }
            }

            if let (Some(kind), Some(node), Some(name)) = (kind, node, name) {
                definitions.push(Definition { kind, node, name });
            }
        }

        definitions.sort_by_key(|def| (def.node.start_byte(), def.kind));
        definitions
    }

    fn module_record(&self, root: Node, relative_path: &str, source: &[u8]) -> Option<ConceptRecord> {
        let doc = docstring(root, source)?;
        let stem = Path::new(relative_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(relative_path);

        Some(ConceptRecord::new(
            format!("Module: {}", stem),
            DescriptionBuilder::new(ConceptKind::Module)
                .body(self.truncate_doc(&doc))
                .build(),
            relative_path,
        ))
    }

    fn class_record(&self, def: &Definition, name: &str, relative_path: &str, source: &[u8]) -> ConceptRecord {
        let kind = classify_class(def.node, source);
        let bases = base_names(def.node, source);
        let doc = body_docstring(def.node, source).unwrap_or_default();

        let description = DescriptionBuilder::new(kind)
            .body(self.truncate_doc(&doc))
            .detail("inherits from", &bases)
            .build();

        ConceptRecord::new(name, description, relative_path)
    }

    fn function_record(&self, def: &Definition, name: &str, relative_path: &str, source: &[u8]) -> ConceptRecord {
        let params = positional_parameters(def.node, source);
        let is_method = params
            .first()
            .is_some_and(|first| RECEIVER_PARAMS.contains(&first.as_str()));
        let kind = if is_method { ConceptKind::Method } else { ConceptKind::Function };

        let listed: Vec<&str> = params
            .iter()
            .map(String::as_str)
            .filter(|p| !RECEIVER_PARAMS.contains(p))
            .collect();

        let mut details = Vec::new();
        if !listed.is_empty() {
            let max = self.settings.max_params;
            let mut shown = listed.iter().take(max).copied().collect::<Vec<_>>().join(", ");
            if listed.len() > max {
                shown.push_str("...");
            }
            details.push(shown);
        }

        let doc = body_docstring(def.node, source).unwrap_or_default();
        let description = DescriptionBuilder::new(kind)
            .body(self.truncate_doc(&doc))
            .detail("params", &details)
            .build();

        ConceptRecord::new(name, description, relative_path)
    }

    fn constant_record(&self, def: &Definition, name: &str, relative_path: &str, source: &[u8]) -> Option<ConceptRecord> {
        if name.chars().count() <= 1 || !pyrepr::is_upper(name) {
            return None;
        }

        let mut value = def.node.child_by_field_name("right")?;
        while value.kind() == "assignment" {
            value = value.child_by_field_name("right")?;
        }

        Some(ConceptRecord::new(
            name,
            DescriptionBuilder::new(ConceptKind::Constant)
                .body(&value_description(value, source))
                .build(),
            relative_path,
        ))
    }

    fn truncate_doc<'a>(&self, doc: &'a str) -> &'a str {
        pyrepr::truncate_chars(doc, self.settings.max_doc_chars).trim()
    }
}

impl ConceptAnalyzer for PythonAnalyzer {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extract(&self, relative_path: &str, content: &str) -> Result<Vec<ConceptRecord>> {
        let tree = self.parse(relative_path, content)?;
        let source = content.as_bytes();
        let root = tree.root_node();

        let mut records = Vec::new();
        if self.settings.include_module_docs {
            records.extend(self.module_record(root, relative_path, source));
        }

        for def in self.collect_definitions(root, source) {
            let name = node_text(def.name, source);
            if !pyrepr::is_public_name(name) {
                continue;
            }

            match def.kind {
                DefinitionKind::Class => records.push(self.class_record(&def, name, relative_path, source)),
                DefinitionKind::Function => records.push(self.function_record(&def, name, relative_path, source)),
                DefinitionKind::Constant => records.extend(self.constant_record(&def, name, relative_path, source)),
            }
        }

        debug!("Extracted {} concepts from {}", records.len(), relative_path);
        Ok(records)
    }
}

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn unwrap_parens(mut node: Node) -> Node {
    while node.kind() == "parenthesized_expression" {
        let mut cursor = node.walk();
        let inner = node.named_children(&mut cursor).find(|c| c.kind() != "comment");
        match inner {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn count_elements(node: Node) -> usize {
    let mut cursor = node.walk();
    let count = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .count();
    count
}

/// Decoded value of a `string` or implicitly concatenated string node.
/// The flag is set for bytes literals; formatted strings yield `None`.
fn string_value(node: Node, source: &[u8]) -> Option<(String, bool)> {
    match node.kind() {
        "string" => {
            let mut cursor = node.walk();
            let interpolated = node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "interpolation");
            if interpolated {
                return None;
            }
            pyrepr::decode_string_literal(node_text(node, source))
        }
        "concatenated_string" => {
            let mut cursor = node.walk();
            let parts: Vec<Node> = node
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "string")
                .collect();
            let mut value = String::new();
            let mut is_bytes = false;
            for part in parts {
                let (text, bytes) = string_value(part, source)?;
                value.push_str(&text);
                is_bytes = bytes;
            }
            Some((value, is_bytes))
        }
        _ => None,
    }
}

/// Docstring of a module or of a definition body block.
fn docstring(body: Node, source: &[u8]) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }

    let mut inner_cursor = first.walk();
    let expr = first.named_children(&mut inner_cursor).next()?;
    let (value, is_bytes) = string_value(unwrap_parens(expr), source)?;
    if is_bytes {
        return None;
    }

    let cleaned = pyrepr::clean_docstring(&value);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn body_docstring(definition: Node, source: &[u8]) -> Option<String> {
    definition
        .child_by_field_name("body")
        .and_then(|body| docstring(body, source))
}

/// Bare-name decorators applied to a definition.
fn decorator_names(definition: Node, source: &[u8]) -> Vec<String> {
    let Some(parent) = definition.parent() else {
        return Vec::new();
    };
    if parent.kind() != "decorated_definition" {
        return Vec::new();
    }

    let mut names = Vec::new();
    let mut cursor = parent.walk();
    for decorator in parent.named_children(&mut cursor) {
        if decorator.kind() != "decorator" {
            continue;
        }
        let mut inner_cursor = decorator.walk();
        let expr = decorator
            .named_children(&mut inner_cursor)
            .find(|c| c.kind() != "comment");
        if let Some(expr) = expr.filter(|e| e.kind() == "identifier") {
            names.push(node_text(expr, source).to_string());
        }
    }
    names
}

fn superclass_nodes(class_node: Node) -> Vec<Node> {
    let Some(arguments) = class_node.child_by_field_name("superclasses") else {
        return Vec::new();
    };
    let mut cursor = arguments.walk();
    let nodes: Vec<Node> = arguments
        .named_children(&mut cursor)
        .filter(|c| matches!(c.kind(), "identifier" | "attribute"))
        .collect();
    nodes
}

fn attribute_name<'a>(attribute: Node, source: &'a [u8]) -> Option<&'a str> {
    attribute
        .child_by_field_name("attribute")
        .map(|attr| node_text(attr, source))
}

fn classify_class(class_node: Node, source: &[u8]) -> ConceptKind {
    for decorator in decorator_names(class_node, source) {
        match decorator.as_str() {
            "dataclass" => return ConceptKind::Dataclass,
            "runtime_checkable" => return ConceptKind::Protocol,
            _ => {}
        }
    }

    for base in superclass_nodes(class_node) {
        let kind = match base.kind() {
            "identifier" => match node_text(base, source) {
                name if ENUM_BASES.contains(&name) => Some(ConceptKind::Enum),
                "Protocol" => Some(ConceptKind::Protocol),
                "TypedDict" => Some(ConceptKind::TypedDict),
                "ABC" | "ABCMeta" => Some(ConceptKind::AbstractBase),
                _ => None,
            },
            _ => match attribute_name(base, source) {
                Some("Enum") => Some(ConceptKind::Enum),
                Some("Protocol") => Some(ConceptKind::Protocol),
                Some("TypedDict") => Some(ConceptKind::TypedDict),
                Some("ABC") => Some(ConceptKind::QualifiedAbc),
                _ => None,
            },
        };
        if let Some(kind) = kind {
            return kind;
        }
    }

    ConceptKind::Class
}

fn base_names(class_node: Node, source: &[u8]) -> Vec<String> {
    superclass_nodes(class_node)
        .into_iter()
        .filter_map(|base| match base.kind() {
            "identifier" => Some(node_text(base, source).to_string()),
            _ => attribute_name(base, source).map(str::to_string),
        })
        .collect()
}

/// Regular positional parameters: positional-only ones, `*args`,
/// keyword-only ones and `**kwargs` are left out.
fn positional_parameters(function_node: Node, source: &[u8]) -> Vec<String> {
    let Some(parameters) = function_node.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut names = Vec::new();
    let mut cursor = parameters.walk();
    for param in parameters.named_children(&mut cursor) {
        match param.kind() {
            "identifier" => names.push(node_text(param, source).to_string()),
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = param.child_by_field_name("name") {
                    if name.kind() == "identifier" {
                        names.push(node_text(name, source).to_string());
                    }
                }
            }
            "typed_parameter" => {
                let mut inner_cursor = param.walk();
                let inner = param.named_children(&mut inner_cursor).next();
                match inner.map(|n| (n.kind(), n)) {
                    Some(("identifier", name)) => names.push(node_text(name, source).to_string()),
                    Some(("list_splat_pattern", _)) => break,
                    _ => {}
                }
            }
            "positional_separator" => names.clear(),
            "list_splat_pattern" | "keyword_separator" => break,
            _ => {}
        }
    }
    names
}

fn literal(type_name: &str, repr: &str) -> String {
    format!("{} = {}", type_name, pyrepr::truncate_chars(repr, 50))
}

fn value_description(value: Node, source: &[u8]) -> String {
    let value = unwrap_parens(value);
    let text = node_text(value, source);

    match value.kind() {
        "integer" | "float" if text.ends_with(['j', 'J']) => {
            let cleaned: String = text.chars().filter(|c| *c != '_').collect();
            literal("complex", &cleaned.to_ascii_lowercase())
        }
        "integer" => literal("int", &pyrepr::int_literal_repr(text)),
        "float" => literal("float", &pyrepr::float_literal_repr(text)),
        "string" | "concatenated_string" => match string_value(value, source) {
            Some((bytes, true)) => literal("bytes", &pyrepr::bytes_repr(&bytes)),
            Some((text, false)) => literal("str", &pyrepr::str_repr(&text)),
            None => "Value".to_string(),
        },
        "true" => literal("bool", "True"),
        "false" => literal("bool", "False"),
        "none" => literal("NoneType", "None"),
        "ellipsis" => literal("ellipsis", "Ellipsis"),
        "list" => format!("List with {} elements", count_elements(value)),
        "dictionary" => format!("Dict with {} keys", count_elements(value)),
        "tuple" | "expression_list" => format!("Tuple with {} elements", count_elements(value)),
        "call" => match value.child_by_field_name("function") {
            Some(function) if function.kind() == "identifier" => {
                format!("Result of {}()", node_text(function, source))
            }
            _ => "Value".to_string(),
        },
        _ => "Value".to_string(),
    }
}
