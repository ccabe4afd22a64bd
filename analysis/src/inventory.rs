//! Python function inventory backed by tree-sitter.
//!
//! A function counts as documented when the first statement of its body,
//! ignoring comments, is an expression statement holding a string literal.

use errors::InventoryError;
use scribe_core::FunctionDescriptor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tree_sitter::{Node, Parser};
use walkdir::{DirEntry, WalkDir};

type Walker = walkdir::FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>;

/// A source tree that can be traversed any number of times.
#[derive(Debug, Clone)]
pub struct Inventory {
    root: PathBuf
}

impl Inventory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Start a fresh traversal over undocumented functions.
    pub fn iter(&self) -> UndocumentedFunctions {
        find_undocumented(&self.root)
    }
}

impl IntoIterator for &Inventory {
    type Item = FunctionDescriptor;
    type IntoIter = UndocumentedFunctions;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy stream of undocumented functions. Files are read and parsed only as
/// the consumer pulls.
pub struct UndocumentedFunctions {
    walker: Walker,
    pending: std::vec::IntoIter<FunctionDescriptor>
}

impl Iterator for UndocumentedFunctions {
    type Item = FunctionDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(function) = self.pending.next() {
                return Some(function);
            }

            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if !is_python_file(&entry) {
                continue;
            }

            match parse_functions(entry.path()) {
                Ok(functions) => {
                    let missing: Vec<_> = functions
                        .into_iter()
                        .filter(|f| !f.has_documentation)
                        .collect();
                    self.pending = missing.into_iter();
                }
                Err(e) => warn!("Skipping {}: {}", entry.path().display(), e)
            }
        }
    }
}

/// Walk `root` for `*.py` files, skipping hidden directories, and yield every
/// function without a docstring.
pub fn find_undocumented(root: impl AsRef<Path>) -> UndocumentedFunctions {
    let walker = WalkDir::new(root.as_ref())
        .sort_by_file_name()
        .into_iter()
        .filter_entry(not_hidden as fn(&DirEntry) -> bool);

    UndocumentedFunctions {
        walker,
        pending: Vec::new().into_iter()
    }
}

/// Read and parse one file, returning all of its functions.
///
/// Bytes that are not valid UTF-8 (legacy encodings such as latin-1) are
/// replaced rather than rejected, so line numbers stay intact.
pub fn parse_functions(path: &Path) -> Result<Vec<FunctionDescriptor>, InventoryError> {
    let bytes = std::fs::read(path).map_err(|e| InventoryError::Read {
        path: path.display().to_string(),
        reason: e.to_string()
    })?;
    let text = String::from_utf8_lossy(&bytes);
    parse_source(path, &text)
}

/// Parse `text` as Python. Nested functions and methods are included.
/// Sources whose syntax tree contains errors are rejected.
pub fn parse_source(path: &Path, text: &str) -> Result<Vec<FunctionDescriptor>, InventoryError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| InventoryError::Language {
            reason: e.to_string()
        })?;

    let tree = parser.parse(text, None).ok_or_else(|| InventoryError::Parse {
        path: path.display().to_string(),
        reason: "parser produced no tree".to_string()
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(InventoryError::Parse {
            path: path.display().to_string(),
            reason: "syntax error".to_string()
        });
    }

    let mut functions = Vec::new();
    collect_functions(root, text.as_bytes(), path, &mut functions);
    debug!("{} functions in {}", functions.len(), path.display());
    Ok(functions)
}

fn collect_functions(
    node: Node<'_>,
    source: &[u8],
    path: &Path,
    out: &mut Vec<FunctionDescriptor>
) {
    if node.kind() == "function_definition" {
        if let Some(function) = describe(node, source, path) {
            out.push(function);
        }
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_functions(child, source, path, out);
    }
}

fn describe(node: Node<'_>, source: &[u8], path: &Path) -> Option<FunctionDescriptor> {
    let name = node
        .child_by_field_name("name")?
        .utf8_text(source)
        .ok()?
        .to_string();

    Some(FunctionDescriptor {
        name,
        file: path.to_path_buf(),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        has_documentation: has_docstring(node),
        source: node.utf8_text(source).ok()?.to_string()
    })
}

fn has_docstring(function: Node<'_>) -> bool {
    let Some(body) = function.child_by_field_name("body") else {
        return false;
    };

    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");

    let Some(statement) = first else {
        return false;
    };
    if statement.kind() != "expression_statement" {
        return false;
    }

    statement
        .named_child(0)
        .is_some_and(|expr| matches!(expr.kind(), "string" | "concatenated_string"))
}

fn not_hidden(entry: &DirEntry) -> bool {
    entry.depth() == 0
        || !entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_python_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "py")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<FunctionDescriptor> {
        parse_source(Path::new("sample.py"), text).unwrap()
    }

    #[test]
    fn test_docstring_detection() {
        let functions = parse(
            r#"
def documented():
    """Does a thing."""
    return 1

def undocumented():
    return 2

def commented_then_doc():
    # leading comment
    'single-quoted counts too'
    pass

def string_not_first():
    x = 1
    "late string"
"#
        );

        let by_name = |name: &str| functions.iter().find(|f| f.name == name).unwrap();
        assert!(by_name("documented").has_documentation);
        assert!(!by_name("undocumented").has_documentation);
        assert!(by_name("commented_then_doc").has_documentation);
        assert!(!by_name("string_not_first").has_documentation);
    }

    #[test]
    fn test_nested_functions_and_methods_are_found() {
        let functions = parse(
            r#"class Greeter:
    def greet(self):
        def inner():
            return "hi"
        return inner()
"#
        );

        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["greet", "inner"]);
        assert_eq!(functions[0].start_line, 2);
        assert_eq!(functions[0].end_line, 5);
        assert!(functions[1].source.starts_with("def inner():"));
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let result = parse_source(Path::new("broken.py"), "def broken(:\n    pass\n");
        assert!(matches!(result, Err(InventoryError::Parse { .. })));
    }
}
