use analysis::{Inventory, find_undocumented};
use testing::python_tree;

const MODULE: &str = r#"
def documented(a):
    """Already has docs."""
    return a

def missing(a, b):
    return a + b

class Service:
    def run(self):
        return missing(1, 2)
"#;

#[test]
fn test_yields_only_undocumented_functions() {
    let (_dir, root) = python_tree(&[("pkg/service.py", MODULE)]);

    let names: Vec<String> = find_undocumented(&root).map(|f| f.name).collect();
    assert_eq!(names, vec!["missing".to_string(), "run".to_string()]);
}

#[test]
fn test_skips_hidden_dirs_non_python_and_broken_files() {
    let (_dir, root) = python_tree(&[
        ("a.py", "def a():\n    pass\n"),
        (".git/hooks/hook.py", "def hidden():\n    pass\n"),
        (".venv/lib/site.py", "def vendored():\n    pass\n"),
        ("notes.txt", "def not_python():\n    pass\n"),
        ("broken.py", "def broken(:\n    pass\n"),
        ("z/last.py", "def z():\n    pass\n"),
    ]);

    let names: Vec<String> = find_undocumented(&root).map(|f| f.name).collect();
    assert_eq!(names, vec!["a".to_string(), "z".to_string()]);
}

#[test]
fn test_inventory_can_be_traversed_twice() {
    let source = "def f():\n    return 1\n\ndef g():\n    return 2\n";
    let (_dir, root) = python_tree(&[("m.py", source)]);
    let inventory = Inventory::new(&root);

    let first: Vec<_> = inventory.iter().collect();
    let second: Vec<_> = (&inventory).into_iter().collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(first[0].file, root.join("m.py"));
    assert_eq!(first[1].start_line, 4);
}

#[test]
fn test_empty_tree_yields_nothing() {
    let (_dir, root) = python_tree(&[]);
    assert_eq!(find_undocumented(&root).count(), 0);
}

#[test]
fn test_consumer_can_stop_early() {
    let (_dir, root) = python_tree(&[
        ("a.py", "def one():\n    pass\n"),
        ("b.py", "def two():\n    pass\n"),
    ]);

    let first = find_undocumented(&root).next().unwrap();
    assert_eq!(first.name, "one");
}

#[test]
fn test_legacy_encoded_file_is_still_inventoried() {
    let (_dir, root) = python_tree(&[("ok.py", "def visible():\n    pass\n")]);
    let mut legacy = b"# -*- coding: latin-1 -*-\n# caf".to_vec();
    legacy.extend_from_slice(&[0xe9]);
    legacy.extend_from_slice(b"\ndef legacy_function():\n    return 1\n");
    std::fs::write(root.join("legacy.py"), legacy).unwrap();

    let found: Vec<_> = find_undocumented(&root).collect();
    let names: Vec<&str> = found.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["legacy_function", "visible"]);
    assert_eq!(found[0].start_line, 3);
}
