//! Every workspace member inherits the workspace version.

use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn manifest(path: &Path) -> toml::Value {
    let text = std::fs::read_to_string(path.join("Cargo.toml")).unwrap();
    text.parse().unwrap()
}

#[test]
fn members_use_workspace_version() {
    let root = workspace_root();
    let ws = manifest(&root);
    let members = ws["workspace"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 3);

    for member in members {
        let member = member.as_str().unwrap();
        let doc = manifest(&root.join(member));
        let inherits = doc["package"]["version"]
            .as_table()
            .and_then(|t| t.get("workspace"))
            .and_then(|v| v.as_bool());
        assert_eq!(inherits, Some(true), "{member} should use version.workspace = true");
    }
}

#[test]
fn workspace_version_matches_cargo_pkg() {
    let ws = manifest(&workspace_root());
    let version = ws["workspace"]["package"]["version"].as_str().unwrap();
    assert_eq!(version, env!("CARGO_PKG_VERSION"));
    assert_eq!(alpha_core::VERSION, version);
}
