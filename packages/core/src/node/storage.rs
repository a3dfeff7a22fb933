//! Node inventory storage
//!
//! Load and save nodes.json file.

use std::fs;
use std::path::Path;

use jsonc_parser::parse_to_serde_value;

use super::error::NodeError;
use super::schema::NodesFile;

/// Load the node inventory from `nodes_path`
///
/// Returns empty NodesFile if file doesn't exist. Accepts JSONC.
pub fn load_nodes_from(nodes_path: &Path) -> Result<NodesFile, NodeError> {
    if !nodes_path.exists() {
        tracing::debug!(
            "Nodes file not found, returning empty: {}",
            nodes_path.display()
        );
        return Ok(NodesFile::new());
    }

    let contents = fs::read_to_string(nodes_path).map_err(|e| {
        NodeError::LoadFailed(format!("Failed to read {}: {}", nodes_path.display(), e))
    })?;

    let value = parse_to_serde_value(&contents, &Default::default())
        .map_err(|e| {
            NodeError::LoadFailed(format!("Invalid JSONC in {}: {}", nodes_path.display(), e))
        })?
        .ok_or_else(|| {
            NodeError::LoadFailed(format!("{} is empty", nodes_path.display()))
        })?;

    let nodes: NodesFile = serde_json::from_value(value).map_err(|e| {
        NodeError::LoadFailed(format!("Invalid nodes in {}: {}", nodes_path.display(), e))
    })?;

    tracing::debug!(
        "Loaded {} nodes from {}",
        nodes.nodes.len(),
        nodes_path.display()
    );
    Ok(nodes)
}

/// Save the node inventory to `nodes_path`
///
/// Creates the parent directory if it doesn't exist.
/// Creates a backup (.bak) if file already exists.
pub fn save_nodes_to(nodes: &NodesFile, nodes_path: &Path) -> Result<(), NodeError> {
    crate::config::write_json_with_backup(nodes, nodes_path, "nodes")
        .map_err(|e| NodeError::SaveFailed(format!("{e:#}")))?;

    tracing::debug!(
        "Saved {} nodes to {}",
        nodes.nodes.len(),
        nodes_path.display()
    );
    Ok(())
}
