use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use schemars::{schema::RootSchema, schema_for};
use thiserror::Error;

use crate::manifest::{NodeDescriptor, PluginManifest};
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError};
use crate::remove_bg::RemoveBackgroundNode;
use crate::remover::BackgroundRemover;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("background removal capability not available; load the removal runtime before this plugin")]
    MissingCapability,
}

/// The loaded plugin: the removal capability plus the node types it exposes,
/// keyed by type name.
///
/// Loading validates the capability eagerly. A host that has no removal
/// runtime gets [`PluginError::MissingCapability`] here, once, before any
/// node can process anything; there is no per-call fallback.
pub struct RemoveBgPlugin {
    remover: Arc<dyn BackgroundRemover>,
    nodes: DashMap<String, Node>,
}

impl fmt::Debug for RemoveBgPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoveBgPlugin")
            .field("nodes", &self.node_names())
            .finish_non_exhaustive()
    }
}

impl RemoveBgPlugin {
    pub fn load(capability: Option<Arc<dyn BackgroundRemover>>) -> Result<Self, PluginError> {
        let remover = capability.ok_or(PluginError::MissingCapability)?;

        let nodes = DashMap::new();
        let node = Node(Box::new(RemoveBackgroundNode::new()));
        nodes.insert(node.type_name(), node);

        tracing::info!(nodes = nodes.len(), "removebg plugin loaded");
        Ok(Self { remover, nodes })
    }

    /// Retrieve a cloned node by its type name, if this plugin ships it.
    pub fn node(&self, type_name: &str) -> Option<Node> {
        self.nodes.get(type_name).map(|entry| entry.value().clone())
    }

    pub fn node_names(&self) -> Vec<String> {
        self.nodes.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Fresh per-run context carrying the injected capability.
    pub fn context(&self) -> NodeContext {
        NodeContext::new(HashMap::new(), HashMap::new(), Arc::clone(&self.remover))
    }

    /// Run one of this plugin's nodes against a message. The host gets a
    /// message back either way: node failures are folded into an error
    /// envelope via [`Message::from_error`], with the failure mirrored in
    /// the message metadata.
    pub async fn dispatch(&self, type_name: &str, msg: Message) -> Message {
        let Some(node) = self.node(type_name) else {
            return Message::from_error(NodeError::NotFound.to_string());
        };

        let mut ctx = self.context();
        match node.process(msg, &mut ctx).await {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(node = type_name, error = %e, "node processing failed");
                Message::from_error(e.to_string())
            }
        }
    }

    pub fn manifest(&self) -> PluginManifest {
        PluginManifest::current()
    }

    pub fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor::remove_background()
    }
}

/// Parameter schema of the node, shipped as `schema.json` in the bundle.
/// The node has no configurable parameters, so this is the (empty) shape of
/// the node type itself.
pub fn parameter_schema() -> RootSchema {
    schema_for!(RemoveBackgroundNode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ImageBlob;
    use crate::remover::RemovalError;
    use async_trait::async_trait;
    use serde_json::json;

    #[derive(Debug)]
    struct NoopRemover;

    #[async_trait]
    impl BackgroundRemover for NoopRemover {
        async fn remove(&self, image: ImageBlob) -> Result<ImageBlob, RemovalError> {
            Ok(image)
        }
    }

    fn noop_plugin() -> RemoveBgPlugin {
        RemoveBgPlugin::load(Some(Arc::new(NoopRemover))).unwrap()
    }

    #[test]
    fn test_load_without_capability_fails_fast() {
        let err = RemoveBgPlugin::load(None).unwrap_err();
        assert!(matches!(err, PluginError::MissingCapability));
    }

    #[test]
    fn test_loaded_plugin_exposes_remove_background() {
        let plugin = noop_plugin();
        assert_eq!(plugin.node_names(), vec!["remove_background".to_string()]);
        assert!(plugin.node("remove_background").is_some());
        assert!(plugin.node("unknown").is_none());
    }

    #[test]
    fn test_plugin_debug_lists_nodes() {
        let output = format!("{:?}", noop_plugin());
        assert!(output.starts_with("RemoveBgPlugin"));
        assert!(output.contains("remove_background"));
    }

    #[tokio::test]
    async fn test_dispatch_runs_the_node() {
        let plugin = noop_plugin();
        let msg = Message::new("d1", json!({}), None);

        let out = plugin.dispatch("remove_background", msg).await;
        assert_eq!(out.payload(), json!({"image_base64": []}));
        assert!(out.get("error").is_none());
    }

    #[tokio::test]
    async fn test_dispatch_folds_failures_into_error_envelope() {
        let plugin = noop_plugin();
        let msg = Message::new("d2", json!({"image_base64": "no comma here"}), None);

        let out = plugin.dispatch("remove_background", msg).await;
        let error = out.get("error").expect("error metadata set");
        assert!(error.contains("Invalid input"));
        assert_eq!(out.payload()["error"].as_str(), Some(error.as_str()));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_node_is_not_found() {
        let plugin = noop_plugin();
        let out = plugin.dispatch("sharpen", Message::new("d3", json!({}), None)).await;
        assert_eq!(out.get("error"), Some(&"Node not found".to_string()));
    }

    #[test]
    fn test_parameter_schema_names_the_node() {
        let schema = parameter_schema();
        let text = serde_json::to_string(&schema).unwrap();
        assert!(text.contains("remove_background"));
    }
}
