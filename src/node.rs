use std::{collections::HashMap, fmt, sync::Arc};
use std::fmt::Debug;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use schemars::{JsonSchema, SchemaGenerator, schema::{RootSchema, Schema}, schema_for};

use crate::message::Message;
use crate::remover::BackgroundRemover;

/// A node type the plugin exposes to the host editor. Processing is async:
/// the one suspension point per image is the awaited call into the removal
/// capability.
#[async_trait]
#[typetag::serde]
pub trait NodeType: Send + Sync + Debug {
    fn type_name(&self) -> String;
    async fn process(&self, msg: Message, ctx: &mut NodeContext) -> Result<Message, NodeError>;
    fn clone_box(&self) -> Box<dyn NodeType>;
    /// Return this concrete type's schema.
    fn schema(&self) -> RootSchema;
}

#[derive(Serialize, Deserialize)]
pub struct Node(pub Box<dyn NodeType>);

impl std::ops::Deref for Node {
    type Target = dyn NodeType;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Node(self.0.clone_box())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Node").field(&self.0).finish()
    }
}

impl JsonSchema for Node {
    fn schema_name() -> String {
        "node".to_string()
    }

    fn json_schema(generate: &mut SchemaGenerator) -> Schema {
        use schemars::schema::{SchemaObject, SubschemaValidation};

        // every concrete node type this plugin ships
        let concrete: &[RootSchema] = &[schema_for!(crate::remove_bg::RemoveBackgroundNode)];

        for rs in concrete {
            for (def_name, def_schema) in &rs.definitions {
                generate.definitions_mut().insert(def_name.clone(), def_schema.clone());
            }
        }

        let any_of = concrete
            .iter()
            .flat_map(|rs| {
                if rs.definitions.is_empty() {
                    // parameterless nodes contribute no definitions;
                    // reference their root schema directly
                    vec![Schema::Object(rs.schema.clone())]
                } else {
                    rs.definitions
                        .keys()
                        .map(|def_name| {
                            Schema::Object(SchemaObject {
                                reference: Some(format!("#/definitions/{}", def_name)),
                                ..Default::default()
                            })
                        })
                        .collect()
                }
            })
            .collect();

        Schema::Object(SchemaObject {
            subschemas: Some(Box::new(SubschemaValidation {
                any_of: Some(any_of),
                ..Default::default()
            })),
            ..Default::default()
        })
    }
}

/// Per-run context handed to a node: scratch state, host configuration, and
/// the injected removal capability. The capability reference is set once at
/// construction and read-only afterwards.
#[derive(Clone)]
pub struct NodeContext {
    state: HashMap<String, Value>,
    config: HashMap<String, String>,
    remover: Arc<dyn BackgroundRemover>,
}

impl NodeContext {
    pub fn new(
        state: HashMap<String, Value>,
        config: HashMap<String, String>,
        remover: Arc<dyn BackgroundRemover>,
    ) -> Self {
        Self { state, config, remover }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn get_all(&self) -> HashMap<String, Value> {
        self.state.clone()
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.state.insert(key.to_string(), value);
    }

    pub fn delete(&mut self, key: &str) {
        self.state.remove(key);
    }

    pub fn config(&self, key: &str) -> Option<&String> {
        self.config.get(key)
    }

    pub fn remover(&self) -> &dyn BackgroundRemover {
        self.remover.as_ref()
    }
}

impl fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
impl NodeContext {
    /// Context with a pass-through capability, for node unit tests.
    pub(crate) fn dummy() -> Self {
        use crate::codec::ImageBlob;
        use crate::remover::RemovalError;

        #[derive(Debug)]
        struct PassthroughRemover;

        #[async_trait]
        impl BackgroundRemover for PassthroughRemover {
            async fn remove(&self, image: ImageBlob) -> Result<ImageBlob, RemovalError> {
                Ok(image)
            }
        }

        Self::new(HashMap::new(), HashMap::new(), Arc::new(PassthroughRemover))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub enum NodeError {
    NotFound,
    InvalidInput(String),
    ExecutionFailed(String),
    Internal(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::NotFound => write!(f, "Node not found"),
            NodeError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            NodeError::ExecutionFailed(msg) => write!(f, "Processing error: {}", msg),
            NodeError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for NodeError {}
