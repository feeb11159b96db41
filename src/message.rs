use std::collections::HashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The envelope the host editor hands a node and receives back. The payload
/// carries the wire contract of the node (for this plugin:
/// `{ "image_base64": ... }`); metadata is free-form host bookkeeping.
#[derive(Debug, Clone, JsonSchema, Serialize, Deserialize)]
pub struct Message {
    id: String,
    session_id: Option<String>,
    payload: Value,
    metadata: HashMap<String, String>,
}

impl Message {
    pub fn new(id: &str, payload: Value, session_id: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            session_id,
            payload,
            metadata: HashMap::new(),
        }
    }

    pub fn from_error(error: String) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("error".to_string(), error.clone());

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: None,
            payload: json!({ "error": error }),
            metadata,
        }
    }

    pub fn id(&self) -> String {
        self.id.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.clone()
    }

    pub fn payload(&self) -> Value {
        self.payload.clone()
    }

    pub fn get(&self, name: &str) -> Option<&String> {
        self.metadata.get(name)
    }

    pub fn add(&mut self, name: String, value: String) {
        self.metadata.insert(name, value);
    }

    pub fn remove(&mut self, name: &str) {
        self.metadata.remove(name);
    }
}
