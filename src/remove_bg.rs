use async_trait::async_trait;
use schemars::{JsonSchema, schema::RootSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::codec::{self, DEFAULT_MIME};
use crate::message::Message;
use crate::node::{NodeContext, NodeError, NodeType};

/// The port name on both sides of the node. The node surface is static:
/// one input port, one output port, no parameters.
pub const IMAGE_PORT: &str = "image_base64";

/// The "Remove Background" node.
///
/// Wire contract: the payload carries `{ "image_base64": string | string[] }`
/// and the node answers `{ "image_base64": string[] }`. A single string is
/// treated as a one-element batch; a missing or empty input answers an empty
/// array without touching the capability.
///
/// Images are processed strictly sequentially, in input order, with one
/// awaited capability call per image. The first decode or removal failure
/// aborts the whole batch; no partial results are returned. Output images
/// are always tagged `image/png`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename = "remove_background")]
pub struct RemoveBackgroundNode;

impl RemoveBackgroundNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RemoveBackgroundNode {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RemoveBackgroundNode {
    fn clone(&self) -> Self {
        RemoveBackgroundNode
    }
}

/// Accepted shapes of the `image_base64` input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageInput {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct Inputs {
    #[serde(default)]
    image_base64: Option<ImageInput>,
}

/// Normalize the payload into an ordered batch of data URLs.
fn normalize_batch(payload: &Value) -> Result<Vec<String>, NodeError> {
    if payload.is_null() {
        return Ok(Vec::new());
    }
    let inputs: Inputs = serde_json::from_value(payload.clone())
        .map_err(|e| NodeError::InvalidInput(format!("Malformed inputs: {}", e)))?;
    Ok(match inputs.image_base64 {
        None => Vec::new(),
        Some(ImageInput::One(url)) => vec![url],
        Some(ImageInput::Many(urls)) => urls,
    })
}

#[async_trait]
#[typetag::serde]
impl NodeType for RemoveBackgroundNode {
    fn type_name(&self) -> String {
        "remove_background".to_string()
    }

    fn schema(&self) -> RootSchema {
        schema_for!(RemoveBackgroundNode)
    }

    #[tracing::instrument(name = "remove_background_process", skip(self, context))]
    async fn process(&self, input: Message, context: &mut NodeContext) -> Result<Message, NodeError> {
        let batch = normalize_batch(&input.payload())?;

        if batch.is_empty() {
            return Ok(Message::new(
                &input.id(),
                json!({ IMAGE_PORT: [] }),
                input.session_id(),
            ));
        }

        tracing::debug!(batch_size = batch.len(), "removing backgrounds");

        let mut results = Vec::with_capacity(batch.len());
        for data_url in &batch {
            let blob = codec::decode(data_url)
                .map_err(|e| NodeError::InvalidInput(format!("Bad image data URL: {}", e)))?;

            let stripped = context
                .remover()
                .remove(blob)
                .await
                .map_err(|e| NodeError::ExecutionFailed(e.to_string()))?;

            // output format is pinned to PNG regardless of input format
            results.push(codec::encode(&stripped.with_mime(DEFAULT_MIME)));
        }

        Ok(Message::new(
            &input.id(),
            json!({ IMAGE_PORT: results }),
            input.session_id(),
        ))
    }

    fn clone_box(&self) -> Box<dyn NodeType> {
        Box::new(self.clone())
    }
}
