use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use removebg_plugin::codec::{self, ImageBlob};
use removebg_plugin::message::Message;
use removebg_plugin::node::NodeError;
use removebg_plugin::plugin::{PluginError, RemoveBgPlugin};
use removebg_plugin::remover::{BackgroundRemover, RemovalError};

/// Records invocation counts and stamps a marker byte onto every image so
/// tests can tell outputs apart and prove ordering.
#[derive(Debug, Default)]
struct StampingRemover {
    calls: AtomicUsize,
}

#[async_trait]
impl BackgroundRemover for StampingRemover {
    async fn remove(&self, image: ImageBlob) -> Result<ImageBlob, RemovalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut bytes = image.bytes().to_vec();
        bytes.push(0xAB);
        Ok(ImageBlob::new(image.mime().to_string(), bytes))
    }
}

/// Fails on the n-th call (1-based), succeeds otherwise.
#[derive(Debug)]
struct FailOnNth {
    n: usize,
    calls: AtomicUsize,
}

impl FailOnNth {
    fn new(n: usize) -> Self {
        Self { n, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl BackgroundRemover for FailOnNth {
    async fn remove(&self, image: ImageBlob) -> Result<ImageBlob, RemovalError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.n {
            Err(RemovalError::Failed(format!("segmentation failed on call {call}")))
        } else {
            Ok(image)
        }
    }
}

fn data_url(bytes: &[u8]) -> String {
    codec::encode(&ImageBlob::new("image/jpeg", bytes.to_vec()))
}

fn loaded_plugin(remover: Arc<dyn BackgroundRemover>) -> RemoveBgPlugin {
    RemoveBgPlugin::load(Some(remover)).expect("plugin should load with a capability")
}

async fn run(plugin: &RemoveBgPlugin, payload: serde_json::Value) -> Result<Message, NodeError> {
    let node = plugin.node("remove_background").expect("node registered");
    let mut ctx = plugin.context();
    node.process(Message::new("req", payload, None), &mut ctx).await
}

#[tokio::test]
async fn batch_preserves_length_and_order() {
    let remover = Arc::new(StampingRemover::default());
    let plugin = loaded_plugin(remover.clone());

    let inputs: Vec<String> = (0u8..5).map(|i| data_url(&[i])).collect();
    let out = run(&plugin, json!({ "image_base64": inputs })).await.unwrap();

    let payload = out.payload();
    let outputs = payload["image_base64"].as_array().unwrap();
    assert_eq!(outputs.len(), 5);
    assert_eq!(remover.calls.load(Ordering::SeqCst), 5);

    for (i, item) in outputs.iter().enumerate() {
        let blob = codec::decode(item.as_str().unwrap()).unwrap();
        // marker byte appended after the original single identifying byte
        assert_eq!(blob.bytes(), &[i as u8, 0xAB]);
    }
}

#[tokio::test]
async fn empty_input_invokes_nothing() {
    let remover = Arc::new(StampingRemover::default());
    let plugin = loaded_plugin(remover.clone());

    for payload in [json!({}), json!({ "image_base64": [] }), json!({ "image_base64": null })] {
        let out = run(&plugin, payload).await.unwrap();
        assert_eq!(out.payload(), json!({ "image_base64": [] }));
    }
    assert_eq!(remover.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn single_string_equals_one_element_array() {
    let remover = Arc::new(StampingRemover::default());
    let plugin = loaded_plugin(remover);

    let url = data_url(b"solo");
    let as_string = run(&plugin, json!({ "image_base64": url })).await.unwrap();
    let as_array = run(&plugin, json!({ "image_base64": [url] })).await.unwrap();

    assert_eq!(as_string.payload(), as_array.payload());
    assert_eq!(as_string.payload()["image_base64"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn outputs_are_png_data_urls() {
    let plugin = loaded_plugin(Arc::new(StampingRemover::default()));

    let out = run(&plugin, json!({ "image_base64": data_url(b"jpeg-in") })).await.unwrap();
    let payload = out.payload();
    let url = payload["image_base64"][0].as_str().unwrap();
    assert!(url.starts_with("data:image/png;base64,"));

    // and the output is independently re-decodable
    codec::decode(url).unwrap();
}

#[tokio::test]
async fn failure_mid_batch_aborts_everything() {
    let remover = Arc::new(FailOnNth::new(2));
    let plugin = loaded_plugin(remover.clone());

    let inputs: Vec<String> = (0u8..3).map(|i| data_url(&[i])).collect();
    let err = run(&plugin, json!({ "image_base64": inputs })).await.unwrap_err();

    assert!(matches!(err, NodeError::ExecutionFailed(_)));
    // the third image is never attempted once the second fails
    assert_eq!(remover.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn malformed_data_url_aborts_batch() {
    let remover = Arc::new(StampingRemover::default());
    let plugin = loaded_plugin(remover.clone());

    let inputs = json!({ "image_base64": [data_url(b"ok"), "not a data url"] });
    let err = run(&plugin, inputs).await.unwrap_err();

    assert!(matches!(err, NodeError::InvalidInput(_)));
    // the first image was already processed when the decode failure hit
    assert_eq!(remover.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_capability_fails_at_load() {
    let err = RemoveBgPlugin::load(None).unwrap_err();
    assert!(matches!(err, PluginError::MissingCapability));
}
