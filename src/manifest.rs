use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::remove_bg::IMAGE_PORT;

/// File names the packaged plugin bundle must contain. The three script
/// bundles are opaque build outputs; the manifest, schema and icon are
/// generated or copied by the packaging pipeline (`crates/xtask`).
pub const MANIFEST_FILE: &str = "plugin.json";
pub const SCHEMA_FILE: &str = "schema.json";
pub const ICON_FILE: &str = "icon.svg";
pub const UI_BUNDLE: &str = "frontend.js";
pub const EXECUTOR_BUNDLE: &str = "backend.js";
pub const RUNTIME_BUNDLE: &str = "background-removal.runtime.js";

/// One side of a node's wire surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PortDescriptor {
    pub id: String,
    pub label: String,
}

/// Static description of the node as the editor renders it: one input port
/// and one output port, both named `image_base64`, no parameters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NodeDescriptor {
    pub type_name: String,
    pub label: String,
    pub icon: String,
    pub accent_color: String,
    pub inputs: Vec<PortDescriptor>,
    pub outputs: Vec<PortDescriptor>,
}

impl NodeDescriptor {
    pub fn remove_background() -> Self {
        let port = PortDescriptor {
            id: IMAGE_PORT.to_string(),
            label: "Image".to_string(),
        };
        Self {
            type_name: "remove_background".to_string(),
            label: "Remove Background".to_string(),
            icon: "🧼".to_string(),
            accent_color: "hsl(270, 50%, 40%)".to_string(),
            inputs: vec![port.clone()],
            outputs: vec![port],
        }
    }
}

/// Entry artifacts the host loads out of the bundle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ManifestEntries {
    pub ui: String,
    pub executor: String,
    pub runtime: String,
    pub schema: String,
    pub icon: String,
}

/// The `plugin.json` the host editor reads to install the plugin.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub node: NodeDescriptor,
    pub entries: ManifestEntries,
}

impl PluginManifest {
    pub fn current() -> Self {
        Self {
            id: "mixui-removebg-plugin".to_string(),
            name: "Remove Background".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: env!("CARGO_PKG_DESCRIPTION").to_string(),
            node: NodeDescriptor::remove_background(),
            entries: ManifestEntries {
                ui: UI_BUNDLE.to_string(),
                executor: EXECUTOR_BUNDLE.to_string(),
                runtime: RUNTIME_BUNDLE.to_string(),
                schema: SCHEMA_FILE.to_string(),
                icon: ICON_FILE.to_string(),
            },
        }
    }
}
