//! Remove Background node plugin for Flowcraft-style node editors.
//!
//! One node type, `remove_background`, takes a batch of data-URL images,
//! runs each through a host-injected background-removal capability, and
//! answers the same batch with backgrounds stripped and output pinned to
//! PNG. See [`plugin::RemoveBgPlugin`] for the load-time contract and
//! [`remove_bg::RemoveBackgroundNode`] for the wire contract.

pub mod codec;
pub mod logger;
pub mod manifest;
pub mod message;
pub mod node;
pub mod plugin;
pub mod remove_bg;
pub mod remover;

pub use codec::{CodecError, ImageBlob};
pub use manifest::{NodeDescriptor, PluginManifest};
pub use message::Message;
pub use node::{Node, NodeContext, NodeError, NodeType};
pub use plugin::{PluginError, RemoveBgPlugin};
pub use remove_bg::RemoveBackgroundNode;
pub use remover::{BackgroundRemover, RemovalError};
