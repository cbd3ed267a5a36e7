//! Core of a note-editor plugin that intercepts image insertions, offers
//! to compress them through a remote HTTP service, and rewrites the block
//! text once the user has chosen between original and compressed.
//!
//! The host runtime (editor, settings persistence, sandboxed asset
//! storage, toasts) is not part of this process; everything it owns sits
//! behind the traits in [`host`]. The rendered dialog surface runs as a
//! logically separate context and talks to the core exclusively through
//! the typed [`channel::SettingsBus`].

pub mod assets;
pub mod bootstrap;
pub mod channel;
pub mod common;
pub mod config;
pub mod host;
pub mod plugin;
pub mod presentation;
pub mod storage;
pub mod workflow;

pub use common::errors::WorkflowError;
pub use config::PluginConfig;
pub use plugin::CompressorPlugin;
