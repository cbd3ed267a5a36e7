//! Typed replacement for the host's shared settings object.
//!
//! The two execution surfaces have no shared memory; the host gives them
//! a settings map plus a change event. Here that protocol is a fixed set
//! of payload slots: each payload is staged by one side and consumed
//! exactly once by the other, a broadcast tick stands in for the change
//! notification, and a watch channel carries surface show/hide.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────
// Payloads
// ────────────────────────────────────────────────────────────────

/// Where the compressed side of a comparison came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressedSourceType {
    Remote,
    DataUrl,
}

/// Gate shown before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPayload {
    pub block_uuid: Uuid,
    pub image_url: String,
}

/// Presentation-only marker while the endpoint is working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingPayload {
    pub block_uuid: Uuid,
}

/// Everything the compare dialog needs to show both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPayload {
    pub block_uuid: Uuid,
    pub original_url: String,
    pub original_preview_url: String,
    pub compressed_url: String,
    pub compressed_preview_url: String,
    pub original_size: String,
    pub compressed_size: String,
    pub compressed_source_type: CompressedSourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_mime: Option<String>,
}

/// Surface-to-core trigger: the user confirmed compression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProceedPayload {
    pub block_uuid: Uuid,
    pub image_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageChoice {
    Original,
    Compressed,
}

/// Surface-to-core decision from the compare dialog. Carries the consumed
/// comparison back so the core can persist without re-reading state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPayload {
    pub choice: ImageChoice,
    pub comparison: ComparisonPayload,
}

/// Terminal signal for one block's workflow. `Some` records the final
/// URL so the identical reference is not reprocessed; `None` clears the
/// block's guard entry entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    pub block_uuid: Uuid,
    pub last_image_url: Option<String>,
}

// ────────────────────────────────────────────────────────────────
// SettingsBus
// ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Slots {
    confirmation: Option<ConfirmationPayload>,
    loading: Option<LoadingPayload>,
    comparison: Option<ComparisonPayload>,
    proceed: Option<ProceedPayload>,
    selection: Option<SelectionPayload>,
    completion: Option<CompletionPayload>,
}

/// One slot per transient payload, guarded by a plain mutex: staging and
/// consuming are synchronous sections with no await inside.
pub struct SettingsBus {
    slots: Mutex<Slots>,
    changed: broadcast::Sender<()>,
    visible: watch::Sender<bool>,
}

impl Default for SettingsBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBus {
    pub fn new() -> Self {
        let (changed, _) = broadcast::channel(64);
        let (visible, _) = watch::channel(false);
        Self {
            slots: Mutex::new(Slots::default()),
            changed,
            visible,
        }
    }

    /// Change-notification stream; fired on every staged payload.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }

    fn touch(&self) {
        let _ = self.changed.send(());
    }

    // ── surface visibility ──────────────────────────────────────

    pub fn visibility(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }

    pub fn show_surface(&self) {
        self.visible.send_replace(true);
    }

    pub fn hide_surface(&self) {
        self.visible.send_replace(false);
    }

    pub fn is_surface_visible(&self) -> bool {
        *self.visible.borrow()
    }

    // ── staging ─────────────────────────────────────────────────

    /// Stage the confirmation gate; any stale compare/loading state from
    /// a previous workflow is dropped with it.
    pub fn stage_confirmation(&self, payload: ConfirmationPayload) {
        {
            let mut slots = self.slots.lock().unwrap();
            slots.confirmation = Some(payload);
            slots.comparison = None;
            slots.loading = None;
        }
        self.touch();
    }

    pub fn stage_loading(&self, payload: LoadingPayload) {
        self.slots.lock().unwrap().loading = Some(payload);
        self.touch();
    }

    /// Stage the compare dialog; the loading marker ends with it.
    pub fn stage_comparison(&self, payload: ComparisonPayload) {
        {
            let mut slots = self.slots.lock().unwrap();
            slots.comparison = Some(payload);
            slots.loading = None;
        }
        self.touch();
    }

    pub fn stage_proceed(&self, payload: ProceedPayload) {
        self.slots.lock().unwrap().proceed = Some(payload);
        self.touch();
    }

    pub fn stage_selection(&self, payload: SelectionPayload) {
        self.slots.lock().unwrap().selection = Some(payload);
        self.touch();
    }

    pub fn stage_completion(&self, payload: CompletionPayload) {
        self.slots.lock().unwrap().completion = Some(payload);
        self.touch();
    }

    // ── consumption (each payload is taken exactly once) ────────

    pub fn take_confirmation(&self) -> Option<ConfirmationPayload> {
        self.slots.lock().unwrap().confirmation.take()
    }

    pub fn take_loading(&self) -> Option<LoadingPayload> {
        self.slots.lock().unwrap().loading.take()
    }

    pub fn take_comparison(&self) -> Option<ComparisonPayload> {
        self.slots.lock().unwrap().comparison.take()
    }

    pub fn take_proceed(&self) -> Option<ProceedPayload> {
        self.slots.lock().unwrap().proceed.take()
    }

    pub fn take_selection(&self) -> Option<SelectionPayload> {
        self.slots.lock().unwrap().selection.take()
    }

    pub fn take_completion(&self) -> Option<CompletionPayload> {
        self.slots.lock().unwrap().completion.take()
    }

    pub fn clear_loading(&self) {
        self.slots.lock().unwrap().loading = None;
    }

    /// Startup reset: all slots empty, surface hidden.
    pub fn reset(&self) {
        *self.slots.lock().unwrap() = Slots::default();
        self.hide_surface();
    }
}
