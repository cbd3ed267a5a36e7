//! The rendered surface, reduced to its protocol.
//!
//! Chrome and theming belong to the host; what remains is the relay:
//! read a staged payload, put the question to a [`DialogSurface`], and
//! write the user's decision back onto the bus. Nothing here touches the
//! core directly - the bus is the only coupling.

use crate::channel::{
    ComparisonPayload, CompletionPayload, ConfirmationPayload, ImageChoice, LoadingPayload,
    ProceedPayload, SelectionPayload, SettingsBus,
};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// What the user answered in the confirm dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Compress,
    Skip,
}

/// The UI seam. Implementations render the dialogs however the host
/// allows and block until the user answers.
#[async_trait]
pub trait DialogSurface: Send + Sync {
    /// Render the confirm dialog and wait for the user.
    async fn confirm_compression(&self, payload: &ConfirmationPayload) -> ConfirmChoice;

    /// Render the side-by-side compare dialog and wait for the user.
    async fn select_image(&self, payload: &ComparisonPayload) -> ImageChoice;

    /// Render the loading dialog. No reply expected.
    fn show_loading(&self, _payload: &LoadingPayload) {}
}

/// Surface event loop: reacts to staged payloads until the bus closes.
/// Run it as its own task, alongside the core's loop.
pub async fn run_surface(bus: Arc<SettingsBus>, surface: Arc<dyn DialogSurface>) {
    let mut changes = bus.subscribe();
    loop {
        if let Some(confirmation) = bus.take_confirmation() {
            match surface.confirm_compression(&confirmation).await {
                ConfirmChoice::Compress => {
                    bus.stage_loading(LoadingPayload {
                        block_uuid: confirmation.block_uuid,
                    });
                    bus.stage_proceed(ProceedPayload {
                        block_uuid: confirmation.block_uuid,
                        image_url: confirmation.image_url,
                    });
                }
                ConfirmChoice::Skip => {
                    // Declined: the original reference is final and the
                    // block text stays untouched.
                    bus.stage_completion(CompletionPayload {
                        block_uuid: confirmation.block_uuid,
                        last_image_url: Some(confirmation.image_url),
                    });
                    bus.hide_surface();
                }
            }
        }

        if let Some(comparison) = bus.take_comparison() {
            let choice = surface.select_image(&comparison).await;
            bus.stage_selection(SelectionPayload { choice, comparison });
        }

        if let Some(loading) = bus.take_loading() {
            surface.show_loading(&loading);
        }

        match changes.recv().await {
            Ok(()) => {}
            Err(RecvError::Lagged(missed)) => {
                debug!("Surface loop lagged {missed} change notifications");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
