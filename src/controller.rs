use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::clipboard::ClipboardSink;
use crate::generation::{caption_or_fallback, CaptionGenerator};
use crate::model::{CopyInputs, Field, GeneratedCopy};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Preencha todos os campos antes de gerar: {}", join_labels(.missing))]
    Incomplete { missing: Vec<Field> },
    #[error("Aguarde: a legenda ainda está sendo gerada.")]
    InFlight,
}

fn join_labels(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// Nothing to copy: no successful caption is on display.
    Unavailable,
}

/// Owns the form and the request lifecycle: `Idle -> Loading -> Success | Error`,
/// and back to `Loading` on resubmission. At most one request is in flight.
///
/// State is published through watch channels so a view can redraw on change
/// without polling.
pub struct CaptionController {
    inputs: CopyInputs,
    generator: Arc<dyn CaptionGenerator>,
    clipboard: Box<dyn ClipboardSink>,
    state_tx: Arc<watch::Sender<GeneratedCopy>>,
    copied_tx: Arc<watch::Sender<bool>>,
    copy_epoch: Arc<AtomicU64>,
    copy_feedback: Duration,
}

impl CaptionController {
    pub fn new(
        generator: Arc<dyn CaptionGenerator>,
        clipboard: Box<dyn ClipboardSink>,
        copy_feedback: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(GeneratedCopy::idle());
        let (copied_tx, _) = watch::channel(false);

        Self {
            inputs: CopyInputs::default(),
            generator,
            clipboard,
            state_tx: Arc::new(state_tx),
            copied_tx: Arc::new(copied_tx),
            copy_epoch: Arc::new(AtomicU64::new(0)),
            copy_feedback,
        }
    }

    pub fn inputs(&self) -> &CopyInputs {
        &self.inputs
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.inputs.set(field, value);
    }

    pub fn clear_inputs(&mut self) {
        self.inputs = CopyInputs::default();
    }

    pub fn snapshot(&self) -> GeneratedCopy {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GeneratedCopy> {
        self.state_tx.subscribe()
    }

    pub fn copied_receiver(&self) -> watch::Receiver<bool> {
        self.copied_tx.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state_tx.borrow().is_loading()
    }

    pub fn is_copied(&self) -> bool {
        *self.copied_tx.borrow()
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Swaps the backend. Refused while a request is in flight.
    pub fn replace_generator(
        &mut self,
        generator: Arc<dyn CaptionGenerator>,
    ) -> Result<(), SubmitError> {
        if self.is_loading() {
            return Err(SubmitError::InFlight);
        }
        self.generator = generator;
        Ok(())
    }

    pub fn set_clipboard(&mut self, clipboard: Box<dyn ClipboardSink>) {
        self.clipboard = clipboard;
    }

    pub fn set_copy_feedback(&mut self, copy_feedback: Duration) {
        self.copy_feedback = copy_feedback;
    }

    /// Validates the form, moves to `Loading` before returning, and spawns the
    /// generation call. The returned handle resolves once the final state has
    /// been published.
    pub fn submit(&mut self) -> Result<JoinHandle<()>, SubmitError> {
        let missing = self.inputs.missing_fields();
        if !missing.is_empty() {
            debug!(?missing, "Submit blocked: form incomplete");
            return Err(SubmitError::Incomplete { missing });
        }

        let started = self.state_tx.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            *state = GeneratedCopy::loading(state);
            true
        });

        if !started {
            warn!("Still generating previous caption, ignoring submit");
            return Err(SubmitError::InFlight);
        }

        self.reset_copied();

        let generator = Arc::clone(&self.generator);
        let state_tx = Arc::clone(&self.state_tx);
        let inputs = self.inputs.clone();

        info!(
            provider = generator.name(),
            "✨ Generating caption for \"{}\"",
            inputs.subject.trim()
        );

        Ok(tokio::spawn(async move {
            match generator.generate_caption(&inputs).await {
                Ok(text) => {
                    let caption = caption_or_fallback(Some(text));
                    info!("✅ Caption ready ({} characters)", caption.chars().count());
                    state_tx.send_replace(GeneratedCopy::success(caption));
                }
                Err(err) => {
                    warn!(provider = generator.name(), "❌ Caption generation failed: {}", err);
                    let message = err.user_message();
                    state_tx.send_modify(|state| *state = GeneratedCopy::failed(state, message));
                }
            }
        }))
    }

    /// Copies the caption on display. Only valid in `Success`; anywhere else it
    /// leaves the clipboard alone.
    pub fn copy(&mut self) -> Result<CopyOutcome> {
        let text = {
            let state = self.state_tx.borrow();
            if !state.can_copy() {
                debug!(status = %state.status, "Copy ignored: no caption to copy");
                return Ok(CopyOutcome::Unavailable);
            }
            state.full_text.clone()
        };

        self.clipboard.set_text(&text)?;
        self.acknowledge_copy();
        info!("📋 Caption copied");
        Ok(CopyOutcome::Copied)
    }

    fn acknowledge_copy(&self) {
        let epoch = self.copy_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.copied_tx.send_replace(true);

        let copied_tx = Arc::clone(&self.copied_tx);
        let copy_epoch = Arc::clone(&self.copy_epoch);
        let delay = self.copy_feedback;

        tokio::spawn(async move {
            sleep(delay).await;
            // a newer copy or submit owns the flag now
            if copy_epoch.load(Ordering::SeqCst) == epoch {
                copied_tx.send_replace(false);
            }
        });
    }

    fn reset_copied(&self) {
        self.copy_epoch.fetch_add(1, Ordering::SeqCst);
        self.copied_tx.send_replace(false);
    }
}
