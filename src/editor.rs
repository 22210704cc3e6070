//! The editor facade.
//!
//! [`Editor`] owns the image store, the adjustment state and the injected
//! collaborators: a [`RenderSurface`] to draw on and an [`ExportSink`] to
//! hand finished PNGs to. Every control method mutates state and then
//! re-renders synchronously, so the surface always reflects the latest
//! state when the call returns.
//!
//! ## Uploads
//!
//! [`Editor::upload`] validates, decodes and commits in one call. For
//! off-thread decoding, split it:
//!
//! ```text
//! let pending = editor.begin_upload(upload)?;   // validate, take a ticket
//! spawn_decode(pending, tx);                    // decode on a worker
//! editor.finish_upload(rx.recv()?)?;            // commit if still newest
//! ```
//!
//! Only the newest upload can commit. Starting A then B always ends with B
//! on screen, whichever decode finishes first.

use crate::adjust::{AdjustmentState, Continuous, DiscreteFilter, FlipAxis, RotationStep};
use crate::config::EditorConfig;
use crate::imaging::{self, RenderPlan, RenderSurface, SurfaceError};
use crate::store::{
    DEFAULT_MAX_UPLOAD_BYTES, ImageStore, LoadOutcome, LoadTicket, SourceImage, StoreError,
    Upload, decode_image,
};
use crate::viewport::{Viewport, ViewportError};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
    #[error("render failed: {0}")]
    Surface(#[from] SurfaceError),
    #[error("export failed: {0}")]
    Export(#[from] io::Error),
}

/// Destination for exported PNGs.
pub trait ExportSink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for FileSink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(file_name), bytes)
    }
}

/// Settings the editor takes from [`EditorConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    pub max_upload_bytes: u64,
    pub export_file_name: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            export_file_name: "edited-image.png".to_string(),
        }
    }
}

impl From<&EditorConfig> for EditorOptions {
    fn from(config: &EditorConfig) -> Self {
        Self {
            max_upload_bytes: config.upload.max_bytes,
            export_file_name: config.export.file_name.clone(),
        }
    }
}

/// A validated upload waiting to be decoded.
#[derive(Debug)]
pub struct PendingDecode {
    ticket: LoadTicket,
    bytes: Vec<u8>,
}

impl PendingDecode {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    /// Decode the bytes. Pure; safe to call on any thread.
    pub fn decode(self) -> DecodeEvent {
        DecodeEvent {
            ticket: self.ticket,
            result: decode_image(&self.bytes),
        }
    }
}

/// Completion of a [`PendingDecode`], to be passed to
/// [`Editor::finish_upload`].
#[derive(Debug)]
pub struct DecodeEvent {
    pub ticket: LoadTicket,
    pub result: Result<SourceImage, StoreError>,
}

/// Decode `pending` on a new thread and send the result to `tx`.
pub fn spawn_decode(pending: PendingDecode, tx: Sender<DecodeEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let ticket = pending.ticket().sequence();
        if tx.send(pending.decode()).is_err() {
            debug!(ticket, "decode finished after the editor went away");
        }
    })
}

/// What [`Editor::export`] delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exported {
    pub file_name: String,
    pub bytes: usize,
}

pub struct Editor<S, E> {
    surface: S,
    sink: E,
    store: ImageStore,
    state: AdjustmentState,
    file_name: String,
    last_plan: Option<RenderPlan>,
}

impl<S: RenderSurface, E: ExportSink> Editor<S, E> {
    /// Size `surface` to the container and set up an empty editor.
    ///
    /// A container without a positive width and height is fatal here.
    pub fn new(
        mut surface: S,
        sink: E,
        container: (i64, i64),
        options: EditorOptions,
    ) -> Result<Self, EditorError> {
        let viewport = Viewport::new(container.0, container.1)?;
        surface.set_size(viewport);
        Ok(Self {
            surface,
            sink,
            store: ImageStore::new(options.max_upload_bytes),
            state: AdjustmentState::new(),
            file_name: options.export_file_name,
            last_plan: None,
        })
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// Validate, decode and show `upload`, resetting all adjustments.
    ///
    /// On error nothing changes: the previous image and adjustments stay.
    pub fn upload(&mut self, upload: &Upload) -> Result<SourceImage, EditorError> {
        let image = self.store.load(upload)?;
        self.state.reset();
        self.render()?;
        Ok(image)
    }

    /// Validate `upload` and take a load ticket. Decoding happens later.
    pub fn begin_upload(&mut self, upload: Upload) -> Result<PendingDecode, EditorError> {
        let ticket = self.store.begin_load(&upload)?;
        Ok(PendingDecode {
            ticket,
            bytes: upload.bytes,
        })
    }

    /// Commit a finished decode if it belongs to the newest upload.
    pub fn finish_upload(&mut self, event: DecodeEvent) -> Result<LoadOutcome, EditorError> {
        let outcome = self.store.complete_load(event.ticket, event.result)?;
        if let LoadOutcome::Committed(_) = outcome {
            self.state.reset();
            self.render()?;
        }
        Ok(outcome)
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Set a slider. Returns the clamped value that was stored.
    pub fn set_continuous(&mut self, kind: Continuous, value: f32) -> Result<f32, EditorError> {
        let stored = self.state.set_continuous(kind, value);
        self.render()?;
        Ok(stored)
    }

    /// Toggle a discrete filter. Returns whether it is now active.
    pub fn toggle_filter(&mut self, filter: DiscreteFilter) -> Result<bool, EditorError> {
        let active = self.state.toggle_discrete_filter(filter);
        self.render()?;
        Ok(active)
    }

    pub fn rotate(&mut self, step: RotationStep) -> Result<(), EditorError> {
        self.state.rotate(step);
        self.render()
    }

    pub fn flip(&mut self, axis: FlipAxis) -> Result<(), EditorError> {
        self.state.flip(axis);
        self.render()
    }

    /// Replace every adjustment at once.
    pub fn set_adjustments(&mut self, state: AdjustmentState) -> Result<(), EditorError> {
        self.state = state;
        self.render()
    }

    /// Return every adjustment to identity. The image is kept.
    pub fn reset(&mut self) -> Result<(), EditorError> {
        info!("adjustments reset");
        self.state.reset();
        self.render()
    }

    /// Restore the original image and clear every adjustment.
    pub fn revert(&mut self) -> Result<(), EditorError> {
        self.store.revert_to_original()?;
        info!("reverted to original");
        self.state.reset();
        self.render()
    }

    /// Follow a container resize.
    ///
    /// An invalid size skips the resize and keeps the previous one; the
    /// error is still returned so callers can report it.
    pub fn resize(&mut self, container: (i64, i64)) -> Result<(), EditorError> {
        let viewport = match Viewport::new(container.0, container.1) {
            Ok(viewport) => viewport,
            Err(e) => {
                warn!(error = %e, "resize skipped");
                return Err(e.into());
            }
        };
        self.surface.set_size(viewport);
        self.render()
    }

    /// Encode the surface as PNG and hand it to the sink.
    ///
    /// Before the first successful upload this does nothing and returns
    /// `Ok(None)`.
    pub fn export(&mut self) -> Result<Option<Exported>, EditorError> {
        if !self.store.has_image() {
            debug!("export skipped: no image loaded");
            return Ok(None);
        }
        let bytes = imaging::export_png(&self.surface)?;
        self.sink.deliver(&self.file_name, &bytes)?;
        info!(file = %self.file_name, bytes = bytes.len(), "export delivered");
        Ok(Some(Exported {
            file_name: self.file_name.clone(),
            bytes: bytes.len(),
        }))
    }

    /// Redraw the surface from the current image and adjustments.
    pub fn render(&mut self) -> Result<(), EditorError> {
        self.last_plan = imaging::render(&mut self.surface, self.store.current(), &self.state)?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn adjustments(&self) -> &AdjustmentState {
        &self.state
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn viewport(&self) -> Viewport {
        self.surface.size()
    }

    /// Plan of the most recent render that drew something.
    pub fn last_plan(&self) -> Option<&RenderPlan> {
        self.last_plan.as_ref()
    }

    pub fn export_file_name(&self) -> &str {
        &self.file_name
    }
}
