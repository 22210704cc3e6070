//! Image store: what pixels are being edited.
//!
//! The store owns the current [`SourceImage`] and the original committed by
//! the most recent upload. Uploads go through two steps so decoding can run
//! elsewhere:
//!
//! ```text
//! begin_load(upload)        validate MIME + size, hand out a LoadTicket
//! decode_image(bytes)       pure, may run on any thread
//! complete_load(ticket, ..) commit only if the ticket is still the newest
//! ```
//!
//! A decode that finishes after a newer upload was started is reported as
//! [`LoadOutcome::Superseded`] and discarded, so a slow first file can never
//! overwrite a fast second one.

use image::{ImageFormat, RgbaImage};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default upload cap: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{mime}' is not an image type")]
    NotAnImage { mime: String },
    #[error("upload is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid upload: {0}")]
    Validation(#[from] ValidationError),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("no original image to revert to")]
    NoOriginal,
}

/// Raw file handed over by the upload surface.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Size reported by the uploader. Defaults to the byte length.
    pub declared_size: u64,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        let declared_size = bytes.len() as u64;
        Self {
            bytes,
            mime_type: mime_type.into(),
            declared_size,
        }
    }

    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = size;
        self
    }

    /// Read a file, taking the MIME type from its extension and the declared
    /// size from its metadata.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let declared_size = std::fs::metadata(path)?.len();
        let bytes = std::fs::read(path)?;
        let mime_type = ImageFormat::from_path(path)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        Ok(Self::new(bytes, mime_type).with_declared_size(declared_size))
    }

    /// Check MIME type and size against `max_bytes`. Sizes equal to the cap
    /// pass.
    pub fn validate(&self, max_bytes: u64) -> Result<(), ValidationError> {
        let mime = self.mime_type.trim().to_ascii_lowercase();
        if !mime.starts_with("image/") {
            return Err(ValidationError::NotAnImage {
                mime: self.mime_type.clone(),
            });
        }
        let size = self.declared_size.max(self.bytes.len() as u64);
        if size > max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                limit: max_bytes,
            });
        }
        Ok(())
    }
}

/// Decoded RGBA8 bitmap. Immutable; clones share the pixel buffer.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Whether both handles share the same decoded buffer.
    pub fn ptr_eq(&self, other: &SourceImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

/// Decode file bytes in any enabled format into a [`SourceImage`].
pub fn decode_image(bytes: &[u8]) -> Result<SourceImage, StoreError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(SourceImage::from_rgba(decoded.to_rgba8()))
}

/// Sequence number of an accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Committed(SourceImage),
    /// A newer upload was started before this one finished.
    Superseded,
}

#[derive(Debug)]
pub struct ImageStore {
    max_bytes: u64,
    current: Option<SourceImage>,
    original: Option<SourceImage>,
    latest: u64,
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl ImageStore {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            current: None,
            original: None,
            latest: 0,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate `upload` and register it as the newest pending load.
    ///
    /// A rejected upload does not take a ticket, so a decode already in
    /// flight is still allowed to commit.
    pub fn begin_load(&mut self, upload: &Upload) -> Result<LoadTicket, StoreError> {
        if let Err(e) = upload.validate(self.max_bytes) {
            warn!(mime = %upload.mime_type, size = upload.declared_size, error = %e, "upload rejected");
            return Err(e.into());
        }
        self.latest += 1;
        info!(
            ticket = self.latest,
            mime = %upload.mime_type,
            size = upload.declared_size,
            "upload accepted"
        );
        Ok(LoadTicket(self.latest))
    }

    /// Commit a finished decode if `ticket` is still the newest load.
    ///
    /// Stale results are dropped whether they succeeded or not. A decode
    /// failure for the newest ticket leaves the store as it was.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        decoded: Result<SourceImage, StoreError>,
    ) -> Result<LoadOutcome, StoreError> {
        if ticket.0 != self.latest {
            debug!(ticket = ticket.0, latest = self.latest, "decode superseded");
            return Ok(LoadOutcome::Superseded);
        }
        let image = decoded?;
        self.commit(image.clone());
        Ok(LoadOutcome::Committed(image))
    }

    /// Validate, decode and commit in one step.
    pub fn load(&mut self, upload: &Upload) -> Result<SourceImage, StoreError> {
        self.begin_load(upload)?;
        let image = decode_image(&upload.bytes)?;
        self.commit(image.clone());
        Ok(image)
    }

    fn commit(&mut self, image: SourceImage) {
        info!(
            width = image.width(),
            height = image.height(),
            "image committed"
        );
        self.original = Some(image.clone());
        self.current = Some(image);
    }

    /// Make the original the current image again.
    pub fn revert_to_original(&mut self) -> Result<&SourceImage, StoreError> {
        let original = self.original.clone().ok_or(StoreError::NoOriginal)?;
        Ok(&*self.current.insert(original))
    }

    pub fn current(&self) -> Option<&SourceImage> {
        self.current.as_ref()
    }

    pub fn original(&self) -> Option<&SourceImage> {
        self.original.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{png_bytes, png_upload};

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn oversized_upload_rejected_before_decode() {
        let mut store = ImageStore::default();
        // Not a decodable image either: if decode ran first this would be a
        // Decode error.
        let upload =
            Upload::new(b"garbage".to_vec(), "image/jpeg").with_declared_size(15_000_000);

        let err = store.load(&upload).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::TooLarge {
                size: 15_000_000,
                limit: DEFAULT_MAX_UPLOAD_BYTES
            })
        ));
        assert!(!store.has_image());
    }

    #[test]
    fn non_image_mime_rejected_before_decode() {
        let mut store = ImageStore::default();
        let upload = Upload::new(png_bytes(4, 4, [0, 0, 0, 255]), "text/plain");

        let err = store.load(&upload).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::NotAnImage { .. })
        ));
    }

    #[test]
    fn size_equal_to_cap_is_accepted() {
        let upload = Upload::new(vec![0; 16], "image/png");
        assert!(upload.validate(16).is_ok());
        assert!(upload.validate(15).is_err());
    }

    #[test]
    fn mime_check_is_case_insensitive() {
        let upload = Upload::new(vec![], "IMAGE/PNG");
        assert!(upload.validate(DEFAULT_MAX_UPLOAD_BYTES).is_ok());
    }

    #[test]
    fn corrupt_bytes_fail_with_decode_error() {
        let mut store = ImageStore::default();
        let err = store
            .load(&Upload::new(b"not a png".to_vec(), "image/png"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
        assert!(!store.has_image());
    }

    // =========================================================================
    // Load and revert
    // =========================================================================

    #[test]
    fn load_sets_current_and_original() {
        let mut store = ImageStore::default();
        let image = store.load(&png_upload(6, 3, [9, 9, 9, 255])).unwrap();

        assert_eq!(image.dimensions(), (6, 3));
        assert!(store.current().unwrap().ptr_eq(&image));
        assert!(store.original().unwrap().ptr_eq(&image));
    }

    #[test]
    fn failed_load_keeps_previous_image() {
        let mut store = ImageStore::default();
        let first = store.load(&png_upload(2, 2, [1, 1, 1, 255])).unwrap();
        let _ = store.load(&Upload::new(b"junk".to_vec(), "image/png"));

        assert!(store.current().unwrap().ptr_eq(&first));
    }

    #[test]
    fn revert_without_load_is_no_original() {
        let mut store = ImageStore::default();
        assert!(matches!(
            store.revert_to_original(),
            Err(StoreError::NoOriginal)
        ));
    }

    #[test]
    fn revert_restores_original() {
        let mut store = ImageStore::default();
        let image = store.load(&png_upload(3, 3, [5, 5, 5, 255])).unwrap();
        let reverted = store.revert_to_original().unwrap();
        assert!(reverted.ptr_eq(&image));
    }

    // =========================================================================
    // Load sequencing
    // =========================================================================

    #[test]
    fn tickets_increase_monotonically() {
        let mut store = ImageStore::default();
        let a = store.begin_load(&png_upload(1, 1, [0, 0, 0, 255])).unwrap();
        let b = store.begin_load(&png_upload(1, 1, [0, 0, 0, 255])).unwrap();
        assert!(b > a);
        assert_eq!(b.sequence(), a.sequence() + 1);
    }

    #[test]
    fn stale_decode_is_superseded() {
        let mut store = ImageStore::default();
        let a_upload = png_upload(4, 4, [255, 0, 0, 255]);
        let b_upload = png_upload(8, 8, [0, 0, 255, 255]);
        let a = store.begin_load(&a_upload).unwrap();
        let b = store.begin_load(&b_upload).unwrap();

        // B finishes first, then the slow A arrives.
        let outcome = store.complete_load(b, decode_image(&b_upload.bytes)).unwrap();
        assert!(matches!(outcome, LoadOutcome::Committed(_)));
        let outcome = store.complete_load(a, decode_image(&a_upload.bytes)).unwrap();
        assert!(matches!(outcome, LoadOutcome::Superseded));

        assert_eq!(store.current().unwrap().dimensions(), (8, 8));
    }

    #[test]
    fn stale_decode_error_is_ignored() {
        let mut store = ImageStore::default();
        let a = store.begin_load(&png_upload(1, 1, [0, 0, 0, 255])).unwrap();
        let _b = store.begin_load(&png_upload(1, 1, [0, 0, 0, 255])).unwrap();

        let outcome = store
            .complete_load(a, Err(StoreError::Decode("truncated".into())))
            .unwrap();
        assert!(matches!(outcome, LoadOutcome::Superseded));
    }

    #[test]
    fn rejected_upload_does_not_supersede_pending_load() {
        let mut store = ImageStore::default();
        let upload = png_upload(5, 5, [0, 0, 0, 255]);
        let ticket = store.begin_load(&upload).unwrap();
        assert!(store
            .begin_load(&Upload::new(vec![1, 2, 3], "application/pdf"))
            .is_err());

        let outcome = store
            .complete_load(ticket, decode_image(&upload.bytes))
            .unwrap();
        assert!(matches!(outcome, LoadOutcome::Committed(_)));
    }

    #[test]
    fn upload_from_path_infers_mime_and_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photo.png");
        let bytes = png_bytes(3, 2, [0, 0, 0, 255]);
        std::fs::write(&path, &bytes).unwrap();

        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.mime_type, "image/png");
        assert_eq!(upload.declared_size, bytes.len() as u64);
    }
}
