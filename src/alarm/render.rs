//! Render sink for the per-face indicator (green/red outline).

use crate::feed::types::FaceId;

/// Receives per-frame validity for drawing the face indicator.
pub trait RenderSink {
    /// `valid_frame == false` means the face should be drawn as alerting or unanalyzed.
    fn update_face_frame(&self, face: FaceId, valid_frame: bool);

    /// The face is gone and its indicator should be removed.
    fn remove_face(&self, face: FaceId);
}

impl<R: RenderSink + ?Sized> RenderSink for &R {
    fn update_face_frame(&self, face: FaceId, valid_frame: bool) {
        (**self).update_face_frame(face, valid_frame)
    }

    fn remove_face(&self, face: FaceId) {
        (**self).remove_face(face)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderSink;

impl RenderSink for NoopRenderSink {
    fn update_face_frame(&self, _face: FaceId, _valid_frame: bool) {}

    fn remove_face(&self, _face: FaceId) {}
}

/// Traces indicator changes instead of drawing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRenderSink;

impl RenderSink for LogRenderSink {
    fn update_face_frame(&self, face: FaceId, valid_frame: bool) {
        tracing::trace!(%face, valid_frame, "face frame");
    }

    fn remove_face(&self, face: FaceId) {
        tracing::trace!(%face, "face indicator removed");
    }
}
