// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;
use understory_picture::RecordingError;

/// Why a frame could not be presented.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RasterError {
    /// No surface is installed on the rasterizer.
    #[error("no surface is attached to the rasterizer")]
    NoSurface,
    /// Painting the layer tree produced a malformed recording.
    #[error("layer tree painted a malformed recording: {0}")]
    Recording(#[from] RecordingError),
    /// The surface rejected the frame on submit.
    #[error("surface frame submit failed")]
    SubmitFailed,
}
