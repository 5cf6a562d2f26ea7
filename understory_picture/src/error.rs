// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// A recording that cannot be turned into a [`Picture`](crate::Picture).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RecordingError {
    /// `end_recording` was called with save scopes still open.
    #[error("recording ended with {depth} open save scope(s)")]
    UnbalancedSaveRestore {
        /// Number of scopes left open.
        depth: usize,
    },
    /// A restore was issued with no matching save.
    #[error("restore called without a matching save")]
    RestoreUnderflow,
}
