// crates/testutil-core/src/capture.rs
// ============================================================================
// Module: Output Capture
// Description: Collect what a print function writes into a string.
// Purpose: Assert on printed output without touching process stdout.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! libtest already intercepts process stdout, so capture works on an injected
//! writer instead: code under test prints to a `&mut dyn Write` (or a cloned
//! [`SharedOutput`] handle) and the helper returns the collected text.
//! Invariants:
//! - A failing print function yields its error and no partial output.
//! - Captured bytes must be valid UTF-8.

use std::io;
use std::io::Write;
use std::string::FromUtf8Error;
use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;

/// Output capture failure.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The print function returned an error.
    #[error("print function failed: {0}")]
    Print(#[source] io::Error),
    /// The captured bytes were not UTF-8.
    #[error("captured output is not valid utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Runs `print` against a fresh buffer and returns what it wrote.
///
/// # Errors
///
/// Returns [`CaptureError::Print`] when `print` fails and
/// [`CaptureError::Utf8`] when the output is not UTF-8.
pub fn capture_output<F>(print: F) -> Result<String, CaptureError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let mut buffer = Vec::new();
    print(&mut buffer).map_err(CaptureError::Print)?;
    Ok(String::from_utf8(buffer)?)
}

/// Cloneable in-memory output stream.
///
/// Every clone appends to the same buffer, so one handle can be given to the
/// code under test (including other threads) while the test keeps another.
#[derive(Debug, Clone, Default)]
pub struct SharedOutput {
    /// Bytes written by all handles.
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedOutput {
    /// Creates an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far as a string.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Utf8`] when the bytes are not UTF-8.
    pub fn contents(&self) -> Result<String, CaptureError> {
        Ok(String::from_utf8(self.bytes())?)
    }

    /// Returns a copy of the raw bytes written so far.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.lock().map(|buffer| buffer.clone()).unwrap_or_default()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| io::Error::other("shared output lock poisoned"))?;
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
