//! Loop-until-complete writes over a byte-stream connection.
//!
//! Stream sockets give no atomicity guarantee for large payloads: a single
//! `write` may accept only part of the buffer. [`write_all`] keeps writing
//! until every byte is gone or the connection is unusable, and maps the
//! outcome onto a small typed error so the transport can tell "peer went
//! away" apart from "something broke".

use std::io::{self, Write};

use thiserror::Error;

/// Why a write loop gave up.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The peer closed the connection (a write accepted zero bytes).
    #[error("peer closed the connection")]
    Closed,

    /// The underlying stream reported an error.
    #[error("write failed: {0}")]
    Failed(#[source] io::Error),
}

/// Write the entire buffer, tolerating short writes.
///
/// A zero-byte write with no error is treated as peer-closed. A write
/// interrupted by a signal is retried without consuming progress. Any
/// other error ends the loop as [`WriteError::Failed`].
pub fn write_all<W: Write>(w: &mut W, mut buf: &[u8]) -> Result<(), WriteError> {
    while !buf.is_empty() {
        match w.write(buf) {
            Ok(0) => return Err(WriteError::Closed),
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(WriteError::Failed(e)),
        }
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────
