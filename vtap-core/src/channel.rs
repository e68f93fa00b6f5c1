//! Local-channel transport: frames over a Unix-domain stream socket.
//!
//! The transport connects **once** when it is created. If no receiver is
//! listening, it stays `Unconnected` and every send becomes a silent drop;
//! no reconnection is ever attempted. On the first unrecoverable write
//! error the link latches `Failed` for the rest of the instance lifetime.
//!
//! Each frame is a [`FrameHeader`] followed by the raw strided plane
//! bytes, straight from the host buffers — this path does not repack.
//!
//! Writes block until the OS socket buffer admits the bytes; there is no
//! write deadline, so a stalled consumer stalls the producing callback.
//! That risk is accepted in exchange for never queueing frames.

use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::frame::FrameDescriptor;
use crate::tap::SendOutcome;
use crate::wire::FrameHeader;
use crate::writer::{self, WriteError};

/// How often a successful send logs progress (in frames).
const PROGRESS_INTERVAL: u64 = 60;

/// Lifecycle of the underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// The connect attempt at open time failed; sends are drops.
    Unconnected,
    /// The socket is up and accepting frames.
    Connected,
    /// A send hit an unrecoverable error; sends are drops forever.
    Failed,
}

/// Connect-once transport writing frames to a local receiver process.
pub struct ChannelTransport {
    state: LinkState,
    stream: Option<UnixStream>,
    path: PathBuf,
    frames_seen: u64,
    frames_sent: u64,
}

impl ChannelTransport {
    /// Attempt a single connection to `path`.
    ///
    /// Failure is not an error: the transport comes back
    /// present-but-inactive and frames will be dropped until close.
    pub fn connect(path: &Path) -> Self {
        match UnixStream::connect(path) {
            Ok(stream) => {
                info!(path = %path.display(), "channel connected");
                Self {
                    state: LinkState::Connected,
                    stream: Some(stream),
                    path: path.to_path_buf(),
                    frames_seen: 0,
                    frames_sent: 0,
                }
            }
            Err(e) => {
                info!(
                    path = %path.display(),
                    error = %e,
                    "no receiver listening; frames will be dropped"
                );
                Self {
                    state: LinkState::Unconnected,
                    stream: None,
                    path: path.to_path_buf(),
                    frames_seen: 0,
                    frames_sent: 0,
                }
            }
        }
    }

    /// Send one frame: header, then each plane's raw bytes.
    ///
    /// Any write error closes the connection and latches [`LinkState::Failed`];
    /// there is no retry within a call.
    pub fn send(&mut self, frame: &FrameDescriptor<'_>) -> SendOutcome {
        self.frames_seen += 1;

        let Some(stream) = self.stream.as_mut() else {
            return SendOutcome::Dropped;
        };

        match write_frame(stream, frame) {
            Ok(()) => {
                self.frames_sent += 1;
                if self.frames_sent % PROGRESS_INTERVAL == 0 {
                    debug!(
                        frames = self.frames_sent,
                        width = frame.width,
                        height = frame.height,
                        "channel progress"
                    );
                }
                SendOutcome::Delivered
            }
            Err(e) => {
                self.fail(e);
                SendOutcome::Dropped
            }
        }
    }

    fn fail(&mut self, error: WriteError) {
        match error {
            WriteError::Closed => {
                warn!(path = %self.path.display(), "receiver disconnected; stopping export")
            }
            WriteError::Failed(e) => {
                warn!(path = %self.path.display(), error = %e, "channel write failed; stopping export")
            }
        }
        self.stream = None;
        self.state = LinkState::Failed;
    }

    /// Whether the transport can still deliver frames.
    pub fn is_active(&self) -> bool {
        self.state == LinkState::Connected
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Drop the connection. Further sends become no-ops.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            info!(
                path = %self.path.display(),
                sent = self.frames_sent,
                "channel closed"
            );
        }
        if self.state == LinkState::Connected {
            self.state = LinkState::Unconnected;
        }
    }
}

/// Header first, then each plane's raw strided bytes.
fn write_frame(stream: &mut UnixStream, frame: &FrameDescriptor<'_>) -> Result<(), WriteError> {
    let header = FrameHeader::from_descriptor(frame);
    writer::write_all(stream, &header.encode())?;
    for plane in frame.planes() {
        writer::write_all(stream, &plane.data[..plane.byte_len()])?;
    }
    Ok(())
}
