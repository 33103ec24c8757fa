//! Bounded readers for the child's pipes.
//!
//! Each pipe is drained on its own thread so the child can never block on a
//! full pipe buffer. Bytes past the cap are read and discarded.

use std::io::{self, Read};
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::supervisor::SUPERVISOR_TARGET;

/// A pipe being drained in the background.
pub(crate) struct PipeCapture {
    stream: &'static str,
    handle: JoinHandle<io::Result<Vec<u8>>>,
}

impl PipeCapture {
    /// Starts draining `reader`, keeping at most `cap` bytes.
    pub(crate) fn spawn<R>(stream: &'static str, reader: R, cap: usize) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("pyfence-{stream}"))
            .spawn(move || read_bounded(reader, cap))?;
        Ok(Self { stream, handle })
    }

    /// Waits for EOF and returns the kept bytes. Read failures are logged
    /// and yield whatever was captured as empty.
    pub(crate) fn finish(self) -> Vec<u8> {
        match self.handle.join() {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(error)) => {
                warn!(target: SUPERVISOR_TARGET, stream = self.stream, %error, "pipe read failed");
                Vec::new()
            }
            Err(_) => {
                warn!(target: SUPERVISOR_TARGET, stream = self.stream, "pipe reader panicked");
                Vec::new()
            }
        }
    }
}

pub(crate) fn read_bounded<R: Read>(mut reader: R, cap: usize) -> io::Result<Vec<u8>> {
    let mut kept = Vec::new();
    let limit = u64::try_from(cap).unwrap_or(u64::MAX);
    (&mut reader).take(limit).read_to_end(&mut kept)?;
    io::copy(&mut reader, &mut io::sink())?;
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn keeps_only_the_first_bytes() {
        let bytes = read_bounded(Cursor::new(vec![b'x'; 100]), 10).expect("read");
        assert_eq!(bytes.len(), 10);
    }

    #[test]
    fn short_input_is_kept_whole() {
        let bytes = read_bounded(Cursor::new(b"hello".to_vec()), 64).expect("read");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn background_capture_returns_bytes() {
        let capture = PipeCapture::spawn("stdout", Cursor::new(b"report".to_vec()), 64)
            .expect("spawn reader");
        assert_eq!(capture.finish(), b"report");
    }
}
