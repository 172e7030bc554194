//! Named-pipe relay for the decoupled-process deployment (unix only).
//!
//! The producer process forwards each transcript as one newline-terminated
//! UTF-8 record into a FIFO; the consumer process reads records line by line
//! and feeds its own dispatch loop.  Records are never split: in-process
//! writers are serialized under a mutex, and each record goes out as a single
//! `write_all` of an already-formatted buffer.
//!
//! Opening the FIFO for writing blocks until a reader is attached.  That is a
//! characteristic of the deployment (start the consumer first), not a defect
//! this layer papers over.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;

use thiserror::Error;

use crate::bridge::{ResultBridge, ResultReceiver, TranscriptionResult};

// ---------------------------------------------------------------------------
// RelayError
// ---------------------------------------------------------------------------

/// Errors from the pipe relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The path exists but is not a FIFO.
    #[error("{0} exists and is not a named pipe")]
    NotAFifo(PathBuf),

    /// `mkfifo` failed.
    #[error("failed to create named pipe: {0}")]
    Create(String),

    /// The channel could not be opened, written or read.  Observed by the
    /// caller as a blocking or failing write — no buffering or retry is
    /// layered on top.
    #[error("pipe channel unavailable: {0}")]
    ChannelUnavailable(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// PipeRelay (producer side)
// ---------------------------------------------------------------------------

/// Writer side of the relay.
///
/// The FIFO is opened per record, matching one-record-per-writer-open
/// semantics: the consumer sees EOF between producers and simply reopens.
#[derive(Debug)]
pub struct PipeRelay {
    path: PathBuf,
    // Serializes in-process writers so a record is never interleaved.
    write_lock: Mutex<()>,
}

impl PipeRelay {
    /// Create (or attach to) the FIFO at `path`.
    ///
    /// # Errors
    ///
    /// - [`RelayError::Create`]   — `mkfifo` failed.
    /// - [`RelayError::NotAFifo`] — `path` exists but is a regular file,
    ///   directory, etc.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            use std::os::unix::fs::FileTypeExt;
            let file_type = std::fs::metadata(&path)?.file_type();
            if !file_type.is_fifo() {
                return Err(RelayError::NotAFifo(path));
            }
        } else {
            nix::unistd::mkfifo(&path, nix::sys::stat::Mode::from_bits_truncate(0o644))
                .map_err(|e| RelayError::Create(e.to_string()))?;
            log::info!("relay: created named pipe {}", path.display());
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the FIFO.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `text` as exactly one newline-terminated record.
    ///
    /// Blocks until a reader is attached to the FIFO.  Concurrent in-process
    /// callers are serialized; the record is written with a single
    /// `write_all` so a reader never observes a partial line.
    ///
    /// # Errors
    ///
    /// [`RelayError::ChannelUnavailable`] when the pipe cannot be opened or
    /// written (e.g. the reader vanished mid-write).
    pub fn write_record(&self, text: &str) -> Result<(), RelayError> {
        let record = format!("{text}\n");

        let _guard = self.write_lock.lock().unwrap();
        let mut pipe = OpenOptions::new().write(true).open(&self.path)?;
        pipe.write_all(record.as_bytes())?;
        pipe.flush()?;
        Ok(())
    }
}

/// Producer-mode loop: drain the bridge into the pipe.
///
/// Each write runs on the blocking pool so a missing reader stalls only the
/// relay, not the tokio runtime.  A failed write loses that one record; the
/// loop continues with the next.
pub async fn forward_results(mut results: ResultReceiver, relay: std::sync::Arc<PipeRelay>) {
    while let Some(result) = results.recv().await {
        let relay = std::sync::Arc::clone(&relay);
        let text = result.text.clone();

        let outcome = tokio::task::spawn_blocking(move || relay.write_record(&text)).await;
        match outcome {
            Ok(Ok(())) => {
                log::info!("relay: forwarded segment {}: {:?}", result.segment_id, result.text);
            }
            Ok(Err(e)) => {
                log::warn!("relay: failed to forward segment {}: {e}", result.segment_id);
            }
            Err(e) => {
                log::warn!("relay: write task panicked: {e}");
            }
        }
    }

    log::info!("relay: result bridge closed, forwarder exiting");
}

// ---------------------------------------------------------------------------
// PipeReader (consumer side)
// ---------------------------------------------------------------------------

/// Consumer-side reader thread: turns pipe records back into
/// [`TranscriptionResult`]s feeding a local dispatch loop.
///
/// Segment ids are assigned locally in read order — the wire protocol
/// carries no framing beyond the newline.
pub struct PipeReader {
    handle: thread::JoinHandle<()>,
}

impl PipeReader {
    /// Spawn the reader thread.
    ///
    /// On writer EOF the FIFO is reopened, which blocks until the next
    /// writer appears.  The thread exits when the bridge closes or the FIFO
    /// can no longer be opened.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread (extremely unlikely).
    pub fn spawn(path: impl AsRef<Path>, bridge: ResultBridge) -> Self {
        let path = path.as_ref().to_path_buf();
        let handle = thread::Builder::new()
            .name("pipe-reader".into())
            .spawn(move || reader_loop(&path, bridge))
            .expect("failed to spawn pipe-reader thread");

        Self { handle }
    }

    /// Wait for the reader thread to exit.
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

fn reader_loop(path: &Path, bridge: ResultBridge) {
    let mut next_id: u64 = 0;

    loop {
        // Blocks until a writer opens the FIFO.
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                log::error!("relay: cannot open {} for reading: {e}", path.display());
                return;
            }
        };

        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    log::warn!("relay: read error on {}: {e}", path.display());
                    break;
                }
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let id = next_id;
            next_id += 1;
            log::info!("relay: received record {id}: {text:?}");

            if bridge.deliver(TranscriptionResult::new(text, id)).is_err() {
                log::info!("relay: result bridge closed, reader exiting");
                return;
            }
        }

        // EOF: every writer closed its end.  Reopen and wait for the next
        // one instead of spinning on a held-open descriptor.
        log::debug!("relay: writers closed {}, reopening", path.display());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bridge::result_bridge;

    fn fifo_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("agent_pipe")
    }

    #[test]
    fn create_makes_a_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let path = fifo_path(&dir);

        let relay = PipeRelay::create(&path).unwrap();
        assert_eq!(relay.path(), path.as_path());

        use std::os::unix::fs::FileTypeExt;
        assert!(std::fs::metadata(&path).unwrap().file_type().is_fifo());

        // Creating again attaches to the existing FIFO.
        let _again = PipeRelay::create(&path).unwrap();
    }

    #[test]
    fn create_rejects_a_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_pipe");
        std::fs::write(&path, b"plain file").unwrap();

        let err = PipeRelay::create(&path).unwrap_err();
        assert!(matches!(err, RelayError::NotAFifo(_)));
    }

    #[test]
    fn records_round_trip_through_the_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let path = fifo_path(&dir);
        let relay = Arc::new(PipeRelay::create(&path).unwrap());

        let reader_path = path.clone();
        let reader = thread::spawn(move || {
            let file = File::open(reader_path).unwrap();
            BufReader::new(file)
                .lines()
                .map(|l| l.unwrap())
                .collect::<Vec<_>>()
        });

        // Keep a write end open so the reader does not hit EOF between the
        // per-record opens.
        let keepalive = OpenOptions::new().write(true).open(&path).unwrap();

        relay.write_record("go north").unwrap();
        relay.write_record("land now").unwrap();
        drop(keepalive);

        let lines = reader.join().unwrap();
        assert_eq!(lines, vec!["go north", "land now"]);
    }

    /// Two concurrent writers must each produce one complete line — never an
    /// interleaved partial record.
    #[test]
    fn concurrent_writers_do_not_interleave_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = fifo_path(&dir);
        let relay = Arc::new(PipeRelay::create(&path).unwrap());

        let reader_path = path.clone();
        let reader = thread::spawn(move || {
            let file = File::open(reader_path).unwrap();
            BufReader::new(file)
                .lines()
                .map(|l| l.unwrap())
                .collect::<Vec<_>>()
        });

        let keepalive = OpenOptions::new().write(true).open(&path).unwrap();

        let writers: Vec<_> = ["hello", "world"]
            .into_iter()
            .map(|word| {
                let relay = Arc::clone(&relay);
                thread::spawn(move || relay.write_record(word).unwrap())
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        drop(keepalive);

        let mut lines = reader.join().unwrap();
        lines.sort();
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn reader_delivers_records_as_results_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = fifo_path(&dir);
        let relay = PipeRelay::create(&path).unwrap();

        let (bridge, mut results) = result_bridge();
        let reader = PipeReader::spawn(&path, bridge.clone());

        let writer_relay = Arc::new(relay);
        let writer = {
            let relay = Arc::clone(&writer_relay);
            thread::spawn(move || {
                relay.write_record("first").unwrap();
                relay.write_record("").unwrap(); // blank record — skipped
                relay.write_record("second").unwrap();
            })
        };

        let first = results.recv().await.unwrap();
        assert_eq!(first.segment_id, 0);
        assert_eq!(first.text, "first");

        let second = results.recv().await.unwrap();
        assert_eq!(second.segment_id, 1);
        assert_eq!(second.text, "second");

        writer.join().unwrap();

        // Closing the receiver makes the reader exit on its next delivery
        // or reopen cycle: write one more record to unblock it.
        drop(results);
        let _ = writer_relay.write_record("flush");
        reader.join();
    }
}
