//! Periodic journaling of the cursor index.
//!
//! Only the cursor survives a restart; the cache always starts cold. The
//! journal file holds exactly four bytes: the index as a little-endian `u32`,
//! rewritten in place at offset 0.

use std::fs::File;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::Error;
use crate::error::Result;

/// Failed writes in a row the worker tolerates before giving up.
///
/// A successful write resets the count, so only an unbroken run of failures
/// stops the worker; isolated failures over a long run do not add up.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// A four-byte file holding the last journaled index.
#[derive(Debug)]
pub struct Journal {
    file: File,
    path: PathBuf,
}

impl Journal {
    /// Open the journal at `path`, creating an empty one if it is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Journal> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        return Ok(Journal { file, path });
    }

    pub fn path(&self) -> &Path {
        return &self.path;
    }

    /// The saved index, or `None` if the file is shorter than four bytes.
    pub fn read_index(&mut self) -> Result<Option<u32>> {
        let mut bytes = [0u8; 4];
        self.file.seek(SeekFrom::Start(0))?;
        match self.file.read_exact(&mut bytes) {
            Ok(()) => return Ok(Some(u32::from_le_bytes(bytes))),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(err.into()),
        }
    }

    /// Where a restarted cursor should begin: the saved index, or 0 when
    /// nothing was saved or the file could not be read.
    pub fn resume_index(&mut self) -> u32 {
        let read = self.read_index();
        return index_or_zero(&self.path, read);
    }

    /// Overwrite the saved index.
    pub fn write_index(&mut self, index: u32) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&index.to_le_bytes())?;
        self.file.flush()?;
        return Ok(());
    }
}

fn index_or_zero(path: &Path, read: Result<Option<u32>>) -> u32 {
    match read {
        Ok(Some(index)) => {
            tracing::info!(index, "resuming sequence index");
            return index;
        }
        Ok(None) => {
            tracing::info!("starting sequence index at zero");
            return 0;
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "could not read journal, starting at zero");
            return 0;
        }
    }
}

/// Background thread writing the cursor index on a fixed interval.
pub struct JournalWorker {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<Result<()>>,
}

impl JournalWorker {
    /// Start journaling whatever `probe` returns every `interval`.
    pub fn spawn<F>(journal: Journal, interval: Duration, probe: F) -> Result<JournalWorker>
    where
        F: Fn() -> u32 + Send + 'static,
    {
        if interval.is_zero() {
            return Err(Error::InvalidJournalInterval);
        }
        let (stop, stopped) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("journal".to_string())
            .spawn(move || run(journal, interval, probe, stopped))?;
        return Ok(JournalWorker { stop, handle });
    }

    /// Whether the worker has exited, normally because it gave up.
    pub fn is_finished(&self) -> bool {
        return self.handle.is_finished();
    }

    /// Write one last snapshot, stop the thread, and report how it ended.
    pub fn stop(self) -> Result<()> {
        // The worker may already be gone; that shows up in the join result.
        let _ = self.stop.send(());
        match self.handle.join() {
            Ok(result) => return result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

fn run<F: Fn() -> u32>(
    mut journal: Journal,
    interval: Duration,
    probe: F,
    stopped: mpsc::Receiver<()>,
) -> Result<()> {
    let mut failures = 0;
    loop {
        let last = match stopped.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        };

        let index = probe();
        match journal.write_index(index) {
            Ok(()) => failures = 0,
            Err(source) => {
                failures += 1;
                if failures >= MAX_CONSECUTIVE_FAILURES {
                    tracing::error!(path = %journal.path().display(), %source, "journal write failed, giving up");
                    return Err(Error::JournalExhausted { failures, source });
                }
                tracing::warn!(
                    path = %journal.path().display(),
                    %source,
                    remaining = MAX_CONSECUTIVE_FAILURES - failures,
                    "journal write failed"
                );
            }
        }

        if last {
            tracing::debug!(index, "journal stopped");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    #[test]
    fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        let mut journal = Journal::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(journal.read_index().unwrap(), None);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        let mut journal = Journal::open(&path).unwrap();
        journal.write_index(1234).unwrap();
        journal.write_index(77).unwrap();
        assert_eq!(journal.read_index().unwrap(), Some(77));

        let mut reopened = Journal::open(&path).unwrap();
        assert_eq!(reopened.read_index().unwrap(), Some(77));
    }

    #[test]
    fn format_is_four_le_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        let mut journal = Journal::open(&path).unwrap();
        journal.write_index(0x0102_0304).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn short_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        std::fs::write(&path, [1u8, 2]).unwrap();
        let mut journal = Journal::open(&path).unwrap();
        assert_eq!(journal.read_index().unwrap(), None);
    }

    #[test]
    fn resume_index_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        let mut journal = Journal::open(&path).unwrap();
        assert_eq!(journal.resume_index(), 0);
        journal.write_index(12).unwrap();
        assert_eq!(journal.resume_index(), 12);
    }

    #[test]
    fn unreadable_journal_resumes_at_zero() {
        let path = Path::new("cursor");
        let failed = Err(Error::Io(std::io::Error::other("device gone")));
        assert_eq!(index_or_zero(path, failed), 0);
        assert_eq!(index_or_zero(path, Ok(Some(40))), 40);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::open(dir.path().join("cursor")).unwrap();
        let result = JournalWorker::spawn(journal, Duration::ZERO, || 0);
        assert!(matches!(result, Err(Error::InvalidJournalInterval)));
    }

    #[test]
    fn worker_writes_final_snapshot_on_stop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        let journal = Journal::open(&path).unwrap();
        let index = Arc::new(AtomicU32::new(9));
        let probe = {
            let index = index.clone();
            move || index.load(Ordering::SeqCst)
        };
        let worker = JournalWorker::spawn(journal, Duration::from_secs(3600), probe).unwrap();
        index.store(42, Ordering::SeqCst);
        worker.stop().unwrap();

        let mut journal = Journal::open(&path).unwrap();
        assert_eq!(journal.read_index().unwrap(), Some(42));
    }

    #[test]
    fn worker_writes_periodically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        let journal = Journal::open(&path).unwrap();
        let worker = JournalWorker::spawn(journal, Duration::from_millis(5), || 314).unwrap();
        let mut reader = Journal::open(&path).unwrap();
        let mut seen = None;
        for _ in 0..400 {
            seen = reader.read_index().unwrap();
            if seen.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(seen, Some(314));
        assert!(!worker.is_finished());
        worker.stop().unwrap();
    }
}
