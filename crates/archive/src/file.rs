//! File-backed archive
//!
//! One append-only file per series under a data directory. Inserts are
//! append-only by nature (records are immutable and batches are disjoint),
//! so the on-disk format is a sequence of frames, one per committed batch:
//!
//! ```text
//! [u32 len LE][u32 crc32 LE][bincode Vec<TradeRecord>, `len` bytes]
//! ```
//!
//! On open, every `*.series` file is replayed into a [`MemoryArchive`]. The
//! first incomplete or checksum-failed frame and everything after it is
//! truncated away with a warning (a killed process can only tear the tail).
//!
//! # Durability
//!
//! Writes go through a `BufWriter` and are flushed after every frame;
//! there is no fsync. A crash can lose the latest batches but never leaves
//! a half-applied one, and the engine re-fetches missing spans on the next
//! run anyway.

use crate::memory::MemoryArchive;
use crate::store::{ArchiveStore, UpsertReport};
use async_trait::async_trait;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tickvault_core::{Error, Result, SeriesInfo, Symbol, Timestamp, TradeRecord};
use tracing::{debug, warn};

const SERIES_EXT: &str = "series";
const FRAME_HEADER_SIZE: u64 = 8;

/// Append-only file archive over an in-memory working set
pub struct FileArchive {
    dir: PathBuf,
    inner: MemoryArchive,
    writers: DashMap<Symbol, Arc<Mutex<BufWriter<File>>>>,
}

impl FileArchive {
    /// Open an archive directory, creating it if absent, and replay every
    /// series file found there
    ///
    /// # Errors
    ///
    /// Fails on unreadable files or on files that are not series files.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let archive = FileArchive {
            dir,
            inner: MemoryArchive::new(),
            writers: DashMap::new(),
        };
        archive.replay_all()?;
        Ok(archive)
    }

    /// The directory this archive persists into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn series_path(&self, symbol: &Symbol) -> PathBuf {
        self.dir.join(format!("{}.{}", symbol, SERIES_EXT))
    }

    fn replay_all(&self) -> Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SERIES_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let symbol = Symbol::new(stem).map_err(|e| {
                Error::archive(format!("{}: not a series file: {}", path.display(), e))
            })?;
            self.replay_series(&symbol, &path)?;
        }
        Ok(())
    }

    /// Replay one series file, truncating at the first broken frame
    fn replay_series(&self, symbol: &Symbol, path: &Path) -> Result<()> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut offset = 0u64;
        let mut batches = 0u64;

        self.inner.create_series_sync(symbol);

        loop {
            match read_frame(&mut reader, file_len, offset) {
                Ok(Some((records, frame_len))) => {
                    self.inner.upsert_many_sync(symbol, &records)?;
                    offset += frame_len;
                    batches += 1;
                }
                Ok(None) => break,
                Err(FrameError::Broken(detail)) => {
                    warn!(
                        symbol = %symbol,
                        offset,
                        detail = %detail,
                        "truncating broken series file tail"
                    );
                    let file = OpenOptions::new().write(true).open(path)?;
                    file.set_len(offset)?;
                    break;
                }
                Err(FrameError::Io(e)) => return Err(e.into()),
            }
        }
        debug!(symbol = %symbol, batches, "series file replayed");
        Ok(())
    }

    fn writer(&self, symbol: &Symbol) -> Result<Arc<Mutex<BufWriter<File>>>> {
        if let Some(writer) = self.writers.get(symbol) {
            return Ok(Arc::clone(&writer));
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.series_path(symbol))?;
        let writer = Arc::new(Mutex::new(BufWriter::new(file)));
        self.writers.insert(symbol.clone(), Arc::clone(&writer));
        Ok(writer)
    }

    fn append_frame(&self, symbol: &Symbol, records: &[TradeRecord]) -> Result<()> {
        let payload = bincode::serialize(records)
            .map_err(|e| Error::archive_with_source("frame encoding failed", e))?;
        let crc = crc32fast::hash(&payload);
        let writer = self.writer(symbol)?;
        let mut writer = writer.lock();
        writer.write_u32::<LittleEndian>(payload.len() as u32)?;
        writer.write_u32::<LittleEndian>(crc)?;
        writer.write_all(&payload)?;
        writer.flush()?;
        Ok(())
    }
}

enum FrameError {
    /// Incomplete or checksum-failed frame; recovery truncates here
    Broken(String),
    Io(std::io::Error),
}

/// Read one frame; `Ok(None)` at clean EOF
fn read_frame(
    reader: &mut BufReader<File>,
    file_len: u64,
    offset: u64,
) -> std::result::Result<Option<(Vec<TradeRecord>, u64)>, FrameError> {
    if offset == file_len {
        return Ok(None);
    }
    if file_len - offset < FRAME_HEADER_SIZE {
        return Err(FrameError::Broken("partial frame header".into()));
    }
    let len = reader.read_u32::<LittleEndian>().map_err(FrameError::Io)? as u64;
    let crc = reader.read_u32::<LittleEndian>().map_err(FrameError::Io)?;
    if file_len - offset - FRAME_HEADER_SIZE < len {
        return Err(FrameError::Broken("partial frame payload".into()));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).map_err(FrameError::Io)?;
    if crc32fast::hash(&payload) != crc {
        return Err(FrameError::Broken("frame checksum mismatch".into()));
    }
    let records: Vec<TradeRecord> = bincode::deserialize(&payload)
        .map_err(|e| FrameError::Broken(format!("frame decode failed: {}", e)))?;
    Ok(Some((records, FRAME_HEADER_SIZE + len)))
}

#[async_trait]
impl ArchiveStore for FileArchive {
    async fn list_series(&self) -> Result<Vec<Symbol>> {
        Ok(self.inner.list_series_sync())
    }

    async fn create_series(&self, symbol: &Symbol) -> Result<()> {
        self.inner.create_series_sync(symbol);
        // Materialize the file so the series survives reopen even if empty
        self.writer(symbol)?;
        Ok(())
    }

    async fn drop_series(&self, symbol: &Symbol) -> Result<()> {
        self.inner.drop_series_sync(symbol);
        self.writers.remove(symbol);
        let path = self.series_path(symbol);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    async fn is_non_empty(&self, symbol: &Symbol) -> Result<bool> {
        Ok(self.inner.is_non_empty_sync(symbol))
    }

    async fn bounds(&self, symbol: &Symbol) -> Result<SeriesInfo> {
        self.inner.bounds_sync(symbol)
    }

    async fn insert_many(&self, symbol: &Symbol, records: &[TradeRecord]) -> Result<u64> {
        let inserted = self.inner.insert_many_sync(symbol, records)?;
        self.append_frame(symbol, records)?;
        Ok(inserted)
    }

    async fn upsert_many(&self, symbol: &Symbol, records: &[TradeRecord]) -> Result<UpsertReport> {
        // Persist only what actually lands, or replay would double-count
        let mut fresh = Vec::new();
        for record in records {
            let report = self
                .inner
                .upsert_many_sync(symbol, std::slice::from_ref(record))?;
            if report.inserted == 1 {
                fresh.push(record.clone());
            }
        }
        if !fresh.is_empty() {
            self.append_frame(symbol, &fresh)?;
        }
        Ok(UpsertReport {
            inserted: fresh.len() as u64,
            skipped: (records.len() - fresh.len()) as u64,
        })
    }

    async fn range(
        &self,
        symbol: &Symbol,
        from_ts: Timestamp,
        to_ts: Timestamp,
    ) -> Result<Vec<TradeRecord>> {
        Ok(self.inner.range_sync(symbol, from_ts, to_ts))
    }

    async fn verify(&self, symbol: &Symbol) -> Result<bool> {
        Ok(self.inner.verify_sync(symbol))
    }
}
