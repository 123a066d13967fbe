//! Parallel, order-preserving extraction pipeline.
//!
//! Files are parsed with Rayon a chunk at a time; segments come out in path
//! order and then source order, so the consumer can stay sequential.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use super::filesystem::{display_path, iter_python_files};
use super::segments::segments_from_source;
use crate::errors::DolceResult;
use crate::models::CodeSegment;

/// Files parsed per parallel batch.
const CHUNK_SIZE: usize = 32;

fn extract_file_worker(path: &Path) -> Vec<CodeSegment> {
    let shown = display_path(path);
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            warn!("Skipping unreadable file {shown}: {e}");
            return Vec::new();
        }
    };
    match segments_from_source(&shown, &source) {
        Ok(segments) => segments,
        Err(e) => {
            warn!("Skipping {shown}: {e}");
            Vec::new()
        }
    }
}

fn parallel_extract(pool: Option<&rayon::ThreadPool>, files: &[PathBuf]) -> Vec<Vec<CodeSegment>> {
    match pool {
        Some(pool) => pool.install(|| {
            files
                .par_iter()
                .map(|path| extract_file_worker(path))
                .collect()
        }),
        // Fallback to sequential
        None => files.iter().map(|path| extract_file_worker(path)).collect(),
    }
}

/// Lazy stream of segments over a fixed list of files.
pub struct SegmentStream {
    files: Vec<PathBuf>,
    next_file: usize,
    buffer: VecDeque<CodeSegment>,
    pool: Option<rayon::ThreadPool>,
}

impl SegmentStream {
    pub fn new(files: Vec<PathBuf>) -> Self {
        let pool = match rayon::ThreadPoolBuilder::new().build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Thread pool unavailable, extracting sequentially: {e}");
                None
            }
        };
        Self {
            files,
            next_file: 0,
            buffer: VecDeque::new(),
            pool,
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    fn fill(&mut self) {
        while self.buffer.is_empty() && self.next_file < self.files.len() {
            let end = (self.next_file + CHUNK_SIZE).min(self.files.len());
            let chunk = &self.files[self.next_file..end];
            debug!("Extracting files {}..{} of {}", self.next_file, end, self.files.len());
            for segments in parallel_extract(self.pool.as_ref(), chunk) {
                self.buffer.extend(segments);
            }
            self.next_file = end;
        }
    }
}

impl Iterator for SegmentStream {
    type Item = CodeSegment;

    fn next(&mut self) -> Option<CodeSegment> {
        self.fill();
        self.buffer.pop_front()
    }
}

/// Segments of every Python file under `path` not matched by `excludes`.
pub fn extract(path: &Path, excludes: &[String]) -> DolceResult<SegmentStream> {
    let files = iter_python_files(path, excludes)?;
    debug!("Found {} Python files under {}", files.len(), path.display());
    Ok(SegmentStream::new(files))
}

/// Segments of a single file, eagerly.
pub fn extract_file(path: &Path) -> DolceResult<Vec<CodeSegment>> {
    let source = std::fs::read_to_string(path)?;
    segments_from_source(&display_path(path), &source)
}
