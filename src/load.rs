//! Loading OCR result files from disk.
//!
//! The asynchronous OCR job writes its results as JSON shards named
//! `output-<first>-to-<last>.json`, each holding the responses for a run of
//! pages. Shards are ordered by their first page so that, when shards
//! overlap, the later one wins deterministically in the index.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;

use crate::error::{Error, Result};
use crate::index::AnnotationIndex;
use crate::model::AnnotateFileResponse;

fn shard_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)-to-(\d+)\.json$").unwrap())
}

/// Page range encoded in a shard file name, if it follows the
/// `…<first>-to-<last>.json` convention.
pub fn shard_range(path: &Path) -> Option<(u32, u32)> {
    let name = path.file_name()?.to_str()?;
    let caps = shard_pattern().captures(name)?;
    let first = caps.get(1)?.as_str().parse().ok()?;
    let last = caps.get(2)?.as_str().parse().ok()?;
    Some((first, last))
}

/// Decode one OCR result file from memory.
pub fn decode_bytes(data: &[u8]) -> Result<AnnotateFileResponse> {
    Ok(serde_json::from_slice(data)?)
}

/// Decode one OCR result file from a reader.
pub fn decode_reader<R: Read>(mut reader: R) -> Result<AnnotateFileResponse> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    decode_bytes(&data)
}

/// Read and decode one OCR result file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<AnnotateFileResponse> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| Error::AnnotationRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| Error::AnnotationDecode {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and decode several result files in parallel.
///
/// The returned responses are in the same order as `paths`.
pub fn load_files<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<AnnotateFileResponse>> {
    paths.par_iter().map(|p| load_file(p.as_ref())).collect()
}

/// List the `.json` result files in a directory, in shard order.
///
/// Shards sort by first page, then by name; files without a page range in
/// their name come last, by name.
pub fn collect_result_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let read_error = |source| Error::AnnotationRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if path.is_file() && is_json {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|path| {
        let first = shard_range(path).map(|(first, _)| first).unwrap_or(u32::MAX);
        (first, path.file_name().map(|n| n.to_os_string()))
    });
    Ok(files)
}

/// Expand a mix of files and directories into an ordered file list.
///
/// Explicit files keep their position; each directory contributes its
/// result files in shard order.
pub fn expand_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            files.extend(collect_result_files(input)?);
        } else {
            files.push(input.to_path_buf());
        }
    }
    Ok(files)
}

/// Load every result file under `inputs` and build the page index.
pub fn load_index<P: AsRef<Path>>(inputs: &[P]) -> Result<AnnotationIndex> {
    let files = expand_inputs(inputs)?;
    log::debug!("loading {} OCR result file(s)", files.len());
    let responses = load_files(&files)?;
    AnnotationIndex::from_responses(responses)
}

/// Like [`load_index`], decoding one file at a time.
pub fn load_index_sequential<P: AsRef<Path>>(inputs: &[P]) -> Result<AnnotationIndex> {
    let responses = expand_inputs(inputs)?
        .iter()
        .map(load_file)
        .collect::<Result<Vec<_>>>()?;
    AnnotationIndex::from_responses(responses)
}
