//! Input file loading: decode, parse, fix up, and build engine records,
//! tagging each file's trust from its name.

use std::fmt;
use std::path::Path;

use logmerge_engine::{MalformedRecord, MergeConfig, Record, Source, TrustTag};

/// One input file's worth of records, malformed entries kept alongside so
/// the caller can surface them as diagnostics.
#[derive(Debug)]
pub struct LoadedFile {
    pub source: Source,
    pub records: Vec<Record>,
    pub malformed: Vec<MalformedRecord>,
}

#[derive(Debug)]
pub enum LoadError {
    Io { path: String, message: String },
    Parse { path: String, message: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::Parse { path, message } => write!(f, "{path}: {message}"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Load one ADIF file. Malformed records (no match key or timestamp) are
/// collected, not dropped and not fatal.
pub fn load_file(path: &Path, config: &MergeConfig) -> Result<LoadedFile, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let text = logmerge_adif::decode_bytes(&bytes);
    let raw_records = logmerge_adif::parse(&text).map_err(|e| LoadError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    // Trust is derived from the file name only, here at the boundary; the
    // engine sees nothing but the tag.
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let trust = TrustTag::classify(&name, &config.authoritative_markers);
    let source = Source { name, trust };

    let mut records = Vec::with_capacity(raw_records.len());
    let mut malformed = Vec::new();
    for raw in raw_records {
        let fields = logmerge_adif::fixup(raw);
        match Record::new(fields, source.clone()) {
            Ok(record) => records.push(record),
            Err(err) => malformed.push(err),
        }
    }

    Ok(LoadedFile {
        source,
        records,
        malformed,
    })
}
