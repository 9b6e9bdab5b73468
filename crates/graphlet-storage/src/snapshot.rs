//! Framed bincode snapshots

use crate::options::SnapshotOptions;
use bincode::Options;
use graphlet_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Leading bytes of every snapshot
pub const MAGIC: &[u8; 8] = b"GRAPHLET";

/// Version of the snapshot body layout
pub const FORMAT_VERSION: u32 = 1;

/// Write `state` to `writer` as a framed snapshot
pub fn encode<T: Serialize, W: Write>(writer: &mut W, state: &T) -> Result<()> {
    writer.write_all(MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    bincode::serialize_into(&mut *writer, state)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

/// Read a framed snapshot from `reader`
pub fn decode<T: DeserializeOwned, R: Read>(reader: &mut R) -> Result<T> {
    let mut magic = [0u8; 8];
    read_header_field(reader, &mut magic, "magic")?;
    if &magic != MAGIC {
        return Err(Error::DataCorruption("not a graphlet snapshot".to_string()));
    }

    let mut version = [0u8; 4];
    read_header_field(reader, &mut version, "format version")?;
    let version = u32::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(Error::DataCorruption(format!(
            "unsupported snapshot version {} (expected {})",
            version, FORMAT_VERSION
        )));
    }

    let mut body = Vec::new();
    reader.read_to_end(&mut body)?;

    // same wire format as `bincode::serialize_into`; the limit stops a
    // corrupt length prefix from allocating more than the body holds
    bincode::options()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(body.len() as u64)
        .deserialize(&body)
        .map_err(|e| Error::Deserialization(e.to_string()))
}

fn read_header_field<R: Read>(reader: &mut R, buf: &mut [u8], field: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            Error::DataCorruption(format!("snapshot truncated in {}", field))
        }
        _ => Error::Io(e),
    })
}

/// A snapshot file on disk
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    options: SnapshotOptions,
}

impl SnapshotFile {
    /// Create a handle for the snapshot described by `options`
    pub fn new(options: SnapshotOptions) -> Self {
        Self { options }
    }

    /// Returns true if a snapshot exists at the configured path
    pub fn exists(&self) -> bool {
        self.options.path.is_file()
    }

    /// Write `state`, replacing any previous snapshot
    ///
    /// The body goes to a sibling temp file first and is renamed into
    /// place, so a failed save leaves the old snapshot intact.
    pub fn write<T: Serialize>(&self, state: &T) -> Result<()> {
        let path = &self.options.path;
        if self.options.create_if_missing {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            encode(&mut writer, state)?;
            let file = writer
                .into_inner()
                .map_err(|e| Error::Io(e.into_error()))?;
            if self.options.sync_on_save {
                file.sync_all()?;
            }
        }
        fs::rename(&tmp_path, path)?;

        info!("Saved snapshot to {:?}", path);
        Ok(())
    }

    /// Sibling path the body is staged in: `<file name>.tmp`
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.options.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Read the snapshot back
    pub fn read<T: DeserializeOwned>(&self) -> Result<T> {
        let path = &self.options.path;
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let state = decode(&mut reader)?;

        debug!("Read snapshot from {:?}", path);
        Ok(state)
    }
}
