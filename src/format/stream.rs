//! File streams around the codec
//!
//! Every save stream is gzip'd at the outermost layer. Writes go to a hidden
//! sibling file that is renamed over the target only once it is complete, so a
//! failed export never leaves a truncated save behind.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::Result;

/// Read and gunzip a whole file
pub fn read_gzip(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(file));
    let mut data = Vec::new();
    decoder.read_to_end(&mut data)?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "decompressed stream");
    Ok(data)
}

/// Gzip `data` into `path`, replacing it only on success
pub fn write_gzip_atomic(path: &Path, data: &[u8]) -> Result<()> {
    write_atomic_with(path, |out| {
        let mut encoder = GzEncoder::new(out, Compression::default());
        encoder.write_all(data)?;
        encoder.finish()?;
        Ok(())
    })
}

/// Write `data` uncompressed into `path`, replacing it only on success
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    write_atomic_with(path, |out| out.write_all(data))
}

fn write_atomic_with(
    path: &Path,
    fill: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<()> {
    let tmp = temp_path(path)?;
    let result = (|| {
        let mut out = BufWriter::new(File::create(&tmp)?);
        fill(&mut out)?;
        let file = out.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    tracing::debug!(path = %path.display(), "wrote stream");
    Ok(())
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a file path", path.display()),
        )
    })?;
    let mut tmp = OsString::from(".");
    tmp.push(name);
    tmp.push(".tmp");
    Ok(path.with_file_name(tmp))
}
