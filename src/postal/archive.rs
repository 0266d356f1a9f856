//! Unpacking delivered artifacts.

use flate2::read::GzDecoder;
use std::fs;
use std::io;
use std::path::Path;
use tar::Archive;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const TAR_MAGIC_OFFSET: usize = 257;

/// Extracts gzip tarballs and plain tarballs into `destination`; any other
/// content is written as `destination/<file_name>`.
pub fn extract(bytes: &[u8], destination: &Path, file_name: &str) -> io::Result<()> {
    fs::create_dir_all(destination)?;

    if bytes.starts_with(&GZIP_MAGIC) {
        return Archive::new(GzDecoder::new(bytes)).unpack(destination);
    }

    if is_tar(bytes) {
        return Archive::new(bytes).unpack(destination);
    }

    fs::write(destination.join(file_name), bytes)
}

fn is_tar(bytes: &[u8]) -> bool {
    bytes
        .get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5)
        .map(|magic| magic == b"ustar")
        .unwrap_or(false)
}

/// Last path segment of a URI, ignoring any query string.
pub fn file_name_from_uri(uri: &str) -> &str {
    let without_query = uri.split(&['?', '#'][..]).next().unwrap_or(uri);
    without_query
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("artifact")
}

#[cfg(test)]
pub(crate) fn tarball(files: &[(&str, &str)], gzip: bool) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, content.as_bytes()).unwrap();
    }
    let tar = builder.into_inner().unwrap();

    if !gzip {
        return tar;
    }

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    io::Write::write_all(&mut encoder, &tar).unwrap();
    encoder.finish().unwrap()
}
