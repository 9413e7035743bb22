// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Archive and compression codecs.

Everything the pipeline unpacks is one of three container formats: a
compressed byte stream (repository indices), an `ar` archive (`.deb` files),
or a POSIX tar stream (`data.tar` members). Compression dispatch is by
filename extension; an unrecognized extension is a fatal error.
*/

use {
    crate::error::{DebrootError, Result},
    std::{
        fs::File,
        io::Read,
        path::{Path, PathBuf},
    },
};

/// Compression format used by repository files.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Compression {
    /// No compression (no extension).
    None,

    /// Gzip compression (.gz extension).
    Gzip,

    /// XZ compression (.xz extension).
    Xz,

    /// Bzip2 compression (.bz2 extension).
    Bzip2,

    /// Zstandard compression (.zst extension).
    Zstd,
}

impl Compression {
    /// Filename extension for files compressed in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => ".gz",
            Self::Xz => ".xz",
            Self::Bzip2 => ".bz2",
            Self::Zstd => ".zst",
        }
    }

    /// Resolve the format from the tail of a `.deb` member name.
    ///
    /// The tail is what follows `data.tar` or `control.tar` in the member
    /// identifier. An empty tail denotes an uncompressed tar.
    pub fn from_deb_tail(tail: &str) -> Option<Self> {
        match tail {
            "" => Some(Self::None),
            ".gz" => Some(Self::Gzip),
            ".xz" => Some(Self::Xz),
            ".bz2" => Some(Self::Bzip2),
            ".zst" => Some(Self::Zstd),
            _ => None,
        }
    }
}

/// Wrap a reader with transparent decompression.
pub fn decompress_reader<R: Read + 'static>(
    compression: Compression,
    reader: R,
) -> Result<Box<dyn Read>> {
    Ok(match compression {
        Compression::None => Box::new(reader),
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
        Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
        Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
    })
}

/// Decompress a file in place, removing its compression suffix.
///
/// `Packages.gz` becomes `Packages`; `data.tar.xz` becomes `data.tar`. The
/// compressed original is removed. An unrecognized extension is fatal.
pub fn decompress_path(path: &Path) -> Result<PathBuf> {
    let compression = match path.extension().and_then(|x| x.to_str()) {
        Some("gz") => Compression::Gzip,
        Some("xz") => Compression::Xz,
        Some("bz2") => Compression::Bzip2,
        Some("zst") => Compression::Zstd,
        _ => {
            return Err(DebrootError::UnknownCompression(
                path.file_name()
                    .map(|x| x.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string()),
            ));
        }
    };

    let dest_path = path.with_extension("");

    {
        let mut reader = decompress_reader(compression, File::open(path)?)?;
        let mut writer = File::create(&dest_path)?;
        std::io::copy(&mut reader, &mut writer)?;
    }

    std::fs::remove_file(path)?;

    Ok(dest_path)
}

/// Extract all members of an `ar` archive into a directory.
///
/// Member identifiers are normalized by trimming the trailing `/` emitted by
/// System V style archivers (dpkg among them). Returns the extracted paths
/// in archive order.
pub fn extract_ar(archive_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dest_dir)?;

    let mut archive = ar::Archive::new(File::open(archive_path)?);
    let mut extracted = vec![];

    while let Some(entry) = archive.next_entry() {
        let mut entry = entry?;

        // Identifiers should be ASCII. Converting to strings is reasonably safe.
        let identifier = String::from_utf8_lossy(entry.header().identifier()).to_string();
        let identifier = identifier.trim_end_matches('/');

        let dest_path = dest_dir.join(identifier);
        let mut writer = File::create(&dest_path)?;
        std::io::copy(&mut entry, &mut writer)?;

        extracted.push(dest_path);
    }

    Ok(extracted)
}

/// Extract a tar archive into a directory.
///
/// File modes are preserved. Ownership mapping is best effort: entries are
/// not chowned, since that requires privilege. Symbolic links are recreated
/// with their recorded targets verbatim.
pub fn extract_tar(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(File::open(archive_path)?);
    archive.set_preserve_permissions(true);
    archive.unpack(dest_dir)?;

    Ok(())
}
