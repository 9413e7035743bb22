// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Binary package (`.deb`) access.

A `.deb` file is an `ar` archive with 3 entries:

1. `debian-binary` holding the version of the binary package format.
2. `control.tar[.<ext>]` holding package metadata.
3. `data.tar[.<ext>]` holding file content.

Installation only consumes `data.tar`: its entries are the files to
materialize under the sysroot root. Maintainer scripts in `control.tar` are
never executed.
*/

use {
    crate::{
        archive::{self, Compression},
        error::{DebrootError, Result},
    },
    std::path::Path,
};

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Unpack a `.deb`'s data payload into a sysroot.
///
/// The archive members are extracted into `scratch_dir`, the single
/// `data.tar[.<ext>]` member is located and decompressed, and its contents
/// are tar-extracted into `sysroot`. Unknown archive members and unknown
/// compression extensions are fatal.
pub fn unpack_data_tar(deb_path: &Path, scratch_dir: &Path, sysroot: &Path) -> Result<()> {
    let members = archive::extract_ar(deb_path, scratch_dir)?;

    let mut data_tar = None;

    for member in members {
        let name = basename(&member);

        if name == "debian-binary" {
            continue;
        } else if let Some(tail) = name.strip_prefix("control.tar") {
            // Metadata is not consumed, but the member must still be well formed.
            if Compression::from_deb_tail(tail).is_none() {
                return Err(DebrootError::UnknownCompression(name));
            }
        } else if let Some(tail) = name.strip_prefix("data.tar") {
            match Compression::from_deb_tail(tail) {
                Some(Compression::None) => {
                    data_tar = Some(member);
                }
                Some(_) => {
                    data_tar = Some(archive::decompress_path(&member)?);
                }
                None => {
                    return Err(DebrootError::UnknownCompression(name));
                }
            }
        } else {
            return Err(DebrootError::DebUnknownEntry(name));
        }
    }

    let data_tar = data_tar.ok_or_else(|| DebrootError::DebMissingDataTar(basename(deb_path)))?;

    archive::extract_tar(&data_tar, sysroot)
}
