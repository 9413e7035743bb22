// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Content digest helpers. */

use {
    crate::error::{DebrootError, Result},
    sha2::Digest,
    std::{fmt::Formatter, fs::File, io::Read, path::Path},
};

/// A SHA-256 content digest.
#[derive(Clone, Eq, PartialEq)]
pub struct ContentDigest(Vec<u8>);

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sha256({})", hex::encode(&self.0))
    }
}

impl ContentDigest {
    /// Create a new instance by parsing a hex digest.
    ///
    /// Hex parsing is case insensitive.
    pub fn sha256_hex(digest: &str) -> Result<Self> {
        Ok(Self(hex::decode(digest)?))
    }

    /// Obtain the digest bytes.
    pub fn digest_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Obtain the hex encoded digest.
    pub fn digest_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

/// Compute the SHA-256 digest of a file's content.
pub fn digest_path(path: &Path) -> Result<ContentDigest> {
    let mut fh = File::open(path)?;
    let mut hasher = sha2::Sha256::new();
    let mut buffer = [0u8; 32768];

    loop {
        let count = fh.read(&mut buffer)?;
        if count == 0 {
            break;
        }

        hasher.update(&buffer[0..count]);
    }

    Ok(ContentDigest(hasher.finalize().to_vec()))
}

/// Verify that a file's SHA-256 digest matches an expected digest.
///
/// Errors with a message naming the file on mismatch.
pub fn verify_path_sha256(path: &Path, expected: &ContentDigest) -> Result<()> {
    let got = digest_path(path)?;

    if got == *expected {
        Ok(())
    } else {
        Err(DebrootError::DigestMismatch {
            path: path
                .file_name()
                .map(|x| x.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            expected: expected.digest_hex(),
            got: got.digest_hex(),
        })
    }
}
