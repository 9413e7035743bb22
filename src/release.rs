// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! `Release` file primitives.

A `Release` file is the signed manifest of a distribution: a single control
paragraph whose multi-line `SHA256` field lists `<digest> <size> <path>`
entries for every index file in the distribution. The file is only to be
trusted after its detached signature verifies against a provisioned keyring
(see [crate::signatures]).
*/

use {
    crate::{
        control::{ControlParagraph, ControlParagraphReader},
        error::{DebrootError, Result},
        io::ContentDigest,
    },
    std::{collections::HashMap, io::BufRead, str::FromStr},
};

/// An entry for a file in a parsed `Release` file.
///
/// Instances correspond to a line in the `SHA256` field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReleaseFileEntry {
    /// The path to this file within the distribution.
    pub path: String,

    /// The digest of this file.
    pub digest: ContentDigest,

    /// The size of the file in bytes.
    pub size: u64,
}

/// A repository `Release` file.
///
/// Instances are wrappers around a [ControlParagraph] with the `SHA256`
/// entries parsed into a path-keyed map so per-path digest lookups are O(1).
pub struct ReleaseFile {
    paragraph: ControlParagraph<'static>,
    sha256_entries: HashMap<String, ReleaseFileEntry>,
}

impl ReleaseFile {
    /// Construct an instance by reading data from a reader.
    ///
    /// The source must be a control file with exactly 1 paragraph.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let paragraphs = ControlParagraphReader::new(reader).collect::<Result<Vec<_>>>()?;

        if paragraphs.len() != 1 {
            return Err(DebrootError::ReleaseParagraphMismatch(paragraphs.len()));
        }

        let paragraph = paragraphs
            .into_iter()
            .next()
            .expect("validated paragraph count above");

        let mut sha256_entries = HashMap::new();

        if let Some(lines) = paragraph.field_iter_lines("SHA256") {
            for line in lines.filter(|l| !l.is_empty()) {
                let entry = Self::parse_index_entry(line)?;
                sha256_entries.insert(entry.path.clone(), entry);
            }
        }

        Ok(Self {
            paragraph,
            sha256_entries,
        })
    }

    // Entries are of form: <digest> <size> <path>
    fn parse_index_entry(line: &str) -> Result<ReleaseFileEntry> {
        let mut parts = line.split_ascii_whitespace();

        let digest = parts.next().ok_or(DebrootError::ReleaseMissingDigest)?;
        let size = parts.next().ok_or(DebrootError::ReleaseMissingSize)?;
        let path = parts.next().ok_or(DebrootError::ReleaseMissingPath)?;

        if parts.next().is_some() {
            return Err(DebrootError::ReleasePathWithSpaces(line.to_string()));
        }

        Ok(ReleaseFileEntry {
            path: path.to_string(),
            digest: ContentDigest::sha256_hex(digest)?,
            size: u64::from_str(size)?,
        })
    }

    /// Suite of this distribution. e.g. `jammy`.
    pub fn suite(&self) -> Option<&str> {
        self.paragraph.field_str("Suite")
    }

    /// Codename of this distribution.
    pub fn codename(&self) -> Option<&str> {
        self.paragraph.field_str("Codename")
    }

    /// Machine architectures listed by this distribution.
    pub fn architectures(&self) -> Option<impl Iterator<Item = &str>> {
        self.paragraph.field_iter_words("Architectures")
    }

    /// Components listed by this distribution. e.g. `main`.
    pub fn components(&self) -> Option<impl Iterator<Item = &str>> {
        self.paragraph.field_iter_words("Components")
    }

    /// Obtain the expected SHA-256 entry for a distribution-relative path.
    ///
    /// Resolves to [None] if the `SHA256` field is absent or lists no entry
    /// for the path. Callers requiring the path treat that as fatal.
    pub fn sha256_entry(&self, path: &str) -> Option<&ReleaseFileEntry> {
        self.sha256_entries.get(path)
    }

    /// Iterate over all `SHA256` entries.
    pub fn iter_sha256_entries(&self) -> impl Iterator<Item = &ReleaseFileEntry> {
        self.sha256_entries.values()
    }
}

impl AsRef<ControlParagraph<'static>> for ReleaseFile {
    fn as_ref(&self) -> &ControlParagraph<'static> {
        &self.paragraph
    }
}
