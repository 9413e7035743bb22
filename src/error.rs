// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
///
/// Every variant identifies the offending artifact (URL, file basename, or
/// package name) so callers can surface actionable messages.
#[derive(Debug, Error)]
pub enum DebrootError {
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0:?}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0:?}")]
    Http(#[from] reqwest::Error),

    #[error("hex parsing error: {0:?}")]
    Hex(#[from] hex::FromHexError),

    #[error("PGP error: {0:?}")]
    Pgp(#[from] pgp::errors::Error),

    #[error("integer parsing error: {0:?}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("directory walk error: {0:?}")]
    Walkdir(#[from] walkdir::Error),

    #[error("control file parse error: {0}")]
    ControlParseError(String),

    #[error("required control field missing: {0}")]
    ControlRequiredFieldMissing(&'static str),

    #[error("expected 1 paragraph in Release file; got {0}")]
    ReleaseParagraphMismatch(usize),

    #[error("digest missing from Release index entry")]
    ReleaseMissingDigest,

    #[error("size missing from Release index entry")]
    ReleaseMissingSize,

    #[error("path missing from Release index entry")]
    ReleaseMissingPath,

    #[error("Release index entry path unexpectedly has spaces: {0}")]
    ReleasePathWithSpaces(String),

    #[error("no SHA256 entry in Release file for {0}")]
    ReleaseEntryNotFound(String),

    #[error("failed to parse dependency expression: {0}")]
    DependencyParse(String),

    #[error("unknown suite: {0}")]
    UnknownSuite(String),

    #[error("unknown architecture: {0}")]
    UnknownArchitecture(String),

    #[error("unknown package: {0}")]
    UnknownPackage(String),

    #[error("unknown compression in {0}")]
    UnknownCompression(String),

    #[error("unknown entry in binary package archive: {0}")]
    DebUnknownEntry(String),

    #[error("no data.tar member in binary package: {0}")]
    DebMissingDataTar(String),

    #[error("SHA-256 mismatch for {path}: expected {expected}, got {got}")]
    DigestMismatch {
        path: String,
        expected: String,
        got: String,
    },

    #[error("no usable PGP public keys in keyring: {0}")]
    KeyringEmpty(String),

    #[error("keyring member {member} not found in {archive}")]
    KeyringMemberNotFound { archive: String, member: String },

    #[error("signature verification failed for {0}")]
    SignatureInvalid(String),
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, DebrootError>;
