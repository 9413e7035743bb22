// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Keyring provisioning.

The trust anchor for a suite must not come from the repository it verifies.
Each supported suite maps to a snapshot of the `ubuntu-keyring` source
package published by Launchpad (the distribution's governance service); the
provisioner fetches that snapshot tarball and extracts exactly the archive
keyring file nominated for the suite.

Suites without a table entry are a fatal error, raised before any network
I/O happens.
*/

use {
    crate::{
        archive,
        error::{DebrootError, Result},
        transport::HttpFetcher,
    },
    std::{fs::File, path::PathBuf},
};

/// Where a suite's archive keyring comes from.
#[derive(Clone, Copy, Debug)]
pub struct KeyringSource {
    /// URL of the keyring source snapshot archive (gzip compressed tar).
    pub snapshot_url: &'static str,

    /// Path of the keyring file within the snapshot archive.
    pub member: &'static str,
}

/// Obtain the keyring source for a suite.
///
/// Resolves to [None] for suites without a built-in table entry.
pub fn keyring_source(suite: &str) -> Option<KeyringSource> {
    match suite {
        "focal" => Some(KeyringSource {
            snapshot_url: "https://git.launchpad.net/ubuntu/+source/ubuntu-keyring/snapshot/ubuntu-keyring-2018.09.18.1.tar.gz",
            member: "ubuntu-keyring-2018.09.18.1/keyrings/ubuntu-archive-keyring.gpg",
        }),
        "jammy" => Some(KeyringSource {
            snapshot_url: "https://git.launchpad.net/ubuntu/+source/ubuntu-keyring/snapshot/ubuntu-keyring-2021.03.26.tar.gz",
            member: "ubuntu-keyring-2021.03.26/keyrings/ubuntu-archive-keyring.gpg",
        }),
        "noble" => Some(KeyringSource {
            snapshot_url: "https://git.launchpad.net/ubuntu/+source/ubuntu-keyring/snapshot/ubuntu-keyring-2023.11.28.1.tar.gz",
            member: "ubuntu-keyring-2023.11.28.1/keyrings/ubuntu-archive-keyring.gpg",
        }),
        _ => None,
    }
}

/// Provision the archive keyring for a suite.
///
/// Fetches the suite's keyring source snapshot, decompresses it, and
/// extracts the nominated keyring file next to the snapshot in the scratch
/// tree. Returns the local path of the keyring file.
pub fn provision(suite: &str, fetcher: &HttpFetcher) -> Result<PathBuf> {
    let source = keyring_source(suite).ok_or_else(|| DebrootError::UnknownSuite(suite.to_string()))?;

    let snapshot_path = fetcher.fetch_str(source.snapshot_url)?;
    let tar_path = archive::decompress_path(&snapshot_path)?;

    let member_name = source
        .member
        .rsplit('/')
        .next()
        .expect("keyring member paths have a basename");
    let dest_path = tar_path.with_file_name(member_name);

    let mut found = false;

    let mut tar = tar::Archive::new(File::open(&tar_path)?);
    for entry in tar.entries()? {
        let mut entry = entry?;

        if entry.path()?.as_ref() == std::path::Path::new(source.member) {
            entry.unpack(&dest_path)?;
            found = true;
            break;
        }
    }

    if !found {
        return Err(DebrootError::KeyringMemberNotFound {
            archive: source.snapshot_url.to_string(),
            member: source.member.to_string(),
        });
    }

    Ok(dest_path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_suites_have_sources() {
        for suite in ["focal", "jammy", "noble"] {
            let source = keyring_source(suite).unwrap();
            assert!(source.snapshot_url.ends_with(".tar.gz"));
            assert!(source.member.ends_with("ubuntu-archive-keyring.gpg"));
        }
    }

    #[test]
    fn unknown_suite_has_no_source() {
        assert!(keyring_source("nonesuch").is_none());
        assert!(keyring_source("").is_none());
    }
}
