// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Sysroot bootstrapping orchestration.

Drives the full pipeline: provision the trust anchor, fetch and verify the
signed `Release`, fetch the SHA-256 verified `Packages` index, resolve the
install closure, materialize every package into the target tree, and
relocate absolute symlinks.

Everything is sequential and blocking. The orchestrator consumes an
immutable [BootstrapRequest] assembled by the caller and reports progress
through typed [BootstrapEvent] values.
*/

use {
    crate::{
        archive, deb,
        error::{DebrootError, Result},
        io::{self, ContentDigest},
        keyring,
        packages_index::PackagesIndex,
        relocate,
        release::ReleaseFile,
        resolver::PackageResolver,
        signatures::{self, Keyring},
        transport::HttpFetcher,
    },
    std::{fs::File, io::BufReader, path::PathBuf},
};

/// Base URL of the primary archive, serving `amd64` and `i386`.
const PRIMARY_ARCHIVE: &str = "http://archive.ubuntu.com/ubuntu";

/// Base URL of the ports archive, serving all other architectures.
const PORTS_ARCHIVE: &str = "http://ports.ubuntu.com/ubuntu-ports";

/// Obtain the mirror base URL serving a given architecture.
pub fn mirror_for_architecture(architecture: &str) -> &'static str {
    match architecture {
        "amd64" | "i386" => PRIMARY_ARCHIVE,
        _ => PORTS_ARCHIVE,
    }
}

/// Represents a bootstrapping progress event.
pub enum BootstrapEvent {
    /// The keyring for the named suite is being provisioned.
    ProvisioningKeyring(String),

    /// The `Release` file at the given URL verified against the keyring.
    ReleaseVerified(String),

    /// The `Packages` index at the given distribution-relative path matched
    /// its recorded digest.
    PackagesVerified(String),

    /// The install closure was resolved to this many packages.
    ResolvedPackages(usize),

    /// The seed set is empty; the target is left untouched.
    NothingToInstall,

    /// A package's `.deb` was fetched and its digest matched.
    PackageFetched(String),

    /// A package's data payload was unpacked into the target.
    PackageUnpacked(String),

    /// This many absolute symlinks were rewritten to relative form.
    RelocatedLinks(usize),
}

impl std::fmt::Display for BootstrapEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProvisioningKeyring(suite) => {
                write!(f, "provisioning signing keyring for {}", suite)
            }
            Self::ReleaseVerified(url) => write!(f, "verified Release signature for {}", url),
            Self::PackagesVerified(path) => write!(f, "verified digest of {}", path),
            Self::ResolvedPackages(count) => write!(f, "resolved {} packages to install", count),
            Self::NothingToInstall => write!(f, "nothing to install"),
            Self::PackageFetched(name) => write!(f, "fetched {}", name),
            Self::PackageUnpacked(name) => write!(f, "unpacked {}", name),
            Self::RelocatedLinks(count) => write!(f, "rewrote {} absolute symlinks", count),
        }
    }
}

/// Callback invoked with progress events.
pub type BootstrapEventCallback = Box<dyn Fn(BootstrapEvent)>;

/// A validated request to bootstrap a sysroot.
///
/// Instances are assembled by the caller (typically from CLI arguments) and
/// passed to [Bootstrapper] whole; the orchestrator holds no other state.
#[derive(Clone, Debug)]
pub struct BootstrapRequest {
    /// Distribution release to install from. e.g. `jammy`.
    pub suite: String,

    /// Debian machine architecture to install for. e.g. `amd64`.
    pub architecture: String,

    /// Directory to populate. Created if absent.
    pub target: PathBuf,

    /// Scratch directory owned by this run.
    pub scratch: PathBuf,

    /// Additional seed packages beyond the `Priority: required` set.
    pub includes: Vec<String>,

    /// Whether to omit the `Priority: required` set from the seeds.
    pub exclude_required: bool,
}

/// Executes a [BootstrapRequest].
pub struct Bootstrapper {
    request: BootstrapRequest,
    fetcher: HttpFetcher,
    mirror: &'static str,
}

impl Bootstrapper {
    /// Construct an instance for a request.
    pub fn new(request: BootstrapRequest) -> Result<Self> {
        let fetcher = HttpFetcher::new(request.scratch.clone())?;
        let mirror = mirror_for_architecture(&request.architecture);

        Ok(Self {
            request,
            fetcher,
            mirror,
        })
    }

    /// The mirror base URL this request installs from.
    pub fn mirror(&self) -> &'static str {
        self.mirror
    }

    /// Run the pipeline to completion.
    pub fn run(&self, cb: &Option<BootstrapEventCallback>) -> Result<()> {
        let emit = |event: BootstrapEvent| {
            if let Some(cb) = cb {
                cb(event);
            }
        };

        // The trust anchor comes first. An unknown suite fails here, before
        // any repository I/O.
        emit(BootstrapEvent::ProvisioningKeyring(self.request.suite.clone()));
        let keyring_path = keyring::provision(&self.request.suite, &self.fetcher)?;
        let keyring = Keyring::load(&keyring_path)?;

        let release = self.fetch_release(&keyring, &emit)?;
        let index = self.fetch_packages_index(&release, &emit)?;

        let seeds = self.seed_packages(&index)?;

        if seeds.is_empty() {
            emit(BootstrapEvent::NothingToInstall);
            return Ok(());
        }

        let resolved = PackageResolver::new(&index).resolve_install_set(seeds)?;
        emit(BootstrapEvent::ResolvedPackages(resolved.len()));

        std::fs::create_dir_all(&self.request.target)?;

        for name in &resolved {
            self.install_package(&index, name, &emit)?;
        }

        let rewritten = relocate::relink_absolute_symlinks(&self.request.target)?;
        emit(BootstrapEvent::RelocatedLinks(rewritten));

        Ok(())
    }

    fn dists_url(&self) -> String {
        format!("{}/dists/{}", self.mirror, self.request.suite)
    }

    fn fetch_release(
        &self,
        keyring: &Keyring,
        emit: &impl Fn(BootstrapEvent),
    ) -> Result<ReleaseFile> {
        let release_url = format!("{}/Release", self.dists_url());

        let release_path = self.fetcher.fetch_str(&release_url)?;
        let signature_path = self.fetcher.fetch_str(&format!("{}.gpg", release_url))?;

        signatures::verify_detached(&release_path, &signature_path, keyring)?;
        emit(BootstrapEvent::ReleaseVerified(release_url));

        let release = ReleaseFile::from_reader(BufReader::new(File::open(&release_path)?))?;

        // A Release that does not list our architecture cannot serve it.
        if let Some(mut architectures) = release.architectures() {
            if !architectures.any(|a| a == self.request.architecture) {
                return Err(DebrootError::UnknownArchitecture(
                    self.request.architecture.clone(),
                ));
            }
        }

        Ok(release)
    }

    fn fetch_packages_index(
        &self,
        release: &ReleaseFile,
        emit: &impl Fn(BootstrapEvent),
    ) -> Result<PackagesIndex> {
        let relative_path = format!("main/binary-{}/Packages.gz", self.request.architecture);

        let expected = release
            .sha256_entry(&relative_path)
            .ok_or_else(|| DebrootError::ReleaseEntryNotFound(relative_path.clone()))?;

        let compressed_path = self
            .fetcher
            .fetch_str(&format!("{}/{}", self.dists_url(), relative_path))?;

        io::verify_path_sha256(&compressed_path, &expected.digest)?;
        emit(BootstrapEvent::PackagesVerified(relative_path));

        let index_path = archive::decompress_path(&compressed_path)?;

        PackagesIndex::parse_reader(BufReader::new(File::open(&index_path)?))
    }

    fn seed_packages(&self, index: &PackagesIndex) -> Result<Vec<String>> {
        let mut seeds = vec![];

        if !self.request.exclude_required {
            seeds.extend(index.required_packages().map(|name| name.to_string()));
        }

        for name in &self.request.includes {
            if !index.exists(name) {
                return Err(DebrootError::UnknownPackage(name.clone()));
            }

            seeds.push(name.clone());
        }

        Ok(seeds)
    }

    fn install_package(
        &self,
        index: &PackagesIndex,
        name: &str,
        emit: &impl Fn(BootstrapEvent),
    ) -> Result<()> {
        let paragraph = index
            .get(name)
            .ok_or_else(|| DebrootError::UnknownPackage(name.to_string()))?;

        let filename = paragraph.filename()?;
        let expected = ContentDigest::sha256_hex(paragraph.sha256()?)?;

        let deb_path = self
            .fetcher
            .fetch_str(&format!("{}/{}", self.mirror, filename))?;

        io::verify_path_sha256(&deb_path, &expected)?;
        emit(BootstrapEvent::PackageFetched(name.to_string()));

        let unpack_dir = self.request.scratch.join("unpack").join(name);
        deb::unpack_data_tar(&deb_path, &unpack_dir, &self.request.target)?;
        emit(BootstrapEvent::PackageUnpacked(name.to_string()));

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mirror_selection() {
        assert_eq!(mirror_for_architecture("amd64"), PRIMARY_ARCHIVE);
        assert_eq!(mirror_for_architecture("i386"), PRIMARY_ARCHIVE);
        assert_eq!(mirror_for_architecture("arm64"), PORTS_ARCHIVE);
        assert_eq!(mirror_for_architecture("riscv64"), PORTS_ARCHIVE);
    }

    #[test]
    fn unknown_suite_fails_before_network_io() -> Result<()> {
        let td = tempfile::tempdir()?;

        let request = BootstrapRequest {
            suite: "nonesuch".to_string(),
            architecture: "amd64".to_string(),
            target: td.path().join("root"),
            scratch: td.path().join("scratch"),
            includes: vec![],
            exclude_required: false,
        };

        let err = Bootstrapper::new(request)?.run(&None).unwrap_err();
        assert!(matches!(err, DebrootError::UnknownSuite(_)));
        assert!(err.to_string().contains("nonesuch"));

        // The target was not created.
        assert!(!td.path().join("root").exists());

        Ok(())
    }

    #[test]
    fn event_messages_name_artifacts() {
        assert_eq!(
            BootstrapEvent::ProvisioningKeyring("jammy".to_string()).to_string(),
            "provisioning signing keyring for jammy"
        );
        assert_eq!(
            BootstrapEvent::PackageFetched("base-files".to_string()).to_string(),
            "fetched base-files"
        );
        assert_eq!(
            BootstrapEvent::ResolvedPackages(3).to_string(),
            "resolved 3 packages to install"
        );
    }
}
