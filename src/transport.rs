// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! HTTP fetching.

The pipeline downloads everything it consumes into a scratch directory,
preserving the `<host>/<path>` layout of the source URL so concurrent
artifacts from different hosts cannot collide. There is no caching across
runs and no retry policy: transport-level failures surface verbatim and are
fatal at the call site.
*/

use {
    crate::error::Result,
    reqwest::blocking::Client,
    std::{
        fs::File,
        path::{Path, PathBuf},
    },
    url::Url,
};

/// Downloads URLs into a scratch directory.
///
/// Instances are bound to a scratch root owned by the current run. Redirects
/// are followed; any non-success HTTP status is an error.
pub struct HttpFetcher {
    client: Client,
    scratch_root: PathBuf,
}

impl HttpFetcher {
    /// Construct an instance writing beneath the given scratch root.
    pub fn new(scratch_root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            scratch_root: scratch_root.into(),
        })
    }

    /// The local path a URL maps to beneath the scratch root.
    ///
    /// `http://archive.ubuntu.com/ubuntu/dists/jammy/Release` maps to
    /// `<scratch>/archive.ubuntu.com/ubuntu/dists/jammy/Release`.
    pub fn local_path(&self, url: &Url) -> PathBuf {
        let mut path = self.scratch_root.clone();

        if let Some(host) = url.host_str() {
            path.push(host);
        }

        path.join(url.path().trim_start_matches('/'))
    }

    /// Download a URL, returning the local path of the fetched file.
    ///
    /// Parent directories are created on demand.
    pub fn fetch(&self, url: &Url) -> Result<PathBuf> {
        let dest_path = self.local_path(url);

        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut response = self.client.get(url.clone()).send()?.error_for_status()?;

        let mut fh = File::create(&dest_path)?;
        response.copy_to(&mut fh)?;

        Ok(dest_path)
    }

    /// Convenience wrapper to fetch a string URL.
    pub fn fetch_str(&self, url: &str) -> Result<PathBuf> {
        self.fetch(&Url::parse(url)?)
    }

    /// The scratch root this fetcher writes beneath.
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }
}
