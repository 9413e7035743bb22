// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Minimal sysroot bootstrapping from Debian-flavored package repositories.

This crate builds a minimal, usable filesystem tree populated with packages
from a Debian/Ubuntu-style binary package repository, suitable for use as a
cross-compilation sysroot or chroot base. The pipeline is: establish a chain
of trust from a governance-published signing keyring through the signed
`Release` index to a SHA-256 verified `Packages` index; compute the
transitive closure of requested packages; fetch, verify, and unpack each
package; and rewrite absolute symlinks into relative form so the produced
tree is relocatable.

# A Tour of Functionality

Repository indices are *control files*. The [control] module defines the
low-level primitives: [control::ControlParagraph] represents a stanza of
`Field: value` lines and [control::ControlParagraphReader] is a streaming
stanza reader.

The [release] module wraps the distribution's signed manifest:
[release::ReleaseFile] exposes the `SHA256` index entries that anchor every
subsequent download. The [packages_index] module indexes the per-architecture
package catalog: [packages_index::PackagesIndex] maps package names to
stanzas and recognizes virtual (Provides-only) names.

There is a meta language for expressing dependencies between packages. The
[dependency] module parses it: [dependency::DependencyList] represents a
parsed list of clauses like `gawk (>= 1:3.0) | mawk, libc6`. Version
constraints and architecture qualifiers are recognized and discarded. The
[resolver] module computes install closures over an index:
[resolver::PackageResolver] implements a deterministic breadth-first walk
with first-alternative preference.

Artifact handling lives in [archive] (compression codecs, `ar` and tar
extraction) and [deb] (locating and unpacking the `data.tar` payload of a
binary package). Content integrity is in [io] (SHA-256 digests) and
[signatures] (OpenPGP keyrings and detached signature verification). The
[keyring] module provisions the per-suite trust anchor from its out-of-band
source, and [transport] downloads URLs into a scratch tree.

The [sysroot] module orchestrates everything:
[sysroot::BootstrapRequest] describes a run and [sysroot::Bootstrapper]
executes it, reporting progress through [sysroot::BootstrapEvent] values.

# Error Handling

All fallible operations return [error::Result]. Every error is fatal to the
run and identifies the offending artifact by URL, file basename, or package
name.
*/

pub mod archive;
pub mod control;
pub mod deb;
pub mod dependency;
pub mod error;
pub mod io;
pub mod keyring;
pub mod packages_index;
pub mod relocate;
pub mod release;
pub mod resolver;
pub mod signatures;
pub mod sysroot;
pub mod transport;
