// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! `Packages` index handling.

A `Packages` file is the per-architecture catalog of binary packages in a
repository: one control paragraph per package, keyed by the `Package` field.
[PackagesIndex] parses the catalog once into an in-memory structure so that
name lookups, `Priority: required` enumeration, and virtual-name checks are
constant time instead of per-lookup document scans.
*/

use {
    crate::{
        control::{ControlParagraph, ControlParagraphReader},
        dependency::DependencyList,
        error::{DebrootError, Result},
    },
    std::{
        collections::{HashMap, HashSet},
        io::BufRead,
        ops::{Deref, DerefMut},
    },
};

/// A single package's paragraph from a `Packages` index.
///
/// This is a low-level wrapper around an inner [ControlParagraph]. [Deref]
/// and [DerefMut] can be used to operate on the inner paragraph. Fields the
/// install pipeline cannot proceed without have getters that return [Result]
/// and error if the field is not present; other fields return [Option].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PackageParagraph {
    paragraph: ControlParagraph<'static>,
}

impl Deref for PackageParagraph {
    type Target = ControlParagraph<'static>;

    fn deref(&self) -> &Self::Target {
        &self.paragraph
    }
}

impl DerefMut for PackageParagraph {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.paragraph
    }
}

impl From<ControlParagraph<'static>> for PackageParagraph {
    fn from(paragraph: ControlParagraph<'static>) -> Self {
        Self { paragraph }
    }
}

impl PackageParagraph {
    fn required_field_str(&self, name: &'static str) -> Result<&str> {
        self.field_str(name)
            .ok_or(DebrootError::ControlRequiredFieldMissing(name))
    }

    /// The `Package` field value.
    pub fn package(&self) -> Result<&str> {
        self.required_field_str("Package")
    }

    /// The `Priority` field.
    pub fn priority(&self) -> Option<&str> {
        self.field_str("Priority")
    }

    /// The `Filename` field: the repository-relative path of the `.deb`.
    pub fn filename(&self) -> Result<&str> {
        self.required_field_str("Filename")
    }

    /// The `SHA256` field: hex digest of the `.deb`.
    pub fn sha256(&self) -> Result<&str> {
        self.required_field_str("SHA256")
    }

    /// The `Depends` field, parsed to a [DependencyList].
    pub fn depends(&self) -> Option<Result<DependencyList>> {
        self.field_dependency_list("Depends")
    }

    /// The `Pre-Depends` field, parsed to a [DependencyList].
    pub fn pre_depends(&self) -> Option<Result<DependencyList>> {
        self.field_dependency_list("Pre-Depends")
    }

    /// The `Provides` field, parsed to a [DependencyList].
    pub fn provides(&self) -> Option<Result<DependencyList>> {
        self.field_dependency_list("Provides")
    }

    fn field_dependency_list(&self, name: &str) -> Option<Result<DependencyList>> {
        self.field_str(name).map(DependencyList::parse)
    }
}

/// An indexed `Packages` file.
///
/// Paragraphs are stored in document order. When multiple paragraphs share a
/// `Package` name, name lookups resolve to the last occurrence (latest in
/// index wins) while enumeration visits each name once, at its first
/// position.
#[derive(Clone, Debug, Default)]
pub struct PackagesIndex {
    packages: Vec<PackageParagraph>,

    /// Map of package name to position in `packages`.
    by_name: HashMap<String, usize>,

    /// Names appearing in some paragraph's `Provides` field.
    provided_names: HashSet<String>,
}

impl PackagesIndex {
    /// Construct an instance by parsing `Packages` data from a reader.
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut slf = Self::default();

        for paragraph in ControlParagraphReader::new(reader) {
            slf.push(PackageParagraph::from(paragraph?))?;
        }

        Ok(slf)
    }

    fn push(&mut self, package: PackageParagraph) -> Result<()> {
        let name = package.package()?.to_string();

        if let Some(provides) = package.provides() {
            for clause in provides?.requirements() {
                for dep in clause.iter() {
                    self.provided_names.insert(dep.package.clone());
                }
            }
        }

        self.by_name.insert(name, self.packages.len());
        self.packages.push(package);

        Ok(())
    }

    /// Number of paragraphs in the index.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the index has no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Whether a paragraph with `Package: name` exists.
    pub fn exists(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Obtain the paragraph for a given package name.
    pub fn get(&self, name: &str) -> Option<&PackageParagraph> {
        self.by_name.get(name).map(|index| &self.packages[*index])
    }

    /// Whether a name is provided by some package in the index.
    ///
    /// A *virtual* package is a name that is provided but has no paragraph of
    /// its own.
    pub fn is_provided(&self, name: &str) -> bool {
        self.provided_names.contains(name)
    }

    /// Enumerate names of packages whose `Priority` field is `required`.
    ///
    /// Names are emitted in document order, each at most once.
    pub fn required_packages(&self) -> impl Iterator<Item = &str> {
        let mut seen = HashSet::new();

        self.packages.iter().filter_map(move |p| {
            let name = p.field_str("Package")?;

            if p.priority() == Some("required") && seen.insert(name) {
                Some(name)
            } else {
                None
            }
        })
    }

    /// Iterate over all paragraphs in document order.
    pub fn iter_packages(&self) -> impl Iterator<Item = &PackageParagraph> {
        self.packages.iter()
    }
}
