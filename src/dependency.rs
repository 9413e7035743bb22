// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Package dependency expression handling.

A dependency expression is a comma-delimited list of *clauses*. Each clause
is a `|`-delimited list of *alternatives*, any one of which satisfies the
clause. An alternative is a package name, optionally followed by a
parenthesized version constraint and/or a bracketed architecture restriction.

Version constraints and architecture restrictions are recognized by the
grammar and then discarded: resolution operates on names only, with the
repository assumed internally consistent for a single suite snapshot.

See <https://www.debian.org/doc/debian-policy/ch-relationships.html> for the
specification of the syntax.
*/

use {
    crate::error::{DebrootError, Result},
    once_cell::sync::Lazy,
    regex::Regex,
    std::{
        fmt::{Display, Formatter},
        ops::{Deref, DerefMut},
    },
};

/// Regular expression to parse a single dependency expression.
static RE_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        # Package name is alphanumeric, terminating at whitespace, [ or (
        ^(?P<package>[^\s\[(]+)
        \s*
        # Optional parenthesized version constraint. The content is discarded.
        (?:\(
            [^)]*
        \))?
        \s*
        # Optional bracketed architecture restriction. Also discarded.
        (?:\[
            [^\]]*
        \])?
        "#,
    )
    .unwrap()
});

/// A single alternative within a dependency clause.
///
/// Only the package name survives parsing; version and architecture
/// qualifiers are stripped.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SingleDependency {
    /// Package the dependency is on.
    pub package: String,
}

impl Display for SingleDependency {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.package)
    }
}

impl SingleDependency {
    /// Parse a single dependency expression into a [SingleDependency].
    pub fn parse(s: &str) -> Result<Self> {
        let caps = RE_DEPENDENCY
            .captures(s)
            .ok_or_else(|| DebrootError::DependencyParse(s.to_string()))?;

        // A name may carry a `:`-suffixed multiarch qualifier (`python3:any`,
        // `libc6:amd64`). Index stanzas are keyed by bare name, so the
        // qualifier is stripped like the other restrictions.
        let package = caps["package"]
            .split(':')
            .next()
            .ok_or_else(|| DebrootError::DependencyParse(s.to_string()))?
            .to_string();

        if package.is_empty() {
            return Err(DebrootError::DependencyParse(s.to_string()));
        }

        Ok(Self { package })
    }
}

/// An ordered set of alternatives satisfying a single dependency clause.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DependencyVariants(Vec<SingleDependency>);

impl Display for DependencyVariants {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(" | ")
        )
    }
}

impl Deref for DependencyVariants {
    type Target = Vec<SingleDependency>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DependencyVariants {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl DependencyVariants {
    /// Whether any alternative names the given package.
    pub fn names_package(&self, package: &str) -> bool {
        self.0.iter().any(|dep| dep.package == package)
    }
}

/// Represents an ordered list of dependency clauses, delimited by commas.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DependencyList {
    clauses: Vec<DependencyVariants>,
}

impl Display for DependencyList {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.clauses
                .iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl DependencyList {
    /// Parse a dependency list from a string.
    ///
    /// A dependency list is a comma-delimited list of clauses. Each clause is
    /// a `|`-delimited list of expressions of the form
    /// `package (constraint) [arch]`. Whitespace between tokens is
    /// insignificant. An empty input yields an empty list.
    pub fn parse(s: &str) -> Result<Self> {
        let mut clauses = vec![];

        for el in s.split(',') {
            // Interior whitespace doesn't matter.
            let el = el.trim();

            if el.is_empty() {
                continue;
            }

            // Each clause consists of alternatives split by |.
            let mut variants = DependencyVariants::default();

            for alt in el.split('|') {
                let alt = alt.trim();

                variants.push(SingleDependency::parse(alt)?);
            }

            clauses.push(variants);
        }

        Ok(Self { clauses })
    }

    /// Obtain the individual clauses constituting this list.
    ///
    /// Each clause is itself a set of alternatives. The length of the set is
    /// commonly 1.
    pub fn requirements(&self) -> impl Iterator<Item = &DependencyVariants> {
        self.clauses.iter()
    }
}
