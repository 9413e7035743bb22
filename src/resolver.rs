// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Package dependency resolution.

Computes the transitive closure of an ordered seed set over the
`Pre-Depends` and `Depends` relations of a [PackagesIndex]. Resolution is
deterministic in the input order: clauses already satisfied by an installed
or queued package are skipped, otherwise the first listed alternative is
chosen. Version constraints are ignored; the repository is assumed
internally consistent for a single suite snapshot.
*/

use {
    crate::{error::Result, packages_index::PackagesIndex},
    std::collections::{HashSet, VecDeque},
};

/// Resolves install sets against a `Packages` index.
pub struct PackageResolver<'a> {
    index: &'a PackagesIndex,
}

impl<'a> PackageResolver<'a> {
    /// Construct an instance bound to an index.
    pub fn new(index: &'a PackagesIndex) -> Self {
        Self { index }
    }

    /// Compute the ordered list of installable packages for a seed set.
    ///
    /// The closure is breadth first. Each package's `Pre-Depends` clauses
    /// are examined before its `Depends` clauses, preserving declared order
    /// within each. A clause with an alternative that is already installed
    /// or already queued is satisfied in flight; otherwise its first
    /// alternative is enqueued.
    ///
    /// Names for which no paragraph exists are dropped from the output in a
    /// terminal filter. Such names are virtual (satisfied via `Provides`
    /// only); no substitute is chosen for them.
    pub fn resolve_install_set(
        &self,
        seeds: impl IntoIterator<Item = String>,
    ) -> Result<Vec<String>> {
        let mut installed: Vec<String> = vec![];
        let mut installed_set: HashSet<String> = HashSet::new();

        let mut queue: VecDeque<String> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();

        for seed in seeds {
            if queued.insert(seed.clone()) {
                queue.push_back(seed);
            }
        }

        while let Some(package) = queue.pop_front() {
            queued.remove(&package);

            if installed_set.contains(&package) {
                continue;
            }

            installed_set.insert(package.clone());
            installed.push(package.clone());

            let paragraph = match self.index.get(&package) {
                Some(p) => p,
                // Virtual or unknown names carry no dependencies of their own.
                None => continue,
            };

            let dependency_lists = [paragraph.pre_depends(), paragraph.depends()];

            for list in dependency_lists.into_iter().flatten() {
                for clause in list?.requirements() {
                    let satisfied = clause.iter().any(|alternative| {
                        installed_set.contains(&alternative.package)
                            || queued.contains(&alternative.package)
                    });

                    if satisfied {
                        continue;
                    }

                    if let Some(first) = clause.first() {
                        if queued.insert(first.package.clone()) {
                            queue.push_back(first.package.clone());
                        }
                    }
                }
            }
        }

        installed.retain(|name| self.index.exists(name));

        Ok(installed)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn index(source: &str) -> PackagesIndex {
        PackagesIndex::parse_reader(std::io::Cursor::new(source.to_string())).unwrap()
    }

    fn resolve(source: &str, seeds: &[&str]) -> Vec<String> {
        let index = index(source);
        PackageResolver::new(&index)
            .resolve_install_set(seeds.iter().map(|s| s.to_string()))
            .unwrap()
    }

    #[test]
    fn transitive_closure() {
        let resolved = resolve(
            "Package: a\nDepends: b\n\nPackage: b\nDepends: c\n\nPackage: c\n\nPackage: unrelated\n",
            &["a"],
        );

        assert_eq!(resolved, vec!["a", "b", "c"]);
    }

    #[test]
    fn pre_depends_examined_before_depends() {
        let resolved = resolve(
            "Package: a\nDepends: later\nPre-Depends: earlier\n\nPackage: earlier\n\nPackage: later\n",
            &["a"],
        );

        assert_eq!(resolved, vec!["a", "earlier", "later"]);
    }

    #[test]
    fn first_alternative_preferred() {
        let resolved = resolve(
            "Package: a\nDepends: x | y\n\nPackage: x\n\nPackage: y\n",
            &["a"],
        );

        assert_eq!(resolved, vec!["a", "x"]);
    }

    #[test]
    fn clause_satisfied_by_queued_package() {
        // b is already queued as a seed, so the x | b clause is satisfied in
        // flight and x is never enqueued.
        let resolved = resolve(
            "Package: a\nDepends: x | b\n\nPackage: b\n\nPackage: x\n",
            &["a", "b"],
        );

        assert_eq!(resolved, vec!["a", "b"]);
    }

    #[test]
    fn virtual_only_names_dropped_without_substitute() {
        let resolved = resolve(
            "Package: a\nDepends: awk\n\nPackage: mawk\nProvides: awk\n\nPackage: gawk\nProvides: awk\n",
            &["a"],
        );

        // awk is enqueued (first alternative), then dropped by the terminal
        // filter; neither provider is auto-installed.
        assert_eq!(resolved, vec!["a"]);
    }

    #[test]
    fn multiarch_qualified_dependency_installs_bare_package() {
        let resolved = resolve(
            "Package: a\nDepends: python3:any\n\nPackage: python3\n",
            &["a"],
        );

        assert_eq!(resolved, vec!["a", "python3"]);
    }

    #[test]
    fn self_dependency_terminates() {
        let resolved = resolve("Package: a\nDepends: a\n", &["a"]);

        assert_eq!(resolved, vec!["a"]);
    }

    #[test]
    fn dependency_cycle_terminates() {
        let resolved = resolve(
            "Package: a\nDepends: b\n\nPackage: b\nDepends: a\n",
            &["a"],
        );

        assert_eq!(resolved, vec!["a", "b"]);
    }

    #[test]
    fn seed_order_preserved_and_deduplicated() {
        let resolved = resolve(
            "Package: c\n\nPackage: a\n\nPackage: b\n",
            &["b", "a", "b", "c"],
        );

        assert_eq!(resolved, vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_seed_set_resolves_empty() {
        let resolved = resolve("Package: a\n", &[]);

        assert!(resolved.is_empty());
    }

    #[test]
    fn output_satisfies_every_clause() {
        let source = "\
Package: a
Depends: b | c, d
Pre-Depends: e

Package: b

Package: c

Package: d
Depends: e

Package: e
";
        let index = index(source);
        let resolved = PackageResolver::new(&index)
            .resolve_install_set(vec!["a".to_string()])
            .unwrap();

        let resolved_set = resolved.iter().cloned().collect::<std::collections::HashSet<_>>();

        for name in &resolved {
            let paragraph = index.get(name).unwrap();

            for list in [paragraph.pre_depends(), paragraph.depends()]
                .into_iter()
                .flatten()
            {
                for clause in list.unwrap().requirements() {
                    assert!(
                        clause.iter().any(|alt| resolved_set.contains(&alt.package)
                            || !index.exists(&alt.package)),
                        "unsatisfied clause {} for {}",
                        clause,
                        name
                    );
                }
            }
        }
    }
}
