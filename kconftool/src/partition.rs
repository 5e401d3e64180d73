//! Section partitioning.
//!
//! Every section of the tree is either the head of a fragment or folded into
//! its parent's fragment. Which sections become heads depends on the mode;
//! each assignment then lands in the fragment of the nearest head above its
//! declaring section. The root is always a head and owns the remainder.

use std::{collections::HashSet, num::NonZeroUsize};

use indexmap::{IndexMap, map::Entry};
use ktree::{SectionId, SymbolId, Tree, Value};

use crate::{
    assignment::{Assignment, Fragment},
    error::{Diagnostic, Unresolved, UnresolvedReason},
};

/// How to group assignments into fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionMode {
    /// One fragment per requested section path, matched by longest prefix.
    Sections(Vec<String>),
    /// Fragments of at most this many symbols where the tree allows it.
    MaxSymbols(NonZeroUsize),
}

/// Outcome of [`partition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Non-empty fragments followed, if empty, by the remainder.
    pub fragments: Vec<Fragment>,
    /// Unknown symbols and unsplittable fragments.
    pub diagnostics: Vec<Diagnostic>,
}

impl Partition {
    /// The catch-all fragment.
    pub fn remainder(&self) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.is_remainder())
    }
}

/// Group `assignments` into fragments following the section tree.
///
/// Later assignments to the same symbol replace earlier ones. Symbols missing
/// from the tree are kept, at the end of the remainder.
pub fn partition(tree: &Tree, assignments: &[Assignment], mode: &PartitionMode) -> Partition {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    let mut latest: IndexMap<&str, &Value> = IndexMap::new();
    for assignment in assignments {
        latest.insert(assignment.symbol.as_str(), &assignment.value);
    }
    let mut known: Vec<(SymbolId, &Value)> = Vec::new();
    let mut unknown: Vec<Assignment> = Vec::new();
    for (name, value) in latest {
        match tree.lookup(name) {
            Some(id) => known.push((id, value)),
            None => {
                diagnostics.push(Unresolved::new(name, UnresolvedReason::Unknown).into());
                unknown.push(Assignment::new(name, value.clone()));
            }
        }
    }
    known.sort_by_key(|(id, _)| *id);

    let heads = match mode {
        PartitionMode::Sections(names) => section_heads(tree, names),
        PartitionMode::MaxSymbols(bound) => bounded_heads(tree, &known, bound.get()),
    };
    let bucket_of = buckets(tree, &heads);

    let mut fragments: IndexMap<SectionId, Fragment> = IndexMap::new();
    for (id, value) in known {
        let symbol = tree.symbol(id);
        let head = bucket_of[symbol.section.index()];
        let fragment = match fragments.entry(head) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(new_fragment(tree, head)),
        };
        fragment
            .assignments
            .push(Assignment::new(&symbol.name, value.clone()));
    }

    let root = tree.root_section();
    let remainder = fragments
        .entry(root)
        .or_insert_with(|| new_fragment(tree, root));
    remainder.assignments.extend(unknown);

    if let PartitionMode::MaxSymbols(bound) = mode {
        for fragment in fragments.values() {
            if fragment.len() > bound.get() {
                let diag = Diagnostic::SizeBoundUnsatisfiable {
                    fragment: fragment.label.clone(),
                    count: fragment.len(),
                    bound: bound.get(),
                };
                diagnostics.push(diag);
            }
        }
    }

    let mut fragments: Vec<Fragment> = fragments.into_values().collect();
    rename_clashes(&mut fragments);
    Partition {
        fragments,
        diagnostics,
    }
}

/// Give every fragment a distinct name. Sections `a/b` and `a_b` both map to
/// `a_b`; later fragments get a `_2`, `_3`... suffix.
fn rename_clashes(fragments: &mut [Fragment]) {
    let original: HashSet<String> = fragments.iter().map(|f| f.name.clone()).collect();
    let mut taken: HashSet<String> = HashSet::new();
    for fragment in fragments.iter_mut() {
        if taken.insert(fragment.name.clone()) {
            continue;
        }
        let name = (2..)
            .map(|n| format!("{}_{n}", fragment.name))
            .find(|name| !original.contains(name) && !taken.contains(name))
            .unwrap_or_default();
        warn!(
            "fragment `{}` renamed to `{name}`, its name is already taken",
            fragment.label
        );
        taken.insert(name.clone());
        fragment.name = name;
    }
}

fn new_fragment(tree: &Tree, head: SectionId) -> Fragment {
    let section = tree.section(head);
    Fragment {
        name: section.path.replace('/', "_"),
        label: section.title.clone().unwrap_or_else(|| section.path.clone()),
        assignments: Vec::new(),
    }
}

/// Normalize a requested section name: `" /net/ "` becomes `"net"`.
pub fn normalize_section(name: &str) -> &str {
    name.trim().trim_matches('/')
}

fn section_heads(tree: &Tree, names: &[String]) -> Vec<bool> {
    let mut heads = vec![false; tree.sections().count()];
    heads[tree.root_section().index()] = true;
    for name in names {
        let name = normalize_section(name);
        match tree.section_by_path(name) {
            Some(id) => heads[id.index()] = true,
            None => warn!("requested section `{name}` does not exist"),
        }
    }
    heads
}

fn bounded_heads(tree: &Tree, known: &[(SymbolId, &Value)], bound: usize) -> Vec<bool> {
    let count = tree.sections().count();
    let mut totals = vec![0usize; count];
    for (id, _) in known {
        totals[tree.symbol(*id).section.index()] += 1;
    }
    // parents precede children in the arena
    let sections: Vec<_> = tree.sections().collect();
    for (id, section) in sections.iter().rev() {
        if let Some(parent) = section.parent {
            totals[parent.index()] += totals[id.index()];
        }
    }

    let mut heads = vec![false; count];
    let root = tree.root_section();
    heads[root.index()] = true;
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if totals[id.index()] == 0 {
            continue;
        }
        heads[id.index()] = true;
        if totals[id.index()] <= bound {
            continue;
        }
        stack.extend(tree.section(id).children.iter().rev().copied());
    }
    heads
}

/// Head section of every section.
fn buckets(tree: &Tree, heads: &[bool]) -> Vec<SectionId> {
    let mut bucket_of = Vec::with_capacity(heads.len());
    for (id, section) in tree.sections() {
        let head = match section.parent {
            Some(parent) if !heads[id.index()] => bucket_of[parent.index()],
            _ => id,
        };
        bucket_of.push(head);
    }
    bucket_of
}

#[cfg(test)]
mod tests {
    use ktree::{ConfigSpec, Expr, MenuSpec, TreeSnapshot, ValueKind};

    use super::*;

    fn tree() -> Tree {
        TreeSnapshot::new("x86")
            .entry(ConfigSpec::new("SMP", ValueKind::Bool))
            .entry(
                MenuSpec::new("net")
                    .title("Networking")
                    .entry(ConfigSpec::new("X", ValueKind::Bool))
                    .entry(
                        MenuSpec::new("netfilter")
                            .entry(ConfigSpec::new("NF", ValueKind::Bool))
                            .entry(ConfigSpec::new("NF_NAT", ValueKind::Bool)),
                    ),
            )
            .entry(MenuSpec::new("network").entry(ConfigSpec::new("NETWORK_X", ValueKind::Bool)))
            .entry(MenuSpec::new("fs").entry(ConfigSpec::new("Y", ValueKind::Bool)))
            .entry(
                MenuSpec::new("drivers")
                    .entry(MenuSpec::new("a").entry(ConfigSpec::new("DA", ValueKind::Bool)))
                    .entry(MenuSpec::new("b").entry(ConfigSpec::new("DB", ValueKind::Bool)))
                    .entry(
                        MenuSpec::new("c")
                            .entry(ConfigSpec::new("DC", ValueKind::Bool).default(Expr::y())),
                    ),
            )
            .build()
            .unwrap()
    }

    fn on(names: &[&str]) -> Vec<Assignment> {
        names.iter().map(|n| Assignment::new(*n, Value::Y)).collect()
    }

    fn names(fragment: &Fragment) -> Vec<&str> {
        fragment
            .assignments
            .iter()
            .map(|a| a.symbol.as_str())
            .collect()
    }

    fn sections(names: &[&str]) -> PartitionMode {
        PartitionMode::Sections(names.iter().map(|n| n.to_string()).collect())
    }

    fn bound(n: usize) -> PartitionMode {
        PartitionMode::MaxSymbols(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn test_section_split() {
        let part = partition(&tree(), &on(&["X", "Y"]), &sections(&["net"]));
        assert_eq!(part.fragments.len(), 2);
        assert_eq!(part.fragments[0].name, "net");
        assert_eq!(part.fragments[0].label, "Networking");
        assert_eq!(names(&part.fragments[0]), ["X"]);
        assert!(part.fragments[1].is_remainder());
        assert_eq!(names(&part.fragments[1]), ["Y"]);
        assert!(part.diagnostics.is_empty());
    }

    #[test]
    fn test_longest_prefix_and_component_match() {
        let part = partition(
            &tree(),
            &on(&["NETWORK_X", "NF", "X", "SMP"]),
            &sections(&["net", " /net/netfilter/ ", "fs"]),
        );
        let got: Vec<_> = part
            .fragments
            .iter()
            .map(|f| (f.name.as_str(), names(f)))
            .collect();
        assert_eq!(
            got,
            vec![
                ("", vec!["SMP", "NETWORK_X"]),
                ("net", vec!["X"]),
                ("net_netfilter", vec!["NF"]),
            ]
        );
    }

    #[test]
    fn test_empty_remainder_is_last() {
        let part = partition(&tree(), &on(&["X", "Y"]), &sections(&["fs", "net"]));
        let got: Vec<_> = part.fragments.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(got, ["net", "fs", ""]);
        assert!(part.remainder().unwrap().is_empty());
    }

    #[test]
    fn test_duplicates_and_unknown_symbols() {
        let assignments = vec![
            Assignment::new("GONE", Value::Y),
            Assignment::new("X", Value::Y),
            Assignment::new("X", Value::N),
        ];
        let part = partition(&tree(), &assignments, &sections(&["net"]));
        assert_eq!(part.fragments[0].assignments, vec![Assignment::new("X", Value::N)]);
        assert_eq!(names(part.remainder().unwrap()), ["GONE"]);
        assert_eq!(
            part.diagnostics,
            vec![Diagnostic::from(Unresolved::new("GONE", UnresolvedReason::Unknown))]
        );
    }

    #[test]
    fn test_clashing_fragment_names_are_renamed() {
        let tree = TreeSnapshot::new("x86")
            .entry(
                MenuSpec::new("a")
                    .entry(MenuSpec::new("b").entry(ConfigSpec::new("AB", ValueKind::Bool))),
            )
            .entry(MenuSpec::new("a_b").entry(ConfigSpec::new("A_B", ValueKind::Bool)))
            .build()
            .unwrap();
        let part = partition(&tree, &on(&["AB", "A_B"]), &sections(&["a/b", "a_b"]));
        let got: Vec<_> = part
            .fragments
            .iter()
            .map(|f| (f.name.as_str(), names(f)))
            .collect();
        assert_eq!(
            got,
            vec![("a_b", vec!["AB"]), ("a_b_2", vec!["A_B"]), ("", vec![])]
        );
    }

    #[test]
    fn test_unknown_section_is_ignored() {
        let part = partition(&tree(), &on(&["X"]), &sections(&["nte"]));
        assert_eq!(part.fragments.len(), 1);
        assert_eq!(names(&part.fragments[0]), ["X"]);
    }

    #[test]
    fn test_max_symbols_everything_fits() {
        let part = partition(&tree(), &on(&["X", "Y"]), &bound(10));
        assert_eq!(part.fragments.len(), 1);
        assert!(part.fragments[0].is_remainder());
        assert_eq!(names(&part.fragments[0]), ["X", "Y"]);
        assert!(part.diagnostics.is_empty());
    }

    #[test]
    fn test_max_symbols_expands_sections() {
        let part = partition(&tree(), &on(&["DA", "DB", "DC"]), &bound(1));
        let got: Vec<_> = part
            .fragments
            .iter()
            .map(|f| (f.name.as_str(), names(f)))
            .collect();
        assert_eq!(
            got,
            vec![
                ("drivers_a", vec!["DA"]),
                ("drivers_b", vec!["DB"]),
                ("drivers_c", vec!["DC"]),
                ("", vec![]),
            ]
        );
        assert!(part.diagnostics.is_empty());
    }

    #[test]
    fn test_max_symbols_keeps_fitting_subtree() {
        let part = partition(&tree(), &on(&["X", "NF", "NF_NAT", "Y"]), &bound(3));
        let got: Vec<_> = part
            .fragments
            .iter()
            .map(|f| (f.name.as_str(), names(f)))
            .collect();
        assert_eq!(
            got,
            vec![
                ("net", vec!["X", "NF", "NF_NAT"]),
                ("fs", vec!["Y"]),
                ("", vec![]),
            ]
        );
    }

    #[test]
    fn test_max_symbols_unsplittable_leaf() {
        let part = partition(&tree(), &on(&["X", "NF", "NF_NAT"]), &bound(1));
        let got: Vec<_> = part
            .fragments
            .iter()
            .map(|f| (f.name.as_str(), f.len()))
            .collect();
        assert_eq!(got, vec![("net", 1), ("net_netfilter", 2), ("", 0)]);
        assert_eq!(
            part.diagnostics,
            vec![Diagnostic::SizeBoundUnsatisfiable {
                fragment: "net/netfilter".into(),
                count: 2,
                bound: 1
            }]
        );
    }
}
