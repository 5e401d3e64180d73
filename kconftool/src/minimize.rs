//! Minimal-delta computation.
//!
//! A greedy pass walks the target in declaration order and emits an
//! assignment only for symbols whose value, replayed from the assignments
//! emitted so far, differs from the target. A later assignment can still
//! shift the default of an earlier skipped symbol, so the result is then
//! replayed and any diverging symbol is pinned until the replay matches.

use std::collections::HashSet;

use ktree::{SymbolId, Tree, Value};

use crate::{
    assignment::{Assignment, ResolvedConfig},
    error::{Unresolved, UnresolvedReason},
    resolve::{Resolution, resolve},
};

/// Outcome of [`minimize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Minimized {
    /// Assignments in declaration order.
    pub assignments: Vec<Assignment>,
    /// Target symbols that cannot be reproduced on this tree.
    pub skipped: Vec<Unresolved>,
}

/// Smallest declaration-order assignment list reproducing `target`.
pub fn minimize(tree: &Tree, target: &ResolvedConfig) -> Minimized {
    let mut skipped = Vec::new();
    let visible: HashSet<SymbolId> = tree
        .visible_symbols(|name| target.get(name).cloned())
        .into_iter()
        .collect();

    let mut wanted: Vec<(SymbolId, &Value)> = Vec::new();
    for (name, value) in target.iter() {
        match tree.lookup(name) {
            None => skipped.push(Unresolved::new(name, UnresolvedReason::Unknown)),
            Some(id) if !visible.contains(&id) => {
                skipped.push(Unresolved::new(name, UnresolvedReason::Invisible))
            }
            Some(id) => wanted.push((id, value)),
        }
    }
    wanted.sort_by_key(|(id, _)| *id);

    let mut emitted: Vec<Assignment> = Vec::new();
    let mut pinned: HashSet<SymbolId> = HashSet::new();
    // a visible group whose default is hidden only resolves once its
    // selection is assigned, so that assignment goes in first
    for member in hidden_default_selections(tree, target, &visible) {
        emitted.push(Assignment::new(&tree.symbol(member).name, Value::Y));
        pinned.insert(member);
    }
    let mut current = replay(tree, &emitted);

    for &(id, value) in &wanted {
        let symbol = tree.symbol(id);
        if pinned.contains(&id) || (symbol.choice.is_some() && *value == Value::N) {
            continue;
        }
        let matches = current
            .as_ref()
            .is_some_and(|res| res.config.get(&symbol.name) == Some(value));
        if matches {
            continue;
        }
        emitted.push(Assignment::new(&symbol.name, value.clone()));
        pinned.insert(id);
        current = replay(tree, &emitted);
    }

    loop {
        let diverging: Vec<(SymbolId, &Value)> = wanted
            .iter()
            .copied()
            .filter(|(id, _)| !pinned.contains(id))
            .filter(|(id, value)| {
                current
                    .as_ref()
                    .is_none_or(|res| res.config.get(&tree.symbol(*id).name) != Some(*value))
            })
            .collect();
        if diverging.is_empty() {
            break;
        }
        debug!("pinning {} symbols shifted by later assignments", diverging.len());
        for (id, value) in diverging {
            emitted.push(Assignment::new(&tree.symbol(id).name, value.clone()));
            pinned.insert(id);
        }
        current = replay(tree, &emitted);
    }

    emitted.sort_by_key(|a| tree.lookup(&a.symbol));
    Minimized {
        assignments: emitted,
        skipped,
    }
}

/// Selected members of choice groups whose declared default is hidden in
/// `target`.
fn hidden_default_selections(
    tree: &Tree,
    target: &ResolvedConfig,
    visible: &HashSet<SymbolId>,
) -> Vec<SymbolId> {
    tree.choice_groups()
        .iter()
        .filter(|group| group.default.is_some_and(|d| !visible.contains(&d)))
        .filter_map(|group| {
            group.members.iter().copied().find(|m| {
                visible.contains(m) && target.get(&tree.symbol(*m).name) == Some(&Value::Y)
            })
        })
        .collect()
}

fn replay(tree: &Tree, assignments: &[Assignment]) -> Option<Resolution> {
    match resolve(tree, assignments) {
        Ok(res) => Some(res),
        Err(err) => {
            debug!("intermediate replay failed: {err}");
            None
        }
    }
}
