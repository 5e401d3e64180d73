//! Value resolution.
//!
//! Assignments are first loaded into an explicit-value table, later ones
//! replacing earlier ones. Every symbol is then evaluated lazily and memoized:
//! visibility first, then the choice selection or explicit value or active
//! default. A symbol whose evaluation reaches itself is a dependency cycle.

use ktree::{ChoiceId, Env, Expr, Symbol, SymbolId, Tree, Tristate, Value, ValueKind};

use crate::{
    assignment::{Assignment, ResolvedConfig},
    error::{StructuralError, Unresolved, UnresolvedReason},
};

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Values of every visible symbol.
    pub config: ResolvedConfig,
    /// Assignments that had no effect, in the order they were detected.
    pub unresolved: Vec<Unresolved>,
}

impl Resolution {
    /// Names of assigned symbols missing from the tree.
    pub fn unknown_symbols(&self) -> Vec<String> {
        self.unresolved
            .iter()
            .filter(|u| u.reason == UnresolvedReason::Unknown)
            .map(|u| u.symbol.clone())
            .collect()
    }
}

/// Resolve the value of every visible symbol under `assignments`.
///
/// Unknown symbols, type mismatches, invisible assignments and losing choice
/// members are reported in [`Resolution::unresolved`] and left out of the
/// result. Fails only when the tree itself is inconsistent.
pub fn resolve(tree: &Tree, assignments: &[Assignment]) -> Result<Resolution, StructuralError> {
    let mut resolver = Resolver::new(tree);
    let mut unresolved = Vec::new();

    for (seq, assignment) in assignments.iter().enumerate() {
        let Some(id) = tree.lookup(&assignment.symbol) else {
            unresolved.push(Unresolved::new(&assignment.symbol, UnresolvedReason::Unknown));
            continue;
        };
        let kind = tree.symbol(id).kind;
        match assignment.value.coerce(kind) {
            Some(value) => resolver.explicit[id.index()] = Some(Explicit { value, seq }),
            None => unresolved.push(Unresolved::new(
                &assignment.symbol,
                UnresolvedReason::Mismatch {
                    kind,
                    value: assignment.value.clone(),
                },
            )),
        }
    }

    let mut config = Vec::new();
    for (id, symbol) in tree.symbols() {
        if let Some(value) = resolver.value(id)? {
            config.push((symbol.name.clone(), value));
        }
    }
    let config: ResolvedConfig = config.into_iter().collect();

    for (id, symbol) in tree.symbols() {
        let Some(explicit) = &resolver.explicit[id.index()] else {
            continue;
        };
        match config.get(&symbol.name) {
            None => unresolved.push(Unresolved::new(&symbol.name, UnresolvedReason::Invisible)),
            Some(value) if symbol.choice.is_some() && explicit.value == Value::Y && *value == Value::N => {
                let by = symbol
                    .choice
                    .and_then(|choice| resolver.selected(choice))
                    .map(|winner| tree.symbol(winner).name.clone())
                    .unwrap_or_default();
                unresolved.push(Unresolved::new(&symbol.name, UnresolvedReason::Overridden { by }));
            }
            Some(_) => {}
        }
    }

    Ok(Resolution { config, unresolved })
}

#[derive(Debug, Clone)]
struct Explicit {
    value: Value,
    seq: usize,
}

#[derive(Debug, Clone)]
enum Slot<T> {
    Pending,
    Active,
    Done(T),
}

struct Resolver<'t> {
    tree: &'t Tree,
    explicit: Vec<Option<Explicit>>,
    values: Vec<Slot<Option<Value>>>,
    selections: Vec<Slot<Option<SymbolId>>>,
}

impl<'t> Resolver<'t> {
    fn new(tree: &'t Tree) -> Self {
        Self {
            tree,
            explicit: vec![None; tree.len()],
            values: vec![Slot::Pending; tree.len()],
            selections: vec![Slot::Pending; tree.choice_groups().len()],
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Tristate, StructuralError> {
        expr.eval(self)
    }

    /// Memoized value of a symbol; `None` when invisible.
    fn value(&mut self, id: SymbolId) -> Result<Option<Value>, StructuralError> {
        match &self.values[id.index()] {
            Slot::Done(value) => return Ok(value.clone()),
            Slot::Active => {
                return Err(StructuralError::DependencyCycle(
                    self.tree.symbol(id).name.clone(),
                ));
            }
            Slot::Pending => {}
        }
        self.values[id.index()] = Slot::Active;
        let value = self.compute(id)?;
        self.values[id.index()] = Slot::Done(value.clone());
        Ok(value)
    }

    fn compute(&mut self, id: SymbolId) -> Result<Option<Value>, StructuralError> {
        let tree = self.tree;
        let symbol = tree.symbol(id);

        let mut visibility = self.eval(&symbol.depends)?;
        if let Some(choice) = symbol.choice {
            visibility = visibility.min(self.eval(&tree.choice(choice).depends)?);
        }
        if visibility == Tristate::Off {
            return Ok(None);
        }

        if let Some(choice) = symbol.choice {
            let selected = self.selection(choice)?;
            return Ok(Some(Tristate::from(selected == Some(id)).into()));
        }

        let value = match &self.explicit[id.index()] {
            Some(explicit) => explicit.value.clone(),
            None => self.default_value(symbol)?,
        };
        Ok(Some(match (symbol.kind, value) {
            (ValueKind::Tristate, Value::Tristate(t)) => t.min(visibility).into(),
            (ValueKind::Bool, Value::Tristate(t)) => Tristate::from(t != Tristate::Off).into(),
            (_, value) => value,
        }))
    }

    fn default_value(&mut self, symbol: &Symbol) -> Result<Value, StructuralError> {
        for default in &symbol.defaults {
            let condition = match &default.when {
                Some(when) => self.eval(when)?,
                None => Tristate::On,
            };
            if condition == Tristate::Off {
                continue;
            }
            if symbol.kind.is_tristate_like() {
                return Ok(self.eval(&default.value)?.min(condition).into());
            }
            let operand = default.value.operand(self)?;
            match operand.coerce(symbol.kind) {
                Some(value) => return Ok(value),
                None => debug!(
                    "default `{operand}` of {} is not a valid {}, skipped",
                    symbol.name, symbol.kind
                ),
            }
        }
        Ok(symbol.kind.zero())
    }

    /// Memoized selected member of a choice group.
    fn selection(&mut self, id: ChoiceId) -> Result<Option<SymbolId>, StructuralError> {
        match &self.selections[id.index()] {
            Slot::Done(selected) => return Ok(*selected),
            Slot::Active => {
                return Err(StructuralError::DependencyCycle(
                    self.tree.choice(id).label(),
                ));
            }
            Slot::Pending => {}
        }
        self.selections[id.index()] = Slot::Active;
        let selected = self.select(id)?;
        self.selections[id.index()] = Slot::Done(selected);
        Ok(selected)
    }

    fn select(&mut self, id: ChoiceId) -> Result<Option<SymbolId>, StructuralError> {
        let tree = self.tree;
        let group = tree.choice(id);
        if self.eval(&group.depends)? == Tristate::Off {
            return Ok(None);
        }

        // the most recent explicit `y` on a visible member wins
        let mut best: Option<(usize, SymbolId)> = None;
        for &member in &group.members {
            let seq = match &self.explicit[member.index()] {
                Some(explicit) if explicit.value == Value::Y => explicit.seq,
                _ => continue,
            };
            if self.eval(&tree.symbol(member).depends)? == Tristate::Off {
                continue;
            }
            if best.is_none_or(|(s, _)| seq > s) {
                best = Some((seq, member));
            }
        }
        if let Some((_, member)) = best {
            return Ok(Some(member));
        }

        let Some(default) = group.default else {
            return Ok(None);
        };
        if self.eval(&tree.symbol(default).depends)? == Tristate::Off {
            return Err(StructuralError::ChoiceDefaultHidden {
                choice: group.label(),
                default: tree.symbol(default).name.clone(),
            });
        }
        Ok(Some(default))
    }

    /// Selection of an already resolved group.
    fn selected(&self, id: ChoiceId) -> Option<SymbolId> {
        match &self.selections[id.index()] {
            Slot::Done(selected) => *selected,
            _ => None,
        }
    }
}

impl Env for Resolver<'_> {
    type Error = StructuralError;

    fn lookup(&mut self, name: &str) -> Result<Option<Value>, StructuralError> {
        let Some(id) = self.tree.lookup(name) else {
            return Ok(None);
        };
        Ok(Some(match self.value(id)? {
            Some(value) => value,
            None => self.tree.hidden_value(id),
        }))
    }
}
