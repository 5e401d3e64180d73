//! The symbol tree: arenas of symbols, sections and choice groups.
//!
//! Everything is addressed by index. Symbol ids follow declaration order, so
//! iterating [`Tree::symbols`] or sorting by [`SymbolId`] always yields tree
//! declaration order. Sections keep their parent and children as id lists.

use std::{collections::HashMap, convert::Infallible};

use crate::{
    error::TreeError,
    expr::{Env, Expr},
    snapshot::{ChoiceSpec, ConfigSpec, DefaultValue, Entry, TreeSnapshot},
    value::{Tristate, Value, ValueKind},
};

/// Index of a symbol; ordering is declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(usize);

/// Index of a section. The root section is always id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionId(usize);

/// Index of a choice group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChoiceId(usize);

impl SymbolId {
    /// Position in declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl SectionId {
    /// Position in the section arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl ChoiceId {
    /// Position in the choice arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A declared configuration symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Name without the `CONFIG_` prefix.
    pub name: String,
    /// Value type.
    pub kind: ValueKind,
    /// Prompt text.
    pub prompt: Option<String>,
    /// Own dependency combined with every enclosing menu dependency.
    pub depends: Expr,
    /// Defaults in priority order.
    pub defaults: Vec<DefaultValue>,
    /// Innermost declaring section.
    pub section: SectionId,
    /// Enclosing choice group, if any.
    pub choice: Option<ChoiceId>,
}

/// A node of the menu hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Last path component; empty for the root.
    pub name: String,
    /// Slash-separated path from the root, e.g. `net/netfilter`.
    pub path: String,
    /// Menu title.
    pub title: Option<String>,
    /// Enclosing section; `None` for the root.
    pub parent: Option<SectionId>,
    /// Nested sections in declaration order.
    pub children: Vec<SectionId>,
}

/// A set of mutually exclusive bool symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceGroup {
    /// Choice symbol name.
    pub name: Option<String>,
    /// Prompt text.
    pub prompt: Option<String>,
    /// Group dependency combined with every enclosing menu dependency.
    pub depends: Expr,
    /// Member selected when nothing is assigned.
    pub default: Option<SymbolId>,
    /// Members in declaration order.
    pub members: Vec<SymbolId>,
    /// Declaring section.
    pub section: SectionId,
}

impl ChoiceGroup {
    /// Name used in messages.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.prompt.clone())
            .unwrap_or_else(|| "<anonymous choice>".to_string())
    }
}

/// An immutable, fully loaded symbol tree for one architecture.
#[derive(Debug, Clone)]
pub struct Tree {
    arch: String,
    title: Option<String>,
    symbols: Vec<Symbol>,
    sections: Vec<Section>,
    choices: Vec<ChoiceGroup>,
    by_name: HashMap<String, SymbolId>,
}

impl Tree {
    /// Validate a snapshot and flatten it into arenas.
    pub fn from_snapshot(snapshot: TreeSnapshot) -> Result<Self, TreeError> {
        let mut tree = Tree {
            arch: snapshot.arch,
            title: snapshot.title.clone(),
            symbols: Vec::new(),
            sections: vec![Section {
                name: String::new(),
                path: String::new(),
                title: snapshot.title,
                parent: None,
                children: Vec::new(),
            }],
            choices: Vec::new(),
            by_name: HashMap::new(),
        };
        tree.add_entries(snapshot.entries, tree.root_section(), &[])?;

        for symbol in &tree.symbols {
            for name in symbol.depends.symbols() {
                if !tree.by_name.contains_key(name) {
                    debug!("`{}` depends on undeclared symbol `{name}`", symbol.name);
                }
            }
        }
        Ok(tree)
    }

    fn add_entries(
        &mut self,
        entries: Vec<Entry>,
        section: SectionId,
        deps: &[Expr],
    ) -> Result<(), TreeError> {
        for entry in entries {
            match entry {
                Entry::Config(spec) => {
                    self.add_symbol(spec, section, deps, None)?;
                }
                Entry::Menu(menu) => {
                    if menu.name.is_empty() {
                        return Err(TreeError::EmptyName("menu"));
                    }
                    let child = self.child_section(section, &menu.name, menu.title);
                    let mut inner = deps.to_vec();
                    inner.extend(menu.depends);
                    self.add_entries(menu.entries, child, &inner)?;
                }
                Entry::Choice(choice) => self.add_choice(choice, section, deps)?,
            }
        }
        Ok(())
    }

    fn child_section(&mut self, parent: SectionId, name: &str, title: Option<String>) -> SectionId {
        let existing = self.sections[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.sections[c.0].name == name);
        if let Some(id) = existing {
            if self.sections[id.0].title.is_none() {
                self.sections[id.0].title = title;
            }
            return id;
        }

        let parent_path = &self.sections[parent.0].path;
        let path = if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{parent_path}/{name}")
        };
        let id = SectionId(self.sections.len());
        self.sections.push(Section {
            name: name.to_string(),
            path,
            title,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.sections[parent.0].children.push(id);
        id
    }

    fn add_choice(
        &mut self,
        spec: ChoiceSpec,
        section: SectionId,
        deps: &[Expr],
    ) -> Result<(), TreeError> {
        let id = ChoiceId(self.choices.len());
        self.choices.push(ChoiceGroup {
            name: spec.name,
            prompt: spec.prompt,
            depends: fold_depends(deps, spec.depends),
            default: None,
            members: Vec::new(),
            section,
        });

        for member in spec.members {
            if member.kind != ValueKind::Bool {
                return Err(TreeError::ChoiceMemberKind {
                    symbol: member.name,
                    kind: member.kind,
                });
            }
            let member = self.add_symbol(member, section, &[], Some(id))?;
            self.choices[id.0].members.push(member);
        }

        if let Some(default) = spec.default {
            let group = &self.choices[id.0];
            let member = group
                .members
                .iter()
                .copied()
                .find(|m| self.symbols[m.0].name == default)
                .ok_or_else(|| TreeError::UnknownChoiceDefault {
                    choice: group.label(),
                    default,
                })?;
            self.choices[id.0].default = Some(member);
        }
        Ok(())
    }

    fn add_symbol(
        &mut self,
        spec: ConfigSpec,
        section: SectionId,
        deps: &[Expr],
        choice: Option<ChoiceId>,
    ) -> Result<SymbolId, TreeError> {
        if spec.name.is_empty() {
            return Err(TreeError::EmptyName("symbol"));
        }
        if self.by_name.contains_key(&spec.name) {
            return Err(TreeError::DuplicateSymbol(spec.name));
        }
        for default in &spec.defaults {
            if let Expr::Literal(literal) = &default.value {
                if Value::String(literal.clone()).coerce(spec.kind).is_none() {
                    return Err(TreeError::InvalidDefault {
                        symbol: spec.name,
                        kind: spec.kind,
                        literal: literal.clone(),
                    });
                }
            }
        }

        let id = SymbolId(self.symbols.len());
        self.by_name.insert(spec.name.clone(), id);
        self.symbols.push(Symbol {
            name: spec.name,
            kind: spec.kind,
            prompt: spec.prompt,
            depends: fold_depends(deps, spec.depends),
            defaults: spec.defaults,
            section,
            choice,
        });
        Ok(id)
    }

    /// Architecture this tree was loaded for.
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Main menu title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Number of declared symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the tree declares no symbol.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol by id.
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    /// All symbols in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (SymbolId(i), symbol))
    }

    /// Id of symbol `name`.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// Symbol named `name`.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.lookup(name).map(|id| self.symbol(id))
    }

    /// The root section (empty path).
    pub fn root_section(&self) -> SectionId {
        SectionId(0)
    }

    /// Section by id.
    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id.0]
    }

    /// All sections; parents always come before their children.
    pub fn sections(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, section)| (SectionId(i), section))
    }

    /// Section with the given slash-separated path.
    pub fn section_by_path(&self, path: &str) -> Option<SectionId> {
        self.sections()
            .find(|(_, section)| section.path == path)
            .map(|(id, _)| id)
    }

    /// Choice group by id.
    pub fn choice(&self, id: ChoiceId) -> &ChoiceGroup {
        &self.choices[id.0]
    }

    /// All choice groups in declaration order.
    pub fn choice_groups(&self) -> &[ChoiceGroup] {
        &self.choices
    }

    /// Value an invisible symbol contributes to other symbols' expressions.
    ///
    /// `n` for bool and tristate; otherwise the first literal default, or the
    /// zero value of the kind.
    pub fn hidden_value(&self, id: SymbolId) -> Value {
        let symbol = self.symbol(id);
        if symbol.kind.is_tristate_like() {
            return Value::N;
        }
        symbol
            .defaults
            .iter()
            .find_map(|default| match &default.value {
                Expr::Literal(literal) => Value::String(literal.clone()).coerce(symbol.kind),
                _ => None,
            })
            .unwrap_or_else(|| symbol.kind.zero())
    }

    /// Symbols visible under a table of working values.
    ///
    /// `current` returns the working value of a symbol, or `None` when the
    /// symbol is not in the table, in which case its hidden value is used.
    pub fn visible_symbols<F>(&self, current: F) -> Vec<SymbolId>
    where
        F: FnMut(&str) -> Option<Value>,
    {
        let mut env = TableEnv {
            tree: self,
            current,
        };
        let mut visible = Vec::new();
        for (id, symbol) in self.symbols() {
            let mut visibility = env.eval(&symbol.depends);
            if let Some(choice) = symbol.choice {
                visibility = visibility.min(env.eval(&self.choice(choice).depends));
            }
            if visibility != Tristate::Off {
                visible.push(id);
            }
        }
        visible
    }
}

fn fold_depends(inherited: &[Expr], own: Option<Expr>) -> Expr {
    let mut all: Vec<Expr> = inherited.to_vec();
    all.extend(own);
    match all.len() {
        0 => Expr::y(),
        1 => all.remove(0),
        _ => Expr::And(all),
    }
}

struct TableEnv<'t, F> {
    tree: &'t Tree,
    current: F,
}

impl<F> TableEnv<'_, F>
where
    F: FnMut(&str) -> Option<Value>,
{
    fn eval(&mut self, expr: &Expr) -> Tristate {
        match expr.eval(self) {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl<F> Env for TableEnv<'_, F>
where
    F: FnMut(&str) -> Option<Value>,
{
    type Error = Infallible;

    fn lookup(&mut self, name: &str) -> Result<Option<Value>, Infallible> {
        Ok(match (self.current)(name) {
            Some(value) => Some(value),
            None => self.tree.lookup(name).map(|id| self.tree.hidden_value(id)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ChoiceSpec, ConfigSpec, MenuSpec};

    fn sample() -> Tree {
        TreeSnapshot::new("x86")
            .title("Test")
            .entry(ConfigSpec::new("NET", ValueKind::Bool).default(Expr::y()))
            .entry(
                MenuSpec::new("net")
                    .title("Networking")
                    .depends_on(Expr::sym("NET"))
                    .entry(ConfigSpec::new("INET", ValueKind::Bool))
                    .entry(
                        MenuSpec::new("netfilter")
                            .entry(ConfigSpec::new("NF", ValueKind::Tristate).depends_on(Expr::sym("INET"))),
                    ),
            )
            .entry(
                ChoiceSpec::new()
                    .name("HZ_CHOICE")
                    .default("HZ_250")
                    .member(ConfigSpec::new("HZ_100", ValueKind::Bool))
                    .member(ConfigSpec::new("HZ_250", ValueKind::Bool)),
            )
            .entry(ConfigSpec::new("LOCALVERSION", ValueKind::String).default(Expr::lit("-test")))
            .entry(MenuSpec::new("net").entry(ConfigSpec::new("PACKET", ValueKind::Tristate)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_declaration_order_and_sections() {
        let tree = sample();
        let names: Vec<_> = tree.symbols().map(|(_, s)| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["NET", "INET", "NF", "HZ_100", "HZ_250", "LOCALVERSION", "PACKET"]
        );

        let nf = tree.get("NF").unwrap();
        assert_eq!(tree.section(nf.section).path, "net/netfilter");

        // re-entered menu reuses the section
        let packet = tree.get("PACKET").unwrap();
        assert_eq!(tree.section(packet.section).path, "net");
        assert_eq!(tree.section_by_path("net"), Some(packet.section));
        assert_eq!(tree.section(nf.section).parent, Some(packet.section));
        assert_eq!(tree.section(tree.root_section()).title.as_deref(), Some("Test"));
    }

    #[test]
    fn test_menu_dependencies_are_folded() {
        let tree = sample();
        assert_eq!(
            tree.get("NF").unwrap().depends,
            Expr::and([Expr::sym("NET"), Expr::sym("INET")])
        );
        assert_eq!(tree.get("INET").unwrap().depends, Expr::sym("NET"));
        assert_eq!(tree.get("NET").unwrap().depends, Expr::y());
    }

    #[test]
    fn test_choice_groups() {
        let tree = sample();
        let groups = tree.choice_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label(), "HZ_CHOICE");
        assert_eq!(groups[0].default, tree.lookup("HZ_250"));
        assert_eq!(groups[0].members.len(), 2);
        assert!(tree.get("HZ_100").unwrap().choice.is_some());
    }

    #[test]
    fn test_visible_symbols() {
        let tree = sample();
        let off = |name: &str| (name == "NET").then_some(Value::N);
        let visible: Vec<_> = tree
            .visible_symbols(off)
            .into_iter()
            .map(|id| tree.symbol(id).name.as_str())
            .collect();
        assert_eq!(visible, ["NET", "HZ_100", "HZ_250", "LOCALVERSION", "PACKET"]);

        let on = |name: &str| match name {
            "NET" | "INET" => Some(Value::Y),
            _ => None,
        };
        assert_eq!(tree.visible_symbols(on).len(), 7);
    }

    #[test]
    fn test_hidden_value() {
        let tree = sample();
        assert_eq!(tree.hidden_value(tree.lookup("NET").unwrap()), Value::N);
        assert_eq!(
            tree.hidden_value(tree.lookup("LOCALVERSION").unwrap()),
            Value::string("-test")
        );
    }

    #[test]
    fn test_validation_errors() {
        let duplicate = TreeSnapshot::new("x86")
            .entry(ConfigSpec::new("A", ValueKind::Bool))
            .entry(MenuSpec::new("m").entry(ConfigSpec::new("A", ValueKind::Bool)))
            .build();
        assert!(matches!(duplicate, Err(TreeError::DuplicateSymbol(name)) if name == "A"));

        let bad_default = TreeSnapshot::new("x86")
            .entry(ChoiceSpec::new().default("C").member(ConfigSpec::new("A", ValueKind::Bool)))
            .build();
        assert!(matches!(bad_default, Err(TreeError::UnknownChoiceDefault { .. })));

        let bad_member = TreeSnapshot::new("x86")
            .entry(ChoiceSpec::new().member(ConfigSpec::new("A", ValueKind::Tristate)))
            .build();
        assert!(matches!(bad_member, Err(TreeError::ChoiceMemberKind { .. })));

        let bad_literal = TreeSnapshot::new("x86")
            .entry(ConfigSpec::new("HZ", ValueKind::Int).default(Expr::lit("fast")))
            .build();
        assert!(matches!(bad_literal, Err(TreeError::InvalidDefault { .. })));

        let empty = TreeSnapshot::new("x86").entry(MenuSpec::new("")).build();
        assert!(matches!(empty, Err(TreeError::EmptyName("menu"))));
    }
}
