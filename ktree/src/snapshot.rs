//! Serialized form of a parsed symbol tree.
//!
//! A snapshot is what an external Kconfig front end hands over: the menu
//! nesting, choice groups and symbol declarations in declaration order, with
//! dependency and default expressions already parsed into [`Expr`] values.
//!
//! # File Format
//!
//! ```toml
//! arch = "x86"
//! title = "Linux Kernel Configuration"
//!
//! [[entries]]
//! type = "config"
//! name = "NET"
//! kind = "bool"
//! defaults = [{ value = { const = "y" } }]
//!
//! [[entries]]
//! type = "menu"
//! name = "net"
//! title = "Networking"
//! depends = { symbol = "NET" }
//!
//! [[entries.entries]]
//! type = "config"
//! name = "INET"
//! kind = "bool"
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{error::TreeError, expr::Expr, tree::Tree, value::ValueKind};

/// Root of a tree snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TreeSnapshot {
    /// Architecture the tree was evaluated for.
    pub arch: String,
    /// Main menu title.
    #[serde(default)]
    pub title: Option<String>,
    /// Top-level entries in declaration order.
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// One declaration inside a menu.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    /// A symbol declaration.
    Config(ConfigSpec),
    /// A nested menu, i.e. a section.
    Menu(MenuSpec),
    /// A group of mutually exclusive bool symbols.
    Choice(ChoiceSpec),
}

/// A symbol declaration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ConfigSpec {
    /// Symbol name without the `CONFIG_` prefix.
    pub name: String,
    /// Value type.
    pub kind: ValueKind,
    /// Prompt text shown by configuration front ends.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Own dependency, before menu dependencies are folded in.
    #[serde(default)]
    pub depends: Option<Expr>,
    /// Defaults in priority order; the first active one wins.
    #[serde(default)]
    pub defaults: Vec<DefaultValue>,
}

/// A `default <value> [if <when>]` line.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DefaultValue {
    /// Default value expression.
    pub value: Expr,
    /// Condition under which this default applies.
    #[serde(default)]
    pub when: Option<Expr>,
}

/// A menu block.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MenuSpec {
    /// Section path component (e.g. `net`, `netfilter`).
    pub name: String,
    /// Human-readable menu title.
    #[serde(default)]
    pub title: Option<String>,
    /// Dependency applied to every entry of the menu.
    #[serde(default)]
    pub depends: Option<Expr>,
    /// Nested entries in declaration order.
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// A choice block.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ChoiceSpec {
    /// Optional choice symbol name.
    #[serde(default)]
    pub name: Option<String>,
    /// Prompt text.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Dependency gating the whole group.
    #[serde(default)]
    pub depends: Option<Expr>,
    /// Name of the member selected when nothing is assigned.
    #[serde(default)]
    pub default: Option<String>,
    /// Member symbols, all of kind `bool`.
    #[serde(default)]
    pub members: Vec<ConfigSpec>,
}

impl TreeSnapshot {
    /// Create an empty snapshot for `arch`.
    pub fn new(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            title: None,
            entries: Vec::new(),
        }
    }

    /// Set the main menu title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a top-level entry.
    pub fn entry(mut self, entry: impl Into<Entry>) -> Self {
        self.entries.push(entry.into());
        self
    }

    /// Validate and flatten into a [`Tree`].
    pub fn build(self) -> Result<Tree, TreeError> {
        Tree::from_snapshot(self)
    }
}

impl ConfigSpec {
    /// Declare symbol `name` of `kind`.
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            prompt: None,
            depends: None,
            defaults: Vec::new(),
        }
    }

    /// Set the prompt.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the dependency.
    pub fn depends_on(mut self, expr: Expr) -> Self {
        self.depends = Some(expr);
        self
    }

    /// Append an unconditional default.
    pub fn default(mut self, value: Expr) -> Self {
        self.defaults.push(DefaultValue { value, when: None });
        self
    }

    /// Append a conditional default.
    pub fn default_if(mut self, value: Expr, when: Expr) -> Self {
        self.defaults.push(DefaultValue {
            value,
            when: Some(when),
        });
        self
    }
}

impl MenuSpec {
    /// Open menu `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            depends: None,
            entries: Vec::new(),
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the menu dependency.
    pub fn depends_on(mut self, expr: Expr) -> Self {
        self.depends = Some(expr);
        self
    }

    /// Append a nested entry.
    pub fn entry(mut self, entry: impl Into<Entry>) -> Self {
        self.entries.push(entry.into());
        self
    }
}

impl ChoiceSpec {
    /// Open an anonymous choice.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            name: None,
            prompt: None,
            depends: None,
            default: None,
            members: Vec::new(),
        }
    }

    /// Name the choice.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the group dependency.
    pub fn depends_on(mut self, expr: Expr) -> Self {
        self.depends = Some(expr);
        self
    }

    /// Set the default member.
    pub fn default(mut self, member: impl Into<String>) -> Self {
        self.default = Some(member.into());
        self
    }

    /// Append a bool member.
    pub fn member(mut self, member: ConfigSpec) -> Self {
        self.members.push(member);
        self
    }
}

impl From<ConfigSpec> for Entry {
    fn from(spec: ConfigSpec) -> Self {
        Entry::Config(spec)
    }
}

impl From<MenuSpec> for Entry {
    fn from(spec: MenuSpec) -> Self {
        Entry::Menu(spec)
    }
}

impl From<ChoiceSpec> for Entry {
    fn from(spec: ChoiceSpec) -> Self {
        Entry::Choice(spec)
    }
}
