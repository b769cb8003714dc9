use std::collections::HashMap;
use std::fmt;

use crate::error::AlreadyDefined;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    fn slot(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Static => "static",
            Kind::Field => "field",
            Kind::Argument => "argument",
            Kind::Local => "local",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Symbol {
    pub ty: String,
    pub kind: Kind,
    pub index: u32,
}

/// One name-resolution scope. Indices are handed out densely per kind, in
/// definition order, until the next [`SymbolTable::reset`].
#[derive(Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    counts: [u32; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.symbols.clear();
        self.counts = [0; 4];
    }

    /// Binds `name` to the next free index of `kind` and returns that index.
    /// A name that is already bound leaves the table untouched.
    pub fn define(&mut self, name: &str, ty: &str, kind: Kind) -> Result<u32, AlreadyDefined> {
        if self.symbols.contains_key(name) {
            return Err(AlreadyDefined(name.to_string()));
        }
        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] += 1;
        self.symbols.insert(
            name.to_string(),
            Symbol {
                ty: ty.to_string(),
                kind,
                index,
            },
        );
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.get(name).map(|sym| sym.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|sym| sym.ty.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.get(name).map(|sym| sym.index)
    }

    pub fn count_of(&self, kind: Kind) -> u32 {
        self.counts[kind.slot()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All bindings ordered by kind, then index.
    pub fn entries(&self) -> Vec<(&str, &Symbol)> {
        let mut entries: Vec<_> = self
            .symbols
            .iter()
            .map(|(name, sym)| (name.as_str(), sym))
            .collect();
        entries.sort_by_key(|(_, sym)| (sym.kind, sym.index));
        entries
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} | {:>8} | {:>8} | {:>3}", "Name", "Type", "Kind", "#")?;
        writeln!(f, "{}", "-".repeat(38))?;
        for (name, sym) in self.entries() {
            writeln!(
                f,
                "{:>10} | {:>8} | {:>8} | {:>3}",
                name,
                sym.ty,
                sym.kind.as_str(),
                sym.index
            )?;
        }
        Ok(())
    }
}
