// sym.rs
//
// Symbol table shared by the parser and the checker.
//
// A SymId identifies a name *within a package*: the same spelling imported
// from two packages yields two distinct SymIds. The definition back-pointer
// (`def`) is what the checker's resolver chases.

use rustc_hash::FxHashMap;

use crate::ast::NodeId;

/// Interned package identity. Package 0 is always the package being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PkgId(u32);

impl PkgId {
    pub const LOCAL: PkgId = PkgId(0);

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Interned (package, name) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymId(u32);

impl SymId {
    pub fn index(self) -> u32 {
        self.0
    }

    /// Create a SymId with an arbitrary index in test code.
    #[cfg(any(test, feature = "testing"))]
    pub fn new_for_test(index: u32) -> Self {
        Self(index)
    }
}

#[derive(Debug)]
struct SymData {
    name: String,
    pkg: PkgId,
    /// Defining node, chased by the resolver.
    def: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct SymTable {
    syms: Vec<SymData>,
    lookup: FxHashMap<(PkgId, String), SymId>,
    pkgs: Vec<String>,
}

impl SymTable {
    pub fn new() -> Self {
        let mut table = Self::default();
        table.pkgs.push("main".to_string());
        table
    }

    pub fn intern_pkg(&mut self, name: &str) -> PkgId {
        if let Some(i) = self.pkgs.iter().position(|p| p == name) {
            return PkgId(i as u32);
        }
        self.pkgs.push(name.to_string());
        PkgId((self.pkgs.len() - 1) as u32)
    }

    pub fn pkg_name(&self, pkg: PkgId) -> &str {
        &self.pkgs[pkg.0 as usize]
    }

    pub fn intern(&mut self, pkg: PkgId, name: &str) -> SymId {
        if let Some(&id) = self.lookup.get(&(pkg, name.to_string())) {
            return id;
        }
        let id = SymId(self.syms.len() as u32);
        self.syms.push(SymData {
            name: name.to_string(),
            pkg,
            def: None,
        });
        self.lookup.insert((pkg, name.to_string()), id);
        id
    }

    /// Intern a name in the local package.
    pub fn local(&mut self, name: &str) -> SymId {
        self.intern(PkgId::LOCAL, name)
    }

    /// Find an already-interned local-package name.
    pub fn find_local(&self, name: &str) -> Option<SymId> {
        self.lookup.get(&(PkgId::LOCAL, name.to_string())).copied()
    }

    pub fn name(&self, sym: SymId) -> &str {
        &self.syms[sym.0 as usize].name
    }

    pub fn pkg(&self, sym: SymId) -> PkgId {
        self.syms[sym.0 as usize].pkg
    }

    pub fn def(&self, sym: SymId) -> Option<NodeId> {
        self.syms[sym.0 as usize].def
    }

    pub fn set_def(&mut self, sym: SymId, def: Option<NodeId>) {
        self.syms[sym.0 as usize].def = def;
    }

    pub fn is_blank(&self, sym: SymId) -> bool {
        self.name(sym) == "_"
    }

    /// An exported name starts with an upper-case letter.
    pub fn is_exported(&self, sym: SymId) -> bool {
        exportname(self.name(sym))
    }
}

pub fn exportname(name: &str) -> bool {
    name.chars().next().map(char::is_uppercase).unwrap_or(false)
}
