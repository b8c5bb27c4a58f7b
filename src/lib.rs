// src/lib.rs
//! Stoat: a statically typed, structurally-interface-bearing systems
//! language. This crate re-exports the compiler front half: the AST data
//! model and the expression and declaration type checker.

pub use stoat_frontend as frontend;
pub use stoat_sema as sema;

pub use stoat_frontend::{NodeArena, NodeId, NodeKind, SymTable, TypeId};
pub use stoat_sema::{Checker, Ctx, SemanticError, TypeError};
