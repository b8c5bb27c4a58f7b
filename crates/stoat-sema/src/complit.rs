// complit.rs
//
// Composite literal elaboration: array, slice, map, and struct literals,
// implicit element types for nested literals, duplicate detection, and
// the &T{...} pointer wrapping.

use rustc_hash::{FxHashMap, FxHashSet};
use stoat_frontend::{Const, NodeId, NodeKind, TcState, TypeId};

use crate::check::{Checker, Ctx};
use crate::errors::SemanticError;
use crate::type_arena::{Bound, EType, TypeKind};

/// Structural key for constant map keys. Equality matches the language's
/// constant comparison: integers by value, floats by representation,
/// strings by bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstKey {
    Int(i128),
    Float(u64),
    Complex(u64, u64),
    Str(String),
    Bool(bool),
    Nil,
}

fn float_bits(f: f64) -> u64 {
    let f = if f == 0.0 { 0.0 } else { f };
    f.to_bits()
}

fn const_key(c: &Const) -> Option<ConstKey> {
    match c {
        Const::Int(v) | Const::Rune(v) => Some(ConstKey::Int(*v)),
        Const::Float(f) => Some(ConstKey::Float(float_bits(*f))),
        Const::Complex(re, im) => Some(ConstKey::Complex(float_bits(*re), float_bits(*im))),
        Const::Str(s) => Some(ConstKey::Str(s.clone())),
        Const::Bool(b) => Some(ConstKey::Bool(*b)),
        Const::Nil => Some(ConstKey::Nil),
    }
}

impl<'a> Checker<'a> {
    pub(crate) fn tc_complit(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::CompLit { ty_expr, elems } = self.nodes[n].kind.clone() else {
            unreachable!()
        };

        let Some(ty_expr) = ty_expr else {
            self.error_at(
                n,
                SemanticError::MissingCompLitType {
                    span: self.span_of(n),
                },
            );
            return Err(());
        };

        // Save the original shape for diagnostics.
        if self.nodes[n].orig.is_none() {
            let shadow = self.nodes.shadow(n);
            self.nodes[n].orig = Some(shadow);
        }

        let ty_expr = self.typecheck(ty_expr, Ctx::TYPE | Ctx::COMPLIT);
        let mut t = self.ty(ty_expr).ok_or(())?;
        let nerr0 = self.errors.len();
        self.nodes[n].ty = Some(t);
        let full_t = t;

        let mut ptr_lit = false;
        if let TypeKind::Ptr(elem) = *self.types.kind(t) {
            // Pointers are not composite literal types, except through the
            // &T{...} form, which marks the type expression implicit.
            if !self.nodes[ty_expr].implicit {
                let ty = self.type_str(t);
                let elem_s = self.type_str(elem);
                self.error_at(
                    n,
                    SemanticError::PointerCompLit {
                        ty,
                        elem: elem_s,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            if !is_comp_type(self, elem) {
                let ty = self.type_str(t);
                self.error_at(
                    n,
                    SemanticError::PointerCompLitBase {
                        ty,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            t = elem;
            ptr_lit = true;
        }

        match self.types.etype(t) {
            EType::Array => self.array_lit(n, t, elems)?,
            EType::Map => self.map_lit(n, t, elems)?,
            EType::Struct => self.struct_lit(n, t, elems)?,
            _ => {
                let ty = self.type_str(t);
                self.error_at(
                    n,
                    SemanticError::InvalidCompLitType {
                        ty,
                        span: self.span_of(n),
                    },
                );
                self.nodes[n].ty = None;
                return Err(());
            }
        }

        if self.errors.len() != nerr0 {
            return Err(());
        }

        if ptr_lit {
            // Wrap the literal in a pointer-literal node: move the checked
            // literal into a fresh inner node and let n become the &.
            let inner = self.nodes.shadow(n);
            self.nodes[inner].ty = Some(t);
            self.nodes[inner].typecheck = TcState::Done;
            self.nodes[n].kind = NodeKind::PtrLit { x: inner };
            self.nodes[n].ty = Some(full_t);
            self.nodes[n].val = None;
        }

        Ok(Ctx::RV)
    }

    fn array_lit(&mut self, n: NodeId, t: TypeId, elems: Vec<NodeId>) -> Result<(), ()> {
        let elem_t = self.types.elem(t).ok_or(())?;
        let bound = match self.types.kind(t) {
            TypeKind::Array { bound, .. } => *bound,
            _ => unreachable!(),
        };

        let mut seen: FxHashSet<i64> = FxHashSet::default();
        let mut length: i64 = 0;
        let mut next: i64 = 0;
        let mut bound_ok = match bound {
            Bound::Fixed(b) => Some(b),
            _ => None,
        };
        let mut out = Vec::with_capacity(elems.len());

        for e in elems {
            // Non-keyed elements implicitly index from the running count.
            let (k, v) = match self.nodes[e].kind.clone() {
                NodeKind::Key { k, v } => (k, v),
                _ => {
                    let span = self.nodes[e].span;
                    let k = self.nodes.alloc(NodeKind::Lit, span);
                    self.nodes[k].val = Some(Const::Int(next as i128));
                    self.nodes[k].ty = Some(TypeId::INT);
                    self.nodes[k].typecheck = TcState::Done;
                    (k, e)
                }
            };

            let k = self.typecheck(k, Ctx::RV);
            self.evconst(k);
            let idx = match self.nonneg_const(k) {
                Some(i) => i,
                None => {
                    if !self.nodes[k].diag {
                        self.error_at(
                            k,
                            SemanticError::ArrayLitBadIndex {
                                span: self.span_of(k),
                            },
                        );
                        self.nodes[k].diag = true;
                    }
                    // Stay negative for a while.
                    next = i64::MIN / 2;
                    continue;
                }
            };

            if !seen.insert(idx) {
                self.error_at(
                    k,
                    SemanticError::ArrayLitDupIndex {
                        index: idx,
                        span: self.span_of(k),
                    },
                );
            }
            next = idx + 1;
            if next > length {
                length = next;
                if let Some(b) = bound_ok {
                    if length > b {
                        self.error_at(
                            k,
                            SemanticError::ArrayLitOutOfBounds {
                                index: length - 1,
                                bound: b,
                                span: self.span_of(k),
                            },
                        );
                        // No more bound errors for this literal.
                        bound_ok = None;
                    }
                }
            }

            let v = self.push_type_and_check(v, elem_t);
            let v = self.assignconv(v, elem_t, "array element");

            let span = self.nodes[k].span;
            let pair = self.nodes.alloc(NodeKind::Key { k, v }, span);
            self.nodes[pair].typecheck = TcState::Done;
            out.push(pair);
        }

        // Fill in the [...] bound from the highest index.
        let mut len_node = None;
        if matches!(bound, Bound::Unfilled) {
            if let TypeKind::Array { bound, .. } = self.types.kind_mut(t) {
                *bound = Bound::Fixed(length);
            }
        } else if matches!(bound, Bound::Slice) {
            let span = self.nodes[n].span;
            let l = self.nodes.alloc(NodeKind::Lit, span);
            self.nodes[l].val = Some(Const::Int(length as i128));
            self.nodes[l].ty = Some(TypeId::INT);
            self.nodes[l].typecheck = TcState::Done;
            len_node = Some(l);
        }

        self.nodes[n].kind = NodeKind::ArrayLit {
            elems: out,
            len: len_node,
        };
        Ok(())
    }

    fn map_lit(&mut self, n: NodeId, t: TypeId, elems: Vec<NodeId>) -> Result<(), ()> {
        let key_t = self.types.map_key(t).ok_or(())?;
        let val_t = self.types.map_val(t).ok_or(())?;
        let mut seen: FxHashMap<ConstKey, Vec<TypeId>> = FxHashMap::default();
        let mut out = Vec::with_capacity(elems.len());

        for e in elems {
            let (k, v) = match self.nodes[e].kind.clone() {
                NodeKind::Key { k, v } => (k, v),
                _ => {
                    self.typecheck(e, Ctx::RV);
                    self.error_at(
                        e,
                        SemanticError::MapLitMissingKey {
                            span: self.span_of(e),
                        },
                    );
                    continue;
                }
            };

            let k = self.typecheck(k, Ctx::RV);
            self.defaultlit(k, Some(key_t));
            let k = self.assignconv(k, key_t, "map key");

            // Duplicate keys: constant equality, between keys of identical
            // type. An interface-wrapped constant compares through its
            // operand.
            let (dup_probe, probe_ty) = match self.nodes[k].kind.clone() {
                NodeKind::ConvIface { x } => (x, self.ty(x)),
                NodeKind::Conv { .. } => {
                    // A non-trivial conversion is not a checked constant.
                    (k, None)
                }
                _ => (k, self.ty(k)),
            };
            if let (Some(c), Some(pt)) = (self.lit_val(dup_probe), probe_ty) {
                if let Some(ck) = const_key(&c) {
                    let entry = seen.entry(ck).or_default();
                    if entry.iter().any(|&et| self.types.eqtype(et, pt)) {
                        let key = self.node_str(dup_probe);
                        self.error_at(
                            k,
                            SemanticError::MapLitDupKey {
                                key,
                                span: self.span_of(k),
                            },
                        );
                    } else {
                        entry.push(pt);
                    }
                }
            }

            let v = self.push_type_and_check(v, val_t);
            let v = self.assignconv(v, val_t, "map value");

            let span = self.nodes[k].span;
            let pair = self.nodes.alloc(NodeKind::Key { k, v }, span);
            self.nodes[pair].typecheck = TcState::Done;
            out.push(pair);
        }

        self.nodes[n].kind = NodeKind::MapLit { elems: out };
        Ok(())
    }

    fn struct_lit(&mut self, n: NodeId, t: TypeId, elems: Vec<NodeId>) -> Result<(), ()> {
        let fields = self.types.struct_fields(t).ok_or(())?.clone();
        let keyed = elems
            .iter()
            .any(|&e| matches!(self.nodes[e].kind, NodeKind::Key { .. }));
        let mut out = Vec::with_capacity(elems.len());
        let mut bad = 0usize;

        if !elems.is_empty() && !keyed {
            // Simple list of values, consumed against the field chain.
            let mut fi = 0usize;
            for e in elems {
                let e = self.typecheck(e, Ctx::RV);
                let Some(f) = fields.get(fi) else {
                    bad += 1;
                    if bad == 1 {
                        self.error_at(
                            e,
                            SemanticError::StructLitTooManyValues {
                                span: self.span_of(e),
                            },
                        );
                    }
                    continue;
                };
                if let Some(sym) = f.sym {
                    if !self.syms.is_exported(sym)
                        && self.syms.pkg(sym) != stoat_frontend::PkgId::LOCAL
                    {
                        let name = self.syms.name(sym).to_string();
                        let ty = self.type_str(t);
                        self.error_at(
                            e,
                            SemanticError::StructLitUnexportedField {
                                name,
                                ty,
                                span: self.span_of(e),
                            },
                        );
                    }
                }

                let v = self.assignconv(e, f.ty, "field value");

                // Rewrite to a key pair naming the field exactly, for the
                // stages downstream.
                let span = self.nodes[v].span;
                let k = self.nodes.alloc(NodeKind::Name, span);
                self.nodes[k].sym = f.sym;
                self.nodes[k].ty = Some(f.ty);
                self.nodes[k].typecheck = TcState::Done;
                let pair = self.nodes.alloc(NodeKind::Key { k, v }, span);
                self.nodes[pair].typecheck = TcState::Done;
                out.push(pair);
                fi += 1;
            }
            if fi < fields.len() {
                self.error_at(
                    n,
                    SemanticError::StructLitTooFewValues {
                        span: self.span_of(n),
                    },
                );
            }
        } else {
            let mut seen: FxHashSet<String> = FxHashSet::default();
            for e in elems {
                let (k, v) = match self.nodes[e].kind.clone() {
                    NodeKind::Key { k, v } => (k, v),
                    _ => {
                        bad += 1;
                        if bad == 1 {
                            self.error_at(
                                e,
                                SemanticError::StructLitMixedInit {
                                    span: self.span_of(e),
                                },
                            );
                        }
                        self.typecheck(e, Ctx::RV);
                        continue;
                    }
                };

                let Some(mut sym) = self.nodes[k].sym else {
                    let expr = self.node_str(k);
                    self.error_at(
                        k,
                        SemanticError::StructLitBadFieldName {
                            expr,
                            span: self.span_of(k),
                        },
                    );
                    self.typecheck(v, Ctx::RV);
                    continue;
                };

                // A dotted import can resolve the name in another package;
                // redirect to the local spelling before the lookup.
                if self.syms.pkg(sym) != stoat_frontend::PkgId::LOCAL
                    && self.syms.is_exported(sym)
                {
                    let name = self.syms.name(sym).to_string();
                    if let Some(local) = self.syms.find_local(&name) {
                        sym = local;
                    }
                }

                let name = self.syms.name(sym).to_string();
                let Some(f) = fields
                    .iter()
                    .find(|f| {
                        f.sym
                            .map(|s| self.syms.name(s) == name)
                            .unwrap_or(false)
                    })
                    .cloned()
                else {
                    let ty = self.type_str(t);
                    self.error_at(
                        k,
                        SemanticError::StructLitUnknownField {
                            ty,
                            name,
                            span: self.span_of(k),
                        },
                    );
                    continue;
                };

                if !seen.insert(name.clone()) {
                    self.error_at(
                        k,
                        SemanticError::StructLitDupField {
                            name: name.clone(),
                            span: self.span_of(k),
                        },
                    );
                }

                self.nodes[k].kind = NodeKind::Name;
                self.nodes[k].sym = Some(sym);
                self.nodes[k].ty = Some(f.ty);
                self.nodes[k].typecheck = TcState::Done;

                // No implicit element type here; named fields only.
                let v = self.typecheck(v, Ctx::RV);
                let v = self.assignconv(v, f.ty, "field value");
                let span = self.nodes[k].span;
                let pair = self.nodes.alloc(NodeKind::Key { k, v }, span);
                self.nodes[pair].typecheck = TcState::Done;
                out.push(pair);
            }
        }

        self.nodes[n].kind = NodeKind::StructLit { elems: out };
        Ok(())
    }

    /// Push the element type into a nested composite literal that has no
    /// type of its own, then check the element.
    fn push_type_and_check(&mut self, v: NodeId, t: TypeId) -> NodeId {
        if let NodeKind::CompLit { ty_expr: None, .. } = self.nodes[v].kind {
            if is_comp_type(self, t) {
                let span = self.nodes[v].span;
                let te = self.nodes.alloc(NodeKind::TypeExpr, span);
                self.nodes[te].ty = Some(t);
                self.nodes[te].implicit = true;
                self.nodes[te].typecheck = TcState::Done;
                if let NodeKind::CompLit { ty_expr, .. } = &mut self.nodes[v].kind {
                    *ty_expr = Some(te);
                }
                self.nodes[v].implicit = true;
            }
        }
        let v = self.typecheck(v, Ctx::RV);
        self.defaultlit(v, Some(t));
        v
    }
}

/// Types a composite literal can be built for: array, slice, map, struct,
/// or a pointer to one of those.
fn is_comp_type(checker: &Checker<'_>, t: TypeId) -> bool {
    match checker.types.kind(t) {
        TypeKind::Array { .. } | TypeKind::Struct { .. } | TypeKind::Map { .. } => true,
        TypeKind::Ptr(elem) => matches!(
            checker.types.kind(*elem),
            TypeKind::Array { .. } | TypeKind::Struct { .. } | TypeKind::Map { .. }
        ),
        _ => false,
    }
}
