// lookdot.rs
//
// Selector and method resolution.
//
// `tc_dot` drives the whole selector story: embedded-path insertion,
// field lookup, method lookup with implicit &/* receiver adjustment, and
// method expressions on type names. `implements` answers the
// interface-satisfaction question with enough detail for the three
// type-assertion diagnostics.

use rustc_hash::FxHashSet;
use stoat_frontend::{NodeId, NodeKind, SymId, TypeId};

use crate::check::{Checker, Ctx};
use crate::errors::SemanticError;
use crate::type_arena::{Field, TypeKind};

/// Why an implementation check failed.
pub struct ImplFail {
    /// The interface method not satisfied.
    pub missing: Field,
    /// A same-named method that was found but did not match.
    pub have: Option<Field>,
    /// The method exists but requires a pointer receiver.
    pub ptr: bool,
}

/// A method reachable on a type, with how it was reached.
#[derive(Clone)]
pub(crate) struct MethodEntry {
    pub field: Field,
    /// Promoted from an embedded interface; receiver rules do not apply.
    pub via_inter: bool,
}

enum LookRes {
    Found,
    NotFound,
    Errored,
}

impl<'a> Checker<'a> {
    pub(crate) fn tc_dot(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let (x0, sel) = match self.nodes[n].kind.clone() {
            NodeKind::Dot { x, sel } | NodeKind::DotPtr { x, sel } => (x, sel),
            _ => unreachable!(),
        };
        let mut x = self.typecheck(x0, Ctx::RV | Ctx::TYPE);
        self.defaultlit(x, None);
        self.set_dot_x(n, x);
        let Some(mut t) = self.ty(x) else {
            return Err(());
        };

        // Method expression: T.M
        if matches!(self.nodes[x].kind, NodeKind::TypeExpr) {
            return self.tc_typedot(n, x, sel, t);
        }

        // Insert the dots for a uniquely promoted selector.
        match self.adddot(n, x, sel, t) {
            Ok(Some(new_x)) => {
                x = new_x;
                self.set_dot_x(n, x);
                t = self.ty(x).ok_or(())?;
            }
            Ok(None) => {}
            Err(()) => return Err(()),
        }

        if let TypeKind::Ptr(elem) = *self.types.kind(t) {
            if !self.types.is_inter(elem) {
                t = elem;
                self.nodes[n].kind = NodeKind::DotPtr { x, sel };
            }
        }

        if self.syms.is_blank(sel) {
            self.error_at(
                n,
                SemanticError::BlankSelector {
                    span: self.span_of(n),
                },
            );
            return Err(());
        }

        if !self.lookdot(n, t, false)? {
            if self.lookdot(n, t, true)? {
                let expr = self.node_str(n);
                let name = self.syms.name(sel).to_string();
                self.error_at(
                    n,
                    SemanticError::UnexportedFieldOrMethod {
                        expr,
                        name,
                        span: self.span_of(n),
                    },
                );
            } else {
                let expr = self.node_str(n);
                let ty = self.ty(x).map(|t| self.type_str(t)).unwrap_or_default();
                let name = self.syms.name(sel).to_string();
                self.error_at(
                    n,
                    SemanticError::NoFieldOrMethod {
                        expr,
                        ty,
                        name,
                        span: self.span_of(n),
                    },
                );
            }
            return Err(());
        }

        match self.nodes[n].kind {
            NodeKind::DotInter { .. } | NodeKind::DotMeth { .. } => {
                if top.has(Ctx::CALL) {
                    Ok(Ctx::CALL)
                } else {
                    // A method value: usable as a func-typed value.
                    Ok(Ctx::RV)
                }
            }
            _ => Ok(Ctx::RV),
        }
    }

    fn set_dot_x(&mut self, n: NodeId, new: NodeId) {
        match &mut self.nodes[n].kind {
            NodeKind::Dot { x, .. }
            | NodeKind::DotPtr { x, .. }
            | NodeKind::DotInter { x, .. }
            | NodeKind::DotMeth { x, .. } => *x = new,
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Method expressions
    // ------------------------------------------------------------------

    fn tc_typedot(&mut self, n: NodeId, x: NodeId, sel: SymId, t: TypeId) -> Result<Ctx, ()> {
        match self.looktypedot(n, sel, t, false) {
            LookRes::Found => {}
            LookRes::Errored => return Err(()),
            LookRes::NotFound => {
                match self.looktypedot(n, sel, t, true) {
                    LookRes::Found => {
                        let expr = self.node_str(n);
                        let name = self.syms.name(sel).to_string();
                        self.error_at(
                            n,
                            SemanticError::UnexportedMethod {
                                expr,
                                name,
                                span: self.span_of(n),
                            },
                        );
                    }
                    _ => {
                        let expr = self.node_str(n);
                        let ty = self.type_str(t);
                        let name = self.syms.name(sel).to_string();
                        self.error_at(
                            n,
                            SemanticError::NoMethod {
                                expr,
                                ty,
                                name,
                                span: self.span_of(n),
                            },
                        );
                    }
                }
                return Err(());
            }
        }

        let Some(mt) = self.nodes[n].ty else {
            return Err(());
        };
        if !matches!(self.types.kind(mt), TypeKind::Func { .. }) {
            let ty = self.type_str(t);
            let name = self.syms.name(sel).to_string();
            self.error_at(
                n,
                SemanticError::TypeHasNoMethod {
                    ty,
                    name,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }

        // The method expression becomes a func-typed name whose first
        // parameter is the receiver.
        let recv_ty = self.ty(x).unwrap_or(t);
        let ft = self.methodfunc(mt, recv_ty);
        self.nodes[n].kind = NodeKind::Name;
        self.nodes[n].sym = Some(sel);
        self.nodes[n].class = stoat_frontend::Class::Func;
        self.nodes[n].ty = Some(ft);
        Ok(Ctx::RV)
    }

    /// The type of a method expression: the receiver becomes the leading
    /// parameter.
    fn methodfunc(&mut self, sig: TypeId, recv: TypeId) -> TypeId {
        let (params, results) = match self.types.kind(sig) {
            TypeKind::Func {
                params, results, ..
            } => (params.clone(), results.clone()),
            _ => return sig,
        };
        let mut all = crate::type_arena::FieldVec::new();
        all.push(Field::new(None, recv));
        all.extend(params);
        self.types.func_type(None, all, results)
    }

    fn looktypedot(&mut self, n: NodeId, sel: SymId, t: TypeId, strcmp: bool) -> LookRes {
        if self.types.is_inter(t) {
            let methods = self.types.inter_methods(t).cloned().unwrap_or_default();
            let Some(f) = self.lookdot1(Some(n), sel, t, methods.as_slice(), strcmp) else {
                return LookRes::NotFound;
            };
            // Interface method signatures carry no receiver; graft one on
            // so the method-expression check sees a real method type.
            let ft = match self.types.kind(f.ty) {
                TypeKind::Func {
                    params, results, ..
                } => {
                    let (p, r) = (params.clone(), results.clone());
                    self.types.func_type(Some(Field::new(None, t)), p, r)
                }
                _ => f.ty,
            };
            self.nodes[n].ty = Some(ft);
            self.nodes[n].kind = match self.nodes[n].kind.clone() {
                NodeKind::Dot { x, sel } | NodeKind::DotPtr { x, sel } => {
                    NodeKind::DotInter { x, sel }
                }
                k => k,
            };
            return LookRes::Found;
        }

        let Some(carrier) = self.methtype(t) else {
            return LookRes::NotFound;
        };
        let methods = self.expandmeth(carrier);
        let fields: Vec<Field> = methods.iter().map(|m| m.field.clone()).collect();
        let Some(f) = self.lookdot1(Some(n), sel, t, &fields, strcmp) else {
            return LookRes::NotFound;
        };
        let entry = methods
            .iter()
            .find(|m| m.field.sym == f.sym)
            .cloned()
            .expect("method entry disappeared");

        // Disallow T.m if m requires a *T receiver.
        if !entry.via_inter && !self.types.is_ptr(t) {
            if let Some((Some(recv), _, _)) = self
                .types
                .func_parts(f.ty)
                .map(|(r, p, o)| (r.clone(), p.clone(), o.clone()))
            {
                if self.types.is_ptr(recv.ty) {
                    let expr = self.node_str(n);
                    let ty = self.type_str(t);
                    let name = self.syms.name(sel).to_string();
                    self.error_at(
                        n,
                        SemanticError::MethodExprNeedsPtr {
                            expr,
                            ty,
                            name,
                            span: self.span_of(n),
                        },
                    );
                    self.nodes[n].diag = true;
                    return LookRes::Errored;
                }
            }
        }

        self.nodes[n].ty = Some(f.ty);
        self.nodes[n].kind = match self.nodes[n].kind.clone() {
            NodeKind::Dot { x, sel } | NodeKind::DotPtr { x, sel } => NodeKind::DotMeth { x, sel },
            k => k,
        };
        LookRes::Found
    }

    // ------------------------------------------------------------------
    // Field chains
    // ------------------------------------------------------------------

    /// Scan a field chain for `sel`. Ambiguity (two hits) is diagnosed.
    fn lookdot1(
        &mut self,
        errnode: Option<NodeId>,
        sel: SymId,
        t: TypeId,
        fields: &[Field],
        strcmp: bool,
    ) -> Option<Field> {
        let mut r: Option<Field> = None;
        for f in fields {
            if strcmp {
                let matches = f
                    .sym
                    .map(|s| self.syms.name(s) == self.syms.name(sel))
                    .unwrap_or(false);
                if matches {
                    return Some(f.clone());
                }
                continue;
            }
            if f.sym != Some(sel) {
                continue;
            }
            if r.is_some() {
                let expr = match errnode {
                    Some(e) => self.node_str(e),
                    None => format!("{}.{}", self.type_str(t), self.syms.name(sel)),
                };
                let span = errnode
                    .map(|e| self.nodes[e].span)
                    .unwrap_or_default();
                self.error(
                    span,
                    SemanticError::AmbiguousSelector {
                        expr,
                        span: span.into(),
                    },
                );
                break;
            }
            r = Some(f.clone());
        }
        r
    }

    /// Resolve the selector of `n` against `t`: fields first, then the
    /// method set, with implicit receiver adjustment. Returns Ok(true)
    /// when resolved.
    fn lookdot(&mut self, n: NodeId, t: TypeId, strcmp: bool) -> Result<bool, ()> {
        let (x, sel) = match self.nodes[n].kind.clone() {
            NodeKind::Dot { x, sel }
            | NodeKind::DotPtr { x, sel }
            | NodeKind::DotInter { x, sel }
            | NodeKind::DotMeth { x, sel } => (x, sel),
            _ => unreachable!(),
        };

        let f1 = match self.types.kind(t) {
            TypeKind::Struct { fields, .. } => {
                let fields = fields.clone();
                self.lookdot1(Some(n), sel, t, fields.as_slice(), strcmp)
            }
            TypeKind::Inter { methods } => {
                let methods = methods.clone();
                self.lookdot1(Some(n), sel, t, methods.as_slice(), strcmp)
            }
            _ => None,
        };

        let left_ty = self.ty(x).ok_or(())?;
        let mut f2 = None;
        if left_ty == t || self.types.sym(left_ty).is_none() {
            if let Some(carrier) = self.methtype(t) {
                // Direct methods only: the embedded dots for promoted
                // methods were already inserted.
                let methods: Vec<Field> = self.types.methods(carrier).to_vec();
                f2 = self.lookdot1(Some(n), sel, t, &methods, strcmp);
            }
        }

        if let Some(f) = f1 {
            if f2.is_some() {
                let name = self.syms.name(sel).to_string();
                self.error_at(
                    n,
                    SemanticError::BothFieldAndMethod {
                        name,
                        span: self.span_of(n),
                    },
                );
            }
            self.nodes[n].ty = Some(f.ty);
            if self.types.is_inter(t) {
                if self.types.is_ptr(left_ty) {
                    let span = self.nodes[x].span;
                    let d = self.nodes.alloc(NodeKind::Deref { x }, span);
                    self.nodes[d].implicit = true;
                    let d = self.typecheck(d, Ctx::RV);
                    self.set_dot_x(n, d);
                }
                self.nodes[n].kind = match self.nodes[n].kind.clone() {
                    NodeKind::Dot { x, sel } | NodeKind::DotPtr { x, sel } => {
                        NodeKind::DotInter { x, sel }
                    }
                    k => k,
                };
            }
            return Ok(true);
        }

        if let Some(f) = f2 {
            // Adjust the receiver to the method's exact shape.
            let recv = match self
                .types
                .func_parts(f.ty)
                .and_then(|(r, _, _)| r.clone())
            {
                Some(r) => r.ty,
                None => return Err(()),
            };
            let mut xx = x;
            let tt = self.ty(xx).ok_or(())?;
            if !self.types.eqtype(recv, tt) {
                if let TypeKind::Ptr(re) = *self.types.kind(recv) {
                    if self.types.eqtype(re, tt) {
                        self.checklvalue(xx, "call pointer method on");
                        let span = self.nodes[xx].span;
                        let a = self.nodes.alloc(NodeKind::Addr { x: xx }, span);
                        self.nodes[a].implicit = true;
                        xx = self.typecheck(a, Ctx::TYPE | Ctx::RV);
                        self.set_dot_x(n, xx);
                    } else {
                        self.lookdot_deref_chain(n, &mut xx, recv, tt)?;
                    }
                } else if let TypeKind::Ptr(te) = *self.types.kind(tt) {
                    if self.types.eqtype(te, recv) {
                        let span = self.nodes[xx].span;
                        let d = self.nodes.alloc(NodeKind::Deref { x: xx }, span);
                        self.nodes[d].implicit = true;
                        xx = self.typecheck(d, Ctx::TYPE | Ctx::RV);
                        self.set_dot_x(n, xx);
                    } else {
                        self.lookdot_deref_chain(n, &mut xx, recv, tt)?;
                    }
                } else {
                    panic!(
                        "method mismatch: {} for {}",
                        self.type_str(recv),
                        self.type_str(tt)
                    );
                }
            }
            self.nodes[n].ty = Some(f.ty);
            self.nodes[n].kind = match self.nodes[n].kind.clone() {
                NodeKind::Dot { x, sel } | NodeKind::DotPtr { x, sel } => {
                    NodeKind::DotMeth { x, sel }
                }
                k => k,
            };
            return Ok(true);
        }

        Ok(false)
    }

    /// The receiver is a pointer to a pointer: reject with the explicit
    /// dereference diagnostic, stripping indirections as the original
    /// does.
    fn lookdot_deref_chain(
        &mut self,
        n: NodeId,
        xx: &mut NodeId,
        recv: TypeId,
        tt: TypeId,
    ) -> Result<(), ()> {
        let deref_all = |types: &crate::type_arena::TypeArena, mut t: TypeId| {
            while let TypeKind::Ptr(e) = types.kind(t) {
                t = *e;
            }
            t
        };
        let inner_t = {
            let k = self.types.kind(tt);
            if let TypeKind::Ptr(e) = k {
                matches!(self.types.kind(*e), TypeKind::Ptr(_))
            } else {
                false
            }
        };
        if inner_t && self.types.eqtype(
            deref_all(&self.types, tt),
            deref_all(&self.types, recv),
        ) {
            let (sel_str, recv_str) = {
                let sel = match self.nodes[n].kind.clone() {
                    NodeKind::Dot { sel, .. } | NodeKind::DotPtr { sel, .. } => {
                        self.syms.name(sel).to_string()
                    }
                    _ => String::new(),
                };
                (sel, self.node_str_long(*xx))
            };
            self.error_at(
                n,
                SemanticError::ExplicitDerefRequired {
                    method: sel_str,
                    recv: recv_str,
                    span: self.span_of(n),
                },
            );
            let mut tt = tt;
            loop {
                let TypeKind::Ptr(te) = *self.types.kind(tt) else {
                    break;
                };
                // Stop one level early for a method with pointer receiver.
                if self.types.is_ptr(recv) && !self.types.is_ptr(te) {
                    break;
                }
                let span = self.nodes[*xx].span;
                let d = self.nodes.alloc(NodeKind::Deref { x: *xx }, span);
                self.nodes[d].implicit = true;
                *xx = self.typecheck(d, Ctx::TYPE | Ctx::RV);
                self.set_dot_x(n, *xx);
                tt = te;
            }
            Ok(())
        } else {
            panic!(
                "method mismatch: {} for {}",
                self.type_str(recv),
                self.type_str(tt)
            );
        }
    }

    // ------------------------------------------------------------------
    // Method sets
    // ------------------------------------------------------------------

    /// The named type carrying methods for `t`: `t` itself, or the
    /// pointee of an unnamed pointer to a named type.
    pub(crate) fn methtype(&self, t: TypeId) -> Option<TypeId> {
        let mut t = t;
        if let TypeKind::Ptr(elem) = self.types.kind(t) {
            if self.types.sym(t).is_some() {
                return None;
            }
            t = *elem;
        }
        if self.types.sym(t).is_none() {
            return None;
        }
        if self.types.is_inter(t) || self.types.is_ptr(t) {
            return None;
        }
        Some(t)
    }

    /// The full method set of a named type: direct methods plus methods
    /// promoted through embedded fields, nearest depth wins, same-depth
    /// conflicts dropped.
    pub(crate) fn expandmeth(&self, named: TypeId) -> Vec<MethodEntry> {
        let mut out: Vec<MethodEntry> = self
            .types
            .methods(named)
            .iter()
            .map(|f| MethodEntry {
                field: f.clone(),
                via_inter: false,
            })
            .collect();

        let mut seen: FxHashSet<TypeId> = FxHashSet::default();
        seen.insert(named);
        let mut frontier = vec![named];

        for _depth in 0..8 {
            let mut next = Vec::new();
            let mut level: Vec<MethodEntry> = Vec::new();
            for &t in &frontier {
                for f in self.embedded_of(t) {
                    let et = self.strip_ptr(f.ty);
                    if !seen.insert(et) {
                        continue;
                    }
                    next.push(et);
                    if let Some(ms) = self.types.inter_methods(et) {
                        for m in ms {
                            level.push(MethodEntry {
                                field: m.clone(),
                                via_inter: true,
                            });
                        }
                    } else {
                        for m in self.types.methods(et) {
                            level.push(MethodEntry {
                                field: m.clone(),
                                via_inter: false,
                            });
                        }
                    }
                }
            }
            // Same-depth conflicts cancel each other; nearer depths win.
            for m in &level {
                let name = m.field.sym;
                let dup_here = level
                    .iter()
                    .filter(|o| o.field.sym == name)
                    .count()
                    > 1;
                let shadowed = out.iter().any(|o| o.field.sym == name);
                if !dup_here && !shadowed {
                    out.push(m.clone());
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        out
    }

    fn embedded_of(&self, t: TypeId) -> Vec<Field> {
        match self.types.kind(t) {
            TypeKind::Struct { fields, .. } => fields
                .iter()
                .filter(|f| f.embedded)
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }

    fn strip_ptr(&self, t: TypeId) -> TypeId {
        match self.types.kind(t) {
            TypeKind::Ptr(e) => *e,
            _ => t,
        }
    }

    /// Fields of `t`, looking through one pointer.
    fn fields_of(&self, t: TypeId) -> Vec<Field> {
        let t = self.strip_ptr(t);
        match self.types.kind(t) {
            TypeKind::Struct { fields, .. } => fields.to_vec(),
            TypeKind::Inter { methods } => methods.to_vec(),
            _ => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Embedded-path insertion
    // ------------------------------------------------------------------

    /// Find the unique embedding path to `sel` in `t` and rewrite the dot
    /// chain through it. Ok(Some(x)) is the new, deeper left side.
    fn adddot(
        &mut self,
        n: NodeId,
        x: NodeId,
        sel: SymId,
        t: TypeId,
    ) -> Result<Option<NodeId>, ()> {
        let base = self.strip_ptr(t);
        if self.lookdot0(sel, base) > 0 {
            return Ok(None);
        }

        for depth in 1..=7usize {
            let mut path = Vec::new();
            let mut seen = FxHashSet::default();
            let c = self.adddot1(sel, base, depth, &mut path, &mut seen);
            if c == 1 {
                let mut cur = x;
                for sym in path.into_iter().rev() {
                    let span = self.nodes[cur].span;
                    let d = self.nodes.alloc(NodeKind::Dot { x: cur, sel: sym }, span);
                    self.nodes[d].implicit = true;
                    cur = self.typecheck(d, Ctx::RV);
                }
                if self.ty(cur).is_none() {
                    return Err(());
                }
                return Ok(Some(cur));
            }
            if c > 1 {
                let expr = self.node_str(n);
                self.error_at(
                    n,
                    SemanticError::AmbiguousSelector {
                        expr,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
        }
        Ok(None)
    }

    /// Count the ways `sel` is reachable at exactly `depth` embeddings,
    /// recording the path when unique so far.
    fn adddot1(
        &self,
        sel: SymId,
        t: TypeId,
        depth: usize,
        path: &mut Vec<SymId>,
        seen: &mut FxHashSet<TypeId>,
    ) -> usize {
        if !seen.insert(t) {
            return 0;
        }
        let c = if depth == 0 {
            self.lookdot0(sel, t)
        } else {
            let mut c = 0;
            for f in self.embedded_of(t) {
                let Some(fsym) = f.sym else { continue };
                let et = self.strip_ptr(f.ty);
                let sub = self.adddot1(sel, et, depth - 1, path, seen);
                if sub > 0 && c == 0 {
                    path.push(fsym);
                }
                c += sub;
            }
            c
        };
        seen.remove(&t);
        c
    }

    /// How many direct fields or methods named `sel` does `t` have?
    fn lookdot0(&self, sel: SymId, t: TypeId) -> usize {
        let mut c = 0;
        for f in self.fields_of(t) {
            if f.sym == Some(sel) {
                c += 1;
            }
        }
        if let Some(carrier) = self.methtype(t) {
            for m in self.types.methods(carrier) {
                if m.sym == Some(sel) {
                    c += 1;
                }
            }
        }
        c
    }

    // ------------------------------------------------------------------
    // Interface satisfaction
    // ------------------------------------------------------------------

    pub(crate) fn implements(&self, t: TypeId, iface: TypeId) -> Result<(), ImplFail> {
        let Some(imethods) = self.types.inter_methods(iface) else {
            return Ok(());
        };
        if self.types.broke(iface) || self.types.broke(t) {
            return Ok(());
        }

        if let Some(tmethods) = self.types.inter_methods(t) {
            for im in imethods {
                match tmethods.iter().find(|m| m.sym == im.sym) {
                    Some(m) if self.eq_method_sig(m.ty, im.ty) => {}
                    Some(m) => {
                        return Err(ImplFail {
                            missing: im.clone(),
                            have: Some(m.clone()),
                            ptr: false,
                        })
                    }
                    None => {
                        return Err(ImplFail {
                            missing: im.clone(),
                            have: None,
                            ptr: false,
                        })
                    }
                }
            }
            return Ok(());
        }

        let methods = match self.methtype(t) {
            Some(carrier) => self.expandmeth(carrier),
            None => Vec::new(),
        };
        for im in imethods {
            let found = methods.iter().find(|m| m.field.sym == im.sym);
            match found {
                None => {
                    return Err(ImplFail {
                        missing: im.clone(),
                        have: None,
                        ptr: false,
                    })
                }
                Some(m) => {
                    if !self.eq_method_sig(m.field.ty, im.ty) {
                        return Err(ImplFail {
                            missing: im.clone(),
                            have: Some(m.field.clone()),
                            ptr: false,
                        });
                    }
                    if !m.via_inter && !self.types.is_ptr(t) {
                        let ptr_recv = self
                            .types
                            .func_parts(m.field.ty)
                            .and_then(|(r, _, _)| r.as_ref().map(|r| self.types.is_ptr(r.ty)))
                            .unwrap_or(false);
                        if ptr_recv {
                            return Err(ImplFail {
                                missing: im.clone(),
                                have: Some(m.field.clone()),
                                ptr: true,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Method signatures match ignoring the receiver.
    fn eq_method_sig(&self, a: TypeId, b: TypeId) -> bool {
        let (Some((_, ap, ar)), Some((_, bp, br))) =
            (self.types.func_parts(a), self.types.func_parts(b))
        else {
            return false;
        };
        ap.len() == bp.len()
            && ar.len() == br.len()
            && ap
                .iter()
                .zip(bp.iter())
                .all(|(x, y)| x.ddd == y.ddd && self.types.eqtype(x.ty, y.ty))
            && ar
                .iter()
                .zip(br.iter())
                .all(|(x, y)| self.types.eqtype(x.ty, y.ty))
    }
}
