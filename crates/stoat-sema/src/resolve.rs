// resolve.rs
//
// Name resolution and per-definition checking.
//
// `resolve` lazily chases a raw name to its definition (substituting the
// current iota value for the iota pseudo-constant). `typecheckdef` types a
// top-level name exactly once, gated by the three-state walkdef flag;
// re-entering a definition that is still being defined is a definition
// cycle. Interface methods and map key types that referenced an
// in-progress type are parked on explicit work lists and drained when the
// definition-depth counter returns to one.

use stoat_frontend::{Const, NodeId, NodeKind, TcState, TypeId, WalkState};
use tracing::debug;

use crate::check::{Checker, Ctx};
use crate::errors::SemanticError;
use crate::type_arena::TypeKind;

impl<'a> Checker<'a> {
    /// Resolve a raw name to its definition, if any.
    pub(crate) fn resolve(&mut self, n: NodeId) -> NodeId {
        if !matches!(self.nodes[n].kind, NodeKind::RawName) {
            return n;
        }
        let Some(sym) = self.nodes[n].sym else {
            return n;
        };
        let Some(def) = self.syms.def(sym) else {
            return n;
        };
        if !matches!(self.nodes[def].kind, NodeKind::Iota) {
            // Constants hand every use site its own copy: the use may be
            // coerced to a concrete type, and the definition must stay
            // untyped for the next use. The copy's definition check is
            // redirected to the canonical node.
            if self.nodes[def].is_lit() {
                let c = self.nodes.shadow(def);
                self.nodes[c].typecheck = TcState::Unchecked;
                self.nodes[c].walkdef = WalkState::Unvisited;
                self.nodes[c].defn = None;
                self.nodes[c].orig = None;
                return c;
            }
            return def;
        }
        if let Some(i) = self.nodes[n].iota {
            let span = self.nodes[n].span;
            let lit = self.nodes.alloc(NodeKind::Lit, span);
            self.nodes[lit].val = Some(Const::Int(i as i128));
            self.nodes[lit].ty = Some(TypeId::IDEAL_INT);
            return lit;
        }
        n
    }

    /// Type a top-level name (const, var, type) exactly once.
    pub(crate) fn typecheckdef(&mut self, n: NodeId) {
        if matches!(self.nodes[n].kind, NodeKind::RawName) {
            if !self.nodes[n].diag {
                self.nodes[n].diag = true;
                let name = self
                    .nodes[n]
                    .sym
                    .map(|s| self.syms.name(s).to_string())
                    .unwrap_or_default();
                self.error_at(
                    n,
                    SemanticError::Undefined {
                        name,
                        span: self.span_of(n),
                    },
                );
            }
            return;
        }

        // A constant use resolved to a copy of its definition: define the
        // canonical node once and take its value and type.
        if let Some(sym) = self.nodes[n].sym {
            if let Some(canon) = self.syms.def(sym) {
                if canon != n && self.nodes[n].is_lit() && self.nodes[canon].is_lit() {
                    self.typecheckdef(canon);
                    self.nodes[n].val = self.nodes[canon].val.clone();
                    self.nodes[n].ty = self.nodes[canon].ty;
                    if self.nodes[canon].diag {
                        self.nodes[n].diag = true;
                    }
                    self.nodes[n].walkdef = WalkState::Defined;
                    return;
                }
            }
        }

        if self.nodes[n].walkdef == WalkState::Defined {
            return;
        }

        self.def_stack.push(n);

        if self.nodes[n].walkdef == WalkState::Defining {
            self.def_cycle(n);
            self.def_stack.pop();
            return;
        }

        self.nodes[n].walkdef = WalkState::Defining;
        debug!(name = ?self.nodes[n].sym.map(|s| self.syms.name(s).to_string()), "checking definition");

        if self.nodes[n].ty.is_none() && self.nodes[n].sym.is_some() {
            match self.nodes[n].kind {
                NodeKind::Lit => self.def_const(n),
                NodeKind::Name => self.def_var(n),
                NodeKind::TypeExpr => self.def_type(n),
                NodeKind::Label { .. } | NodeKind::Goto { .. } => {}
                ref k => panic!("typecheckdef {:?}", k),
            }
        }

        if !self.nodes[n].is_lit() {
            if let Some(t) = self.nodes[n].ty {
                if t.is_untyped() {
                    panic!(
                        "got {} for {}",
                        self.type_str(t),
                        self.node_str(n)
                    );
                }
            }
        }

        match self.def_stack.pop() {
            Some(popped) if popped == n => {}
            _ => panic!("typecheckdef stack mismatch"),
        }
        self.nodes[n].walkdef = WalkState::Defined;
    }

    /// A definition re-entered while still being defined. For constants
    /// this prints the dependency chain of in-progress definitions from
    /// the start of the cycle back to the offender.
    fn def_cycle(&mut self, n: NodeId) {
        if self.nodes[n].is_lit() {
            let mut chain = String::new();
            if let Some(start) = self.def_stack.iter().position(|&x| x == n) {
                for w in self.def_stack[start..].windows(2) {
                    chain.push_str(&format!(
                        "\n\t{}: {} uses {}",
                        self.nodes[w[0]].span.line,
                        self.node_str(w[0]),
                        self.node_str(w[1])
                    ));
                }
            }
            self.error_at(
                n,
                SemanticError::ConstDefinitionLoop {
                    chain,
                    span: self.span_of(n),
                },
            );
        } else {
            let mut chain = String::new();
            for &l in self.def_stack.iter().rev() {
                if let Some(s) = self.nodes[l].sym {
                    chain.push_str(&format!("\n\t{}", self.syms.name(s)));
                }
            }
            self.error_at(
                n,
                SemanticError::InitializationLoop {
                    chain,
                    span: self.span_of(n),
                },
            );
        }
        self.nodes[n].diag = true;
    }

    /// Constant definition: the initializer must be a compile-time
    /// constant of a kind valid for the declared type; its value and type
    /// are copied onto the name.
    fn def_const(&mut self, n: NodeId) {
        if let Some(nt) = self.nodes[n].ntype {
            let nt = self.typecheck(nt, Ctx::TYPE);
            self.nodes[n].ty = self.nodes[nt].ty;
            self.nodes[n].ntype = None;
            if self.nodes[n].ty.is_none() {
                self.nodes[n].diag = true;
                return;
            }
        }

        let Some(e) = self.nodes[n].defn else {
            panic!("constant definition without initializer: {}", self.node_str(n));
        };
        self.nodes[n].defn = None;

        let e = self.typecheck(e, Ctx::RV | Ctx::IOTA);

        if matches!(self.nodes[e].val, Some(Const::Nil)) {
            self.error_at(
                e,
                SemanticError::ConstInitNil {
                    span: self.span_of(e),
                },
            );
            return;
        }

        if !self.is_go_const(e) {
            if !self.nodes[e].diag {
                let expr = self.node_str(e);
                self.error_at(
                    e,
                    SemanticError::ConstInitNotConstant {
                        expr,
                        span: self.span_of(e),
                    },
                );
                self.nodes[e].diag = true;
            }
            return;
        }

        if let Some(t) = self.nodes[n].ty {
            if !ok_for_const(t) {
                let ty = self.type_str(t);
                self.error_at(
                    n,
                    SemanticError::InvalidConstType {
                        ty,
                        span: self.span_of(n),
                    },
                );
                return;
            }
            let et = self.nodes[e].ty;
            if let Some(et) = et {
                if !et.is_untyped() && !self.types.eqtype(t, et) {
                    let expr = self.node_str_long(e);
                    let ty = self.type_str(t);
                    self.error_at(
                        e,
                        SemanticError::ConstInitWrongType {
                            expr,
                            ty,
                            span: self.span_of(e),
                        },
                    );
                    return;
                }
            }
            self.convlit(e, t, false);
        }

        self.nodes[n].val = self.nodes[e].val.clone();
        self.nodes[n].ty = self.nodes[e].ty;
    }

    /// Variable definition: an explicit type wins; otherwise the type
    /// comes from the defining statement.
    fn def_var(&mut self, n: NodeId) {
        if let Some(nt) = self.nodes[n].ntype {
            let nt = self.typecheck(nt, Ctx::TYPE);
            self.nodes[n].ntype = Some(nt);
            self.nodes[n].ty = self.nodes[nt].ty;
            if self.nodes[n].ty.is_none() {
                self.nodes[n].diag = true;
                return;
            }
        }

        if self.nodes[n].ty.is_some() {
            return;
        }

        let Some(defn) = self.nodes[n].defn else {
            if self.nodes[n].builtin.is_some() {
                return;
            }
            if !self.errors.is_empty() {
                // Undefined names on the right of := leave their targets
                // without a defining statement; the earlier diagnostic is
                // enough.
                return;
            }
            panic!("var without type, init: {}", self.node_str(n));
        };

        if matches!(self.nodes[defn].kind, NodeKind::Name) {
            self.typecheck(defn, Ctx::RV);
            self.nodes[n].ty = self.nodes[defn].ty;
            return;
        }

        self.typecheck(defn, Ctx::TOP); // fills in the type
    }

    /// Type definition: allocate a forward placeholder, check the
    /// definition, then patch the placeholder in place so references taken
    /// earlier are retroactively well-typed.
    fn def_type(&mut self, n: NodeId) {
        let sym = self.nodes[n].sym.expect("type definition without name");
        self.nodes[n].walkdef = WalkState::Defined;
        self.nodes[n].ty = Some(self.types.named_forward(sym));
        let errs0 = self.errors.len();
        self.typecheckdeftype(n);
        if let Some(t) = self.nodes[n].ty {
            if matches!(self.types.kind(t), TypeKind::Forward) && self.errors.len() > errs0 {
                // Something went wrong and was reported; silence future
                // errors from this type.
                self.types.set_broke(t);
            }
        }
    }

    fn typecheckdeftype(&mut self, n: NodeId) {
        self.def_depth += 1;
        self.nodes[n].typecheck = TcState::Done;

        let nt = self.nodes[n].ntype;
        match nt {
            Some(nt) => {
                let nt = self.typecheck(nt, Ctx::TYPE);
                self.nodes[n].ntype = Some(nt);
                match (self.nodes[nt].ty, self.nodes[n].ty) {
                    (Some(src), Some(slot)) => self.types.patch_named(slot, src),
                    _ => {
                        self.nodes[n].diag = true;
                        self.nodes[n].ty = None;
                    }
                }
            }
            None => {
                self.nodes[n].diag = true;
                self.nodes[n].ty = None;
            }
        }

        // If there are no type definitions going on, it's safe to resolve
        // the method types for the interfaces we just read.
        if self.def_depth == 1 {
            loop {
                let queue = std::mem::take(&mut self.method_queue);
                if queue.is_empty() {
                    break;
                }
                debug!(pending = queue.len(), "draining deferred interface methods");
                for m in queue {
                    self.domethod(m);
                }
            }

            let maps = std::mem::take(&mut self.map_queue);
            for (mt, span) in maps {
                if let Some(key) = self.types.map_key(mt) {
                    if self.types.incomparable(key).is_some() {
                        let ty = self.type_str(key);
                        self.error(
                            span,
                            SemanticError::InvalidMapKeyType {
                                ty,
                                span: span.into(),
                            },
                        );
                    }
                }
            }
        }

        self.def_depth -= 1;
    }

    /// Finish a deferred interface method: check its signature and settle
    /// the placeholder slot its interface already points at.
    pub(crate) fn domethod(&mut self, field: NodeId) {
        let slot = self.nodes[field].ty.expect("queued method without slot");
        let sig = match self.nodes[field].kind {
            NodeKind::Field { ty: Some(sig), .. } => sig,
            _ => panic!("queued method without signature"),
        };
        let sig = self.typecheck(sig, Ctx::TYPE);
        match self.nodes[sig].ty {
            Some(src) => {
                self.types.patch_named(slot, src);
                // A blank parameter name would suppress the assignment of
                // that argument in calls through the interface; a specific
                // implementation may care, so drop the name.
                self.types.clear_blank_params(slot, self.syms);
            }
            None => {
                // Type check failed; leave an empty func type behind.
                let empty = self.types.func_type(None, Default::default(), Default::default());
                self.types.patch_named(slot, empty);
            }
        }
    }

    pub(crate) fn queue_method(&mut self, field: NodeId) {
        if self.def_depth == 0 {
            self.domethod(field);
        } else {
            self.method_queue.push(field);
        }
    }

    /// Mint a map type, deferring the key comparability check while the
    /// key type is still settling.
    pub(crate) fn make_map_type(&mut self, key: TypeId, val: TypeId, n: NodeId) -> TypeId {
        let mt = self.types.map_of(key, val);
        if matches!(self.types.kind(key), TypeKind::Forward) {
            let span = self.nodes[n].span;
            self.map_queue.push((mt, span));
        } else if self.types.incomparable(key).is_some() {
            let ty = self.type_str(key);
            self.error_at(
                n,
                SemanticError::InvalidMapKeyType {
                    ty,
                    span: self.span_of(n),
                },
            );
        }
        mt
    }
}

/// Kinds a declared constant may have.
fn ok_for_const(t: TypeId) -> bool {
    t.is_integer() || t.is_float() || t.is_complex() || t == TypeId::BOOL || t == TypeId::STRING
}
