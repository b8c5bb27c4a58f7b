// expr.rs
//
// Operator typing rules for expressions and type expressions. Every rule
// computes the roles the node may play and leaves the node's type (or
// None after a reported error) behind; the trunk in check.rs enforces the
// caller's context afterwards.

use stoat_frontend::{BinOp, Const, NodeId, NodeKind, TcState, TypeId, UnOp};

use crate::check::{Checker, Ctx};
use crate::errors::SemanticError;
use crate::type_arena::{EType, Field, FieldVec, TypeKind};

impl<'a> Checker<'a> {
    // ------------------------------------------------------------------
    // Names and literals
    // ------------------------------------------------------------------

    pub(crate) fn tc_lit(&mut self, n: NodeId) -> Result<Ctx, ()> {
        if self.nodes[n].ty.is_none() {
            if let Some(Const::Str(_)) = self.nodes[n].val {
                self.nodes[n].ty = Some(TypeId::IDEAL_STRING);
            }
        }
        Ok(Ctx::RV)
    }

    pub(crate) fn tc_name(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        if self.nodes[n].decldepth == 0 {
            self.nodes[n].decldepth = self.decl_depth;
        }
        if self.nodes[n].builtin.is_some() {
            return Ok(Ctx::CALL);
        }

        if !top.has(Ctx::ASGN) {
            // Not a write to the variable.
            if self
                .nodes[n]
                .sym
                .map(|s| self.syms.is_blank(s))
                .unwrap_or(false)
            {
                self.error_at(
                    n,
                    SemanticError::BlankAsValue {
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            self.nodes[n].used = true;
        }

        Ok(Ctx::RV)
    }

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------

    fn become_type(&mut self, n: NodeId, t: TypeId) {
        self.nodes[n].kind = NodeKind::TypeExpr;
        self.nodes[n].ty = Some(t);
    }

    pub(crate) fn tc_tarray(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let t = match self.nodes[n].kind.clone() {
            NodeKind::TSlice { elem } => {
                let elem = self.typecheck(elem, Ctx::TYPE);
                let et = self.ty(elem).ok_or(())?;
                self.types.slice_of(et)
            }
            NodeKind::TArrayDdd { elem } => {
                let elem = self.typecheck(elem, Ctx::TYPE);
                let et = self.ty(elem).ok_or(())?;
                let t = self.types.unfilled_array(et);
                if !top.has(Ctx::COMPLIT) && !self.nodes[n].diag {
                    self.types.set_broke(t);
                    self.nodes[n].diag = true;
                    self.error_at(
                        n,
                        SemanticError::DddArrayOutsideLiteral {
                            span: self.span_of(n),
                        },
                    );
                }
                t
            }
            NodeKind::TArray { len, elem } => {
                let len = self.typecheck(len, Ctx::RV);
                let bound = match self.lit_val(len) {
                    Some(Const::Int(v)) | Some(Const::Rune(v)) => v,
                    Some(Const::Float(f)) if f.fract() == 0.0 => f as i128,
                    _ => {
                        let expr = self.node_str(len);
                        let is_var = self
                            .ty(len)
                            .map(|t| self.types.etype(t).is_integer())
                            .unwrap_or(false)
                            && !self.nodes[len].is_lit();
                        if is_var {
                            self.error_at(
                                len,
                                SemanticError::NonConstantArrayBound {
                                    expr,
                                    span: self.span_of(len),
                                },
                            );
                        } else {
                            self.error_at(
                                len,
                                SemanticError::InvalidArrayBound {
                                    expr,
                                    span: self.span_of(len),
                                },
                            );
                        }
                        return Err(());
                    }
                };
                if bound > i64::MAX as i128 {
                    self.error_at(
                        len,
                        SemanticError::ArrayBoundTooLarge {
                            span: self.span_of(len),
                        },
                    );
                    return Err(());
                }
                if bound < 0 {
                    self.error_at(
                        len,
                        SemanticError::ArrayBoundNegative {
                            span: self.span_of(len),
                        },
                    );
                    return Err(());
                }
                let elem = self.typecheck(elem, Ctx::TYPE);
                let et = self.ty(elem).ok_or(())?;
                self.types.array_of(et, bound as i64)
            }
            _ => unreachable!(),
        };
        self.become_type(n, t);
        Ok(Ctx::TYPE)
    }

    pub(crate) fn tc_tmap(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::TMap { key, val } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let key = self.typecheck(key, Ctx::TYPE);
        let val = self.typecheck(val, Ctx::TYPE);
        let (kt, vt) = match (self.ty(key), self.ty(val)) {
            (Some(k), Some(v)) => (k, v),
            _ => return Err(()),
        };
        let t = self.make_map_type(kt, vt, n);
        self.become_type(n, t);
        Ok(Ctx::TYPE)
    }

    pub(crate) fn tc_tchan(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::TChan { dir, elem } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let elem = self.typecheck(elem, Ctx::TYPE);
        let et = self.ty(elem).ok_or(())?;
        let t = self.types.chan_of(et, dir);
        self.become_type(n, t);
        Ok(Ctx::TYPE)
    }

    pub(crate) fn tc_tstruct(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::TStruct { fields } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let t = self.tostruct(&fields, false);
        if self.types.broke(t) {
            self.become_type(n, t);
            return Err(());
        }
        self.become_type(n, t);
        Ok(Ctx::TYPE)
    }

    pub(crate) fn tc_tinter(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::TInter { methods } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let t = self.tointerface(&methods);
        self.become_type(n, t);
        Ok(Ctx::TYPE)
    }

    pub(crate) fn tc_tfunc(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::TFunc {
            recv,
            params,
            results,
        } = self.nodes[n].kind.clone()
        else {
            unreachable!()
        };
        let recv = match recv {
            Some(r) => Some(self.build_field(r).ok_or(())?),
            None => None,
        };
        let params = self.build_fields(&params).ok_or(())?;
        let results = self.build_fields(&results).ok_or(())?;
        let t = self.types.func_type(recv, params, results);
        self.become_type(n, t);
        Ok(Ctx::TYPE)
    }

    /// Turn a Field declaration node into an arena field.
    fn build_field(&mut self, f: NodeId) -> Option<Field> {
        let NodeKind::Field {
            name,
            ty,
            ddd,
            embedded,
        } = self.nodes[f].kind.clone()
        else {
            panic!("not a field declaration")
        };
        let ty_node = ty?;
        let ty_node = self.typecheck(ty_node, Ctx::TYPE);
        let mut t = self.ty(ty_node)?;
        if ddd {
            // A variadic parameter is a slice of the declared element type.
            t = self.types.slice_of(t);
        }
        let mut field = Field::new(name, t);
        field.ddd = ddd;
        field.embedded = embedded;
        self.nodes[f].ty = Some(t);
        Some(field)
    }

    fn build_fields(&mut self, list: &[NodeId]) -> Option<FieldVec> {
        let mut out = FieldVec::new();
        for &f in list {
            out.push(self.build_field(f)?);
        }
        Some(out)
    }

    pub(crate) fn tostruct(&mut self, fields: &[NodeId], funarg: bool) -> TypeId {
        let mut out = FieldVec::new();
        let mut broke = false;
        for &f in fields {
            match self.build_field(f) {
                Some(field) => out.push(field),
                None => broke = true,
            }
        }
        let t = self.types.struct_of(out, funarg);
        if broke {
            self.types.set_broke(t);
        }
        t
    }

    pub(crate) fn tointerface(&mut self, methods: &[NodeId]) -> TypeId {
        let mut out = FieldVec::new();
        let mut broke = false;
        for &m in methods {
            let NodeKind::Field { name, ty, .. } = self.nodes[m].kind.clone() else {
                panic!("not an interface method declaration")
            };
            match name {
                Some(sym) => {
                    // The method's signature may reference a type that is
                    // still being defined; park it on a placeholder slot.
                    let slot = self.types.alloc(TypeKind::Forward);
                    self.nodes[m].ty = Some(slot);
                    out.push(Field::new(Some(sym), slot));
                    self.queue_method(m);
                }
                None => {
                    // Embedded interface: splice its methods.
                    let Some(ty_node) = ty else {
                        broke = true;
                        continue;
                    };
                    let ty_node = self.typecheck(ty_node, Ctx::TYPE);
                    let Some(et) = self.ty(ty_node) else {
                        broke = true;
                        continue;
                    };
                    match self.types.inter_methods(et) {
                        Some(ms) => {
                            for f in ms.clone() {
                                out.push(f);
                            }
                        }
                        None => {
                            if !self.types.broke(et) {
                                let ty = self.type_str(et);
                                self.error_at(
                                    m,
                                    SemanticError::EmbeddedNonInterface {
                                        ty,
                                        span: self.span_of(m),
                                    },
                                );
                            }
                            broke = true;
                        }
                    }
                }
            }
        }
        let t = self.types.interface_of(out, self.syms);
        if broke {
            self.types.set_broke(t);
        }
        t
    }

    // ------------------------------------------------------------------
    // Type or expr
    // ------------------------------------------------------------------

    pub(crate) fn tc_deref(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let NodeKind::Deref { x } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let mut ntop = Ctx::RV | Ctx::TYPE;
        if !top.has(Ctx::ADDR) {
            // The *x in &*x is not an indirect.
            ntop |= Ctx::INDIR;
        }
        ntop |= top & Ctx::COMPLIT;
        let x = self.typecheck(x, ntop);
        self.set_deref_child(n, x);
        let t = self.ty(x).ok_or(())?;

        if matches!(self.nodes[x].kind, NodeKind::TypeExpr) {
            let pt = self.types.ptr_to(t);
            self.become_type(n, pt);
            return Ok(Ctx::TYPE);
        }

        if !self.types.is_ptr(t) {
            if top.has(Ctx::RV | Ctx::TOP) {
                let expr = self.node_str_long(x);
                self.error_at(
                    n,
                    SemanticError::InvalidIndirect {
                        expr,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            return Ok(Ctx::NONE);
        }

        self.nodes[n].ty = self.types.elem(t);
        Ok(Ctx::RV)
    }

    fn set_deref_child(&mut self, n: NodeId, new: NodeId) {
        if let NodeKind::Deref { x } = &mut self.nodes[n].kind {
            *x = new;
        }
    }

    // ------------------------------------------------------------------
    // Unary operators
    // ------------------------------------------------------------------

    pub(crate) fn tc_unary(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let NodeKind::Unary { op, x } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let x = self.typecheck(x, Ctx::RV | (top & Ctx::IOTA));
        if let NodeKind::Unary { x: slot, .. } = &mut self.nodes[n].kind {
            *slot = x;
        }
        let t = self.ty(x).ok_or(())?;
        let et = self.types.etype(t);
        let permitted = match op {
            UnOp::Plus | UnOp::Neg => et.is_numeric(),
            UnOp::Com => et.is_integer(),
            UnOp::Not => et.is_bool(),
        };
        if !permitted {
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::InvalidUnaryOp {
                    op: op.as_str().to_string(),
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        self.nodes[n].ty = Some(t);
        Ok(Ctx::RV)
    }

    // ------------------------------------------------------------------
    // Binary arithmetic, comparison, logic
    // ------------------------------------------------------------------

    pub(crate) fn tc_arith(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let (op, mut l, mut r, asop) = match self.nodes[n].kind.clone() {
            NodeKind::Binary { op, x, y } => (op, x, y, false),
            NodeKind::AsOp { op, x, y } => (op, x, y, true),
            _ => unreachable!(),
        };
        let ok = if asop { Ctx::TOP } else { Ctx::RV };

        if asop {
            l = self.typecheck(l, Ctx::RV);
            r = self.typecheck(r, Ctx::RV);
            self.set_arith_children(n, l, r);
            self.checkassign(n, l);
        } else {
            l = self.typecheck(l, Ctx::RV | (top & Ctx::IOTA));
            r = self.typecheck(r, Ctx::RV | (top & Ctx::IOTA));
            self.set_arith_children(n, l, r);
        }
        if self.ty(l).is_none() || self.ty(r).is_none() {
            return Err(());
        }

        if op.is_shift() {
            return self.tc_shift(n, l, r, ok);
        }

        // Ideal mixed with non-ideal.
        self.defaultlit2(l, r, false);
        let (Some(mut lt), Some(mut rt)) = (self.ty(l), self.ty(r)) else {
            return Err(());
        };

        let mut t = lt;
        if t.is_untyped() {
            t = rt;
        }
        let mut converted = false;

        if op.is_cmp() && !t.is_untyped() && !self.types.eqtype(lt, rt) {
            // Comparison is okay as long as one side is assignable to the
            // other; convert so they have the same type.
            if rt != TypeId::BLANK {
                if let Ok(aop) = self.assignop(lt, rt) {
                    if self.types.is_inter(rt)
                        && !self.types.is_inter(lt)
                        && self.types.incomparable(lt).is_some()
                    {
                        return self.op_not_defined(n, op, lt);
                    }
                    if self.types.is_inter(rt) == self.types.is_inter(lt) {
                        let w = self.wrap_conv(l, aop, rt);
                        l = w;
                        self.set_arith_children(n, l, r);
                    }
                    t = rt;
                    converted = true;
                }
            }
            if !converted && lt != TypeId::BLANK {
                if let Ok(aop) = self.assignop(rt, lt) {
                    if self.types.is_inter(lt)
                        && !self.types.is_inter(rt)
                        && self.types.incomparable(rt).is_some()
                    {
                        return self.op_not_defined(n, op, rt);
                    }
                    if self.types.is_inter(rt) == self.types.is_inter(lt) {
                        let w = self.wrap_conv(r, aop, lt);
                        r = w;
                        self.set_arith_children(n, l, r);
                    }
                    t = lt;
                    converted = true;
                }
            }
            lt = self.ty(l).ok_or(())?;
            rt = self.ty(r).ok_or(())?;
        }

        if !t.is_untyped() && !self.types.eqtype(lt, rt) {
            self.defaultlit2(l, r, true);
            if asop && self.nodes[n].implicit {
                let expr = self.node_str(n);
                let ty = self.type_str(lt);
                self.error_at(
                    n,
                    SemanticError::NonNumericIncDec {
                        expr,
                        ty,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            if self.types.is_inter(rt) == self.types.is_inter(lt) || !converted {
                let expr = self.node_str(n);
                let left = self.type_str(lt);
                let right = self.type_str(rt);
                self.error_at(
                    n,
                    SemanticError::MismatchedTypes {
                        expr,
                        left,
                        right,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
        }

        let et = self.types.etype(t);
        if !okfor(op, et) {
            return self.op_not_defined(n, op, t);
        }

        // okfor allows any array == array, map == map, func == func;
        // restrict to comparisons against nil.
        if op.is_cmp() {
            if self.types.is_fixed_array(lt) && self.types.incomparable(lt).is_some() {
                let expr = self.node_str(n);
                let ty = self.type_str(lt);
                self.error_at(
                    n,
                    SemanticError::NotComparable {
                        expr,
                        ty,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            if self.types.is_slice(lt) && !self.is_nil_const(l) && !self.is_nil_const(r) {
                let expr = self.node_str(n);
                self.error_at(
                    n,
                    SemanticError::SliceCmpToNil {
                        expr,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            if self.types.etype(lt) == EType::Map && !self.is_nil_const(l) && !self.is_nil_const(r)
            {
                let expr = self.node_str(n);
                self.error_at(
                    n,
                    SemanticError::MapCmpToNil {
                        expr,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            if self.types.etype(lt) == EType::Func
                && !self.is_nil_const(l)
                && !self.is_nil_const(r)
            {
                let expr = self.node_str(n);
                self.error_at(
                    n,
                    SemanticError::FuncCmpToNil {
                        expr,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            if self.types.etype(lt) == EType::Struct {
                if let Some(bad) = self.types.incomparable(lt) {
                    let expr = self.node_str(n);
                    let ty = self.type_str(bad);
                    self.error_at(
                        n,
                        SemanticError::StructNotComparable {
                            expr,
                            ty,
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
            }
        }

        let mut result = self.ty(l).ok_or(())?;
        if op.is_cmp() {
            self.evconst(n);
            result = TypeId::IDEAL_BOOL;
            if !self.nodes[n].is_lit() {
                self.defaultlit2(l, r, true);
            }
        } else if matches!(op, BinOp::AndAnd | BinOp::OrOr) {
            let lt2 = self.ty(l).ok_or(())?;
            let rt2 = self.ty(r).ok_or(())?;
            result = if lt2 == rt2 {
                lt2
            } else if lt2 == TypeId::IDEAL_BOOL {
                rt2
            } else if rt2 == TypeId::IDEAL_BOOL {
                lt2
            } else {
                lt2
            };
        } else if result == TypeId::IDEAL_BOOL {
            // Non-comparison operators on ideal bools lose their idealness.
            result = TypeId::BOOL;
        }

        if et.is_string() && !asop {
            if op.is_cmp() {
                if !self.nodes[n].is_lit() {
                    self.nodes[n].kind = NodeKind::CmpStr { op, x: l, y: r };
                }
            } else if op == BinOp::Add && !self.nodes[n].is_lit() {
                // Flatten nested additions so the backend can allocate the
                // result in one go.
                let mut list = Vec::new();
                match self.nodes[l].kind.clone() {
                    NodeKind::AddStr { list: inner } => list.extend(inner),
                    _ => list.push(l),
                }
                match self.nodes[r].kind.clone() {
                    NodeKind::AddStr { list: inner } => list.extend(inner),
                    _ => list.push(r),
                }
                self.nodes[n].kind = NodeKind::AddStr { list };
            }
        }

        if et == EType::Inter && !self.nodes[n].is_lit() {
            if self.is_nil_const(l) {
                // Swap for the back end.
                self.set_arith_children(n, r, l);
            } else if self.is_nil_const(r) {
                // Leave alone for the back end.
            } else if self.types.is_inter(rt) == self.types.is_inter(lt) {
                self.nodes[n].kind = NodeKind::CmpIface { op, x: l, y: r };
            }
        }

        if matches!(op, BinOp::Div | BinOp::Mod) {
            if let Some(v) = self.int_const(r) {
                if v == 0 {
                    self.error_at(
                        n,
                        SemanticError::DivisionByZero {
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
            }
        }

        if !self.nodes[n].is_lit() {
            self.nodes[n].ty = Some(result);
        } else if op.is_cmp() {
            self.nodes[n].ty = Some(result);
        }
        Ok(ok)
    }

    fn tc_shift(&mut self, n: NodeId, l: NodeId, r: NodeId, ok: Ctx) -> Result<Ctx, ()> {
        self.defaultlit(r, Some(TypeId::UINT));
        let rt = self.ty(r).ok_or(())?;
        let ret = self.types.etype(rt);
        if !ret.is_integer() || ret.is_signed() {
            let expr = self.node_str(n);
            let ty = self.type_str(rt);
            self.error_at(
                n,
                SemanticError::ShiftCountType {
                    expr,
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        let lt = self.ty(l).ok_or(())?;
        if !lt.is_untyped() && !self.types.etype(lt).is_integer() {
            let expr = self.node_str(n);
            let ty = self.type_str(lt);
            self.error_at(
                n,
                SemanticError::ShiftOfType {
                    expr,
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        // No defaulting for the left operand: the outer context gives the
        // type.
        self.nodes[n].ty = Some(lt);
        Ok(ok)
    }

    fn op_not_defined(&mut self, n: NodeId, op: BinOp, t: TypeId) -> Result<Ctx, ()> {
        let expr = self.node_str(n);
        let kind = self.types.kind_str(t).to_string();
        self.error_at(
            n,
            SemanticError::OpNotDefined {
                expr,
                op: op.as_str().to_string(),
                kind,
                span: self.span_of(n),
            },
        );
        Err(())
    }

    pub(crate) fn set_arith_children(&mut self, n: NodeId, l: NodeId, r: NodeId) {
        match &mut self.nodes[n].kind {
            NodeKind::Binary { x, y, .. } | NodeKind::AsOp { x, y, .. } => {
                *x = l;
                *y = r;
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Address-of
    // ------------------------------------------------------------------

    pub(crate) fn tc_addr(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Addr { x } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let x = self.typecheck(x, Ctx::RV | Ctx::ADDR);
        if let NodeKind::Addr { x: slot } = &mut self.nodes[n].kind {
            *slot = x;
        }
        if self.ty(x).is_none() {
            return Err(());
        }
        self.checklvalue(x, "take the address of");

        // Propagate addrtaken through every intermediate selector down to
        // the leaf, and to the closure-captured original.
        let leaf = self.outervalue(x);
        let mut cur = x;
        loop {
            self.nodes[cur].addrtaken = true;
            if let Some(c) = self.nodes[cur].closure {
                self.nodes[c].addrtaken = true;
            }
            if cur == leaf {
                break;
            }
            match self.outer_step(cur) {
                Some(next) => cur = next,
                None => break,
            }
        }
        if matches!(self.nodes[leaf].kind, NodeKind::Name) && self.nodes[leaf].orig.is_some() {
            panic!("found non-orig name node {}", self.node_str(leaf));
        }

        self.defaultlit(x, None);
        let t = self.ty(x).ok_or(())?;
        self.nodes[n].ty = Some(self.types.ptr_to(t));
        Ok(Ctx::RV)
    }

    // ------------------------------------------------------------------
    // Indexing
    // ------------------------------------------------------------------

    /// Insert an implicit * for a pointer to a fixed array.
    pub(crate) fn implicitstar(&mut self, x: NodeId) -> NodeId {
        let Some(t) = self.ty(x) else { return x };
        let TypeKind::Ptr(elem) = self.types.kind(t) else {
            return x;
        };
        if !self.types.is_fixed_array(*elem) {
            return x;
        }
        let span = self.nodes[x].span;
        let d = self.nodes.alloc(NodeKind::Deref { x }, span);
        self.nodes[d].implicit = true;
        self.typecheck(d, Ctx::RV)
    }

    pub(crate) fn tc_index(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let (mut x, mut i, is_map) = match self.nodes[n].kind.clone() {
            NodeKind::Index { x, i } => (x, i, false),
            NodeKind::IndexMap { x, i } => (x, i, true),
            _ => unreachable!(),
        };
        x = self.typecheck(x, Ctx::RV);
        self.defaultlit(x, None);
        x = self.implicitstar(x);
        i = self.typecheck(i, Ctx::RV);
        self.set_index_children(n, x, i, is_map);

        let t = self.ty(x).ok_or(())?;
        if self.ty(i).is_none() {
            return Err(());
        }

        match self.types.etype(t) {
            EType::String | EType::Array => {
                self.index_lit(i);
                if self.types.etype(t) == EType::String {
                    self.nodes[n].ty = Some(TypeId::UINT8);
                } else {
                    self.nodes[n].ty = self.types.elem(t);
                }
                let why = if self.types.etype(t) == EType::String {
                    "string"
                } else if self.types.is_fixed_array(t) {
                    "array"
                } else {
                    "slice"
                };

                if let Some(it) = self.ty(i) {
                    if !self.types.etype(it).is_integer() {
                        let expr = self.node_str(i);
                        self.error_at(
                            i,
                            SemanticError::NonIntegerIndex {
                                kind: why.to_string(),
                                expr,
                                span: self.span_of(i),
                            },
                        );
                        return Ok(Ctx::RV);
                    }
                }

                if let Some(v) = self.int_const(i) {
                    let expr = self.node_str(i);
                    if v < 0 {
                        self.error_at(
                            i,
                            SemanticError::IndexNegative {
                                kind: why.to_string(),
                                expr,
                                span: self.span_of(i),
                            },
                        );
                    } else if self.types.is_fixed_array(t)
                        && self.types.array_bound(t).map(|b| b > 0 && v >= b as i128)
                            == Some(true)
                    {
                        let bound = self.types.array_bound(t).unwrap_or(0);
                        self.error_at(
                            i,
                            SemanticError::ArrayIndexOutOfBounds {
                                expr,
                                bound,
                                span: self.span_of(i),
                            },
                        );
                    } else if let Some(s) = self.str_const(x) {
                        if v >= s.len() as i128 {
                            self.error_at(
                                i,
                                SemanticError::StringIndexOutOfBounds {
                                    expr,
                                    len: s.len(),
                                    span: self.span_of(i),
                                },
                            );
                        }
                    } else if v > i64::MAX as i128 {
                        self.error_at(
                            i,
                            SemanticError::IndexTooLarge {
                                kind: why.to_string(),
                                expr,
                                span: self.span_of(i),
                            },
                        );
                    }
                }
            }
            EType::Map => {
                let key = self.types.map_key(t).ok_or(())?;
                self.defaultlit(i, Some(key));
                if self.ty(i).is_some() {
                    i = self.assignconv(i, key, "map index");
                }
                self.nodes[n].ty = self.types.map_val(t);
                self.nodes[n].kind = NodeKind::IndexMap { x, i };
            }
            _ => {
                let expr = self.node_str(n);
                let ty = self.type_str(t);
                self.error_at(
                    n,
                    SemanticError::NonIndexable {
                        expr,
                        ty,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
        }
        Ok(Ctx::RV)
    }

    fn set_index_children(&mut self, n: NodeId, nx: NodeId, ni: NodeId, is_map: bool) {
        let _ = is_map;
        match &mut self.nodes[n].kind {
            NodeKind::Index { x, i } | NodeKind::IndexMap { x, i } => {
                *x = nx;
                *i = ni;
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Slicing
    // ------------------------------------------------------------------

    pub(crate) fn tc_slice(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let (mut x, lo, hi) = match self.nodes[n].kind.clone() {
            NodeKind::Slice { x, lo, hi }
            | NodeKind::SliceStr { x, lo, hi }
            | NodeKind::SliceArr { x, lo, hi } => (x, lo, hi),
            _ => unreachable!(),
        };
        x = self.typecheck(x, top);
        let lo = self.typecheck_opt(lo, Ctx::RV);
        let hi = self.typecheck_opt(hi, Ctx::RV);
        self.defaultlit(x, None);
        if let Some(lo) = lo {
            self.index_lit(lo);
        }
        if let Some(hi) = hi {
            self.index_lit(hi);
        }

        if self.ty(x).map(|t| self.types.is_fixed_array(t)) == Some(true) {
            if !self.islvalue(x) {
                let expr = self.node_str(n);
                self.error_at(
                    n,
                    SemanticError::SliceOfUnaddressable {
                        expr,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            let span = self.nodes[x].span;
            let a = self.nodes.alloc(NodeKind::Addr { x }, span);
            self.nodes[a].implicit = true;
            x = self.typecheck(a, Ctx::RV);
        }
        self.set_slice_children(n, x, lo, hi);

        let t = self.ty(x).ok_or(())?;
        let mut tp = None;
        if self.types.etype(t) == EType::String {
            self.nodes[n].ty = Some(t);
            self.nodes[n].kind = NodeKind::SliceStr { x, lo, hi };
        } else if let TypeKind::Ptr(elem) = *self.types.kind(t) {
            if self.types.is_fixed_array(elem) {
                tp = Some(elem);
                let et = self.types.elem(elem).ok_or(())?;
                let st = self.types.slice_of(et);
                self.nodes[n].ty = Some(st);
                self.nodes[n].kind = NodeKind::SliceArr { x, lo, hi };
            } else {
                return self.cannot_slice(n, x, t);
            }
        } else if self.types.is_slice(t) {
            self.nodes[n].ty = Some(t);
        } else {
            return self.cannot_slice(n, x, t);
        }

        if let Some(lo) = lo {
            if !self.checksliceindex(x, lo, tp) {
                return Err(());
            }
        }
        if let Some(hi) = hi {
            if !self.checksliceindex(x, hi, tp) {
                return Err(());
            }
        }
        if !self.checksliceconst(lo, hi) {
            return Err(());
        }
        Ok(Ctx::RV)
    }

    pub(crate) fn tc_slice3(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let (mut x, lo, mid, hi) = match self.nodes[n].kind.clone() {
            NodeKind::Slice3 { x, lo, mid, hi } | NodeKind::Slice3Arr { x, lo, mid, hi } => {
                (x, lo, mid, hi)
            }
            _ => unreachable!(),
        };
        x = self.typecheck(x, top);
        let lo = self.typecheck_opt(lo, Ctx::RV);
        let mid = self.typecheck_opt(mid, Ctx::RV);
        let hi = self.typecheck_opt(hi, Ctx::RV);
        self.defaultlit(x, None);
        for idx in [lo, mid, hi].into_iter().flatten() {
            self.index_lit(idx);
        }

        if self.ty(x).map(|t| self.types.is_fixed_array(t)) == Some(true) {
            if !self.islvalue(x) {
                let expr = self.node_str(n);
                self.error_at(
                    n,
                    SemanticError::SliceOfUnaddressable {
                        expr,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            let span = self.nodes[x].span;
            let a = self.nodes.alloc(NodeKind::Addr { x }, span);
            self.nodes[a].implicit = true;
            x = self.typecheck(a, Ctx::RV);
        }
        self.set_slice3_children(n, x, lo, mid, hi);

        let t = self.ty(x).ok_or(())?;
        let mut tp = None;
        if self.types.etype(t) == EType::String {
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::Slice3OfString {
                    expr,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        if let TypeKind::Ptr(elem) = *self.types.kind(t) {
            if self.types.is_fixed_array(elem) {
                tp = Some(elem);
                let et = self.types.elem(elem).ok_or(())?;
                let st = self.types.slice_of(et);
                self.nodes[n].ty = Some(st);
                self.nodes[n].kind = NodeKind::Slice3Arr { x, lo, mid, hi };
            } else {
                return self.cannot_slice(n, x, t);
            }
        } else if self.types.is_slice(t) {
            self.nodes[n].ty = Some(t);
        } else {
            return self.cannot_slice(n, x, t);
        }

        for idx in [lo, mid, hi].into_iter().flatten() {
            if !self.checksliceindex(x, idx, tp) {
                return Err(());
            }
        }
        if !self.checksliceconst(lo, hi) || !self.checksliceconst(lo, mid)
            || !self.checksliceconst(mid, hi)
        {
            return Err(());
        }
        Ok(Ctx::RV)
    }

    fn cannot_slice(&mut self, n: NodeId, x: NodeId, t: TypeId) -> Result<Ctx, ()> {
        let expr = self.node_str(x);
        let ty = self.type_str(t);
        self.error_at(
            n,
            SemanticError::CannotSlice {
                expr,
                ty,
                span: self.span_of(n),
            },
        );
        Err(())
    }

    fn set_slice_children(
        &mut self,
        n: NodeId,
        nx: NodeId,
        nlo: Option<NodeId>,
        nhi: Option<NodeId>,
    ) {
        match &mut self.nodes[n].kind {
            NodeKind::Slice { x, lo, hi }
            | NodeKind::SliceStr { x, lo, hi }
            | NodeKind::SliceArr { x, lo, hi } => {
                *x = nx;
                *lo = nlo;
                *hi = nhi;
            }
            _ => {}
        }
    }

    fn set_slice3_children(
        &mut self,
        n: NodeId,
        nx: NodeId,
        nlo: Option<NodeId>,
        nmid: Option<NodeId>,
        nhi: Option<NodeId>,
    ) {
        match &mut self.nodes[n].kind {
            NodeKind::Slice3 { x, lo, mid, hi } | NodeKind::Slice3Arr { x, lo, mid, hi } => {
                *x = nx;
                *lo = nlo;
                *mid = nmid;
                *hi = nhi;
            }
            _ => {}
        }
    }

    fn checksliceindex(&mut self, l: NodeId, r: NodeId, tp: Option<TypeId>) -> bool {
        let Some(t) = self.ty(r) else { return false };
        if !self.types.etype(t).is_integer() {
            let expr = self.node_str(r);
            let ty = self.type_str(t);
            self.error_at(
                r,
                SemanticError::SliceIndexType {
                    expr,
                    ty,
                    span: self.span_of(r),
                },
            );
            return false;
        }
        if let Some(v) = self.int_const(r) {
            let expr = self.node_str(r);
            if v < 0 {
                self.error_at(
                    r,
                    SemanticError::IndexNegative {
                        kind: "slice".to_string(),
                        expr,
                        span: self.span_of(r),
                    },
                );
                return false;
            }
            if let Some(tp) = tp {
                if let Some(bound) = self.types.array_bound(tp) {
                    if bound > 0 && v > bound as i128 {
                        self.error_at(
                            r,
                            SemanticError::SliceIndexOutOfBounds {
                                expr,
                                bound,
                                span: self.span_of(r),
                            },
                        );
                        return false;
                    }
                }
            }
            if let Some(s) = self.str_const(l) {
                if v > s.len() as i128 {
                    self.error_at(
                        r,
                        SemanticError::SliceIndexStringOutOfBounds {
                            expr,
                            len: s.len(),
                            span: self.span_of(r),
                        },
                    );
                    return false;
                }
            }
            if v > i64::MAX as i128 {
                self.error_at(
                    r,
                    SemanticError::IndexTooLarge {
                        kind: "slice".to_string(),
                        expr,
                        span: self.span_of(r),
                    },
                );
                return false;
            }
        }
        true
    }

    fn checksliceconst(&mut self, lo: Option<NodeId>, hi: Option<NodeId>) -> bool {
        if let (Some(lo), Some(hi)) = (lo, hi) {
            if let (Some(a), Some(b)) = (self.int_const(lo), self.int_const(hi)) {
                if a > b {
                    let lo_s = self.node_str(lo);
                    let hi_s = self.node_str(hi);
                    let span = self.nodes[lo].span;
                    self.error(
                        span,
                        SemanticError::SliceIndexSwap {
                            lo: lo_s,
                            hi: hi_s,
                            span: span.into(),
                        },
                    );
                    return false;
                }
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Channel operations
    // ------------------------------------------------------------------

    pub(crate) fn tc_recv(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Recv { ch } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let ch = self.typecheck(ch, Ctx::RV);
        if let NodeKind::Recv { ch: slot } = &mut self.nodes[n].kind {
            *slot = ch;
        }
        self.defaultlit(ch, None);
        let t = self.ty(ch).ok_or(())?;
        let Some(dir) = self.types.chan_dir(t) else {
            let expr = self.node_str(n);
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::RecvFromNonChan {
                    expr,
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        };
        if !dir.can_recv() {
            let expr = self.node_str(n);
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::RecvFromSendOnly {
                    expr,
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        self.nodes[n].ty = self.types.elem(t);
        Ok(Ctx::TOP | Ctx::RV)
    }

    pub(crate) fn tc_send(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Send { ch, val } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let ch = self.typecheck(ch, Ctx::RV);
        let mut val = self.typecheck(val, Ctx::RV);
        self.defaultlit(ch, None);
        let t = self.ty(ch).ok_or(())?;
        let Some(dir) = self.types.chan_dir(t) else {
            let expr = self.node_str(n);
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::SendToNonChan {
                    expr,
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        };
        if !dir.can_send() {
            let expr = self.node_str(n);
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::SendToRecvOnly {
                    expr,
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        let elem = self.types.elem(t).ok_or(())?;
        self.defaultlit(val, Some(elem));
        if self.ty(val).is_none() {
            return Err(());
        }
        val = self.assignconv(val, elem, "send");
        if let NodeKind::Send { ch: cs, val: vs } = &mut self.nodes[n].kind {
            *cs = ch;
            *vs = val;
        }
        self.nodes[n].ty = None;
        Ok(Ctx::TOP)
    }

    // ------------------------------------------------------------------
    // Type assertions
    // ------------------------------------------------------------------

    pub(crate) fn tc_dottype(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::DotType { x, ty_expr } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let x = self.typecheck(x, Ctx::RV);
        self.defaultlit(x, None);
        let t = self.ty(x).ok_or(())?;
        if !self.types.is_inter(t) {
            let expr = self.node_str(n);
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::NonInterfaceAssertion {
                    expr,
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }

        if let Some(te) = ty_expr {
            let te = self.typecheck(te, Ctx::TYPE);
            self.nodes[n].ty = self.nodes[te].ty;
            self.nodes[n].kind = NodeKind::DotType { x, ty_expr: None };
            if self.nodes[n].ty.is_none() {
                return Err(());
            }
        } else {
            self.nodes[n].kind = NodeKind::DotType { x, ty_expr: None };
        }

        if let Some(target) = self.nodes[n].ty {
            if !self.types.is_inter(target) {
                if let Err(fail) = self.implements(target, t) {
                    let ty = self.type_str(target);
                    let iface = self.type_str(t);
                    let method = fail
                        .missing
                        .sym
                        .map(|s| self.syms.name(s).to_string())
                        .unwrap_or_default();
                    let err = match (&fail.have, fail.ptr) {
                        (Some(have), false)
                            if have.sym == fail.missing.sym =>
                        {
                            SemanticError::ImpossibleAssertionWrongType {
                                ty,
                                iface,
                                method,
                                have: self.types.func_sig_str(self.syms, have.ty),
                                want: self.types.func_sig_str(self.syms, fail.missing.ty),
                                span: self.span_of(n),
                            }
                        }
                        (_, true) => SemanticError::ImpossibleAssertionPtrReceiver {
                            ty,
                            iface,
                            method,
                            span: self.span_of(n),
                        },
                        _ => SemanticError::ImpossibleAssertionMissing {
                            ty,
                            iface,
                            method,
                            span: self.span_of(n),
                        },
                    };
                    self.error_at(n, err);
                    return Err(());
                }
            }
        }
        Ok(Ctx::RV)
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    pub(crate) fn tc_conv(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let NodeKind::Conv { x } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        if self.nodes[n].orig.is_none() {
            let shadow = self.nodes.shadow(n);
            self.nodes[n].orig = Some(shadow);
        }
        let x = self.typecheck(x, Ctx::RV | (top & (Ctx::INDIR | Ctx::IOTA)));
        self.set_conv_child(n, x);
        let Some(target) = self.nodes[n].ty else {
            return Err(());
        };
        self.convlit(x, target, true);
        let t = self.ty(x).ok_or(())?;

        match self.convertop(t, target) {
            Err(why) => {
                if !self.nodes[n].diag && !self.types.broke(target) {
                    let val = self.node_str_long(x);
                    let ty = self.type_str(target);
                    self.error_at(
                        n,
                        SemanticError::CannotConvert {
                            val,
                            ty,
                            why,
                            span: self.span_of(n),
                        },
                    );
                    self.nodes[n].diag = true;
                }
                // Leave the plain conversion in place.
            }
            Ok(op) => {
                use crate::convert::ConvOp;
                match op {
                    ConvOp::Nop => {
                        if self.nodes[x].is_lit() && target != TypeId::BOOL {
                            let val = self.nodes[x].val.clone();
                            self.nodes[n].kind = NodeKind::Lit;
                            self.nodes[n].val = val;
                        } else {
                            self.nodes[n].kind = NodeKind::ConvNop { x };
                        }
                    }
                    ConvOp::Iface => self.nodes[n].kind = NodeKind::ConvIface { x },
                    ConvOp::Plain => {}
                    ConvOp::StrToBytes => {
                        // Deliberately not precomputed: generated code and
                        // compiler memory footprint are better without it.
                        self.nodes[n].kind = NodeKind::StrToBytes { x };
                    }
                    ConvOp::StrToRunes => {
                        if self.str_const(x).is_some() {
                            self.string_to_array_lit(n, x);
                        } else {
                            self.nodes[n].kind = NodeKind::StrToRunes { x };
                        }
                    }
                    ConvOp::BytesToStr => self.nodes[n].kind = NodeKind::BytesToStr { x },
                    ConvOp::RunesToStr => self.nodes[n].kind = NodeKind::RunesToStr { x },
                    ConvOp::RuneToStr => self.nodes[n].kind = NodeKind::RuneToStr { x },
                }
            }
        }
        Ok(Ctx::RV)
    }

    fn set_conv_child(&mut self, n: NodeId, new: NodeId) {
        if let NodeKind::Conv { x } = &mut self.nodes[n].kind {
            *x = new;
        }
    }

    /// Precompute the rune-array literal for a constant string converted
    /// to a rune slice.
    fn string_to_array_lit(&mut self, n: NodeId, x: NodeId) {
        let Some(s) = self.str_const(x) else { return };
        let span = self.nodes[n].span;
        let mut elems = Vec::new();
        for (i, r) in s.chars().enumerate() {
            let k = self.nodes.alloc(NodeKind::Lit, span);
            self.nodes[k].val = Some(Const::Int(i as i128));
            self.nodes[k].ty = Some(TypeId::INT);
            self.nodes[k].typecheck = TcState::Done;
            let v = self.nodes.alloc(NodeKind::Lit, span);
            self.nodes[v].val = Some(Const::Int(r as i128));
            self.nodes[v].ty = Some(TypeId::INT32);
            self.nodes[v].typecheck = TcState::Done;
            let pair = self.nodes.alloc(NodeKind::Key { k, v }, span);
            self.nodes[pair].typecheck = TcState::Done;
            elems.push(pair);
        }
        let count = elems.len();
        let len = self.nodes.alloc(NodeKind::Lit, span);
        self.nodes[len].val = Some(Const::Int(count as i128));
        self.nodes[len].ty = Some(TypeId::INT);
        self.nodes[len].typecheck = TcState::Done;
        self.nodes[n].kind = NodeKind::ArrayLit {
            elems,
            len: Some(len),
        };
    }

    /// Does `n` contain a call or receive operation?
    pub(crate) fn callrecv(&self, n: NodeId) -> bool {
        use NodeKind::*;
        if matches!(
            self.nodes[n].kind,
            Call { .. }
                | CallFunc { .. }
                | CallMeth { .. }
                | CallInter { .. }
                | Recv { .. }
                | Cap { .. }
                | Len { .. }
                | Copy { .. }
                | New { .. }
                | Append { .. }
                | Delete { .. }
        ) {
            return true;
        }
        let mut found = false;
        self.nodes.children(n, &mut |c| {
            if !found && self.callrecv(c) {
                found = true;
            }
        });
        found
    }
}

/// Operator-kinds table: is `op` permitted on operands of kind `et`?
pub(crate) fn okfor(op: BinOp, et: EType) -> bool {
    use BinOp::*;
    match op {
        Add => et.is_numeric() || et.is_string(),
        Sub | Mul | Div => et.is_numeric(),
        Mod | And | Or | Xor | AndNot | Shl | Shr => et.is_integer(),
        AndAnd | OrOr => et.is_bool(),
        Eq | Ne => {
            et.is_numeric()
                || et.is_string()
                || et.is_bool()
                || matches!(
                    et,
                    EType::Ptr
                        | EType::UnsafePtr
                        | EType::Chan
                        | EType::Inter
                        | EType::Map
                        | EType::Func
                        | EType::Array
                        | EType::Struct
                        | EType::Nil
                )
        }
        Lt | Le | Gt | Ge => et.is_numeric() || et.is_string(),
    }
}
