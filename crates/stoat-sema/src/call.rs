// call.rs
//
// Call checking: builtin rewrites, conversions spelled as calls, call
// classification (function, method, interface method), and the built-in
// operation rules.

use stoat_frontend::{Builtin, Const, NodeId, NodeKind, TypeId};

use crate::check::{Checker, Ctx};
use crate::errors::SemanticError;
use crate::type_arena::{EType, Field, FieldVec, TypeKind};

impl<'a> Checker<'a> {
    pub(crate) fn tc_call(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let NodeKind::Call { func, args, ddd } = self.nodes[n].kind.clone() else {
            // Refined calls reappear only on idempotent re-checks.
            return Ok(Ctx::RV | Ctx::TOP);
        };

        let func = self.typecheck(func, Ctx::RV | Ctx::TYPE | Ctx::CALL | (top & Ctx::PROC));
        self.set_call_func(n, func);
        if self.nodes[func].diag {
            self.nodes[n].diag = true;
        }

        // Builtin callee: rewrite to the operation's own variant and
        // re-dispatch.
        if matches!(self.nodes[func].kind, NodeKind::Name) {
            if let Some(b) = self.nodes[func].builtin {
                if ddd && b != Builtin::Append {
                    let name = b.as_str().to_string();
                    self.error_at(
                        n,
                        SemanticError::InvalidDddBuiltin {
                            name,
                            span: self.span_of(n),
                        },
                    );
                }
                self.rewrite_builtin(n, b, args, ddd)?;
                return self.redispatch(n, top);
            }
        }

        self.defaultlit(func, None);

        // Type callee: this is a conversion.
        if matches!(self.nodes[func].kind, NodeKind::TypeExpr) {
            let t = self.ty(func).ok_or(())?;
            let unfilled = matches!(
                self.types.kind(t),
                TypeKind::Array {
                    bound: crate::type_arena::Bound::Unfilled,
                    ..
                }
            );
            if ddd || unfilled {
                if !self.types.broke(t) {
                    self.error_at(
                        n,
                        SemanticError::InvalidDddConversion {
                            span: self.span_of(n),
                        },
                    );
                }
                self.nodes[n].diag = true;
            }
            let what = format!("conversion to {}", self.type_str(t));
            let x = self.exactly_one(n, &args, &what)?;
            self.nodes[n].ty = Some(t);
            self.nodes[n].kind = NodeKind::Conv { x };
            return self.tc_conv(n, top);
        }

        // Arguments: a single argument may be a multi-value call.
        let args = if args.len() == 1 && !ddd {
            vec![self.typecheck(args[0], Ctx::RV | Ctx::FNSTRUCT)]
        } else {
            self.typecheck_list(args, Ctx::RV)
        };

        let t = self.ty(func).ok_or(())?;

        // Classify.
        let kind = match self.nodes[func].kind {
            NodeKind::DotInter { .. } => NodeKind::CallInter {
                func,
                args: args.clone(),
                ddd,
            },
            NodeKind::DotMeth { x, .. } => {
                // Sanity check: the receiver was already adjusted to the
                // method's exact receiver shape by the selector lookup.
                if let Some((Some(recv), _, _)) = self.types.func_parts(t).map(|(r, p, o)| {
                    (r.clone(), p.clone(), o.clone())
                }) {
                    let rt = self.ty(x);
                    if rt.map(|rt| self.types.eqtype(rt, recv.ty)) != Some(true) {
                        panic!("method receiver");
                    }
                } else {
                    panic!("method receiver");
                }
                NodeKind::CallMeth {
                    func,
                    args: args.clone(),
                    ddd,
                }
            }
            _ => {
                if self.types.etype(t) != EType::Func {
                    let expr = self.node_str(func);
                    let ty = self.type_str(t);
                    self.error_at(
                        n,
                        SemanticError::CallNonFunction {
                            expr,
                            ty,
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                NodeKind::CallFunc {
                    func,
                    args: args.clone(),
                    ddd,
                }
            }
        };
        self.nodes[n].kind = kind;

        let (params, results) = match self.types.func_parts(t) {
            Some((_, p, r)) => (p.clone(), r.clone()),
            None => return Err(()),
        };

        let desc = format!("argument to {}", self.node_str(func));
        let call_name = self.node_str(func);
        let new_args =
            self.typecheckaste(Some(call_name.clone()), ddd, &params, args, &desc);
        self.set_call_args(n, new_args);

        let mut ok = Ctx::TOP;
        if results.is_empty() {
            return Ok(ok);
        }
        ok |= Ctx::RV;
        if results.len() == 1 {
            self.nodes[n].ty = Some(results[0].ty);
            return Ok(ok);
        }

        // Multiple returns are legal only where a tuple can be consumed.
        if !top.has(Ctx::FNSTRUCT | Ctx::TOP) {
            self.error_at(
                n,
                SemanticError::MultipleValueContext {
                    call: call_name,
                    span: self.span_of(n),
                },
            );
            // Keep going with the tuple type.
        }
        let mut fields = FieldVec::new();
        for f in &results {
            fields.push(Field::new(f.sym, f.ty));
        }
        let tuple = self.types.struct_of(fields, true);
        self.nodes[n].ty = Some(tuple);
        Ok(ok)
    }

    fn redispatch(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        match self.nodes[n].kind.clone() {
            NodeKind::Len { .. } | NodeKind::Cap { .. } | NodeKind::Real { .. }
            | NodeKind::Imag { .. } => self.tc_len_cap_real_imag(n),
            NodeKind::Complex { .. } => self.tc_complex(n, top),
            NodeKind::Close { .. } => self.tc_close(n),
            NodeKind::Delete { .. } => self.tc_delete(n),
            NodeKind::Append { .. } => self.tc_append(n),
            NodeKind::Copy { .. } => self.tc_copy(n),
            NodeKind::Make { .. } => self.tc_make(n),
            NodeKind::New { .. } => self.tc_new(n),
            NodeKind::Print { .. } | NodeKind::Println { .. } => self.tc_print(n),
            NodeKind::Panic { .. } => self.tc_panic(n),
            NodeKind::Recover => self.tc_recover(n),
            _ => unreachable!("builtin rewrite produced a non-builtin"),
        }
    }

    fn rewrite_builtin(
        &mut self,
        n: NodeId,
        b: Builtin,
        args: Vec<NodeId>,
        ddd: bool,
    ) -> Result<(), ()> {
        let kind = match b {
            Builtin::Len => NodeKind::Len {
                x: self.exactly_one(n, &args, "len")?,
            },
            Builtin::Cap => NodeKind::Cap {
                x: self.exactly_one(n, &args, "cap")?,
            },
            Builtin::Real => NodeKind::Real {
                x: self.exactly_one(n, &args, "real")?,
            },
            Builtin::Imag => NodeKind::Imag {
                x: self.exactly_one(n, &args, "imag")?,
            },
            Builtin::Close => NodeKind::Close {
                ch: self.exactly_one(n, &args, "close")?,
            },
            Builtin::Panic => NodeKind::Panic {
                x: self.exactly_one(n, &args, "panic")?,
            },
            Builtin::Complex => {
                let (x, y) = self.exactly_two(n, &args, "complex")?;
                NodeKind::Complex { x, y }
            }
            Builtin::Copy => {
                if args.is_empty() || args.len() == 1 {
                    self.error_at(
                        n,
                        SemanticError::CopyMissingArgs {
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                if args.len() > 2 {
                    self.error_at(
                        n,
                        SemanticError::CopyTooManyArgs {
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                NodeKind::Copy {
                    dst: args[0],
                    src: args[1],
                }
            }
            Builtin::Recover => {
                if !args.is_empty() {
                    self.error_at(
                        n,
                        SemanticError::RecoverTooManyArgs {
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                NodeKind::Recover
            }
            Builtin::New => {
                if args.is_empty() {
                    self.error_at(
                        n,
                        SemanticError::NewMissingArg {
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                if args.len() > 1 {
                    let first = self.typecheck(args[0], Ctx::TYPE);
                    let ty = self
                        .ty(first)
                        .map(|t| self.type_str(t))
                        .unwrap_or_default();
                    self.error_at(
                        n,
                        SemanticError::NewTooManyArgs {
                            ty,
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                NodeKind::New { ty_expr: args[0] }
            }
            Builtin::Append => NodeKind::Append { args, ddd },
            Builtin::Delete => NodeKind::Delete { args },
            Builtin::Make => NodeKind::Make { args },
            Builtin::Print => NodeKind::Print { args },
            Builtin::Println => NodeKind::Println { args },
        };
        self.nodes[n].kind = kind;
        Ok(())
    }

    fn exactly_one(&mut self, n: NodeId, args: &[NodeId], what: &str) -> Result<NodeId, ()> {
        if args.is_empty() {
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::MissingArgument {
                    what: what.to_string(),
                    expr,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        if args.len() > 1 {
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::SurplusArgument {
                    what: what.to_string(),
                    expr,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        Ok(args[0])
    }

    fn exactly_two(
        &mut self,
        n: NodeId,
        args: &[NodeId],
        what: &str,
    ) -> Result<(NodeId, NodeId), ()> {
        if args.len() < 2 {
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::MissingArgument {
                    what: what.to_string(),
                    expr,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        if args.len() > 2 {
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::SurplusArgument {
                    what: what.to_string(),
                    expr,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        Ok((args[0], args[1]))
    }

    fn set_call_func(&mut self, n: NodeId, new: NodeId) {
        match &mut self.nodes[n].kind {
            NodeKind::Call { func, .. }
            | NodeKind::CallFunc { func, .. }
            | NodeKind::CallMeth { func, .. }
            | NodeKind::CallInter { func, .. } => *func = new,
            _ => {}
        }
    }

    fn set_call_args(&mut self, n: NodeId, new: Vec<NodeId>) {
        match &mut self.nodes[n].kind {
            NodeKind::Call { args, .. }
            | NodeKind::CallFunc { args, .. }
            | NodeKind::CallMeth { args, .. }
            | NodeKind::CallInter { args, .. } => *args = new,
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // len, cap, real, imag
    // ------------------------------------------------------------------

    pub(crate) fn tc_len_cap_real_imag(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let (mut x, which) = match self.nodes[n].kind.clone() {
            NodeKind::Len { x } => (x, "len"),
            NodeKind::Cap { x } => (x, "cap"),
            NodeKind::Real { x } => (x, "real"),
            NodeKind::Imag { x } => (x, "imag"),
            _ => unreachable!(),
        };
        x = self.typecheck(x, Ctx::RV);
        self.defaultlit(x, None);
        x = self.implicitstar(x);
        self.set_builtin1_child(n, x);
        let t = self.ty(x).ok_or(())?;
        let et = self.types.etype(t);

        let permitted = match which {
            "len" => matches!(et, EType::Array | EType::Map | EType::Chan) || et.is_string(),
            "cap" => matches!(et, EType::Array | EType::Chan),
            _ => et.is_complex(),
        };
        if !permitted {
            let arg = self.node_str_long(x);
            self.error_at(
                n,
                SemanticError::InvalidBuiltinArg {
                    arg,
                    op: which.to_string(),
                    span: self.span_of(n),
                },
            );
            return Err(());
        }

        if which == "real" || which == "imag" {
            if let Some(Const::Complex(re, im)) = self.lit_val(x) {
                let v = if which == "real" { re } else { im };
                self.set_lit(n, Const::Float(v));
            }
            self.nodes[n].ty = Some(match self.types.etype(t) {
                EType::Complex64 => TypeId::FLOAT32,
                _ => TypeId::FLOAT64,
            });
            return Ok(Ctx::RV);
        }

        // Might be constant.
        match et {
            EType::String if which == "len" => {
                if let Some(s) = self.str_const(x) {
                    self.set_lit(n, Const::Int(s.len() as i128));
                }
            }
            EType::Array => {
                if let Some(bound) = self.types.array_bound(t) {
                    if !self.callrecv(x) {
                        self.set_lit(n, Const::Int(bound as i128));
                    }
                }
            }
            _ => {}
        }

        self.nodes[n].ty = Some(TypeId::INT);
        Ok(Ctx::RV)
    }

    fn set_builtin1_child(&mut self, n: NodeId, new: NodeId) {
        match &mut self.nodes[n].kind {
            NodeKind::Len { x }
            | NodeKind::Cap { x }
            | NodeKind::Real { x }
            | NodeKind::Imag { x }
            | NodeKind::Panic { x } => *x = new,
            NodeKind::Close { ch } => *ch = new,
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // complex
    // ------------------------------------------------------------------

    pub(crate) fn tc_complex(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        let NodeKind::Complex { x, y } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let x = self.typecheck(x, Ctx::RV | (top & Ctx::IOTA));
        let y = self.typecheck(y, Ctx::RV | (top & Ctx::IOTA));
        if let NodeKind::Complex { x: xs, y: ys } = &mut self.nodes[n].kind {
            *xs = x;
            *ys = y;
        }
        if self.ty(x).is_none() || self.ty(y).is_none() {
            return Err(());
        }
        self.defaultlit2(x, y, false);
        let (Some(lt), Some(rt)) = (self.ty(x), self.ty(y)) else {
            return Err(());
        };
        if !self.types.eqtype(lt, rt) {
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

        let t = match self.types.etype(lt) {
            EType::IdealInt | EType::IdealRune | EType::IdealFloat => TypeId::IDEAL_COMPLEX,
            EType::Float32 => TypeId::COMPLEX64,
            EType::Float64 => TypeId::COMPLEX128,
            _ => {
                let expr = self.node_str(n);
                let ty = self.type_str(lt);
                self.error_at(
                    n,
                    SemanticError::ComplexNotFloat {
                        expr,
                        ty,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
        };

        let re = self.lit_val(x);
        let im = self.lit_val(y);
        if let (Some(re), Some(im)) = (re, im) {
            let to_f = |c: Const| match c {
                Const::Int(v) | Const::Rune(v) => Some(v as f64),
                Const::Float(f) => Some(f),
                _ => None,
            };
            if let (Some(re), Some(im)) = (to_f(re), to_f(im)) {
                self.nodes[n].ty = Some(t);
                self.set_lit(n, Const::Complex(re, im));
                self.nodes[n].ty = Some(t);
                return Ok(Ctx::RV);
            }
        }

        self.nodes[n].ty = Some(t);
        Ok(Ctx::RV)
    }

    // ------------------------------------------------------------------
    // close, delete
    // ------------------------------------------------------------------

    pub(crate) fn tc_close(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Close { ch } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let ch = self.typecheck(ch, Ctx::RV);
        self.defaultlit(ch, None);
        self.set_builtin1_child(n, ch);
        let t = self.ty(ch).ok_or(())?;
        let Some(dir) = self.types.chan_dir(t) else {
            let expr = self.node_str(n);
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::CloseNonChan {
                    expr,
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        };
        if !dir.can_send() {
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::CloseRecvOnly {
                    expr,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        Ok(Ctx::TOP)
    }

    pub(crate) fn tc_delete(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Delete { args } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        if args.is_empty() {
            self.error_at(
                n,
                SemanticError::DeleteMissingArgs {
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        if args.len() == 1 {
            self.error_at(
                n,
                SemanticError::DeleteMissingKey {
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        if args.len() > 2 {
            self.error_at(
                n,
                SemanticError::DeleteTooManyArgs {
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        let mut args = self.typecheck_list(args, Ctx::RV);
        let l = args[0];
        let r = args[1];
        if let Some(lt) = self.ty(l) {
            if self.types.etype(lt) != EType::Map {
                let ty = self.type_str(lt);
                self.error_at(
                    n,
                    SemanticError::DeleteNotMap {
                        ty,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            if let Some(key) = self.types.map_key(lt) {
                args[1] = self.assignconv(r, key, "delete");
            }
        }
        self.nodes[n].kind = NodeKind::Delete { args };
        Ok(Ctx::TOP)
    }

    // ------------------------------------------------------------------
    // append, copy
    // ------------------------------------------------------------------

    pub(crate) fn tc_append(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Append { args, ddd } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        if args.is_empty() {
            self.error_at(
                n,
                SemanticError::AppendMissingArgs {
                    span: self.span_of(n),
                },
            );
            return Err(());
        }

        let mut args = if args.len() == 1 && !ddd {
            vec![self.typecheck(args[0], Ctx::RV | Ctx::FNSTRUCT)]
        } else {
            self.typecheck_list(args, Ctx::RV)
        };

        let mut t = self.ty(args[0]).ok_or(())?;

        // Unpack a multiple-return result before type-checking.
        if self.types.is_funarg(t) {
            if let Some(fields) = self.types.struct_fields(t) {
                if let Some(first) = fields.first() {
                    t = first.ty;
                }
            }
        }

        self.nodes[n].ty = Some(t);
        if !self.types.is_slice(t) {
            if self.is_nil_const(args[0]) {
                self.error_at(
                    n,
                    SemanticError::AppendUntypedNil {
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::AppendNotSlice {
                    ty,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        let elem = self.types.elem(t).ok_or(())?;

        if ddd {
            if args.len() < 2 {
                self.error_at(
                    n,
                    SemanticError::AppendDddFirst {
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            if args.len() > 2 {
                self.error_at(
                    n,
                    SemanticError::AppendTooManyArgs {
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
            let tail = args[1];
            let tail_is_string = self
                .ty(tail)
                .map(|tt| self.types.etype(tt).is_string())
                .unwrap_or(false);
            if self.types.etype(elem) == EType::Uint8 && tail_is_string {
                self.defaultlit(tail, Some(TypeId::STRING));
            } else {
                args[1] = self.assignconv(tail, t, "append");
            }
            self.nodes[n].kind = NodeKind::Append { args, ddd };
            return Ok(Ctx::RV);
        }

        for a in args.iter_mut().skip(1) {
            if self.ty(*a).is_none() {
                continue;
            }
            *a = self.assignconv(*a, elem, "append");
        }
        self.nodes[n].kind = NodeKind::Append { args, ddd };
        Ok(Ctx::RV)
    }

    pub(crate) fn tc_copy(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Copy { dst, src } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        self.nodes[n].ty = Some(TypeId::INT);
        let dst = self.typecheck(dst, Ctx::RV);
        let src = self.typecheck(src, Ctx::RV);
        if let NodeKind::Copy { dst: d, src: s } = &mut self.nodes[n].kind {
            *d = dst;
            *s = src;
        }
        if self.ty(dst).is_none() || self.ty(src).is_none() {
            return Err(());
        }
        self.defaultlit(dst, None);
        self.defaultlit(src, None);
        let (Some(dt), Some(st)) = (self.ty(dst), self.ty(src)) else {
            return Err(());
        };

        // copy([]byte, string)
        if self.types.is_slice(dt) && self.types.etype(st) == EType::String {
            let de = self.types.elem(dt).ok_or(())?;
            if self.types.eqtype(de, TypeId::UINT8) {
                return Ok(Ctx::TOP | Ctx::RV);
            }
            let left = self.type_str(dt);
            self.error_at(
                n,
                SemanticError::CopyElementMismatch {
                    left,
                    right: "string".to_string(),
                    span: self.span_of(n),
                },
            );
            return Err(());
        }

        if !self.types.is_slice(dt) || !self.types.is_slice(st) {
            let left = self.type_str(dt);
            let right = self.type_str(st);
            let err = if !self.types.is_slice(dt) && !self.types.is_slice(st) {
                SemanticError::CopyNotSlices {
                    left,
                    right,
                    span: self.span_of(n),
                }
            } else if !self.types.is_slice(dt) {
                SemanticError::CopyFirstNotSlice {
                    ty: left,
                    span: self.span_of(n),
                }
            } else {
                SemanticError::CopySecondNotSlice {
                    ty: right,
                    span: self.span_of(n),
                }
            };
            self.error_at(n, err);
            return Err(());
        }

        let de = self.types.elem(dt).ok_or(())?;
        let se = self.types.elem(st).ok_or(())?;
        if !self.types.eqtype(de, se) {
            let left = self.type_str(dt);
            let right = self.type_str(st);
            self.error_at(
                n,
                SemanticError::CopyElementMismatch {
                    left,
                    right,
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        Ok(Ctx::TOP | Ctx::RV)
    }

    // ------------------------------------------------------------------
    // make, new
    // ------------------------------------------------------------------

    pub(crate) fn tc_make(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Make { args } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        if args.is_empty() {
            self.error_at(
                n,
                SemanticError::MakeMissingArg {
                    span: self.span_of(n),
                },
            );
            return Err(());
        }
        let ty_node = self.typecheck(args[0], Ctx::TYPE);
        let t = self.ty(ty_node).ok_or(())?;
        let mut rest = args[1..].to_vec();

        match self.types.etype(t) {
            EType::Array if self.types.is_slice(t) => {
                if rest.is_empty() {
                    let ty = self.type_str(t);
                    self.error_at(
                        n,
                        SemanticError::MakeMissingLen {
                            ty,
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                let len = self.typecheck(rest.remove(0), Ctx::RV);
                let cap = if rest.is_empty() {
                    None
                } else {
                    Some(self.typecheck(rest.remove(0), Ctx::RV))
                };
                if self.ty(len).is_none() || cap.map(|c| self.ty(c).is_none()) == Some(true) {
                    return Err(());
                }
                let mut bad = !self.checkmake(t, "len", len);
                if let Some(cap) = cap {
                    bad |= !self.checkmake(t, "cap", cap);
                }
                if bad {
                    return Err(());
                }
                if let (Some(lv), Some(cap)) = (self.int_const(len), cap) {
                    if let Some(cv) = self.int_const(cap) {
                        if lv > cv {
                            let ty = self.type_str(t);
                            self.error_at(
                                n,
                                SemanticError::MakeLenLargerThanCap {
                                    ty,
                                    span: self.span_of(n),
                                },
                            );
                            return Err(());
                        }
                    }
                }
                if !rest.is_empty() {
                    let ty = self.type_str(t);
                    self.error_at(
                        n,
                        SemanticError::MakeTooManyArgs {
                            ty,
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                self.nodes[n].kind = NodeKind::MakeSlice { len, cap };
            }
            EType::Map => {
                let size = if rest.is_empty() {
                    None
                } else {
                    let s = self.typecheck(rest.remove(0), Ctx::RV);
                    self.defaultlit(s, Some(TypeId::INT));
                    if self.ty(s).is_none() {
                        return Err(());
                    }
                    if !self.checkmake(t, "size", s) {
                        return Err(());
                    }
                    Some(s)
                };
                if !rest.is_empty() {
                    let ty = self.type_str(t);
                    self.error_at(
                        n,
                        SemanticError::MakeTooManyArgs {
                            ty,
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                self.nodes[n].kind = NodeKind::MakeMap { size };
            }
            EType::Chan => {
                let size = if rest.is_empty() {
                    None
                } else {
                    let s = self.typecheck(rest.remove(0), Ctx::RV);
                    self.defaultlit(s, Some(TypeId::INT));
                    if self.ty(s).is_none() {
                        return Err(());
                    }
                    if !self.checkmake(t, "buffer", s) {
                        return Err(());
                    }
                    Some(s)
                };
                if !rest.is_empty() {
                    let ty = self.type_str(t);
                    self.error_at(
                        n,
                        SemanticError::MakeTooManyArgs {
                            ty,
                            span: self.span_of(n),
                        },
                    );
                    return Err(());
                }
                self.nodes[n].kind = NodeKind::MakeChan { size };
            }
            _ => {
                let ty = self.type_str(t);
                self.error_at(
                    n,
                    SemanticError::CannotMake {
                        ty,
                        span: self.span_of(n),
                    },
                );
                return Err(());
            }
        }

        self.nodes[n].ty = Some(t);
        Ok(Ctx::RV)
    }

    fn checkmake(&mut self, t: TypeId, arg: &str, n: NodeId) -> bool {
        if let Some(val) = self.lit_val(n) {
            let v = match val {
                Const::Int(v) | Const::Rune(v) => Some(v),
                Const::Float(f) if f.fract() == 0.0 => Some(f as i128),
                Const::Float(f) => {
                    let val = format!("{:?}", f);
                    self.error_at(
                        n,
                        SemanticError::ConstTruncated {
                            val,
                            span: self.span_of(n),
                        },
                    );
                    return false;
                }
                _ => None,
            };
            if let Some(v) = v {
                if v < 0 {
                    let ty = self.type_str(t);
                    self.error_at(
                        n,
                        SemanticError::MakeNegativeArg {
                            arg: arg.to_string(),
                            ty,
                            span: self.span_of(n),
                        },
                    );
                    return false;
                }
                if v > i64::MAX as i128 {
                    let ty = self.type_str(t);
                    self.error_at(
                        n,
                        SemanticError::MakeArgTooLarge {
                            arg: arg.to_string(),
                            ty,
                            span: self.span_of(n),
                        },
                    );
                    return false;
                }
                // Delay defaultlit until after the range check, to avoid a
                // redundant overflow error.
                self.defaultlit(n, Some(TypeId::INT));
                return true;
            }
        }

        if let Some(nt) = self.ty(n) {
            if !self.types.etype(nt).is_integer() && !nt.is_untyped() {
                let ty = self.type_str(t);
                let argty = self.type_str(nt);
                self.error_at(
                    n,
                    SemanticError::MakeNonInteger {
                        arg: arg.to_string(),
                        ty,
                        argty,
                        span: self.span_of(n),
                    },
                );
                return false;
            }
        }
        // Still necessary for non-constants: n might be 1<<k.
        self.defaultlit(n, Some(TypeId::INT));
        true
    }

    pub(crate) fn tc_new(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::New { ty_expr } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let ty_expr = self.typecheck(ty_expr, Ctx::TYPE);
        self.nodes[n].kind = NodeKind::New { ty_expr };
        let t = self.ty(ty_expr).ok_or(())?;
        self.nodes[n].ty = Some(self.types.ptr_to(t));
        Ok(Ctx::RV)
    }

    // ------------------------------------------------------------------
    // print, panic, recover
    // ------------------------------------------------------------------

    pub(crate) fn tc_print(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let (args, newline) = match self.nodes[n].kind.clone() {
            NodeKind::Print { args } => (args, false),
            NodeKind::Println { args } => (args, true),
            _ => unreachable!(),
        };
        let args = self.typecheck_list(args, Ctx::RV | Ctx::INDIR);
        for &a in &args {
            // Special case: an int constant prints as int64.
            if matches!(self.lit_val(a), Some(Const::Int(_))) {
                self.defaultlit(a, Some(TypeId::INT64));
            } else {
                self.defaultlit(a, None);
            }
        }
        self.nodes[n].kind = if newline {
            NodeKind::Println { args }
        } else {
            NodeKind::Print { args }
        };
        Ok(Ctx::TOP)
    }

    pub(crate) fn tc_panic(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Panic { x } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let x = self.typecheck(x, Ctx::RV);
        self.set_builtin1_child(n, x);
        let iface = self.empty_iface();
        self.defaultlit(x, Some(iface));
        if self.ty(x).is_none() {
            return Err(());
        }
        Ok(Ctx::TOP)
    }

    pub(crate) fn tc_recover(&mut self, n: NodeId) -> Result<Ctx, ()> {
        self.nodes[n].ty = Some(self.empty_iface());
        Ok(Ctx::RV | Ctx::TOP)
    }
}
