// convert.rs
//
// Assignment and conversion legality, and untyped-constant defaulting.
//
// `assignop` decides whether a value of one type may be assigned to a
// location of another and which conversion node, if any, carries it.
// `convertop` extends that to explicit conversions. `convlit` commits an
// untyped constant to a concrete type, checking representability.

use stoat_frontend::{Const, NodeId, NodeKind, TypeId};

use crate::check::Checker;
use crate::errors::SemanticError;
use crate::type_arena::{EType, TypeKind};

/// Conversion carrier chosen by assignop/convertop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvOp {
    /// Representation unchanged.
    Nop,
    /// Wrap in an interface value.
    Iface,
    /// Plain representation change (numeric conversions).
    Plain,
    StrToBytes,
    StrToRunes,
    BytesToStr,
    RunesToStr,
    RuneToStr,
}

impl<'a> Checker<'a> {
    /// May a value of type `from` be assigned to a location of type `to`?
    /// Err carries the detail appended to the diagnostic (possibly empty).
    pub(crate) fn assignop(&self, from: TypeId, to: TypeId) -> Result<ConvOp, String> {
        if to == TypeId::BLANK {
            return Ok(ConvOp::Nop);
        }
        if self.types.eqtype(from, to) {
            return Ok(ConvOp::Nop);
        }

        // Untyped nil is assignable to pointer-shaped things.
        if from == TypeId::NIL {
            if matches!(
                self.types.etype(to),
                EType::Ptr | EType::Func | EType::Map | EType::Chan | EType::Inter
                    | EType::UnsafePtr
            ) || self.types.is_slice(to)
            {
                return Ok(ConvOp::Nop);
            }
            return Err(String::new());
        }

        // Identical underlying types when at least one side is unnamed.
        if (self.types.sym(from).is_none() || self.types.sym(to).is_none())
            && self.eq_underlying(from, to)
        {
            return Ok(ConvOp::Nop);
        }

        // Assignment to an interface requires the implementation relation.
        if self.types.is_inter(to) {
            return match self.implements(from, to) {
                Ok(()) => Ok(ConvOp::Iface),
                Err(fail) => Err(self.impl_why(from, &fail)),
            };
        }

        if self.types.is_inter(from) {
            return Err(": need type assertion".to_string());
        }

        // A bidirectional channel is assignable to a directional one with
        // the same element type when at least one side is unnamed.
        if let (
            TypeKind::Chan {
                elem: e1,
                dir: stoat_frontend::ChanDir::Both,
            },
            TypeKind::Chan { elem: e2, .. },
        ) = (self.types.kind(from), self.types.kind(to))
        {
            if self.types.eqtype(*e1, *e2)
                && (self.types.sym(from).is_none() || self.types.sym(to).is_none())
            {
                return Ok(ConvOp::Nop);
            }
        }

        Err(String::new())
    }

    /// May a value of type `from` be explicitly converted to `to`?
    pub(crate) fn convertop(&self, from: TypeId, to: TypeId) -> Result<ConvOp, String> {
        if let Ok(op) = self.assignop(from, to) {
            return Ok(op);
        }

        let fe = self.types.etype(from);
        let te = self.types.etype(to);

        // Identical underlying types convert freely.
        if self.eq_underlying(from, to) {
            return Ok(ConvOp::Nop);
        }

        // Unnamed pointers whose base types share an underlying type.
        if let (TypeKind::Ptr(f), TypeKind::Ptr(t)) = (self.types.kind(from), self.types.kind(to))
        {
            if self.types.sym(from).is_none()
                && self.types.sym(to).is_none()
                && self.eq_underlying_one_level(*f, *t)
            {
                return Ok(ConvOp::Nop);
            }
        }

        if fe.is_numeric() && te.is_numeric() {
            // Complex narrows to complex only.
            if fe.is_complex() && !te.is_complex() {
                return Err(String::new());
            }
            return Ok(ConvOp::Plain);
        }

        if fe.is_integer() && te.is_string() {
            return Ok(ConvOp::RuneToStr);
        }

        if fe.is_string() {
            if let Some(elem) = self.slice_elem(to) {
                if self.types.eqtype(elem, TypeId::UINT8) {
                    return Ok(ConvOp::StrToBytes);
                }
                if self.types.eqtype(elem, TypeId::INT32) {
                    return Ok(ConvOp::StrToRunes);
                }
            }
        }

        if te.is_string() {
            if let Some(elem) = self.slice_elem(from) {
                if self.types.eqtype(elem, TypeId::UINT8) {
                    return Ok(ConvOp::BytesToStr);
                }
                if self.types.eqtype(elem, TypeId::INT32) {
                    return Ok(ConvOp::RunesToStr);
                }
            }
        }

        // unsafe.Pointer bridges pointers and uintptr.
        if te == EType::UnsafePtr && matches!(fe, EType::Ptr | EType::Uintptr | EType::UnsafePtr) {
            return Ok(ConvOp::Plain);
        }
        if fe == EType::UnsafePtr && matches!(te, EType::Ptr | EType::Uintptr) {
            return Ok(ConvOp::Plain);
        }

        Err(String::new())
    }

    fn slice_elem(&self, t: TypeId) -> Option<TypeId> {
        if self.types.is_slice(t) {
            self.types.elem(t)
        } else {
            None
        }
    }

    /// Structural identity ignoring the top-level names.
    pub(crate) fn eq_underlying(&self, a: TypeId, b: TypeId) -> bool {
        if self.types.etype(a) != self.types.etype(b) {
            return false;
        }
        match (self.types.kind(a), self.types.kind(b)) {
            (TypeKind::Basic(x), TypeKind::Basic(y)) => x == y,
            (TypeKind::Ptr(x), TypeKind::Ptr(y)) => self.types.eqtype(*x, *y),
            _ => {
                // Compare the kinds structurally the way eqtype does, but
                // allow the outermost sym on either side.
                let ka = self.types.kind(a).clone();
                let kb = self.types.kind(b).clone();
                self.eq_kind(&ka, &kb)
            }
        }
    }

    fn eq_underlying_one_level(&self, a: TypeId, b: TypeId) -> bool {
        self.types.eqtype(a, b) || self.eq_underlying(a, b)
    }

    fn eq_kind(&self, a: &TypeKind, b: &TypeKind) -> bool {
        use crate::type_arena::Bound;
        match (a, b) {
            (
                TypeKind::Array { elem: e1, bound: b1 },
                TypeKind::Array { elem: e2, bound: b2 },
            ) => {
                let same = match (b1, b2) {
                    (Bound::Fixed(x), Bound::Fixed(y)) => x == y,
                    (Bound::Slice, Bound::Slice) => true,
                    _ => false,
                };
                same && self.types.eqtype(*e1, *e2)
            }
            (TypeKind::Map { key: k1, val: v1 }, TypeKind::Map { key: k2, val: v2 }) => {
                self.types.eqtype(*k1, *k2) && self.types.eqtype(*v1, *v2)
            }
            (TypeKind::Chan { elem: e1, dir: d1 }, TypeKind::Chan { elem: e2, dir: d2 }) => {
                d1 == d2 && self.types.eqtype(*e1, *e2)
            }
            (
                TypeKind::Struct {
                    fields: f1,
                    funarg: fa1,
                },
                TypeKind::Struct {
                    fields: f2,
                    funarg: fa2,
                },
            ) => {
                fa1 == fa2
                    && f1.len() == f2.len()
                    && f1.iter().zip(f2.iter()).all(|(x, y)| {
                        x.sym == y.sym && x.embedded == y.embedded && self.types.eqtype(x.ty, y.ty)
                    })
            }
            (TypeKind::Inter { methods: m1 }, TypeKind::Inter { methods: m2 }) => {
                m1.len() == m2.len()
                    && m1
                        .iter()
                        .zip(m2.iter())
                        .all(|(x, y)| x.sym == y.sym && self.types.eqtype(x.ty, y.ty))
            }
            (
                TypeKind::Func {
                    params: p1,
                    results: o1,
                    ..
                },
                TypeKind::Func {
                    params: p2,
                    results: o2,
                    ..
                },
            ) => {
                p1.len() == p2.len()
                    && o1.len() == o2.len()
                    && p1
                        .iter()
                        .zip(p2.iter())
                        .all(|(x, y)| x.ddd == y.ddd && self.types.eqtype(x.ty, y.ty))
                    && o1
                        .iter()
                        .zip(o2.iter())
                        .all(|(x, y)| self.types.eqtype(x.ty, y.ty))
            }
            _ => false,
        }
    }

    /// Convert `n` (typically an untyped constant) to type `t`, enforcing
    /// assignability via `assignop` and wrapping in an implicit conversion
    /// when the representation differs.
    pub(crate) fn assignconv(&mut self, n: NodeId, t: TypeId, desc: &str) -> NodeId {
        let Some(nt) = self.nodes[n].ty else { return n };
        if nt == TypeId::INVALID || t == TypeId::INVALID || self.types.broke(t) {
            return n;
        }

        if t == TypeId::BLANK {
            self.defaultlit(n, None);
            return n;
        }

        // Untyped bool stays coercible to any bool type; everything else
        // commits to the target's shape first.
        if nt.is_untyped() {
            self.convlit_toward(n, t);
        }
        let Some(nt) = self.nodes[n].ty else { return n };

        match self.assignop(nt, t) {
            Ok(ConvOp::Nop) => n,
            Ok(op) => self.wrap_conv(n, op, t),
            Err(why) => {
                if !self.nodes[n].diag {
                    let val = self.node_str_long(n);
                    let ty = self.type_str(t);
                    self.error_at(
                        n,
                        SemanticError::CannotUseAsType {
                            val,
                            ty,
                            desc: desc.to_string(),
                            why,
                            span: self.span_of(n),
                        },
                    );
                    self.nodes[n].diag = true;
                }
                n
            }
        }
    }

    /// Wrap `n` in an implicit conversion node carrying `op`.
    pub(crate) fn wrap_conv(&mut self, n: NodeId, op: ConvOp, t: TypeId) -> NodeId {
        let span = self.nodes[n].span;
        let kind = conv_kind(op, n);
        let w = self.nodes.alloc(kind, span);
        self.nodes[w].ty = Some(t);
        self.nodes[w].implicit = true;
        self.nodes[w].typecheck = stoat_frontend::TcState::Done;
        self.nodes[w].orig = self.nodes[n].orig;
        w
    }

    /// Steer an untyped constant toward `t` before assignability checking:
    /// commit to `t` when the value kind fits it, else to the default.
    fn convlit_toward(&mut self, n: NodeId, t: TypeId) {
        let Some(nt) = self.nodes[n].ty else { return };
        if !nt.is_untyped() {
            return;
        }
        if nt == TypeId::NIL {
            // assignop decides whether nil fits; no commitment here.
            return;
        }
        if self.class_accepts(t, nt) {
            self.convlit(n, t, false);
        } else {
            self.defaultlit(n, None);
        }
    }

    /// Would target type `t` accept a constant of ideal type `ideal`?
    fn class_accepts(&self, t: TypeId, ideal: TypeId) -> bool {
        let te = self.types.etype(t);
        match ideal {
            TypeId::IDEAL_INT | TypeId::IDEAL_RUNE | TypeId::IDEAL_FLOAT
            | TypeId::IDEAL_COMPLEX => te.is_numeric(),
            TypeId::IDEAL_STRING => te.is_string(),
            TypeId::IDEAL_BOOL => te.is_bool(),
            _ => false,
        }
    }

    /// Commit a literal (or untyped expression) to type `t`. Reports and
    /// poisons the node when the value is not representable.
    pub(crate) fn convlit(&mut self, n: NodeId, t: TypeId, explicit: bool) {
        let Some(cur) = self.nodes[n].ty else { return };
        if cur == t {
            return;
        }

        if !self.nodes[n].is_lit() {
            // An untyped operator node (comparison result, logical chain):
            // retype it and its operands.
            if !cur.is_untyped() {
                return;
            }
            if !t.is_untyped() && !self.class_accepts(t, cur) && cur != TypeId::NIL {
                self.convlit_fail(n, t);
                return;
            }
            self.nodes[n].ty = Some(t);
            match self.nodes[n].kind.clone() {
                NodeKind::Unary { x, .. } => self.convlit(x, t, false),
                NodeKind::Binary { op, x, y } => {
                    if !op.is_cmp() && !op.is_shift() {
                        self.convlit(x, t, false);
                        self.convlit(y, t, false);
                    } else if op.is_shift() {
                        self.convlit(x, t, false);
                    }
                }
                _ => {}
            }
            return;
        }

        let Some(val) = self.nodes[n].val.clone() else {
            return;
        };
        if !cur.is_untyped() && !explicit {
            return;
        }

        let te = self.types.etype(t);
        let converted: Option<Const> = if te.is_integer() {
            self.val_to_int(n, &val, t)
        } else if te.is_float() {
            self.val_to_float(n, &val, t)
        } else if te.is_complex() {
            match val {
                Const::Int(v) => Some(Const::Complex(v as f64, 0.0)),
                Const::Rune(v) => Some(Const::Complex(v as f64, 0.0)),
                Const::Float(v) => Some(Const::Complex(v, 0.0)),
                Const::Complex(..) => Some(val),
                _ => None,
            }
        } else if te.is_string() {
            match val {
                Const::Str(_) => Some(val),
                Const::Int(v) | Const::Rune(v) if explicit => {
                    let ch = char::from_u32(v as u32).unwrap_or('\u{FFFD}');
                    Some(Const::Str(ch.to_string()))
                }
                _ => None,
            }
        } else if te.is_bool() {
            match val {
                Const::Bool(_) => Some(val),
                _ => None,
            }
        } else if matches!(
            te,
            EType::Ptr | EType::Func | EType::Map | EType::Chan | EType::Inter | EType::UnsafePtr
        ) || self.types.is_slice(t)
        {
            match val {
                Const::Nil => Some(Const::Nil),
                _ => None,
            }
        } else {
            None
        };

        match converted {
            Some(v) => {
                self.nodes[n].val = Some(v);
                self.nodes[n].ty = Some(t);
            }
            None => self.convlit_fail(n, t),
        }
    }

    fn val_to_int(&mut self, n: NodeId, val: &Const, t: TypeId) -> Option<Const> {
        let v: i128 = match val {
            Const::Int(v) | Const::Rune(v) => *v,
            Const::Float(f) => {
                if f.fract() != 0.0 {
                    let val = format!("{:?}", f);
                    self.error_at(
                        n,
                        SemanticError::ConstTruncated {
                            val,
                            span: self.span_of(n),
                        },
                    );
                    self.nodes[n].diag = true;
                    return None;
                }
                *f as i128
            }
            Const::Complex(re, im) => {
                if *im != 0.0 || re.fract() != 0.0 {
                    let val = format!("{:?}{:+?}i", re, im);
                    self.error_at(
                        n,
                        SemanticError::ConstTruncated {
                            val,
                            span: self.span_of(n),
                        },
                    );
                    self.nodes[n].diag = true;
                    return None;
                }
                *re as i128
            }
            _ => return None,
        };

        let (lo, hi): (i128, i128) = match t {
            TypeId::INT8 => (i8::MIN as i128, i8::MAX as i128),
            TypeId::INT16 => (i16::MIN as i128, i16::MAX as i128),
            TypeId::INT32 => (i32::MIN as i128, i32::MAX as i128),
            TypeId::INT64 | TypeId::INT => (i64::MIN as i128, i64::MAX as i128),
            TypeId::UINT8 => (0, u8::MAX as i128),
            TypeId::UINT16 => (0, u16::MAX as i128),
            TypeId::UINT32 => (0, u32::MAX as i128),
            TypeId::UINT64 | TypeId::UINT | TypeId::UINTPTR => (0, u64::MAX as i128),
            // A named integer type: range of its underlying kind.
            other => match self.types.etype(other) {
                EType::Int8 => (i8::MIN as i128, i8::MAX as i128),
                EType::Int16 => (i16::MIN as i128, i16::MAX as i128),
                EType::Int32 => (i32::MIN as i128, i32::MAX as i128),
                EType::Int64 | EType::Int => (i64::MIN as i128, i64::MAX as i128),
                EType::Uint8 => (0, u8::MAX as i128),
                EType::Uint16 => (0, u16::MAX as i128),
                EType::Uint32 => (0, u32::MAX as i128),
                _ => (0, u64::MAX as i128),
            },
        };

        if v < lo || v > hi {
            let val = v.to_string();
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::ConstOverflow {
                    val,
                    ty,
                    span: self.span_of(n),
                },
            );
            self.nodes[n].diag = true;
            return None;
        }
        Some(Const::Int(v))
    }

    fn val_to_float(&mut self, n: NodeId, val: &Const, t: TypeId) -> Option<Const> {
        let f: f64 = match val {
            Const::Int(v) | Const::Rune(v) => *v as f64,
            Const::Float(f) => *f,
            Const::Complex(re, im) => {
                if *im != 0.0 {
                    return None;
                }
                *re
            }
            _ => return None,
        };
        if self.types.etype(t) == EType::Float32 && f.is_finite() && (f as f32).is_infinite() {
            let val = format!("{:?}", f);
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::ConstOverflow {
                    val,
                    ty,
                    span: self.span_of(n),
                },
            );
            self.nodes[n].diag = true;
            return None;
        }
        Some(Const::Float(f))
    }

    fn convlit_fail(&mut self, n: NodeId, t: TypeId) {
        if !self.nodes[n].diag && !self.types.broke(t) {
            let val = self.node_str_long(n);
            let ty = self.type_str(t);
            self.error_at(
                n,
                SemanticError::CannotConvert {
                    val,
                    ty,
                    why: String::new(),
                    span: self.span_of(n),
                },
            );
            self.nodes[n].diag = true;
        }
        self.nodes[n].ty = None;
    }

    /// Give an untyped node its default type, or `t` when compatible.
    pub(crate) fn defaultlit(&mut self, n: NodeId, t: Option<TypeId>) {
        let Some(cur) = self.nodes[n].ty else { return };
        if !cur.is_untyped() {
            return;
        }

        if cur == TypeId::NIL {
            match t {
                Some(t) => self.convlit(n, t, false),
                None => {
                    self.error_at(
                        n,
                        SemanticError::UntypedNil {
                            span: self.span_of(n),
                        },
                    );
                    self.nodes[n].ty = None;
                }
            }
            return;
        }

        let target = match t {
            Some(t) if self.class_accepts(t, cur) => t,
            _ => crate::type_arena::TypeArena::default_type(cur),
        };
        self.convlit(n, target, false);
    }

    /// Untyped-untyped and untyped-typed defaulting for binary operands.
    pub(crate) fn defaultlit2(&mut self, l: NodeId, r: NodeId, force: bool) {
        let (Some(lt), Some(rt)) = (self.nodes[l].ty, self.nodes[r].ty) else {
            return;
        };
        if !lt.is_untyped() && !rt.is_untyped() {
            return;
        }
        if !lt.is_untyped() {
            self.convlit(r, lt, false);
            return;
        }
        if !rt.is_untyped() {
            self.convlit(l, rt, false);
            return;
        }
        if !force {
            return;
        }
        if lt == TypeId::NIL || rt == TypeId::NIL {
            return;
        }
        if lt == TypeId::IDEAL_BOOL && rt == TypeId::IDEAL_BOOL {
            self.convlit(l, TypeId::BOOL, false);
            self.convlit(r, TypeId::BOOL, false);
            return;
        }
        if lt == TypeId::IDEAL_STRING && rt == TypeId::IDEAL_STRING {
            self.convlit(l, TypeId::STRING, false);
            self.convlit(r, TypeId::STRING, false);
            return;
        }
        if lt.is_ideal_number() && rt.is_ideal_number() {
            let hi = if lt.index() >= rt.index() { lt } else { rt };
            let target = crate::type_arena::TypeArena::default_type(hi);
            self.convlit(l, target, false);
            self.convlit(r, target, false);
        }
    }

    /// Detail string for a failed interface-implementation check.
    pub(crate) fn impl_why(&self, from: TypeId, fail: &crate::lookdot::ImplFail) -> String {
        let name = fail
            .missing
            .sym
            .map(|s| self.syms.name(s).to_string())
            .unwrap_or_default();
        if fail.ptr {
            format!(
                ":\n\t{} does not implement the interface ({} method has pointer receiver)",
                self.type_str(from),
                name
            )
        } else if let Some(have) = &fail.have {
            let have_name = have
                .sym
                .map(|s| self.syms.name(s).to_string())
                .unwrap_or_default();
            if have_name == name {
                format!(
                    ":\n\t{} does not implement the interface (wrong type for {} method)",
                    self.type_str(from),
                    name
                )
            } else {
                format!(
                    ":\n\t{} does not implement the interface (missing {} method)",
                    self.type_str(from),
                    name
                )
            }
        } else {
            format!(
                ":\n\t{} does not implement the interface (missing {} method)",
                self.type_str(from),
                name
            )
        }
    }
}

fn conv_kind(op: ConvOp, x: NodeId) -> NodeKind {
    match op {
        ConvOp::Nop => NodeKind::ConvNop { x },
        ConvOp::Iface => NodeKind::ConvIface { x },
        ConvOp::Plain => NodeKind::Conv { x },
        ConvOp::StrToBytes => NodeKind::StrToBytes { x },
        ConvOp::StrToRunes => NodeKind::StrToRunes { x },
        ConvOp::BytesToStr => NodeKind::BytesToStr { x },
        ConvOp::RunesToStr => NodeKind::RunesToStr { x },
        ConvOp::RuneToStr => NodeKind::RuneToStr { x },
    }
}
