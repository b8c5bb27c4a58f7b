// const_eval.rs
//
// Constant folding and literal conversion.
//
// Folding rewrites the node in place into a literal, keeping the original
// as the `orig` shadow for diagnostics. Values are kept at full i128/f64
// precision until a conversion pins a concrete kind; representability is
// checked at that point.

use stoat_frontend::{BinOp, Const, NodeId, NodeKind, TypeId, UnOp};

use crate::check::Checker;
use crate::errors::SemanticError;

impl<'a> Checker<'a> {
    /// Fold `n` into a literal if its operands are literals.
    pub(crate) fn evconst(&mut self, n: NodeId) {
        match self.nodes[n].kind.clone() {
            NodeKind::Unary { op, x } => {
                let Some(v) = self.lit_val(x) else { return };
                if let Some(out) = self.fold_unary(n, op, v) {
                    self.set_lit(n, out);
                }
            }
            NodeKind::Binary { op, x, y } => {
                let (Some(a), Some(b)) = (self.lit_val(x), self.lit_val(y)) else {
                    return;
                };
                if let Some(out) = self.fold_binary(n, op, a, b) {
                    if op.is_cmp() {
                        self.nodes[n].ty = Some(TypeId::IDEAL_BOOL);
                    }
                    self.set_lit(n, out);
                }
            }
            NodeKind::AddStr { list } => {
                let mut out = String::new();
                for &e in &list {
                    match self.lit_val(e) {
                        Some(Const::Str(s)) => out.push_str(&s),
                        _ => return,
                    }
                }
                self.set_lit(n, Const::Str(out));
            }
            _ => {}
        }
    }

    /// The value of a literal node.
    pub(crate) fn lit_val(&self, n: NodeId) -> Option<Const> {
        if self.nodes[n].is_lit() {
            self.nodes[n].val.clone()
        } else {
            None
        }
    }

    pub(crate) fn int_const(&self, n: NodeId) -> Option<i128> {
        match self.lit_val(n) {
            Some(Const::Int(v)) | Some(Const::Rune(v)) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn str_const(&self, n: NodeId) -> Option<String> {
        match self.lit_val(n) {
            Some(Const::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn is_nil_const(&self, n: NodeId) -> bool {
        matches!(self.lit_val(n), Some(Const::Nil))
    }

    /// A compile-time constant in the language sense. A literal whose
    /// value never arrived (a broken definition) still counts; the wound
    /// was already diagnosed.
    pub(crate) fn is_go_const(&self, n: NodeId) -> bool {
        self.nodes[n].is_lit() && !matches!(self.nodes[n].val, Some(Const::Nil))
    }

    /// Non-negative integer constant value, for indices and bounds.
    pub(crate) fn nonneg_const(&self, n: NodeId) -> Option<i64> {
        match self.int_const(n) {
            Some(v) if v >= 0 && v <= i64::MAX as i128 => Some(v as i64),
            _ => None,
        }
    }

    /// Rewrite `n` into a literal in place, shadowing the original.
    pub(crate) fn set_lit(&mut self, n: NodeId, val: Const) {
        if self.nodes[n].orig.is_none() {
            let shadow = self.nodes.shadow(n);
            self.nodes[n].orig = Some(shadow);
        }
        if self.nodes[n].ty.map(|t| t.is_untyped()).unwrap_or(true) {
            self.nodes[n].ty = Some(ideal_of(&val));
        }
        self.nodes[n].kind = NodeKind::Lit;
        self.nodes[n].val = Some(val);
    }

    fn fold_unary(&mut self, n: NodeId, op: UnOp, v: Const) -> Option<Const> {
        match (op, v) {
            (UnOp::Plus, v) => Some(v),
            (UnOp::Neg, Const::Int(v)) => match v.checked_neg() {
                Some(r) => Some(Const::Int(r)),
                None => {
                    self.overflow(n, "negation");
                    None
                }
            },
            (UnOp::Neg, Const::Rune(v)) => Some(Const::Rune(-v)),
            (UnOp::Neg, Const::Float(v)) => Some(Const::Float(-v)),
            (UnOp::Neg, Const::Complex(re, im)) => Some(Const::Complex(-re, -im)),
            (UnOp::Com, Const::Int(v)) => Some(Const::Int(!v)),
            (UnOp::Com, Const::Rune(v)) => Some(Const::Rune(!v)),
            (UnOp::Not, Const::Bool(b)) => Some(Const::Bool(!b)),
            _ => None,
        }
    }

    fn fold_binary(&mut self, n: NodeId, op: BinOp, a: Const, b: Const) -> Option<Const> {
        use BinOp::*;

        if op.is_shift() {
            return self.fold_shift(n, op, a, b);
        }

        let (a, b) = promote2(a, b)?;
        match (a, b) {
            (Const::Int(x), Const::Int(y)) => self.fold_int(n, op, x, y, false),
            (Const::Rune(x), Const::Rune(y)) => self.fold_int(n, op, x, y, true),
            (Const::Float(x), Const::Float(y)) => match op {
                Add => Some(Const::Float(x + y)),
                Sub => Some(Const::Float(x - y)),
                Mul => Some(Const::Float(x * y)),
                Div => {
                    if y == 0.0 {
                        self.div_zero(n);
                        return None;
                    }
                    Some(Const::Float(x / y))
                }
                Eq => Some(Const::Bool(x == y)),
                Ne => Some(Const::Bool(x != y)),
                Lt => Some(Const::Bool(x < y)),
                Le => Some(Const::Bool(x <= y)),
                Gt => Some(Const::Bool(x > y)),
                Ge => Some(Const::Bool(x >= y)),
                _ => None,
            },
            (Const::Complex(xr, xi), Const::Complex(yr, yi)) => match op {
                Add => Some(Const::Complex(xr + yr, xi + yi)),
                Sub => Some(Const::Complex(xr - yr, xi - yi)),
                Mul => Some(Const::Complex(xr * yr - xi * yi, xr * yi + xi * yr)),
                Div => {
                    let d = yr * yr + yi * yi;
                    if d == 0.0 {
                        self.div_zero(n);
                        return None;
                    }
                    Some(Const::Complex(
                        (xr * yr + xi * yi) / d,
                        (xi * yr - xr * yi) / d,
                    ))
                }
                Eq => Some(Const::Bool(xr == yr && xi == yi)),
                Ne => Some(Const::Bool(xr != yr || xi != yi)),
                _ => None,
            },
            (Const::Str(x), Const::Str(y)) => match op {
                Add => Some(Const::Str(x + &y)),
                Eq => Some(Const::Bool(x == y)),
                Ne => Some(Const::Bool(x != y)),
                Lt => Some(Const::Bool(x < y)),
                Le => Some(Const::Bool(x <= y)),
                Gt => Some(Const::Bool(x > y)),
                Ge => Some(Const::Bool(x >= y)),
                _ => None,
            },
            (Const::Bool(x), Const::Bool(y)) => match op {
                AndAnd => Some(Const::Bool(x && y)),
                OrOr => Some(Const::Bool(x || y)),
                Eq => Some(Const::Bool(x == y)),
                Ne => Some(Const::Bool(x != y)),
                _ => None,
            },
            _ => None,
        }
    }

    fn fold_int(&mut self, n: NodeId, op: BinOp, x: i128, y: i128, rune: bool) -> Option<Const> {
        use BinOp::*;
        let wrap = |v: i128| if rune { Const::Rune(v) } else { Const::Int(v) };
        match op {
            Add => match x.checked_add(y) {
                Some(r) => Some(wrap(r)),
                None => {
                    self.overflow(n, "addition");
                    None
                }
            },
            Sub => match x.checked_sub(y) {
                Some(r) => Some(wrap(r)),
                None => {
                    self.overflow(n, "subtraction");
                    None
                }
            },
            Mul => match x.checked_mul(y) {
                Some(r) => Some(wrap(r)),
                None => {
                    self.overflow(n, "multiplication");
                    None
                }
            },
            Div => {
                if y == 0 {
                    self.div_zero(n);
                    return None;
                }
                Some(wrap(x / y))
            }
            Mod => {
                if y == 0 {
                    self.div_zero(n);
                    return None;
                }
                Some(wrap(x % y))
            }
            And => Some(wrap(x & y)),
            Or => Some(wrap(x | y)),
            Xor => Some(wrap(x ^ y)),
            AndNot => Some(wrap(x & !y)),
            Eq => Some(Const::Bool(x == y)),
            Ne => Some(Const::Bool(x != y)),
            Lt => Some(Const::Bool(x < y)),
            Le => Some(Const::Bool(x <= y)),
            Gt => Some(Const::Bool(x > y)),
            Ge => Some(Const::Bool(x >= y)),
            _ => None,
        }
    }

    fn fold_shift(&mut self, n: NodeId, op: BinOp, a: Const, b: Const) -> Option<Const> {
        let x = a.int_val()?;
        let count = b.int_val()?;
        if !(0..=1023).contains(&count) {
            let count = count.to_string();
            self.error_at(
                n,
                SemanticError::ShiftCountTooLarge {
                    count,
                    span: self.span_of(n),
                },
            );
            return None;
        }
        let rune = matches!(a, Const::Rune(_));
        let wrap = |v: i128| if rune { Const::Rune(v) } else { Const::Int(v) };
        match op {
            BinOp::Shl => match x.checked_shl(count as u32) {
                Some(r) if (r >> count) == x => Some(wrap(r)),
                _ => {
                    self.overflow(n, "shift");
                    None
                }
            },
            BinOp::Shr => Some(wrap(x >> count.min(127))),
            _ => None,
        }
    }

    fn overflow(&mut self, n: NodeId, op: &str) {
        if !self.nodes[n].diag {
            self.nodes[n].diag = true;
            let op = op.to_string();
            self.error_at(
                n,
                SemanticError::ArithOverflow {
                    op,
                    span: self.span_of(n),
                },
            );
        }
    }

    fn div_zero(&mut self, n: NodeId) {
        if !self.nodes[n].diag {
            self.nodes[n].diag = true;
            self.error_at(
                n,
                SemanticError::DivisionByZero {
                    span: self.span_of(n),
                },
            );
        }
    }

    /// Typechecking of untyped values as array/slice indexes: numeric
    /// constants default to int whenever they can be represented by one.
    pub(crate) fn index_lit(&mut self, n: NodeId) {
        let Some(t) = self.nodes[n].ty else { return };
        if !t.is_untyped() {
            return;
        }
        if t.is_ideal_number() {
            self.defaultlit(n, Some(TypeId::INT));
        }
        self.defaultlit(n, None);
    }
}

/// The ideal type of a constant value.
pub(crate) fn ideal_of(val: &Const) -> TypeId {
    match val {
        Const::Int(_) => TypeId::IDEAL_INT,
        Const::Rune(_) => TypeId::IDEAL_RUNE,
        Const::Float(_) => TypeId::IDEAL_FLOAT,
        Const::Complex(..) => TypeId::IDEAL_COMPLEX,
        Const::Str(_) => TypeId::IDEAL_STRING,
        Const::Bool(_) => TypeId::IDEAL_BOOL,
        Const::Nil => TypeId::NIL,
    }
}

/// Bring two constants to a common kind along the numeric tower
/// int < rune < float < complex. Non-numeric kinds must already match.
pub(crate) fn promote2(a: Const, b: Const) -> Option<(Const, Const)> {
    use Const::*;
    let rank = |c: &Const| match c {
        Int(_) => Some(0),
        Rune(_) => Some(1),
        Float(_) => Some(2),
        Complex(..) => Some(3),
        _ => None,
    };
    match (rank(&a), rank(&b)) {
        (Some(ra), Some(rb)) => {
            let to = ra.max(rb);
            Some((promote_to(a, to), promote_to(b, to)))
        }
        _ => {
            let same = matches!(
                (&a, &b),
                (Str(_), Str(_)) | (Bool(_), Bool(_)) | (Nil, Nil)
            );
            if same {
                Some((a, b))
            } else {
                None
            }
        }
    }
}

fn promote_to(c: Const, rank: u8) -> Const {
    use Const::*;
    match (c, rank) {
        (Int(v), 1) => Rune(v),
        (Int(v), 2) => Float(v as f64),
        (Int(v), 3) => Complex(v as f64, 0.0),
        (Rune(v), 2) => Float(v as f64),
        (Rune(v), 3) => Complex(v as f64, 0.0),
        (Float(v), 3) => Complex(v, 0.0),
        (c, _) => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promote_int_and_float() {
        let (a, b) = promote2(Const::Int(2), Const::Float(1.5)).unwrap();
        assert_eq!(a, Const::Float(2.0));
        assert_eq!(b, Const::Float(1.5));
    }

    #[test]
    fn promote_rune_keeps_rune_kind() {
        let (a, b) = promote2(Const::Rune(97), Const::Int(1)).unwrap();
        assert_eq!(a, Const::Rune(97));
        assert_eq!(b, Const::Rune(1));
    }

    #[test]
    fn mismatched_kinds_do_not_promote() {
        assert!(promote2(Const::Str("a".into()), Const::Int(1)).is_none());
    }
}
