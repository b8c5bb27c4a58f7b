// assign.rs
//
// Assignment and call conformance: lvalue discipline, single and
// multi-value assignment, and the argument-to-parameter matcher shared by
// calls and returns.

use stoat_frontend::{NodeId, NodeKind, TcState, TypeId};

use crate::check::{Checker, Ctx};
use crate::errors::SemanticError;
use crate::type_arena::{EType, Field};

/// In-place update of x = x[0:y] and x = append(x, ...) is recognized but
/// disabled until the backend updates the slice without touching the
/// pointer.
const RESLICE_IN_PLACE: bool = false;

impl<'a> Checker<'a> {
    // ------------------------------------------------------------------
    // Lvalues
    // ------------------------------------------------------------------

    pub(crate) fn islvalue(&self, n: NodeId) -> bool {
        match &self.nodes[n].kind {
            NodeKind::Index { x, .. } => {
                let xt = self.nodes[*x].ty;
                if xt.map(|t| self.types.is_fixed_array(t)) == Some(true) {
                    return self.islvalue(*x);
                }
                if xt.map(|t| self.types.etype(t) == EType::String) == Some(true) {
                    return false;
                }
                true
            }
            NodeKind::IndexMap { .. } => true,
            NodeKind::Deref { .. } | NodeKind::DotPtr { .. } | NodeKind::ClosureVar => true,
            NodeKind::Dot { x, .. } => self.islvalue(*x),
            NodeKind::Name => self.nodes[n].class != stoat_frontend::Class::Func,
            _ => false,
        }
    }

    pub(crate) fn checklvalue(&mut self, n: NodeId, verb: &str) {
        if !self.islvalue(n) {
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::NotLvalue {
                    verb: verb.to_string(),
                    expr,
                    span: self.span_of(n),
                },
            );
        }
    }

    /// One step toward the outermost value a node reads through: dots,
    /// parens, no-op conversions, and fixed-array indexing.
    pub(crate) fn outer_step(&self, n: NodeId) -> Option<NodeId> {
        match &self.nodes[n].kind {
            NodeKind::Dot { x, .. } | NodeKind::Paren { x } | NodeKind::ConvNop { x } => Some(*x),
            NodeKind::Index { x, .. } => {
                if self.nodes[*x].ty.map(|t| self.types.is_fixed_array(t)) == Some(true) {
                    Some(*x)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub(crate) fn outervalue(&self, n: NodeId) -> NodeId {
        let mut n = n;
        while let Some(next) = self.outer_step(n) {
            n = next;
        }
        n
    }

    /// Mark the assignment flags on everything from `n` down to the
    /// outermost value, and on the closure-captured originals.
    pub(crate) fn checkassign(&mut self, stmt: NodeId, n: NodeId) {
        if self.nodes[n].defn != Some(stmt) {
            let leaf = self.outervalue(n);
            let mut cur = n;
            loop {
                self.nodes[cur].assigned = true;
                if let Some(c) = self.nodes[cur].closure {
                    self.nodes[c].assigned = true;
                }
                if cur == leaf {
                    break;
                }
                match self.outer_step(cur) {
                    Some(next) => cur = next,
                    None => break,
                }
            }
        }

        if self.islvalue(n) {
            return;
        }
        if matches!(self.nodes[n].kind, NodeKind::IndexMap { .. }) {
            // A map element write; flagged for the backend.
            self.nodes[n].assigned = true;
            return;
        }

        // Have already complained about the name being undefined.
        if matches!(self.nodes[n].kind, NodeKind::RawName) {
            return;
        }

        let expr = self.node_str(n);
        self.error_at(
            n,
            SemanticError::CannotAssign {
                expr,
                span: self.span_of(n),
            },
        );
    }

    // ------------------------------------------------------------------
    // Single assignment
    // ------------------------------------------------------------------

    pub(crate) fn tc_as(&mut self, n: NodeId) {
        let NodeKind::Assign { l, r } = self.nodes[n].kind.clone() else {
            unreachable!()
        };

        // Delicate little dance: the definition of the left side may refer
        // to this assignment as its defining statement, in which case it
        // must not be re-entered from here.
        let mut l = self.resolve(l);
        if self.nodes[l].defn != Some(n) || self.nodes[l].ntype.is_some() {
            l = self.typecheck(l, Ctx::RV | Ctx::ASGN);
        }

        let mut r = self.typecheck(r, Ctx::RV);
        self.set_assign_children(n, l, r);
        self.checkassign(n, l);
        if self.ty(r).is_some() {
            if let Some(lt) = self.ty(l) {
                r = self.assignconv(r, lt, "assignment");
                self.set_assign_children(n, l, r);
            }
        }

        if self.nodes[l].defn == Some(n) && self.nodes[l].ntype.is_none() {
            self.defaultlit(r, None);
            self.nodes[l].ty = self.ty(r);
        }

        // Second half of the dance: now that the right side is done, check
        // the left just to get it over with.
        self.nodes[n].typecheck = TcState::Done;
        if self.nodes[l].typecheck == TcState::Unchecked {
            self.typecheck(l, Ctx::RV | Ctx::ASGN);
        }

        // Recognize slices being updated in place, for better code
        // generation later.
        if !matches!(self.nodes[l].kind, NodeKind::IndexMap { .. }) {
            match self.nodes[r].kind.clone() {
                NodeKind::Slice { x, lo, .. }
                | NodeKind::SliceStr { x, lo, .. }
                | NodeKind::SliceArr { x, lo, .. } => {
                    let lo_zero = match lo {
                        None => true,
                        Some(lo) => self.int_const(lo) == Some(0),
                    };
                    if RESLICE_IN_PLACE && self.samesafeexpr(l, x) && lo_zero {
                        self.nodes[r].reslice = true;
                    }
                }
                NodeKind::Append { args, .. } => {
                    if RESLICE_IN_PLACE
                        && !args.is_empty()
                        && self.samesafeexpr(l, args[0])
                    {
                        self.nodes[r].reslice = true;
                    }
                }
                _ => {}
            }
        }
    }

    fn set_assign_children(&mut self, n: NodeId, nl: NodeId, nr: NodeId) {
        if let NodeKind::Assign { l, r } = &mut self.nodes[n].kind {
            *l = nl;
            *r = nr;
        }
    }

    /// Are `l` and `r` the same side-effect-free expression, so that one
    /// can be reused instead of computing both?
    pub(crate) fn samesafeexpr(&self, l: NodeId, r: NodeId) -> bool {
        let (lt, rt) = (self.nodes[l].ty, self.nodes[r].ty);
        match (lt, rt) {
            (Some(a), Some(b)) if self.types.eqtype(a, b) => {}
            _ => return false,
        }
        match (&self.nodes[l].kind, &self.nodes[r].kind) {
            (NodeKind::Name, NodeKind::Name) | (NodeKind::ClosureVar, NodeKind::ClosureVar) => {
                l == r
            }
            (NodeKind::Dot { x: lx, sel: ls }, NodeKind::Dot { x: rx, sel: rs })
            | (NodeKind::DotPtr { x: lx, sel: ls }, NodeKind::DotPtr { x: rx, sel: rs }) => {
                ls == rs && self.samesafeexpr(*lx, *rx)
            }
            (NodeKind::Deref { x: lx }, NodeKind::Deref { x: rx }) => {
                self.samesafeexpr(*lx, *rx)
            }
            (NodeKind::Index { x: lx, i: li }, NodeKind::Index { x: rx, i: ri }) => {
                self.samesafeexpr(*lx, *rx) && self.samesafeexpr(*li, *ri)
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Multi-assignment
    // ------------------------------------------------------------------

    fn checkassignto(&mut self, src: TypeId, dst: NodeId) {
        let Some(dt) = self.ty(dst) else { return };
        if let Err(why) = self.assignop(src, dt) {
            let ty = self.type_str(src);
            let expr = self.node_str_long(dst);
            self.error_at(
                dst,
                SemanticError::MultiAssignBadType {
                    ty,
                    expr,
                    why,
                    span: self.span_of(dst),
                },
            );
        }
    }

    pub(crate) fn tc_as2(&mut self, n: NodeId) {
        let NodeKind::Assign2 { lhs, rhs } = self.nodes[n].kind.clone() else {
            unreachable!()
        };

        let mut lhs = lhs;
        for slot in lhs.iter_mut() {
            let l = self.resolve(*slot);
            *slot = l;
            if self.nodes[l].defn != Some(n) || self.nodes[l].ntype.is_some() {
                *slot = self.typecheck(l, Ctx::RV | Ctx::ASGN);
            }
        }

        let cl = lhs.len();
        let cr = rhs.len();
        let mut rhs = rhs;
        if cl > 1 && cr == 1 {
            rhs[0] = self.typecheck(rhs[0], Ctx::RV | Ctx::FNSTRUCT);
        } else {
            rhs = self.typecheck_list(rhs, Ctx::RV);
        }
        self.set_assign2(n, lhs.clone(), rhs.clone());
        for &l in &lhs {
            self.checkassign(n, l);
        }

        if cl == cr {
            // Easy: element-wise.
            for i in 0..cl {
                let (l, mut r) = (lhs[i], rhs[i]);
                if self.ty(l).is_some() && self.ty(r).is_some() {
                    let lt = self.ty(l).unwrap();
                    r = self.assignconv(r, lt, "assignment");
                    rhs[i] = r;
                }
                if self.nodes[l].defn == Some(n) && self.nodes[l].ntype.is_none() {
                    self.defaultlit(r, None);
                    self.nodes[l].ty = self.ty(r);
                }
            }
            self.set_assign2(n, lhs.clone(), rhs);
            self.as2_finish(n, &lhs);
            return;
        }

        let l = lhs[0];
        let r = rhs[0];

        // x, y, z = f()
        if cr == 1 {
            if self.ty(r).is_none() {
                self.as2_finish(n, &lhs);
                return;
            }
            if matches!(
                self.nodes[r].kind,
                NodeKind::CallFunc { .. } | NodeKind::CallMeth { .. } | NodeKind::CallInter { .. }
            ) {
                let rt = self.ty(r).unwrap();
                if self.types.is_funarg(rt) {
                    let fields: Vec<Field> = self
                        .types
                        .struct_fields(rt)
                        .map(|f| f.to_vec())
                        .unwrap_or_default();
                    if fields.len() != cl {
                        self.as2_mismatch(n, cl, fields.len(), &lhs);
                        return;
                    }
                    for (i, f) in fields.iter().enumerate() {
                        let l = lhs[i];
                        if self.ty(l).is_some() {
                            self.checkassignto(f.ty, l);
                        }
                        if self.nodes[l].defn == Some(n) && self.nodes[l].ntype.is_none() {
                            self.nodes[l].ty = Some(f.ty);
                        }
                    }
                    self.nodes[n].kind = NodeKind::As2Func { lhs: lhs.clone(), rhs };
                    self.as2_finish(n, &lhs);
                    return;
                }
            }
        }

        // x, ok = y
        if cl == 2 && cr == 1 {
            let rt = self.ty(r);
            let refined = match self.nodes[r].kind.clone() {
                NodeKind::IndexMap { .. } => Some(NodeKind::As2MapRead {
                    lhs: lhs.clone(),
                    rhs: rhs.clone(),
                }),
                NodeKind::Recv { .. } => Some(NodeKind::As2Recv {
                    lhs: lhs.clone(),
                    rhs: rhs.clone(),
                }),
                NodeKind::DotType { x, .. } => {
                    // The assertion cannot fail here; mark the non-failing
                    // variant.
                    self.nodes[r].kind = NodeKind::DotType2 { x };
                    Some(NodeKind::As2DotType {
                        lhs: lhs.clone(),
                        rhs: rhs.clone(),
                    })
                }
                _ => None,
            };
            if let (Some(kind), Some(rt)) = (refined, rt) {
                if self.ty(l).is_some() {
                    self.checkassignto(rt, l);
                }
                if self.nodes[l].defn == Some(n) {
                    self.nodes[l].ty = Some(rt);
                }
                let ok_l = lhs[1];
                if let Some(okt) = self.ty(ok_l) {
                    if self.types.etype(okt) != EType::Bool {
                        self.checkassignto(TypeId::BOOL, ok_l);
                    }
                }
                if self.nodes[ok_l].defn == Some(n) && self.nodes[ok_l].ntype.is_none() {
                    self.nodes[ok_l].ty = Some(TypeId::BOOL);
                }
                self.nodes[n].kind = kind;
                self.as2_finish(n, &lhs);
                return;
            }
            if rt.is_none() {
                self.as2_finish(n, &lhs);
                return;
            }
        }

        self.as2_mismatch(n, cl, cr, &lhs);
    }

    fn as2_mismatch(&mut self, n: NodeId, cl: usize, cr: usize, lhs: &[NodeId]) {
        self.error_at(
            n,
            SemanticError::AssignCountMismatch {
                cl,
                cr,
                span: self.span_of(n),
            },
        );
        self.as2_finish(n, lhs);
    }

    /// Second half of the dance for every left side.
    fn as2_finish(&mut self, n: NodeId, lhs: &[NodeId]) {
        self.nodes[n].typecheck = TcState::Done;
        for &l in lhs {
            if self.nodes[l].typecheck == TcState::Unchecked {
                self.typecheck(l, Ctx::RV | Ctx::ASGN);
            }
        }
    }

    fn set_assign2(&mut self, n: NodeId, nl: Vec<NodeId>, nr: Vec<NodeId>) {
        match &mut self.nodes[n].kind {
            NodeKind::Assign2 { lhs, rhs }
            | NodeKind::As2Func { lhs, rhs }
            | NodeKind::As2MapRead { lhs, rhs }
            | NodeKind::As2Recv { lhs, rhs }
            | NodeKind::As2DotType { lhs, rhs } => {
                *lhs = nl;
                *rhs = nr;
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Argument conformance
    // ------------------------------------------------------------------

    /// Match an expression list against a parameter list: the call-site
    /// and return-statement workhorse. `call` carries the callee's
    /// rendering when there is one, for diagnostics.
    pub(crate) fn typecheckaste(
        &mut self,
        call: Option<String>,
        isddd: bool,
        params: &[Field],
        args: Vec<NodeId>,
        desc: &str,
    ) -> Vec<NodeId> {
        let mut args = args;
        let has_ddd = params.last().map(|f| f.ddd).unwrap_or(false);
        let span = args
            .first()
            .map(|&a| self.nodes[a].span)
            .unwrap_or_default();

        if params.iter().any(|f| self.types.broke(f.ty)) {
            return args;
        }

        // A single argument that is a multi-return call expands into the
        // parameter list slot by slot.
        if args.len() == 1 {
            let a = args[0];
            if let Some(at) = self.ty(a) {
                if self.types.is_funarg(at) {
                    let results: Vec<Field> = self
                        .types
                        .struct_fields(at)
                        .map(|f| f.to_vec())
                        .unwrap_or_default();
                    if !has_ddd {
                        if results.len() > params.len() {
                            self.aste_toomany(call, span, desc);
                            return args;
                        }
                        if results.len() < params.len() {
                            self.aste_notenough(call, Some(a), span, desc);
                            return args;
                        }
                    }
                    let mut ri = 0usize;
                    for p in params {
                        if p.ddd {
                            let elem = self.types.elem(p.ty).unwrap_or(p.ty);
                            while ri < results.len() {
                                if self.assignop(results[ri].ty, elem).is_err() {
                                    self.aste_badtype(
                                        call.clone(),
                                        results[ri].ty,
                                        elem,
                                        span,
                                        desc,
                                    );
                                }
                                ri += 1;
                            }
                            return args;
                        }
                        if ri >= results.len() {
                            self.aste_notenough(call, Some(a), span, desc);
                            return args;
                        }
                        if self.assignop(results[ri].ty, p.ty).is_err() {
                            self.aste_badtype(call.clone(), results[ri].ty, p.ty, span, desc);
                        }
                        ri += 1;
                    }
                    if ri < results.len() {
                        self.aste_toomany(call, span, desc);
                    }
                    return args;
                }
            }
        }

        let n1 = params.len();
        let n2 = args.len();
        if !has_ddd {
            if n2 > n1 {
                self.aste_toomany(call, span, desc);
                return args;
            }
            if n2 < n1 {
                self.aste_notenough(call, args.last().copied(), span, desc);
                return args;
            }
        } else if !isddd {
            if n2 < n1 - 1 {
                self.aste_notenough(call, args.last().copied(), span, desc);
                return args;
            }
        } else {
            if n2 > n1 {
                self.aste_toomany(call, span, desc);
                return args;
            }
            if n2 < n1 {
                self.aste_notenough(call, args.last().copied(), span, desc);
                return args;
            }
        }

        let mut ai = 0usize;
        for p in params {
            if p.ddd {
                if isddd {
                    if ai >= args.len() {
                        self.aste_notenough(call, None, span, desc);
                        return args;
                    }
                    if ai + 1 < args.len() {
                        self.aste_toomany(call, span, desc);
                        return args;
                    }
                    if self.ty(args[ai]).is_some() {
                        args[ai] = self.assignconv(args[ai], p.ty, desc);
                    }
                    return args;
                }
                let elem = self.types.elem(p.ty).unwrap_or(p.ty);
                while ai < args.len() {
                    if self.ty(args[ai]).is_some() {
                        args[ai] = self.assignconv(args[ai], elem, desc);
                    }
                    ai += 1;
                }
                return args;
            }

            if ai >= args.len() {
                self.aste_notenough(call, None, span, desc);
                return args;
            }
            if self.ty(args[ai]).is_some() {
                args[ai] = self.assignconv(args[ai], p.ty, desc);
            }
            ai += 1;
        }

        if ai < args.len() {
            self.aste_toomany(call, span, desc);
            return args;
        }
        if isddd {
            match call {
                Some(call) => self.error(
                    span,
                    SemanticError::InvalidDddCall {
                        call,
                        span: span.into(),
                    },
                ),
                None => self.error(
                    span,
                    SemanticError::InvalidDdd {
                        what: desc.to_string(),
                        span: span.into(),
                    },
                ),
            }
        }
        args
    }

    fn aste_notenough(
        &mut self,
        call: Option<String>,
        last: Option<NodeId>,
        span: stoat_frontend::Span,
        desc: &str,
    ) {
        if let Some(last) = last {
            if self.nodes[last].diag {
                return;
            }
            self.nodes[last].diag = true;
        }
        match call {
            Some(call) => self.error(
                span,
                SemanticError::NotEnoughArgsCall {
                    call,
                    span: span.into(),
                },
            ),
            None => self.error(
                span,
                SemanticError::NotEnoughArgs {
                    what: desc.to_string(),
                    span: span.into(),
                },
            ),
        }
    }

    fn aste_toomany(&mut self, call: Option<String>, span: stoat_frontend::Span, desc: &str) {
        match call {
            Some(call) => self.error(
                span,
                SemanticError::TooManyArgsCall {
                    call,
                    span: span.into(),
                },
            ),
            None => self.error(
                span,
                SemanticError::TooManyArgs {
                    what: desc.to_string(),
                    span: span.into(),
                },
            ),
        }
    }

    fn aste_badtype(
        &mut self,
        call: Option<String>,
        from: TypeId,
        to: TypeId,
        span: stoat_frontend::Span,
        desc: &str,
    ) {
        let val = self.type_str(from);
        let ty = self.type_str(to);
        match call {
            Some(call) => self.error(
                span,
                SemanticError::WrongArgType {
                    val,
                    ty,
                    call,
                    why: String::new(),
                    span: span.into(),
                },
            ),
            None => self.error(
                span,
                SemanticError::CannotUseAsType {
                    val,
                    ty,
                    desc: desc.to_string(),
                    why: String::new(),
                    span: span.into(),
                },
            ),
        }
    }
}
