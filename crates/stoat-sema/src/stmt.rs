// stmt.rs
//
// Statement rules and the termination post-pass that backs the
// missing-return diagnostic.

use rustc_hash::FxHashMap;
use stoat_frontend::{NodeId, NodeKind, SymId, TcState};

use crate::check::{Checker, Ctx};
use crate::errors::SemanticError;
use crate::type_arena::Field;

impl<'a> Checker<'a> {
    pub(crate) fn tc_for(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::For {
            init,
            cond,
            post,
            body,
        } = self.nodes[n].kind.clone()
        else {
            unreachable!()
        };
        let init = self.typecheck_list(init, Ctx::TOP);
        self.decl_depth += 1;
        let cond = self.typecheck_opt(cond, Ctx::RV);
        if let Some(cond) = cond {
            self.cond_must_be_bool(cond, "for");
        }
        let post = self.typecheck_opt(post, Ctx::TOP);
        let body = self.typecheck_list(body, Ctx::TOP);
        self.decl_depth -= 1;
        self.nodes[n].kind = NodeKind::For {
            init,
            cond,
            post,
            body,
        };
        Ok(Ctx::TOP)
    }

    pub(crate) fn tc_if(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::If {
            init,
            cond,
            then,
            els,
        } = self.nodes[n].kind.clone()
        else {
            unreachable!()
        };
        let init = self.typecheck_list(init, Ctx::TOP);
        let cond = self.typecheck_opt(cond, Ctx::RV);
        if let Some(cond) = cond {
            self.cond_must_be_bool(cond, "if");
        }
        let then = self.typecheck_list(then, Ctx::TOP);
        let els = self.typecheck_list(els, Ctx::TOP);
        self.nodes[n].kind = NodeKind::If {
            init,
            cond,
            then,
            els,
        };
        Ok(Ctx::TOP)
    }

    fn cond_must_be_bool(&mut self, cond: NodeId, what: &str) {
        if let Some(t) = self.ty(cond) {
            if !self.types.etype(t).is_bool() {
                let expr = self.node_str_long(cond);
                self.error_at(
                    cond,
                    SemanticError::NonBoolCondition {
                        expr,
                        what: what.to_string(),
                        span: self.span_of(cond),
                    },
                );
            }
        }
    }

    pub(crate) fn tc_return(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Return { results } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let results = if results.len() == 1 {
            vec![self.typecheck(results[0], Ctx::RV | Ctx::FNSTRUCT)]
        } else {
            self.typecheck_list(results, Ctx::RV)
        };
        self.nodes[n].kind = NodeKind::Return {
            results: results.clone(),
        };

        let Some(f) = self.cur_fn else {
            self.error_at(
                n,
                SemanticError::ReturnOutsideFunction {
                    span: self.span_of(n),
                },
            );
            return Err(());
        };
        let Some(ft) = self.nodes[f].ty else {
            return Ok(Ctx::TOP);
        };

        if self.types.func_outnamed(ft) && results.is_empty() {
            return Ok(Ctx::TOP);
        }

        let out: Vec<Field> = match self.types.func_parts(ft) {
            Some((_, _, results)) => results.to_vec(),
            None => return Ok(Ctx::TOP),
        };
        let new = self.typecheckaste(None, false, &out, results, "return argument");
        self.nodes[n].kind = NodeKind::Return { results: new };
        Ok(Ctx::TOP)
    }

    pub(crate) fn tc_switch(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Switch { init, tag, cases } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let init = self.typecheck_list(init, Ctx::TOP);
        let tag = match tag {
            Some(t) if matches!(self.nodes[t].kind, NodeKind::TypeSwGuard { .. }) => {
                let NodeKind::TypeSwGuard { name, x } = self.nodes[t].kind.clone() else {
                    unreachable!()
                };
                let x = self.typecheck(x, Ctx::RV);
                self.nodes[t].kind = NodeKind::TypeSwGuard { name, x };
                self.nodes[t].typecheck = TcState::Done;
                Some(t)
            }
            Some(t) => Some(self.typecheck(t, Ctx::RV)),
            None => None,
        };
        let cases = self.typecheck_list(cases, Ctx::TOP);
        self.nodes[n].kind = NodeKind::Switch { init, tag, cases };
        Ok(Ctx::TOP)
    }

    pub(crate) fn tc_select(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Select { cases } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        let cases = self.typecheck_list(cases, Ctx::TOP);
        self.nodes[n].kind = NodeKind::Select { cases };
        Ok(Ctx::TOP)
    }

    pub(crate) fn tc_case(&mut self, n: NodeId) -> Result<Ctx, ()> {
        let NodeKind::Case { vals, body } = self.nodes[n].kind.clone() else {
            unreachable!()
        };
        // Case values may be expressions or, in a type switch, types; the
        // per-form semantic checks live with the switch checker.
        let vals = self.typecheck_list(vals, Ctx::RV | Ctx::TYPE);
        let body = self.typecheck_list(body, Ctx::TOP);
        self.nodes[n].kind = NodeKind::Case { vals, body };
        Ok(Ctx::TOP)
    }

    /// `defer` and `go` take a real call, and not one whose result would
    /// be silently discarded.
    pub(crate) fn check_defer_go(&mut self, n: NodeId, call: NodeId, what: &str) {
        use NodeKind::*;
        match self.nodes[call].kind {
            CallInter { .. } | CallMeth { .. } | CallFunc { .. } | Close { .. } | Copy { .. }
            | Delete { .. } | Panic { .. } | Print { .. } | Println { .. } | Recover => return,
            Append { .. } | Cap { .. } | Complex { .. } | Imag { .. } | Len { .. }
            | Make { .. } | MakeSlice { .. } | MakeChan { .. } | MakeMap { .. } | New { .. }
            | Real { .. } | Lit => {
                // A folded conversion keeps its original; that case falls
                // through to the conversion diagnostic below.
                let was_conv = self.nodes[call]
                    .orig
                    .map(|o| matches!(self.nodes[o].kind, Conv { .. }))
                    .unwrap_or(false);
                if !was_conv {
                    let expr = self.node_str(call);
                    self.error_at(
                        n,
                        SemanticError::DeferDiscardsResult {
                            what: what.to_string(),
                            expr,
                            span: self.span_of(n),
                        },
                    );
                    return;
                }
            }
            _ => {}
        }

        // The type is broken or missing, most likely a call on a broken
        // type; it was reported elsewhere.
        match self.ty(call) {
            None => return,
            Some(t) if self.types.broke(t) => return,
            _ => {}
        }

        if !self.nodes[n].diag {
            self.nodes[n].diag = true;
            self.error_at(
                n,
                SemanticError::DeferNotCall {
                    what: what.to_string(),
                    span: self.span_of(n),
                },
            );
        }
    }

    // ------------------------------------------------------------------
    // Function declarations
    // ------------------------------------------------------------------

    pub(crate) fn tc_funcdecl(&mut self, n: NodeId) {
        let NodeKind::FuncDecl {
            name,
            shortname,
            dcl,
            body,
        } = self.nodes[n].kind.clone()
        else {
            unreachable!()
        };
        let name = self.typecheck(name, Ctx::RV | Ctx::ASGN);
        self.nodes[n].kind = NodeKind::FuncDecl {
            name,
            shortname,
            dcl: dcl.clone(),
            body,
        };
        let Some(t) = self.ty(name) else { return };
        self.nodes[n].ty = Some(t);

        // Register a method on its receiver's named type.
        let recv = self
            .types
            .func_parts(t)
            .and_then(|(r, _, _)| r.clone());
        if let (Some(recv), Some(short)) = (recv, shortname) {
            if !self.syms.is_blank(short) {
                if let Some(carrier) = self.methtype(recv.ty) {
                    self.types.add_method(carrier, Field::new(Some(short), t));
                }
            }
        }

        for d in dcl {
            if matches!(self.nodes[d].kind, NodeKind::Name)
                && matches!(
                    self.nodes[d].class,
                    stoat_frontend::Class::Param | stoat_frontend::Class::ParamOut
                )
            {
                self.nodes[d].decldepth = 1;
            }
        }
    }

    /// Check a function body in statement context, then verify control
    /// cannot fall off the end of a function with results.
    pub fn check_func_body(&mut self, n: NodeId) {
        let NodeKind::FuncDecl { body, .. } = self.nodes[n].kind.clone() else {
            return;
        };
        let saved = self.cur_fn;
        self.cur_fn = Some(n);
        let body = self.typecheck_list(body, Ctx::TOP);
        if let NodeKind::FuncDecl { body: slot, .. } = &mut self.nodes[n].kind {
            *slot = body;
        }
        self.checkreturn(n);
        self.cur_fn = saved;
    }

    // ------------------------------------------------------------------
    // Termination analysis
    // ------------------------------------------------------------------

    pub(crate) fn checkreturn(&mut self, n: NodeId) {
        let NodeKind::FuncDecl { body, .. } = self.nodes[n].kind.clone() else {
            return;
        };
        let Some(ft) = self.nodes[n].ty else { return };
        let has_results = self
            .types
            .func_parts(ft)
            .map(|(_, _, r)| !r.is_empty())
            .unwrap_or(false);
        if !has_results {
            return;
        }
        let mut labels = FxHashMap::default();
        self.markbreaklist(&mut labels, &body, None);
        if !self.isterminating(&body) {
            let span = body
                .last()
                .map(|&s| self.nodes[s].span)
                .unwrap_or(self.nodes[n].span);
            self.error(
                span,
                SemanticError::MissingReturn { span: span.into() },
            );
        }
    }

    /// Attribute every reachable break to the loop or switch it exits.
    fn markbreak(
        &mut self,
        labels: &FxHashMap<SymId, NodeId>,
        n: NodeId,
        implicit: Option<NodeId>,
    ) {
        match self.nodes[n].kind.clone() {
            NodeKind::Break { label } => match label {
                None => {
                    if let Some(im) = implicit {
                        self.nodes[im].hasbreak = true;
                    }
                }
                Some(label) => {
                    if let Some(&target) = labels.get(&label) {
                        self.nodes[target].hasbreak = true;
                    }
                }
            },
            NodeKind::For { .. } | NodeKind::Switch { .. } | NodeKind::Select { .. } => {
                let mut children = Vec::new();
                self.nodes.children(n, &mut |c| children.push(c));
                for c in children {
                    self.markbreak(labels, c, Some(n));
                }
            }
            _ => {
                let mut children = Vec::new();
                self.nodes.children(n, &mut |c| children.push(c));
                for c in children {
                    self.markbreak(labels, c, implicit);
                }
            }
        }
    }

    fn markbreaklist(
        &mut self,
        labels: &mut FxHashMap<SymId, NodeId>,
        list: &[NodeId],
        implicit: Option<NodeId>,
    ) {
        let mut i = 0;
        while i < list.len() {
            let n = list[i];
            if let NodeKind::Label { name } = self.nodes[n].kind {
                if i + 1 < list.len() && self.nodes[n].defn == Some(list[i + 1]) {
                    let target = list[i + 1];
                    if matches!(
                        self.nodes[target].kind,
                        NodeKind::For { .. } | NodeKind::Switch { .. } | NodeKind::Select { .. }
                    ) {
                        labels.insert(name, target);
                        self.markbreak(labels, target, Some(target));
                        labels.remove(&name);
                        i += 2;
                        continue;
                    }
                }
            }
            self.markbreak(labels, n, implicit);
            i += 1;
        }
    }

    /// Does this statement list end in a terminating statement?
    pub(crate) fn isterminating(&self, list: &[NodeId]) -> bool {
        let Some(&n) = list.last() else { return false };
        match &self.nodes[n].kind {
            NodeKind::Block { list } => self.isterminating(list),
            NodeKind::Goto { .. }
            | NodeKind::Return { .. }
            | NodeKind::RetJmp
            | NodeKind::Panic { .. }
            | NodeKind::Fall => true,
            NodeKind::For { cond, .. } => cond.is_none() && !self.nodes[n].hasbreak,
            NodeKind::If { then, els, .. } => {
                self.isterminating(then) && self.isterminating(els)
            }
            NodeKind::Switch { cases, .. } => {
                if self.nodes[n].hasbreak {
                    return false;
                }
                let mut has_default = false;
                for &c in cases {
                    let NodeKind::Case { vals, body } = &self.nodes[c].kind else {
                        return false;
                    };
                    if !self.isterminating(body) {
                        return false;
                    }
                    if vals.is_empty() {
                        has_default = true;
                    }
                }
                has_default
            }
            NodeKind::Select { cases } => {
                if self.nodes[n].hasbreak {
                    return false;
                }
                for &c in cases {
                    let NodeKind::Case { body, .. } = &self.nodes[c].kind else {
                        return false;
                    };
                    if !self.isterminating(body) {
                        return false;
                    }
                }
                true
            }
            _ => false,
        }
    }
}
