// check.rs
//
// The checker trunk: context bits, the typecheck entry point with its
// in-progress discipline and cycle diagnostics, and the post-rule context
// enforcement every operator rule funnels through.

use stoat_frontend::{
    node_str, NodeArena, NodeId, NodeKind, Span, SymTable, TcState, TypeId,
};
use tracing::trace;

use crate::errors::SemanticError;
use crate::type_arena::TypeArena;

/// Roles a node is being asked to play (`top`) or can legitimately play
/// (`ok`). A small bitset; the combinations enforced after each rule are
/// replicated from the original checker verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ctx(u16);

impl Ctx {
    pub const NONE: Ctx = Ctx(0);
    /// Statement position.
    pub const TOP: Ctx = Ctx(1 << 0);
    /// Value context.
    pub const RV: Ctx = Ctx(1 << 1);
    /// Type context.
    pub const TYPE: Ctx = Ctx(1 << 2);
    /// Callee position.
    pub const CALL: Ctx = Ctx(1 << 3);
    /// Multi-value (function-argument tuple) allowed here.
    pub const FNSTRUCT: Ctx = Ctx(1 << 4);
    /// Within an iota-bound constant initializer.
    pub const IOTA: Ctx = Ctx(1 << 5);
    /// Assignment target.
    pub const ASGN: Ctx = Ctx(1 << 6);
    /// Indirection context (the *x in &*x is not an indirect).
    pub const INDIR: Ctx = Ctx(1 << 7);
    /// Operand of unary `&`.
    pub const ADDR: Ctx = Ctx(1 << 8);
    /// `go` statement callee.
    pub const PROC: Ctx = Ctx(1 << 9);
    /// Composite-literal type position (where `[...]` is legal).
    pub const COMPLIT: Ctx = Ctx(1 << 10);

    #[inline]
    pub fn has(self, other: Ctx) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is(self, other: Ctx) -> bool {
        self.0 == other.0
    }
}

impl std::ops::BitOr for Ctx {
    type Output = Ctx;
    fn bitor(self, rhs: Ctx) -> Ctx {
        Ctx(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Ctx {
    fn bitor_assign(&mut self, rhs: Ctx) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for Ctx {
    type Output = Ctx;
    fn bitand(self, rhs: Ctx) -> Ctx {
        Ctx(self.0 & rhs.0)
    }
}

/// A diagnostic bound to the span it was reported at.
#[derive(Debug, Clone)]
pub struct TypeError {
    pub error: SemanticError,
    pub span: Span,
}

impl TypeError {
    pub fn new(error: SemanticError, span: Span) -> Self {
        Self { error, span }
    }
}

pub struct Checker<'a> {
    pub nodes: &'a mut NodeArena,
    pub syms: &'a mut SymTable,
    pub types: TypeArena,
    pub errors: Vec<TypeError>,
    /// Nodes currently being checked, for cycle diagnostics.
    pub(crate) tc_stack: Vec<NodeId>,
    /// Definitions currently being resolved.
    pub(crate) def_stack: Vec<NodeId>,
    /// Interface methods whose signature referenced an in-progress type.
    pub(crate) method_queue: Vec<NodeId>,
    /// Map types whose key type was still forward when minted.
    pub(crate) map_queue: Vec<(TypeId, Span)>,
    /// Type-definition nesting depth; the deferred queues drain when it
    /// returns to one.
    pub(crate) def_depth: u32,
    /// Lexical loop/label nesting within the current function.
    pub(crate) decl_depth: u32,
    /// Enclosing function declaration, for `return` checking.
    pub(crate) cur_fn: Option<NodeId>,
    /// Cached empty interface type.
    pub(crate) tinter: Option<TypeId>,
}

impl<'a> Checker<'a> {
    pub fn new(nodes: &'a mut NodeArena, syms: &'a mut SymTable) -> Self {
        crate::universe::declare(nodes, syms);
        Checker {
            nodes,
            syms,
            types: TypeArena::new(),
            errors: Vec::new(),
            tc_stack: Vec::new(),
            def_stack: Vec::new(),
            method_queue: Vec::new(),
            map_queue: Vec::new(),
            def_depth: 0,
            decl_depth: 0,
            cur_fn: None,
            tinter: None,
        }
    }

    // ------------------------------------------------------------------
    // Reporting helpers
    // ------------------------------------------------------------------

    pub(crate) fn error(&mut self, span: Span, error: SemanticError) {
        self.errors.push(TypeError::new(error, span));
    }

    pub(crate) fn error_at(&mut self, n: NodeId, error: SemanticError) {
        let span = self.nodes[n].span;
        self.error(span, error);
    }

    pub(crate) fn node_str(&self, n: NodeId) -> String {
        node_str(self.nodes, self.syms, n)
    }

    /// Expression rendered with its type, for "cannot use x (type T)"
    /// messages.
    pub(crate) fn node_str_long(&self, n: NodeId) -> String {
        match self.nodes[n].ty {
            Some(t) if t != TypeId::NIL => {
                format!("{} (type {})", self.node_str(n), self.type_str(t))
            }
            _ => self.node_str(n),
        }
    }

    pub(crate) fn type_str(&self, t: TypeId) -> String {
        self.types.type_str(self.syms, t)
    }

    pub(crate) fn ty(&self, n: NodeId) -> Option<TypeId> {
        self.nodes[n].ty
    }

    pub(crate) fn span_of(&self, n: NodeId) -> miette::SourceSpan {
        self.nodes[n].span.into()
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Check a list of top-level declarations, then the bodies of the
    /// function declarations among them.
    pub fn check_program(&mut self, decls: &[NodeId]) {
        for &d in decls {
            self.typecheck(d, Ctx::TOP);
        }
        for &d in decls {
            if matches!(self.nodes[d].kind, NodeKind::FuncDecl { .. }) {
                self.check_func_body(d);
            }
        }
    }

    /// Type check node `n` in context `top`. Returns the node the caller
    /// should store in place of `n`: name resolution may substitute the
    /// definition node, so parents must write the result back.
    pub fn typecheck(&mut self, mut n: NodeId, top: Ctx) -> NodeId {
        // Skip over parens.
        while let NodeKind::Paren { x } = self.nodes[n].kind {
            n = x;
        }

        // Resolve definition of name and value of iota lazily.
        n = self.resolve(n);

        // Skip if already done, but re-check ONAME/OTYPE/OLITERAL/OPACK
        // nodes in case the context has changed.
        if self.nodes[n].typecheck == TcState::Done {
            match self.nodes[n].kind {
                NodeKind::Name
                | NodeKind::RawName
                | NodeKind::TypeExpr
                | NodeKind::Lit
                | NodeKind::Pack => {}
                _ => return n,
            }
        }

        if self.nodes[n].typecheck == TcState::InProgress {
            self.cycle_diag(n, top);
            return n;
        }

        self.nodes[n].typecheck = TcState::InProgress;
        self.tc_stack.push(n);

        self.typecheck1(n, top);

        self.nodes[n].typecheck = TcState::Done;
        match self.tc_stack.pop() {
            Some(popped) if popped == n => {}
            _ => panic!("typecheck stack out of sync"),
        }

        if let Some(t) = self.nodes[n].ty {
            trace!(
                line = self.nodes[n].span.line,
                ty = %self.type_str(t),
                "type assigned"
            );
        }
        n
    }

    pub fn typecheck_opt(&mut self, n: Option<NodeId>, top: Ctx) -> Option<NodeId> {
        n.map(|n| self.typecheck(n, top))
    }

    pub fn typecheck_list(&mut self, mut list: Vec<NodeId>, top: Ctx) -> Vec<NodeId> {
        for slot in list.iter_mut() {
            *slot = self.typecheck(*slot, top);
        }
        list
    }

    // ------------------------------------------------------------------
    // Cycle diagnostics
    // ------------------------------------------------------------------

    /// A node still in progress was reached again. Try to print a
    /// meaningful message, otherwise the full typechecking stack.
    fn cycle_diag(&mut self, n: NodeId, top: Ctx) {
        match self.nodes[n].kind {
            // We can already diagnose variables used as types.
            NodeKind::Name => {
                if (top & (Ctx::RV | Ctx::TYPE)).is(Ctx::TYPE) {
                    let expr = self.node_str(n);
                    self.error_at(
                        n,
                        SemanticError::NotAType {
                            expr,
                            span: self.span_of(n),
                        },
                    );
                }
            }
            NodeKind::Lit => {
                if (top & (Ctx::RV | Ctx::TYPE)).is(Ctx::TYPE) {
                    let expr = self.node_str(n);
                    self.error_at(
                        n,
                        SemanticError::NotAType {
                            expr,
                            span: self.span_of(n),
                        },
                    );
                    return;
                }
                let mut chain = String::new();
                self.depchain(&mut chain, self.tc_stack.len(), n, n);
                self.error_at(
                    n,
                    SemanticError::ConstDefinitionLoop {
                        chain,
                        span: self.span_of(n),
                    },
                );
                self.nodes[n].diag = true;
            }
            _ => {}
        }

        if self.errors.is_empty() {
            let mut chain = String::new();
            for &l in self.tc_stack.iter().rev() {
                chain.push_str(&format!(
                    "\n\t{}: {}",
                    self.nodes[l].span.line,
                    self.node_str(l)
                ));
            }
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::TypecheckingLoop {
                    expr,
                    chain,
                    span: self.span_of(n),
                },
            );
        }
    }

    /// Print the dependency chain of in-progress constant definitions,
    /// from the start of the cycle back to `cur`.
    fn depchain(&self, out: &mut String, stack_top: usize, cur: NodeId, first: NodeId) {
        for i in (0..stack_top).rev() {
            let l = self.tc_stack[i];
            if self.nodes[l].is_lit() == self.nodes[cur].is_lit() && self.nodes[l].is_lit() {
                if l != first {
                    self.depchain(out, i, l, first);
                }
                out.push_str(&format!(
                    "\n\t{}: {} uses {}",
                    self.nodes[l].span.line,
                    self.node_str(l),
                    self.node_str(cur)
                ));
                return;
            }
        }
    }

    // ------------------------------------------------------------------
    // Per-node checking
    // ------------------------------------------------------------------

    fn typecheck1(&mut self, n: NodeId, top: Ctx) {
        if self.nodes[n].sym.is_some() {
            if matches!(self.nodes[n].kind, NodeKind::Name)
                && self.nodes[n].builtin.is_some()
                && !top.has(Ctx::CALL)
            {
                let name = self.node_str(n);
                self.error_at(
                    n,
                    SemanticError::BuiltinNotCalled {
                        name,
                        span: self.span_of(n),
                    },
                );
                self.nodes[n].ty = None;
                return;
            }

            self.typecheckdef(n);
            if matches!(self.nodes[n].kind, NodeKind::RawName) {
                // typecheckdef already reported it as undefined.
                self.nodes[n].ty = None;
                return;
            }
        }

        match self.dispatch(n, top) {
            Ok(ok) => {
                if !self.finish(n, top, ok) {
                    self.nodes[n].ty = None;
                }
            }
            Err(()) => {
                self.nodes[n].ty = None;
            }
        }
    }

    /// One rule per operator. Returns the roles this node can play, or Err
    /// after a reported error.
    fn dispatch(&mut self, n: NodeId, top: Ctx) -> Result<Ctx, ()> {
        use NodeKind::*;
        match self.nodes[n].kind.clone() {
            // Names and literals
            Lit => self.tc_lit(n),
            RawName => Ok(Ctx::RV),
            Name => self.tc_name(n, top),
            Pack => {
                let name = self
                    .nodes[n]
                    .sym
                    .map(|s| self.syms.name(s).to_string())
                    .unwrap_or_default();
                self.error_at(
                    n,
                    SemanticError::PackageWithoutSelector {
                        name,
                        span: self.span_of(n),
                    },
                );
                Err(())
            }
            Ddd => Ok(Ctx::NONE),
            Iota => panic!("typecheck iota"),
            ClosureVar => Ok(Ctx::RV),

            // Types
            TypeExpr => {
                if self.nodes[n].ty.is_none() {
                    return Err(());
                }
                Ok(Ctx::TYPE)
            }
            TSlice { .. } | TArray { .. } | TArrayDdd { .. } => self.tc_tarray(n, top),
            TMap { .. } => self.tc_tmap(n),
            TChan { .. } => self.tc_tchan(n),
            TStruct { .. } => self.tc_tstruct(n),
            TInter { .. } => self.tc_tinter(n),
            TFunc { .. } => self.tc_tfunc(n),
            Field { .. } => panic!("typecheck field decl"),

            // Type or expr
            Deref { .. } => self.tc_deref(n, top),

            // Arithmetic
            Unary { .. } => self.tc_unary(n, top),
            Binary { .. } | AsOp { .. } => self.tc_arith(n, top),

            // Expressions
            Addr { .. } => self.tc_addr(n),
            CompLit { .. } => self.tc_complit(n),
            Dot { .. } | DotPtr { .. } => self.tc_dot(n, top),
            DotInter { .. } | DotMeth { .. } => Ok(Ctx::RV),
            DotType { .. } => self.tc_dottype(n),
            DotType2 { .. } => Ok(Ctx::RV),
            Index { .. } | IndexMap { .. } => self.tc_index(n),
            Slice { .. } | SliceStr { .. } | SliceArr { .. } => self.tc_slice(n, top),
            Slice3 { .. } | Slice3Arr { .. } => self.tc_slice3(n, top),
            Recv { .. } => self.tc_recv(n),
            Send { .. } => self.tc_send(n),

            // Calls and built-ins
            Call { .. } | CallFunc { .. } | CallMeth { .. } | CallInter { .. } => {
                self.tc_call(n, top)
            }
            Len { .. } | Cap { .. } | Real { .. } | Imag { .. } => self.tc_len_cap_real_imag(n),
            Complex { .. } => self.tc_complex(n, top),
            Close { .. } => self.tc_close(n),
            Delete { .. } => self.tc_delete(n),
            Append { .. } => self.tc_append(n),
            Copy { .. } => self.tc_copy(n),
            Make { .. } => self.tc_make(n),
            MakeSlice { .. } | MakeMap { .. } | MakeChan { .. } => Ok(Ctx::RV),
            New { .. } => self.tc_new(n),
            Print { .. } | Println { .. } => self.tc_print(n),
            Panic { .. } => self.tc_panic(n),
            Recover => self.tc_recover(n),
            Conv { .. } => self.tc_conv(n, top),
            ConvNop { x } => {
                self.typecheck(x, Ctx::RV);
                Ok(Ctx::RV)
            }
            ConvIface { .. } | StrToBytes { .. } | StrToRunes { .. } | BytesToStr { .. }
            | RunesToStr { .. } | RuneToStr { .. } => Ok(Ctx::RV),

            // Refined literals only reappear on idempotent re-checks.
            ArrayLit { .. } | MapLit { .. } | StructLit { .. } | PtrLit { .. } => Ok(Ctx::RV),
            AddStr { .. } | CmpStr { .. } | CmpIface { .. } => Ok(Ctx::RV),
            Key { .. } => panic!("typecheck key outside composite literal"),

            // Statements
            Assign { .. } => {
                self.tc_as(n);
                Ok(Ctx::TOP)
            }
            Assign2 { .. } => {
                self.tc_as2(n);
                Ok(Ctx::TOP)
            }
            As2Func { .. } | As2MapRead { .. } | As2Recv { .. } | As2DotType { .. } => {
                Ok(Ctx::TOP)
            }
            Block { list } => {
                let list = self.typecheck_list(list, Ctx::TOP);
                self.set_block_list(n, list);
                Ok(Ctx::TOP)
            }
            Empty | Dcl { .. } | Break { .. } | Continue { .. } | Goto { .. } | Fall | RetJmp => {
                Ok(Ctx::TOP)
            }
            Label { .. } => {
                self.decl_depth += 1;
                Ok(Ctx::TOP)
            }
            Defer { call } => {
                let call = self.typecheck(call, Ctx::TOP | Ctx::RV);
                self.set_defer_go_call(n, call);
                if !self.nodes[call].diag {
                    self.check_defer_go(n, call, "defer");
                }
                Ok(Ctx::TOP)
            }
            Go { call } => {
                let call = self.typecheck(call, Ctx::TOP | Ctx::PROC | Ctx::RV);
                self.set_defer_go_call(n, call);
                self.check_defer_go(n, call, "go");
                Ok(Ctx::TOP)
            }
            For { .. } => self.tc_for(n),
            If { .. } => self.tc_if(n),
            Return { .. } => self.tc_return(n),
            Switch { .. } => self.tc_switch(n),
            Select { .. } => self.tc_select(n),
            TypeSwGuard { .. } => {
                self.error_at(
                    n,
                    SemanticError::TypeSwitchOutsideSwitch {
                        span: self.span_of(n),
                    },
                );
                Err(())
            }
            Case { .. } => self.tc_case(n),
            ConstDecl { name } => {
                let name = self.typecheck(name, Ctx::RV);
                self.set_decl_name(n, name);
                Ok(Ctx::TOP)
            }
            TypeDecl { name } => {
                let name = self.typecheck(name, Ctx::TYPE);
                self.set_decl_name(n, name);
                Ok(Ctx::TOP)
            }
            FuncDecl { .. } => {
                self.tc_funcdecl(n);
                Ok(Ctx::TOP)
            }
            Paren { .. } => unreachable!("parens are unwrapped before dispatch"),
        }
    }

    /// The shared tail of every rule: fold constants, then enforce that
    /// the node can play the role the context asked for. The role-bit
    /// predicates are replicated from the original checker.
    fn finish(&mut self, n: NodeId, top: Ctx, ok: Ctx) -> bool {
        self.evconst(n);

        if matches!(self.nodes[n].kind, NodeKind::TypeExpr) && !top.has(Ctx::TYPE) {
            let ty = self.nodes[n].ty.map(|t| self.type_str(t)).unwrap_or_default();
            self.error_at(
                n,
                SemanticError::TypeNotExpr {
                    ty,
                    span: self.span_of(n),
                },
            );
            return false;
        }

        if (top & (Ctx::RV | Ctx::TYPE)).is(Ctx::TYPE)
            && !matches!(self.nodes[n].kind, NodeKind::TypeExpr)
        {
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::NotAType {
                    expr,
                    span: self.span_of(n),
                },
            );
            return false;
        }

        if top.has(Ctx::CALL | Ctx::RV | Ctx::TYPE)
            && !top.has(Ctx::TOP)
            && !ok.has(Ctx::RV | Ctx::TYPE | Ctx::CALL)
        {
            let expr = self.node_str(n);
            self.error_at(
                n,
                SemanticError::UsedAsValue {
                    expr,
                    span: self.span_of(n),
                },
            );
            return false;
        }

        if top.has(Ctx::TOP) && !top.has(Ctx::CALL | Ctx::RV | Ctx::TYPE) && !ok.has(Ctx::TOP) {
            if !self.nodes[n].diag {
                let expr = self.node_str(n);
                self.error_at(
                    n,
                    SemanticError::NotUsed {
                        expr,
                        span: self.span_of(n),
                    },
                );
                self.nodes[n].diag = true;
            }
            return false;
        }

        true
    }

    // ------------------------------------------------------------------
    // Child write-back helpers
    // ------------------------------------------------------------------

    fn set_block_list(&mut self, n: NodeId, new: Vec<NodeId>) {
        if let NodeKind::Block { list } = &mut self.nodes[n].kind {
            *list = new;
        }
    }

    fn set_defer_go_call(&mut self, n: NodeId, new: NodeId) {
        match &mut self.nodes[n].kind {
            NodeKind::Defer { call } | NodeKind::Go { call } => *call = new,
            _ => unreachable!(),
        }
    }

    fn set_decl_name(&mut self, n: NodeId, new: NodeId) {
        match &mut self.nodes[n].kind {
            NodeKind::ConstDecl { name } | NodeKind::TypeDecl { name } => *name = new,
            _ => unreachable!(),
        }
    }
}
