// build.rs
//
// Construction helpers for the node arena: the surface the parser (and
// the test suite) builds programs through. Literal constructors assign
// the ideal constant types the way the scanner would.

use crate::ast::{BinOp, Class, Const, NodeArena, NodeId, NodeKind, UnOp};
use crate::ids::TypeId;
use crate::span::Span;
use crate::sym::{SymId, SymTable};

impl NodeArena {
    pub fn lit_int(&mut self, v: i128, span: Span) -> NodeId {
        let n = self.alloc(NodeKind::Lit, span);
        self[n].val = Some(Const::Int(v));
        self[n].ty = Some(TypeId::IDEAL_INT);
        n
    }

    pub fn lit_rune(&mut self, v: char, span: Span) -> NodeId {
        let n = self.alloc(NodeKind::Lit, span);
        self[n].val = Some(Const::Rune(v as i128));
        self[n].ty = Some(TypeId::IDEAL_RUNE);
        n
    }

    pub fn lit_float(&mut self, v: f64, span: Span) -> NodeId {
        let n = self.alloc(NodeKind::Lit, span);
        self[n].val = Some(Const::Float(v));
        self[n].ty = Some(TypeId::IDEAL_FLOAT);
        n
    }

    pub fn lit_complex(&mut self, re: f64, im: f64, span: Span) -> NodeId {
        let n = self.alloc(NodeKind::Lit, span);
        self[n].val = Some(Const::Complex(re, im));
        self[n].ty = Some(TypeId::IDEAL_COMPLEX);
        n
    }

    pub fn lit_str(&mut self, s: &str, span: Span) -> NodeId {
        let n = self.alloc(NodeKind::Lit, span);
        self[n].val = Some(Const::Str(s.to_string()));
        // The string literal type is assigned lazily by the checker.
        n
    }

    pub fn lit_bool(&mut self, b: bool, span: Span) -> NodeId {
        let n = self.alloc(NodeKind::Lit, span);
        self[n].val = Some(Const::Bool(b));
        self[n].ty = Some(TypeId::IDEAL_BOOL);
        n
    }

    pub fn lit_nil(&mut self, span: Span) -> NodeId {
        let n = self.alloc(NodeKind::Lit, span);
        self[n].val = Some(Const::Nil);
        self[n].ty = Some(TypeId::NIL);
        n
    }

    /// An unresolved reference to `sym`.
    pub fn raw_name(&mut self, sym: SymId, span: Span) -> NodeId {
        let n = self.alloc(NodeKind::RawName, span);
        self[n].sym = Some(sym);
        n
    }

    /// A reference to a name by its spelling in the local package.
    pub fn nref(&mut self, syms: &mut SymTable, name: &str, span: Span) -> NodeId {
        let sym = syms.local(name);
        self.raw_name(sym, span)
    }

    pub fn unary(&mut self, op: UnOp, x: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::Unary { op, x }, span)
    }

    pub fn binary(&mut self, op: BinOp, x: NodeId, y: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::Binary { op, x, y }, span)
    }

    pub fn index(&mut self, x: NodeId, i: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::Index { x, i }, span)
    }

    pub fn dot(&mut self, x: NodeId, sel: SymId, span: Span) -> NodeId {
        self.alloc(NodeKind::Dot { x, sel }, span)
    }

    pub fn addr(&mut self, x: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::Addr { x }, span)
    }

    pub fn deref(&mut self, x: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::Deref { x }, span)
    }

    pub fn call(&mut self, func: NodeId, args: Vec<NodeId>, span: Span) -> NodeId {
        self.alloc(
            NodeKind::Call {
                func,
                args,
                ddd: false,
            },
            span,
        )
    }

    pub fn call_ddd(&mut self, func: NodeId, args: Vec<NodeId>, span: Span) -> NodeId {
        self.alloc(
            NodeKind::Call {
                func,
                args,
                ddd: true,
            },
            span,
        )
    }

    pub fn key(&mut self, k: NodeId, v: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::Key { k, v }, span)
    }

    pub fn complit(&mut self, ty_expr: Option<NodeId>, elems: Vec<NodeId>, span: Span) -> NodeId {
        self.alloc(NodeKind::CompLit { ty_expr, elems }, span)
    }

    pub fn assign(&mut self, l: NodeId, r: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::Assign { l, r }, span)
    }

    pub fn assign2(&mut self, lhs: Vec<NodeId>, rhs: Vec<NodeId>, span: Span) -> NodeId {
        self.alloc(NodeKind::Assign2 { lhs, rhs }, span)
    }

    pub fn ret(&mut self, results: Vec<NodeId>, span: Span) -> NodeId {
        self.alloc(NodeKind::Return { results }, span)
    }

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------

    pub fn tslice(&mut self, elem: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::TSlice { elem }, span)
    }

    pub fn tarray(&mut self, len: NodeId, elem: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::TArray { len, elem }, span)
    }

    pub fn tmap(&mut self, key: NodeId, val: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::TMap { key, val }, span)
    }

    pub fn tchan(&mut self, dir: crate::ast::ChanDir, elem: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::TChan { dir, elem }, span)
    }

    pub fn tstruct(&mut self, fields: Vec<NodeId>, span: Span) -> NodeId {
        self.alloc(NodeKind::TStruct { fields }, span)
    }

    pub fn tinter(&mut self, methods: Vec<NodeId>, span: Span) -> NodeId {
        self.alloc(NodeKind::TInter { methods }, span)
    }

    pub fn tfunc(
        &mut self,
        recv: Option<NodeId>,
        params: Vec<NodeId>,
        results: Vec<NodeId>,
        span: Span,
    ) -> NodeId {
        self.alloc(
            NodeKind::TFunc {
                recv,
                params,
                results,
            },
            span,
        )
    }

    pub fn field(&mut self, name: Option<SymId>, ty: NodeId, span: Span) -> NodeId {
        self.alloc(
            NodeKind::Field {
                name,
                ty: Some(ty),
                ddd: false,
                embedded: false,
            },
            span,
        )
    }

    pub fn embedded_field(&mut self, name: SymId, ty: NodeId, span: Span) -> NodeId {
        self.alloc(
            NodeKind::Field {
                name: Some(name),
                ty: Some(ty),
                ddd: false,
                embedded: true,
            },
            span,
        )
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Declare a package-level variable: `var name ntype` or
    /// `var name = <defn fills the type>`.
    pub fn declare_var(
        &mut self,
        syms: &mut SymTable,
        name: &str,
        ntype: Option<NodeId>,
        span: Span,
    ) -> NodeId {
        let sym = syms.local(name);
        let n = self.alloc(NodeKind::Name, span);
        self[n].sym = Some(sym);
        self[n].class = Class::Var;
        self[n].ntype = ntype;
        syms.set_def(sym, Some(n));
        n
    }

    /// Declare a package-level constant with initializer `init`.
    pub fn declare_const(
        &mut self,
        syms: &mut SymTable,
        name: &str,
        ntype: Option<NodeId>,
        init: NodeId,
        span: Span,
    ) -> NodeId {
        let sym = syms.local(name);
        let n = self.alloc(NodeKind::Lit, span);
        self[n].sym = Some(sym);
        self[n].ntype = ntype;
        self[n].defn = Some(init);
        syms.set_def(sym, Some(n));
        n
    }

    /// Declare a named type: `type name = <ntype>` in definition form.
    pub fn declare_type(
        &mut self,
        syms: &mut SymTable,
        name: &str,
        ntype: NodeId,
        span: Span,
    ) -> NodeId {
        let sym = syms.local(name);
        let n = self.alloc(NodeKind::TypeExpr, span);
        self[n].sym = Some(sym);
        self[n].ntype = Some(ntype);
        syms.set_def(sym, Some(n));
        n
    }

    /// Declare a function (or method, when `recv` names a receiver) and
    /// return the FuncDecl statement node.
    pub fn declare_func(
        &mut self,
        syms: &mut SymTable,
        name: &str,
        recv: Option<NodeId>,
        params: Vec<NodeId>,
        results: Vec<NodeId>,
        body: Vec<NodeId>,
        span: Span,
    ) -> NodeId {
        let is_method = recv.is_some();
        let sym = syms.local(name);
        let fname = self.alloc(NodeKind::Name, span);
        self[fname].sym = Some(sym);
        self[fname].class = Class::Func;
        let sig = self.tfunc(recv, params, results, span);
        self[fname].ntype = Some(sig);
        if !is_method {
            syms.set_def(sym, Some(fname));
        }
        self.alloc(
            NodeKind::FuncDecl {
                name: fname,
                shortname: if is_method { Some(sym) } else { None },
                dcl: Vec::new(),
                body,
            },
            span,
        )
    }
}
