// ast.rs
//
// The AST node arena the checker operates on.
//
// Nodes live in a NodeArena and reference children by NodeId, so the
// back-pointers the checker needs (defn, orig, closure) are plain indices
// instead of owning references. Each operator is its own NodeKind variant
// carrying exactly the children it uses; checker refinements (Call ->
// CallFunc, Index -> IndexMap, ...) replace the variant in place.

use crate::span::Span;
use crate::sym::SymId;

/// Unique identifier for AST nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Per-node checking state. `InProgress` pinned on a node that is reached
/// again through recursion is a definition cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TcState {
    #[default]
    Unchecked,
    Done,
    InProgress,
}

/// Per-definition checking state for top-level names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkState {
    #[default]
    Unvisited,
    Defined,
    Defining,
}

/// Storage class of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Class {
    #[default]
    Var,
    Func,
    Param,
    ParamOut,
}

/// Compile-time constant values. Untypedness is a property of the node's
/// type (the ideal kinds), not of the value.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    Int(i128),
    Rune(i128),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    Bool(bool),
    Nil,
}

impl Const {
    pub fn is_nil(&self) -> bool {
        matches!(self, Const::Nil)
    }

    /// Integer payload of an Int or Rune constant.
    pub fn int_val(&self) -> Option<i128> {
        match self {
            Const::Int(v) | Const::Rune(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Plus,
    Neg,
    Com,
    Not,
}

impl UnOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Plus => "+",
            UnOp::Neg => "-",
            UnOp::Com => "^",
            UnOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,
    AndAnd,
    OrOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn is_cmp(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinOp::Shl | BinOp::Shr)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::AndNot => "&^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::AndAnd => "&&",
            BinOp::OrOr => "||",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// Channel direction. `Both` permits send and receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Send,
    Recv,
    Both,
}

impl ChanDir {
    pub fn can_send(self) -> bool {
        matches!(self, ChanDir::Send | ChanDir::Both)
    }

    pub fn can_recv(self) -> bool {
        matches!(self, ChanDir::Recv | ChanDir::Both)
    }
}

/// Built-in functions. A name node tagged with one of these is only legal
/// as the callee of a call; the call rewrites itself to the corresponding
/// operator variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

impl Builtin {
    pub fn as_str(self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Close => "close",
            Builtin::Complex => "complex",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Imag => "imag",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Real => "real",
            Builtin::Recover => "recover",
        }
    }
}

/// The operator tag plus per-operator children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Names and literals
    /// Constant; the value lives in `Node::val`.
    Lit,
    /// Unresolved name. The resolver chases `sym`'s definition.
    RawName,
    /// Resolved name.
    Name,
    /// The `iota` pseudo-constant definition.
    Iota,
    /// Package identifier used directly (only legal left of a selector).
    Pack,
    /// Standalone `...` in a parameter type.
    Ddd,
    /// Reference to a captured variable inside a closure body.
    ClosureVar,

    // Type expressions; each rewrites itself to `TypeExpr` once checked.
    /// A fully checked type; the type lives in `Node::ty`.
    TypeExpr,
    TSlice {
        elem: NodeId,
    },
    TArray {
        len: NodeId,
        elem: NodeId,
    },
    /// `[...]T`, bound filled in by the composite-literal elaborator.
    TArrayDdd {
        elem: NodeId,
    },
    TMap {
        key: NodeId,
        val: NodeId,
    },
    TChan {
        dir: ChanDir,
        elem: NodeId,
    },
    TStruct {
        fields: Vec<NodeId>,
    },
    TInter {
        methods: Vec<NodeId>,
    },
    TFunc {
        recv: Option<NodeId>,
        params: Vec<NodeId>,
        results: Vec<NodeId>,
    },
    /// Field or parameter declaration inside a type expression; also an
    /// interface method when `ty` is a TFunc.
    Field {
        name: Option<SymId>,
        ty: Option<NodeId>,
        ddd: bool,
        embedded: bool,
    },

    // Expressions
    Paren {
        x: NodeId,
    },
    Unary {
        op: UnOp,
        x: NodeId,
    },
    Binary {
        op: BinOp,
        x: NodeId,
        y: NodeId,
    },
    /// Flattened string concatenation `x + y + z + ...`.
    AddStr {
        list: Vec<NodeId>,
    },
    /// String comparison, refined from Binary.
    CmpStr {
        op: BinOp,
        x: NodeId,
        y: NodeId,
    },
    /// Interface comparison, refined from Binary.
    CmpIface {
        op: BinOp,
        x: NodeId,
        y: NodeId,
    },
    /// `x op= y`; `Node::implicit` marks `x++`/`x--` desugarings.
    AsOp {
        op: BinOp,
        x: NodeId,
        y: NodeId,
    },
    Addr {
        x: NodeId,
    },
    Deref {
        x: NodeId,
    },
    Dot {
        x: NodeId,
        sel: SymId,
    },
    /// Selector through a pointer, refined from Dot.
    DotPtr {
        x: NodeId,
        sel: SymId,
    },
    /// Interface method selector, refined from Dot.
    DotInter {
        x: NodeId,
        sel: SymId,
    },
    /// Concrete method selector, refined from Dot.
    DotMeth {
        x: NodeId,
        sel: SymId,
    },
    /// Type assertion `x.(T)`; `ty_expr` is None once the type is filled in.
    DotType {
        x: NodeId,
        ty_expr: Option<NodeId>,
    },
    /// Non-failing comma-ok assertion, refined from DotType.
    DotType2 {
        x: NodeId,
    },
    Index {
        x: NodeId,
        i: NodeId,
    },
    IndexMap {
        x: NodeId,
        i: NodeId,
    },
    Slice {
        x: NodeId,
        lo: Option<NodeId>,
        hi: Option<NodeId>,
    },
    SliceStr {
        x: NodeId,
        lo: Option<NodeId>,
        hi: Option<NodeId>,
    },
    SliceArr {
        x: NodeId,
        lo: Option<NodeId>,
        hi: Option<NodeId>,
    },
    Slice3 {
        x: NodeId,
        lo: Option<NodeId>,
        mid: Option<NodeId>,
        hi: Option<NodeId>,
    },
    Slice3Arr {
        x: NodeId,
        lo: Option<NodeId>,
        mid: Option<NodeId>,
        hi: Option<NodeId>,
    },
    Send {
        ch: NodeId,
        val: NodeId,
    },
    Recv {
        ch: NodeId,
    },
    Call {
        func: NodeId,
        args: Vec<NodeId>,
        ddd: bool,
    },
    CallFunc {
        func: NodeId,
        args: Vec<NodeId>,
        ddd: bool,
    },
    CallMeth {
        func: NodeId,
        args: Vec<NodeId>,
        ddd: bool,
    },
    CallInter {
        func: NodeId,
        args: Vec<NodeId>,
        ddd: bool,
    },

    // Conversions; the target type lives in `Node::ty`.
    Conv {
        x: NodeId,
    },
    ConvNop {
        x: NodeId,
    },
    ConvIface {
        x: NodeId,
    },
    StrToBytes {
        x: NodeId,
    },
    StrToRunes {
        x: NodeId,
    },
    BytesToStr {
        x: NodeId,
    },
    RunesToStr {
        x: NodeId,
    },
    RuneToStr {
        x: NodeId,
    },

    // Composite literals
    CompLit {
        ty_expr: Option<NodeId>,
        elems: Vec<NodeId>,
    },
    ArrayLit {
        elems: Vec<NodeId>,
        /// Element count for slice literals, filled by the elaborator.
        len: Option<NodeId>,
    },
    MapLit {
        elems: Vec<NodeId>,
    },
    StructLit {
        elems: Vec<NodeId>,
    },
    /// `&T{...}`, wrapped around the inner literal by the elaborator.
    PtrLit {
        x: NodeId,
    },
    Key {
        k: NodeId,
        v: NodeId,
    },

    // Built-in operations, refined from Call.
    Len {
        x: NodeId,
    },
    Cap {
        x: NodeId,
    },
    Real {
        x: NodeId,
    },
    Imag {
        x: NodeId,
    },
    Complex {
        x: NodeId,
        y: NodeId,
    },
    Close {
        ch: NodeId,
    },
    Delete {
        args: Vec<NodeId>,
    },
    Append {
        args: Vec<NodeId>,
        ddd: bool,
    },
    Copy {
        dst: NodeId,
        src: NodeId,
    },
    Make {
        args: Vec<NodeId>,
    },
    MakeSlice {
        len: NodeId,
        cap: Option<NodeId>,
    },
    MakeMap {
        size: Option<NodeId>,
    },
    MakeChan {
        size: Option<NodeId>,
    },
    New {
        ty_expr: NodeId,
    },
    Print {
        args: Vec<NodeId>,
    },
    Println {
        args: Vec<NodeId>,
    },
    Panic {
        x: NodeId,
    },
    Recover,

    // Statements
    Assign {
        l: NodeId,
        r: NodeId,
    },
    Assign2 {
        lhs: Vec<NodeId>,
        rhs: Vec<NodeId>,
    },
    As2Func {
        lhs: Vec<NodeId>,
        rhs: Vec<NodeId>,
    },
    As2MapRead {
        lhs: Vec<NodeId>,
        rhs: Vec<NodeId>,
    },
    As2Recv {
        lhs: Vec<NodeId>,
        rhs: Vec<NodeId>,
    },
    As2DotType {
        lhs: Vec<NodeId>,
        rhs: Vec<NodeId>,
    },
    Block {
        list: Vec<NodeId>,
    },
    Empty,
    /// Variable declaration marker.
    Dcl {
        name: NodeId,
    },
    ConstDecl {
        name: NodeId,
    },
    TypeDecl {
        name: NodeId,
    },
    FuncDecl {
        name: NodeId,
        /// Receiver-stripped method name, for method registration.
        shortname: Option<SymId>,
        /// Parameter and result names declared by the signature.
        dcl: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    If {
        init: Vec<NodeId>,
        cond: Option<NodeId>,
        then: Vec<NodeId>,
        els: Vec<NodeId>,
    },
    For {
        init: Vec<NodeId>,
        cond: Option<NodeId>,
        post: Option<NodeId>,
        body: Vec<NodeId>,
    },
    Return {
        results: Vec<NodeId>,
    },
    Break {
        label: Option<SymId>,
    },
    Continue {
        label: Option<SymId>,
    },
    Goto {
        label: SymId,
    },
    /// Label; `Node::defn` points at the labeled statement when it
    /// immediately precedes a loop or switch.
    Label {
        name: SymId,
    },
    /// `fallthrough`
    Fall,
    /// Tail jump emitted by the backend; terminating, never user-written.
    RetJmp,
    Defer {
        call: NodeId,
    },
    Go {
        call: NodeId,
    },
    Switch {
        init: Vec<NodeId>,
        tag: Option<NodeId>,
        cases: Vec<NodeId>,
    },
    /// `x := y.(type)` guard; only legal as a switch tag.
    TypeSwGuard {
        name: Option<NodeId>,
        x: NodeId,
    },
    Select {
        cases: Vec<NodeId>,
    },
    /// Case clause; empty `vals` is the default case.
    Case {
        vals: Vec<NodeId>,
        body: Vec<NodeId>,
    },
}

/// An AST node. The checker mutates nodes in place: it fills `ty`, folds
/// constants into `val`, refines `kind`, and sets the usage flags.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// Type assigned by the checker. None before checking or after an error.
    pub ty: Option<crate::TypeId>,
    pub val: Option<Const>,
    pub sym: Option<SymId>,
    pub typecheck: TcState,
    pub walkdef: WalkState,
    pub class: Class,
    /// A built-in tag on a name makes it legal only as a callee.
    pub builtin: Option<Builtin>,
    /// A diagnostic about this node has already been emitted.
    pub diag: bool,
    pub implicit: bool,
    pub used: bool,
    pub assigned: bool,
    pub addrtaken: bool,
    pub reslice: bool,
    pub hasbreak: bool,
    /// Defining statement of this name.
    pub defn: Option<NodeId>,
    /// Pre-rewrite shadow of a folded or refined node, kept for diagnostics.
    pub orig: Option<NodeId>,
    /// Captured original of a closure variable; usage flags propagate to it.
    pub closure: Option<NodeId>,
    /// Declared type expression of a name.
    pub ntype: Option<NodeId>,
    /// Value substituted for `iota` when this reference is resolved.
    pub iota: Option<i64>,
    pub decldepth: u32,
}

impl Node {
    fn new(kind: NodeKind, span: Span) -> Self {
        Node {
            kind,
            span,
            ty: None,
            val: None,
            sym: None,
            typecheck: TcState::Unchecked,
            walkdef: WalkState::Unvisited,
            class: Class::Var,
            builtin: None,
            diag: false,
            implicit: false,
            used: false,
            assigned: false,
            addrtaken: false,
            reslice: false,
            hasbreak: false,
            defn: None,
            orig: None,
            closure: None,
            ntype: None,
            iota: None,
            decldepth: 0,
        }
    }

    pub fn is_lit(&self) -> bool {
        matches!(self.kind, NodeKind::Lit)
    }
}

#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, span));
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Clone a node into a fresh slot. Used for the `orig` shadow kept
    /// before a fold or refinement rewrite.
    pub fn shadow(&mut self, n: NodeId) -> NodeId {
        let copy = self.nodes[n.0 as usize].clone();
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(copy);
        id
    }

    /// Visit every direct child of `n`.
    pub fn children(&self, n: NodeId, f: &mut dyn FnMut(NodeId)) {
        use NodeKind::*;
        let each = |list: &[NodeId], f: &mut dyn FnMut(NodeId)| {
            for &c in list {
                f(c);
            }
        };
        let opt = |x: &Option<NodeId>, f: &mut dyn FnMut(NodeId)| {
            if let Some(c) = x {
                f(*c);
            }
        };
        match &self[n].kind {
            Lit | RawName | Name | Iota | Pack | Ddd | ClosureVar | TypeExpr | Empty | Recover
            | Break { .. } | Continue { .. } | Goto { .. } | Label { .. } | Fall | RetJmp => {}
            TSlice { elem } | TArrayDdd { elem } | TChan { elem, .. } => f(*elem),
            TArray { len, elem } => {
                f(*len);
                f(*elem);
            }
            TMap { key, val } => {
                f(*key);
                f(*val);
            }
            TStruct { fields } => each(fields, f),
            TInter { methods } => each(methods, f),
            TFunc {
                recv,
                params,
                results,
            } => {
                opt(recv, f);
                each(params, f);
                each(results, f);
            }
            Field { ty, .. } => opt(ty, f),
            Paren { x } | Unary { x, .. } | Addr { x } | Deref { x } | Panic { x } | Len { x }
            | Cap { x } | Real { x } | Imag { x } | PtrLit { x } | Conv { x } | ConvNop { x }
            | ConvIface { x } | StrToBytes { x } | StrToRunes { x } | BytesToStr { x }
            | RunesToStr { x } | RuneToStr { x } | DotType2 { x } => f(*x),
            AddStr { list } => each(list, f),
            Binary { x, y, .. } | CmpStr { x, y, .. } | CmpIface { x, y, .. }
            | AsOp { x, y, .. } | Complex { x, y } => {
                f(*x);
                f(*y);
            }
            Dot { x, .. } | DotPtr { x, .. } | DotInter { x, .. } | DotMeth { x, .. } => f(*x),
            DotType { x, ty_expr } => {
                f(*x);
                opt(ty_expr, f);
            }
            Index { x, i } | IndexMap { x, i } => {
                f(*x);
                f(*i);
            }
            Slice { x, lo, hi } | SliceStr { x, lo, hi } | SliceArr { x, lo, hi } => {
                f(*x);
                opt(lo, f);
                opt(hi, f);
            }
            Slice3 { x, lo, mid, hi } | Slice3Arr { x, lo, mid, hi } => {
                f(*x);
                opt(lo, f);
                opt(mid, f);
                opt(hi, f);
            }
            Send { ch, val } => {
                f(*ch);
                f(*val);
            }
            Recv { ch } | Close { ch } => f(*ch),
            Call { func, args, .. }
            | CallFunc { func, args, .. }
            | CallMeth { func, args, .. }
            | CallInter { func, args, .. } => {
                f(*func);
                each(args, f);
            }
            CompLit { ty_expr, elems } => {
                opt(ty_expr, f);
                each(elems, f);
            }
            ArrayLit { elems, len } => {
                each(elems, f);
                opt(len, f);
            }
            MapLit { elems } | StructLit { elems } => each(elems, f),
            Key { k, v } => {
                f(*k);
                f(*v);
            }
            Delete { args } | Make { args } | Print { args } | Println { args } => each(args, f),
            Append { args, .. } => each(args, f),
            Copy { dst, src } => {
                f(*dst);
                f(*src);
            }
            MakeSlice { len, cap } => {
                f(*len);
                opt(cap, f);
            }
            MakeMap { size } | MakeChan { size } => opt(size, f),
            New { ty_expr } => f(*ty_expr),
            Assign { l, r } => {
                f(*l);
                f(*r);
            }
            Assign2 { lhs, rhs }
            | As2Func { lhs, rhs }
            | As2MapRead { lhs, rhs }
            | As2Recv { lhs, rhs }
            | As2DotType { lhs, rhs } => {
                each(lhs, f);
                each(rhs, f);
            }
            Block { list } => each(list, f),
            Dcl { name } | ConstDecl { name } | TypeDecl { name } => f(*name),
            FuncDecl {
                name, dcl, body, ..
            } => {
                f(*name);
                each(dcl, f);
                each(body, f);
            }
            If {
                init,
                cond,
                then,
                els,
            } => {
                each(init, f);
                opt(cond, f);
                each(then, f);
                each(els, f);
            }
            For {
                init,
                cond,
                post,
                body,
            } => {
                each(init, f);
                opt(cond, f);
                opt(post, f);
                each(body, f);
            }
            Return { results } => each(results, f),
            Defer { call } | Go { call } => f(*call),
            Switch { init, tag, cases } => {
                each(init, f);
                opt(tag, f);
                each(cases, f);
            }
            TypeSwGuard { name, x } => {
                opt(name, f);
                f(*x);
            }
            Select { cases } => each(cases, f),
            Case { vals, body } => {
                each(vals, f);
                each(body, f);
            }
        }
    }
}

impl std::ops::Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }
}

impl std::ops::IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }
}
