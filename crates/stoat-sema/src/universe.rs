// universe.rs
//
// The predeclared scope: basic type names, the constant identities, and
// the built-in functions.

use stoat_frontend::{
    Builtin, Class, Const, NodeArena, NodeKind, SymTable, TcState, TypeId, WalkState,
};

use crate::check::Checker;
use crate::type_arena::FieldVec;

/// Install the predeclared scope. Idempotent: a second call finds the
/// names already defined and leaves them alone.
pub fn declare(nodes: &mut NodeArena, syms: &mut SymTable) {
    if syms
        .find_local("int")
        .and_then(|s| syms.def(s))
        .is_some()
    {
        return;
    }
    let span = stoat_frontend::Span::default();

    let types: &[(&str, TypeId)] = &[
        ("bool", TypeId::BOOL),
        ("string", TypeId::STRING),
        ("int", TypeId::INT),
        ("int8", TypeId::INT8),
        ("int16", TypeId::INT16),
        ("int32", TypeId::INT32),
        ("int64", TypeId::INT64),
        ("uint", TypeId::UINT),
        ("uint8", TypeId::UINT8),
        ("uint16", TypeId::UINT16),
        ("uint32", TypeId::UINT32),
        ("uint64", TypeId::UINT64),
        ("uintptr", TypeId::UINTPTR),
        ("float32", TypeId::FLOAT32),
        ("float64", TypeId::FLOAT64),
        ("complex64", TypeId::COMPLEX64),
        ("complex128", TypeId::COMPLEX128),
        ("byte", TypeId::BYTE),
        ("rune", TypeId::RUNE),
    ];
    for &(name, t) in types {
        let sym = syms.local(name);
        let n = nodes.alloc(NodeKind::TypeExpr, span);
        nodes[n].sym = Some(sym);
        nodes[n].ty = Some(t);
        nodes[n].walkdef = WalkState::Defined;
        nodes[n].typecheck = TcState::Done;
        syms.set_def(sym, Some(n));
    }

    let consts: &[(&str, Const, TypeId)] = &[
        ("true", Const::Bool(true), TypeId::IDEAL_BOOL),
        ("false", Const::Bool(false), TypeId::IDEAL_BOOL),
        ("nil", Const::Nil, TypeId::NIL),
    ];
    for (name, val, t) in consts {
        let sym = syms.local(name);
        let n = nodes.alloc(NodeKind::Lit, span);
        nodes[n].sym = Some(sym);
        nodes[n].val = Some(val.clone());
        nodes[n].ty = Some(*t);
        nodes[n].walkdef = WalkState::Defined;
        syms.set_def(sym, Some(n));
    }

    // The blank identifier is a predeclared name of the blank type.
    let blank = syms.local("_");
    let n = nodes.alloc(NodeKind::Name, span);
    nodes[n].sym = Some(blank);
    nodes[n].ty = Some(TypeId::BLANK);
    nodes[n].class = Class::Var;
    nodes[n].walkdef = WalkState::Defined;
    syms.set_def(blank, Some(n));

    let iota = syms.local("iota");
    let n = nodes.alloc(NodeKind::Iota, span);
    nodes[n].sym = Some(iota);
    syms.set_def(iota, Some(n));

    let builtins: &[Builtin] = &[
        Builtin::Append,
        Builtin::Cap,
        Builtin::Close,
        Builtin::Complex,
        Builtin::Copy,
        Builtin::Delete,
        Builtin::Imag,
        Builtin::Len,
        Builtin::Make,
        Builtin::New,
        Builtin::Panic,
        Builtin::Print,
        Builtin::Println,
        Builtin::Real,
        Builtin::Recover,
    ];
    for &b in builtins {
        let sym = syms.local(b.as_str());
        let n = nodes.alloc(NodeKind::Name, span);
        nodes[n].sym = Some(sym);
        nodes[n].builtin = Some(b);
        nodes[n].class = Class::Func;
        nodes[n].walkdef = WalkState::Defined;
        syms.set_def(sym, Some(n));
    }
}

impl<'a> Checker<'a> {
    /// The empty interface type, minted once per checker.
    pub(crate) fn empty_iface(&mut self) -> TypeId {
        if let Some(t) = self.tinter {
            return t;
        }
        let t = self.types.interface_of(FieldVec::new(), self.syms);
        self.tinter = Some(t);
        t
    }
}
