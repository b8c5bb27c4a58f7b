use stoat_frontend::{
    BinOp, Const, NodeArena, NodeId, NodeKind, Span, SymTable, TcState, TypeId, UnOp,
};

use crate::check::Checker;
use crate::errors::SemanticError;

fn sp(line: u32) -> Span {
    Span::synthetic(line)
}

fn setup() -> (NodeArena, SymTable) {
    let mut nodes = NodeArena::new();
    let mut syms = SymTable::new();
    crate::universe::declare(&mut nodes, &mut syms);
    (nodes, syms)
}

fn check(nodes: &mut NodeArena, syms: &mut SymTable, decls: &[NodeId]) -> Vec<crate::TypeError> {
    let mut checker = Checker::new(nodes, syms);
    checker.check_program(decls);
    checker.errors
}

#[test]
fn untyped_int_defaults_on_assignment() {
    let (mut nodes, mut syms) = setup();
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let three = nodes.lit_int(3, sp(1));
    let asg = nodes.assign(x, three, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert_eq!(nodes[x].ty, Some(TypeId::INT));
}

#[test]
fn explicit_type_forces_conversion_check() {
    let (mut nodes, mut syms) = setup();
    let bool_t = nodes.nref(&mut syms, "bool", sp(1));
    let x = nodes.declare_var(&mut syms, "x", Some(bool_t), sp(1));
    let x_ref = nodes.nref(&mut syms, "x", sp(2));
    let lit = nodes.lit_int(42, sp(2));
    let asg = nodes.assign(x_ref, lit, sp(2));

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(!errs.is_empty());
    assert!(matches!(
        errs[0].error,
        SemanticError::CannotConvert { .. } | SemanticError::CannotUseAsType { .. }
    ));
}

#[test]
fn constant_arithmetic_folds() {
    let (mut nodes, mut syms) = setup();
    let two = nodes.lit_int(2, sp(1));
    let three = nodes.lit_int(3, sp(1));
    let sum = nodes.binary(BinOp::Add, two, three, sp(1));
    let a = nodes.declare_const(&mut syms, "A", None, sum, sp(1));
    let dcl = nodes.alloc(NodeKind::ConstDecl { name: a }, sp(1));

    let errs = check(&mut nodes, &mut syms, &[dcl]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert_eq!(nodes[a].val, Some(Const::Int(5)));
    assert_eq!(nodes[a].ty, Some(TypeId::IDEAL_INT));
}

#[test]
fn constant_comparison_folds_to_ideal_bool() {
    let (mut nodes, mut syms) = setup();
    let three = nodes.lit_int(3, sp(1));
    let four = nodes.lit_int(4, sp(1));
    let cmp = nodes.binary(BinOp::Lt, three, four, sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, cmp, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert_eq!(nodes[cmp].val, Some(Const::Bool(true)));
    assert_eq!(nodes[x].ty, Some(TypeId::BOOL));
}

#[test]
fn constant_shift_folds() {
    let (mut nodes, mut syms) = setup();
    let one = nodes.lit_int(1, sp(1));
    let three = nodes.lit_int(3, sp(1));
    let shl = nodes.binary(BinOp::Shl, one, three, sp(1));
    let c = nodes.declare_const(&mut syms, "C", None, shl, sp(1));
    let dcl = nodes.alloc(NodeKind::ConstDecl { name: c }, sp(1));

    let errs = check(&mut nodes, &mut syms, &[dcl]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert_eq!(nodes[c].val, Some(Const::Int(8)));
}

#[test]
fn division_by_constant_zero() {
    let (mut nodes, mut syms) = setup();
    let one = nodes.lit_int(1, sp(1));
    let zero = nodes.lit_int(0, sp(1));
    let div = nodes.binary(BinOp::Div, one, zero, sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, div, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::DivisionByZero { .. })));
}

#[test]
fn unary_not_requires_bool() {
    let (mut nodes, mut syms) = setup();
    let one = nodes.lit_int(1, sp(1));
    let not = nodes.unary(UnOp::Not, one, sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, not, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(matches!(
        errs[0].error,
        SemanticError::InvalidUnaryOp { .. }
    ));
}

#[test]
fn string_concatenation_flattens() {
    let (mut nodes, mut syms) = setup();
    let str_t = nodes.nref(&mut syms, "string", sp(1));
    let s = nodes.declare_var(&mut syms, "s", Some(str_t), sp(1));
    let s_ref = nodes.nref(&mut syms, "s", sp(2));
    let a = nodes.lit_str("a", sp(2));
    let b = nodes.lit_str("b", sp(2));
    let inner = nodes.binary(BinOp::Add, s_ref, a, sp(2));
    let outer = nodes.binary(BinOp::Add, inner, b, sp(2));
    let x = nodes.declare_var(&mut syms, "x", None, sp(2));
    let asg = nodes.assign(x, outer, sp(2));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    match &nodes[outer].kind {
        NodeKind::AddStr { list } => assert_eq!(list.len(), 3),
        k => panic!("expected AddStr, got {:?}", k),
    }
    assert_eq!(nodes[s].ty, Some(TypeId::STRING));
}

#[test]
fn addrtaken_propagates_to_name() {
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let x = nodes.declare_var(&mut syms, "x", Some(int_t), sp(1));
    let x_ref = nodes.nref(&mut syms, "x", sp(2));
    let addr = nodes.addr(x_ref, sp(2));
    let p = nodes.declare_var(&mut syms, "p", None, sp(2));
    let asg = nodes.assign(p, addr, sp(2));
    nodes[p].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert!(nodes[x].addrtaken);
}

#[test]
fn address_of_non_lvalue() {
    let (mut nodes, mut syms) = setup();
    let three = nodes.lit_int(3, sp(1));
    let addr = nodes.addr(three, sp(1));
    let p = nodes.declare_var(&mut syms, "p", None, sp(1));
    let asg = nodes.assign(p, addr, sp(1));
    nodes[p].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(matches!(errs[0].error, SemanticError::NotLvalue { .. }));
}

#[test]
fn map_index_rewrites_and_converts_key() {
    let (mut nodes, mut syms) = setup();
    let kt = nodes.nref(&mut syms, "int", sp(1));
    let vt = nodes.nref(&mut syms, "string", sp(1));
    let mt = nodes.tmap(kt, vt, sp(1));
    let m = nodes.declare_var(&mut syms, "m", Some(mt), sp(1));
    let m_ref = nodes.nref(&mut syms, "m", sp(2));
    let key = nodes.lit_int(7, sp(2));
    let idx = nodes.index(m_ref, key, sp(2));
    let x = nodes.declare_var(&mut syms, "x", None, sp(2));
    let asg = nodes.assign(x, idx, sp(2));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert!(matches!(nodes[idx].kind, NodeKind::IndexMap { .. }));
    assert_eq!(nodes[x].ty, Some(TypeId::STRING));
    let _ = m;
}

#[test]
fn comma_ok_map_read() {
    let (mut nodes, mut syms) = setup();
    let kt = nodes.nref(&mut syms, "int", sp(1));
    let vt = nodes.nref(&mut syms, "string", sp(1));
    let mt = nodes.tmap(kt, vt, sp(1));
    let m = nodes.declare_var(&mut syms, "m", Some(mt), sp(1));
    let _ = m;
    let m_ref = nodes.nref(&mut syms, "m", sp(2));
    let key = nodes.lit_int(7, sp(2));
    let idx = nodes.index(m_ref, key, sp(2));
    let v = nodes.declare_var(&mut syms, "v", None, sp(2));
    let ok = nodes.declare_var(&mut syms, "ok", None, sp(2));
    let asg = nodes.assign2(vec![v, ok], vec![idx], sp(2));
    nodes[v].defn = Some(asg);
    nodes[ok].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert!(matches!(nodes[asg].kind, NodeKind::As2MapRead { .. }));
    assert_eq!(nodes[v].ty, Some(TypeId::STRING));
    assert_eq!(nodes[ok].ty, Some(TypeId::BOOL));
}

#[test]
fn assignment_count_mismatch() {
    let (mut nodes, mut syms) = setup();
    let a = nodes.declare_var(&mut syms, "a", None, sp(1));
    let b = nodes.declare_var(&mut syms, "b", None, sp(1));
    let one = nodes.lit_int(1, sp(1));
    let asg = nodes.assign2(vec![a, b], vec![one], sp(1));
    nodes[a].defn = Some(asg);
    nodes[b].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(matches!(
        errs[0].error,
        SemanticError::AssignCountMismatch { cl: 2, cr: 1, .. }
    ));
}

#[test]
fn method_call_through_selector() {
    let (mut nodes, mut syms) = setup();
    // type T struct{}; func (t T) M() int { return 1 }
    let st = nodes.tstruct(vec![], sp(1));
    let t_decl = nodes.declare_type(&mut syms, "T", st, sp(1));
    let tdcl = nodes.alloc(NodeKind::TypeDecl { name: t_decl }, sp(1));

    let t_sym = syms.local("t");
    let recv_ty = nodes.nref(&mut syms, "T", sp(2));
    let recv = nodes.field(Some(t_sym), recv_ty, sp(2));
    let int_t = nodes.nref(&mut syms, "int", sp(2));
    let res = nodes.field(None, int_t, sp(2));
    let one = nodes.lit_int(1, sp(2));
    let ret = nodes.ret(vec![one], sp(2));
    let mdecl = nodes.declare_func(&mut syms, "M", Some(recv), vec![], vec![res], vec![ret], sp(2));

    let t_ty = nodes.nref(&mut syms, "T", sp(3));
    let v = nodes.declare_var(&mut syms, "v", Some(t_ty), sp(3));
    let _ = v;
    let v_ref = nodes.nref(&mut syms, "v", sp(4));
    let m_sym = syms.local("M");
    let dot = nodes.dot(v_ref, m_sym, sp(4));
    let call = nodes.call(dot, vec![], sp(4));
    let x = nodes.declare_var(&mut syms, "x", None, sp(4));
    let asg = nodes.assign(x, call, sp(4));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[tdcl, mdecl, asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert!(matches!(nodes[dot].kind, NodeKind::DotMeth { .. }));
    assert!(matches!(nodes[call].kind, NodeKind::CallMeth { .. }));
    assert_eq!(nodes[x].ty, Some(TypeId::INT));
}

#[test]
fn pointer_method_gets_implicit_addr() {
    let (mut nodes, mut syms) = setup();
    let st = nodes.tstruct(vec![], sp(1));
    let t_decl = nodes.declare_type(&mut syms, "T", st, sp(1));
    let tdcl = nodes.alloc(NodeKind::TypeDecl { name: t_decl }, sp(1));

    let t_sym = syms.local("t");
    let recv_base = nodes.nref(&mut syms, "T", sp(2));
    let recv_ptr = nodes.deref(recv_base, sp(2));
    let recv = nodes.field(Some(t_sym), recv_ptr, sp(2));
    let mdecl = nodes.declare_func(&mut syms, "M", Some(recv), vec![], vec![], vec![], sp(2));

    let t_ty = nodes.nref(&mut syms, "T", sp(3));
    let v = nodes.declare_var(&mut syms, "v", Some(t_ty), sp(3));
    let v_ref = nodes.nref(&mut syms, "v", sp(4));
    let m_sym = syms.local("M");
    let dot = nodes.dot(v_ref, m_sym, sp(4));
    let call = nodes.call(dot, vec![], sp(4));

    let errs = check(&mut nodes, &mut syms, &[tdcl, mdecl, call]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    // v.M() inserted &v: the receiver was marked address-taken.
    assert!(nodes[v].addrtaken);
}

#[test]
fn interface_assertion_missing_method() {
    let (mut nodes, mut syms) = setup();
    let m_sym = syms.local("M");
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let res = nodes.field(None, int_t, sp(1));
    let sig = nodes.tfunc(None, vec![], vec![res], sp(1));
    let meth = nodes.field(Some(m_sym), sig, sp(1));
    let it = nodes.tinter(vec![meth], sp(1));
    let i_decl = nodes.declare_type(&mut syms, "I", it, sp(1));
    let idcl = nodes.alloc(NodeKind::TypeDecl { name: i_decl }, sp(1));

    let st = nodes.tstruct(vec![], sp(2));
    let t_decl = nodes.declare_type(&mut syms, "T", st, sp(2));
    let tdcl = nodes.alloc(NodeKind::TypeDecl { name: t_decl }, sp(2));

    let i_ty = nodes.nref(&mut syms, "I", sp(3));
    let iv = nodes.declare_var(&mut syms, "i", Some(i_ty), sp(3));
    let _ = iv;
    let i_ref = nodes.nref(&mut syms, "i", sp(4));
    let t_ref = nodes.nref(&mut syms, "T", sp(4));
    let assert_n = nodes.alloc(
        NodeKind::DotType {
            x: i_ref,
            ty_expr: Some(t_ref),
        },
        sp(4),
    );
    let x = nodes.declare_var(&mut syms, "x", None, sp(4));
    let asg = nodes.assign(x, assert_n, sp(4));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[idcl, tdcl, asg]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::ImpossibleAssertionMissing { .. })));
}

#[test]
fn satisfied_interface_assignment_wraps() {
    let (mut nodes, mut syms) = setup();
    let m_sym = syms.local("M");
    let sig = nodes.tfunc(None, vec![], vec![], sp(1));
    let meth = nodes.field(Some(m_sym), sig, sp(1));
    let it = nodes.tinter(vec![meth], sp(1));
    let i_decl = nodes.declare_type(&mut syms, "I", it, sp(1));
    let idcl = nodes.alloc(NodeKind::TypeDecl { name: i_decl }, sp(1));

    let st = nodes.tstruct(vec![], sp(2));
    let t_decl = nodes.declare_type(&mut syms, "T", st, sp(2));
    let tdcl = nodes.alloc(NodeKind::TypeDecl { name: t_decl }, sp(2));

    let t_sym = syms.local("t");
    let recv_ty = nodes.nref(&mut syms, "T", sp(3));
    let recv = nodes.field(Some(t_sym), recv_ty, sp(3));
    let mdecl = nodes.declare_func(&mut syms, "M", Some(recv), vec![], vec![], vec![], sp(3));

    let i_ty = nodes.nref(&mut syms, "I", sp(4));
    let iv = nodes.declare_var(&mut syms, "i", Some(i_ty), sp(4));
    let _ = iv;
    let t_ty = nodes.nref(&mut syms, "T", sp(4));
    let tv = nodes.declare_var(&mut syms, "v", Some(t_ty), sp(4));
    let _ = tv;
    let i_ref = nodes.nref(&mut syms, "i", sp(5));
    let v_ref = nodes.nref(&mut syms, "v", sp(5));
    let asg = nodes.assign(i_ref, v_ref, sp(5));

    let errs = check(&mut nodes, &mut syms, &[idcl, tdcl, mdecl, asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    // The value was wrapped in an implicit interface conversion.
    let NodeKind::Assign { r, .. } = nodes[asg].kind.clone() else {
        panic!("assign rewritten unexpectedly")
    };
    assert!(matches!(nodes[r].kind, NodeKind::ConvIface { .. }));
}

#[test]
fn array_literal_duplicate_index() {
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let st = nodes.tslice(int_t, sp(1));
    let zero = nodes.lit_int(0, sp(1));
    let one_v = nodes.lit_int(10, sp(1));
    let k0 = nodes.key(zero, one_v, sp(1));
    let zero2 = nodes.lit_int(0, sp(1));
    let two_v = nodes.lit_int(20, sp(1));
    let k1 = nodes.key(zero2, two_v, sp(1));
    let lit = nodes.complit(Some(st), vec![k0, k1], sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, lit, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::ArrayLitDupIndex { index: 0, .. })));
}

#[test]
fn map_literal_duplicate_key() {
    let (mut nodes, mut syms) = setup();
    let kt = nodes.nref(&mut syms, "int", sp(1));
    let vt = nodes.nref(&mut syms, "string", sp(1));
    let mt = nodes.tmap(kt, vt, sp(1));
    let k0 = nodes.lit_int(1, sp(1));
    let v0 = nodes.lit_str("a", sp(1));
    let p0 = nodes.key(k0, v0, sp(1));
    let k1 = nodes.lit_int(1, sp(1));
    let v1 = nodes.lit_str("b", sp(1));
    let p1 = nodes.key(k1, v1, sp(1));
    let lit = nodes.complit(Some(mt), vec![p0, p1], sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, lit, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::MapLitDupKey { .. })));
}

#[test]
fn map_literal_duplicate_complex_key() {
    let (mut nodes, mut syms) = setup();
    let kt = nodes.nref(&mut syms, "complex128", sp(1));
    let vt = nodes.nref(&mut syms, "int", sp(1));
    let mt = nodes.tmap(kt, vt, sp(1));
    let k0 = nodes.lit_complex(1.0, 2.0, sp(1));
    let v0 = nodes.lit_int(1, sp(1));
    let p0 = nodes.key(k0, v0, sp(1));
    let k1 = nodes.lit_complex(1.0, 2.0, sp(1));
    let v1 = nodes.lit_int(2, sp(1));
    let p1 = nodes.key(k1, v1, sp(1));
    let k2 = nodes.lit_complex(1.0, 3.0, sp(1));
    let v2 = nodes.lit_int(3, sp(1));
    let p2 = nodes.key(k2, v2, sp(1));
    let lit = nodes.complit(Some(mt), vec![p0, p1, p2], sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, lit, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    let dups = errs
        .iter()
        .filter(|e| matches!(e.error, SemanticError::MapLitDupKey { .. }))
        .count();
    assert_eq!(dups, 1, "errors: {:?}", errs);
}

#[test]
fn struct_literal_unknown_field() {
    let (mut nodes, mut syms) = setup();
    let x_sym = syms.local("x");
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let f = nodes.field(Some(x_sym), int_t, sp(1));
    let st = nodes.tstruct(vec![f], sp(1));
    let p_decl = nodes.declare_type(&mut syms, "P", st, sp(1));
    let pdcl = nodes.alloc(NodeKind::TypeDecl { name: p_decl }, sp(1));

    let p_ref = nodes.nref(&mut syms, "P", sp(2));
    let bad_sym = syms.local("y");
    let key_name = nodes.raw_name(bad_sym, sp(2));
    let val = nodes.lit_int(1, sp(2));
    let pair = nodes.key(key_name, val, sp(2));
    let lit = nodes.complit(Some(p_ref), vec![pair], sp(2));
    let x = nodes.declare_var(&mut syms, "x", None, sp(2));
    let asg = nodes.assign(x, lit, sp(2));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[pdcl, asg]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::StructLitUnknownField { .. })));
}

#[test]
fn chan_send_direction_enforced() {
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let ct = nodes.tchan(stoat_frontend::ChanDir::Recv, int_t, sp(1));
    let c = nodes.declare_var(&mut syms, "c", Some(ct), sp(1));
    let _ = c;
    let c_ref = nodes.nref(&mut syms, "c", sp(2));
    let one = nodes.lit_int(1, sp(2));
    let send = nodes.alloc(NodeKind::Send { ch: c_ref, val: one }, sp(2));

    let errs = check(&mut nodes, &mut syms, &[send]);
    assert!(matches!(
        errs[0].error,
        SemanticError::SendToRecvOnly { .. }
    ));
}

#[test]
fn iota_substitutes_per_reference() {
    let (mut nodes, mut syms) = setup();
    let iota_sym = syms.local("iota");
    let iota_ref = nodes.raw_name(iota_sym, sp(1));
    nodes[iota_ref].iota = Some(2);
    let c = nodes.declare_const(&mut syms, "C", None, iota_ref, sp(1));
    let dcl = nodes.alloc(NodeKind::ConstDecl { name: c }, sp(1));

    let errs = check(&mut nodes, &mut syms, &[dcl]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert_eq!(nodes[c].val, Some(Const::Int(2)));
}

#[test]
fn defer_requires_call() {
    let (mut nodes, mut syms) = setup();
    let int_ref = nodes.nref(&mut syms, "int", sp(1));
    let one = nodes.lit_int(1, sp(1));
    let conv = nodes.call(int_ref, vec![one], sp(1));
    let defer = nodes.alloc(NodeKind::Defer { call: conv }, sp(1));

    let errs = check(&mut nodes, &mut syms, &[defer]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::DeferNotCall { .. })));
}

#[test]
fn defer_discards_builtin_result() {
    let (mut nodes, mut syms) = setup();
    let s = nodes.lit_str("x", sp(1));
    let len_ref = nodes.nref(&mut syms, "len", sp(1));
    let call = nodes.call(len_ref, vec![s], sp(1));
    let defer = nodes.alloc(NodeKind::Defer { call }, sp(1));

    let errs = check(&mut nodes, &mut syms, &[defer]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::DeferDiscardsResult { .. })));
}

#[test]
fn len_of_constant_string_folds() {
    let (mut nodes, mut syms) = setup();
    let s = nodes.lit_str("hello", sp(1));
    let len_ref = nodes.nref(&mut syms, "len", sp(1));
    let call = nodes.call(len_ref, vec![s], sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, call, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert_eq!(nodes[call].val, Some(Const::Int(5)));
    assert_eq!(nodes[call].ty, Some(TypeId::INT));
}

#[test]
fn len_of_fixed_array_folds() {
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let three = nodes.lit_int(3, sp(1));
    let at = nodes.tarray(three, int_t, sp(1));
    let a = nodes.declare_var(&mut syms, "a", Some(at), sp(1));
    let _ = a;
    let a_ref = nodes.nref(&mut syms, "a", sp(2));
    let len_ref = nodes.nref(&mut syms, "len", sp(2));
    let call = nodes.call(len_ref, vec![a_ref], sp(2));
    let x = nodes.declare_var(&mut syms, "x", None, sp(2));
    let asg = nodes.assign(x, call, sp(2));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert_eq!(nodes[call].val, Some(Const::Int(3)));
}

#[test]
fn builtin_without_call_is_rejected() {
    let (mut nodes, mut syms) = setup();
    let len_ref = nodes.nref(&mut syms, "len", sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, len_ref, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::BuiltinNotCalled { .. })));
}

#[test]
fn blank_as_value_is_rejected() {
    let (mut nodes, mut syms) = setup();
    let blank = nodes.nref(&mut syms, "_", sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, blank, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::BlankAsValue { .. })));
}

#[test]
fn variadic_call_converts_tail() {
    let (mut nodes, mut syms) = setup();
    // func f(xs ...int) {}
    let xs_sym = syms.local("xs");
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let param = nodes.field(Some(xs_sym), int_t, sp(1));
    if let NodeKind::Field { ddd, .. } = &mut nodes[param].kind {
        *ddd = true;
    }
    let fdecl = nodes.declare_func(&mut syms, "f", None, vec![param], vec![], vec![], sp(1));

    let f_ref = nodes.nref(&mut syms, "f", sp(2));
    let a = nodes.lit_int(1, sp(2));
    let b = nodes.lit_int(2, sp(2));
    let call = nodes.call(f_ref, vec![a, b], sp(2));

    let errs = check(&mut nodes, &mut syms, &[fdecl, call]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    assert_eq!(nodes[a].ty, Some(TypeId::INT));
    assert_eq!(nodes[b].ty, Some(TypeId::INT));
}

#[test]
fn wrong_argument_type_is_reported() {
    let (mut nodes, mut syms) = setup();
    let p_sym = syms.local("p");
    let bool_t = nodes.nref(&mut syms, "bool", sp(1));
    let param = nodes.field(Some(p_sym), bool_t, sp(1));
    let fdecl = nodes.declare_func(&mut syms, "f", None, vec![param], vec![], vec![], sp(1));

    let f_ref = nodes.nref(&mut syms, "f", sp(2));
    let a = nodes.lit_int(1, sp(2));
    let call = nodes.call(f_ref, vec![a], sp(2));

    let errs = check(&mut nodes, &mut syms, &[fdecl, call]);
    assert!(!errs.is_empty());
}

#[test]
fn typechecking_loop_is_reported_once() {
    let (mut nodes, mut syms) = setup();
    // var x = x
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let x_ref = nodes.nref(&mut syms, "x", sp(1));
    let asg = nodes.assign(x, x_ref, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    let loops = errs
        .iter()
        .filter(|e| matches!(e.error, SemanticError::TypecheckingLoop { .. }))
        .count();
    assert_eq!(loops, 1, "errors: {:?}", errs);
}

#[test]
fn named_type_is_distinct_from_underlying() {
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let my = nodes.declare_type(&mut syms, "MyInt", int_t, sp(1));
    let mydcl = nodes.alloc(NodeKind::TypeDecl { name: my }, sp(1));

    let my_ref = nodes.nref(&mut syms, "MyInt", sp(2));
    let a = nodes.declare_var(&mut syms, "a", Some(my_ref), sp(2));
    let _ = a;
    let int_ref2 = nodes.nref(&mut syms, "int", sp(2));
    let b = nodes.declare_var(&mut syms, "b", Some(int_ref2), sp(2));
    let _ = b;

    // a = b is fine: identical underlying types and the plain int side is
    // unnamed.
    let a_ref = nodes.nref(&mut syms, "a", sp(3));
    let b_ref = nodes.nref(&mut syms, "b", sp(3));
    let asg = nodes.assign(a_ref, b_ref, sp(3));

    let errs = check(&mut nodes, &mut syms, &[mydcl, asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
}

#[test]
fn self_referential_struct_through_pointer() {
    let (mut nodes, mut syms) = setup();
    // type List struct { next *List }
    let next_sym = syms.local("next");
    let list_ref = nodes.nref(&mut syms, "List", sp(1));
    let ptr = nodes.deref(list_ref, sp(1));
    let f = nodes.field(Some(next_sym), ptr, sp(1));
    let st = nodes.tstruct(vec![f], sp(1));
    let decl = nodes.declare_type(&mut syms, "List", st, sp(1));
    let dcl = nodes.alloc(NodeKind::TypeDecl { name: decl }, sp(1));

    let list_ty = nodes.nref(&mut syms, "List", sp(2));
    let v = nodes.declare_var(&mut syms, "v", Some(list_ty), sp(2));
    let _ = v;
    let v_ref = nodes.nref(&mut syms, "v", sp(3));
    let dot = nodes.dot(v_ref, next_sym, sp(3));
    let x = nodes.declare_var(&mut syms, "x", None, sp(3));
    let asg = nodes.assign(x, dot, sp(3));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[dcl, asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", errs);
    // x has type *List.
    let xt = nodes[x].ty.expect("x untyped");
    let mut checker_nodes_ok = false;
    if let Some(t) = nodes[dot].ty {
        checker_nodes_ok = t == xt;
    }
    assert!(checker_nodes_ok);
}

#[test]
fn evaluated_but_not_used() {
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let x = nodes.declare_var(&mut syms, "x", Some(int_t), sp(1));
    let _ = x;
    let x_ref = nodes.nref(&mut syms, "x", sp(2));
    let one = nodes.lit_int(1, sp(2));
    let add = nodes.binary(BinOp::Add, x_ref, one, sp(2));

    let errs = check(&mut nodes, &mut syms, &[add]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::NotUsed { .. })));
}

#[test]
fn done_flag_set_on_statement_roots() {
    let (mut nodes, mut syms) = setup();
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let one = nodes.lit_int(1, sp(1));
    let asg = nodes.assign(x, one, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty());
    assert_eq!(nodes[asg].typecheck, TcState::Done);
    assert_eq!(nodes[x].typecheck, TcState::Done);
    assert_eq!(nodes[one].typecheck, TcState::Done);
}
