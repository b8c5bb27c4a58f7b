// Integration tests: end-to-end checking of small programs built through
// the public arena API, covering the checker's headline diagnostics and
// the annotation invariants downstream stages rely on.

use stoat::frontend::{BinOp, NodeArena, NodeId, NodeKind, Span, SymTable, TcState, TypeId};
use stoat::sema::{declare_universe, Checker, SemanticError, TypeError};

fn sp(line: u32) -> Span {
    Span::synthetic(line)
}

fn setup() -> (NodeArena, SymTable) {
    let mut nodes = NodeArena::new();
    let mut syms = SymTable::new();
    declare_universe(&mut nodes, &mut syms);
    (nodes, syms)
}

fn check(nodes: &mut NodeArena, syms: &mut SymTable, decls: &[NodeId]) -> Vec<TypeError> {
    let mut checker = Checker::new(nodes, syms);
    checker.check_program(decls);
    checker.errors
}

fn messages(errs: &[TypeError]) -> Vec<String> {
    errs.iter().map(|e| e.error.to_string()).collect()
}

#[test]
fn constant_definition_loop_lists_both_names() {
    // const A = B; const B = A
    let (mut nodes, mut syms) = setup();
    let b_ref = nodes.nref(&mut syms, "B", sp(1));
    let a = nodes.declare_const(&mut syms, "A", None, b_ref, sp(1));
    let a_ref = nodes.nref(&mut syms, "A", sp(2));
    let b = nodes.declare_const(&mut syms, "B", None, a_ref, sp(2));
    let da = nodes.alloc(NodeKind::ConstDecl { name: a }, sp(1));
    let db = nodes.alloc(NodeKind::ConstDecl { name: b }, sp(2));

    let errs = check(&mut nodes, &mut syms, &[da, db]);
    let loops: Vec<&TypeError> = errs
        .iter()
        .filter(|e| matches!(e.error, SemanticError::ConstDefinitionLoop { .. }))
        .collect();
    assert_eq!(loops.len(), 1, "errors: {:?}", messages(&errs));
    let msg = loops[0].error.to_string();
    assert!(msg.contains("constant definition loop"), "{msg}");
    assert!(msg.contains('A') && msg.contains('B'), "{msg}");
}

#[test]
fn constant_array_index_out_of_bounds() {
    // var x [3]int; _ = x[5]
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let three = nodes.lit_int(3, sp(1));
    let at = nodes.tarray(three, int_t, sp(1));
    let _x = nodes.declare_var(&mut syms, "x", Some(at), sp(1));
    let x_ref = nodes.nref(&mut syms, "x", sp(2));
    let five = nodes.lit_int(5, sp(2));
    let idx = nodes.index(x_ref, five, sp(2));
    let blank = nodes.nref(&mut syms, "_", sp(2));
    let asg = nodes.assign(blank, idx, sp(2));

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert_eq!(
        messages(&errs),
        vec!["invalid array index 5 (out of bounds for 3-element array)"]
    );
}

#[test]
fn slice_can_only_be_compared_to_nil() {
    // var s []int; _ = s == s
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let st = nodes.tslice(int_t, sp(1));
    let _s = nodes.declare_var(&mut syms, "s", Some(st), sp(1));
    let s1 = nodes.nref(&mut syms, "s", sp(2));
    let s2 = nodes.nref(&mut syms, "s", sp(2));
    let cmp = nodes.binary(BinOp::Eq, s1, s2, sp(2));
    let blank = nodes.nref(&mut syms, "_", sp(2));
    let asg = nodes.assign(blank, cmp, sp(2));

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert_eq!(
        messages(&errs),
        vec!["invalid operation: s == s (slice can only be compared to nil)"]
    );
}

#[test]
fn multiple_value_call_in_single_value_context() {
    // func f() (int, int) { return 1, 2 }; x := f()
    let (mut nodes, mut syms) = setup();
    let r1 = nodes.nref(&mut syms, "int", sp(1));
    let r2 = nodes.nref(&mut syms, "int", sp(1));
    let f1 = nodes.field(None, r1, sp(1));
    let f2 = nodes.field(None, r2, sp(1));
    let one = nodes.lit_int(1, sp(1));
    let two = nodes.lit_int(2, sp(1));
    let ret = nodes.ret(vec![one, two], sp(1));
    let fdecl =
        nodes.declare_func(&mut syms, "f", None, vec![], vec![f1, f2], vec![ret], sp(1));

    let f_ref = nodes.nref(&mut syms, "f", sp(2));
    let call = nodes.call(f_ref, vec![], sp(2));
    let x = nodes.declare_var(&mut syms, "x", None, sp(2));
    let asg = nodes.assign(x, call, sp(2));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[fdecl, asg]);
    assert_eq!(
        messages(&errs),
        vec!["multiple-value f() in single-value context"]
    );
}

#[test]
fn delete_missing_key_argument() {
    // var m map[int]int; delete(m)
    let (mut nodes, mut syms) = setup();
    let kt = nodes.nref(&mut syms, "int", sp(1));
    let vt = nodes.nref(&mut syms, "int", sp(1));
    let mt = nodes.tmap(kt, vt, sp(1));
    let _m = nodes.declare_var(&mut syms, "m", Some(mt), sp(1));
    let del_ref = nodes.nref(&mut syms, "delete", sp(2));
    let m_ref = nodes.nref(&mut syms, "m", sp(2));
    let call = nodes.call(del_ref, vec![m_ref], sp(2));

    let errs = check(&mut nodes, &mut syms, &[call]);
    assert_eq!(
        messages(&errs),
        vec!["missing second (key) argument to delete"]
    );
}

#[test]
fn missing_return_at_end_of_function() {
    // func f() int {}
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let res = nodes.field(None, int_t, sp(1));
    let fdecl = nodes.declare_func(&mut syms, "f", None, vec![], vec![res], vec![], sp(1));

    let errs = check(&mut nodes, &mut syms, &[fdecl]);
    assert_eq!(messages(&errs), vec!["missing return at end of function"]);
}

#[test]
fn non_terminating_if_needs_return() {
    // func f() int { if true { return 1 } }
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let res = nodes.field(None, int_t, sp(1));
    let cond = nodes.nref(&mut syms, "true", sp(2));
    let one = nodes.lit_int(1, sp(2));
    let ret = nodes.ret(vec![one], sp(2));
    let iff = nodes.alloc(
        NodeKind::If {
            init: vec![],
            cond: Some(cond),
            then: vec![ret],
            els: vec![],
        },
        sp(2),
    );
    let fdecl = nodes.declare_func(&mut syms, "f", None, vec![], vec![res], vec![iff], sp(1));

    let errs = check(&mut nodes, &mut syms, &[fdecl]);
    assert_eq!(messages(&errs), vec!["missing return at end of function"]);
}

#[test]
fn terminating_if_else_is_enough() {
    // func f() int { if true { return 1 } else { return 2 } }
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let res = nodes.field(None, int_t, sp(1));
    let cond = nodes.nref(&mut syms, "true", sp(2));
    let one = nodes.lit_int(1, sp(2));
    let two = nodes.lit_int(2, sp(2));
    let r1 = nodes.ret(vec![one], sp(2));
    let r2 = nodes.ret(vec![two], sp(2));
    let iff = nodes.alloc(
        NodeKind::If {
            init: vec![],
            cond: Some(cond),
            then: vec![r1],
            els: vec![r2],
        },
        sp(2),
    );
    let fdecl = nodes.declare_func(&mut syms, "f", None, vec![], vec![res], vec![iff], sp(1));

    let errs = check(&mut nodes, &mut syms, &[fdecl]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", messages(&errs));
}

#[test]
fn bare_loop_terminates_unless_broken() {
    // func f() int { for { break } }  -- the break makes it fall through
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let res = nodes.field(None, int_t, sp(1));
    let brk = nodes.alloc(NodeKind::Break { label: None }, sp(2));
    let looped = nodes.alloc(
        NodeKind::For {
            init: vec![],
            cond: None,
            post: None,
            body: vec![brk],
        },
        sp(2),
    );
    let fdecl =
        nodes.declare_func(&mut syms, "f", None, vec![], vec![res], vec![looped], sp(1));

    let errs = check(&mut nodes, &mut syms, &[fdecl]);
    assert_eq!(messages(&errs), vec!["missing return at end of function"]);

    // Without the break, the loop never exits and no return is required.
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let res = nodes.field(None, int_t, sp(1));
    let looped = nodes.alloc(
        NodeKind::For {
            init: vec![],
            cond: None,
            post: None,
            body: vec![],
        },
        sp(2),
    );
    let fdecl =
        nodes.declare_func(&mut syms, "f", None, vec![], vec![res], vec![looped], sp(1));
    let errs = check(&mut nodes, &mut syms, &[fdecl]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", messages(&errs));
}

#[test]
fn selector_on_plain_int() {
    // var x = 3; x.y
    let (mut nodes, mut syms) = setup();
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let three = nodes.lit_int(3, sp(1));
    let init = nodes.assign(x, three, sp(1));
    nodes[x].defn = Some(init);

    let x_ref = nodes.nref(&mut syms, "x", sp(2));
    let y = syms.local("y");
    let dot = nodes.dot(x_ref, y, sp(2));
    let blank = nodes.nref(&mut syms, "_", sp(2));
    let asg = nodes.assign(blank, dot, sp(2));

    let errs = check(&mut nodes, &mut syms, &[init, asg]);
    assert_eq!(
        messages(&errs),
        vec!["x.y undefined (type int has no field or method y)"]
    );
}

#[test]
fn append_first_argument_must_be_slice() {
    // append(3, 4)
    let (mut nodes, mut syms) = setup();
    let app = nodes.nref(&mut syms, "append", sp(1));
    let three = nodes.lit_int(3, sp(1));
    let four = nodes.lit_int(4, sp(1));
    let call = nodes.call(app, vec![three, four], sp(1));
    let blank = nodes.nref(&mut syms, "_", sp(1));
    let asg = nodes.assign(blank, call, sp(1));

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert_eq!(errs.len(), 1, "errors: {:?}", messages(&errs));
    let msg = errs[0].error.to_string();
    assert!(
        msg.starts_with("first argument to append must be slice"),
        "{msg}"
    );
}

// ----------------------------------------------------------------------
// Annotation invariants
// ----------------------------------------------------------------------

fn assert_reachable_done(nodes: &NodeArena, roots: &[NodeId]) {
    fn walk(nodes: &NodeArena, n: NodeId, seen: &mut Vec<bool>) {
        if seen[n.index() as usize] {
            return;
        }
        seen[n.index() as usize] = true;
        assert_eq!(
            nodes[n].typecheck,
            TcState::Done,
            "node {} not fully checked: {:?}",
            n,
            nodes[n].kind
        );
        let mut kids = Vec::new();
        nodes.children(n, &mut |c| kids.push(c));
        for c in kids {
            walk(nodes, c, seen);
        }
    }
    let mut seen = vec![false; nodes.len()];
    for &r in roots {
        walk(nodes, r, &mut seen);
    }
}

#[test]
fn every_reachable_node_ends_done() {
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let three = nodes.lit_int(3, sp(1));
    let at = nodes.tarray(three, int_t, sp(1));
    let _x = nodes.declare_var(&mut syms, "x", Some(at), sp(1));
    let x_ref = nodes.nref(&mut syms, "x", sp(2));
    let one = nodes.lit_int(1, sp(2));
    let idx = nodes.index(x_ref, one, sp(2));
    let y = nodes.declare_var(&mut syms, "y", None, sp(2));
    let asg = nodes.assign(y, idx, sp(2));
    nodes[y].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", messages(&errs));
    assert_reachable_done(&nodes, &[asg]);
}

#[test]
fn checking_twice_adds_no_diagnostics() {
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let res = nodes.field(None, int_t, sp(1));
    let one = nodes.lit_int(1, sp(1));
    let ret = nodes.ret(vec![one], sp(1));
    let fdecl = nodes.declare_func(&mut syms, "f", None, vec![], vec![res], vec![ret], sp(1));

    let f_ref = nodes.nref(&mut syms, "f", sp(2));
    let call = nodes.call(f_ref, vec![], sp(2));
    let x = nodes.declare_var(&mut syms, "x", None, sp(2));
    let asg = nodes.assign(x, call, sp(2));
    nodes[x].defn = Some(asg);

    let decls = [fdecl, asg];
    let mut checker = Checker::new(&mut nodes, &mut syms);
    checker.check_program(&decls);
    let first = checker.errors.len();
    checker.check_program(&decls);
    let second = checker.errors.len();
    assert_eq!(first, 0);
    assert_eq!(second, 0);
    assert_eq!(nodes[x].ty, Some(TypeId::INT));
}

#[test]
fn error_paths_leave_no_type_behind() {
    // append(3, 4): the failing call ends with no type.
    let (mut nodes, mut syms) = setup();
    let app = nodes.nref(&mut syms, "append", sp(1));
    let three = nodes.lit_int(3, sp(1));
    let four = nodes.lit_int(4, sp(1));
    let call = nodes.call(app, vec![three, four], sp(1));
    let blank = nodes.nref(&mut syms, "_", sp(1));
    let asg = nodes.assign(blank, call, sp(1));

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(!errs.is_empty());
    assert_eq!(nodes[call].ty, None);
}

#[test]
fn positional_struct_literal_inserts_field_keys() {
    // type P struct { x, y int }; P{1, 2}
    let (mut nodes, mut syms) = setup();
    let x_sym = syms.local("x");
    let y_sym = syms.local("y");
    let t1 = nodes.nref(&mut syms, "int", sp(1));
    let t2 = nodes.nref(&mut syms, "int", sp(1));
    let fx = nodes.field(Some(x_sym), t1, sp(1));
    let fy = nodes.field(Some(y_sym), t2, sp(1));
    let st = nodes.tstruct(vec![fx, fy], sp(1));
    let p = nodes.declare_type(&mut syms, "P", st, sp(1));
    let pdcl = nodes.alloc(NodeKind::TypeDecl { name: p }, sp(1));

    let p_ref = nodes.nref(&mut syms, "P", sp(2));
    let one = nodes.lit_int(1, sp(2));
    let two = nodes.lit_int(2, sp(2));
    let lit = nodes.complit(Some(p_ref), vec![one, two], sp(2));
    let v = nodes.declare_var(&mut syms, "v", None, sp(2));
    let asg = nodes.assign(v, lit, sp(2));
    nodes[v].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[pdcl, asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", messages(&errs));

    // Every inserted key pair names a struct field exactly, with the
    // field's type on the name.
    let NodeKind::StructLit { elems } = nodes[lit].kind.clone() else {
        panic!("literal not elaborated: {:?}", nodes[lit].kind);
    };
    assert_eq!(elems.len(), 2);
    for (pair, want) in elems.iter().zip([x_sym, y_sym]) {
        let NodeKind::Key { k, .. } = nodes[*pair].kind else {
            panic!("element is not a key pair");
        };
        assert!(matches!(nodes[k].kind, NodeKind::Name));
        assert_eq!(nodes[k].sym, Some(want));
        assert_eq!(nodes[k].ty, Some(TypeId::INT));
    }
}

#[test]
fn slice_literal_gets_length_and_kind() {
    // []int{10, 20, 30}
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let st = nodes.tslice(int_t, sp(1));
    let a = nodes.lit_int(10, sp(1));
    let b = nodes.lit_int(20, sp(1));
    let c = nodes.lit_int(30, sp(1));
    let lit = nodes.complit(Some(st), vec![a, b, c], sp(1));
    let v = nodes.declare_var(&mut syms, "v", None, sp(1));
    let asg = nodes.assign(v, lit, sp(1));
    nodes[v].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", messages(&errs));
    let NodeKind::ArrayLit { elems, len } = nodes[lit].kind.clone() else {
        panic!("literal not elaborated");
    };
    assert_eq!(elems.len(), 3);
    let len = len.expect("slice literal length missing");
    assert_eq!(nodes[len].val, Some(stoat::frontend::Const::Int(3)));
}

#[test]
fn three_index_slice_of_string_rejected() {
    // var s string; s[1:2:3]
    let (mut nodes, mut syms) = setup();
    let str_t = nodes.nref(&mut syms, "string", sp(1));
    let _s = nodes.declare_var(&mut syms, "s", Some(str_t), sp(1));
    let s_ref = nodes.nref(&mut syms, "s", sp(2));
    let one = nodes.lit_int(1, sp(2));
    let two = nodes.lit_int(2, sp(2));
    let three = nodes.lit_int(3, sp(2));
    let sl = nodes.alloc(
        NodeKind::Slice3 {
            x: s_ref,
            lo: Some(one),
            mid: Some(two),
            hi: Some(three),
        },
        sp(2),
    );
    let blank = nodes.nref(&mut syms, "_", sp(2));
    let asg = nodes.assign(blank, sl, sp(2));

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert_eq!(errs.len(), 1);
    assert!(errs[0]
        .error
        .to_string()
        .contains("3-index slice of string"));
}

#[test]
fn swapped_slice_indices_rejected() {
    // var s []int; s[5:2]
    let (mut nodes, mut syms) = setup();
    let int_t = nodes.nref(&mut syms, "int", sp(1));
    let st = nodes.tslice(int_t, sp(1));
    let _s = nodes.declare_var(&mut syms, "s", Some(st), sp(1));
    let s_ref = nodes.nref(&mut syms, "s", sp(2));
    let five = nodes.lit_int(5, sp(2));
    let two = nodes.lit_int(2, sp(2));
    let sl = nodes.alloc(
        NodeKind::Slice {
            x: s_ref,
            lo: Some(five),
            hi: Some(two),
        },
        sp(2),
    );
    let blank = nodes.nref(&mut syms, "_", sp(2));
    let asg = nodes.assign(blank, sl, sp(2));

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert_eq!(messages(&errs), vec!["invalid slice index: 5 > 2"]);
}

#[test]
fn conversion_of_constant_collapses_to_literal() {
    // int64(7) folds into a typed literal.
    let (mut nodes, mut syms) = setup();
    let t_ref = nodes.nref(&mut syms, "int64", sp(1));
    let seven = nodes.lit_int(7, sp(1));
    let conv = nodes.call(t_ref, vec![seven], sp(1));
    let x = nodes.declare_var(&mut syms, "x", None, sp(1));
    let asg = nodes.assign(x, conv, sp(1));
    nodes[x].defn = Some(asg);

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", messages(&errs));
    assert!(nodes[conv].is_lit());
    assert_eq!(nodes[x].ty, Some(TypeId::INT64));
}

#[test]
fn constant_overflow_in_conversion() {
    // uint8(300)
    let (mut nodes, mut syms) = setup();
    let t_ref = nodes.nref(&mut syms, "uint8", sp(1));
    let big = nodes.lit_int(300, sp(1));
    let conv = nodes.call(t_ref, vec![big], sp(1));
    let blank = nodes.nref(&mut syms, "_", sp(1));
    let asg = nodes.assign(blank, conv, sp(1));

    let errs = check(&mut nodes, &mut syms, &[asg]);
    assert!(errs
        .iter()
        .any(|e| matches!(e.error, SemanticError::ConstOverflow { .. })));
}

#[test]
fn go_statement_requires_call() {
    let (mut nodes, mut syms) = setup();
    let fdecl = nodes.declare_func(&mut syms, "f", None, vec![], vec![], vec![], sp(1));
    let f_ref = nodes.nref(&mut syms, "f", sp(2));
    let call = nodes.call(f_ref, vec![], sp(2));
    let go = nodes.alloc(NodeKind::Go { call }, sp(2));

    let errs = check(&mut nodes, &mut syms, &[fdecl, go]);
    assert!(errs.is_empty(), "unexpected errors: {:?}", messages(&errs));
    assert!(matches!(nodes[call].kind, NodeKind::CallFunc { .. }));
}
