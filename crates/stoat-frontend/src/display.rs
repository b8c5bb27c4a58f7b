// display.rs
//
// Compact expression rendering for diagnostics. Prints the node the way
// the user wrote it, preferring the pre-rewrite shadow when one exists.

use crate::ast::{Const, NodeArena, NodeId, NodeKind};
use crate::sym::SymTable;

pub fn node_str(nodes: &NodeArena, syms: &SymTable, n: NodeId) -> String {
    let mut s = String::new();
    write_node(nodes, syms, n, &mut s);
    s
}

fn write_opt(nodes: &NodeArena, syms: &SymTable, n: Option<NodeId>, out: &mut String) {
    if let Some(n) = n {
        write_node(nodes, syms, n, out);
    }
}

fn write_list(nodes: &NodeArena, syms: &SymTable, list: &[NodeId], out: &mut String) {
    for (i, &a) in list.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_node(nodes, syms, a, out);
    }
}

fn write_const(c: &Const, out: &mut String) {
    match c {
        Const::Int(v) => out.push_str(&v.to_string()),
        Const::Rune(v) => match char::from_u32(*v as u32) {
            Some(ch) => out.push_str(&format!("'{}'", ch)),
            None => out.push_str(&v.to_string()),
        },
        Const::Float(v) => out.push_str(&format!("{:?}", v)),
        Const::Complex(re, im) => out.push_str(&format!("({:?}{:+?}i)", re, im)),
        Const::Str(s) => out.push_str(&format!("{:?}", s)),
        Const::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Const::Nil => out.push_str("nil"),
    }
}

fn write_node(nodes: &NodeArena, syms: &SymTable, n: NodeId, out: &mut String) {
    use NodeKind::*;

    let node = &nodes[n];
    // Named constants print their name; folded nodes print as written.
    if node.is_lit() {
        if let Some(s) = node.sym {
            out.push_str(syms.name(s));
            return;
        }
        if let Some(orig) = node.orig {
            if !nodes[orig].is_lit() {
                write_node(nodes, syms, orig, out);
                return;
            }
        }
        if let Some(c) = &node.val {
            write_const(c, out);
            return;
        }
    }

    let sym_name = |out: &mut String| {
        if let Some(s) = node.sym {
            out.push_str(syms.name(s));
        } else {
            out.push_str("<nil>");
        }
    };

    match &node.kind {
        Lit => match &node.val {
            Some(c) => write_const(c, out),
            None => out.push_str("<lit>"),
        },
        RawName | Name | Pack | ClosureVar => sym_name(out),
        Iota => out.push_str("iota"),
        Ddd => out.push_str("..."),
        TypeExpr => out.push_str("<type>"),
        Paren { x } => {
            out.push('(');
            write_node(nodes, syms, *x, out);
            out.push(')');
        }
        Unary { op, x } => {
            out.push_str(op.as_str());
            write_node(nodes, syms, *x, out);
        }
        Binary { op, x, y } | CmpStr { op, x, y } | CmpIface { op, x, y } => {
            write_node(nodes, syms, *x, out);
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            write_node(nodes, syms, *y, out);
        }
        AddStr { list } => {
            for (i, &a) in list.iter().enumerate() {
                if i > 0 {
                    out.push_str(" + ");
                }
                write_node(nodes, syms, a, out);
            }
        }
        AsOp { op, x, y } => {
            write_node(nodes, syms, *x, out);
            out.push(' ');
            out.push_str(op.as_str());
            out.push_str("= ");
            write_node(nodes, syms, *y, out);
        }
        Addr { x } => {
            out.push('&');
            write_node(nodes, syms, *x, out);
        }
        Deref { x } => {
            out.push('*');
            write_node(nodes, syms, *x, out);
        }
        Dot { x, sel } | DotPtr { x, sel } | DotInter { x, sel } | DotMeth { x, sel } => {
            write_node(nodes, syms, *x, out);
            out.push('.');
            out.push_str(syms.name(*sel));
        }
        DotType { x, .. } | DotType2 { x } => {
            write_node(nodes, syms, *x, out);
            out.push_str(".(type)");
        }
        Index { x, i } | IndexMap { x, i } => {
            write_node(nodes, syms, *x, out);
            out.push('[');
            write_node(nodes, syms, *i, out);
            out.push(']');
        }
        Slice { x, lo, hi } | SliceStr { x, lo, hi } | SliceArr { x, lo, hi } => {
            write_node(nodes, syms, *x, out);
            out.push('[');
            write_opt(nodes, syms, *lo, out);
            out.push(':');
            write_opt(nodes, syms, *hi, out);
            out.push(']');
        }
        Slice3 { x, lo, mid, hi } | Slice3Arr { x, lo, mid, hi } => {
            write_node(nodes, syms, *x, out);
            out.push('[');
            write_opt(nodes, syms, *lo, out);
            out.push(':');
            write_opt(nodes, syms, *mid, out);
            out.push(':');
            write_opt(nodes, syms, *hi, out);
            out.push(']');
        }
        Send { ch, val } => {
            write_node(nodes, syms, *ch, out);
            out.push_str(" <- ");
            write_node(nodes, syms, *val, out);
        }
        Recv { ch } => {
            out.push_str("<-");
            write_node(nodes, syms, *ch, out);
        }
        Call { func, args, ddd }
        | CallFunc { func, args, ddd }
        | CallMeth { func, args, ddd }
        | CallInter { func, args, ddd } => {
            write_node(nodes, syms, *func, out);
            out.push('(');
            write_list(nodes, syms, args, out);
            if *ddd {
                out.push_str("...");
            }
            out.push(')');
        }
        Conv { x } | ConvNop { x } | ConvIface { x } | StrToBytes { x } | StrToRunes { x }
        | BytesToStr { x } | RunesToStr { x } | RuneToStr { x } => {
            out.push_str("T(");
            write_node(nodes, syms, *x, out);
            out.push(')');
        }
        CompLit { elems, .. }
        | ArrayLit { elems, .. }
        | MapLit { elems }
        | StructLit { elems } => {
            out.push_str("composite literal");
            let _ = elems;
        }
        PtrLit { x } => {
            out.push('&');
            write_node(nodes, syms, *x, out);
        }
        Key { k, v } => {
            write_node(nodes, syms, *k, out);
            out.push(':');
            write_node(nodes, syms, *v, out);
        }
        Len { x } => builtin1("len", nodes, syms, *x, out),
        Cap { x } => builtin1("cap", nodes, syms, *x, out),
        Real { x } => builtin1("real", nodes, syms, *x, out),
        Imag { x } => builtin1("imag", nodes, syms, *x, out),
        Panic { x } => builtin1("panic", nodes, syms, *x, out),
        Close { ch } => builtin1("close", nodes, syms, *ch, out),
        New { ty_expr } => builtin1("new", nodes, syms, *ty_expr, out),
        Complex { x, y } => {
            out.push_str("complex(");
            write_node(nodes, syms, *x, out);
            out.push_str(", ");
            write_node(nodes, syms, *y, out);
            out.push(')');
        }
        Copy { dst, src } => {
            out.push_str("copy(");
            write_node(nodes, syms, *dst, out);
            out.push_str(", ");
            write_node(nodes, syms, *src, out);
            out.push(')');
        }
        Delete { args } => {
            out.push_str("delete(");
            write_list(nodes, syms, args, out);
            out.push(')');
        }
        Append { args, ddd } => {
            out.push_str("append(");
            write_list(nodes, syms, args, out);
            if *ddd {
                out.push_str("...");
            }
            out.push(')');
        }
        Make { args } => {
            out.push_str("make(");
            write_list(nodes, syms, args, out);
            out.push(')');
        }
        MakeSlice { .. } | MakeMap { .. } | MakeChan { .. } => out.push_str("make(...)"),
        Print { args } => {
            out.push_str("print(");
            write_list(nodes, syms, args, out);
            out.push(')');
        }
        Println { args } => {
            out.push_str("println(");
            write_list(nodes, syms, args, out);
            out.push(')');
        }
        Recover => out.push_str("recover()"),
        Assign { l, r } => {
            write_node(nodes, syms, *l, out);
            out.push_str(" = ");
            write_node(nodes, syms, *r, out);
        }
        _ => out.push_str("statement"),
    }
}

fn builtin1(name: &str, nodes: &NodeArena, syms: &SymTable, x: NodeId, out: &mut String) {
    out.push_str(name);
    out.push('(');
    write_node(nodes, syms, x, out);
    out.push(')');
}
