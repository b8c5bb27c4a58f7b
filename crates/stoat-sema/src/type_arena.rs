// type_arena.rs
//
// Type storage for the checker.
//
// TypeId is a u32 handle (defined in the frontend so nodes can carry it);
// the low indices are reserved for the basic kinds and pre-allocated by
// `TypeArena::new`. Composite types are freshly minted, never shared: the
// checker mutates array bounds in place while elaborating `[...]`
// literals, and a named type starts life as a Forward slot whose contents
// are patched once its definition resolves, so every TypeId that was
// handed out early sees the final definition for free.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use stoat_frontend::{ChanDir, SymId, SymTable, TypeId};

/// Basic type classification, also used to classify composites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EType {
    Int8,
    Int16,
    Int32,
    Int64,
    Int,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uint,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Bool,
    String,
    UnsafePtr,
    IdealInt,
    IdealRune,
    IdealFloat,
    IdealComplex,
    IdealString,
    IdealBool,
    Nil,
    Blank,
    Forward,
    Ptr,
    Array,
    Map,
    Chan,
    Struct,
    Inter,
    Func,
    Invalid,
}

impl EType {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            EType::Int8
                | EType::Int16
                | EType::Int32
                | EType::Int64
                | EType::Int
                | EType::Uint8
                | EType::Uint16
                | EType::Uint32
                | EType::Uint64
                | EType::Uint
                | EType::Uintptr
                | EType::IdealInt
                | EType::IdealRune
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            EType::Int8 | EType::Int16 | EType::Int32 | EType::Int64 | EType::Int
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            EType::Uint8
                | EType::Uint16
                | EType::Uint32
                | EType::Uint64
                | EType::Uint
                | EType::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, EType::Float32 | EType::Float64 | EType::IdealFloat)
    }

    pub fn is_complex(self) -> bool {
        matches!(
            self,
            EType::Complex64 | EType::Complex128 | EType::IdealComplex
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    pub fn is_string(self) -> bool {
        matches!(self, EType::String | EType::IdealString)
    }

    pub fn is_bool(self) -> bool {
        matches!(self, EType::Bool | EType::IdealBool)
    }

    pub fn is_ideal(self) -> bool {
        matches!(
            self,
            EType::IdealInt
                | EType::IdealRune
                | EType::IdealFloat
                | EType::IdealComplex
                | EType::IdealString
                | EType::IdealBool
                | EType::Nil
        )
    }
}

/// Array bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    Fixed(i64),
    Slice,
    /// `[...]T`, filled in by the composite-literal elaborator.
    Unfilled,
}

/// A struct field, interface method, or function parameter/result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub sym: Option<SymId>,
    pub ty: TypeId,
    pub embedded: bool,
    pub ddd: bool,
}

impl Field {
    pub fn new(sym: Option<SymId>, ty: TypeId) -> Self {
        Field {
            sym,
            ty,
            embedded: false,
            ddd: false,
        }
    }
}

/// Inline up to 4 fields; covers most parameter and field lists.
pub type FieldVec = SmallVec<[Field; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Basic(EType),
    /// Placeholder tying self-referential definitions together.
    Forward,
    Ptr(TypeId),
    Array {
        elem: TypeId,
        bound: Bound,
    },
    Map {
        key: TypeId,
        val: TypeId,
    },
    Chan {
        elem: TypeId,
        dir: ChanDir,
    },
    Struct {
        fields: FieldVec,
        /// Function-argument tuple (a multi-return value).
        funarg: bool,
    },
    Inter {
        methods: FieldVec,
    },
    Func {
        recv: Option<Field>,
        params: FieldVec,
        results: FieldVec,
        /// All results are named.
        outnamed: bool,
    },
}

#[derive(Debug, Clone)]
pub struct TypeData {
    pub kind: TypeKind,
    /// Name of a named (defined) type.
    pub sym: Option<SymId>,
    /// This type arose from a broken definition; downstream rules that see
    /// it short-circuit instead of cascading diagnostics.
    pub broke: bool,
    /// Methods declared on this named type. Field.ty is the method's full
    /// func type including the receiver.
    pub methods: Vec<Field>,
}

#[derive(Debug, Default)]
pub struct TypeArena {
    types: Vec<TypeData>,
    /// Named slots waiting for a forward type to settle, keyed by the
    /// forward slot's index.
    waiters: FxHashMap<u32, Vec<TypeId>>,
}

impl TypeArena {
    pub fn new() -> Self {
        let mut arena = TypeArena::default();
        let basics = [
            EType::Invalid, // index 0
            EType::Int8,
            EType::Int16,
            EType::Int32,
            EType::Int64,
            EType::Int,
            EType::Uint8,
            EType::Uint16,
            EType::Uint32,
            EType::Uint64,
            EType::Uint,
            EType::Uintptr,
            EType::Float32,
            EType::Float64,
            EType::Complex64,
            EType::Complex128,
            EType::Bool,
            EType::String,
            EType::UnsafePtr,
            EType::IdealInt,
            EType::IdealRune,
            EType::IdealFloat,
            EType::IdealComplex,
            EType::IdealString,
            EType::IdealBool,
            EType::Nil,
            EType::Blank,
        ];
        for et in basics {
            arena.types.push(TypeData {
                kind: TypeKind::Basic(et),
                sym: None,
                broke: false,
                methods: Vec::new(),
            });
        }
        debug_assert_eq!(arena.types.len() as u32, TypeId::FIRST_DYNAMIC);
        arena
    }

    pub fn get(&self, id: TypeId) -> &TypeData {
        &self.types[id.index() as usize]
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.index() as usize].kind
    }

    pub fn alloc(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(TypeData {
            kind,
            sym: None,
            broke: false,
            methods: Vec::new(),
        });
        id
    }

    pub fn kind_mut(&mut self, id: TypeId) -> &mut TypeKind {
        &mut self.types[id.index() as usize].kind
    }

    /// Drop blank parameter names from a func type; a blank name would
    /// suppress the assignment of that argument in generated calls.
    pub fn clear_blank_params(&mut self, id: TypeId, syms: &SymTable) {
        let blanks: Vec<usize> = match self.kind(id) {
            TypeKind::Func { params, .. } => params
                .iter()
                .enumerate()
                .filter_map(|(i, f)| match f.sym {
                    Some(s) if syms.is_blank(s) => Some(i),
                    _ => None,
                })
                .collect(),
            _ => return,
        };
        if blanks.is_empty() {
            return;
        }
        if let TypeKind::Func { params, .. } = self.kind_mut(id) {
            for i in blanks {
                params[i].sym = None;
            }
        }
    }

    pub fn etype(&self, id: TypeId) -> EType {
        match self.kind(id) {
            TypeKind::Basic(et) => *et,
            TypeKind::Forward => EType::Forward,
            TypeKind::Ptr(_) => EType::Ptr,
            TypeKind::Array { .. } => EType::Array,
            TypeKind::Map { .. } => EType::Map,
            TypeKind::Chan { .. } => EType::Chan,
            TypeKind::Struct { .. } => EType::Struct,
            TypeKind::Inter { .. } => EType::Inter,
            TypeKind::Func { .. } => EType::Func,
        }
    }

    pub fn broke(&self, id: TypeId) -> bool {
        self.get(id).broke
    }

    pub fn set_broke(&mut self, id: TypeId) {
        self.types[id.index() as usize].broke = true;
    }

    pub fn sym(&self, id: TypeId) -> Option<SymId> {
        self.get(id).sym
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn ptr_to(&mut self, elem: TypeId) -> TypeId {
        self.alloc(TypeKind::Ptr(elem))
    }

    pub fn slice_of(&mut self, elem: TypeId) -> TypeId {
        self.alloc(TypeKind::Array {
            elem,
            bound: Bound::Slice,
        })
    }

    pub fn array_of(&mut self, elem: TypeId, n: i64) -> TypeId {
        self.alloc(TypeKind::Array {
            elem,
            bound: Bound::Fixed(n),
        })
    }

    pub fn unfilled_array(&mut self, elem: TypeId) -> TypeId {
        self.alloc(TypeKind::Array {
            elem,
            bound: Bound::Unfilled,
        })
    }

    pub fn map_of(&mut self, key: TypeId, val: TypeId) -> TypeId {
        self.alloc(TypeKind::Map { key, val })
    }

    pub fn chan_of(&mut self, elem: TypeId, dir: ChanDir) -> TypeId {
        self.alloc(TypeKind::Chan { elem, dir })
    }

    pub fn struct_of(&mut self, fields: FieldVec, funarg: bool) -> TypeId {
        self.alloc(TypeKind::Struct { fields, funarg })
    }

    pub fn interface_of(&mut self, mut methods: FieldVec, syms: &SymTable) -> TypeId {
        // Keep interface method chains sorted so identity is structural.
        methods.sort_by(|a, b| {
            let an = a.sym.map(|s| syms.name(s)).unwrap_or("");
            let bn = b.sym.map(|s| syms.name(s)).unwrap_or("");
            an.cmp(bn)
        });
        self.alloc(TypeKind::Inter { methods })
    }

    pub fn func_type(
        &mut self,
        recv: Option<Field>,
        params: FieldVec,
        results: FieldVec,
    ) -> TypeId {
        let outnamed = !results.is_empty() && results.iter().all(|f| f.sym.is_some());
        self.alloc(TypeKind::Func {
            recv,
            params,
            results,
            outnamed,
        })
    }

    /// Allocate the Forward placeholder slot for a named type definition.
    pub fn named_forward(&mut self, sym: SymId) -> TypeId {
        let id = self.alloc(TypeKind::Forward);
        self.types[id.index() as usize].sym = Some(sym);
        id
    }

    /// Destructively settle a named type: copy the resolved definition into
    /// the named slot so every TypeId taken while the definition was still
    /// forward becomes retroactively well-typed. If the source is itself
    /// still forward, queue this slot to be settled when the source is.
    pub fn patch_named(&mut self, named: TypeId, src: TypeId) {
        if named == src {
            return;
        }
        if matches!(self.kind(src), TypeKind::Forward) {
            self.waiters.entry(src.index()).or_default().push(named);
            return;
        }
        let src_data = self.types[src.index() as usize].clone();
        let slot = &mut self.types[named.index() as usize];
        slot.kind = src_data.kind;
        slot.broke |= src_data.broke;
        // Update slots waiting on this one.
        if let Some(ws) = self.waiters.remove(&named.index()) {
            for w in ws {
                self.patch_named(w, named);
            }
        }
    }

    pub fn add_method(&mut self, named: TypeId, m: Field) {
        self.types[named.index() as usize].methods.push(m);
    }

    pub fn methods(&self, named: TypeId) -> &[Field] {
        &self.get(named).methods
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_ptr(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Ptr(_))
    }

    pub fn is_inter(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Inter { .. })
    }

    pub fn is_slice(&self, id: TypeId) -> bool {
        matches!(
            self.kind(id),
            TypeKind::Array {
                bound: Bound::Slice,
                ..
            }
        )
    }

    pub fn is_fixed_array(&self, id: TypeId) -> bool {
        matches!(
            self.kind(id),
            TypeKind::Array {
                bound: Bound::Fixed(_),
                ..
            } | TypeKind::Array {
                bound: Bound::Unfilled,
                ..
            }
        )
    }

    /// Element type of a pointer, array, slice, or channel.
    pub fn elem(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id) {
            TypeKind::Ptr(e) => Some(*e),
            TypeKind::Array { elem, .. } => Some(*elem),
            TypeKind::Chan { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    pub fn array_bound(&self, id: TypeId) -> Option<i64> {
        match self.kind(id) {
            TypeKind::Array {
                bound: Bound::Fixed(n),
                ..
            } => Some(*n),
            _ => None,
        }
    }

    pub fn map_key(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id) {
            TypeKind::Map { key, .. } => Some(*key),
            _ => None,
        }
    }

    pub fn map_val(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id) {
            TypeKind::Map { val, .. } => Some(*val),
            _ => None,
        }
    }

    pub fn chan_dir(&self, id: TypeId) -> Option<ChanDir> {
        match self.kind(id) {
            TypeKind::Chan { dir, .. } => Some(*dir),
            _ => None,
        }
    }

    pub fn struct_fields(&self, id: TypeId) -> Option<&FieldVec> {
        match self.kind(id) {
            TypeKind::Struct { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn is_funarg(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Struct { funarg: true, .. })
    }

    pub fn inter_methods(&self, id: TypeId) -> Option<&FieldVec> {
        match self.kind(id) {
            TypeKind::Inter { methods } => Some(methods),
            _ => None,
        }
    }

    pub fn func_parts(&self, id: TypeId) -> Option<(&Option<Field>, &FieldVec, &FieldVec)> {
        match self.kind(id) {
            TypeKind::Func {
                recv,
                params,
                results,
                ..
            } => Some((recv, params, results)),
            _ => None,
        }
    }

    pub fn func_outnamed(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Func { outnamed: true, .. })
    }

    /// The last parameter is variadic.
    pub fn func_variadic(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::Func { params, .. } => params.last().map(|f| f.ddd).unwrap_or(false),
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Structural type identity. Named types are identical only to
    /// themselves; cycles always pass through a named type, so recursion
    /// terminates.
    pub fn eqtype(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        if a == TypeId::INVALID || b == TypeId::INVALID {
            return false;
        }
        if self.sym(a).is_some() || self.sym(b).is_some() {
            return false;
        }
        match (self.kind(a), self.kind(b)) {
            (TypeKind::Basic(x), TypeKind::Basic(y)) => x == y,
            (TypeKind::Ptr(x), TypeKind::Ptr(y)) => self.eqtype(*x, *y),
            (
                TypeKind::Array { elem: e1, bound: b1 },
                TypeKind::Array { elem: e2, bound: b2 },
            ) => {
                let same_bound = match (b1, b2) {
                    (Bound::Fixed(x), Bound::Fixed(y)) => x == y,
                    (Bound::Slice, Bound::Slice) => true,
                    _ => false,
                };
                same_bound && self.eqtype(*e1, *e2)
            }
            (TypeKind::Map { key: k1, val: v1 }, TypeKind::Map { key: k2, val: v2 }) => {
                self.eqtype(*k1, *k2) && self.eqtype(*v1, *v2)
            }
            (
                TypeKind::Chan { elem: e1, dir: d1 },
                TypeKind::Chan { elem: e2, dir: d2 },
            ) => d1 == d2 && self.eqtype(*e1, *e2),
            (
                TypeKind::Struct {
                    fields: f1,
                    funarg: fa1,
                },
                TypeKind::Struct {
                    fields: f2,
                    funarg: fa2,
                },
            ) => {
                fa1 == fa2
                    && f1.len() == f2.len()
                    && f1.iter().zip(f2.iter()).all(|(x, y)| {
                        x.sym == y.sym && x.embedded == y.embedded && self.eqtype(x.ty, y.ty)
                    })
            }
            (TypeKind::Inter { methods: m1 }, TypeKind::Inter { methods: m2 }) => {
                m1.len() == m2.len()
                    && m1
                        .iter()
                        .zip(m2.iter())
                        .all(|(x, y)| x.sym == y.sym && self.eqtype(x.ty, y.ty))
            }
            (
                TypeKind::Func {
                    recv: r1,
                    params: p1,
                    results: o1,
                    ..
                },
                TypeKind::Func {
                    recv: r2,
                    params: p2,
                    results: o2,
                    ..
                },
            ) => {
                // Parameter names are not part of function identity.
                let eq_fields = |a: &FieldVec, b: &FieldVec| {
                    a.len() == b.len()
                        && a.iter()
                            .zip(b.iter())
                            .all(|(x, y)| x.ddd == y.ddd && self.eqtype(x.ty, y.ty))
                };
                r1.is_some() == r2.is_some() && eq_fields(p1, p2) && eq_fields(o1, o2)
            }
            _ => false,
        }
    }

    /// If `t` does not support `==`, return the offending type: `t` itself
    /// for slices, maps, and funcs, or the first bad field of a struct.
    pub fn incomparable(&self, t: TypeId) -> Option<TypeId> {
        let mut seen = FxHashSet::default();
        self.incomparable_rec(t, &mut seen)
    }

    fn incomparable_rec(&self, t: TypeId, seen: &mut FxHashSet<TypeId>) -> Option<TypeId> {
        if !seen.insert(t) {
            return None;
        }
        match self.kind(t) {
            TypeKind::Basic(et) if !matches!(et, EType::Forward | EType::Invalid) => None,
            TypeKind::Ptr(_) | TypeKind::Chan { .. } | TypeKind::Inter { .. } => None,
            TypeKind::Func { .. } | TypeKind::Map { .. } => Some(t),
            TypeKind::Array {
                bound: Bound::Slice,
                ..
            } => Some(t),
            TypeKind::Array { elem, .. } => self.incomparable_rec(*elem, seen).map(|_| t),
            TypeKind::Struct { fields, .. } => {
                for f in fields {
                    if self.incomparable_rec(f.ty, seen).is_some() {
                        return Some(f.ty);
                    }
                }
                None
            }
            _ => None,
        }
    }

    /// The typed default for an ideal constant type.
    pub fn default_type(id: TypeId) -> TypeId {
        match id {
            TypeId::IDEAL_INT => TypeId::INT,
            TypeId::IDEAL_RUNE => TypeId::INT32,
            TypeId::IDEAL_FLOAT => TypeId::FLOAT64,
            TypeId::IDEAL_COMPLEX => TypeId::COMPLEX128,
            TypeId::IDEAL_STRING => TypeId::STRING,
            TypeId::IDEAL_BOOL => TypeId::BOOL,
            other => other,
        }
    }

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    /// Kind word used in "does not support indexing"-style diagnostics.
    pub fn kind_str(&self, id: TypeId) -> &'static str {
        if self.is_slice(id) {
            return "slice";
        }
        match self.etype(id) {
            EType::Int8 => "int8",
            EType::Int16 => "int16",
            EType::Int32 => "int32",
            EType::Int64 => "int64",
            EType::Int => "int",
            EType::Uint8 => "uint8",
            EType::Uint16 => "uint16",
            EType::Uint32 => "uint32",
            EType::Uint64 => "uint64",
            EType::Uint => "uint",
            EType::Uintptr => "uintptr",
            EType::Float32 => "float32",
            EType::Float64 => "float64",
            EType::Complex64 => "complex64",
            EType::Complex128 => "complex128",
            EType::Bool | EType::IdealBool => "bool",
            EType::String | EType::IdealString => "string",
            EType::UnsafePtr => "unsafe pointer",
            EType::IdealInt | EType::IdealRune | EType::IdealFloat | EType::IdealComplex => {
                "untyped number"
            }
            EType::Nil => "nil",
            EType::Blank => "blank",
            EType::Forward => "forward",
            EType::Ptr => "pointer",
            EType::Array => "array",
            EType::Map => "map",
            EType::Chan => "chan",
            EType::Struct => "struct",
            EType::Inter => "interface",
            EType::Func => "func",
            EType::Invalid => "invalid",
        }
    }

    /// Full printable form of a type.
    pub fn type_str(&self, syms: &SymTable, id: TypeId) -> String {
        if let Some(sym) = self.sym(id) {
            return syms.name(sym).to_string();
        }
        match self.kind(id) {
            TypeKind::Basic(_) => self.basic_str(id).to_string(),
            TypeKind::Forward => "<forward>".to_string(),
            TypeKind::Ptr(e) => format!("*{}", self.type_str(syms, *e)),
            TypeKind::Array { elem, bound } => match bound {
                Bound::Fixed(n) => format!("[{}]{}", n, self.type_str(syms, *elem)),
                Bound::Slice => format!("[]{}", self.type_str(syms, *elem)),
                Bound::Unfilled => format!("[...]{}", self.type_str(syms, *elem)),
            },
            TypeKind::Map { key, val } => format!(
                "map[{}]{}",
                self.type_str(syms, *key),
                self.type_str(syms, *val)
            ),
            TypeKind::Chan { elem, dir } => match dir {
                ChanDir::Both => format!("chan {}", self.type_str(syms, *elem)),
                ChanDir::Send => format!("chan<- {}", self.type_str(syms, *elem)),
                ChanDir::Recv => format!("<-chan {}", self.type_str(syms, *elem)),
            },
            TypeKind::Struct { fields, funarg } => {
                if *funarg {
                    let list: Vec<String> =
                        fields.iter().map(|f| self.type_str(syms, f.ty)).collect();
                    return format!("({})", list.join(", "));
                }
                let list: Vec<String> = fields
                    .iter()
                    .map(|f| match f.sym {
                        Some(s) if !f.embedded => {
                            format!("{} {}", syms.name(s), self.type_str(syms, f.ty))
                        }
                        _ => self.type_str(syms, f.ty),
                    })
                    .collect();
                format!("struct {{ {} }}", list.join("; "))
            }
            TypeKind::Inter { methods } => {
                if methods.is_empty() {
                    return "interface {}".to_string();
                }
                let list: Vec<String> = methods
                    .iter()
                    .map(|m| match m.sym {
                        Some(s) => format!("{}{}", syms.name(s), self.func_sig_str(syms, m.ty)),
                        None => self.type_str(syms, m.ty),
                    })
                    .collect();
                format!("interface {{ {} }}", list.join("; "))
            }
            TypeKind::Func {
                params, results, ..
            } => {
                let ps: Vec<String> = params
                    .iter()
                    .map(|f| {
                        if f.ddd {
                            format!("...{}", self.type_str(syms, f.ty))
                        } else {
                            self.type_str(syms, f.ty)
                        }
                    })
                    .collect();
                let mut s = format!("func({})", ps.join(", "));
                match results.len() {
                    0 => {}
                    1 => {
                        s.push(' ');
                        s.push_str(&self.type_str(syms, results[0].ty));
                    }
                    _ => {
                        let rs: Vec<String> =
                            results.iter().map(|f| self.type_str(syms, f.ty)).collect();
                        s.push_str(&format!(" ({})", rs.join(", ")));
                    }
                }
                s
            }
        }
    }

    /// Signature of a method type without the leading `func` keyword.
    pub fn func_sig_str(&self, syms: &SymTable, id: TypeId) -> String {
        let s = self.type_str(syms, id);
        s.strip_prefix("func").unwrap_or(&s).to_string()
    }

    fn basic_str(&self, id: TypeId) -> &'static str {
        match id {
            TypeId::IDEAL_INT => "untyped int",
            TypeId::IDEAL_RUNE => "untyped rune",
            TypeId::IDEAL_FLOAT => "untyped float",
            TypeId::IDEAL_COMPLEX => "untyped complex",
            TypeId::IDEAL_STRING => "untyped string",
            TypeId::IDEAL_BOOL => "untyped bool",
            TypeId::NIL => "nil",
            TypeId::UNSAFEPTR => "unsafe.Pointer",
            _ => self.kind_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_id_size() {
        assert_eq!(std::mem::size_of::<TypeId>(), 4);
    }

    #[test]
    fn basics_preallocated() {
        let arena = TypeArena::new();
        assert_eq!(arena.etype(TypeId::INT), EType::Int);
        assert_eq!(arena.etype(TypeId::STRING), EType::String);
        assert_eq!(arena.etype(TypeId::IDEAL_INT), EType::IdealInt);
        assert_eq!(arena.etype(TypeId::NIL), EType::Nil);
    }

    #[test]
    fn composites_are_fresh() {
        let mut arena = TypeArena::new();
        let a = arena.slice_of(TypeId::INT);
        let b = arena.slice_of(TypeId::INT);
        assert_ne!(a, b);
        assert!(arena.eqtype(a, b));
    }

    #[test]
    fn eqtype_named_is_identity() {
        let mut arena = TypeArena::new();
        let mut syms = SymTable::new();
        let s = syms.local("MyInt");
        let named = arena.named_forward(s);
        arena.patch_named(named, TypeId::INT);
        assert!(!arena.eqtype(named, TypeId::INT));
        assert!(arena.eqtype(named, named));
        assert_eq!(arena.etype(named), EType::Int);
    }

    #[test]
    fn forward_patch_settles_waiters() {
        let mut arena = TypeArena::new();
        let mut syms = SymTable::new();
        let a = arena.named_forward(syms.local("A"));
        let b = arena.named_forward(syms.local("B"));
        // type A B, with B still forward: A waits.
        arena.patch_named(a, b);
        assert!(matches!(arena.kind(a), TypeKind::Forward));
        // B settles; A follows.
        arena.patch_named(b, TypeId::STRING);
        assert_eq!(arena.etype(a), EType::String);
    }

    #[test]
    fn slice_is_incomparable() {
        let mut arena = TypeArena::new();
        let s = arena.slice_of(TypeId::INT);
        assert_eq!(arena.incomparable(s), Some(s));
        assert_eq!(arena.incomparable(TypeId::INT), None);
    }

    #[test]
    fn struct_with_slice_field_is_incomparable() {
        let mut arena = TypeArena::new();
        let mut syms = SymTable::new();
        let sl = arena.slice_of(TypeId::INT);
        let f = syms.local("xs");
        let st = arena.struct_of(
            smallvec::smallvec![Field::new(Some(f), sl)],
            false,
        );
        assert_eq!(arena.incomparable(st), Some(sl));
    }

    #[test]
    fn display_composites() {
        let mut arena = TypeArena::new();
        let syms = SymTable::new();
        let p = arena.ptr_to(TypeId::INT);
        assert_eq!(arena.type_str(&syms, p), "*int");
        let a = arena.array_of(TypeId::UINT8, 3);
        assert_eq!(arena.type_str(&syms, a), "[3]uint8");
        let m = arena.map_of(TypeId::STRING, TypeId::INT);
        assert_eq!(arena.type_str(&syms, m), "map[string]int");
    }
}
