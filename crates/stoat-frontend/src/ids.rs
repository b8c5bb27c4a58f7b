// ids.rs
//
// TypeId: u32 handle to a type in the checker's arena, for O(1) equality
// and pass-by-copy. The low indices are reserved for the basic kinds and
// are guaranteed by the arena's constructor; everything at FIRST_DYNAMIC
// and above is minted per compilation.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    /// Invalid type (index 0, never a real type).
    pub const INVALID: TypeId = TypeId(0);

    // Signed integers
    pub const INT8: TypeId = TypeId(1);
    pub const INT16: TypeId = TypeId(2);
    pub const INT32: TypeId = TypeId(3);
    pub const INT64: TypeId = TypeId(4);
    pub const INT: TypeId = TypeId(5);

    // Unsigned integers
    pub const UINT8: TypeId = TypeId(6);
    pub const UINT16: TypeId = TypeId(7);
    pub const UINT32: TypeId = TypeId(8);
    pub const UINT64: TypeId = TypeId(9);
    pub const UINT: TypeId = TypeId(10);
    pub const UINTPTR: TypeId = TypeId(11);

    // Floats and complexes
    pub const FLOAT32: TypeId = TypeId(12);
    pub const FLOAT64: TypeId = TypeId(13);
    pub const COMPLEX64: TypeId = TypeId(14);
    pub const COMPLEX128: TypeId = TypeId(15);

    // Other basics
    pub const BOOL: TypeId = TypeId(16);
    pub const STRING: TypeId = TypeId(17);
    pub const UNSAFEPTR: TypeId = TypeId(18);

    // Ideal (untyped) constant types
    pub const IDEAL_INT: TypeId = TypeId(19);
    pub const IDEAL_RUNE: TypeId = TypeId(20);
    pub const IDEAL_FLOAT: TypeId = TypeId(21);
    pub const IDEAL_COMPLEX: TypeId = TypeId(22);
    pub const IDEAL_STRING: TypeId = TypeId(23);
    pub const IDEAL_BOOL: TypeId = TypeId(24);

    /// The type of an untyped nil.
    pub const NIL: TypeId = TypeId(25);
    /// The type of the blank identifier.
    pub const BLANK: TypeId = TypeId(26);

    /// Aliases
    pub const BYTE: TypeId = TypeId::UINT8;
    pub const RUNE: TypeId = TypeId::INT32;

    /// First non-reserved index.
    pub const FIRST_DYNAMIC: u32 = 27;

    pub fn from_raw(index: u32) -> Self {
        TypeId(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    pub fn is_basic(self) -> bool {
        self.0 >= 1 && self.0 < Self::FIRST_DYNAMIC
    }

    pub fn is_signed(self) -> bool {
        self.0 >= Self::INT8.0 && self.0 <= Self::INT.0
    }

    pub fn is_unsigned(self) -> bool {
        self.0 >= Self::UINT8.0 && self.0 <= Self::UINTPTR.0
    }

    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_float(self) -> bool {
        self == Self::FLOAT32 || self == Self::FLOAT64
    }

    pub fn is_complex(self) -> bool {
        self == Self::COMPLEX64 || self == Self::COMPLEX128
    }

    /// Untyped: the ideal constant kinds and nil.
    pub fn is_untyped(self) -> bool {
        (self.0 >= Self::IDEAL_INT.0 && self.0 <= Self::IDEAL_BOOL.0) || self == Self::NIL
    }

    /// The ideal numeric kinds (ordered int < rune < float < complex).
    pub fn is_ideal_number(self) -> bool {
        self.0 >= Self::IDEAL_INT.0 && self.0 <= Self::IDEAL_COMPLEX.0
    }
}
