// errors.rs
//! Type-checking diagnostics (E3xxx).

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    // ------------------------------------------------------------------
    // Names and definitions
    // ------------------------------------------------------------------
    #[error("undefined: {name}")]
    #[diagnostic(code(E3001))]
    Undefined {
        name: String,
        #[label("not declared")]
        span: SourceSpan,
    },

    #[error("cannot use _ as value")]
    #[diagnostic(code(E3002))]
    BlankAsValue {
        #[label("blank identifier")]
        span: SourceSpan,
    },

    #[error("use of builtin {name} not in function call")]
    #[diagnostic(code(E3003))]
    BuiltinNotCalled {
        name: String,
        #[label("must be called")]
        span: SourceSpan,
    },


    #[error("use of package {name} without selector")]
    #[diagnostic(code(E3005))]
    PackageWithoutSelector {
        name: String,
        #[label("package name")]
        span: SourceSpan,
    },

    #[error("{expr} is not a type")]
    #[diagnostic(code(E3006))]
    NotAType {
        expr: String,
        #[label("expected a type")]
        span: SourceSpan,
    },

    #[error("type {ty} is not an expression")]
    #[diagnostic(code(E3007))]
    TypeNotExpr {
        ty: String,
        #[label("type used as expression")]
        span: SourceSpan,
    },

    #[error("{expr} used as value")]
    #[diagnostic(code(E3008))]
    UsedAsValue {
        expr: String,
        #[label("no value")]
        span: SourceSpan,
    },

    #[error("{expr} evaluated but not used")]
    #[diagnostic(code(E3009))]
    NotUsed {
        expr: String,
        #[label("unused result")]
        span: SourceSpan,
    },

    #[error("constant definition loop{chain}")]
    #[diagnostic(code(E3010))]
    ConstDefinitionLoop {
        chain: String,
        #[label("cycle starts here")]
        span: SourceSpan,
    },

    #[error("typechecking loop involving {expr}{chain}")]
    #[diagnostic(code(E3011))]
    TypecheckingLoop {
        expr: String,
        chain: String,
        #[label("cycle")]
        span: SourceSpan,
    },

    #[error("initialization loop{chain}")]
    #[diagnostic(code(E3012))]
    InitializationLoop {
        chain: String,
        #[label("definition cycle")]
        span: SourceSpan,
    },

    #[error("const initializer {expr} is not a constant")]
    #[diagnostic(code(E3013))]
    ConstInitNotConstant {
        expr: String,
        #[label("not constant")]
        span: SourceSpan,
    },

    #[error("const initializer cannot be nil")]
    #[diagnostic(code(E3014))]
    ConstInitNil {
        #[label("nil initializer")]
        span: SourceSpan,
    },

    #[error("invalid constant type {ty}")]
    #[diagnostic(code(E3015))]
    InvalidConstType {
        ty: String,
        #[label("not a constant kind")]
        span: SourceSpan,
    },

    #[error("cannot use {expr} as type {ty} in const initializer")]
    #[diagnostic(code(E3016))]
    ConstInitWrongType {
        expr: String,
        ty: String,
        #[label("wrong type")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------
    #[error("use of [...] array outside of array literal")]
    #[diagnostic(code(E3020))]
    DddArrayOutsideLiteral {
        #[label("bound inferred only in literals")]
        span: SourceSpan,
    },

    #[error("non-constant array bound {expr}")]
    #[diagnostic(code(E3021))]
    NonConstantArrayBound {
        expr: String,
        #[label("must be constant")]
        span: SourceSpan,
    },

    #[error("invalid array bound {expr}")]
    #[diagnostic(code(E3022))]
    InvalidArrayBound {
        expr: String,
        #[label("invalid bound")]
        span: SourceSpan,
    },

    #[error("array bound is too large")]
    #[diagnostic(code(E3023))]
    ArrayBoundTooLarge {
        #[label("too large")]
        span: SourceSpan,
    },

    #[error("array bound must be non-negative")]
    #[diagnostic(code(E3024))]
    ArrayBoundNegative {
        #[label("negative bound")]
        span: SourceSpan,
    },

    #[error("interface contains embedded non-interface {ty}")]
    #[diagnostic(code(E3026))]
    EmbeddedNonInterface {
        ty: String,
        #[label("not an interface")]
        span: SourceSpan,
    },

    #[error("invalid map key type {ty}")]
    #[diagnostic(code(E3025))]
    InvalidMapKeyType {
        ty: String,
        #[label("key type must support ==")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------
    #[error("invalid operation: {op} {ty}")]
    #[diagnostic(code(E3030))]
    InvalidUnaryOp {
        op: String,
        ty: String,
        #[label("operand kind not permitted")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (operator {op} not defined on {kind})")]
    #[diagnostic(code(E3031))]
    OpNotDefined {
        expr: String,
        op: String,
        kind: String,
        #[label("operator not defined")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (mismatched types {left} and {right})")]
    #[diagnostic(code(E3032))]
    MismatchedTypes {
        expr: String,
        left: String,
        right: String,
        #[label("mismatched operands")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (shift count type {ty}, must be unsigned integer)")]
    #[diagnostic(code(E3033))]
    ShiftCountType {
        expr: String,
        ty: String,
        #[label("bad shift count")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (shift of type {ty})")]
    #[diagnostic(code(E3034))]
    ShiftOfType {
        expr: String,
        ty: String,
        #[label("cannot shift")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} ({ty} cannot be compared)")]
    #[diagnostic(code(E3035))]
    NotComparable {
        expr: String,
        ty: String,
        #[label("no == on this type")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (slice can only be compared to nil)")]
    #[diagnostic(code(E3036))]
    SliceCmpToNil {
        expr: String,
        #[label("slice comparison")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (map can only be compared to nil)")]
    #[diagnostic(code(E3037))]
    MapCmpToNil {
        expr: String,
        #[label("map comparison")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (func can only be compared to nil)")]
    #[diagnostic(code(E3038))]
    FuncCmpToNil {
        expr: String,
        #[label("func comparison")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (struct containing {ty} cannot be compared)")]
    #[diagnostic(code(E3039))]
    StructNotComparable {
        expr: String,
        ty: String,
        #[label("uncomparable field")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (non-numeric type {ty})")]
    #[diagnostic(code(E3040))]
    NonNumericIncDec {
        expr: String,
        ty: String,
        #[label("not numeric")]
        span: SourceSpan,
    },

    #[error("division by zero")]
    #[diagnostic(code(E3041))]
    DivisionByZero {
        #[label("constant zero divisor")]
        span: SourceSpan,
    },

    #[error("constant {val} overflows {ty}")]
    #[diagnostic(code(E3042))]
    ConstOverflow {
        val: String,
        ty: String,
        #[label("overflows")]
        span: SourceSpan,
    },

    #[error("constant {val} truncated to integer")]
    #[diagnostic(code(E3043))]
    ConstTruncated {
        val: String,
        #[label("not an integer")]
        span: SourceSpan,
    },

    #[error("constant {op} overflow")]
    #[diagnostic(code(E3046))]
    ArithOverflow {
        op: String,
        #[label("overflows a constant")]
        span: SourceSpan,
    },

    #[error("shift count too large: {count}")]
    #[diagnostic(code(E3044))]
    ShiftCountTooLarge {
        count: String,
        #[label("shift count")]
        span: SourceSpan,
    },

    #[error("use of untyped nil")]
    #[diagnostic(code(E3045))]
    UntypedNil {
        #[label("context requires a type")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Indexing and slicing
    // ------------------------------------------------------------------
    #[error("invalid operation: {expr} (type {ty} does not support indexing)")]
    #[diagnostic(code(E3050))]
    NonIndexable {
        expr: String,
        ty: String,
        #[label("cannot index")]
        span: SourceSpan,
    },

    #[error("non-integer {kind} index {expr}")]
    #[diagnostic(code(E3051))]
    NonIntegerIndex {
        kind: String,
        expr: String,
        #[label("index must be integer")]
        span: SourceSpan,
    },

    #[error("invalid {kind} index {expr} (index must be non-negative)")]
    #[diagnostic(code(E3052))]
    IndexNegative {
        kind: String,
        expr: String,
        #[label("negative index")]
        span: SourceSpan,
    },

    #[error("invalid array index {expr} (out of bounds for {bound}-element array)")]
    #[diagnostic(code(E3053))]
    ArrayIndexOutOfBounds {
        expr: String,
        bound: i64,
        #[label("out of bounds")]
        span: SourceSpan,
    },

    #[error("invalid string index {expr} (out of bounds for {len}-byte string)")]
    #[diagnostic(code(E3054))]
    StringIndexOutOfBounds {
        expr: String,
        len: usize,
        #[label("out of bounds")]
        span: SourceSpan,
    },

    #[error("invalid {kind} index {expr} (index too large)")]
    #[diagnostic(code(E3055))]
    IndexTooLarge {
        kind: String,
        expr: String,
        #[label("too large")]
        span: SourceSpan,
    },

    #[error("invalid operation {expr} (slice of unaddressable value)")]
    #[diagnostic(code(E3056))]
    SliceOfUnaddressable {
        expr: String,
        #[label("unaddressable")]
        span: SourceSpan,
    },

    #[error("cannot slice {expr} (type {ty})")]
    #[diagnostic(code(E3057))]
    CannotSlice {
        expr: String,
        ty: String,
        #[label("not sliceable")]
        span: SourceSpan,
    },

    #[error("invalid operation {expr} (3-index slice of string)")]
    #[diagnostic(code(E3058))]
    Slice3OfString {
        expr: String,
        #[label("strings have no capacity")]
        span: SourceSpan,
    },

    #[error("invalid slice index {expr} (type {ty})")]
    #[diagnostic(code(E3059))]
    SliceIndexType {
        expr: String,
        ty: String,
        #[label("index must be integer")]
        span: SourceSpan,
    },

    #[error("invalid slice index {expr} (out of bounds for {bound}-element array)")]
    #[diagnostic(code(E3060))]
    SliceIndexOutOfBounds {
        expr: String,
        bound: i64,
        #[label("out of bounds")]
        span: SourceSpan,
    },

    #[error("invalid slice index {expr} (out of bounds for {len}-byte string)")]
    #[diagnostic(code(E3061))]
    SliceIndexStringOutOfBounds {
        expr: String,
        len: usize,
        #[label("out of bounds")]
        span: SourceSpan,
    },

    #[error("invalid slice index: {lo} > {hi}")]
    #[diagnostic(code(E3062))]
    SliceIndexSwap {
        lo: String,
        hi: String,
        #[label("indices out of order")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Selectors and method lookup
    // ------------------------------------------------------------------
    #[error("invalid indirect of {expr}")]
    #[diagnostic(code(E3070))]
    InvalidIndirect {
        expr: String,
        #[label("not a pointer")]
        span: SourceSpan,
    },

    #[error("ambiguous selector {expr}")]
    #[diagnostic(code(E3071))]
    AmbiguousSelector {
        expr: String,
        #[label("found through multiple embeddings")]
        span: SourceSpan,
    },

    #[error("{name} is both field and method")]
    #[diagnostic(code(E3072))]
    BothFieldAndMethod {
        name: String,
        #[label("ambiguous")]
        span: SourceSpan,
    },

    #[error("{expr} undefined (type {ty} has no field or method {name})")]
    #[diagnostic(code(E3073))]
    NoFieldOrMethod {
        expr: String,
        ty: String,
        name: String,
        #[label("unknown selector")]
        span: SourceSpan,
    },

    #[error("{expr} undefined (cannot refer to unexported field or method {name})")]
    #[diagnostic(code(E3074))]
    UnexportedFieldOrMethod {
        expr: String,
        name: String,
        #[label("unexported")]
        span: SourceSpan,
    },

    #[error("{expr} undefined (type {ty} has no method {name})")]
    #[diagnostic(code(E3075))]
    NoMethod {
        expr: String,
        ty: String,
        name: String,
        #[label("unknown method")]
        span: SourceSpan,
    },

    #[error("{expr} undefined (cannot refer to unexported method {name})")]
    #[diagnostic(code(E3076))]
    UnexportedMethod {
        expr: String,
        name: String,
        #[label("unexported")]
        span: SourceSpan,
    },

    #[error("type {ty} has no method {name}")]
    #[diagnostic(code(E3077))]
    TypeHasNoMethod {
        ty: String,
        name: String,
        #[label("unknown method")]
        span: SourceSpan,
    },

    #[error("cannot refer to blank field or method")]
    #[diagnostic(code(E3078))]
    BlankSelector {
        #[label("blank selector")]
        span: SourceSpan,
    },

    #[error("invalid method expression {expr} (needs pointer receiver: (*{ty}).{name})")]
    #[diagnostic(code(E3079))]
    MethodExprNeedsPtr {
        expr: String,
        ty: String,
        name: String,
        #[label("value receiver cannot reach this method")]
        span: SourceSpan,
    },

    #[error("calling method {method} with receiver {recv} requires explicit dereference")]
    #[diagnostic(code(E3080))]
    ExplicitDerefRequired {
        method: String,
        recv: String,
        #[label("double indirection")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Type assertions
    // ------------------------------------------------------------------
    #[error("invalid type assertion: {expr} (non-interface type {ty} on left)")]
    #[diagnostic(code(E3085))]
    NonInterfaceAssertion {
        expr: String,
        ty: String,
        #[label("not an interface")]
        span: SourceSpan,
    },

    #[error(
        "impossible type assertion:\n\t{ty} does not implement {iface} (wrong type for {method} method)\n\t\thave {have}\n\t\twant {want}"
    )]
    #[diagnostic(code(E3086))]
    ImpossibleAssertionWrongType {
        ty: String,
        iface: String,
        method: String,
        have: String,
        want: String,
        #[label("method has wrong type")]
        span: SourceSpan,
    },

    #[error(
        "impossible type assertion:\n\t{ty} does not implement {iface} ({method} method has pointer receiver)"
    )]
    #[diagnostic(code(E3087))]
    ImpossibleAssertionPtrReceiver {
        ty: String,
        iface: String,
        method: String,
        #[label("pointer receiver")]
        span: SourceSpan,
    },

    #[error("impossible type assertion:\n\t{ty} does not implement {iface} (missing {method} method)")]
    #[diagnostic(code(E3088))]
    ImpossibleAssertionMissing {
        ty: String,
        iface: String,
        method: String,
        #[label("missing method")]
        span: SourceSpan,
    },

    #[error("use of .(type) outside type switch")]
    #[diagnostic(code(E3089))]
    TypeSwitchOutsideSwitch {
        #[label("only legal as a switch guard")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------
    #[error("invalid operation: {expr} (receive from non-chan type {ty})")]
    #[diagnostic(code(E3090))]
    RecvFromNonChan {
        expr: String,
        ty: String,
        #[label("not a channel")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (receive from send-only type {ty})")]
    #[diagnostic(code(E3091))]
    RecvFromSendOnly {
        expr: String,
        ty: String,
        #[label("send-only channel")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (send to non-chan type {ty})")]
    #[diagnostic(code(E3092))]
    SendToNonChan {
        expr: String,
        ty: String,
        #[label("not a channel")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (send to receive-only type {ty})")]
    #[diagnostic(code(E3093))]
    SendToRecvOnly {
        expr: String,
        ty: String,
        #[label("receive-only channel")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Calls and conversions
    // ------------------------------------------------------------------
    #[error("cannot call non-function {expr} (type {ty})")]
    #[diagnostic(code(E3100))]
    CallNonFunction {
        expr: String,
        ty: String,
        #[label("not a function")]
        span: SourceSpan,
    },

    #[error("multiple-value {call}() in single-value context")]
    #[diagnostic(code(E3101))]
    MultipleValueContext {
        call: String,
        #[label("returns multiple values")]
        span: SourceSpan,
    },

    #[error("not enough arguments in call to {call}")]
    #[diagnostic(code(E3102))]
    NotEnoughArgsCall {
        call: String,
        #[label("missing arguments")]
        span: SourceSpan,
    },

    #[error("not enough arguments to {what}")]
    #[diagnostic(code(E3103))]
    NotEnoughArgs {
        what: String,
        #[label("missing arguments")]
        span: SourceSpan,
    },

    #[error("too many arguments in call to {call}")]
    #[diagnostic(code(E3104))]
    TooManyArgsCall {
        call: String,
        #[label("extra arguments")]
        span: SourceSpan,
    },

    #[error("too many arguments to {what}")]
    #[diagnostic(code(E3105))]
    TooManyArgs {
        what: String,
        #[label("extra arguments")]
        span: SourceSpan,
    },

    #[error("cannot use {val} as type {ty} in argument to {call}{why}")]
    #[diagnostic(code(E3106))]
    WrongArgType {
        val: String,
        ty: String,
        call: String,
        why: String,
        #[label("wrong argument type")]
        span: SourceSpan,
    },

    #[error("cannot use {val} as type {ty} in {desc}{why}")]
    #[diagnostic(code(E3107))]
    CannotUseAsType {
        val: String,
        ty: String,
        desc: String,
        why: String,
        #[label("incompatible type")]
        span: SourceSpan,
    },

    #[error("invalid use of ... in call to {call}")]
    #[diagnostic(code(E3108))]
    InvalidDddCall {
        call: String,
        #[label("callee is not variadic")]
        span: SourceSpan,
    },

    #[error("invalid use of ... in {what}")]
    #[diagnostic(code(E3109))]
    InvalidDdd {
        what: String,
        #[label("misplaced ...")]
        span: SourceSpan,
    },

    #[error("invalid use of ... with builtin {name}")]
    #[diagnostic(code(E3110))]
    InvalidDddBuiltin {
        name: String,
        #[label("builtin is not variadic")]
        span: SourceSpan,
    },

    #[error("invalid use of ... in type conversion")]
    #[diagnostic(code(E3111))]
    InvalidDddConversion {
        #[label("conversions take one value")]
        span: SourceSpan,
    },

    #[error("missing argument to {what}: {expr}")]
    #[diagnostic(code(E3112))]
    MissingArgument {
        what: String,
        expr: String,
        #[label("needs an argument")]
        span: SourceSpan,
    },

    #[error("too many arguments to {what}: {expr}")]
    #[diagnostic(code(E3113))]
    SurplusArgument {
        what: String,
        expr: String,
        #[label("extra argument")]
        span: SourceSpan,
    },

    #[error("cannot convert {val} to type {ty}{why}")]
    #[diagnostic(code(E3114))]
    CannotConvert {
        val: String,
        ty: String,
        why: String,
        #[label("no conversion")]
        span: SourceSpan,
    },

    #[error("invalid argument {arg} for {op}")]
    #[diagnostic(code(E3115))]
    InvalidBuiltinArg {
        arg: String,
        op: String,
        #[label("wrong operand kind")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Built-in specifics
    // ------------------------------------------------------------------


    #[error("invalid operation: {expr} (arguments have type {ty}, expected floating-point)")]
    #[diagnostic(code(E3122))]
    ComplexNotFloat {
        expr: String,
        ty: String,
        #[label("not floating-point")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (non-chan type {ty})")]
    #[diagnostic(code(E3123))]
    CloseNonChan {
        expr: String,
        ty: String,
        #[label("not a channel")]
        span: SourceSpan,
    },

    #[error("invalid operation: {expr} (cannot close receive-only channel)")]
    #[diagnostic(code(E3124))]
    CloseRecvOnly {
        expr: String,
        #[label("receive-only")]
        span: SourceSpan,
    },

    #[error("missing arguments to delete")]
    #[diagnostic(code(E3125))]
    DeleteMissingArgs {
        #[label("needs map and key")]
        span: SourceSpan,
    },

    #[error("missing second (key) argument to delete")]
    #[diagnostic(code(E3126))]
    DeleteMissingKey {
        #[label("needs a key")]
        span: SourceSpan,
    },

    #[error("too many arguments to delete")]
    #[diagnostic(code(E3127))]
    DeleteTooManyArgs {
        #[label("takes map and key only")]
        span: SourceSpan,
    },

    #[error("first argument to delete must be map; have {ty}")]
    #[diagnostic(code(E3128))]
    DeleteNotMap {
        ty: String,
        #[label("not a map")]
        span: SourceSpan,
    },

    #[error("missing arguments to append")]
    #[diagnostic(code(E3129))]
    AppendMissingArgs {
        #[label("needs a slice")]
        span: SourceSpan,
    },

    #[error("first argument to append must be slice; have {ty}")]
    #[diagnostic(code(E3130))]
    AppendNotSlice {
        ty: String,
        #[label("not a slice")]
        span: SourceSpan,
    },

    #[error("first argument to append must be typed slice; have untyped nil")]
    #[diagnostic(code(E3131))]
    AppendUntypedNil {
        #[label("untyped nil")]
        span: SourceSpan,
    },

    #[error("cannot use ... on first argument to append")]
    #[diagnostic(code(E3132))]
    AppendDddFirst {
        #[label("spread the tail, not the slice")]
        span: SourceSpan,
    },

    #[error("too many arguments to append")]
    #[diagnostic(code(E3133))]
    AppendTooManyArgs {
        #[label("spread form takes two arguments")]
        span: SourceSpan,
    },

    #[error("missing arguments to copy")]
    #[diagnostic(code(E3134))]
    CopyMissingArgs {
        #[label("needs destination and source")]
        span: SourceSpan,
    },

    #[error("too many arguments to copy")]
    #[diagnostic(code(E3135))]
    CopyTooManyArgs {
        #[label("takes two arguments")]
        span: SourceSpan,
    },

    #[error("arguments to copy have different element types: {left} and {right}")]
    #[diagnostic(code(E3136))]
    CopyElementMismatch {
        left: String,
        right: String,
        #[label("element types differ")]
        span: SourceSpan,
    },

    #[error("arguments to copy must be slices; have {left}, {right}")]
    #[diagnostic(code(E3137))]
    CopyNotSlices {
        left: String,
        right: String,
        #[label("not slices")]
        span: SourceSpan,
    },

    #[error("first argument to copy should be slice; have {ty}")]
    #[diagnostic(code(E3138))]
    CopyFirstNotSlice {
        ty: String,
        #[label("not a slice")]
        span: SourceSpan,
    },

    #[error("second argument to copy should be slice or string; have {ty}")]
    #[diagnostic(code(E3139))]
    CopySecondNotSlice {
        ty: String,
        #[label("not a slice or string")]
        span: SourceSpan,
    },

    #[error("missing argument to make")]
    #[diagnostic(code(E3140))]
    MakeMissingArg {
        #[label("needs a type")]
        span: SourceSpan,
    },

    #[error("cannot make type {ty}")]
    #[diagnostic(code(E3141))]
    CannotMake {
        ty: String,
        #[label("not a slice, map, or channel")]
        span: SourceSpan,
    },

    #[error("missing len argument to make({ty})")]
    #[diagnostic(code(E3142))]
    MakeMissingLen {
        ty: String,
        #[label("slices need a length")]
        span: SourceSpan,
    },

    #[error("negative {arg} argument in make({ty})")]
    #[diagnostic(code(E3143))]
    MakeNegativeArg {
        arg: String,
        ty: String,
        #[label("negative size")]
        span: SourceSpan,
    },

    #[error("{arg} argument too large in make({ty})")]
    #[diagnostic(code(E3144))]
    MakeArgTooLarge {
        arg: String,
        ty: String,
        #[label("too large")]
        span: SourceSpan,
    },

    #[error("non-integer {arg} argument in make({ty}) - {argty}")]
    #[diagnostic(code(E3145))]
    MakeNonInteger {
        arg: String,
        ty: String,
        argty: String,
        #[label("must be integer")]
        span: SourceSpan,
    },

    #[error("len larger than cap in make({ty})")]
    #[diagnostic(code(E3146))]
    MakeLenLargerThanCap {
        ty: String,
        #[label("len > cap")]
        span: SourceSpan,
    },

    #[error("too many arguments to make({ty})")]
    #[diagnostic(code(E3147))]
    MakeTooManyArgs {
        ty: String,
        #[label("extra arguments")]
        span: SourceSpan,
    },

    #[error("missing argument to new")]
    #[diagnostic(code(E3148))]
    NewMissingArg {
        #[label("needs a type")]
        span: SourceSpan,
    },

    #[error("too many arguments to new({ty})")]
    #[diagnostic(code(E3149))]
    NewTooManyArgs {
        ty: String,
        #[label("takes one type")]
        span: SourceSpan,
    },

    #[error("too many arguments to recover")]
    #[diagnostic(code(E3150))]
    RecoverTooManyArgs {
        #[label("takes no arguments")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Composite literals
    // ------------------------------------------------------------------
    #[error("missing type in composite literal")]
    #[diagnostic(code(E3160))]
    MissingCompLitType {
        #[label("no type")]
        span: SourceSpan,
    },

    #[error("invalid pointer type {ty} for composite literal (use &{elem} instead)")]
    #[diagnostic(code(E3161))]
    PointerCompLit {
        ty: String,
        elem: String,
        #[label("spell it &T{{...}}")]
        span: SourceSpan,
    },

    #[error("invalid pointer type {ty} for composite literal")]
    #[diagnostic(code(E3162))]
    PointerCompLitBase {
        ty: String,
        #[label("pointee is not composite")]
        span: SourceSpan,
    },

    #[error("invalid type for composite literal: {ty}")]
    #[diagnostic(code(E3163))]
    InvalidCompLitType {
        ty: String,
        #[label("not a composite type")]
        span: SourceSpan,
    },

    #[error("array index must be non-negative integer constant")]
    #[diagnostic(code(E3164))]
    ArrayLitBadIndex {
        #[label("bad index")]
        span: SourceSpan,
    },

    #[error("duplicate index in array literal: {index}")]
    #[diagnostic(code(E3165))]
    ArrayLitDupIndex {
        index: i64,
        #[label("already initialized")]
        span: SourceSpan,
    },

    #[error("array index {index} out of bounds [0:{bound}]")]
    #[diagnostic(code(E3166))]
    ArrayLitOutOfBounds {
        index: i64,
        bound: i64,
        #[label("out of bounds")]
        span: SourceSpan,
    },

    #[error("missing key in map literal")]
    #[diagnostic(code(E3167))]
    MapLitMissingKey {
        #[label("needs key: value")]
        span: SourceSpan,
    },

    #[error("duplicate key {key} in map literal")]
    #[diagnostic(code(E3168))]
    MapLitDupKey {
        key: String,
        #[label("already present")]
        span: SourceSpan,
    },

    #[error("too many values in struct initializer")]
    #[diagnostic(code(E3169))]
    StructLitTooManyValues {
        #[label("extra values")]
        span: SourceSpan,
    },

    #[error("too few values in struct initializer")]
    #[diagnostic(code(E3170))]
    StructLitTooFewValues {
        #[label("missing values")]
        span: SourceSpan,
    },

    #[error("implicit assignment of unexported field '{name}' in {ty} literal")]
    #[diagnostic(code(E3171))]
    StructLitUnexportedField {
        name: String,
        ty: String,
        #[label("unexported field")]
        span: SourceSpan,
    },

    #[error("mixture of field:value and value initializers")]
    #[diagnostic(code(E3172))]
    StructLitMixedInit {
        #[label("pick one dialect")]
        span: SourceSpan,
    },

    #[error("invalid field name {expr} in struct initializer")]
    #[diagnostic(code(E3173))]
    StructLitBadFieldName {
        expr: String,
        #[label("not a field name")]
        span: SourceSpan,
    },

    #[error("unknown {ty} field '{name}' in struct literal")]
    #[diagnostic(code(E3174))]
    StructLitUnknownField {
        ty: String,
        name: String,
        #[label("no such field")]
        span: SourceSpan,
    },

    #[error("duplicate field name in struct literal: {name}")]
    #[diagnostic(code(E3175))]
    StructLitDupField {
        name: String,
        #[label("already initialized")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------
    #[error("cannot assign to {expr}")]
    #[diagnostic(code(E3180))]
    CannotAssign {
        expr: String,
        #[label("not an lvalue")]
        span: SourceSpan,
    },

    #[error("cannot {verb} {expr}")]
    #[diagnostic(code(E3181))]
    NotLvalue {
        verb: String,
        expr: String,
        #[label("not addressable")]
        span: SourceSpan,
    },

    #[error("assignment count mismatch: {cl} = {cr}")]
    #[diagnostic(code(E3182))]
    AssignCountMismatch {
        cl: usize,
        cr: usize,
        #[label("count mismatch")]
        span: SourceSpan,
    },

    #[error("cannot assign {ty} to {expr} in multiple assignment{why}")]
    #[diagnostic(code(E3183))]
    MultiAssignBadType {
        ty: String,
        expr: String,
        why: String,
        #[label("incompatible")]
        span: SourceSpan,
    },

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------
    #[error("non-bool {expr} used as {what} condition")]
    #[diagnostic(code(E3190))]
    NonBoolCondition {
        expr: String,
        what: String,
        #[label("condition must be bool")]
        span: SourceSpan,
    },

    #[error("return outside function")]
    #[diagnostic(code(E3191))]
    ReturnOutsideFunction {
        #[label("no enclosing function")]
        span: SourceSpan,
    },

    #[error("{what} discards result of {expr}")]
    #[diagnostic(code(E3192))]
    DeferDiscardsResult {
        what: String,
        expr: String,
        #[label("result would be lost")]
        span: SourceSpan,
    },

    #[error("{what} requires function call, not conversion")]
    #[diagnostic(code(E3193))]
    DeferNotCall {
        what: String,
        #[label("not a call")]
        span: SourceSpan,
    },

    #[error("missing return at end of function")]
    #[diagnostic(code(E3194))]
    MissingReturn {
        #[label("control may reach end")]
        span: SourceSpan,
    },
}
