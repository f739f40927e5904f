//! Analyzer error values.
//!
//! Each [`SemaError`] variant maps to exactly one [`ErrorCode`]; the
//! context turns it into a [`Diagnostic`] at the reporting site. Warning
//! variants carry `W` codes and never count toward the unit's error total.

use hlsl_diagnostic::{Diagnostic, ErrorCode};
use hlsl_ir::{Span, Stage};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SemaError {
    // === Structural / annotation ===
    #[error("malformed register annotation `{0}`")]
    BadRegister(String),
    #[error("malformed packoffset `{0}`")]
    BadPackOffset(String),
    #[error("unknown layout qualifier `{0}`")]
    UnknownLayoutQualifier(String),
    #[error("invalid semantic `{0}`")]
    InvalidSemantic(String),
    #[error("redefinition of `{0}`")]
    Redefinition(String),
    #[error("undeclared identifier `{0}`")]
    Undeclared(String),
    #[error("entry point `{0}` not found")]
    EntryPointNotFound(String),
    #[error("patch constant function `{0}` not found")]
    PatchConstantNotFound(String),
    #[error("multiple patch constant function candidates for `{0}`")]
    PatchConstantAmbiguous(String),
    #[error("invalid attribute `{name}`: {reason}")]
    InvalidAttribute { name: String, reason: &'static str },
    #[error("`{op}` is not valid in the {stage:?} stage")]
    WrongStage { op: String, stage: Stage },
    #[error("`{0}` statement outside its construct")]
    MisplacedStatement(&'static str),
    #[error("`{0}` returns void but a value was returned")]
    ReturnValueInVoid(String),
    #[error("`{0}` must return a value")]
    MissingReturnValue(String),
    #[error("no member named `{member}` in `{ty}`")]
    UnknownMember { member: String, ty: String },
    #[error("invalid swizzle `{0}`")]
    InvalidSwizzle(String),
    #[error("index into flattened `{0}` must be a constant")]
    NonConstantFlattenIndex(String),
    #[error("cannot flatten implicitly-sized array `{0}`")]
    FlattenUnsized(String),

    // === Type ===
    #[error("cannot convert from `{from}` to `{to}`")]
    CannotConvert { from: String, to: String },
    #[error("no matching overloaded function found: `{0}`")]
    NoMatchingOverload(String),
    #[error("ambiguous function call: `{0}`")]
    AmbiguousOverload(String),
    #[error("`{name}` expects {expected} arguments, found {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("`{0}` is not an l-value")]
    NotLValue(String),
    #[error("invalid operands to `{op}`: `{left}` and `{right}`")]
    InvalidOperands {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("invalid operand to `{op}`: `{operand}`")]
    InvalidOperand { op: &'static str, operand: String },
    #[error("index {index} out of range for `{ty}`")]
    IndexOutOfRange { index: i64, ty: String },
    #[error("`{0}` cannot be indexed")]
    NotIndexable(String),
    #[error("wrong arguments for constructor of `{0}`")]
    ConstructorMismatch(String),
    #[error("condition must be a scalar, found `{0}`")]
    NonScalarCondition(String),
    #[error("switch selector must be a scalar integer, found `{0}`")]
    BadSwitchSelector(String),
    #[error("read-only resource `{0}` used as l-value")]
    ReadOnlyResource(String),
    #[error("only the outermost array dimension may be unsized: `{0}`")]
    InnerUnsized(String),

    // === Binding / layout ===
    #[error("location {value} is out of range (max {max})")]
    LocationRange { value: u32, max: u32 },
    #[error("binding {value} is out of range (max {max})")]
    BindingRange { value: u32, max: u32 },
    #[error("set {value} is out of range (max {max})")]
    SetRange { value: u32, max: u32 },
    #[error("component {value} is out of range (max {max})")]
    ComponentRange { value: u32, max: u32 },
    #[error("offset {offset} of `{member}` is not aligned to {align}")]
    MisalignedOffset {
        member: String,
        offset: u32,
        align: u32,
    },
    #[error("offset {offset} of `{member}` overlaps the previous member")]
    OverlappingOffset { member: String, offset: u32 },
    #[error("block `{0}` mixes members with and without locations")]
    PartialBlockLocations(String),
    #[error("binding {binding} in set {set} is already used by `{other}`")]
    BindingConflict {
        binding: u32,
        set: u32,
        other: String,
    },
    #[error("inconsistent layout on redeclaration of `{0}`")]
    InconsistentRedeclaration(String),
    #[error("alignment {0} is not a power of two")]
    AlignNotPowerOfTwo(u32),

    // === Unimplemented ===
    #[error("partial-component write through resource element `{0}`")]
    PartialResourceWrite(String),
    #[error("more than one array indirection into split builtin of `{0}`")]
    MultiIndirectSplit(String),
    #[error("multiple output patch parameters on `{0}`")]
    MultipleOutputPatches(String),
    #[error("output parameter `{0}` on patch constant function")]
    PatchFunctionOutput(String),
    #[error("comparison gather on the {0} channel")]
    GatherCmpChannel(&'static str),

    // === Internal ===
    #[error("internal error: {0}")]
    Internal(String),

    // === Warnings ===
    #[error("unknown register class `{0}` ignored")]
    UnknownRegisterClass(String),
    #[error("shader profile `{0}` in register annotation ignored")]
    RegisterProfileIgnored(String),
    #[error("attribute `{0}` ignored")]
    AttributeIgnored(String),
    #[error("implicit truncation from `{from}` to `{to}`")]
    ImplicitTruncation { from: String, to: String },
}

impl SemaError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SemaError::BadRegister(_) => ErrorCode::E1001,
            SemaError::BadPackOffset(_) => ErrorCode::E1002,
            SemaError::UnknownLayoutQualifier(_) => ErrorCode::E1003,
            SemaError::InvalidSemantic(_) => ErrorCode::E1004,
            SemaError::Redefinition(_) => ErrorCode::E1005,
            SemaError::Undeclared(_) => ErrorCode::E1006,
            SemaError::EntryPointNotFound(_) => ErrorCode::E1007,
            SemaError::PatchConstantNotFound(_) => ErrorCode::E1008,
            SemaError::PatchConstantAmbiguous(_) => ErrorCode::E1009,
            SemaError::InvalidAttribute { .. } => ErrorCode::E1010,
            SemaError::WrongStage { .. } => ErrorCode::E1011,
            SemaError::MisplacedStatement(_) => ErrorCode::E1012,
            SemaError::ReturnValueInVoid(_) | SemaError::MissingReturnValue(_) => ErrorCode::E1013,
            SemaError::UnknownMember { .. } => ErrorCode::E1014,
            SemaError::InvalidSwizzle(_) => ErrorCode::E1015,
            SemaError::NonConstantFlattenIndex(_) => ErrorCode::E1016,
            SemaError::FlattenUnsized(_) => ErrorCode::E1017,
            SemaError::CannotConvert { .. } => ErrorCode::E2001,
            SemaError::NoMatchingOverload(_) => ErrorCode::E2002,
            SemaError::AmbiguousOverload(_) => ErrorCode::E2003,
            SemaError::ArgumentCount { .. } => ErrorCode::E2004,
            SemaError::NotLValue(_) => ErrorCode::E2005,
            SemaError::InvalidOperands { .. } | SemaError::InvalidOperand { .. } => {
                ErrorCode::E2006
            }
            SemaError::IndexOutOfRange { .. } => ErrorCode::E2007,
            SemaError::NotIndexable(_) => ErrorCode::E2008,
            SemaError::ConstructorMismatch(_) => ErrorCode::E2009,
            SemaError::NonScalarCondition(_) => ErrorCode::E2010,
            SemaError::BadSwitchSelector(_) => ErrorCode::E2011,
            SemaError::ReadOnlyResource(_) => ErrorCode::E2012,
            SemaError::InnerUnsized(_) => ErrorCode::E2013,
            SemaError::LocationRange { .. } => ErrorCode::E3001,
            SemaError::BindingRange { .. } => ErrorCode::E3002,
            SemaError::SetRange { .. } => ErrorCode::E3003,
            SemaError::ComponentRange { .. } => ErrorCode::E3004,
            SemaError::MisalignedOffset { .. } => ErrorCode::E3005,
            SemaError::OverlappingOffset { .. } => ErrorCode::E3006,
            SemaError::PartialBlockLocations(_) => ErrorCode::E3007,
            SemaError::BindingConflict { .. } => ErrorCode::E3008,
            SemaError::InconsistentRedeclaration(_) => ErrorCode::E3009,
            SemaError::AlignNotPowerOfTwo(_) => ErrorCode::E3010,
            SemaError::PartialResourceWrite(_) => ErrorCode::E4001,
            SemaError::MultiIndirectSplit(_) => ErrorCode::E4002,
            SemaError::MultipleOutputPatches(_) => ErrorCode::E4003,
            SemaError::PatchFunctionOutput(_) => ErrorCode::E4004,
            SemaError::GatherCmpChannel(_) => ErrorCode::E4005,
            SemaError::Internal(_) => ErrorCode::E9001,
            SemaError::UnknownRegisterClass(_) => ErrorCode::W1001,
            SemaError::RegisterProfileIgnored(_) => ErrorCode::W1002,
            SemaError::AttributeIgnored(_) => ErrorCode::W1003,
            SemaError::ImplicitTruncation { .. } => ErrorCode::W1004,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.code().is_warning()
    }

    /// Render as a diagnostic labeled at `span`.
    pub fn into_diagnostic(self, span: Span) -> Diagnostic {
        let code = self.code();
        let base = if code.is_warning() {
            Diagnostic::warning(code)
        } else {
            Diagnostic::error(code)
        };
        base.with_message(self.to_string())
            .with_label(span, code.description())
    }
}
