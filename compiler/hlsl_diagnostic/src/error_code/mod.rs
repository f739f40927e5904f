//! Structured error codes for every analyzer diagnostic.
//!
//! The first letter and digit identify the phase:
//! - E1xxx: structural and annotation-syntax errors
//! - E2xxx: type errors
//! - E3xxx: binding and layout errors
//! - E4xxx: unimplemented features
//! - E9xxx: internal errors
//! - W1xxx: warnings (never counted as errors)

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ErrorCode {
    // Structural / annotation errors (E1xxx)
    /// Malformed register annotation
    E1001,
    /// Malformed packoffset annotation
    E1002,
    /// Unknown layout qualifier
    E1003,
    /// Invalid semantic
    E1004,
    /// Redefinition
    E1005,
    /// Undeclared identifier
    E1006,
    /// Entry point not found
    E1007,
    /// Patch constant function not found
    E1008,
    /// Multiple patch constant function candidates
    E1009,
    /// Invalid attribute
    E1010,
    /// Operation not valid in this stage
    E1011,
    /// Statement outside its construct
    E1012,
    /// Missing or unexpected return value
    E1013,
    /// Unknown member
    E1014,
    /// Invalid swizzle
    E1015,
    /// Non-constant index into flattened aggregate
    E1016,
    /// Flattening an implicitly-sized array
    E1017,

    // Type errors (E2xxx)
    /// Cannot convert
    E2001,
    /// No matching overload
    E2002,
    /// Ambiguous overload
    E2003,
    /// Wrong number of arguments
    E2004,
    /// Not an l-value
    E2005,
    /// Invalid operand
    E2006,
    /// Index out of range
    E2007,
    /// Not indexable
    E2008,
    /// Constructor argument mismatch
    E2009,
    /// Condition is not a scalar
    E2010,
    /// Switch selector is not a scalar integer
    E2011,
    /// Read-only resource used as l-value
    E2012,
    /// Only the outermost array dimension may be unsized
    E2013,

    // Binding / layout errors (E3xxx)
    /// Location out of range
    E3001,
    /// Binding out of range
    E3002,
    /// Set out of range
    E3003,
    /// Component out of range
    E3004,
    /// Offset is not aligned
    E3005,
    /// Offset overlaps previous member
    E3006,
    /// Block member locations must be all or none
    E3007,
    /// Binding already in use
    E3008,
    /// Inconsistent layout on redeclaration
    E3009,
    /// Alignment is not a power of two
    E3010,

    // Unimplemented features (E4xxx)
    /// Partial-component write through a resource element
    E4001,
    /// More than one array indirection into split builtin
    E4002,
    /// Multiple output patch parameters
    E4003,
    /// Output parameter on patch constant function
    E4004,
    /// Comparison gather on a non-red channel
    E4005,

    // Internal (E9xxx)
    /// Internal analyzer error
    E9001,
    /// Too many errors
    E9002,

    // Warnings (W1xxx)
    /// Unknown register class ignored
    W1001,
    /// Shader profile in register annotation ignored
    W1002,
    /// Unrecognized attribute ignored
    W1003,
    /// Implicit truncation of vector type
    W1004,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E1007,
        ErrorCode::E1008,
        ErrorCode::E1009,
        ErrorCode::E1010,
        ErrorCode::E1011,
        ErrorCode::E1012,
        ErrorCode::E1013,
        ErrorCode::E1014,
        ErrorCode::E1015,
        ErrorCode::E1016,
        ErrorCode::E1017,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E2009,
        ErrorCode::E2010,
        ErrorCode::E2011,
        ErrorCode::E2012,
        ErrorCode::E2013,
        ErrorCode::E3001,
        ErrorCode::E3002,
        ErrorCode::E3003,
        ErrorCode::E3004,
        ErrorCode::E3005,
        ErrorCode::E3006,
        ErrorCode::E3007,
        ErrorCode::E3008,
        ErrorCode::E3009,
        ErrorCode::E3010,
        ErrorCode::E4001,
        ErrorCode::E4002,
        ErrorCode::E4003,
        ErrorCode::E4004,
        ErrorCode::E4005,
        ErrorCode::E9001,
        ErrorCode::E9002,
        ErrorCode::W1001,
        ErrorCode::W1002,
        ErrorCode::W1003,
        ErrorCode::W1004,
    ];

    /// The code as written in output (e.g. `"E2002"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E1008 => "E1008",
            ErrorCode::E1009 => "E1009",
            ErrorCode::E1010 => "E1010",
            ErrorCode::E1011 => "E1011",
            ErrorCode::E1012 => "E1012",
            ErrorCode::E1013 => "E1013",
            ErrorCode::E1014 => "E1014",
            ErrorCode::E1015 => "E1015",
            ErrorCode::E1016 => "E1016",
            ErrorCode::E1017 => "E1017",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            ErrorCode::E2011 => "E2011",
            ErrorCode::E2012 => "E2012",
            ErrorCode::E2013 => "E2013",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E3005 => "E3005",
            ErrorCode::E3006 => "E3006",
            ErrorCode::E3007 => "E3007",
            ErrorCode::E3008 => "E3008",
            ErrorCode::E3009 => "E3009",
            ErrorCode::E3010 => "E3010",
            ErrorCode::E4001 => "E4001",
            ErrorCode::E4002 => "E4002",
            ErrorCode::E4003 => "E4003",
            ErrorCode::E4004 => "E4004",
            ErrorCode::E4005 => "E4005",
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
            ErrorCode::W1001 => "W1001",
            ErrorCode::W1002 => "W1002",
            ErrorCode::W1003 => "W1003",
            ErrorCode::W1004 => "W1004",
        }
    }

    /// One-line description for `--explain` style listings.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "malformed register annotation",
            ErrorCode::E1002 => "malformed packoffset annotation",
            ErrorCode::E1003 => "unknown layout qualifier",
            ErrorCode::E1004 => "invalid semantic",
            ErrorCode::E1005 => "redefinition",
            ErrorCode::E1006 => "undeclared identifier",
            ErrorCode::E1007 => "entry point not found",
            ErrorCode::E1008 => "patch constant function not found",
            ErrorCode::E1009 => "multiple patch constant function candidates",
            ErrorCode::E1010 => "invalid attribute",
            ErrorCode::E1011 => "operation not valid in this stage",
            ErrorCode::E1012 => "statement outside its construct",
            ErrorCode::E1013 => "missing or unexpected return value",
            ErrorCode::E1014 => "unknown member",
            ErrorCode::E1015 => "invalid swizzle",
            ErrorCode::E1016 => "non-constant index into flattened aggregate",
            ErrorCode::E1017 => "flattening an implicitly-sized array",
            ErrorCode::E2001 => "cannot convert",
            ErrorCode::E2002 => "no matching overload",
            ErrorCode::E2003 => "ambiguous overload",
            ErrorCode::E2004 => "wrong number of arguments",
            ErrorCode::E2005 => "not an l-value",
            ErrorCode::E2006 => "invalid operand",
            ErrorCode::E2007 => "index out of range",
            ErrorCode::E2008 => "not indexable",
            ErrorCode::E2009 => "constructor argument mismatch",
            ErrorCode::E2010 => "condition is not a scalar",
            ErrorCode::E2011 => "switch selector is not a scalar integer",
            ErrorCode::E2012 => "read-only resource used as l-value",
            ErrorCode::E2013 => "only the outermost array dimension may be unsized",
            ErrorCode::E3001 => "location out of range",
            ErrorCode::E3002 => "binding out of range",
            ErrorCode::E3003 => "set out of range",
            ErrorCode::E3004 => "component out of range",
            ErrorCode::E3005 => "offset is not aligned",
            ErrorCode::E3006 => "offset overlaps previous member",
            ErrorCode::E3007 => "block member locations must be all or none",
            ErrorCode::E3008 => "binding already in use",
            ErrorCode::E3009 => "inconsistent layout on redeclaration",
            ErrorCode::E3010 => "alignment is not a power of two",
            ErrorCode::E4001 => "partial-component write through a resource element",
            ErrorCode::E4002 => "more than one array indirection into split builtin",
            ErrorCode::E4003 => "multiple output patch parameters",
            ErrorCode::E4004 => "output parameter on patch constant function",
            ErrorCode::E4005 => "comparison gather on a non-red channel",
            ErrorCode::E9001 => "internal analyzer error",
            ErrorCode::E9002 => "too many errors",
            ErrorCode::W1001 => "unknown register class ignored",
            ErrorCode::W1002 => "shader profile in register annotation ignored",
            ErrorCode::W1003 => "unrecognized attribute ignored",
            ErrorCode::W1004 => "implicit truncation of vector type",
        }
    }

    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }

    pub fn is_structural_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    pub fn is_type_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    pub fn is_layout_error(&self) -> bool {
        self.as_str().starts_with("E3")
    }

    pub fn is_unimplemented(&self) -> bool {
        self.as_str().starts_with("E4")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests;
