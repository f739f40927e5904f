//! Type descriptors.
//!
//! A [`Type`] is a plain value: basic kind, shape, arrayness, optional
//! struct member list handle, optional resource descriptor, and qualifiers.
//! Struct member lists live in the [`StructRegistry`](crate::StructRegistry)
//! and are referenced by [`StructId`], so types stay cheap to clone and
//! compare.

use smallvec::SmallVec;
use std::fmt;

use crate::{Qualifier, Storage, StringInterner, StructId, StructRegistry};

/// Basic kind of a type descriptor.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum BasicType {
    Void,
    Bool,
    Int,
    Uint,
    Int64,
    Uint64,
    Float,
    Double,
    /// Opaque resource handle; details in [`Sampler`].
    Sampler,
    Struct,
    /// Interface block (`cbuffer`, `tbuffer`, structured buffers).
    Block,
    /// Placeholder for expressions that failed to type.
    Error,
}

impl BasicType {
    /// Position on the implicit promotion chain
    /// `bool < int < uint < int64 < uint64 < float < double`.
    pub fn promotion_rank(self) -> Option<u8> {
        match self {
            BasicType::Bool => Some(0),
            BasicType::Int => Some(1),
            BasicType::Uint => Some(2),
            BasicType::Int64 => Some(3),
            BasicType::Uint64 => Some(4),
            BasicType::Float => Some(5),
            BasicType::Double => Some(6),
            _ => None,
        }
    }

    /// Linearized domain key used to rank conversions by distance.
    ///
    /// Floating vs integer dominates, then width, then signedness.
    pub fn linear_key(self) -> i32 {
        match self {
            BasicType::Bool => 1,
            BasicType::Int => 10,
            BasicType::Uint => 11,
            BasicType::Int64 => 20,
            BasicType::Uint64 => 21,
            BasicType::Float => 100,
            BasicType::Double => 110,
            _ => 0,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.promotion_rank().is_some() && self != BasicType::Bool
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicType::Int | BasicType::Uint | BasicType::Int64 | BasicType::Uint64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicType::Float | BasicType::Double)
    }

    pub fn is_64bit(self) -> bool {
        matches!(
            self,
            BasicType::Double | BasicType::Int64 | BasicType::Uint64
        )
    }

    /// Size in bytes of one scalar component.
    pub fn scalar_size(self) -> u32 {
        if self.is_64bit() {
            8
        } else {
            4
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BasicType::Void => "void",
            BasicType::Bool => "bool",
            BasicType::Int => "int",
            BasicType::Uint => "uint",
            BasicType::Int64 => "int64_t",
            BasicType::Uint64 => "uint64_t",
            BasicType::Float => "float",
            BasicType::Double => "double",
            BasicType::Sampler => "resource",
            BasicType::Struct => "struct",
            BasicType::Block => "block",
            BasicType::Error => "<error>",
        };
        f.write_str(s)
    }
}

/// Scalar, vector or matrix shape.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Shape {
    #[default]
    Scalar,
    Vector(u8),
    Matrix { cols: u8, rows: u8 },
}

/// One array dimension.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ArrayDim {
    Sized(u32),
    /// Implicitly or runtime sized; only legal as the outermost dimension.
    Unsized,
}

impl ArrayDim {
    pub fn size(self) -> Option<u32> {
        match self {
            ArrayDim::Sized(n) => Some(n),
            ArrayDim::Unsized => None,
        }
    }
}

/// Array dimensions, outermost first.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ArraySizes(SmallVec<[ArrayDim; 2]>);

impl ArraySizes {
    pub fn new() -> Self {
        ArraySizes(SmallVec::new())
    }

    pub fn from_dims(dims: &[ArrayDim]) -> Self {
        ArraySizes(dims.iter().copied().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn outer(&self) -> Option<ArrayDim> {
        self.0.first().copied()
    }

    pub fn dims(&self) -> &[ArrayDim] {
        &self.0
    }

    /// Whether any dimension other than the outermost is unsized.
    pub fn has_inner_unsized(&self) -> bool {
        self.0.iter().skip(1).any(|d| *d == ArrayDim::Unsized)
    }

    /// Product of all sized dimensions, `None` if any is unsized.
    pub fn total_elements(&self) -> Option<u32> {
        self.0
            .iter()
            .try_fold(1u32, |acc, d| d.size().map(|n| acc.saturating_mul(n)))
    }

    /// Add a new outermost dimension.
    pub fn push_outer(&mut self, dim: ArrayDim) {
        self.0.insert(0, dim);
    }

    /// Replace the outermost dimension (used to fix implicit sizes).
    pub fn set_outer(&mut self, dim: ArrayDim) {
        if let Some(first) = self.0.first_mut() {
            *first = dim;
        }
    }

    /// Drop the outermost dimension.
    #[must_use]
    pub fn dereference(&self) -> ArraySizes {
        ArraySizes(self.0.iter().skip(1).copied().collect())
    }
}

/// Resource family of an opaque handle.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ResourceKind {
    /// Read-only texture (`Texture2D`, `Buffer`).
    Texture,
    /// Standalone sampler state (`SamplerState`, `SamplerComparisonState`).
    Sampler,
    /// Texture and sampler combined into one object.
    Combined,
    /// Read-write image (`RWTexture2D`, `RWBuffer`).
    Image,
}

/// Resource dimensionality.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Dim {
    D1,
    D2,
    D3,
    Cube,
    Buffer,
}

impl Dim {
    /// Number of coordinate components, not counting the array layer.
    pub fn coord_components(self) -> u8 {
        match self {
            Dim::D1 | Dim::Buffer => 1,
            Dim::D2 => 2,
            Dim::D3 | Dim::Cube => 3,
        }
    }
}

/// Opaque resource descriptor.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Sampler {
    pub kind: ResourceKind,
    pub dim: Dim,
    pub arrayed: bool,
    /// Comparison sampler or shadow texture.
    pub shadow: bool,
    pub ms: bool,
    /// Component type returned by a read.
    pub ret: BasicType,
    /// Declared component count of a read (`Texture2D<float2>` is 2).
    pub ret_size: u8,
}

impl Sampler {
    pub fn texture(dim: Dim, ret: BasicType, ret_size: u8) -> Self {
        Sampler {
            kind: ResourceKind::Texture,
            dim,
            arrayed: false,
            shadow: false,
            ms: false,
            ret,
            ret_size,
        }
    }

    pub fn image(dim: Dim, ret: BasicType, ret_size: u8) -> Self {
        Sampler {
            kind: ResourceKind::Image,
            ..Sampler::texture(dim, ret, ret_size)
        }
    }

    pub fn sampler_state(comparison: bool) -> Self {
        Sampler {
            kind: ResourceKind::Sampler,
            shadow: comparison,
            ..Sampler::texture(Dim::D2, BasicType::Float, 4)
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == ResourceKind::Image
    }

    pub fn is_texture(&self) -> bool {
        self.kind == ResourceKind::Texture
    }

    pub fn is_pure_sampler(&self) -> bool {
        self.kind == ResourceKind::Sampler
    }

    /// Coordinate component count including the array layer.
    pub fn coord_size(&self) -> u8 {
        self.dim.coord_components() + u8::from(self.arrayed)
    }

    /// Same resource except for the declared return components.
    pub fn similar(&self, other: &Sampler) -> bool {
        Sampler {
            ret_size: other.ret_size,
            ..*self
        } == *other
    }

    /// Combine this texture with a sampler state into one object.
    #[must_use]
    pub fn combined_with(&self, sampler: &Sampler) -> Sampler {
        Sampler {
            kind: ResourceKind::Combined,
            shadow: sampler.shadow,
            ..*self
        }
    }
}

/// Primitive topology for geometry and tessellation stages.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Topology {
    Points,
    Lines,
    LinesAdjacency,
    Triangles,
    TrianglesAdjacency,
    LineStrip,
    TriangleStrip,
    Quads,
    Isolines,
}

impl Topology {
    /// Vertices per input primitive for geometry input arrays.
    pub fn vertex_count(self) -> u32 {
        match self {
            Topology::Points => 1,
            Topology::Lines | Topology::LineStrip | Topology::Isolines => 2,
            Topology::Triangles | Topology::TriangleStrip => 3,
            Topology::LinesAdjacency | Topology::Quads => 4,
            Topology::TrianglesAdjacency => 6,
        }
    }
}

/// A full type descriptor.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Type {
    pub basic: BasicType,
    pub shape: Shape,
    pub arrays: ArraySizes,
    /// Member list for struct and block types.
    pub fields: Option<StructId>,
    pub sampler: Option<Sampler>,
    /// Geometry stream-output object (`TriangleStream<T>`).
    pub stream: Option<Topology>,
    pub qualifier: Qualifier,
}

impl Type {
    fn plain(basic: BasicType, shape: Shape) -> Self {
        Type {
            basic,
            shape,
            arrays: ArraySizes::new(),
            fields: None,
            sampler: None,
            stream: None,
            qualifier: Qualifier::default(),
        }
    }

    pub fn void() -> Self {
        Self::plain(BasicType::Void, Shape::Scalar)
    }

    pub fn error() -> Self {
        Self::plain(BasicType::Error, Shape::Scalar)
    }

    pub fn scalar(basic: BasicType) -> Self {
        Self::plain(basic, Shape::Scalar)
    }

    /// Vector type; a one-component vector is a scalar.
    pub fn vector(basic: BasicType, size: u8) -> Self {
        if size <= 1 {
            Self::scalar(basic)
        } else {
            Self::plain(basic, Shape::Vector(size))
        }
    }

    /// Matrix of `rows` source rows, each `cols` wide (`float2x3` is
    /// `matrix(Float, 3, 2)`).
    pub fn matrix(basic: BasicType, cols: u8, rows: u8) -> Self {
        Self::plain(basic, Shape::Matrix { cols, rows })
    }

    pub fn structure(id: StructId) -> Self {
        Type {
            fields: Some(id),
            ..Self::plain(BasicType::Struct, Shape::Scalar)
        }
    }

    pub fn block(id: StructId, storage: Storage) -> Self {
        Type {
            fields: Some(id),
            qualifier: Qualifier::with_storage(storage),
            ..Self::plain(BasicType::Block, Shape::Scalar)
        }
    }

    pub fn resource(sampler: Sampler) -> Self {
        Type {
            sampler: Some(sampler),
            ..Self::plain(BasicType::Sampler, Shape::Scalar)
        }
    }

    #[must_use]
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.qualifier.storage = storage;
        self
    }

    #[must_use]
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    #[must_use]
    pub fn with_array(mut self, dim: ArrayDim) -> Self {
        self.arrays.push_outer(dim);
        self
    }

    pub fn is_void(&self) -> bool {
        self.basic == BasicType::Void && self.arrays.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.basic == BasicType::Error
    }

    pub fn is_array(&self) -> bool {
        !self.arrays.is_empty()
    }

    pub fn is_unsized_array(&self) -> bool {
        self.arrays.outer() == Some(ArrayDim::Unsized)
    }

    pub fn is_struct(&self) -> bool {
        self.fields.is_some()
    }

    pub fn is_opaque(&self) -> bool {
        self.basic == BasicType::Sampler
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_array() && !self.is_struct() && self.shape == Shape::Scalar
    }

    pub fn is_vector(&self) -> bool {
        !self.is_array() && matches!(self.shape, Shape::Vector(_))
    }

    pub fn is_matrix(&self) -> bool {
        !self.is_array() && matches!(self.shape, Shape::Matrix { .. })
    }

    /// Numeric or bool scalar/vector/matrix, not an aggregate.
    pub fn is_arithmetic(&self) -> bool {
        !self.is_array() && !self.is_struct() && self.basic.promotion_rank().is_some()
    }

    /// Component count of a scalar (1) or vector; 0 for matrices.
    pub fn vector_size(&self) -> u8 {
        match self.shape {
            Shape::Scalar => 1,
            Shape::Vector(n) => n,
            Shape::Matrix { .. } => 0,
        }
    }

    pub fn matrix_cols(&self) -> u8 {
        match self.shape {
            Shape::Matrix { cols, .. } => cols,
            _ => 0,
        }
    }

    pub fn matrix_rows(&self) -> u8 {
        match self.shape {
            Shape::Matrix { rows, .. } => rows,
            _ => 0,
        }
    }

    /// Number of scalar components in a non-aggregate value.
    pub fn component_count(&self) -> u32 {
        match self.shape {
            Shape::Scalar => 1,
            Shape::Vector(n) => u32::from(n),
            Shape::Matrix { cols, rows } => u32::from(cols) * u32::from(rows),
        }
    }

    /// Type of one element of the outermost array dimension.
    #[must_use]
    pub fn element(&self) -> Type {
        Type {
            arrays: self.arrays.dereference(),
            ..self.clone()
        }
    }

    /// Type of one component of a vector (a scalar) or matrix (a row).
    #[must_use]
    pub fn component(&self) -> Type {
        let shape = match self.shape {
            Shape::Matrix { cols, .. } => {
                if cols <= 1 {
                    Shape::Scalar
                } else {
                    Shape::Vector(cols)
                }
            }
            _ => Shape::Scalar,
        };
        Type {
            shape,
            arrays: ArraySizes::new(),
            ..self.clone()
        }
    }

    /// Same basic kind, shape and arrayness, ignoring qualifiers.
    pub fn same_kind(&self, other: &Type) -> bool {
        self.basic == other.basic
            && self.shape == other.shape
            && self.arrays == other.arrays
            && self.fields == other.fields
            && self.sampler == other.sampler
            && self.stream == other.stream
    }

    /// Same type with a default qualifier except the storage class.
    #[must_use]
    pub fn unqualified(&self) -> Type {
        Type {
            qualifier: Qualifier::with_storage(self.qualifier.storage),
            ..self.clone()
        }
    }

    /// Render for diagnostics.
    pub fn display<'a>(
        &'a self,
        structs: &'a StructRegistry,
        interner: &'a StringInterner,
    ) -> TypeDisplay<'a> {
        TypeDisplay {
            ty: self,
            structs,
            interner,
        }
    }
}

/// Diagnostic rendering of a [`Type`].
pub struct TypeDisplay<'a> {
    ty: &'a Type,
    structs: &'a StructRegistry,
    interner: &'a StringInterner,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.ty;
        if let Some(id) = ty.fields {
            match self.structs.get(id).name {
                Some(name) => write!(f, "{}", self.interner.lookup(name))?,
                None => write!(f, "{}", ty.basic)?,
            }
        } else if let Some(s) = ty.sampler {
            write!(f, "{:?}{:?}<{}{}>", s.kind, s.dim, s.ret, s.ret_size)?;
        } else {
            match ty.shape {
                Shape::Scalar => write!(f, "{}", ty.basic)?,
                Shape::Vector(n) => write!(f, "{}{n}", ty.basic)?,
                Shape::Matrix { cols, rows } => write!(f, "{}{rows}x{cols}", ty.basic)?,
            }
        }
        for dim in ty.arrays.dims() {
            match dim {
                ArrayDim::Sized(n) => write!(f, "[{n}]")?,
                ArrayDim::Unsized => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
