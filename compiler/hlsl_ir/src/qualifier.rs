//! Qualifiers: storage class, builtin tags, interpolation, memory flags and
//! layout numbers attached to every type descriptor.

use bitflags::bitflags;
use std::fmt;

use crate::Name;

/// Pipeline stage the translation unit is compiled for.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Stage {
    Vertex,
    /// Hull shader.
    TessControl,
    /// Domain shader.
    TessEvaluation,
    Geometry,
    /// Pixel shader.
    #[default]
    Fragment,
    Compute,
}

/// Storage class of a variable or parameter.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum Storage {
    /// Function-local temporary.
    #[default]
    Temporary,
    /// Module-private (`static`) global.
    Global,
    /// Compile-time constant.
    Const,
    /// Stage input (interstage IO).
    Input,
    /// Stage output (interstage IO).
    Output,
    Uniform,
    Buffer,
    /// `groupshared` workgroup memory.
    Shared,
    /// Input parameter.
    In,
    /// Output parameter.
    Out,
    /// Input-output parameter.
    InOut,
    /// `const` input parameter.
    ConstReadOnly,
}

impl Storage {
    /// Parameter copied into the callee.
    pub fn is_param_input(self) -> bool {
        matches!(self, Storage::In | Storage::InOut | Storage::ConstReadOnly)
    }

    /// Parameter copied back to the caller.
    pub fn is_param_output(self) -> bool {
        matches!(self, Storage::Out | Storage::InOut)
    }

    /// Interstage or resource storage that must appear in the linkage list.
    pub fn is_linkage(self) -> bool {
        matches!(
            self,
            Storage::Input | Storage::Output | Storage::Uniform | Storage::Buffer | Storage::Shared
        )
    }

    /// Whether a value of this storage may be written.
    pub fn is_writable(self) -> bool {
        !matches!(
            self,
            Storage::Const | Storage::ConstReadOnly | Storage::Input | Storage::Uniform
        )
    }
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Storage::Temporary => "temp",
            Storage::Global => "global",
            Storage::Const => "const",
            Storage::Input => "in",
            Storage::Output => "out",
            Storage::Uniform => "uniform",
            Storage::Buffer => "buffer",
            Storage::Shared => "shared",
            Storage::In => "in param",
            Storage::Out => "out param",
            Storage::InOut => "inout param",
            Storage::ConstReadOnly => "const param",
        };
        f.write_str(s)
    }
}

/// Built-in semantic tag: a hardware-meaningful value bound by tag instead
/// of by location.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum BuiltIn {
    Position,
    FragCoord,
    FragDepth,
    /// `SV_TargetN` render target output.
    FragData(u8),
    FrontFacing,
    VertexIndex,
    InstanceIndex,
    PrimitiveId,
    InvocationId,
    SampleId,
    SampleMask,
    ClipDistance,
    CullDistance,
    Layer,
    ViewportIndex,
    TessLevelOuter,
    TessLevelInner,
    TessCoord,
    PatchVertices,
    GlobalInvocationId,
    LocalInvocationId,
    WorkGroupId,
    LocalInvocationIndex,
    FragStencilRef,
    /// Marker for an `InputPatch<T, N>` parameter.
    InputPatch,
    /// Marker for an `OutputPatch<T, N>` parameter.
    OutputPatch,
}

impl BuiltIn {
    /// Patch markers tag a parameter's type, they are not interstage values.
    pub fn is_patch_marker(self) -> bool {
        matches!(self, BuiltIn::InputPatch | BuiltIn::OutputPatch)
    }

    /// Per-patch values of the tessellation stages.
    pub fn is_per_patch(self) -> bool {
        matches!(self, BuiltIn::TessLevelOuter | BuiltIn::TessLevelInner)
    }
}

/// Interpolation mode of an interstage value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Interpolation {
    #[default]
    Default,
    Smooth,
    Flat,
    NoPerspective,
}

bitflags! {
    /// Auxiliary interstage qualifiers.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct AuxFlags: u8 {
        const CENTROID = 1 << 0;
        const SAMPLE = 1 << 1;
        const PATCH = 1 << 2;
        const PRECISE = 1 << 3;
        const INVARIANT = 1 << 4;
    }
}

bitflags! {
    /// Memory access qualifiers on buffers and images.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct MemoryFlags: u8 {
        const COHERENT = 1 << 0;
        const VOLATILE = 1 << 1;
        const RESTRICT = 1 << 2;
        const READONLY = 1 << 3;
        const WRITEONLY = 1 << 4;
    }
}

/// Matrix storage order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum MatrixLayout {
    #[default]
    None,
    RowMajor,
    ColumnMajor,
}

/// Block packing rule.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Packing {
    #[default]
    None,
    Std140,
    Std430,
    Packed,
}

/// HLSL register class from a `register(xN)` annotation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum RegisterClass {
    /// `t`: shader resource view.
    Texture,
    /// `s`: sampler.
    Sampler,
    /// `b`: constant buffer.
    ConstantBuffer,
    /// `u`: unordered access view.
    Uav,
    /// `c`: constant register offset.
    Constant,
}

impl RegisterClass {
    /// Parse the leading register character.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            't' => Some(RegisterClass::Texture),
            's' => Some(RegisterClass::Sampler),
            'b' => Some(RegisterClass::ConstantBuffer),
            'u' => Some(RegisterClass::Uav),
            'c' => Some(RegisterClass::Constant),
            _ => None,
        }
    }
}

/// Explicit layout numbers and rules.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Layout {
    pub location: Option<u32>,
    pub component: Option<u32>,
    pub binding: Option<u32>,
    pub set: Option<u32>,
    pub offset: Option<u32>,
    pub align: Option<u32>,
    pub matrix: MatrixLayout,
    pub packing: Packing,
    pub register: Option<RegisterClass>,
    pub push_constant: bool,
}

/// Full qualifier set carried by a type descriptor.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Qualifier {
    pub storage: Storage,
    pub builtin: Option<BuiltIn>,
    pub interpolation: Interpolation,
    pub aux: AuxFlags,
    pub memory: MemoryFlags,
    pub layout: Layout,
    /// User semantic name (`TEXCOORD0`), kept for reflection.
    pub semantic: Option<Name>,
}

impl Qualifier {
    /// Qualifier with only a storage class set.
    pub fn with_storage(storage: Storage) -> Self {
        Qualifier {
            storage,
            ..Qualifier::default()
        }
    }

    /// Builtin tag, excluding the patch-parameter markers.
    pub fn interstage_builtin(&self) -> Option<BuiltIn> {
        self.builtin.filter(|b| !b.is_patch_marker())
    }

    /// Drop everything that only makes sense on interstage IO.
    pub fn clear_interstage(&mut self) {
        self.builtin = None;
        self.interpolation = Interpolation::Default;
        self.aux.remove(AuxFlags::CENTROID | AuxFlags::SAMPLE | AuxFlags::PATCH);
        self.layout.location = None;
        self.layout.component = None;
    }

    /// Drop everything that only makes sense on uniform/buffer members.
    pub fn clear_uniform_layout(&mut self) {
        self.layout.offset = None;
        self.layout.align = None;
        self.layout.matrix = MatrixLayout::None;
        self.layout.packing = Packing::None;
        self.layout.binding = None;
        self.layout.set = None;
        self.layout.register = None;
        self.layout.push_constant = false;
        self.memory = MemoryFlags::empty();
    }

    /// Merge `src` into `self`, keeping explicit numbers already present.
    pub fn merge_from(&mut self, src: &Qualifier) {
        if self.storage == Storage::Temporary {
            self.storage = src.storage;
        }
        if self.builtin.is_none() {
            self.builtin = src.builtin;
        }
        if self.interpolation == Interpolation::Default {
            self.interpolation = src.interpolation;
        }
        self.aux |= src.aux;
        self.memory |= src.memory;
        if self.semantic.is_none() {
            self.semantic = src.semantic;
        }
        let l = &mut self.layout;
        let s = &src.layout;
        l.location = l.location.or(s.location);
        l.component = l.component.or(s.component);
        l.binding = l.binding.or(s.binding);
        l.set = l.set.or(s.set);
        l.offset = l.offset.or(s.offset);
        l.align = l.align.or(s.align);
        l.register = l.register.or(s.register);
        if l.matrix == MatrixLayout::None {
            l.matrix = s.matrix;
        }
        if l.packing == Packing::None {
            l.packing = s.packing;
        }
        l.push_constant |= s.push_constant;
    }
}

#[cfg(test)]
mod tests;
