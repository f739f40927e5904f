//! Resource binding and layout resolution.
//!
//! Annotation handlers (`register`, `packoffset`, `layout(..)`) write the
//! numbers they decode into a [`Qualifier`]; declaration handlers then call
//! the block fixers to assign member offsets and locations and to claim
//! bindings. Every problem is reported and the declaration continues with
//! whatever numbers were valid.

use hlsl_ir::{
    Layout, MatrixLayout, Member, Packing, Qualifier, RegisterClass, Shape, Span,
    StructRegistry, SymbolId, Type,
};
use rustc_hash::FxHashMap;

use crate::{SemaContext, SemaError};

pub const MAX_LOCATION: u32 = 4095;
pub const MAX_BINDING: u32 = 0xFFFF;
pub const MAX_SET: u32 = 63;
pub const MAX_COMPONENT: u32 = 3;

/// Size of one constant register: a four-component 32-bit vector.
const REGISTER_BYTES: u32 = 16;

/// Bindings claimed so far, per (register class, set, binding).
#[derive(Clone, Debug, Default)]
pub(crate) struct BindingTracker {
    claimed: FxHashMap<(Option<RegisterClass>, u32, u32), SymbolId>,
}

impl BindingTracker {
    /// Claim a binding for `symbol`; fails with the previous owner.
    pub(crate) fn claim(&mut self, layout: &Layout, symbol: SymbolId) -> Result<(), SymbolId> {
        let Some(binding) = layout.binding else {
            return Ok(());
        };
        let key = (layout.register, layout.set.unwrap_or(0), binding);
        match self.claimed.get(&key) {
            Some(&owner) if owner != symbol => Err(owner),
            _ => {
                self.claimed.insert(key, symbol);
                Ok(())
            }
        }
    }
}

fn round_up(value: u32, align: u32) -> u32 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

/// Alignment and size of `ty` inside a block with the given packing.
///
/// Scalars align to their size and three- and four-component vectors to
/// four components. Under std140, arrays, matrices and structs round their
/// alignment up to a full register.
pub fn base_alignment(
    structs: &StructRegistry,
    ty: &Type,
    packing: Packing,
    row_major: bool,
) -> (u32, u32) {
    let std140 = packing == Packing::Std140;
    if ty.is_array() {
        let (elem_align, elem_size) = base_alignment(structs, &ty.element(), packing, row_major);
        let align = if std140 {
            elem_align.max(REGISTER_BYTES)
        } else {
            elem_align
        };
        let stride = round_up(elem_size, align);
        let count = ty.arrays.outer().and_then(|d| d.size()).unwrap_or(1);
        return (align, stride * count);
    }
    if let Some(id) = ty.fields {
        let mut offset = 0;
        let mut max_align = 0;
        for member in structs.members(id) {
            let member_row_major = match member.ty.qualifier.layout.matrix {
                MatrixLayout::RowMajor => true,
                MatrixLayout::ColumnMajor => false,
                MatrixLayout::None => row_major,
            };
            let (align, size) = base_alignment(structs, &member.ty, packing, member_row_major);
            offset = round_up(offset, align) + size;
            max_align = max_align.max(align);
        }
        if std140 {
            max_align = max_align.max(REGISTER_BYTES);
        }
        return (max_align, round_up(offset, max_align));
    }
    let scalar = ty.basic.scalar_size();
    match ty.shape {
        Shape::Scalar => (scalar, scalar),
        Shape::Vector(n) => {
            let align = if n == 2 { 2 * scalar } else { 4 * scalar };
            (align, u32::from(n) * scalar)
        }
        Shape::Matrix { cols, rows } => {
            let (vectors, length) = if row_major { (rows, cols) } else { (cols, rows) };
            let column = Type::vector(ty.basic, length);
            let (mut align, size) = base_alignment(structs, &column, packing, false);
            if std140 {
                align = align.max(REGISTER_BYTES);
            }
            (align, round_up(size, align) * u32::from(vectors))
        }
    }
}

/// Number of consecutive interstage locations `ty` occupies.
pub fn io_location_size(structs: &StructRegistry, ty: &Type) -> u32 {
    if ty.is_array() {
        let count = ty.arrays.outer().and_then(|d| d.size()).unwrap_or(1);
        return count * io_location_size(structs, &ty.element());
    }
    if let Some(id) = ty.fields {
        return structs
            .members(id)
            .iter()
            .map(|m| io_location_size(structs, &m.ty))
            .sum();
    }
    let wide = |n: u8| u32::from(ty.basic.is_64bit() && n > 2) + 1;
    match ty.shape {
        Shape::Scalar => 1,
        Shape::Vector(n) => wide(n),
        // One location per source row.
        Shape::Matrix { cols, rows } => u32::from(rows) * wide(cols),
    }
}

/// Parse the decimal suffix of an annotation like `t3` or `space1`.
fn parse_index(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl SemaContext {
    fn check_range(&mut self, span: Span, value: u32, max: u32, make: fn(u32, u32) -> SemaError) -> bool {
        if value > max {
            let _ = self.error(span, make(value, max));
            return false;
        }
        true
    }

    fn register_shift(&self, class: RegisterClass) -> u32 {
        match class {
            RegisterClass::Texture => self.options.shift_texture_binding,
            RegisterClass::Sampler => self.options.shift_sampler_binding,
            RegisterClass::ConstantBuffer => self.options.shift_cbuffer_binding,
            RegisterClass::Uav => self.options.shift_uav_binding,
            RegisterClass::Constant => 0,
        }
    }

    /// `register(desc[sub], space)` with an optional shader profile.
    ///
    /// `t`/`s`/`b`/`u` registers set the binding (plus the per-class shift)
    /// and the space sets the descriptor set; `c` registers set a byte
    /// offset into the global uniform block.
    pub fn handle_register(
        &mut self,
        span: Span,
        qualifier: &mut Qualifier,
        profile: Option<&str>,
        desc: &str,
        sub_component: u32,
        space: Option<&str>,
    ) {
        if let Some(profile) = profile.filter(|p| !p.is_empty()) {
            self.warn(span, SemaError::RegisterProfileIgnored(profile.to_string()));
        }

        let mut chars = desc.chars();
        let Some(class_char) = chars.next() else {
            let _ = self.error(span, SemaError::BadRegister(desc.to_string()));
            return;
        };
        let Some(number) = parse_index(chars.as_str()) else {
            let _ = self.error(span, SemaError::BadRegister(desc.to_string()));
            return;
        };
        let Some(number) = number.checked_add(sub_component) else {
            let _ = self.error(span, SemaError::BadRegister(desc.to_string()));
            return;
        };

        let Some(class) = RegisterClass::from_char(class_char) else {
            self.warn(span, SemaError::UnknownRegisterClass(desc.to_string()));
            return;
        };

        if class == RegisterClass::Constant {
            match number.checked_mul(REGISTER_BYTES) {
                Some(offset) => qualifier.layout.offset = Some(offset),
                None => {
                    let _ = self.error(span, SemaError::BadRegister(desc.to_string()));
                }
            }
            return;
        }

        // An overflowing shift saturates so the range check reports it.
        let binding = number.saturating_add(self.register_shift(class));
        if self.check_range(span, binding, MAX_BINDING, |value, max| SemaError::BindingRange {
            value,
            max,
        }) {
            qualifier.layout.binding = Some(binding);
            qualifier.layout.register = Some(class);
        }

        if let Some(space) = space {
            let set = space
                .strip_prefix("space")
                .or_else(|| space.strip_prefix("SPACE"))
                .and_then(parse_index);
            match set {
                Some(set) => {
                    if self.check_range(span, set, MAX_SET, |value, max| SemaError::SetRange {
                        value,
                        max,
                    }) {
                        qualifier.layout.set = Some(set);
                    }
                }
                None => {
                    let _ = self.error(span, SemaError::BadRegister(space.to_string()));
                }
            }
        }
    }

    /// `packoffset(cN[.comp])`: byte offset `16 * N + 4 * comp`.
    pub fn handle_pack_offset(
        &mut self,
        span: Span,
        qualifier: &mut Qualifier,
        location: &str,
        component: Option<&str>,
    ) {
        let register = location
            .strip_prefix('c')
            .or_else(|| location.strip_prefix('C'))
            .and_then(parse_index);
        let Some(register) = register else {
            let _ = self.error(span, SemaError::BadPackOffset(location.to_string()));
            return;
        };
        let component = match component {
            None => 0,
            Some(c) => match c {
                "x" | "r" => 0,
                "y" | "g" => 1,
                "z" | "b" => 2,
                "w" | "a" => 3,
                _ => {
                    let _ = self.error(span, SemaError::BadPackOffset(format!("{location}.{c}")));
                    return;
                }
            },
        };
        let offset = register
            .checked_mul(REGISTER_BYTES)
            .and_then(|base| base.checked_add(component * 4));
        match offset {
            Some(offset) => qualifier.layout.offset = Some(offset),
            None => {
                let _ = self.error(span, SemaError::BadPackOffset(location.to_string()));
            }
        }
    }

    /// Generic `layout(id)` / `layout(id = value)` qualifier.
    pub fn handle_layout_id(
        &mut self,
        span: Span,
        qualifier: &mut Qualifier,
        id: &str,
        value: Option<i64>,
    ) {
        let id = id.to_ascii_lowercase();
        let layout = &mut qualifier.layout;
        match (id.as_str(), value) {
            ("row_major", None) => layout.matrix = MatrixLayout::RowMajor,
            ("column_major", None) => layout.matrix = MatrixLayout::ColumnMajor,
            ("std140", None) => layout.packing = Packing::Std140,
            ("std430", None) => layout.packing = Packing::Std430,
            ("packed", None) => layout.packing = Packing::Packed,
            ("push_constant", None) => layout.push_constant = true,
            (_, Some(value)) => {
                let value = u32::try_from(value).unwrap_or(u32::MAX);
                self.set_layout_number(span, qualifier, &id, value);
            }
            (_, None) => {
                let _ = self.error(span, SemaError::UnknownLayoutQualifier(id));
            }
        }
    }

    fn set_layout_number(&mut self, span: Span, qualifier: &mut Qualifier, id: &str, value: u32) {
        match id {
            "location" => {
                if self.check_range(span, value, MAX_LOCATION, |value, max| {
                    SemaError::LocationRange { value, max }
                }) {
                    qualifier.layout.location = Some(value);
                }
            }
            "component" => {
                if self.check_range(span, value, MAX_COMPONENT, |value, max| {
                    SemaError::ComponentRange { value, max }
                }) {
                    qualifier.layout.component = Some(value);
                }
            }
            "binding" => {
                if self.check_range(span, value, MAX_BINDING, |value, max| {
                    SemaError::BindingRange { value, max }
                }) {
                    qualifier.layout.binding = Some(value);
                }
            }
            "set" => {
                if self.check_range(span, value, MAX_SET, |value, max| SemaError::SetRange {
                    value,
                    max,
                }) {
                    qualifier.layout.set = Some(value);
                }
            }
            "offset" => qualifier.layout.offset = Some(value),
            "align" => {
                if value.is_power_of_two() {
                    qualifier.layout.align = Some(value);
                } else {
                    let _ = self.error(span, SemaError::AlignNotPowerOfTwo(value));
                }
            }
            _ => {
                let _ = self.error(span, SemaError::UnknownLayoutQualifier(id.to_string()));
            }
        }
    }

    /// Claim the binding in `qualifier` for `symbol`, reporting a conflict
    /// with a different symbol already bound to the same slot.
    pub(crate) fn claim_binding(&mut self, span: Span, symbol: SymbolId, qualifier: &Qualifier) {
        if let Err(owner) = self.bindings.claim(&qualifier.layout, symbol) {
            let err = SemaError::BindingConflict {
                binding: qualifier.layout.binding.unwrap_or(0),
                set: qualifier.layout.set.unwrap_or(0),
                other: self.symbol_name(owner),
            };
            let _ = self.error(span, err);
        }
    }

    /// Packing rule and matrix default of a block qualifier.
    fn block_rules(&self, block: &Qualifier) -> (Packing, bool) {
        let packing = match block.layout.packing {
            Packing::None => Packing::Std140,
            packing => packing,
        };
        let matrix = match block.layout.matrix {
            MatrixLayout::None => self.options.default_matrix_layout,
            m => m,
        };
        (packing, matrix == MatrixLayout::RowMajor)
    }

    /// Offset the next member appended to a block would get.
    pub(crate) fn next_member_offset(&mut self, span: Span, block: &Qualifier, existing: &[Member], member: &mut Member) {
        let (packing, row_major) = self.block_rules(block);
        let end = existing
            .last()
            .and_then(|last| {
                let (_, size) = base_alignment(&self.structs, &last.ty, packing, row_major);
                last.ty.qualifier.layout.offset.map(|o| o + size)
            })
            .unwrap_or(0);
        self.place_member(span, packing, row_major, end, member);
    }

    /// Assign offsets to a packed block's members in declaration order and
    /// return the block size. Explicit offsets are kept when aligned and not
    /// overlapping; numbering continues after them.
    pub(crate) fn fix_block_offsets(
        &mut self,
        span: Span,
        block: &Qualifier,
        members: &mut [Member],
    ) -> u32 {
        let (packing, row_major) = self.block_rules(block);
        let mut offset = 0;
        let mut max_align = 1;
        for member in members.iter_mut() {
            let (align, size) = self.place_member(span, packing, row_major, offset, member);
            offset = member.ty.qualifier.layout.offset.unwrap_or(offset) + size;
            max_align = max_align.max(align);
        }
        if packing == Packing::Std140 {
            max_align = max_align.max(REGISTER_BYTES);
        }
        round_up(offset, max_align)
    }

    /// Give `member` an offset at or after `current`; returns its alignment
    /// and size.
    fn place_member(
        &mut self,
        span: Span,
        packing: Packing,
        row_major: bool,
        current: u32,
        member: &mut Member,
    ) -> (u32, u32) {
        let member_row_major = match member.ty.qualifier.layout.matrix {
            MatrixLayout::RowMajor => true,
            MatrixLayout::ColumnMajor => false,
            MatrixLayout::None => row_major,
        };
        let (natural, size) = base_alignment(&self.structs, &member.ty, packing, member_row_major);
        let align = member.ty.qualifier.layout.align.map_or(natural, |a| a.max(natural));
        let name = self.str(member.name).to_string();
        let layout = &mut member.ty.qualifier.layout;
        match layout.offset {
            Some(explicit) if explicit % align != 0 => {
                let err = SemaError::MisalignedOffset {
                    member: name,
                    offset: explicit,
                    align,
                };
                let _ = self.error(span, err);
            }
            Some(explicit) if explicit < current => {
                let err = SemaError::OverlappingOffset {
                    member: name,
                    offset: explicit,
                };
                let _ = self.error(span, err);
            }
            Some(_) => {}
            None => layout.offset = Some(round_up(current, align)),
        }
        (align, size)
    }

    /// Propagate a block's location to its members. Without a block
    /// location, either every member or none must carry one.
    pub(crate) fn fix_block_locations(
        &mut self,
        span: Span,
        block_name: &str,
        block: &Qualifier,
        members: &mut [Member],
    ) {
        let Some(mut next) = block.layout.location else {
            let located = members
                .iter()
                .filter(|m| m.ty.qualifier.layout.location.is_some())
                .count();
            if located != 0 && located != members.len() {
                let _ = self.error(span, SemaError::PartialBlockLocations(block_name.to_string()));
            }
            return;
        };
        for member in members.iter_mut() {
            let location = member.ty.qualifier.layout.location.unwrap_or(next);
            member.ty.qualifier.layout.location = Some(location);
            next = location + io_location_size(&self.structs, &member.ty);
        }
        if next > MAX_LOCATION + 1 {
            let _ = self.error(
                span,
                SemaError::LocationRange {
                    value: next - 1,
                    max: MAX_LOCATION,
                },
            );
        }
    }
}
