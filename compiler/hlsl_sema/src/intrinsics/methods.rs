//! Object methods: textures, images, buffers and geometry streams.
//!
//! Methods never enter the overload table. The object's type picks a
//! family and each method lowers straight to primitive operations:
//!
//! ```text
//! tex.Sample(s, uv)          texture(combine(tex, s), uv)
//! tex.Load(c)                texelFetch(tex, c.xy, c.z)
//! buf.Load(i)                buf.@data[i]
//! rwbab.Store(a, v)          rwbab.@data[a >> 2] = v
//! rwbuf.IncrementCounter()   atomicAdd(buf@count.@count, 1)
//! stream.Append(v)           output = v; EmitVertex  (patched at finish)
//! ```

use hlsl_ir::{
    BasicType, ConstValue, Dim, MatrixLayout, NodeId, Op, Packing, ResourceKind, Sampler, Span,
    Stage, Type,
};

use super::Reusable;
use crate::context::rvalue;
use crate::handlers::BufferKind;
use crate::layout::base_alignment;
use crate::{SemaContext, SemaError};

fn method_op(name: &str) -> Option<Op> {
    let op = match name {
        "Sample" => Op::MethodSample,
        "SampleBias" => Op::MethodSampleBias,
        "SampleCmp" => Op::MethodSampleCmp,
        "SampleCmpLevelZero" => Op::MethodSampleCmpLevelZero,
        "SampleGrad" => Op::MethodSampleGrad,
        "SampleLevel" => Op::MethodSampleLevel,
        "Load" => Op::MethodLoad,
        "Load2" => Op::MethodLoad2,
        "Load3" => Op::MethodLoad3,
        "Load4" => Op::MethodLoad4,
        "Store" => Op::MethodStore,
        "Store2" => Op::MethodStore2,
        "Store3" => Op::MethodStore3,
        "Store4" => Op::MethodStore4,
        "Gather" => Op::MethodGather,
        "GatherRed" => Op::MethodGatherRed,
        "GatherGreen" => Op::MethodGatherGreen,
        "GatherBlue" => Op::MethodGatherBlue,
        "GatherAlpha" => Op::MethodGatherAlpha,
        "GatherCmp" | "GatherCmpRed" => Op::MethodGatherCmpRed,
        "GatherCmpGreen" => Op::MethodGatherCmpGreen,
        "GatherCmpBlue" => Op::MethodGatherCmpBlue,
        "GatherCmpAlpha" => Op::MethodGatherCmpAlpha,
        "GetDimensions" => Op::MethodGetDimensions,
        "CalculateLevelOfDetail" => Op::MethodCalculateLevelOfDetail,
        "IncrementCounter" => Op::MethodIncrementCounter,
        "DecrementCounter" => Op::MethodDecrementCounter,
        "Append" => Op::MethodAppend,
        "Consume" => Op::MethodConsume,
        "RestartStrip" => Op::MethodRestartStrip,
        _ => return None,
    };
    Some(op)
}

/// Gathered channel and whether the gather compares.
fn gather_channel(op: Op) -> Option<(u8, bool)> {
    match op {
        Op::MethodGather | Op::MethodGatherRed => Some((0, false)),
        Op::MethodGatherGreen => Some((1, false)),
        Op::MethodGatherBlue => Some((2, false)),
        Op::MethodGatherAlpha => Some((3, false)),
        Op::MethodGatherCmpRed => Some((0, true)),
        Op::MethodGatherCmpGreen => Some((1, true)),
        Op::MethodGatherCmpBlue => Some((2, true)),
        Op::MethodGatherCmpAlpha => Some((3, true)),
        _ => None,
    }
}

const CHANNELS: [&str; 4] = ["red", "green", "blue", "alpha"];

/// Components of a size query: cube faces are two-dimensional.
fn size_components(sampler: &Sampler) -> u8 {
    let base = match sampler.dim {
        Dim::Cube => 2,
        dim => dim.coord_components(),
    };
    base + u8::from(sampler.arrayed)
}

impl SemaContext {
    /// `object.method(args)`.
    #[tracing::instrument(level = "trace", skip_all, fields(method))]
    pub fn handle_method_call(
        &mut self,
        span: Span,
        object: NodeId,
        method: &str,
        args: Vec<NodeId>,
    ) -> NodeId {
        if self.is_error(object) || args.iter().any(|&a| self.is_error(a)) {
            return self.placeholder(span);
        }
        let ty = self.ty(object).clone();
        let lowered = match method_op(method) {
            None => None,
            Some(_) if ty.is_array() => None,
            Some(op) if ty.stream.is_some() => self.stream_method(span, object, op, &args),
            Some(op) => match (self.buffer_kind(&ty), ty.sampler) {
                (Some(kind), _) => self.buffer_method(span, object, kind, op, &args),
                (None, Some(sampler)) => match sampler.kind {
                    ResourceKind::Texture => self.texture_method(span, object, sampler, op, &args),
                    ResourceKind::Image => self.image_method(span, object, sampler, op, &args),
                    ResourceKind::Sampler | ResourceKind::Combined => None,
                },
                (None, None) => None,
            },
        };
        lowered.unwrap_or_else(|| {
            let name = format!("{}.{method}", self.type_name(&ty));
            self.error_node(span, SemaError::NoMatchingOverload(name))
        })
    }

    /// Report a wrong argument count; `true` when `args` fits.
    fn method_arity(&mut self, span: Span, op: Op, args: &[NodeId], min: usize, max: usize) -> bool {
        if (min..=max).contains(&args.len()) {
            return true;
        }
        let err = SemaError::ArgumentCount {
            name: format!("{op:?}").trim_start_matches("Method").to_string(),
            expected: if args.len() < min { min } else { max },
            found: args.len(),
        };
        let _ = self.error(span, err);
        false
    }

    // === Textures ===

    fn texture_method(
        &mut self,
        span: Span,
        tex: NodeId,
        sampler: Sampler,
        op: Op,
        args: &[NodeId],
    ) -> Option<NodeId> {
        let node = match op {
            Op::MethodLoad => {
                let max = if sampler.ms { 3 } else { 2 };
                let min = if sampler.ms { 2 } else { 1 };
                if !self.method_arity(span, op, args, min, max) {
                    return Some(self.placeholder(span));
                }
                self.texture_load(span, tex, sampler, args)
            }
            Op::MethodGetDimensions => self.texture_dimensions(span, tex, sampler, args),
            Op::MethodCalculateLevelOfDetail => {
                let [state, coord] = args else {
                    let _ = self.method_arity(span, op, args, 2, 2);
                    return Some(self.placeholder(span));
                };
                let combined = self.combine(span, tex, sampler, *state)?;
                let coord = self.coord(span, *coord, sampler.dim.coord_components());
                let lod_ty = Type::vector(BasicType::Float, 2);
                let lod = self.aggregate(Op::TextureQueryLod, &[combined, coord], lod_ty, span);
                self.index_direct(lod, 0, span)
            }
            _ if gather_channel(op).is_some() => self.texture_gather(span, tex, sampler, op, args)?,
            _ if op.is_texture_method() => self.texture_sample(span, tex, sampler, op, args)?,
            _ => return None,
        };
        Some(node)
    }

    /// Combined texture/sampler object for a sampling call.
    fn combine(&mut self, span: Span, tex: NodeId, sampler: Sampler, state: NodeId) -> Option<NodeId> {
        let state_sampler = self.ty(state).sampler.filter(Sampler::is_pure_sampler)?;
        let ty = Type::resource(sampler.combined_with(&state_sampler));
        Some(self.aggregate(Op::ConstructTextureSampler, &[tex, state], ty, span))
    }

    fn coord(&mut self, span: Span, coord: NodeId, size: u8) -> NodeId {
        self.convert_or_error(coord, &Type::vector(BasicType::Float, size), span)
    }

    fn int_operand(&mut self, span: Span, value: NodeId, size: u8) -> NodeId {
        self.convert_or_error(value, &Type::vector(BasicType::Int, size), span)
    }

    fn float_operand(&mut self, span: Span, value: NodeId) -> NodeId {
        self.convert_or_error(value, &Type::scalar(BasicType::Float), span)
    }

    /// Coordinate with the comparison reference appended.
    fn compare_coord(&mut self, span: Span, coord: NodeId, size: u8, reference: NodeId) -> NodeId {
        let coord = self.coord(span, coord, size);
        let reference = self.float_operand(span, reference);
        let ty = Type::vector(BasicType::Float, size + 1);
        self.aggregate(Op::Construct, &[coord, reference], ty, span)
    }

    /// Truncate a four-component texel to the declared return size.
    fn fit_texel(&mut self, span: Span, texel: NodeId, sampler: Sampler) -> NodeId {
        match sampler.ret_size {
            4.. => texel,
            0 | 1 => self.index_direct(texel, 0, span),
            n => {
                let selectors: Vec<ConstValue> = (0..n).map(|c| ConstValue::Int(i64::from(c))).collect();
                let selector = self.constant(&selectors, Type::vector(BasicType::Int, n), span);
                let ty = Type::vector(sampler.ret, n);
                self.binary(Op::VectorSwizzle, texel, selector, ty, span)
            }
        }
    }

    fn texture_sample(
        &mut self,
        span: Span,
        tex: NodeId,
        sampler: Sampler,
        op: Op,
        args: &[NodeId],
    ) -> Option<NodeId> {
        // Leading operands before the optional offset.
        let fixed = match op {
            Op::MethodSample => 2,
            Op::MethodSampleGrad => 4,
            _ => 3,
        };
        if !self.method_arity(span, op, args, fixed, fixed + 1) {
            return Some(self.placeholder(span));
        }
        let combined = self.combine(span, tex, sampler, args[0])?;
        let size = sampler.coord_size();
        let offset_size = sampler.dim.coord_components();
        let offset = args.get(fixed).map(|&o| self.int_operand(span, o, offset_size));
        let texel_ty = Type::vector(sampler.ret, 4);
        let shadow_ty = Type::scalar(BasicType::Float);

        let (prim, operands, ty) = match op {
            Op::MethodSample => {
                let coord = self.coord(span, args[1], size);
                (Op::Texture, vec![combined, coord], texel_ty)
            }
            Op::MethodSampleBias => {
                let coord = self.coord(span, args[1], size);
                let bias = self.float_operand(span, args[2]);
                (Op::TextureBias, vec![combined, coord, bias], texel_ty)
            }
            Op::MethodSampleLevel => {
                let coord = self.coord(span, args[1], size);
                let lod = self.float_operand(span, args[2]);
                (Op::TextureLod, vec![combined, coord, lod], texel_ty)
            }
            Op::MethodSampleGrad => {
                let coord = self.coord(span, args[1], size);
                let gradient = Type::vector(BasicType::Float, offset_size);
                let dx = self.convert_or_error(args[2], &gradient, span);
                let dy = self.convert_or_error(args[3], &gradient, span);
                (Op::TextureGrad, vec![combined, coord, dx, dy], texel_ty)
            }
            Op::MethodSampleCmp => {
                let coord = self.compare_coord(span, args[1], size, args[2]);
                (Op::Texture, vec![combined, coord], shadow_ty)
            }
            Op::MethodSampleCmpLevelZero => {
                let coord = self.compare_coord(span, args[1], size, args[2]);
                let lod = self.float_const(0.0, span);
                (Op::TextureLod, vec![combined, coord, lod], shadow_ty)
            }
            _ => return None,
        };
        let (prim, operands) = match offset {
            None => (prim, operands),
            Some(offset) => {
                let biased = prim == Op::TextureBias;
                let prim = match prim {
                    Op::TextureLod => Op::TextureLodOffset,
                    Op::TextureGrad => Op::TextureGradOffset,
                    _ => Op::TextureOffset,
                };
                // Offset goes last, except that bias trails the offset.
                let mut operands = operands;
                if biased {
                    operands.insert(2, offset);
                } else {
                    operands.push(offset);
                }
                (prim, operands)
            }
        };
        let compares = ty.is_scalar();
        let node = self.aggregate(prim, &operands, ty, span);
        Some(if compares { node } else { self.fit_texel(span, node, sampler) })
    }

    fn texture_gather(
        &mut self,
        span: Span,
        tex: NodeId,
        sampler: Sampler,
        op: Op,
        args: &[NodeId],
    ) -> Option<NodeId> {
        let (channel, compare) = gather_channel(op)?;
        if compare && channel != 0 {
            let err = SemaError::GatherCmpChannel(CHANNELS[usize::from(channel)]);
            return Some(self.error_node(span, err));
        }
        let fixed = if compare { 3 } else { 2 };
        if !self.method_arity(span, op, args, fixed, fixed + 1) {
            return Some(self.placeholder(span));
        }
        let combined = self.combine(span, tex, sampler, args[0])?;
        let coord = self.coord(span, args[1], sampler.coord_size());
        let mut operands = vec![combined, coord];
        // The reference value precedes the offset; the channel follows it.
        if compare {
            operands.push(self.float_operand(span, args[2]));
        }
        if let Some(&offset) = args.get(fixed) {
            operands.push(self.int_operand(span, offset, sampler.dim.coord_components()));
        }
        if !compare {
            operands.push(self.int_const(i64::from(channel), span));
        }
        let prim = if args.len() > fixed { Op::TextureGatherOffset } else { Op::TextureGather };
        Some(self.aggregate(prim, &operands, Type::vector(sampler.ret, 4), span))
    }

    /// `tex.Load(location [, sample] [, offset])`. The location carries the
    /// mip level as its last component unless the texture is a buffer or
    /// multisampled.
    fn texture_load(&mut self, span: Span, tex: NodeId, sampler: Sampler, args: &[NodeId]) -> NodeId {
        let size = sampler.coord_size();
        let texel_ty = Type::vector(sampler.ret, 4);
        let mut setup = Vec::new();
        let mut operands = vec![tex];
        if sampler.dim == Dim::Buffer {
            operands.push(self.int_operand(span, args[0], 1));
        } else if sampler.ms {
            operands.push(self.int_operand(span, args[0], size));
            operands.push(self.int_operand(span, args[1], 1));
        } else {
            let location = self.int_operand(span, args[0], size + 1);
            let location = self.reusable(location, span, &mut setup);
            let base = self.read(location, span);
            let coord = if size == 1 {
                self.index_direct(base, 0, span)
            } else {
                let selectors: Vec<ConstValue> = (0..size).map(|c| ConstValue::Int(i64::from(c))).collect();
                let selector = self.constant(&selectors, Type::vector(BasicType::Int, size), span);
                self.binary(Op::VectorSwizzle, base, selector, Type::vector(BasicType::Int, size), span)
            };
            let lod_base = self.read(location, span);
            let lod = self.index_direct(lod_base, u32::from(size), span);
            operands.extend([coord, lod]);
        }
        let offset_at = if sampler.ms { 2 } else { 1 };
        let prim = match args.get(offset_at) {
            Some(&offset) if sampler.dim != Dim::Buffer => {
                operands.push(self.int_operand(span, offset, sampler.dim.coord_components()));
                Op::TextureFetchOffset
            }
            _ => Op::TextureFetch,
        };
        let fetch = self.aggregate(prim, &operands, texel_ty, span);
        let texel = self.fit_texel(span, fetch, sampler);
        if setup.is_empty() {
            return texel;
        }
        setup.push(texel);
        self.comma(&setup, span)
    }

    /// `tex.GetDimensions(..)`. Accepted layouts, with `n` size components:
    /// `(w..)`, `(mip, w.., levels)` and, multisampled, `(w.., samples)`.
    fn texture_dimensions(&mut self, span: Span, tex: NodeId, sampler: Sampler, args: &[NodeId]) -> NodeId {
        let n = usize::from(size_components(&sampler));
        let (mip, sizes, extra) = match args.len() {
            len if len == n => (None, args, None),
            len if sampler.ms && len == n + 1 => (None, &args[..n], Some((Op::TextureQuerySamples, args[n]))),
            len if !sampler.ms && sampler.dim != Dim::Buffer && len == n + 2 => {
                (Some(args[0]), &args[1..=n], Some((Op::TextureQueryLevels, args[n + 1])))
            }
            _ => {
                let _ = self.method_arity(span, Op::MethodGetDimensions, args, n, n + 2);
                return self.placeholder(span);
            }
        };
        if !sizes.iter().chain(extra.iter().map(|(_, e)| e)).all(|&out| self.check_lvalue(out, span)) {
            return self.placeholder(span);
        }
        let mut query = vec![tex];
        if !sampler.ms && sampler.dim != Dim::Buffer {
            let lod = match mip {
                Some(mip) => self.int_operand(span, mip, 1),
                None => self.int_const(0, span),
            };
            query.push(lod);
        }
        let size_ty = Type::vector(BasicType::Int, size_components(&sampler));
        let size = self.aggregate(Op::TextureQuerySize, &query, size_ty, span);
        let mut seq = self.scatter(span, size, sizes);
        if let Some((op, out)) = extra {
            let value = self.aggregate(op, &[tex], Type::scalar(BasicType::Int), span);
            seq.extend(self.copy_value(out, value, span));
        }
        self.sequence(&seq, span)
    }

    /// Copy each component of `value` into the matching output.
    fn scatter(&mut self, span: Span, value: NodeId, outputs: &[NodeId]) -> Vec<NodeId> {
        let mut seq = Vec::new();
        if let [out] = outputs {
            let value = if self.ty(value).is_vector() { self.index_direct(value, 0, span) } else { value };
            seq.extend(self.copy_value(*out, value, span));
            return seq;
        }
        let cached = self.reusable(value, span, &mut seq);
        for (i, &out) in (0u32..).zip(outputs) {
            let base = self.read(cached, span);
            let component = self.index_direct(base, i, span);
            seq.extend(self.copy_value(out, component, span));
        }
        seq
    }

    // === Images ===

    fn image_method(
        &mut self,
        span: Span,
        image: NodeId,
        sampler: Sampler,
        op: Op,
        args: &[NodeId],
    ) -> Option<NodeId> {
        let node = match op {
            Op::MethodLoad => {
                if !self.method_arity(span, op, args, 1, 1) {
                    return Some(self.placeholder(span));
                }
                let coord = self.int_operand(span, args[0], sampler.coord_size());
                let ty = Type::vector(sampler.ret, sampler.ret_size);
                self.aggregate(Op::ImageLoad, &[image, coord], ty, span)
            }
            Op::MethodGetDimensions => {
                let n = size_components(&sampler);
                if !self.method_arity(span, op, args, usize::from(n), usize::from(n)) {
                    return Some(self.placeholder(span));
                }
                if !args.iter().all(|&out| self.check_lvalue(out, span)) {
                    return Some(self.placeholder(span));
                }
                let size = self.aggregate(Op::ImageQuerySize, &[image], Type::vector(BasicType::Int, n), span);
                let seq = self.scatter(span, size, args);
                self.sequence(&seq, span)
            }
            _ => return None,
        };
        Some(node)
    }

    // === Buffers ===

    fn buffer_method(
        &mut self,
        span: Span,
        buffer: NodeId,
        kind: BufferKind,
        op: Op,
        args: &[NodeId],
    ) -> Option<NodeId> {
        let node = match op {
            Op::MethodLoad if !kind.is_byte_address() => {
                if !self.method_arity(span, op, args, 1, 1) {
                    return Some(self.placeholder(span));
                }
                self.handle_bracket_dereference(span, buffer, args[0])
            }
            Op::MethodLoad | Op::MethodLoad2 | Op::MethodLoad3 | Op::MethodLoad4 if kind.is_byte_address() => {
                if !self.method_arity(span, op, args, 1, 1) {
                    return Some(self.placeholder(span));
                }
                self.byte_address_load(span, buffer, op, args[0])
            }
            Op::MethodStore | Op::MethodStore2 | Op::MethodStore3 | Op::MethodStore4
                if kind.is_byte_address() =>
            {
                if kind.is_read_only() {
                    let name = self.describe(buffer);
                    return Some(self.error_node(span, SemaError::ReadOnlyResource(name)));
                }
                let [address, value] = args else {
                    let _ = self.method_arity(span, op, args, 2, 2);
                    return Some(self.placeholder(span));
                };
                self.byte_address_store(span, buffer, op, *address, *value)
            }
            Op::MethodGetDimensions => self.buffer_dimensions(span, buffer, kind, args),
            Op::MethodIncrementCounter | Op::MethodDecrementCounter
                if kind == BufferKind::RWStructuredBuffer =>
            {
                if !self.method_arity(span, op, args, 0, 0) {
                    return Some(self.placeholder(span));
                }
                let counter = self.counter_step(span, buffer, op == Op::MethodIncrementCounter);
                if op == Op::MethodIncrementCounter {
                    counter
                } else {
                    // Decrement yields the value after the step.
                    let one = self.uint_const(1, span);
                    self.binary(Op::Sub, counter, one, Type::scalar(BasicType::Uint), span)
                }
            }
            Op::MethodAppend if kind == BufferKind::AppendStructuredBuffer => {
                let [value] = args else {
                    let _ = self.method_arity(span, op, args, 1, 1);
                    return Some(self.placeholder(span));
                };
                let slot = self.counter_step(span, buffer, true);
                let data = self.data_element(span, buffer, slot);
                let copies = self.copy_value(data, *value, span);
                self.sequence(&copies, span)
            }
            Op::MethodConsume if kind == BufferKind::ConsumeStructuredBuffer => {
                if !self.method_arity(span, op, args, 0, 0) {
                    return Some(self.placeholder(span));
                }
                let stepped = self.counter_step(span, buffer, false);
                let one = self.uint_const(1, span);
                let slot = self.binary(Op::Sub, stepped, one, Type::scalar(BasicType::Uint), span);
                self.data_element(span, buffer, slot)
            }
            _ => return None,
        };
        Some(node)
    }

    /// Element `index` of the buffer's `@data` member.
    fn data_element(&mut self, span: Span, buffer: NodeId, index: NodeId) -> NodeId {
        let Some(data) = self.buffer_data_member(self.ty(buffer)) else {
            let err = SemaError::Internal("buffer without @data".to_string());
            return self.error_node(span, err);
        };
        let data = self.index_struct(buffer, data, span);
        self.index_indirect(data, index, span)
    }

    /// Word index of a byte address.
    fn word_index(&mut self, span: Span, address: NodeId) -> NodeId {
        let address = self.convert_or_error(address, &Type::scalar(BasicType::Uint), span);
        let two = self.uint_const(2, span);
        self.binary(Op::RightShift, address, two, Type::scalar(BasicType::Uint), span)
    }

    fn word_count(op: Op) -> u8 {
        match op {
            Op::MethodLoad2 | Op::MethodStore2 => 2,
            Op::MethodLoad3 | Op::MethodStore3 => 3,
            Op::MethodLoad4 | Op::MethodStore4 => 4,
            _ => 1,
        }
    }

    /// `Load`..`Load4` on a byte-address buffer: consecutive words from the
    /// word at `address >> 2`.
    fn byte_address_load(&mut self, span: Span, buffer: NodeId, op: Op, address: NodeId) -> NodeId {
        let count = Self::word_count(op);
        let word = self.word_index(span, address);
        if count == 1 {
            return self.data_element(span, buffer, word);
        }
        let mut setup = Vec::new();
        let word = self.reusable(word, span, &mut setup);
        let mut words = Vec::with_capacity(usize::from(count));
        for i in 0..count {
            let index = self.word_at(span, word, i);
            let base = self.duplicate_ref(buffer);
            words.push(self.data_element(span, base, index));
        }
        let loaded = self.aggregate(Op::Construct, &words, Type::vector(BasicType::Uint, count), span);
        if setup.is_empty() {
            return loaded;
        }
        setup.push(loaded);
        self.comma(&setup, span)
    }

    fn word_at(&mut self, span: Span, word: Reusable, offset: u8) -> NodeId {
        let base = self.read(word, span);
        if offset == 0 {
            return base;
        }
        let offset = self.uint_const(u64::from(offset), span);
        self.binary(Op::Add, base, offset, Type::scalar(BasicType::Uint), span)
    }

    fn byte_address_store(&mut self, span: Span, buffer: NodeId, op: Op, address: NodeId, value: NodeId) -> NodeId {
        let count = Self::word_count(op);
        let value = self.convert_or_error(value, &Type::vector(BasicType::Uint, count), span);
        let word = self.word_index(span, address);
        let mut seq = Vec::new();
        let word = self.reusable(word, span, &mut seq);
        let value = self.reusable(value, span, &mut seq);
        for i in 0..count {
            let index = self.word_at(span, word, i);
            let base = self.duplicate_ref(buffer);
            let target = self.data_element(span, base, index);
            let component = self.read(value, span);
            let component = if count == 1 {
                component
            } else {
                self.index_direct(component, u32::from(i), span)
            };
            seq.push(self.assign(target, component, span));
        }
        self.sequence(&seq, span)
    }

    /// `GetDimensions(count [, stride])` on a structured buffer,
    /// `GetDimensions(bytes)` on a byte-address buffer.
    fn buffer_dimensions(&mut self, span: Span, buffer: NodeId, kind: BufferKind, args: &[NodeId]) -> NodeId {
        let max = if kind.is_byte_address() { 1 } else { 2 };
        if !self.method_arity(span, Op::MethodGetDimensions, args, 1, max) {
            return self.placeholder(span);
        }
        if !args.iter().all(|&out| self.check_lvalue(out, span)) {
            return self.placeholder(span);
        }
        let Some(data) = self.buffer_data_member(self.ty(buffer)) else {
            return self.placeholder(span);
        };
        let data = self.index_struct(buffer, data, span);
        let element = self.ty(data).element();
        let uint = Type::scalar(BasicType::Uint);
        let mut length = self.aggregate(Op::ArrayLength, &[data], uint.clone(), span);
        if kind.is_byte_address() {
            let four = self.uint_const(4, span);
            length = self.binary(Op::Mul, length, four, uint, span);
        }
        let mut seq = self.copy_value(args[0], length, span);
        if let Some(&stride_out) = args.get(1) {
            let row_major = element.qualifier.layout.matrix == MatrixLayout::RowMajor;
            let (_, stride) = base_alignment(&self.structs, &element, Packing::Std430, row_major);
            let stride = self.uint_const(u64::from(stride), span);
            seq.extend(self.copy_value(stride_out, stride, span));
        }
        self.sequence(&seq, span)
    }

    /// Atomically step the buffer's hidden counter, yielding its prior
    /// value.
    fn counter_step(&mut self, span: Span, buffer: NodeId, increment: bool) -> NodeId {
        let Some(counter) = self.counter_of(buffer) else {
            let err = SemaError::Internal(format!("no counter for `{}`", self.describe(buffer)));
            return self.error_node(span, err);
        };
        let value = self.counter_value(counter, span);
        let step = if increment {
            self.uint_const(1, span)
        } else {
            // Two's-complement minus one.
            self.uint_const(u64::from(u32::MAX), span)
        };
        self.aggregate(Op::AtomicAdd, &[value, step], Type::scalar(BasicType::Uint), span)
    }

    // === Geometry streams ===

    fn stream_method(&mut self, span: Span, stream: NodeId, op: Op, args: &[NodeId]) -> Option<NodeId> {
        if !matches!(op, Op::MethodAppend | Op::MethodRestartStrip) {
            return None;
        }
        let stage = self.options.stage;
        if stage != Stage::Geometry {
            let err = SemaError::WrongStage {
                op: format!("{op:?}").trim_start_matches("Method").to_string(),
                stage,
            };
            return Some(self.error_node(span, err));
        }
        if op == Op::MethodRestartStrip {
            if !self.method_arity(span, op, args, 0, 0) {
                return Some(self.placeholder(span));
            }
            return Some(self.aggregate(Op::EndPrimitive, &[], Type::void(), span));
        }
        let [value] = args else {
            let _ = self.method_arity(span, op, args, 1, 1);
            return Some(self.placeholder(span));
        };
        let element = Type {
            stream: None,
            ..rvalue(self.ty(stream))
        };
        let value = if element.is_struct() || element.is_array() {
            *value
        } else {
            self.convert_or_error(*value, &element, span)
        };
        // The output variable exists only once the entry point is wrapped.
        let append = self.aggregate(Op::MethodAppend, &[stream, value], Type::void(), span);
        self.gs_appends.push(append);
        Some(append)
    }
}
