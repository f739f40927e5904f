//! Entry-point ABI synthesis.
//!
//! The target invokes a zero-argument, void-returning function, while the
//! source entry point takes its stage inputs as parameters and returns its
//! outputs. At finish the source function is renamed `@name` and a wrapper
//! takes over the original name:
//!
//! ```text
//! void main() {
//!     @tmp1 = pos;                    // copy-in per input parameter
//!     @tmp2 = @main(@tmp1, ..);       // the one call
//!     color = @tmp3;                  // copy-out per output parameter
//!     @entryPointOutput = @tmp2;      // return value
//!     [barrier; if (InvocationId == 0) patch constant call]
//! }
//! ```
//!
//! Parameters and the return value become direction-tagged globals. Struct
//! values with builtin members are split; other vertex-input and
//! fragment-output structs are flattened. Ordinary interstage variables
//! then receive sequential locations per direction.

use hlsl_ir::{
    ArrayDim, AuxFlags, BasicType, BuiltIn, FunctionSig, Name, NodeId, NodeKind, Op, Span, Stage,
    Storage, StructDef, Symbol, SymbolId, Topology, Type,
};
use rustc_hash::FxHashMap;

use crate::context::rvalue;
use crate::finish::CallEdge;
use crate::layout::{io_location_size, MAX_LOCATION};
use crate::{SemaContext, SemaError};

/// Tessellator spacing from `[partitioning(..)]`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Partitioning {
    Integer,
    FractionalEven,
    FractionalOdd,
    Pow2,
}

/// Tessellator output primitive from `[outputtopology(..)]`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OutputTopology {
    Point,
    Line,
    TriangleCw,
    TriangleCcw,
}

/// Fragment depth-write mode.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum DepthMode {
    #[default]
    None,
    Any,
    Greater,
    Less,
}

/// An entry-point attribute, already decoded by the grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryAttribute {
    NumThreads(u32, u32, u32),
    MaxVertexCount(u32),
    PatchConstantFunc(String),
    Domain(Topology),
    Partitioning(Partitioning),
    OutputTopology(OutputTopology),
    OutputControlPoints(u32),
    EarlyDepthStencil,
    Instance(u32),
}

impl EntryAttribute {
    pub fn name(&self) -> &'static str {
        match self {
            EntryAttribute::NumThreads(..) => "numthreads",
            EntryAttribute::MaxVertexCount(_) => "maxvertexcount",
            EntryAttribute::PatchConstantFunc(_) => "patchconstantfunc",
            EntryAttribute::Domain(_) => "domain",
            EntryAttribute::Partitioning(_) => "partitioning",
            EntryAttribute::OutputTopology(_) => "outputtopology",
            EntryAttribute::OutputControlPoints(_) => "outputcontrolpoints",
            EntryAttribute::EarlyDepthStencil => "earlydepthstencil",
            EntryAttribute::Instance(_) => "instance",
        }
    }

    /// Whether the attribute means anything for `stage`.
    fn applies_to(&self, stage: Stage) -> bool {
        match self {
            EntryAttribute::NumThreads(..) => stage == Stage::Compute,
            EntryAttribute::MaxVertexCount(_) | EntryAttribute::Instance(_) => {
                stage == Stage::Geometry
            }
            EntryAttribute::PatchConstantFunc(_)
            | EntryAttribute::Partitioning(_)
            | EntryAttribute::OutputTopology(_)
            | EntryAttribute::OutputControlPoints(_) => stage == Stage::TessControl,
            EntryAttribute::Domain(_) => {
                matches!(stage, Stage::TessControl | Stage::TessEvaluation)
            }
            EntryAttribute::EarlyDepthStencil => stage == Stage::Fragment,
        }
    }
}

/// Entry-point bookkeeping collected while the unit is analyzed.
#[derive(Clone, Debug, Default)]
pub(crate) struct EntryState {
    pub(crate) name: Option<Name>,
    /// The source function with the entry-point name.
    pub(crate) function: Option<SymbolId>,
    /// Synthesized zero-argument wrapper.
    pub(crate) wrapper: Option<SymbolId>,
    /// Return-value output, per control point for tessellation control.
    pub(crate) output: Option<SymbolId>,
    pub(crate) input_patch: Option<SymbolId>,
    /// Geometry stream output variable.
    pub(crate) gs_output: Option<SymbolId>,
}

impl EntryState {
    pub(crate) fn new(name: Option<Name>) -> Self {
        EntryState {
            name,
            ..Self::default()
        }
    }

    pub(crate) fn is_entry_name(&self, name: Name) -> bool {
        self.name == Some(name)
    }
}

impl SemaContext {
    /// Record the execution modes of entry-point attributes.
    pub(crate) fn apply_entry_attributes(&mut self, span: Span, attributes: &[EntryAttribute]) {
        let stage = self.options.stage;
        for attribute in attributes {
            if !attribute.applies_to(stage) {
                self.warn(span, SemaError::AttributeIgnored(attribute.name().to_string()));
                continue;
            }
            tracing::trace!(?attribute, "entry attribute");
            match attribute {
                EntryAttribute::NumThreads(x, y, z) => {
                    if [x, y, z].iter().any(|&&n| n == 0) {
                        let err = SemaError::InvalidAttribute {
                            name: attribute.name().to_string(),
                            reason: "thread counts must be positive",
                        };
                        let _ = self.error(span, err);
                    } else {
                        self.exec.local_size = Some([*x, *y, *z]);
                    }
                }
                EntryAttribute::MaxVertexCount(n) => self.exec.max_vertices = Some(*n),
                EntryAttribute::PatchConstantFunc(name) => {
                    self.exec.patch_constant_function = Some(self.intern(name));
                }
                EntryAttribute::Domain(domain) => self.exec.domain = Some(*domain),
                EntryAttribute::Partitioning(p) => self.exec.partitioning = Some(*p),
                EntryAttribute::OutputTopology(t) => self.exec.output_topology = Some(*t),
                EntryAttribute::OutputControlPoints(n) => self.exec.output_vertices = Some(*n),
                EntryAttribute::EarlyDepthStencil => self.exec.early_fragment_tests = true,
                EntryAttribute::Instance(n) => self.exec.invocations = Some(*n),
            }
        }
    }

    /// Builtin as seen by this stage: a fragment-stage position input is the
    /// fragment coordinate.
    pub(crate) fn stage_builtin(&self, builtin: BuiltIn, storage: Storage) -> BuiltIn {
        match (builtin, storage, self.options.stage) {
            (BuiltIn::Position, Storage::Input, Stage::Fragment) => BuiltIn::FragCoord,
            _ => builtin,
        }
    }

    /// Whether a struct crossing the stage boundary in `storage` is
    /// flattened into independent members.
    fn flattens_io(&self, ty: &Type, storage: Storage) -> bool {
        ty.is_struct()
            && matches!(
                (self.options.stage, storage),
                (Stage::Vertex, Storage::Input) | (Stage::Fragment, Storage::Output)
            )
    }

    /// Declare an interstage variable for an entry parameter or return
    /// value. Structs are split or flattened; their root leaves linkage.
    #[tracing::instrument(level = "debug", skip_all, fields(name, ?storage))]
    pub(crate) fn declare_io_var(&mut self, name: &str, ty: Type, storage: Storage, span: Span) -> SymbolId {
        let mut ty = ty;
        let mut qualifier = ty.qualifier;
        qualifier.storage = storage;
        qualifier.clear_uniform_layout();
        qualifier.builtin = qualifier.interstage_builtin();
        ty.qualifier = qualifier;

        if let Some(builtin) = qualifier.builtin.filter(|_| !ty.is_struct()) {
            let owner_dim = None;
            return self.interstage_builtin_var(builtin, storage, &ty, owner_dim, span);
        }
        let var = self.new_global(name, ty.clone(), span);
        if self.should_split(&ty) {
            self.split(var, span);
            self.linkage.retain(|&s| s != var);
        } else if self.flattens_io(&ty, storage) && self.flatten(var, span) {
            self.linkage.retain(|&s| s != var);
        }
        var
    }

    /// Reference to the invocation-index input, declared if absent.
    fn invocation_index(&mut self, span: Span) -> NodeId {
        let ty = Type::scalar(BasicType::Uint).with_storage(Storage::Input);
        let var = self.interstage_builtin_var(BuiltIn::InvocationId, Storage::Input, &ty, None, span);
        self.symbol_ref(var, span)
    }

    /// Copy `src` into `dst` as one statement.
    fn copy_statement(&mut self, dst: NodeId, src: NodeId, span: Span) -> NodeId {
        let mut copies = self.copy_value(dst, src, span);
        match copies.len() {
            1 => copies.remove(0),
            _ => self.sequence(&copies, span),
        }
    }

    /// Build the zero-argument wrapper around the entry point.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn synthesize_entry(&mut self) {
        let Some(entry_name) = self.entry.name else {
            return;
        };
        let defined = |ctx: &Self, f: SymbolId| {
            ctx.symbols.get(f).signature().is_some_and(|sig| sig.defined)
        };
        let Some(function) = self.entry.function.filter(|&f| defined(self, f)) else {
            let name = self.str(entry_name).to_string();
            let _ = self.error(Span::DUMMY, SemaError::EntryPointNotFound(name));
            return;
        };
        let sym = self.symbols.get(function).clone();
        let span = sym.span;
        let Some(sig) = sym.signature().cloned() else {
            return;
        };
        let ret = sym.ty.clone();

        let user_name = self.intern(&format!("@{}", self.str(entry_name)));
        self.symbols.rename_function(function, user_name);
        for edge in &mut self.call_graph {
            if edge.caller == entry_name {
                edge.caller = user_name;
            }
            if edge.callee == entry_name {
                edge.callee = user_name;
            }
        }
        let wrapper_sig = FunctionSig {
            params: Vec::new(),
            builtin_op: None,
            defined: true,
        };
        let wrapper = self
            .symbols
            .insert_function(Symbol::function(entry_name, Type::void(), wrapper_sig, span));
        self.entry.wrapper = Some(wrapper);

        let mut body = Vec::new();
        let mut call_args = Vec::with_capacity(sig.params.len());
        let mut copy_out = Vec::new();
        for (i, param) in sig.params.iter().enumerate() {
            let name = param
                .name
                .map_or_else(|| format!("@param{i}"), |n| self.str(n).to_string());
            let ty = param.ty.clone();
            let storage = ty.qualifier.storage;

            if let Some(topology) = ty.stream {
                let element = Type {
                    stream: None,
                    ..ty.clone()
                };
                let output = self.declare_io_var(&name, element, Storage::Output, span);
                self.entry.gs_output = Some(output);
                self.exec.output_primitive = Some(topology);
                let stream = self.new_temp(&ty, span);
                call_args.push(self.symbol_ref(stream, span));
                continue;
            }
            if ty.is_opaque() || ty.basic == BasicType::Block || self.structs.contains_opaque(&ty) {
                self.entry_resource(span, &name, ty, &mut call_args);
                continue;
            }

            let tmp = self.new_temp(&ty, span);
            if storage.is_param_input() {
                let input = self.declare_io_var(&name, ty.clone(), Storage::Input, span);
                if ty.qualifier.builtin == Some(BuiltIn::InputPatch) {
                    self.entry.input_patch = Some(input);
                }
                let src = self.symbol_ref(input, span);
                let dst = self.symbol_ref(tmp, span);
                body.push(self.copy_statement(dst, src, span));
            }
            call_args.push(self.symbol_ref(tmp, span));
            if storage.is_param_output() {
                let output = self.declare_io_var(&name, ty, Storage::Output, span);
                let dst = self.symbol_ref(output, span);
                let src = self.symbol_ref(tmp, span);
                copy_out.push(self.copy_statement(dst, src, span));
            }
        }

        let call = self.call(function, &call_args, span);
        if ret.is_void() {
            body.push(call);
        } else {
            let result = self.new_temp(&ret, span);
            let result_ref = self.symbol_ref(result, span);
            body.push(self.assign(result_ref, call, span));

            let per_point = self.options.stage == Stage::TessControl;
            let out_ty = if per_point {
                let points = self.exec.output_vertices.unwrap_or(1);
                ret.clone().with_array(ArrayDim::Sized(points))
            } else {
                ret.clone()
            };
            let out_name = self.str(self.names.entry_output).to_string();
            let output = self.declare_io_var(&out_name, out_ty, Storage::Output, span);
            self.entry.output = Some(output);
            let mut dst = self.symbol_ref(output, span);
            if per_point {
                let index = self.invocation_index(span);
                dst = self.handle_bracket_dereference(span, dst, index);
            }
            let src = self.symbol_ref(result, span);
            copy_out.push(self.copy_statement(dst, src, span));
        }
        body.extend(copy_out);
        self.call_graph.push(CallEdge {
            caller: entry_name,
            callee: user_name,
        });

        if self.options.stage == Stage::TessControl {
            self.invoke_patch_constant(span, entry_name, &mut body);
        }

        let params = self.aggregate(Op::Parameters, &[], Type::void(), span);
        let body = self.sequence(&body, span);
        let args = self.nodes.push_list(&[params, body]);
        let node = self.nodes.push(
            NodeKind::Aggregate {
                op: Op::Function,
                args,
                callee: Some(wrapper),
            },
            span,
            Type::void(),
        );
        tracing::debug!(params = sig.params.len(), "entry wrapper");
        self.items.push(node);
    }

    /// A resource parameter of the entry point becomes a bound global
    /// passed straight through.
    fn entry_resource(&mut self, span: Span, name: &str, ty: Type, call_args: &mut Vec<NodeId>) {
        let storage = if ty.basic == BasicType::Block {
            Storage::Buffer
        } else {
            Storage::Uniform
        };
        let mut ty = ty.with_storage(storage);
        ty.qualifier.clear_interstage();
        let qualifier = ty.qualifier;
        let counted = self.is_counter_bearing(&ty);
        let flatten = self.should_flatten(&ty, Storage::Uniform, true);
        let global = self.new_global(name, ty, span);
        self.claim_binding(span, global, &qualifier);
        let global_ref = self.symbol_ref(global, span);
        if flatten && self.flatten(global, span) {
            self.linkage.retain(|&s| s != global);
            for leaf in self.flattened_leaves(global_ref) {
                call_args.push(self.symbol_ref(leaf, span));
            }
        } else {
            call_args.push(global_ref);
        }
        if counted {
            let counter = self.declare_counter(global, span);
            self.used_counters.insert(counter);
            call_args.push(self.symbol_ref(counter, span));
        }
    }

    // === Patch constant function ===

    /// Call the patch constant function once per patch: after a barrier,
    /// guarded by `InvocationId == 0`, with its result copied to the
    /// per-patch output.
    #[tracing::instrument(level = "debug", skip_all)]
    fn invoke_patch_constant(&mut self, span: Span, entry_name: Name, body: &mut Vec<NodeId>) {
        let Some(pcf_name) = self.exec.patch_constant_function else {
            return;
        };
        let candidates: Vec<SymbolId> = self
            .symbols
            .functions(pcf_name)
            .iter()
            .copied()
            .filter(|&f| {
                self.symbols
                    .get(f)
                    .signature()
                    .is_some_and(|sig| sig.defined && !sig.is_builtin())
            })
            .collect();
        let pcf = match candidates.as_slice() {
            [pcf] => *pcf,
            [] => {
                let name = self.str(pcf_name).to_string();
                let _ = self.error(span, SemaError::PatchConstantNotFound(name));
                return;
            }
            _ => {
                let name = self.str(pcf_name).to_string();
                let _ = self.error(span, SemaError::PatchConstantAmbiguous(name));
                return;
            }
        };
        let Some(sig) = self.symbols.get(pcf).signature().cloned() else {
            return;
        };
        let pcf_display = self.str(pcf_name).to_string();

        let mut setup = Vec::new();
        let mut args = Vec::with_capacity(sig.params.len());
        let mut output_patches = 0;
        for (i, param) in sig.params.iter().enumerate() {
            let name = param
                .name
                .map_or_else(|| format!("@param{i}"), |n| self.str(n).to_string());
            let ty = param.ty.clone();
            if ty.qualifier.storage.is_param_output() {
                let _ = self.error(span, SemaError::PatchFunctionOutput(name));
                return;
            }
            let arg = match ty.qualifier.builtin {
                Some(BuiltIn::OutputPatch) => {
                    output_patches += 1;
                    if output_patches > 1 {
                        let err = SemaError::MultipleOutputPatches(pcf_display);
                        let _ = self.error(span, err);
                        return;
                    }
                    let Some(output) = self.entry.output else {
                        let err = SemaError::Internal("output patch without entry output".into());
                        let _ = self.error(span, err);
                        return;
                    };
                    self.symbol_ref(output, span)
                }
                Some(BuiltIn::InputPatch) => {
                    let input = match self.entry.input_patch {
                        Some(input) => input,
                        None => {
                            let input = self.declare_io_var(&name, ty.clone(), Storage::Input, span);
                            self.entry.input_patch = Some(input);
                            input
                        }
                    };
                    self.symbol_ref(input, span)
                }
                _ => {
                    let input = self.declare_io_var(&name, ty.clone(), Storage::Input, span);
                    self.symbol_ref(input, span)
                }
            };
            // Split and flattened values exist only member by member.
            let arg = if self.needs_member_copy(arg) {
                let tmp = self.new_temp(&ty, span);
                let dst = self.symbol_ref(tmp, span);
                setup.push(self.copy_statement(dst, arg, span));
                self.symbol_ref(tmp, span)
            } else {
                arg
            };
            args.push(arg);
        }

        let ret = self.symbols.get(pcf).ty.clone();
        let call = self.call(pcf, &args, span);
        self.call_graph.push(CallEdge {
            caller: entry_name,
            callee: pcf_name,
        });
        let mut guarded = setup;
        if ret.is_void() {
            guarded.push(call);
        } else {
            let result = self.symbols.add_hidden(Symbol::variable(
                self.names.patch_constant_result,
                rvalue(&ret),
                span,
            ));
            let result_ref = self.symbol_ref(result, span);
            guarded.push(self.assign(result_ref, call, span));
            let mut out_ty = ret;
            out_ty.qualifier.aux |= AuxFlags::PATCH;
            let out_name = self.str(self.names.patch_constant_output).to_string();
            let output = self.declare_io_var(&out_name, out_ty, Storage::Output, span);
            let dst = self.symbol_ref(output, span);
            let src = self.symbol_ref(result, span);
            guarded.push(self.copy_statement(dst, src, span));
        }

        let index = self.invocation_index(span);
        let index_ty = rvalue(self.ty(index));
        let zero = self.zero(&index_ty, span);
        let cond = self.binary(Op::Equal, index, zero, Type::scalar(BasicType::Bool), span);
        let then_branch = self.sequence(&guarded, span);
        body.push(self.aggregate(Op::Barrier, &[], Type::void(), span));
        body.push(self.handle_selection(span, cond, Some(then_branch), None));
    }

    // === Locations ===

    /// Give ordinary interstage variables sequential locations per
    /// direction in declaration order, honoring explicit ones. Struct
    /// members are numbered from their variable's location, and references
    /// under `root` pick up the new types.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn assign_locations(&mut self, root: NodeId) {
        let mut relaid: FxHashMap<SymbolId, Type> = FxHashMap::default();
        for var in self.linkage.clone() {
            let sym = self.symbols.get(var);
            let (mut ty, span) = (sym.ty.clone(), sym.span);
            let next = match ty.qualifier.storage {
                Storage::Input => self.next_in_location,
                Storage::Output => self.next_out_location,
                _ => continue,
            };
            if ty.qualifier.interstage_builtin().is_some() {
                continue;
            }
            let location = ty.qualifier.layout.location.unwrap_or(next);
            let end = location + io_location_size(&self.structs, &ty);
            if end > MAX_LOCATION + 1 {
                let err = SemaError::LocationRange {
                    value: end - 1,
                    max: MAX_LOCATION,
                };
                let _ = self.error(span, err);
            }
            match ty.qualifier.storage {
                Storage::Input => self.next_in_location = end,
                _ => self.next_out_location = end,
            }
            ty.qualifier.layout.location = Some(location);
            if let Some(id) = ty.fields {
                let def = self.structs.get(id).clone();
                let mut members = def.members;
                let block_name = self.symbol_name(var);
                self.fix_block_locations(span, &block_name, &ty.qualifier, &mut members);
                ty.fields = Some(self.structs.intern(StructDef {
                    name: def.name,
                    members,
                }));
            }
            tracing::trace!(var = %self.symbol_name(var), location, "location");
            self.symbols.get_mut(var).ty = ty.clone();
            relaid.insert(var, ty);
        }
        if relaid.is_empty() {
            return;
        }
        let mut refs = Vec::new();
        self.nodes.walk(root, &mut |id| refs.push(id));
        for id in refs {
            if let NodeKind::Symbol {
                symbol,
                flatten_subset: None,
            } = self.nodes.kind(id)
            {
                if let Some(ty) = relaid.get(&symbol) {
                    self.nodes.set_type(id, ty.clone());
                }
            }
        }
    }
}
