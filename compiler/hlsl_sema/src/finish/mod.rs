//! End-of-unit finalization.
//!
//! ```text
//! finish
//! ├── entry wrapper        rename, wire IO, patch constant call
//! ├── stream appends       copy to the stream output + EmitVertex
//! ├── unused counters      dropped from linkage
//! ├── depth mode           implied by a depth output
//! ├── root sequence        every queued item in source order
//! └── locations            sequential per direction
//! ```
//!
//! The result always carries the tree, but [`SemaResult::into_unit`] refuses
//! to hand it over when any error was reported.

use hlsl_diagnostic::{Diagnostic, ErrorGuaranteed};
use hlsl_ir::{
    BuiltIn, Name, NodeArena, NodeId, NodeKind, Op, Span, Stage, StringInterner, StructRegistry,
    SymbolId, SymbolTable, Topology, Type,
};
use rustc_hash::FxHashSet;

use crate::entry::{DepthMode, OutputTopology, Partitioning};
use crate::SemaContext;

/// Per-stage execution attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionModes {
    /// Compute workgroup size.
    pub local_size: Option<[u32; 3]>,
    pub max_vertices: Option<u32>,
    pub input_primitive: Option<Topology>,
    /// Geometry output stream topology.
    pub output_primitive: Option<Topology>,
    /// Tessellation output control points.
    pub output_vertices: Option<u32>,
    pub domain: Option<Topology>,
    pub partitioning: Option<Partitioning>,
    pub output_topology: Option<OutputTopology>,
    pub early_fragment_tests: bool,
    pub depth: DepthMode,
    /// Geometry instance count.
    pub invocations: Option<u32>,
    pub patch_constant_function: Option<Name>,
}

/// Caller → callee edge by function name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallEdge {
    pub caller: Name,
    pub callee: Name,
}

/// A variable of the final linkage list.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkageVar {
    pub symbol: SymbolId,
    pub name: Name,
    /// Type with storage class, builtin tag and resolved layout numbers.
    pub ty: Type,
}

/// The analyzed unit handed to the code generator.
#[derive(Debug)]
pub struct LoweredUnit {
    pub stage: Stage,
    pub nodes: NodeArena,
    /// Sequence of every function definition and global initializer.
    pub root: NodeId,
    pub symbols: SymbolTable,
    pub structs: StructRegistry,
    pub interner: StringInterner,
    pub linkage: Vec<LinkageVar>,
    pub exec: ExecutionModes,
    pub call_graph: Vec<CallEdge>,
    /// The zero-argument entry wrapper, when an entry point was wrapped.
    pub entry: Option<SymbolId>,
}

impl LoweredUnit {
    pub fn name(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    /// Linkage variable named `name`.
    pub fn linkage_var(&self, name: &str) -> Option<&LinkageVar> {
        self.linkage.iter().find(|v| self.name(v.name) == name)
    }

    /// Function definition node of `function`.
    pub fn definition(&self, function: SymbolId) -> Option<NodeId> {
        self.nodes.args(self.root).iter().copied().find(|&item| {
            matches!(
                self.nodes.kind(item),
                NodeKind::Aggregate { op: Op::Function, callee: Some(f), .. } if f == function
            )
        })
    }
}

/// Outcome of analyzing one unit.
#[derive(Debug)]
pub struct SemaResult {
    pub unit: LoweredUnit,
    /// Diagnostics sorted by position.
    pub diagnostics: Vec<Diagnostic>,
    pub error_count: usize,
}

impl SemaResult {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// The unit, unless an error was reported.
    pub fn into_unit(self) -> Result<LoweredUnit, ErrorGuaranteed> {
        match ErrorGuaranteed::from_error_count(self.error_count) {
            Some(guarantee) => Err(guarantee),
            None => Ok(self.unit),
        }
    }
}

impl SemaContext {
    /// Finalize the unit.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn finish(mut self) -> SemaResult {
        self.synthesize_entry();
        self.patch_stream_appends();
        self.drop_unused_counters();
        self.infer_depth_mode();

        let root = self.sequence(&self.items.clone(), Span::DUMMY);
        self.assign_locations(root);

        let linkage = self
            .linkage
            .iter()
            .map(|&symbol| {
                let sym = self.symbols.get(symbol);
                LinkageVar {
                    symbol,
                    name: sym.name,
                    ty: sym.ty.clone(),
                }
            })
            .collect::<Vec<_>>();
        let error_count = self.diagnostics.error_count();
        let diagnostics = self.diagnostics.flush();
        tracing::debug!(
            items = self.items.len(),
            linkage = linkage.len(),
            errors = error_count,
            "unit finished"
        );
        SemaResult {
            unit: LoweredUnit {
                stage: self.options.stage,
                nodes: self.nodes,
                root,
                symbols: self.symbols,
                structs: self.structs,
                interner: self.interner,
                linkage,
                exec: self.exec,
                call_graph: self.call_graph,
                entry: self.entry.wrapper,
            },
            diagnostics,
            error_count,
        }
    }

    /// Rewrite each queued stream `Append` in place into a copy to the
    /// stream output followed by an emitted vertex.
    fn patch_stream_appends(&mut self) {
        for append in std::mem::take(&mut self.gs_appends) {
            let &[_, value] = self.nodes.args(append) else {
                continue;
            };
            let span = self.nodes.span(append);
            let mut seq = Vec::new();
            if let Some(output) = self.entry.gs_output {
                let dst = self.symbol_ref(output, span);
                seq.extend(self.copy_value(dst, value, span));
            }
            seq.push(self.aggregate(Op::EmitVertex, &[], Type::void(), span));
            let args = self.nodes.push_list(&seq);
            let kind = NodeKind::Aggregate {
                op: Op::Sequence,
                args,
                callee: None,
            };
            self.nodes.replace(append, kind, Type::void());
        }
    }

    /// Hidden counters no call site used leave the linkage list.
    fn drop_unused_counters(&mut self) {
        let unused: FxHashSet<SymbolId> = self
            .counters
            .values()
            .copied()
            .filter(|c| !self.used_counters.contains(c))
            .collect();
        if !unused.is_empty() {
            tracing::debug!(count = unused.len(), "dropping unused counters");
            self.linkage.retain(|s| !unused.contains(s));
        }
    }

    fn infer_depth_mode(&mut self) {
        if self.exec.depth != DepthMode::None {
            return;
        }
        let writes_depth = self.linkage.iter().any(|&s| {
            self.symbols.get(s).ty.qualifier.builtin == Some(BuiltIn::FragDepth)
        });
        if writes_depth {
            self.exec.depth = DepthMode::Any;
        }
    }
}

#[cfg(test)]
mod tests;
