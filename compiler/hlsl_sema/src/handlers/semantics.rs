//! `: SEMANTIC` annotations and geometry input modifiers.
//!
//! System-value semantics (`SV_*`, matched case-insensitively) become
//! builtin tags on the qualifier. The tag is direction-neutral here:
//! `SV_Position` is tagged `Position` and only becomes the fragment
//! coordinate when a fragment-stage input is declared. Other semantics are
//! kept verbatim for reflection.

use hlsl_ir::{BuiltIn, Qualifier, Span, Topology};

use crate::entry::DepthMode;
use crate::{SemaContext, SemaError};

/// Builtin for an upper-cased system-value name without the `SV_` prefix.
fn system_value(name: &str) -> Option<BuiltIn> {
    let builtin = match name {
        "POSITION" => BuiltIn::Position,
        "DEPTH" | "DEPTHGREATEREQUAL" | "DEPTHLESSEQUAL" => BuiltIn::FragDepth,
        "ISFRONTFACE" => BuiltIn::FrontFacing,
        "VERTEXID" => BuiltIn::VertexIndex,
        "INSTANCEID" => BuiltIn::InstanceIndex,
        "PRIMITIVEID" => BuiltIn::PrimitiveId,
        "GSINSTANCEID" | "OUTPUTCONTROLPOINTID" => BuiltIn::InvocationId,
        "SAMPLEINDEX" => BuiltIn::SampleId,
        "COVERAGE" => BuiltIn::SampleMask,
        "CLIPDISTANCE" => BuiltIn::ClipDistance,
        "CULLDISTANCE" => BuiltIn::CullDistance,
        "RENDERTARGETARRAYINDEX" => BuiltIn::Layer,
        "VIEWPORTARRAYINDEX" => BuiltIn::ViewportIndex,
        "TESSFACTOR" => BuiltIn::TessLevelOuter,
        "INSIDETESSFACTOR" => BuiltIn::TessLevelInner,
        "DOMAINLOCATION" => BuiltIn::TessCoord,
        "DISPATCHTHREADID" => BuiltIn::GlobalInvocationId,
        "GROUPTHREADID" => BuiltIn::LocalInvocationId,
        "GROUPID" => BuiltIn::WorkGroupId,
        "GROUPINDEX" => BuiltIn::LocalInvocationIndex,
        "STENCILREF" => BuiltIn::FragStencilRef,
        _ => {
            let index = name.strip_prefix("TARGET")?;
            let index = if index.is_empty() { 0 } else { index.parse().ok()? };
            return (index < 8).then_some(BuiltIn::FragData(index));
        }
    };
    Some(builtin)
}

impl SemaContext {
    /// Apply the semantic `name` to `qualifier`.
    pub fn handle_semantic(&mut self, span: Span, qualifier: &mut Qualifier, name: &str) {
        let upper = name.to_ascii_uppercase();
        let Some(system) = upper.strip_prefix("SV_") else {
            qualifier.semantic = Some(self.intern(name));
            return;
        };
        // Clip and cull distances may carry an index suffix.
        let base = system.trim_end_matches(|c: char| c.is_ascii_digit());
        let key = if matches!(base, "CLIPDISTANCE" | "CULLDISTANCE") { base } else { system };
        let Some(builtin) = system_value(key) else {
            let _ = self.error(span, SemaError::InvalidSemantic(name.to_string()));
            return;
        };
        match system {
            "DEPTHGREATEREQUAL" => self.exec.depth = DepthMode::Greater,
            "DEPTHLESSEQUAL" => self.exec.depth = DepthMode::Less,
            _ => {}
        }
        tracing::trace!(semantic = name, ?builtin, "system value");
        qualifier.builtin = Some(builtin);
        qualifier.semantic = Some(self.intern(name));
    }

    /// `point`/`line`/`triangle`/`lineadj`/`triangleadj` on a geometry
    /// input parameter. Returns the vertex count of the input array.
    pub fn handle_input_geometry(&mut self, span: Span, topology: Topology) -> u32 {
        match self.exec.input_primitive {
            Some(existing) if existing != topology => {
                let err = SemaError::InvalidAttribute {
                    name: format!("{topology:?}"),
                    reason: "conflicts with an earlier input primitive",
                };
                let _ = self.error(span, err);
            }
            _ => self.exec.input_primitive = Some(topology),
        }
        topology.vertex_count()
    }
}
