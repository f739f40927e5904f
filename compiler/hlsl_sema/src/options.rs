//! Per-unit analyzer configuration.

use hlsl_ir::{MatrixLayout, Stage};

/// Options supplied by the driver when a unit is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SemaOptions {
    pub stage: Stage,
    /// Source-level entry point name; `None` analyzes without wrapping.
    pub entry_point: Option<String>,
    /// Flatten uniform arrays into independently bound elements.
    pub flatten_uniform_arrays: bool,
    pub shift_texture_binding: u32,
    pub shift_sampler_binding: u32,
    pub shift_cbuffer_binding: u32,
    pub shift_uav_binding: u32,
    /// Matrix layout for uniform members without an explicit one.
    pub default_matrix_layout: MatrixLayout,
    /// Stored error limit; `0` is unlimited.
    pub error_limit: usize,
}

impl Default for SemaOptions {
    fn default() -> Self {
        SemaOptions {
            stage: Stage::Fragment,
            entry_point: Some("main".to_string()),
            flatten_uniform_arrays: false,
            shift_texture_binding: 0,
            shift_sampler_binding: 0,
            shift_cbuffer_binding: 0,
            shift_uav_binding: 0,
            default_matrix_layout: MatrixLayout::ColumnMajor,
            error_limit: 0,
        }
    }
}

impl SemaOptions {
    pub fn for_stage(stage: Stage, entry_point: &str) -> Self {
        SemaOptions {
            stage,
            entry_point: Some(entry_point.to_string()),
            ..Self::default()
        }
    }
}
