use hlsl_ir::{BasicType, Op, Storage, Type};
use pretty_assertions::assert_eq;

use super::*;
use crate::SemaOptions;

fn overloads(ctx: &SemaContext, name: &str) -> Vec<hlsl_ir::SymbolId> {
    let name = ctx.interner().get(name).unwrap();
    ctx.symbols().functions(name).to_vec()
}

#[test]
fn every_prototype_is_installed() {
    let ctx = SemaContext::new(SemaOptions::default());
    let mut missing = Vec::new();
    for proto in PROTOTYPES {
        let found = ctx.interner().get(proto.name).is_some_and(|name| {
            ctx.symbols().functions(name).iter().any(|&id| {
                ctx.symbols().get(id).signature().and_then(|s| s.builtin_op) == Some(proto.op)
            })
        });
        if !found {
            missing.push(proto.name);
        }
    }
    assert!(missing.is_empty(), "not installed: {missing:?}");
}

#[test]
fn scalar_vector_families_expand() {
    let ctx = SemaContext::new(SemaOptions::default());
    // float scalar + float2..4
    assert_eq!(overloads(&ctx, "sin").len(), 4);
    // float, int, uint over four shapes
    assert_eq!(overloads(&ctx, "max").len(), 12);
    assert_eq!(overloads(&ctx, "cross").len(), 1);
}

#[test]
fn sincos_outputs_are_out_parameters() {
    let ctx = SemaContext::new(SemaOptions::default());
    let id = overloads(&ctx, "sincos")[0];
    let sig = ctx.symbols().get(id).signature().unwrap();
    let storages: Vec<Storage> = sig.params.iter().map(|p| p.ty.qualifier.storage).collect();
    assert_eq!(storages, vec![Storage::In, Storage::Out, Storage::Out]);
    assert!(ctx.symbols().get(id).ty.is_void());
}

#[test]
fn interlocked_destination_is_inout() {
    let ctx = SemaContext::new(SemaOptions::default());
    for id in overloads(&ctx, "InterlockedAdd") {
        let sig = ctx.symbols().get(id).signature().unwrap();
        assert_eq!(sig.params[0].ty.qualifier.storage, Storage::InOut);
        assert!(sig.params[0].ty.basic.is_integer());
    }
}

#[test]
fn transpose_swaps_dimensions() {
    let ctx = SemaContext::new(SemaOptions::default());
    let found = overloads(&ctx, "transpose").into_iter().any(|id| {
        let sym = ctx.symbols().get(id);
        let param = &sym.signature().unwrap().params[0].ty;
        param.same_kind(&Type::matrix(BasicType::Float, 3, 2))
            && sym.ty.same_kind(&Type::matrix(BasicType::Float, 2, 3))
    });
    assert!(found);
}

#[test]
fn mul_matrix_product_dimensions_agree() {
    let ctx = SemaContext::new(SemaOptions::default());
    for id in overloads(&ctx, "mul") {
        let sym = ctx.symbols().get(id);
        let params = &sym.signature().unwrap().params;
        if let (true, true) = (params[0].ty.is_matrix(), params[1].ty.is_matrix()) {
            let (l, r) = (&params[0].ty, &params[1].ty);
            // left columns equal right rows; result is left rows x right columns
            assert_eq!(l.matrix_cols(), r.matrix_rows());
            assert_eq!(sym.ty.matrix_rows(), l.matrix_rows());
            assert_eq!(sym.ty.matrix_cols(), r.matrix_cols());
        }
        assert_eq!(sym.signature().unwrap().builtin_op, Some(Op::GenMul));
    }
}

#[test]
fn barriers_take_no_arguments() {
    let ctx = SemaContext::new(SemaOptions::default());
    let id = overloads(&ctx, "GroupMemoryBarrierWithGroupSync")[0];
    let sig = ctx.symbols().get(id).signature().unwrap();
    assert!(sig.params.is_empty());
    assert_eq!(sig.builtin_op, Some(Op::Barrier));
}
