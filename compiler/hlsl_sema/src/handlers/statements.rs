//! Control flow: selection, switch, loops, branches and blocks.

use hlsl_ir::{BasicType, BranchKind, LoopControl, NodeId, NodeKind, Span, Stage, Type};

use crate::context::rvalue;
use crate::{SemaContext, SemaError};

impl SemaContext {
    /// Condition converted to a scalar bool.
    fn condition(&mut self, span: Span, cond: NodeId) -> NodeId {
        if self.is_error(cond) {
            return cond;
        }
        let ty = self.ty(cond).clone();
        if !ty.is_scalar() || !ty.is_arithmetic() {
            let err = SemaError::NonScalarCondition(self.type_name(&ty));
            return self.error_node(span, err);
        }
        self.convert_basic(cond, BasicType::Bool, span)
            .unwrap_or_else(|| self.placeholder(span))
    }

    fn branch(&mut self, span: Span, kind: BranchKind, value: Option<NodeId>) -> NodeId {
        self.nodes.push(NodeKind::Branch { kind, value }, span, Type::void())
    }

    /// `if (cond) then else`.
    pub fn handle_selection(
        &mut self,
        span: Span,
        cond: NodeId,
        then_branch: Option<NodeId>,
        else_branch: Option<NodeId>,
    ) -> NodeId {
        let cond = self.condition(span, cond);
        self.nodes.push(
            NodeKind::Selection {
                cond,
                then_branch,
                else_branch,
            },
            span,
            Type::void(),
        )
    }

    /// `cond ? a : b`. A scalar arm broadcasts to the other arm's shape,
    /// differing vectors truncate to the shorter one, and the basic type is
    /// the higher-ranked of the two.
    pub fn handle_ternary(&mut self, span: Span, cond: NodeId, a: NodeId, b: NodeId) -> NodeId {
        if self.is_error(a) || self.is_error(b) {
            return self.placeholder(span);
        }
        let cond = self.condition(span, cond);
        let at = self.ty(a).clone();
        let bt = self.ty(b).clone();
        let (a, b, ty) = if at.same_kind(&bt) {
            (a, b, rvalue(&at))
        } else if at.is_arithmetic() && bt.is_arithmetic() {
            let shape = if bt.is_scalar() {
                at.shape
            } else if at.is_scalar() || bt.component_count() < at.component_count() {
                bt.shape
            } else {
                at.shape
            };
            let ty = Type {
                shape,
                basic: if at.basic.promotion_rank() >= bt.basic.promotion_rank() {
                    at.basic
                } else {
                    bt.basic
                },
                ..rvalue(&at)
            };
            let a = self.convert_or_error(a, &ty, span);
            let b = self.convert_or_error(b, &ty, span);
            (a, b, ty)
        } else {
            let _ = self.cannot_convert(span, &bt, &at);
            return self.placeholder(span);
        };
        self.nodes.push(
            NodeKind::Selection {
                cond,
                then_branch: Some(a),
                else_branch: Some(b),
            },
            span,
            ty,
        )
    }

    // === Switch ===

    pub fn begin_switch(&mut self) {
        self.switch_depth += 1;
    }

    /// `switch (selector) body`. Must follow [`begin_switch`](Self::begin_switch).
    pub fn handle_switch(&mut self, span: Span, selector: NodeId, body: NodeId) -> NodeId {
        self.switch_depth = self.switch_depth.saturating_sub(1);
        if self.is_error(selector) {
            return self.placeholder(span);
        }
        let ty = self.ty(selector).clone();
        if !ty.is_scalar() || !ty.basic.is_integer() {
            let err = SemaError::BadSwitchSelector(self.type_name(&ty));
            return self.error_node(span, err);
        }
        self.nodes.push(
            NodeKind::Switch {
                cond: selector,
                body,
            },
            span,
            Type::void(),
        )
    }

    /// `case value:` or, with no value, `default:`.
    pub fn handle_case(&mut self, span: Span, value: Option<NodeId>) -> NodeId {
        if self.switch_depth == 0 {
            let what = if value.is_some() { "case" } else { "default" };
            return self.error_node(span, SemaError::MisplacedStatement(what));
        }
        match value {
            None => self.branch(span, BranchKind::Default, None),
            Some(value) => {
                let value = self.convert_basic(value, BasicType::Int, span);
                self.branch(span, BranchKind::Case, value)
            }
        }
    }

    // === Loops ===

    pub fn begin_loop(&mut self) {
        self.loop_depth += 1;
    }

    /// Loop attribute: `unroll` and `loop` map to loop control, anything
    /// else is ignored with a warning.
    pub fn handle_loop_attribute(&mut self, span: Span, name: &str) -> LoopControl {
        match name.to_ascii_lowercase().as_str() {
            "unroll" => LoopControl::Unroll,
            "loop" => LoopControl::DontUnroll,
            // Branch-shaping hints have no effect on a loop.
            "fastopt" | "allow_uav_condition" => LoopControl::None,
            _ => {
                self.warn(span, SemaError::AttributeIgnored(name.to_string()));
                LoopControl::None
            }
        }
    }

    /// `while`, `do`-`while` or `for` loop. Must follow
    /// [`begin_loop`](Self::begin_loop); a `for` initializer is sequenced
    /// before the returned node by the caller.
    pub fn handle_loop(
        &mut self,
        span: Span,
        cond: Option<NodeId>,
        body: Option<NodeId>,
        step: Option<NodeId>,
        test_first: bool,
        control: LoopControl,
    ) -> NodeId {
        self.loop_depth = self.loop_depth.saturating_sub(1);
        let cond = cond.map(|c| self.condition(span, c));
        self.nodes.push(
            NodeKind::Loop {
                cond,
                body,
                step,
                test_first,
                control,
            },
            span,
            Type::void(),
        )
    }

    // === Branches ===

    pub fn handle_break(&mut self, span: Span) -> NodeId {
        if self.loop_depth == 0 && self.switch_depth == 0 {
            return self.error_node(span, SemaError::MisplacedStatement("break"));
        }
        self.branch(span, BranchKind::Break, None)
    }

    pub fn handle_continue(&mut self, span: Span) -> NodeId {
        if self.loop_depth == 0 {
            return self.error_node(span, SemaError::MisplacedStatement("continue"));
        }
        self.branch(span, BranchKind::Continue, None)
    }

    /// `return [value]`, converting the value to the function's return type.
    pub fn handle_return(&mut self, span: Span, value: Option<NodeId>) -> NodeId {
        let Some(state) = &self.current else {
            return self.error_node(span, SemaError::MisplacedStatement("return"));
        };
        let ret = rvalue(&state.ret);
        let name = self.str(state.name).to_string();
        let value = match value {
            Some(v) if self.is_error(v) => Some(v),
            Some(v) if ret.is_void() => {
                if !self.ty(v).is_void() {
                    let _ = self.error(span, SemaError::ReturnValueInVoid(name));
                }
                None
            }
            Some(v) if ret.is_struct() || ret.is_array() => {
                if !self.ty(v).same_kind(&ret) {
                    let from = self.ty(v).clone();
                    let _ = self.cannot_convert(span, &from, &ret);
                }
                Some(v)
            }
            Some(v) => Some(self.convert_or_error(v, &ret, span)),
            None if !ret.is_void() => {
                let _ = self.error(span, SemaError::MissingReturnValue(name));
                None
            }
            None => None,
        };
        self.branch(span, BranchKind::Return, value)
    }

    /// `discard`, fragment stage only.
    pub fn handle_discard(&mut self, span: Span) -> NodeId {
        let stage = self.options.stage;
        if stage != Stage::Fragment {
            let err = SemaError::WrongStage {
                op: "discard".to_string(),
                stage,
            };
            return self.error_node(span, err);
        }
        self.branch(span, BranchKind::Discard, None)
    }

    // === Blocks ===

    /// Statement list.
    pub fn handle_sequence(&mut self, span: Span, items: &[NodeId]) -> NodeId {
        self.sequence(items, span)
    }

    pub fn begin_block(&mut self) {
        self.symbols.push_scope();
    }

    pub fn end_block(&mut self) {
        self.symbols.pop_scope();
    }
}
