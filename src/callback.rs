//! Per-iteration callback hook (C10): a caller-supplied observer polled once
//! per iteration boundary for logging or monitoring, never for control flow
//! (that's [`crate::terminators::Terminator`]'s job).

use crate::context::Context;
use crate::SimplexOptions;

/// Observer invoked at the end of each iteration with the current
/// [`Context`]. Unlike [`crate::terminators::Terminator`] it cannot stop the
/// solve; it only gets to look.
pub trait Callback {
    fn call(&mut self, ctx: &Context);
}

/// A callback that does nothing. The default when a caller has no use for
/// per-iteration output.
pub struct NoOpCallback {}

impl NoOpCallback {
    pub fn new(_options: &SimplexOptions) -> Self {
        Self {}
    }
}

impl Callback for NoOpCallback {
    fn call(&mut self, _ctx: &Context) {}
}

/// Prints phase, objective value, and basic feasibility to stdout each
/// iteration.
pub struct ConvergenceOutput {}

impl ConvergenceOutput {
    pub fn new(_options: &SimplexOptions) -> Self {
        Self {}
    }
}

impl Callback for ConvergenceOutput {
    fn call(&mut self, ctx: &Context) {
        println!(
            "| {:4} | {:>8?} | {:<14.6e} |",
            ctx.counters.iterations, ctx.phase, ctx.obj,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::ConstraintMatrix;
    use crate::model::{Model, Sense};

    fn tiny_context() -> Context {
        let a = ConstraintMatrix::from_csc(1, 1, vec![0, 1], vec![0], vec![1.0]).unwrap();
        let model = Model::new(
            vec![1.0],
            a,
            vec![5.0],
            vec![Sense::Le],
            vec![0.0],
            vec![crate::INFINITY],
        )
        .unwrap();
        Context::new(&model, SimplexOptions::new())
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let ctx = tiny_context();
        let mut cb = NoOpCallback::new(&SimplexOptions::new());
        cb.call(&ctx);
    }
}
