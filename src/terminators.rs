//! Terminators for controlling and interrupting the simplex driver (C10):
//! anything that can observe the running [`crate::context::Context`] and
//! decide the solve should stop, returning the [`crate::solution::Status`]
//! to report.
//!
//! - [`IterationLimitTerminator`]: stops once `options.iter_limit` is hit.
//! - [`TimeLimitTerminator`]: stops once `options.time_limit` elapses.
//! - [`InterruptTerminator`]: responds to Ctrl-C (SIGINT) or a programmatic
//!   flag. Installs a global signal handler and can only be constructed
//!   once per process.
//! - [`MultipleTerminators`]: combines any number of terminators, firing on
//!   the first one that does.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::context::Context;
use crate::solution::Status;
use crate::SimplexOptions;

pub trait Terminator {
    fn initialize(&mut self) {}

    fn terminate(&mut self, ctx: &Context) -> Option<Status>;
}

/// Stops once `ctx.counters.iterations >= options.iter_limit`.
pub struct IterationLimitTerminator {
    limit: usize,
}

impl IterationLimitTerminator {
    pub fn new(options: &SimplexOptions) -> Self {
        Self {
            limit: options.iter_limit,
        }
    }
}

impl Terminator for IterationLimitTerminator {
    fn terminate(&mut self, ctx: &Context) -> Option<Status> {
        (ctx.counters.iterations >= self.limit).then_some(Status::IterationLimit)
    }
}

/// Stops once `ctx.elapsed() >= options.time_limit`.
pub struct TimeLimitTerminator {
    limit: std::time::Duration,
}

impl TimeLimitTerminator {
    pub fn new(options: &SimplexOptions) -> Self {
        Self {
            limit: options.time_limit,
        }
    }
}

impl Terminator for TimeLimitTerminator {
    fn terminate(&mut self, ctx: &Context) -> Option<Status> {
        (ctx.elapsed() >= self.limit).then_some(Status::TimeLimit)
    }
}

/// Terminator that responds to Ctrl-C (SIGINT) or programmatic interrupts.
///
/// # Note
/// Only one instance can be constructed per process, as it installs a
/// global signal handler. Creating a second will panic.
pub struct InterruptTerminator {
    interrupted: Arc<AtomicBool>,
}

impl InterruptTerminator {
    pub fn new() -> Self {
        let interrupted = Arc::new(AtomicBool::new(false));
        ctrlc::set_handler({
            let interrupted = interrupted.clone();
            move || {
                interrupted.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        })
        .expect("failed to install Ctrl-C handler");
        Self { interrupted }
    }

    pub fn interrupt(&mut self) {
        self.interrupted
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Default for InterruptTerminator {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminator for InterruptTerminator {
    fn terminate(&mut self, _ctx: &Context) -> Option<Status> {
        if self.interrupted.load(std::sync::atomic::Ordering::SeqCst) {
            Some(Status::Interrupted)
        } else {
            None
        }
    }
}

/// Combines multiple terminators, firing on the first one that does.
pub struct MultipleTerminators {
    terminators: Vec<Box<dyn Terminator>>,
}

impl MultipleTerminators {
    pub fn new(terminators: Vec<Box<dyn Terminator>>) -> Self {
        Self { terminators }
    }
}

impl Terminator for MultipleTerminators {
    fn initialize(&mut self) {
        for terminator in &mut self.terminators {
            terminator.initialize();
        }
    }

    fn terminate(&mut self, ctx: &Context) -> Option<Status> {
        for terminator in &mut self.terminators {
            if let Some(status) = terminator.terminate(ctx) {
                return Some(status);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::ConstraintMatrix;
    use crate::model::{Model, Sense};

    fn tiny_context(options: SimplexOptions) -> Context {
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
        Context::new(&model, options)
    }

    #[test]
    fn iteration_limit_fires_once_reached() {
        let options = SimplexOptions::new().with_iter_limit(3);
        let mut ctx = tiny_context(options.clone());
        let mut term = IterationLimitTerminator::new(&options);
        assert!(term.terminate(&ctx).is_none());
        ctx.counters.iterations = 3;
        assert_eq!(term.terminate(&ctx), Some(Status::IterationLimit));
    }

    #[test]
    fn multiple_terminators_fires_on_first_match() {
        let options = SimplexOptions::new().with_iter_limit(0);
        let ctx = tiny_context(options.clone());
        let mut term = MultipleTerminators::new(vec![
            Box::new(IterationLimitTerminator::new(&options)),
            Box::new(TimeLimitTerminator::new(&options)),
        ]);
        assert_eq!(term.terminate(&ctx), Some(Status::IterationLimit));
    }

    #[cfg(unix)]
    mod platform {
        pub fn send_sigint() {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            let pid = std::process::id() as i32;
            signal::kill(Pid::from_raw(pid), Signal::SIGINT).expect("failed to send SIGINT");
        }
    }

    #[cfg(windows)]
    mod platform {
        pub fn send_sigint() {
            use windows_sys::Win32::System::Console::{
                GenerateConsoleCtrlEvent, CTRL_C_EVENT,
            };

            unsafe {
                GenerateConsoleCtrlEvent(CTRL_C_EVENT, 0);
            }
        }
    }

    /// Sends a real SIGINT (or, on Windows, a console Ctrl-C event) from a
    /// background thread and checks [`InterruptTerminator`] observes it at
    /// the next polled boundary.
    #[test]
    fn interrupt_terminator_observes_real_sigint() {
        let options = SimplexOptions::new();
        let ctx = tiny_context(options);
        let mut terminator = InterruptTerminator::new();

        std::thread::spawn(|| {
            std::thread::sleep(std::time::Duration::from_millis(200));
            platform::send_sigint();
        });

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        loop {
            if let Some(status) = terminator.terminate(&ctx) {
                assert_eq!(status, Status::Interrupted);
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "SIGINT was not observed within the deadline"
            );
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    }
}
