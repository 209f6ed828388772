//! Host callbacks and the blocking run driver.

use std::{
    panic::{self, AssertUnwindSafe},
    thread,
};

use crate::run::{Checkpoint, EvolutionRun, GenerationReport, PauseHandle, RunResult};

/// Callbacks a host receives while [`drive`] runs an evolution.
///
/// Every method has an empty default. A panicking callback is logged and ignored; the
/// run goes on.
pub trait RunObserver {
    /// Called once, before the first generation.
    fn on_pause_handle(&mut self, _handle: PauseHandle) {}

    /// Called after every generation.
    fn on_generation(&mut self, _report: &GenerationReport) {}

    /// Called once with the final result.
    fn on_done(&mut self, _result: &RunResult) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Runs `run` to completion, forwarding its events to `observer`.
///
/// While the run is paused the calling thread sleeps for the poll interval between
/// checks.
///
/// # Example
///
/// ```
/// use brickevo_engine::GameConfig;
/// use brickevo_training::{
///     observer::{self, RunObserver},
///     params::GaParams,
///     run::{EvolutionRun, GenerationReport},
/// };
///
/// #[derive(Default)]
/// struct Counter(usize);
///
/// impl RunObserver for Counter {
///     fn on_generation(&mut self, _report: &GenerationReport) {
///         self.0 += 1;
///     }
/// }
///
/// let params = GaParams {
///     population: 4,
///     generations: 3,
///     elite: 1,
///     episodes: 1,
///     horizon: 200,
///     ..GaParams::default()
/// };
/// let run = EvolutionRun::new(GameConfig::default(), params, 7)?;
/// let mut counter = Counter::default();
/// let result = observer::drive(run, &mut counter);
/// assert_eq!(counter.0, 3);
/// assert_eq!(result.history.len(), 3);
/// # Ok::<(), brickevo_training::params::ParamsError>(())
/// ```
pub fn drive<O>(mut run: EvolutionRun, observer: &mut O) -> RunResult
where
    O: RunObserver + ?Sized,
{
    let handle = run.pause_handle();
    notify("on_pause_handle", || observer.on_pause_handle(handle));

    loop {
        match run.resume() {
            Checkpoint::Paused { poll_interval } => thread::sleep(poll_interval),
            Checkpoint::Yielded => {}
            Checkpoint::Generation(report) => {
                notify("on_generation", || observer.on_generation(&report));
            }
            Checkpoint::Finished => break,
        }
    }

    let result = run
        .into_result()
        .expect("a finished run always holds its result");
    notify("on_done", || observer.on_done(&result));
    result
}

fn notify<F>(hook: &str, f: F)
where
    F: FnOnce(),
{
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("unknown panic");
        log::warn!("observer hook {hook} panicked: {message}");
    }
}
