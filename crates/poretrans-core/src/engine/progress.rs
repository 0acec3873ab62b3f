/// Events emitted by long-running workflows and bulk energy passes.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// A named stage of a workflow begins.
    StageStart { name: &'static str },
    StageFinish,

    /// A counted pass over `total` items begins; one `Advance` follows per item.
    PassStart { total: u64 },
    Advance,
    PassFinish,

    /// A notable event worth surfacing to the user, such as a rolled-back bond break.
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback; silent without one.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `body` between a `StageStart` and a `StageFinish` event.
    ///
    /// The finish event is only sent when `body` returns, whatever its result.
    pub fn stage<T>(&self, name: &'static str, body: impl FnOnce() -> T) -> T {
        self.report(Progress::StageStart { name });
        let out = body();
        self.report(Progress::StageFinish);
        out
    }

    /// Runs `body` inside a counted pass of `total` steps.
    ///
    /// `body` receives a handle that emits one `Advance` event per call.
    pub fn pass<T>(&self, total: u64, body: impl FnOnce(&dyn Fn()) -> T) -> T {
        self.report(Progress::PassStart { total });
        let out = body(&|| self.report(Progress::Advance));
        self.report(Progress::PassFinish);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        let out = reporter.pass(3, |advance| {
            (0..3)
                .map(|i| {
                    advance();
                    i * 2
                })
                .collect::<Vec<_>>()
        });
        assert_eq!(out, vec![0, 2, 4]);
    }

    #[test]
    fn pass_emits_start_one_advance_per_item_and_finish() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e: Progress| {
            events.lock().unwrap().push(e);
        }));
        reporter.stage("Energies", || {
            reporter.pass(2, |advance| {
                advance();
                advance();
            })
        });
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                Progress::StageStart { name: "Energies" },
                Progress::PassStart { total: 2 },
                Progress::Advance,
                Progress::Advance,
                Progress::PassFinish,
                Progress::StageFinish,
            ]
        );
    }
}
