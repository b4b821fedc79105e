use std::cell::RefCell;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

struct PendingStage {
    start: Instant,
    end: Option<Instant>,
}

struct Mutables {
    name_stack: Vec<String>,
    stages: IndexMap<Vec<String>, PendingStage>,
}

impl Mutables {
    fn new() -> Self {
        Self {
            name_stack: Vec::new(),
            stages: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StageInfo {
    /// Offset from the start of the frame.
    pub start: Duration,
    pub duration: Duration,
}

/// Nested CPU stage timer. Stages are keyed by their dotted path
/// (`frame.sync`) and reported in the order they started.
pub struct Profiler {
    mutables: RefCell<Mutables>,
    prev_frame_info: IndexMap<String, StageInfo>,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            mutables: RefCell::new(Mutables::new()),
            prev_frame_info: IndexMap::new(),
        }
    }

    pub fn begin(&self, name: &str) {
        let mutables = &mut *self.mutables.borrow_mut();
        mutables.name_stack.push(name.to_owned());
        mutables.stages.insert(
            mutables.name_stack.clone(),
            PendingStage {
                start: Instant::now(),
                end: None,
            },
        );
    }

    pub fn end(&self) {
        let mutables = &mut *self.mutables.borrow_mut();
        let stage = mutables
            .stages
            .get_mut(&mutables.name_stack)
            .expect("Profiler end called without begin");
        stage.end = Some(Instant::now());
        mutables
            .name_stack
            .pop()
            .expect("Profiler end called without begin");
    }

    pub fn profile<T>(&self, name: &str, cb: impl FnOnce() -> T) -> T {
        self.begin(name);
        let ret = cb();
        self.end();
        ret
    }

    pub fn begin_frame(&self) {
        {
            let mutables = &mut *self.mutables.borrow_mut();
            mutables.stages.clear();
            assert!(
                mutables.name_stack.is_empty(),
                "Profiler stack not empty, did you forget to call end()?"
            );
        }
        self.begin("frame");
    }

    /// Closes the frame and publishes its timings.
    pub fn end_frame(&mut self) {
        self.end();
        self.publish();
    }

    /// Closes every stage still open, e.g. when a frame bails out early,
    /// so the next [`Self::begin_frame`] starts clean.
    pub fn abort_frame(&mut self) {
        while !self.mutables.get_mut().name_stack.is_empty() {
            self.end();
        }
        self.publish();
    }

    fn publish(&mut self) {
        let mutables = self.mutables.get_mut();
        self.prev_frame_info = mutables
            .stages
            .first()
            .map(|(_, first)| {
                let frame_start = first.start;
                mutables
                    .stages
                    .iter()
                    .map(|(name, stage)| {
                        let end = stage
                            .end
                            .expect("No end time, did you forget to call end()?");
                        (
                            name.join("."),
                            StageInfo {
                                start: stage.start - frame_start,
                                duration: end - stage.start,
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        if log::log_enabled!(log::Level::Trace) {
            for (name, info) in &self.prev_frame_info {
                log::trace!("{:<16} {:.3} ms", name, info.duration.as_secs_f64() * 1000.0);
            }
        }
    }

    pub fn prev_frame_info(&self) -> &IndexMap<String, StageInfo> {
        &self.prev_frame_info
    }
}
