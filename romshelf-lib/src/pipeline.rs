use std::path::PathBuf;

use romshelf_dat::{Fingerprint, RomId};

use crate::handle::FileHandle;

/// A scanned file or archive member together with its fingerprint.
#[derive(Debug)]
pub struct ScanItem<'h> {
    pub handle: FileHandle<'h>,
    pub fingerprint: Fingerprint,
}

impl ScanItem<'_> {
    pub fn location(&self) -> PathBuf {
        self.handle.location()
    }
}

/// One link of the processing chain.
///
/// Every hook receives the rest of the chain and delegates to it by
/// default. A stage overriding a hook decides itself whether, and when, to
/// call `next`.
pub trait Stage {
    /// Process a list of paths and return the paths to scan in the next
    /// round.
    fn scan(&mut self, paths: Vec<PathBuf>, mut next: Chain<'_, '_>) -> Vec<PathBuf> {
        next.scan(paths)
    }

    /// A scanned item matched `records` (primary first). Returns where the
    /// item now lives, if a stage knows.
    fn on_match(
        &mut self,
        item: &ScanItem<'_>,
        records: &[RomId],
        mut next: Chain<'_, '_>,
    ) -> Option<PathBuf> {
        next.on_match(item, records)
    }

    fn on_no_match(&mut self, item: &ScanItem<'_>, mut next: Chain<'_, '_>) {
        next.on_no_match(item)
    }

    /// Called once after the last scan round.
    fn finalize(&mut self, mut next: Chain<'_, '_>) {
        next.finalize()
    }
}

/// Cursor over the stages following the current one.
pub struct Chain<'s, 'a> {
    stages: &'s mut [Box<dyn Stage + 'a>],
}

impl<'s, 'a> Chain<'s, 'a> {
    pub fn new(stages: &'s mut [Box<dyn Stage + 'a>]) -> Self {
        Self { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Past the last stage the paths are returned unchanged.
    pub fn scan(&mut self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        match self.stages.split_first_mut() {
            Some((head, rest)) => head.scan(paths, Chain { stages: rest }),
            None => paths,
        }
    }

    pub fn on_match(&mut self, item: &ScanItem<'_>, records: &[RomId]) -> Option<PathBuf> {
        match self.stages.split_first_mut() {
            Some((head, rest)) => head.on_match(item, records, Chain { stages: rest }),
            None => None,
        }
    }

    pub fn on_no_match(&mut self, item: &ScanItem<'_>) {
        if let Some((head, rest)) = self.stages.split_first_mut() {
            head.on_no_match(item, Chain { stages: rest });
        }
    }

    pub fn finalize(&mut self) {
        if let Some((head, rest)) = self.stages.split_first_mut() {
            head.finalize(Chain { stages: rest });
        }
    }
}

/// Ordered list of stages driven by [`Pipeline::run`].
#[derive(Default)]
pub struct Pipeline<'a> {
    stages: Vec<Box<dyn Stage + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Put `stage` in front of the current head so it sees every event
    /// first.
    pub fn chain(&mut self, stage: impl Stage + 'a) -> &mut Self {
        self.stages.insert(0, Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Scan `roots` round after round until no new paths show up, the
    /// paths stop changing, or after the first round when `recursive` is
    /// off. Stages are finalized afterwards in every case.
    pub fn run(&mut self, roots: Vec<PathBuf>, recursive: bool) {
        let mut paths = roots;
        loop {
            let found = Chain::new(&mut self.stages).scan(paths.clone());
            if found.is_empty() || !recursive || found == paths {
                break;
            }
            paths = found;
        }
        Chain::new(&mut self.stages).finalize();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every hook call and forwards it.
    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Stage for Recorder {
        fn scan(&mut self, paths: Vec<PathBuf>, mut next: Chain<'_, '_>) -> Vec<PathBuf> {
            self.log.borrow_mut().push(format!("{}:scan", self.name));
            next.scan(paths)
        }

        fn finalize(&mut self, mut next: Chain<'_, '_>) {
            self.log.borrow_mut().push(format!("{}:finalize", self.name));
            next.finalize()
        }
    }

    /// Returns one level of subdirectories per round, `depth` rounds long.
    struct Deepening {
        rounds: usize,
        depth: usize,
    }

    impl Stage for Deepening {
        fn scan(&mut self, paths: Vec<PathBuf>, mut next: Chain<'_, '_>) -> Vec<PathBuf> {
            let paths = next.scan(paths);
            self.rounds += 1;
            if self.rounds >= self.depth {
                return Vec::new();
            }
            paths.iter().map(|p| p.join("sub")).collect()
        }
    }

    #[test]
    fn chain_puts_stage_in_front() {
        let log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline
            .chain(Recorder {
                name: "last",
                log: log.clone(),
            })
            .chain(Recorder {
                name: "first",
                log: log.clone(),
            });
        pipeline.run(vec![PathBuf::from("root")], true);

        assert_eq!(
            *log.borrow(),
            vec!["first:scan", "last:scan", "first:finalize", "last:finalize"]
        );
    }

    #[test]
    fn unchanged_paths_stop_the_loop() {
        let log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline.chain(Recorder {
            name: "only",
            log: log.clone(),
        });
        // Recorder hands the paths back unchanged, so one round is enough.
        pipeline.run(vec![PathBuf::from("root")], true);
        assert_eq!(*log.borrow(), vec!["only:scan", "only:finalize"]);
    }

    #[test]
    fn recursion_runs_until_nothing_is_left() {
        let log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline
            .chain(Recorder {
                name: "rec",
                log: log.clone(),
            })
            .chain(Deepening {
                rounds: 0,
                depth: 3,
            });
        pipeline.run(vec![PathBuf::from("root")], true);

        let scans = log.borrow().iter().filter(|l| *l == "rec:scan").count();
        assert_eq!(scans, 3);
        assert_eq!(log.borrow().last().map(String::as_str), Some("rec:finalize"));
    }

    #[test]
    fn non_recursive_runs_one_round() {
        let log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline
            .chain(Recorder {
                name: "rec",
                log: log.clone(),
            })
            .chain(Deepening {
                rounds: 0,
                depth: 10,
            });
        pipeline.run(vec![PathBuf::from("root")], false);

        assert_eq!(*log.borrow(), vec!["rec:scan", "rec:finalize"]);
    }

    #[test]
    fn empty_chain_passes_paths_through() {
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        let mut chain = Chain::new(&mut stages);
        assert!(chain.is_empty());
        assert_eq!(chain.scan(vec![PathBuf::from("a")]), vec![PathBuf::from("a")]);
    }
}
