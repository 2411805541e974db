//! Run driver: seeds the task queue and drains it.
//!
//! Two kinds of job flow through the queue. `Mirror` jobs run the
//! [`MirrorCoordinator`] on one address. `Enumerate` jobs drain a
//! [`RepositorySource`] and submit one `Mirror` job per address it yields, so
//! mirroring starts while a paginated listing is still being fetched.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};

use crate::config::Config;
use crate::coordinator::{MirrorCoordinator, MirrorOutcome};
use crate::error::{Error, Result};
use crate::github::GithubOrg;
use crate::queue::{QueueReport, TaskQueue};
use crate::source::RepositorySource;

/// A unit of work in a mirror run
#[derive(Clone)]
pub enum Job {
    /// Mirror one remote address (and, transitively, its submodules).
    Mirror { address: String },
    /// List a source and queue a mirror for every address it yields.
    Enumerate { source: Arc<dyn RepositorySource> },
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Mirror { address } => f.debug_struct("Mirror").field("address", address).finish(),
            Job::Enumerate { source } => f
                .debug_struct("Enumerate")
                .field("source", &source.name())
                .finish(),
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub tasks: QueueReport,
    /// Distinct local targets claimed during the run.
    pub mirrored: usize,
}

/// Owns the queue and coordinator for a single run
pub struct Driver {
    queue: TaskQueue<Job>,
    coordinator: MirrorCoordinator,
}

impl Driver {
    pub fn new(coordinator: MirrorCoordinator, workers: usize) -> Result<Self> {
        Ok(Self {
            queue: TaskQueue::new(workers)?,
            coordinator,
        })
    }

    /// Queue a mirror task per address
    pub fn seed<I, S>(&self, addresses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for address in addresses {
            let address = address.into();
            let description = format!("Mirror {}", address);
            self.queue.submit(Job::Mirror { address }, description);
        }
    }

    /// Queue the enumeration of `source`
    pub fn seed_source(&self, source: Arc<dyn RepositorySource>) {
        let description = format!("Enumerate {}", source.name());
        self.queue.submit(Job::Enumerate { source }, description);
    }

    /// Queue everything `[gather]` names: the explicit remotes, then one
    /// enumeration per GitHub organization.
    pub fn seed_from_config(&self, config: &Config) -> Result<()> {
        self.seed(config.gather.remotes.iter().cloned());
        for (org, github) in &config.gather.github {
            self.seed_source(Arc::new(GithubOrg::new(org, github)?));
        }
        Ok(())
    }

    /// Number of tasks queued so far
    pub fn queued(&self) -> usize {
        self.queue.outstanding()
    }

    /// Drain the queue, including every submodule task discovered on the way.
    pub fn run(self) -> Result<RunSummary> {
        let Self { queue, coordinator } = self;
        info!(
            "Mirroring into {} with {} workers",
            coordinator.storage_root().display(),
            queue.workers()
        );

        let tasks = queue.run_to_completion(|queue, job| execute(&coordinator, queue, job))?;
        let mirrored = coordinator.mirrored().len()?;

        info!(
            "Run finished: {} mirrored, {} tasks completed, {} failed",
            mirrored, tasks.completed, tasks.failed
        );
        Ok(RunSummary { tasks, mirrored })
    }
}

fn execute(coordinator: &MirrorCoordinator, queue: &TaskQueue<Job>, job: Job) -> Result<()> {
    match job {
        Job::Mirror { address } => {
            let outcome = coordinator.mirror(&address, queue)?;
            match outcome {
                MirrorOutcome::Cloned { submodules, .. } | MirrorOutcome::Updated { submodules, .. } => {
                    debug!("{} has {} submodules", address, submodules)
                }
                MirrorOutcome::Skipped { .. } | MirrorOutcome::DryRun { .. } => {}
            }
            Ok(())
        }
        Job::Enumerate { source } => enumerate(source.as_ref(), queue),
    }
}

fn enumerate(source: &dyn RepositorySource, queue: &TaskQueue<Job>) -> Result<()> {
    let as_source_error = |e: Error| Error::Source {
        source_name: source.name(),
        message: e.to_string(),
    };

    let mut count = 0;
    for address in source.remotes().map_err(as_source_error)? {
        let address = address.map_err(as_source_error)?;
        let description = format!("Mirror {}", address);
        queue.submit(Job::Mirror { address }, description);
        count += 1;
    }

    info!("{} yielded {} remotes", source.name(), count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Remotes, StaticSource};
    use crate::vcs::{HeadFile, VcsExecutor};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockVcs {
        clones: Mutex<Vec<String>>,
        gitmodules: HashMap<PathBuf, String>,
    }

    impl VcsExecutor for MockVcs {
        fn mirror_clone(&self, remote: &str, _local: &Path) -> Result<()> {
            self.clones.lock().unwrap().push(remote.to_string());
            Ok(())
        }

        fn remote_update(&self, _local: &Path) -> Result<()> {
            Ok(())
        }

        fn read_head_file(&self, local: &Path, _filename: &str) -> Result<HeadFile> {
            Ok(match self.gitmodules.get(local) {
                Some(text) => HeadFile::Present(text.clone()),
                None => HeadFile::Absent,
            })
        }
    }

    /// Yields one address and then fails
    struct BrokenSource;

    impl RepositorySource for BrokenSource {
        fn name(&self) -> String {
            "broken".to_string()
        }

        fn remotes(&self) -> Result<Remotes<'_>> {
            Ok(Box::new(
                vec![
                    Ok("git@host:first.git".to_string()),
                    Err(Error::Queue {
                        message: "page 2 unavailable".to_string(),
                    }),
                ]
                .into_iter(),
            ))
        }
    }

    fn driver(root: &Path, vcs: Arc<MockVcs>, workers: usize) -> Driver {
        Driver::new(MirrorCoordinator::new(root, Vec::new(), vcs), workers).unwrap()
    }

    #[test]
    fn test_run_follows_submodules_transitively() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let mut vcs = MockVcs::default();
        vcs.gitmodules.insert(
            root.join("host/org/app.git"),
            "[submodule \"lib\"]\n\turl = ../lib.git\n".to_string(),
        );
        vcs.gitmodules.insert(
            root.join("host/org/lib.git"),
            "[submodule \"core\"]\n\turl = ../core.git\n[submodule \"app\"]\n\turl = ../app.git\n"
                .to_string(),
        );
        let vcs = Arc::new(vcs);

        let driver = driver(root, vcs.clone(), 4);
        driver.seed(["ssh://git@host/org/app.git"]);
        let summary = driver.run().unwrap();

        let mut clones = vcs.clones.lock().unwrap().clone();
        clones.sort();
        assert_eq!(
            clones,
            vec![
                "ssh://git@host/org/app.git",
                "ssh://git@host/org/core.git",
                "ssh://git@host/org/lib.git",
            ]
        );
        assert_eq!(summary.mirrored, 3);
        // app, lib, core, and the cyclic reference back to app
        assert_eq!(summary.tasks.completed, 4);
        assert_eq!(summary.tasks.failed, 0);
    }

    #[test]
    fn test_duplicate_seeds_mirror_once() {
        let temp = TempDir::new().unwrap();
        let vcs = Arc::new(MockVcs::default());
        let driver = driver(temp.path(), vcs.clone(), 2);
        driver.seed(vec!["git@host:a.git", "git@host:a.git", "ssh://git@host/a.git"]);
        assert_eq!(driver.queued(), 3);

        let summary = driver.run().unwrap();
        assert_eq!(vcs.clones.lock().unwrap().len(), 1);
        assert_eq!(summary.mirrored, 1);
    }

    #[test]
    fn test_enumerate_source_queues_mirrors() {
        let temp = TempDir::new().unwrap();
        let vcs = Arc::new(MockVcs::default());
        let driver = driver(temp.path(), vcs.clone(), 2);
        driver.seed_source(Arc::new(StaticSource::new(
            "fixed",
            vec!["git@host:a.git".to_string(), "git@host:b.git".to_string()],
        )));

        let summary = driver.run().unwrap();
        assert_eq!(summary.tasks.completed, 3);
        assert_eq!(summary.mirrored, 2);
    }

    #[test]
    fn test_source_error_fails_only_its_task() {
        let temp = TempDir::new().unwrap();
        let vcs = Arc::new(MockVcs::default());
        let driver = driver(temp.path(), vcs.clone(), 2);
        driver.seed_source(Arc::new(BrokenSource));
        driver.seed(["git@host:second.git"]);

        let summary = driver.run().unwrap();
        assert_eq!(summary.tasks.failed, 1);
        // The address yielded before the error is still mirrored
        assert_eq!(summary.tasks.completed, 2);
        assert_eq!(summary.mirrored, 2);
    }

    #[test]
    fn test_enumerate_wraps_errors_with_source_name() {
        let queue = TaskQueue::new(1).unwrap();
        let err = enumerate(&BrokenSource, &queue).unwrap_err();
        match err {
            Error::Source {
                source_name,
                message,
            } => {
                assert_eq!(source_name, "broken");
                assert!(message.contains("page 2 unavailable"));
            }
            other => panic!("expected Source error, got {:?}", other),
        }
        assert_eq!(queue.outstanding(), 1);
    }

    #[test]
    fn test_seed_from_config_remotes() {
        let temp = TempDir::new().unwrap();
        let config = Config::parse(
            "[gather]\nremotes = [\"git@host:a.git\", \"git@host:b.git\"]\n",
        )
        .unwrap();
        let driver = driver(temp.path(), Arc::new(MockVcs::default()), 1);
        driver.seed_from_config(&config).unwrap();
        assert_eq!(driver.queued(), 2);
    }

    #[test]
    fn test_empty_run() {
        let temp = TempDir::new().unwrap();
        let summary = driver(temp.path(), Arc::new(MockVcs::default()), 3)
            .run()
            .unwrap();
        assert_eq!(summary.tasks, QueueReport::default());
        assert_eq!(summary.mirrored, 0);
    }

    #[test]
    fn test_job_debug_names_source() {
        let job = Job::Enumerate {
            source: Arc::new(StaticSource::new("fixed", Vec::new())),
        };
        assert_eq!(format!("{:?}", job), "Enumerate { source: \"fixed\" }");
    }
}
