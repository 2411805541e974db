//! # Repository Mirror Library
//!
//! This library keeps local mirror clones of a set of git repositories, and of
//! every repository those reference as submodules, however deeply nested. It
//! is used by the `repo-mirror` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use repo_mirror::address::RemoteAddress;
//! use std::path::Path;
//!
//! let parent = RemoteAddress::parse("ssh://git@host/org/repo.git");
//! let dep = parent.join("../libs/dep.git");
//!
//! assert_eq!(dep.deparse(), "ssh://git@host/org/libs/dep.git");
//! assert_eq!(
//!     dep.local_path(Path::new("/srv/mirrors")),
//!     Path::new("/srv/mirrors/host/org/libs/dep.git")
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Addresses (`address`)**: Parsing of the three remote syntaxes git
//!   accepts (URL, scp-like, local path) and resolution of submodule URLs
//!   that are relative to their parent repository.
//! - **Task queue (`queue`)**: A fixed pool of workers draining a queue that
//!   grows while it is drained, and that knows when it is really finished.
//! - **Coordinator (`coordinator`)**: Mirrors one address and submits a task
//!   for each of its submodules. The shared claim set (`mirrored`) makes sure
//!   each local target is handled once per run.
//! - **Collaborators (`vcs`, `source`, `github`)**: The git executor and the
//!   providers that list repositories to mirror.
//!
//! ## Execution Flow
//!
//! The `driver` seeds the queue with one task per configured remote and one
//! enumeration task per repository source, then blocks until the queue has
//! drained. The graph of repositories is discovered as the run goes.

pub mod address;
pub mod config;
pub mod coordinator;
pub mod defaults;
pub mod driver;
pub mod error;
pub mod github;
pub mod inventory;
pub mod mirrored;
pub mod queue;
pub mod source;
pub mod vcs;

#[cfg(test)]
mod address_proptest;
