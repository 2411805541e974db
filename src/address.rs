//! # Remote Repository Addresses
//!
//! Git accepts three surface syntaxes for a remote:
//!
//! - **URL**: `scheme://[user@]host[:port]/path`, e.g.
//!   `ssh://git@example.com:2222/org/repo.git`
//! - **SCP-like**: `[user@]host:path`, e.g. `git@github.com:org/repo.git`
//! - **File**: a bare filesystem path, optionally prefixed with `file://`
//!
//! [`RemoteAddress::parse`] recognizes all three and never fails: anything
//! that matches neither structured pattern is a file path. The parsed value
//! can be written back out with [`RemoteAddress::deparse`], resolved against
//! a submodule-relative URL with [`RemoteAddress::join`], and mapped to its
//! place in local storage with [`RemoteAddress::local_path`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(\w+)://(?:([^/?#@:]+)@)?([^/?#@:]*)(?::(\d+))?(/.*)$")
        .expect("URL address pattern is valid")
});

static SCP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?:([^/?#@:]+)@)?([^/?#@:]*):(.*)$").expect("SCP address pattern is valid")
});

const FILE_PREFIX: &str = "file://";

/// Which surface syntax an address was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Url,
    Scp,
    File,
}

/// A parsed remote repository address.
///
/// Every component is stored without its separator (`user` has no `@`,
/// `port` has no `:`); missing components are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteAddress {
    kind: AddressKind,
    scheme: String,
    user: String,
    host: String,
    port: String,
    path: String,
}

impl RemoteAddress {
    /// Parse an address. Tries the URL pattern, then the SCP pattern, and
    /// falls back to a file path.
    ///
    /// A `file://` prefix always produces a file address, with the prefix
    /// removed from the path.
    pub fn parse(s: &str) -> Self {
        if let Some(path) = s.strip_prefix(FILE_PREFIX) {
            return Self::file(path);
        }

        if let Some(caps) = URL_PATTERN.captures(s) {
            let group = |i| caps.get(i).map_or("", |m| m.as_str()).to_string();
            return Self {
                kind: AddressKind::Url,
                scheme: group(1),
                user: group(2),
                host: group(3),
                port: group(4),
                path: group(5),
            };
        }

        if let Some(caps) = SCP_PATTERN.captures(s) {
            let group = |i| caps.get(i).map_or("", |m| m.as_str()).to_string();
            return Self {
                kind: AddressKind::Scp,
                scheme: String::new(),
                user: group(1),
                host: group(2),
                port: String::new(),
                path: group(3),
            };
        }

        Self::file(s)
    }

    fn file(path: &str) -> Self {
        Self {
            kind: AddressKind::File,
            scheme: String::new(),
            user: String::new(),
            host: String::new(),
            port: String::new(),
            path: path.to_string(),
        }
    }

    /// Serialize back to a connection string for this address's syntax.
    pub fn deparse(&self) -> String {
        let user = if self.user.is_empty() {
            String::new()
        } else {
            format!("{}@", self.user)
        };

        match self.kind {
            AddressKind::Url => {
                let port = if self.port.is_empty() {
                    String::new()
                } else {
                    format!(":{}", self.port)
                };
                format!(
                    "{}://{}{}{}{}",
                    self.scheme, user, self.host, port, self.path
                )
            }
            AddressKind::Scp => format!("{}{}:{}", user, self.host, self.path),
            AddressKind::File => format!("{}{}", self.host, self.path),
        }
    }

    /// Resolve a remote-relative path against this address.
    ///
    /// A leading `/` replaces the path outright. Otherwise each leading `../`
    /// drops one trailing component of the current path and whatever is left
    /// of `relative` is appended. Everything but the path is kept, so the
    /// result has the same syntax, host and credentials as `self`.
    pub fn join(&self, relative: &str) -> Self {
        let path = if relative.starts_with('/') {
            relative.to_string()
        } else {
            let rooted = self.path.starts_with('/');
            let mut components: Vec<&str> =
                self.path.split('/').filter(|c| !c.is_empty()).collect();

            let mut rest = relative;
            loop {
                if let Some(stripped) = rest.strip_prefix("../") {
                    components.pop();
                    rest = stripped;
                } else if rest == ".." {
                    components.pop();
                    rest = "";
                } else {
                    break;
                }
            }
            if !rest.is_empty() {
                components.push(rest);
            }

            let joined = components.join("/");
            if rooted {
                format!("/{}", joined)
            } else {
                joined
            }
        };

        Self {
            path,
            ..self.clone()
        }
    }

    /// Where a mirror of this address lives under `root`: `root / host / path`.
    ///
    /// The host and path components are folded lexically: empty and `.`
    /// components are dropped and `..` removes the previous one, stopping at
    /// `root`. Two spellings of one directory therefore give the same target,
    /// and no address can name a directory outside `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        let mut components: Vec<&str> = Vec::new();
        for component in std::iter::once(self.host.as_str()).chain(self.path.split('/')) {
            match component {
                "" | "." => {}
                ".." => {
                    components.pop();
                }
                component => components.push(component),
            }
        }

        let mut target = root.to_path_buf();
        target.extend(components);
        target
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.deparse())
    }
}
