//! Normalised path identity.
//!
//! Source files, include directories and produced artifacts are compared by
//! their lexically normalised path string. Two spellings of the same file
//! (`rtl/./top.sv`, `rtl//top.sv`) collapse to one identity, which is what
//! source deduplication and compiled-binary discovery key on.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A lexically normalised, `/`-separated path.
///
/// Normalisation never touches the filesystem: `.` components are dropped,
/// repeated separators collapse, and `..` cancels the preceding normal
/// component. A relative path may keep leading `..` components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct WorkPath(String);

impl WorkPath {
    /// Creates a normalised path from any string-like value.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize(raw.as_ref()))
    }

    /// Returns the normalised path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path as a `std::path::Path`.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Returns true if the path is rooted at `/`.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }

    /// Returns true if a relative path climbs above its starting directory.
    #[must_use]
    pub fn escapes_root(&self) -> bool {
        !self.is_absolute() && self.components().next() == Some("..")
    }

    /// Iterates over the non-root components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty() && *c != ".")
    }

    /// Returns the final component, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.components().last().filter(|c| *c != "..")
    }

    /// Appends `other` to this path. An absolute `other` replaces `self`.
    #[must_use]
    pub fn join(&self, other: impl AsRef<str>) -> Self {
        let other = other.as_ref();
        if other.starts_with('/') {
            return Self::new(other);
        }
        Self::new(format!("{}/{}", self.0, other))
    }

    /// Returns true if `self` lies at or below `dir`, compared component-wise.
    #[must_use]
    pub fn starts_with(&self, dir: &WorkPath) -> bool {
        if self.is_absolute() != dir.is_absolute() {
            return false;
        }
        let mut mine = self.components();
        dir.components().all(|c| mine.next() == Some(c))
    }

    /// Expresses `self` relative to `base`.
    ///
    /// Both paths must share the same anchoring (both absolute or both
    /// relative to the same root); otherwise `self` is returned unchanged.
    #[must_use]
    pub fn relative_to(&self, base: &WorkPath) -> Self {
        if self.is_absolute() != base.is_absolute() {
            return self.clone();
        }
        let target: Vec<&str> = self.components().collect();
        let from: Vec<&str> = base.components().collect();
        let common = target
            .iter()
            .zip(from.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = Vec::with_capacity(from.len() - common + target.len() - common);
        parts.extend(std::iter::repeat("..").take(from.len() - common));
        parts.extend(&target[common..]);
        if parts.is_empty() {
            return Self(".".to_string());
        }
        Self(parts.join("/"))
    }
}

fn normalize(raw: &str) -> String {
    let absolute = raw.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for comp in raw.split('/') {
        match comp {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // The parent of `/` is `/`.
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

impl From<String> for WorkPath {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for WorkPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<WorkPath> for String {
    fn from(path: WorkPath) -> Self {
        path.0
    }
}

impl AsRef<str> for WorkPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dots_and_separators() {
        assert_eq!(WorkPath::new("rtl/./core//alu.sv").as_str(), "rtl/core/alu.sv");
        assert_eq!(WorkPath::new("rtl/core/../top.sv").as_str(), "rtl/top.sv");
        assert_eq!(WorkPath::new("./").as_str(), ".");
        assert_eq!(WorkPath::new("a/").as_str(), "a");
        assert_eq!(WorkPath::new("../a").as_str(), "../a");
        assert_eq!(WorkPath::new("/../a").as_str(), "/a");
        assert_eq!(WorkPath::new("/").as_str(), "/");
    }

    #[test]
    fn equal_identity_for_different_spellings() {
        assert_eq!(WorkPath::new("rtl/top.sv"), WorkPath::new("./rtl//top.sv"));
    }

    #[test]
    fn relative_to_sibling_directory() {
        let src = WorkPath::new("rtl/top.sv");
        let run = WorkPath::new("build/sim/compile");
        assert_eq!(src.relative_to(&run).as_str(), "../../../rtl/top.sv");

        let bin = WorkPath::new("build/sim/compile/simv");
        let exec = WorkPath::new("build/sim/execute");
        assert_eq!(bin.relative_to(&exec).as_str(), "../compile/simv");
    }

    #[test]
    fn relative_to_self_is_dot() {
        let dir = WorkPath::new("build/out");
        assert_eq!(dir.relative_to(&dir).as_str(), ".");
    }

    #[test]
    fn relative_to_with_mixed_anchoring_is_identity() {
        let abs = WorkPath::new("/opt/tools/vcs");
        let run = WorkPath::new("build");
        assert_eq!(abs.relative_to(&run), abs);
    }

    #[test]
    fn starts_with_is_component_wise() {
        let p = WorkPath::new("build/compile/simv.daidir/lib.so");
        assert!(p.starts_with(&WorkPath::new("build/compile")));
        assert!(!p.starts_with(&WorkPath::new("build/comp")));
    }

    #[test]
    fn file_name_and_join() {
        let dir = WorkPath::new("build/compile");
        let bin = dir.join("simv");
        assert_eq!(bin.as_str(), "build/compile/simv");
        assert_eq!(bin.file_name(), Some("simv"));
        assert_eq!(dir.join("/abs/x").as_str(), "/abs/x");
    }

    #[test]
    fn escapes_root_detection() {
        assert!(WorkPath::new("../outside").escapes_root());
        assert!(!WorkPath::new("inside/../ok").escapes_root());
    }

    #[test]
    fn serde_roundtrip_normalizes() {
        let p: WorkPath = serde_json::from_str("\"a/./b\"").unwrap();
        assert_eq!(p.as_str(), "a/b");
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"a/b\"");
    }
}
