//! Invocation plans: the fully resolved description of one job submission.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Stage, ValidationError};
use crate::path::WorkPath;

/// Unique identifier for a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Creates a new random job ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shell-style glob compiled to an anchored regex.
///
/// Supports `*` (within one component), `?` (one non-separator character)
/// and `**` (any number of components).
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compiles a glob.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::InvalidPattern {
                pattern: raw,
                reason: "empty glob".to_string(),
            });
        }
        let regex = Regex::new(&glob_to_regex(&raw)).map_err(|e| ValidationError::InvalidPattern {
            pattern: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { raw, regex })
    }

    /// Returns the glob as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if the (relative) path matches the glob.
    #[must_use]
    pub fn is_match(&self, relative: &str) -> bool {
        self.regex.is_match(relative)
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for GlobPattern {}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

/// Outputs whose names are not known until the job has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobOutput {
    /// Directory the glob is evaluated under.
    pub dir: WorkPath,
    /// Glob over paths relative to `dir`.
    pub pattern: GlobPattern,
}

/// Where a job's outputs are expected to appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputLayout {
    /// Outputs with fixed, known paths.
    pub files: Vec<WorkPath>,
    /// Outputs discovered by glob after completion.
    pub globs: Vec<GlobOutput>,
}

impl OutputLayout {
    /// Returns true if `path` is a declared output.
    #[must_use]
    pub fn matches(&self, path: &WorkPath) -> bool {
        if self.files.iter().any(|f| f == path) {
            return true;
        }
        self.globs.iter().any(|g| {
            path.starts_with(&g.dir) && g.pattern.is_match(path.relative_to(&g.dir).as_str())
        })
    }
}

/// The fully resolved command line, inputs and expected outputs of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlan {
    /// Stage this plan belongs to.
    pub stage: Stage,
    /// Name of the backend that produced the plan.
    pub backend: String,
    /// Command tokens. Paths are relative to `run_dir`.
    pub command: Vec<String>,
    /// Directory the command runs in.
    pub run_dir: WorkPath,
    /// Files that must exist before the job starts.
    pub inputs: Vec<WorkPath>,
    /// Directory the job writes into.
    pub output_dir: WorkPath,
    /// Opaque resource tags for the engine.
    pub resources: Vec<String>,
    /// Declared outputs.
    pub outputs: OutputLayout,
    /// File name the driver must find among the outputs, if any.
    pub expected_output: Option<String>,
}

impl InvocationPlan {
    /// Rejects plans no engine could run.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.command.first().map_or(true, |c| c.trim().is_empty()) {
            return Err(ValidationError::EmptyCommand { stage: self.stage });
        }
        Ok(())
    }

    /// Stable content digest of the plan.
    ///
    /// Covers everything that affects what the job does: stage, command,
    /// run and output directories, inputs and resources.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut h = blake3::Hasher::new();
        hash_field(&mut h, "stage", [stage_tag(self.stage)]);
        hash_field(&mut h, "command", self.command.iter().map(String::as_str));
        hash_field(&mut h, "run_dir", [self.run_dir.as_str()]);
        hash_field(&mut h, "inputs", self.inputs.iter().map(WorkPath::as_str));
        hash_field(&mut h, "output_dir", [self.output_dir.as_str()]);
        hash_field(&mut h, "resources", self.resources.iter().map(String::as_str));
        h.finalize().to_hex().to_string()
    }
}

fn hash_field<'a>(h: &mut blake3::Hasher, tag: &str, items: impl IntoIterator<Item = &'a str>) {
    h.update(tag.as_bytes());
    h.update(&[0x1e]);
    for item in items {
        h.update(item.as_bytes());
        h.update(&[0x1f]);
    }
}

const fn stage_tag(stage: Stage) -> &'static str {
    match stage {
        Stage::Compile => "compile",
        Stage::Execute => "execute",
    }
}
