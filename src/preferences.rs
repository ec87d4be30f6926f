//! Caller-visible preferences: backend selection, output locations and
//! extra runtime arguments.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::BackendDescriptor;
use crate::config::defaults;
use crate::options::NamedArg;
use crate::path::WorkPath;

/// Identity-based backend matcher.
///
/// Serialisable so selections can come from configuration files or job
/// descriptions. For anything these variants cannot express, use
/// [`BackendFilter::custom`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendSelector {
    /// Every backend matches.
    Any,
    /// Exact backend name.
    Name {
        /// Backend name.
        name: String,
    },
    /// Exact vendor (case-insensitive).
    Vendor {
        /// Vendor name.
        vendor: String,
    },
    /// Exact test-driver identifier.
    TestDriver {
        /// Test-driver identifier.
        test_driver: String,
    },
    /// Waveform capability flag.
    Waveforms {
        /// Required capability value.
        enabled: bool,
    },
    /// All inner selectors must match.
    AllOf {
        /// Inner selectors.
        selectors: Vec<BackendSelector>,
    },
    /// At least one inner selector must match.
    AnyOf {
        /// Inner selectors.
        selectors: Vec<BackendSelector>,
    },
    /// Inner selector must not match.
    Not {
        /// Inner selector.
        selector: Box<BackendSelector>,
    },
}

impl BackendSelector {
    /// Selects by backend name.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name { name: name.into() }
    }

    /// Selects by vendor.
    #[must_use]
    pub fn vendor(vendor: impl Into<String>) -> Self {
        Self::Vendor {
            vendor: vendor.into(),
        }
    }

    /// Selects by test driver.
    #[must_use]
    pub fn test_driver(test_driver: impl Into<String>) -> Self {
        Self::TestDriver {
            test_driver: test_driver.into(),
        }
    }

    /// Selects by waveform capability.
    #[must_use]
    pub const fn waveforms(enabled: bool) -> Self {
        Self::Waveforms { enabled }
    }

    /// Conjunction of `self` and `other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::AllOf { mut selectors } => {
                selectors.push(other);
                Self::AllOf { selectors }
            }
            first => Self::AllOf {
                selectors: vec![first, other],
            },
        }
    }

    /// Returns true if the backend identity satisfies this selector.
    #[must_use]
    pub fn matches(&self, backend: &BackendDescriptor) -> bool {
        match self {
            Self::Any => true,
            Self::Name { name } => backend.name == *name,
            Self::Vendor { vendor } => backend.vendor.eq_ignore_ascii_case(vendor),
            Self::TestDriver { test_driver } => backend.test_driver == *test_driver,
            Self::Waveforms { enabled } => backend.waveforms == *enabled,
            Self::AllOf { selectors } => selectors.iter().all(|s| s.matches(backend)),
            Self::AnyOf { selectors } => selectors.iter().any(|s| s.matches(backend)),
            Self::Not { selector } => !selector.matches(backend),
        }
    }
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::Any
    }
}

impl fmt::Display for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, sep: &str, items: &[BackendSelector]) -> fmt::Result {
            write!(f, "(")?;
            for (i, s) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{s}")?;
            }
            write!(f, ")")
        }

        match self {
            Self::Any => write!(f, "any backend"),
            Self::Name { name } => write!(f, "name == {name:?}"),
            Self::Vendor { vendor } => write!(f, "vendor == {vendor:?}"),
            Self::TestDriver { test_driver } => write!(f, "test_driver == {test_driver:?}"),
            Self::Waveforms { enabled } => write!(f, "waveforms == {enabled}"),
            Self::AllOf { selectors } => list(f, "and", selectors),
            Self::AnyOf { selectors } => list(f, "or", selectors),
            Self::Not { selector } => write!(f, "not {selector}"),
        }
    }
}

type Predicate = Arc<dyn Fn(&BackendDescriptor) -> bool + Send + Sync>;

/// The backend-selection predicate of a request.
#[derive(Clone)]
pub enum BackendFilter {
    /// Identity match.
    Selector(BackendSelector),
    /// Arbitrary caller predicate, with a description used in errors.
    Custom {
        /// Human-readable description of the predicate.
        description: String,
        /// The predicate itself.
        predicate: Predicate,
    },
}

impl BackendFilter {
    /// Wraps an arbitrary predicate.
    pub fn custom<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&BackendDescriptor) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns true if the backend passes the filter.
    #[must_use]
    pub fn accepts(&self, backend: &BackendDescriptor) -> bool {
        match self {
            Self::Selector(selector) => selector.matches(backend),
            Self::Custom { predicate, .. } => predicate(backend),
        }
    }

    /// Describes the criteria, for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Selector(selector) => selector.to_string(),
            Self::Custom { description, .. } => description.clone(),
        }
    }
}

impl Default for BackendFilter {
    fn default() -> Self {
        Self::Selector(BackendSelector::Any)
    }
}

impl From<BackendSelector> for BackendFilter {
    fn from(selector: BackendSelector) -> Self {
        Self::Selector(selector)
    }
}

impl fmt::Debug for BackendFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
            Self::Custom { description, .. } => f
                .debug_struct("Custom")
                .field("description", description)
                .finish_non_exhaustive(),
        }
    }
}

/// User preferences attached to every request.
#[derive(Debug, Clone)]
pub struct UserPreferences {
    /// Which backends may serve the request.
    pub filter: BackendFilter,
    /// Output directory of the compile stage.
    pub compile_dir: WorkPath,
    /// Output directory of the execute stage.
    pub execute_dir: WorkPath,
    /// Runtime arguments appended at both compile and execute stages.
    pub plusargs: Vec<NamedArg>,
}

impl UserPreferences {
    /// Preferences with explicit output directories and no filtering.
    #[must_use]
    pub fn new(compile_dir: impl Into<WorkPath>, execute_dir: impl Into<WorkPath>) -> Self {
        Self {
            filter: BackendFilter::default(),
            compile_dir: compile_dir.into(),
            execute_dir: execute_dir.into(),
            plusargs: Vec::new(),
        }
    }

    /// Restricts backend selection.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<BackendFilter>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Adds a runtime argument applied at both stages.
    #[must_use]
    pub fn with_plusarg(mut self, arg: NamedArg) -> Self {
        self.plusargs.push(arg);
        self
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::new(defaults::COMPILE_DIR, defaults::EXECUTE_DIR)
    }
}
