//! Dynamic option hooks.
//!
//! A hook receives the design under test and the backend's private options
//! after every other layer has been merged, and returns replacement options.
//! Hooks run in registration order; each sees the previous one's output.

use std::fmt;
use std::sync::Arc;

use crate::dut::DesignUnderTest;
use crate::options::{ToolCompileOptions, ToolExecuteOptions};

type HookFn<T> = Arc<dyn Fn(&DesignUnderTest, T) -> T + Send + Sync>;

/// A hook with a name for logs and diagnostics.
pub struct NamedHook<T> {
    name: String,
    hook: HookFn<T>,
}

impl<T> NamedHook<T> {
    /// Wraps `hook` under `name`.
    pub fn new<F>(name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&DesignUnderTest, T) -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            hook: Arc::new(hook),
        }
    }

    /// Name the hook was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the hook.
    pub fn apply(&self, dut: &DesignUnderTest, options: T) -> T {
        (self.hook)(dut, options)
    }
}

impl<T> Clone for NamedHook<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            hook: Arc::clone(&self.hook),
        }
    }
}

impl<T> fmt::Debug for NamedHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedHook").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Ordered compile and execute hooks shared by a set of backends.
#[derive(Debug, Clone, Default)]
pub struct HookSet {
    compile: Vec<NamedHook<ToolCompileOptions>>,
    execute: Vec<NamedHook<ToolExecuteOptions>>,
}

impl HookSet {
    /// An empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a compile hook after the existing ones.
    #[must_use]
    pub fn with_compile_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&DesignUnderTest, ToolCompileOptions) -> ToolCompileOptions + Send + Sync + 'static,
    {
        self.compile.push(NamedHook::new(name, hook));
        self
    }

    /// Registers an execute hook after the existing ones.
    #[must_use]
    pub fn with_execute_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&DesignUnderTest, ToolExecuteOptions) -> ToolExecuteOptions + Send + Sync + 'static,
    {
        self.execute.push(NamedHook::new(name, hook));
        self
    }

    /// Folds every compile hook over `options`, first registered first.
    #[must_use]
    pub fn apply_compile(&self, dut: &DesignUnderTest, options: ToolCompileOptions) -> ToolCompileOptions {
        self.compile.iter().fold(options, |acc, h| h.apply(dut, acc))
    }

    /// Folds every execute hook over `options`, first registered first.
    #[must_use]
    pub fn apply_execute(&self, dut: &DesignUnderTest, options: ToolExecuteOptions) -> ToolExecuteOptions {
        self.execute.iter().fold(options, |acc, h| h.apply(dut, acc))
    }

    /// Names of all hooks, compile hooks first.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.compile
            .iter()
            .map(NamedHook::name)
            .chain(self.execute.iter().map(NamedHook::name))
            .collect()
    }

    /// Returns true if no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compile.is_empty() && self.execute.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_compose_left_to_right() {
        let hooks = HookSet::new()
            .with_compile_hook("first", |_, o: ToolCompileOptions| o.with_extra_arg("a"))
            .with_compile_hook("second", |_, o: ToolCompileOptions| {
                let mut o = o;
                o.extra_args = o.extra_args.iter().map(|a| format!("{a}!")).collect();
                o.with_extra_arg("b")
            });
        let dut = DesignUnderTest::new("gcd", "GCD");
        let out = hooks.apply_compile(&dut, ToolCompileOptions::default());
        assert_eq!(out.extra_args, vec!["a!", "b"]);
        assert_eq!(hooks.names(), vec!["first", "second"]);
    }

    #[test]
    fn hooks_can_key_off_the_design() {
        let hooks = HookSet::new().with_execute_hook("soc-only", |dut, o: ToolExecuteOptions| {
            if dut.name == "soc" {
                o.with_extra_arg("+ntb_random_seed=1")
            } else {
                o
            }
        });
        let soc = hooks.apply_execute(&DesignUnderTest::new("soc", "Top"), ToolExecuteOptions::default());
        let gcd = hooks.apply_execute(&DesignUnderTest::new("gcd", "GCD"), ToolExecuteOptions::default());
        assert_eq!(soc.extra_args.len(), 1);
        assert!(gcd.extra_args.is_empty());
    }

    #[test]
    fn empty_set_is_identity() {
        let hooks = HookSet::new();
        assert!(hooks.is_empty());
        let opts = ToolCompileOptions::default().with_extra_arg("-full64");
        let dut = DesignUnderTest::new("gcd", "GCD");
        assert_eq!(hooks.apply_compile(&dut, opts.clone()), opts);
    }
}
