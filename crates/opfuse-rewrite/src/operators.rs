//! Operator name tables.
//!
//! Evidence types name their methods with words (`plus`, `eqv`), while the
//! enrichment methods call sites use are often symbolic (`+`, `===`). A
//! table maps an operator spelling to the evidence method name. Lookup is
//! total through [`OperatorNames::resolve`]: a spelling with no entry is
//! used as the method name unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Capability shared by all operator tables.
///
/// Tables are read-only once built and may be shared between threads.
pub trait OperatorNames: Send + Sync {
    /// Canonical method name for `spelling`, if the table has one.
    fn lookup(&self, spelling: &str) -> Option<&str>;

    /// Resolve a method name, passing unmapped names through.
    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.lookup(name).unwrap_or(name)
    }

    /// All entries this table knows about, for listing.
    fn entries(&self) -> Vec<(&str, &str)> {
        Vec::new()
    }
}

/// Built-in spellings, grouped by the algebraic structure that defines them.
const DEFAULT_OPERATORS: &[(&str, &str)] = &[
    // Eq
    ("===", "eqv"),
    ("=!=", "neqv"),
    // Order
    (">", "gt"),
    (">=", "gteqv"),
    ("<", "lt"),
    ("<=", "lteqv"),
    // Semigroup / Group
    ("|+|", "combine"),
    ("|-|", "remove"),
    // Ring
    ("unary_-", "negate"),
    ("+", "plus"),
    ("-", "minus"),
    ("*", "times"),
    ("**", "pow"),
    // EuclideanRing
    ("/~", "quot"),
    ("%", "mod"),
    ("/%", "quotmod"),
    // Field
    ("/", "div"),
    // BooleanAlgebra
    ("^", "xor"),
    ("|", "or"),
    ("&", "and"),
    ("unary_~", "complement"),
    ("unary_!", "complement"),
    // BitString
    ("<<", "leftShift"),
    (">>>", "rightShift"),
    (">>", "signedRightShift"),
    // VectorSpace
    ("*:", "timesl"),
    (":*", "timesr"),
    (":/", "divr"),
    ("\u{22C5}", "dot"),
    // GroupAction
    ("|+|>", "actl"),
    ("<|+|", "actr"),
    ("+>", "gplusl"),
    ("<+", "gplusr"),
    ("*>", "gtimesl"),
    ("<*", "gtimesr"),
    // Torsor
    ("<|-|>", "pdiff"),
    ("<->", "pminus"),
];

/// The fixed built-in table.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultOperators;

impl OperatorNames for DefaultOperators {
    fn lookup(&self, spelling: &str) -> Option<&str> {
        DEFAULT_OPERATORS
            .iter()
            .find(|(sym, _)| *sym == spelling)
            .map(|(_, name)| *name)
    }

    fn entries(&self) -> Vec<(&str, &str)> {
        DEFAULT_OPERATORS.to_vec()
    }
}

/// A table with no entries: every name resolves to itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityOperators;

impl OperatorNames for IdentityOperators {
    fn lookup(&self, _spelling: &str) -> Option<&str> {
        None
    }
}

/// A table of overrides layered over a shared base table.
///
/// Adding entries never touches the base, so any number of derived tables
/// can share one default table.
#[derive(Clone)]
pub struct OperatorTable {
    base: Arc<dyn OperatorNames>,
    overrides: BTreeMap<String, String>,
}

impl OperatorTable {
    /// The built-in table with no overrides.
    pub fn new() -> Self {
        Self::over(Arc::new(DefaultOperators))
    }

    /// An empty layer over `base`.
    pub fn over(base: Arc<dyn OperatorNames>) -> Self {
        Self {
            base,
            overrides: BTreeMap::new(),
        }
    }

    /// Add or replace an entry.
    pub fn with(mut self, spelling: impl Into<String>, method: impl Into<String>) -> Self {
        self.overrides.insert(spelling.into(), method.into());
        self
    }

    /// A new table whose base is this one.
    pub fn derive(&self) -> Self {
        Self::over(Arc::new(self.clone()))
    }

    /// Entries defined in this layer only.
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides
            .iter()
            .map(|(spelling, method)| (spelling.as_str(), method.as_str()))
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorTable")
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl OperatorNames for OperatorTable {
    fn lookup(&self, spelling: &str) -> Option<&str> {
        self.overrides
            .get(spelling)
            .map(String::as_str)
            .or_else(|| self.base.lookup(spelling))
    }

    fn entries(&self) -> Vec<(&str, &str)> {
        let mut merged: BTreeMap<&str, &str> = self.base.entries().into_iter().collect();
        merged.extend(self.overrides());
        merged.into_iter().collect()
    }
}
