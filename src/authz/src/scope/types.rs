//! Scope type definitions
//!
//! A scope narrows where a granted permission applies. The built-in
//! scopes form a containment chain ALL ⊇ GROUP ⊇ SELF; custom tags sit
//! outside the chain and match only exactly.

use crate::error::AuthzError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Containment-ordered access scope
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// The acting user's own records (stored as "SELF")
    #[serde(rename = "SELF")]
    Own,
    /// Records belonging to one of the user's groups
    #[serde(rename = "GROUP")]
    Group,
    /// Everything
    #[serde(rename = "ALL")]
    All,
    /// Deployment-defined tag outside the containment chain
    Custom(String),
}

impl Scope {
    /// Position in the containment chain; custom tags have none
    pub fn width(&self) -> Option<u8> {
        match self {
            Scope::Own => Some(0),
            Scope::Group => Some(1),
            Scope::All => Some(2),
            Scope::Custom(_) => None,
        }
    }

    /// Whether a grant at `self` is at least as wide as `requested`.
    /// `All` covers everything, including custom tags; custom tags cover
    /// only themselves.
    pub fn covers(&self, requested: &Scope) -> bool {
        match (self, requested) {
            (Scope::All, _) => true,
            (Scope::Custom(a), Scope::Custom(b)) => a == b,
            (Scope::Custom(_), _) | (_, Scope::Custom(_)) => false,
            (a, b) => a.width() >= b.width(),
        }
    }
}

impl FromStr for Scope {
    type Err = AuthzError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "SELF" => Ok(Scope::Own),
            "GROUP" => Ok(Scope::Group),
            "ALL" => Ok(Scope::All),
            "" => Err(AuthzError::InvalidScope("empty scope tag".to_string())),
            custom => Ok(Scope::Custom(custom.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Own => write!(f, "SELF"),
            Scope::Group => write!(f, "GROUP"),
            Scope::All => write!(f, "ALL"),
            Scope::Custom(tag) => write!(f, "{}", tag),
        }
    }
}

/// Set of scopes attached to one or more grants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSet(BTreeSet<Scope>);

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse storage tags into a set. An empty tag list is an unscoped
    /// legacy grant and resolves to `{ALL}` — maximally permissive, a
    /// deliberate and auditable default rather than an oversight.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> crate::error::Result<Self> {
        if tags.is_empty() {
            return Ok(Self::from_iter([Scope::All]));
        }
        let mut set = Self::new();
        for tag in tags {
            set.insert(tag.as_ref().parse()?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, scope: Scope) {
        self.0.insert(scope);
    }

    pub fn contains(&self, scope: &Scope) -> bool {
        self.0.contains(scope)
    }

    pub fn union_with(&mut self, other: &ScopeSet) {
        for scope in &other.0 {
            self.0.insert(scope.clone());
        }
    }

    /// Widest scope on the containment chain, if any is present
    pub fn widest(&self) -> Option<&Scope> {
        self.0
            .iter()
            .filter(|scope| scope.width().is_some())
            .max_by_key(|scope| scope.width())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
