//! Parsed-AST caches.
//!
//! Cache key: `⟨scope-prefix⟩||⟨expression-text⟩||⟨entry-kind⟩`. Definition-
//! and global-scoped entries live in a process-wide concurrent map;
//! execution- and context-scoped entries live in the per-context map.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use dmn_feel::Expr;
use tracing::trace;
use uuid::Uuid;

use crate::options::CacheScope;

static GLOBAL_CACHE: LazyLock<DashMap<String, Arc<Expr>>> = LazyLock::new(DashMap::new);

/// Distinguishes the two parse grammars (and the fallback) in the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Expression,
    UnaryTests,
}

impl EntryKind {
    fn id(self) -> &'static str {
        match self {
            EntryKind::Expression => "expr",
            EntryKind::UnaryTests => "unary",
        }
    }
}

/// The per-context cache plus the routing logic into the process-wide map.
#[derive(Debug, Default)]
pub struct AstCache {
    local: DashMap<String, Arc<Expr>>,
}

pub(crate) struct CacheKeys {
    pub context_id: Uuid,
    pub definition_id: Uuid,
    pub correlation_id: Uuid,
    pub scope: CacheScope,
}

impl AstCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(prefix: &str, text: &str, kind: EntryKind) -> String {
        format!("{prefix}||{text}||{}", kind.id())
    }

    fn route<'a>(&'a self, scope: CacheScope) -> &'a DashMap<String, Arc<Expr>> {
        match scope {
            CacheScope::Definition | CacheScope::Global => &GLOBAL_CACHE,
            _ => &self.local,
        }
    }

    fn prefix(keys: &CacheKeys) -> String {
        match keys.scope {
            CacheScope::None => Uuid::new_v4().to_string(),
            CacheScope::Execution => keys.correlation_id.to_string(),
            CacheScope::Context => keys.context_id.to_string(),
            CacheScope::Definition => keys.definition_id.to_string(),
            CacheScope::Global => String::new(),
        }
    }

    pub(crate) fn fetch(&self, keys: &CacheKeys, text: &str, kind: EntryKind) -> Option<Arc<Expr>> {
        let key = Self::key(&Self::prefix(keys), text, kind);
        self.route(keys.scope).get(&key).map(|e| e.value().clone())
    }

    pub(crate) fn store(&self, keys: &CacheKeys, text: &str, kind: EntryKind, ast: Arc<Expr>) {
        let key = Self::key(&Self::prefix(keys), text, kind);
        trace!(%key, "ast cached");
        self.route(keys.scope).insert(key, ast);
    }

    /// Drop all entries minted under one execute call's correlation id.
    pub fn purge_execution(&self, correlation_id: &Uuid) {
        let prefix = correlation_id.to_string();
        self.local.retain(|key, _| !key.starts_with(&prefix));
    }

    /// Drop every context-owned entry (context reset).
    pub fn purge_context(&self) {
        self.local.clear();
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }
}

/// Drop the process-wide entries belonging to one definition.
pub fn purge_definition_cache(definition_id: &Uuid) {
    let prefix = definition_id.to_string();
    GLOBAL_CACHE.retain(|key, _| !key.starts_with(&prefix));
}

/// Drop every process-wide entry (definition- and global-scoped).
pub fn purge_global_cache() {
    GLOBAL_CACHE.clear();
}
