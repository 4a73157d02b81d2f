//! Provider facade: the process-wide active dictionary set and its plan
//! cache, replaceable as one atomic unit.
//!
//! The pair `(set, plan cache)` lives behind a single shared reference.
//! Publishing a new set swaps the whole [`ProviderCache`] record, so an
//! observer either sees the old set with the old cache or the new set with a
//! freshly empty cache — never a mix. Converters that captured the previous
//! record keep using it consistently until they are rebuilt.

use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::config::Config;
use crate::dictionary_lib::DictionarySet;
use crate::plan::{ConversionPlan, PlanCache};
use crate::OpenCC;

/// An immutable pairing of a dictionary set with the plan cache bound to it.
///
/// Neither half is ever mutated in place: replacement happens by swapping
/// the whole record through [`use_custom`]/[`reset_to_default`].
pub struct ProviderCache {
    /// The active dictionary set.
    pub set: Arc<DictionarySet>,
    /// Plans built against `set`, keyed by `(direction, punctuation)`.
    plans: PlanCache,
}

impl ProviderCache {
    /// Wraps a set with a freshly empty plan cache.
    pub fn new(set: DictionarySet) -> Self {
        Self {
            set: Arc::new(set),
            plans: PlanCache::new(),
        }
    }

    /// Returns the plan for `(config, punctuation)`, building and caching it
    /// on first use.
    #[inline]
    pub fn get_plan(&self, config: Config, punctuation: bool) -> Arc<ConversionPlan> {
        self.plans.get_plan(&self.set, config, punctuation)
    }
}

/// Builds the default set from the bundled lexicon, falling back to an empty
/// set (with a last-error note) if the embedded data fails to parse.
fn default_set() -> DictionarySet {
    DictionarySet::new().unwrap_or_else(|err| {
        OpenCC::set_last_error(&format!("Failed to create dictionary: {}", err));
        DictionarySet::default()
    })
}

// The active provider. Constructed lazily on first need.
static ACTIVE: Lazy<RwLock<Arc<ProviderCache>>> =
    Lazy::new(|| RwLock::new(Arc::new(ProviderCache::new(default_set()))));

/// Returns the currently active provider/cache pair.
///
/// The returned `Arc` pins that pair: a later [`use_custom`] does not affect
/// plans already resolved through it.
pub fn current() -> Arc<ProviderCache> {
    ACTIVE.read().unwrap().clone()
}

/// Atomically replaces the active dictionary set, publishing a fresh plan
/// cache bound to it.
pub fn use_custom(set: DictionarySet) {
    let next = Arc::new(ProviderCache::new(set));
    *ACTIVE.write().unwrap() = next;
}

/// Restores the bundled default set (with a fresh plan cache).
pub fn reset_to_default() {
    use_custom(default_set());
}
