//! Conversion plans: the ordered dictionary rounds behind each direction.
//!
//! A [`ConversionPlan`] is 1–3 [`DictRound`]s. Each round names a [`Slot`]
//! (an ordered dictionary group) and carries that slot's prebuilt
//! [`StarterUnion`]; the orchestrator resolves the slot back to concrete
//! dictionary references at execution time, so plans stay free of borrows
//! and can be cached and shared across threads.
//!
//! [`PlanCache`] memoizes one plan per `(direction, punctuation)` pair.
//! Because rounds reference slot-level unions, every plan that uses e.g. the
//! S2T group shares a single union instance with all the others.

use std::sync::{Arc, OnceLock};

use crate::config::{Config, CONFIG_COUNT};
use crate::dictionary_lib::{DictionarySet, Slot, StarterUnion};

/// One conversion round: a dictionary group and its starter union.
///
/// The union must have been built from exactly the slot's dictionaries;
/// [`DictionarySet::union_for`] guarantees that pairing.
pub struct DictRound {
    /// The dictionary group consulted in this round (probe order = precedence).
    pub slot: Slot,
    /// Merged starter metadata for the group, shared across plans.
    pub union: Arc<StarterUnion>,
}

/// An ordered sequence of 1–3 rounds executed for one
/// `(direction, punctuation)` pair. Immutable once built.
pub struct ConversionPlan {
    rounds: Vec<DictRound>,
}

impl ConversionPlan {
    /// Builds the plan for `config`, resolving each round's union through the
    /// set's slot cache.
    ///
    /// The round table is fixed. `punctuation` only widens the S2T/T2S
    /// rounds with the matching punctuation table.
    pub fn build(set: &DictionarySet, config: Config, punctuation: bool) -> Self {
        let punct = punctuation;
        let slots: Vec<Slot> = match config {
            Config::S2T => vec![Slot::S2T { punct }],
            Config::T2S => vec![Slot::T2S { punct }],
            Config::S2Tw => vec![Slot::S2T { punct }, Slot::TwVariantsOnly],
            Config::Tw2S => vec![Slot::TwRevPair, Slot::T2S { punct }],
            Config::S2Twp => vec![
                Slot::S2T { punct },
                Slot::TwPhrasesOnly,
                Slot::TwVariantsOnly,
            ],
            Config::Tw2Sp => vec![Slot::Tw2SpRevTriple, Slot::T2S { punct }],
            Config::S2Hk => vec![Slot::S2T { punct }, Slot::HkVariantsOnly],
            Config::Hk2S => vec![Slot::HkRevPair, Slot::T2S { punct }],
            Config::T2Tw => vec![Slot::TwVariantsOnly],
            Config::T2Twp => vec![Slot::TwPhrasesOnly, Slot::TwVariantsOnly],
            Config::Tw2T => vec![Slot::TwRevPair],
            Config::Tw2Tp => vec![Slot::TwRevPair, Slot::TwPhrasesRevOnly],
            Config::T2Hk => vec![Slot::HkVariantsOnly],
            Config::Hk2T => vec![Slot::HkRevPair],
            Config::T2Jp => vec![Slot::JpVariantsOnly],
            Config::Jp2T => vec![Slot::JpRevTriple],
        };

        let rounds = slots
            .into_iter()
            .map(|slot| DictRound {
                slot,
                union: set.union_for(slot),
            })
            .collect();

        Self { rounds }
    }

    /// The rounds, in execution order.
    #[inline]
    pub fn rounds(&self) -> &[DictRound] {
        &self.rounds
    }
}

/// Thread-safe memo of plans, keyed by `(direction, punctuation)`.
///
/// Readers are lock-free once a slot is initialized; a racing first build is
/// allowed but only one result is ever stored (`OnceLock` semantics).
/// Published together with its dictionary set inside
/// [`ProviderCache`](crate::provider::ProviderCache), so swapping the
/// provider swaps the whole cache atomically.
#[derive(Default)]
pub struct PlanCache {
    plans: [OnceLock<Arc<ConversionPlan>>; CONFIG_COUNT * 2],
}

impl PlanCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached plan for `(config, punctuation)`, building it on
    /// first use from `set`.
    pub fn get_plan(
        &self,
        set: &DictionarySet,
        config: Config,
        punctuation: bool,
    ) -> Arc<ConversionPlan> {
        let idx = config.index() * 2 + punctuation as usize;
        self.plans[idx]
            .get_or_init(|| Arc::new(ConversionPlan::build(set, config, punctuation)))
            .clone()
    }

    /// Drops every cached plan; they rebuild lazily on next use.
    pub fn clear(&mut self) {
        self.plans = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_tables_match_the_direction_semantics() {
        let set = DictionarySet::default();

        let plan = ConversionPlan::build(&set, Config::S2T, false);
        let slots: Vec<Slot> = plan.rounds().iter().map(|r| r.slot).collect();
        assert_eq!(slots, vec![Slot::S2T { punct: false }]);

        let plan = ConversionPlan::build(&set, Config::S2Twp, true);
        let slots: Vec<Slot> = plan.rounds().iter().map(|r| r.slot).collect();
        assert_eq!(
            slots,
            vec![
                Slot::S2T { punct: true },
                Slot::TwPhrasesOnly,
                Slot::TwVariantsOnly
            ]
        );

        let plan = ConversionPlan::build(&set, Config::Tw2Sp, false);
        let slots: Vec<Slot> = plan.rounds().iter().map(|r| r.slot).collect();
        assert_eq!(slots, vec![Slot::Tw2SpRevTriple, Slot::T2S { punct: false }]);

        let plan = ConversionPlan::build(&set, Config::Jp2T, false);
        let slots: Vec<Slot> = plan.rounds().iter().map(|r| r.slot).collect();
        assert_eq!(slots, vec![Slot::JpRevTriple]);
    }

    #[test]
    fn punctuation_only_touches_st_ts_rounds() {
        let set = DictionarySet::default();
        for punct in [false, true] {
            let plan = ConversionPlan::build(&set, Config::T2Tw, punct);
            let slots: Vec<Slot> = plan.rounds().iter().map(|r| r.slot).collect();
            assert_eq!(slots, vec![Slot::TwVariantsOnly]);
        }
    }

    #[test]
    fn plans_are_cached_per_direction_and_punctuation() {
        let set = DictionarySet::default();
        let cache = PlanCache::new();

        let a = cache.get_plan(&set, Config::S2T, false);
        let b = cache.get_plan(&set, Config::S2T, false);
        assert!(std::ptr::eq(Arc::as_ptr(&a), Arc::as_ptr(&b)));

        let c = cache.get_plan(&set, Config::S2T, true);
        assert!(!std::ptr::eq(Arc::as_ptr(&a), Arc::as_ptr(&c)));
    }

    #[test]
    fn plans_share_slot_unions() {
        let set = DictionarySet::default();
        let cache = PlanCache::new();

        // S2Tw round 2 and T2Tw round 1 both use the TwVariantsOnly slot.
        let s2tw = cache.get_plan(&set, Config::S2Tw, false);
        let t2tw = cache.get_plan(&set, Config::T2Tw, false);
        let u1 = &s2tw.rounds()[1].union;
        let u2 = &t2tw.rounds()[0].union;
        assert!(std::ptr::eq(Arc::as_ptr(u1), Arc::as_ptr(u2)));
    }

    #[test]
    fn clear_drops_cached_plans() {
        let set = DictionarySet::default();
        let mut cache = PlanCache::new();
        let a = cache.get_plan(&set, Config::S2T, false);
        cache.clear();
        let b = cache.get_plan(&set, Config::S2T, false);
        assert!(!std::ptr::eq(Arc::as_ptr(&a), Arc::as_ptr(&b)));
    }
}
