//! Internal: cached StarterUnion variants for the fixed dictionary groups.

use std::sync::{Arc, OnceLock};

use super::DictionarySet;
use crate::dictionary_lib::{DictEntry, StarterUnion};

/// Cache slots for all union variants needed by the conversion plans.
/// Visible to the parent module only.
#[derive(Default, Debug)]
pub(super) struct Unions {
    // S2T / T2S (+ punct)
    s2t: OnceLock<Arc<StarterUnion>>,
    s2t_punct: OnceLock<Arc<StarterUnion>>,
    t2s: OnceLock<Arc<StarterUnion>>,
    t2s_punct: OnceLock<Arc<StarterUnion>>,

    // TW-only helpers
    tw_phrases_only: OnceLock<Arc<StarterUnion>>,
    tw_variants_only: OnceLock<Arc<StarterUnion>>,
    tw_phrases_rev_only: OnceLock<Arc<StarterUnion>>,
    tw_rev_pair: OnceLock<Arc<StarterUnion>>, // rev_phrases + rev
    tw2sp_rev_triple: OnceLock<Arc<StarterUnion>>, // phrases_rev + rev_phrases + rev

    // HK helpers
    hk_variants_only: OnceLock<Arc<StarterUnion>>,
    hk_rev_pair: OnceLock<Arc<StarterUnion>>, // rev_phrases + rev

    // JP helpers
    jp_variants_only: OnceLock<Arc<StarterUnion>>,
    jp_rev_triple: OnceLock<Arc<StarterUnion>>, // jps_phrases + jps_chars + jp_variants_rev

    // Script-detection helpers (single character table each)
    st_characters_only: OnceLock<Arc<StarterUnion>>,
    ts_characters_only: OnceLock<Arc<StarterUnion>>,
}

/// Semantic identifiers for the fixed dictionary groups used by conversion
/// rounds.
///
/// Each slot names an ordered list of dictionaries drawn from the set (probe
/// order = precedence), and owns one cached [`StarterUnion`] shared by every
/// plan that uses the slot — e.g. all S2T-first directions reuse one union.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// `st_phrases, st_characters` (+ `st_punctuations` when `punct`).
    S2T { punct: bool },
    /// `ts_phrases, ts_characters` (+ `ts_punctuations` when `punct`).
    T2S { punct: bool },

    /// `tw_phrases`.
    TwPhrasesOnly,
    /// `tw_variants`.
    TwVariantsOnly,
    /// `tw_phrases_rev`.
    TwPhrasesRevOnly,
    /// `tw_variants_rev_phrases, tw_variants_rev`.
    TwRevPair,
    /// `tw_phrases_rev, tw_variants_rev_phrases, tw_variants_rev`.
    Tw2SpRevTriple,

    /// `hk_variants`.
    HkVariantsOnly,
    /// `hk_variants_rev_phrases, hk_variants_rev`.
    HkRevPair,

    /// `jp_variants`.
    JpVariantsOnly,
    /// `jps_phrases, jps_characters, jp_variants_rev`.
    JpRevTriple,

    /// `st_characters` alone; used by script detection.
    StCharactersOnly,
    /// `ts_characters` alone; used by script detection.
    TsCharactersOnly,
}

impl DictionarySet {
    /// Resolves a slot to its ordered dictionary group.
    ///
    /// The order is load-bearing: at equal match length the earlier
    /// dictionary wins.
    pub fn slot_dicts(&self, slot: Slot) -> Vec<&DictEntry> {
        match slot {
            Slot::S2T { punct: false } => vec![&self.st_phrases, &self.st_characters],
            Slot::S2T { punct: true } => {
                vec![&self.st_phrases, &self.st_characters, &self.st_punctuations]
            }
            Slot::T2S { punct: false } => vec![&self.ts_phrases, &self.ts_characters],
            Slot::T2S { punct: true } => {
                vec![&self.ts_phrases, &self.ts_characters, &self.ts_punctuations]
            }
            Slot::TwPhrasesOnly => vec![&self.tw_phrases],
            Slot::TwVariantsOnly => vec![&self.tw_variants],
            Slot::TwPhrasesRevOnly => vec![&self.tw_phrases_rev],
            Slot::TwRevPair => vec![&self.tw_variants_rev_phrases, &self.tw_variants_rev],
            Slot::Tw2SpRevTriple => vec![
                &self.tw_phrases_rev,
                &self.tw_variants_rev_phrases,
                &self.tw_variants_rev,
            ],
            Slot::HkVariantsOnly => vec![&self.hk_variants],
            Slot::HkRevPair => vec![&self.hk_variants_rev_phrases, &self.hk_variants_rev],
            Slot::JpVariantsOnly => vec![&self.jp_variants],
            Slot::JpRevTriple => vec![
                &self.jps_phrases,
                &self.jps_characters,
                &self.jp_variants_rev,
            ],
            Slot::StCharactersOnly => vec![&self.st_characters],
            Slot::TsCharactersOnly => vec![&self.ts_characters],
        }
    }

    /// Returns the cached `StarterUnion` for a slot, building it on first
    /// use. A duplicate build race is harmless: `OnceLock` keeps exactly one
    /// result.
    #[inline]
    pub fn union_for(&self, slot: Slot) -> Arc<StarterUnion> {
        let cell = match slot {
            Slot::S2T { punct: false } => &self.unions.s2t,
            Slot::S2T { punct: true } => &self.unions.s2t_punct,
            Slot::T2S { punct: false } => &self.unions.t2s,
            Slot::T2S { punct: true } => &self.unions.t2s_punct,
            Slot::TwPhrasesOnly => &self.unions.tw_phrases_only,
            Slot::TwVariantsOnly => &self.unions.tw_variants_only,
            Slot::TwPhrasesRevOnly => &self.unions.tw_phrases_rev_only,
            Slot::TwRevPair => &self.unions.tw_rev_pair,
            Slot::Tw2SpRevTriple => &self.unions.tw2sp_rev_triple,
            Slot::HkVariantsOnly => &self.unions.hk_variants_only,
            Slot::HkRevPair => &self.unions.hk_rev_pair,
            Slot::JpVariantsOnly => &self.unions.jp_variants_only,
            Slot::JpRevTriple => &self.unions.jp_rev_triple,
            Slot::StCharactersOnly => &self.unions.st_characters_only,
            Slot::TsCharactersOnly => &self.unions.ts_characters_only,
        };
        cell.get_or_init(|| Arc::new(StarterUnion::build(&self.slot_dicts(slot))))
            .clone()
    }

    /// Reset all cached unions (rebuilds lazily on next use).
    #[inline]
    #[allow(dead_code)]
    pub(crate) fn clear_unions(&mut self) {
        self.unions = Unions::default();
    }
}

#[test]
fn union_cached() {
    let d = DictionarySet::default();
    let a = d.union_for(Slot::S2T { punct: false });
    let b = d.union_for(Slot::S2T { punct: false });
    assert!(std::ptr::eq(Arc::as_ptr(&a), Arc::as_ptr(&b)));
}

#[test]
fn union_init_once_parallel() {
    use rayon::prelude::*;
    let d = DictionarySet::default();
    (0..32).into_par_iter().for_each(|_| {
        let _ = d.union_for(Slot::S2T { punct: false });
    });
    // same pointer on repeated calls
    let a = d.union_for(Slot::S2T { punct: false });
    let b = d.union_for(Slot::S2T { punct: false });
    assert!(std::ptr::eq(Arc::as_ptr(&a), Arc::as_ptr(&b)));
}

#[test]
fn union_clear_invalidate() {
    let mut d = DictionarySet::default();
    let a = d.union_for(Slot::S2T { punct: false });
    d.clear_unions(); // resets OnceLocks
    let c = d.union_for(Slot::S2T { punct: false });
    assert!(!std::ptr::eq(Arc::as_ptr(&a), Arc::as_ptr(&c)));
}

#[test]
fn union_keys_distinct() {
    let d = DictionarySet::default();
    let a = d.union_for(Slot::S2T { punct: false });
    let b = d.union_for(Slot::S2T { punct: true });
    assert!(!std::ptr::eq(Arc::as_ptr(&a), Arc::as_ptr(&b)));
}

#[test]
fn slot_order_is_precedence_order() {
    let d = DictionarySet::default();
    let dicts = d.slot_dicts(Slot::JpRevTriple);
    assert_eq!(dicts.len(), 3);
    assert!(std::ptr::eq(dicts[0], &d.jps_phrases));
    assert!(std::ptr::eq(dicts[1], &d.jps_characters));
    assert!(std::ptr::eq(dicts[2], &d.jp_variants_rev));
}
