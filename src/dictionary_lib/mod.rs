//! Dictionary-processing layer of `opencc-fmm16`.
//!
//! This module provides the data model behind the conversion engine:
//!
//! - [`DictEntry`] — a single keyed mapping (UTF-16 units) with precomputed
//!   length metadata used during longest-match segmentation.
//! - [`DictionarySet`] — the fixed 18-slot OpenCC-compatible lexicon set,
//!   with loaders for embedded, plaintext and persisted forms.
//! - [`StarterUnion`] — merged per-starter lookup tables used to prune match
//!   lengths within one conversion round.
//! - [`Slot`] — the closed set of dictionary groups shared across plans.
//!
//! Although the module is publicly exposed for advanced users, most consumers
//! will interact only with the high-level [`OpenCC`](crate::OpenCC) API.
pub mod dictionary_set;
mod dict_entry;
mod starter_union;

pub use self::dict_entry::DictEntry;
pub use self::dictionary_set::{DictionaryError, DictionarySet, Slot, DICT_FILES};
pub use self::starter_union::{StarterProbe, StarterUnion};
