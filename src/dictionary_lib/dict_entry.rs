//! Dictionary entry type with global and per-starter length metadata.
//!
//! This module defines [`DictEntry`], the core keyed mapping used by
//! **opencc-fmm16** for greedy longest-match replacement.
//!
//! ## Overview
//!
//! `DictEntry` stores a mapping from phrase keys to replacement values, both
//! as boxed UTF-16 code-unit slices (`Box<[u16]>`), along with:
//!
//! - Global key-length bounds `min_len`/`max_len` (in UTF-16 units; both 0
//!   for an empty entry).
//! - A **global key-length mask** (`length_mask`) covering lengths `1..=64`
//!   (bit `n-1` ⇢ length `n`), plus the `long_lengths` set for the rare keys
//!   longer than 64 units.
//! - A **per-starter length mask** (`starter_len_mask`) and **per-starter
//!   cap** (`starter_cap`), keyed by the starter scalar — the key's first
//!   grapheme, spanning 1 BMP unit or a 2-unit surrogate pair.
//!
//! The per-starter maps are consumed by
//! [`StarterUnion`](crate::dictionary_lib::StarterUnion), which merges them
//! across the dictionaries of one conversion round. The match engine itself
//! only asks an individual entry [`supports_length`](DictEntry::supports_length)
//! before probing its map.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::utils::starter_scalar;

/// Print a developer note to **stderr** in *debug* builds; **no-op** in release.
///
/// This macro accepts the same syntax as [`eprintln!`], but only emits output
/// when `cfg(debug_assertions)` is enabled. It is used for soft diagnostics
/// while loading user-supplied lexicons (e.g. conflicting duplicate keys)
/// that should never fail or spam release users.
#[macro_export]
macro_rules! debug_note {
    ($($arg:tt)*) => {
        #[allow(unused)]
        {
            if cfg!(debug_assertions) {
                eprintln!($($arg)*);
            }
        }
    };
}

/// A single keyed mapping with precomputed length metadata, optimized for
/// zero-allocation lookups from the match engine.
///
/// Keys and values are stored as `Box<[u16]>` so the engine can probe the map
/// directly with subslices of the input span and splice replacement values
/// into its UTF-16 output buffer without any intermediate `String`.
///
/// # Invariants
///
/// - `min_len <= max_len`; both are 0 iff `map` is empty.
/// - For every key of length `n <= 64`, bit `n-1` of [`length_mask`] is set;
///   for `n > 64`, `n` is in [`long_lengths`].
/// - `starter_len_mask[s]` has bit `n-1` set iff some key of length `n <= 64`
///   starts with starter `s`; `starter_cap[s]` is the true maximum key length
///   for `s` (it may exceed 64).
/// - No key starts with a lone surrogate. Keys built from `&str` satisfy this
///   by construction; deserialized entries are checked in
///   [`rehydrate`](Self::rehydrate).
///
/// Entries are built once (from lexicon text or a persisted blob) and are
/// immutable afterwards.
///
/// [`length_mask`]: Self::length_mask
/// [`long_lengths`]: Self::long_lengths
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct DictEntry {
    /// Phrase (UTF-16 units) → replacement (UTF-16 units).
    #[serde(default)]
    pub map: FxHashMap<Box<[u16]>, Box<[u16]>>,

    /// Global maximum key length in UTF-16 units; 0 when empty.
    #[serde(default)]
    pub max_len: usize,

    /// Global minimum key length in UTF-16 units; 0 when empty.
    #[serde(default)]
    pub min_len: usize,

    /// Global key-length presence mask for lengths `1..=64`
    /// (bit `n-1` ⇒ at least one key of length `n`).
    #[serde(default)]
    pub length_mask: u64,

    /// Key lengths above 64 units. Rarely populated; probed by
    /// [`supports_length`](Self::supports_length) for the tail lengths the
    /// mask cannot represent.
    #[serde(default)]
    pub long_lengths: FxHashSet<u16>,

    /// Sparse per-starter length bitmask (lengths `1..=64` as bits 0..=63),
    /// keyed by the starter scalar (BMP unit or combined surrogate pair).
    #[serde(default)]
    pub starter_len_mask: FxHashMap<char, u64>,

    /// Sparse per-starter maximum key length (true maximum, may exceed 64).
    #[serde(default)]
    pub starter_cap: FxHashMap<char, u16>,
}

impl DictEntry {
    /// Builds an entry from `(key, value)` string pairs, computing all length
    /// metadata on the fly.
    ///
    /// Keys and values are re-encoded to UTF-16; pairs whose key or value
    /// encodes to nothing are skipped. Duplicate keys are **last-wins**,
    /// matching the lexicon text-file contract; a conflicting duplicate gets
    /// a `debug_note!` in debug builds.
    pub fn build_from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        use std::collections::hash_map::Entry;

        let it = pairs.into_iter();
        let (lower, _) = it.size_hint();

        let mut map: FxHashMap<Box<[u16]>, Box<[u16]>> = FxHashMap::default();
        if lower > 0 {
            map.reserve(lower);
        }
        let mut starter_len_mask: FxHashMap<char, u64> = FxHashMap::default();
        let mut starter_cap: FxHashMap<char, u16> = FxHashMap::default();
        let mut long_lengths: FxHashSet<u16> = FxHashSet::default();

        let mut length_mask = 0u64;
        let mut global_min = usize::MAX;
        let mut global_max = 0usize;

        for (k, v) in it {
            let key: Box<[u16]> = k.encode_utf16().collect::<Vec<_>>().into_boxed_slice();
            let value: Box<[u16]> = v.encode_utf16().collect::<Vec<_>>().into_boxed_slice();
            if key.is_empty() || value.is_empty() {
                continue;
            }

            // Coming from &str the starter is always a whole scalar.
            let Some(starter) = starter_scalar(&key) else {
                continue;
            };

            let len = key.len();
            let cap = u16::try_from(len).unwrap_or(u16::MAX);

            Self::set_len_bit(&mut length_mask, len);
            if len > 64 {
                long_lengths.insert(cap);
            }

            let mask = starter_len_mask.entry(starter).or_insert(0u64);
            Self::set_len_bit(mask, len);
            let cap_slot = starter_cap.entry(starter).or_insert(0);
            if cap > *cap_slot {
                *cap_slot = cap;
            }

            global_min = global_min.min(len);
            global_max = global_max.max(len);

            match map.entry(key) {
                Entry::Vacant(e) => {
                    e.insert(value);
                }
                Entry::Occupied(mut e) => {
                    if e.get().as_ref() != value.as_ref() {
                        debug_note!("duplicate key overridden (last-wins): key={:?}", k);
                    }
                    e.insert(value);
                }
            }
        }

        let min_len = if map.is_empty() { 0 } else { global_min };
        let max_len = if map.is_empty() { 0 } else { global_max };

        debug_assert!(
            (max_len == 0 && min_len == 0) || (min_len >= 1 && min_len <= max_len),
            "min_len/max_len invariant violated: min_len={}, max_len={}",
            min_len,
            max_len
        );

        Self {
            map,
            max_len,
            min_len,
            length_mask,
            long_lengths,
            starter_len_mask,
            starter_cap,
        }
    }

    /// Set the bit for a given `len` (1..=64) in a `u64` mask.
    ///
    /// Bit index is `len - 1`. Lengths > 64 are ignored (by the mask layout).
    #[inline(always)]
    fn set_len_bit(mask: &mut u64, len: usize) {
        let b = len.wrapping_sub(1);
        if b < 64 {
            *mask |= 1u64 << b;
        }
    }

    /// Fast global gate: does this entry contain **any key** of length `len`?
    ///
    /// Combines the range check with the exact `length_mask` bit for
    /// `len <= 64` and the `long_lengths` set beyond it. This is the only
    /// per-dictionary filter the match engine applies before a map probe.
    #[inline(always)]
    pub fn supports_length(&self, len: usize) -> bool {
        if len == 0 || len < self.min_len || len > self.max_len {
            return false;
        }
        if len <= 64 {
            (self.length_mask >> (len - 1)) & 1 != 0
        } else {
            u16::try_from(len)
                .map(|l| self.long_lengths.contains(&l))
                .unwrap_or(false)
        }
    }

    /// Minimum present length (1..=64) encoded in a `u64` mask, or `None` if
    /// the mask is empty. Equivalent to "index of least-significant set bit + 1".
    #[inline(always)]
    pub const fn min_len_from_mask(mask: u64) -> Option<usize> {
        if mask == 0 {
            None
        } else {
            Some(mask.trailing_zeros() as usize + 1)
        }
    }

    /// Maximum present length (1..=64) encoded in a `u64` mask, or `None` if
    /// the mask is empty. Equivalent to "bit width of mask".
    #[inline(always)]
    pub const fn max_len_from_mask(mask: u64) -> Option<usize> {
        if mask == 0 {
            None
        } else {
            Some(64 - mask.leading_zeros() as usize)
        }
    }

    /// Returns `true` if the entry holds no mappings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Re-derives every piece of length metadata from the raw `map` and
    /// validates the key space.
    ///
    /// Persisted forms are allowed to omit the starter indexes (and any other
    /// derived field); after deserialization this pass rebuilds them all from
    /// the keys, so the entry never depends on what a given container chose
    /// to store. It also rejects blobs that violate the key invariants:
    ///
    /// - empty keys or values,
    /// - keys starting with a lone surrogate (a phantom length-1 starter the
    ///   engine must never observe).
    ///
    /// # Errors
    /// A violation is reported as a corrupt-dictionary message naming the
    /// offending key; the caller attaches the slot name.
    pub fn rehydrate(&mut self) -> Result<(), String> {
        let mut length_mask = 0u64;
        let mut long_lengths: FxHashSet<u16> = FxHashSet::default();
        let mut starter_len_mask: FxHashMap<char, u64> = FxHashMap::default();
        let mut starter_cap: FxHashMap<char, u16> = FxHashMap::default();
        let mut global_min = usize::MAX;
        let mut global_max = 0usize;

        for (key, value) in &self.map {
            if key.is_empty() {
                return Err("empty key".to_string());
            }
            if value.is_empty() {
                return Err(format!(
                    "empty value for key {:?}",
                    String::from_utf16_lossy(key)
                ));
            }
            let Some(starter) = starter_scalar(key) else {
                return Err(format!(
                    "key starts with a lone surrogate: {:04X?}",
                    &key[..key.len().min(2)]
                ));
            };

            let len = key.len();
            let cap = u16::try_from(len).unwrap_or(u16::MAX);

            Self::set_len_bit(&mut length_mask, len);
            if len > 64 {
                long_lengths.insert(cap);
            }
            let mask = starter_len_mask.entry(starter).or_insert(0u64);
            Self::set_len_bit(mask, len);
            let cap_slot = starter_cap.entry(starter).or_insert(0);
            if cap > *cap_slot {
                *cap_slot = cap;
            }
            global_min = global_min.min(len);
            global_max = global_max.max(len);
        }

        self.length_mask = length_mask;
        self.long_lengths = long_lengths;
        self.starter_len_mask = starter_len_mask;
        self.starter_cap = starter_cap;
        self.min_len = if self.map.is_empty() { 0 } else { global_min };
        self.max_len = if self.map.is_empty() { 0 } else { global_max };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn build_collects_length_metadata() {
        let dict = DictEntry::build_from_pairs(pairs(&[
            ("你", "您"),
            ("你好", "您好"),
            ("一丝不挂", "一絲不掛"),
        ]));

        assert_eq!(dict.min_len, 1);
        assert_eq!(dict.max_len, 4);
        // Lengths 1, 2 and 4 present.
        assert_eq!(dict.length_mask, 0b1011);
        assert!(dict.long_lengths.is_empty());

        let mask = dict.starter_len_mask.get(&'你').copied().unwrap_or(0);
        assert_eq!(mask, 0b11);
        assert_eq!(dict.starter_cap.get(&'你').copied(), Some(2));
    }

    #[test]
    fn lengths_are_utf16_units_not_chars() {
        // '𠮷' is one scalar but two UTF-16 units.
        let dict = DictEntry::build_from_pairs(pairs(&[("𠮷", "吉"), ("𠮷野", "吉野")]));

        assert_eq!(dict.min_len, 2);
        assert_eq!(dict.max_len, 4);
        assert_eq!(dict.length_mask, 0b1010);

        let mask = dict.starter_len_mask.get(&'𠮷').copied().unwrap_or(0);
        assert_eq!(mask, 0b1010);
        assert_eq!(dict.starter_cap.get(&'𠮷').copied(), Some(4));
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let dict = DictEntry::build_from_pairs(pairs(&[("发", "發"), ("发", "髮")]));

        let key: Vec<u16> = "发".encode_utf16().collect();
        let expect: Vec<u16> = "髮".encode_utf16().collect();
        assert_eq!(dict.map.get(key.as_slice()).map(|v| v.as_ref()), Some(expect.as_slice()));
        assert_eq!(dict.map.len(), 1);
    }

    #[test]
    fn long_keys_fall_into_the_long_length_set() {
        let long_key: String = std::iter::repeat('漢').take(70).collect();
        let dict = DictEntry::build_from_pairs(vec![
            (long_key.clone(), "x".to_string()),
            ("漢".to_string(), "汉".to_string()),
        ]);

        assert_eq!(dict.max_len, 70);
        assert!(dict.long_lengths.contains(&70));
        assert!(dict.supports_length(70));
        assert!(!dict.supports_length(69));
        assert!(dict.supports_length(1));
        assert_eq!(dict.starter_cap.get(&'漢').copied(), Some(70));
    }

    #[test]
    fn supports_length_bounds() {
        let dict = DictEntry::build_from_pairs(pairs(&[("你好", "您好")]));
        assert!(!dict.supports_length(0));
        assert!(!dict.supports_length(1));
        assert!(dict.supports_length(2));
        assert!(!dict.supports_length(3));
    }

    #[test]
    fn empty_pairs_are_skipped() {
        let dict = DictEntry::build_from_pairs(pairs(&[("", "x"), ("你", "")]));
        assert!(dict.is_empty());
        assert_eq!(dict.min_len, 0);
        assert_eq!(dict.max_len, 0);
    }

    #[test]
    fn rehydrate_rebuilds_metadata_from_keys_alone() {
        let built = DictEntry::build_from_pairs(pairs(&[("你好", "您好"), ("𠮷", "吉")]));

        // Simulate a persisted form that stored only the raw map.
        let mut bare = DictEntry {
            map: built.map.clone(),
            ..DictEntry::default()
        };
        bare.rehydrate().unwrap();

        assert_eq!(bare.min_len, built.min_len);
        assert_eq!(bare.max_len, built.max_len);
        assert_eq!(bare.length_mask, built.length_mask);
        assert_eq!(bare.starter_len_mask, built.starter_len_mask);
        assert_eq!(bare.starter_cap, built.starter_cap);
    }

    #[test]
    fn rehydrate_rejects_lone_surrogate_keys() {
        let mut dict = DictEntry::default();
        dict.map.insert(
            vec![0xD842u16].into_boxed_slice(),
            "x".encode_utf16().collect::<Vec<_>>().into_boxed_slice(),
        );
        assert!(dict.rehydrate().is_err());
    }

    #[test]
    fn mask_bound_helpers() {
        assert_eq!(DictEntry::min_len_from_mask(0), None);
        assert_eq!(DictEntry::min_len_from_mask(0b1010), Some(2));
        assert_eq!(DictEntry::max_len_from_mask(0b1010), Some(4));
        assert_eq!(DictEntry::max_len_from_mask(1u64 << 63), Some(64));
    }
}
