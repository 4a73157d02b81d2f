use rustc_hash::FxHashMap;

use crate::dictionary_lib::DictEntry;
use crate::utils::{combine_surrogates, is_high_surrogate, is_low_surrogate};

/// Union view of starter metadata across the dictionaries of one round.
///
/// `StarterUnion` merges the per-starter length masks, caps and minima of
/// several [`DictEntry`] tables, so the match engine performs a single
/// starter lookup per input position when matching across a whole group.
///
/// - **BMP** starters (one UTF-16 unit, `0x0000..=0xFFFF`) are stored densely
///   in fixed-size arrays indexed by the unit value.
/// - **Astral** starters (a 2-unit surrogate pair) are sparse, keyed by the
///   combined scalar.
///
/// Per starter, the union records:
/// - `mask`: bitmask of available key lengths (bit `n-1` ⇒ length `n`, for
///   `n <= 64`),
/// - `cap`: the longest key length across the group (true maximum, may
///   exceed 64),
/// - `min`: the shortest key length across the group (a lower bound of 65 is
///   recorded for starters whose keys are all longer than 64 units).
///
/// A starter is *known* to the union iff its `cap` is nonzero.
///
/// # Invariants
/// - `bmp_mask.len() == bmp_cap.len() == bmp_min.len() == 0x10000`.
/// - For every key `k` in any merged dict: `mask[starter(k)]` has bit
///   `|k|-1` set when `|k| <= 64`, and `cap[starter(k)] >= |k|`.
///
/// Built once per dictionary group (and cached by slot, see
/// [`Slot`](crate::dictionary_lib::Slot)); immutable and freely sharable
/// across threads afterwards.
#[derive(Default, Debug)]
pub struct StarterUnion {
    /// Dense BMP length bitmasks, indexed by the starter unit.
    pub bmp_mask: Vec<u64>, // 0x10000

    /// Dense BMP per-starter maximum key length (UTF-16 units).
    pub bmp_cap: Vec<u16>, // 0x10000

    /// Dense BMP per-starter minimum key length (UTF-16 units); 0 = unknown starter.
    pub bmp_min: Vec<u16>, // 0x10000

    /// Sparse length bitmasks for astral starters.
    pub astral_mask: FxHashMap<char, u64>,

    /// Sparse per-starter maximum key length for astral starters.
    pub astral_cap: FxHashMap<char, u16>,

    /// Sparse per-starter minimum key length for astral starters.
    pub astral_min: FxHashMap<char, u16>,

    /// Maximum `cap` over all starters — the longest key in the whole group.
    pub global_cap: usize,
}

/// One starter lookup, resolved against an input position.
///
/// `step` is the grapheme step at that position: 2 iff the position begins a
/// valid surrogate pair **and** the union knows the combined scalar as a
/// starter; 1 otherwise. `cap == 0` means no key in the group starts here.
#[derive(Clone, Copy, Debug)]
pub struct StarterProbe {
    pub step: usize,
    pub cap: u16,
    pub mask: u64,
    pub min_len: u16,
}

impl StarterUnion {
    /// Builds the union of starter metadata from the dictionaries of one
    /// round, iterating each dict's sparse per-starter maps rather than
    /// sweeping the whole BMP.
    ///
    /// Masks are bitwise-ORed, caps keep the element-wise maximum, minima the
    /// element-wise (nonzero) minimum. A starter whose mask is empty but
    /// whose cap is set (keys all longer than 64 units) contributes a
    /// minimum of 65 — a safe lower bound for the engine's gating.
    pub fn build(dicts: &[&DictEntry]) -> Self {
        const N: usize = 0x10000;
        let mut bmp_mask = vec![0u64; N];
        let mut bmp_cap = vec![0u16; N];
        let mut bmp_min = vec![0u16; N];
        let mut astral_mask: FxHashMap<char, u64> = FxHashMap::default();
        let mut astral_cap: FxHashMap<char, u16> = FxHashMap::default();
        let mut astral_min: FxHashMap<char, u16> = FxHashMap::default();

        for d in dicts {
            for (&c0, &cap) in &d.starter_cap {
                if cap == 0 {
                    continue;
                }
                let mask = d.starter_len_mask.get(&c0).copied().unwrap_or(0);
                let min = DictEntry::min_len_from_mask(mask)
                    .map(|m| m as u16)
                    .unwrap_or(65);

                let cp = c0 as u32;
                if cp <= 0xFFFF {
                    let i = cp as usize;
                    bmp_mask[i] |= mask;
                    if cap > bmp_cap[i] {
                        bmp_cap[i] = cap;
                    }
                    if bmp_min[i] == 0 || min < bmp_min[i] {
                        bmp_min[i] = min;
                    }
                } else {
                    *astral_mask.entry(c0).or_insert(0) |= mask;
                    astral_cap
                        .entry(c0)
                        .and_modify(|m| {
                            if cap > *m {
                                *m = cap;
                            }
                        })
                        .or_insert(cap);
                    astral_min
                        .entry(c0)
                        .and_modify(|m| {
                            if min < *m {
                                *m = min;
                            }
                        })
                        .or_insert(min);
                }
            }
        }

        let global_cap = dicts.iter().map(|d| d.max_len).max().unwrap_or(0);

        Self {
            bmp_mask,
            bmp_cap,
            bmp_min,
            astral_mask,
            astral_cap,
            astral_min,
            global_cap,
        }
    }

    /// Resolves the starter at `span[pos]`.
    ///
    /// The step is 2 only when the position begins a well-formed surrogate
    /// pair *and* the union knows the combined scalar; otherwise the 1-unit
    /// starter is used. An unrecognised pair therefore degrades to two
    /// unknown single units, which the engine echoes back-to-back — the pair
    /// survives intact in the output.
    #[inline(always)]
    pub fn probe(&self, span: &[u16], pos: usize) -> StarterProbe {
        let c0 = span[pos];
        if is_high_surrogate(c0) {
            if let Some(&c1) = span.get(pos + 1) {
                if is_low_surrogate(c1) {
                    let scalar = combine_surrogates(c0, c1);
                    if let Some(&cap) = self.astral_cap.get(&scalar) {
                        return StarterProbe {
                            step: 2,
                            cap,
                            mask: self.astral_mask.get(&scalar).copied().unwrap_or(0),
                            min_len: self.astral_min.get(&scalar).copied().unwrap_or(0),
                        };
                    }
                }
            }
        }
        let i = c0 as usize;
        StarterProbe {
            step: 1,
            cap: self.bmp_cap[i],
            mask: self.bmp_mask[i],
            min_len: self.bmp_min[i],
        }
    }
}
