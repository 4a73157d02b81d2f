//! High-performance Chinese text converter using OpenCC lexicons and FMM
//! segmentation over UTF-16 code units.
//!
//! This crate provides efficient segment-based conversion between Simplified
//! and Traditional Chinese (plus the Taiwan, Hong Kong and Japanese Shinjitai
//! variants). It uses dictionary-based greedy longest-match with per-starter
//! length pruning and supports multistage translation via cached conversion
//! plans. Parallel processing is enabled for large input texts.
//!
//! The whole match pipeline is measured in UTF-16 code units: the input is
//! encoded once, every conversion round maps a unit buffer to a unit buffer,
//! and the result is decoded once at the end. Surrogate pairs are handled as
//! 2-unit starter graphemes throughout.
//!
//! # Example
//! ```rust
//! use opencc_fmm16::OpenCC;
//!
//! let input = "汉字转换测试";
//! let opencc = OpenCC::new();
//! let output = opencc.convert(input, "s2t", false);
//! assert_eq!(output, "漢字轉換測試");
//! ```
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::sync::{Arc, Mutex};

/// Conversion-direction registry.
pub mod config;
/// Delimiters helper for splitting and matching delimiters.
pub mod delimiter_set;
/// Dictionary utilities for managing multiple OpenCC lexicons.
pub mod dictionary_lib;
/// Conversion plans and the per-direction plan cache.
pub mod plan;
/// The process-wide provider facade (active set + plan cache).
pub mod provider;
/// UTF-16 code-unit helpers.
pub mod utils;

pub use crate::config::Config;
pub use crate::plan::{ConversionPlan, DictRound, PlanCache};
pub use crate::provider::ProviderCache;

use crate::delimiter_set::{is_delimiter_unit, split_ranges};
use crate::dictionary_lib::{DictEntry, DictionarySet, Slot, StarterUnion};
use crate::utils::prefix_scalars;

/// Thread-safe holder for the last error message (if any).
static LAST_ERROR: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

/// Regular expression used to strip non-Chinese content (and the ambiguous
/// character `著`) from the script-detection sample window.
static STRIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[!-/:-@\[-`{-~\t\n\v\f\r 0-9A-Za-z_著]").unwrap());

/// Orchestration thresholds, fixed once per process from the core count.
///
/// These are scheduling knobs only: serial and parallel paths must produce
/// identical output, so tuning them can never change observable behavior.
struct Tuning {
    /// Inputs shorter than this (in UTF-16 units) skip segmentation and run
    /// each round over the whole span.
    linear_cutoff: usize,
    /// Above this many units the orchestrator prefers the chunked parallel
    /// path even for modest range counts.
    parallel_text_gate: usize,
}

static TUNING: Lazy<Tuning> = Lazy::new(|| {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if cores <= 4 {
        Tuning {
            linear_cutoff: 8_000,
            parallel_text_gate: 150_000,
        }
    } else {
        Tuning {
            linear_cutoff: 10_000,
            parallel_text_gate: 100_000,
        }
    }
});

/// Maximum number of segment ranges the sequential stitcher will take on.
const PARALLEL_RANGE_GATE: usize = 1_000;
/// Consecutive ranges per parallel work item.
const BATCH_SIZE: usize = 256;

/// Iterates candidate match lengths in **descending order**, bounded to
/// `lower..=upper`, stopping early if the callback returns `true`.
///
/// Lengths above 64 are invisible to the 64-bit starter mask, so they are
/// walked unconditionally from `upper` down to 65 (per-dictionary
/// `supports_length` still gates them); lengths `1..=64` are visited by
/// walking the set bits of `mask` from high to low.
#[inline(always)]
fn for_each_len_desc(mask: u64, lower: usize, upper: usize, mut f: impl FnMut(usize) -> bool) {
    if upper == 0 || lower > upper {
        return;
    }
    if upper > 64 {
        for len in (65..=upper).rev() {
            if f(len) {
                return;
            }
        }
    }

    let limit = upper.min(64);
    if lower > limit || mask == 0 {
        return;
    }
    let hi = if limit >= 64 {
        !0u64
    } else {
        (1u64 << limit) - 1
    };
    let lo = (1u64 << (lower - 1)) - 1;
    let mut m = mask & hi & !lo;
    // Highest-set-bit iteration.
    while m != 0 {
        let bit_pos = 63 - m.leading_zeros() as usize; // 0-based
        if f(bit_pos + 1) {
            return;
        }
        m &= !(1u64 << bit_pos); // clear highest bit
    }
}

/// Central interface for performing OpenCC-based conversion with
/// segmentation.
///
/// An `OpenCC` captures the active provider (dictionary set + plan cache) at
/// construction and keeps using it consistently even if the process-wide
/// provider is swapped afterwards. It supports conversion directions such as
/// `s2t`, `t2s`, `s2tw`, etc., and uses maximum-match segmentation on
/// non-delimiter text regions to ensure accurate replacements.
pub struct OpenCC {
    /// The captured provider/cache pair.
    ctx: Arc<ProviderCache>,
    /// Direction used by [`convert_with`](Self::convert_with).
    config: Config,
    /// Flag indicator for parallelism.
    is_parallel: bool,
}

impl OpenCC {
    /// Creates a new `OpenCC` instance over the process-wide provider.
    ///
    /// The first construction lazily builds the default dictionary set from
    /// the lexicon bundled into the binary, so there is no I/O cost.
    ///
    /// # Panics
    /// Never panics. If the bundled dictionary fails to initialize, an empty
    /// set is substituted and the error is stored via
    /// [`set_last_error`](Self::set_last_error).
    pub fn new() -> Self {
        OpenCC {
            ctx: provider::current(),
            config: Config::S2T,
            is_parallel: true,
        }
    }

    /// Creates an instance over a private dictionary set, leaving the
    /// process-wide provider untouched.
    pub fn with_dictionary(set: DictionarySet) -> Self {
        OpenCC {
            ctx: Arc::new(ProviderCache::new(set)),
            config: Config::S2T,
            is_parallel: true,
        }
    }

    /// Creates an instance from plaintext lexicon files in `base_dir`
    /// (the 18 OpenCC dictionary files).
    ///
    /// On failure the error is recorded via
    /// [`set_last_error`](Self::set_last_error) and an empty dictionary is
    /// used, mirroring [`new`](Self::new)'s no-panic contract.
    pub fn from_dicts_dir(base_dir: &str) -> Self {
        let set = DictionarySet::from_dicts_dir(base_dir).unwrap_or_else(|err| {
            Self::set_last_error(&format!("Failed to create dictionary: {}", err));
            DictionarySet::default()
        });
        Self::with_dictionary(set)
    }

    /// Creates an instance by loading a serialized dictionary set from a
    /// CBOR file.
    ///
    /// On failure the error is recorded and an empty dictionary is used.
    pub fn from_cbor(filename: &str) -> Self {
        let set = DictionarySet::deserialize_from_cbor(filename).unwrap_or_else(|err| {
            Self::set_last_error(&format!("Failed to create dictionary: {}", err));
            DictionarySet::default()
        });
        Self::with_dictionary(set)
    }

    /// Returns whether parallel segment conversion is currently enabled.
    pub fn get_parallel(&self) -> bool {
        self.is_parallel
    }

    /// Enables or disables the parallel path for large inputs.
    ///
    /// Disabling forces the sequential stitcher regardless of input size;
    /// output is identical either way.
    pub fn set_parallel(&mut self, is_parallel: bool) {
        self.is_parallel = is_parallel;
    }

    /// The direction used by [`convert_with`](Self::convert_with).
    pub fn get_config(&self) -> Config {
        self.config
    }

    /// Sets the stored direction from a name.
    ///
    /// Unknown names fall back to the default direction (`s2t`) and record
    /// the error; the return value reports whether `name` parsed.
    pub fn set_config(&mut self, name: &str) -> bool {
        match Config::from_name(name) {
            Some(config) => {
                self.config = config;
                true
            }
            None => {
                Self::set_last_error(&format!("Invalid config: {}", name));
                self.config = Config::S2T;
                false
            }
        }
    }

    /// Converts Chinese text using the specified conversion configuration.
    ///
    /// This is the primary entry point. Supported configurations are the 16
    /// registry names (`s2t`, `t2s`, `s2tw`, `tw2s`, `s2twp`, `tw2sp`,
    /// `s2hk`, `hk2s`, `t2tw`, `t2twp`, `tw2t`, `tw2tp`, `t2hk`, `hk2t`,
    /// `t2jp`, `jp2t`), case-insensitive. `punctuation` additionally converts
    /// quote-style punctuation on the S2T/T2S-based directions.
    ///
    /// Bad input never raises: an unknown `config` records a last-error note
    /// and returns the input unchanged; empty input records a note and
    /// returns the empty string.
    ///
    /// # Example
    ///
    /// ```rust
    /// use opencc_fmm16::OpenCC;
    ///
    /// let converter = OpenCC::new();
    /// let traditional = converter.convert("汉字转换测试", "s2t", false);
    /// assert_eq!(traditional, "漢字轉換測試");
    /// ```
    pub fn convert(&self, input: &str, config: &str, punctuation: bool) -> String {
        match Config::from_name(config) {
            Some(cfg) => self.convert_config(input, cfg, punctuation),
            None => {
                Self::set_last_error(&format!("Invalid config: {}", config));
                input.to_string()
            }
        }
    }

    /// Converts using an already-parsed [`Config`].
    pub fn convert_config(&self, input: &str, config: Config, punctuation: bool) -> String {
        if input.is_empty() {
            Self::set_last_error("Empty input text");
            return String::new();
        }
        let plan = self.ctx.get_plan(config, punctuation);
        self.run_plan(input, &plan)
    }

    /// Converts using the stored direction (see
    /// [`set_config`](Self::set_config)).
    pub fn convert_with(&self, input: &str, punctuation: bool) -> String {
        self.convert_config(input, self.config, punctuation)
    }

    /// Runs every round of a plan over `input`.
    ///
    /// The input is encoded to UTF-16 once; each round maps the whole unit
    /// buffer of the previous round (replacements may legitimately cross the
    /// original segment boundaries within non-delimiter runs), and the final
    /// buffer is decoded once.
    fn run_plan(&self, input: &str, plan: &ConversionPlan) -> String {
        let set = &self.ctx.set;
        let mut units: Vec<u16> = input.encode_utf16().collect();
        for round in plan.rounds() {
            let dicts = set.slot_dicts(round.slot);
            units = self.run_round(&units, &dicts, &round.union);
        }
        String::from_utf16_lossy(&units)
    }

    /// Applies one round to a unit buffer, choosing between the linear,
    /// sequential-stitch and chunked-parallel strategies.
    ///
    /// All three produce byte-identical output; the choice only affects
    /// scheduling. Chunk outputs are joined in input order.
    fn run_round(&self, units: &[u16], dicts: &[&DictEntry], union: &StarterUnion) -> Vec<u16> {
        let n = units.len();
        if n == 0 {
            return Vec::new();
        }

        if n < TUNING.linear_cutoff {
            let mut out = Vec::with_capacity(n + (n >> 4));
            self.convert_segment_into(units, dicts, union, &mut out);
            return out;
        }

        let ranges = split_ranges(units, true);

        if !self.is_parallel
            || (ranges.len() <= PARALLEL_RANGE_GATE && n <= TUNING.parallel_text_gate)
        {
            let mut out = Vec::with_capacity(n + (n >> 4));
            for r in &ranges {
                self.convert_segment_into(&units[r.clone()], dicts, union, &mut out);
            }
            return out;
        }

        let chunks: Vec<Vec<u16>> = ranges
            .par_chunks(BATCH_SIZE)
            .map(|chunk| {
                let total: usize = chunk.iter().map(|r| r.len()).sum();
                let mut buf = Vec::with_capacity(total + (total >> 6));
                for r in chunk {
                    self.convert_segment_into(&units[r.clone()], dicts, union, &mut buf);
                }
                buf
            })
            .collect();

        let mut out = Vec::with_capacity(n + (n >> 4));
        for chunk in &chunks {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Converts a single span with greedy longest-match, returning a fresh
    /// unit buffer.
    ///
    /// This is the raw engine entry point; it is public so callers holding
    /// raw UTF-16 (including ill-formed sequences with lone surrogates) can
    /// drive the matcher directly. Unmatched units — lone surrogates
    /// included — are echoed verbatim.
    ///
    /// # Preconditions
    /// `union` must have been built from exactly `dicts` (the slot cache
    /// guarantees this for plan-driven calls).
    pub fn convert_segment_utf16(
        &self,
        span: &[u16],
        dicts: &[&DictEntry],
        union: &StarterUnion,
    ) -> Vec<u16> {
        let mut out = Vec::with_capacity(span.len() + (span.len() >> 4));
        self.convert_segment_into(span, dicts, union, &mut out);
        out
    }

    /// Core dictionary-matching routine (FMM), appending into `out`.
    ///
    /// This is the tightest loop of the engine. It scans the span
    /// left-to-right; at each position the prebuilt [`StarterUnion`] resolves
    /// the grapheme step and prunes impossible lengths before any
    /// per-dictionary probe.
    ///
    /// # Matching strategy
    /// For each position `i`:
    /// 1. Probe the union: step (1 or 2 units), per-starter cap, length mask
    ///    and minimum; clamp the cap to the remaining span.
    /// 2. **No-match shortcut** — unknown starter, or its shortest key cannot
    ///    fit: echo the grapheme and advance.
    /// 3. **Single-grapheme fast path** — when no longer candidate can match
    ///    here and the single-grapheme length is viable, probe that one key
    ///    and move on.
    /// 4. **General search** — walk viable lengths longest-first
    ///    (mask-pruned, [`DictEntry::supports_length`]-gated per dict) and
    ///    take the first hit: longer match wins, and at equal length the
    ///    earlier dictionary of the group wins.
    /// 5. Otherwise echo the grapheme.
    ///
    /// Keys are probed as subslices of `span`, so the loop allocates nothing
    /// beyond the output buffer.
    fn convert_segment_into(
        &self,
        span: &[u16],
        dicts: &[&DictEntry],
        union: &StarterUnion,
        out: &mut Vec<u16>,
    ) {
        let n = span.len();
        if n == 0 {
            return;
        }
        if n == 1 && is_delimiter_unit(span[0]) {
            out.push(span[0]);
            return;
        }

        let mut i = 0usize;
        while i < n {
            let probe = union.probe(span, i);
            let step = probe.step;
            let cap = probe.cap as usize;
            let min_len = probe.min_len as usize;
            let mask = probe.mask;

            let remaining = n - i;
            let try_max = cap.min(remaining);

            if cap == 0 || min_len == 0 || min_len > try_max {
                out.extend_from_slice(&span[i..i + step]);
                i += step;
                continue;
            }

            // Single-grapheme fast path: no longer candidate can start here.
            let trimmed = if try_max < 64 {
                mask & ((1u64 << try_max) - 1)
            } else {
                mask
            };
            let has_longer = (trimmed >> step) != 0 || try_max > 64;
            if !has_longer && step >= min_len && (mask >> (step - 1)) & 1 == 1 {
                let key = &span[i..i + step];
                let mut hit = false;
                for dict in dicts {
                    if !dict.supports_length(step) {
                        continue;
                    }
                    if let Some(value) = dict.map.get(key) {
                        out.extend_from_slice(value);
                        hit = true;
                        break;
                    }
                }
                if !hit {
                    out.extend_from_slice(key);
                }
                i += step;
                continue;
            }

            // General longest-first search.
            let lower = min_len.max(step);
            let mut matched_len = 0usize;
            for_each_len_desc(mask, lower, try_max, |len| {
                let key = &span[i..i + len];
                for dict in dicts {
                    if !dict.supports_length(len) {
                        continue;
                    }
                    if let Some(value) = dict.map.get(key) {
                        out.extend_from_slice(value);
                        matched_len = len;
                        return true;
                    }
                }
                false
            });

            if matched_len > 0 {
                i += matched_len;
            } else {
                out.extend_from_slice(&span[i..i + step]);
                i += step;
            }
        }
    }

    /// Single-dictionary character conversion used by script detection.
    fn map_by_slot(&self, input: &str, slot: Slot) -> String {
        let set = &self.ctx.set;
        let units: Vec<u16> = input.encode_utf16().collect();
        let dicts = set.slot_dicts(slot);
        let union = set.union_for(slot);
        let out = self.convert_segment_utf16(&units, &dicts, &union);
        String::from_utf16_lossy(&out)
    }

    /// Detects the likely Chinese script type of the input text.
    ///
    /// The input is stripped of ASCII punctuation, whitespace, digits, Latin
    /// letters and the character `著` (kept verbatim from the reference
    /// behavior), then the first 100 characters of the remainder are
    /// sampled:
    ///
    /// - `1` — the traditional→simplified character table changes the sample
    ///   (input looks Traditional);
    /// - `2` — otherwise, the simplified→traditional table changes it (input
    ///   looks Simplified);
    /// - `0` — neither, or the sample is empty.
    ///
    /// # Examples
    /// ```rust
    /// use opencc_fmm16::OpenCC;
    /// let cc = OpenCC::new();
    /// assert_eq!(cc.zho_check("漢字"), 1); // Traditional
    /// assert_eq!(cc.zho_check("汉字"), 2); // Simplified
    /// assert_eq!(cc.zho_check("hello"), 0); // Neither
    /// ```
    pub fn zho_check(&self, input: &str) -> i32 {
        if input.is_empty() {
            return 0;
        }
        let stripped = STRIP_REGEX.replace_all(input, "");
        let sample = prefix_scalars(&stripped, 100);
        if sample.is_empty() {
            return 0;
        }

        match (
            sample != self.map_by_slot(sample, Slot::TsCharactersOnly),
            sample != self.map_by_slot(sample, Slot::StCharactersOnly),
        ) {
            (true, _) => 1,
            (_, true) => 2,
            _ => 0,
        }
    }

    /// Records an error message as the most recent runtime error.
    ///
    /// Used internally for non-panic errors such as failed dictionary
    /// loading or invalid conversion configurations, so core APIs can keep
    /// returning plain strings.
    pub fn set_last_error(err_msg: &str) {
        let mut last_error = LAST_ERROR.lock().unwrap();
        *last_error = Some(err_msg.to_string());
    }

    /// Retrieves the most recently recorded error message, if any.
    pub fn get_last_error() -> Option<String> {
        let last_error = LAST_ERROR.lock().unwrap();
        last_error.clone()
    }
}

impl Default for OpenCC {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(list: &[(&str, &str)]) -> DictEntry {
        DictEntry::build_from_pairs(
            list.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    fn u16s(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn run(dicts: &[&DictEntry], input: &str) -> String {
        let cc = OpenCC::with_dictionary(DictionarySet::default());
        let union = StarterUnion::build(dicts);
        let out = cc.convert_segment_utf16(&u16s(input), dicts, &union);
        String::from_utf16_lossy(&out)
    }

    #[test]
    fn longest_match_wins_over_shorter() {
        let d = entry(&[("你", "您"), ("你好", "你們好")]);
        assert_eq!(run(&[&d], "你好"), "你們好");
        assert_eq!(run(&[&d], "你笑"), "您笑");
    }

    #[test]
    fn equal_length_earlier_dict_wins() {
        let d1 = entry(&[("你好", "甲")]);
        let d2 = entry(&[("你好", "乙"), ("世界", "丙")]);
        assert_eq!(run(&[&d1, &d2], "你好世界"), "甲丙");
        assert_eq!(run(&[&d2, &d1], "你好世界"), "乙丙");
    }

    #[test]
    fn unmatched_text_is_echoed() {
        let d = entry(&[("你", "您")]);
        assert_eq!(run(&[&d], "abc 漢字。"), "abc 漢字。");
    }

    #[test]
    fn key_longer_than_remaining_input_is_skipped() {
        let d = entry(&[("你好世界", "A"), ("你好", "B")]);
        assert_eq!(run(&[&d], "你好世"), "B世");
    }

    #[test]
    fn surrogate_pair_keys_convert_as_one_grapheme() {
        let d = entry(&[("𠮷", "吉"), ("𠮷野家", "吉野家")]);
        assert_eq!(run(&[&d], "𠮷"), "吉");
        assert_eq!(run(&[&d], "去𠮷野家吃"), "去吉野家吃");
    }

    #[test]
    fn unknown_surrogate_pair_passes_through_intact() {
        let d = entry(&[("你", "您")]);
        assert_eq!(run(&[&d], "你🀄你"), "您🀄您");
    }

    #[test]
    fn lone_high_surrogate_at_end_is_echoed() {
        let d = entry(&[("你", "您")]);
        let union = StarterUnion::build(&[&d]);
        let cc = OpenCC::with_dictionary(DictionarySet::default());

        let mut span = u16s("你");
        span.push(0xD842); // lone high surrogate, nothing follows
        let out = cc.convert_segment_utf16(&span, &[&d], &union);
        assert_eq!(out, vec![0x60A8, 0xD842]);
    }

    #[test]
    fn lone_low_surrogate_is_echoed() {
        let d = entry(&[("你", "您")]);
        let union = StarterUnion::build(&[&d]);
        let cc = OpenCC::with_dictionary(DictionarySet::default());

        let span = [0xDFB7u16, 0x4F60];
        let out = cc.convert_segment_utf16(&span, &[&d], &union);
        assert_eq!(out, vec![0xDFB7, 0x60A8]);
    }

    #[test]
    fn single_delimiter_span_is_echoed() {
        let d = entry(&[("你", "您")]);
        assert_eq!(run(&[&d], "，"), "，");
        assert_eq!(run(&[&d], ""), "");
    }

    #[test]
    fn replacement_may_change_length() {
        let d = entry(&[("发", "髮"), ("发现", "發現")]);
        assert_eq!(run(&[&d], "发发现"), "髮發現");
    }

    #[test]
    fn every_position_advances_by_at_least_one_grapheme() {
        let d = entry(&[("你好世界", "A")]);
        // No match anywhere: output must equal input, proving termination
        // with per-grapheme advancement.
        let input = "你好世 𠮷界好";
        assert_eq!(run(&[&d], input), input);
    }

    #[test]
    fn descending_length_iteration_respects_bounds() {
        let mut seen = Vec::new();
        // Lengths 1, 3, 4 present.
        let mask = 0b1101u64;
        for_each_len_desc(mask, 1, 3, |len| {
            seen.push(len);
            false
        });
        assert_eq!(seen, vec![3, 1]);

        seen.clear();
        for_each_len_desc(mask, 2, 64, |len| {
            seen.push(len);
            false
        });
        assert_eq!(seen, vec![4, 3]);

        // Early exit stops the walk.
        seen.clear();
        for_each_len_desc(mask, 1, 4, |len| {
            seen.push(len);
            len == 3
        });
        assert_eq!(seen, vec![4, 3]);
    }

    #[test]
    fn descending_length_iteration_walks_above_64_from_the_cap() {
        let mut seen = Vec::new();
        for_each_len_desc(1u64 << 63, 1, 66, |len| {
            seen.push(len);
            false
        });
        assert_eq!(seen, vec![66, 65, 64]);
    }

    #[test]
    fn serial_path_matches_parallel_path() {
        let piece = "汉字转换，头发干燥！测试文本。computer 计算机内存；\n";
        let big: String = piece.repeat(2_000);

        let mut cc = OpenCC::with_dictionary(DictionarySet::new().unwrap());
        for config in ["s2t", "t2s", "s2twp", "jp2t"] {
            cc.set_parallel(false);
            let serial = cc.convert(&big, config, true);
            cc.set_parallel(true);
            let parallel = cc.convert(&big, config, true);
            assert_eq!(serial, parallel, "config {}", config);
        }
    }
}
