use once_cell::sync::Lazy;
use std::ops::Range;

/// Full delimiter set used for text segmentation.
///
/// This string literal contains all whitespace, ASCII punctuation, and common
/// Chinese punctuation marks considered delimiters by the segmentation
/// engine. Every delimiter is a BMP code point, i.e. a single UTF-16 unit.
/// It is used to build the [`DelimiterSet`] bitset at startup.
pub const FULL_DELIMITERS: &str =
    " \t\n\r!\"#$%&'()*+,-./:;<=>?@[\\]^_{}|~＝、。﹁﹂—－（）《》〈〉？！…／＼︒︑︔︓︿﹀︹︺︙︐［﹇］﹈︕︖︰︳︴︽︾︵︶｛︷｝︸﹃﹄【︻】︼　～．，；：";

/// Compact, hot-path friendly delimiter set optimized for per-unit
/// membership tests.
///
/// # Design
///
/// * **ASCII fast path**: all code points `U+0000..=U+007F` are stored in a
///   single [`u128`] mask. Testing membership is a single shift and bitwise AND.
/// * **BMP fast path**: all code points `U+0000..=U+FFFF` are stored in a
///   65,536-bit table (`[u64; 1024]`, ~8 KB). Each UTF-16 unit maps to one
///   bit, making lookup a constant-time O(1) operation with predictable
///   branch-free code.
/// * **Astral characters**: `U+10000..` are always reported as
///   non-delimiters, since no delimiters exist in that range.
///
/// Because the table is indexed by UTF-16 unit, the segmenter can test raw
/// units without decoding surrogate pairs first (a surrogate unit is never a
/// delimiter).
#[derive(Copy, Clone)]
pub struct DelimiterSet {
    ascii_mask: u128,      // bits 0..=127
    bmp_bits: [u64; 1024], // 0x0000..=0xFFFF
}

impl DelimiterSet {
    /// Tests whether a single UTF-16 unit is a delimiter.
    #[inline]
    pub fn contains_unit(&self, u: u16) -> bool {
        if u <= 0x7F {
            return ((self.ascii_mask >> u) & 1) == 1;
        }
        let i = (u >> 6) as usize;
        let b = u & 63;
        ((self.bmp_bits[i] >> b) & 1) == 1
    }

    /// Tests whether the given [`char`] is a delimiter according to this set.
    ///
    /// # Examples
    ///
    /// ```
    /// use opencc_fmm16::delimiter_set::is_delimiter;
    /// assert!(is_delimiter('。'));
    /// assert!(!is_delimiter('你'));
    /// ```
    #[inline]
    pub fn contains(&self, c: char) -> bool {
        let u = c as u32;
        if u <= 0xFFFF {
            return self.contains_unit(u as u16);
        }
        false
    }
}

/// Global static instance of the [`DelimiterSet`] built from
/// [`FULL_DELIMITERS`]. Initialization happens once at runtime via [`Lazy`];
/// subsequent lookups are lock-free and O(1).
pub static FULL_DELIMITER_SET: Lazy<DelimiterSet> = Lazy::new(|| {
    let mut ascii: u128 = 0;
    let mut bmp = [0u64; 1024];

    for ch in FULL_DELIMITERS.chars() {
        let u = ch as u32;
        if u <= 0x7F {
            ascii |= 1u128 << u;
        }
        if u <= 0xFFFF {
            let i = (u >> 6) as usize;
            let b = u & 63;
            bmp[i] |= 1u64 << b;
        }
    }

    DelimiterSet {
        ascii_mask: ascii,
        bmp_bits: bmp,
    }
});

/// Convenience helper for hot paths: tests a [`char`] against the global set.
#[inline]
pub fn is_delimiter(c: char) -> bool {
    FULL_DELIMITER_SET.contains(c)
}

/// Convenience helper for hot paths: tests a raw UTF-16 unit against the
/// global set.
#[inline]
pub fn is_delimiter_unit(u: u16) -> bool {
    FULL_DELIMITER_SET.contains_unit(u)
}

/// Splits a UTF-16 unit slice into half-open index ranges along delimiter
/// boundaries.
///
/// # Parameters
/// - `units`: the input UTF-16 units.
/// - `inclusive`: if `true`, each delimiter is appended to the end of its
///   preceding non-delimiter run, producing one range per
///   (run + trailing delimiter). Leading or consecutive delimiters still
///   emit one-unit delimiter-only ranges. If `false`, non-delimiter runs and
///   each individual delimiter become separate ranges.
///
/// Trailing content after the last delimiter is always included as a final
/// range. Concatenating `&units[r]` over all returned ranges reproduces the
/// input exactly, in both modes.
pub fn split_ranges(units: &[u16], inclusive: bool) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;

    for (i, &u) in units.iter().enumerate() {
        if is_delimiter_unit(u) {
            if inclusive {
                ranges.push(start..i + 1);
            } else {
                if i > start {
                    ranges.push(start..i);
                }
                ranges.push(i..i + 1);
            }
            start = i + 1;
        }
    }

    if start < units.len() {
        ranges.push(start..units.len());
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16s(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn membership_covers_ascii_and_cjk_punctuation() {
        for c in FULL_DELIMITERS.chars() {
            assert!(is_delimiter(c), "expected delimiter: {:?}", c);
        }
        assert!(is_delimiter(' '));
        assert!(is_delimiter('，'));
        assert!(is_delimiter('　'));
        assert!(!is_delimiter('你'));
        assert!(!is_delimiter('“'));
        assert!(!is_delimiter('「'));
        assert!(!is_delimiter('𠮷'));
    }

    #[test]
    fn delimiters_are_distinct_bmp_code_points() {
        let mut seen = std::collections::HashSet::new();
        for c in FULL_DELIMITERS.chars() {
            assert!((c as u32) <= 0xFFFF);
            assert!(seen.insert(c), "duplicate delimiter {:?}", c);
        }
    }

    #[test]
    fn inclusive_split_attaches_trailing_delimiters() {
        let units = u16s("你好，世界！");
        let ranges = split_ranges(&units, true);
        assert_eq!(ranges, vec![0..3, 3..6]);
    }

    #[test]
    fn inclusive_split_emits_one_unit_ranges_for_delimiter_runs() {
        let units = u16s("，，你");
        let ranges = split_ranges(&units, true);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn exclusive_split_separates_each_delimiter() {
        let units = u16s("你好，世界！了");
        let ranges = split_ranges(&units, false);
        assert_eq!(ranges, vec![0..2, 2..3, 3..5, 5..6, 6..7]);
    }

    #[test]
    fn split_ranges_cover_the_input_exactly() {
        let units = u16s("！你好，，world. 末尾");
        for inclusive in [true, false] {
            let ranges = split_ranges(&units, inclusive);
            let mut rebuilt = Vec::new();
            for r in &ranges {
                rebuilt.extend_from_slice(&units[r.clone()]);
            }
            assert_eq!(rebuilt, units);
        }
    }

    #[test]
    fn no_trailing_delimiter_keeps_final_run() {
        let units = u16s("你好");
        assert_eq!(split_ranges(&units, true), vec![0..2]);
        assert_eq!(split_ranges(&units, false), vec![0..2]);
        assert!(split_ranges(&[], true).is_empty());
    }
}
