// json_io.rs (CLI only)
//
// Reference JSON form of the dictionary set. JSON object keys must be
// strings, so the UTF-16 unit slices of the internal maps go through this
// DTO; serde_json resolves surrogate-pair escapes back to scalars, which
// keeps non-BMP keys round-trip safe.
use opencc_fmm16::dictionary_lib::{DictEntry, DictionarySet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
// stable key order for diffs

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DictEntrySerde {
    pub map: BTreeMap<String, String>,

    // Kept for readers of the JSON; the internal form re-derives them.
    #[serde(default)]
    pub max_len: usize,

    #[serde(default)]
    pub min_len: usize,

    #[serde(default)]
    pub length_mask: u64,
}

impl DictEntrySerde {
    pub fn into_internal(self) -> DictEntry {
        // build_from_pairs re-derives every piece of metadata, so a JSON
        // file that carries none (or stale values) still loads correctly.
        DictEntry::build_from_pairs(self.map.into_iter().collect::<Vec<_>>())
    }
}

impl From<&DictEntry> for DictEntrySerde {
    fn from(d: &DictEntry) -> Self {
        let mut map = BTreeMap::new();
        for (k, v) in &d.map {
            map.insert(String::from_utf16_lossy(k), String::from_utf16_lossy(v));
        }

        Self {
            map,
            max_len: d.max_len,
            min_len: d.min_len,
            length_mask: d.length_mask,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DictionarySetSerde {
    pub st_characters: DictEntrySerde,
    pub st_phrases: DictEntrySerde,
    pub ts_characters: DictEntrySerde,
    pub ts_phrases: DictEntrySerde,
    pub tw_phrases: DictEntrySerde,
    pub tw_phrases_rev: DictEntrySerde,
    pub tw_variants: DictEntrySerde,
    pub tw_variants_rev: DictEntrySerde,
    pub tw_variants_rev_phrases: DictEntrySerde,
    pub hk_variants: DictEntrySerde,
    pub hk_variants_rev: DictEntrySerde,
    pub hk_variants_rev_phrases: DictEntrySerde,
    pub jps_characters: DictEntrySerde,
    pub jps_phrases: DictEntrySerde,
    pub jp_variants: DictEntrySerde,
    pub jp_variants_rev: DictEntrySerde,
    pub st_punctuations: DictEntrySerde,
    pub ts_punctuations: DictEntrySerde,
}

impl DictionarySetSerde {
    #[allow(dead_code)]
    pub fn into_internal(self) -> DictionarySet {
        let mut set = DictionarySet::default();
        set.st_characters = self.st_characters.into_internal();
        set.st_phrases = self.st_phrases.into_internal();
        set.ts_characters = self.ts_characters.into_internal();
        set.ts_phrases = self.ts_phrases.into_internal();
        set.tw_phrases = self.tw_phrases.into_internal();
        set.tw_phrases_rev = self.tw_phrases_rev.into_internal();
        set.tw_variants = self.tw_variants.into_internal();
        set.tw_variants_rev = self.tw_variants_rev.into_internal();
        set.tw_variants_rev_phrases = self.tw_variants_rev_phrases.into_internal();
        set.hk_variants = self.hk_variants.into_internal();
        set.hk_variants_rev = self.hk_variants_rev.into_internal();
        set.hk_variants_rev_phrases = self.hk_variants_rev_phrases.into_internal();
        set.jps_characters = self.jps_characters.into_internal();
        set.jps_phrases = self.jps_phrases.into_internal();
        set.jp_variants = self.jp_variants.into_internal();
        set.jp_variants_rev = self.jp_variants_rev.into_internal();
        set.st_punctuations = self.st_punctuations.into_internal();
        set.ts_punctuations = self.ts_punctuations.into_internal();
        set
    }
}

impl From<&DictionarySet> for DictionarySetSerde {
    fn from(src: &DictionarySet) -> Self {
        Self {
            st_characters: (&src.st_characters).into(),
            st_phrases: (&src.st_phrases).into(),
            ts_characters: (&src.ts_characters).into(),
            ts_phrases: (&src.ts_phrases).into(),
            tw_phrases: (&src.tw_phrases).into(),
            tw_phrases_rev: (&src.tw_phrases_rev).into(),
            tw_variants: (&src.tw_variants).into(),
            tw_variants_rev: (&src.tw_variants_rev).into(),
            tw_variants_rev_phrases: (&src.tw_variants_rev_phrases).into(),
            hk_variants: (&src.hk_variants).into(),
            hk_variants_rev: (&src.hk_variants_rev).into(),
            hk_variants_rev_phrases: (&src.hk_variants_rev_phrases).into(),
            jps_characters: (&src.jps_characters).into(),
            jps_phrases: (&src.jps_phrases).into(),
            jp_variants: (&src.jp_variants).into(),
            jp_variants_rev: (&src.jp_variants_rev).into(),
            st_punctuations: (&src.st_punctuations).into(),
            ts_punctuations: (&src.ts_punctuations).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_bmp_keys_round_trip_through_json() {
        let entry = DictEntry::build_from_pairs(vec![
            ("𠮷野家".to_string(), "吉野家".to_string()),
            ("漢".to_string(), "汉".to_string()),
        ]);

        let dto: DictEntrySerde = (&entry).into();
        let json = serde_json::to_string(&dto).unwrap();
        let parsed: DictEntrySerde = serde_json::from_str(&json).unwrap();
        let back = parsed.into_internal();

        assert_eq!(back.map, entry.map);
        assert_eq!(back.max_len, entry.max_len);
        assert_eq!(back.starter_len_mask, entry.starter_len_mask);
    }
}
