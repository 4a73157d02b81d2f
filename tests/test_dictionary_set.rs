#[cfg(test)]
mod tests {
    use opencc_fmm16::dictionary_lib::{DictEntry, DictionaryError, DictionarySet, DICT_FILES};
    use opencc_fmm16::OpenCC;
    use std::fs;
    use std::path::Path;

    /// Writes all 18 lexicon files into `dir`, empty except for the named
    /// overrides.
    fn write_lexicon_dir(dir: &Path, overrides: &[(&str, &str)]) {
        for file in DICT_FILES {
            let content = overrides
                .iter()
                .find(|(name, _)| *name == file)
                .map(|(_, content)| *content)
                .unwrap_or("");
            fs::write(dir.join(file), content).unwrap();
        }
    }

    #[test]
    fn missing_files_are_enumerated() {
        let dir = tempfile::tempdir().unwrap();
        write_lexicon_dir(dir.path(), &[]);
        fs::remove_file(dir.path().join("TWPhrases.txt")).unwrap();
        fs::remove_file(dir.path().join("JPVariantsRev.txt")).unwrap();

        let err = DictionarySet::from_dicts_dir(dir.path()).unwrap_err();
        match err {
            DictionaryError::SourceMissing(files) => {
                assert_eq!(files, vec!["TWPhrases.txt", "JPVariantsRev.txt"]);
            }
            other => panic!("expected SourceMissing, got {other:?}"),
        }
    }

    #[test]
    fn text_loader_applies_the_line_rules() {
        let dir = tempfile::tempdir().unwrap();
        write_lexicon_dir(
            dir.path(),
            &[(
                "STCharacters.txt",
                "# comment line\n\n   \n汉\t漢\n发\t發 髮\n干\t乾\n干\t幹\n",
            )],
        );

        let set = DictionarySet::from_dicts_dir(dir.path()).unwrap();
        let opencc = OpenCC::with_dictionary(set);
        assert_eq!(opencc.convert("汉", "s2t", false), "漢");
        // First value token wins within a line; last line wins across
        // duplicates.
        assert_eq!(opencc.convert("发", "s2t", false), "發");
        assert_eq!(opencc.convert("干", "s2t", false), "幹");
    }

    #[test]
    fn text_loader_rejects_lines_without_a_tab() {
        let dir = tempfile::tempdir().unwrap();
        write_lexicon_dir(dir.path(), &[("TSPhrases.txt", "頭髮 头发\n")]);

        let err = DictionarySet::from_dicts_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DictionaryError::Corrupt(_)));
        assert!(err.to_string().contains("TSPhrases.txt"));
    }

    #[test]
    fn cbor_round_trip_preserves_conversion_behavior() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary_set.cbor");

        let original = DictionarySet::new().unwrap();
        let expected_max = original.st_phrases.max_len;
        original.serialize_to_cbor(&path).unwrap();

        let reloaded = DictionarySet::deserialize_from_cbor(&path).unwrap();
        assert_eq!(reloaded.st_phrases.max_len, expected_max);
        assert_eq!(reloaded.st_characters.map.len(), original.st_characters.map.len());

        let opencc = OpenCC::with_dictionary(reloaded);
        assert_eq!(opencc.convert("汉字转换", "s2t", false), "漢字轉換");
    }

    #[test]
    fn zstd_round_trip_preserves_conversion_behavior() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary_set.zstd");

        let original = DictionarySet::new().unwrap();
        original.save_compressed(&path).unwrap();

        let reloaded = DictionarySet::load_compressed(&path).unwrap();
        assert_eq!(reloaded.ts_phrases.map.len(), original.ts_phrases.map.len());

        let opencc = OpenCC::with_dictionary(reloaded);
        assert_eq!(opencc.convert("計算機記憶體", "tw2s", false), "计算机内存");
    }

    #[test]
    fn corrupt_blob_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.cbor");
        fs::write(&path, b"not a dictionary").unwrap();

        let err = DictionarySet::deserialize_from_cbor(&path).unwrap_err();
        assert!(matches!(err, DictionaryError::Corrupt(_)));
    }

    #[test]
    fn to_dicts_writes_expected_txt_files() {
        let dir = tempfile::tempdir().unwrap();

        let pairs = vec![
            ("测试".to_string(), "測試".to_string()),
            ("语言".to_string(), "語言".to_string()),
        ];
        let mut set = DictionarySet::default();
        set.st_characters = DictEntry::build_from_pairs(pairs.clone());
        set.st_phrases = DictEntry::build_from_pairs(pairs);

        set.to_dicts(dir.path()).unwrap();

        let content_stc = fs::read_to_string(dir.path().join("STCharacters.txt")).unwrap();
        let content_stp = fs::read_to_string(dir.path().join("STPhrases.txt")).unwrap();
        assert!(content_stc.contains("测试\t測試"));
        assert!(content_stc.contains("语言\t語言"));
        assert!(content_stp.contains("测试\t測試"));

        // The exported directory loads back into an equivalent set.
        let reloaded = DictionarySet::from_dicts_dir(dir.path()).unwrap();
        assert_eq!(reloaded.st_characters.map.len(), 2);
        assert!(reloaded.tw_variants.is_empty());
    }

    #[test]
    fn deserialized_sets_rederive_starter_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary_set.cbor");

        DictionarySet::new().unwrap().serialize_to_cbor(&path).unwrap();
        let reloaded = DictionarySet::deserialize_from_cbor(&path).unwrap();

        // Every key must be reachable through the per-starter metadata the
        // reload derived.
        let entry = &reloaded.st_phrases;
        for key in entry.map.keys() {
            let starter = opencc_fmm16::utils::starter_scalar(key).unwrap();
            let mask = entry.starter_len_mask.get(&starter).copied().unwrap_or(0);
            let len = key.len();
            if len <= 64 {
                assert_ne!(mask & (1u64 << (len - 1)), 0);
            }
            assert!(entry.starter_cap.get(&starter).copied().unwrap_or(0) as usize >= len);
        }
    }
}
