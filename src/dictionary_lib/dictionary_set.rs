//! Loader and container for the OpenCC-compatible lexicon set.
//!
//! This module defines [`DictionarySet`], the fixed record of 18 dictionaries
//! covering every conversion direction, together with its loaders (embedded
//! lexicon, text directory, CBOR, Zstd-compressed CBOR) and the shared
//! [`DictionaryError`] type.
//!
//! Users generally interact with this indirectly via the
//! [`OpenCC`](crate::OpenCC) interface, but advanced users may load, persist
//! or assemble custom sets and publish them through
//! [`provider`](crate::provider).

use serde::{Deserialize, Serialize};
use serde_cbor::{from_reader, from_slice};
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::{fs, io};
use zstd::{Decoder, Encoder};

use crate::dictionary_lib::dict_entry::DictEntry;

mod union_cache;
pub use union_cache::Slot;

// Last error message raised by dictionary loading or persistence.
static LAST_ERROR: Mutex<Option<String>> = Mutex::new(None);

/// The 18 lexicon file names, in the fixed slot order of [`DictionarySet`].
pub const DICT_FILES: [&str; 18] = [
    "STCharacters.txt",
    "STPhrases.txt",
    "TSCharacters.txt",
    "TSPhrases.txt",
    "TWPhrases.txt",
    "TWPhrasesRev.txt",
    "TWVariants.txt",
    "TWVariantsRev.txt",
    "TWVariantsRevPhrases.txt",
    "HKVariants.txt",
    "HKVariantsRev.txt",
    "HKVariantsRevPhrases.txt",
    "JPShinjitaiCharacters.txt",
    "JPShinjitaiPhrases.txt",
    "JPVariants.txt",
    "JPVariantsRev.txt",
    "STPunctuations.txt",
    "TSPunctuations.txt",
];

/// The full OpenCC-compatible dictionary set: one [`DictEntry`] per named
/// slot, each with precomputed length metadata for greedy longest-match.
///
/// The set is immutable once constructed. The slot-keyed starter-union cache
/// (`unions`) is runtime-only state, built on first use and dropped with the
/// set; see [`Slot`] and [`DictionarySet::union_for`].
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct DictionarySet {
    #[serde(default)]
    pub st_characters: DictEntry,
    #[serde(default)]
    pub st_phrases: DictEntry,
    #[serde(default)]
    pub ts_characters: DictEntry,
    #[serde(default)]
    pub ts_phrases: DictEntry,
    #[serde(default)]
    pub tw_phrases: DictEntry,
    #[serde(default)]
    pub tw_phrases_rev: DictEntry,
    #[serde(default)]
    pub tw_variants: DictEntry,
    #[serde(default)]
    pub tw_variants_rev: DictEntry,
    #[serde(default)]
    pub tw_variants_rev_phrases: DictEntry,
    #[serde(default)]
    pub hk_variants: DictEntry,
    #[serde(default)]
    pub hk_variants_rev: DictEntry,
    #[serde(default)]
    pub hk_variants_rev_phrases: DictEntry,
    #[serde(default)]
    pub jps_characters: DictEntry,
    #[serde(default)]
    pub jps_phrases: DictEntry,
    #[serde(default)]
    pub jp_variants: DictEntry,
    #[serde(default)]
    pub jp_variants_rev: DictEntry,
    #[serde(default)]
    pub st_punctuations: DictEntry,
    #[serde(default)]
    pub ts_punctuations: DictEntry,

    #[serde(skip)]
    #[serde(default)]
    unions: union_cache::Unions,
}

impl DictionarySet {
    /// Builds the default set from the lexicon bundled into the binary at
    /// compile time.
    ///
    /// This is the zero-I/O constructor behind [`OpenCC::new`](crate::OpenCC::new):
    /// the 18 text files under `src/dictionary_lib/dicts/` are embedded with
    /// [`include_str!`] and parsed once per call.
    pub fn new() -> Result<Self, DictionaryError> {
        Self::from_embedded().map_err(|err| {
            Self::set_last_error(&format!("Failed to load embedded dictionary: {}", err));
            err
        })
    }

    fn from_embedded() -> Result<Self, DictionaryError> {
        macro_rules! embedded {
            ($file:literal) => {
                Self::parse_lexicon(include_str!(concat!("dicts/", $file)), $file)?
            };
        }

        Ok(Self {
            st_characters: embedded!("STCharacters.txt"),
            st_phrases: embedded!("STPhrases.txt"),
            ts_characters: embedded!("TSCharacters.txt"),
            ts_phrases: embedded!("TSPhrases.txt"),
            tw_phrases: embedded!("TWPhrases.txt"),
            tw_phrases_rev: embedded!("TWPhrasesRev.txt"),
            tw_variants: embedded!("TWVariants.txt"),
            tw_variants_rev: embedded!("TWVariantsRev.txt"),
            tw_variants_rev_phrases: embedded!("TWVariantsRevPhrases.txt"),
            hk_variants: embedded!("HKVariants.txt"),
            hk_variants_rev: embedded!("HKVariantsRev.txt"),
            hk_variants_rev_phrases: embedded!("HKVariantsRevPhrases.txt"),
            jps_characters: embedded!("JPShinjitaiCharacters.txt"),
            jps_phrases: embedded!("JPShinjitaiPhrases.txt"),
            jp_variants: embedded!("JPVariants.txt"),
            jp_variants_rev: embedded!("JPVariantsRev.txt"),
            st_punctuations: embedded!("STPunctuations.txt"),
            ts_punctuations: embedded!("TSPunctuations.txt"),
            unions: Default::default(),
        })
    }

    /// Loads all dictionaries from plaintext lexicon files in `base_dir`.
    ///
    /// All 18 files of [`DICT_FILES`] must exist: the load fails up front
    /// with [`DictionaryError::SourceMissing`] enumerating **every** missing
    /// file, rather than stopping at the first.
    ///
    /// # File format
    ///
    /// Tab-separated pairs, one per line:
    /// ```bash
    /// # This is a comment
    /// 你好\t您好
    /// 发\t發 髮
    /// ```
    ///
    /// - Empty lines, whitespace-only lines and lines starting with `#` are
    ///   ignored; a UTF-8 BOM on the first data line is stripped.
    /// - The value is the first whitespace-separated token after the TAB;
    ///   alternate candidates after it are ignored.
    /// - Key and value are trimmed; a line whose key or value ends up empty
    ///   is skipped.
    /// - Duplicate keys: the last occurrence wins.
    ///
    /// # Errors
    /// - [`DictionaryError::SourceMissing`] with the missing file names.
    /// - [`DictionaryError::Io`] if a file cannot be read.
    /// - [`DictionaryError::Corrupt`] if a data line has no TAB separator.
    pub fn from_dicts_dir<P: AsRef<Path>>(base_dir: P) -> Result<Self, DictionaryError> {
        let base_dir = base_dir.as_ref();

        let missing: Vec<String> = DICT_FILES
            .iter()
            .filter(|f| !base_dir.join(f).exists())
            .map(|f| f.to_string())
            .collect();
        if !missing.is_empty() {
            let err = DictionaryError::SourceMissing(missing);
            Self::set_last_error(&err.to_string());
            return Err(err);
        }

        fn load(base_dir: &Path, filename: &str) -> Result<DictEntry, DictionaryError> {
            let path = base_dir.join(filename);
            let content = fs::read_to_string(&path).map_err(|e| {
                DictionaryError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            DictionarySet::parse_lexicon(&content, filename)
        }

        Ok(Self {
            st_characters: load(base_dir, "STCharacters.txt")?,
            st_phrases: load(base_dir, "STPhrases.txt")?,
            ts_characters: load(base_dir, "TSCharacters.txt")?,
            ts_phrases: load(base_dir, "TSPhrases.txt")?,
            tw_phrases: load(base_dir, "TWPhrases.txt")?,
            tw_phrases_rev: load(base_dir, "TWPhrasesRev.txt")?,
            tw_variants: load(base_dir, "TWVariants.txt")?,
            tw_variants_rev: load(base_dir, "TWVariantsRev.txt")?,
            tw_variants_rev_phrases: load(base_dir, "TWVariantsRevPhrases.txt")?,
            hk_variants: load(base_dir, "HKVariants.txt")?,
            hk_variants_rev: load(base_dir, "HKVariantsRev.txt")?,
            hk_variants_rev_phrases: load(base_dir, "HKVariantsRevPhrases.txt")?,
            jps_characters: load(base_dir, "JPShinjitaiCharacters.txt")?,
            jps_phrases: load(base_dir, "JPShinjitaiPhrases.txt")?,
            jp_variants: load(base_dir, "JPVariants.txt")?,
            jp_variants_rev: load(base_dir, "JPVariantsRev.txt")?,
            st_punctuations: load(base_dir, "STPunctuations.txt")?,
            ts_punctuations: load(base_dir, "TSPunctuations.txt")?,
            unions: Default::default(),
        })
    }

    /// Loads from the `dicts/` directory relative to the working directory.
    pub fn from_dicts() -> Result<Self, DictionaryError> {
        Self::from_dicts_dir("dicts")
    }

    /// Parses one lexicon text into a [`DictEntry`].
    fn parse_lexicon(content: &str, origin: &str) -> Result<DictEntry, DictionaryError> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut saw_data_line = false;

        for (lineno, raw_line) in content.lines().enumerate() {
            let mut line = raw_line.trim_end();

            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            if !saw_data_line {
                if let Some(rest) = line.strip_prefix('\u{FEFF}') {
                    line = rest;
                }
                saw_data_line = true;
            }

            let Some((k, v)) = line.split_once('\t') else {
                return Err(DictionaryError::Corrupt(format!(
                    "Line {} in {} missing TAB separator",
                    lineno + 1,
                    origin
                )));
            };

            let key = k.trim();
            let value = v.split_whitespace().next().unwrap_or("").trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            pairs.push((key.to_owned(), value.to_owned()));
        }

        Ok(DictEntry::build_from_pairs(pairs))
    }

    /// Every entry paired with its lexicon file name, in slot order.
    fn entries_with_files(&self) -> [(&'static str, &DictEntry); 18] {
        [
            ("STCharacters.txt", &self.st_characters),
            ("STPhrases.txt", &self.st_phrases),
            ("TSCharacters.txt", &self.ts_characters),
            ("TSPhrases.txt", &self.ts_phrases),
            ("TWPhrases.txt", &self.tw_phrases),
            ("TWPhrasesRev.txt", &self.tw_phrases_rev),
            ("TWVariants.txt", &self.tw_variants),
            ("TWVariantsRev.txt", &self.tw_variants_rev),
            ("TWVariantsRevPhrases.txt", &self.tw_variants_rev_phrases),
            ("HKVariants.txt", &self.hk_variants),
            ("HKVariantsRev.txt", &self.hk_variants_rev),
            ("HKVariantsRevPhrases.txt", &self.hk_variants_rev_phrases),
            ("JPShinjitaiCharacters.txt", &self.jps_characters),
            ("JPShinjitaiPhrases.txt", &self.jps_phrases),
            ("JPVariants.txt", &self.jp_variants),
            ("JPVariantsRev.txt", &self.jp_variants_rev),
            ("STPunctuations.txt", &self.st_punctuations),
            ("TSPunctuations.txt", &self.ts_punctuations),
        ]
    }

    fn entries_with_files_mut(&mut self) -> [(&'static str, &mut DictEntry); 18] {
        [
            ("STCharacters.txt", &mut self.st_characters),
            ("STPhrases.txt", &mut self.st_phrases),
            ("TSCharacters.txt", &mut self.ts_characters),
            ("TSPhrases.txt", &mut self.ts_phrases),
            ("TWPhrases.txt", &mut self.tw_phrases),
            ("TWPhrasesRev.txt", &mut self.tw_phrases_rev),
            ("TWVariants.txt", &mut self.tw_variants),
            ("TWVariantsRev.txt", &mut self.tw_variants_rev),
            ("TWVariantsRevPhrases.txt", &mut self.tw_variants_rev_phrases),
            ("HKVariants.txt", &mut self.hk_variants),
            ("HKVariantsRev.txt", &mut self.hk_variants_rev),
            ("HKVariantsRevPhrases.txt", &mut self.hk_variants_rev_phrases),
            ("JPShinjitaiCharacters.txt", &mut self.jps_characters),
            ("JPShinjitaiPhrases.txt", &mut self.jps_phrases),
            ("JPVariants.txt", &mut self.jp_variants),
            ("JPVariantsRev.txt", &mut self.jp_variants_rev),
            ("STPunctuations.txt", &mut self.st_punctuations),
            ("TSPunctuations.txt", &mut self.ts_punctuations),
        ]
    }

    /// Finisher for deserialized sets: re-derives every entry's length
    /// metadata from its raw map and validates the key invariants.
    ///
    /// Persisted containers may store precomputed metadata or omit it; either
    /// way the set that comes out of `finish` carries freshly derived starter
    /// indexes, so no consumer depends on what a given container chose to
    /// keep. A blob whose keys violate the invariants (empty keys or values,
    /// lone-surrogate starters) is rejected as [`DictionaryError::Corrupt`].
    pub fn finish(mut self) -> Result<Self, DictionaryError> {
        for (file, entry) in self.entries_with_files_mut() {
            entry
                .rehydrate()
                .map_err(|msg| DictionaryError::Corrupt(format!("{}: {}", file, msg)))?;
        }
        Ok(self)
    }

    /// Saves all dictionaries as plaintext lexicon files under `base_dir`.
    pub fn to_dicts<P: AsRef<Path>>(&self, base_dir: P) -> Result<(), Box<dyn Error>> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir)?;

        for (filename, entry) in self.entries_with_files() {
            let path = base_dir.join(filename);
            let mut file = File::create(&path)?;
            for (key, value) in &entry.map {
                writeln!(
                    file,
                    "{}\t{}",
                    String::from_utf16_lossy(key),
                    String::from_utf16_lossy(value)
                )?;
            }
        }

        Ok(())
    }

    /// Serializes the set to a self-describing CBOR file.
    pub fn serialize_to_cbor<P: AsRef<Path>>(&self, path: P) -> Result<(), DictionaryError> {
        let cbor_data = serde_cbor::to_vec(self).map_err(|err| {
            let msg = format!("Failed to serialize to CBOR: {}", err);
            Self::set_last_error(&msg);
            DictionaryError::Corrupt(msg)
        })?;

        fs::write(&path, cbor_data).map_err(|err| {
            let msg = format!("Failed to write CBOR file: {}", err);
            Self::set_last_error(&msg);
            DictionaryError::Io(msg)
        })?;

        Ok(())
    }

    /// Deserializes a set from a CBOR file and re-derives its metadata.
    pub fn deserialize_from_cbor<P: AsRef<Path>>(path: P) -> Result<Self, DictionaryError> {
        let cbor_data = fs::read(&path).map_err(|err| {
            let msg = format!("Failed to read CBOR file: {}", err);
            Self::set_last_error(&msg);
            DictionaryError::Io(msg)
        })?;

        let dictionary: DictionarySet = from_slice(&cbor_data).map_err(|err| {
            let msg = format!("Failed to deserialize CBOR: {}", err);
            Self::set_last_error(&msg);
            DictionaryError::Corrupt(msg)
        })?;

        dictionary.finish()
    }

    /// Saves the set to a Zstd-compressed CBOR file on disk.
    pub fn save_compressed<P: AsRef<Path>>(&self, path: P) -> Result<(), DictionaryError> {
        let file = File::create(path).map_err(|e| DictionaryError::Io(e.to_string()))?;
        let writer = BufWriter::new(file);
        let mut encoder =
            Encoder::new(writer, 19).map_err(|e| DictionaryError::Io(e.to_string()))?;
        serde_cbor::to_writer(&mut encoder, self)
            .map_err(|e| DictionaryError::Corrupt(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| DictionaryError::Io(e.to_string()))?;
        Ok(())
    }

    /// Loads a set from a Zstd-compressed CBOR file on disk.
    pub fn load_compressed<P: AsRef<Path>>(path: P) -> Result<Self, DictionaryError> {
        let file = File::open(path).map_err(|e| DictionaryError::Io(e.to_string()))?;
        let reader = BufReader::new(file);
        let mut decoder = Decoder::new(reader).map_err(|e| DictionaryError::Io(e.to_string()))?;
        let dictionary: DictionarySet =
            from_reader(&mut decoder).map_err(|e| DictionaryError::Corrupt(e.to_string()))?;
        dictionary.finish()
    }

    /// Records the last error message encountered during dictionary operations.
    pub fn set_last_error(err_msg: &str) {
        let mut last_error = LAST_ERROR.lock().unwrap();
        *last_error = Some(err_msg.to_string());
    }

    /// Retrieves the last error message set during dictionary loading or saving.
    pub fn get_last_error() -> Option<String> {
        let last_error = LAST_ERROR.lock().unwrap();
        last_error.clone()
    }
}

/// Errors raised while loading, validating or persisting dictionary sets.
///
/// Conversion itself never surfaces these: a failed load falls back to an
/// empty set with a last-error note, and `convert` always returns a string.
#[derive(Debug)]
pub enum DictionaryError {
    /// One or more required lexicon files are absent; fatal for that load.
    /// Carries every missing file name.
    SourceMissing(Vec<String>),
    /// A persisted blob failed to deserialize, or its contents violate the
    /// entry invariants (also used for malformed lexicon lines).
    Corrupt(String),
    /// An underlying read or write failed.
    Io(String),
}

impl std::fmt::Display for DictionaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DictionaryError::SourceMissing(files) => {
                write!(f, "Missing dictionary files: {}", files.join(", "))
            }
            DictionaryError::Corrupt(msg) => write!(f, "Corrupt dictionary: {}", msg),
            DictionaryError::Io(msg) => write!(f, "I/O Error: {}", msg),
        }
    }
}

impl Error for DictionaryError {}

impl From<io::Error> for DictionaryError {
    fn from(err: io::Error) -> Self {
        DictionaryError::Io(err.to_string())
    }
}

impl From<serde_cbor::Error> for DictionaryError {
    fn from(err: serde_cbor::Error) -> Self {
        DictionaryError::Corrupt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_lexicon_loads() {
        let set = DictionarySet::new().expect("embedded lexicon must parse");
        assert!(!set.st_characters.is_empty());
        assert!(!set.ts_characters.is_empty());
        assert!(!set.st_punctuations.is_empty());
        assert_eq!(set.st_characters.min_len, 1);
        assert!(set.st_phrases.max_len >= 2);
    }

    #[test]
    fn lexicon_lines_take_first_value_token() {
        let entry =
            DictionarySet::parse_lexicon("# comment\n\n发\t發 髮\n", "STCharacters.txt").unwrap();
        let key: Vec<u16> = "发".encode_utf16().collect();
        let expect: Vec<u16> = "發".encode_utf16().collect();
        assert_eq!(
            entry.map.get(key.as_slice()).map(|v| v.as_ref()),
            Some(expect.as_slice())
        );
    }

    #[test]
    fn lexicon_duplicates_last_wins() {
        let entry =
            DictionarySet::parse_lexicon("干\t乾\n干\t幹\n", "STCharacters.txt").unwrap();
        let key: Vec<u16> = "干".encode_utf16().collect();
        let expect: Vec<u16> = "幹".encode_utf16().collect();
        assert_eq!(
            entry.map.get(key.as_slice()).map(|v| v.as_ref()),
            Some(expect.as_slice())
        );
    }

    #[test]
    fn lexicon_line_without_tab_is_corrupt() {
        let err = DictionarySet::parse_lexicon("你好 您好\n", "STPhrases.txt").unwrap_err();
        assert!(matches!(err, DictionaryError::Corrupt(_)));
    }

    #[test]
    fn bom_is_stripped_from_first_data_line() {
        let entry =
            DictionarySet::parse_lexicon("\u{FEFF}汉\t漢\n", "STCharacters.txt").unwrap();
        let key: Vec<u16> = "汉".encode_utf16().collect();
        assert!(entry.map.contains_key(key.as_slice()));
    }
}
