//! Conversion-direction registry.
//!
//! All supported OpenCC-style conversion configurations, with the one
//! authoritative name↔identifier table that every piece of validation and
//! projection derives from.

/// A supported conversion direction (an OpenCC "config").
///
/// The discriminant doubles as a dense index into the plan cache, so the
/// variant order here, the order of [`TABLE`](Self::all_names) and the
/// canonical name list must stay aligned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Config {
    /// Simplified Chinese → Traditional Chinese.
    S2T,
    /// Traditional Chinese → Simplified Chinese.
    T2S,
    /// Simplified Chinese → Traditional (Taiwan).
    S2Tw,
    /// Traditional (Taiwan) → Simplified Chinese.
    Tw2S,
    /// Simplified Chinese → Traditional (Taiwan) with phrase usage.
    S2Twp,
    /// Traditional (Taiwan) with phrase usage → Simplified Chinese.
    Tw2Sp,
    /// Simplified Chinese → Traditional (Hong Kong).
    S2Hk,
    /// Traditional (Hong Kong) → Simplified Chinese.
    Hk2S,
    /// Traditional Chinese → Traditional (Taiwan).
    T2Tw,
    /// Traditional Chinese → Traditional (Taiwan) with phrase usage.
    T2Twp,
    /// Traditional (Taiwan) → Traditional Chinese.
    Tw2T,
    /// Traditional (Taiwan) → Traditional Chinese with phrase usage.
    Tw2Tp,
    /// Traditional Chinese → Traditional (Hong Kong).
    T2Hk,
    /// Traditional (Hong Kong) → Traditional Chinese.
    Hk2T,
    /// Traditional Chinese (Kyujitai) → Japanese Shinjitai.
    T2Jp,
    /// Japanese Shinjitai → Traditional Chinese (Kyujitai).
    Jp2T,
}

/// Number of supported directions.
pub const CONFIG_COUNT: usize = 16;

/// Canonical lowercase names, aligned with the variant order of [`Config`].
const NAMES: [&str; CONFIG_COUNT] = [
    "s2t", "t2s", "s2tw", "tw2s", "s2twp", "tw2sp", "s2hk", "hk2s", "t2tw", "t2twp", "tw2t",
    "tw2tp", "t2hk", "hk2t", "t2jp", "jp2t",
];

const ALL: [Config; CONFIG_COUNT] = [
    Config::S2T,
    Config::T2S,
    Config::S2Tw,
    Config::Tw2S,
    Config::S2Twp,
    Config::Tw2Sp,
    Config::S2Hk,
    Config::Hk2S,
    Config::T2Tw,
    Config::T2Twp,
    Config::Tw2T,
    Config::Tw2Tp,
    Config::T2Hk,
    Config::Hk2T,
    Config::T2Jp,
    Config::Jp2T,
];

impl Config {
    /// Parses a direction name: surrounding whitespace is ignored and the
    /// comparison is case-insensitive. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Config> {
        let name = name.trim();
        NAMES
            .iter()
            .position(|n| name.eq_ignore_ascii_case(n))
            .map(|i| ALL[i])
    }

    /// The canonical lowercase name of this direction.
    #[inline]
    pub fn as_str(self) -> &'static str {
        NAMES[self.index()]
    }

    /// Dense index, stable across the registry tables.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// All canonical names, in registry order (stable across releases).
    pub const fn all_names() -> [&'static str; CONFIG_COUNT] {
        NAMES
    }

    /// All directions, in registry order.
    pub const fn all() -> [Config; CONFIG_COUNT] {
        ALL
    }

    /// Whether `name` parses to a known direction.
    pub fn is_valid(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
