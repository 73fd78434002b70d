//! Bilingual content resolution and numeral formatting.
//!
//! Every localizable field is a typed `{en, bn?}` pair; a missing or empty
//! Bengali value falls back to English. Amounts are whole-Taka integers and
//! are only formatted here, never rounded.

use serde::{Deserialize, Serialize};

/// Display language for a storefront session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Bn,
}

impl std::str::FromStr for Lang {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "bn" => Ok(Self::Bn),
            _ => Err(()),
        }
    }
}

/// A localizable string: an English value plus an optional Bengali
/// counterpart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bn: Option<String>,
}

impl LocalizedText {
    /// The Bengali value when present and non-empty, the English value
    /// otherwise.
    pub fn resolve(&self, lang: Lang) -> &str {
        match (lang, self.bn.as_deref()) {
            (Lang::Bn, Some(bn)) if !bn.is_empty() => bn,
            _ => &self.en,
        }
    }
}

/// A localizable ordered list of strings, resolved as a whole.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedList {
    pub en: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bn: Option<Vec<String>>,
}

impl LocalizedList {
    pub fn resolve(&self, lang: Lang) -> &[String] {
        match (lang, &self.bn) {
            (Lang::Bn, Some(bn)) if !bn.is_empty() => bn,
            _ => &self.en,
        }
    }
}

const BN_DIGITS: [char; 10] = ['০', '১', '২', '৩', '৪', '৫', '৬', '৭', '৮', '৯'];

/// Taka sign; the same glyph prefixes prices in both languages.
const CURRENCY_PREFIX: char = '৳';

/// Transliterates every ASCII digit to its Bengali glyph, leaving all other
/// characters untouched. Applied to decimal string representations only.
pub fn bengali_digits(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                BN_DIGITS[(c as u8 - b'0') as usize]
            } else {
                c
            }
        })
        .collect()
}

/// Formats an integer for display: thousands separators in English,
/// digit-by-digit Bengali transliteration in Bengali.
pub fn format_int(n: u64, lang: Lang) -> String {
    match lang {
        Lang::En => group_thousands(n),
        Lang::Bn => bengali_digits(&n.to_string()),
    }
}

/// Currency display: the Taka sign followed by the localized numeral.
pub fn format_price(amount: u64, lang: Lang) -> String {
    format!("{CURRENCY_PREFIX}{}", format_int(amount, lang))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Fixed localized messages carried by the core: the coupon rejection and
/// the assistant's canned replies.
pub mod messages {
    use super::Lang;

    pub fn invalid_coupon(lang: Lang) -> &'static str {
        match lang {
            Lang::En => "Invalid Code",
            Lang::Bn => "ভুল কোড",
        }
    }

    pub fn assistant_greeting(lang: Lang) -> &'static str {
        match lang {
            Lang::En => {
                "Hi! I'm your Sinopec Oil Expert. Tell me your vehicle model, and I'll find the perfect oil for you!"
            }
            Lang::Bn => {
                "আসসালামু আলাইকুম! আমি সিনোপেক এক্সপার্ট। আপনার গাড়ির মডেল বলুন, আমি সেরা অয়েল খুঁজে দেব!"
            }
        }
    }

    /// Canned suggestion used when no assistant credential is configured.
    pub fn assistant_offline_suggestion(lang: Lang) -> &'static str {
        match lang {
            Lang::En => {
                "I can help with that! Based on typical needs, I'd recommend checking out our Justar series for cars or Xplore for bikes."
            }
            Lang::Bn => {
                "আমি সাহায্য করতে পারি! গাড়ির জন্য জাস্টার সিরিজ বা বাইকের জন্য এক্সপ্লোর সিরিজ দেখতে পারেন।"
            }
        }
    }

    /// Generic soft-failure message for any external call that did not
    /// come back usable.
    pub fn connection_trouble(lang: Lang) -> &'static str {
        match lang {
            Lang::En => "I'm having trouble connecting to the catalog. Try again!",
            Lang::Bn => "দুঃখিত, সংযোগে সমস্যা হচ্ছে।",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bengali_value_wins_in_bengali_mode() {
        let field = LocalizedText {
            en: "Key Features".into(),
            bn: Some("বৈশিষ্ট্য".into()),
        };
        assert_eq!(field.resolve(Lang::En), "Key Features");
        assert_eq!(field.resolve(Lang::Bn), "বৈশিষ্ট্য");
    }

    #[test]
    fn missing_or_empty_bengali_falls_back_to_english() {
        let missing = LocalizedText {
            en: "API SP, ACEA A3/B4".into(),
            bn: None,
        };
        let empty = LocalizedText {
            en: "5W-40".into(),
            bn: Some(String::new()),
        };
        assert_eq!(missing.resolve(Lang::Bn), "API SP, ACEA A3/B4");
        assert_eq!(empty.resolve(Lang::Bn), "5W-40");
    }

    #[test]
    fn list_resolution_follows_the_same_fallback() {
        let list = LocalizedList {
            en: vec!["Fuel economy".into()],
            bn: None,
        };
        assert_eq!(list.resolve(Lang::Bn), ["Fuel economy".to_string()]);
    }

    #[test]
    fn digits_transliterate_one_by_one() {
        assert_eq!(bengali_digits("2015"), "২০১৫");
        assert_eq!(bengali_digits("0W-20"), "০W-২০");
    }

    #[test]
    fn english_integers_get_thousands_separators() {
        assert_eq!(format_int(0, Lang::En), "0");
        assert_eq!(format_int(999, Lang::En), "999");
        assert_eq!(format_int(4500, Lang::En), "4,500");
        assert_eq!(format_int(1_234_567, Lang::En), "1,234,567");
    }

    #[test]
    fn bengali_integers_are_transliterated_without_grouping() {
        assert_eq!(format_int(4500, Lang::Bn), "৪৫০০");
    }

    #[test]
    fn prices_carry_the_taka_sign_in_both_languages() {
        assert_eq!(format_price(6000, Lang::En), "৳6,000");
        assert_eq!(format_price(6000, Lang::Bn), "৳৬০০০");
    }
}
