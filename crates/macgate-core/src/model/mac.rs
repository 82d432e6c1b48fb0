// ── MAC address identity ──
//
// Every equality check in the crate goes through `MacAddress`, which keeps
// only the 12 lowercase hex digits. Separator style is a rendering concern
// chosen per wire schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// How a MAC address is rendered on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum MacStyle {
    /// `aa:bb:cc:dd:ee:ff`
    ColonLower,
    /// `AA:BB:CC:DD:EE:FF`
    ColonUpper,
    /// `AA-BB-CC-DD-EE-FF`
    HyphenUpper,
    /// `aabbccddeeff`
    Bare,
}

/// A 48-bit hardware address, stored canonically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(String);

impl MacAddress {
    /// Canonicalize colon, hyphen, dot and bare forms.
    ///
    /// Surrounding whitespace is ignored. Anything that does not leave
    /// exactly 12 hex digits is rejected.
    pub fn normalize(raw: &str) -> Result<Self, CoreError> {
        let stripped: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .collect();

        if stripped.len() != 12 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidMac {
                raw: raw.to_owned(),
            });
        }
        Ok(Self(stripped.to_ascii_lowercase()))
    }

    /// The 12 lowercase hex digits.
    pub fn canonical(&self) -> &str {
        &self.0
    }

    pub fn format(&self, style: MacStyle) -> String {
        match style {
            MacStyle::ColonLower => self.grouped(':'),
            MacStyle::ColonUpper => self.grouped(':').to_ascii_uppercase(),
            MacStyle::HyphenUpper => self.grouped('-').to_ascii_uppercase(),
            MacStyle::Bare => self.0.clone(),
        }
    }

    /// Last six hex digits, uppercased (used for default device names).
    pub fn suffix(&self) -> String {
        self.0.get(6..).unwrap_or_default().to_ascii_uppercase()
    }

    fn grouped(&self, sep: char) -> String {
        let mut out = String::with_capacity(17);
        for (i, c) in self.0.chars().enumerate() {
            if i > 0 && i % 2 == 0 {
                out.push(sep);
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(MacStyle::ColonLower))
    }
}

impl FromStr for MacAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::normalize(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn spellings_normalize_to_one_value() {
        let forms = [
            "AA:BB:CC:DD:EE:FF",
            "aabbccddeeff",
            "aa-bb-cc-dd-ee-ff",
            "aabb.ccdd.eeff",
            "  Aa:bB:cc:DD:ee:FF\n",
        ];
        let first = MacAddress::normalize(forms[0]).unwrap();
        for raw in forms {
            assert_eq!(MacAddress::normalize(raw).unwrap(), first, "{raw}");
        }
        assert_eq!(first.canonical(), "aabbccddeeff");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = MacAddress::normalize("AA-BB-CC-DD-EE-FF").unwrap();
        for style in [
            MacStyle::ColonLower,
            MacStyle::ColonUpper,
            MacStyle::HyphenUpper,
            MacStyle::Bare,
        ] {
            assert_eq!(MacAddress::normalize(&once.format(style)).unwrap(), once);
        }
    }

    #[test]
    fn short_address_is_rejected() {
        let err = MacAddress::normalize("AA:BB:CC").unwrap_err();
        assert!(matches!(err, CoreError::InvalidMac { .. }));
    }

    #[test]
    fn non_hex_is_rejected() {
        assert!(MacAddress::normalize("gg:bb:cc:dd:ee:ff").is_err());
        assert!(MacAddress::normalize("").is_err());
    }

    #[test]
    fn styles_render_expected_separators() {
        let mac: MacAddress = "aabbccddeeff".parse().unwrap();
        assert_eq!(mac.format(MacStyle::ColonLower), "aa:bb:cc:dd:ee:ff");
        assert_eq!(mac.format(MacStyle::ColonUpper), "AA:BB:CC:DD:EE:FF");
        assert_eq!(mac.format(MacStyle::HyphenUpper), "AA-BB-CC-DD-EE-FF");
        assert_eq!(mac.format(MacStyle::Bare), "aabbccddeeff");
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(mac.suffix(), "DDEEFF");
    }

    #[test]
    fn serde_uses_colon_form_and_validates() {
        let mac: MacAddress = serde_json::from_str("\"AA-BB-CC-DD-EE-FF\"").unwrap();
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"aa:bb:cc:dd:ee:ff\"");
        assert!(serde_json::from_str::<MacAddress>("\"nope\"").is_err());
    }
}
