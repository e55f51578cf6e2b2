//! Android ABI identifiers and ABI sets.
//!
//! Only the three ABIs the SpatiaLite distribution ships for are accepted.
//! Any other identifier is rejected at parse time with a descriptive error.

use crate::error::{PackagerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A supported Android ABI.
///
/// The declaration order defines the ordering used by [`AbiSet`], so output
/// directories, archive entries, and log lines always list ABIs the same way.
///
/// # Examples
///
/// ```
/// use spatialite_aar::abi::AndroidAbi;
///
/// let abi: AndroidAbi = "arm64-v8a".parse().expect("valid ABI");
/// assert_eq!(abi.clang_target(), "aarch64-linux-android");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AndroidAbi {
    /// 64-bit ARM.
    Arm64V8a,
    /// 32-bit ARMv7 with hardware floating point.
    ArmeabiV7a,
    /// 64-bit x86.
    X86_64,
}

impl AndroidAbi {
    /// Every supported ABI, in canonical order.
    pub const ALL: [Self; 3] = [Self::Arm64V8a, Self::ArmeabiV7a, Self::X86_64];

    /// Return the identifier used by the NDK, CMake, and the AAR layout.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arm64V8a => "arm64-v8a",
            Self::ArmeabiV7a => "armeabi-v7a",
            Self::X86_64 => "x86_64",
        }
    }

    /// Return the clang target triple the NDK uses for this ABI.
    #[must_use]
    pub const fn clang_target(self) -> &'static str {
        match self {
            Self::Arm64V8a => "aarch64-linux-android",
            Self::ArmeabiV7a => "armv7a-linux-androideabi",
            Self::X86_64 => "x86_64-linux-android",
        }
    }

    /// Comma-separated list of supported identifiers, for error messages.
    #[must_use]
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|abi| abi.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for AndroidAbi {
    type Err = PackagerError;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|abi| abi.as_str() == value)
            .ok_or_else(|| PackagerError::UnsupportedAbi {
                value: value.to_owned(),
                expected: Self::supported_list(),
            })
    }
}

impl TryFrom<String> for AndroidAbi {
    type Error = PackagerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AndroidAbi> for String {
    fn from(abi: AndroidAbi) -> Self {
        abi.as_str().to_owned()
    }
}

impl fmt::Display for AndroidAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered, duplicate-free set of ABIs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AbiSet(BTreeSet<AndroidAbi>);

impl AbiSet {
    /// The full set of supported ABIs.
    #[must_use]
    pub fn all() -> Self {
        Self(AndroidAbi::ALL.into_iter().collect())
    }

    /// Parse a list of identifiers, rejecting unsupported ones.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::UnsupportedAbi`] for the first unknown
    /// identifier.
    pub fn parse<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        values
            .iter()
            .map(|value| value.as_ref().parse::<AndroidAbi>())
            .collect::<Result<BTreeSet<_>>>()
            .map(Self)
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ABIs in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set contains `abi`.
    #[must_use]
    pub fn contains(&self, abi: AndroidAbi) -> bool {
        self.0.contains(&abi)
    }

    /// Iterate over the ABIs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = AndroidAbi> + '_ {
        self.0.iter().copied()
    }

    /// ABIs in `self` that are absent from `other`.
    #[must_use]
    pub fn missing_from(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).copied().collect())
    }

    /// Keep only the ABIs also present in `other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).copied().collect())
    }
}

impl FromIterator<AndroidAbi> for AbiSet {
    fn from_iter<I: IntoIterator<Item = AndroidAbi>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for AbiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(AndroidAbi::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::arm64("arm64-v8a", AndroidAbi::Arm64V8a, "aarch64-linux-android")]
    #[case::armv7("armeabi-v7a", AndroidAbi::ArmeabiV7a, "armv7a-linux-androideabi")]
    #[case::x86_64("x86_64", AndroidAbi::X86_64, "x86_64-linux-android")]
    fn parses_supported_abis(
        #[case] name: &str,
        #[case] expected: AndroidAbi,
        #[case] clang: &str,
    ) {
        let abi: AndroidAbi = name.parse().expect("supported ABI");
        assert_eq!(abi, expected);
        assert_eq!(abi.to_string(), name);
        assert_eq!(abi.clang_target(), clang);
    }

    #[rstest]
    #[case::legacy_x86("x86")]
    #[case::mips("mips")]
    #[case::empty("")]
    #[case::wrong_case("ARM64-V8A")]
    fn rejects_unsupported_abis(#[case] name: &str) {
        let err = name.parse::<AndroidAbi>().expect_err("unsupported ABI");
        assert!(
            matches!(err, PackagerError::UnsupportedAbi { ref value, .. } if value == name),
            "expected UnsupportedAbi, got {err:?}"
        );
        assert!(err.to_string().contains("arm64-v8a, armeabi-v7a, x86_64"));
    }

    #[test]
    fn abi_set_deduplicates_and_orders() {
        let set = AbiSet::parse(&["x86_64", "arm64-v8a", "x86_64"]).expect("valid set");
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "arm64-v8a, x86_64");
    }

    #[test]
    fn missing_from_reports_packaged_abis_without_static_archives() {
        let packaged = AbiSet::all();
        let static_abis = AbiSet::parse(&["arm64-v8a", "x86_64"]).expect("valid set");
        let missing = packaged.missing_from(&static_abis);
        assert_eq!(missing.iter().collect::<Vec<_>>(), vec![AndroidAbi::ArmeabiV7a]);
        assert!(static_abis.missing_from(&packaged).is_empty());
    }

    #[test]
    fn deserializes_from_toml_strings() {
        #[derive(Deserialize)]
        struct Holder {
            abis: Vec<AndroidAbi>,
        }

        let holder: Holder = toml::from_str(r#"abis = ["armeabi-v7a"]"#).expect("valid TOML");
        assert_eq!(holder.abis, vec![AndroidAbi::ArmeabiV7a]);

        let bad = toml::from_str::<Holder>(r#"abis = ["riscv64"]"#);
        assert!(bad.is_err());
    }
}
