//! Properties reported by several literature sources.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// Closed set of literature sources for one property.
pub trait PropertySource: Copy + Ord + Debug + Display + FromStr + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;
}

macro_rules! property_sources {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub enum $name {
            $($variant),+
        }

        impl PropertySource for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(PropertySource::as_str(*self))
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = value.trim();
                <Self as PropertySource>::ALL
                    .iter()
                    .copied()
                    .find(|source| source.as_str().eq_ignore_ascii_case(normalized))
                    .ok_or_else(|| format!("unknown {} source '{}'", stringify!($name), value))
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(source: $name) -> Self {
                source.as_str().to_string()
            }
        }
    };
}

property_sources!(
    /// Covalent radius tabulations (Cordero 2008, Bragg 1920, Slater 1964).
    CovalentRadiusSource {
        Cordero => "cordero",
        Bragg => "bragg",
        Slater => "slater",
    }
);

property_sources!(
    /// Van der Waals radius tabulations.
    VdwRadiusSource {
        Bondi => "bondi",
        Truhlar => "truhlar",
        Rt => "rt",
        Batsanov => "batsanov",
        Dreiding => "dreiding",
        Uff => "uff",
        Mm3 => "mm3",
    }
);

/// Values of one property keyed by source.
///
/// A source may be listed without a value (`None`) when the tabulation
/// exists but has no entry for the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent, bound(deserialize = "S: Deserialize<'de> + Ord"))]
pub struct SourcedProperty<S> {
    values: BTreeMap<S, Option<f64>>,
}

impl<S: PropertySource> Default for SourcedProperty<S> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<S: PropertySource> SourcedProperty<S> {
    pub fn get(&self, source: S) -> Option<f64> {
        self.values.get(&source).copied().flatten()
    }

    pub fn contains(&self, source: S) -> bool {
        self.values.contains_key(&source)
    }

    /// Sources that carry an actual value.
    pub fn available_sources(&self) -> impl Iterator<Item = S> + '_ {
        self.values
            .iter()
            .filter_map(|(source, value)| value.map(|_| *source))
    }

    pub fn iter(&self) -> impl Iterator<Item = (S, Option<f64>)> + '_ {
        self.values.iter().map(|(source, value)| (*source, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn non_finite_source(&self) -> Option<S> {
        self.values
            .iter()
            .find(|(_, value)| value.is_some_and(|value| !value.is_finite()))
            .map(|(source, _)| *source)
    }
}

impl<S: PropertySource> FromIterator<(S, Option<f64>)> for SourcedProperty<S> {
    fn from_iter<I: IntoIterator<Item = (S, Option<f64>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
