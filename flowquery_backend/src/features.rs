//! Unstable features of the front end. These settings change how a file
//! is checked, not the query language itself.

use std::convert::TryFrom;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum UnstableFeaturesError {
    #[error("unknown unstable feature `{0}`")]
    UnknownFeature(String),
}

/// Controls which unstable features are enabled. The [`Default`]
/// implementation disables all of them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UnstableFeatures {
    /// Reject type variables that would be bound to a type containing
    /// themselves.
    pub occurs_check: bool,
}

impl UnstableFeatures {
    pub const fn new(occurs_check: bool) -> Self {
        Self { occurs_check }
    }
}

/// Goes from a list of feature names, as given on a command line, to an
/// `UnstableFeatures`.
impl TryFrom<Vec<String>> for UnstableFeatures {
    type Error = UnstableFeaturesError;

    fn try_from(features: Vec<String>) -> Result<Self, Self::Error> {
        let mut res = UnstableFeatures::default();

        for feature in features {
            match feature.as_str() {
                "occurs-check" => res.occurs_check = true,
                _ => return Err(UnstableFeaturesError::UnknownFeature(feature)),
            }
        }

        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_features() {
        let features = UnstableFeatures::try_from(vec!["occurs-check".to_owned()]);
        assert_eq!(features, Ok(UnstableFeatures::new(true)));

        let none = UnstableFeatures::try_from(Vec::new());
        assert_eq!(none, Ok(UnstableFeatures::default()));
    }

    #[test]
    fn rejects_unknown_features() {
        let features = vec!["occurs-check".to_owned(), "typecheck".to_owned()];

        assert_eq!(
            UnstableFeatures::try_from(features),
            Err(UnstableFeaturesError::UnknownFeature("typecheck".to_owned()))
        );
        assert_eq!(
            UnstableFeaturesError::UnknownFeature("x".to_owned()).to_string(),
            "unknown unstable feature `x`"
        );
    }
}
