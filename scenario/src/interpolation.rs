use derive_more::Display;
use enum_iterator::Sequence;

/// How a column's value is reconstructed between two stored samples.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, Sequence)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    /// Straight line between the bracketing samples.
    #[default]
    #[display("L")]
    Linear,
    /// Hold the earlier sample until the next one.
    #[display("ZOH")]
    ZeroOrderHold,
    /// Whichever bracketing sample is closer in time; ties go to the earlier one.
    #[display("NN")]
    NearestNeighbor,
}

impl Interpolation {
    /// Policy used for empty or unrecognized tokens, and for every column when the
    /// interpolation text is absent or does not line up with the scenario columns.
    pub const DEFAULT: Interpolation = Interpolation::Linear;

    /// Parses one interpolation token. Matching is case-insensitive and ignores
    /// surrounding whitespace.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        enum_iterator::all::<Interpolation>().find(|i| i.token().eq_ignore_ascii_case(token))
    }

    /// Like [from_token][Self::from_token], but falls back on [DEFAULT][Self::DEFAULT].
    pub fn from_token_or_default(token: &str) -> Self {
        Self::from_token(token).unwrap_or(Self::DEFAULT)
    }

    pub const fn token(self) -> &'static str {
        match self {
            Interpolation::Linear => "L",
            Interpolation::ZeroOrderHold => "ZOH",
            Interpolation::NearestNeighbor => "NN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_linear() {
        assert_eq!(Interpolation::DEFAULT, Interpolation::Linear);
        assert_eq!(Interpolation::default(), Interpolation::DEFAULT);
    }

    #[test]
    fn tokens_are_case_insensitive() {
        assert_eq!(Interpolation::from_token("zoh"), Some(Interpolation::ZeroOrderHold));
        assert_eq!(Interpolation::from_token(" nN "), Some(Interpolation::NearestNeighbor));
        assert_eq!(Interpolation::from_token("l"), Some(Interpolation::Linear));
    }

    #[test]
    fn unknown_tokens_fall_back() {
        assert_eq!(Interpolation::from_token(""), None);
        // Cubic is not evaluated anywhere.
        assert_eq!(Interpolation::from_token("C"), None);
        assert_eq!(
            Interpolation::from_token_or_default("spline"),
            Interpolation::DEFAULT
        );
    }

    #[test]
    fn display_matches_token() {
        for policy in enum_iterator::all::<Interpolation>() {
            assert_eq!(policy.to_string(), policy.token());
            assert_eq!(Interpolation::from_token(policy.token()), Some(policy));
        }
    }
}
