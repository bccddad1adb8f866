//! Ruleset selector taken from the page query string

use serde::Serialize;
use url::form_urlencoded;

/// Which ruleset the UI scores against.
///
/// Read once at startup from `?ruleset=N`; anything other than `1` or `2`
/// falls back to [`Ruleset::Two`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum Ruleset {
    One = 1,
    #[default]
    Two = 2,
}

impl Ruleset {
    /// Parse from a raw query string, with or without the leading `?`.
    ///
    /// Keys and values are form-url-decoded the way `URLSearchParams` does;
    /// only the first `ruleset` parameter counts.
    pub fn from_query(query: &str) -> Self {
        let value = form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .find(|(key, _)| key == "ruleset")
            .map(|(_, value)| value);

        Self::from_param(value.as_deref())
    }

    pub fn from_param(value: Option<&str>) -> Self {
        match value.and_then(|v| v.trim().parse::<i64>().ok()) {
            Some(1) => Ruleset::One,
            Some(2) => Ruleset::Two,
            _ => Ruleset::default(),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<Ruleset> for u8 {
    fn from(ruleset: Ruleset) -> u8 {
        ruleset.as_u8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruleset_from_query() {
        assert_eq!(Ruleset::from_query(""), Ruleset::Two);
        assert_eq!(Ruleset::from_query("ruleset=1"), Ruleset::One);
        assert_eq!(Ruleset::from_query("ruleset=2"), Ruleset::Two);
        assert_eq!(Ruleset::from_query("ruleset=abc"), Ruleset::Two);
        assert_eq!(Ruleset::from_query("ruleset=5"), Ruleset::Two);
        assert_eq!(Ruleset::from_query("ruleset=0"), Ruleset::Two);
    }

    #[test]
    fn test_ruleset_query_shapes() {
        assert_eq!(Ruleset::from_query("?ruleset=1"), Ruleset::One);
        assert_eq!(Ruleset::from_query("?theme=dark&ruleset=1"), Ruleset::One);
        assert_eq!(Ruleset::from_query("?ruleset=1&ruleset=2"), Ruleset::One);
        assert_eq!(Ruleset::from_query("?ruleset"), Ruleset::Two);
        assert_eq!(Ruleset::from_query("?rulesets=1"), Ruleset::Two);
        assert_eq!(Ruleset::from_query("?ruleset=-1"), Ruleset::Two);
    }

    #[test]
    fn test_ruleset_query_is_percent_decoded() {
        assert_eq!(Ruleset::from_query("?ruleset=%31"), Ruleset::One);
        assert_eq!(Ruleset::from_query("?rule%73et=1"), Ruleset::One);
        assert_eq!(Ruleset::from_query("?ruleset=+1+"), Ruleset::One);
        assert_eq!(Ruleset::from_query("?ruleset=%35"), Ruleset::Two);
        assert_eq!(Ruleset::from_query("?ruleset=%zz"), Ruleset::Two);
    }

    #[test]
    fn test_ruleset_as_number() {
        assert_eq!(Ruleset::One.as_u8(), 1);
        assert_eq!(u8::from(Ruleset::Two), 2);
        assert_eq!(serde_json::to_string(&Ruleset::One).unwrap(), "1");
    }
}
