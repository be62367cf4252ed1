//! Keyword rules consulted by the combat resolver.

use serde::{Deserialize, Serialize};

/// A card's single combat keyword.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Keyword {
    #[default]
    #[serde(rename = "none")]
    None,
    /// First strike: the attacker's damage lands before any counter-damage.
    #[serde(rename = "OVERCLOCK", alias = "overclock")]
    Overclock,
    /// Taunt: attacks into this side are redirected to this card.
    #[serde(rename = "BLOCKER", alias = "blocker")]
    Blocker,
    /// Lifesteal: damage dealt while attacking heals the owning side.
    #[serde(rename = "VAMPIRISM", alias = "vampirism")]
    Vampirism,
}

impl Keyword {
    pub fn strikes_first(self) -> bool {
        matches!(self, Keyword::Overclock)
    }

    pub fn taunts(self) -> bool {
        matches!(self, Keyword::Blocker)
    }

    pub fn steals_life(self) -> bool {
        matches!(self, Keyword::Vampirism)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::None => "none",
            Keyword::Overclock => "OVERCLOCK",
            Keyword::Blocker => "BLOCKER",
            Keyword::Vampirism => "VAMPIRISM",
        }
    }
}

/// Life regained by a lifesteal attacker.
///
/// Never more than `damage`, and never lifts `life` above `max_life`.
pub fn lifesteal_amount(keyword: Keyword, damage: i32, life: i32, max_life: i32) -> i32 {
    if !keyword.steals_life() || damage <= 0 {
        return 0;
    }
    damage.min((max_life - life).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_wire_names() {
        assert_eq!(serde_json::to_string(&Keyword::None).unwrap(), r#""none""#);
        assert_eq!(
            serde_json::to_string(&Keyword::Overclock).unwrap(),
            r#""OVERCLOCK""#
        );
        let parsed: Keyword = serde_json::from_str(r#""blocker""#).unwrap();
        assert_eq!(parsed, Keyword::Blocker);

        for keyword in [
            Keyword::None,
            Keyword::Overclock,
            Keyword::Blocker,
            Keyword::Vampirism,
        ] {
            let wire = serde_json::to_string(&keyword).unwrap();
            assert_eq!(wire, format!("\"{}\"", keyword.as_str()));
        }
    }

    #[test]
    fn only_matching_keyword_has_rule() {
        assert!(Keyword::Overclock.strikes_first());
        assert!(!Keyword::Blocker.strikes_first());
        assert!(Keyword::Blocker.taunts());
        assert!(!Keyword::None.taunts());
        assert!(Keyword::Vampirism.steals_life());
    }

    #[test]
    fn lifesteal_is_capped() {
        assert_eq!(lifesteal_amount(Keyword::Vampirism, 4, 20, 30), 4);
        assert_eq!(lifesteal_amount(Keyword::Vampirism, 4, 28, 30), 2);
        assert_eq!(lifesteal_amount(Keyword::Vampirism, 4, 30, 30), 0);
        assert_eq!(lifesteal_amount(Keyword::None, 4, 10, 30), 0);
        assert_eq!(lifesteal_amount(Keyword::Vampirism, 0, 10, 30), 0);
    }
}
