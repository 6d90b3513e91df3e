use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatronTier {
    LowLife,
    Regular,
    Decent,
    BigSpender,
}

impl PatronTier {
    fn wallet_range(self) -> (f64, f64) {
        match self {
            PatronTier::LowLife => (3.0, 25.0),
            PatronTier::Regular => (8.0, 58.0),
            PatronTier::Decent => (18.0, 108.0),
            PatronTier::BigSpender => (35.0, 175.0),
        }
    }

    fn trouble_range(self) -> (u32, u32) {
        match self {
            PatronTier::LowLife => (1, 3),
            PatronTier::Regular => (0, 2),
            PatronTier::Decent => (0, 1),
            PatronTier::BigSpender => (0, 1),
        }
    }

    pub fn food_chance(self) -> f64 {
        match self {
            PatronTier::BigSpender => 0.45,
            PatronTier::Decent => 0.30,
            PatronTier::Regular => 0.18,
            PatronTier::LowLife => 0.10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PatronTier::LowLife => "low-life",
            PatronTier::Regular => "regular",
            PatronTier::Decent => "decent",
            PatronTier::BigSpender => "big spender",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mood {
    Chill,
    Rowdy,
    Menace,
}

impl Mood {
    pub fn escalate(self) -> Mood {
        match self {
            Mood::Chill => Mood::Rowdy,
            Mood::Rowdy | Mood::Menace => Mood::Menace,
        }
    }

    pub fn calm(self) -> Mood {
        match self {
            Mood::Menace => Mood::Rowdy,
            Mood::Rowdy | Mood::Chill => Mood::Chill,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patron {
    pub id: u32,
    pub tier: PatronTier,
    pub wallet: f64,
    pub trouble: u32,
    pub mood: Mood,
    pub no_buy_streak: u32,
    pub drinks_bought: u32,
    #[serde(default)]
    pub ordered_food: bool,
    pub left: bool,
}

impl Patron {
    /// Rolls a new arrival. Good reputation and a wealthy crowd skew the tier upwards.
    pub(crate) fn roll<R: Rng + ?Sized>(rng: &mut R, id: u32, reputation: i32, wealth_bias: f64) -> Self {
        let roll = rng.gen_range(0..100) + reputation / 5 + (wealth_bias * 20.0).round() as i32;
        let tier = if roll < 20 {
            PatronTier::LowLife
        } else if roll < 55 {
            PatronTier::Regular
        } else if roll < 85 {
            PatronTier::Decent
        } else {
            PatronTier::BigSpender
        };
        let (wallet_min, wallet_max) = tier.wallet_range();
        let (trouble_min, trouble_max) = tier.trouble_range();
        let trouble = rng.gen_range(trouble_min..=trouble_max);
        let mood = if trouble >= 3 && rng.gen_bool(0.3) {
            Mood::Rowdy
        } else {
            Mood::Chill
        };
        Self {
            id,
            tier,
            wallet: rng.gen_range(wallet_min..=wallet_max),
            trouble,
            mood,
            no_buy_streak: 0,
            drinks_bought: 0,
            ordered_food: false,
            left: false,
        }
    }

    /// How much this patron stirs the room up, in chaos points.
    pub fn chaos_contribution(&self, reputation: i32) -> f64 {
        let mut value = match self.mood {
            Mood::Chill => -1.0,
            Mood::Rowdy => 1.0,
            Mood::Menace => 2.0,
        };
        value += self.trouble as f64 * 0.5;
        if self.no_buy_streak >= 2 {
            value += 0.5;
        }
        if reputation <= -40 {
            value += 0.5;
        } else if reputation >= 60 {
            value -= 0.5;
        }
        value.clamp(-2.0, 3.0)
    }

    pub fn can_afford(&self, price: f64) -> bool {
        self.wallet + 1e-9 >= price
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn wallets_fall_in_tier_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        for id in 0..200 {
            let patron = Patron::roll(&mut rng, id, 0, 0.0);
            let (min, max) = patron.tier.wallet_range();
            assert!(patron.wallet >= min && patron.wallet <= max);
        }
    }

    #[test]
    fn reputation_attracts_better_patrons() {
        let mut rng = StdRng::seed_from_u64(3);
        let loved = (0..300)
            .filter(|id| Patron::roll(&mut rng, *id, 100, 0.3).tier == PatronTier::BigSpender)
            .count();
        let mut rng = StdRng::seed_from_u64(3);
        let hated = (0..300)
            .filter(|id| Patron::roll(&mut rng, *id, -100, -0.3).tier == PatronTier::BigSpender)
            .count();
        assert!(loved > hated);
    }

    #[test]
    fn chaos_contribution_is_bounded() {
        let mut patron = Patron::roll(&mut StdRng::seed_from_u64(1), 1, 0, 0.0);
        patron.mood = Mood::Menace;
        patron.trouble = 10;
        patron.no_buy_streak = 3;
        assert_eq!(patron.chaos_contribution(-90), 3.0);
        patron.mood = Mood::Chill;
        patron.trouble = 0;
        patron.no_buy_streak = 0;
        assert_eq!(patron.chaos_contribution(90), -1.5);
    }

    #[test]
    fn moods_escalate_and_calm() {
        assert_eq!(Mood::Chill.escalate(), Mood::Rowdy);
        assert_eq!(Mood::Menace.escalate(), Mood::Menace);
        assert_eq!(Mood::Menace.calm(), Mood::Rowdy);
    }
}
