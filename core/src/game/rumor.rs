use serde::{Deserialize, Serialize};

pub const TOPIC_COUNT: usize = 10;
const HEAT_MAX: u32 = 100;
const EVENT_BIAS_MIN: f64 = -0.30;
const EVENT_BIAS_MAX: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RumorTopic {
    WateredDownDrinks,
    FightsEveryWeekend,
    BestSundayRoast,
    FoodPoisoningScare,
    LiveMusicScene,
    DodgyLateNights,
    StaffStealing,
    SlowService,
    FriendlyStaff,
    GreatAtmosphere,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopicImpact {
    pub traffic: f64,
    pub wealth: f64,
    pub event: f64,
    pub reputation: f64,
}

impl RumorTopic {
    pub const ALL: [RumorTopic; TOPIC_COUNT] = [
        RumorTopic::WateredDownDrinks,
        RumorTopic::FightsEveryWeekend,
        RumorTopic::BestSundayRoast,
        RumorTopic::FoodPoisoningScare,
        RumorTopic::LiveMusicScene,
        RumorTopic::DodgyLateNights,
        RumorTopic::StaffStealing,
        RumorTopic::SlowService,
        RumorTopic::FriendlyStaff,
        RumorTopic::GreatAtmosphere,
    ];

    pub fn index(self) -> usize {
        match self {
            RumorTopic::WateredDownDrinks => 0,
            RumorTopic::FightsEveryWeekend => 1,
            RumorTopic::BestSundayRoast => 2,
            RumorTopic::FoodPoisoningScare => 3,
            RumorTopic::LiveMusicScene => 4,
            RumorTopic::DodgyLateNights => 5,
            RumorTopic::StaffStealing => 6,
            RumorTopic::SlowService => 7,
            RumorTopic::FriendlyStaff => 8,
            RumorTopic::GreatAtmosphere => 9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RumorTopic::WateredDownDrinks => "watered-down drinks",
            RumorTopic::FightsEveryWeekend => "fights every weekend",
            RumorTopic::BestSundayRoast => "best Sunday roast",
            RumorTopic::FoodPoisoningScare => "food poisoning scare",
            RumorTopic::LiveMusicScene => "live music scene",
            RumorTopic::DodgyLateNights => "dodgy late nights",
            RumorTopic::StaffStealing => "staff stealing",
            RumorTopic::SlowService => "slow service",
            RumorTopic::FriendlyStaff => "friendly staff",
            RumorTopic::GreatAtmosphere => "great atmosphere",
        }
    }

    /// Effect of a rumor at full intensity.
    pub fn impact(self) -> TopicImpact {
        let (traffic, wealth, event, reputation) = match self {
            RumorTopic::WateredDownDrinks => (-0.06, -0.10, -0.02, -0.04),
            RumorTopic::FightsEveryWeekend => (-0.10, -0.06, -0.08, -0.06),
            RumorTopic::BestSundayRoast => (0.08, 0.06, 0.03, 0.05),
            RumorTopic::FoodPoisoningScare => (-0.09, -0.05, -0.06, -0.07),
            RumorTopic::LiveMusicScene => (0.05, 0.02, 0.05, 0.03),
            RumorTopic::DodgyLateNights => (-0.05, -0.03, -0.04, -0.04),
            RumorTopic::StaffStealing => (-0.07, -0.04, -0.03, -0.08),
            RumorTopic::SlowService => (-0.06, -0.04, -0.02, -0.04),
            RumorTopic::FriendlyStaff => (0.06, 0.03, 0.02, 0.05),
            RumorTopic::GreatAtmosphere => (0.07, 0.04, 0.03, 0.04),
        };
        TopicImpact {
            traffic,
            wealth,
            event,
            reputation,
        }
    }

    pub fn is_positive(self) -> bool {
        self.impact().reputation > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RumorSource {
    Punter,
    Staff,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RumorInstance {
    pub topic: RumorTopic,
    pub source: RumorSource,
    pub intensity: u32,
    pub spread_rate: f64,
    pub days_remaining: u32,
}

impl RumorInstance {
    pub(crate) fn from_heat(topic: RumorTopic, heat: u32, source: RumorSource) -> Self {
        let intensity = heat.min(HEAT_MAX);
        Self {
            topic,
            source,
            intensity,
            spread_rate: (0.15 + intensity as f64 / 200.0).min(1.0),
            days_remaining: (3 + intensity / 15).clamp(2, 14),
        }
    }

    /// Event bias contributed at the current intensity.
    pub fn event_impact(&self) -> f64 {
        self.topic.impact().event * self.intensity as f64 / 100.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RumorBoard {
    heat: [u32; TOPIC_COUNT],
    last_source: [Option<RumorSource>; TOPIC_COUNT],
    instances: Vec<RumorInstance>,
}

impl RumorBoard {
    pub fn heat(&self, topic: RumorTopic) -> u32 {
        self.heat[topic.index()]
    }

    pub fn instances(&self) -> &[RumorInstance] {
        &self.instances
    }

    /// Raises heat and materialises the instance when the topic was cold.
    pub(crate) fn add_heat(&mut self, topic: RumorTopic, amount: u32, source: RumorSource) -> bool {
        let idx = topic.index();
        let was_cold = self.heat[idx] == 0;
        self.heat[idx] = (self.heat[idx] + amount).min(HEAT_MAX);
        self.last_source[idx] = Some(source);
        if self.heat[idx] > 0 {
            self.refresh_instance(topic);
        }
        was_cold && self.heat[idx] > 0
    }

    pub(crate) fn decay_all(&mut self, amount: u32) {
        for heat in self.heat.iter_mut() {
            *heat = heat.saturating_sub(amount);
        }
    }

    /// Rebuilds every instance from current heat. Cold topics disappear.
    pub(crate) fn rebuild_instances(&mut self) {
        self.instances = RumorTopic::ALL
            .into_iter()
            .filter(|topic| self.heat[topic.index()] > 0)
            .map(|topic| {
                let idx = topic.index();
                RumorInstance::from_heat(
                    topic,
                    self.heat[idx],
                    self.last_source[idx].unwrap_or(RumorSource::Punter),
                )
            })
            .collect();
    }

    fn refresh_instance(&mut self, topic: RumorTopic) {
        let idx = topic.index();
        let fresh = RumorInstance::from_heat(
            topic,
            self.heat[idx],
            self.last_source[idx].unwrap_or(RumorSource::Punter),
        );
        match self.instances.iter_mut().find(|i| i.topic == topic) {
            Some(existing) => *existing = fresh,
            None => self.instances.push(fresh),
        }
    }

    pub fn traffic_multiplier(&self) -> f64 {
        let h = |topic: RumorTopic| self.heat(topic) as f64;
        (1.0 - 0.002 * h(RumorTopic::WateredDownDrinks)
            - 0.0025 * h(RumorTopic::FightsEveryWeekend)
            + 0.002 * h(RumorTopic::BestSundayRoast)
            - 0.002 * h(RumorTopic::FoodPoisoningScare)
            - 0.002 * h(RumorTopic::SlowService)
            + 0.002 * h(RumorTopic::FriendlyStaff)
            + 0.002 * h(RumorTopic::GreatAtmosphere))
            .clamp(0.8, 1.2)
    }

    pub fn event_bias(&self) -> f64 {
        self.instances
            .iter()
            .map(RumorInstance::event_impact)
            .sum::<f64>()
            .clamp(EVENT_BIAS_MIN, EVENT_BIAS_MAX)
    }

    /// Net reputation drag or lift of live rumors, in points.
    pub fn reputation_pressure(&self) -> f64 {
        self.instances
            .iter()
            .map(|i| i.topic.impact().reputation * i.intensity as f64 / 100.0 * i.spread_rate)
            .sum()
    }

    pub fn wealth_bias(&self) -> f64 {
        self.instances
            .iter()
            .map(|i| i.topic.impact().wealth * i.intensity as f64 / 100.0)
            .sum::<f64>()
            .clamp(-0.3, 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instances_follow_heat() {
        let instance = RumorInstance::from_heat(RumorTopic::SlowService, 60, RumorSource::Staff);
        assert_eq!(instance.intensity, 60);
        assert!((instance.spread_rate - 0.45).abs() < 1e-9);
        assert_eq!(instance.days_remaining, 7);

        let hot = RumorInstance::from_heat(RumorTopic::SlowService, 400, RumorSource::Staff);
        assert_eq!(hot.intensity, 100);
        assert_eq!(hot.days_remaining, 9);
        assert!((hot.spread_rate - 0.65).abs() < 1e-9);
    }

    #[test]
    fn heat_is_capped_and_decays() {
        let mut board = RumorBoard::default();
        assert!(board.add_heat(RumorTopic::FightsEveryWeekend, 80, RumorSource::Event));
        assert!(!board.add_heat(RumorTopic::FightsEveryWeekend, 80, RumorSource::Event));
        assert_eq!(board.heat(RumorTopic::FightsEveryWeekend), 100);
        board.decay_all(60);
        board.decay_all(60);
        board.rebuild_instances();
        assert!(board.instances().is_empty());
    }

    #[test]
    fn traffic_multiplier_is_bounded() {
        let mut board = RumorBoard::default();
        for topic in [
            RumorTopic::WateredDownDrinks,
            RumorTopic::FightsEveryWeekend,
            RumorTopic::FoodPoisoningScare,
            RumorTopic::SlowService,
        ] {
            board.add_heat(topic, 100, RumorSource::Punter);
        }
        assert_eq!(board.traffic_multiplier(), 0.8);
        assert!(board.event_bias() >= EVENT_BIAS_MIN);
    }
}
