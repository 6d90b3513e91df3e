use anyhow::{Result, anyhow, ensure};
use rand::{SeedableRng, rngs::StdRng};

use super::{
    catalog::Catalog,
    config::EngineConfig,
    context::SimContext,
    state::GameState,
    systems::staffing,
    world::SimulationState,
};
use crate::log::{FanOutSink, LogHub, LogSink};

pub struct GameBuilder {
    config: EngineConfig,
    catalog: Catalog,
    rng: StdRng,
    sinks: FanOutSink,
}

impl GameBuilder {
    pub fn new(config: EngineConfig, catalog: Catalog) -> Self {
        Self {
            config,
            catalog,
            rng: StdRng::from_entropy(),
            sinks: FanOutSink::new(),
        }
    }

    /// Embedded engine config and catalog.
    pub fn from_embedded() -> Result<Self> {
        Ok(Self::new(EngineConfig::from_embedded()?, Catalog::from_embedded()?))
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn build(self) -> Result<GameState> {
        let bootstrap = self.into_bootstrap()?;
        Ok(GameState::new(bootstrap))
    }

    pub(crate) fn into_bootstrap(self) -> Result<GameBootstrap> {
        self.validate()?;
        let GameBuilder {
            config,
            catalog,
            mut rng,
            sinks,
        } = self;

        let mut log = LogHub::new(sinks);
        let mut sim = SimulationState::new(&config);
        {
            let mut ctx = SimContext::new(&mut sim, &mut rng, &config, &catalog, &mut log);
            hire_starting_staff(&mut ctx)?;
            stock_cellar(&mut ctx)?;
        }
        log.header(format!("Welcome to {}", config.pub_name));
        log.info(format!(
            "GBP {:.2} in the till, {} staff on the books. Open the doors when ready.",
            sim.ledger.cash(),
            sim.roster.len()
        ));

        Ok(GameBootstrap {
            rng,
            sim,
            config,
            catalog,
            log,
        })
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()?;
        self.catalog.validate()?;
        for role in &self.config.starting_staff {
            ensure!(
                self.catalog.role(*role).is_some(),
                "starting staff role has no template: {}",
                role.key()
            );
        }
        for item in self.config.starting_stock.keys() {
            ensure!(
                self.catalog.stock_item(item).is_some(),
                "starting stock item is not in the catalog: {item}"
            );
        }
        for item in self.config.standing_order.keys() {
            ensure!(
                self.catalog.stock_item(item).is_some(),
                "standing order item is not in the catalog: {item}"
            );
        }
        Ok(())
    }
}

pub(crate) struct GameBootstrap {
    pub(crate) rng: StdRng,
    pub(crate) sim: SimulationState,
    pub(crate) config: EngineConfig,
    pub(crate) catalog: Catalog,
    pub(crate) log: LogHub,
}

fn hire_starting_staff(ctx: &mut SimContext<'_>) -> Result<()> {
    let config = ctx.config;
    for role in &config.starting_staff {
        let member = staffing::roll_member(ctx, *role)
            .map_err(|rejection| anyhow!("could not roll starting staff: {rejection}"))?;
        ctx.sim.roster.push(member);
    }
    staffing::refresh_food_rack(ctx);
    Ok(())
}

fn stock_cellar(ctx: &mut SimContext<'_>) -> Result<()> {
    let (config, catalog) = (ctx.config, ctx.catalog);
    let day = ctx.sim.calendar.day_counter();
    for (id, quantity) in &config.starting_stock {
        let item = catalog
            .stock_item(id)
            .ok_or_else(|| anyhow!("unknown starting stock: {id}"))?;
        ctx.sim
            .inventory
            .rack_mut(item.kind)
            .add(&item.id, *quantity, day, item.shelf_life_days);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::staff::StaffRole;

    #[test]
    fn builds_from_embedded_content() {
        let game = GameBuilder::from_embedded().unwrap().with_seed(3).build().unwrap();
        let snapshot = game.snapshot();
        assert_eq!(snapshot.staff.len(), 3);
        assert_eq!(snapshot.cash, 650.0);
        assert!(snapshot.drinks_in_stock >= 60);
        assert!(!snapshot.open);
    }

    #[test]
    fn rejects_unknown_starting_stock() {
        let mut config = EngineConfig::default();
        config.starting_stock.insert("moonshine".to_string(), 4);
        let result = GameBuilder::new(config, Catalog::from_embedded().unwrap()).build();
        assert!(result.is_err());
    }

    #[test]
    fn same_seed_same_staff() {
        let mut config = EngineConfig::default();
        config.starting_staff = vec![StaffRole::Experienced, StaffRole::Speed];
        let build = |seed| {
            GameBuilder::new(config.clone(), Catalog::from_embedded().unwrap())
                .with_seed(seed)
                .build()
                .unwrap()
                .snapshot()
                .staff
        };
        assert_eq!(build(9), build(9));
    }
}
