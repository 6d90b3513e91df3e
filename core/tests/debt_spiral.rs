use pubsim_core::{
    BillKind, BillSelection, Catalog, EngineConfig, FundingSource, GameBuilder, GameState,
    PaymentAmount,
};

fn short_nights(seed: u64) -> GameState {
    let mut config = EngineConfig::from_embedded().unwrap();
    config.starting_cash = 100_000.0;
    config.closing_round = 1;
    GameBuilder::new(config, Catalog::from_embedded().unwrap())
        .with_seed(seed)
        .build()
        .unwrap()
}

fn play_week(game: &mut GameState) {
    for _ in 0..7 {
        game.open_night().unwrap();
        game.play_to_close();
    }
}

/// Wages in full so the staff stay, every other bill skipped.
fn pay_only_wages(game: &GameState) -> Vec<BillSelection> {
    game.pending_bills()
        .iter()
        .enumerate()
        .map(|(index, bill)| {
            let amount = if bill.kind == BillKind::Wages {
                PaymentAmount::Full
            } else {
                PaymentAmount::Skip
            };
            BillSelection::new(index, amount, FundingSource::Cash)
        })
        .collect()
}

#[test]
fn missed_minimums_climb_the_tiers_and_bring_the_bailiffs() {
    let mut game = short_nights(404);
    let mut bailiff_visits = 0;
    for expected_tier in 1..=4u8 {
        play_week(&mut game);
        assert!(game
            .pending_bills()
            .iter()
            .any(|bill| bill.kind == BillKind::Rent));
        let selections = pay_only_wages(&game);
        let outcome = game.apply_payday_payments(&selections).unwrap();
        assert!(!outcome.met_minimums);
        assert_eq!(outcome.debt_tier, expected_tier);
        assert_eq!(game.snapshot().debt_tier, expected_tier);

        bailiff_visits += game
            .drain_log()
            .iter()
            .filter(|line| line.text.starts_with("Bailiffs arrived."))
            .count();
    }
    assert_eq!(bailiff_visits, 1);
    assert!(!game.snapshot().bankrupt);
    assert!(!game.is_game_over());
}

#[test]
fn paying_minimums_clears_the_spiral() {
    let mut game = short_nights(405);
    play_week(&mut game);
    let selections = pay_only_wages(&game);
    assert_eq!(game.apply_payday_payments(&selections).unwrap().debt_tier, 1);

    play_week(&mut game);
    let outcome = game.apply_payday_payments(&[]).unwrap();
    assert!(outcome.met_minimums);
    assert_eq!(outcome.debt_tier, 0);
    assert!(game.pending_bills().is_empty());
}
