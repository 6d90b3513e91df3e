use pubsim_core::{Catalog, CloseReason, EngineConfig, GameBuilder, GameState, LogCategory};

fn new_game(seed: u64) -> GameState {
    GameBuilder::new(
        EngineConfig::from_embedded().unwrap(),
        Catalog::from_embedded().unwrap(),
    )
    .with_seed(seed)
    .build()
    .unwrap()
}

#[test]
fn rounds_stay_within_their_bounds() {
    let mut game = new_game(101);
    let closing = game.config().closing_round;
    for _ in 0..3 {
        let open = game.open_night().unwrap();
        assert!(open.bar_capacity >= 5);
        assert!(open.opening_crowd <= open.bar_capacity);
        loop {
            let round = game.play_round();
            assert!(round.round <= closing);
            assert!(round.served + round.unserved <= round.demand);
            assert!(round.served <= round.capacity.max(1));
            assert!((0.0..=100.0).contains(&round.chaos));
            assert!((-100..=100).contains(&round.reputation));
            let snapshot = game.snapshot();
            assert!(snapshot.patrons_inside as u32 <= snapshot.bar_capacity);
            assert!(snapshot.cash >= 0.0);
            if let Some(close) = round.closed {
                assert_eq!(close.rounds_played, round.round);
                break;
            }
        }
        assert!(!game.is_night_open());
    }
}

#[test]
fn scheduled_close_happens_on_the_closing_round() {
    let mut game = new_game(7);
    game.open_night().unwrap();
    let close = game.play_to_close();
    if close.reason == CloseReason::Scheduled {
        assert_eq!(close.rounds_played, game.config().closing_round);
        assert_eq!(close.early_close_rep, 0);
    } else {
        assert!(close.rounds_played < game.config().closing_round);
    }
}

#[test]
fn manual_close_costs_reputation() {
    let mut game = new_game(8);
    game.open_night().unwrap();
    game.play_round();
    let close = game.close_night(CloseReason::Manual);
    assert!(close.early_close_rep < 0);
    assert_eq!(close.rounds_played, 1);
}

#[test]
fn a_full_week_settles_and_draws_up_bills() {
    let mut config = EngineConfig::from_embedded().unwrap();
    config.starting_cash = 20_000.0;
    let mut game = GameBuilder::new(config, Catalog::from_embedded().unwrap())
        .with_seed(55)
        .build()
        .unwrap();

    let mut week_report = None;
    for night in 1..=7 {
        game.open_night().unwrap();
        let close = game.play_to_close();
        if night < 7 {
            assert!(close.week.is_none());
        } else {
            week_report = close.week;
        }
    }
    let report = week_report.expect("the seventh close settles the week");
    assert_eq!(report.week, 1);

    let snapshot = game.snapshot();
    assert_eq!(snapshot.week, 2);
    assert_eq!(snapshot.day_index, 0);
    assert!(!game.pending_bills().is_empty());

    let lines = game.drain_log();
    assert!(lines
        .iter()
        .any(|line| line.category == LogCategory::Header && line.text == "END OF WEEK 1"));
    assert!(lines.iter().any(|line| line.text == "WEEK 1 REPORT"));
    assert!(lines
        .iter()
        .any(|line| line.text.starts_with("District: rivals leaned")));
    assert_eq!(snapshot.district.stances.len(), 3);
    assert!(game.rivals().iter().all(|(_, stance)| stance.is_some()));
}

#[test]
fn pending_bills_are_settled_when_the_doors_open() {
    let mut config = EngineConfig::from_embedded().unwrap();
    config.starting_cash = 20_000.0;
    config.closing_round = 2;
    let mut game = GameBuilder::new(config, Catalog::from_embedded().unwrap())
        .with_seed(56)
        .build()
        .unwrap();
    for _ in 0..7 {
        game.open_night().unwrap();
        game.play_to_close();
    }
    assert!(!game.pending_bills().is_empty());
    let open = game.open_night().unwrap();
    assert!(open.bills_auto_paid);
    assert!(game.pending_bills().is_empty());
}

#[test]
fn an_untended_pub_gets_through_its_first_fortnight() {
    let mut game = new_game(77);
    for night in 1..=14 {
        game.open_night()
            .unwrap_or_else(|rejection| panic!("night {night} refused: {rejection}"));
        let close = game.play_to_close();
        assert_ne!(close.reason, CloseReason::ReputationCollapse, "night {night}");
        assert!(!game.is_game_over(), "night {night}");
    }
    let snapshot = game.snapshot();
    assert_eq!(snapshot.week, 3);
    assert!(snapshot.drinks_in_stock > 0);
    assert_eq!(snapshot.debt_tier, 0);
}

#[test]
fn the_standing_order_refills_the_rack_overnight() {
    let mut game = new_game(78);
    let par: u32 = game.snapshot().standing_order.values().sum();
    assert!(par > 0);
    game.open_night().unwrap();
    game.play_to_close();
    assert!(game.snapshot().drinks_in_stock < par);
    game.drain_log();

    game.open_night().unwrap();
    assert_eq!(game.snapshot().drinks_in_stock, par);
    assert!(game
        .drain_log()
        .iter()
        .any(|line| line.text.starts_with("Standing order delivered")));
}

#[test]
fn same_seed_same_night() {
    let mut a = new_game(2024);
    let mut b = new_game(2024);
    a.open_night().unwrap();
    b.open_night().unwrap();
    assert_eq!(a.play_to_close(), b.play_to_close());
    assert_eq!(a.snapshot(), b.snapshot());
}
