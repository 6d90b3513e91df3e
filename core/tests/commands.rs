use pubsim_core::{
    CloseReason, GameBuilder, GameState, LogCategory, Milestone, Rejection, SecurityTask,
    StaffRole,
};

fn new_game(seed: u64) -> GameState {
    GameBuilder::from_embedded()
        .unwrap()
        .with_seed(seed)
        .build()
        .unwrap()
}

fn assert_untouched(game: &GameState, before: &pubsim_core::Snapshot) {
    assert_eq!(&game.snapshot(), before);
}

#[test]
fn staffing_waits_for_closing_time() {
    let mut game = new_game(1);
    game.open_night().unwrap();
    let before = game.snapshot();
    assert_eq!(game.hire_staff(StaffRole::Trainee), Err(Rejection::PubOpen));
    assert_untouched(&game, &before);

    game.play_to_close();
    let id = game.hire_staff(StaffRole::Trainee).unwrap();
    assert!(game.snapshot().staff.iter().any(|member| member.id == id));
}

#[test]
fn floor_commands_need_an_open_night() {
    let mut game = new_game(2);
    let before = game.snapshot();
    assert_eq!(game.resolve_action("work_the_room"), Err(Rejection::PubClosed));
    assert_eq!(game.hire_bouncer(), Err(Rejection::PubClosed));
    assert_untouched(&game, &before);
}

#[test]
fn unknown_ids_are_rejected_and_logged() {
    let mut game = new_game(3);
    game.drain_log();
    let before = game.snapshot();
    assert!(matches!(
        game.buy_upgrade("gold_taps"),
        Err(Rejection::Unknown { kind: "upgrade", .. })
    ));
    assert!(matches!(
        game.schedule_activity("mud_wrestling"),
        Err(Rejection::Unknown { kind: "activity", .. })
    ));
    assert!(matches!(
        game.open_credit_line("bank_of_nowhere"),
        Err(Rejection::Unknown { kind: "bank", .. })
    ));
    assert_untouched(&game, &before);
    let lines = game.drain_log();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|line| line.category == LogCategory::Negative));
}

#[test]
fn paying_with_nothing_owed_is_refused() {
    let mut game = new_game(4);
    assert!(game.pending_bills().is_empty());
    assert_eq!(game.apply_payday_payments(&[]), Err(Rejection::NoBillsPending));
}

#[test]
fn picky_banks_turn_away_an_average_score() {
    let mut game = new_game(5);
    assert_eq!(game.snapshot().credit_score, 620);
    assert!(matches!(
        game.open_credit_line("union_albion"),
        Err(Rejection::CreditRefused(_))
    ));
    assert!(game.snapshot().credit_lines.is_empty());

    let id = game.open_credit_line("townland").unwrap();
    assert!(game.snapshot().credit_lines.iter().any(|line| line.id == id));
    assert!(matches!(
        game.open_credit_line("townland"),
        Err(Rejection::CreditRefused(_))
    ));
}

#[test]
fn a_second_booking_replaces_the_first() {
    let mut game = new_game(6);
    let cash = game.snapshot().cash;
    game.schedule_activity("quiz_night").unwrap();
    game.schedule_activity("acoustic_set").unwrap();
    let snapshot = game.snapshot();
    assert_eq!(snapshot.activity_booked.as_deref(), Some("acoustic_set"));
    assert!(snapshot.cash < cash - 60.0);

    game.open_night().unwrap();
    let snapshot = game.snapshot();
    assert_eq!(snapshot.activity_booked, None);
    assert_eq!(snapshot.activity_tonight.as_deref(), Some("acoustic_set"));
}

#[test]
fn prices_stay_inside_their_band() {
    let mut game = new_game(7);
    assert!(matches!(
        game.set_price_multiplier(9.0),
        Err(Rejection::InvalidValue(_))
    ));
    assert!(matches!(
        game.set_price_multiplier(f64::NAN),
        Err(Rejection::InvalidValue(_))
    ));
    assert_eq!(game.set_price_multiplier(1.25), Ok(1.25));
    assert_eq!(game.snapshot().price_multiplier, 1.25);
}

#[test]
fn one_landlord_action_per_round() {
    let mut game = new_game(8);
    game.open_night().unwrap();
    let available = game.available_actions();
    let Some((first, _)) = available.iter().find(|(_, cooldown)| *cooldown == 0) else {
        panic!("no action is available on the first round");
    };
    let id = first.id.clone();
    game.resolve_action(&id).unwrap();
    assert!(matches!(
        game.resolve_action(&id),
        Err(Rejection::ActionAlreadyTaken) | Err(Rejection::Cooldown { .. })
    ));
}

#[test]
fn door_tasks_need_base_security_and_run_next_round() {
    let mut game = new_game(9);
    assert_eq!(
        game.resolve_security_task(SecurityTask::VisiblePatrol),
        Err(Rejection::PubClosed)
    );
    game.open_night().unwrap();
    assert!(matches!(
        game.resolve_security_task(SecurityTask::VisiblePatrol),
        Err(Rejection::Locked { .. })
    ));
    game.close_night(CloseReason::Manual);

    while game.snapshot().security.base < 5 {
        game.upgrade_security().unwrap();
    }
    game.open_night().unwrap();
    assert_eq!(
        game.resolve_security_task(SecurityTask::CheckIds),
        Ok(SecurityTask::CheckIds)
    );
    assert_eq!(game.snapshot().security_task, Some(SecurityTask::CheckIds));
    assert_eq!(
        game.resolve_security_task(SecurityTask::VisiblePatrol),
        Err(Rejection::TaskAlreadyQueued)
    );
    let listed = game.security_tasks();
    assert_eq!(listed.len(), SecurityTask::ALL.len());
    assert!(listed
        .iter()
        .any(|(task, _, cooldown)| *task == SecurityTask::CheckIds && *cooldown > 0));

    game.play_to_close();
    assert_eq!(game.snapshot().security_task, None);
}

#[test]
fn three_closed_nights_earn_the_first_milestone() {
    let mut game = new_game(10);
    for _ in 0..3 {
        game.open_night().unwrap();
        game.play_to_close();
    }
    assert!(game.milestones().contains(&Milestone::OpenForBusiness));
    let snapshot = game.snapshot();
    assert!(snapshot.milestones.contains(&Milestone::OpenForBusiness));
    assert_eq!(snapshot.stars, 0);
    assert!(!snapshot.prestige_ready);
    assert!(matches!(game.prestige(), Err(Rejection::Requirement(_))));
}
