use pubsim_core::{GameBuilder, GameState, PersistenceError, SAVE_VERSION, StaffRole};

fn played_game(seed: u64) -> GameState {
    let mut game = GameBuilder::from_embedded()
        .unwrap()
        .with_seed(seed)
        .build()
        .unwrap();
    for _ in 0..3 {
        game.open_night().unwrap();
        game.play_to_close();
    }
    game.hire_staff(StaffRole::Trainee).unwrap();
    game
}

fn continue_for(game: &mut GameState, nights: usize) {
    for _ in 0..nights {
        game.open_night().unwrap();
        game.play_to_close();
    }
}

#[test]
fn json_saves_continue_identically() {
    let mut source_game = played_game(77);
    let saved = source_game.save_json().unwrap();
    let mut restored =
        GameState::load_json(source_game.config().clone(), source_game.catalog().clone(), &saved)
            .unwrap();
    assert_eq!(source_game.snapshot(), restored.snapshot());

    continue_for(&mut source_game, 5);
    continue_for(&mut restored, 5);
    assert_eq!(source_game.snapshot(), restored.snapshot());
}

#[test]
fn byte_saves_continue_identically() {
    let mut source_game = played_game(78);
    let saved = source_game.save_bytes().unwrap();
    let mut restored =
        GameState::load_bytes(source_game.config().clone(), source_game.catalog().clone(), &saved)
            .unwrap();

    continue_for(&mut source_game, 4);
    continue_for(&mut restored, 4);
    assert_eq!(source_game.snapshot(), restored.snapshot());
}

#[test]
fn loading_announces_itself() {
    let mut source_game = played_game(79);
    let saved = source_game.save_json().unwrap();
    let mut restored =
        GameState::load_json(source_game.config().clone(), source_game.catalog().clone(), &saved)
            .unwrap();
    let lines = restored.drain_log();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].text.starts_with("Loaded "));
}

#[test]
fn saves_from_another_version_are_refused() {
    let mut game = played_game(80);
    let saved = game.save_json().unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    value["version"] = serde_json::json!(SAVE_VERSION + 1);
    let tampered = value.to_string();

    match GameState::load_json(game.config().clone(), game.catalog().clone(), &tampered) {
        Err(PersistenceError::UnsupportedVersion { expected, found }) => {
            assert_eq!(expected, SAVE_VERSION);
            assert_eq!(found, SAVE_VERSION + 1);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("a newer save was accepted"),
    }
}

#[test]
fn truncated_saves_are_malformed() {
    let mut game = played_game(81);
    let saved = game.save_bytes().unwrap();
    let result = GameState::load_bytes(
        game.config().clone(),
        game.catalog().clone(),
        &saved[..saved.len() / 2],
    );
    assert!(matches!(result, Err(PersistenceError::Malformed(_))));
}
