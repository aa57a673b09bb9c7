//! Integration tests for dependency injection.

use std::path::Path;

use flappy::{
    Action, RawObservation,
    adapters::InMemoryRepository,
    app::{AgentConfig, App, Hyperparameters},
    ports::FlappyAgent,
};

fn play(agent: &mut impl FlappyAgent) {
    let mut state = RawObservation::new(240.0, 200.0, 150.0, 0);
    for frame in 0..50 {
        let action = agent.training_policy(&state);
        let next = RawObservation::new(
            state.player_y + 6.0,
            200.0,
            (150.0 - 4.0 * f64::from(frame)).max(0.0),
            1,
        );
        let end = frame == 49;
        agent.observe(&state, action, if end { -5.0 } else { 0.0 }, &next, end);
        agent.record_frame();
        state = next;
    }
}

#[test]
fn test_app_with_in_memory_repository() {
    let repo = InMemoryRepository::new();
    let app = App::for_testing()
        .with_repository(repo.clone())
        .with_default_seed(42)
        .build();

    let mut agent = app.create_agent(AgentConfig::default());
    play(&mut agent);

    let path = app.save_table(&agent, Path::new("results")).unwrap();
    assert_eq!(path, Path::new("results/qvalues_1.csv"));
    assert_eq!(repo.count(), 1);

    let loaded = app.load_table(&path).unwrap();
    assert_eq!(&loaded, agent.q_table());
}

#[test]
fn test_deterministic_training_with_seed() {
    let config = AgentConfig::new(Hyperparameters::new(0.2, 0.9, 0.5).unwrap()).with_seed(42);

    let app1 = App::for_testing().build();
    let app2 = App::for_testing().build();
    let mut agent1 = app1.create_agent(config);
    let mut agent2 = app2.create_agent(config);

    play(&mut agent1);
    play(&mut agent2);

    assert_eq!(agent1.q_table(), agent2.q_table());
    assert_eq!(agent1.counters(), agent2.counters());
}

#[test]
fn test_loaded_agent_acts_like_the_trained_one() {
    let app = App::for_testing()
        .with_repository(InMemoryRepository::new())
        .with_default_seed(7)
        .build();
    let mut agent = app.create_agent(AgentConfig::default());
    play(&mut agent);
    let path = app.save_table(&agent, Path::new("out")).unwrap();

    let restored = app.load_agent(&path, AgentConfig::default()).unwrap();
    for y in [0.0, 120.0, 240.0, 360.0, 480.0] {
        let state = RawObservation::new(y, 200.0, 100.0, 1);
        assert_eq!(restored.policy(&state), agent.policy(&state));
    }
    assert!(matches!(
        restored.policy(&RawObservation::new(10.0, 500.0, 5.0, 99)),
        Action::NoOp
    ));
}
