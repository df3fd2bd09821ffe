// wfp-core/tests/integration_tests.rs
use std::sync::Arc;
use wfp_core::{
    CostMode, CostModel, CpuWavefrontDispatch, EngineState, FixedMazeSource, FrontierEngine,
    MazeAlgorithm, RawMaze, RunConfig, RunController, RunError, RunPhase, StepOutcome,
    TickOutcome, SENTINEL,
};

const BORDERED_5X5: &str = "
    #####
    #...#
    #...#
    #...#
    #####
";

// A 9x9 maze with a dead end and one corridor to the far corner.
const CORRIDOR_9X9: &str = "
    #########
    #.....#.#
    #####.#.#
    #...#...#
    #.#.###.#
    #.#.....#
    #.#####.#
    #.......#
    #########
";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cost_model(art: &str, mode: CostMode) -> CostModel {
    init_logger();
    let raw = RawMaze::from_ascii(art).expect("valid fixture");
    let mut rng = rand::thread_rng();
    CostModel::build(&raw, mode, &mut rng).expect("valid bitmap")
}

fn controller(art: &str) -> RunController {
    init_logger();
    let raw = RawMaze::from_ascii(art).expect("valid fixture");
    RunController::new(
        RunConfig::builder().size(raw.width).seed(11).build(),
        Box::new(FixedMazeSource::new(raw)),
        Box::new(CpuWavefrontDispatch::new()),
    )
    .expect("controller should start")
}

fn run_to_end(run: &mut RunController) -> Vec<TickOutcome> {
    let mut outcomes = Vec::new();
    while !run.phase().is_terminal() {
        outcomes.push(run.tick_default().expect("tick should succeed"));
    }
    outcomes
}

#[test]
fn test_bordered_5x5_scenario() {
    let model = cost_model(BORDERED_5X5, CostMode::Uniform);
    let mut engine = FrontierEngine::new(Box::new(CpuWavefrontDispatch::new()));
    engine.init(model.grid(), 6).unwrap();

    let mut outcomes = Vec::new();
    while engine.state() == EngineState::Expanding {
        outcomes.push(engine.step(18).unwrap());
    }
    assert_eq!(
        outcomes,
        vec![
            StepOutcome::Continue,
            StepOutcome::Continue,
            StepOutcome::Continue,
            StepOutcome::Found
        ]
    );
    assert_eq!(engine.state(), EngineState::Found);
    assert_eq!(engine.distances()[18], 4);
    assert_eq!(engine.distances()[6], 0);
    assert_eq!(engine.step_count(), 4);
    assert_eq!(engine.found_at_step(), Some(4));

    let mut run = controller(BORDERED_5X5);
    run_to_end(&mut run);
    assert_eq!(run.phase(), RunPhase::PathComplete);
    assert_eq!(run.path().len(), 5);
    assert_eq!(run.path().first(), Some(&18));
    assert_eq!(run.path().last(), Some(&6));
}

#[test]
fn test_path_is_a_connected_descending_chain() {
    let mut run = controller(CORRIDOR_9X9);
    run_to_end(&mut run);
    assert_eq!(run.phase(), RunPhase::PathComplete);

    let distances = run.distances();
    let path = run.path();
    let target_distance = distances[run.target_index()];
    assert_eq!(path.len(), target_distance as usize + 1);
    let width = run.cost_model().as_grid().width();
    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (ax, ay) = (a % width, a / width);
        let (bx, by) = (b % width, b / width);
        assert_eq!(ax.abs_diff(bx) + ay.abs_diff(by), 1, "{a} and {b} are not adjacent");
        assert_eq!(distances[a] - 1, distances[b]);
    }
}

#[test]
fn test_monotonic_wavefront() {
    let model = cost_model(CORRIDOR_9X9, CostMode::Uniform);
    let mut engine = FrontierEngine::new(Box::new(CpuWavefrontDispatch::new()));
    engine.init(model.grid(), 10).unwrap();
    let mut previous = engine.distances().to_vec();
    while engine.state() == EngineState::Expanding {
        engine.step(70).unwrap();
        let step = engine.step_count() as i32;
        for (cell, (&before, &after)) in previous.iter().zip(engine.distances()).enumerate() {
            if before != SENTINEL {
                assert_eq!(before, after, "distance of {cell} changed");
            } else if after != SENTINEL {
                assert_eq!(after, step, "cell {cell} discovered at step {step}");
            }
        }
        previous = engine.distances().to_vec();
    }
}

#[test]
fn test_capacity_bound_is_respected() {
    let model = cost_model(CORRIDOR_9X9, CostMode::Uniform);
    let mut engine = FrontierEngine::new(Box::new(CpuWavefrontDispatch::new()));
    engine.init(model.grid(), 10).unwrap();
    let capacity = model.as_grid().frontier_capacity();
    while engine.state() == EngineState::Expanding {
        engine.step(0).unwrap();
        assert!(engine.frontier().current_frontier_size() <= capacity);
    }
    assert_eq!(engine.state(), EngineState::Exhausted);
}

#[test]
fn test_restart_is_idempotent() {
    let mut run = controller(CORRIDOR_9X9);
    run_to_end(&mut run);
    let first_distances = run.distances().to_vec();
    let first_summary = run.summary();

    run.restart().unwrap();
    assert_eq!(run.phase(), RunPhase::Searching);
    assert!(run.path().is_empty());
    assert_eq!(run.engine().step_count(), 0);
    run_to_end(&mut run);

    assert_eq!(run.distances(), first_distances.as_slice());
    assert_eq!(run.summary(), first_summary);
}

#[test]
fn test_isolated_target_exhausts() {
    let art = "
        #######
        #..#..#
        #..#..#
        #######
    ";
    let mut run = controller(art);
    let target = run.target_index();
    let outcomes = run_to_end(&mut run);
    assert!(matches!(outcomes.last(), Some(TickOutcome::NoPathFound { .. })));
    assert_eq!(run.phase(), RunPhase::NoPath);
    assert_eq!(run.distances()[target], SENTINEL);
    assert!(!run.engine().frontier().found_flag());
    assert!(run.summary().target_distance.is_none());
}

#[test]
fn test_regenerate_replaces_the_maze() {
    let mut run = controller(BORDERED_5X5);
    run_to_end(&mut run);
    run.regenerate(5, MazeAlgorithm::DepthFirst).unwrap();
    assert_eq!(run.phase(), RunPhase::Searching);
    assert_eq!(run.config().algorithm, MazeAlgorithm::DepthFirst);
    assert_eq!(run.distances().iter().filter(|&&d| d != SENTINEL).count(), 1);
    assert!(run.path().is_empty());
}

#[test]
fn test_weighted_mode_still_terminates() {
    let raw = RawMaze::from_ascii(CORRIDOR_9X9).unwrap();
    let mut run = RunController::new(
        RunConfig::builder()
            .size(9)
            .cost_mode(CostMode::Weighted)
            .seed(5)
            .build(),
        Box::new(FixedMazeSource::new(raw)),
        Box::new(CpuWavefrontDispatch::new()),
    )
    .unwrap();

    loop {
        match run.tick_default() {
            Ok(TickOutcome::Idle) => break,
            Ok(_) if run.phase().is_terminal() => break,
            Ok(_) => {}
            Err(RunError::BacktrackStuck(_)) => break,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
    assert!(run.distances()[run.target_index()] > 0);
    assert!(matches!(run.phase(), RunPhase::PathComplete | RunPhase::Halted));
}

#[test]
fn test_engine_shares_the_cost_grid() {
    let model = cost_model(BORDERED_5X5, CostMode::Uniform);
    let mut engine = FrontierEngine::new(Box::new(CpuWavefrontDispatch::new()));
    engine.init(model.grid(), 6).unwrap();
    assert!(Arc::ptr_eq(engine.grid().unwrap(), &model.grid()));
}
