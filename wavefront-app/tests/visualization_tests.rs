use wavefront_app::visualization::{render_frame, TerminalVisualizer, Visualizer};
use wfp_core::{CpuWavefrontDispatch, DisplayMirror, FixedMazeSource, RawMaze, RunConfig, RunController};

fn controller() -> RunController {
    let raw = RawMaze::from_ascii("#####\n#...#\n#...#\n#...#\n#####").expect("fixture");
    RunController::new(
        RunConfig::builder().size(5).seed(1).build(),
        Box::new(FixedMazeSource::new(raw)),
        Box::new(CpuWavefrontDispatch::new()),
    )
    .expect("controller")
}

fn plain() {
    colored::control::set_override(false);
}

#[test]
fn test_empty_mirror_renders_nothing() {
    plain();
    assert_eq!(render_frame(&DisplayMirror::new(), 80), "");
}

#[test]
fn test_frame_before_first_tick_shows_only_start() {
    plain();
    let run = controller();
    let mut mirror = DisplayMirror::new();
    run.publish(&mut mirror);
    assert_eq!(
        render_frame(&mirror, 80),
        "#####\n#.  #\n#   #\n#   #\n#####\n"
    );
}

#[test]
fn test_completed_run_marks_path() {
    plain();
    let mut run = controller();
    while !run.phase().is_terminal() {
        run.tick_default().expect("tick");
    }
    let mut mirror = DisplayMirror::new();
    run.publish(&mut mirror);
    assert_eq!(
        render_frame(&mirror, 80),
        "#####\n#*..#\n#*..#\n#***#\n#####\n"
    );
}

#[test]
fn test_wide_grids_are_grouped_into_blocks() {
    plain();
    let mut run = controller();
    while !run.phase().is_terminal() {
        run.tick_default().expect("tick");
    }
    let mut mirror = DisplayMirror::new();
    run.publish(&mut mirror);
    // Blocks of 3x3; any path cell wins its block.
    assert_eq!(render_frame(&mirror, 2), "*.\n**\n");
}

#[test]
fn test_terminal_visualizer_writes_header_and_frame() {
    plain();
    let run = controller();
    let mut mirror = DisplayMirror::new();
    run.publish(&mut mirror);

    let mut visualizer = TerminalVisualizer::new(Vec::new(), 80);
    visualizer.display_state(&mirror).expect("display");
    let text = String::from_utf8(visualizer.into_inner()).expect("utf8");
    assert!(text.starts_with("--- Frame 1 (5x5, max distance 0) ---\n"));
    assert!(text.ends_with("#####\n"));
}
