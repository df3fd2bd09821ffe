use crate::error::AppError;
use colored::{Color, Colorize};
use std::io::{self, Write};
use wfp_core::{DisplayMirror, SENTINEL, WALL};

/// Trait for types that can present the published state of a run.
pub trait Visualizer {
    /// Displays or updates the visualization from the latest publish.
    fn display_state(&mut self, mirror: &DisplayMirror) -> Result<(), AppError>;
}

/// Largest number of columns rendered before cells are grouped into blocks.
pub const DEFAULT_MAX_COLUMNS: usize = 128;

const RAMP: [Color; 5] = [
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Red,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glyph {
    Wall,
    Unvisited,
    Reached(i32),
    Path,
}

/// Classifies a `block` x `block` group of cells; path beats distance beats wall.
fn block_glyph(mirror: &DisplayMirror, bx: usize, by: usize, block: usize) -> Glyph {
    let width = mirror.width();
    let mut glyph = Glyph::Wall;
    for y in by * block..((by + 1) * block).min(mirror.height()) {
        for x in bx * block..((bx + 1) * block).min(width) {
            let i = y * width + x;
            if mirror.path_marks().get(i).is_some_and(|&m| m != 0) {
                return Glyph::Path;
            }
            let distance = mirror.distances().get(i).copied().unwrap_or(SENTINEL);
            glyph = match (glyph, distance) {
                (Glyph::Reached(d), n) if n != SENTINEL => Glyph::Reached(d.min(n)),
                (_, n) if n != SENTINEL => Glyph::Reached(n),
                (Glyph::Wall, _) if mirror.costs().get(i).copied() != Some(WALL) => {
                    Glyph::Unvisited
                }
                (g, _) => g,
            };
        }
    }
    glyph
}

fn ramp_color(distance: i32, max_distance: i32) -> Color {
    if max_distance <= 0 {
        return RAMP[0];
    }
    let bucket = (distance.max(0) as usize * RAMP.len()) / (max_distance as usize + 1);
    RAMP[bucket.min(RAMP.len() - 1)]
}

/// Renders the mirror as text, one line per row of blocks.
///
/// Grids wider than `max_columns` are grouped into square blocks so that the output
/// fits; colors follow the `colored` override and `NO_COLOR` settings.
pub fn render_frame(mirror: &DisplayMirror, max_columns: usize) -> String {
    let width = mirror.width();
    let height = mirror.height();
    if width == 0 || height == 0 {
        return String::new();
    }
    let block = width.div_ceil(max_columns.max(1));
    let columns = width.div_ceil(block);
    let rows = height.div_ceil(block);

    let mut frame = String::with_capacity((columns + 1) * rows);
    for by in 0..rows {
        for bx in 0..columns {
            let cell = match block_glyph(mirror, bx, by, block) {
                Glyph::Wall => "#".bright_black(),
                Glyph::Unvisited => " ".normal(),
                Glyph::Reached(d) => ".".color(ramp_color(d, mirror.max_distance())),
                Glyph::Path => "*".bright_white().bold(),
            };
            frame.push_str(&cell.to_string());
        }
        frame.push('\n');
    }
    frame
}

/// Writes each frame, with a header, to a terminal or any other writer.
pub struct TerminalVisualizer<W: Write = io::Stdout> {
    out: W,
    max_columns: usize,
}

impl TerminalVisualizer {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), DEFAULT_MAX_COLUMNS)
    }
}

impl<W: Write> TerminalVisualizer<W> {
    pub fn new(out: W, max_columns: usize) -> Self {
        Self { out, max_columns }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Visualizer for TerminalVisualizer<W> {
    fn display_state(&mut self, mirror: &DisplayMirror) -> Result<(), AppError> {
        let frame = render_frame(mirror, self.max_columns);
        let result = writeln!(
            self.out,
            "--- Frame {} ({}x{}, max distance {}) ---",
            mirror.revision(),
            mirror.width(),
            mirror.height(),
            mirror.max_distance()
        )
        .and_then(|()| self.out.write_all(frame.as_bytes()))
        .and_then(|()| self.out.flush());
        result.map_err(|e| AppError::Visualization(format!("Failed to write frame: {e}")))
    }
}
