use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use wfp_core::{GenerationError, MazeAlgorithm, MazeSource, RawMaze, RAW_OPEN, RAW_WALL};

/// Reads a flat square bitmap and checks its shape.
///
/// With `size = None` the side length is inferred from the file length, which must
/// then be a perfect square.
///
/// # Errors
///
/// * [`GenerationError::MissingArtifact`] when the file does not exist.
/// * [`GenerationError::Empty`], [`GenerationError::SizeMismatch`] or
///   [`GenerationError::InvalidCell`] when its content is unusable.
pub fn load_bitmap(path: &Path, size: Option<usize>) -> Result<RawMaze, GenerationError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(GenerationError::MissingArtifact(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    debug!("Read {} bytes from {:?}", bytes.len(), path);
    parse_bitmap(bytes, size)
}

/// Validates raw artifact bytes as a square bitmap.
pub fn parse_bitmap(bytes: Vec<u8>, size: Option<usize>) -> Result<RawMaze, GenerationError> {
    if bytes.is_empty() {
        return Err(GenerationError::Empty);
    }
    let size = size.unwrap_or_else(|| square_side(bytes.len()));
    if bytes.len() != size * size {
        return Err(GenerationError::SizeMismatch {
            expected: size * size,
            actual: bytes.len(),
        });
    }
    if let Some((index, &value)) = bytes
        .iter()
        .enumerate()
        .find(|&(_, &b)| b != RAW_OPEN && b != RAW_WALL)
    {
        return Err(GenerationError::InvalidCell { index, value });
    }
    Ok(RawMaze::square(size, bytes))
}

/// Writes `maze` in the flat artifact format.
pub fn save_bitmap(path: &Path, maze: &RawMaze) -> Result<(), GenerationError> {
    fs::write(path, &maze.cells)?;
    info!(
        "Saved {}x{} maze bitmap to {:?}",
        maze.width, maze.height, path
    );
    Ok(())
}

fn square_side(len: usize) -> usize {
    let mut side = (len as f64).sqrt() as usize;
    while side * side > len {
        side -= 1;
    }
    while (side + 1) * (side + 1) <= len {
        side += 1;
    }
    side
}

/// Serves a bitmap file for every request.
///
/// The file is re-read on each `generate`, so it can be replaced between runs.
#[derive(Debug, Clone)]
pub struct BitmapSource {
    path: PathBuf,
}

impl BitmapSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MazeSource for BitmapSource {
    fn generate(
        &mut self,
        _size: usize,
        _algorithm: MazeAlgorithm,
    ) -> Result<RawMaze, GenerationError> {
        load_bitmap(&self.path, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_infers_square_side() {
        let raw = parse_bitmap(vec![0; 49], None).unwrap();
        assert_eq!((raw.width, raw.height), (7, 7));
    }

    #[test]
    fn test_parse_rejects_bad_content() {
        assert!(matches!(parse_bitmap(vec![], None), Err(GenerationError::Empty)));
        assert!(matches!(
            parse_bitmap(vec![0; 10], None),
            Err(GenerationError::SizeMismatch {
                expected: 9,
                actual: 10
            })
        ));
        assert!(matches!(
            parse_bitmap(vec![0, 1, 1, 7], Some(2)),
            Err(GenerationError::InvalidCell { index: 3, value: 7 })
        ));
    }

    #[test]
    fn test_square_side() {
        assert_eq!(square_side(1), 1);
        assert_eq!(square_side(255 * 255), 255);
        assert_eq!(square_side(26), 5);
    }
}
