//! # Wavefront (Binary)
//!
//! Main executable entry point.

fn main() -> anyhow::Result<()> {
    wavefront_app::run()
}
