// Main entry point that forwards to the wavefront-app binary
fn main() {
    // Exit with the same code as the app
    std::process::exit(match wavefront_app::run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    });
}
