use radcube_lib::{CubeFile, CubeSink, CubeStream};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::cli::ProcessArgs;

/// Process a capture file until it is exhausted or CTRL+C is pressed.
///
/// Returns whether every requested frame was processed.
pub fn run_process(args: ProcessArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let ProcessArgs {
        bin_in,
        frames,
        skip,
        out,
        format,
        print,
        geometry,
    } = args;
    let geometry = geometry.geometry()?;
    log::debug!("Frame geometry: {:?}", geometry);

    // Set up the `running` flag for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);

    // Set up CTRL+C handler for graceful shutdown
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut stream = CubeStream::from_file(&bin_in, geometry)?;
    if skip > 0 {
        stream.skip_frames(skip)?;
    }
    if let Some(count) = frames {
        stream.limit_frames(count);
    }

    if let Some(out_path) = out {
        stream.subscribe(CubeSink::File(CubeFile {
            file_path: out_path,
            file_type: format,
        }));
    }

    stream.start(print);

    // Wait for the stream to run dry or for CTRL+C
    while running.load(Ordering::SeqCst) && !stream.is_finished() {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    if !running.load(Ordering::SeqCst) {
        println!("Shutting down gracefully...");
    }
    let summary = stream.stop().unwrap_or_default();
    log::info!(
        "Processed {} frames ({} failed)",
        summary.processed,
        summary.failed
    );

    Ok(summary.exhausted && summary.failed == 0)
}
