use radcube_lib::{FileLayout, RadarProfile};

use crate::cli::InspectArgs;

pub fn run_inspect(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let geometry = args.geometry.geometry()?;
    let layout = FileLayout::of_file(&args.bin_in, &geometry)?;
    let profile = RadarProfile::default().with_geometry(&geometry);

    println!("Capture {}", args.bin_in.display());
    println!(" - frame size: {} bytes", geometry.frame_bytes());
    println!(
        " - cube shape: [{}, {}, {}, {}]",
        geometry.tx_channels, geometry.rx_channels, geometry.chirp_loops, geometry.samples_per_chirp
    );
    println!(" - full frames: {}", layout.frames);
    if layout.trailing_bytes > 0 {
        log::warn!(
            "Capture ends with {} bytes of a partial frame",
            layout.trailing_bytes
        );
    }
    println!(" - range resolution: {:.4} m", profile.range_resolution_m());
    println!(" - max range: {:.2} m", profile.max_range_m());
    println!(
        " - doppler resolution: {:.4} m/s",
        profile.doppler_resolution_mps()
    );
    println!(" - max doppler: {:.2} m/s", profile.max_doppler_mps());

    Ok(())
}
