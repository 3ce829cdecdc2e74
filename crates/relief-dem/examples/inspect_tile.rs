//! Example: Print georeferencing and value range of a GeoTIFF tile.
//!
//! Usage: cargo run --example inspect_tile -- <path.tif> [lat lon]

use relief_dem::Raster;
use std::env;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path.tif> [lat lon]", args[0]);
        eprintln!("Example: {} downloads/USGS_1_n29w082.tif 28.5 -81.5", args[0]);
        std::process::exit(1);
    }

    let start = Instant::now();
    let raster = match Raster::from_file(&args[1]) {
        Ok(raster) => raster,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    println!("Loaded {} in {:.2}s", args[1], start.elapsed().as_secs_f64());

    let (width, height) = raster.dimensions();
    let bounds = raster.bounds();
    let (lon_m, lat_m) = raster.resolution_meters();
    println!("Size: {}x{}", width, height);
    println!(
        "Bounds: lat {:.4}° to {:.4}°, lon {:.4}° to {:.4}°",
        bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon
    );
    println!("Resolution: {:.2} x {:.2} m/pixel", lon_m, lat_m);
    println!("No-data: {:?}", raster.no_data_value());

    match raster.value_range() {
        Some((lo, hi)) => println!("Values: {:.2} to {:.2}", lo, hi),
        None => println!("Values: all no-data"),
    }

    if args.len() >= 4 {
        let (Ok(lat), Ok(lon)) = (args[2].parse::<f64>(), args[3].parse::<f64>()) else {
            eprintln!("Invalid coordinate");
            std::process::exit(1);
        };
        match raster.sample_nearest(lat, lon) {
            Some(v) => println!("Value at ({}, {}): {:.2}", lat, lon, v),
            None => println!("No value at ({}, {})", lat, lon),
        }
    }
}
