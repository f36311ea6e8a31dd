use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use starmap::catalog::CatalogSource;
use starmap::config::ViewerConfig;
use starmap::picking::{PickOutcome, SurfaceRect};
use starmap::LoadState;
use starmap_harness::HeadlessViewer;

/// Command line arguments for the star probe
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Load a star catalog headlessly, filter it and pick a star",
    long_about = "Loads a star catalog the same way the interactive viewer does, applies \
        an optional name search, frames the remaining stars and simulates a click.\n\n\
        Useful for:\n  \
        - Checking that a catalog file or URL parses and how many rows are rejected\n  \
        - Inspecting which stars a search query keeps\n  \
        - Reproducing a pick at specific pixel coordinates"
)]
struct Args {
    #[arg(
        short,
        long,
        help = "Catalog file path or http(s) URL",
        long_help = "Catalog to load. Values starting with http:// or https:// are fetched \
            with retries; anything else is read from disk. Gzip-compressed catalogs are \
            detected automatically. Overrides the catalog in the config file."
    )]
    catalog: Option<CatalogSource>,

    #[arg(
        long,
        help = "Viewer config file (JSON)",
        long_help = "Path to a viewer config file. Defaults to ~/.starmap/viewer.json; a \
            missing file means built-in defaults."
    )]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "", help = "Name search query")]
    query: String,

    #[arg(
        short,
        long,
        value_parser = parse_pixel,
        help = "Click position as X,Y in pixels",
        long_help = "Pixel coordinates of a simulated click, relative to the top-left of \
            the surface. Defaults to the surface center."
    )]
    pick: Option<(f64, f64)>,

    #[arg(long, default_value_t = 1280.0, help = "Surface width in pixels")]
    width: f64,

    #[arg(long, default_value_t = 720.0, help = "Surface height in pixels")]
    height: f64,

    #[arg(
        long,
        help = "Camera distance from the origin",
        long_help = "Place the camera this far along +z looking at the origin instead of \
            framing the visible stars."
    )]
    camera_distance: Option<f64>,

    #[arg(long, help = "Pick threshold in world units")]
    threshold: Option<f32>,

    #[arg(long, default_value_t = 120, help = "Seconds to wait for the catalog")]
    timeout: u64,

    #[arg(long, help = "Print the selection as JSON")]
    json: bool,

    #[arg(long, default_value_t = 10, help = "Visible stars to list")]
    list: usize,
}

fn parse_pixel(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad X: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad Y: {e}"))?;
    Ok((x, y))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => ViewerConfig::default_path()?,
    };
    let mut config = ViewerConfig::load_or_default(&config_path)?;
    if let Some(catalog) = args.catalog {
        config.catalog = catalog;
    }
    if let Some(threshold) = args.threshold {
        config.pick_threshold = threshold;
    }
    config.validate()?;

    println!("Star Probe");
    println!("==========");
    println!("Catalog: {}", config.catalog);
    println!("Pick threshold: {}", config.pick_threshold);

    let surface = SurfaceRect::sized(args.width, args.height);
    let mut viewer = HeadlessViewer::new(&config, surface, args.camera_distance.unwrap_or(100.0));
    viewer.start_load(&config);
    viewer.view_mut().set_query(&args.query);

    match viewer.wait_for_load(Duration::from_secs(args.timeout)) {
        LoadState::Ready => {}
        LoadState::Loading => return Err("timed out waiting for the catalog".into()),
        LoadState::Failed(message) => return Err(message.clone().into()),
    }

    let view = viewer.view();
    println!(
        "Stars: {} loaded, {} visible for query '{}'",
        view.all_records().len(),
        view.visible_len(),
        view.query()
    );
    for star in view.filtered_records().into_iter().take(args.list) {
        let [x, y, z] = star.position;
        println!("  {:<24} ({x:>10.3}, {y:>10.3}, {z:>10.3})", star.display_name());
    }

    if args.camera_distance.is_none() {
        viewer.frame_visible();
    }
    let camera = viewer.camera();
    println!(
        "Camera: ({:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2})",
        camera.position.x,
        camera.position.y,
        camera.position.z,
        camera.target.x,
        camera.target.y,
        camera.target.z
    );

    let (px, py) = args
        .pick
        .unwrap_or((args.width / 2.0, args.height / 2.0));
    match viewer.click(px, py) {
        PickOutcome::Hit(hit) => {
            println!(
                "Hit visible star {} at {:.3} units ({:.3} from ray)",
                hit.index, hit.distance, hit.distance_to_ray
            );
        }
        PickOutcome::Miss => println!("No star under ({px}, {py})"),
    }

    if let Some(report) = viewer.selection_report() {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!();
            println!("{}", report.name);
            for (label, value) in &report.fields {
                println!("  {label:<16} {value}");
            }
        }
    }

    Ok(())
}
