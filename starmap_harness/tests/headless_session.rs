//! End-to-end sessions: background load from disk, search, frame, click.

use std::io::Write;
use std::time::Duration;

use nalgebra::Point3;
use starmap::catalog::{CatalogSource, RetryPolicy};
use starmap::config::ViewerConfig;
use starmap::picking::{PickOutcome, SurfaceRect};
use starmap::LoadState;
use starmap_harness::HeadlessViewer;
use tempfile::NamedTempFile;
use test_helpers::synthetic_catalog_csv;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write catalog");
    file
}

fn config_for(file: &NamedTempFile) -> ViewerConfig {
    ViewerConfig {
        catalog: CatalogSource::Path(file.path().to_path_buf()),
        pick_threshold: 0.5,
        ..Default::default()
    }
}

const SMALL_CATALOG: &str = "\
id,x,y,z,ci,mag,proper,bayer,gl,con
0,0,0,0,0.65,-26.7,Sol,,,
1,-1.6,8.1,-2.5,0.0,-1.4,Sirius,Alp,Gl 244A,CMa
2,3.0,-7.6,0.6,0.0,0.0,Vega,Alp,Gl 721,Lyr
3,,1,1,,,Broken,,,
";

#[test]
fn test_load_search_and_pick() {
    init_logging();
    let file = catalog_file(SMALL_CATALOG);
    let config = config_for(&file);

    let mut viewer = HeadlessViewer::new(&config, SurfaceRect::sized(1000.0, 800.0), 50.0);
    viewer.start_load(&config);
    // Typed before the catalog arrives
    viewer.view_mut().set_query("si");
    assert_eq!(viewer.view().visible_len(), 0);

    assert_eq!(
        viewer.wait_for_load(Duration::from_secs(10)),
        &LoadState::Ready
    );
    assert_eq!(viewer.view().all_records().len(), 3);
    assert_eq!(viewer.view().visible_len(), 1);

    assert!(viewer.frame_visible());
    let sirius = Point3::new(-1.6, 8.1, -2.5);
    let (px, py) = viewer.screen_position(&sirius).unwrap();

    match viewer.click(px, py) {
        PickOutcome::Hit(hit) => assert_eq!(hit.index, 0),
        PickOutcome::Miss => panic!("expected to hit Sirius"),
    }
    let report = viewer.selection_report().unwrap();
    assert_eq!(report.name, "Sirius");
    assert!(report
        .fields
        .iter()
        .any(|(label, value)| label == "Constellation" && value == "CMa"));
}

#[test]
fn test_missing_catalog_fails_load() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = ViewerConfig {
        catalog: CatalogSource::Path(dir.path().join("absent.csv")),
        retry: RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut viewer = HeadlessViewer::new(&config, SurfaceRect::sized(640.0, 480.0), 10.0);
    viewer.start_load(&config);
    let state = viewer.wait_for_load(Duration::from_secs(10)).clone();
    assert!(matches!(state, LoadState::Failed(_)));
    assert!(viewer.view().point_cloud().is_none());
    assert_eq!(viewer.click(320.0, 240.0), PickOutcome::Miss);
}

#[test]
fn test_poll_until_ready() {
    init_logging();
    let file = catalog_file(&synthetic_catalog_csv(2_000, 5));
    let config = config_for(&file);

    let mut viewer = HeadlessViewer::new(&config, SurfaceRect::sized(640.0, 480.0), 10.0);
    viewer.start_load(&config);

    let mut applied = false;
    for _ in 0..1_000 {
        if viewer.poll_load() {
            applied = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(applied);
    assert_eq!(viewer.view().load_state(), &LoadState::Ready);
    assert!(viewer.view().visible_len() > 1_900);
    assert!(!viewer.poll_load());
}

#[test]
fn test_every_framed_star_is_clickable() {
    init_logging();
    let file = catalog_file(SMALL_CATALOG);
    let config = config_for(&file);

    let mut viewer = HeadlessViewer::new(&config, SurfaceRect::sized(1200.0, 900.0), 10.0);
    viewer.start_load(&config);
    viewer.wait_for_load(Duration::from_secs(10));
    assert!(viewer.frame_visible());

    let stars: Vec<_> = viewer.view().all_records().to_vec();
    for (index, star) in stars.iter().enumerate() {
        let [x, y, z] = star.position;
        let (px, py) = viewer.screen_position(&Point3::new(x, y, z)).unwrap();
        assert_eq!(viewer.click(px, py).index(), Some(index), "star {index}");
        assert_eq!(viewer.view().selected(), Some(star));
    }
}
