//! Interactive 3D star map core.
//!
//! Turns a tabular star catalog into render-ready point cloud buffers, keeps
//! them in sync with a live name search, and resolves pointer clicks to
//! stars. Rendering, windowing and the detail UI live in the host; this
//! crate only needs a [`picking::RayCaster`] from the renderer.
//!
//! ```text
//! catalog text ─▶ catalog::parse_catalog_text ─▶ catalog::normalize_rows
//!                                                    │
//!                         query ─▶ filter::QueryFilter ◀┘
//!                                          │
//!                                          ▼
//!                             point_set::PointCloud ─▶ renderer
//!                                          │
//!        pointer ─▶ picking::PickingEngine ◀┘ ─▶ view_state::ViewState::selected
//! ```
//!
//! # Example
//!
//! ```rust
//! use starmap::camera::PerspectiveCamera;
//! use starmap::catalog::{parse_catalog_text, Catalog};
//! use starmap::config::ViewerConfig;
//! use starmap::picking::{PointerEvent, SurfaceRect};
//! use starmap::view_state::ViewState;
//! use nalgebra::Point3;
//!
//! let rows = parse_catalog_text("x,y,z,ci,proper\n0,0,0,0.65,Sol\n5,0,0,1.5,Far\n").unwrap();
//! let (catalog, _report) = Catalog::from_rows(&rows);
//!
//! let mut view = ViewState::new(&ViewerConfig::default());
//! view.finish_load(catalog);
//! view.set_query("so");
//! assert_eq!(view.visible_len(), 1);
//!
//! let surface = SurfaceRect::sized(800.0, 600.0);
//! let camera = PerspectiveCamera::look_at(
//!     Point3::new(0.0, 0.0, 20.0),
//!     Point3::origin(),
//!     60.0,
//!     surface.aspect(),
//! );
//! let outcome = view.pick(&PointerEvent::new(400.0, 300.0), &surface, &camera);
//! assert_eq!(outcome.index(), Some(0));
//! assert_eq!(view.selected().unwrap().display_name(), "Sol");
//! ```

pub mod camera;
pub mod catalog;
pub mod color;
pub mod config;
pub mod error;
pub mod filter;
pub mod picking;
pub mod point_set;
pub mod view_state;

pub use catalog::{Catalog, StarRecord};
pub use error::{Result, StarmapError};
pub use point_set::PointCloud;
pub use view_state::{LoadState, ViewState};
