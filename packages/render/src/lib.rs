#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Presentation layer of the pricing dashboard.
//!
//! Turns a [`pricing_map_dataset::FilteredView`] into what the browser
//! shows: the choropleth scene and its legend, SVG charts, the data table
//! and the full HTML page. Nothing here touches the filesystem or the
//! network; every function is pure over its inputs.

pub mod charts;
pub mod color;
pub mod format;
pub mod intro;
pub mod map;
pub mod page;
pub mod table;

pub use map::MapScene;
pub use page::{Tab, render_page};
pub use table::Table;
