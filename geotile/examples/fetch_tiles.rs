//! Loads the tiles covering a 1024x768 viewport from OpenStreetMap, together with the ring of
//! tiles around it, and hit-tests a few overlay points.
//!
//! Run with `RUST_LOG=debug cargo run --example fetch_tiles -- [zoom]`.

use std::sync::Arc;
use std::time::Duration;

use geotile::layer::GeometryLayer;
use geotile::tile::TileSource;
use geotile::tile_cache::{TileCacheBuilder, TileEvent};
use geotile_types::cartesian::{PixelPoint, Rect};
use geotile_types::geo::{Projection, SphericalMercator};
use geotile_types::{lonlat, Geometry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let zoom: u8 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 3,
    };

    let projection = Arc::new(SphericalMercator::new(256));
    let source = TileSource::new(
        "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        projection.clone(),
    );

    let cache = TileCacheBuilder::new()
        .with_file_cache("target/tile_cache", Duration::from_secs(7 * 24 * 3600))
        .with_request_timeout(Duration::from_secs(10))
        .build()?;
    let mut events = cache.subscribe();

    let center = projection.to_pixel(&lonlat!(37.62, 55.75), zoom);
    let viewport = Rect::new(
        center.x - 512.0,
        center.y - 384.0,
        center.x + 512.0,
        center.y + 384.0,
    );

    let visible = source.visible_tiles(&viewport, zoom);
    let ready = visible
        .iter()
        .filter(|key| !cache.get_image(key).is_placeholder())
        .count();
    for key in source.prefetch_ring(&viewport, zoom) {
        cache.prefetch_image(&key);
    }

    println!(
        "{} visible tiles, {ready} cached, {} downloads started",
        visible.len(),
        cache.load_queue_size()
    );

    if cache.load_queue_size() > 0 {
        while let Some(event) = events.recv().await {
            match event {
                TileEvent::ImageUpdated(key) => println!("Loaded {key}"),
                TileEvent::QueueSizeChanged(size) => log::debug!("{size} downloads in flight"),
                TileEvent::AllFinished => break,
            }
        }
    }

    let layer = GeometryLayer::new("cities", projection.clone());
    let moscow = layer.add(Geometry::Point(lonlat!(37.62, 55.75)))?;
    layer.add(Geometry::Point(lonlat!(30.31, 59.94)))?;
    layer.add(Geometry::LineString(vec![
        lonlat!(37.62, 55.75),
        lonlat!(30.31, 59.94),
    ]))?;

    println!(
        "{} of {} geometries in the viewport",
        layer.query_viewport(&viewport, zoom).len(),
        layer.len()
    );

    let hits = layer.hit_test(&PixelPoint::new(center.x, center.y), zoom, 4.0, 16.0);
    println!("Hit at the viewport center: {hits:?} (expected {moscow:?} among them)");

    Ok(())
}
