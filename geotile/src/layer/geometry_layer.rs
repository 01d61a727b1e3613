use std::collections::HashMap;
use std::sync::Arc;

use geotile_types::cartesian::{PixelPoint, Rect};
use geotile_types::geo::Projection;
use geotile_types::Geometry;
use parking_lot::RwLock;

use crate::error::GeotileError;
use crate::messenger::Messenger;
use crate::spatial_index::QuadTree;

/// Number of points a quadtree node of a layer holds before subdividing.
pub const DEFAULT_NODE_CAPACITY: usize = 16;

/// Identifier of a geometry in a [`GeometryLayer`].
///
/// Ids are never reused within one layer, so a stale id of a removed geometry never refers to a
/// different geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

impl GeometryId {
    /// Numeric value of the id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Layer of overlay geometries (points, lines and polygons) indexed by a quadtree.
///
/// The layer exclusively owns its geometries; the quadtree only stores [`GeometryId`] handles, one
/// per vertex. Adding and removing a geometry updates the geometry table and the index under one
/// write lock, so readers never see a handle without its geometry. Queries take a read lock and
/// can run concurrently.
///
/// ```
/// use std::sync::Arc;
/// use geotile::layer::GeometryLayer;
/// use geotile_types::cartesian::Rect;
/// use geotile_types::geo::SphericalMercator;
/// use geotile_types::{lonlat, Geometry};
///
/// let layer = GeometryLayer::new("cities", Arc::new(SphericalMercator::default()));
/// let id = layer.add(Geometry::Point(lonlat!(37.6, 55.75)))?;
///
/// assert_eq!(layer.query(&Rect::new(30.0, 50.0, 40.0, 60.0)), vec![id]);
/// # Ok::<(), geotile::error::GeotileError>(())
/// ```
pub struct GeometryLayer {
    name: String,
    projection: Arc<dyn Projection>,
    state: RwLock<LayerState>,
    messenger: Option<Arc<dyn Messenger>>,
}

struct LayerState {
    geometries: HashMap<GeometryId, Geometry, ahash::RandomState>,
    index: QuadTree<GeometryId>,
    next_id: u64,
}

impl std::fmt::Debug for GeometryLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryLayer")
            .field("name", &self.name)
            .field("projection", &self.projection)
            .field("len", &self.len())
            .finish()
    }
}

impl GeometryLayer {
    /// Creates an empty layer. The index covers the valid world area of the projection.
    pub fn new(name: impl Into<String>, projection: Arc<dyn Projection>) -> Self {
        Self::with_capacity(name, projection, DEFAULT_NODE_CAPACITY)
    }

    /// Creates an empty layer with the given quadtree node capacity.
    pub fn with_capacity(
        name: impl Into<String>,
        projection: Arc<dyn Projection>,
        node_capacity: usize,
    ) -> Self {
        let boundary = projection.world_bounds();
        Self {
            name: name.into(),
            projection,
            state: RwLock::new(LayerState {
                geometries: HashMap::default(),
                index: QuadTree::new(boundary, node_capacity),
                next_id: 0,
            }),
            messenger: None,
        }
    }

    /// Sets the messenger notified when the content of the layer changes.
    pub fn set_messenger(&mut self, messenger: impl Messenger + 'static) {
        self.messenger = Some(Arc::new(messenger));
    }

    /// Name of the layer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Projection used to convert pixel queries into world coordinates.
    pub fn projection(&self) -> &Arc<dyn Projection> {
        &self.projection
    }

    /// Adds the geometry to the layer and indexes all its vertices.
    ///
    /// If any vertex lies outside of the index bounds, nothing is added and
    /// [`GeotileError::OutOfBounds`] is returned.
    pub fn add(&self, geometry: Geometry) -> Result<GeometryId, GeotileError> {
        if geometry.vertices().is_empty() {
            return Err(GeotileError::Generic(
                "cannot add a geometry without vertices".into(),
            ));
        }

        let mut state = self.state.write();
        let id = GeometryId(state.next_id);

        for (inserted, vertex) in geometry.vertices().iter().enumerate() {
            if !state.index.insert(*vertex, id) {
                for rollback in &geometry.vertices()[..inserted] {
                    state.index.erase(rollback, id);
                }

                log::debug!(
                    "Geometry is not added to layer '{}': vertex {vertex:?} is outside of {:?}",
                    self.name,
                    state.index.boundary()
                );
                return Err(GeotileError::OutOfBounds {
                    lon: vertex.lon(),
                    lat: vertex.lat(),
                });
            }
        }

        state.next_id += 1;
        state.geometries.insert(id, geometry);
        drop(state);

        self.request_redraw();
        Ok(id)
    }

    /// Removes the geometry from the layer and the index. Returns the removed geometry.
    pub fn remove(&self, id: GeometryId) -> Option<Geometry> {
        let mut state = self.state.write();
        let geometry = state.geometries.remove(&id)?;
        for vertex in geometry.vertices() {
            if !state.index.erase(vertex, id) {
                log::error!(
                    "Vertex {vertex:?} of geometry {id:?} is missing from the index of layer '{}'",
                    self.name
                );
            }
        }
        drop(state);

        self.request_redraw();
        Some(geometry)
    }

    /// Returns a copy of the geometry with the given id.
    pub fn get(&self, id: GeometryId) -> Option<Geometry> {
        self.state.read().geometries.get(&id).cloned()
    }

    /// Ids of all geometries having at least one vertex inside the world rectangle.
    ///
    /// Every id is returned once, in ascending order.
    pub fn query(&self, range: &Rect) -> Vec<GeometryId> {
        let mut ids = self.state.read().index.query(range);
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Ids of all geometries having a vertex inside the pixel viewport at the given zoom.
    pub fn query_viewport(&self, viewport: &Rect, zoom: u8) -> Vec<GeometryId> {
        self.query(&self.projection.to_world_rect(viewport, zoom))
    }

    /// Ids of geometries drawn within `tolerance` pixels of the pixel point at the given zoom.
    ///
    /// Candidates are the geometries with a vertex within `search_radius` pixels of the point
    /// (found with the index); they are then checked exactly against the point.
    pub fn hit_test(
        &self,
        pixel: &PixelPoint,
        zoom: u8,
        tolerance: f64,
        search_radius: f64,
    ) -> Vec<GeometryId> {
        let search_radius = search_radius.max(tolerance);
        let area = Rect::new(pixel.x, pixel.y, pixel.x, pixel.y).expand(search_radius);
        let range = self.projection.to_world_rect(&area, zoom);

        let state = self.state.read();
        let mut candidates = state.index.query(&range);
        candidates.sort_unstable();
        candidates.dedup();

        candidates
            .into_iter()
            .filter(|id| {
                state.geometries.get(id).is_some_and(|geometry| {
                    geometry.hit_test(self.projection.as_ref(), zoom, pixel, tolerance)
                })
            })
            .collect()
    }

    /// Removes all geometries from the layer.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.geometries.clear();
        state.index.clear();
        drop(state);

        self.request_redraw();
    }

    /// Number of geometries in the layer.
    pub fn len(&self) -> usize {
        self.state.read().geometries.len()
    }

    /// Returns true if the layer has no geometries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn request_redraw(&self) {
        if let Some(messenger) = &self.messenger {
            messenger.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use geotile_types::geo::{Equirectangular, SphericalMercator};
    use geotile_types::lonlat;

    use super::*;

    fn layer() -> GeometryLayer {
        // One pixel per degree at zoom 0.
        GeometryLayer::with_capacity("test", Arc::new(Equirectangular::new(180)), 2)
    }

    #[derive(Clone, Default)]
    struct CountingMessenger(Arc<AtomicUsize>);

    impl Messenger for CountingMessenger {
        fn request_redraw(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn line_is_returned_once() {
        let layer = layer();
        let line = layer
            .add(Geometry::LineString(vec![
                lonlat!(0.0, 0.0),
                lonlat!(1.0, 1.0),
                lonlat!(2.0, 2.0),
            ]))
            .expect("inside bounds");

        assert_eq!(layer.query(&Rect::new(-5.0, -5.0, 5.0, 5.0)), vec![line]);
        assert_eq!(layer.query(&Rect::new(1.5, 1.5, 5.0, 5.0)), vec![line]);
        assert!(layer.query(&Rect::new(3.0, 3.0, 5.0, 5.0)).is_empty());
    }

    #[test]
    fn out_of_bounds_geometry_is_rolled_back() {
        let layer = GeometryLayer::new("mercator", Arc::new(SphericalMercator::default()));
        let result = layer.add(Geometry::LineString(vec![
            lonlat!(0.0, 0.0),
            lonlat!(10.0, 10.0),
            lonlat!(20.0, 89.0),
        ]));

        assert_matches!(result, Err(GeotileError::OutOfBounds { .. }));
        assert!(layer.is_empty());
        assert!(layer.query(&Rect::new(-180.0, -85.0, 180.0, 85.0)).is_empty());
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let layer = layer();
        assert!(layer.add(Geometry::Polygon(vec![])).is_err());
    }

    #[test]
    fn remove_clears_index() {
        let layer = layer();
        let a = layer.add(Geometry::Point(lonlat!(10.0, 10.0))).expect("inside");
        let b = layer.add(Geometry::Point(lonlat!(11.0, 11.0))).expect("inside");

        assert_eq!(
            layer.remove(a),
            Some(Geometry::Point(lonlat!(10.0, 10.0)))
        );
        assert_eq!(layer.remove(a), None);
        assert_eq!(layer.get(a), None);
        assert_eq!(layer.query(&Rect::new(0.0, 0.0, 20.0, 20.0)), vec![b]);
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn ids_are_not_reused() {
        let layer = layer();
        let a = layer.add(Geometry::Point(lonlat!(1.0, 1.0))).expect("inside");
        layer.remove(a);
        let b = layer.add(Geometry::Point(lonlat!(1.0, 1.0))).expect("inside");
        assert_ne!(a, b);
    }

    #[test]
    fn viewport_query_uses_projection() {
        let layer = layer();
        let inside = layer.add(Geometry::Point(lonlat!(10.0, 10.0))).expect("inside");
        let _outside = layer.add(Geometry::Point(lonlat!(-100.0, -10.0))).expect("inside");

        // lon 0..20, lat 0..20 at zoom 0 in a 360x180 pixel world.
        let viewport = Rect::new(180.0, 70.0, 200.0, 90.0);
        assert_eq!(layer.query_viewport(&viewport, 0), vec![inside]);
    }

    #[test]
    fn hit_test_refines_candidates() {
        let layer = layer();
        let point = layer.add(Geometry::Point(lonlat!(0.0, 0.0))).expect("inside");
        let line = layer
            .add(Geometry::LineString(vec![lonlat!(-3.0, 5.0), lonlat!(3.0, 5.0)]))
            .expect("inside");

        let click = PixelPoint::new(180.5, 90.0);
        assert_eq!(layer.hit_test(&click, 0, 1.0, 10.0), vec![point]);

        let click = PixelPoint::new(180.0, 85.0);
        assert_eq!(layer.hit_test(&click, 0, 1.0, 10.0), vec![line]);

        // The line vertices are further away than the search radius.
        assert!(layer.hit_test(&click, 0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn lines_sharing_one_vertex() {
        let layer = GeometryLayer::new("routes", Arc::new(SphericalMercator::default()));
        let hub = lonlat!(37.62, 55.75);
        let zoom = 12;

        let ids: Vec<_> = (0..2_000)
            .map(|i| {
                let end = lonlat!(37.0 + (i % 100) as f64 * 0.01, 55.0 + (i / 100) as f64 * 0.01);
                layer
                    .add(Geometry::LineString(vec![hub, end, hub]))
                    .expect("inside")
            })
            .collect();

        let pixel = layer.projection().to_pixel(&hub, zoom);
        let restored = layer.projection().to_world(&pixel, zoom);
        assert_abs_diff_eq!(restored, hub, epsilon = 1e-9);

        assert_eq!(layer.hit_test(&pixel, zoom, 1.0, 4.0), ids);

        let viewport = Rect::new(pixel.x - 1.0, pixel.y - 1.0, pixel.x + 1.0, pixel.y + 1.0);
        assert_eq!(layer.query_viewport(&viewport, zoom), ids);

        for id in &ids {
            assert!(layer.remove(*id).is_some());
        }
        assert!(layer.query_viewport(&viewport, zoom).is_empty());
    }

    #[test]
    fn clear_removes_everything() {
        let layer = layer();
        for i in 0..50 {
            layer
                .add(Geometry::Point(lonlat!(i as f64, i as f64 / 2.0)))
                .expect("inside");
        }

        layer.clear();
        assert!(layer.is_empty());
        assert!(layer.query(&Rect::new(-180.0, -90.0, 180.0, 90.0)).is_empty());
    }

    #[test]
    fn changes_request_redraw() {
        let messenger = CountingMessenger::default();
        let mut layer = layer();
        layer.set_messenger(messenger.clone());

        let id = layer.add(Geometry::Point(lonlat!(1.0, 1.0))).expect("inside");
        layer.remove(id);
        layer.clear();

        assert_eq!(messenger.0.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let layer = Arc::new(layer());
        let writer = {
            let layer = layer.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let lon = (i % 360) as f64 - 179.0;
                    layer
                        .add(Geometry::Point(lonlat!(lon, 0.0)))
                        .expect("inside");
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let layer = layer.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        for id in layer.query(&Rect::new(-180.0, -1.0, 180.0, 1.0)) {
                            assert!(layer.get(id).is_some());
                        }
                    }
                })
            })
            .collect();

        writer.join().expect("writer panicked");
        for reader in readers {
            reader.join().expect("reader panicked");
        }

        assert_eq!(layer.len(), 500);
    }
}
