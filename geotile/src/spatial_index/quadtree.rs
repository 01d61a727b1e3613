use geotile_types::cartesian::Rect;
use geotile_types::geo::WorldCoordinate;

/// Depth at which nodes stop subdividing.
///
/// At this depth a world-sized root is split into quadrants of about a centimeter, so only points
/// sharing (almost) the same coordinate end up in an overfull node.
pub const MAX_DEPTH: usize = 32;

/// Region quadtree mapping world coordinates to caller-owned handles.
///
/// Every node covers a rectangular boundary and holds up to `capacity` points. When a node receives
/// one more point, it subdivides into four children quadrisecting its boundary and the new point
/// goes into the child containing it. Points the node already holds are not moved into the
/// children, so they stay reachable from the node itself.
///
/// Nodes at [`MAX_DEPTH`] never subdivide and take every point they receive, over capacity if
/// needed, so any number of copies of one coordinate can be stored.
///
/// The tree never owns the geometry a handle refers to. A handle inserted several times (e.g. once
/// per vertex of a line) is returned by [`QuadTree::query`] once for every matching insertion.
///
/// The tree is not synchronized; the owner is expected to guard it with one lock for the whole
/// tree (see [`GeometryLayer`](crate::layer::GeometryLayer)).
#[derive(Debug, Clone)]
pub struct QuadTree<H> {
    root: Node<H>,
    capacity: usize,
}

#[derive(Debug, Clone)]
struct Node<H> {
    boundary: Rect,
    points: Vec<(WorldCoordinate, H)>,
    children: Option<Box<[Node<H>; 4]>>,
}

impl<H: Copy + PartialEq> QuadTree<H> {
    /// Creates an empty tree covering `boundary`, with nodes holding up to `capacity` points
    /// before subdividing.
    ///
    /// A capacity of `0` is treated as `1`.
    pub fn new(boundary: Rect, capacity: usize) -> Self {
        Self {
            root: Node::new(boundary),
            capacity: capacity.max(1),
        }
    }

    /// Area covered by the tree.
    pub fn boundary(&self) -> Rect {
        self.root.boundary
    }

    /// Maximum number of points held by a node before it subdivides.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts the handle at the given point.
    ///
    /// Returns `false` if the point lies outside of the tree boundary.
    pub fn insert(&mut self, point: WorldCoordinate, handle: H) -> bool {
        self.root.insert(point, handle, self.capacity, 1)
    }

    /// Returns every handle whose insertion point lies inside `range` (borders included).
    ///
    /// Only the subtrees whose boundary intersects `range` are visited.
    pub fn query(&self, range: &Rect) -> Vec<H> {
        let mut result = vec![];
        self.root.query(range, &mut result);
        result
    }

    /// Removes one `(point, handle)` pair from the tree.
    ///
    /// Returns `false` if the pair is not in the tree.
    pub fn erase(&mut self, point: &WorldCoordinate, handle: H) -> bool {
        self.root.erase(point, handle)
    }

    /// Removes all points and subdivisions. The boundary and capacity are retained.
    pub fn clear(&mut self) {
        self.root.points.clear();
        self.root.children = None;
    }

    /// Total number of stored `(point, handle)` pairs.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Returns true if the tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Depth of the deepest node, `1` for a tree without subdivisions.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

impl<H: Copy + PartialEq> Node<H> {
    fn new(boundary: Rect) -> Self {
        Self {
            boundary,
            points: vec![],
            children: None,
        }
    }

    fn insert(&mut self, point: WorldCoordinate, handle: H, capacity: usize, depth: usize) -> bool {
        if !self.boundary.contains(&point) {
            return false;
        }

        if self.points.len() < capacity || depth >= MAX_DEPTH {
            self.points.push((point, handle));
            return true;
        }

        let boundary = self.boundary;
        let children = self.children.get_or_insert_with(|| {
            let [ne, nw, se, sw] = boundary.quadrants();
            Box::new([Node::new(ne), Node::new(nw), Node::new(se), Node::new(sw)])
        });

        for child in children.iter_mut() {
            if child.insert(point, handle, capacity, depth + 1) {
                return true;
            }
        }

        // Children quadrisect the boundary that contains the point, so one of them must accept it.
        log::error!(
            "Quadtree node {:?} contains point ({}, {}) but none of its children accepted it",
            boundary,
            point.lon(),
            point.lat()
        );
        false
    }

    fn query(&self, range: &Rect, result: &mut Vec<H>) {
        if !self.boundary.intersects(range) {
            return;
        }

        result.extend(
            self.points
                .iter()
                .filter(|(point, _)| range.contains(point))
                .map(|(_, handle)| *handle),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(range, result);
            }
        }
    }

    fn erase(&mut self, point: &WorldCoordinate, handle: H) -> bool {
        if !self.boundary.contains(point) {
            return false;
        }

        if let Some(position) = self
            .points
            .iter()
            .position(|(p, h)| p == point && *h == handle)
        {
            self.points.swap_remove(position);
            return true;
        }

        match &mut self.children {
            Some(children) => children.iter_mut().any(|child| child.erase(point, handle)),
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.points.len()
            + self
                .children
                .as_ref()
                .map(|children| children.iter().map(Node::len).sum::<usize>())
                .unwrap_or(0)
    }

    fn depth(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map(|children| children.iter().map(Node::depth).max().unwrap_or(0))
            .unwrap_or(0)
    }
}
