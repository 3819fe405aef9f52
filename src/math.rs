//! Geometric primitives used by the navigation math
//!
//! Planes follow the `normal · p + constant = 0` convention, so a horizontal
//! plane at height `h` has normal +Y and constant `-h`.

use glam::Vec3;

/// World up axis. Navigation assumes a single fixed up convention.
pub const UP: Vec3 = Vec3::Y;

/// An infinite plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    pub fn new(normal: Vec3, constant: f32) -> Self {
        Self { normal, constant }
    }

    /// Horizontal plane through the given height
    pub fn horizontal(height: f32) -> Self {
        Self::new(UP, -height)
    }

    /// Signed distance from the plane, positive on the normal side
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// Height of a horizontal plane. Meaningless for tilted planes.
    pub fn height(&self) -> f32 {
        -self.constant
    }
}

/// A half-line with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray starting at `origin` and passing through `through`
    pub fn through(origin: Vec3, through: Vec3) -> Self {
        Self::new(origin, through - origin)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the plane, if the plane is ahead of the origin
    pub fn distance_to_plane(&self, plane: &Plane) -> Option<f32> {
        let denominator = plane.normal.dot(self.direction);
        if denominator.abs() <= f32::EPSILON {
            // Parallel: only a hit when the origin already lies on the plane
            return (plane.distance_to_point(self.origin).abs() <= f32::EPSILON).then_some(0.0);
        }

        let t = -(self.origin.dot(plane.normal) + plane.constant) / denominator;
        (t >= 0.0 && t.is_finite()).then_some(t)
    }

    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        self.distance_to_plane(plane).map(|t| self.at(t))
    }
}

/// Axis-aligned bounding box. An empty box has `min > max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for point in points {
            aabb.expand_to_include(point);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Sphere circumscribing the box. Empty boxes give a degenerate sphere.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        if self.is_empty() {
            return BoundingSphere::EMPTY;
        }
        BoundingSphere::new(self.center(), self.size().length() * 0.5)
    }
}

/// Bounding sphere. A radius of zero or less marks an empty scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingSphere {
    pub const EMPTY: Self = Self {
        center: Vec3::ZERO,
        radius: -1.0,
    };

    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.radius > 0.0)
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.distance(self.center) <= self.radius
    }
}

/// Angle in radians between a vector and the up axis, in `[0, π]`.
///
/// Returns `None` for a zero-length vector.
pub fn angle_to_up(vector: Vec3) -> Option<f32> {
    let length = vector.length();
    if length <= f32::EPSILON || !length.is_finite() {
        return None;
    }
    Some((vector.dot(UP) / length).clamp(-1.0, 1.0).acos())
}
