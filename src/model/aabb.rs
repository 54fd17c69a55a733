use glam::Vec3;

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box enclosing all points. Empty input collapses to the origin.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut any = false;
        for p in points {
            let p = Vec3::from_array(*p);
            min = min.min(p);
            max = max.max(p);
            any = true;
        }
        if any {
            Self { min, max }
        } else {
            Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            }
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Inclusive overlap test: boxes that merely touch count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y
            || other.max.z < self.min.z
            || other.min.z > self.max.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_and_size() {
        let b = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -30.0), Vec3::new(25.0, 25.0, 20.0));
        assert_eq!(b.min, Vec3::new(-25.0, -25.0, -50.0));
        assert_eq!(b.max, Vec3::new(25.0, 25.0, -10.0));
        assert_eq!(b.center(), Vec3::new(0.0, 0.0, -30.0));
        assert_eq!(b.size(), Vec3::new(50.0, 50.0, 40.0));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::new(Vec3::ZERO, Vec3::splat(1.0));
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Vec3::new(1.1, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn disjoint_on_one_axis_is_enough() {
        let a = Aabb::new(Vec3::ZERO, Vec3::splat(1.0));
        let b = Aabb::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 3.0, 1.0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn from_points_encloses_input() {
        let points = [[-1.0, 0.0, 2.0], [3.0, -2.0, 0.5], [0.0, 0.0, 0.0]];
        let b = Aabb::from_points(points.iter());
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(3.0, 0.0, 2.0));
    }
}
