use glam::Vec2;

/// Axis-aligned box, center + half-extents, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.half.x
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.half.x
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.half.y
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.half.y
    }

    /// Same box translated by `delta`.
    pub fn offset(&self, delta: Vec2) -> Self {
        Self { center: self.center + delta, half: self.half }
    }

    /// Separation test. Touching edges count as overlapping.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        if (self.center.x - other.center.x).abs() > self.half.x + other.half.x {
            return false;
        }
        if (self.center.y - other.center.y).abs() > self.half.y + other.half.y {
            return false;
        }
        true
    }

    /// Signed penetration per axis, pointing from `other` toward `self`.
    ///
    /// Both components are always populated; the caller decides which axis is
    /// the actual separating one. A zero half-extent on either box disables
    /// the test entirely. When centers coincide on an axis the sign resolves
    /// to +1, so exact ties always push `self` right/down.
    pub fn overlap_signed(&self, other: &Aabb) -> Option<Vec2> {
        if self.half.x == 0.0
            || self.half.y == 0.0
            || other.half.x == 0.0
            || other.half.y == 0.0
        {
            return None;
        }

        let dx = self.center.x - other.center.x;
        let dy = self.center.y - other.center.y;
        let sum_x = self.half.x + other.half.x;
        let sum_y = self.half.y + other.half.y;
        if dx.abs() > sum_x || dy.abs() > sum_y {
            return None;
        }

        let sign_x = if dx >= 0.0 { 1.0 } else { -1.0 };
        let sign_y = if dy >= 0.0 { 1.0 } else { -1.0 };
        Some(Vec2::new(
            sign_x * (sum_x - dx.abs()),
            sign_y * (sum_y - dy.abs()),
        ))
    }
}
