use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// Plain 2D vector used for positions, velocities and impulses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Vector { x, y }
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance_to(&self, other: Vector) -> f64 {
        (*self - other).length()
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned world rectangle anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(width: f64, height: f64) -> Self {
        Bounds { width, height }
    }

    /// True when a disc of `radius` at `point` lies fully inside.
    pub fn contains(&self, point: Vector, radius: f64) -> bool {
        point.x >= radius
            && point.y >= radius
            && point.x <= self.width - radius
            && point.y <= self.height - radius
    }

    /// Keep a disc inside the rectangle, bouncing its velocity off the edge.
    pub fn reflect(&self, position: &mut Vector, velocity: &mut Vector, radius: f64) {
        if position.x < radius {
            position.x = radius;
            velocity.x = velocity.x.abs();
        } else if position.x > self.width - radius {
            position.x = self.width - radius;
            velocity.x = -velocity.x.abs();
        }
        if position.y < radius {
            position.y = radius;
            velocity.y = velocity.y.abs();
        } else if position.y > self.height - radius {
            position.y = self.height - radius;
            velocity.y = -velocity.y.abs();
        }
    }
}
