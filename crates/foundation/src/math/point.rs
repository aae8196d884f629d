/// A pixel-space point. Used for container, layer and world pixel coordinates alike.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise multiplication.
    pub fn scale_by(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn midpoint(self, other: Self) -> Self {
        (self + other) / 2.0
    }

    pub fn floor(self) -> Self {
        Self::new(self.x.floor(), self.y.floor())
    }

    pub fn round(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Rotates about the origin by `theta` radians.
    ///
    /// ```text
    /// ⎡ x' ⎤   ⎡ cos θ  -sin θ ⎤ ⎡ x ⎤
    /// ⎣ y' ⎦ = ⎣ sin θ   cos θ ⎦ ⎣ y ⎦
    /// ```
    ///
    /// With screen y pointing down a positive angle turns clockwise on screen.
    pub fn rotate(self, theta: f64) -> Self {
        if theta == 0.0 {
            return self;
        }
        let (sin, cos) = theta.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Rotates about `pivot` by `theta` radians.
    ///
    /// Same as `(self - pivot).rotate(theta) + pivot`.
    pub fn rotate_about(self, theta: f64, pivot: Point) -> Self {
        if theta == 0.0 {
            return self;
        }
        let (sin, cos) = theta.sin_cos();
        let x = self.x - pivot.x;
        let y = self.y - pivot.y;
        Self::new(x * cos - y * sin + pivot.x, x * sin + y * cos + pivot.y)
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Self;

    fn mul(self, k: f64) -> Self::Output {
        Self::new(self.x * k, self.y * k)
    }
}

impl std::ops::Div<f64> for Point {
    type Output = Self;

    fn div(self, k: f64) -> Self::Output {
        Self::new(self.x / k, self.y / k)
    }
}

impl std::ops::Neg for Point {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}
