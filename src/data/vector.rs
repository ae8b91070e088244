use binrw::{BinRead, BinResult, Endian};
use cgmath::{InnerSpace, Vector3};
use std::io::{Read, Seek};
use std::ops::{Add, Deref, DerefMut, Mul, Neg, Sub};

/// A 3-component world-space vector.
///
/// Wraps `cgmath::Vector3<f32>` so the math (dot products, lengths,
/// cross products) comes from `cgmath` rather than being hand-rolled, while
/// still giving us a local type to hang a `binrw::BinRead` impl on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector(pub Vector3<f32>);

impl Vector {
    pub const ZERO: Vector = Vector(Vector3::new(0.0, 0.0, 0.0));

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vector(Vector3::new(x, y, z))
    }

    pub fn dot(self, other: Vector) -> f32 {
        self.0.dot(other.0)
    }

    pub fn lerp(self, other: Vector, t: f32) -> Vector {
        Vector(self.0 + (other.0 - self.0) * t)
    }

    pub fn cross(self, other: Vector) -> Vector {
        Vector(self.0.cross(other.0))
    }
}

impl From<Vector3<f32>> for Vector {
    fn from(v: Vector3<f32>) -> Self {
        Vector(v)
    }
}

impl From<Vector> for Vector3<f32> {
    fn from(v: Vector) -> Self {
        v.0
    }
}

impl Deref for Vector {
    type Target = Vector3<f32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Vector {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector(self.0 + rhs.0)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector(self.0 - rhs.0)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f32) -> Vector {
        Vector(self.0 * rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector(-self.0)
    }
}

impl BinRead for Vector {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let x = f32::read_options(reader, endian, ())?;
        let y = f32::read_options(reader, endian, ())?;
        let z = f32::read_options(reader, endian, ())?;
        Ok(Vector::new(x, y, z))
    }
}

impl crate::bspfile::LumpRecord for Vector {
    const SIZE: usize = 12;
}
