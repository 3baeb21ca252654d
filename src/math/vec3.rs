// External imports
use std::ops;

/// The three coordinate axes. Mainly used to select BVH split planes.
#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub enum Axis {
  X,
  Y,
  Z
}

impl Axis {
  pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

/// A vector in 3-dimensional space
///
/// Depending on context it is interpreted as a point, a direction or a
/// normal; the distinction lives in the operations applied to it
/// (see `Transform`), not in the type.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct Vector {
  pub x : f32,
  pub y : f32,
  pub z : f32
}

impl Vector {
  pub const ZERO: Vector = Vector { x: 0.0, y: 0.0, z: 0.0 };

  pub fn new( x : f32, y : f32, z : f32 ) -> Vector {
    Vector { x, y, z }
  }

  pub fn dot( self, rhs : Vector ) -> f32 {
    self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
  }

  pub fn cross( self, t : Vector ) -> Vector {
    Vector::new(
      self.y * t.z - self.z * t.y
    , self.z * t.x - self.x * t.z
    , self.x * t.y - self.y * t.x )
  }

  pub fn length( self ) -> f32 {
    self.length_sq( ).sqrt( )
  }

  pub fn length_sq( self ) -> f32 {
    self.dot( self )
  }

  /// Normalizes the vector to unit length.
  /// The zero vector has no direction; it normalizes to itself.
  pub fn normalize( self ) -> Vector {
    let len = self.length( );
    if len == 0.0 {
      return Vector::ZERO;
    }
    self * ( 1.0 / len )
  }

  /// Reflects the incident direction `self` around `normal`
  pub fn reflect( self, normal : Vector ) -> Vector {
    self - 2.0 * self.dot( normal ) * normal
  }

  /// The componentwise minimum of two vectors
  pub fn min( self, v : Vector ) -> Vector {
    Vector::new( self.x.min( v.x ), self.y.min( v.y ), self.z.min( v.z ) )
  }

  /// The componentwise maximum of two vectors
  pub fn max( self, v : Vector ) -> Vector {
    Vector::new( self.x.max( v.x ), self.y.max( v.y ), self.z.max( v.z ) )
  }

  /// Selects the component along the given axis
  pub fn axis( self, a : Axis ) -> f32 {
    match a {
      Axis::X => self.x,
      Axis::Y => self.y,
      Axis::Z => self.z
    }
  }
}

impl ops::Neg for Vector {
  type Output = Vector;

  fn neg( self ) -> Vector {
    Vector::new( -self.x, -self.y, -self.z )
  }
}

impl ops::Add< Vector > for Vector {
  type Output = Vector;

  fn add( self, addend : Vector ) -> Vector {
    Vector::new( self.x + addend.x, self.y + addend.y, self.z + addend.z )
  }
}

impl ops::Sub< Vector > for Vector {
  type Output = Vector;

  fn sub( self, subtrahend : Vector ) -> Vector {
    Vector::new( self.x - subtrahend.x, self.y - subtrahend.y, self.z - subtrahend.z )
  }
}

impl ops::Mul< f32 > for Vector {
  type Output = Vector;

  fn mul( self, multiplier : f32 ) -> Vector {
    Vector::new( multiplier * self.x, multiplier * self.y, multiplier * self.z )
  }
}

impl ops::Mul< Vector > for f32 {
  type Output = Vector;

  fn mul( self, v : Vector ) -> Vector {
    Vector::new( self * v.x, self * v.y, self * v.z )
  }
}

impl ops::Div< f32 > for Vector {
  type Output = Vector;

  fn div( self, divisor : f32 ) -> Vector {
    Vector::new( self.x / divisor, self.y / divisor, self.z / divisor )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_vec_eq( got : Vector, want : Vector ) {
    assert!( ( got.x - want.x ).abs( ) < 1e-4, "x: got {} want {}", got.x, want.x );
    assert!( ( got.y - want.y ).abs( ) < 1e-4, "y: got {} want {}", got.y, want.y );
    assert!( ( got.z - want.z ).abs( ) < 1e-4, "z: got {} want {}", got.z, want.z );
  }

  #[test]
  fn add( ) {
    assert_vec_eq( Vector::ZERO + Vector::ZERO, Vector::ZERO );
    assert_vec_eq( Vector::new( 1.0, 1.0, 1.0 ) + Vector::ZERO, Vector::new( 1.0, 1.0, 1.0 ) );
    assert_vec_eq(
      Vector::new( 42.0, 3.14, 1048.234 ) + Vector::new( 63.7, -15.0, 5.0 )
    , Vector::new( 105.7, -11.86, 1053.234 ) );
  }

  #[test]
  fn sub( ) {
    assert_vec_eq(
      Vector::new( 42.0, 3.14, 1048.234 ) - Vector::new( 63.5, -15.0, 5.0 )
    , Vector::new( -21.5, 18.14, 1043.234 ) );
  }

  #[test]
  fn scale( ) {
    assert_vec_eq( Vector::new( 1.0, 1.0, 1.0 ) * 0.0, Vector::ZERO );
    assert_vec_eq(
      Vector::new( -42.0, 3.14, 1048.234 ) * 3.14
    , Vector::new( -131.88, 9.8596, 3291.4548 ) );
  }

  #[test]
  fn dot( ) {
    assert_eq!( Vector::ZERO.dot( Vector::ZERO ), 0.0 );
    let d = Vector::new( 42.0, 3.14, 1048.234 ).dot( Vector::new( 63.5, -15.0, 5.0 ) );
    assert!( ( d - 7861.07 ).abs( ) < 1e-2 );
  }

  #[test]
  fn cross_follows_right_hand_rule( ) {
    let ex = Vector::new( 1.0, 0.0, 0.0 );
    let ey = Vector::new( 0.0, 1.0, 0.0 );
    let ez = Vector::new( 0.0, 0.0, 1.0 );
    assert_vec_eq( ex.cross( ey ), ez );
    assert_vec_eq( ey.cross( ez ), ex );
    assert_vec_eq( ez.cross( ex ), ey );
    assert_vec_eq( ey.cross( ex ), -ez );
  }

  #[test]
  fn normalize_unit_length( ) {
    let v = Vector::new( 3.0, -4.0, 12.0 ).normalize( );
    assert!( ( v.length( ) - 1.0 ).abs( ) < 1e-5 );
  }

  #[test]
  fn normalize_zero_is_zero( ) {
    assert_eq!( Vector::ZERO.normalize( ), Vector::ZERO );
  }

  #[test]
  fn axis_selects_component( ) {
    let v = Vector::new( 1.0, 2.0, 3.0 );
    assert_eq!( v.axis( Axis::X ), 1.0 );
    assert_eq!( v.axis( Axis::Y ), 2.0 );
    assert_eq!( v.axis( Axis::Z ), 3.0 );
  }

  #[test]
  fn reflect_mirrors_around_normal( ) {
    let incident = Vector::new( 1.0, -1.0, 0.0 ).normalize( );
    let normal = Vector::new( 0.0, 1.0, 0.0 );
    assert_vec_eq( incident.reflect( normal ), Vector::new( 1.0, 1.0, 0.0 ).normalize( ) );
  }
}
