// Local imports
use crate::graphics::ray::Ray;
use crate::math::{Axis, Vector};
use crate::simd::{self, F32x4};

/// An axis-aligned bounding box, stored as its two extreme corners with
/// `pmin <= pmax` componentwise
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct AABB {
  pub pmin : Vector,
  pub pmax : Vector
}

/// A set of 4 AABBs laid out for intersecting a ray with all four at once
#[derive(Copy,Clone,Debug)]
pub struct AABBx4 {
  pub x_min : F32x4,
  pub y_min : F32x4,
  pub z_min : F32x4,
  pub x_max : F32x4,
  pub y_max : F32x4,
  pub z_max : F32x4
}

impl AABB {
  /// A placeholder AABB. Used for initialising arrays.
  pub const EMPTY: AABB = AABB { pmin: Vector::ZERO, pmax: Vector::ZERO };

  /// Constructs the AABB spanned by two corner points, which need not be
  /// ordered
  pub fn new( p1 : Vector, p2 : Vector ) -> AABB {
    AABB { pmin: p1.min( p2 ), pmax: p1.max( p2 ) }
  }

  /// The smallest AABB containing `self` and the point `p`
  pub fn add_point( &self, p : Vector ) -> AABB {
    AABB { pmin: self.pmin.min( p ), pmax: self.pmax.max( p ) }
  }

  /// The smallest AABB containing both boxes
  pub fn union( &self, o : &AABB ) -> AABB {
    AABB { pmin: self.pmin.min( o.pmin ), pmax: self.pmax.max( o.pmax ) }
  }

  pub fn centroid( &self ) -> Vector {
    ( self.pmin + self.pmax ) * 0.5
  }

  pub fn surface_area( &self ) -> f32 {
    let d = self.pmax - self.pmin;
    2.0 * ( d.x * d.y + d.y * d.z + d.x * d.z )
  }

  /// The axis along which the box is largest. BVH builds split on it.
  pub fn maximum_extent( &self ) -> Axis {
    let d = self.pmax - self.pmin;
    if d.x >= d.y && d.x >= d.z {
      Axis::X
    } else if d.y >= d.x && d.y >= d.z {
      Axis::Y
    } else {
      Axis::Z
    }
  }

  /// The position of `p` relative to the box corners, scaled to [0,1] per
  /// axis. Used for SAH bucket binning. Degenerate axes (pmin == pmax)
  /// keep the unscaled offset, guarding the division by zero.
  pub fn offset( &self, p : Vector ) -> Vector {
    let mut o = p - self.pmin;
    if self.pmax.x > self.pmin.x {
      o.x = o.x / ( self.pmax.x - self.pmin.x );
    }
    if self.pmax.y > self.pmin.y {
      o.y = o.y / ( self.pmax.y - self.pmin.y );
    }
    if self.pmax.z > self.pmin.z {
      o.z = o.z / ( self.pmax.z - self.pmin.z );
    }
    o
  }

  pub fn contains_point( &self, p : Vector ) -> bool {
    self.pmin.x <= p.x && self.pmin.y <= p.y && self.pmin.z <= p.z
      && self.pmax.x >= p.x && self.pmax.y >= p.y && self.pmax.z >= p.z
  }

  /// True if `o` is fully contained in `self`
  pub fn contains( &self, o : &AABB ) -> bool {
    self.contains_point( o.pmin ) && self.contains_point( o.pmax )
  }

  /// Intersects the ray with the box by clipping against the three slabs.
  ///
  /// Returns the entry distance when the ray enters the slab region with a
  /// non-negative distance, `0.0` when the origin is inside the box, and
  /// `None` when the box is missed or lies behind the origin. The min/max
  /// chains keep NaNs (from a zero direction component on a degenerate
  /// axis) out of the result.
  pub fn intersect( &self, ray : &Ray ) -> Option< f32 > {
    let tx1 = ( self.pmin.x - ray.origin.x ) * ray.inv_dir.x;
    let tx2 = ( self.pmax.x - ray.origin.x ) * ray.inv_dir.x;
    let ty1 = ( self.pmin.y - ray.origin.y ) * ray.inv_dir.y;
    let ty2 = ( self.pmax.y - ray.origin.y ) * ray.inv_dir.y;
    let tz1 = ( self.pmin.z - ray.origin.z ) * ray.inv_dir.z;
    let tz2 = ( self.pmax.z - ray.origin.z ) * ray.inv_dir.z;

    let tmin = tx1.min( tx2 ).max( ty1.min( ty2 ) ).max( tz1.min( tz2 ) );
    let tmax = tx1.max( tx2 ).min( ty1.max( ty2 ) ).min( tz1.max( tz2 ) );

    if tmin > tmax {
      None
    } else if tmin >= 0.0 {
      Some( tmin )
    } else if tmax >= 0.0 {
      Some( 0.0 )
    } else {
      None
    }
  }
}

impl AABBx4 {
  /// Packs 4 AABBs into the SIMD-friendly layout
  pub fn new( a : AABB, b : AABB, c : AABB, d : AABB ) -> AABBx4 {
    AABBx4 {
      x_min: F32x4::new( a.pmin.x, b.pmin.x, c.pmin.x, d.pmin.x ),
      y_min: F32x4::new( a.pmin.y, b.pmin.y, c.pmin.y, d.pmin.y ),
      z_min: F32x4::new( a.pmin.z, b.pmin.z, c.pmin.z, d.pmin.z ),
      x_max: F32x4::new( a.pmax.x, b.pmax.x, c.pmax.x, d.pmax.x ),
      y_max: F32x4::new( a.pmax.y, b.pmax.y, c.pmax.y, d.pmax.y ),
      z_max: F32x4::new( a.pmax.z, b.pmax.z, c.pmax.z, d.pmax.z )
    }
  }

  /// Extracts the AABB at lane `i`
  pub fn extract( &self, i : usize ) -> AABB {
    AABB {
      pmin: Vector::new( self.x_min.extract( i ), self.y_min.extract( i ), self.z_min.extract( i ) ),
      pmax: Vector::new( self.x_max.extract( i ), self.y_max.extract( i ), self.z_max.extract( i ) )
    }
  }

  /// Intersects the ray with all 4 boxes at once. Per lane: entry distance,
  /// `0.0` for origin-inside, `-INFINITY` for a miss.
  pub fn intersect( &self, ray : &Ray ) -> F32x4 {
    simd::box4_hit(
        self.x_min, self.y_min, self.z_min
      , self.x_max, self.y_max, self.z_max
      , ray.origin, ray.inv_dir )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_point_grows_to_contain( ) {
    let b = AABB::new( Vector::ZERO, Vector::new( 1.0, 1.0, 1.0 ) );
    let p = Vector::new( -2.0, 0.5, 3.0 );
    let b2 = b.add_point( p );

    assert!( b2.contains_point( p ) );
    assert!( b2.contains( &b ) );
  }

  #[test]
  fn union_commutative_and_associative( ) {
    let a = AABB::new( Vector::new( 0.0, 0.0, 0.0 ), Vector::new( 1.0, 1.0, 1.0 ) );
    let b = AABB::new( Vector::new( -1.0, 2.0, 0.5 ), Vector::new( 0.5, 3.0, 2.0 ) );
    let c = AABB::new( Vector::new( 5.0, -1.0, -2.0 ), Vector::new( 6.0, 0.0, 0.0 ) );

    assert_eq!( a.union( &b ), b.union( &a ) );
    assert_eq!( a.union( &b ).union( &c ), a.union( &b.union( &c ) ) );
  }

  #[test]
  fn intersect_from_outside( ) {
    let b = AABB::new( Vector::new( -1.0, -1.0, 2.0 ), Vector::new( 1.0, 1.0, 4.0 ) );
    let r = Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) );
    let t = b.intersect( &r ).unwrap( );
    assert!( ( t - 2.0 ).abs( ) < 1e-5 );
  }

  #[test]
  fn intersect_from_inside_is_zero( ) {
    let b = AABB::new( Vector::new( -1.0, -1.0, -1.0 ), Vector::new( 1.0, 1.0, 1.0 ) );
    let r = Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) );
    assert_eq!( b.intersect( &r ), Some( 0.0 ) );
  }

  #[test]
  fn intersect_behind_misses( ) {
    let b = AABB::new( Vector::new( -1.0, -1.0, -4.0 ), Vector::new( 1.0, 1.0, -2.0 ) );
    let r = Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) );
    assert_eq!( b.intersect( &r ), None );
  }

  #[test]
  fn degenerate_box_does_not_produce_nan( ) {
    // A box flat in y, hit by a ray travelling in its plane
    let b = AABB::new( Vector::new( -1.0, 0.0, 2.0 ), Vector::new( 1.0, 0.0, 4.0 ) );
    let r = Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) );
    if let Some( t ) = b.intersect( &r ) {
      assert!( !t.is_nan( ) );
    }
  }

  #[test]
  fn offset_maps_corners_to_unit_range( ) {
    let b = AABB::new( Vector::new( 1.0, 2.0, 3.0 ), Vector::new( 3.0, 6.0, 4.0 ) );
    assert_eq!( b.offset( b.pmin ), Vector::ZERO );
    assert_eq!( b.offset( b.pmax ), Vector::new( 1.0, 1.0, 1.0 ) );
    assert_eq!( b.offset( b.centroid( ) ), Vector::new( 0.5, 0.5, 0.5 ) );
  }

  #[test]
  fn maximum_extent_picks_longest_axis( ) {
    let b = AABB::new( Vector::ZERO, Vector::new( 1.0, 5.0, 2.0 ) );
    assert_eq!( b.maximum_extent( ), Axis::Y );
  }

  #[test]
  fn packed_lanes_match_scalar_boxes( ) {
    let boxes = [
      AABB::new( Vector::new( -1.0, -1.0, 1.0 ), Vector::new( 1.0, 1.0, 2.0 ) ),
      AABB::new( Vector::new( -1.0, -1.0, 5.0 ), Vector::new( 1.0, 1.0, 6.0 ) ),
      AABB::new( Vector::new( 3.0, 3.0, 3.0 ), Vector::new( 4.0, 4.0, 4.0 ) ),
      AABB::new( Vector::new( -1.0, -1.0, -3.0 ), Vector::new( 1.0, 1.0, -2.0 ) )
    ];
    let packed = AABBx4::new( boxes[ 0 ], boxes[ 1 ], boxes[ 2 ], boxes[ 3 ] );
    let ray = Ray::new( Vector::ZERO, Vector::new( 0.0, 0.0, 1.0 ) );

    for i in 0..4 {
      assert_eq!( packed.extract( i ), boxes[ i ] );
    }

    let hits = packed.intersect( &ray );
    for i in 0..4 {
      match boxes[ i ].intersect( &ray ) {
        Some( t ) => assert!( ( hits.extract( i ) - t ).abs( ) < 1e-5 ),
        None => assert!( hits.extract( i ) < 0.0 )
      }
    }
  }
}
