// External imports
use rand::Rng;
// Local imports
use crate::graphics::aabb::AABB;
use crate::graphics::material::Material;
use crate::graphics::ray::Ray;
use crate::math::{Transform, Vector, ERROR_MARGIN};

/// A triangle holding its three vertices in world space.
/// The normal points towards the side where the vertices wind
/// counter-clockwise.
#[derive(Debug,Clone)]
pub struct Triangle {
  pub p0       : Vector,
  pub p1       : Vector,
  pub p2       : Vector,
  pub material : Material
}

impl Triangle {
  pub fn new( p0 : Vector, p1 : Vector, p2 : Vector, material : Material ) -> Triangle {
    Triangle { p0, p1, p2, material }
  }

  pub fn intersect( &self, ray : &Ray ) -> Option< f32 > {
    triangle_intersect( self.p0, self.p1, self.p2, ray )
  }

  pub fn surface_normal( &self, _p : Vector ) -> Vector {
    triangle_normal( self.p0, self.p1, self.p2 )
  }

  pub fn area( &self ) -> f32 {
    triangle_area( self.p0, self.p1, self.p2 )
  }

  pub fn bound( &self, t : &Transform ) -> AABB {
    triangle_bound( self.p0, self.p1, self.p2, t )
  }

  /// Returns a copy of this triangle with the transform applied to its
  /// vertices. Used when instanced emitters are materialised in world
  /// space.
  pub fn transformed( &self, t : &Transform ) -> Triangle {
    Triangle::new(
      t.point( self.p0 )
    , t.point( self.p1 )
    , t.point( self.p2 )
    , self.material.clone( ) )
  }

  /// Uniformly samples a point on the triangle
  pub fn sample_point< R : Rng >( &self, rng : &mut R ) -> Vector {
    triangle_sample_point( rng, self.p0, self.p1, self.p2 )
  }
}

/// Möller-Trumbore ray-triangle intersection over raw vertices; shared by
/// `Triangle` and the mesh triangles
pub fn triangle_intersect( p0 : Vector, p1 : Vector, p2 : Vector, ray : &Ray ) -> Option< f32 > {
  let e1 = p1 - p0;
  let e2 = p2 - p0;

  let pvec = ray.dir.cross( e2 );
  let det = e1.dot( pvec );

  // A near-zero determinant means the ray runs (almost) parallel to the
  // triangle's plane
  if det.abs( ) < 1e-8 {
    return None;
  }
  let inv_det = 1.0 / det;

  let tvec = ray.origin - p0;
  let u = tvec.dot( pvec ) * inv_det;
  if u < 0.0 || u > 1.0 {
    return None;
  }

  let qvec = tvec.cross( e1 );
  let v = ray.dir.dot( qvec ) * inv_det;
  if v < 0.0 || u + v > 1.0 {
    return None;
  }

  let t = e2.dot( qvec ) * inv_det;
  if t <= ERROR_MARGIN {
    return None;
  }
  Some( t )
}

/// The unit normal on the side where (p0,p1,p2) wind counter-clockwise
pub fn triangle_normal( p0 : Vector, p1 : Vector, p2 : Vector ) -> Vector {
  ( p1 - p0 ).cross( p2 - p0 ).normalize( )
}

pub fn triangle_area( p0 : Vector, p1 : Vector, p2 : Vector ) -> f32 {
  0.5 * ( p1 - p0 ).cross( p2 - p0 ).length( )
}

pub fn triangle_bound( p0 : Vector, p1 : Vector, p2 : Vector, t : &Transform ) -> AABB {
  let q0 = t.point( p0 );
  let q1 = t.point( p1 );
  let q2 = t.point( p2 );
  AABB::new( q0, q1 ).add_point( q2 )
}

/// Uniformly samples a point on the triangle: a uniform point in the unit
/// square, folded into the lower-left triangle when it lands outside
pub fn triangle_sample_point< R : Rng >( rng : &mut R, p0 : Vector, p1 : Vector, p2 : Vector ) -> Vector {
  let mut a : f32 = rng.gen( );
  let mut b : f32 = rng.gen( );
  if a + b > 1.0 {
    a = 1.0 - a;
    b = 1.0 - b;
  }
  p0 + a * ( p1 - p0 ) + b * ( p2 - p0 )
}
