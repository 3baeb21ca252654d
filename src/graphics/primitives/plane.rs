// Local imports
use crate::graphics::aabb::AABB;
use crate::graphics::material::Material;
use crate::graphics::ray::Ray;
use crate::math::{Transform, Vector, ERROR_MARGIN, MAX_RAY_DISTANCE};

/// An infinite plane through `point`, spanned by two in-plane vectors.
///
/// Its bound is the maximum AABB: planes are supported, but they inflate
/// every BVH node that contains one and so inhibit the tree's
/// effectiveness. Prefer large quadrilaterals where possible.
#[derive(Debug,Clone)]
pub struct Plane {
  pub point    : Vector,
  pub normal   : Vector,
  pub material : Material
}

impl Plane {
  /// Constructs the plane through `point` spanned by `u` and `v`.
  /// The normal is `u x v`, normalized.
  pub fn new( point : Vector, u : Vector, v : Vector, material : Material ) -> Plane {
    Plane { point, normal: u.cross( v ).normalize( ), material }
  }

  pub fn intersect( &self, ray : &Ray ) -> Option< f32 > {
    let ln = ray.dir.dot( self.normal );
    if ln == 0.0 {
      // Ray and plane are parallel
      return None;
    }
    let d = ( self.point - ray.origin ).dot( self.normal ) / ln;
    if d <= ERROR_MARGIN {
      return None;
    }
    Some( d )
  }

  pub fn surface_normal( &self, _p : Vector ) -> Vector {
    self.normal
  }

  pub fn bound( &self, _t : &Transform ) -> AABB {
    let m = MAX_RAY_DISTANCE;
    AABB::new( Vector::new( -m, -m, -m ), Vector::new( m, m, m ) )
  }
}
