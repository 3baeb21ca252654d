// Local imports
use crate::graphics::aabb::AABB;
use crate::graphics::material::Material;
use crate::graphics::ray::Ray;
use crate::math::{Transform, Vector, ERROR_MARGIN};

/// A sphere, described by its center and radius
#[derive(Debug,Clone)]
pub struct Sphere {
  pub center   : Vector,
  pub radius   : f32,
  pub material : Material
}

impl Sphere {
  pub fn new( center : Vector, radius : f32, material : Material ) -> Sphere {
    Sphere { center, radius, material }
  }

  /// Analytic ray-sphere intersection.
  ///
  /// Only the smaller root is accepted: a ray starting inside the sphere
  /// reports no hit.
  pub fn intersect( &self, ray : &Ray ) -> Option< f32 > {
    let oc = ray.origin - self.center;
    let loc = ray.dir.dot( oc );
    let det = loc * loc - oc.dot( oc ) + self.radius * self.radius;

    // A ray skimming the sphere at det == 0 is ignored
    if det <= 0.0 {
      return None;
    }

    let d = -loc - det.sqrt( );
    if d <= ERROR_MARGIN {
      return None;
    }
    Some( d )
  }

  pub fn surface_normal( &self, p : Vector ) -> Vector {
    ( p - self.center ).normalize( )
  }

  /// The world-space bound: a cube of side 2r around the transformed center
  pub fn bound( &self, t : &Transform ) -> AABB {
    let c = t.point( self.center );
    let r = self.radius;
    AABB::new(
      Vector::new( c.x - r, c.y - r, c.z - r )
    , Vector::new( c.x + r, c.y + r, c.z + r ) )
  }
}
