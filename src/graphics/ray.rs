// External imports
use std::f32::consts::PI;
// Local imports
use crate::graphics::material::Material;
use crate::graphics::mesh::TriangleInMesh;
use crate::graphics::object::Object;
use crate::math::{Transform, Vector};

// The ray and hit-record types at the heart of the tracer
//
// Exports:
// * Ray
// * Surface
// * SurfaceInteraction

/// A half-line in 3-dimensional space
///
/// The direction is normalized at construction and is immutable for the
/// duration of a trace. The maximum travel distance is *not* part of the
/// ray; queries pass it alongside.
#[derive(Copy,Clone,Debug)]
pub struct Ray {
  pub origin  : Vector,
  pub dir     : Vector,
  /// Componentwise reciprocal of the direction, precomputed for the slab
  /// tests in AABB intersection
  pub inv_dir : Vector
}

impl Ray {
  /// Constructs a ray from an origin and an arbitrary (non-unit) vector.
  /// A zero vector stays zero; traversals with such a ray find no hits.
  pub fn new( origin : Vector, dir : Vector ) -> Ray {
    let d = dir.normalize( );
    Ray {
      origin,
      dir:     d,
      inv_dir: Vector::new( 1.0 / d.x, 1.0 / d.y, 1.0 / d.z )
    }
  }

  /// Evaluates the ray at the provided distance from its origin
  pub fn at( &self, distance : f32 ) -> Vector {
    self.origin + distance * self.dir
  }
}

impl Transform {
  /// Transforms a ray: the origin as a point, the direction as a vector.
  /// The result is re-normalized, so distances along the two rays differ
  /// by the transform's scale.
  pub fn ray( &self, r : &Ray ) -> Ray {
    Ray::new( self.point( r.origin ), self.vector( r.dir ) )
  }
}

/// A handle to the primitive a ray hit.
///
/// Mesh triangles are not `Object`s (they live in their mesh's own
/// acceleration structure and borrow its vertex buffers), so a hit record
/// distinguishes the two.
#[derive(Copy,Clone)]
pub enum Surface< 'a > {
  Object( &'a Object ),
  MeshTriangle( &'a TriangleInMesh )
}

impl< 'a > Surface< 'a > {
  /// The material at this surface
  pub fn material( &self ) -> &'a Material {
    match self {
      Surface::Object( o )       => o.material( ),
      Surface::MeshTriangle( t ) => t.material( )
    }
  }

  /// The (u,v) parametrisation at the hit, used by image and procedural
  /// textures. Computed from object-space hit data so instancing does not
  /// shift texture lookups.
  pub fn uv( &self, object_point : Vector, object_normal : Vector ) -> (f32, f32) {
    match self {
      Surface::Object( Object::Sphere( _ ) ) => {
        // Spherical parametrisation from the outward normal
        let n = object_normal;
        let u = 0.5 + n.z.atan2( n.x ) / ( 2.0 * PI );
        let v = 0.5 - n.y.asin( ) / PI;
        (u, v)
      },
      Surface::Object( Object::Plane( _ ) ) => {
        (object_point.x, object_point.z)
      },
      Surface::MeshTriangle( t ) => {
        t.uv( object_point )
      },
      _ => (0.0, 0.0)
    }
  }
}

/// The record produced by a successful intersection
///
/// Created per hit, mutated only by normal-mapping materials (which replace
/// the shading normal), and discarded when the enclosing trace returns.
/// The object-space point and normal are kept unmodified so instanced
/// texture and normal lookups see the prototype's coordinates.
#[derive(Copy,Clone)]
pub struct SurfaceInteraction< 'a > {
  /// Distance from the ray origin to the hit, in world space
  pub distance      : f32,
  /// World-space hit point
  pub point         : Vector,
  /// Shading normal, unit length
  pub normal        : Vector,
  /// The primitive that was hit
  pub surface       : Surface< 'a >,
  /// Hit point in the primitive's own coordinate system
  pub object_point  : Vector,
  /// Geometric normal in the primitive's own coordinate system
  pub object_normal : Vector,
  /// Direction of the incoming ray, unit length
  pub incident      : Vector
}

impl< 'a > SurfaceInteraction< 'a > {
  /// Builds the record for a hit at `distance` along `ray`.
  /// The shading normal is the side of the geometric normal facing the
  /// ray, so flat surfaces shade the same from either side. Emitter
  /// directionality is judged against the primitive's own
  /// `surface_normal`, not this.
  pub fn new( surface : Surface< 'a >, distance : f32, normal : Vector, ray : &Ray ) -> SurfaceInteraction< 'a > {
    let point = ray.at( distance );
    let facing =
      if normal.dot( ray.dir ) > 0.0 {
        -normal
      } else {
        normal
      };
    SurfaceInteraction {
      distance,
      point,
      normal:        facing,
      surface,
      object_point:  point,
      object_normal: facing,
      incident:      ray.dir
    }
  }

  /// The (u,v) parametrisation at the hit
  pub fn uv( &self ) -> (f32, f32) {
    self.surface.uv( self.object_point, self.object_normal )
  }
}
