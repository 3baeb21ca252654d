mod transform;
mod vec3;

pub use transform::{Matrix4x4, Transform};
pub use vec3::{Axis, Vector};

/// The minimum accepted hit distance. Intersections closer than this are
/// considered self-intersections of secondary rays and rejected.
pub const ERROR_MARGIN : f32 = 1e-3;

/// The maximum distance a ray travels through a scene
pub const MAX_RAY_DISTANCE : f32 = 1.0e6;

pub fn clamp( x : f32, min_val : f32, max_val : f32 ) -> f32 {
  max_val.min( min_val.max( x ) )
}

/// Barycentric coordinates of `p` with respect to the triangle (p0,p1,p2).
/// The result (l0,l1,l2) satisfies `p = l0*p0 + l1*p1 + l2*p2` and sums to
/// one for points in the triangle's plane.
pub fn barycentric( p0 : Vector, p1 : Vector, p2 : Vector, p : Vector ) -> (f32, f32, f32) {
  let v0 = p1 - p0;
  let v1 = p2 - p0;
  let v2 = p - p0;

  let d00 = v0.dot( v0 );
  let d01 = v0.dot( v1 );
  let d11 = v1.dot( v1 );
  let d20 = v2.dot( v0 );
  let d21 = v2.dot( v1 );

  let denom = d00 * d11 - d01 * d01;
  if denom == 0.0 {
    // Degenerate triangle; attribute everything to the first vertex
    return ( 1.0, 0.0, 0.0 );
  }

  let l1 = ( d11 * d20 - d01 * d21 ) / denom;
  let l2 = ( d00 * d21 - d01 * d20 ) / denom;
  ( 1.0 - l1 - l2, l1, l2 )
}
