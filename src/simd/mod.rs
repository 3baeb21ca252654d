// External imports
use std::f32::INFINITY;
use std::ops;
// Local imports
use crate::math::Vector;

// 4-lane float operations for the 4-ary BVH traversal.
//
// With the `simd` cargo feature the two packed intersection routines run on
// `packed_simd`'s `f32x4`; without it an equivalent scalar implementation is
// used. Callers observe identical results either way, only throughput
// differs.
//
// Exports:
// * F32x4
// * box4_hit
// * triangle4_hit

/// Four f32 lanes. The storage type for packed AABBs and triangles.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct F32x4 {
  lanes : [f32; 4]
}

impl F32x4 {
  pub const ZERO: F32x4 = F32x4 { lanes: [0.0; 4] };

  pub fn new( a : f32, b : f32, c : f32, d : f32 ) -> F32x4 {
    F32x4 { lanes: [a, b, c, d] }
  }

  pub fn splat( v : f32 ) -> F32x4 {
    F32x4 { lanes: [v; 4] }
  }

  pub fn extract( self, i : usize ) -> f32 {
    self.lanes[ i ]
  }

  pub fn replace( mut self, i : usize, v : f32 ) -> F32x4 {
    self.lanes[ i ] = v;
    self
  }

  pub fn min( self, o : F32x4 ) -> F32x4 {
    let mut r = [0.0; 4];
    for i in 0..4 {
      r[ i ] = self.lanes[ i ].min( o.lanes[ i ] );
    }
    F32x4 { lanes: r }
  }

  pub fn max( self, o : F32x4 ) -> F32x4 {
    let mut r = [0.0; 4];
    for i in 0..4 {
      r[ i ] = self.lanes[ i ].max( o.lanes[ i ] );
    }
    F32x4 { lanes: r }
  }
}

impl ops::Add< F32x4 > for F32x4 {
  type Output = F32x4;

  fn add( self, o : F32x4 ) -> F32x4 {
    let mut r = [0.0; 4];
    for i in 0..4 {
      r[ i ] = self.lanes[ i ] + o.lanes[ i ];
    }
    F32x4 { lanes: r }
  }
}

impl ops::Sub< F32x4 > for F32x4 {
  type Output = F32x4;

  fn sub( self, o : F32x4 ) -> F32x4 {
    let mut r = [0.0; 4];
    for i in 0..4 {
      r[ i ] = self.lanes[ i ] - o.lanes[ i ];
    }
    F32x4 { lanes: r }
  }
}

impl ops::Mul< F32x4 > for F32x4 {
  type Output = F32x4;

  fn mul( self, o : F32x4 ) -> F32x4 {
    let mut r = [0.0; 4];
    for i in 0..4 {
      r[ i ] = self.lanes[ i ] * o.lanes[ i ];
    }
    F32x4 { lanes: r }
  }
}

/// Intersects a ray with 4 AABBs at once.
///
/// Per lane: the entry distance when the ray enters the slab region with a
/// non-negative distance, `0.0` when the ray origin is inside the box, and
/// `-INFINITY` when the box is missed or lies behind the origin.
#[cfg(feature = "simd")]
pub fn box4_hit(
      x_min : F32x4, y_min : F32x4, z_min : F32x4
    , x_max : F32x4, y_max : F32x4, z_max : F32x4
    , origin : Vector, inv_dir : Vector ) -> F32x4 {
  use packed_simd::f32x4;

  let to = |v : F32x4| f32x4::new( v.lanes[0], v.lanes[1], v.lanes[2], v.lanes[3] );

  let z_x4 = f32x4::splat( 0.0 );
  let ninf_x4 = f32x4::splat( -INFINITY );

  let tx1 = ( to( x_min ) - origin.x ) * inv_dir.x;
  let tx2 = ( to( x_max ) - origin.x ) * inv_dir.x;
  let ty1 = ( to( y_min ) - origin.y ) * inv_dir.y;
  let ty2 = ( to( y_max ) - origin.y ) * inv_dir.y;
  let tz1 = ( to( z_min ) - origin.z ) * inv_dir.z;
  let tz2 = ( to( z_max ) - origin.z ) * inv_dir.z;

  let tmin = tx1.min( tx2 ).max( ty1.min( ty2 ) ).max( tz1.min( tz2 ) );
  let tmax = tx1.max( tx2 ).min( ty1.max( ty2 ) ).min( tz1.max( tz2 ) );

  let no_intersect = tmin.gt( tmax ) | tmax.lt( z_x4 );
  let outside = tmin.ge( z_x4 );

  let r = no_intersect.select( ninf_x4, outside.select( tmin, z_x4 ) );
  F32x4::new( r.extract( 0 ), r.extract( 1 ), r.extract( 2 ), r.extract( 3 ) )
}

/// See the `simd`-feature variant above; this is the scalar drop-in.
#[cfg(not(feature = "simd"))]
pub fn box4_hit(
      x_min : F32x4, y_min : F32x4, z_min : F32x4
    , x_max : F32x4, y_max : F32x4, z_max : F32x4
    , origin : Vector, inv_dir : Vector ) -> F32x4 {
  let mut r = F32x4::splat( -INFINITY );

  for i in 0..4 {
    let tx1 = ( x_min.lanes[ i ] - origin.x ) * inv_dir.x;
    let tx2 = ( x_max.lanes[ i ] - origin.x ) * inv_dir.x;
    let ty1 = ( y_min.lanes[ i ] - origin.y ) * inv_dir.y;
    let ty2 = ( y_max.lanes[ i ] - origin.y ) * inv_dir.y;
    let tz1 = ( z_min.lanes[ i ] - origin.z ) * inv_dir.z;
    let tz2 = ( z_max.lanes[ i ] - origin.z ) * inv_dir.z;

    let tmin = tx1.min( tx2 ).max( ty1.min( ty2 ) ).max( tz1.min( tz2 ) );
    let tmax = tx1.max( tx2 ).min( ty1.max( ty2 ) ).min( tz1.max( tz2 ) );

    if tmin <= tmax && tmax >= 0.0 {
      r = r.replace( i, if tmin >= 0.0 { tmin } else { 0.0 } );
    }
  }

  r
}

/// Intersects a ray with 4 triangles at once (Möller-Trumbore).
///
/// The triangles are given as 3 lanes per vertex. Per lane the result is
/// the hit distance, or `0.0` on a miss. Degenerate (zero-area) padding
/// triangles never hit, so leaves with fewer than 4 triangles can pad with
/// zeroed lanes.
#[cfg(feature = "simd")]
pub fn triangle4_hit(
      p0 : [F32x4; 3], p1 : [F32x4; 3], p2 : [F32x4; 3]
    , origin : Vector, dir : Vector ) -> F32x4 {
  use packed_simd::f32x4;

  let to = |v : F32x4| f32x4::new( v.lanes[0], v.lanes[1], v.lanes[2], v.lanes[3] );

  let z_x4 = f32x4::splat( 0.0 );
  let one_x4 = f32x4::splat( 1.0 );
  let det_eps = f32x4::splat( 1e-8 );

  let ( p0x, p0y, p0z ) = ( to( p0[0] ), to( p0[1] ), to( p0[2] ) );
  let ( e1x, e1y, e1z ) = ( to( p1[0] ) - p0x, to( p1[1] ) - p0y, to( p1[2] ) - p0z );
  let ( e2x, e2y, e2z ) = ( to( p2[0] ) - p0x, to( p2[1] ) - p0y, to( p2[2] ) - p0z );

  // pvec = dir x e2
  let pvx = e2z * dir.y - e2y * dir.z;
  let pvy = e2x * dir.z - e2z * dir.x;
  let pvz = e2y * dir.x - e2x * dir.y;

  let det = e1x * pvx + e1y * pvy + e1z * pvz;
  let inv_det = one_x4 / det;

  let tvx = f32x4::splat( origin.x ) - p0x;
  let tvy = f32x4::splat( origin.y ) - p0y;
  let tvz = f32x4::splat( origin.z ) - p0z;

  let u = ( tvx * pvx + tvy * pvy + tvz * pvz ) * inv_det;

  // qvec = tvec x e1
  let qvx = tvy * e1z - tvz * e1y;
  let qvy = tvz * e1x - tvx * e1z;
  let qvz = tvx * e1y - tvy * e1x;

  let v = ( qvx * dir.x + qvy * dir.y + qvz * dir.z ) * inv_det;
  let t = ( e2x * qvx + e2y * qvy + e2z * qvz ) * inv_det;

  let valid = det.abs( ).gt( det_eps )
    & u.ge( z_x4 ) & u.le( one_x4 )
    & v.ge( z_x4 ) & ( u + v ).le( one_x4 )
    & t.gt( z_x4 );

  let r = valid.select( t, z_x4 );
  F32x4::new( r.extract( 0 ), r.extract( 1 ), r.extract( 2 ), r.extract( 3 ) )
}

/// See the `simd`-feature variant above; this is the scalar drop-in.
#[cfg(not(feature = "simd"))]
pub fn triangle4_hit(
      p0 : [F32x4; 3], p1 : [F32x4; 3], p2 : [F32x4; 3]
    , origin : Vector, dir : Vector ) -> F32x4 {
  let mut r = F32x4::ZERO;

  for i in 0..4 {
    let v0 = Vector::new( p0[0].lanes[ i ], p0[1].lanes[ i ], p0[2].lanes[ i ] );
    let v1 = Vector::new( p1[0].lanes[ i ], p1[1].lanes[ i ], p1[2].lanes[ i ] );
    let v2 = Vector::new( p2[0].lanes[ i ], p2[1].lanes[ i ], p2[2].lanes[ i ] );

    let e1 = v1 - v0;
    let e2 = v2 - v0;

    let pvec = dir.cross( e2 );
    let det = e1.dot( pvec );
    if det.abs( ) < 1e-8 {
      continue;
    }
    let inv_det = 1.0 / det;

    let tvec = origin - v0;
    let u = tvec.dot( pvec ) * inv_det;
    if u < 0.0 || u > 1.0 {
      continue;
    }

    let qvec = tvec.cross( e1 );
    let v = dir.dot( qvec ) * inv_det;
    if v < 0.0 || u + v > 1.0 {
      continue;
    }

    let t = e2.dot( qvec ) * inv_det;
    if t > 0.0 {
      r = r.replace( i, t );
    }
  }

  r
}
