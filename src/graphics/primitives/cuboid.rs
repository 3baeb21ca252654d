// Local imports
use crate::graphics::aabb::AABB;
use crate::graphics::material::Material;
use crate::graphics::primitives::quadrilateral::quadrilateral_to_triangles;
use crate::graphics::primitives::Triangle;
use crate::math::Vector;

/// An axis-aligned box that tesselates into 12 triangles.
/// Rotated boxes are made by instancing a cuboid with a rotation transform.
#[derive(Debug,Clone)]
pub struct Cuboid {
  pub aabb     : AABB,
  pub material : Material
}

impl Cuboid {
  pub fn new( aabb : AABB, material : Material ) -> Cuboid {
    Cuboid { aabb, material }
  }

  /// The 8 corners: t1-t4 the top face, b1-b4 the bottom face, with bN
  /// directly below tN
  fn corners( &self ) -> [Vector; 8] {
    let pmin = self.aabb.pmin;
    let pmax = self.aabb.pmax;
    [ Vector::new( pmin.x, pmax.y, pmax.z )   // t1
    , Vector::new( pmax.x, pmax.y, pmax.z )   // t2
    , Vector::new( pmax.x, pmax.y, pmin.z )   // t3
    , Vector::new( pmin.x, pmax.y, pmin.z )   // t4
    , Vector::new( pmin.x, pmin.y, pmax.z )   // b1
    , Vector::new( pmax.x, pmin.y, pmax.z )   // b2
    , Vector::new( pmax.x, pmin.y, pmin.z )   // b3
    , Vector::new( pmin.x, pmin.y, pmin.z )   // b4
    ]
  }

  /// Tesselates into 12 triangles whose normals point outward
  pub fn tesselate( &self ) -> Vec< Triangle > {
    let [ t1, t2, t3, t4, b1, b2, b3, b4 ] = self.corners( );
    let m = &self.material;

    let quads = [
      [ t1, t2, t3, t4 ]   // top,    +y
    , [ b4, b3, b2, b1 ]   // bottom, -y
    , [ t2, t1, b1, b2 ]   // front,  +z
    , [ t4, t3, b3, b4 ]   // back,   -z
    , [ t3, t2, b2, b3 ]   // right,  +x
    , [ t1, t4, b4, b1 ]   // left,   -x
    ];

    let mut triangles = Vec::with_capacity( 12 );
    for q in quads.iter( ) {
      let [ a, b ] = quadrilateral_to_triangles( q[ 0 ], q[ 1 ], q[ 2 ], q[ 3 ], m );
      triangles.push( a );
      triangles.push( b );
    }
    triangles
  }

  /// Tesselates with flipped winding so the normals point into the box.
  /// Used for rooms viewed from the inside.
  pub fn tesselate_inside_out( &self ) -> Vec< Triangle > {
    let [ t1, t2, t3, t4, b1, b2, b3, b4 ] = self.corners( );
    let m = &self.material;

    let quads = [
      [ t4, t3, t2, t1 ]
    , [ b1, b2, b3, b4 ]
    , [ b2, b1, t1, t2 ]
    , [ b4, b3, t3, t4 ]
    , [ b3, b2, t2, t3 ]
    , [ b1, b4, t4, t1 ]
    ];

    let mut triangles = Vec::with_capacity( 12 );
    for q in quads.iter( ) {
      let [ a, b ] = quadrilateral_to_triangles( q[ 0 ], q[ 1 ], q[ 2 ], q[ 3 ], m );
      triangles.push( a );
      triangles.push( b );
    }
    triangles
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graphics::color::Color;
  use crate::graphics::primitives::triangle::triangle_normal;

  fn unit_cube( ) -> Cuboid {
    Cuboid::new(
      AABB::new( Vector::new( -0.5, -0.5, -0.5 ), Vector::new( 0.5, 0.5, 0.5 ) )
    , Material::diffuse( Color::WHITE ) )
  }

  #[test]
  fn twelve_triangles( ) {
    assert_eq!( unit_cube( ).tesselate( ).len( ), 12 );
  }

  #[test]
  fn normals_point_away_from_the_center( ) {
    for t in unit_cube( ).tesselate( ) {
      let n = triangle_normal( t.p0, t.p1, t.p2 );
      let center_of_face = ( t.p0 + t.p1 + t.p2 ) / 3.0;
      assert!( n.dot( center_of_face ) > 0.0, "normal {:?} at {:?}", n, center_of_face );
    }
  }

  #[test]
  fn inside_out_normals_point_at_the_center( ) {
    for t in unit_cube( ).tesselate_inside_out( ) {
      let n = triangle_normal( t.p0, t.p1, t.p2 );
      let center_of_face = ( t.p0 + t.p1 + t.p2 ) / 3.0;
      assert!( n.dot( center_of_face ) < 0.0 );
    }
  }

  #[test]
  fn surface_area_of_unit_cube( ) {
    let area : f32 = unit_cube( ).tesselate( ).iter( ).map( |t| t.area( ) ).sum( );
    assert!( ( area - 6.0 ).abs( ) < 1e-4 );
  }
}
