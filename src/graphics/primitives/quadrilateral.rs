// Local imports
use crate::graphics::material::Material;
use crate::graphics::primitives::Triangle;
use crate::math::Vector;

/// A (planar) quadrilateral, described by its four corners in winding
/// order. It is not a primitive itself; it tesselates into two triangles.
#[derive(Debug,Clone)]
pub struct Quadrilateral {
  pub p1       : Vector,
  pub p2       : Vector,
  pub p3       : Vector,
  pub p4       : Vector,
  pub material : Material
}

impl Quadrilateral {
  pub fn new( p1 : Vector, p2 : Vector, p3 : Vector, p4 : Vector, material : Material ) -> Quadrilateral {
    Quadrilateral { p1, p2, p3, p4, material }
  }

  /// Splits the quadrilateral along the p1-p3 diagonal. Both triangles
  /// keep the quadrilateral's winding, so their normals agree.
  pub fn tesselate( &self ) -> [Triangle; 2] {
    quadrilateral_to_triangles( self.p1, self.p2, self.p3, self.p4, &self.material )
  }
}

pub fn quadrilateral_to_triangles( p1 : Vector, p2 : Vector, p3 : Vector, p4 : Vector, material : &Material ) -> [Triangle; 2] {
  [ Triangle::new( p1, p2, p3, material.clone( ) )
  , Triangle::new( p1, p3, p4, material.clone( ) )
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graphics::color::Color;
  use crate::graphics::primitives::triangle::triangle_normal;

  #[test]
  fn tesselation_preserves_winding( ) {
    // A unit quad in the xy-plane, counter-clockwise seen from +z
    let q = Quadrilateral::new(
      Vector::new( 0.0, 0.0, 0.0 )
    , Vector::new( 1.0, 0.0, 0.0 )
    , Vector::new( 1.0, 1.0, 0.0 )
    , Vector::new( 0.0, 1.0, 0.0 )
    , Material::diffuse( Color::WHITE ) );

    for t in q.tesselate( ).iter( ) {
      let n = triangle_normal( t.p0, t.p1, t.p2 );
      assert!( ( n - Vector::new( 0.0, 0.0, 1.0 ) ).length( ) < 1e-5 );
    }
  }

  #[test]
  fn tesselation_covers_the_quad( ) {
    let q = Quadrilateral::new(
      Vector::new( 0.0, 0.0, 0.0 )
    , Vector::new( 2.0, 0.0, 0.0 )
    , Vector::new( 2.0, 1.0, 0.0 )
    , Vector::new( 0.0, 1.0, 0.0 )
    , Material::diffuse( Color::WHITE ) );

    let area : f32 = q.tesselate( ).iter( ).map( |t| t.area( ) ).sum( );
    assert!( ( area - 2.0 ).abs( ) < 1e-4 );
  }
}
