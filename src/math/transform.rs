// External imports
use std::ops;
// Local imports
use crate::error::BuildError;
use crate::math::Vector;

/// A 4x4 matrix in row-major order
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct Matrix4x4 {
  pub m : [[f32; 4]; 4]
}

/// An affine transformation of 3-dimensional space
///
/// The inverse is computed once at construction and carried along, so
/// inverting a transform is free and transforming normals (which needs the
/// inverse transpose) costs no extra work at trace time.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct Transform {
  m     : Matrix4x4,
  m_inv : Matrix4x4
}

impl Matrix4x4 {
  pub const IDENTITY: Matrix4x4 = Matrix4x4 {
    m: [ [ 1.0, 0.0, 0.0, 0.0 ]
       , [ 0.0, 1.0, 0.0, 0.0 ]
       , [ 0.0, 0.0, 1.0, 0.0 ]
       , [ 0.0, 0.0, 0.0, 1.0 ]
       ]
  };

  pub fn new( m : [[f32; 4]; 4] ) -> Matrix4x4 {
    Matrix4x4 { m }
  }

  pub fn multiply( &self, o : &Matrix4x4 ) -> Matrix4x4 {
    let mut r = [[0.0_f32; 4]; 4];
    for i in 0..4 {
      for j in 0..4 {
        r[ i ][ j ] =
            self.m[ i ][ 0 ] * o.m[ 0 ][ j ]
          + self.m[ i ][ 1 ] * o.m[ 1 ][ j ]
          + self.m[ i ][ 2 ] * o.m[ 2 ][ j ]
          + self.m[ i ][ 3 ] * o.m[ 3 ][ j ];
      }
    }
    Matrix4x4::new( r )
  }

  pub fn transpose( &self ) -> Matrix4x4 {
    let m = &self.m;
    Matrix4x4::new(
      [ [ m[0][0], m[1][0], m[2][0], m[3][0] ]
      , [ m[0][1], m[1][1], m[2][1], m[3][1] ]
      , [ m[0][2], m[1][2], m[2][2], m[3][2] ]
      , [ m[0][3], m[1][3], m[2][3], m[3][3] ]
      ] )
  }

  pub fn determinant( &self ) -> f32 {
    let m = &self.m;

    // Cofactor expansion along the first row, with the six 2x2
    // sub-determinants of the lower two rows factored out
    let s0 = m[2][0] * m[3][1] - m[2][1] * m[3][0];
    let s1 = m[2][0] * m[3][2] - m[2][2] * m[3][0];
    let s2 = m[2][0] * m[3][3] - m[2][3] * m[3][0];
    let s3 = m[2][1] * m[3][2] - m[2][2] * m[3][1];
    let s4 = m[2][1] * m[3][3] - m[2][3] * m[3][1];
    let s5 = m[2][2] * m[3][3] - m[2][3] * m[3][2];

    let c0 = m[1][1] * s5 - m[1][2] * s4 + m[1][3] * s3;
    let c1 = m[1][0] * s5 - m[1][2] * s2 + m[1][3] * s1;
    let c2 = m[1][0] * s4 - m[1][1] * s2 + m[1][3] * s0;
    let c3 = m[1][0] * s3 - m[1][1] * s1 + m[1][2] * s0;

    m[0][0] * c0 - m[0][1] * c1 + m[0][2] * c2 - m[0][3] * c3
  }

  /// Computes the inverse by the adjugate formula.
  /// Returns `None` for a singular matrix.
  pub fn inverse( &self ) -> Option< Matrix4x4 > {
    let d = self.determinant( );
    if d == 0.0 {
      return None;
    }
    let m = &self.m;
    let mut r = [[0.0_f32; 4]; 4];

    r[0][0] = ( m[1][2]*m[2][3]*m[3][1] - m[1][3]*m[2][2]*m[3][1] + m[1][3]*m[2][1]*m[3][2] - m[1][1]*m[2][3]*m[3][2] - m[1][2]*m[2][1]*m[3][3] + m[1][1]*m[2][2]*m[3][3] ) / d;
    r[0][1] = ( m[0][3]*m[2][2]*m[3][1] - m[0][2]*m[2][3]*m[3][1] - m[0][3]*m[2][1]*m[3][2] + m[0][1]*m[2][3]*m[3][2] + m[0][2]*m[2][1]*m[3][3] - m[0][1]*m[2][2]*m[3][3] ) / d;
    r[0][2] = ( m[0][2]*m[1][3]*m[3][1] - m[0][3]*m[1][2]*m[3][1] + m[0][3]*m[1][1]*m[3][2] - m[0][1]*m[1][3]*m[3][2] - m[0][2]*m[1][1]*m[3][3] + m[0][1]*m[1][2]*m[3][3] ) / d;
    r[0][3] = ( m[0][3]*m[1][2]*m[2][1] - m[0][2]*m[1][3]*m[2][1] - m[0][3]*m[1][1]*m[2][2] + m[0][1]*m[1][3]*m[2][2] + m[0][2]*m[1][1]*m[2][3] - m[0][1]*m[1][2]*m[2][3] ) / d;
    r[1][0] = ( m[1][3]*m[2][2]*m[3][0] - m[1][2]*m[2][3]*m[3][0] - m[1][3]*m[2][0]*m[3][2] + m[1][0]*m[2][3]*m[3][2] + m[1][2]*m[2][0]*m[3][3] - m[1][0]*m[2][2]*m[3][3] ) / d;
    r[1][1] = ( m[0][2]*m[2][3]*m[3][0] - m[0][3]*m[2][2]*m[3][0] + m[0][3]*m[2][0]*m[3][2] - m[0][0]*m[2][3]*m[3][2] - m[0][2]*m[2][0]*m[3][3] + m[0][0]*m[2][2]*m[3][3] ) / d;
    r[1][2] = ( m[0][3]*m[1][2]*m[3][0] - m[0][2]*m[1][3]*m[3][0] - m[0][3]*m[1][0]*m[3][2] + m[0][0]*m[1][3]*m[3][2] + m[0][2]*m[1][0]*m[3][3] - m[0][0]*m[1][2]*m[3][3] ) / d;
    r[1][3] = ( m[0][2]*m[1][3]*m[2][0] - m[0][3]*m[1][2]*m[2][0] + m[0][3]*m[1][0]*m[2][2] - m[0][0]*m[1][3]*m[2][2] - m[0][2]*m[1][0]*m[2][3] + m[0][0]*m[1][2]*m[2][3] ) / d;
    r[2][0] = ( m[1][1]*m[2][3]*m[3][0] - m[1][3]*m[2][1]*m[3][0] + m[1][3]*m[2][0]*m[3][1] - m[1][0]*m[2][3]*m[3][1] - m[1][1]*m[2][0]*m[3][3] + m[1][0]*m[2][1]*m[3][3] ) / d;
    r[2][1] = ( m[0][3]*m[2][1]*m[3][0] - m[0][1]*m[2][3]*m[3][0] - m[0][3]*m[2][0]*m[3][1] + m[0][0]*m[2][3]*m[3][1] + m[0][1]*m[2][0]*m[3][3] - m[0][0]*m[2][1]*m[3][3] ) / d;
    r[2][2] = ( m[0][1]*m[1][3]*m[3][0] - m[0][3]*m[1][1]*m[3][0] + m[0][3]*m[1][0]*m[3][1] - m[0][0]*m[1][3]*m[3][1] - m[0][1]*m[1][0]*m[3][3] + m[0][0]*m[1][1]*m[3][3] ) / d;
    r[2][3] = ( m[0][3]*m[1][1]*m[2][0] - m[0][1]*m[1][3]*m[2][0] - m[0][3]*m[1][0]*m[2][1] + m[0][0]*m[1][3]*m[2][1] + m[0][1]*m[1][0]*m[2][3] - m[0][0]*m[1][1]*m[2][3] ) / d;
    r[3][0] = ( m[1][2]*m[2][1]*m[3][0] - m[1][1]*m[2][2]*m[3][0] - m[1][2]*m[2][0]*m[3][1] + m[1][0]*m[2][2]*m[3][1] + m[1][1]*m[2][0]*m[3][2] - m[1][0]*m[2][1]*m[3][2] ) / d;
    r[3][1] = ( m[0][1]*m[2][2]*m[3][0] - m[0][2]*m[2][1]*m[3][0] + m[0][2]*m[2][0]*m[3][1] - m[0][0]*m[2][2]*m[3][1] - m[0][1]*m[2][0]*m[3][2] + m[0][0]*m[2][1]*m[3][2] ) / d;
    r[3][2] = ( m[0][2]*m[1][1]*m[3][0] - m[0][1]*m[1][2]*m[3][0] - m[0][2]*m[1][0]*m[3][1] + m[0][0]*m[1][2]*m[3][1] + m[0][1]*m[1][0]*m[3][2] - m[0][0]*m[1][1]*m[3][2] ) / d;
    r[3][3] = ( m[0][1]*m[1][2]*m[2][0] - m[0][2]*m[1][1]*m[2][0] + m[0][2]*m[1][0]*m[2][1] - m[0][0]*m[1][2]*m[2][1] - m[0][1]*m[1][0]*m[2][2] + m[0][0]*m[1][1]*m[2][2] ) / d;

    Some( Matrix4x4::new( r ) )
  }
}

impl Transform {
  pub const IDENTITY: Transform = Transform {
    m:     Matrix4x4::IDENTITY,
    m_inv: Matrix4x4::IDENTITY
  };

  /// Constructs a transform from an arbitrary matrix, computing its inverse.
  /// Fails on singular matrices.
  pub fn new( m : Matrix4x4 ) -> Result< Transform, BuildError > {
    match m.inverse( ) {
      Some( m_inv ) => Ok( Transform { m, m_inv } ),
      None => {
        log::warn!( "refusing to build a transform from a singular matrix" );
        Err( BuildError::SingularTransform )
      }
    }
  }

  pub fn translate( delta : Vector ) -> Transform {
    Transform {
      m: Matrix4x4::new(
        [ [ 1.0, 0.0, 0.0, delta.x ]
        , [ 0.0, 1.0, 0.0, delta.y ]
        , [ 0.0, 0.0, 1.0, delta.z ]
        , [ 0.0, 0.0, 0.0, 1.0 ]
        ] ),
      m_inv: Matrix4x4::new(
        [ [ 1.0, 0.0, 0.0, -delta.x ]
        , [ 0.0, 1.0, 0.0, -delta.y ]
        , [ 0.0, 0.0, 1.0, -delta.z ]
        , [ 0.0, 0.0, 0.0, 1.0 ]
        ] )
    }
  }

  pub fn scale( x : f32, y : f32, z : f32 ) -> Result< Transform, BuildError > {
    if x == 0.0 || y == 0.0 || z == 0.0 {
      log::warn!( "scaling by zero along an axis ({}, {}, {})", x, y, z );
      return Err( BuildError::ZeroScale );
    }
    Ok( Transform {
      m: Matrix4x4::new(
        [ [ x,   0.0, 0.0, 0.0 ]
        , [ 0.0, y,   0.0, 0.0 ]
        , [ 0.0, 0.0, z,   0.0 ]
        , [ 0.0, 0.0, 0.0, 1.0 ]
        ] ),
      m_inv: Matrix4x4::new(
        [ [ 1.0 / x, 0.0,     0.0,     0.0 ]
        , [ 0.0,     1.0 / y, 0.0,     0.0 ]
        , [ 0.0,     0.0,     1.0 / z, 0.0 ]
        , [ 0.0,     0.0,     0.0,     1.0 ]
        ] )
    } )
  }

  pub fn scale_uniform( s : f32 ) -> Result< Transform, BuildError > {
    Transform::scale( s, s, s )
  }

  /// Rotation around the x-axis. `theta` is in radians.
  pub fn rotate_x( theta : f32 ) -> Transform {
    let s = theta.sin( );
    let c = theta.cos( );
    let m = Matrix4x4::new(
      [ [ 1.0, 0.0, 0.0, 0.0 ]
      , [ 0.0, c,   -s,  0.0 ]
      , [ 0.0, s,   c,   0.0 ]
      , [ 0.0, 0.0, 0.0, 1.0 ]
      ] );
    // A rotation matrix is orthogonal; its inverse is its transpose
    Transform { m, m_inv: m.transpose( ) }
  }

  /// Rotation around the y-axis. `theta` is in radians.
  pub fn rotate_y( theta : f32 ) -> Transform {
    let s = theta.sin( );
    let c = theta.cos( );
    let m = Matrix4x4::new(
      [ [ c,   0.0, s,   0.0 ]
      , [ 0.0, 1.0, 0.0, 0.0 ]
      , [ -s,  0.0, c,   0.0 ]
      , [ 0.0, 0.0, 0.0, 1.0 ]
      ] );
    Transform { m, m_inv: m.transpose( ) }
  }

  /// Rotation around the z-axis. `theta` is in radians.
  pub fn rotate_z( theta : f32 ) -> Transform {
    let s = theta.sin( );
    let c = theta.cos( );
    let m = Matrix4x4::new(
      [ [ c,   -s,  0.0, 0.0 ]
      , [ s,   c,   0.0, 0.0 ]
      , [ 0.0, 0.0, 1.0, 0.0 ]
      , [ 0.0, 0.0, 0.0, 1.0 ]
      ] );
    Transform { m, m_inv: m.transpose( ) }
  }

  /// Rotation of `theta` radians around an arbitrary axis
  pub fn rotate( theta : f32, axis : Vector ) -> Transform {
    let v = axis.normalize( );
    let s = theta.sin( );
    let c = theta.cos( );
    let mc = 1.0 - c;
    let m = Matrix4x4::new(
      [ [ mc*v.x*v.x + c,       mc*v.x*v.y - v.z*s,   mc*v.z*v.x + v.y*s,   0.0 ]
      , [ mc*v.x*v.y + v.z*s,   mc*v.y*v.y + c,       mc*v.y*v.z - v.x*s,   0.0 ]
      , [ mc*v.z*v.x - v.y*s,   mc*v.y*v.z + v.x*s,   mc*v.z*v.z + c,       0.0 ]
      , [ 0.0,                  0.0,                  0.0,                  1.0 ]
      ] );
    Transform { m, m_inv: m.transpose( ) }
  }

  /// The perspective projection with the given field of view (in radians)
  /// and near/far clip distances. Projects camera space onto the z=1
  /// plane, with the field of view normalized to [-1,1].
  pub fn perspective( fov : f32, near : f32, far : f32 ) -> Result< Transform, BuildError > {
    let persp = Matrix4x4::new(
      [ [ 1.0, 0.0, 0.0,                  0.0 ]
      , [ 0.0, 1.0, 0.0,                  0.0 ]
      , [ 0.0, 0.0, far / ( far - near ), -far * near / ( far - near ) ]
      , [ 0.0, 0.0, 1.0,                  0.0 ]
      ] );
    let inv_tan = 1.0 / ( fov / 2.0 ).tan( );
    Ok( Transform::scale( inv_tan, inv_tan, 1.0 )?.compose( &Transform::new( persp )? ) )
  }

  /// Builds the camera-to-world transform for a camera at `from` looking
  /// towards `to`. Fails when the viewing direction is parallel to `up`.
  pub fn look_at( from : Vector, to : Vector, up : Vector ) -> Result< Transform, BuildError > {
    let dir    = ( to - from ).normalize( );
    let right  = up.normalize( ).cross( dir ).normalize( );
    let new_up = dir.cross( right );

    let m = Matrix4x4::new(
      [ [ right.x, new_up.x, dir.x, from.x ]
      , [ right.y, new_up.y, dir.y, from.y ]
      , [ right.z, new_up.z, dir.z, from.z ]
      , [ 0.0,     0.0,      0.0,   1.0 ]
      ] );
    Transform::new( m )
  }

  /// Transforms a point, dividing by the homogeneous coordinate when needed
  pub fn point( &self, p : Vector ) -> Vector {
    let m = &self.m.m;
    let ( x, y, z ) = ( p.x, p.y, p.z );
    let pp = Vector::new(
      m[0][0]*x + m[0][1]*y + m[0][2]*z + m[0][3]
    , m[1][0]*x + m[1][1]*y + m[1][2]*z + m[1][3]
    , m[2][0]*x + m[2][1]*y + m[2][2]*z + m[2][3]
    );
    let wp = m[3][0]*x + m[3][1]*y + m[3][2]*z + m[3][3];
    if wp == 1.0 || wp == 0.0 {
      pp
    } else {
      pp * ( 1.0 / wp )
    }
  }

  /// Transforms a direction. Translation does not apply to directions.
  pub fn vector( &self, v : Vector ) -> Vector {
    let m = &self.m.m;
    let ( x, y, z ) = ( v.x, v.y, v.z );
    Vector::new(
      m[0][0]*x + m[0][1]*y + m[0][2]*z
    , m[1][0]*x + m[1][1]*y + m[1][2]*z
    , m[2][0]*x + m[2][1]*y + m[2][2]*z
    )
  }

  /// Transforms a surface normal, which must use the inverse transpose to
  /// stay perpendicular under non-uniform scaling
  pub fn normal( &self, n : Vector ) -> Vector {
    let mi = &self.m_inv.m;
    let ( x, y, z ) = ( n.x, n.y, n.z );
    Vector::new(
      mi[0][0]*x + mi[1][0]*y + mi[2][0]*z
    , mi[0][1]*x + mi[1][1]*y + mi[2][1]*z
    , mi[0][2]*x + mi[1][2]*y + mi[2][2]*z
    )
  }

  /// Composes two transforms: `self` is applied after `t2`.
  /// For invertible matrices (AB)^-1 = B^-1 A^-1.
  pub fn compose( &self, t2 : &Transform ) -> Transform {
    Transform {
      m:     self.m.multiply( &t2.m ),
      m_inv: t2.m_inv.multiply( &self.m_inv )
    }
  }

  /// The inverse transform; free, as both matrices are carried along
  pub fn inverse( &self ) -> Transform {
    Transform { m: self.m_inv, m_inv: self.m }
  }

  pub fn matrix( &self ) -> &Matrix4x4 {
    &self.m
  }
}

impl ops::Mul< Transform > for Transform {
  type Output = Transform;

  fn mul( self, rhs : Transform ) -> Transform {
    self.compose( &rhs )
  }
}
