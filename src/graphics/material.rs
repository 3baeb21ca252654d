// External imports
use rand::Rng;
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;
// Local imports
use crate::graphics::color::Color;
use crate::graphics::ray::SurfaceInteraction;
use crate::graphics::texture::Texture;
use crate::math::Vector;

// Exports:
// * Material
// * NormalFn

/// A function producing a replacement shading normal at an interaction
pub type NormalFn = Arc< dyn Fn( &SurfaceInteraction ) -> Vector + Send + Sync >;
/// A function producing a color straight from an interaction (debug use)
pub type InteractionColorFn = Arc< dyn Fn( &SurfaceInteraction ) -> Color + Send + Sync >;

/// The visual characteristics of a surface
///
/// Materials are immutable once the scene is built; every operation here is
/// a pure function of the interaction (and, for sampling, the worker's RNG).
#[derive(Clone)]
pub enum Material {
  /// A Lambertian surface with a textured albedo
  Diffuse { texture : Texture },
  /// A light-emitting surface. The color carries the intensity, so it may
  /// exceed (1,1,1).
  Radiant { color : Color },
  /// A perfect mirror
  Reflective,
  /// Wraps another material, replacing the shading normal before the inner
  /// material is evaluated
  NormalMapped { inner : Box< Material >, normal_fn : NormalFn },
  /// Renders an arbitrary function of the interaction. Used for
  /// visualising normals and parametrisations.
  PositionFn { color_fn : InteractionColorFn }
}

impl Material {
  /// A diffuse material with a constant albedo
  pub fn diffuse( color : Color ) -> Material {
    Material::Diffuse { texture: Texture::constant( color ) }
  }

  /// A diffuse material sampling its albedo from a texture
  pub fn diffuse_texture( texture : Texture ) -> Material {
    Material::Diffuse { texture }
  }

  /// A light-emitting material
  pub fn radiant( color : Color ) -> Material {
    Material::Radiant { color }
  }

  /// A perfect mirror
  pub fn reflective( ) -> Material {
    Material::Reflective
  }

  pub fn normal_mapped( inner : Material, normal_fn : NormalFn ) -> Material {
    Material::NormalMapped { inner: Box::new( inner ), normal_fn }
  }

  /// Normal mapping by barycentric interpolation of the mesh's per-vertex
  /// normals. Falls back to the geometric normal away from a mesh.
  pub fn interpolated_normal_mapped( inner : Material ) -> Material {
    Material::normal_mapped( inner, Arc::new( |si : &SurfaceInteraction| {
      match si.surface {
        crate::graphics::ray::Surface::MeshTriangle( t ) =>
          t.interpolated_normal( si.object_point ).unwrap_or( si.object_normal ),
        _ => si.object_normal
      }
    } ) )
  }

  pub fn position_fn( color_fn : InteractionColorFn ) -> Material {
    Material::PositionFn { color_fn }
  }

  /// True for light-emitting materials
  pub fn is_emissive( &self ) -> bool {
    match self {
      Material::Radiant { .. } => true,
      Material::NormalMapped { inner, .. } => inner.is_emissive( ),
      _ => false
    }
  }

  /// The emitted radiance; black for non-emissive materials
  pub fn emitted( &self ) -> Color {
    match self {
      Material::Radiant { color } => *color,
      Material::NormalMapped { inner, .. } => inner.emitted( ),
      _ => Color::BLACK
    }
  }

  /// Unwraps normal-mapping layers, replacing the interaction's shading
  /// normal along the way, and returns the innermost material
  pub fn resolve< 'a >( &'a self, si : &mut SurfaceInteraction ) -> &'a Material {
    let mut mat = self;
    while let Material::NormalMapped { inner, normal_fn } = mat {
      si.normal = normal_fn( si ).normalize( );
      mat = &**inner;
    }
    mat
  }

  /// The surface albedo at the interaction
  pub fn albedo( &self, si : &SurfaceInteraction ) -> Color {
    match self {
      Material::Diffuse { texture } => texture.sample( si ),
      Material::Radiant { color } => *color,
      Material::Reflective => Color::WHITE,
      Material::NormalMapped { inner, .. } => inner.albedo( si ),
      Material::PositionFn { color_fn } => color_fn( si )
    }
  }

  /// The BRDF for light arriving along the sampled direction.
  /// Lambertian surfaces reflect `albedo / pi`; the mirror passes its
  /// (deterministic) sample through unattenuated.
  pub fn brdf( &self, si : &SurfaceInteraction ) -> Color {
    match self {
      Material::Reflective => Color::WHITE,
      _ => self.albedo( si ) * ( 1.0 / PI )
    }
  }

  /// Samples an outgoing direction for the next path segment, with the
  /// probability density of that choice.
  ///
  /// Diffuse surfaces sample the hemisphere around the shading normal
  /// uniformly (pdf `1/2pi`); the mirror is deterministic (pdf 1).
  pub fn sample_direction< R : Rng >( &self, rng : &mut R, si : &SurfaceInteraction ) -> (Vector, f32) {
    match self {
      Material::Reflective => {
        ( si.incident.reflect( si.normal ).normalize( ), 1.0 )
      },
      _ => {
        let dir = uniform_hemisphere( rng, si.normal );
        ( dir, 1.0 / ( 2.0 * PI ) )
      }
    }
  }
}

/// Uniformly samples a direction on the hemisphere around `normal`
fn uniform_hemisphere< R : Rng >( rng : &mut R, normal : Vector ) -> Vector {
  let r1 : f32 = rng.gen( );
  let r2 : f32 = rng.gen( );

  let z = r1;
  let r = ( 1.0 - z * z ).max( 0.0 ).sqrt( );
  let phi = 2.0 * PI * r2;

  let ( t, b ) = orthonormal_basis( normal );
  ( t * ( r * phi.cos( ) ) + b * ( r * phi.sin( ) ) + normal * z ).normalize( )
}

/// Builds two unit tangents completing `n` to an orthonormal basis
fn orthonormal_basis( n : Vector ) -> (Vector, Vector) {
  let helper =
    if n.x.abs( ) > 0.9 {
      Vector::new( 0.0, 1.0, 0.0 )
    } else {
      Vector::new( 1.0, 0.0, 0.0 )
    };
  let t = n.cross( helper ).normalize( );
  let b = n.cross( t );
  ( t, b )
}

impl fmt::Debug for Material {
  fn fmt( &self, f : &mut fmt::Formatter< '_ > ) -> fmt::Result {
    match self {
      Material::Diffuse { texture } =>
        write!( f, "Material::Diffuse {{ texture: {:?} }}", texture ),
      Material::Radiant { color } =>
        write!( f, "Material::Radiant {{ color: {:?} }}", color ),
      Material::Reflective =>
        write!( f, "Material::Reflective" ),
      Material::NormalMapped { inner, .. } =>
        write!( f, "Material::NormalMapped {{ inner: {:?} }}", inner ),
      Material::PositionFn { .. } =>
        write!( f, "Material::PositionFn" )
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::SmallRng;
  use rand::SeedableRng;

  #[test]
  fn hemisphere_samples_lie_above_the_surface( ) {
    let mut rng = SmallRng::seed_from_u64( 7 );
    let normal = Vector::new( 0.3, -0.8, 0.1 ).normalize( );

    for _ in 0..200 {
      let dir = uniform_hemisphere( &mut rng, normal );
      assert!( ( dir.length( ) - 1.0 ).abs( ) < 1e-4 );
      assert!( dir.dot( normal ) >= 0.0 );
    }
  }

  #[test]
  fn basis_is_orthonormal( ) {
    for n in [ Vector::new( 0.0, 1.0, 0.0 ), Vector::new( 1.0, 0.0, 0.0 ), Vector::new( -0.5, 0.3, 0.9 ).normalize( ) ] {
      let ( t, b ) = orthonormal_basis( n );
      assert!( t.dot( n ).abs( ) < 1e-5 );
      assert!( b.dot( n ).abs( ) < 1e-5 );
      assert!( t.dot( b ).abs( ) < 1e-5 );
      assert!( ( t.length( ) - 1.0 ).abs( ) < 1e-4 );
      assert!( ( b.length( ) - 1.0 ).abs( ) < 1e-4 );
    }
  }

  #[test]
  fn radiant_is_emissive( ) {
    assert!( Material::radiant( Color::WHITE ).is_emissive( ) );
    assert!( !Material::diffuse( Color::WHITE ).is_emissive( ) );
    assert_eq!( Material::radiant( Color::WHITE * 5.0 ).emitted( ), Color::new( 5.0, 5.0, 5.0 ) );
  }
}
