// External imports
use rand::Rng;
use std::f32::consts::PI;
// Local imports
use crate::graphics::color::Color;
use crate::graphics::primitives::Triangle;
use crate::math::{Vector, MAX_RAY_DISTANCE};

// Exports:
// * Light
// * LightSegment

/// A segment from a surface point towards a light source.
///
/// `distance` doubles as the shadow ray's maximum travel distance;
/// `radiance` is the light's color with distance attenuation applied.
#[derive(Copy,Clone,Debug)]
pub struct LightSegment {
  pub dir      : Vector,
  pub distance : f32,
  pub radiance : Color
}

/// The light sources a scene can hold
#[derive(Debug)]
pub enum Light {
  /// An infinitely small emitter radiating equally in all directions;
  /// intensity falls off with the sphere surface `4*pi*r^2`
  Point {
    origin    : Vector,
    color     : Color,
    intensity : f32
  },
  /// A light at infinity: parallel rays, no distance falloff
  Distant {
    direction : Vector,
    color     : Color,
    intensity : f32
  },
  /// A triangle with an emissive material. Also reachable through the
  /// scene's emitter list for next-event estimation.
  Area {
    triangle : Triangle
  }
}

impl Light {
  pub fn point( origin : Vector, color : Color, intensity : f32 ) -> Light {
    Light::Point { origin, color, intensity }
  }

  pub fn distant( direction : Vector, color : Color, intensity : f32 ) -> Light {
    Light::Distant { direction: direction.normalize( ), color, intensity }
  }

  pub fn area( triangle : Triangle ) -> Light {
    Light::Area { triangle }
  }

  /// The segment from `p` towards this light, with attenuated radiance.
  /// Area lights sample a uniform point on their triangle, which is why
  /// the caller's RNG comes along.
  pub fn segment< R : Rng >( &self, p : Vector, rng : &mut R ) -> LightSegment {
    match self {
      Light::Point { origin, color, intensity } => {
        let to_light = *origin - p;
        let distance = to_light.length( );
        LightSegment {
          dir:      to_light.normalize( ),
          distance,
          radiance: *color * ( intensity / ( 4.0 * PI * distance * distance ) )
        }
      },

      Light::Distant { direction, color, intensity } => {
        LightSegment {
          dir:      -*direction,
          distance: MAX_RAY_DISTANCE,
          radiance: *color * *intensity
        }
      },

      Light::Area { triangle } => {
        let q = triangle.sample_point( rng );
        let to_light = q - p;
        let d_sq = to_light.length_sq( );
        let distance = d_sq.sqrt( );
        let dir = to_light / distance;

        // Geometric falloff: emitter cosine times area over squared
        // distance. A surface behind the emitter receives nothing.
        let cos_l = triangle.surface_normal( q ).dot( -dir );
        let radiance =
          if cos_l <= 0.0 {
            Color::BLACK
          } else {
            triangle.material.emitted( ) * ( cos_l * triangle.area( ) / d_sq )
          };

        LightSegment { dir, distance, radiance }
      }
    }
  }
}
