// External imports
use std::fmt;
use std::sync::Arc;
// Local imports
use crate::graphics::color::Color;
use crate::graphics::ray::SurfaceInteraction;
use crate::math::{clamp, Vector};

// Textures map a surface parametrisation to albedo
//
// Exports:
// * Image
// * Texture

/// An RGB pixel buffer sampled by `Texture::Image`
#[derive(Clone)]
pub struct Image {
  pub width  : u32,
  pub height : u32,
  data       : Vec< Color >
}

impl Image {
  /// Creates a black image of the provided size
  pub fn new( width : u32, height : u32 ) -> Image {
    Image { width, height, data: vec![ Color::BLACK; ( width * height ) as usize ] }
  }

  pub fn set( &mut self, x : u32, y : u32, c : Color ) {
    self.data[ ( y * self.width + x ) as usize ] = c;
  }

  /// The pixel at (x,y), clamped to the image bounds
  pub fn at( &self, x : i64, y : i64 ) -> Color {
    let cx = x.max( 0 ).min( self.width as i64 - 1 ) as u32;
    let cy = y.max( 0 ).min( self.height as i64 - 1 ) as u32;
    self.data[ ( cy * self.width + cx ) as usize ]
  }
}

/// A function from surface interaction to (u,v) parametrisation
pub type UvFn = Arc< dyn Fn( &SurfaceInteraction ) -> (f32, f32) + Send + Sync >;
/// A function from (u,v) to a point in texture space
pub type MappingFn = fn( f32, f32 ) -> Vector;
/// A function from texture space to color
pub type ColorFn = Arc< dyn Fn( Vector ) -> Color + Send + Sync >;

/// A texture over a surface
///
/// The closed variants read the primitive's own (u,v) parametrisation;
/// `Generic` composes an arbitrary uv-function, mapping-function and
/// color-function, which is the open extension point for plug-in textures.
#[derive(Clone)]
pub enum Texture {
  Constant { color : Color },
  Image { image : Arc< Image > },
  Checkerboard { frequency : u32 },
  Generic {
    uv_fn      : UvFn,
    mapping_fn : MappingFn,
    color_fn   : ColorFn
  }
}

impl Texture {
  pub fn constant( color : Color ) -> Texture {
    Texture::Constant { color }
  }

  pub fn image( image : Arc< Image > ) -> Texture {
    Texture::Image { image }
  }

  pub fn checkerboard( frequency : u32 ) -> Texture {
    Texture::Checkerboard { frequency }
  }

  pub fn generic( uv_fn : UvFn, mapping_fn : MappingFn, color_fn : ColorFn ) -> Texture {
    Texture::Generic { uv_fn, mapping_fn, color_fn }
  }

  /// A debug texture that renders the (u,v) parametrisation itself
  pub fn uv_debug( ) -> Texture {
    Texture::Generic {
      uv_fn:      Arc::new( |si : &SurfaceInteraction| si.uv( ) ),
      mapping_fn: |u, v| Vector::new( u, v, 0.0 ),
      color_fn:   Arc::new( |st| Color::new( st.x, st.y, 0.0 ) )
    }
  }

  /// Evaluates the texture at the interaction's surface point
  pub fn sample( &self, si : &SurfaceInteraction ) -> Color {
    match self {
      Texture::Constant { color } => *color,

      Texture::Image { image } => {
        let ( u, v ) = si.uv( );
        // (0,0) in uv space is the bottom left, but row 0 of the image is
        // its top row, so the vertical axis flips
        let x = ( clamp( u, 0.0, 1.0 ) * image.width as f32 ).floor( ) as i64;
        let y = ( ( 1.0 - clamp( v, 0.0, 1.0 ) ) * image.height as f32 ).floor( ) as i64;
        image.at( x, y )
      },

      Texture::Checkerboard { frequency } => {
        let ( u, v ) = si.uv( );
        let s = ( 2.0 * *frequency as f32 * u ).floor( ) as i64;
        let t = ( 2.0 * *frequency as f32 * v ).floor( ) as i64;
        if ( s + t ).rem_euclid( 2 ) == 0 {
          Color::WHITE
        } else {
          Color::BLACK
        }
      },

      Texture::Generic { uv_fn, mapping_fn, color_fn } => {
        let ( u, v ) = uv_fn( si );
        let st = mapping_fn( u, v );
        color_fn( st )
      }
    }
  }
}

impl fmt::Debug for Texture {
  fn fmt( &self, f : &mut fmt::Formatter< '_ > ) -> fmt::Result {
    match self {
      Texture::Constant { color } =>
        write!( f, "Texture::Constant {{ color: {:?} }}", color ),
      Texture::Image { image } =>
        write!( f, "Texture::Image {{ width: {}, height: {} }}", image.width, image.height ),
      Texture::Checkerboard { frequency } =>
        write!( f, "Texture::Checkerboard {{ frequency: {} }}", frequency ),
      Texture::Generic { .. } =>
        write!( f, "Texture::Generic" )
    }
  }
}
