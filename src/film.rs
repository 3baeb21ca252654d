// Local imports
use crate::graphics::Color;
use crate::math::clamp;

// Exports:
// * Film
// * ToneMap

/// Tone mapping applied when the linear film is read out as display
/// bytes. Path-traced samples are unbounded, so a plain clamp can crush
/// bright areas; these operators compress the range first.
#[derive(Copy,Clone,Debug,PartialEq)]
pub enum ToneMap {
  /// Clamp to [0,1] directly
  None,
  /// Reinhard global operator: `x / (1 + x)` per channel
  Reinhard,
  /// The ACES filmic curve (Narkowicz approximation)
  Aces
}

impl ToneMap {
  pub fn apply( self, c : Color ) -> Color {
    match self {
      ToneMap::None => c,
      ToneMap::Reinhard => {
        Color::new(
          c.red / ( 1.0 + c.red )
        , c.green / ( 1.0 + c.green )
        , c.blue / ( 1.0 + c.blue ) )
      },
      ToneMap::Aces => {
        Color::new( aces_channel( c.red ), aces_channel( c.green ), aces_channel( c.blue ) )
      }
    }
  }
}

// f(x) = (x(2.51x + 0.03)) / (x(2.43x + 0.59) + 0.14)
fn aces_channel( x : f32 ) -> f32 {
  clamp( ( x * ( 2.51 * x + 0.03 ) ) / ( x * ( 2.43 * x + 0.59 ) + 0.14 ), 0.0, 1.0 )
}

/// The 2D accumulator radiance samples are averaged into.
///
/// Pixels hold linear, unclamped color; clamping (and optional tone
/// mapping) happens only in `to_image`. Unwritten pixels stay black, which
/// makes partially rendered films well-defined.
pub struct Film {
  pub width  : u32,
  pub height : u32,
  pixels     : Vec< Color >
}

impl Film {
  pub fn new( width : u32, height : u32 ) -> Film {
    Film { width, height, pixels: vec![ Color::BLACK; ( width * height ) as usize ] }
  }

  pub fn set( &mut self, x : u32, y : u32, c : Color ) {
    self.pixels[ ( y * self.width + x ) as usize ] = c;
  }

  pub fn add( &mut self, x : u32, y : u32, c : Color ) {
    self.pixels[ ( y * self.width + x ) as usize ] += c;
  }

  pub fn pixel( &self, x : u32, y : u32 ) -> Color {
    self.pixels[ ( y * self.width + x ) as usize ]
  }

  /// Divides every pixel by the sample count; used when samples were
  /// accumulated with `add`
  pub fn divide_by_samples( &mut self, samples : usize ) {
    let inv = 1.0 / samples as f32;
    for p in self.pixels.iter_mut( ) {
      *p = *p * inv;
    }
  }

  /// The film as an RGBA8 buffer, row-major with y growing downward.
  /// Channels are clamped to [0,255] here and nowhere earlier.
  pub fn to_image( &self ) -> Vec< u8 > {
    self.to_image_mapped( ToneMap::None )
  }

  /// Like `to_image`, with a tone-map operator applied per pixel
  pub fn to_image_mapped( &self, tone : ToneMap ) -> Vec< u8 > {
    let mut buffer = Vec::with_capacity( self.pixels.len( ) * 4 );
    for p in self.pixels.iter( ) {
      let c = tone.apply( *p );
      buffer.push( c.r( ) );
      buffer.push( c.g( ) );
      buffer.push( c.b( ) );
      buffer.push( 255 );
    }
    buffer
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn unwritten_pixels_are_black( ) {
    let film = Film::new( 4, 4 );
    assert_eq!( film.pixel( 2, 3 ), Color::BLACK );
  }

  #[test]
  fn image_layout_is_row_major_rgba( ) {
    let mut film = Film::new( 2, 2 );
    film.set( 1, 0, Color::new( 1.0, 0.5, 0.0 ) );

    let img = film.to_image( );
    assert_eq!( img.len( ), 16 );
    // pixel (1,0) starts at byte 4
    assert_eq!( img[ 4 ], 255 );
    assert_eq!( img[ 5 ], 127 );
    assert_eq!( img[ 6 ], 0 );
    assert_eq!( img[ 7 ], 255 );
    // pixel (0,0) is untouched black with full alpha
    assert_eq!( &img[ 0..4 ], &[ 0, 0, 0, 255 ] );
  }

  #[test]
  fn readout_clamps_but_storage_does_not( ) {
    let mut film = Film::new( 1, 1 );
    film.set( 0, 0, Color::new( 7.0, -1.0, 0.5 ) );

    assert_eq!( film.pixel( 0, 0 ).red, 7.0 );
    let img = film.to_image( );
    assert_eq!( img[ 0 ], 255 );
    assert_eq!( img[ 1 ], 0 );
  }

  #[test]
  fn reinhard_compresses_into_unit_range( ) {
    let c = ToneMap::Reinhard.apply( Color::new( 9.0, 1.0, 0.0 ) );
    assert!( ( c.red - 0.9 ).abs( ) < 1e-5 );
    assert!( ( c.green - 0.5 ).abs( ) < 1e-5 );
    assert_eq!( c.blue, 0.0 );
  }

  #[test]
  fn aces_is_monotonic_and_bounded( ) {
    let mut prev = 0.0;
    for i in 0..100 {
      let v = aces_channel( i as f32 * 0.1 );
      assert!( v >= prev );
      assert!( v <= 1.0 );
      prev = v;
    }
  }

  #[test]
  fn divide_averages_accumulated_samples( ) {
    let mut film = Film::new( 1, 1 );
    film.add( 0, 0, Color::WHITE );
    film.add( 0, 0, Color::BLACK );
    film.divide_by_samples( 2 );
    assert_eq!( film.pixel( 0, 0 ), Color::new( 0.5, 0.5, 0.5 ) );
  }
}
