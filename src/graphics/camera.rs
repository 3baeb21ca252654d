// Local imports
use crate::error::BuildError;
use crate::graphics::ray::Ray;
use crate::math::{Transform, Vector};

// Exports:
// * Camera
// * Projection

#[derive(Copy,Clone,Debug,PartialEq)]
pub enum Projection {
  Perspective,
  Orthographic
}

/// A projective camera generating world-space rays from raster coordinates.
///
/// `camera_to_screen * screen_to_raster` is precomposed into
/// `raster_to_camera` once at construction; `pixel_ray` is then two matrix
/// applications and a normalize. The screen window is normalized to the
/// longer image axis, preserving aspect.
#[derive(Debug)]
pub struct Camera {
  pub width        : u32,
  pub height       : u32,
  projection       : Projection,
  camera_to_world  : Transform,
  raster_to_camera : Transform
}

impl Camera {
  /// A perspective camera with the given field of view (radians, across
  /// the longer image axis), placed at the origin looking along +z until
  /// `look_at` repositions it
  pub fn new_perspective( width : u32, height : u32, fov : f32 ) -> Result< Camera, BuildError > {
    let camera_to_screen = Transform::perspective( fov, 1e-2, 1000.0 )?;
    let raster_to_screen = screen_to_raster( width, height )?.inverse( );
    Ok( Camera {
      width,
      height,
      projection:       Projection::Perspective,
      camera_to_world:  Transform::IDENTITY,
      raster_to_camera: camera_to_screen.inverse( ).compose( &raster_to_screen )
    } )
  }

  /// An orthographic camera: parallel rays along +z
  pub fn new_orthographic( width : u32, height : u32 ) -> Result< Camera, BuildError > {
    // The orthographic camera-to-screen over a [0,1) depth range is the
    // identity, leaving only the raster mapping
    let raster_to_screen = screen_to_raster( width, height )?.inverse( );
    Ok( Camera {
      width,
      height,
      projection:       Projection::Orthographic,
      camera_to_world:  Transform::IDENTITY,
      raster_to_camera: raster_to_screen
    } )
  }

  /// Repositions the camera at `from`, looking towards `to`
  pub fn look_at( &mut self, from : Vector, to : Vector, up : Vector ) -> Result< (), BuildError > {
    self.camera_to_world = Transform::look_at( from, to, up )?;
    Ok( () )
  }

  /// The world-space ray through the raster position (x,y); fractional
  /// positions address subpixel offsets
  pub fn pixel_ray( &self, x : f32, y : f32 ) -> Ray {
    let p_camera = self.raster_to_camera.point( Vector::new( x, y, 0.0 ) );

    match self.projection {
      Projection::Perspective => {
        let origin = self.camera_to_world.point( Vector::ZERO );
        let dir = self.camera_to_world.vector( p_camera );
        Ray::new( origin, dir )
      },
      Projection::Orthographic => {
        let origin = self.camera_to_world.point( p_camera );
        let dir = self.camera_to_world.vector( Vector::new( 0.0, 0.0, 1.0 ) );
        Ray::new( origin, dir )
      }
    }
  }
}

/// The screen-to-raster transform: the screen window (the longer axis
/// spanning [-1,1], the shorter scaled by aspect) to raster coordinates
/// with y growing downward
fn screen_to_raster( width : u32, height : u32 ) -> Result< Transform, BuildError > {
  let w = width as f32;
  let h = height as f32;
  let ( sx, sy ) =
    if w >= h {
      ( 1.0, h / w )
    } else {
      ( w / h, 1.0 )
    };

  // screen (x0,y0)-(x1,y1), y up  ->  raster (0,0)-(w,h), y down
  let ( x0, x1 ) = ( -sx, sx );
  let ( y0, y1 ) = ( -sy, sy );

  Ok(
    Transform::scale( w, h, 1.0 )?
      .compose( &Transform::scale( 1.0 / ( x1 - x0 ), 1.0 / ( y0 - y1 ), 1.0 )? )
      .compose( &Transform::translate( Vector::new( -x0, -y1, 0.0 ) ) )
  )
}
