// External imports
use thiserror::Error;

/// Errors raised while a scene is being constructed.
///
/// These are the only errors the crate produces. Once `Scene::precompute`
/// has succeeded, tracing never fails; numeric degeneracies at render time
/// are locally recovered and produce a color.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
  /// A complex object needs at least one child object
  #[error( "complex object must contain at least one object" )]
  EmptyComplexObject,

  /// The matrix has no inverse, so it cannot be used as a transform
  #[error( "transform matrix is singular (determinant is zero)" )]
  SingularTransform,

  /// A scale of zero on any axis would produce a singular transform
  #[error( "scaling by zero along an axis" )]
  ZeroScale,

  /// Shared (instanced) objects must be modelled centered on the origin,
  /// the instance transform is what places them in the world
  #[error( "shared object must be centered on the origin" )]
  UncenteredSharedObject,

  /// The vertex count handed to a grid mesh does not match its dimensions
  #[error( "grid mesh expects {expected} vertices, got {actual}" )]
  InvalidMeshGrid { expected : usize, actual : usize },

  /// A mesh face references a vertex that is not in the vertex buffer
  #[error( "mesh face references vertex {index} outside the vertex buffer" )]
  FaceIndexOutOfBounds { index : u32 },
}
