pub use geometry::{Point, Vector, Pointf64, Vectorf64, Transform, TriangleMesh};
pub use units::{Length, Energy, Angle, PerLength};

pub use crate::attenuation::FluenceMode;
pub use crate::detector::{BeamShape, DetectorGeometry, DetectorResponse};
pub use crate::engine::{ImageEngine, Readiness, Requirement, SimulationContext};
pub use crate::error::{FatalError, Result};
pub use crate::filter::ArtifactFilter;
pub use crate::image::{Image, Image2, Image3};
pub use crate::material::{AttenuationProvider, Material, MaterialId, MaterialTable};
pub use crate::scene::{Role, Scene, SceneNode};
pub use crate::spectrum::Spectrum;
