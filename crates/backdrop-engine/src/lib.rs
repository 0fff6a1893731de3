//! Effect lifecycle framework.
//!
//! An [`EffectInstance`] binds one [`Effect`] to one host element. It owns the
//! scene, camera, renderer and frame clock, drives the effect's hooks, and
//! tears everything down on [`EffectInstance::destroy`].

mod clock;
mod current;
mod effect;
mod error;
mod host;
mod instance;
mod registry;
mod render;
mod size;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clock::{FrameClock, FrameStats, FrameTime, MAX_STEP, MIN_STEP};
pub use current::{InstanceId, current};
pub use effect::{Effect, EffectContext};
pub use error::{EffectError, RegistryError, SetupError};
pub use host::{CanvasStyle, ContentBox, FrameToken, Host, ListenerId, SurfaceId};
pub use instance::{EffectInstance, LifecycleState};
pub use registry::Registry;
pub use render::{Engine, Renderer, RendererOptions};
pub use size::{Size, compute_size};
