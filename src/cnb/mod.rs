//! Buildpack side of the Cloud Native Buildpacks lifecycle contract.
//!
//! The lifecycle runs `bin/detect` and `bin/build`; this module turns those
//! invocations into [`DetectContext`] / [`BuildContext`] values, hands them to
//! a [`Detector`] or [`Builder`], and writes the results back in the file
//! layout the lifecycle expects (Buildpack API 0.5).

pub mod context;
pub mod entries;
pub mod layer;
pub mod lifecycle;
pub mod plan;

pub use context::{
    BomEntry, BomMetadata, BuildContext, BuildMetadata, BuildResult, BuildpackInfo,
    DetectContext, DetectOutcome, LaunchMetadata, Platform,
};
pub use entries::{EntryResolver, PlanEntryResolver};
pub use layer::{Environment, Layer, LayerError, Layers};
pub use lifecycle::{
    run_build, run_detect, BuildInvocation, DetectInvocation, LifecycleError, EXIT_ERROR,
    EXIT_FAIL, EXIT_PASS,
};
pub use plan::{
    BuildPlan, BuildPlanMetadata, BuildPlanProvision, BuildPlanRequirement, BuildpackPlan,
    BuildpackPlanEntry,
};

/// The detect phase of a buildpack.
pub trait Detector {
    type Error: std::error::Error + Send + Sync + 'static;

    fn detect(&self, context: &DetectContext) -> Result<DetectOutcome, Self::Error>;
}

/// The build phase of a buildpack.
pub trait Builder {
    type Error: std::error::Error + Send + Sync + 'static;

    fn build(&self, context: BuildContext) -> Result<BuildResult, Self::Error>;
}
