// Application layer - Use case interactors

pub mod container;
pub mod estimate_interactor;
pub mod materialize_interactor;
pub mod quality_interactor;

#[cfg(test)]
pub(crate) mod fakes;

// Re-export interactors
pub use estimate_interactor::{EstimateInteractor, EstimateRequest};
pub use materialize_interactor::MaterializeInteractor;
pub use quality_interactor::QualityInteractor;
