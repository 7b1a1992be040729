// Re-export from rill-core where PipeStep is defined.
// The `.pipe()` method is provided by `StepExt` in rill-core.

pub use rill_core::step::PipeStep;
