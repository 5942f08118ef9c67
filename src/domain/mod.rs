// Domain layer: value types and ports. The evaluator and pipelines in `core` build on these.

pub mod model;
pub mod ports;
