// Domain layer: records, cache keys, cancellation and ports (interfaces).

pub mod cancel;
pub mod model;
pub mod ports;
