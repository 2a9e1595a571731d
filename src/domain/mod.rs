// Domain layer: records and ports (interfaces). Persistence and HTTP live in adapters/ and app/.

pub mod model;
pub mod ports;
