// Domain layer: models, ports and the claim-report schema. No I/O here.

pub mod model;
pub mod ports;
pub mod schema;
