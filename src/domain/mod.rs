// Domain layer: core models and the publisher port. No broker or filesystem code here.

pub mod model;
pub mod ports;
