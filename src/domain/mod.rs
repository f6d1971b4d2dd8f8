// Domain layer: table model, shared column names and ports (interfaces).

pub mod columns;
pub mod model;
pub mod ports;
