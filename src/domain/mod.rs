// Domain layer: quote models, ports (interfaces) and pure analysis over quotes.

pub mod model;
pub mod ports;
pub mod services;
