// Domain layer: request/response models and the ports the server and classifiers meet at.

pub mod model;
pub mod ports;
