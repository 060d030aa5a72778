pub mod bounds_middleware;

pub use bounds_middleware::BoundsMiddleware;
