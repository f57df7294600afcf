pub mod distance;
pub mod route;

pub use distance::{DistanceService, Link, UNREACHABLE};
pub use route::{RoutePolicy, RouteTable};
