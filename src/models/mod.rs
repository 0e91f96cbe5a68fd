//! Data models shared across services and storage.

pub mod journey;
pub mod location;
pub mod person;
pub mod steps;

pub use journey::{Journey, JourneyState, Waypoint};
pub use location::DailyLocation;
pub use person::Person;
pub use steps::{DailySteps, STRIDE_METERS};
