pub mod dto;

pub use dto::{DynamicsPoint, EconomicsWindow, Period, UnitEconomicsQuery, UnitEconomicsResponse};
