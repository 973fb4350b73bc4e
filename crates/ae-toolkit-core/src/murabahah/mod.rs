//! Murabahah (cost-plus) financing: flat monthly installments with profit
//! accrued on the declining principal and the admin fee charged in month one.

pub mod schedule;

pub use schedule::{calculate_murabahah, MonthRow, MurabahahPlan, MurabahahResult};
