pub mod assessment;
pub mod checkin;
pub mod plan;
