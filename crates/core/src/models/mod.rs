pub mod balance;
pub mod chart;
pub mod contract;
pub mod income;
pub mod period;
pub mod query;
pub mod record;
pub mod session;
pub mod settings;
