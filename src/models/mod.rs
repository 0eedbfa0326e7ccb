pub mod account;
pub mod claim;
pub mod datapoint;
pub mod trip;
