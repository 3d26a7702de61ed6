pub mod check;
pub mod notify_test;
