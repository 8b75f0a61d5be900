pub mod deliveries;
pub mod health;
pub mod orders;
pub mod payments;
pub mod restaurants;
pub mod users;
