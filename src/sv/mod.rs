pub mod agent;
pub mod commission;
pub mod payment;
pub mod payout;
pub mod promo;
pub mod seed;
pub mod subscription;
#[cfg(test)]
pub mod test_utils;

pub use agent::Agent;
pub use commission::Commission;
pub use payment::Payment;
pub use payout::Payout;
pub use promo::Promo;
pub use subscription::Subscription;
