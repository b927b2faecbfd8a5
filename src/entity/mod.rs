pub mod agent;
pub mod commission;
pub mod monthly_payout;
pub mod promo_code;
pub mod subscription;

pub use commission::CommissionStatus;
pub use monthly_payout::{AgentTotals, ByAgent};
pub use promo_code::{DiscountType, PromoStatus};
pub use subscription::SubscriptionStatus;
