//! Signed-in user record and message-quota gating.

use serde::{Deserialize, Serialize};

use crate::core::settings::PricingPlan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub plan: String,
    pub messages_used: u32,
    pub message_limit: u32,
}

/// Outcome of checking whether the user may send another message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed { remaining: u32 },
    /// Quota exhausted: route to the upgrade view instead of sending.
    UpgradeRequired { used: u32, limit: u32 },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }
}

impl User {
    pub fn check_quota(&self) -> QuotaDecision {
        if self.messages_used >= self.message_limit {
            QuotaDecision::UpgradeRequired {
                used: self.messages_used,
                limit: self.message_limit,
            }
        } else {
            QuotaDecision::Allowed {
                remaining: self.message_limit - self.messages_used,
            }
        }
    }

    pub fn record_message(&mut self) {
        self.messages_used = self.messages_used.saturating_add(1);
    }

    /// Switch to `plan`. The counter is kept; only the ceiling changes.
    pub fn apply_plan(&mut self, plan: &PricingPlan) {
        self.plan = plan.id.clone();
        self.message_limit = plan.message_limit;
    }

    /// "used/limit" for headers and status output.
    pub fn usage_label(&self) -> String {
        format!("{}/{}", self.messages_used, self.message_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(used: u32, limit: u32) -> User {
        User {
            id: "u1".to_string(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            plan: "free".to_string(),
            messages_used: used,
            message_limit: limit,
        }
    }

    #[test]
    fn at_limit_requires_upgrade() {
        assert_eq!(
            user(10, 10).check_quota(),
            QuotaDecision::UpgradeRequired { used: 10, limit: 10 }
        );
    }

    #[test]
    fn one_below_limit_is_allowed() {
        let decision = user(9, 10).check_quota();
        assert_eq!(decision, QuotaDecision::Allowed { remaining: 1 });
        assert!(decision.is_allowed());
    }

    #[test]
    fn over_limit_requires_upgrade() {
        assert!(!user(12, 10).check_quota().is_allowed());
        assert!(!user(0, 0).check_quota().is_allowed());
    }

    #[test]
    fn record_and_apply_plan() {
        let mut u = user(9, 10);
        u.record_message();
        assert!(!u.check_quota().is_allowed());
        u.apply_plan(&PricingPlan {
            id: "pro".to_string(),
            name: "Pro".to_string(),
            price: "79".to_string(),
            message_limit: 1000,
        });
        assert_eq!(u.plan, "pro");
        assert_eq!(u.usage_label(), "10/1000");
        assert!(u.check_quota().is_allowed());
    }
}
