use serde::{Deserialize, Serialize};

/// Subscription tiers, totally ordered by access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    Premium,
    Elite,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Basic, Plan::Premium, Plan::Elite];

    /// Position in the tier hierarchy; higher rank means more access.
    pub fn rank(self) -> u8 {
        match self {
            Plan::Basic => 1,
            Plan::Premium => 2,
            Plan::Elite => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Basic => "basic",
            Plan::Premium => "premium",
            Plan::Elite => "elite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(Plan::Basic),
            "premium" => Some(Plan::Premium),
            "elite" => Some(Plan::Elite),
            _ => None,
        }
    }
}

/// Static display configuration for a tier. Not user data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInfo {
    pub name: &'static str,
    pub monthly_price_eur: u32,
}

impl Plan {
    pub fn info(self) -> PlanInfo {
        match self {
            Plan::Basic => PlanInfo {
                name: "Basic",
                monthly_price_eur: 29,
            },
            Plan::Premium => PlanInfo {
                name: "Premium",
                monthly_price_eur: 59,
            },
            Plan::Elite => PlanInfo {
                name: "Elite",
                monthly_price_eur: 99,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Upgrade,
    Downgrade,
    NoChange,
}

/// Upgrade vs. downgrade is purely a rank comparison.
pub fn classify_change(current: Plan, target: Plan) -> ChangeKind {
    if current == target {
        ChangeKind::NoChange
    } else if target.rank() > current.rank() {
        ChangeKind::Upgrade
    } else {
        ChangeKind::Downgrade
    }
}

/// Outcome of a change request, for display before the user confirms.
/// The price delta is informational only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeIntent {
    pub kind: ChangeKind,
    pub from: Plan,
    pub to: Plan,
    pub price_delta_eur: u32,
}

impl ChangeIntent {
    pub fn new(kind: ChangeKind, from: Plan, to: Plan) -> Self {
        let price_delta_eur = from
            .info()
            .monthly_price_eur
            .abs_diff(to.info().monthly_price_eur);
        Self {
            kind,
            from,
            to,
            price_delta_eur,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_roundtrip() {
        for plan in Plan::ALL {
            assert_eq!(Plan::parse(plan.as_str()), Some(plan));
        }
        assert!(Plan::parse("free").is_none());
    }

    #[test]
    fn hierarchy_is_fixed() {
        assert!(Plan::Basic.rank() < Plan::Premium.rank());
        assert!(Plan::Premium.rank() < Plan::Elite.rank());
    }

    #[test]
    fn classify_equal_plans_is_no_change() {
        for plan in Plan::ALL {
            assert_eq!(classify_change(plan, plan), ChangeKind::NoChange);
        }
    }

    #[test]
    fn classify_is_antisymmetric() {
        for p in Plan::ALL {
            for q in Plan::ALL {
                if p == q {
                    continue;
                }
                let forward = classify_change(p, q);
                let backward = classify_change(q, p);
                assert_eq!(forward == ChangeKind::Upgrade, q.rank() > p.rank());
                match forward {
                    ChangeKind::Upgrade => assert_eq!(backward, ChangeKind::Downgrade),
                    ChangeKind::Downgrade => assert_eq!(backward, ChangeKind::Upgrade),
                    ChangeKind::NoChange => unreachable!(),
                }
            }
        }
    }

    #[test]
    fn intent_price_delta_is_absolute() {
        let up = ChangeIntent::new(ChangeKind::Upgrade, Plan::Basic, Plan::Elite);
        assert_eq!(up.price_delta_eur, 70);
        let down = ChangeIntent::new(ChangeKind::Downgrade, Plan::Elite, Plan::Basic);
        assert_eq!(down.price_delta_eur, 70);
    }

    #[test]
    fn plan_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Plan::Premium).unwrap(), "\"premium\"");
        let parsed: Plan = serde_json::from_str("\"elite\"").unwrap();
        assert_eq!(parsed, Plan::Elite);
    }
}
