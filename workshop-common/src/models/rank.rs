//! Cosmetic rank tiers derived from lifetime-earned points. Never stored.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub name: &'static str,
    pub threshold: i64,
    pub color: &'static str,
    pub icon: &'static str,
}

/// Ordered by ascending threshold; the first entry starts at zero.
pub const RANKS: [Rank; 6] = [
    Rank { name: "學徒初學者", threshold: 0, color: "bg-slate-400", icon: "🌱" },
    Rank { name: "積極求知者", threshold: 500, color: "bg-blue-400", icon: "📖" },
    Rank { name: "知識探索家", threshold: 2000, color: "bg-green-500", icon: "🔍" },
    Rank { name: "技能熟練工", threshold: 5000, color: "bg-purple-500", icon: "🛠️" },
    Rank { name: "領域領航員", threshold: 10000, color: "bg-orange-500", icon: "🚀" },
    Rank { name: "傳奇大宗師", threshold: 30000, color: "bg-yellow-500", icon: "👑" },
];

pub fn rank_for(total_earned: i64) -> &'static Rank {
    RANKS
        .iter()
        .rev()
        .find(|r| total_earned >= r.threshold)
        .unwrap_or(&RANKS[0])
}

pub fn next_rank(total_earned: i64) -> Option<&'static Rank> {
    RANKS.iter().find(|r| r.threshold > total_earned)
}

/// Percent of the way from the current tier to the next, 100 at the top tier.
pub fn progress_to_next(total_earned: i64) -> u8 {
    let current = rank_for(total_earned);
    match next_rank(total_earned) {
        Some(next) => {
            let span = next.threshold - current.threshold;
            let done = (total_earned - current.threshold).max(0);
            ((done * 100) / span).clamp(0, 100) as u8
        }
        None => 100,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankStanding {
    pub rank: Rank,
    pub next: Option<Rank>,
    pub progress: u8,
}

pub fn standing(total_earned: i64) -> RankStanding {
    RankStanding {
        rank: *rank_for(total_earned),
        next: next_rank(total_earned).copied(),
        progress: progress_to_next(total_earned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(rank_for(0).threshold, 0);
        assert_eq!(rank_for(499).threshold, 0);
        assert_eq!(rank_for(500).threshold, 500);
        assert_eq!(rank_for(29_999).threshold, 10_000);
        assert_eq!(rank_for(1_000_000).threshold, 30_000);
    }

    #[test]
    fn progress_is_relative_to_current_tier() {
        assert_eq!(progress_to_next(250), 50);
        assert_eq!(progress_to_next(500), 0);
        assert_eq!(progress_to_next(1250), 50);
        assert_eq!(progress_to_next(30_000), 100);
        assert!(next_rank(30_000).is_none());
    }
}
