//! Static grade ladder used to show progression on the results screen.

/// One milestone of the progression ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grade {
    pub min_points: f64,
    pub name: &'static str,
    pub icon: &'static str,
}

/// Ordered ladder of ranks, lowest threshold first.
///
/// Read-only reference data; cumulative user points are owned elsewhere.
pub const GRADE_LADDER: &[Grade] = &[
    Grade {
        min_points: 0.0,
        name: "Recruit",
        icon: "🧯",
    },
    Grade {
        min_points: 100.0,
        name: "Probationary firefighter",
        icon: "⛑️",
    },
    Grade {
        min_points: 250.0,
        name: "Firefighter",
        icon: "🚒",
    },
    Grade {
        min_points: 500.0,
        name: "Senior firefighter",
        icon: "🔥",
    },
    Grade {
        min_points: 1_000.0,
        name: "Crew leader",
        icon: "🪖",
    },
    Grade {
        min_points: 2_000.0,
        name: "Lieutenant",
        icon: "🎖️",
    },
    Grade {
        min_points: 3_500.0,
        name: "Captain",
        icon: "⭐",
    },
    Grade {
        min_points: 5_500.0,
        name: "Battalion chief",
        icon: "🌟",
    },
];

impl Grade {
    /// Highest ladder entry whose threshold the given points reach.
    #[must_use]
    pub fn for_points(points: f64) -> &'static Grade {
        let mut current = &GRADE_LADDER[0];
        for grade in GRADE_LADDER {
            if points >= grade.min_points {
                current = grade;
            } else {
                break;
            }
        }
        current
    }

    /// Next ladder entry above the given points, `None` at the top.
    #[must_use]
    pub fn next_above(points: f64) -> Option<&'static Grade> {
        GRADE_LADDER.iter().find(|grade| points < grade.min_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_is_sorted_by_threshold() {
        for pair in GRADE_LADDER.windows(2) {
            assert!(pair[0].min_points < pair[1].min_points);
        }
    }

    #[test]
    fn zero_points_is_the_first_rank() {
        assert_eq!(Grade::for_points(0.0).name, "Recruit");
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(Grade::for_points(99.9).name, "Recruit");
        assert_eq!(Grade::for_points(100.0).name, "Probationary firefighter");
    }

    #[test]
    fn top_rank_has_no_next() {
        assert_eq!(Grade::for_points(10_000.0).name, "Battalion chief");
        assert!(Grade::next_above(10_000.0).is_none());
    }

    #[test]
    fn next_above_returns_upcoming_rank() {
        let next = Grade::next_above(120.0).unwrap();
        assert_eq!(next.name, "Firefighter");
    }
}
