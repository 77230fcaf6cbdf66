use tracing::warn;

/// Max points used when a module or meeting is missing from [`MODULE_CONFIG`].
pub const DEFAULT_MAX_POINTS: u32 = 5;

/// Passing score for a single meeting (KKM).
pub const KKM_MEETING: u8 = 75;

/// Passing score for a whole module (KKM).
pub const KKM_MODULE: u8 = 80;

/// Divisor for the per-module average in reports. Modules with fewer
/// recorded meetings are averaged as if the missing ones scored 0.
pub const MEETINGS_PER_MODULE: u32 = 4;

/// Curriculum weighting: `(module_id, [(meeting_order, max_points)])`.
///
/// Max points are set per meeting and are not derived from the quiz length,
/// so raw correct-answer counts are not comparable across meetings.
pub const MODULE_CONFIG: &[(i64, &[(i64, u32)])] = &[
    (1, &[(1, 5), (2, 5), (3, 10), (4, 5)]),
    (2, &[(1, 5), (2, 10), (3, 5), (4, 10)]),
    (3, &[(1, 10), (2, 5), (3, 5), (4, 10)]),
    (4, &[(1, 5), (2, 5), (3, 5), (4, 10)]),
];

pub fn get_meeting_max_points(module_id: i64, meeting_order: i64) -> u32 {
    let Some((_, meetings)) = MODULE_CONFIG.iter().find(|(id, _)| *id == module_id) else {
        warn!(
            "module {} has no scoring config, falling back to {} max points",
            module_id, DEFAULT_MAX_POINTS
        );
        return DEFAULT_MAX_POINTS;
    };

    match meetings.iter().find(|(order, _)| *order == meeting_order) {
        Some((_, max)) => *max,
        None => {
            warn!(
                "module {} has no scoring config for meeting {}, falling back to {} max points",
                module_id, meeting_order, DEFAULT_MAX_POINTS
            );
            DEFAULT_MAX_POINTS
        }
    }
}

/// `round(raw / max * 100)` clamped into `0..=100`.
pub fn calculate_meeting_score(raw_points: i64, module_id: i64, meeting_order: i64) -> u8 {
    let max_points = get_meeting_max_points(module_id, meeting_order);
    score_from_points(raw_points, max_points)
}

/// A max of zero yields 0 instead of a non-finite score.
pub fn score_from_points(raw_points: i64, max_points: u32) -> u8 {
    if max_points == 0 {
        warn!("max points of 0 cannot be scored, returning 0");
        return 0;
    }
    let score = (raw_points as f64 / max_points as f64 * 100.0).round();
    score.clamp(0.0, 100.0) as u8
}

/// Rounded mean of the given meeting scores, 0 for an empty slice.
pub fn calculate_module_final_grade(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
    (sum as f64 / scores.len() as f64).round() as u8
}

/// Report average: sum of every recorded score divided by
/// [`MEETINGS_PER_MODULE`], regardless of how many attempts exist.
pub fn module_report_average(scores: &[u8]) -> u8 {
    let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
    let avg = (sum as f64 / MEETINGS_PER_MODULE as f64).round();
    avg.clamp(0.0, 100.0) as u8
}

pub fn passes_meeting(score: u8) -> bool {
    score >= KKM_MEETING
}

pub fn passes_module(score: u8) -> bool {
    score >= KKM_MODULE
}

/// Score thresholds for awarding stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarBands {
    pub three: u8,
    pub two: u8,
}

impl Default for StarBands {
    fn default() -> Self {
        Self { three: 80, two: 60 }
    }
}

impl StarBands {
    pub fn stars_for(&self, score: u8) -> u8 {
        if score >= self.three {
            3
        } else if score >= self.two {
            2
        } else {
            1
        }
    }
}

/// Stars with the default bands. Every screen goes through this.
pub fn stars_for_score(score: u8) -> u8 {
    StarBands::default().stars_for(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_points_score_100_for_every_configured_meeting() {
        for (module_id, meetings) in MODULE_CONFIG {
            for (order, max) in meetings.iter() {
                assert_eq!(
                    calculate_meeting_score(i64::from(*max), *module_id, *order),
                    100,
                    "module {} meeting {}",
                    module_id,
                    order
                );
            }
        }
    }

    #[test]
    fn test_score_is_monotonic_in_raw_points() {
        for (module_id, meetings) in MODULE_CONFIG {
            for (order, max) in meetings.iter() {
                let mut prev = 0;
                for raw in -2..=i64::from(*max) + 3 {
                    let score = calculate_meeting_score(raw, *module_id, *order);
                    assert!(score >= prev);
                    prev = score;
                }
            }
        }
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(calculate_meeting_score(-3, 1, 1), 0);
        assert_eq!(calculate_meeting_score(50, 1, 1), 100);
    }

    #[test]
    fn test_four_of_five() {
        assert_eq!(get_meeting_max_points(1, 1), 5);
        let score = calculate_meeting_score(4, 1, 1);
        assert_eq!(score, 80);
        assert_eq!(stars_for_score(score), 3);
    }

    #[test]
    fn test_unconfigured_module_falls_back_to_default() {
        assert_eq!(get_meeting_max_points(999, 1), DEFAULT_MAX_POINTS);
        assert_eq!(get_meeting_max_points(1, 9), DEFAULT_MAX_POINTS);
        assert_eq!(calculate_meeting_score(5, 999, 1), 100);
    }

    #[test]
    fn test_zero_max_points_is_guarded() {
        assert_eq!(score_from_points(3, 0), 0);
    }

    #[test]
    fn test_module_final_grade() {
        assert_eq!(calculate_module_final_grade(&[]), 0);
        assert_eq!(calculate_module_final_grade(&[80, 100]), 90);
        assert_eq!(calculate_module_final_grade(&[75, 80, 90]), 82);
    }

    #[test]
    fn test_report_average_divides_by_four() {
        assert_eq!(module_report_average(&[100, 100]), 50);
        assert_eq!(module_report_average(&[80, 80, 80, 80]), 80);
        assert_eq!(module_report_average(&[]), 0);
    }

    #[test]
    fn test_kkm_thresholds() {
        assert!(passes_meeting(75));
        assert!(!passes_meeting(74));
        assert!(passes_module(80));
        assert!(!passes_module(79));
    }

    #[test]
    fn test_star_bands() {
        assert_eq!(stars_for_score(100), 3);
        assert_eq!(stars_for_score(80), 3);
        assert_eq!(stars_for_score(79), 2);
        assert_eq!(stars_for_score(60), 2);
        assert_eq!(stars_for_score(59), 1);
        assert_eq!(stars_for_score(0), 1);

        let strict = StarBands { three: 100, two: 60 };
        assert_eq!(strict.stars_for(90), 2);
    }
}
