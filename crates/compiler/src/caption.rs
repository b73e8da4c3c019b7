//! Age-since-birthday captions.

use chrono::NaiveDate;

/// Where the caption is drawn on the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionPosition {
    BottomCenter,
    BottomRight,
}

impl CaptionPosition {
    pub fn from_centered(centered: bool) -> Self {
        if centered {
            CaptionPosition::BottomCenter
        } else {
            CaptionPosition::BottomRight
        }
    }

    /// drawtext `x` expression
    pub fn x(&self) -> &'static str {
        match self {
            CaptionPosition::BottomCenter => "(w-text_w)/2",
            CaptionPosition::BottomRight => "w-tw-10",
        }
    }

    /// drawtext `y` expression
    pub fn y(&self) -> &'static str {
        match self {
            CaptionPosition::BottomCenter => "h-th-20",
            CaptionPosition::BottomRight => "h-th-10",
        }
    }
}

/// Label describing how old the kid was when the clip was captured.
///
/// Under a week old the label counts days, under 52 weeks it counts weeks,
/// after that it counts 52-week years plus leftover weeks. Clips captured
/// before the birthday are labelled `Day 0`.
pub fn age_label(capture_date: NaiveDate, birthday: NaiveDate) -> String {
    let days = (capture_date - birthday).num_days().max(0);
    let week = days / 7;

    if week < 52 {
        if week == 0 {
            return format!("Day {}", days);
        }
        return format!("Week {}", week);
    }

    let year = week / 52;
    let remainder = week % 52;
    if remainder == 0 {
        format!("Year {}", year)
    } else {
        format!("Year {} / Week {}", year, remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn birthday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 23).unwrap()
    }

    fn label_after(days: i64) -> String {
        age_label(birthday() + Duration::days(days), birthday())
    }

    #[test]
    fn test_day_and_week_labels() {
        assert_eq!(label_after(0), "Day 0");
        assert_eq!(label_after(6), "Day 6");
        assert_eq!(label_after(7), "Week 1");
        assert_eq!(label_after(363), "Week 51");
    }

    #[test]
    fn test_year_rollover() {
        // 364 / 7 == 52: the 52nd week already rolls over into a year
        assert_eq!(label_after(364), "Year 1");
        assert_eq!(label_after(365), "Year 1");
        assert_eq!(label_after(372), "Year 1 / Week 1");
        assert_eq!(label_after(728), "Year 2");
    }

    #[test]
    fn test_calendar_dates() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(age_label(d(2023, 3, 30), birthday()), "Week 1");
        assert_eq!(age_label(d(2024, 3, 23), birthday()), "Year 1");
        assert_eq!(age_label(d(2024, 3, 30), birthday()), "Year 1 / Week 1");
    }

    #[test]
    fn test_capture_before_birthday_is_day_zero() {
        assert_eq!(label_after(-1), "Day 0");
        assert_eq!(label_after(-30), "Day 0");
    }

    #[test]
    fn test_caption_positions() {
        assert_eq!(CaptionPosition::from_centered(true), CaptionPosition::BottomCenter);
        assert_eq!(CaptionPosition::from_centered(false).x(), "w-tw-10");
        assert_eq!(CaptionPosition::BottomCenter.y(), "h-th-20");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_label_shape_follows_age(days in 0i64..3000) {
            let label = label_after(days);
            let week = days / 7;
            if week == 0 {
                prop_assert!(label.starts_with("Day "));
            } else if week < 52 {
                prop_assert_eq!(label, format!("Week {}", week));
            } else {
                let prefix = format!("Year {}", week / 52);
                prop_assert!(label.starts_with(&prefix), "{} does not start with {}", label, prefix);
            }
        }
    }
}
