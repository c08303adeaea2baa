//! Keyword Classification
//!
//! Pure functions for the two free-text heuristics: deciding whether
//! an order's line items look appointment-gated, and inferring a
//! coaching session category from the booking reason.
//!
//! String matching on names is best-effort, not authoritative: the
//! order-type registry wins whenever the type code is known. Keeping
//! the keyword sets here lets them be swapped for a lookup table
//! without touching orchestration logic.

use shared::models::CoachingCategory;

/// Line-item tokens that mark an order as requiring a live appointment
const SYNC_ORDER_KEYWORDS: &[&str] = &["trt", "testosterone", "controlled", "weight loss"];

const WELLNESS_KEYWORDS: &[&str] = &["wellness", "nutrition", "sleep", "stress", "habit"];

const CAREER_KEYWORDS: &[&str] = &["career", "job", "work", "interview", "resume"];

/// Case-insensitive substring match against the sync-order keyword set
pub fn is_sync_order_item(name: &str) -> bool {
    let name = name.to_lowercase();
    SYNC_ORDER_KEYWORDS.iter().any(|kw| name.contains(kw))
}

/// An order looks appointment-gated if any line item matches
pub fn order_requires_sync(item_names: &[String]) -> bool {
    item_names.iter().any(|name| is_sync_order_item(name))
}

/// Infer the coaching session category from the booking reason.
/// Defaults to life coaching when the reason is absent or matches
/// nothing.
pub fn session_category(reason: Option<&str>) -> CoachingCategory {
    let Some(reason) = reason else {
        return CoachingCategory::LifeCoaching;
    };
    let reason = reason.to_lowercase();
    if WELLNESS_KEYWORDS.iter().any(|kw| reason.contains(kw)) {
        return CoachingCategory::WellnessCoaching;
    }
    if CAREER_KEYWORDS.iter().any(|kw| reason.contains(kw)) {
        return CoachingCategory::CareerCoaching;
    }
    CoachingCategory::LifeCoaching
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_keywords_match_case_insensitively() {
        assert!(is_sync_order_item("TRT Starter Pack"));
        assert!(is_sync_order_item("Testosterone Cypionate 200mg"));
        assert!(is_sync_order_item("controlled substance refill"));
        assert!(is_sync_order_item("Weight Loss Program — monthly"));
    }

    #[test]
    fn test_plain_items_do_not_match() {
        assert!(!is_sync_order_item("Vitamin D3"));
        assert!(!is_sync_order_item("Lipid panel"));
        assert!(!is_sync_order_item(""));
    }

    #[test]
    fn test_substring_matching_is_deliberate() {
        // "weight loss" must match as a phrase, not word-by-word
        assert!(!is_sync_order_item("weight bench"));
        assert!(is_sync_order_item("rapid weight loss support"));
    }

    #[test]
    fn test_order_requires_sync_any_item() {
        let items = vec!["Vitamin D3".to_string(), "TRT maintenance".to_string()];
        assert!(order_requires_sync(&items));
        let items = vec!["Vitamin D3".to_string(), "Zinc".to_string()];
        assert!(!order_requires_sync(&items));
        assert!(!order_requires_sync(&[]));
    }

    #[test]
    fn test_session_category_wellness() {
        assert_eq!(
            session_category(Some("Sleep and stress management")),
            CoachingCategory::WellnessCoaching
        );
        assert_eq!(
            session_category(Some("Nutrition plan review")),
            CoachingCategory::WellnessCoaching
        );
    }

    #[test]
    fn test_session_category_career() {
        assert_eq!(
            session_category(Some("Interview preparation")),
            CoachingCategory::CareerCoaching
        );
        assert_eq!(
            session_category(Some("Career change planning")),
            CoachingCategory::CareerCoaching
        );
    }

    #[test]
    fn test_session_category_wellness_wins_over_career() {
        // Both keyword sets present → wellness checked first
        assert_eq!(
            session_category(Some("Work stress counseling")),
            CoachingCategory::WellnessCoaching
        );
    }

    #[test]
    fn test_session_category_defaults_to_life() {
        assert_eq!(session_category(None), CoachingCategory::LifeCoaching);
        assert_eq!(session_category(Some("General check-in")), CoachingCategory::LifeCoaching);
        assert_eq!(session_category(Some("")), CoachingCategory::LifeCoaching);
    }
}
