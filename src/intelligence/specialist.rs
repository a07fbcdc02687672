//! Static keyword → specialist rule tables.
//!
//! Entries are scanned in order and the first keyword contained in the
//! lowercased test name wins, so precedence is the table order.

/// One keyword rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialistRule {
    pub keyword: &'static str,
    pub specialist: &'static str,
    pub tips: &'static [&'static str],
}

/// Ordered rules plus the default used when nothing matches.
#[derive(Debug, Clone, Copy)]
pub struct SpecialistTable {
    pub rules: &'static [SpecialistRule],
    pub default: SpecialistRule,
}

impl SpecialistTable {
    /// First rule whose keyword occurs in `test_name`, or `None`.
    pub fn find(&self, test_name: &str) -> Option<&SpecialistRule> {
        let name = test_name.to_lowercase();
        self.rules.iter().find(|rule| name.contains(rule.keyword))
    }

    /// Specialist and tips for `test_name`, falling back to the default rule.
    pub fn map(&self, test_name: &str) -> (&'static str, &'static [&'static str]) {
        let rule = self.find(test_name).unwrap_or(&self.default);
        (rule.specialist, rule.tips)
    }
}

pub const GENERAL_PHYSICIAN: &str = "General Physician";

/// Rules attached to every entry of an analysis report.
pub const REPORT_SPECIALISTS: SpecialistTable = SpecialistTable {
    rules: &[
        SpecialistRule {
            keyword: "lipid",
            specialist: "Cardiologist / Dietitian",
            tips: &["Reduce fats, exercise daily."],
        },
        SpecialistRule {
            keyword: "glucose",
            specialist: "Endocrinologist",
            tips: &["Reduce sugar intake, check HbA1c."],
        },
        SpecialistRule {
            keyword: "creatinine",
            specialist: "Nephrologist",
            tips: &["Check kidney function, stay hydrated."],
        },
        SpecialistRule {
            keyword: "hemoglobin",
            specialist: "Physician",
            tips: &["Increase iron intake if low."],
        },
    ],
    default: SpecialistRule {
        keyword: "default",
        specialist: GENERAL_PHYSICIAN,
        tips: &["Consult your doctor for review."],
    },
};

/// Rules used by the rule-based recommendation fallback.
pub const RECOMMENDATION_SPECIALISTS: SpecialistTable = SpecialistTable {
    rules: &[
        SpecialistRule {
            keyword: "glucose",
            specialist: "Endocrinologist",
            tips: &["Reduce sugar intake; check HbA1c if persistently high."],
        },
        SpecialistRule {
            keyword: "creatinine",
            specialist: "Nephrologist",
            tips: &["Check kidney function, ensure hydration."],
        },
        SpecialistRule {
            keyword: "hemoglobin",
            specialist: "Physician",
            tips: &["If low, consider iron studies; do not self-supplement."],
        },
        SpecialistRule {
            keyword: "triglyceride",
            specialist: "Cardiologist / Dietitian",
            tips: &["Reduce simple carbs/saturated fats; increase activity."],
        },
    ],
    default: SpecialistRule {
        keyword: "default",
        specialist: GENERAL_PHYSICIAN,
        tips: &["Review results with your physician."],
    },
};

/// Suggestion emitted for a flagged test that no rule covers.
pub const UNMATCHED_SUGGESTION: &str = "Please review this result with your doctor.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_substring_match() {
        let (specialist, tips) = REPORT_SPECIALISTS.map("Fasting Blood GLUCOSE");
        assert_eq!(specialist, "Endocrinologist");
        assert_eq!(tips, &["Reduce sugar intake, check HbA1c."]);
    }

    #[test]
    fn first_keyword_wins() {
        // Contains both "lipid" and "glucose"; "lipid" is listed first.
        let (specialist, _) = REPORT_SPECIALISTS.map("Lipid-adjusted glucose");
        assert_eq!(specialist, "Cardiologist / Dietitian");
    }

    #[test]
    fn unmatched_falls_back_to_default() {
        let (specialist, tips) = REPORT_SPECIALISTS.map("Vitamin D");
        assert_eq!(specialist, GENERAL_PHYSICIAN);
        assert_eq!(tips, &["Consult your doctor for review."]);
        assert!(REPORT_SPECIALISTS.find("Vitamin D").is_none());
    }

    #[test]
    fn recommendation_table_differs_from_report_table() {
        let (specialist, _) = RECOMMENDATION_SPECIALISTS.map("Triglycerides");
        assert_eq!(specialist, "Cardiologist / Dietitian");
        // No "lipid" rule on the recommendation side.
        assert!(RECOMMENDATION_SPECIALISTS.find("Lipid Panel").is_none());
        let (_, tips) = RECOMMENDATION_SPECIALISTS.map("Urea");
        assert_eq!(tips, &["Review results with your physician."]);
    }

    #[test]
    fn empty_name_uses_default() {
        assert_eq!(RECOMMENDATION_SPECIALISTS.map("").0, GENERAL_PHYSICIAN);
    }
}
