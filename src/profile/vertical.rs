//! Vertical profiles: static, read-only reference data

/// App category grouping with its own keyword signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalProfile {
    pub id: &'static str,
    pub label: &'static str,
    /// Detection keywords, matched on word boundaries
    pub keywords: &'static [&'static str],
    /// App Store categories that map to this vertical
    pub categories: &'static [&'static str],
    pub rule_set_id: Option<&'static str>,
}

pub const BASE_VERTICAL_ID: &str = "base";

pub static VERTICAL_PROFILES: &[VerticalProfile] = &[
    VerticalProfile {
        id: BASE_VERTICAL_ID,
        label: "Base (vertical-agnostic)",
        keywords: &[],
        categories: &[],
        rule_set_id: Some("base"),
    },
    VerticalProfile {
        id: "language_learning",
        label: "Language Learning",
        keywords: &[
            "learn", "language", "languages", "spanish", "french", "german", "english",
            "italian", "vocabulary", "fluent", "lesson", "lessons", "speak", "grammar",
        ],
        categories: &["Education", "Reference"],
        rule_set_id: Some("vertical_language_learning"),
    },
    VerticalProfile {
        id: "rewards",
        label: "Rewards & Cashback",
        keywords: &[
            "rewards", "reward", "cashback", "cash back", "earn", "points", "gift card",
            "gift cards", "coupons", "deals", "surveys",
        ],
        categories: &["Lifestyle", "Shopping"],
        rule_set_id: Some("vertical_rewards"),
    },
    VerticalProfile {
        id: "finance",
        label: "Finance",
        keywords: &[
            "budget", "budgeting", "invest", "investing", "stocks", "bank", "banking",
            "money", "savings", "crypto", "expense", "expenses",
        ],
        categories: &["Finance", "Business"],
        rule_set_id: Some("vertical_finance"),
    },
    VerticalProfile {
        id: "dating",
        label: "Dating",
        keywords: &["dating", "date", "singles", "match", "matches", "relationship", "meet", "love"],
        categories: &["Lifestyle", "Social Networking"],
        rule_set_id: Some("vertical_dating"),
    },
    VerticalProfile {
        id: "productivity",
        label: "Productivity",
        keywords: &[
            "tasks", "todo", "to-do", "notes", "planner", "calendar", "organize",
            "reminders", "focus", "habit",
        ],
        categories: &["Productivity", "Business", "Utilities"],
        rule_set_id: Some("vertical_productivity"),
    },
    VerticalProfile {
        id: "health",
        label: "Health & Fitness",
        keywords: &[
            "workout", "workouts", "fitness", "meditation", "sleep", "diet", "calorie",
            "calories", "yoga", "wellness", "running",
        ],
        categories: &["Health & Fitness", "Medical"],
        rule_set_id: Some("vertical_health"),
    },
    VerticalProfile {
        id: "entertainment",
        label: "Entertainment",
        keywords: &["movies", "music", "stream", "streaming", "video", "videos", "shows", "podcast", "podcasts"],
        categories: &["Entertainment", "Music", "Photo & Video"],
        rule_set_id: Some("vertical_entertainment"),
    },
    VerticalProfile {
        id: "education",
        label: "Education",
        keywords: &["study", "homework", "math", "exam", "exams", "course", "courses", "tutor", "flashcards", "school"],
        categories: &["Education", "Books", "Reference"],
        rule_set_id: Some("vertical_education"),
    },
];

/// Look up a vertical profile by id
pub fn get_vertical_profile(id: &str) -> Option<&'static VerticalProfile> {
    VERTICAL_PROFILES.iter().find(|p| p.id == id)
}

pub fn base_vertical_profile() -> &'static VerticalProfile {
    &VERTICAL_PROFILES[0]
}

/// Verticals (excluding base) whose category list contains `category`, in table order.
/// Category comparison ignores case and surrounding whitespace.
pub fn map_category_to_vertical(category: &str) -> Vec<&'static VerticalProfile> {
    let category = category.trim();
    if category.is_empty() {
        return Vec::new();
    }
    VERTICAL_PROFILES
        .iter()
        .filter(|p| p.id != BASE_VERTICAL_ID)
        .filter(|p| p.categories.iter().any(|c| c.eq_ignore_ascii_case(category)))
        .collect()
}
