//! Combo module: keyword combination generation and existence analysis
pub mod generator;
pub mod analyzer;

pub use self::generator::{filter_keywords, generate_all_possible_combos, ComboOptions};
pub use self::analyzer::{
    analyze_all_combos, combo_exists_in, detect_brand, filter_combos_by_keyword,
    group_combos_by_length, strategic_value, ComboAnalysis, ComboAnalysisOptions, ComboSource,
    ComboStats, GeneratedCombo,
};
