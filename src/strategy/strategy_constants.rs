// --- ALLOCATION GENERATOR CONSTANTS ---
/// Every generated set must total exactly this
pub const TOTAL_PERCENTAGE: i32 = 100;
/// Suggestions never spread capital across more protocols than this
pub const MAX_SUGGESTED_ENTRIES: usize = 4;
/// Conservative strategies only consider protocols at or below this risk band
pub const CONSERVATIVE_MAX_RISK: u8 = 3;

/// First-entry concentration per archetype
pub const CONSERVATIVE_FRONT_LOAD: i32 = 40;
pub const BALANCED_FRONT_LOAD: i32 = 45;
pub const AGGRESSIVE_FRONT_LOAD: i32 = 60;

// --- RISK AGGREGATION CONSTANTS ---
/// Risk band reported for an empty allocation set (a floor, not a zero)
pub const EMPTY_SET_RISK: u8 = 1;
pub const MIN_RISK_LEVEL: u8 = 1;
pub const MAX_RISK_LEVEL: u8 = 5;
