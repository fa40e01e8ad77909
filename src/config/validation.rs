//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks on gas limits.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// Prefix under which any channel name is a valid key
const GAS_TABLE_PREFIX: &str = "gas.thresholds.";

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the set of valid dotted key paths for ReportConfig.
///
/// Keys below `gas.thresholds` are channel names and are not listed.
/// Any new field added to ReportConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [input]
        "input",
        "input.timestamp_column",
        // [analysis]
        "analysis",
        "analysis.short_segment_secs",
        // [operation]
        "operation",
        "operation.channel",
        "operation.working_above",
        // [lithology]
        "lithology",
        "lithology.label_channel",
        "lithology.penetration_channel",
        "lithology.thrust_channel",
        "lithology.advance_speed_channel",
        "lithology.category_count",
        // [gas]
        "gas",
        "gas.thresholds",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the alphabetically first key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<&str> = known.iter().copied().collect();
    candidates.sort_unstable();
    candidates
        .into_iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by_key(|&(_, dist)| dist)
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if known.contains(key.as_str()) || key.starts_with(GAS_TABLE_PREFIX) {
            continue;
        }
        let suggestion = suggest_correction(&key, &known);
        let message = format!("Unknown config key '{key}'");
        warnings.push(ValidationWarning {
            field: key,
            message,
            suggestion,
        });
    }

    warnings
}

// ============================================================================
// Plausibility Validation
// ============================================================================

/// Check gas limits and segmentation settings for physically impossible or
/// suspicious values.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::ReportConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    use crate::types::ThresholdSpec;

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (channel, spec) in config.gas.thresholds.iter() {
        let (low, high) = match *spec {
            ThresholdSpec::Upper { max } => (max, max),
            ThresholdSpec::Range { low, high } => (low, high),
        };
        // Concentrations cannot be negative
        if low < 0.0 {
            errors.push(format!(
                "gas.thresholds.{channel} = {spec} cannot have a negative bound"
            ));
        }
        // Percent-based channels above 100 are almost certainly a unit mix-up
        if channel.contains("oxygen") && high > 100.0 {
            warnings.push(ValidationWarning {
                field: format!("{GAS_TABLE_PREFIX}{channel}"),
                message: format!(
                    "gas.thresholds.{channel} = {spec} exceeds 100%, check units"
                ),
                suggestion: None,
            });
        }
    }

    // A short-segment window over an hour hides most stops
    let short = config.analysis.short_segment_secs;
    if short.is_finite() && short > 3600.0 {
        warnings.push(ValidationWarning {
            field: "analysis.short_segment_secs".to_string(),
            message: format!(
                "analysis.short_segment_secs = {short:.0} is over one hour, most segments will count as short"
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}
