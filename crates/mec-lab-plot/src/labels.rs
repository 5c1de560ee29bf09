//! Display names for the categorical values embedded in the result files.

/// Paper-facing scheme names.
pub fn scheme_label(raw: &str) -> &str {
    match raw {
        "GameTheory" => "Game",
        "GraphMatch" => "Graph",
        other => other,
    }
}

/// CQI pilot settings shown as network quality levels.
pub fn quality_label(raw: &str) -> &str {
    match raw {
        "MAX_CQI" => "HIGH",
        "MEDIAN_CQI" => "MEDIUM",
        "MIN_CQI" => "LOW",
        other => other,
    }
}

/// Failure probability shown per run flavor: runs without route updates
/// ("disabled") carry a `-D` suffix so both flavors fit one chart.
pub fn ratio_label(error_prob: &str, route_update: &str) -> String {
    if route_update == "false" {
        format!("{error_prob}-D")
    } else {
        error_prob.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_passthrough_labels() {
        assert_eq!(scheme_label("GameTheory"), "Game");
        assert_eq!(scheme_label("FastSA"), "FastSA");
        assert_eq!(quality_label("MEDIAN_CQI"), "MEDIUM");
        assert_eq!(ratio_label("0.2", "false"), "0.2-D");
        assert_eq!(ratio_label("0.2", "true"), "0.2");
    }
}
