//! Grouped means and baseline comparisons printed alongside every chart.

use std::collections::BTreeMap;

/// Mean per (category, series) cell, fed one observation at a time.
#[derive(Debug, Default)]
pub struct CellMeans {
    sums: BTreeMap<(String, String), (f64, usize)>,
}

impl CellMeans {
    pub fn add(&mut self, category: &str, series: &str, value: f64) {
        let cell = self
            .sums
            .entry((category.to_string(), series.to_string()))
            .or_insert((0.0, 0));
        cell.0 += value;
        cell.1 += 1;
    }

    pub fn means(&self) -> BTreeMap<(String, String), f64> {
        self.sums
            .iter()
            .map(|(key, (sum, count))| (key.clone(), sum / *count as f64))
            .collect()
    }

    /// Mean over every observation of one series across all categories.
    pub fn series_mean(&self, series: &str) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0;
        for ((_, s), (cell_sum, cell_count)) in &self.sums {
            if s == series {
                sum += cell_sum;
                count += cell_count;
            }
        }
        (count > 0).then(|| sum / count as f64)
    }

    /// Distinct series names in sorted order, the baseline moved to the
    /// front when present.
    pub fn series_order(&self, baseline: &str) -> Vec<String> {
        let mut series: Vec<String> = self
            .sums
            .keys()
            .map(|(_, s)| s.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        if let Some(index) = series.iter().position(|s| s == baseline) {
            let base = series.remove(index);
            series.insert(0, base);
        }
        series
    }

    /// Per-series means and the percentage gap of every other series to the
    /// baseline, printed in the study's format.
    pub fn print_baseline_gaps(&self, baseline: &str, series_order: &[&str]) {
        let Some(base) = self.series_mean(baseline) else {
            println!("(no data for baseline {baseline})");
            return;
        };
        for series in series_order {
            let Some(mean) = self.series_mean(series) else {
                continue;
            };
            if series == &baseline {
                println!("{series}: {mean:.3}");
            } else {
                println!("{series}: {mean:.3} ({:+.2}%)", (base - mean) / base * 100.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_and_series_means() {
        let mut means = CellMeans::default();
        means.add("HIGH", "Greedy", 10.0);
        means.add("HIGH", "Greedy", 20.0);
        means.add("LOW", "Greedy", 60.0);
        means.add("HIGH", "SARound", 40.0);

        let cells = means.means();
        assert_eq!(cells[&("HIGH".to_string(), "Greedy".to_string())], 15.0);
        assert_eq!(means.series_mean("Greedy"), Some(30.0));
        assert_eq!(means.series_mean("SARound"), Some(40.0));
        assert_eq!(means.series_mean("FastLR"), None);
        assert_eq!(means.series_order("SARound"), ["SARound", "Greedy"]);
    }
}
