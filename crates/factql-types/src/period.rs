//! Period formatting configuration

use serde::{Deserialize, Serialize};

/// Format strings for rendering a fact's period as text.
///
/// `instant` is a chrono format string applied to a single period endpoint.
/// `duration` is a template in which `{start}` and `{end}` are replaced with
/// the endpoints, each rendered with the `instant` format. `forever` is used
/// verbatim for facts with an unbounded period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFormats {
    pub instant: String,
    pub duration: String,
    pub forever: String,
}

impl Default for PeriodFormats {
    fn default() -> Self {
        Self {
            instant: "%d/%m/%Y".to_string(),
            duration: "{start} to {end}".to_string(),
            forever: String::new(),
        }
    }
}

impl PeriodFormats {
    /// Render the duration template with pre-formatted endpoints
    pub fn render_duration(&self, start: &str, end: &str) -> String {
        self.duration.replace("{start}", start).replace("{end}", end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_duration_template() {
        let formats = PeriodFormats::default();
        assert_eq!(
            formats.render_duration("01/04/2018", "31/03/2019"),
            "01/04/2018 to 31/03/2019"
        );
    }
}
