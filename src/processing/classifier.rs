use serde::{Deserialize, Serialize};

use crate::state::channel_spec::{Band, ChannelSpec};

/// Health of a channel over a window, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Unclassified,
    WithinAbsolute,
    WithinTypical,
    OutsideTypical,
    OutsideAbsolute,
}

impl Default for Status {
    fn default() -> Self {
        Status::Unclassified
    }
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Unclassified => "unclassified",
            Status::WithinAbsolute => "within absolute",
            Status::WithinTypical => "within typical",
            Status::OutsideTypical => "outside typical",
            Status::OutsideAbsolute => "outside absolute",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Status::Unclassified => "\u{2753}",
            Status::WithinAbsolute | Status::WithinTypical => "\u{2705}",
            Status::OutsideTypical => "\u{26a0}\u{fe0f}",
            Status::OutsideAbsolute => "\u{274c}",
        }
    }

    /// Most severe status of a set, `Unclassified` when empty.
    pub fn worst<I: IntoIterator<Item = Status>>(statuses: I) -> Status {
        statuses.into_iter().max().unwrap_or_default()
    }
}

fn any_outside(values: &[f64], band: &Band) -> bool {
    values.iter().any(|&v| !band.contains(v))
}

/// Classify values against a channel's bands. The absolute band is checked
/// first, so a breach of both bands reports `OutsideAbsolute`.
pub fn classify(values: &[f64], spec: &ChannelSpec) -> Status {
    if let Some(absolute) = &spec.absolute {
        if any_outside(values, absolute) {
            return Status::OutsideAbsolute;
        }
    }
    match (&spec.typical, &spec.absolute) {
        (Some(typical), _) if any_outside(values, typical) => Status::OutsideTypical,
        (Some(_), _) => Status::WithinTypical,
        (None, Some(_)) => Status::WithinAbsolute,
        (None, None) => Status::Unclassified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both() -> ChannelSpec {
        ChannelSpec::default().typical(10.0, 20.0).absolute(0.0, 30.0)
    }

    #[test]
    fn typical_breach_only() {
        assert_eq!(classify(&[12.0, 25.0], &both()), Status::OutsideTypical);
    }

    #[test]
    fn absolute_breach_wins() {
        assert_eq!(classify(&[12.0, 25.0, 31.0], &both()), Status::OutsideAbsolute);
        assert_eq!(classify(&[-1.0], &both()), Status::OutsideAbsolute);
    }

    #[test]
    fn inside_typical() {
        assert_eq!(classify(&[10.0, 20.0, 15.0], &both()), Status::WithinTypical);
        let typical_only = ChannelSpec::default().typical(10.0, 20.0);
        assert_eq!(classify(&[11.0], &typical_only), Status::WithinTypical);
        assert_eq!(classify(&[21.0], &typical_only), Status::OutsideTypical);
    }

    #[test]
    fn absolute_only() {
        let spec = ChannelSpec::default().absolute(0.0, 5.0);
        assert_eq!(classify(&[0.0, 5.0], &spec), Status::WithinAbsolute);
        assert_eq!(classify(&[6.0], &spec), Status::OutsideAbsolute);
    }

    #[test]
    fn no_bands_unclassified() {
        assert_eq!(classify(&[1e9], &ChannelSpec::default()), Status::Unclassified);
    }

    #[test]
    fn severity_order() {
        assert!(Status::OutsideAbsolute > Status::OutsideTypical);
        assert!(Status::OutsideTypical > Status::WithinTypical);
        assert!(Status::WithinTypical > Status::WithinAbsolute);
        assert!(Status::WithinAbsolute > Status::Unclassified);
        assert_eq!(
            Status::worst([Status::WithinTypical, Status::OutsideTypical, Status::Unclassified]),
            Status::OutsideTypical
        );
        assert_eq!(Status::worst(Vec::new()), Status::Unclassified);
    }
}
