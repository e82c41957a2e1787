use serde::Serialize;
use utoipa::ToSchema;

use crate::tle::TleError;

const FALLBACK_NAME: &str = "ISS (ZARYA)";
const FALLBACK_LINE1: &str =
    "1 25544U 98067A   24241.03733169  .00022625  00000+0  40054-3 0  9997";
const FALLBACK_LINE2: &str =
    "2 25544  51.6393 319.3593 0006301 282.8570 136.4539 15.50177998469691";

/// Where an element set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Network,
    Cache,
    Fallback,
}

/// A validated three-line element set.
///
/// Construction goes through [`ElementSet::parse`], which runs the lines
/// through the SGP4 TLE parser (field layout and checksum), so a value of this
/// type is always usable by the propagator.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ElementSet {
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub provenance: Provenance,
}

impl ElementSet {
    pub fn parse(
        name: &str,
        line1: &str,
        line2: &str,
        provenance: Provenance,
    ) -> Result<Self, TleError> {
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();
        sgp4::Elements::from_tle(
            Some(name.to_string()),
            line1.as_bytes(),
            line2.as_bytes(),
        )?;

        Ok(Self {
            name: name.trim().to_string(),
            line1: line1.to_string(),
            line2: line2.to_string(),
            provenance,
        })
    }

    /// Known-good historical ISS elements, used when nothing fresher is available.
    pub fn fallback() -> Self {
        Self {
            name: FALLBACK_NAME.to_string(),
            line1: FALLBACK_LINE1.to_string(),
            line2: FALLBACK_LINE2.to_string(),
            provenance: Provenance::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }

    /// Same orbital data, ignoring where it was obtained.
    pub fn same_elements(&self, other: &ElementSet) -> bool {
        self.name == other.name && self.line1 == other.line1 && self.line2 == other.line2
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn to_cache_text(&self) -> String {
        format!("{}\n{}\n{}\n", self.name, self.line1, self.line2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_well_formed() {
        let fallback = ElementSet::fallback();
        let parsed = ElementSet::parse(
            &fallback.name,
            &fallback.line1,
            &fallback.line2,
            Provenance::Fallback,
        )
        .unwrap();
        assert_eq!(parsed, fallback);
        assert!(parsed.is_fallback());
    }

    #[test]
    fn rejects_bad_checksum() {
        let fallback = ElementSet::fallback();
        let mut line1 = fallback.line1.clone();
        line1.replace_range(68..69, "0");
        let result = ElementSet::parse(&fallback.name, &line1, &fallback.line2, Provenance::Network);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_truncated_line() {
        let fallback = ElementSet::fallback();
        let result = ElementSet::parse(
            &fallback.name,
            &fallback.line1[..40],
            &fallback.line2,
            Provenance::Network,
        );
        assert!(result.is_err());
    }
}
