//! Free-text region name → canonical region + artifact key.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::config::DEFAULT_SIMILARITY_THRESHOLD;
use crate::error::{ForecastError, ResolverError};
use crate::matcher::best_match;

/// Trim surrounding whitespace and uppercase.
pub fn normalize(text: &str) -> String {
    text.trim().to_uppercase()
}

/// Replace every run of whitespace in a canonical name with a single `_`.
pub fn artifact_key(canonical: &str) -> String {
    canonical.split_whitespace().collect::<Vec<_>>().join("_")
}

/// A region the input resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Canonical region name as found in the dataset
    pub region: String,
    /// Lookup key for the region's model and scaler
    pub key: String,
    /// Similarity of the normalized input to `region`
    pub score: f64,
}

/// Resolves user text against a fixed catalog of canonical region names.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    catalog: BTreeSet<String>,
    threshold: f64,
}

impl ArtifactResolver {
    /// Build a resolver over `regions`, normalizing each name.
    ///
    /// Fails if two distinct canonical names derive the same artifact key.
    pub fn new<I, S>(regions: I, threshold: f64) -> Result<Self, ResolverError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let catalog: BTreeSet<String> = regions.into_iter().map(|r| normalize(r.as_ref())).collect();

        let mut seen: HashMap<String, &str> = HashMap::with_capacity(catalog.len());
        for region in &catalog {
            if let Some(first) = seen.insert(artifact_key(region), region) {
                return Err(ResolverError::KeyCollision {
                    key: artifact_key(region),
                    first: first.to_string(),
                    second: region.clone(),
                });
            }
        }

        Ok(ArtifactResolver { catalog, threshold })
    }

    pub fn with_default_threshold<I, S>(regions: I) -> Result<Self, ResolverError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(regions, DEFAULT_SIMILARITY_THRESHOLD)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn catalog(&self) -> impl Iterator<Item = &str> + '_ {
        self.catalog.iter().map(String::as_str)
    }

    /// Match `text` to the closest canonical region and derive its key.
    pub fn resolve(&self, text: &str) -> Result<Resolution, ForecastError> {
        let query = normalize(text);

        let found = best_match(&query, self.catalog(), self.threshold).ok_or_else(|| {
            debug!(input = text, threshold = self.threshold, "no region above threshold");
            ForecastError::RegionNotFound {
                input: text.trim().to_string(),
            }
        })?;

        debug!(input = text, region = found.candidate, score = found.score, "resolved region");
        Ok(Resolution {
            region: found.candidate.to_string(),
            key: artifact_key(found.candidate),
            score: found.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<&'static str> {
        vec![
            "Andaman & Nicobar Islands",
            "Haryana Delhi & Chandigarh",
            "KERALA",
            "East Rajasthan",
            "West Rajasthan",
            "Punjab",
        ]
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["  haryana Delhi & chandigarh\t", "KERALA", "", " x "] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
        assert_eq!(normalize("  west rajasthan "), "WEST RAJASTHAN");
    }

    #[test]
    fn test_artifact_key() {
        assert_eq!(artifact_key("HARYANA DELHI & CHANDIGARH"), "HARYANA_DELHI_&_CHANDIGARH");
        assert_eq!(artifact_key("A  B\tC"), "A_B_C");
        assert_eq!(artifact_key("KERALA"), "KERALA");
    }

    #[test]
    fn test_resolve_exact_and_fuzzy() {
        let resolver = ArtifactResolver::with_default_threshold(catalog()).unwrap();

        let exact = resolver.resolve("kerala").unwrap();
        assert_eq!(exact.region, "KERALA");
        assert_eq!(exact.score, 1.0);

        let fuzzy = resolver.resolve("haryana delhi and chandigarh").unwrap();
        assert_eq!(fuzzy.region, "HARYANA DELHI & CHANDIGARH");
        assert_eq!(fuzzy.key, "HARYANA_DELHI_&_CHANDIGARH");
        assert!(fuzzy.score >= 0.6 && fuzzy.score < 1.0);

        let typo = resolver.resolve(" west rajastan").unwrap();
        assert_eq!(typo.region, "WEST RAJASTHAN");
    }

    #[test]
    fn test_resolve_key_style_input() {
        let resolver = ArtifactResolver::with_default_threshold(catalog()).unwrap();
        let resolution = resolver.resolve("HARYANA_DELHI_&_CHANDIGARH").unwrap();
        assert_eq!(resolution.region, "HARYANA DELHI & CHANDIGARH");
    }

    #[test]
    fn test_resolve_not_found() {
        let resolver = ArtifactResolver::with_default_threshold(catalog()).unwrap();
        let err = resolver.resolve("ATLANTIS").unwrap_err();
        assert!(matches!(err, ForecastError::RegionNotFound { ref input } if input == "ATLANTIS"));

        assert!(resolver.resolve("").is_err());
    }

    #[test]
    fn test_empty_catalog_never_matches() {
        let resolver = ArtifactResolver::with_default_threshold(Vec::<String>::new()).unwrap();
        assert_eq!(resolver.threshold(), DEFAULT_SIMILARITY_THRESHOLD);
        assert!(resolver.resolve("KERALA").is_err());
    }

    #[test]
    fn test_keys_are_injective_over_catalog() {
        let resolver = ArtifactResolver::with_default_threshold(catalog()).unwrap();
        let keys: BTreeSet<String> = resolver.catalog().map(artifact_key).collect();
        assert_eq!(keys.len(), resolver.catalog().count());
    }

    #[test]
    fn test_key_collision_detected() {
        let err = ArtifactResolver::with_default_threshold(["NORTH  KARNATAKA", "north karnataka"]).unwrap_err();
        match err {
            ResolverError::KeyCollision { key, .. } => assert_eq!(key, "NORTH_KARNATAKA"),
        }
    }
}
