use serde::Serialize;

use crate::codes::{Fips, Zip};

/// City and state the USPS associates with a ZIP code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Place {
    pub city: String,
    pub state: String,
}

/// Look up city and state from a US zip code
pub fn place_for_zip(zip: &Zip) -> Option<Place> {
    let zip = zip.as_str();
    // Avoid zipcodes::matching to suppress debug_print output.
    let results = zipcodes::filter_by(vec![|z: &zipcodes::Zipcode| z.zip_code == zip], None).ok()?;
    let info = results.first()?;
    Some(Place {
        city: info.city.clone(),
        state: info.state.clone(),
    })
}

/// Describe a county code for display, e.g. `36061 (NY)` or
/// `36061 (New York, NY)` when the ZIP resolves to a place.
pub fn describe_county(fips: &Fips, zip: Option<&Zip>) -> String {
    match (zip.and_then(place_for_zip), fips.state_abbr()) {
        (Some(place), _) => format!("{} ({}, {})", fips, place.city, place.state),
        (None, Some(state)) => format!("{} ({})", fips, state),
        (None, None) => fips.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_for_zip() {
        let zip: Zip = "10001".parse().unwrap();
        assert_eq!(place_for_zip(&zip).unwrap().state, "NY");

        let zip: Zip = "00000".parse().unwrap();
        assert!(place_for_zip(&zip).is_none());
    }

    #[test]
    fn test_describe_without_place() {
        let fips: Fips = "46019".parse().unwrap();
        assert_eq!(describe_county(&fips, None), "46019 (SD)");

        let fips: Fips = "99001".parse().unwrap();
        assert_eq!(describe_county(&fips, None), "99001");
    }
}
