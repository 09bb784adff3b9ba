//! Fixed-width ZIP and FIPS county codes.
//!
//! Both codes are exactly five ASCII digits and are kept as text so leading
//! zeros survive (`"00601"` is not `601`). Parsing never normalizes: anything
//! that is not five digits is rejected. The only padding entry point is
//! `Zip::zero_padded`, used when ingesting loosely formatted volume data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

const CODE_LEN: usize = 5;

fn parse_digits(what: &str, s: &str) -> Result<[u8; CODE_LEN], LookupError> {
    let bytes = s.as_bytes();
    if bytes.len() != CODE_LEN || !bytes.iter().all(u8::is_ascii_digit) {
        return Err(LookupError::format(format!(
            "{} must be 5 digits, got {:?}",
            what, s
        )));
    }
    let mut digits = [0u8; CODE_LEN];
    digits.copy_from_slice(bytes);
    Ok(digits)
}

fn pad_digits(what: &str, s: &str) -> Result<[u8; CODE_LEN], LookupError> {
    let s = s.trim();
    if s.is_empty() || s.len() > CODE_LEN {
        return Err(LookupError::format(format!(
            "{} must be 1 to 5 digits, got {:?}",
            what, s
        )));
    }
    parse_digits(what, &format!("{:0>5}", s))
}

macro_rules! code_type {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name([u8; CODE_LEN]);

        impl $name {
            pub fn as_str(&self) -> &str {
                // Constructed only from ASCII digits.
                std::str::from_utf8(&self.0).unwrap_or_default()
            }
        }

        impl FromStr for $name {
            type Err = LookupError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_digits($what, s).map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = LookupError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(code: $name) -> Self {
                code.as_str().to_string()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }
    };
}

code_type!(
    /// A 5-digit US ZIP code.
    Zip,
    "ZIP"
);

code_type!(
    /// A 5-digit FIPS county code: 2-digit state followed by 3-digit county.
    Fips,
    "FIPS"
);

impl Zip {
    /// Left-pad 1 to 5 digits with zeros (`"601"` becomes `"00601"`).
    pub fn zero_padded(s: &str) -> Result<Self, LookupError> {
        pad_digits("ZIP", s).map(Self)
    }
}

impl Fips {
    /// The 2-digit state part.
    pub fn state(&self) -> &str {
        &self.as_str()[..2]
    }

    /// The 3-digit county part, relative to the state.
    pub fn county(&self) -> &str {
        &self.as_str()[2..]
    }

    /// USPS abbreviation for the state part, if it names a state or territory.
    pub fn state_abbr(&self) -> Option<&'static str> {
        let abbr = match self.state() {
            "01" => "AL",
            "02" => "AK",
            "04" => "AZ",
            "05" => "AR",
            "06" => "CA",
            "08" => "CO",
            "09" => "CT",
            "10" => "DE",
            "11" => "DC",
            "12" => "FL",
            "13" => "GA",
            "15" => "HI",
            "16" => "ID",
            "17" => "IL",
            "18" => "IN",
            "19" => "IA",
            "20" => "KS",
            "21" => "KY",
            "22" => "LA",
            "23" => "ME",
            "24" => "MD",
            "25" => "MA",
            "26" => "MI",
            "27" => "MN",
            "28" => "MS",
            "29" => "MO",
            "30" => "MT",
            "31" => "NE",
            "32" => "NV",
            "33" => "NH",
            "34" => "NJ",
            "35" => "NM",
            "36" => "NY",
            "37" => "NC",
            "38" => "ND",
            "39" => "OH",
            "40" => "OK",
            "41" => "OR",
            "42" => "PA",
            "44" => "RI",
            "45" => "SC",
            "46" => "SD",
            "47" => "TN",
            "48" => "TX",
            "49" => "UT",
            "50" => "VT",
            "51" => "VA",
            "53" => "WA",
            "54" => "WV",
            "55" => "WI",
            "56" => "WY",
            "60" => "AS",
            "66" => "GU",
            "69" => "MP",
            "72" => "PR",
            "78" => "VI",
            _ => return None,
        };
        Some(abbr)
    }
}
