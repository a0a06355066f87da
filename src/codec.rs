//! AVC codec tag resolution.
//!
//! An `avc1.PPCCLL` codec tag carries the profile indication in characters
//! 5..7 and the constraint flags plus level in characters 7..11. Both are
//! looked up in fixed tables. Values missing from a table resolve to
//! [`CodecProperty::Unknown`] rather than to nothing, so a report can tell
//! "not AVC" apart from "AVC with an encoding we do not know".

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Serialize, Serializer};

const PROFILES: &[(&str, &str)] = &[
    ("42", "Baseline"),
    ("4D", "Main"),
    ("4E", "Extended"),
    ("64", "High"),
    ("6E", "Hi10P"),
    ("7A", "Hi422P"),
];

// Several levels appear with and without the constraint_set1 flag.
const LEVELS: &[(&str, &str)] = &[
    ("400A", "1"),
    ("400B", "1.1"),
    ("400C", "1.2"),
    ("400D", "1.3"),
    ("4014", "2"),
    ("4015", "2.1"),
    ("4016", "2.2"),
    ("401E", "3"),
    ("001F", "3.1"),
    ("401F", "3.1"),
    ("0020", "3.2"),
    ("4020", "3.2"),
    ("0028", "4"),
    ("4028", "4"),
    ("0029", "4.1"),
    ("4029", "4.1"),
    ("002A", "4.2"),
    ("402A", "4.2"),
    ("4032", "5"),
    ("4033", "5.1"),
    ("4034", "5.2"),
];

/// A resolved profile or level name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecProperty {
    /// A name from the lookup table, e.g. `"High"` or `"4.1"`.
    Known(&'static str),
    /// The tag is AVC but the value is not in the table.
    Unknown,
}

impl CodecProperty {
    /// The name, or `"Unknown"`.
    pub fn as_str(self) -> &'static str {
        match self {
            CodecProperty::Known(name) => name,
            CodecProperty::Unknown => "Unknown",
        }
    }

    fn lookup(table: &[(&str, &'static str)], key: Option<&str>) -> Self {
        let resolved = key.and_then(|key| {
            let key = key.to_ascii_uppercase();
            table.iter().find(|(hex, _)| *hex == key).map(|(_, name)| *name)
        });
        match resolved {
            Some(name) => CodecProperty::Known(name),
            None => {
                log::debug!("no codec table entry for {key:?}");
                CodecProperty::Unknown
            }
        }
    }
}

impl Display for CodecProperty {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Serialize for CodecProperty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Profile and level of an AVC codec tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvcProfileLevel {
    /// Profile name, e.g. `High`.
    pub profile: CodecProperty,
    /// Level, e.g. `4.1`.
    pub level: CodecProperty,
}

/// Resolve the profile and level of an AVC codec tag.
///
/// Returns `None` for tags that are not `avc1`.
///
/// # Example
///
/// ```
/// use mediastruct::codec::{CodecProperty, avc_profile_and_level};
///
/// let avc = avc_profile_and_level("avc1.640028").unwrap();
/// assert_eq!(avc.profile, CodecProperty::Known("High"));
/// assert_eq!(avc.level, CodecProperty::Known("4"));
/// assert!(avc_profile_and_level("hev1.1.6.L93.B0").is_none());
/// ```
pub fn avc_profile_and_level(codec_tag: &str) -> Option<AvcProfileLevel> {
    let tag = codec_tag.trim();
    if !tag.starts_with("avc1") {
        return None;
    }
    Some(AvcProfileLevel {
        profile: CodecProperty::lookup(PROFILES, tag.get(5..7)),
        level: CodecProperty::lookup(LEVELS, tag.get(7..11)),
    })
}
