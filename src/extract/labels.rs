//! Label tokens printed on the roll, and the declarative rules that pull
//! field values out of one record chunk.
//!
//! Regex fragments spell Bengali with `\x{..}` escapes so that composed and
//! decomposed nukta forms stay distinguishable in review.

use crate::model::RecordField;

/// A printed label and the spellings OCR is known to produce for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelToken {
    pub key: &'static str,
    pub variants: &'static [&'static str],
}

impl LabelToken {
    /// Byte offset of the earliest variant occurrence starting at or after `from`.
    pub fn find_from(&self, value: &str, from: usize) -> Option<usize> {
        let tail = value.get(from..)?;
        self.variants
            .iter()
            .filter_map(|variant| tail.find(variant))
            .min()
            .map(|offset| offset + from)
    }

    pub fn count_in(&self, value: &str) -> usize {
        self.variants
            .iter()
            .map(|variant| value.matches(variant).count())
            .sum()
    }
}

// পিতা
pub const FATHER: LabelToken = LabelToken {
    key: "father",
    variants: &["\u{09AA}\u{09BF}\u{09A4}\u{09BE}"],
};

// মাতা
pub const MOTHER: LabelToken = LabelToken {
    key: "mother",
    variants: &["\u{09AE}\u{09BE}\u{09A4}\u{09BE}"],
};

// স্বামী
pub const HUSBAND: LabelToken = LabelToken {
    key: "husband",
    variants: &["\u{09B8}\u{09CD}\u{09AC}\u{09BE}\u{09AE}\u{09C0}"],
};

// পেশা
pub const OCCUPATION: LabelToken = LabelToken {
    key: "occupation",
    variants: &["\u{09AA}\u{09C7}\u{09B6}\u{09BE}"],
};

// জন্ম
pub const BIRTH: LabelToken = LabelToken {
    key: "birth",
    variants: &["\u{099C}\u{09A8}\u{09CD}\u{09AE}"],
};

// তারিখ, তারিব
pub const DATE: LabelToken = LabelToken {
    key: "date",
    variants: &[
        "\u{09A4}\u{09BE}\u{09B0}\u{09BF}\u{0996}",
        "\u{09A4}\u{09BE}\u{09B0}\u{09BF}\u{09AC}",
    ],
};

// ঠিকানা
pub const ADDRESS: LabelToken = LabelToken {
    key: "address",
    variants: &["\u{09A0}\u{09BF}\u{0995}\u{09BE}\u{09A8}\u{09BE}"],
};

// ভোটার, and two spellings of the OCR reading ভোয়ার
pub const VOTER: LabelToken = LabelToken {
    key: "voter",
    variants: &[
        "\u{09AD}\u{09CB}\u{099F}\u{09BE}\u{09B0}",
        "\u{09AD}\u{09CB}\u{09AF}\u{09BC}\u{09BE}\u{09B0}",
        "\u{09AD}\u{09CB}\u{09DF}\u{09BE}\u{09B0}",
    ],
};

/// Labels whose appearance inside another field's value means a neighbouring
/// column bled into it.
pub const KNOWN_LABELS: &[LabelToken] = &[
    FATHER, MOTHER, HUSBAND, OCCUPATION, BIRTH, DATE, ADDRESS, VOTER,
];

// মহিলা
pub const FEMALE_MARKER: &str = "\u{09AE}\u{09B9}\u{09BF}\u{09B2}\u{09BE}";
// পুরুষ
pub const MALE_MARKER: &str = "\u{09AA}\u{09C1}\u{09B0}\u{09C1}\u{09B7}";

/// Serial, separator, name label, separator, then the raw name to end of line.
pub const ANCHOR_PATTERN: &str =
    r"([0-9]{1,4})\s*[.\-)]\s*\x{09A8}\x{09BE}[\x{09AE}\x{09B7}]\s*[:\x{FF1A};.]\s*([^\n]*)";

/// The start of a following record inside a name payload.
pub const EMBEDDED_ANCHOR_PATTERN: &str = r"[0-9]{1,4}\s*[.\-]\s*\x{09A8}\x{09BE}[\x{09AE}\x{09B7}]";

/// `label:` artifacts removed by the post-merge pass.
pub const ARTIFACT_PATTERNS: &[&str] = &[
    r"\x{09A0}\x{09BF}\x{0995}\x{09BE}\x{09A8}\x{09BE}\s*:",
    r"\x{09AA}\x{09BF}\x{09A4}\x{09BE}\x{0983}?\s*:",
    r"\x{09AE}\x{09BE}\x{09A4}\x{09BE}\s*:",
    r"\x{09AA}\x{09C7}\x{09B6}\x{09BE}\s*:",
    r"\x{09AD}\x{09CB}[\x{09AF}\x{09DF}\x{099F}]?\x{09BC}?\x{09BE}?\x{09B0}\s*\x{09A8}[\x{0982}\x{09AE}\x{09C7}]",
];

/// How a captured value is turned into a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    /// Field cleaner, told which label produced the value.
    Clean(LabelToken),
    /// Field cleaner with address rules, then doubled-block truncation.
    Address,
    /// Whitespace dropped and digits normalized.
    Digits,
    /// Digits normalized, otherwise kept as captured.
    Verbatim,
}

/// One label rule. The compiled pattern is
/// `(?i)(?:label)\s*separator\s*value`; each capture group in `value` feeds
/// the field at the same position in `captures`. Only the first match in a
/// chunk is used. `fallbacks` are tried, independently, only when the rule
/// itself does not match.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub label: &'static str,
    pub separator: &'static str,
    pub value: &'static str,
    pub captures: &'static [(RecordField, Treatment)],
    pub fallbacks: &'static [FieldRule],
}

impl FieldRule {
    pub fn pattern(&self) -> String {
        format!(
            r"(?i)(?:{})\s*{}\s*{}",
            self.label, self.separator, self.value
        )
    }
}

const SEPARATOR: &str = r"[:\x{FF1A}.\-]";
const REST_OF_LINE: &str = r"([^\n]*)";

// ভোটার নং and the corrupted readings OCR produces for it
const VOTER_NUMBER: FieldRule = FieldRule {
    label: r"(?:\x{09AD}\x{09CB}[\x{09AF}\x{09DF}]?\x{09BC}?\x{09BE}?\x{09B0}|\x{09AD}\x{09BE}[\x{09B0}\x{09A4}]\x{09BE}?\x{09B0}?|\x{09B0})\s*\x{09A8}[\x{0982}\x{09AE}\x{09C7}]\x{09CD}?\x{09AC}?\x{09B0}?",
    separator: r"[:\x{FF1A}.\-\s]",
    value: r"([0-9\x{09E6}-\x{09EF}\s]{5,20})",
    captures: &[(RecordField::VoterNo, Treatment::Digits)],
    fallbacks: &[],
};

const FATHER_NAME: FieldRule = FieldRule {
    label: r"\x{09AA}\x{09BF}\x{09A4}\x{09BE}\x{0983}?",
    separator: SEPARATOR,
    value: REST_OF_LINE,
    captures: &[(RecordField::FatherName, Treatment::Clean(FATHER))],
    fallbacks: &[],
};

const MOTHER_NAME: FieldRule = FieldRule {
    label: r"\x{09AE}\x{09BE}\x{09A4}\x{09BE}",
    separator: SEPARATOR,
    value: REST_OF_LINE,
    captures: &[(RecordField::MotherName, Treatment::Clean(MOTHER))],
    fallbacks: &[],
};

const HUSBAND_NAME: FieldRule = FieldRule {
    label: r"\x{09B8}\x{09CD}\x{09AC}\x{09BE}\x{09AE}\x{09C0}",
    separator: SEPARATOR,
    value: REST_OF_LINE,
    captures: &[(RecordField::HusbandName, Treatment::Clean(HUSBAND))],
    fallbacks: &[],
};

const BIRTH_DATE_ONLY: FieldRule = FieldRule {
    label: r"\x{09A4}\x{09BE}\x{09B0}\x{09BF}[\x{0996}\x{09AC}]",
    separator: r"[:\x{FF1A}.\-\s]*",
    value: r"([0-9\x{09E6}-\x{09EF}/.\-]{6,12})",
    captures: &[(RecordField::DateOfBirth, Treatment::Verbatim)],
    fallbacks: &[],
};

const OCCUPATION_ONLY: FieldRule = FieldRule {
    label: r"\x{09AA}\x{09C7}\x{09B6}\x{09BE}",
    separator: SEPARATOR,
    value: r"([^\n,]{2,30})",
    captures: &[(RecordField::Occupation, Treatment::Clean(OCCUPATION))],
    fallbacks: &[],
};

// পেশা: X, জন্ম তারিখ: Y on one line
const OCCUPATION_AND_BIRTH_DATE: FieldRule = FieldRule {
    label: r"\x{09AA}\x{09C7}\x{09B6}\x{09BE}",
    separator: SEPARATOR,
    value: r"([^,\n]*?)(?:[,\s]+)?\x{099C}\x{09A8}\x{09CD}?\x{09AE}?\x{09BE}?\s*\x{09A4}\x{09BE}\x{09B0}\x{09BF}[\x{0996}\x{09AC}][:\x{FF1A}.\-\s]*([0-9\x{09E6}-\x{09EF}/.\-]+)",
    captures: &[
        (RecordField::Occupation, Treatment::Clean(OCCUPATION)),
        (RecordField::DateOfBirth, Treatment::Verbatim),
    ],
    fallbacks: &[BIRTH_DATE_ONLY, OCCUPATION_ONLY],
};

const ADDRESS_LINE: FieldRule = FieldRule {
    label: r"\x{09A0}\x{09BF}\x{0995}\x{09BE}\x{09A8}\x{09BE}",
    separator: SEPARATOR,
    value: REST_OF_LINE,
    captures: &[(RecordField::Address, Treatment::Address)],
    fallbacks: &[],
};

// NID, or জাতীয় পরিচয় (পত্র) (নং)
const NATIONAL_ID: FieldRule = FieldRule {
    label: r"(?:NID|\x{099C}\x{09BE}\x{09A4}\x{09C0}(?:\x{09AF}\x{09BC}|\x{09DF})\s*\x{09AA}\x{09B0}\x{09BF}\x{099A}(?:\x{09AF}\x{09BC}|\x{09DF}))\s*(?:\x{09AA}\x{09A4}\x{09CD}\x{09B0})?\s*(?:\x{09A8}\x{0982})?",
    separator: SEPARATOR,
    value: r"([0-9\x{09E6}-\x{09EF}]+)",
    captures: &[(RecordField::Nid, Treatment::Digits)],
    fallbacks: &[],
};

pub const FIELD_RULES: &[FieldRule] = &[
    VOTER_NUMBER,
    FATHER_NAME,
    MOTHER_NAME,
    HUSBAND_NAME,
    OCCUPATION_AND_BIRTH_DATE,
    ADDRESS_LINE,
    NATIONAL_ID,
];
