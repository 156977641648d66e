/// Bengali digits zero through nine, indexed by value.
const BENGALI_DIGITS: [char; 10] = [
    '\u{09E6}', '\u{09E7}', '\u{09E8}', '\u{09E9}', '\u{09EA}', '\u{09EB}', '\u{09EC}', '\u{09ED}',
    '\u{09EE}', '\u{09EF}',
];

const DANDA: char = '\u{0964}';

/// Maps every Bengali digit to its ASCII digit and the danda to a period.
/// Nothing else changes, so the output has the same number of characters.
pub fn normalize_text(input: &str) -> String {
    input.chars().map(normalize_char).collect()
}

pub fn normalize_char(character: char) -> char {
    if character == DANDA {
        return '.';
    }

    match BENGALI_DIGITS.iter().position(|digit| *digit == character) {
        Some(value) => char::from(b'0' + value as u8),
        None => character,
    }
}

pub fn is_bengali(character: char) -> bool {
    ('\u{0980}'..='\u{09FF}').contains(&character)
}

pub fn bengali_char_count(text: &str) -> usize {
    text.chars().filter(|character| is_bengali(*character)).count()
}
