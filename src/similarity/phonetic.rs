// src/similarity/phonetic.rs - Soundex and Metaphone style codes
//
// Both encoders understand Latin and Cyrillic letters, since counterparty
// names arrive transliterated either way. Non-letters are ignored; a string
// without letters encodes to the empty string.

const SOUNDEX_LEN: usize = 4;
const METAPHONE_MAX_LEN: usize = 6;

fn is_latin_vowel(c: char) -> bool {
    matches!(c, 'A' | 'E' | 'I' | 'O' | 'U')
}

fn is_cyrillic_vowel(c: char) -> bool {
    matches!(c, 'А' | 'Е' | 'Ё' | 'И' | 'О' | 'У' | 'Ы' | 'Э' | 'Ю' | 'Я')
}

fn is_vowel(c: char) -> bool {
    is_latin_vowel(c) || is_cyrillic_vowel(c)
}

fn letters_upper(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// Soundex digit class. `'0'` marks vowel-like letters; `None` means the letter
/// is outside both alphabets.
fn soundex_class(c: char) -> Option<char> {
    let digit = match c {
        'A' | 'E' | 'I' | 'O' | 'U' | 'Y' | 'H' | 'W' => '0',
        'B' | 'F' | 'P' | 'V' => '1',
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => '2',
        'D' | 'T' => '3',
        'L' => '4',
        'M' | 'N' => '5',
        'R' => '6',
        'А' | 'Е' | 'Ё' | 'И' | 'О' | 'У' | 'Ы' | 'Э' | 'Ю' | 'Я' | 'Й' | 'Ь' | 'Ъ' => '0',
        'Б' | 'П' | 'Ф' | 'В' => '1',
        'Г' | 'К' | 'Х' => '2',
        'Д' | 'Т' => '3',
        'Ж' | 'Ш' | 'Щ' | 'Ч' => '4',
        'З' | 'С' | 'Ц' => '5',
        'Л' => '6',
        'М' | 'Н' => '7',
        'Р' => '8',
        _ => return None,
    };
    Some(digit)
}

/// Four-character Soundex code: first letter plus three consonant-class digits.
pub fn soundex(text: &str) -> String {
    let letters = letters_upper(text);
    let Some((&first, rest)) = letters.split_first() else {
        return String::new();
    };

    let mut code = String::with_capacity(SOUNDEX_LEN);
    code.push(first);
    let mut last = soundex_class(first);

    for &c in rest {
        if code.chars().count() == SOUNDEX_LEN {
            break;
        }
        // H and W do not separate letters of the same class
        if c == 'H' || c == 'W' {
            continue;
        }
        let class = soundex_class(c);
        if let Some(digit) = class {
            if digit != '0' && class != last {
                code.push(digit);
            }
        }
        last = class;
    }

    while code.chars().count() < SOUNDEX_LEN {
        code.push('0');
    }
    code
}

fn fold_cyrillic(c: char) -> Option<char> {
    match c {
        'Б' | 'П' => Some('П'),
        'В' | 'Ф' => Some('Ф'),
        'Г' | 'К' | 'Х' => Some('К'),
        'Д' | 'Т' => Some('Т'),
        'Ж' | 'Ш' | 'Щ' | 'Ч' => Some('Ш'),
        'З' | 'С' | 'Ц' => Some('С'),
        'Ь' | 'Ъ' => None,
        c if is_cyrillic_vowel(c) => None,
        c => Some(c),
    }
}

/// Metaphone-style code: consonant skeleton with sound-alike letters folded
/// together, keeping a leading vowel, capped at six characters.
pub fn metaphone(text: &str) -> String {
    let letters = letters_upper(text);
    if letters.is_empty() {
        return String::new();
    }

    let at = |i: usize| letters.get(i).copied();
    let next_is = |i: usize, set: &[char]| at(i + 1).map_or(false, |c| set.contains(&c));
    let next_is_vowel = |i: usize| at(i + 1).map_or(false, is_vowel);
    let front_vowels = ['E', 'I', 'Y'];

    let mut start = 0;
    match (at(0), at(1)) {
        (Some('K' | 'G' | 'P'), Some('N')) | (Some('W'), Some('R')) | (Some('A'), Some('E')) => {
            start = 1
        }
        _ => {}
    }

    fn push(code: &mut String, emitted: &str) {
        for ch in emitted.chars() {
            if !code.ends_with(ch) {
                code.push(ch);
            }
        }
    }

    let mut code = String::new();

    let mut i = start;
    while i < letters.len() {
        let c = letters[i];
        let prev = if i > 0 { at(i - 1) } else { None };

        if i > start && prev == Some(c) && c != 'C' {
            i += 1;
            continue;
        }

        if is_vowel(c) {
            if i == start {
                push(&mut code, &c.to_string());
            }
            i += 1;
            continue;
        }

        if !c.is_ascii() {
            if let Some(folded) = fold_cyrillic(c) {
                push(&mut code, &folded.to_string());
            }
            i += 1;
            continue;
        }

        if matches!(c, 'F' | 'J' | 'L' | 'M' | 'N' | 'R') {
            push(&mut code, &c.to_string());
            i += 1;
            continue;
        }

        let emitted: &str = match c {
            'B' => {
                if prev == Some('M') && at(i + 1).is_none() {
                    ""
                } else {
                    "B"
                }
            }
            'C' => {
                if next_is(i, &['I']) && at(i + 2) == Some('A') {
                    "X"
                } else if next_is(i, &['H']) {
                    i += 1;
                    "X"
                } else if next_is(i, &front_vowels) {
                    if prev == Some('S') {
                        ""
                    } else {
                        "S"
                    }
                } else {
                    "K"
                }
            }
            'D' => {
                if next_is(i, &['G']) && at(i + 2).map_or(false, |c| front_vowels.contains(&c)) {
                    i += 1;
                    "J"
                } else {
                    "T"
                }
            }
            'G' => {
                if next_is(i, &['H']) && !at(i + 2).map_or(false, is_vowel) {
                    i += 1;
                    ""
                } else if next_is(i, &['N']) && at(i + 2).is_none() {
                    ""
                } else if next_is(i, &front_vowels) {
                    "J"
                } else {
                    "K"
                }
            }
            'H' => {
                let after_modifier = matches!(prev, Some('C' | 'G' | 'P' | 'S' | 'T'));
                if next_is_vowel(i) && !after_modifier {
                    "H"
                } else {
                    ""
                }
            }
            'K' => {
                if prev == Some('C') {
                    ""
                } else {
                    "K"
                }
            }
            'P' => {
                if next_is(i, &['H']) {
                    i += 1;
                    "F"
                } else {
                    "P"
                }
            }
            'Q' => "K",
            'S' => {
                if next_is(i, &['H']) {
                    i += 1;
                    "X"
                } else if next_is(i, &['I']) && matches!(at(i + 2), Some('O' | 'A')) {
                    "X"
                } else {
                    "S"
                }
            }
            'T' => {
                if next_is(i, &['I']) && matches!(at(i + 2), Some('O' | 'A')) {
                    "X"
                } else if next_is(i, &['H']) {
                    i += 1;
                    "0"
                } else if next_is(i, &['C']) && at(i + 2) == Some('H') {
                    ""
                } else {
                    "T"
                }
            }
            'V' => "F",
            'W' | 'Y' => {
                if next_is_vowel(i) {
                    if c == 'W' {
                        "W"
                    } else {
                        "Y"
                    }
                } else {
                    ""
                }
            }
            'X' => {
                if i == start {
                    "S"
                } else {
                    "KS"
                }
            }
            'Z' => "S",
            _ => "",
        };
        push(&mut code, emitted);
        i += 1;
    }

    code.chars().take(METAPHONE_MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soundex_latin() {
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("Ashcraft"), "A261");
        assert_eq!(soundex("Tymczak"), "T522");
        assert_eq!(soundex("Smith"), soundex("Smyth"));
        assert_eq!(soundex("Lee"), "L000");
    }

    #[test]
    fn test_soundex_cyrillic() {
        // М=7, Р=8, Н=7 after the initial letter
        assert_eq!(soundex("Смирнов"), "С787");
        assert_eq!(soundex("смирнов"), soundex("СМИРНОВ"));
    }

    #[test]
    fn test_soundex_without_letters() {
        assert_eq!(soundex(""), "");
        assert_eq!(soundex("12-34"), "");
    }

    #[test]
    fn test_metaphone_latin_rules() {
        assert_eq!(metaphone("Knight"), "NT");
        assert_eq!(metaphone("Philip"), "FLP");
        assert_eq!(metaphone("Thomas"), "0MS");
        assert_eq!(metaphone("Catherine"), metaphone("Kathrine"));
        assert_eq!(metaphone("Smith"), metaphone("Smyth"));
    }

    #[test]
    fn test_metaphone_cyrillic_folds_voicing() {
        // Б/П, Д/Т, З/С fold into one class
        assert_eq!(metaphone("Бодров"), metaphone("Потров"));
        assert_eq!(metaphone("Зуев"), metaphone("Суев"));
    }

    #[test]
    fn test_metaphone_truncates_and_handles_empty() {
        assert!(metaphone("Transnational Corporation Limited").chars().count() <= 6);
        assert_eq!(metaphone("..."), "");
    }
}
