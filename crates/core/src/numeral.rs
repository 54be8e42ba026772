const ROMAN_TABLE: [(u64, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

pub const MAX_ROMAN: u64 = 3999;

/// Values outside `1..=3999` have no numeral and come back as decimal.
pub fn integer_to_roman(value: u64) -> String {
    if !(1..=MAX_ROMAN).contains(&value) {
        return value.to_string();
    }

    let mut remainder = value;
    let mut out = String::new();
    for (weight, symbol) in ROMAN_TABLE {
        while remainder >= weight {
            out.push_str(symbol);
            remainder -= weight;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radix {
    Binary,
    Octal,
    Decimal,
    Hex,
}

pub fn to_radix(value: u64, radix: Radix) -> String {
    match radix {
        Radix::Binary => format!("{value:b}"),
        Radix::Octal => format!("{value:o}"),
        Radix::Decimal => value.to_string(),
        Radix::Hex => format!("{value:x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(463, "CDLXIII")]
    #[case(464, "CDLXIV")]
    #[case(1386, "MCCCLXXXVI")]
    #[case(1838, "MDCCCXXXVIII")]
    #[case(3999, "MMMCMXCIX")]
    #[case(4000, "4000")]
    #[case(7070, "7070")]
    #[case(0, "0")]
    fn converts_to_roman(#[case] input: u64, #[case] expected: &str) {
        assert_eq!(integer_to_roman(input), expected);
    }

    #[test]
    fn radix_diverges_only_for_multi_digit_values() {
        for radix in [Radix::Binary, Radix::Octal, Radix::Hex] {
            assert_eq!(to_radix(1, radix), "1");
        }
        assert_eq!(to_radix(2, Radix::Binary), "10");
        assert_eq!(to_radix(8, Radix::Octal), "10");
        assert_eq!(to_radix(255, Radix::Hex), "ff");
    }

    proptest! {
        #[test]
        fn roman_uses_only_numeral_symbols(value in 1u64..=MAX_ROMAN) {
            let roman = integer_to_roman(value);
            prop_assert!(!roman.is_empty());
            prop_assert!(roman.chars().all(|c| "IVXLCDM".contains(c)));
        }

        #[test]
        fn roman_passes_large_values_through(value in 4000u64..1_000_000) {
            prop_assert_eq!(integer_to_roman(value), value.to_string());
        }
    }
}
