use crate::error::VariableError;
use rand::Rng;

pub const DEFAULT_RANDOM_LENGTH: usize = 10;
pub const MAX_RANDOM_LENGTH: usize = 255;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const ALPHANUMERIC: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharClass {
    Lowercase,
    Digits,
    LowercaseDigits,
    Alphanumeric,
    Custom(Vec<char>),
}

impl CharClass {
    pub fn pool(&self) -> Vec<char> {
        match self {
            Self::Lowercase => LOWERCASE.chars().collect(),
            Self::Digits => DIGITS.chars().collect(),
            Self::LowercaseDigits => LOWERCASE.chars().chain(DIGITS.chars()).collect(),
            Self::Alphanumeric => ALPHANUMERIC.chars().collect(),
            Self::Custom(chars) => chars.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RandomSpec {
    pub length: usize,
    pub class: CharClass,
}

impl RandomSpec {
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let pool = self.class.pool();
        (0..self.length)
            .map(|_| pool[rng.gen_range(0..pool.len())])
            .collect()
    }
}

/// Parses `[len]r[_l|_d|_ld|<chars>]`. `None` means the content is not a
/// random token at all.
pub fn parse_random_spec(content: &str) -> Option<Result<RandomSpec, VariableError>> {
    let digits_end = content
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(content.len());
    let (length, rest) = content.split_at(digits_end);
    let suffix = rest.strip_prefix('r')?;

    let class = match suffix {
        "" => CharClass::Alphanumeric,
        "_l" => CharClass::Lowercase,
        "_d" => CharClass::Digits,
        "_ld" => CharClass::LowercaseDigits,
        custom => {
            let body = custom.strip_prefix('<')?.strip_suffix('>')?;
            let mut chars: Vec<char> = Vec::new();
            for ch in body.chars() {
                if !chars.contains(&ch) {
                    chars.push(ch);
                }
            }
            if chars.is_empty() {
                return Some(Err(VariableError::format(content, "文字集合が空です")));
            }
            CharClass::Custom(chars)
        }
    };

    let length = if length.is_empty() {
        DEFAULT_RANDOM_LENGTH
    } else {
        match length.parse::<usize>() {
            Ok(0) => return Some(Err(VariableError::format(content, "長さに0は指定できません"))),
            Ok(n) if n > MAX_RANDOM_LENGTH => {
                return Some(Err(VariableError::format(
                    content,
                    format!("長さは{MAX_RANDOM_LENGTH}以下で指定してください"),
                )))
            }
            Ok(n) => n,
            Err(err) => return Some(Err(VariableError::format(content, err.to_string()))),
        }
    };

    Some(Ok(RandomSpec { length, class }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case("10r_l", 10, CharClass::Lowercase)]
    #[case("8r_d", 8, CharClass::Digits)]
    #[case("9r_l", 9, CharClass::Lowercase)]
    #[case("5r_ld", 5, CharClass::LowercaseDigits)]
    #[case("15r<12345>", 15, CharClass::Custom(vec!['1', '2', '3', '4', '5']))]
    #[case("r", DEFAULT_RANDOM_LENGTH, CharClass::Alphanumeric)]
    fn parses_and_generates_requested_length(
        #[case] content: &str,
        #[case] length: usize,
        #[case] class: CharClass,
    ) {
        let spec = parse_random_spec(content)
            .expect("random token")
            .expect("must parse");
        assert_eq!(spec, RandomSpec { length, class });
        let value = spec.generate(&mut rand::thread_rng());
        assert_eq!(value.chars().count(), length);
    }

    #[rstest]
    #[case("ext")]
    #[case("rx")]
    #[case("3r_x")]
    #[case("r<abc")]
    fn other_content_is_not_random(#[case] content: &str) {
        assert!(parse_random_spec(content).is_none());
    }

    #[rstest]
    #[case("0r")]
    #[case("4r<>")]
    #[case("256r_d")]
    #[case("999999999999r")]
    #[case("99999999999999999999999r")]
    fn rejects_malformed_specs(#[case] content: &str) {
        let err = parse_random_spec(content)
            .expect("random token")
            .expect_err("must fail");
        assert!(matches!(err, VariableError::Format { .. }));
    }

    #[test]
    fn longest_allowed_length_generates() {
        let spec = parse_random_spec("255r").expect("random").expect("parse");
        assert_eq!(spec.generate(&mut rand::thread_rng()).len(), MAX_RANDOM_LENGTH);
    }

    #[test]
    fn custom_set_is_deduplicated() {
        let spec = parse_random_spec("r<aab>").expect("random").expect("parse");
        assert_eq!(spec.class, CharClass::Custom(vec!['a', 'b']));
    }

    fn class_strategy() -> impl Strategy<Value = CharClass> {
        prop_oneof![
            Just(CharClass::Lowercase),
            Just(CharClass::Digits),
            Just(CharClass::LowercaseDigits),
            Just(CharClass::Alphanumeric),
            prop::collection::vec(any::<char>(), 1..8).prop_map(CharClass::Custom),
        ]
    }

    proptest! {
        #[test]
        fn output_has_length_and_class(length in 1usize..64, class in class_strategy(), seed in any::<u64>()) {
            let spec = RandomSpec { length, class };
            let pool = spec.class.pool();
            let value = spec.generate(&mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(value.chars().count(), length);
            prop_assert!(value.chars().all(|c| pool.contains(&c)));
        }
    }
}
