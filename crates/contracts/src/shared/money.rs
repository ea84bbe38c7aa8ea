use serde::{Deserialize, Deserializer};

/// Извлекает целую сумму из строки вида `"120 000 so'm"`.
///
/// Все нецифровые символы отбрасываются; пустой результат означает 0.
///
/// # Примеры
/// ```
/// use contracts::shared::money::parse_amount;
/// assert_eq!(parse_amount("120 000 so'm"), 120000);
/// assert_eq!(parse_amount(""), 0);
/// ```
pub fn parse_amount(raw: &str) -> i64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<i64>().unwrap_or(0)
}

/// Форматирует сумму с пробелами между триадами: `120000` -> `"120 000"`
pub fn format_amount(amount: i64) -> String {
    let s = amount.unsigned_abs().to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(' ');
        }
        result.push(ch);
    }
    if amount < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

/// serde-помощник: принимает сумму как число или как форматированную строку
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(v) => v,
        Raw::Float(v) => v.round() as i64,
        Raw::Text(s) => parse_amount(&s),
        Raw::Null(()) => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("120 000 so'm"), 120000);
        assert_eq!(parse_amount("85,000"), 85000);
        assert_eq!(parse_amount("so'm"), 0);
        assert_eq!(parse_amount("42"), 42);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(120000), "120 000");
        assert_eq!(format_amount(1234567), "1 234 567");
        assert_eq!(format_amount(-57000), "-57 000");
    }

    #[test]
    fn test_deserialize_amount_accepts_strings_and_numbers() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "deserialize_amount")]
            price: i64,
        }

        let from_text: Holder = serde_json::from_str(r#"{"price": "120 000 so'm"}"#).unwrap();
        assert_eq!(from_text.price, 120000);

        let from_number: Holder = serde_json::from_str(r#"{"price": 35000}"#).unwrap();
        assert_eq!(from_number.price, 35000);

        let from_null: Holder = serde_json::from_str(r#"{"price": null}"#).unwrap();
        assert_eq!(from_null.price, 0);
    }
}
