use crate::models::{PrizeTier, Stock};

/// 表格中的布尔值: true / 1 / yes (不区分大小写)
pub fn parse_bool_cell(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// 表格中的库存数量: 非负整数或 -1 (无限)
pub fn parse_count_cell(value: &str) -> Result<Stock, String> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err("empty count".to_string());
    }
    let raw: i64 = cleaned
        .parse()
        .map_err(|_| format!("non-numeric count {value:?}"))?;
    Stock::try_from(raw)
}

pub fn count_to_cell(stock: Stock) -> String {
    i64::from(stock).to_string()
}

pub fn bool_to_cell(value: bool) -> String {
    let cell = if value { "TRUE" } else { "FALSE" };
    cell.to_string()
}

/// Parse one `(id, name, total, remaining, baseline)` row.
pub fn parse_tier_row(row: &[String]) -> Result<PrizeTier, String> {
    let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

    let id = cell(0).trim();
    if id.is_empty() {
        return Err("missing id".to_string());
    }
    let tier = PrizeTier {
        id: id.to_string(),
        name: cell(1).trim().to_string(),
        total: parse_count_cell(cell(2))?,
        remaining: parse_count_cell(cell(3))?,
        is_baseline: parse_bool_cell(cell(4)),
    };
    tier.validate()?;
    Ok(tier)
}

pub fn tier_to_row(tier: &PrizeTier) -> Vec<String> {
    vec![
        tier.id.clone(),
        tier.name.clone(),
        count_to_cell(tier.total),
        count_to_cell(tier.remaining),
        bool_to_cell(tier.is_baseline),
    ]
}

/// 表头行 (A 列为 "id")
pub fn is_header_row(row: &[String]) -> bool {
    row.first()
        .map(|c| c.trim().eq_ignore_ascii_case("id"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_parse_bool_cell() {
        assert!(parse_bool_cell("TRUE"));
        assert!(parse_bool_cell(" yes "));
        assert!(parse_bool_cell("1"));
        assert!(!parse_bool_cell("FALSE"));
        assert!(!parse_bool_cell("0"));
        assert!(!parse_bool_cell(""));
    }

    #[test]
    fn test_parse_count_cell() {
        assert_eq!(parse_count_cell("-1"), Ok(Stock::Unlimited));
        assert_eq!(parse_count_cell(" 42 "), Ok(Stock::Finite(42)));
        assert_eq!(parse_count_cell("1,000"), Ok(Stock::Finite(1000)));
        assert!(parse_count_cell("").is_err());
        assert!(parse_count_cell("lots").is_err());
        assert!(parse_count_cell("-3").is_err());
    }

    #[test]
    fn test_parse_tier_row() {
        let tier = parse_tier_row(&row(&["kit", "Kit", "10", "4", "no"])).unwrap();
        assert_eq!(tier.remaining, Stock::Finite(4));
        assert!(!tier.is_baseline);

        // 尾部空单元格会被表格 API 省略
        let tier = parse_tier_row(&row(&["discount", "10% off", "-1", "-1", "Yes"])).unwrap();
        assert!(tier.is_baseline);

        assert!(parse_tier_row(&row(&["", "Nameless", "1", "1"])).is_err());
        assert!(parse_tier_row(&row(&["kit", "Kit", "ten", "4"])).is_err());
        assert!(parse_tier_row(&row(&["kit", "Kit"])).is_err());
    }

    #[test]
    fn test_tier_row_round_trip() {
        let tier = PrizeTier::new("hat", "Cap", Stock::Finite(1000), Stock::Finite(999), false);
        let cells = tier_to_row(&tier);
        assert_eq!(cells, row(&["hat", "Cap", "1000", "999", "FALSE"]));
        assert_eq!(parse_tier_row(&cells).unwrap(), tier);
    }

    #[test]
    fn test_is_header_row() {
        assert!(is_header_row(&row(&["id", "name", "total", "remaining", "baseline"])));
        assert!(!is_header_row(&row(&["kit"])));
        assert!(!is_header_row(&[]));
    }
}
