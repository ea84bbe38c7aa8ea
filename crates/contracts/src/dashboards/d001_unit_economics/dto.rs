use serde::{Deserialize, Serialize};

/// Окно аналитики
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "lowercase")]
pub enum Period {
    /// С начала текущих локальных суток
    Today,
    /// Последние 7 дней
    Week,
    /// Последние 30 дней
    Month,
    /// Без фильтра
    All,
    /// Произвольный диапазон, обе границы включительно (epoch ms)
    Custom { from: i64, to: i64 },
}

/// Query-параметры GET /api/d001/unit_economics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitEconomicsQuery {
    pub period: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl UnitEconomicsQuery {
    pub fn to_period(&self) -> Result<Period, String> {
        match self.period.as_deref().unwrap_or("all") {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            "custom" => match (self.from, self.to) {
                (Some(from), Some(to)) if from <= to => Ok(Period::Custom { from, to }),
                (Some(_), Some(_)) => Err("'from' must not be after 'to'".to_string()),
                _ => Err("custom period requires 'from' and 'to'".to_string()),
            },
            other => Err(format!("Unknown period: {}", other)),
        }
    }
}

/// Итоги по окну
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomicsWindow {
    pub revenue: i64,
    pub profit: i64,
    pub commission: i64,
    pub logistics: i64,
    pub count: usize,
}

/// Точка графика динамики
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicsPoint {
    /// Дата (dd.mm.yyyy) или час (HH:00) для окна "сегодня"
    pub label: String,
    pub sales: i64,
    pub profit: i64,
}

/// Ответ дашборда юнит-экономики
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitEconomicsResponse {
    pub period: Period,
    pub totals: EconomicsWindow,
    pub dynamics: Vec<DynamicsPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_to_period() {
        let q = UnitEconomicsQuery {
            period: Some("week".into()),
            ..Default::default()
        };
        assert_eq!(q.to_period(), Ok(Period::Week));

        let q = UnitEconomicsQuery::default();
        assert_eq!(q.to_period(), Ok(Period::All));

        let q = UnitEconomicsQuery {
            period: Some("custom".into()),
            from: Some(10),
            to: Some(20),
        };
        assert_eq!(q.to_period(), Ok(Period::Custom { from: 10, to: 20 }));

        let q = UnitEconomicsQuery {
            period: Some("custom".into()),
            from: Some(10),
            to: None,
        };
        assert!(q.to_period().is_err());

        let q = UnitEconomicsQuery {
            period: Some("year".into()),
            ..Default::default()
        };
        assert!(q.to_period().is_err());
    }
}
