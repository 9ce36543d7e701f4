use chrono::{Datelike, NaiveDate};

// Indexed by `Weekday::num_days_from_sunday`.
const WEEKDAY_LABELS: [&str; 7] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

// Indexed by `month0`.
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Abbreviated pt-BR weekday name.
pub fn weekday_label(date: NaiveDate) -> &'static str {
    WEEKDAY_LABELS[date.weekday().num_days_from_sunday() as usize]
}

/// Abbreviated pt-BR month name.
pub fn month_label(date: NaiveDate) -> &'static str {
    MONTH_LABELS[date.month0() as usize]
}
